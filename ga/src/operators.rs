//! Combined crossover and mutation operators.
//!
//! Crossover is uniform on the assignment part and Order Crossover (OX1) on
//! the order part; because OX1 can break precedence, the offspring order is
//! repaired with Kahn's algorithm using the raw offspring order as the
//! priority tie-break. Mutation reassigns genes toward the OCT optimum and
//! performs dependency-safe adjacent swaps on the order.

use lib::dag::Dag;
use lib::schedule::Schedule;
use rand::rngs::StdRng;
use rand::Rng;

const ORDER_MUTATION_PROBABILITY: f64 = 0.1;
const ADJACENT_SWAP_PROBABILITY: f64 = 0.05;

pub fn combined_crossover(
    parent1: &Schedule,
    parent2: &Schedule,
    dag: &Dag,
    rng: &mut StdRng,
) -> Schedule {
    let task_count = dag.task_count();

    // uniform crossover on the assignment part
    let mut assignment = vec![0usize; task_count];
    for (task, gene) in assignment.iter_mut().enumerate() {
        *gene = if rng.random::<f64>() < 0.5 {
            parent1.assignment()[task]
        } else {
            parent2.assignment()[task]
        };
    }

    let raw_order = order_crossover(parent1.order(), parent2.order(), rng);
    let order = dag.legalized_order(&raw_order);

    Schedule::new(assignment, order)
}

/// OX1: copy a random contiguous slice from the first order, then fill the
/// remaining positions with the missing tasks in the second order's sequence.
fn order_crossover(order1: &[usize], order2: &[usize], rng: &mut StdRng) -> Vec<usize> {
    let size = order1.len();
    if size < 2 {
        return order1.to_vec();
    }

    let mut start = rng.random_range(0..size);
    let mut end = rng.random_range(0..size);
    if start > end {
        std::mem::swap(&mut start, &mut end);
    }

    let mut child: Vec<Option<usize>> = vec![None; size];
    let mut copied = vec![false; size];
    for i in start..=end {
        child[i] = Some(order1[i]);
        copied[order1[i]] = true;
    }

    let mut position = (end + 1) % size;
    for &task in order2 {
        if copied[task] {
            continue;
        }
        while child[position].is_some() {
            position = (position + 1) % size;
        }
        child[position] = Some(task);
    }

    child
        .into_iter()
        .map(|task| task.expect("OX1 fills every slot"))
        .collect()
}

pub fn combined_mutation(schedule: &mut Schedule, mutation_rate: f64, dag: &Dag, rng: &mut StdRng) {
    smart_mutate_assignment(schedule, mutation_rate, dag, rng);
    local_swap_mutate_order(schedule, dag, rng);
}

/// Per-gene mutation that pulls a task toward its lowest-OCT processor, or to
/// a uniformly random other processor when it is already there.
fn smart_mutate_assignment(
    schedule: &mut Schedule,
    mutation_rate: f64,
    dag: &Dag,
    rng: &mut StdRng,
) {
    let processor_count = dag.processor_count();
    for task in 0..dag.task_count() {
        if rng.random::<f64>() >= mutation_rate {
            continue;
        }
        let current = schedule.assignment()[task];
        let best = dag.min_oct_processor(task);
        if best != current {
            schedule.set_processor(task, best);
        } else if processor_count > 1 {
            let mut other = rng.random_range(0..processor_count);
            while other == current {
                other = rng.random_range(0..processor_count);
            }
            schedule.set_processor(task, other);
        }
    }
}

/// Adjacent-swap order mutation. Only pairs that are unreachable from each
/// other in the precedence closure may swap, so the order stays topological.
fn local_swap_mutate_order(schedule: &mut Schedule, dag: &Dag, rng: &mut StdRng) {
    if rng.random::<f64>() > ORDER_MUTATION_PROBABILITY {
        return;
    }
    let mut order = schedule.order().to_vec();
    if order.len() < 2 {
        return;
    }

    let mut mutated = false;
    for i in 0..order.len() - 1 {
        let (first, second) = (order[i], order[i + 1]);
        if dag.is_reachable(first, second) || dag.is_reachable(second, first) {
            continue;
        }
        if rng.random::<f64>() < ADJACENT_SWAP_PROBABILITY {
            order.swap(i, i + 1);
            mutated = true;
        }
    }

    if mutated {
        schedule.set_order(order);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lib::tests_helper::{create_diamond_dag, create_layered_dag, is_topological_order};
    use rand::SeedableRng;

    #[test]
    fn test_order_crossover_is_permutation() {
        let mut rng = StdRng::seed_from_u64(11);
        let order1: Vec<usize> = vec![0, 1, 2, 3, 4, 5];
        let order2: Vec<usize> = vec![0, 3, 1, 5, 2, 4];
        for _ in 0..50 {
            let child = order_crossover(&order1, &order2, &mut rng);
            let mut sorted = child.clone();
            sorted.sort_unstable();
            assert_eq!(sorted, vec![0, 1, 2, 3, 4, 5]);
        }
    }

    #[test]
    fn test_combined_crossover_yields_topological_order() {
        let dag = create_layered_dag();
        let mut rng = StdRng::seed_from_u64(5);
        let parent1 = Schedule::new(vec![0; 10], dag.peft_ranked_tasks().to_vec());
        let parent2 = Schedule::new(vec![1; 10], dag.ranked_tasks().to_vec());
        for _ in 0..50 {
            let child = combined_crossover(&parent1, &parent2, &dag, &mut rng);
            assert!(is_topological_order(&dag, child.order()));
        }
    }

    #[test]
    fn test_combined_crossover_genes_come_from_parents() {
        let dag = create_diamond_dag();
        let mut rng = StdRng::seed_from_u64(9);
        let parent1 = Schedule::new(vec![0, 0, 0, 0], vec![0, 1, 2, 3]);
        let parent2 = Schedule::new(vec![1, 1, 1, 1], vec![0, 1, 2, 3]);
        let child = combined_crossover(&parent1, &parent2, &dag, &mut rng);
        assert!(child.assignment().iter().all(|&p| p <= 1));
    }

    #[test]
    fn test_smart_mutation_moves_toward_min_oct() {
        let dag = create_layered_dag();
        let mut rng = StdRng::seed_from_u64(2);
        let mut schedule = Schedule::new(vec![0; 10], dag.peft_ranked_tasks().to_vec());
        // rate 1.0 touches every gene
        smart_mutate_assignment(&mut schedule, 1.0, &dag, &mut rng);
        for task in 0..dag.task_count() {
            let gene = schedule.assignment()[task];
            let best = dag.min_oct_processor(task);
            // either pulled to the OCT optimum or pushed off it at random
            if best == 0 {
                assert_ne!(gene, 0);
            } else {
                assert_eq!(gene, best);
            }
        }
    }

    #[test]
    fn test_local_swap_mutation_preserves_topological_order() {
        let dag = create_layered_dag();
        let mut rng = StdRng::seed_from_u64(13);
        let mut schedule = Schedule::new(vec![0; 10], dag.peft_ranked_tasks().to_vec());
        for _ in 0..200 {
            local_swap_mutate_order(&mut schedule, &dag, &mut rng);
            assert!(is_topological_order(&dag, schedule.order()));
        }
    }
}
