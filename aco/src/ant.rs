//! Ant solution construction: one ant builds a complete schedule by
//! repeatedly picking a `(ready task, processor)` pair, guided by pheromone
//! and an EFT/upward-rank heuristic with pseudo-random proportional action
//! selection.

use lib::dag::Dag;
use lib::errors::{Result, SchedulingError};
use lib::schedule::Schedule;
use rand::rngs::StdRng;
use rand::Rng;

const EFT_EPSILON: f64 = 1e-4;

#[derive(Clone, Copy)]
struct Candidate {
    task: usize,
    processor: usize,
    desirability: f64,
}

/// Builds one schedule. Fails with `ConstructionStuck` if the ready set runs
/// empty before every task is placed, which indicates a broken task graph.
pub fn construct_solution(
    dag: &Dag,
    pheromone: &[Vec<f64>],
    alpha: f64,
    beta: f64,
    q0: f64,
    upward_ranks: &[f64],
    rng: &mut StdRng,
) -> Result<Schedule> {
    let task_count = dag.task_count();
    let processor_count = dag.processor_count();

    let mut assignment = vec![0usize; task_count];
    let mut order = Vec::with_capacity(task_count);
    let mut finish = vec![0.0f64; task_count];
    let mut proc_ready = vec![0.0f64; processor_count];
    let mut in_degrees: Vec<usize> = (0..task_count)
        .map(|task| dag.predecessors(task).len())
        .collect();
    let mut ready: Vec<usize> = (0..task_count).filter(|&t| in_degrees[t] == 0).collect();
    let mut candidates: Vec<Candidate> = Vec::with_capacity(ready.len() * processor_count);

    while order.len() < task_count {
        if ready.is_empty() {
            return Err(SchedulingError::ConstructionStuck);
        }

        candidates.clear();
        let mut total_desirability = 0.0;
        for &task in &ready {
            for processor in 0..processor_count {
                let eft = earliest_finish_time(
                    dag,
                    task,
                    processor,
                    &assignment,
                    &finish,
                    &proc_ready,
                )
                .max(EFT_EPSILON);
                let heuristic = (1.0 / eft) * upward_ranks[task];
                let mut desirability = pheromone[task][processor].powf(alpha) * heuristic.powf(beta);
                if !desirability.is_finite() {
                    desirability = 0.0;
                }
                total_desirability += desirability;
                candidates.push(Candidate {
                    task,
                    processor,
                    desirability,
                });
            }
        }

        let chosen = select_candidate(&candidates, total_desirability, q0, rng);

        let position = ready
            .iter()
            .position(|&task| task == chosen.task)
            .expect("chosen task must be ready");
        ready.remove(position);

        assignment[chosen.task] = chosen.processor;
        order.push(chosen.task);
        let finish_time = earliest_finish_time(
            dag,
            chosen.task,
            chosen.processor,
            &assignment,
            &finish,
            &proc_ready,
        );
        finish[chosen.task] = finish_time;
        proc_ready[chosen.processor] = finish_time;

        for &suc in dag.successors(chosen.task) {
            in_degrees[suc] -= 1;
            if in_degrees[suc] == 0 {
                ready.push(suc);
            }
        }
    }

    let mut schedule = Schedule::new(assignment, order);
    schedule.evaluate(dag);
    Ok(schedule)
}

fn select_candidate(
    candidates: &[Candidate],
    total_desirability: f64,
    q0: f64,
    rng: &mut StdRng,
) -> Candidate {
    if total_desirability <= 0.0 || !total_desirability.is_finite() {
        return candidates[rng.random_range(0..candidates.len())];
    }

    if rng.random::<f64>() < q0 {
        // exploitation: maximum desirability, ties toward the lower task id
        // then the lower processor id
        let mut best = candidates[0];
        for &candidate in &candidates[1..] {
            if candidate.desirability > best.desirability
                || (candidate.desirability == best.desirability
                    && (candidate.task, candidate.processor) < (best.task, best.processor))
            {
                best = candidate;
            }
        }
        best
    } else {
        // exploration: roulette over desirabilities
        let roll = rng.random::<f64>() * total_desirability;
        let mut cumulative = 0.0;
        for &candidate in candidates {
            cumulative += candidate.desirability;
            if roll <= cumulative {
                return candidate;
            }
        }
        candidates[candidates.len() - 1]
    }
}

fn earliest_finish_time(
    dag: &Dag,
    task: usize,
    processor: usize,
    assignment: &[usize],
    finish: &[f64],
    proc_ready: &[f64],
) -> f64 {
    let mut est = proc_ready[processor];
    for &pred in dag.predecessors(task) {
        let arrival = finish[pred] + dag.comm_cost(pred, task, assignment[pred], processor);
        est = est.max(arrival);
    }
    est + dag.comp_cost(task, processor)
}
