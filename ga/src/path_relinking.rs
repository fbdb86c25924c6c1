//! Path-relinking: directed recombination that walks the assignment of a
//! source schedule toward a guiding schedule one differing gene at a time,
//! refining every intermediate with critical-path local search and keeping
//! the best schedule met along the trajectory.

use lib::dag::Dag;
use lib::local_search::critical_path_local_search;
use lib::schedule::Schedule;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

/// Returns the best schedule found on the trajectory from `source` toward
/// `guide`. An empty difference set returns the source unchanged.
pub fn path_relinking(
    source: &Schedule,
    guide: &Schedule,
    dag: &Dag,
    rng: &mut StdRng,
) -> Schedule {
    path_relinking_trace(source, guide, dag, rng).0
}

/// Like [`path_relinking`] but also returns the best-so-far makespan after
/// every relinking step, which is non-increasing by construction.
pub(crate) fn path_relinking_trace(
    source: &Schedule,
    guide: &Schedule,
    dag: &Dag,
    rng: &mut StdRng,
) -> (Schedule, Vec<f64>) {
    let mut current = source.clone();
    current.evaluate(dag);
    let mut best_found = current.clone();
    let mut trace = vec![best_found.makespan()];

    let mut diff_indices: Vec<usize> = (0..dag.task_count())
        .filter(|&task| source.assignment()[task] != guide.assignment()[task])
        .collect();
    diff_indices.shuffle(rng);

    for task in diff_indices {
        current.set_processor(task, guide.assignment()[task]);
        current.evaluate(dag);
        critical_path_local_search(&mut current, dag);
        if current.makespan() < best_found.makespan() {
            best_found = current.clone();
        }
        trace.push(best_found.makespan());
    }

    (best_found, trace)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lib::tests_helper::create_layered_dag;
    use rand::{Rng, SeedableRng};

    #[test]
    fn test_path_relinking_empty_diff_returns_source() {
        let dag = create_layered_dag();
        let mut rng = StdRng::seed_from_u64(1);
        let mut source = Schedule::new(vec![0; 10], dag.peft_ranked_tasks().to_vec());
        source.evaluate(&dag);
        let result = path_relinking(&source, &source.clone(), &dag, &mut rng);
        assert_eq!(result.assignment(), source.assignment());
        assert_eq!(result.makespan(), source.makespan());
    }

    #[test]
    fn test_path_relinking_never_returns_worse_than_source() {
        let dag = create_layered_dag();
        let mut rng = StdRng::seed_from_u64(2);
        let mut source = Schedule::random_assignment(&dag, dag.peft_ranked_tasks().to_vec(), &mut rng);
        source.evaluate(&dag);
        let mut guide = Schedule::random_assignment(&dag, dag.peft_ranked_tasks().to_vec(), &mut rng);
        guide.evaluate(&dag);
        let result = path_relinking(&source, &guide, &dag, &mut rng);
        assert!(result.makespan() <= source.makespan());
    }

    #[test]
    fn test_path_relinking_trace_is_monotone_non_increasing() {
        let dag = create_layered_dag();
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..5 {
            let mut source =
                Schedule::random_assignment(&dag, dag.peft_ranked_tasks().to_vec(), &mut rng);
            source.evaluate(&dag);
            let mut guide = source.clone();
            for task in 0..dag.task_count() {
                if rng.random::<f64>() < 0.5 {
                    guide.set_processor(task, rng.random_range(0..dag.processor_count()));
                }
            }
            guide.evaluate(&dag);
            let (_, trace) = path_relinking_trace(&source, &guide, &dag, &mut rng);
            for window in trace.windows(2) {
                assert!(window[1] <= window[0]);
            }
        }
    }
}
