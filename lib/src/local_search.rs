//! Critical-path local search: a best-improvement hill climber over the
//! assignment of critical-path tasks. The execution order never changes,
//! which keeps the neighborhood small enough for large graphs.

use crate::dag::Dag;
use crate::schedule::Schedule;

/// Repeatedly evaluates the schedule, extracts the critical path and tries
/// every `(critical task, other processor)` reassignment. The single best
/// strictly-improving move is applied; the search stops when a full sweep
/// finds none. Calling this at a local optimum leaves the schedule unchanged.
pub fn critical_path_local_search(schedule: &mut Schedule, dag: &Dag) {
    loop {
        let current_makespan = schedule.evaluate(dag);
        let critical_path = schedule.find_critical_path();

        let mut best_move: Option<(usize, usize)> = None;
        let mut best_makespan = current_makespan;

        for &task in &critical_path {
            let original = schedule.assignment()[task];
            for processor in 0..dag.processor_count() {
                if processor == original {
                    continue;
                }
                schedule.set_processor(task, processor);
                let trial = schedule.evaluate(dag);
                if trial < best_makespan {
                    best_makespan = trial;
                    best_move = Some((task, processor));
                }
            }
            schedule.set_processor(task, original);
        }

        match best_move {
            Some((task, processor)) => schedule.set_processor(task, processor),
            None => {
                // restore the evaluation state of the unchanged schedule
                schedule.evaluate(dag);
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests_helper::{create_dag, create_diamond_dag};

    #[test]
    fn test_local_search_never_worsens() {
        let dag = create_diamond_dag();
        let mut schedule = Schedule::new(vec![0, 0, 0, 0], vec![0, 1, 2, 3]);
        let before = schedule.evaluate(&dag);
        critical_path_local_search(&mut schedule, &dag);
        assert!(schedule.makespan() <= before);
    }

    #[test]
    fn test_local_search_parallelizes_diamond() {
        let dag = create_diamond_dag();
        // all four tasks on one processor: makespan 40
        let mut schedule = Schedule::new(vec![0, 0, 0, 0], vec![0, 1, 2, 3]);
        assert_eq!(schedule.evaluate(&dag), 40.0);
        critical_path_local_search(&mut schedule, &dag);
        // moving one branch away reaches the optimum of 30
        assert_eq!(schedule.makespan(), 30.0);
    }

    #[test]
    fn test_local_search_moves_task_to_fast_processor() {
        // task 1 is ten times cheaper on processor 1
        let dag = create_dag(
            &[&[5.0, 5.0], &[50.0, 5.0]],
            &[&[0.0, 0.1], &[0.1, 0.0]],
            &[(0, 1, 1.0)],
        );
        let mut schedule = Schedule::new(vec![0, 0], vec![0, 1]);
        assert_eq!(schedule.evaluate(&dag), 55.0);
        critical_path_local_search(&mut schedule, &dag);
        assert_eq!(schedule.assignment()[1], 1);
        assert_eq!(schedule.makespan(), 10.0);
    }

    #[test]
    fn test_local_search_is_idempotent_at_local_optimum() {
        let dag = create_diamond_dag();
        let mut schedule = Schedule::new(vec![0, 0, 1, 0], vec![0, 1, 2, 3]);
        critical_path_local_search(&mut schedule, &dag);
        let first_makespan = schedule.makespan();
        let first_assignment = schedule.assignment().to_vec();
        critical_path_local_search(&mut schedule, &dag);
        assert_eq!(schedule.makespan(), first_makespan);
        assert_eq!(schedule.assignment(), first_assignment.as_slice());
    }
}
