//! Schedule encoding and the makespan evaluator.
//!
//! A schedule is an `(assignment, order)` pair: `assignment[t]` is the
//! processor of task `t` and `order` a topological permutation of the tasks.
//! Evaluation derives the makespan and, for every task, the critical link:
//! the predecessor (data or same-processor resource) that dictated its start
//! time. The exit task is stored under a sentinel slot at index `n` so the
//! critical path can be traced from sink back to source.

use crate::dag::Dag;
use rand::Rng;

#[derive(Debug, Clone)]
pub struct Schedule {
    assignment: Vec<usize>,
    order: Vec<usize>,
    makespan: f64,
    evaluated: bool,
    critical_links: Vec<Option<usize>>,
}

impl Schedule {
    pub fn new(assignment: Vec<usize>, order: Vec<usize>) -> Schedule {
        Schedule {
            assignment,
            order,
            makespan: 0.0,
            evaluated: false,
            critical_links: Vec::new(),
        }
    }

    /// Uniformly random processor assignment combined with the given order.
    pub fn random_assignment(dag: &Dag, order: Vec<usize>, rng: &mut impl Rng) -> Schedule {
        let assignment = (0..dag.task_count())
            .map(|_| rng.random_range(0..dag.processor_count()))
            .collect();
        Schedule::new(assignment, order)
    }

    pub fn assignment(&self) -> &[usize] {
        &self.assignment
    }

    pub fn order(&self) -> &[usize] {
        &self.order
    }

    pub fn set_processor(&mut self, task: usize, processor: usize) {
        self.assignment[task] = processor;
        self.evaluated = false;
    }

    pub fn set_order(&mut self, order: Vec<usize>) {
        self.order = order;
        self.evaluated = false;
    }

    pub fn is_evaluated(&self) -> bool {
        self.evaluated
    }

    /// Makespan of the last evaluation. Only meaningful after [`evaluate`].
    pub fn makespan(&self) -> f64 {
        debug_assert!(self.evaluated, "schedule has not been evaluated");
        self.makespan
    }

    /// Reassigns every gene to a uniformly random processor with independent
    /// probability `rate`.
    pub fn mutate_assignment(&mut self, rate: f64, processor_count: usize, rng: &mut impl Rng) {
        for gene in self.assignment.iter_mut() {
            if rng.random::<f64>() < rate {
                *gene = rng.random_range(0..processor_count);
            }
        }
        self.evaluated = false;
    }

    /// Walks the execution order and computes start and finish times.
    ///
    /// Each task starts at the later of its processor's ready time and the
    /// largest data-arrival time over its predecessors; ties break toward the
    /// processor, so the recorded critical link is the previous task on the
    /// same processor. When `order` is empty the DAG's upward-ranked order is
    /// used. The caller must supply a topological order; evaluation of a
    /// non-topological order is undefined.
    pub fn evaluate(&mut self, dag: &Dag) -> f64 {
        if self.evaluated {
            return self.makespan;
        }

        let task_count = dag.task_count();
        let mut finish = vec![0.0f64; task_count];
        let mut proc_ready = vec![0.0f64; dag.processor_count()];
        let mut last_on_proc: Vec<Option<usize>> = vec![None; dag.processor_count()];
        let mut critical_links: Vec<Option<usize>> = vec![None; task_count + 1];

        let order: &[usize] = if self.order.is_empty() {
            dag.ranked_tasks()
        } else {
            &self.order
        };

        for &task in order {
            let processor = self.assignment[task];
            let ready = proc_ready[processor];

            let mut max_data = 0.0f64;
            let mut data_pred = None;
            for &pred in dag.predecessors(task) {
                let arrival =
                    finish[pred] + dag.comm_cost(pred, task, self.assignment[pred], processor);
                if arrival > max_data {
                    max_data = arrival;
                    data_pred = Some(pred);
                }
            }

            let start = if ready >= max_data {
                critical_links[task] = last_on_proc[processor];
                ready
            } else {
                critical_links[task] = data_pred;
                max_data
            };

            let end = start + dag.comp_cost(task, processor);
            finish[task] = end;
            proc_ready[processor] = end;
            last_on_proc[processor] = Some(task);
        }

        let mut exit_task = order[0];
        let mut makespan = finish[exit_task];
        for &task in order {
            if finish[task] > makespan {
                makespan = finish[task];
                exit_task = task;
            }
        }
        critical_links[task_count] = Some(exit_task);

        self.critical_links = critical_links;
        self.makespan = makespan;
        self.evaluated = true;
        self.makespan
    }

    /// Traces the critical-link chain from the exit sentinel back to a source
    /// and returns the path in source-to-exit order. Requires a prior
    /// evaluation.
    pub fn find_critical_path(&self) -> Vec<usize> {
        debug_assert!(self.evaluated, "schedule has not been evaluated");
        let mut path = Vec::new();
        let mut current = self.critical_links[self.critical_links.len() - 1];
        while let Some(task) = current {
            path.push(task);
            current = self.critical_links[task];
        }
        path.reverse();
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests_helper::{create_dag, create_diamond_dag};

    /// Replays `(assignment, order)` independently of the evaluator and
    /// returns per-task `(start, finish)` intervals.
    fn replay_intervals(dag: &Dag, schedule: &Schedule) -> Vec<(f64, f64)> {
        let mut intervals = vec![(0.0, 0.0); dag.task_count()];
        let mut proc_ready = vec![0.0f64; dag.processor_count()];
        for &task in schedule.order() {
            let processor = schedule.assignment()[task];
            let mut start = proc_ready[processor];
            for &pred in dag.predecessors(task) {
                let arrival = intervals[pred].1
                    + dag.comm_cost(pred, task, schedule.assignment()[pred], processor);
                start = start.max(arrival);
            }
            let finish = start + dag.comp_cost(task, processor);
            intervals[task] = (start, finish);
            proc_ready[processor] = finish;
        }
        intervals
    }

    #[test]
    fn test_evaluate_diamond_parallel_branches() {
        let dag = create_diamond_dag();
        let mut schedule = Schedule::new(vec![0, 0, 1, 0], vec![0, 1, 2, 3]);
        // A on P0, B on P0, C on P1, D on P0: B and C run in parallel.
        assert_eq!(schedule.evaluate(&dag), 30.0);
    }

    #[test]
    fn test_evaluate_is_deterministic_bit_for_bit() {
        let dag = create_diamond_dag();
        let mut first = Schedule::new(vec![0, 1, 0, 1], vec![0, 2, 1, 3]);
        let mut second = first.clone();
        let makespan_first = first.evaluate(&dag);
        let makespan_second = second.evaluate(&dag);
        assert_eq!(makespan_first.to_bits(), makespan_second.to_bits());
        assert_eq!(first.find_critical_path(), second.find_critical_path());
    }

    #[test]
    fn test_evaluate_clone_keeps_makespan() {
        let dag = create_diamond_dag();
        let mut schedule = Schedule::new(vec![0, 1, 1, 0], vec![0, 1, 2, 3]);
        let makespan = schedule.evaluate(&dag);
        let mut cloned = schedule.clone();
        cloned.set_processor(0, schedule.assignment()[0]); // dirty then re-evaluate
        assert_eq!(cloned.evaluate(&dag), makespan);
    }

    #[test]
    fn test_evaluate_single_processor_serializes_everything() {
        let dag = create_dag(
            &[&[3.0], &[4.0], &[5.0]],
            &[&[0.0]],
            &[(0, 1, 2.0), (0, 2, 2.0)],
        );
        let mut schedule = Schedule::new(vec![0, 0, 0], vec![0, 1, 2]);
        assert_eq!(schedule.evaluate(&dag), 12.0);
    }

    #[test]
    fn test_evaluate_zero_comm_rates() {
        let dag = create_dag(
            &[&[2.0, 2.0], &[2.0, 2.0]],
            &[&[0.0, 0.0], &[0.0, 0.0]],
            &[(0, 1, 100.0)],
        );
        let mut schedule = Schedule::new(vec![0, 1], vec![0, 1]);
        assert_eq!(schedule.evaluate(&dag), 4.0);
    }

    #[test]
    fn test_evaluate_parallel_chains_take_longer_chain() {
        // two independent chains 0 -> 1 and 2 -> 3 on two processors
        let dag = create_dag(
            &[&[5.0, 5.0], &[5.0, 5.0], &[2.0, 2.0], &[2.0, 2.0]],
            &[&[0.0, 1.0], &[1.0, 0.0]],
            &[(0, 1, 1.0), (2, 3, 1.0)],
        );
        let mut schedule = Schedule::new(vec![0, 0, 1, 1], vec![0, 2, 1, 3]);
        assert_eq!(schedule.evaluate(&dag), 10.0);
    }

    #[test]
    fn test_evaluate_empty_order_falls_back_to_ranked_order() {
        let dag = create_diamond_dag();
        let mut with_order = Schedule::new(vec![0, 0, 1, 0], dag.ranked_tasks().to_vec());
        let mut without_order = Schedule::new(vec![0, 0, 1, 0], Vec::new());
        assert_eq!(with_order.evaluate(&dag), without_order.evaluate(&dag));
    }

    #[test]
    fn test_no_overlap_on_any_processor() {
        let dag = create_diamond_dag();
        let mut schedule = Schedule::new(vec![0, 1, 0, 1], vec![0, 1, 2, 3]);
        schedule.evaluate(&dag);
        let intervals = replay_intervals(&dag, &schedule);
        for a in 0..dag.task_count() {
            for b in (a + 1)..dag.task_count() {
                if schedule.assignment()[a] != schedule.assignment()[b] {
                    continue;
                }
                let no_overlap = intervals[a].1 <= intervals[b].0 || intervals[b].1 <= intervals[a].0;
                assert!(no_overlap, "tasks {} and {} overlap", a, b);
            }
        }
    }

    #[test]
    fn test_start_times_respect_readiness() {
        let dag = create_dag(
            &[&[4.0, 2.0], &[3.0, 6.0], &[1.0, 1.0]],
            &[&[0.0, 0.5], &[0.5, 0.0]],
            &[(0, 1, 4.0), (0, 2, 2.0), (1, 2, 6.0)],
        );
        let mut schedule = Schedule::new(vec![1, 0, 0], vec![0, 1, 2]);
        schedule.evaluate(&dag);
        let intervals = replay_intervals(&dag, &schedule);
        for &task in schedule.order() {
            let processor = schedule.assignment()[task];
            for &pred in dag.predecessors(task) {
                let arrival = intervals[pred].1
                    + dag.comm_cost(pred, task, schedule.assignment()[pred], processor);
                assert!(intervals[task].0 >= arrival - 1e-12);
            }
        }
    }

    #[test]
    fn test_critical_path_starts_at_source_and_ends_at_exit() {
        let dag = create_diamond_dag();
        let mut schedule = Schedule::new(vec![0, 0, 1, 0], vec![0, 1, 2, 3]);
        schedule.evaluate(&dag);
        let path = schedule.find_critical_path();
        assert!(!path.is_empty());
        assert_eq!(*path.last().unwrap(), 3);
        assert_eq!(path[0], 0);
        // consecutive path entries are linked by data or processor order
        for pair in path.windows(2) {
            let (earlier, later) = (pair[0], pair[1]);
            let data_link = dag.predecessors(later).contains(&earlier);
            let resource_link =
                schedule.assignment()[earlier] == schedule.assignment()[later];
            assert!(data_link || resource_link);
        }
    }

    #[test]
    fn test_mutate_assignment_rate_one_touches_every_gene_range() {
        use rand::rngs::StdRng;
        use rand::SeedableRng;
        let dag = create_diamond_dag();
        let mut rng = StdRng::seed_from_u64(7);
        let mut schedule = Schedule::random_assignment(&dag, vec![0, 1, 2, 3], &mut rng);
        schedule.mutate_assignment(1.0, dag.processor_count(), &mut rng);
        assert!(schedule
            .assignment()
            .iter()
            .all(|&p| p < dag.processor_count()));
        assert!(!schedule.is_evaluated());
    }
}
