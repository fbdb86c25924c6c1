//! Deterministic list schedulers used as heuristic baselines: PEFT (OCT
//! look-ahead) and HEFT (upward-rank only).

use crate::dag::Dag;
use crate::schedule::Schedule;

/// PEFT: tasks in decreasing PEFT rank; each task goes to the processor
/// minimizing `EFT + OCT`, while the recorded finish time uses the actual
/// EFT of the chosen processor.
pub fn peft_schedule(dag: &Dag) -> Schedule {
    build_list_schedule(dag, dag.peft_ranked_tasks().to_vec(), true)
}

/// HEFT: tasks in decreasing upward rank; each task goes to the processor
/// minimizing its EFT.
pub fn heft_schedule(dag: &Dag) -> Schedule {
    build_list_schedule(dag, dag.ranked_tasks().to_vec(), false)
}

fn build_list_schedule(dag: &Dag, order: Vec<usize>, use_oct_lookahead: bool) -> Schedule {
    let task_count = dag.task_count();
    let mut assignment = vec![0usize; task_count];
    let mut finish = vec![-1.0f64; task_count]; // negative marks "not yet scheduled"
    let mut proc_ready = vec![0.0f64; dag.processor_count()];

    for &task in &order {
        let mut best_processor = 0;
        let mut best_metric = f64::INFINITY;
        let mut best_eft = 0.0;

        for processor in 0..dag.processor_count() {
            let mut est = proc_ready[processor];
            for &pred in dag.predecessors(task) {
                if finish[pred] < 0.0 {
                    continue;
                }
                let arrival =
                    finish[pred] + dag.comm_cost(pred, task, assignment[pred], processor);
                est = est.max(arrival);
            }
            let eft = est + dag.comp_cost(task, processor);
            let metric = if use_oct_lookahead {
                eft + dag.oct_value(task, processor)
            } else {
                eft
            };
            if metric < best_metric {
                best_metric = metric;
                best_processor = processor;
                best_eft = eft;
            }
        }

        assignment[task] = best_processor;
        finish[task] = best_eft;
        proc_ready[best_processor] = best_eft;
    }

    let mut schedule = Schedule::new(assignment, order);
    schedule.evaluate(dag);
    schedule
}
