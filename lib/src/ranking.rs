//! Heuristic priority tables derived from the task graph: Upward Rank,
//! the Optimistic Cost Table (OCT) and the PEFT rank built on top of it.

use crate::graph_extension::{GraphExtension, NodeData};
use petgraph::graph::{Graph, NodeIndex};

const OCT_CONVERGENCE_EPSILON: f64 = 1e-9;

/// Upward rank of every task, computed in reverse topological order.
///
/// For an exit task the rank is its mean computation cost; otherwise the mean
/// computation cost plus the largest `avg_comm + rank` over its successors,
/// where `avg_comm` is the edge volume scaled by the mean inter-processor
/// communication rate.
pub(crate) fn compute_upward_ranks(
    graph: &Graph<NodeData, f64>,
    succs: &[Vec<usize>],
    avg_comm_rate: f64,
    topo_order: &[usize],
) -> Vec<f64> {
    let mut ranks = vec![0.0; graph.node_count()];
    for &task in topo_order.iter().rev() {
        let mut max_suc_rank = 0.0f64;
        for &suc in &succs[task] {
            let volume = graph.get_edge_volume(NodeIndex::new(task), NodeIndex::new(suc));
            let avg_comm = volume * avg_comm_rate;
            max_suc_rank = max_suc_rank.max(avg_comm + ranks[suc]);
        }
        ranks[task] = graph[NodeIndex::new(task)].avg_comp() + max_suc_rank;
    }
    ranks
}

/// Optimistic Cost Table: `oct[t][p]` is the expected remaining-path cost when
/// `t` runs on `p`, assuming every successor lands on its best processor.
/// Exit rows are zero. A single reverse-topological sweep already reaches the
/// fixed point on an acyclic graph; the sweep is repeated up to `n` times and
/// stops as soon as no entry moves.
pub(crate) fn compute_oct(
    graph: &Graph<NodeData, f64>,
    succs: &[Vec<usize>],
    comm_rates: &[Vec<f64>],
    topo_order: &[usize],
) -> Vec<Vec<f64>> {
    let task_count = graph.node_count();
    let processor_count = comm_rates.len();
    let mut oct = vec![vec![0.0; processor_count]; task_count];

    for _ in 0..task_count {
        let mut changed = false;
        for &task in topo_order.iter().rev() {
            if succs[task].is_empty() {
                continue; // exit rows stay zero
            }
            for p in 0..processor_count {
                let mut max_suc_cost = 0.0f64;
                for &suc in &succs[task] {
                    let volume =
                        graph.get_edge_volume(NodeIndex::new(task), NodeIndex::new(suc));
                    let mut min_suc_cost = f64::INFINITY;
                    for q in 0..processor_count {
                        let comm = if p == q { 0.0 } else { volume * comm_rates[p][q] };
                        let cost = oct[suc][q] + graph[NodeIndex::new(suc)].comp[q] + comm;
                        min_suc_cost = min_suc_cost.min(cost);
                    }
                    max_suc_cost = max_suc_cost.max(min_suc_cost);
                }
                if (oct[task][p] - max_suc_cost).abs() > OCT_CONVERGENCE_EPSILON {
                    oct[task][p] = max_suc_cost;
                    changed = true;
                }
            }
        }
        if !changed {
            break;
        }
    }
    oct
}

/// PEFT rank of a task is the mean of its OCT row.
pub(crate) fn compute_peft_ranks(oct: &[Vec<f64>]) -> Vec<f64> {
    oct.iter()
        .map(|row| {
            if row.is_empty() {
                0.0
            } else {
                row.iter().sum::<f64>() / row.len() as f64
            }
        })
        .collect()
}

/// Task ids sorted by rank value descending; ties resolved by lower task id.
pub(crate) fn rank_descending(values: &[f64]) -> Vec<usize> {
    let mut ranked: Vec<usize> = (0..values.len()).collect();
    ranked.sort_by(|&a, &b| values[b].total_cmp(&values[a]).then(a.cmp(&b)));
    ranked
}
