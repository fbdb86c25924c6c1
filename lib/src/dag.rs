//! Immutable task-graph model for heterogeneous multiprocessor scheduling.
//!
//! A [`Dag`] owns the task graph (petgraph, edge weights are data-transfer
//! volumes), the processor communication-rate matrix and every derived cache:
//! topological order, reachability closure, upward ranks, the optimistic cost
//! table and the PEFT ranks. All caches are computed once at construction;
//! the model is read-only afterwards, so solvers can share it freely.

use crate::errors::{Result, SchedulingError};
use crate::graph_extension::{GraphExtension, NodeData};
use crate::ranking;
use petgraph::graph::{Graph, NodeIndex};

pub struct Dag {
    graph: Graph<NodeData, f64>,
    comm_rates: Vec<Vec<f64>>,
    preds: Vec<Vec<usize>>,
    succs: Vec<Vec<usize>>,
    topo_order: Vec<usize>,
    reachability: Vec<Vec<bool>>,
    avg_comm_rate: f64,
    upward_ranks: Vec<f64>,
    ranked_tasks: Vec<usize>,
    oct: Vec<Vec<f64>>,
    peft_ranks: Vec<f64>,
    peft_ranked_tasks: Vec<usize>,
}

impl Dag {
    /// Validates the raw graph and rate matrix and computes all derived
    /// tables. Fails with `InputFormat` on shape or sign violations and with
    /// `CycleDetected` when Kahn's algorithm cannot order every task.
    pub fn new(graph: Graph<NodeData, f64>, comm_rates: Vec<Vec<f64>>) -> Result<Dag> {
        let task_count = graph.node_count();
        let processor_count = comm_rates.len();
        if task_count == 0 {
            return Err(SchedulingError::InputFormat("no tasks defined".to_string()));
        }
        if processor_count == 0 {
            return Err(SchedulingError::InputFormat(
                "no processors defined".to_string(),
            ));
        }
        for (p, row) in comm_rates.iter().enumerate() {
            if row.len() != processor_count {
                return Err(SchedulingError::InputFormat(format!(
                    "communication-rate row {} has {} entries, expected {}",
                    p,
                    row.len(),
                    processor_count
                )));
            }
            if row.iter().any(|&rate| rate < 0.0 || !rate.is_finite()) {
                return Err(SchedulingError::InputFormat(format!(
                    "communication-rate row {} contains a negative or non-finite value",
                    p
                )));
            }
        }
        for node_i in graph.node_indices() {
            let node = &graph[node_i];
            if node.id != node_i.index() {
                return Err(SchedulingError::InputFormat(format!(
                    "task id {} does not match its position {}",
                    node.id,
                    node_i.index()
                )));
            }
            if node.comp.len() != processor_count {
                return Err(SchedulingError::InputFormat(format!(
                    "task {} defines {} computation costs, expected {}",
                    node.id,
                    node.comp.len(),
                    processor_count
                )));
            }
            if node.comp.iter().any(|&cost| cost < 0.0 || !cost.is_finite()) {
                return Err(SchedulingError::InputFormat(format!(
                    "task {} has a negative or non-finite computation cost",
                    node.id
                )));
            }
        }
        if graph
            .edge_indices()
            .any(|edge_i| graph[edge_i] < 0.0 || !graph[edge_i].is_finite())
        {
            return Err(SchedulingError::InputFormat(
                "negative or non-finite data-transfer volume".to_string(),
            ));
        }

        let topo_order: Vec<usize> = graph
            .topological_sort()
            .ok_or(SchedulingError::CycleDetected)?
            .iter()
            .map(|node_i| node_i.index())
            .collect();

        let preds: Vec<Vec<usize>> = graph
            .node_indices()
            .map(|i| graph.get_pre_nodes(i).iter().map(|n| n.index()).collect())
            .collect();
        let succs: Vec<Vec<usize>> = graph
            .node_indices()
            .map(|i| graph.get_suc_nodes(i).iter().map(|n| n.index()).collect())
            .collect();

        let reachability = graph.reachability_closure();
        let avg_comm_rate = average_comm_rate(&comm_rates);
        let upward_ranks =
            ranking::compute_upward_ranks(&graph, &succs, avg_comm_rate, &topo_order);
        let ranked_tasks = ranking::rank_descending(&upward_ranks);
        let oct = ranking::compute_oct(&graph, &succs, &comm_rates, &topo_order);
        let peft_ranks = ranking::compute_peft_ranks(&oct);
        let peft_ranked_tasks = ranking::rank_descending(&peft_ranks);

        Ok(Dag {
            graph,
            comm_rates,
            preds,
            succs,
            topo_order,
            reachability,
            avg_comm_rate,
            upward_ranks,
            ranked_tasks,
            oct,
            peft_ranks,
            peft_ranked_tasks,
        })
    }

    pub fn task_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn processor_count(&self) -> usize {
        self.comm_rates.len()
    }

    pub fn comp_cost(&self, task: usize, processor: usize) -> f64 {
        self.graph[NodeIndex::new(task)].comp[processor]
    }

    pub fn avg_comp_cost(&self, task: usize) -> f64 {
        self.graph[NodeIndex::new(task)].avg_comp()
    }

    pub fn predecessors(&self, task: usize) -> &[usize] {
        &self.preds[task]
    }

    pub fn successors(&self, task: usize) -> &[usize] {
        &self.succs[task]
    }

    /// Data-transfer volume on the edge `from -> to`; 0 when there is none.
    pub fn volume(&self, from: usize, to: usize) -> f64 {
        self.graph
            .get_edge_volume(NodeIndex::new(from), NodeIndex::new(to))
    }

    /// Communication cost of moving the `from -> to` edge data between two
    /// processors. Zero on the same processor regardless of the rate matrix.
    pub fn comm_cost(&self, from: usize, to: usize, from_proc: usize, to_proc: usize) -> f64 {
        if from_proc == to_proc {
            return 0.0;
        }
        self.volume(from, to) * self.comm_rates[from_proc][to_proc]
    }

    /// Mean communication rate over ordered processor pairs `p1 != p2`;
    /// 0 for a single-processor system.
    pub fn average_comm_rate(&self) -> f64 {
        self.avg_comm_rate
    }

    pub fn topological_order(&self) -> &[usize] {
        &self.topo_order
    }

    pub fn is_reachable(&self, from: usize, to: usize) -> bool {
        self.reachability[from][to]
    }

    pub fn upward_ranks(&self) -> &[f64] {
        &self.upward_ranks
    }

    /// Task ids by upward rank descending. Used as the HEFT priority list and
    /// as the evaluator's fallback execution order.
    pub fn ranked_tasks(&self) -> &[usize] {
        &self.ranked_tasks
    }

    pub fn oct_value(&self, task: usize, processor: usize) -> f64 {
        self.oct[task][processor]
    }

    /// Processor with the lowest OCT entry for `task`; ties break low.
    pub fn min_oct_processor(&self, task: usize) -> usize {
        let row = &self.oct[task];
        let mut best = 0;
        for (p, &value) in row.iter().enumerate().skip(1) {
            if value < row[best] {
                best = p;
            }
        }
        best
    }

    pub fn peft_ranks(&self) -> &[f64] {
        &self.peft_ranks
    }

    /// Task ids by PEFT rank (mean OCT) descending.
    pub fn peft_ranked_tasks(&self) -> &[usize] {
        &self.peft_ranked_tasks
    }

    /// Rebuilds a topological order from an arbitrary task permutation by
    /// running Kahn's algorithm and breaking ties toward the task appearing
    /// earliest in `priority`. A permutation that already is topological is
    /// returned unchanged.
    pub fn legalized_order(&self, priority: &[usize]) -> Vec<usize> {
        let task_count = self.task_count();
        let mut position = vec![usize::MAX; task_count];
        for (pos, &task) in priority.iter().enumerate() {
            position[task] = pos;
        }

        let mut in_degrees: Vec<usize> = (0..task_count).map(|t| self.preds[t].len()).collect();
        let mut ready: Vec<usize> = (0..task_count).filter(|&t| in_degrees[t] == 0).collect();
        let mut order = Vec::with_capacity(task_count);

        while !ready.is_empty() {
            let next = ready
                .iter()
                .enumerate()
                .min_by_key(|&(_, &t)| (position[t], t))
                .map(|(i, _)| i)
                .unwrap();
            let task = ready.remove(next);
            order.push(task);
            for &suc in &self.succs[task] {
                in_degrees[suc] -= 1;
                if in_degrees[suc] == 0 {
                    ready.push(suc);
                }
            }
        }

        debug_assert_eq!(order.len(), task_count);
        order
    }
}

fn average_comm_rate(comm_rates: &[Vec<f64>]) -> f64 {
    let processor_count = comm_rates.len();
    let mut total = 0.0;
    let mut pairs = 0usize;
    for p1 in 0..processor_count {
        for p2 in 0..processor_count {
            if p1 != p2 {
                total += comm_rates[p1][p2];
                pairs += 1;
            }
        }
    }
    if pairs > 0 {
        total / pairs as f64
    } else {
        0.0
    }
}
