use petgraph::graph::{Graph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction::{Incoming, Outgoing};
use std::collections::VecDeque;

/// custom node data structure for task graph nodes (petgraph)
#[derive(Debug, Clone)]
pub struct NodeData {
    pub id: usize,
    pub comp: Vec<f64>,
}

impl NodeData {
    pub fn new(id: usize, comp: Vec<f64>) -> NodeData {
        NodeData { id, comp }
    }

    /// Mean computation cost over all processors.
    pub fn avg_comp(&self) -> f64 {
        if self.comp.is_empty() {
            return 0.0;
        }
        self.comp.iter().sum::<f64>() / self.comp.len() as f64
    }
}

pub trait GraphExtension {
    fn get_source_nodes(&self) -> Vec<NodeIndex>;
    fn get_sink_nodes(&self) -> Vec<NodeIndex>;
    fn get_pre_nodes(&self, node_i: NodeIndex) -> Vec<NodeIndex>;
    fn get_suc_nodes(&self, node_i: NodeIndex) -> Vec<NodeIndex>;
    fn get_edge_volume(&self, from_i: NodeIndex, to_i: NodeIndex) -> f64;
    fn topological_sort(&self) -> Option<Vec<NodeIndex>>;
    fn reachability_closure(&self) -> Vec<Vec<bool>>;
}

impl GraphExtension for Graph<NodeData, f64> {
    fn get_source_nodes(&self) -> Vec<NodeIndex> {
        self.node_indices()
            .filter(|&i| self.edges_directed(i, Incoming).next().is_none())
            .collect::<Vec<_>>()
    }

    fn get_sink_nodes(&self) -> Vec<NodeIndex> {
        self.node_indices()
            .filter(|&i| self.edges_directed(i, Outgoing).next().is_none())
            .collect::<Vec<_>>()
    }

    fn get_pre_nodes(&self, node_i: NodeIndex) -> Vec<NodeIndex> {
        let mut pre_nodes = self
            .edges_directed(node_i, Incoming)
            .map(|edge| edge.source())
            .collect::<Vec<_>>();
        pre_nodes.sort_unstable();
        pre_nodes
    }

    fn get_suc_nodes(&self, node_i: NodeIndex) -> Vec<NodeIndex> {
        let mut suc_nodes = self
            .edges_directed(node_i, Outgoing)
            .map(|edge| edge.target())
            .collect::<Vec<_>>();
        suc_nodes.sort_unstable();
        suc_nodes
    }

    fn get_edge_volume(&self, from_i: NodeIndex, to_i: NodeIndex) -> f64 {
        self.find_edge(from_i, to_i)
            .map_or(0.0, |edge_i| self[edge_i])
    }

    /// Kahn's algorithm. Returns `None` if the graph contains a cycle,
    /// i.e. fewer than `node_count()` nodes can be output.
    fn topological_sort(&self) -> Option<Vec<NodeIndex>> {
        let mut in_degrees: Vec<usize> = self
            .node_indices()
            .map(|i| self.edges_directed(i, Incoming).count())
            .collect();
        let mut queue: VecDeque<NodeIndex> = self
            .node_indices()
            .filter(|i| in_degrees[i.index()] == 0)
            .collect();
        let mut sorted_nodes = Vec::with_capacity(self.node_count());

        while let Some(node_i) = queue.pop_front() {
            sorted_nodes.push(node_i);
            for suc_i in self.get_suc_nodes(node_i) {
                in_degrees[suc_i.index()] -= 1;
                if in_degrees[suc_i.index()] == 0 {
                    queue.push_back(suc_i);
                }
            }
        }

        if sorted_nodes.len() == self.node_count() {
            Some(sorted_nodes)
        } else {
            None
        }
    }

    /// Transitive closure of the successor relation.
    /// `closure[i][j]` is true iff there is a path i -> ... -> j.
    fn reachability_closure(&self) -> Vec<Vec<bool>> {
        let node_count = self.node_count();
        let mut closure = vec![vec![false; node_count]; node_count];
        let sorted_nodes = self
            .topological_sort()
            .expect("reachability requires an acyclic graph");

        for &node_i in sorted_nodes.iter().rev() {
            let i = node_i.index();
            for suc_i in self.get_suc_nodes(node_i) {
                let j = suc_i.index();
                closure[i][j] = true;
                for k in 0..node_count {
                    if closure[j][k] {
                        closure[i][k] = true;
                    }
                }
            }
        }
        closure
    }
}
