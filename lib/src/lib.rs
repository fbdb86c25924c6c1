pub mod dag;
pub mod dag_creator;
pub mod errors;
pub mod graph_extension;
pub mod list_scheduler;
pub mod local_search;
pub mod output;
pub mod ranking;
pub mod schedule;
pub mod util;

#[cfg(any(test, feature = "test-helpers"))]
pub mod tests_helper {
    use crate::dag::Dag;
    use crate::graph_extension::NodeData;
    use petgraph::graph::{Graph, NodeIndex};

    pub fn create_dag(
        comp: &[&[f64]],
        comm_rates: &[&[f64]],
        edges: &[(usize, usize, f64)],
    ) -> Dag {
        let mut graph = Graph::<NodeData, f64>::new();
        for (id, costs) in comp.iter().enumerate() {
            graph.add_node(NodeData::new(id, costs.to_vec()));
        }
        for &(from, to, volume) in edges {
            graph.add_edge(NodeIndex::new(from), NodeIndex::new(to), volume);
        }
        let rates = comm_rates.iter().map(|row| row.to_vec()).collect();
        Dag::new(graph, rates).expect("fixture DAG must be valid")
    }

    /// Diamond 0 -> {1, 2} -> 3 on two processors, every cost 10, zero
    /// communication rates. The optimum runs the branches in parallel for a
    /// makespan of 30.
    pub fn create_diamond_dag() -> Dag {
        create_dag(
            &[
                &[10.0, 10.0],
                &[10.0, 10.0],
                &[10.0, 10.0],
                &[10.0, 10.0],
            ],
            &[&[0.0, 0.0], &[0.0, 0.0]],
            &[(0, 1, 1.0), (0, 2, 1.0), (1, 3, 1.0), (2, 3, 1.0)],
        )
    }

    /// Fork-join with processor affinity: the entry task is ten times
    /// cheaper on P0, the four forks are ten times cheaper on P1, the join
    /// is indifferent. Unit volumes, unit cross rates.
    pub fn create_fork_join_dag() -> Dag {
        create_dag(
            &[
                &[1.0, 10.0],
                &[10.0, 1.0],
                &[10.0, 1.0],
                &[10.0, 1.0],
                &[10.0, 1.0],
                &[5.0, 5.0],
            ],
            &[&[0.0, 1.0], &[1.0, 0.0]],
            &[
                (0, 1, 1.0),
                (0, 2, 1.0),
                (0, 3, 1.0),
                (0, 4, 1.0),
                (1, 5, 1.0),
                (2, 5, 1.0),
                (3, 5, 1.0),
                (4, 5, 1.0),
            ],
        )
    }

    /// Ten heterogeneous tasks on three processors arranged in four layers.
    /// Used as the fixture for metaheuristic reproducibility tests.
    pub fn create_layered_dag() -> Dag {
        create_dag(
            &[
                &[11.0, 13.0, 9.0],
                &[10.0, 15.0, 11.0],
                &[9.0, 12.0, 14.0],
                &[12.0, 16.0, 10.0],
                &[15.0, 11.0, 19.0],
                &[13.0, 9.0, 5.0],
                &[11.0, 15.0, 13.0],
                &[12.0, 8.0, 14.0],
                &[7.0, 11.0, 16.0],
                &[16.0, 12.0, 7.0],
            ],
            &[
                &[0.0, 1.0, 2.0],
                &[1.0, 0.0, 1.0],
                &[2.0, 1.0, 0.0],
            ],
            &[
                (0, 1, 18.0),
                (0, 2, 12.0),
                (0, 3, 9.0),
                (1, 4, 11.0),
                (2, 4, 14.0),
                (2, 5, 23.0),
                (3, 5, 13.0),
                (4, 6, 27.0),
                (4, 7, 17.0),
                (5, 7, 25.0),
                (6, 8, 13.0),
                (7, 8, 15.0),
                (8, 9, 11.0),
            ],
        )
    }

    pub fn is_topological_order(dag: &Dag, order: &[usize]) -> bool {
        if order.len() != dag.task_count() {
            return false;
        }
        let mut position = vec![usize::MAX; dag.task_count()];
        for (pos, &task) in order.iter().enumerate() {
            if task >= dag.task_count() || position[task] != usize::MAX {
                return false;
            }
            position[task] = pos;
        }
        (0..dag.task_count()).all(|task| {
            dag.successors(task)
                .iter()
                .all(|&suc| position[task] < position[suc])
        })
    }
}
