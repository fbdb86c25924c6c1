//! Build a [`Dag`] from the plain-text benchmark file format.
//!
//! The format is line oriented: processor count, task count, edge count,
//! the `m x m` communication-rate matrix, the `n x m` computation-cost
//! matrix, then one `from to volume` line per edge. Comment lines
//! (`/* ... */`), separator lines (`===`), blank lines and lines containing
//! non-ASCII characters are skipped before parsing.

use crate::dag::Dag;
use crate::errors::{Result, SchedulingError};
use crate::graph_extension::NodeData;
use log::warn;
use petgraph::graph::{Graph, NodeIndex};
use std::fs;

pub fn create_dag_from_file(file_path: &str) -> Result<Dag> {
    let content = fs::read_to_string(file_path)?;
    create_dag_from_str(&content)
}

pub fn create_dag_from_str(content: &str) -> Result<Dag> {
    let data_lines: Vec<&str> = content
        .lines()
        .map(str::trim)
        .filter(|line| {
            !line.is_empty()
                && !line.contains("/*")
                && !line.contains("*/")
                && !line.contains("===")
                && line.is_ascii()
        })
        .collect();
    let mut lines = data_lines.into_iter();

    let processor_count = parse_count(lines.next(), "processor count")?;
    let task_count = parse_count(lines.next(), "task count")?;
    let edge_count = parse_count(lines.next(), "edge count")?;

    let mut comm_rates = Vec::with_capacity(processor_count);
    for p in 0..processor_count {
        let row = parse_double_row(
            lines.next(),
            processor_count,
            &format!("communication-rate row {}", p),
        )?;
        comm_rates.push(row);
    }

    let mut graph = Graph::<NodeData, f64>::new();
    for task in 0..task_count {
        let comp = parse_double_row(
            lines.next(),
            processor_count,
            &format!("computation-cost row {}", task),
        )?;
        graph.add_node(NodeData::new(task, comp));
    }

    let mut parsed_edges = 0usize;
    for line in lines {
        let (from, to, volume) = parse_edge_line(line)?;
        parsed_edges += 1;
        if from >= task_count || to >= task_count {
            warn!(
                "Skipping edge {} -> {}: endpoint exceeds task count {}",
                from, to, task_count
            );
            continue;
        }
        graph.update_edge(NodeIndex::new(from), NodeIndex::new(to), volume as f64);
    }
    if parsed_edges < edge_count {
        return Err(SchedulingError::InputFormat(format!(
            "expected {} edge lines, found {}",
            edge_count, parsed_edges
        )));
    }
    if parsed_edges > edge_count {
        warn!(
            "Edge count header says {} but {} edge lines were present",
            edge_count, parsed_edges
        );
    }

    Dag::new(graph, comm_rates)
}

fn parse_count(line: Option<&str>, what: &str) -> Result<usize> {
    let line =
        line.ok_or_else(|| SchedulingError::InputFormat(format!("missing {}", what)))?;
    line.parse::<usize>().map_err(|_| {
        SchedulingError::InputFormat(format!("invalid {}: {:?}", what, line))
    })
}

fn parse_double_row(line: Option<&str>, expected_len: usize, what: &str) -> Result<Vec<f64>> {
    let line =
        line.ok_or_else(|| SchedulingError::InputFormat(format!("missing {}", what)))?;
    let mut row = Vec::with_capacity(expected_len);
    for token in line.split_whitespace() {
        let value = token.parse::<f64>().map_err(|_| {
            SchedulingError::InputFormat(format!("invalid number {:?} in {}", token, what))
        })?;
        if value < 0.0 {
            return Err(SchedulingError::InputFormat(format!(
                "negative value in {}",
                what
            )));
        }
        row.push(value);
    }
    if row.len() < expected_len {
        return Err(SchedulingError::InputFormat(format!(
            "{} has {} entries, expected {}",
            what,
            row.len(),
            expected_len
        )));
    }
    row.truncate(expected_len);
    Ok(row)
}

fn parse_edge_line(line: &str) -> Result<(usize, usize, i64)> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() < 3 {
        return Err(SchedulingError::InputFormat(format!(
            "edge line {:?} needs three integers",
            line
        )));
    }
    let parse_int = |token: &str| -> Result<i64> {
        token.parse::<i64>().map_err(|_| {
            SchedulingError::InputFormat(format!("invalid edge integer {:?}", token))
        })
    };
    let from = parse_int(tokens[0])?;
    let to = parse_int(tokens[1])?;
    let volume = parse_int(tokens[2])?;
    if from < 0 || to < 0 || volume < 0 {
        return Err(SchedulingError::InputFormat(format!(
            "negative value in edge line {:?}",
            line
        )));
    }
    Ok((from as usize, to as usize, volume))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
/* two processors, three tasks, a fork */
2
3
2
=== rates ===
0.0 1.0
1.0 0.0
4.0 2.0
3.0 3.0
5.0 1.0
0 1 10
0 2 20
";

    #[test]
    fn test_create_dag_from_str_normal() {
        let dag = create_dag_from_str(SAMPLE).unwrap();
        assert_eq!(dag.task_count(), 3);
        assert_eq!(dag.processor_count(), 2);
        assert_eq!(dag.comp_cost(0, 0), 4.0);
        assert_eq!(dag.comp_cost(2, 1), 1.0);
        assert_eq!(dag.volume(0, 1), 10.0);
        assert_eq!(dag.volume(0, 2), 20.0);
        assert_eq!(dag.comm_cost(0, 1, 0, 1), 10.0);
        assert_eq!(dag.successors(0), &[1, 2]);
    }

    #[test]
    fn test_create_dag_skips_non_ascii_lines() {
        let content = "2\n3\n1\n0 1\n1 0\n1 1\n1 1\n1 1\n\u{6ce8}\u{91c8}\n0 1 5\n";
        let dag = create_dag_from_str(content).unwrap();
        assert_eq!(dag.volume(0, 1), 5.0);
    }

    #[test]
    fn test_create_dag_skips_out_of_range_edge() {
        let content = "2\n2\n2\n0 1\n1 0\n1 1\n1 1\n0 1 5\n0 9 5\n";
        let dag = create_dag_from_str(content).unwrap();
        assert_eq!(dag.successors(0), &[1]);
    }

    #[test]
    fn test_create_dag_rejects_non_numeric() {
        let content = "2\nthree\n0\n0 1\n1 0\n";
        assert!(matches!(
            create_dag_from_str(content),
            Err(SchedulingError::InputFormat(_))
        ));
    }

    #[test]
    fn test_create_dag_rejects_truncated_matrix() {
        let content = "2\n1\n0\n0 1\n1 0\n4.0\n";
        assert!(matches!(
            create_dag_from_str(content),
            Err(SchedulingError::InputFormat(_))
        ));
    }

    #[test]
    fn test_create_dag_rejects_missing_edges() {
        let content = "2\n2\n2\n0 1\n1 0\n1 1\n1 1\n0 1 5\n";
        assert!(matches!(
            create_dag_from_str(content),
            Err(SchedulingError::InputFormat(_))
        ));
    }

    #[test]
    fn test_create_dag_rejects_cycle() {
        let content = "1\n2\n2\n0\n1\n1\n0 1 1\n1 0 1\n";
        assert!(matches!(
            create_dag_from_str(content),
            Err(SchedulingError::CycleDetected)
        ));
    }

    #[test]
    fn test_create_dag_from_file_missing_path() {
        assert!(matches!(
            create_dag_from_file("does_not_exist.dag"),
            Err(SchedulingError::Io(_))
        ));
    }
}
