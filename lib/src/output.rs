//! Serializable run artifacts: the per-generation convergence series (CSV)
//! and a YAML summary of a finished solver run.

use crate::schedule::Schedule;
use crate::util::append_info_to_file;
use serde::Serialize;
use serde_derive::{Deserialize, Serialize};

pub fn dump_struct(file_path: &str, target_struct: &impl Serialize) {
    let yaml = serde_yaml::to_string(&target_struct).expect("Failed to serialize.");
    append_info_to_file(file_path, &yaml);
}

/// Writes the incumbent-makespan series as `Generation,Makespan` rows,
/// one per generation, 1-indexed.
pub fn dump_convergence_to_csv(file_path: &str, series: &[f64]) {
    let mut content = String::from("Generation,Makespan\n");
    for (generation, makespan) in series.iter().enumerate() {
        content.push_str(&format!("{},{}\n", generation + 1, makespan));
    }
    append_info_to_file(file_path, &content);
}

#[derive(Clone, Serialize, Deserialize)]
pub struct RunSummary {
    algorithm: String,
    dag_file: String,
    best_makespan: f64,
    assignment: Vec<usize>,
    execution_order: Vec<usize>,
}

impl RunSummary {
    pub fn new(algorithm: &str, dag_file: &str, best: &Schedule) -> Self {
        Self {
            algorithm: algorithm.to_string(),
            dag_file: dag_file.to_string(),
            best_makespan: best.makespan(),
            assignment: best.assignment().to_vec(),
            execution_order: best.order().to_vec(),
        }
    }
}
