//! Max-Min Ant System with rank-based pheromone deposits (MMAS-AS_rank).
//!
//! Pheromone lives in a task-by-processor matrix clamped to `[tau_min,
//! tau_max]`. Each generation a colony of ants builds schedules, the top
//! ranked ants and the elitist incumbent deposit pheromone, and an adaptive
//! exploitation bias reacts to stagnation. The PEFT makespan only scales the
//! pheromone bounds; the search itself starts from an empty incumbent.

use crate::ant;
use lib::dag::Dag;
use lib::errors::Result;
use lib::list_scheduler::peft_schedule;
use lib::local_search::critical_path_local_search;
use lib::schedule::Schedule;
use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_derive::Serialize;

const SOFT_STAGNATION_LIMIT: u32 = 25;
const HARD_STAGNATION_LIMIT: u32 = 50;
const CONVERGENCE_LIMIT: u32 = 30;
const CONVERGENCE_EPSILON: f64 = 0.01;
const MIN_DIVERSITY: f64 = 0.1;
const DIVERSIFICATION_SHARE: f64 = 0.3;
const INJECTION_MUTATION_RATE: f64 = 0.05;
const MIN_Q0: f64 = 0.3;
const MAX_Q0: f64 = 0.98;

#[derive(Clone, Debug, Serialize)]
pub struct AcoConfig {
    pub num_ants: usize,
    pub generations: usize,
    pub alpha: f64,
    pub beta: f64,
    pub evaporation_rate: f64,
    pub q0: f64,
    pub elitist_weight: f64,
    pub num_ranked_ants: usize,
    pub smoothing: f64,
    pub seed: u64,
}

impl Default for AcoConfig {
    fn default() -> Self {
        Self {
            num_ants: 50,
            generations: 200,
            alpha: 1.0,
            beta: 2.0,
            evaporation_rate: 0.2,
            q0: 0.9,
            elitist_weight: 6.0,
            num_ranked_ants: 6,
            smoothing: 0.0,
            seed: 42,
        }
    }
}

pub struct AcoResult {
    pub best: Schedule,
    pub convergence: Vec<f64>,
}

pub struct AntColonyScheduler<'a> {
    dag: &'a Dag,
    config: AcoConfig,
    pheromone: Vec<Vec<f64>>,
    tau_max: f64,
    tau_min: f64,
    q0: f64,
    best: Option<Schedule>,
    convergence: Vec<f64>,
    stagnation: u32,
    convergence_count: u32,
    last_best_makespan: f64,
    pending_injection: Option<Schedule>,
    rng: StdRng,
}

impl<'a> AntColonyScheduler<'a> {
    pub fn new(dag: &'a Dag, config: AcoConfig) -> Self {
        let pheromone = vec![vec![0.0; dag.processor_count()]; dag.task_count()];
        let rng = StdRng::seed_from_u64(config.seed);
        let q0 = config.q0;
        Self {
            dag,
            config,
            pheromone,
            tau_max: 0.0,
            tau_min: 0.0,
            q0,
            best: None,
            convergence: Vec::new(),
            stagnation: 0,
            convergence_count: 0,
            last_best_makespan: f64::MAX,
            pending_injection: None,
            rng,
        }
    }

    pub fn run(&mut self) -> Result<AcoResult> {
        let initial_heuristic = peft_schedule(self.dag);
        info!(
            "Initial heuristic makespan (PEFT): {:.2}",
            initial_heuristic.makespan()
        );
        self.initialize_pheromone_bounds(initial_heuristic.makespan());
        info!(
            "MMAS bounds: tau_max={:.6}, tau_min={:.6}",
            self.tau_max, self.tau_min
        );

        for generation in 0..self.config.generations {
            let mut ants = self.construct_ants()?;
            self.apply_pending_injection(&mut ants);
            ants.sort_by(|a, b| a.makespan().total_cmp(&b.makespan()));

            let improved = self.update_best(&ants[0]);
            self.update_pheromones(&ants, generation);
            self.adapt_exploitation_bias(improved);
            self.track_convergence();
            self.handle_stagnation(&ants);

            let best_makespan = self.best.as_ref().map(Schedule::makespan).unwrap_or(0.0);
            self.convergence.push(best_makespan);
            debug!(
                "Generation {}: iteration best={:.2}, global best={:.2}, stagnation={}, q0={:.3}",
                generation + 1,
                ants[0].makespan(),
                best_makespan,
                self.stagnation,
                self.q0
            );

            if self.convergence_count >= CONVERGENCE_LIMIT {
                info!(
                    "Converged after {} generations, stopping early.",
                    generation + 1
                );
                break;
            }
        }

        let best = self
            .best
            .clone()
            .expect("at least one generation must have run");
        info!("Finished ACO run. Best makespan: {:.2}", best.makespan());
        Ok(AcoResult {
            best,
            convergence: self.convergence.clone(),
        })
    }

    /// `tau_max = 1 / (rho * M0)` from the PEFT makespan; `tau_min` follows
    /// the MMAS closed form with `p_best = (1/n)^(1/n)`. Degenerate values on
    /// tiny graphs fall back to a fixed fraction of `tau_max`.
    fn initialize_pheromone_bounds(&mut self, initial_makespan: f64) {
        let task_count = self.dag.task_count() as f64;
        self.tau_max = 1.0 / (self.config.evaporation_rate * initial_makespan);
        if !self.tau_max.is_finite() || self.tau_max <= 0.0 {
            self.tau_max = 1.0;
        }

        let p_best = (1.0 / task_count).powf(1.0 / task_count);
        let root = p_best.powf(1.0 / task_count);
        let denominator = ((self.dag.task_count() / 2) as f64 - 1.0) * root;
        self.tau_min = self.tau_max * (1.0 - root) / denominator;
        if !self.tau_min.is_finite() || self.tau_min <= 0.0 || self.tau_min > self.tau_max {
            self.tau_min = self.tau_max * 1e-3;
        }

        for row in self.pheromone.iter_mut() {
            for entry in row.iter_mut() {
                *entry = self.tau_max;
            }
        }
    }

    fn construct_ants(&mut self) -> Result<Vec<Schedule>> {
        let mut ants = Vec::with_capacity(self.config.num_ants);
        for _ in 0..self.config.num_ants {
            ants.push(ant::construct_solution(
                self.dag,
                &self.pheromone,
                self.config.alpha,
                self.config.beta,
                self.q0,
                self.dag.upward_ranks(),
                &mut self.rng,
            )?);
        }
        Ok(ants)
    }

    fn apply_pending_injection(&mut self, ants: &mut [Schedule]) {
        if let Some(injected) = self.pending_injection.take() {
            let worst = ants
                .iter()
                .enumerate()
                .max_by(|(_, a), (_, b)| a.makespan().total_cmp(&b.makespan()))
                .map(|(i, _)| i)
                .expect("colony is never empty");
            ants[worst] = injected;
        }
    }

    /// Local search refines only a candidate that already beats the
    /// incumbent, never every ant.
    fn update_best(&mut self, iteration_best: &Schedule) -> bool {
        let beats_incumbent = self
            .best
            .as_ref()
            .map_or(true, |best| iteration_best.makespan() < best.makespan());
        if !beats_incumbent {
            return false;
        }

        self.best = Some(iteration_best.clone());
        let mut refined = iteration_best.clone();
        critical_path_local_search(&mut refined, self.dag);
        if refined.makespan() < self.best.as_ref().unwrap().makespan() {
            self.best = Some(refined);
        }
        true
    }

    fn update_pheromones(&mut self, sorted_ants: &[Schedule], generation: usize) {
        let evaporation_factor = 1.0 - self.config.evaporation_rate;
        for row in self.pheromone.iter_mut() {
            for entry in row.iter_mut() {
                *entry *= evaporation_factor;
            }
        }

        // rank-based deposits from the top ants
        let ranked = self.config.num_ranked_ants.min(sorted_ants.len());
        for (rank, ant) in sorted_ants.iter().take(ranked).enumerate() {
            let contribution =
                (self.config.num_ranked_ants - rank + 1) as f64 / ant.makespan();
            for (task, &processor) in ant.assignment().iter().enumerate() {
                self.pheromone[task][processor] += contribution;
            }
        }

        // elitist deposit from the incumbent, decaying linearly over the run
        if let Some(best) = &self.best {
            let decay = 1.0 - generation as f64 / self.config.generations as f64;
            let contribution = self.config.elitist_weight * (1.0 / best.makespan()) * decay;
            for (task, &processor) in best.assignment().iter().enumerate() {
                self.pheromone[task][processor] += contribution;
            }
        }

        for row in self.pheromone.iter_mut() {
            for entry in row.iter_mut() {
                *entry = entry.clamp(self.tau_min, self.tau_max);
            }
        }

        // optional smoothing toward the matrix mean; preserves the bounds
        if self.config.smoothing > 0.0 {
            let entries = (self.dag.task_count() * self.dag.processor_count()) as f64;
            let mean: f64 = self
                .pheromone
                .iter()
                .map(|row| row.iter().sum::<f64>())
                .sum::<f64>()
                / entries;
            let s = self.config.smoothing;
            for row in self.pheromone.iter_mut() {
                for entry in row.iter_mut() {
                    *entry = (1.0 - s) * *entry + s * mean;
                }
            }
        }
    }

    fn adapt_exploitation_bias(&mut self, improved: bool) {
        if improved {
            self.stagnation = 0;
            self.q0 = (self.q0 / 0.95).min(MAX_Q0);
            if self.q0 < self.config.q0 {
                self.q0 = self.config.q0;
            }
        } else {
            self.stagnation += 1;
        }
    }

    fn track_convergence(&mut self) {
        let best_makespan = self.best.as_ref().map(Schedule::makespan).unwrap_or(f64::MAX);
        if (best_makespan - self.last_best_makespan).abs() < CONVERGENCE_EPSILON {
            self.convergence_count += 1;
        } else {
            self.convergence_count = 0;
            self.last_best_makespan = best_makespan;
        }
    }

    fn handle_stagnation(&mut self, ants: &[Schedule]) {
        if self.stagnation >= HARD_STAGNATION_LIMIT {
            info!(
                "Hard stagnation ({} generations): injecting a mutated incumbent.",
                self.stagnation
            );
            let mut injected = self
                .best
                .clone()
                .expect("hard stagnation requires an incumbent");
            injected.mutate_assignment(
                INJECTION_MUTATION_RATE,
                self.dag.processor_count(),
                &mut self.rng,
            );
            injected.evaluate(self.dag);
            self.pending_injection = Some(injected);
            self.stagnation = 0;
            self.convergence_count = 0;
            self.q0 = self.config.q0;
        } else if self.stagnation >= SOFT_STAGNATION_LIMIT {
            self.q0 = (self.q0 * 0.9).max(MIN_Q0);
            if population_diversity(ants) < MIN_DIVERSITY {
                debug!("Low colony diversity, randomizing part of the pheromone matrix.");
                self.diversify_pheromone();
            }
        }
    }

    /// Re-draws roughly 30% of the pheromone entries uniformly inside the
    /// bounds.
    fn diversify_pheromone(&mut self) {
        for row in self.pheromone.iter_mut() {
            for entry in row.iter_mut() {
                if self.rng.random::<f64>() < DIVERSIFICATION_SHARE {
                    *entry = self.tau_min
                        + self.rng.random::<f64>() * (self.tau_max - self.tau_min);
                }
            }
        }
    }
}

/// Normalized standard deviation of the colony's makespans.
fn population_diversity(ants: &[Schedule]) -> f64 {
    if ants.len() <= 1 {
        return 1.0;
    }
    let mean = ants.iter().map(|a| a.makespan()).sum::<f64>() / ants.len() as f64;
    if mean <= f64::EPSILON {
        return 1.0;
    }
    let variance = ants
        .iter()
        .map(|a| (a.makespan() - mean).powi(2))
        .sum::<f64>()
        / ants.len() as f64;
    variance.sqrt() / mean
}
