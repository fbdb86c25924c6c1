//! Memetic genetic engine: tournament selection, combined crossover and
//! mutation, conditional critical-path local search and a stagnation-driven
//! exploration mode. One engine instance is also one island of the island
//! model; migration talks to it through [`MemeticScheduler::best_schedules`]
//! and [`MemeticScheduler::receive_migrants`].

use crate::operators;
use lib::dag::Dag;
use lib::list_scheduler::peft_schedule;
use lib::local_search::critical_path_local_search;
use lib::schedule::Schedule;
use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_derive::Serialize;

const TOURNAMENT_SIZE: usize = 5;
const STAGNATION_LIMIT: u32 = 30;
const EXPLORATION_DURATION: u32 = 15;
const EXPLORATION_MUTATION_SCALE: f64 = 5.0;
const EXPLORATION_LOCAL_SEARCH_SCALE: f64 = 5.0;

#[derive(Clone, Debug, Serialize)]
pub struct GaConfig {
    pub population_size: usize,
    pub generations: usize,
    pub mutation_rate: f64,
    pub local_search_rate: f64,
    pub seed: u64,
}

impl Default for GaConfig {
    fn default() -> Self {
        Self {
            population_size: 50,
            generations: 200,
            mutation_rate: 0.05,
            local_search_rate: 0.1,
            seed: 42,
        }
    }
}

pub struct GaResult {
    pub best: Schedule,
    pub convergence: Vec<f64>,
}

pub struct MemeticScheduler<'a> {
    dag: &'a Dag,
    config: GaConfig,
    population: Vec<Schedule>,
    best: Option<Schedule>,
    stagnation: u32,
    exploration: u32,
    convergence: Vec<f64>,
    rng: StdRng,
}

impl<'a> MemeticScheduler<'a> {
    pub fn new(dag: &'a Dag, config: GaConfig) -> Self {
        let rng = StdRng::seed_from_u64(config.seed);
        Self {
            dag,
            config,
            population: Vec::new(),
            best: None,
            stagnation: 0,
            exploration: 0,
            convergence: Vec::new(),
            rng,
        }
    }

    /// One PEFT schedule plus random assignments sharing the PEFT order.
    pub fn initialize_population(&mut self) {
        let peft = peft_schedule(self.dag);
        let peft_order = peft.order().to_vec();
        self.best = Some(peft.clone());
        self.population = vec![peft];

        while self.population.len() < self.config.population_size {
            let mut random =
                Schedule::random_assignment(self.dag, peft_order.clone(), &mut self.rng);
            random.evaluate(self.dag);
            if random.makespan() < self.best.as_ref().unwrap().makespan() {
                self.best = Some(random.clone());
            }
            self.population.push(random);
        }
    }

    pub fn run(&mut self) -> GaResult {
        self.initialize_population();
        for generation in 0..self.config.generations {
            self.evolve_once();
            debug!(
                "Generation {}: best makespan={:.2}, stagnation={}/{}, exploring={}",
                generation + 1,
                self.best_makespan(),
                self.stagnation,
                STAGNATION_LIMIT,
                self.exploration
            );
        }
        info!("Finished GA run. Best makespan: {:.2}", self.best_makespan());
        GaResult {
            best: self.best.clone().expect("population was initialized"),
            convergence: self.convergence.clone(),
        }
    }

    /// Executes a single generation. The island model drives evolution
    /// step-by-step through this method.
    pub fn evolve_once(&mut self) {
        let mut new_population = Vec::with_capacity(self.config.population_size);
        // elitism: the incumbent survives unchanged
        new_population.push(self.best.clone().expect("population was initialized"));

        self.update_stagnation_and_exploration();

        let exploring = self.exploration > 0;
        let mutation_rate = if exploring {
            (self.config.mutation_rate * EXPLORATION_MUTATION_SCALE).min(1.0)
        } else {
            self.config.mutation_rate
        };
        let local_search_rate = if exploring {
            self.config.local_search_rate / EXPLORATION_LOCAL_SEARCH_SCALE
        } else {
            self.config.local_search_rate
        };

        while new_population.len() < self.config.population_size {
            let parent1 = self.select_parent();
            let parent2 = self.select_parent();
            let mut child =
                operators::combined_crossover(&parent1, &parent2, self.dag, &mut self.rng);
            operators::combined_mutation(&mut child, mutation_rate, self.dag, &mut self.rng);
            child.evaluate(self.dag);

            // in normal mode only a child that beats a parent earns local
            // search; exploration mode searches wider instead of deeper
            let refine = if exploring {
                self.rng.random::<f64>() < local_search_rate
            } else {
                self.rng.random::<f64>() < local_search_rate
                    && (child.makespan() < parent1.makespan()
                        || child.makespan() < parent2.makespan())
            };
            if refine {
                critical_path_local_search(&mut child, self.dag);
            }

            new_population.push(child);
        }

        self.population = new_population;
        self.update_best();
        self.convergence.push(self.best_makespan());
    }

    pub fn is_stagnating(&self) -> bool {
        self.stagnation >= STAGNATION_LIMIT
    }

    pub fn best(&self) -> &Schedule {
        self.best.as_ref().expect("population was initialized")
    }

    pub fn best_makespan(&self) -> f64 {
        self.best().makespan()
    }

    /// Clones of the `count` best schedules of the current population.
    pub fn best_schedules(&mut self, count: usize) -> Vec<Schedule> {
        self.population
            .sort_by(|a, b| a.makespan().total_cmp(&b.makespan()));
        self.population.iter().take(count).cloned().collect()
    }

    /// Replaces the worst individuals with the migrants, resets the
    /// stagnation and exploration state and refreshes the incumbent.
    pub fn receive_migrants(&mut self, migrants: Vec<Schedule>) {
        if migrants.is_empty() {
            return;
        }
        self.population
            .sort_by(|a, b| b.makespan().total_cmp(&a.makespan()));
        let replace = migrants.len().min(self.population.len());
        for (slot, migrant) in self.population.iter_mut().zip(migrants.into_iter().take(replace)) {
            *slot = migrant;
        }
        self.stagnation = 0;
        self.exploration = 0;
        self.update_best();
        info!(
            "Island received migrants. New best is {:.2}.",
            self.best_makespan()
        );
    }

    fn update_stagnation_and_exploration(&mut self) {
        if self.exploration > 0 {
            self.exploration -= 1;
            return;
        }
        if self.stagnation >= STAGNATION_LIMIT {
            debug!(
                "Island stagnated at {:.2}; exploring for {} generations.",
                self.best_makespan(),
                EXPLORATION_DURATION
            );
            self.exploration = EXPLORATION_DURATION;
            self.stagnation = 0;
        }
    }

    fn select_parent(&mut self) -> Schedule {
        let mut best: Option<&Schedule> = None;
        for _ in 0..TOURNAMENT_SIZE {
            let candidate = &self.population[self.rng.random_range(0..self.population.len())];
            if best.map_or(true, |b| candidate.makespan() < b.makespan()) {
                best = Some(candidate);
            }
        }
        best.expect("population is never empty").clone()
    }

    fn update_best(&mut self) {
        let mut found_new_best = false;
        for schedule in &self.population {
            let is_better = self
                .best
                .as_ref()
                .map_or(true, |b| schedule.makespan() < b.makespan());
            if is_better {
                self.best = Some(schedule.clone());
                found_new_best = true;
            }
        }

        if found_new_best {
            self.stagnation = 0;
            if self.exploration > 0 {
                debug!(
                    "New best {:.2} found, exiting exploration mode.",
                    self.best_makespan()
                );
                self.exploration = 0;
            }
        } else {
            self.stagnation += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lib::tests_helper::{create_dag, create_layered_dag, is_topological_order};

    fn small_config(generations: usize) -> GaConfig {
        GaConfig {
            population_size: 12,
            generations,
            ..GaConfig::default()
        }
    }

    #[test]
    fn test_run_reproducible_with_fixed_seed() {
        let dag = create_layered_dag();
        let config = small_config(40);
        let first = MemeticScheduler::new(&dag, config.clone()).run();
        let second = MemeticScheduler::new(&dag, config).run();
        assert_eq!(first.convergence, second.convergence);
        assert_eq!(first.best.assignment(), second.best.assignment());
    }

    #[test]
    fn test_run_incumbent_is_monotone_non_increasing() {
        let dag = create_layered_dag();
        let result = MemeticScheduler::new(&dag, small_config(60)).run();
        assert_eq!(result.convergence.len(), 60);
        for window in result.convergence.windows(2) {
            assert!(window[1] <= window[0]);
        }
    }

    #[test]
    fn test_run_never_loses_to_peft_seed() {
        let dag = create_layered_dag();
        let peft_makespan = peft_schedule(&dag).makespan();
        let result = MemeticScheduler::new(&dag, small_config(30)).run();
        assert!(result.best.makespan() <= peft_makespan);
    }

    #[test]
    fn test_run_best_schedule_is_valid() {
        let dag = create_layered_dag();
        let result = MemeticScheduler::new(&dag, small_config(25)).run();
        assert!(is_topological_order(&dag, result.best.order()));
        assert!(result
            .best
            .assignment()
            .iter()
            .all(|&p| p < dag.processor_count()));
    }

    #[test]
    fn test_run_single_task_finds_cheapest_processor() {
        let dag = create_dag(
            &[&[5.0, 2.0, 7.0]],
            &[
                &[0.0, 1.0, 1.0],
                &[1.0, 0.0, 1.0],
                &[1.0, 1.0, 0.0],
            ],
            &[],
        );
        let result = MemeticScheduler::new(&dag, small_config(10)).run();
        assert_eq!(result.best.assignment(), &[1]);
        assert_eq!(result.best.makespan(), 2.0);
    }

    #[test]
    fn test_receive_migrants_resets_state_and_updates_best() {
        let dag = create_layered_dag();
        let mut engine = MemeticScheduler::new(&dag, small_config(5));
        engine.initialize_population();
        engine.stagnation = STAGNATION_LIMIT;
        engine.exploration = 3;

        let mut migrant = engine.best().clone();
        critical_path_local_search(&mut migrant, &dag);
        let migrant_makespan = migrant.makespan();
        engine.receive_migrants(vec![migrant]);

        assert_eq!(engine.exploration, 0);
        assert!(!engine.is_stagnating());
        assert!(engine.best_makespan() <= migrant_makespan);
    }

    #[test]
    fn test_best_schedules_are_sorted_clones() {
        let dag = create_layered_dag();
        let mut engine = MemeticScheduler::new(&dag, small_config(5));
        engine.initialize_population();
        let top = engine.best_schedules(3);
        assert_eq!(top.len(), 3);
        for window in top.windows(2) {
            assert!(window[0].makespan() <= window[1].makespan());
        }
    }
}
