use clap::Parser;
use ga::engine::{GaConfig, MemeticScheduler};
use ga::island::{IslandConfig, IslandModelScheduler};
use lib::dag_creator::create_dag_from_file;
use lib::output::{dump_convergence_to_csv, dump_struct, RunSummary};
use lib::util::create_run_output_file;
use log::info;

#[derive(Parser)]
#[clap(
    name = "GA_Scheduler",
    version = "1.0",
    about = "About:
    Schedules a heterogeneous-cost task graph with a memetic genetic
    algorithm. With more than one island the populations evolve in an
    island model with on-demand migration and path-relinking."
)]
struct ArgParser {
    ///Path to the DAG file.
    #[clap(short = 'f', long = "dag_file_path", required = true)]
    dag_file_path: String,
    ///Path to output directory.
    #[clap(short = 'o', long = "output_dir_path", default_value = "../outputs")]
    output_dir_path: String,
    ///Number of islands; 1 runs a single population.
    #[clap(long = "islands", default_value_t = 1)]
    islands: usize,
    ///Population size (per island).
    #[clap(long = "population_size", default_value_t = 50)]
    population_size: usize,
    ///Number of generations.
    #[clap(long = "generations", default_value_t = 200)]
    generations: usize,
    ///Number of elite schedules exchanged on migration.
    #[clap(long = "migration_size", default_value_t = 3)]
    migration_size: usize,
    ///Per-gene mutation rate.
    #[clap(long = "mutation_rate", default_value_t = 0.05)]
    mutation_rate: f64,
    ///Probability of refining a child with local search.
    #[clap(long = "local_search_rate", default_value_t = 0.1)]
    local_search_rate: f64,
    ///RNG seed.
    #[clap(long = "seed", default_value_t = 42)]
    seed: u64,
}

fn main() {
    env_logger::init();
    let arg: ArgParser = ArgParser::parse();

    let dag = create_dag_from_file(&arg.dag_file_path)
        .unwrap_or_else(|err| panic!("Failed to load DAG file: {}", err));

    if arg.islands > 1 {
        let config = IslandConfig {
            num_islands: arg.islands,
            total_generations: arg.generations,
            migration_size: arg.migration_size,
            population_per_island: arg.population_size,
            mutation_rate: arg.mutation_rate,
            local_search_rate: arg.local_search_rate,
            seed: arg.seed,
        };
        let best = IslandModelScheduler::new(&dag, config.clone()).run();
        info!("Best makespan: {:.2}", best.makespan());

        let summary_path =
            create_run_output_file(&arg.output_dir_path, "island-ga", "result", "yaml");
        dump_struct(&summary_path, &config);
        dump_struct(
            &summary_path,
            &RunSummary::new("island-ga", &arg.dag_file_path, &best),
        );
    } else {
        let config = GaConfig {
            population_size: arg.population_size,
            generations: arg.generations,
            mutation_rate: arg.mutation_rate,
            local_search_rate: arg.local_search_rate,
            seed: arg.seed,
        };
        let result = MemeticScheduler::new(&dag, config.clone()).run();
        info!("Best makespan: {:.2}", result.best.makespan());

        let csv_path = create_run_output_file(&arg.output_dir_path, "ga", "convergence", "csv");
        dump_convergence_to_csv(&csv_path, &result.convergence);

        let summary_path = create_run_output_file(&arg.output_dir_path, "ga", "result", "yaml");
        dump_struct(&summary_path, &config);
        dump_struct(
            &summary_path,
            &RunSummary::new("ga", &arg.dag_file_path, &result.best),
        );
    }
}
