use aco::colony::{AcoConfig, AntColonyScheduler};
use clap::Parser;
use lib::dag_creator::create_dag_from_file;
use lib::output::{dump_convergence_to_csv, dump_struct, RunSummary};
use lib::util::create_run_output_file;
use log::info;

#[derive(Parser)]
#[clap(
    name = "ACO_Scheduler",
    version = "1.0",
    about = "About:
    Schedules a heterogeneous-cost task graph with a Max-Min Ant System.
    Writes the per-generation convergence series as CSV and a YAML summary
    of the best schedule found."
)]
struct ArgParser {
    ///Path to the DAG file.
    #[clap(short = 'f', long = "dag_file_path", required = true)]
    dag_file_path: String,
    ///Path to output directory.
    #[clap(short = 'o', long = "output_dir_path", default_value = "../outputs")]
    output_dir_path: String,
    ///Number of ants per generation.
    #[clap(long = "num_ants", default_value_t = 50)]
    num_ants: usize,
    ///Number of generations.
    #[clap(long = "generations", default_value_t = 200)]
    generations: usize,
    ///Pheromone importance.
    #[clap(long = "alpha", default_value_t = 1.0)]
    alpha: f64,
    ///Heuristic importance.
    #[clap(long = "beta", default_value_t = 2.0)]
    beta: f64,
    ///Pheromone evaporation rate.
    #[clap(long = "evaporation_rate", default_value_t = 0.2)]
    evaporation_rate: f64,
    ///Initial exploitation bias.
    #[clap(long = "q0", default_value_t = 0.9)]
    q0: f64,
    ///Elitist deposit weight.
    #[clap(long = "elitist_weight", default_value_t = 6.0)]
    elitist_weight: f64,
    ///Number of ranked ants depositing pheromone.
    #[clap(long = "num_ranked_ants", default_value_t = 6)]
    num_ranked_ants: usize,
    ///Pheromone smoothing factor in [0, 1].
    #[clap(long = "smoothing", default_value_t = 0.0)]
    smoothing: f64,
    ///RNG seed.
    #[clap(long = "seed", default_value_t = 42)]
    seed: u64,
}

fn main() {
    env_logger::init();
    let arg: ArgParser = ArgParser::parse();

    let dag = create_dag_from_file(&arg.dag_file_path)
        .unwrap_or_else(|err| panic!("Failed to load DAG file: {}", err));

    let config = AcoConfig {
        num_ants: arg.num_ants,
        generations: arg.generations,
        alpha: arg.alpha,
        beta: arg.beta,
        evaporation_rate: arg.evaporation_rate,
        q0: arg.q0,
        elitist_weight: arg.elitist_weight,
        num_ranked_ants: arg.num_ranked_ants,
        smoothing: arg.smoothing,
        seed: arg.seed,
    };

    let mut scheduler = AntColonyScheduler::new(&dag, config.clone());
    let result = scheduler
        .run()
        .unwrap_or_else(|err| panic!("ACO run failed: {}", err));
    info!("Best makespan: {:.2}", result.best.makespan());

    let csv_path = create_run_output_file(&arg.output_dir_path, "aco", "convergence", "csv");
    dump_convergence_to_csv(&csv_path, &result.convergence);

    let summary_path = create_run_output_file(&arg.output_dir_path, "aco", "result", "yaml");
    dump_struct(&summary_path, &config);
    dump_struct(
        &summary_path,
        &RunSummary::new("aco", &arg.dag_file_path, &result.best),
    );
}
