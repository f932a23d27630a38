use clap::Parser;
use rand::prelude::*;
use std::path::PathBuf;
use stochastic_kinetics::analysis::{Comparison, Summary};
use stochastic_kinetics::config::RunConfig;
use stochastic_kinetics::network::Description;
use stochastic_kinetics::{serialize, simulate};
use stochastic_kinetics::{Cme, ExplicitRungeKutta, Gillespie, ReactionNetwork};
use tqdm::tqdm;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "stochastic-kinetics")]
#[command(about = "Compare stochastic simulation and master equation solutions of enzyme kinetics")]
#[command(version)]
struct Cli {
    /// JSON run description; the reference enzyme scenario when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of stochastic realizations per network
    #[arg(short, long)]
    realizations: Option<usize>,

    #[arg(short, long)]
    seed: Option<u64>,

    /// Path of the gzipped tar archive receiving the results
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error + 'static>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => RunConfig::load(path)?,
        None => RunConfig::default(),
    };
    if let Some(realizations) = cli.realizations {
        config.realizations = realizations;
    }
    if let Some(seed) = cli.seed {
        config.seed = Some(seed);
    }
    if let Some(output) = cli.output {
        config.output = output;
    }
    let seed = config.seed.unwrap_or_else(|| rand::rng().random::<u64>());
    config.seed = Some(seed);

    compare(&config)
}

/// Runs the configured network and its reductions through both engines and
/// archives the results.
fn compare(config: &RunConfig) -> Result<(), Box<dyn std::error::Error + 'static>> {
    let mut archive_builder = serialize::create_archive(&config.output)?;
    serialize::serialize_object(serialize::CONFIG_FILE, config, &mut archive_builder)?;

    let mut seed_generator = StdRng::seed_from_u64(config.seed.unwrap_or_default());
    let mut comparisons = Vec::new();
    let networks = std::iter::once(config.network.clone()).chain(config.network.reductions());
    for network in networks {
        let name = network.name();
        let species = network.observed_species();
        let species_name = network.species_names()[species];
        let description = Description::of(&network)?;
        debug!(network = name, channels = ?description.channels, "network loaded");

        info!(
            network = name,
            realizations = config.realizations,
            t_final = config.t_final,
            "running stochastic simulations"
        );
        let mut engine = Gillespie::with_seed(network.clone(), seed_generator.random::<u64>())?;
        let mut populations = Vec::with_capacity(config.realizations);
        for _ in tqdm(0..config.realizations) {
            populations.push(simulate::final_population(
                &mut engine,
                config.t_final,
                species,
            )?);
        }
        let counts: Vec<f64> = populations.iter().map(|&p| p as f64).collect();
        let ssa = Summary::new(&counts)?;

        if config.completion_times && network.has_absorbing_state() {
            info!(network = name, "recording completion times");
            let mut times = Vec::with_capacity(config.realizations);
            for _ in tqdm(0..config.realizations) {
                times.push(simulate::completion_time(&mut engine)?);
            }
            info!(
                network = name,
                mean_completion_time = Summary::new(&times)?.mean,
                "completion times recorded"
            );
            serialize::serialize_object(
                format!("{}/{}", name, serialize::COMPLETION_TIMES_FILE),
                &times,
                &mut archive_builder,
            )?;
        }

        info!(network = name, method = ?config.method, dt = config.dt, "solving master equation");
        let mut cme = Cme::new(network.clone())?;
        let mut integrator = ExplicitRungeKutta::new(config.method);
        let trajectory = simulate::mean_trajectory(
            &mut cme,
            &mut integrator,
            config.dt,
            config.t_final,
            config.sampling_stride,
            species,
        )?;

        let comparison = Comparison {
            network: name.to_string(),
            species: species_name.to_string(),
            ssa,
            cme_mean: cme.mean(species)?,
            cme_sd: cme.sd(species)?,
            cme_time: cme.time(),
        };
        info!(
            network = name,
            species = species_name,
            ssa_mean = comparison.ssa.mean,
            ssa_standard_error = comparison.ssa.standard_error,
            cme_mean = comparison.cme_mean,
            cme_sd = comparison.cme_sd,
            relative_difference = comparison.relative_difference(),
            z_score = comparison.z_score(),
            "engines compared"
        );

        serialize::serialize_object(
            format!("{}/{}", name, serialize::NETWORK_FILE),
            &description,
            &mut archive_builder,
        )?;
        serialize::serialize_object(
            format!("{}/{}", name, serialize::FINAL_POPULATIONS_FILE),
            &populations,
            &mut archive_builder,
        )?;
        serialize::serialize_object(
            format!("{}/{}", name, serialize::MEAN_TRAJECTORY_FILE),
            &trajectory,
            &mut archive_builder,
        )?;
        serialize::serialize_object(
            format!("{}/{}", name, serialize::MARGINAL_FILE),
            &cme.marginal(species)?,
            &mut archive_builder,
        )?;
        comparisons.push(comparison);
    }

    serialize::serialize_object(serialize::COMPARISON_FILE, &comparisons, &mut archive_builder)?;
    archive_builder.into_inner()?.finish()?;
    info!(output = %config.output.display(), "results archived");

    Ok(())
}
