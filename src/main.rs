use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use feedmix::plot::{self, ChartData};
use feedmix::timing::timed;
use feedmix::config::DEFAULT_CONFIG_PATH;
use feedmix::{
    loader, logging, report, BlendModel, BlendSolver, RunConfig, SolveOutcome, Stage, StageTimings,
};

#[derive(Parser, Debug)]
#[command(name = "feedmix")]
#[command(about = "Find the least-cost feed blend for a table of ingredients")]
struct Args {
    /// Ingredient table (CSV). Overrides `paths.data` from the configuration.
    #[arg(short, long)]
    data: Option<PathBuf>,

    /// Where to write the result table. Overrides `paths.output`.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// TOML configuration file. Defaults to `feedmix.toml` when present.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Starting blend, comma separated kg per ingredient.
    /// Overrides `start.x0`. Without either, the mass target is split evenly.
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    x0: Option<Vec<f64>>,

    /// Show the charts once the blend is saved
    #[arg(long)]
    plot: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logging::init_cli_logger(args.verbose);

    let config_path = args.config.clone().or_else(|| {
        let path = Path::new(DEFAULT_CONFIG_PATH);
        path.exists().then(|| path.to_path_buf())
    });
    let mut config = match &config_path {
        Some(path) => RunConfig::from_file(path).with_context(|| {
            format!("failed to load configuration from '{}'", path.display())
        })?,
        None => RunConfig::default(),
    };
    if let Some(data) = args.data {
        config.paths.data = data;
    }
    if let Some(output) = args.output {
        config.paths.output = output;
    }
    if let Some(x0) = args.x0 {
        config.start.x0 = Some(x0);
    }
    tracing::debug!(?config, "configuration");

    let mut timings = StageTimings::default();

    let (table, elapsed) = timed(|| loader::load(&config.paths.data));
    timings.set(Stage::Load, elapsed);
    let table =
        table.with_context(|| format!("failed to load '{}'", config.paths.data.display()))?;

    let (model, elapsed) = timed(|| BlendModel::new(&table, &config.limits));
    timings.set(Stage::Define, elapsed);
    let model = model.context("failed to build the model")?;
    tracing::info!(constraints = model.constraints().len(), "model defined");

    let solver = BlendSolver::new(config.limits, config.solver);
    let x0 = config.start.x0.as_deref();
    let (outcome, elapsed) = timed(|| solver.solve_model(&model, x0, config.bounds.as_pair()));
    timings.set(Stage::Solve, elapsed);
    let outcome = outcome.context("failed to solve")?;

    let (written, elapsed) =
        timed(|| report::write_file(&config.paths.output, &table, &outcome, &config.labels));
    timings.set(Stage::Write, elapsed);

    println!("{}", timings);

    if let SolveOutcome::Failed(failure) = &outcome {
        eprintln!("No se encontro una mezcla ({}): {}", failure.kind, failure.message);
    }
    written.context("no blend was written")?;
    let blend = report::require_blend(&outcome)?;
    println!("Valor de la funcion objetivo: ${:.2}", blend.total_cost);
    println!("Resultados guardados en '{}'", config.paths.output.display());

    if args.plot {
        let shown =
            ChartData::new(&table, blend, &config.labels, &timings).and_then(plot::show);
        if let Err(e) = shown {
            tracing::error!("failed to draw the charts: {}", e);
        }
    }
    Ok(())
}
