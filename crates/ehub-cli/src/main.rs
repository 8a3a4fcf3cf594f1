use clap::Parser;
use ehub_cli::{Cli, Commands, EhubConfig};
use tracing::error;
use tracing_subscriber::FmtSubscriber;

mod commands;

use commands::solve::{Source, SolveOptions};

fn run(cli: &Cli) -> anyhow::Result<()> {
    let config = EhubConfig::load(cli.config.as_deref())?;

    match &cli.command {
        Commands::Validate { case } => commands::validate::handle(case),
        Commands::Topology { case } => commands::topology::handle(case),
        Commands::Build {
            case,
            snapshot,
            json,
            objective,
            big_m,
        } => {
            let model = config.model_config(objective.as_deref(), *big_m)?;
            commands::build::handle(case, model, snapshot.as_deref(), *json)
        }
        Commands::Solve {
            case,
            snapshot,
            solver,
            out,
            json,
        } => {
            let source = match (case, snapshot) {
                (_, Some(path)) => Source::Snapshot(path),
                (Some(path), None) => Source::Case(path),
                (None, None) => anyhow::bail!("either a case file or --snapshot is required"),
            };
            let options = SolveOptions {
                model: config.model_config(None, None)?,
                solver: config.solver(solver.as_deref())?,
                out: out.clone().or_else(|| config.output.directory.clone()),
                decimals: config.output.decimal_places,
                json: *json,
            };
            commands::solve::handle(source, options)
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(cli.log_level)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    if let Err(err) = run(&cli) {
        error!("{err:#}");
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
