use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use common::{
    config::ReportConfig,
    order::{compute_display_order, validate_scheme_coverage},
    result::load,
};
use eyre::Result;
use scheme_plots::Report;
use tracing::{error, warn};
use tracing_subscriber::{
    EnvFilter,
    fmt::{layer, time::ChronoLocal},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

/// Library crates whose logs follow the global level unless overridden
const MODULES: &[&str] = &["common", "scheme_plots"];

#[derive(Parser)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    #[arg(short, long)]
    log: Vec<String>,
}

#[derive(Args)]
struct Inputs {
    /// Report config yaml, built-in defaults when omitted
    #[arg(short, long)]
    config_file: Option<PathBuf>,
    /// Benchmark results csv, overrides the config
    #[arg(short, long)]
    data: Option<PathBuf>,
}

impl Inputs {
    fn config(&self) -> Result<ReportConfig> {
        let mut config = match &self.config_file {
            Some(path) => ReportConfig::load(path)?,
            None => ReportConfig::default(),
        };
        if let Some(data) = &self.data {
            config.data_path = data.clone();
        }
        Ok(config)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Render every chart for every corpus
    Plot {
        #[command(flatten)]
        inputs: Inputs,
        /// Output folder, overrides the config
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Print the scheme display order, one group per line
    Order {
        #[command(flatten)]
        inputs: Inputs,
    },
    /// Validate the results without rendering
    Check {
        #[command(flatten)]
        inputs: Inputs,
    },
}

fn main() -> Result<()> {
    let log_level = std::env::var("RUST_LOG").unwrap_or("warn".to_owned());
    let args = Cli::parse();
    let file_appender = tracing_appender::rolling::never(".", "log.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    let mut env_filter = EnvFilter::new(format!("compression_report={log_level}"));

    for log in &args.log {
        env_filter = env_filter.add_directive(log.parse()?);
    }

    for module in MODULES {
        if !args.log.iter().any(|x| x.starts_with(module)) {
            env_filter = env_filter.add_directive(format!("{module}={log_level}").parse()?);
        }
    }

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            layer()
                .with_timer(ChronoLocal::new("%v %k:%M:%S %z".to_owned()))
                .compact(),
        )
        .with(layer().with_writer(non_blocking))
        .init();

    if let Err(err) = run(args.command) {
        error!("{err:#?}");
        return Err(err);
    }
    Ok(())
}

fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Plot { inputs, out } => {
            let mut config = inputs.config()?;
            if let Some(out) = out {
                config.plot_path = out;
            }
            let report = Report::prepare(&config)?;
            for path in report.render(&config.plot_path)? {
                println!("{}", path.display());
            }
        }
        Commands::Order { inputs } => {
            let config = inputs.config()?;
            let rows = load(&config.data_path)?;
            let order = compute_display_order(
                &rows,
                &config.group_names(),
                &config.reference_corpus,
                &config.baseline_scheme,
            )?;
            for group in order.groups() {
                println!("{}", group.join(", "));
            }
            let missing = validate_scheme_coverage(&rows, &order);
            if !missing.is_empty() {
                warn!("Schemes missing from every group: {missing:?}");
            }
        }
        Commands::Check { inputs } => {
            let config = inputs.config()?;
            let report = Report::prepare(&config)?;
            let charts = report.charts()?;
            println!(
                "{} rows, {} schemes, {} charts ok",
                report.rows.len(),
                report.order.len(),
                charts.len()
            );
        }
    }
    Ok(())
}
