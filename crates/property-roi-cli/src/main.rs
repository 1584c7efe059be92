mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::loan::PaymentArgs;
use commands::projection::ProjectArgs;
use commands::rental::EvaluateArgs;
use commands::scoring::ScoreArgs;
use commands::time_value::{IrrArgs, NpvArgs};

/// Rental property ROI analysis with decimal precision
#[derive(Parser)]
#[command(
    name = "proi",
    version,
    about = "Rental property ROI analysis and investment scoring",
    long_about = "A CLI for evaluating leveraged rental property investments with decimal \
                  precision. Computes mortgage amortization, operating cash flow, return \
                  ratios, holding-period IRR/NPV and composite investment scores."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Full rental property evaluation with scores and recommendation
    Evaluate(EvaluateArgs),
    /// Monthly mortgage payment and amortization schedule
    Payment(PaymentArgs),
    /// Project holding-period cash flows with a terminal sale
    Project(ProjectArgs),
    /// Net present value of an outlay and year-end cash flows
    Npv(NpvArgs),
    /// Internal rate of return by bisection
    Irr(IrrArgs),
    /// Composite scores from pre-computed factors
    Score(ScoreArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_tracing() {
    // stdout carries results; diagnostics go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Evaluate(args) => commands::rental::run_evaluate(args),
        Commands::Payment(args) => commands::loan::run_payment(args),
        Commands::Project(args) => commands::projection::run_project(args),
        Commands::Npv(args) => commands::time_value::run_npv(args),
        Commands::Irr(args) => commands::time_value::run_irr(args),
        Commands::Score(args) => commands::scoring::run_score(args),
        Commands::Version => {
            println!("proi {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
