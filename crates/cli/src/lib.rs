pub mod commands;

use clap::{Parser, Subcommand};
use giftfunnel_core::config::{AppConfig, LoadOptions, LogFormat};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "giftfunnel",
    about = "Gift funnel operator CLI",
    long_about = "Inspect the catalog, price selections, walk the purchase funnel end to end, and run readiness checks.",
    after_help = "Examples:\n  giftfunnel catalog\n  giftfunnel price --product 1 --product 3 --add-on premium-wrap\n  giftfunnel walk --fail-first\n  giftfunnel smoke"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(
        about = "List products (featured flagged) and add-ons with catalog integrity findings"
    )]
    Catalog,
    #[command(about = "Price a selection of products and add-ons with a step-by-step trace")]
    Price {
        #[arg(long = "product", help = "Product id to select (repeatable)")]
        products: Vec<String>,
        #[arg(long = "add-on", help = "Add-on id to select (repeatable)")]
        add_ons: Vec<String>,
    },
    #[command(
        about = "Walk a scripted shopper from quiz to confirmation with the simulated submitter"
    )]
    Walk {
        #[arg(long, help = "Script one failed submission before the successful retry")]
        fail_first: bool,
        #[arg(long, help = "Skip the upsell step instead of adding gift wrapping")]
        skip_upsell: bool,
        #[arg(long, default_value = "card", help = "Payment method: card, apple, or afterpay")]
        payment: String,
    },
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
    #[command(about = "Run readiness checks with per-check timing details")]
    Smoke,
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    if let Ok(config) = AppConfig::load(LoadOptions::default()) {
        init_logging(&config);
    }

    let result = match cli.command {
        Command::Catalog => commands::catalog::run(),
        Command::Price { products, add_ons } => commands::price::run(&products, &add_ons),
        Command::Walk { fail_first, skip_upsell, payment } => {
            commands::walk::run(commands::walk::WalkOptions { fail_first, skip_upsell, payment })
        }
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Smoke => commands::smoke::run(),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

/// Logs go to stderr so stdout stays machine-readable.
pub fn init_logging(config: &AppConfig) {
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(log_level)
        .with_writer(std::io::stderr);

    // A subscriber may already be installed (tests, embedding); keep it.
    let _ = match config.logging.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}
