//! Punkt wejścia CLI dla kartograf

use anyhow::Result;
use clap::Parser;
use tracing::Level;
use tracing_subscriber::{fmt, EnvFilter};

use kartograf::cli::{self, Commands};

// Załaduj .env przy starcie
fn load_env() {
    // Szukaj .env w katalogu bieżącym lub obok binarki
    if dotenvy::dotenv().is_err() {
        if let Ok(exe) = std::env::current_exe() {
            if let Some(dir) = exe.parent() {
                let _ = dotenvy::from_path(dir.join(".env"));
            }
        }
    }
}

/// Parsowanie godeł i pobieranie danych NMT z GUGiK
#[derive(Parser)]
#[command(name = "kartograf")]
#[command(author, version)]
#[command(about = "Parsowanie godeł polskich map topograficznych i pobieranie danych NMT")]
struct Cli {
    /// Zwiększ szczegółowość logów (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Tryb cichy
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    load_env();

    let cli = Cli::parse();

    init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Parse {
            godlo,
            uklad,
            hierarchy,
            children,
            descendants,
        } => {
            cli::cmd_parse(&godlo, &uklad, hierarchy, children, descendants.as_deref())?;
        }
        Commands::Bbox { godlo, crs } => {
            cli::cmd_bbox(&godlo, &crs)?;
        }
        Commands::Download {
            godlo,
            scale,
            output,
            force,
            resolution,
            vertical_crs,
            jobs,
            report,
        } => {
            cli::cmd_download(
                &godlo,
                scale.as_deref(),
                output,
                force,
                resolution.as_deref(),
                vertical_crs.as_deref(),
                jobs,
                report,
            )
            .await?;
        }
        Commands::Grid {
            godlo,
            scale,
            output,
            crs,
        } => {
            cli::cmd_grid(&godlo, &scale, &output, &crs)?;
        }
        Commands::Missing {
            godlo,
            scale,
            output,
            resolution,
        } => {
            cli::cmd_missing(&godlo, &scale, output, resolution.as_deref())?;
        }
    }

    Ok(())
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => Level::WARN,
        (_, 0) => Level::INFO,
        (_, 1) => Level::DEBUG,
        (_, _) => Level::TRACE,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .init();
}
