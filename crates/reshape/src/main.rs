use clap::{Parser, Subcommand};
use reshape::commands::{check, generate};
use reshape::config::ReshapeConfig;
use tracing_subscriber::EnvFilter;

/// Generate Go conversion functions between schemas.
#[derive(Parser)]
#[command(name = "reshape", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write conversion functions and their helpers as one Go file
    Generate(generate::GenerateArgs),
    /// Synthesize every request without writing output
    Check(check::CheckArgs),
}

/// Log to stderr, filtered by `RESHAPE_LOG` (default `warn`).
fn init_tracing() {
    let filter = EnvFilter::try_from_env("RESHAPE_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let root = std::env::current_dir().unwrap_or_else(|_| ".".into());
    let config = match ReshapeConfig::load(&root) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e:#}");
            std::process::exit(1);
        }
    };

    let code = match cli.command {
        Command::Generate(args) => generate::run(args, &config),
        Command::Check(args) => check::run(args, &config),
    };
    std::process::exit(code);
}
