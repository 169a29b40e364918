//! `numen` CLI: run one or more Numen source files in order.

use std::path::PathBuf;
use std::process;

use clap::Parser as ClapParser;

#[derive(ClapParser)]
#[command(name = "numen")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Numen - a stack-based concatenative language interpreter", long_about = None)]
struct Cli {
    /// Source files to run, in order.
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Enable verbose (debug-level) logging.
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();

    let default_directive = if cli.verbose { "numen=debug" } else { "numen=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(default_directive.parse().expect("static directive")),
        )
        .with_writer(std::io::stderr)
        .init();

    for path in &cli.files {
        tracing::info!(file = %path.display(), "running");

        let source = match std::fs::read_to_string(path) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("error reading {}: {e}", path.display());
                process::exit(1);
            }
        };

        // Stop at the first fatal error across the given files, rather than
        // attempting the rest with a partial/undefined program state.
        if let Err(e) = numen::run_source(&source) {
            eprintln!("{}: {e}", path.display());
            process::exit(1);
        }
    }
}
