//! `xd` command line.
//!
//! Usage:
//!   xd export <SNAPSHOT> [--format plugin|svg|html] [--name NAME] [-o OUT]
//!   xd lint <SNAPSHOT>
//!   xd import <EXPORT> [--font FAMILY:STYLE ...]
//!   xd links <PROJECT> [--store DIR]

use clap::Parser;
use xd_cli::{Cli, run};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    match run(&cli).await {
        Ok(report) => {
            print!("{}", report.stdout);
            if report.failed {
                std::process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(2);
        }
    }
}
