use clap::Parser;
use console::style;

use lintpass::cli::{self, Cli, EXIT_FAILURE};

fn main() {
    let cli = Cli::parse();
    cli::init_tracing(cli.verbose, cli.quiet);

    let code = match cli.run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {:#}", style("✖").red(), e);
            EXIT_FAILURE
        }
    };
    std::process::exit(code);
}
