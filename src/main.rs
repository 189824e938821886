//! docsmith CLI entry point.

use clap::Parser;
use docsmith::cli::{self, Cli, EXIT_ERROR};
use docsmith::logger;

fn main() {
    let cli = Cli::parse();
    logger::init_logger(cli.verbose, cli.quiet);

    let exit_code = match cli::run(&cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            EXIT_ERROR
        }
    };

    std::process::exit(exit_code);
}
