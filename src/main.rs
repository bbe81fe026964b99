use clap::Parser;
use filesorter::cli::{Cli, run_cli_with_config};
use filesorter::logging;
use filesorter::output::OutputFormatter;
use tracing::error;

fn main() {
    let cli = Cli::parse();

    logging::init(cli.verbose);

    let (command, dir, config) = cli.invocation();
    if let Err(e) = run_cli_with_config(command, dir, config) {
        error!("{}", e);
        OutputFormatter::error(&e);
        std::process::exit(1);
    }
}
