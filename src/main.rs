use clap::Parser;
use quantsim::cli::{Cli, init_tracing, run};

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    run(cli)
}
