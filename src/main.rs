// src/main.rs

use std::process::ExitCode;

use stepgraph::{cli, logging, run};

fn main() -> ExitCode {
    match run_main() {
        Ok(true) => ExitCode::SUCCESS,
        // Rejected graph or choices; details were already printed.
        Ok(false) => ExitCode::from(2),
        Err(err) => {
            eprintln!("stepgraph error: {err:?}");
            ExitCode::FAILURE
        }
    }
}

fn run_main() -> anyhow::Result<bool> {
    let args = cli::parse();
    logging::init_logging(args.log_level)?;
    run(args)
}
