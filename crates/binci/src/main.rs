use anyhow::Result;
use binci_core::errors::{BinciError, RuntimeError};
use clap::Parser;

mod cli;
mod runner;

fn main() -> Result<()> {
    let parsed = cli::Cli::parse();

    match parsed.dispatch() {
        Ok(()) => Ok(()),
        Err(err) => {
            // Propagate the task's own exit code instead of a generic failure
            if let Some(BinciError::Runtime(RuntimeError::ExitStatus { code })) =
                err.downcast_ref::<BinciError>()
            {
                std::process::exit(*code);
            }

            Err(err)
        }
    }
}
