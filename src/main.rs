//! fanpipe CLI: `copy` a directory tree or `scrape` a page's images through a bounded worker pool.

use anyhow::Result;
use clap::Parser;
use fanpipe::engine::arg_parser::Cli;
use fanpipe::engine::handle_run;
use std::time::Instant;

fn main() -> Result<()> {
    let start_time = Instant::now();
    let cli = Cli::parse();
    let code = handle_run(&cli)?;
    log::debug!("Total time: {:?}", start_time.elapsed());
    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}
