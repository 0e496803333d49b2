use anyhow::Result;
use clap::Parser;

mod cli;
mod runtime;

fn main() -> Result<()> {
    let args = cli::Args::parse();
    runtime::execute(args)
}
