//! `mcfrun`: run the build tool for requirement property files.

use clap::Parser;

mod cli;

fn main() -> anyhow::Result<()> {
    cli::Cli::parse().run()
}
