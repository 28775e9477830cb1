use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

/// Compile cminus source files to textual LLVM-IR.
#[derive(Parser, Debug)]
#[command(name = "cminus", version, about, long_about = None)]
struct Cli {
    /// Enable per-statement debug output
    #[arg(short, long)]
    debug: bool,

    /// Destination path for the emitted LLVM-IR
    #[arg(short, long, value_name = "PATH", default_value = "out.ll")]
    outfile: PathBuf,

    /// Source files to compile; each is compiled independently into the
    /// same outfile, so with several inputs the last one wins
    #[arg(value_name = "INFILES")]
    infiles: Vec<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    execute(cli)
}

fn execute(cli: Cli) -> Result<()> {
    for infile in &cli.infiles {
        let source_name = infile.display().to_string();
        let source = fs::read_to_string(infile)
            .with_context(|| format!("unable to open file '{source_name}'"))?;

        let outfile = File::create(&cli.outfile)
            .with_context(|| format!("unable to create file '{}'", cli.outfile.display()))?;
        let mut writer = BufWriter::new(outfile);

        cminus_core::compile(&source, &source_name, &mut writer, cli.debug)
            .with_context(|| format!("failed to compile '{source_name}'"))?;
        writer
            .flush()
            .with_context(|| format!("unable to finish writing '{}'", cli.outfile.display()))?;

        if cli.debug {
            println!("Successfully written to '{}'.", cli.outfile.display());
        }
    }

    Ok(())
}
