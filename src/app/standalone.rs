use anyhow::Result;
use clap::Parser;
use std::io::{self, BufWriter, Write};
use std::process::ExitCode;
use wcpipe::standalone::{engine::count_files, Args};
use wcpipe::cmd;

fn run_standalone_job(args: Args) -> Result<()> {
    let paths = cmd::resolve_inputs(&args.inputs)?;
    let totals = count_files(&paths, args.buckets)?;

    let mut out = BufWriter::new(io::stdout().lock());
    for record in &totals {
        out.write_all(args.format.render(record)?.as_bytes())?;
    }
    out.flush()?;
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    cmd::init_logging(args.debug);

    match run_standalone_job(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err:#}");
            ExitCode::FAILURE
        }
    }
}
