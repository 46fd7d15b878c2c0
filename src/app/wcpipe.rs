use anyhow::{Context, Result};
use clap::Parser;
use std::process::ExitCode;
use tokio::io::BufWriter;
use tokio_util::sync::CancellationToken;
use wcpipe::cmd::{self, Args};
use wcpipe::sink::ReportSink;
use wcpipe::Pipeline;

fn run(args: Args) -> Result<()> {
    let paths = cmd::resolve_inputs(&args.inputs)?;
    let config = cmd::pipeline_config(args.concurrency, args.buffer);
    let runtime = config.build_runtime()?;

    runtime.block_on(async move {
        let readers = cmd::open_inputs(&paths).await?;

        let cancel = CancellationToken::new();
        cmd::cancel_on_shutdown(cancel.clone());
        if let Some(deadline) = args.deadline() {
            cmd::cancel_after(cancel.clone(), deadline);
        }

        let sink = ReportSink::new(BufWriter::new(tokio::io::stdout()), args.format);
        let outcome = Pipeline::new(config).run(readers, sink, &cancel).await;
        // Stops the signal and deadline watchers.
        cancel.cancel();
        outcome.context("failed to process file")?;
        Ok::<(), anyhow::Error>(())
    })
}

fn main() -> ExitCode {
    let args = Args::parse();
    cmd::init_logging(args.debug);

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err:#}");
            ExitCode::FAILURE
        }
    }
}
