use std::io::Write;

use args::Command;
use clap::crate_version;
use engine::Response;
use tokio::sync::mpsc;

mod args;
mod garage;
mod telemetry;

const THREAD_NAME: &str = "garage";

fn main() -> anyhow::Result<()> {
    let args = self::args::parse();
    telemetry::init(&args);

    let config = args.config()?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name(THREAD_NAME)
        .build()?;

    runtime.block_on(async move {
        let crate_version = crate_version!();
        tracing::info!("Garage {crate_version}");

        let garage = garage::Garage::build(&config)?;

        match args.command {
            Command::Schema => {
                print!("{}", garage.schema.sdl());
            }
            Command::Run { files, variables } => {
                let operations = garage::read_operations(&files, variables)?;
                let (sender, mut receiver) = mpsc::unbounded_channel();

                let printer = tokio::spawn(async move {
                    while let Some(response) = receiver.recv().await {
                        print_response(&response)?;
                    }
                    Ok::<(), anyhow::Error>(())
                });

                garage.run(operations, sender).await?;
                printer.await??;
            }
        }

        Ok::<(), anyhow::Error>(())
    })?;

    Ok(())
}

fn print_response(response: &Response) -> anyhow::Result<()> {
    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer(&mut stdout, response)?;
    writeln!(stdout)?;

    Ok(())
}
