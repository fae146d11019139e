use clap::Parser;

use quant_lens::{Cli, run_cli};

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let args = Cli::parse();
    #[cfg(debug_assertions)]
    log::info!("Parsed arguments: {:?}", args);

    let output = run_cli(&args)?;
    println!("{}", output);
    Ok(())
}
