use anyhow::Result;
use clap::Parser;

use docmap_cli::{init_tracing, load_settings, read_record, run, Cli};

fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = load_settings(cli.config.as_deref()).map_err(|e| {
        eprintln!("Error loading config: {}", e);
        e
    })?;
    init_tracing(cli.log_level.as_deref().unwrap_or(&settings.log_level))?;

    let record = read_record(&cli.entity)?;
    let out = run(cli.command, &cli.declarations, &record, &settings)?;
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}
