use crate::config::load_from_file;
use crate::ui::{self, Status};
use anyhow::Result;
use colored::Colorize;
use std::path::PathBuf;
use tally_core::Kind;

pub async fn execute(config_file: PathBuf) -> Result<()> {
    ui::header("Declared Metrics");

    let config = load_from_file(&config_file).await?;

    println!("\nTotal metrics: {}\n", config.metrics.len());

    for decl in &config.metrics {
        let kind = Kind::from(decl.kind);
        let keys = if decl.keys.is_empty() {
            "-".to_string()
        } else {
            decl.keys.join(", ")
        };
        println!(
            "  {} {} [{}] program={} keys={}",
            "•".green(),
            decl.name.bold(),
            kind.as_str().yellow(),
            decl.program,
            keys
        );
    }

    if config.metrics.is_empty() {
        ui::status(Status::Warning, "Nothing to list");
    }

    Ok(())
}
