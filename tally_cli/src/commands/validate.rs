use crate::config::load_from_file;
use crate::ui::{self, Status};
use anyhow::Result;
use std::path::PathBuf;

pub async fn execute(config_file: PathBuf) -> Result<()> {
    ui::header("Validating Configuration");
    println!("File: {}", config_file.display());

    match load_from_file(&config_file).await {
        Ok(config) => {
            println!();
            ui::status(Status::Ok, "Configuration is valid!");
            println!("\nConfiguration Details:");
            println!("  Listen: {}", config.listen);
            println!("  Log level: {}", config.log_level);
            if let Some(path) = &config.log_file {
                println!("  Log file: {}", path.display());
            }
            println!(
                "  Summary interval: {}",
                humantime::format_duration(config.summary_interval)
            );
            println!("  Self metrics: {}", config.self_metrics);
            println!("  Declared metrics: {}", config.metrics.len());

            if config.metrics.is_empty() {
                println!();
                let note = if config.self_metrics {
                    "No metrics declared; only self metrics will be exported"
                } else {
                    "No metrics declared and self metrics disabled; exports will be empty"
                };
                ui::status(Status::Warning, note);
            }

            Ok(())
        }
        Err(e) => {
            println!();
            ui::status(Status::Failed, "Configuration is invalid!");
            println!("\nError: {}", e);
            Err(e)
        }
    }
}
