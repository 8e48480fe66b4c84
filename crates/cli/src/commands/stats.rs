//! Stats command handler.

use super::open_session;
use clap::Args;
use corpsearch_core::{config::AppConfig, AppResult};
use corpsearch_knowledge::ServiceStats;

/// Show index and provider statistics
#[derive(Args, Debug)]
pub struct StatsCommand {
    /// Embed all documents before reporting
    #[arg(long)]
    pub sync: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl StatsCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing stats command");

        let session = open_session(config).await?;
        if self.sync {
            session.service.warm_up().await?;
        }

        let stats = session.service.stats().await;
        if self.json {
            println!("{}", serde_json::to_string_pretty(&stats)?);
        } else {
            print!("{}", format_stats(&stats));
        }

        Ok(())
    }
}

/// Render service statistics for the terminal.
pub fn format_stats(stats: &ServiceStats) -> String {
    let mut out = format!(
        "Documents:  {}\nIndexed:    {}\nModel:      {}\nDimensions: {}\n",
        stats.documents, stats.indexed, stats.model_version, stats.dimensions
    );

    match &stats.last_sync {
        Some(record) => out.push_str(&format!(
            "Last sync:  {} ({} embedded, {} reused)\n",
            record.at.format("%Y-%m-%d %H:%M:%S UTC"),
            record.stats.embedded,
            record.stats.reused
        )),
        None => out.push_str("Last sync:  never\n"),
    }

    out
}
