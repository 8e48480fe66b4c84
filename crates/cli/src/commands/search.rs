//! Search command handler.

use super::{format_results, open_session};
use clap::Args;
use corpsearch_core::{config::AppConfig, AppResult};

/// Search the knowledge base
#[derive(Args, Debug)]
pub struct SearchCommand {
    /// Query text
    pub query: String,

    /// Number of results (default from knowledge config)
    #[arg(short = 'k', long = "top-k", allow_negative_numbers = true)]
    pub top_k: Option<i64>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl SearchCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing search command");

        let session = open_session(config).await?;
        let k = self.top_k.unwrap_or(session.default_top_k);

        let results = session.service.search(&self.query, k).await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&results)?);
        } else {
            print!("{}", format_results(&results));
        }

        Ok(())
    }
}
