//! Add command handler.
//!
//! The store lives only as long as the process, so the added document is
//! visible to the optional `--query` search in the same invocation.

use super::{format_results, open_session};
use clap::Args;
use corpsearch_core::{config::AppConfig, AppResult};

/// Add a document, optionally searching afterwards
#[derive(Args, Debug)]
pub struct AddCommand {
    /// Document title
    #[arg(long)]
    pub title: String,

    /// Document category (any label, e.g. HR, IT)
    #[arg(long)]
    pub category: String,

    /// Document text
    #[arg(long)]
    pub content: String,

    /// Search after adding
    #[arg(long)]
    pub query: Option<String>,

    /// Number of results for --query
    #[arg(short = 'k', long = "top-k", allow_negative_numbers = true)]
    pub top_k: Option<i64>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AddCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing add command");

        let session = open_session(config).await?;
        let id = session
            .service
            .append(&self.title, &self.category, &self.content)
            .await?;

        let results = match &self.query {
            Some(query) => {
                let k = self.top_k.unwrap_or(session.default_top_k);
                Some(session.service.search(query, k).await?)
            }
            None => None,
        };

        if self.json {
            let output = serde_json::json!({
                "id": id,
                "results": results,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            println!("Added document #{}", id);
            if let Some(results) = results {
                print!("{}", format_results(&results));
            }
        }

        Ok(())
    }
}
