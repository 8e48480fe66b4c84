//! List command handler.

use super::{format_documents, open_session};
use clap::Args;
use corpsearch_core::{config::AppConfig, AppResult};

/// List all documents
#[derive(Args, Debug)]
pub struct ListCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl ListCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing list command");

        let session = open_session(config).await?;
        let documents = session.service.list().await;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&documents)?);
        } else {
            print!("{}", format_documents(&documents));
        }

        Ok(())
    }
}
