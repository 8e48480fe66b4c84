//! Interactive shell command handler.
//!
//! Reads one command per line from stdin:
//!
//! ```text
//! :add title | category | content
//! :list
//! :stats
//! :k N
//! :quit
//! <anything else is a query>
//! ```

use super::stats::format_stats;
use super::{format_documents, format_results, open_session, Session};
use clap::Args;
use corpsearch_core::{config::AppConfig, AppError, AppResult};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Interactive search session
#[derive(Args, Debug)]
pub struct ShellCommand {
    /// Initial number of results per query
    #[arg(short = 'k', long = "top-k", allow_negative_numbers = true)]
    pub top_k: Option<i64>,
}

/// One parsed shell line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellInput {
    Add {
        title: String,
        category: String,
        content: String,
    },
    List,
    Stats,
    SetK(i64),
    Quit,
    Query(String),
    Empty,
}

impl ShellInput {
    pub fn parse(line: &str) -> AppResult<Self> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(ShellInput::Empty);
        }

        let Some(rest) = line.strip_prefix(':') else {
            return Ok(ShellInput::Query(line.to_string()));
        };

        let (command, args) = match rest.split_once(char::is_whitespace) {
            Some((command, args)) => (command, args.trim()),
            None => (rest, ""),
        };

        match command {
            "add" => {
                let parts: Vec<&str> = args.splitn(3, '|').map(str::trim).collect();
                match parts.as_slice() {
                    [title, category, content] => Ok(ShellInput::Add {
                        title: title.to_string(),
                        category: category.to_string(),
                        content: content.to_string(),
                    }),
                    _ => Err(AppError::InvalidArgument(
                        "usage: :add title | category | content".to_string(),
                    )),
                }
            }
            "list" => Ok(ShellInput::List),
            "stats" => Ok(ShellInput::Stats),
            "k" => args.parse::<i64>().map(ShellInput::SetK).map_err(|_| {
                AppError::InvalidArgument(format!("usage: :k N (got '{}')", args))
            }),
            "quit" | "q" | "exit" => Ok(ShellInput::Quit),
            other => Err(AppError::InvalidArgument(format!(
                "unknown command ':{}'",
                other
            ))),
        }
    }
}

impl ShellCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing shell command");

        let session = open_session(config).await?;
        let mut k = checked_k(self.top_k.unwrap_or(session.default_top_k))?;

        println!(
            "corpsearch shell: {} documents. Type a query, or :add, :list, :stats, :k N, :quit",
            session.service.size().await
        );

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            print!("> ");
            std::io::stdout().flush()?;

            let Some(line) = lines.next_line().await? else {
                break;
            };

            let input = match ShellInput::parse(&line) {
                Ok(input) => input,
                Err(e) => {
                    eprintln!("{}", e);
                    continue;
                }
            };

            if input == ShellInput::Quit {
                break;
            }

            if let Err(e) = run_line(&session, &mut k, input).await {
                if e.is_provider_error() {
                    tracing::warn!("Provider call failed in shell: {}", e);
                    eprintln!("Error: {} (index unchanged, try again)", e);
                } else {
                    eprintln!("Error: {}", e);
                }
            }
        }

        Ok(())
    }
}

fn checked_k(k: i64) -> AppResult<i64> {
    if k < 0 {
        return Err(AppError::InvalidArgument(format!(
            "k must be non-negative, got {}",
            k
        )));
    }
    Ok(k)
}

async fn run_line(session: &Session, k: &mut i64, input: ShellInput) -> AppResult<()> {
    let service = &session.service;

    match input {
        ShellInput::Add {
            title,
            category,
            content,
        } => {
            let id = service.append(title, category, content).await?;
            println!("Added document #{}", id);
        }
        ShellInput::List => print!("{}", format_documents(&service.list().await)),
        ShellInput::Stats => print!("{}", format_stats(&service.stats().await)),
        ShellInput::SetK(value) => {
            *k = checked_k(value)?;
            println!("k = {}", value);
        }
        ShellInput::Query(query) => {
            let results = service.search(&query, *k).await?;
            print!("{}", format_results(&results));
        }
        ShellInput::Quit | ShellInput::Empty => {}
    }

    Ok(())
}
