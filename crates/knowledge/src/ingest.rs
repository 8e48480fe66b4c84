//! Bulk loading of documents from files.
//!
//! Supported formats, chosen by extension:
//! - `.jsonl`: one `{title, category, content}` object per line
//! - `.json`: an array of such objects
//! - `.yaml` / `.yml`: a sequence of such mappings
//! - `.csv`: a header row naming the columns, then one record per row
//!
//! Missing titles become "Untitled" and missing categories "General". A
//! file is loaded entirely or not at all.

use crate::store::DocumentStore;
use crate::types::{DocId, NewDocument};
use corpsearch_core::{AppError, AppResult};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_TITLE: &str = "Untitled";
pub const DEFAULT_CATEGORY: &str = "General";

/// A record as it appears in a source file. Unknown fields are ignored.
#[derive(Debug, Deserialize)]
struct RawRecord {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    content: Option<String>,
}

/// Where the documents of a load came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestSource {
    /// Loaded from this file
    File(PathBuf),
    /// Seeded with the built-in document set
    Defaults,
    /// Nothing was loaded; the store kept its documents
    Unchanged,
}

/// Outcome of `load_or_default`.
#[derive(Debug)]
pub struct IngestReport {
    pub source: IngestSource,
    /// Ids of the documents appended by this load
    pub loaded: Vec<DocId>,
    /// Parse or read failure of the requested file, if any
    pub error: Option<AppError>,
}

/// The built-in corporate knowledge base.
pub fn default_documents() -> Vec<NewDocument> {
    vec![
        NewDocument::new(
            "Оформление отпуска",
            "HR",
            "Для оформления ежегодного оплачиваемого отпуска необходимо подать заявление в HR-отдел не позднее чем за 2 недели до начала. Заявление подписывается руководителем.",
        ),
        NewDocument::new(
            "Настройка VPN",
            "IT",
            "Для удаленного доступа к сети компании используйте клиент OpenVPN. Сервер: vpn.company.com. Логин и пароль как от компьютера.",
        ),
        NewDocument::new(
            "Дресс-код",
            "HR",
            "В компании принят стиль Business Casual. По пятницам разрешен свободный стиль одежды (джинсы, футболки).",
        ),
        NewDocument::new(
            "Квартальные отчеты",
            "Финансы",
            "Финансовые отчеты сдаются до 5 числа месяца. Шаблоны лежат на диске Z в папке Finance.",
        ),
        NewDocument::new(
            "Заказ пропусков",
            "Офис",
            "Для заказа гостевого пропуска напишите на ресепшн за 3 часа до визита. Укажите ФИО и номер машины.",
        ),
        NewDocument::new(
            "Почта на телефоне",
            "IT",
            "Для настройки почты Outlook на iPhone используйте сервер mail.company.com и порт 993.",
        ),
        NewDocument::new(
            "Потеря пропуска",
            "Безопасность",
            "При утере пропуска срочно звоните в охрану по номеру 1122 для блокировки доступа.",
        ),
        NewDocument::new(
            "Выплата зарплаты",
            "Бухгалтерия",
            "Аванс выплачивается 20-го числа, основная часть зарплаты - 5-го числа следующего месяца.",
        ),
    ]
}

/// Parse a document file without touching any store.
///
/// # Errors
/// * `AppError::IngestionParse` - Unsupported extension, text that is not
///   UTF-8, malformed syntax or a record with blank content
/// * `AppError::Io` - The file could not be read
pub fn parse_file(path: &Path) -> AppResult<Vec<NewDocument>> {
    let source_name = path.display().to_string();
    let parse_error = |message: String| AppError::IngestionParse {
        source_name: source_name.clone(),
        message,
    };

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    let text = std::fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::InvalidData => parse_error("file is not valid UTF-8".to_string()),
        _ => AppError::Io(e),
    })?;

    // (position label, record)
    let records: Vec<(String, RawRecord)> = match extension.as_str() {
        "jsonl" => {
            let mut records = Vec::new();
            for (line_num, line) in text.lines().enumerate() {
                if line.trim().is_empty() {
                    continue;
                }
                let record: RawRecord = serde_json::from_str(line)
                    .map_err(|e| parse_error(format!("line {}: {}", line_num + 1, e)))?;
                records.push((format!("line {}", line_num + 1), record));
            }
            records
        }
        "json" => serde_json::from_str::<Vec<RawRecord>>(&text)
            .map_err(|e| parse_error(e.to_string()))?
            .into_iter()
            .enumerate()
            .map(|(i, r)| (format!("record {}", i + 1), r))
            .collect(),
        "yaml" | "yml" => serde_yaml::from_str::<Option<Vec<RawRecord>>>(&text)
            .map_err(|e| parse_error(e.to_string()))?
            .unwrap_or_default()
            .into_iter()
            .enumerate()
            .map(|(i, r)| (format!("record {}", i + 1), r))
            .collect(),
        "csv" => {
            let mut reader = csv::ReaderBuilder::new()
                .trim(csv::Trim::All)
                .from_reader(text.as_bytes());
            let mut records = Vec::new();
            for (row, result) in reader.deserialize::<RawRecord>().enumerate() {
                let record =
                    result.map_err(|e| parse_error(format!("row {}: {}", row + 1, e)))?;
                records.push((format!("row {}", row + 1), record));
            }
            records
        }
        other => {
            return Err(parse_error(format!(
                "unsupported file extension '{}' (expected .jsonl, .json, .yaml, .yml or .csv)",
                other
            )))
        }
    };

    let mut documents = Vec::with_capacity(records.len());
    for (position, record) in records {
        let content = record.content.unwrap_or_default();
        if content.trim().is_empty() {
            return Err(parse_error(format!("{}: content is blank", position)));
        }

        documents.push(NewDocument::new(
            non_blank_or(record.title, DEFAULT_TITLE),
            non_blank_or(record.category, DEFAULT_CATEGORY),
            content,
        ));
    }

    tracing::debug!("Parsed {} documents from {}", documents.len(), source_name);
    Ok(documents)
}

fn non_blank_or(value: Option<String>, default: &str) -> String {
    value
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// Parse `path` and append all of its documents to `store`.
pub async fn load_file(store: &DocumentStore, path: &Path) -> AppResult<Vec<DocId>> {
    let documents = parse_file(path)?;
    let ids = store.append_many(documents).await?;
    tracing::info!("Loaded {} documents from {}", ids.len(), path.display());
    Ok(ids)
}

/// Load documents from `path`, falling back to the built-in set.
///
/// - No path, or the file does not exist: seed the defaults if the store is empty.
/// - The file fails to load: report the error; seed the defaults only if
///   the store is empty, otherwise leave it as it was.
pub async fn load_or_default(store: &DocumentStore, path: Option<&Path>) -> AppResult<IngestReport> {
    let mut error = None;

    match path {
        Some(path) if path.exists() => match load_file(store, path).await {
            Ok(loaded) => {
                return Ok(IngestReport {
                    source: IngestSource::File(path.to_path_buf()),
                    loaded,
                    error: None,
                })
            }
            Err(e) => {
                tracing::warn!("Failed to load documents from {}: {}", path.display(), e);
                error = Some(e);
            }
        },
        Some(path) => {
            tracing::info!("Document file {} not found", path.display());
        }
        None => {}
    }

    if store.size().await > 0 {
        return Ok(IngestReport {
            source: IngestSource::Unchanged,
            loaded: Vec::new(),
            error,
        });
    }

    let loaded = store.append_many(default_documents()).await?;
    tracing::info!("Seeded {} built-in documents", loaded.len());

    Ok(IngestReport {
        source: IngestSource::Defaults,
        loaded,
        error,
    })
}
