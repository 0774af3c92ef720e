//! On-disk analysis history.
//!
//! One JSON file per completed analysis, plus a separate file for the
//! shopper's stored preferences. This is an append store: the core never
//! rewrites past entries.

use std::path::{Path, PathBuf};

use chrono::Utc;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::preferences::Preferences;
use crate::types::ProductData;

const PREFERENCES_FILE: &str = "user_preferences.json";
const MAX_STEM_LEN: usize = 100;

pub struct HistoryStore {
    root: PathBuf,
}

impl HistoryStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Append one analysis entry. Returns the entry id.
    pub async fn store_analysis(
        &self,
        product: &ProductData,
        report: &Value,
        preferences: &Preferences,
    ) -> CoreResult<String> {
        self.ensure_root().await?;

        let stamp = Utc::now().format("%Y%m%d_%H%M%S");
        let id = format!(
            "{}_{}_{}",
            sanitize_stem(&product.title),
            stamp,
            &Uuid::new_v4().simple().to_string()[..8]
        );
        let entry = json!({
            "id": id,
            "product": product,
            "report": report,
            "preferences": preferences,
            "stored_at": Utc::now().to_rfc3339(),
        });

        let path = self.root.join(format!("{id}.json"));
        write_json(&path, &entry).await?;
        tracing::info!(entry_id = %id, "stored analysis");
        Ok(id)
    }

    /// Load one entry by id.
    pub async fn load(&self, id: &str) -> CoreResult<Option<Value>> {
        read_json(&self.root.join(format!("{}.json", sanitize_stem(id)))).await
    }

    /// Most recent entries, newest first.
    pub async fn recent(&self, limit: usize) -> CoreResult<Vec<Value>> {
        let mut stamped = Vec::new();
        for path in self.entry_paths().await? {
            let modified = tokio::fs::metadata(&path)
                .await
                .and_then(|metadata| metadata.modified())
                .map_err(|error| {
                    CoreError::Internal(format!("history metadata: {error}"))
                })?;
            stamped.push((modified, path));
        }
        stamped.sort_by(|a, b| b.0.cmp(&a.0));

        let mut entries = Vec::new();
        for (_, path) in stamped.into_iter().take(limit) {
            if let Some(entry) = read_json(&path).await? {
                entries.push(entry);
            }
        }
        Ok(entries)
    }

    /// Entries whose product title or report content matches the query.
    pub async fn search(&self, query: &str) -> CoreResult<Vec<Value>> {
        let needle = query.to_lowercase();
        let mut matches = Vec::new();
        for path in self.entry_paths().await? {
            let Some(entry) = read_json(&path).await? else {
                continue;
            };
            let title = entry
                .pointer("/product/title")
                .and_then(Value::as_str)
                .unwrap_or("")
                .to_lowercase();
            let report = entry
                .get("report")
                .map(|report| report.to_string().to_lowercase())
                .unwrap_or_default();
            if title.contains(&needle) || report.contains(&needle) {
                matches.push(entry);
            }
        }
        Ok(matches)
    }

    pub async fn store_preferences(&self, preferences: &Preferences) -> CoreResult<()> {
        self.ensure_root().await?;
        let value = serde_json::to_value(preferences)
            .map_err(|error| CoreError::Internal(format!("preferences serialize: {error}")))?;
        write_json(&self.root.join(PREFERENCES_FILE), &value).await
    }

    pub async fn load_preferences(&self) -> CoreResult<Option<Preferences>> {
        let Some(value) = read_json(&self.root.join(PREFERENCES_FILE)).await? else {
            return Ok(None);
        };
        serde_json::from_value(value)
            .map(Some)
            .map_err(|error| CoreError::Internal(format!("preferences parse: {error}")))
    }

    async fn ensure_root(&self) -> CoreResult<()> {
        tokio::fs::create_dir_all(&self.root).await.map_err(|error| {
            CoreError::Internal(format!(
                "failed to create history directory {}: {error}",
                self.root.display()
            ))
        })
    }

    async fn entry_paths(&self) -> CoreResult<Vec<PathBuf>> {
        let mut reader = match tokio::fs::read_dir(&self.root).await {
            Ok(reader) => reader,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Vec::new())
            }
            Err(error) => {
                return Err(CoreError::Internal(format!("history read dir: {error}")))
            }
        };

        let mut paths = Vec::new();
        while let Some(entry) = reader
            .next_entry()
            .await
            .map_err(|error| CoreError::Internal(format!("history read dir: {error}")))?
        {
            let path = entry.path();
            let is_json = path.extension().is_some_and(|extension| extension == "json");
            let is_preferences = path
                .file_name()
                .is_some_and(|name| name == PREFERENCES_FILE);
            if is_json && !is_preferences {
                paths.push(path);
            }
        }
        Ok(paths)
    }
}

/// Reduce a title to a filesystem-safe file stem.
fn sanitize_stem(raw: &str) -> String {
    let mut stem: String = raw
        .chars()
        .filter(|character| {
            character.is_alphanumeric() || matches!(character, ' ' | '_' | '-')
        })
        .take(MAX_STEM_LEN)
        .collect::<String>()
        .replace(' ', "_");
    if stem.is_empty() {
        stem.push_str("entry");
    }
    stem
}

async fn write_json(path: &Path, value: &Value) -> CoreResult<()> {
    let serialized = serde_json::to_vec_pretty(value)
        .map_err(|error| CoreError::Internal(format!("history serialize: {error}")))?;
    tokio::fs::write(path, serialized).await.map_err(|error| {
        CoreError::Internal(format!(
            "failed to write history file {}: {error}",
            path.display()
        ))
    })
}

async fn read_json(path: &Path) -> CoreResult<Option<Value>> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(error) => {
            return Err(CoreError::Internal(format!(
                "failed to read history file {}: {error}",
                path.display()
            )))
        }
    };
    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|error| CoreError::Internal(format!("history parse: {error}")))
}
