use crate::clock::Clock;
use crate::model::{AppSettings, Category, Event, Task};
use crate::store::{Store, StoreError, CATEGORIES_KEY, EVENTS_KEY, SETTINGS_KEY, TASKS_KEY};
use crate::storage::KeyValueStore;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info};

pub const EXPORT_VERSION: u64 = 1;

const COLLECTION_KEYS: [(&str, &str); 3] = [
    ("events", EVENTS_KEY),
    ("tasks", TASKS_KEY),
    ("categories", CATEGORIES_KEY),
];

#[derive(thiserror::Error, Debug)]
pub enum TransferError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid backup document: {0}")]
    Shape(String),
    #[error("backup version {found} is newer than supported version {supported}")]
    UnsupportedVersion { found: u64, supported: u64 },
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// The whole data set as written to a backup file.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    pub events: Vec<Event>,
    pub tasks: Vec<Task>,
    pub categories: Vec<Category>,
    pub settings: AppSettings,
    pub exported_at: String,
    pub version: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DocumentFormat {
    #[default]
    Json,
    Yaml,
}

/// Which parts of the data set an import replaced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub events: Option<usize>,
    pub tasks: Option<usize>,
    pub categories: Option<usize>,
    pub settings: bool,
}

impl DocumentFormat {
    /// YAML for `.yml`/`.yaml`, JSON for anything else.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .as_deref()
        {
            Some("yml") | Some("yaml") => DocumentFormat::Yaml,
            _ => DocumentFormat::Json,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            DocumentFormat::Json => "json",
            DocumentFormat::Yaml => "yaml",
        }
    }
}

impl FromStr for DocumentFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(DocumentFormat::Json),
            "yaml" | "yml" => Ok(DocumentFormat::Yaml),
            other => Err(format!("unknown format '{}' (use json or yaml)", other)),
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl ImportSummary {
    pub fn is_empty(&self) -> bool {
        self.events.is_none() && self.tasks.is_none() && self.categories.is_none() && !self.settings
    }
}

pub fn exported_at(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// `calendar-backup-YYYY-MM-DD.<ext>`
pub fn default_file_name(now: DateTime<Utc>, format: DocumentFormat) -> String {
    format!(
        "calendar-backup-{}.{}",
        now.format("%Y-%m-%d"),
        format.extension()
    )
}

pub fn build_export<S: KeyValueStore, C: Clock>(store: &mut Store<S, C>) -> ExportDocument {
    let document = ExportDocument {
        events: store.all(),
        tasks: store.all(),
        categories: store.all(),
        settings: store.settings(),
        exported_at: exported_at(store.now()),
        version: EXPORT_VERSION,
    };
    info!(
        events = document.events.len(),
        tasks = document.tasks.len(),
        categories = document.categories.len(),
        "built export document"
    );
    document
}

pub fn render(document: &ExportDocument, format: DocumentFormat) -> Result<String, TransferError> {
    match format {
        DocumentFormat::Json => Ok(serde_json::to_string_pretty(document)?),
        DocumentFormat::Yaml => Ok(serde_yaml::to_string(document)?),
    }
}

/// Replaces every collection (and the settings) present in `text`. The
/// document is checked in full before anything is written; keys are then
/// written one at a time, so a failing write leaves the earlier ones replaced.
pub fn import<S: KeyValueStore, C: Clock>(
    store: &mut Store<S, C>,
    text: &str,
    format: DocumentFormat,
) -> Result<ImportSummary, TransferError> {
    let root: Value = match format {
        DocumentFormat::Json => serde_json::from_str(text)?,
        DocumentFormat::Yaml => serde_yaml::from_str(text)?,
    };
    let Value::Object(fields) = root else {
        return Err(TransferError::Shape("top level must be an object".into()));
    };

    if let Some(version) = present(fields.get("version")) {
        let found = version
            .as_u64()
            .ok_or_else(|| TransferError::Shape("version must be a non-negative integer".into()))?;
        if found > EXPORT_VERSION {
            return Err(TransferError::UnsupportedVersion {
                found,
                supported: EXPORT_VERSION,
            });
        }
    }

    let mut writes: Vec<(&'static str, &Value)> = Vec::new();
    let mut summary = ImportSummary::default();
    for (field, key) in COLLECTION_KEYS {
        let Some(value) = present(fields.get(field)) else {
            continue;
        };
        let items = value
            .as_array()
            .ok_or_else(|| TransferError::Shape(format!("{} must be an array", field)))?;
        let count = Some(items.len());
        match field {
            "events" => summary.events = count,
            "tasks" => summary.tasks = count,
            _ => summary.categories = count,
        }
        writes.push((key, value));
    }
    if let Some(value) = present(fields.get("settings")) {
        if !value.is_object() {
            return Err(TransferError::Shape("settings must be an object".into()));
        }
        summary.settings = true;
        writes.push((SETTINGS_KEY, value));
    }

    for (key, value) in writes {
        store.save_raw(key, value)?;
        debug!(key, "imported key");
    }
    info!(?summary, "import finished");
    Ok(summary)
}

fn present(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| !v.is_null())
}
