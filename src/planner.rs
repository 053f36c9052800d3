use crate::clock::Clock;
use crate::model::{
    AppSettings, Category, CategoryPatch, Event, EventPatch, NewCategory, NewEvent, NewTask,
    SettingsPatch, Task, TaskPatch, DEFAULT_COLORS,
};
use crate::query;
use crate::storage::KeyValueStore;
use crate::store::{Record, Store, StoreError};
use crate::transfer::{self, DocumentFormat, ExportDocument, ImportSummary, TransferError};
use chrono::{DateTime, Local, NaiveDate, Utc};
use tracing::{debug, info, warn};

pub const UNCATEGORIZED: &str = "Uncategorized";

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum LookupError {
    #[error("no {kind} matches '{needle}'")]
    NotFound { kind: &'static str, needle: String },
    #[error("'{needle}' matches several {kind}s: {}", .candidates.join(", "))]
    Ambiguous {
        kind: &'static str,
        needle: String,
        candidates: Vec<String>,
    },
}

/// Owns the store and the in-memory copy of every collection. Mutations
/// are written through to the store before the copy changes, so a failed
/// write leaves both sides as they were.
#[derive(Debug)]
pub struct Planner<S, C> {
    store: Store<S, C>,
    events: Vec<Event>,
    tasks: Vec<Task>,
    categories: Vec<Category>,
    settings: AppSettings,
}

impl<S: KeyValueStore, C: Clock> Planner<S, C> {
    pub fn load(kv: S, clock: C) -> Self {
        let mut planner = Planner {
            store: Store::new(kv, clock),
            events: Vec::new(),
            tasks: Vec::new(),
            categories: Vec::new(),
            settings: AppSettings::default(),
        };
        planner.reload();
        planner
    }

    pub fn reload(&mut self) {
        self.events = self.store.all();
        self.tasks = self.store.all();
        self.categories = self.store.all();
        self.settings = self.store.settings();
        debug!(
            events = self.events.len(),
            tasks = self.tasks.len(),
            categories = self.categories.len(),
            "loaded planner state"
        );
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn settings(&self) -> &AppSettings {
        &self.settings
    }

    pub fn store(&self) -> &Store<S, C> {
        &self.store
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.store.now()
    }

    pub fn now_local(&self) -> DateTime<Local> {
        self.now().with_timezone(&Local)
    }

    pub fn today(&self) -> NaiveDate {
        self.now_local().date_naive()
    }

    pub fn add_event(&mut self, draft: NewEvent) -> Result<Event, StoreError> {
        let event: Event = self.store.create(draft)?;
        self.events.push(event.clone());
        Ok(event)
    }

    pub fn update_event(&mut self, id: &str, patch: &EventPatch) -> Result<Option<Event>, StoreError> {
        let updated = self.store.update::<Event>(id, patch)?;
        replace(&mut self.events, updated.as_ref());
        Ok(updated)
    }

    pub fn remove_event(&mut self, id: &str) -> Result<bool, StoreError> {
        let removed = self.store.remove::<Event>(id)?;
        if removed {
            self.events.retain(|e| e.id != id);
        }
        Ok(removed)
    }

    pub fn add_task(&mut self, draft: NewTask) -> Result<Task, StoreError> {
        let task: Task = self.store.create(draft)?;
        self.tasks.push(task.clone());
        Ok(task)
    }

    pub fn update_task(&mut self, id: &str, patch: &TaskPatch) -> Result<Option<Task>, StoreError> {
        let updated = self.store.update::<Task>(id, patch)?;
        replace(&mut self.tasks, updated.as_ref());
        Ok(updated)
    }

    /// Flips `completed`. `Ok(None)` when there is no such task.
    pub fn toggle_task(&mut self, id: &str) -> Result<Option<Task>, StoreError> {
        let Some(current) = self.tasks.iter().find(|t| t.id == id) else {
            return Ok(None);
        };
        let patch = TaskPatch {
            completed: Some(!current.completed),
            ..TaskPatch::default()
        };
        self.update_task(id, &patch)
    }

    pub fn remove_task(&mut self, id: &str) -> Result<bool, StoreError> {
        let removed = self.store.remove::<Task>(id)?;
        if removed {
            self.tasks.retain(|t| t.id != id);
        }
        Ok(removed)
    }

    pub fn add_category(&mut self, draft: NewCategory) -> Result<Category, StoreError> {
        let category: Category = self.store.create(draft)?;
        self.categories.push(category.clone());
        Ok(category)
    }

    pub fn update_category(
        &mut self,
        id: &str,
        patch: &CategoryPatch,
    ) -> Result<Option<Category>, StoreError> {
        let updated = self.store.update::<Category>(id, patch)?;
        replace(&mut self.categories, updated.as_ref());
        Ok(updated)
    }

    /// Events and tasks that point at the category keep the stale id.
    pub fn remove_category(&mut self, id: &str) -> Result<bool, StoreError> {
        let removed = self.store.remove::<Category>(id)?;
        if removed {
            self.categories.retain(|c| c.id != id);
        }
        Ok(removed)
    }

    pub fn update_settings(&mut self, patch: &SettingsPatch) -> Result<&AppSettings, StoreError> {
        self.settings = self.store.update_settings(patch)?;
        Ok(&self.settings)
    }

    pub fn category_usage(&self, id: &str) -> usize {
        query::category_usage(&self.events, &self.tasks, id)
    }

    pub fn category_name(&self, id: &str) -> &str {
        query::find_category(&self.categories, id)
            .map(|c| c.name.as_str())
            .unwrap_or(UNCATEGORIZED)
    }

    /// The category's color, or the first palette color when it is gone.
    pub fn category_color(&self, id: &str) -> String {
        query::find_category(&self.categories, id)
            .map(|c| c.color.clone())
            .unwrap_or_else(|| DEFAULT_COLORS[0].to_string())
    }

    pub fn resolve_event(&self, needle: &str) -> Result<&Event, LookupError> {
        resolve(&self.events, needle, "event")
    }

    pub fn resolve_task(&self, needle: &str) -> Result<&Task, LookupError> {
        resolve(&self.tasks, needle, "task")
    }

    pub fn resolve_category(&self, needle: &str) -> Result<&Category, LookupError> {
        resolve(&self.categories, needle, "category")
    }

    pub fn export_document(&mut self) -> ExportDocument {
        transfer::build_export(&mut self.store)
    }

    /// A document that fails to parse or validate writes nothing. A write
    /// that fails part way can leave earlier keys replaced; the in-memory
    /// copies are reloaded either way so they match storage.
    pub fn import_document(
        &mut self,
        text: &str,
        format: DocumentFormat,
    ) -> Result<ImportSummary, TransferError> {
        let result = transfer::import(&mut self.store, text, format);
        if let Err(TransferError::Store(err)) = &result {
            warn!(error = %err, "import write failed; reloading from storage");
            self.reload();
        }
        let summary = result?;
        self.reload();
        info!(?summary, "reloaded after import");
        Ok(summary)
    }
}

fn replace<T: Record>(items: &mut [T], updated: Option<&T>) {
    let Some(updated) = updated else {
        return;
    };
    if let Some(slot) = items.iter_mut().find(|item| item.id() == updated.id()) {
        *slot = updated.clone();
    }
}

/// Exact id first, then a unique id prefix.
pub fn resolve<'a, T: Record>(
    items: &'a [T],
    needle: &str,
    kind: &'static str,
) -> Result<&'a T, LookupError> {
    let needle = needle.trim();
    if let Some(exact) = items.iter().find(|item| item.id() == needle) {
        return Ok(exact);
    }
    let matches: Vec<&T> = if needle.is_empty() {
        Vec::new()
    } else {
        items.iter().filter(|item| item.id().starts_with(needle)).collect()
    };
    match matches.as_slice() {
        [only] => Ok(*only),
        [] => Err(LookupError::NotFound {
            kind,
            needle: needle.to_string(),
        }),
        many => Err(LookupError::Ambiguous {
            kind,
            needle: needle.to_string(),
            candidates: many.iter().map(|item| item.id().to_string()).collect(),
        }),
    }
}
