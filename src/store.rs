use crate::clock::Clock;
use crate::ids::generate_id;
use crate::model::{
    default_categories, AppSettings, Category, CategoryPatch, Event, EventPatch, NewCategory,
    NewEvent, NewTask, SettingsPatch, Task, TaskPatch,
};
use crate::storage::{KeyValueStore, StorageError};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

pub const EVENTS_KEY: &str = "calendar_events";
pub const TASKS_KEY: &str = "calendar_tasks";
pub const CATEGORIES_KEY: &str = "calendar_categories";
pub const SETTINGS_KEY: &str = "calendar_settings";

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("serializing {key}: {source}")]
    Serialize {
        key: &'static str,
        source: serde_json::Error,
    },
}

/// A kind of entity kept as one whole collection under a fixed key.
pub trait Record: Serialize + DeserializeOwned + Clone {
    const KEY: &'static str;
    type Draft;
    type Patch;

    fn id(&self) -> &str;
    fn from_draft(id: String, draft: Self::Draft, now: DateTime<Utc>) -> Self;
    /// Merge a partial update. Implementations that carry `updatedAt` stamp it with `now`.
    fn apply_patch(&mut self, patch: &Self::Patch, now: DateTime<Utc>);

    /// Records to write when the stored collection is empty.
    fn seed(_now: DateTime<Utc>) -> Vec<Self> {
        Vec::new()
    }
}

impl Record for Event {
    const KEY: &'static str = EVENTS_KEY;
    type Draft = NewEvent;
    type Patch = EventPatch;

    fn id(&self) -> &str {
        &self.id
    }

    fn from_draft(id: String, draft: NewEvent, now: DateTime<Utc>) -> Self {
        Event::new(id, draft, now)
    }

    fn apply_patch(&mut self, patch: &EventPatch, now: DateTime<Utc>) {
        patch.apply(self);
        self.updated_at = now;
    }
}

impl Record for Task {
    const KEY: &'static str = TASKS_KEY;
    type Draft = NewTask;
    type Patch = TaskPatch;

    fn id(&self) -> &str {
        &self.id
    }

    fn from_draft(id: String, draft: NewTask, now: DateTime<Utc>) -> Self {
        Task::new(id, draft, now)
    }

    fn apply_patch(&mut self, patch: &TaskPatch, now: DateTime<Utc>) {
        patch.apply(self);
        self.updated_at = now;
    }
}

impl Record for Category {
    const KEY: &'static str = CATEGORIES_KEY;
    type Draft = NewCategory;
    type Patch = CategoryPatch;

    fn id(&self) -> &str {
        &self.id
    }

    fn from_draft(id: String, draft: NewCategory, now: DateTime<Utc>) -> Self {
        Category::new(id, draft, now)
    }

    fn apply_patch(&mut self, patch: &CategoryPatch, _now: DateTime<Utc>) {
        patch.apply(self);
    }

    fn seed(now: DateTime<Utc>) -> Vec<Self> {
        default_categories(now)
    }
}

/// Typed repository over a key-value substrate. Every operation reads and
/// rewrites a whole collection; reads never fail, writes report failure.
#[derive(Debug)]
pub struct Store<S, C> {
    kv: S,
    clock: C,
}

impl<S: KeyValueStore, C: Clock> Store<S, C> {
    pub fn new(kv: S, clock: C) -> Self {
        Store { kv, clock }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn kv(&self) -> &S {
        &self.kv
    }

    pub fn into_inner(self) -> S {
        self.kv
    }

    /// Loads a collection. Missing or undecodable data yields an empty vector,
    /// or the seed records for kinds that have them (written back at once).
    pub fn all<T: Record>(&mut self) -> Vec<T> {
        let stored = self.load::<T>();
        if !stored.is_empty() {
            return stored;
        }
        let seeded = T::seed(self.clock.now());
        if seeded.is_empty() {
            return stored;
        }
        info!(key = T::KEY, count = seeded.len(), "seeding empty collection");
        if let Err(err) = self.save(&seeded) {
            warn!(key = T::KEY, error = %err, "failed to persist seed records");
        }
        seeded
    }

    pub fn save<T: Record>(&mut self, items: &[T]) -> Result<(), StoreError> {
        self.write(T::KEY, items)?;
        debug!(key = T::KEY, count = items.len(), "saved collection");
        Ok(())
    }

    /// Assigns id and timestamps to a draft, then appends it.
    pub fn create<T: Record>(&mut self, draft: T::Draft) -> Result<T, StoreError> {
        let now = self.clock.now();
        let record = T::from_draft(generate_id(now), draft, now);
        self.add(record.clone())?;
        Ok(record)
    }

    pub fn add<T: Record>(&mut self, item: T) -> Result<(), StoreError> {
        let mut items = self.all::<T>();
        let id = item.id().to_string();
        items.push(item);
        self.save(&items)?;
        info!(key = T::KEY, id = %id, "added record");
        Ok(())
    }

    /// `Ok(None)` when no record has `id`.
    pub fn update<T: Record>(&mut self, id: &str, patch: &T::Patch) -> Result<Option<T>, StoreError> {
        let mut items = self.all::<T>();
        let Some(idx) = items.iter().position(|item| item.id() == id) else {
            debug!(key = T::KEY, id, "update target not found");
            return Ok(None);
        };
        items[idx].apply_patch(patch, self.clock.now());
        self.save(&items)?;
        info!(key = T::KEY, id, "updated record");
        Ok(Some(items.swap_remove(idx)))
    }

    /// `Ok(false)` when no record has `id`; nothing is written in that case.
    pub fn remove<T: Record>(&mut self, id: &str) -> Result<bool, StoreError> {
        let items = self.all::<T>();
        let before = items.len();
        let kept: Vec<T> = items.into_iter().filter(|item| item.id() != id).collect();
        if kept.len() == before {
            debug!(key = T::KEY, id, "remove target not found");
            return Ok(false);
        }
        self.save(&kept)?;
        info!(key = T::KEY, id, "removed record");
        Ok(true)
    }

    pub fn settings(&self) -> AppSettings {
        self.read(SETTINGS_KEY).unwrap_or_default()
    }

    pub fn save_settings(&mut self, settings: &AppSettings) -> Result<(), StoreError> {
        self.write(SETTINGS_KEY, settings)?;
        info!("saved settings");
        Ok(())
    }

    pub fn update_settings(&mut self, patch: &SettingsPatch) -> Result<AppSettings, StoreError> {
        let mut settings = self.settings();
        patch.apply(&mut settings);
        self.save_settings(&settings)?;
        Ok(settings)
    }

    /// Writes an already-serialized document value under `key` as-is.
    pub fn save_raw(&mut self, key: &'static str, value: &serde_json::Value) -> Result<(), StoreError> {
        self.write(key, value)
    }

    fn load<T: Record>(&self) -> Vec<T> {
        self.read(T::KEY).unwrap_or_default()
    }

    fn read<V: DeserializeOwned>(&self, key: &'static str) -> Option<V> {
        let raw = match self.kv.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(err) => {
                warn!(key, error = %err, "storage read failed; using default");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(key, error = %err, "stored value is corrupt; using default");
                None
            }
        }
    }

    fn write<V: Serialize + ?Sized>(&mut self, key: &'static str, value: &V) -> Result<(), StoreError> {
        let serialized =
            serde_json::to_string(value).map_err(|source| StoreError::Serialize { key, source })?;
        self.kv.set(key, &serialized)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::model::{CategoryKind, Priority, DEFAULT_COLORS};
    use crate::storage::MemoryStore;
    use chrono::{Duration, TimeZone};

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 3, 8, 30, 0).unwrap()
    }

    fn store() -> Store<MemoryStore, FixedClock> {
        Store::new(MemoryStore::new(), FixedClock::new(start()))
    }

    fn draft_task(title: &str) -> NewTask {
        NewTask {
            title: title.into(),
            description: None,
            due_date: None,
            priority: Priority::Medium,
            category: "default_1".into(),
            color: DEFAULT_COLORS[2].into(),
        }
    }

    struct BrokenWrites;

    impl KeyValueStore for BrokenWrites {
        fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Err(StorageError::Unavailable("offline".into()))
        }

        fn set(&mut self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("quota exceeded".into()))
        }
    }

    #[test]
    fn create_assigns_identity_and_timestamps() {
        let mut store = store();
        let task: Task = store.create(draft_task("Water plants")).unwrap();
        assert!(!task.id.is_empty());
        assert_eq!(task.created_at, start());
        assert_eq!(task.updated_at, start());
        assert_eq!(store.all::<Task>(), vec![task]);
    }

    #[test]
    fn update_merges_and_stamps() {
        let mut store = store();
        let task: Task = store.create(draft_task("Call mom")).unwrap();
        store.clock().advance(Duration::minutes(10));

        let patch = TaskPatch {
            title: Some("Call dad".into()),
            ..TaskPatch::default()
        };
        let updated = store.update::<Task>(&task.id, &patch).unwrap().unwrap();
        assert_eq!(updated.title, "Call dad");
        assert_eq!(updated.priority, task.priority);
        assert_eq!(updated.created_at, task.created_at);
        assert_eq!(updated.updated_at, start() + Duration::minutes(10));
        assert_eq!(store.all::<Task>()[0], updated);
    }

    #[test]
    fn update_of_unknown_id_is_not_an_error() {
        let mut store = store();
        let patch = TaskPatch::default();
        assert!(store.update::<Task>("nope", &patch).unwrap().is_none());
    }

    #[test]
    fn remove_reports_whether_anything_went() {
        let mut store = store();
        let a: Task = store.create(draft_task("a")).unwrap();
        let _b: Task = store.create(draft_task("b")).unwrap();
        assert!(!store.remove::<Task>("missing").unwrap());
        assert_eq!(store.all::<Task>().len(), 2);
        assert!(store.remove::<Task>(&a.id).unwrap());
        let left = store.all::<Task>();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].title, "b");
    }

    #[test]
    fn categories_are_seeded_and_persisted_on_first_read() {
        let mut store = store();
        assert!(store.kv().get(CATEGORIES_KEY).unwrap().is_none());
        let cats = store.all::<Category>();
        assert_eq!(cats.len(), 6);
        assert_eq!(cats[3].name, "Education");
        assert_eq!(cats[3].kind, CategoryKind::Both);
        assert!(store.kv().get(CATEGORIES_KEY).unwrap().is_some());
    }

    #[test]
    fn corrupt_collections_read_as_empty() {
        let mut kv = MemoryStore::new();
        kv.set(EVENTS_KEY, "{not json").unwrap();
        kv.set(SETTINGS_KEY, "[1,2]").unwrap();
        let mut store = Store::new(kv, FixedClock::new(start()));
        assert!(store.all::<Event>().is_empty());
        assert_eq!(store.settings(), AppSettings::default());
    }

    #[test]
    fn write_failures_reach_the_caller() {
        let mut store = Store::new(BrokenWrites, FixedClock::new(start()));
        assert!(store.all::<Task>().is_empty());
        let err = store.create::<Task>(draft_task("x")).unwrap_err();
        assert!(matches!(err, StoreError::Storage(StorageError::Unavailable(_))));
        // the seed write fails but the defaults are still handed out
        assert_eq!(store.all::<Category>().len(), 6);
    }

    #[test]
    fn settings_update_keeps_untouched_fields() {
        let mut store = store();
        let patch = SettingsPatch {
            default_event_duration: Some(45),
            ..SettingsPatch::default()
        };
        let updated = store.update_settings(&patch).unwrap();
        assert_eq!(updated.default_event_duration, 45);
        assert_eq!(updated.show_weekends, AppSettings::default().show_weekends);
        assert_eq!(store.settings(), updated);
    }

    #[test]
    fn category_update_does_not_touch_created_at() {
        let mut store = store();
        let cats = store.all::<Category>();
        store.clock().advance(Duration::days(1));
        let patch = CategoryPatch {
            name: Some("Job".into()),
            ..CategoryPatch::default()
        };
        let updated = store
            .update::<Category>(&cats[0].id, &patch)
            .unwrap()
            .unwrap();
        assert_eq!(updated.name, "Job");
        assert_eq!(updated.created_at, cats[0].created_at);
    }
}
