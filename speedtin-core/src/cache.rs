// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Identifier cache: (project, benchmark name) -> server benchmark id.
//!
//! The cache sits in front of the remote service so repeated runs against the
//! same project do not recreate benchmarks that already exist there. It is
//! backed by a [`CacheStore`]; persistence is best-effort. When the store
//! cannot be read or written the cache logs a warning and keeps working from
//! memory for the rest of the process.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::error::CacheStoreError;
use crate::types::{BenchmarkId, BenchmarkName, ProjectId};

/// Benchmark name to server id, for one project.
pub type ProjectEntries = BTreeMap<BenchmarkName, BenchmarkId>;

/// File name of the per-project cache inside the project directory.
pub const BENCHMARK_CACHE_FILE: &str = "benchmarks.json";

/// Persistence backend for [`IdentifierCache`].
pub trait CacheStore {
    /// Load every entry of a project. A project never saved is empty, not an error.
    fn load(&self, project: &ProjectId) -> Result<ProjectEntries, CacheStoreError>;

    /// Replace the stored entries of a project.
    fn save(&self, project: &ProjectId, entries: &ProjectEntries) -> Result<(), CacheStoreError>;

    /// Forget everything stored for a project.
    fn clear(&self, project: &ProjectId) -> Result<(), CacheStoreError>;
}

/// JSON file per project: `<root>/<project>/benchmarks.json`.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    root: PathBuf,
}

impl JsonFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the cache file for a project.
    pub fn file_for(&self, project: &ProjectId) -> PathBuf {
        self.root.join(project.as_str()).join(BENCHMARK_CACHE_FILE)
    }
}

impl CacheStore for JsonFileStore {
    fn load(&self, project: &ProjectId) -> Result<ProjectEntries, CacheStoreError> {
        let path = self.file_for(project);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(ProjectEntries::new())
            }
            Err(e) => return Err(CacheStoreError::new(path, e)),
        };

        if content.trim().is_empty() {
            return Ok(ProjectEntries::new());
        }

        // A file that does not parse is an empty cache; the next save replaces it.
        match serde_json::from_str(&content) {
            Ok(entries) => Ok(entries),
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "Ignoring unreadable benchmark id cache"
                );
                Ok(ProjectEntries::new())
            }
        }
    }

    fn save(&self, project: &ProjectId, entries: &ProjectEntries) -> Result<(), CacheStoreError> {
        let path = self.file_for(project);
        let dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.root.clone());
        fs::create_dir_all(&dir).map_err(|e| CacheStoreError::new(&dir, e))?;

        let data = serde_json::to_vec_pretty(entries).map_err(|e| CacheStoreError::new(&path, e))?;

        // Write-then-rename so a crash never leaves a truncated file behind.
        let tmp = path.with_extension("json.tmp");
        let mut file = fs::File::create(&tmp).map_err(|e| CacheStoreError::new(&tmp, e))?;
        let written = file.write_all(&data).and_then(|_| file.sync_all());
        drop(file);
        let written = written.and_then(|_| fs::rename(&tmp, &path));
        if let Err(e) = written {
            let _ = fs::remove_file(&tmp);
            return Err(CacheStoreError::new(&path, e));
        }
        Ok(())
    }

    fn clear(&self, project: &ProjectId) -> Result<(), CacheStoreError> {
        let path = self.file_for(project);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CacheStoreError::new(path, e)),
        }
    }
}

/// In-memory store. Clones share the same contents, so several caches (and
/// several clients) can be wired to one store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    data: Arc<Mutex<HashMap<ProjectId, ProjectEntries>>>,
    saves: Arc<AtomicUsize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a project's entries without counting a save.
    pub fn with_entries(self, project: &ProjectId, entries: ProjectEntries) -> Self {
        self.lock().insert(project.clone(), entries);
        self
    }

    /// Number of successful `save` calls so far.
    pub fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn snapshot(&self, project: &ProjectId) -> ProjectEntries {
        self.lock().get(project).cloned().unwrap_or_default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<ProjectId, ProjectEntries>> {
        self.data.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl CacheStore for MemoryStore {
    fn load(&self, project: &ProjectId) -> Result<ProjectEntries, CacheStoreError> {
        Ok(self.snapshot(project))
    }

    fn save(&self, project: &ProjectId, entries: &ProjectEntries) -> Result<(), CacheStoreError> {
        self.lock().insert(project.clone(), entries.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn clear(&self, project: &ProjectId) -> Result<(), CacheStoreError> {
        self.lock().remove(project);
        Ok(())
    }
}

/// Process-local id cache with best-effort persistence.
pub struct IdentifierCache {
    store: Box<dyn CacheStore>,
    projects: HashMap<ProjectId, ProjectEntries>,
    /// Set after the first store failure; the store is not touched again.
    degraded: bool,
}

impl IdentifierCache {
    pub fn new(store: impl CacheStore + 'static) -> Self {
        Self {
            store: Box::new(store),
            projects: HashMap::new(),
            degraded: false,
        }
    }

    /// Cache that never persists anything.
    pub fn in_memory() -> Self {
        Self::new(MemoryStore::new())
    }

    /// Whether persistence has been disabled for this process.
    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    /// Read a project's entries from the store into memory. Later calls for
    /// the same project do nothing.
    pub fn load(&mut self, project: &ProjectId) {
        self.project(project);
    }

    /// Cached server id for a benchmark, if any. Only sees projects already
    /// in memory, through [`Self::load`] or an earlier write.
    pub fn lookup(&self, project: &ProjectId, name: &BenchmarkName) -> Option<BenchmarkId> {
        self.projects
            .get(project)
            .and_then(|entries| entries.get(name))
            .copied()
    }

    /// Upsert an entry; last write wins. Storing the id already cached is a
    /// no-op and does not touch the store. Returns whether anything changed.
    pub fn store(&mut self, project: &ProjectId, name: &BenchmarkName, id: BenchmarkId) -> bool {
        let entries = self.project(project);
        if entries.get(name) == Some(&id) {
            return false;
        }
        entries.insert(name.clone(), id);
        tracing::debug!(project = %project, benchmark = %name, id = %id, "Cached benchmark id");
        self.persist(project);
        true
    }

    /// Store several entries with a single write.
    pub fn store_all(
        &mut self,
        project: &ProjectId,
        pairs: impl IntoIterator<Item = (BenchmarkName, BenchmarkId)>,
    ) -> usize {
        let entries = self.project(project);
        let mut changed = 0;
        for (name, id) in pairs {
            if entries.get(&name) != Some(&id) {
                entries.insert(name, id);
                changed += 1;
            }
        }
        if changed > 0 {
            self.persist(project);
        }
        changed
    }

    /// All cached entries of a project.
    pub fn entries(&mut self, project: &ProjectId) -> ProjectEntries {
        self.project(project).clone()
    }

    /// Drop a project's entries from memory and from the store.
    pub fn clear(&mut self, project: &ProjectId) {
        self.projects.insert(project.clone(), ProjectEntries::new());
        if self.degraded {
            return;
        }
        if let Err(e) = self.store.clear(project) {
            self.degrade(&e);
        }
    }

    fn project(&mut self, project: &ProjectId) -> &mut ProjectEntries {
        if !self.projects.contains_key(project) {
            let loaded = if self.degraded {
                ProjectEntries::new()
            } else {
                match self.store.load(project) {
                    Ok(entries) => entries,
                    Err(e) => {
                        self.degrade(&e);
                        ProjectEntries::new()
                    }
                }
            };
            self.projects.insert(project.clone(), loaded);
        }
        self.projects.entry(project.clone()).or_default()
    }

    fn persist(&mut self, project: &ProjectId) {
        if self.degraded {
            return;
        }
        let result = match self.projects.get(project) {
            Some(entries) => self.store.save(project, entries),
            None => Ok(()),
        };
        if let Err(e) = result {
            self.degrade(&e);
        }
    }

    fn degrade(&mut self, error: &CacheStoreError) {
        tracing::warn!(
            error = %error,
            "Identifier cache store unavailable, continuing in memory only"
        );
        self.degraded = true;
    }
}

impl std::fmt::Debug for IdentifierCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentifierCache")
            .field("projects", &self.projects)
            .field("degraded", &self.degraded)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn project() -> ProjectId {
        ProjectId::new("proj").unwrap()
    }

    fn name(s: &str) -> BenchmarkName {
        BenchmarkName::new(s).unwrap()
    }

    /// Store whose every operation fails.
    struct BrokenStore;

    impl CacheStore for BrokenStore {
        fn load(&self, _: &ProjectId) -> Result<ProjectEntries, CacheStoreError> {
            Err(CacheStoreError::new("/broken", "unreadable"))
        }

        fn save(&self, _: &ProjectId, _: &ProjectEntries) -> Result<(), CacheStoreError> {
            Err(CacheStoreError::new("/broken", "unwritable"))
        }

        fn clear(&self, _: &ProjectId) -> Result<(), CacheStoreError> {
            Err(CacheStoreError::new("/broken", "unwritable"))
        }
    }

    #[test]
    fn test_lookup_and_store() {
        let mut cache = IdentifierCache::in_memory();
        assert_eq!(cache.lookup(&project(), &name("x")), None);

        assert!(cache.store(&project(), &name("x"), BenchmarkId::new(4)));
        assert_eq!(cache.lookup(&project(), &name("x")), Some(BenchmarkId::new(4)));

        // Last write wins
        assert!(cache.store(&project(), &name("x"), BenchmarkId::new(9)));
        assert_eq!(cache.lookup(&project(), &name("x")), Some(BenchmarkId::new(9)));
    }

    #[test]
    fn test_identical_store_does_not_write() {
        let store = MemoryStore::new();
        let mut cache = IdentifierCache::new(store.clone());

        assert!(cache.store(&project(), &name("x"), BenchmarkId::new(1)));
        assert!(!cache.store(&project(), &name("x"), BenchmarkId::new(1)));
        assert!(!cache.store(&project(), &name("x"), BenchmarkId::new(1)));
        assert_eq!(store.saves(), 1);
    }

    #[test]
    fn test_projects_are_isolated() {
        let mut cache = IdentifierCache::in_memory();
        let other = ProjectId::new("other").unwrap();

        cache.store(&project(), &name("x"), BenchmarkId::new(1));
        assert_eq!(cache.lookup(&other, &name("x")), None);
    }

    #[test]
    fn test_shared_store_across_instances() {
        let store = MemoryStore::new();
        let mut first = IdentifierCache::new(store.clone());
        first.store(&project(), &name("x"), BenchmarkId::new(3));

        let mut second = IdentifierCache::new(store);
        assert_eq!(second.lookup(&project(), &name("x")), None);
        second.load(&project());
        assert_eq!(second.lookup(&project(), &name("x")), Some(BenchmarkId::new(3)));
    }

    #[test]
    fn test_broken_store_degrades_to_memory() {
        let mut cache = IdentifierCache::new(BrokenStore);
        cache.load(&project());
        assert_eq!(cache.lookup(&project(), &name("x")), None);
        assert!(cache.is_degraded());

        // Still usable for the rest of the process.
        assert!(cache.store(&project(), &name("x"), BenchmarkId::new(2)));
        assert_eq!(cache.lookup(&project(), &name("x")), Some(BenchmarkId::new(2)));
        cache.clear(&project());
        assert_eq!(cache.lookup(&project(), &name("x")), None);
    }

    #[test]
    fn test_json_store_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(temp_dir.path());

        let mut cache = IdentifierCache::new(store.clone());
        cache.store(&project(), &name("create_10_users"), BenchmarkId::new(0));
        cache.store(&project(), &name("select_100_users"), BenchmarkId::new(1));

        let path = store.file_for(&project());
        assert!(path.exists());
        assert_eq!(path, temp_dir.path().join("proj").join(BENCHMARK_CACHE_FILE));

        let mut reopened = IdentifierCache::new(store);
        reopened.load(&project());
        assert_eq!(
            reopened.lookup(&project(), &name("select_100_users")),
            Some(BenchmarkId::new(1))
        );
        assert!(!reopened.is_degraded());
    }

    #[test]
    fn test_json_store_missing_file_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(temp_dir.path().join("does-not-exist-yet"));
        assert!(store.load(&project()).unwrap().is_empty());
        assert!(store.clear(&project()).is_ok());
    }

    #[test]
    fn test_corrupted_file_is_treated_as_empty_and_replaced() {
        let temp_dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(temp_dir.path());
        let path = store.file_for(&project());
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "{not json").unwrap();

        assert!(store.load(&project()).unwrap().is_empty());

        let mut cache = IdentifierCache::new(store.clone());
        cache.load(&project());
        assert_eq!(cache.lookup(&project(), &name("x")), None);
        assert!(!cache.is_degraded());
        cache.store(&project(), &name("x"), BenchmarkId::new(1));

        // The next run sees the rewritten file.
        let mut next_run = IdentifierCache::new(store);
        next_run.load(&project());
        assert_eq!(next_run.lookup(&project(), &name("x")), Some(BenchmarkId::new(1)));
    }

    /// Store that reads fine but cannot be written.
    #[derive(Clone, Default)]
    struct ReadOnlyStore {
        save_attempts: Arc<AtomicUsize>,
    }

    impl CacheStore for ReadOnlyStore {
        fn load(&self, _: &ProjectId) -> Result<ProjectEntries, CacheStoreError> {
            Ok(ProjectEntries::new())
        }

        fn save(&self, _: &ProjectId, _: &ProjectEntries) -> Result<(), CacheStoreError> {
            self.save_attempts.fetch_add(1, Ordering::SeqCst);
            Err(CacheStoreError::new("/read-only", "permission denied"))
        }

        fn clear(&self, _: &ProjectId) -> Result<(), CacheStoreError> {
            Ok(())
        }
    }

    #[test]
    fn test_failed_save_degrades_after_load_succeeded() {
        let store = ReadOnlyStore::default();
        let mut cache = IdentifierCache::new(store.clone());
        cache.load(&project());
        assert!(!cache.is_degraded());

        assert!(cache.store(&project(), &name("x"), BenchmarkId::new(1)));
        assert!(cache.is_degraded());
        assert_eq!(cache.lookup(&project(), &name("x")), Some(BenchmarkId::new(1)));

        // Served from memory; the store is not retried.
        assert!(cache.store(&project(), &name("y"), BenchmarkId::new(2)));
        assert_eq!(cache.lookup(&project(), &name("y")), Some(BenchmarkId::new(2)));
        assert_eq!(store.save_attempts.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_failed_rename_leaves_no_temp_file() {
        let temp_dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(temp_dir.path());
        let path = store.file_for(&project());
        // A non-empty directory where the cache file should go makes the rename fail.
        fs::create_dir_all(path.join("occupied")).unwrap();

        let mut entries = ProjectEntries::new();
        entries.insert(name("x"), BenchmarkId::new(1));
        assert!(store.save(&project(), &entries).is_err());
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn test_store_all_writes_once() {
        let store = MemoryStore::new();
        let mut cache = IdentifierCache::new(store.clone());
        let changed = cache.store_all(
            &project(),
            vec![
                (name("a"), BenchmarkId::new(1)),
                (name("b"), BenchmarkId::new(2)),
            ],
        );
        assert_eq!(changed, 2);
        assert_eq!(store.saves(), 1);

        let changed = cache.store_all(&project(), vec![(name("a"), BenchmarkId::new(1))]);
        assert_eq!(changed, 0);
        assert_eq!(store.saves(), 1);
    }

    #[test]
    fn test_clear_removes_file() {
        let temp_dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(temp_dir.path());
        let mut cache = IdentifierCache::new(store.clone());
        cache.store(&project(), &name("x"), BenchmarkId::new(1));
        assert!(store.file_for(&project()).exists());

        cache.clear(&project());
        assert!(!store.file_for(&project()).exists());
        assert_eq!(cache.lookup(&project(), &name("x")), None);
    }
}
