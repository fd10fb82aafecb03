// Test support utilities for both unit and integration tests

use crate::host::{HostError, HostItem, HostLibrary};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// In-memory host library for tests.
///
/// Records every call instead of talking to the host API; individual steps
/// can be made to fail to exercise degraded outcomes.
pub struct MockHost {
    library_root: PathBuf,
    fail_add: AtomicBool,
    fail_fetch: AtomicBool,
    thumbnail_failures: Mutex<Vec<String>>,
    state: Mutex<MockState>,
}

#[derive(Default)]
struct MockState {
    next_id: u64,
    items: Vec<MockItem>,
    thumbnails: HashMap<String, PathBuf>,
}

/// Item record captured by the mock.
#[derive(Debug, Clone)]
pub struct MockItem {
    pub id: String,
    pub name: String,
    pub path: PathBuf,
    pub tags: Vec<String>,
    pub folders: Vec<String>,
}

impl MockHost {
    pub fn new(library_root: impl Into<PathBuf>) -> Self {
        MockHost {
            library_root: library_root.into(),
            fail_add: AtomicBool::new(false),
            fail_fetch: AtomicBool::new(false),
            thumbnail_failures: Mutex::new(Vec::new()),
            state: Mutex::new(MockState::default()),
        }
    }

    /// Make every creation call fail.
    pub fn fail_add(&self, fail: bool) {
        self.fail_add.store(fail, Ordering::SeqCst);
    }

    /// Make every fetch-by-id call fail.
    pub fn fail_fetch(&self, fail: bool) {
        self.fail_fetch.store(fail, Ordering::SeqCst);
    }

    /// Make thumbnail attachment fail for items with the given names.
    pub fn fail_thumbnail_for(&self, names: &[&str]) {
        let mut failures = self.thumbnail_failures.lock().unwrap();
        *failures = names.iter().map(|n| n.to_string()).collect();
    }

    /// Every item added so far, in insertion order.
    pub fn items(&self) -> Vec<MockItem> {
        self.state.lock().unwrap().items.clone()
    }

    /// The thumbnail attached to an item, if any.
    pub fn thumbnail_for(&self, item_id: &str) -> Option<PathBuf> {
        self.state.lock().unwrap().thumbnails.get(item_id).cloned()
    }
}

#[async_trait::async_trait]
impl HostLibrary for MockHost {
    async fn add_item_from_path(
        &self,
        path: &Path,
        name: &str,
        tags: &[String],
        folders: &[String],
    ) -> Result<String, HostError> {
        if self.fail_add.load(Ordering::SeqCst) {
            return Err(HostError::Api("injected creation failure".to_string()));
        }

        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let id = format!("item-{}", state.next_id);

        state.items.push(MockItem {
            id: id.clone(),
            name: name.to_string(),
            path: path.to_path_buf(),
            tags: tags.to_vec(),
            folders: folders.to_vec(),
        });

        Ok(id)
    }

    async fn get_item_by_id(&self, item_id: &str) -> Result<HostItem, HostError> {
        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(HostError::NotFound(item_id.to_string()));
        }

        let state = self.state.lock().unwrap();
        state
            .items
            .iter()
            .find(|item| item.id == item_id)
            .map(|item| HostItem {
                id: item.id.clone(),
                name: item.name.clone(),
            })
            .ok_or_else(|| HostError::NotFound(item_id.to_string()))
    }

    async fn set_item_thumbnail(&self, item_id: &str, thumbnail: &Path) -> Result<(), HostError> {
        let mut state = self.state.lock().unwrap();

        let name = state
            .items
            .iter()
            .find(|item| item.id == item_id)
            .map(|item| item.name.clone())
            .ok_or_else(|| HostError::NotFound(item_id.to_string()))?;

        if self.thumbnail_failures.lock().unwrap().contains(&name) {
            return Err(HostError::Api("injected thumbnail failure".to_string()));
        }

        state.thumbnails.insert(item_id.to_string(), thumbnail.to_path_buf());
        Ok(())
    }

    async fn library_path(&self) -> Result<PathBuf, HostError> {
        Ok(self.library_root.clone())
    }
}
