use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use super::{CoordError, Coordinator};

#[derive(Default)]
struct State {
    lists: HashMap<String, Vec<String>>,
    values: HashMap<String, String>,
}

/// In-process coordinator with the same semantics as the Redis one.
/// Used by tests.
#[derive(Default)]
pub struct MemoryCoordinator {
    state: Mutex<State>,
}

impl MemoryCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // Each critical section is a single map operation.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Coordinator for MemoryCoordinator {
    async fn ping(&self) -> Result<(), CoordError> {
        Ok(())
    }

    async fn append(&self, key: &str, value: &str) -> Result<(), CoordError> {
        self.lock()
            .lists
            .entry(key.to_string())
            .or_default()
            .push(value.to_string());
        Ok(())
    }

    async fn read_all(&self, key: &str) -> Result<Vec<String>, CoordError> {
        Ok(self.lock().lists.get(key).cloned().unwrap_or_default())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CoordError> {
        Ok(self.lock().values.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), CoordError> {
        self.lock()
            .values
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn list_keeps_duplicates_in_order() {
        let coord = MemoryCoordinator::new();
        for v in ["3", "4", "3"] {
            coord.append("log", v).await.unwrap();
        }
        assert_eq!(coord.read_all("log").await.unwrap(), vec!["3", "4", "3"]);
        assert!(coord.read_all("other").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn set_replaces_value() {
        let coord = MemoryCoordinator::new();
        assert_eq!(coord.get("gaps").await.unwrap(), None);
        coord.set("gaps", "[5]").await.unwrap();
        coord.set("gaps", "[]").await.unwrap();
        assert_eq!(coord.get("gaps").await.unwrap().as_deref(), Some("[]"));
    }
}
