use std::sync::{Arc, Mutex};

use super::{DrawingStore, StoreError, StoreResult};
use crate::model::Drawing;
use crate::telemetry::LogManager;

#[derive(Default)]
struct Slot {
    drawings: Option<Vec<Drawing>>,
    fail_loads: bool,
    fail_saves: bool,
    saves: usize,
}

/// Volatile store. Clones share the same slot.
#[derive(Clone)]
pub struct MemoryStore {
    slot: Arc<Mutex<Slot>>,
    logger: LogManager,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            slot: Arc::new(Mutex::new(Slot::default())),
            logger: LogManager::new("store"),
        }
    }

    pub fn logger(&self) -> &LogManager {
        &self.logger
    }

    pub fn with_drawings(drawings: Vec<Drawing>) -> Self {
        let store = Self::new();
        if let Ok(mut slot) = store.slot.lock() {
            slot.drawings = Some(drawings);
        }
        store
    }

    pub fn fail_loads(&self, fail: bool) {
        if let Ok(mut slot) = self.slot.lock() {
            slot.fail_loads = fail;
        }
    }

    pub fn fail_saves(&self, fail: bool) {
        if let Ok(mut slot) = self.slot.lock() {
            slot.fail_saves = fail;
        }
    }

    /// Successful saves so far.
    pub fn save_count(&self) -> usize {
        self.slot.lock().map(|slot| slot.saves).unwrap_or(0)
    }

    pub fn contents(&self) -> Option<Vec<Drawing>> {
        self.slot.lock().ok().and_then(|slot| slot.drawings.clone())
    }

    pub fn try_load(&self) -> StoreResult<Option<Vec<Drawing>>> {
        let slot = self
            .slot
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store poisoned".into()))?;
        if slot.fail_loads {
            return Err(StoreError::Unavailable("load failure injected".into()));
        }
        Ok(slot.drawings.clone())
    }

    pub fn try_save(&self, drawings: &[Drawing]) -> StoreResult<()> {
        let mut slot = self
            .slot
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store poisoned".into()))?;
        if slot.fail_saves {
            return Err(StoreError::Unavailable("save failure injected".into()));
        }
        slot.drawings = Some(drawings.to_vec());
        slot.saves += 1;
        Ok(())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DrawingStore for MemoryStore {
    fn load(&self) -> Option<Vec<Drawing>> {
        self.try_load().unwrap_or_else(|err| {
            self.logger.warn(&format!("error loading drawings: {}", err));
            None
        })
    }

    fn save(&self, drawings: &[Drawing]) -> bool {
        match self.try_save(drawings) {
            Ok(()) => true,
            Err(err) => {
                self.logger.warn(&format!("error saving drawings: {}", err));
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Coordinate;

    #[test]
    fn clones_share_contents() {
        let store = MemoryStore::new();
        let observer = store.clone();
        assert!(store.load().is_none());

        store.save(&[Drawing::new("a", Coordinate::new(0.0, 0.0), Vec::new())]);

        assert_eq!(observer.contents().unwrap().len(), 1);
        assert_eq!(observer.save_count(), 1);
    }

    #[test]
    fn injected_failures_degrade_gracefully() {
        let store = MemoryStore::with_drawings(vec![Drawing::new(
            "a",
            Coordinate::new(0.0, 0.0),
            Vec::new(),
        )]);
        store.fail_loads(true);
        store.fail_saves(true);

        assert!(store.load().is_none());
        assert!(!store.save(&[]));

        store.fail_loads(false);
        assert_eq!(store.load().unwrap().len(), 1);
    }

    #[test]
    fn clones_log_under_the_store_component() {
        let store = MemoryStore::new();
        let clone = store.clone();
        assert_eq!(store.logger().component(), "store");
        assert_eq!(clone.logger().component(), "store");
    }
}
