//! Test doubles shared by the unit tests.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::db::{Database, MemoryStorage, Storage};
use crate::error::Result;

/// In-memory storage whose writes can be made to fail on demand.
pub struct FlakyStorage {
    inner: MemoryStorage,
    fail: Arc<AtomicBool>,
}

#[derive(Clone)]
pub struct FailSwitch(Arc<AtomicBool>);

impl FailSwitch {
    pub fn set(&self, failing: bool) {
        self.0.store(failing, Ordering::SeqCst);
    }
}

impl FlakyStorage {
    pub fn new() -> (Self, FailSwitch) {
        let fail = Arc::new(AtomicBool::new(false));
        let storage = FlakyStorage {
            inner: MemoryStorage::new(),
            fail: fail.clone(),
        };
        (storage, FailSwitch(fail))
    }
}

impl Storage for FlakyStorage {
    fn load(&mut self) -> Result<Database> {
        self.inner.load()
    }

    fn save(&mut self, db: &Database) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "disk is read-only").into());
        }
        self.inner.save(db)
    }

    fn describe(&self) -> String {
        "flaky".into()
    }
}
