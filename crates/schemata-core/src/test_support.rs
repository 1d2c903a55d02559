//! In-memory [`SchemaBackend`] for unit tests.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use url::Url;

use crate::domain::{SchemaName, ScopedTarget, is_worker_schema};
use crate::ports::{BackendError, SchemaBackend};

/// Handle produced by [`FakeBackend::connect`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeHandle {
    pub schema: String,
}

#[derive(Debug, Default)]
struct State {
    schemas: BTreeSet<String>,
    creates: usize,
    connects: usize,
    drops: usize,
    closed: usize,
    fail_create: bool,
    fail_connect: bool,
    fail_drop: bool,
}

/// Shared, cloneable fake; clones observe the same state.
#[derive(Debug, Clone, Default)]
pub struct FakeBackend {
    state: Arc<Mutex<State>>,
}

impl FakeBackend {
    pub fn seed(&self, schema: &str) {
        self.state.lock().unwrap().schemas.insert(schema.to_string());
    }

    pub fn exists(&self, schema: &str) -> bool {
        self.state.lock().unwrap().schemas.contains(schema)
    }

    pub fn creates(&self) -> usize {
        self.state.lock().unwrap().creates
    }

    pub fn connects(&self) -> usize {
        self.state.lock().unwrap().connects
    }

    pub fn drops(&self) -> usize {
        self.state.lock().unwrap().drops
    }

    pub fn closed(&self) -> usize {
        self.state.lock().unwrap().closed
    }

    pub fn fail_create(&self, fail: bool) {
        self.state.lock().unwrap().fail_create = fail;
    }

    pub fn fail_connect(&self, fail: bool) {
        self.state.lock().unwrap().fail_connect = fail;
    }

    pub fn fail_drop(&self, fail: bool) {
        self.state.lock().unwrap().fail_drop = fail;
    }

    fn drop_named(&self, schema: &str) -> Result<(), BackendError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_drop {
            return Err(BackendError::Statement("drop refused".to_string()));
        }
        state.drops += 1;
        state.schemas.remove(schema);
        Ok(())
    }
}

#[async_trait]
impl SchemaBackend for FakeBackend {
    type Handle = FakeHandle;

    async fn create_schema(&self, target: &ScopedTarget) -> Result<(), BackendError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_create {
            return Err(BackendError::Connection("refused".to_string()));
        }
        state.creates += 1;
        state.schemas.insert(target.schema().to_string());
        Ok(())
    }

    async fn connect(&self, target: &ScopedTarget) -> Result<FakeHandle, BackendError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_connect {
            return Err(BackendError::Connection("refused".to_string()));
        }
        state.connects += 1;
        Ok(FakeHandle {
            schema: target.schema().to_string(),
        })
    }

    async fn release(&self, handle: FakeHandle, _target: &ScopedTarget) -> Result<(), BackendError> {
        let dropped = self.drop_named(&handle.schema);
        self.state.lock().unwrap().closed += 1;
        dropped
    }

    async fn drop_schema(&self, target: &ScopedTarget) -> Result<(), BackendError> {
        self.drop_named(target.schema().as_str())
    }

    async fn schema_exists(&self, target: &ScopedTarget) -> Result<bool, BackendError> {
        Ok(self.exists(target.schema().as_str()))
    }

    async fn list_worker_schemas(&self, _base: &Url) -> Result<Vec<SchemaName>, BackendError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .schemas
            .iter()
            .filter(|name| is_worker_schema(name))
            .filter_map(|name| SchemaName::parse(name).ok())
            .collect())
    }
}
