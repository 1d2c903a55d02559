//! Schema backend trait definition.
//!
//! This port defines the administrative operations the fixture needs from
//! the storage engine, plus construction of the schema-scoped handle.

use async_trait::async_trait;
use url::Url;

use super::BackendError;
use crate::domain::{SchemaName, ScopedTarget};

/// Storage engine operations for per-worker schemas.
///
/// # Design Rules
///
/// - `create_schema` and `drop_schema` are idempotent
///   (`IF NOT EXISTS` / `IF EXISTS`)
/// - `create_schema`, `drop_schema`, `schema_exists` and
///   `list_worker_schemas` use a transient connection that is closed before
///   they return
/// - Handles returned by `connect` only ever see their own schema
#[async_trait]
pub trait SchemaBackend: Send + Sync {
    /// Connection handle bound to one schema.
    type Handle: Send + Sync + 'static;

    /// Create the target's schema if it does not exist.
    async fn create_schema(&self, target: &ScopedTarget) -> Result<(), BackendError>;

    /// Open the long-lived handle bound to the target's schema.
    async fn connect(&self, target: &ScopedTarget) -> Result<Self::Handle, BackendError>;

    /// Drop the schema (cascade) through `handle`, then close the handle.
    ///
    /// The handle is closed even when the drop fails.
    async fn release(&self, handle: Self::Handle, target: &ScopedTarget)
    -> Result<(), BackendError>;

    /// Drop the target's schema (cascade) if it exists.
    async fn drop_schema(&self, target: &ScopedTarget) -> Result<(), BackendError>;

    /// Whether the target's schema currently exists.
    async fn schema_exists(&self, target: &ScopedTarget) -> Result<bool, BackendError>;

    /// List every per-worker schema on the server behind `base`.
    async fn list_worker_schemas(&self, base: &Url) -> Result<Vec<SchemaName>, BackendError>;
}
