//! Domain types for per-worker schema isolation.
//!
//! These types are pure: no database, process or environment access.

mod schema;
mod target;
mod worker;

pub use schema::{MAX_IDENTIFIER_LEN, SCHEMA_PREFIX, SchemaName, is_worker_schema};
pub use target::{DEFAULT_SCHEMA_PARAM, SchemaSelector, ScopedTarget, parse_base_url, redact};
pub use worker::{DEFAULT_WORKER_ID, MAX_WORKER_ID_LEN, WorkerId};
