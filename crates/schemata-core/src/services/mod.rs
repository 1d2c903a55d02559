//! Services orchestrating the ports.

mod fixture;
mod sweep;
mod worker;

pub use fixture::{SchemaFixture, SchemaLease, Teardown};
pub use sweep::{SweepFailure, SweepOptions, SweepReport, sweep_orphaned_schemas};
pub use worker::WorkerSchema;
