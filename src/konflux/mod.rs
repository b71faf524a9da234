//! Release service metadata: release plans, releases, snapshots and components.

pub mod auth;
pub mod client;
pub mod types;

pub use auth::{discover_server, discover_token};
pub use client::{KonfluxClient, ReleaseMetadataSource};
pub use types::{Component, Release, ReleasePlan, Snapshot};
