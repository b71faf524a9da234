//! Source-control access and release window resolution.

pub mod gateway;
pub mod local;
pub mod provider;
pub mod window;

pub use gateway::{Commit, CommitFilter, RepositoryGateway, Tag, is_merge, keep_all};
pub use local::LocalRepository;
pub use provider::open_repository;
pub use window::{Boundary, BoundaryKind, ReleaseWindow, ReleaseWindowResolver, WindowRequest};
