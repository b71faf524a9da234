//! Release version identifiers and release-branch naming.

pub mod branch;
pub mod parse;

pub use branch::BranchPointer;
pub use parse::Version;
