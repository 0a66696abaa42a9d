//! Git operations using git2-rs.

pub mod workspace;

pub use workspace::Workspace;
