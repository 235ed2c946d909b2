//! Testing utilities
pub mod tree_dump;
