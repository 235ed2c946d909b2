//! Shared functionality
//!
//! This crate supplies the pieces that are shared between the tokenizer, the tree builder and
//! the tools built on top of them: the input preprocessor, source locations, node ids and the
//! error types.

pub mod byte_stream;
pub mod node;
pub mod types;
