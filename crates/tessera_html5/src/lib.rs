//! HTML5 tokenizer and parser
//!
//! The parser's job is to take a stream of characters and turn it into a tree. The tokenizer and
//! the tree builder are implemented as state machines and run in the current thread. The tree
//! itself is built through the [`tree_adapter::TreeAdapter`] trait; [`document::Document`] is
//! the default in-memory implementation.
use crate::document::Document;
use crate::parser::{Html5Parser, Html5ParserOptions, Parsed};
use crate::tree_adapter::{Namespace, TreeAdapter};

pub mod document;
pub mod elements;
pub mod errors;
pub mod node;
pub mod parser;
pub mod testing;
pub mod tokenizer;
pub mod tree_adapter;
pub mod visitor;
pub mod writer;

/// Parses the given HTML document into the default tree
pub fn parse(html: &str, options: Option<Html5ParserOptions>) -> Parsed<Document> {
    Html5Parser::parse_document(Document::new(), html, options)
}

/// Parses the given HTML as the contents of an HTML element with the given tag name. Without a
/// context, a `<template>` element is used.
pub fn parse_fragment(html: &str, context: Option<&str>, options: Option<Html5ParserOptions>) -> Parsed<Document> {
    let mut document = Document::new();
    let context = context.map(|name| document.create_element(name, Namespace::Html, Vec::new()));

    Html5Parser::parse_fragment(document, context, html, options)
}
