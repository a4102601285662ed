//! Span trees for the Quill editor
//!
//! A parser describes a document as a tree of named, nested [`Node`] ranges (syntax
//! scopes, markup blocks, ...). When the buffer changes, the parser's owner keeps the
//! tree usable without a full rebuild: it shifts ranges with [`Node::adjust`], drops
//! invalidated spans with [`Node::discard`], and salvages still-valid subtrees with
//! [`Node::cleanup`] before reparsing only the damaged part.
//!
//! Nodes read their text lazily through a [`DataSource`], which can be the live
//! [`quill_text::Buffer`] or a snapshot taken when the parse started.

pub mod node;

pub use node::{DataSource, Node};
