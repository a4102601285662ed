//! Nested span trees.

use quill_text::{Buffer, Region};
use std::{fmt, sync::Arc};
use tracing::warn;

/// Provides the text behind a node's range.
///
/// Offsets are code points, matching [`quill_text::Region`].
pub trait DataSource: Send + Sync {
    fn data(&self, start: usize, end: usize) -> String;
}

impl DataSource for String {
    fn data(&self, start: usize, end: usize) -> String {
        self.chars()
            .skip(start)
            .take(end.saturating_sub(start))
            .collect()
    }
}

impl DataSource for Buffer {
    fn data(&self, start: usize, end: usize) -> String {
        self.substr(Region::new(start, end)).unwrap_or_else(|err| {
            warn!(buffer = %self.id(), %err, "could not read node data");
            String::new()
        })
    }
}

/// One named span, with its nested spans in document order.
///
/// Children are expected to lie inside their parent's range. The tree operations keep
/// that true across edits, but nothing checks it on construction; call
/// [`Node::update_range`] after assembling a tree by hand.
#[derive(Clone)]
pub struct Node {
    pub range: Region,
    pub name: String,
    pub children: Vec<Node>,
    source: Option<Arc<dyn DataSource>>,
}

impl Node {
    /// A node with no data source. [`Node::data`] returns `None` for it.
    pub fn new(range: Region, name: impl Into<String>) -> Self {
        Self {
            range,
            name: name.into(),
            children: Vec::new(),
            source: None,
        }
    }

    pub fn with_source(
        range: Region,
        name: impl Into<String>,
        source: Arc<dyn DataSource>,
    ) -> Self {
        Self {
            source: Some(source),
            ..Self::new(range, name)
        }
    }

    pub fn source(&self) -> Option<&Arc<dyn DataSource>> {
        self.source.as_ref()
    }

    pub fn append(&mut self, child: Node) {
        self.children.push(child);
    }

    /// The text covered by this node, read from its data source.
    pub fn data(&self) -> Option<String> {
        self.source
            .as_ref()
            .map(|source| source.data(self.range.begin(), self.range.end()))
    }

    /// Shift this node and its whole subtree after an edit of `delta` code points at
    /// `position`. See [`Region::adjust`].
    pub fn adjust(&mut self, position: usize, delta: isize) {
        self.range.adjust(position, delta);
        for child in &mut self.children {
            child.adjust(position, delta);
        }
    }

    /// Keep the children up to and including the last one that ends at or before `pos`;
    /// drop the rest.
    pub fn discard(&mut self, pos: usize) {
        let keep = self.retained(pos);
        self.children.truncate(keep);
    }

    /// Split off the children an edit at `pos..end` invalidated.
    ///
    /// The receiver is truncated as by [`Node::discard`] (with `pos == 0` nothing is
    /// kept). The returned node spans `{pos, end}` and owns the dropped children, except
    /// for trailing ones that begin after `end`: those are in neither node.
    pub fn cleanup(&mut self, pos: usize, end: usize) -> Node {
        let keep = if pos == 0 { 0 } else { self.retained(pos) };

        let mut popped_end = self.children.len();
        while popped_end > keep && self.children[popped_end - 1].range.begin() > end {
            popped_end -= 1;
        }

        let children = self
            .children
            .drain(keep..)
            .take(popped_end - keep)
            .collect();
        Node {
            range: Region::new(pos, end),
            name: String::new(),
            children,
            source: self.source.clone(),
        }
    }

    /// Collapse every node whose only child has exactly the same range into that child.
    pub fn simplify(&mut self) {
        for child in &mut self.children {
            child.simplify();
        }
        if self.children.len() == 1 && self.children[0].range == self.range {
            if let Some(child) = self.children.pop() {
                *self = child;
            }
        }
    }

    /// Widen every range in the subtree to cover its children, bottom-up.
    pub fn update_range(&mut self) -> Region {
        for child in &mut self.children {
            let covered = child.update_range();
            if covered.begin() < self.range.a {
                self.range.a = covered.begin();
            }
            if covered.end() > self.range.b {
                self.range.b = covered.end();
            }
        }
        self.range
    }

    /// Number of leading children whose range does not extend past `pos`.
    fn retained(&self, pos: usize) -> usize {
        self.children
            .iter()
            .rposition(|child| child.range.end() <= pos)
            .map_or(0, |index| index + 1)
    }

    fn format(&self, f: &mut fmt::Formatter<'_>, indent: &mut String) -> fmt::Result {
        write!(
            f,
            "{indent}{}-{}: \"{}\"",
            self.range.begin(),
            self.range.end(),
            self.name
        )?;
        if self.children.is_empty() {
            return writeln!(f, " - Data: \"{}\"", self.data().unwrap_or_default());
        }
        writeln!(f)?;
        indent.push('\t');
        for child in &self.children {
            child.format(f, indent)?;
        }
        indent.pop();
        Ok(())
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.format(f, &mut String::new())
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("range", &self.range)
            .field("name", &self.name)
            .field("children", &self.children)
            .finish_non_exhaustive()
    }
}
