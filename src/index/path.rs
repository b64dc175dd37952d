//! Path/Stack Tracker
//!
//! Keeps the chain of open elements and the slash-delimited structural path
//! of the innermost one. Each frame owns its element; nodes below it only
//! refer to it by position.

use crate::dom::node::ElementNode;

/// Open element plus the path length before it was pushed
#[derive(Debug)]
struct Frame {
    element: ElementNode,
    path_len: usize,
}

/// Open-ancestor stack
#[derive(Debug, Default)]
pub struct PathTracker {
    frames: Vec<Frame>,
    path: String,
}

impl PathTracker {
    /// Create an empty tracker
    pub fn new() -> Self {
        Self {
            frames: Vec::with_capacity(32),
            path: String::with_capacity(256),
        }
    }

    /// Open `element` as the new insertion parent
    pub fn push(&mut self, element: ElementNode) {
        let path_len = self.path.len();
        self.path.push('/');
        match &element.name.prefix {
            Some(prefix) => {
                self.path.push_str(prefix);
                self.path.push(':');
                self.path.push_str(&element.name.local_name);
            }
            None => self.path.push_str(&element.name.local_name),
        }
        self.frames.push(Frame { element, path_len });
    }

    /// Close the innermost element, restoring the parent's path
    pub fn pop(&mut self) -> Option<ElementNode> {
        let frame = self.frames.pop()?;
        self.path.truncate(frame.path_len);
        Some(frame.element)
    }

    /// Current insertion parent
    #[inline]
    pub fn current(&self) -> Option<&ElementNode> {
        self.frames.last().map(|f| &f.element)
    }

    /// Current insertion parent, mutably
    #[inline]
    pub fn current_mut(&mut self) -> Option<&mut ElementNode> {
        self.frames.last_mut().map(|f| &mut f.element)
    }

    /// Structural path of the innermost open element, empty at document level
    #[inline]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Structural path of attribute `qname` of the innermost element
    pub fn attribute_path(&self, qname: &str) -> String {
        format!("{}/@{}", self.path, qname)
    }

    /// Number of open elements
    #[inline]
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Check if no element is open
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Drop every frame, yielding the elements innermost first
    pub fn drain(&mut self) -> impl Iterator<Item = ElementNode> + '_ {
        self.path.clear();
        self.frames.drain(..).rev().map(|f| f.element)
    }
}
