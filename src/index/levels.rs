//! Tree-Level Indexer
//!
//! Nodes are numbered level by level as in a complete k-ary tree whose
//! fan-out differs per level:
//!
//! ```text
//! level 0   gid 0                    (document node)
//! level 1   gid 1 .. 1+order[0]      (top-level nodes)
//! level L+1 start[L+1] + (parent - start[L]) * order[L] + slot
//! ```
//!
//! `order[L]` is the largest number of children any single node at level L
//! has, plus the configured spacing. A node's position, its parent and its
//! level can therefore be computed without touching the tree. Gaps left by
//! nodes with fewer children, or reserved through spacing, are where later
//! insertions go.

use crate::dom::node::Gid;
use crate::error::{IngestError, Result};

/// Per-level fan-out and first position
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreeLevelIndex {
    /// Fan-out of each level
    order: Vec<u64>,
    /// First gid of each level, filled by [`TreeLevelIndex::compute`]
    start: Vec<Gid>,
    /// Slots reserved at every level beyond the observed maximum
    spacing: u64,
}

impl TreeLevelIndex {
    /// Create an empty index with `spacing` reserved slots per level
    pub fn new(spacing: u64) -> Self {
        Self {
            order: Vec::with_capacity(16),
            start: Vec::new(),
            spacing,
        }
    }

    /// Reserved slots per level
    pub fn spacing(&self) -> u64 {
        self.spacing
    }

    /// Record that a node at `level` has `children` children.
    ///
    /// The fan-out only ever grows.
    pub fn observe(&mut self, level: usize, children: u32) {
        if self.order.len() <= level {
            self.order.resize(level + 1, 0);
        }
        let wanted = u64::from(children).saturating_add(self.spacing);
        if self.order[level] < wanted {
            self.order[level] = wanted;
        }
    }

    /// Fan-out of `level`
    #[inline]
    pub fn order(&self, level: usize) -> u64 {
        self.order.get(level).copied().unwrap_or(0)
    }

    /// Fan-outs of all levels
    pub fn orders(&self) -> &[u64] {
        &self.order
    }

    /// First gid of every level, empty until computed
    pub fn starts(&self) -> &[Gid] {
        &self.start
    }

    /// Number of levels with computed positions, the document level included
    pub fn depth(&self) -> usize {
        self.start.len()
    }

    /// Derive the first position of every level for a tree of `max_depth`.
    ///
    /// Fails with [`IngestError::DepthExceeded`] if the positions of the
    /// deepest level do not fit into a [`Gid`].
    pub fn compute(&mut self, max_depth: usize) -> Result<()> {
        let exceeded = || IngestError::DepthExceeded { depth: max_depth };
        if self.order.len() < max_depth {
            self.order.resize(max_depth, 0);
        }

        let mut start: Vec<Gid> = Vec::with_capacity(max_depth + 1);
        start.push(0);
        // Positions available at the current level
        let mut slots: u64 = 1;
        for level in 0..max_depth {
            let next = start[level].checked_add(slots).ok_or_else(exceeded)?;
            slots = slots
                .checked_mul(self.order[level].max(1))
                .ok_or_else(exceeded)?;
            start.push(next);
        }
        start[max_depth].checked_add(slots).ok_or_else(exceeded)?;

        self.start = start;
        Ok(())
    }

    /// Make room for child `slot` below `level`, recomputing positions.
    ///
    /// Returns `true` if the fan-out had to grow. Growing `level` moves the
    /// start of every deeper level, so nodes already stored below `level`
    /// keep positions that no longer match [`TreeLevelIndex::child_gid`].
    /// Only callers that have not stored anything deeper yet get a
    /// consistent numbering.
    pub fn ensure_slot(&mut self, level: usize, slot: u64) -> Result<bool> {
        if slot < self.order(level) {
            return Ok(false);
        }
        let children = u32::try_from(slot + 1).map_err(|_| IngestError::DepthExceeded {
            depth: self.start.len().saturating_sub(1),
        })?;
        self.observe(level, children);
        let max_depth = self.start.len().saturating_sub(1).max(level + 1);
        self.compute(max_depth)?;
        Ok(true)
    }

    /// Position of child `slot` of the node `parent` at `parent_level`
    pub fn child_gid(&self, parent_level: usize, parent: Gid, slot: u64) -> Option<Gid> {
        let order = self.order(parent_level);
        if slot >= order {
            return None;
        }
        let level_start = *self.start.get(parent_level)?;
        let child_start = *self.start.get(parent_level + 1)?;
        parent
            .checked_sub(level_start)?
            .checked_mul(order)?
            .checked_add(child_start)?
            .checked_add(slot)
    }

    /// Position of the parent of `gid` located at `level`
    pub fn parent_gid(&self, level: usize, gid: Gid) -> Option<Gid> {
        let parent_level = level.checked_sub(1)?;
        let order = self.order(parent_level);
        if order == 0 {
            return None;
        }
        let offset = gid.checked_sub(*self.start.get(level)?)?;
        Some(self.start[parent_level] + offset / order)
    }

    /// Level holding `gid`
    pub fn level_of(&self, gid: Gid) -> Option<usize> {
        if self.start.is_empty() {
            return None;
        }
        let level = self.start.partition_point(|&s| s <= gid) - 1;
        // Positions past the last level's capacity belong to no level
        let capacity = self.start.get(level + 1).copied().unwrap_or_else(|| {
            let slots: u64 = self.order[..level].iter().map(|o| (*o).max(1)).product();
            self.start[level] + slots
        });
        (gid < capacity).then_some(level)
    }
}
