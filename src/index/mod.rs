//! Structural Index Module
//!
//! Assigns every node of a document a position that encodes its parent and
//! level, and turns parse events into positioned nodes.
//!
//! ## Architecture
//!
//! ```text
//! TreeBuilder (ContentHandler)
//! ├── stack: PathTracker         # open elements + structural path
//! ├── pool: NodePool             # recycled node buffers
//! └── doc.levels: TreeLevelIndex # per-level fan-out -> gid arithmetic
//! ```

pub mod builder;
pub mod levels;
pub mod path;
pub mod pool;

pub use builder::{BuildSummary, Pass, TreeBuilder};
pub use levels::TreeLevelIndex;
pub use path::PathTracker;
pub use pool::NodePool;
