// src/dag/mod.rs

//! Dependency graph and ordering.
//!
//! - [`graph`] derives step-to-step edges and global-parameter references
//!   from a parsed task graph, for every swap alternative.
//! - [`sort`] orders a set of steps (Kahn) and reports cycles.

pub mod graph;
pub mod sort;

pub use graph::{BindingKey, DependencyGraph};
pub use sort::{CycleError, detect_cycle, detect_cycles, topological_sort};
