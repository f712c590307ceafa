//! Job dependency graph for workflow generation.
//!
//! Jobs and their `needs` relationships form a directed graph. This crate
//! answers the questions generation needs: a total execution order that is
//! stable across runs (ties broken by job name), the concrete cycles when
//! ordering is impossible, and transitive dependency/dependent queries.
//!
//! # Example
//!
//! ```
//! use gantry_graph::JobGraph;
//!
//! let mut graph = JobGraph::new();
//! graph.add_job("build");
//! graph.add_job("test");
//! graph.add_dependency("test", "build")?;
//!
//! assert_eq!(graph.topological_order()?, vec!["build", "test"]);
//! # Ok::<(), gantry_graph::GraphError>(())
//! ```

mod error;
mod graph;

pub use error::{GraphError, Result};
pub use graph::JobGraph;
