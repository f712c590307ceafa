//! Error types for job graph operations.

use thiserror::Error;

/// Result type for job graph operations.
pub type Result<T> = std::result::Result<T, GraphError>;

/// Errors that can occur while building or ordering the job graph.
#[derive(Debug, Clone, Error)]
pub enum GraphError {
    /// The graph contains at least one dependency cycle. Every detected
    /// cycle is listed by job name, in traversal order.
    #[error("dependency cycle detected: {}", render_cycles(.cycles))]
    Cycle { cycles: Vec<Vec<String>> },

    /// A job declares a dependency on a job that was never added.
    #[error("job '{job}' depends on unknown job '{dependency}'")]
    UnknownDependency { job: String, dependency: String },

    /// A query referenced a job that was never added.
    #[error("unknown job '{name}'")]
    UnknownJob { name: String },
}

fn render_cycles(cycles: &[Vec<String>]) -> String {
    cycles
        .iter()
        .map(|cycle| {
            let mut closed = cycle.join(" -> ");
            if let Some(first) = cycle.first() {
                closed.push_str(" -> ");
                closed.push_str(first);
            }
            closed
        })
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_message_names_every_job() {
        let error = GraphError::Cycle {
            cycles: vec![vec![
                "a".to_string(),
                "b".to_string(),
                "c".to_string(),
            ]],
        };
        let message = error.to_string();
        assert!(message.contains("a -> b -> c -> a"), "got: {message}");
    }

    #[test]
    fn test_multiple_cycles_are_separated() {
        let error = GraphError::Cycle {
            cycles: vec![
                vec!["a".to_string(), "b".to_string()],
                vec!["x".to_string()],
            ],
        };
        let message = error.to_string();
        assert!(message.contains("a -> b -> a; x -> x"), "got: {message}");
    }
}
