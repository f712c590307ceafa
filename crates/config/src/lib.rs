//! Typed GitHub repository configuration.
//!
//! Repository configuration is declared as plain Rust values: workflows and
//! jobs, Dependabot settings, issue/discussion/PR templates, and CODEOWNERS
//! rules. Declarations live in an ordinary library crate; the `gantry`
//! pipeline discovers them, evaluates them, and writes the corresponding
//! `.github/` artifacts.
//!
//! A minimal declaration module looks like:
//!
//! ```
//! use gantry_config::workflow::{Job, On, Push, Step, Workflow};
//! use gantry_config::{jobs, needs};
//!
//! pub fn build() -> Job {
//!     Job {
//!         runs_on: "ubuntu-latest".into(),
//!         steps: vec![Step::uses("actions/checkout@v4"), Step::run("cargo build")],
//!         ..Job::default()
//!     }
//! }
//!
//! pub fn test() -> Job {
//!     Job {
//!         runs_on: "ubuntu-latest".into(),
//!         needs: needs![build],
//!         steps: vec![Step::run("cargo test")],
//!         ..Job::default()
//!     }
//! }
//!
//! pub fn ci() -> Workflow {
//!     Workflow {
//!         name: "CI".to_string(),
//!         on: On {
//!             push: Some(Push { branches: vec!["main".to_string()], ..Push::default() }),
//!             ..On::default()
//!         },
//!         jobs: jobs![build, test],
//!         ..Workflow::default()
//!     }
//! }
//! ```

pub mod codeowners;
pub mod dependabot;
pub mod emit;
pub mod templates;
pub mod workflow;
