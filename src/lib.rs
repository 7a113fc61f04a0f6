//! Mend - iterative diagnose-and-repair engine for Python source.
//!
//! Mend finds localized defects in a Python buffer, scores the buffer along
//! four quality dimensions, and repairs it in small budgeted batches until
//! it converges, stops improving, or reaches an iteration ceiling.
//!
//! # Example
//!
//! ```no_run
//! use mend::config::Config;
//! use mend::Engine;
//!
//! let engine = Engine::new(Config::default()).unwrap();
//! let result = engine.heal("def foo()\n    pass\n", "foo.py").unwrap();
//! assert!(result.healed_source.starts_with("def foo():"));
//! println!("{}", mend::report::heal_summary(&result));
//! ```

pub mod analyzer;
pub mod cli;
pub mod config;
pub mod controller;
pub mod core;
pub mod engine;
pub mod output;
pub mod parser;
pub mod repair;
pub mod report;
pub mod score;

pub use engine::{Diagnosis, Engine, EngineResult};
