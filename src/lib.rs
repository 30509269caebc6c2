//! Steptool: discovery and refactoring of Python step implementations.
//!
//! Step implementations are top-level functions marked with a decorator such
//! as `@step("The word <word> has <number> vowels.")`. Steptool parses step
//! files into a lossless concrete syntax tree, lists the steps they define,
//! and rewrites step texts and parameter lists without touching any other
//! byte of the file.

// Core infrastructure - re-exported from steptool-core
pub use steptool_core::error;
pub use steptool_core::output;
pub use steptool_core::patch;
pub use steptool_core::report;
pub use steptool_core::text;

// Parsing and positions
pub mod source_tree;
pub mod span;

// Discovery
pub mod scan;
pub mod steps;

// Refactoring
pub mod refactor;

// Glue: registry, file loading, configuration
pub mod config;
pub mod loader;
pub mod registry;

pub use refactor::RefactorEngine;
pub use source_tree::SourceTree;
pub use span::{LazySpan, SpanCalculator, StepSpan};
pub use steps::{iter_steps, FunctionSteps};
