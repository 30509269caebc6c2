//! Core infrastructure for steptool.
//!
//! This crate provides language-agnostic infrastructure:
//! - Line/column spans and text edits addressed against original source
//! - Edit application for callers that patch their own copy of a file
//! - Error types and error codes
//! - JSON output types for CLI responses
//! - The reporter capability used to surface per-item failures
//! - Text utilities for position conversions

pub mod error;
pub mod output;
pub mod patch;
pub mod report;
pub mod text;
