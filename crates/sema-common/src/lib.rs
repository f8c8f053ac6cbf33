//! Common types and utilities for the sema workspace.
//!
//! This crate provides foundational types used across all sema crates:
//! - Source spans (`Span`)
//! - Diagnostics (`Diagnostic`, `DiagnosticCategory`, codes and message templates)
//! - Centralized limits and thresholds
//! - Tracing subscriber initialisation

// Span - Source location tracking (byte offsets)
pub mod span;
pub use span::Span;

// Diagnostics produced by the collector and the binder
pub mod diagnostics;
pub use diagnostics::{
    Diagnostic, DiagnosticCategory, DiagnosticMessage, DiagnosticRelatedInformation,
    diagnostic_codes, format_message, get_diagnostic_message,
};

// Centralized limits and thresholds
pub mod limits;

// Opt-in tracing output (SEMA_LOG / RUST_LOG)
pub mod tracing_config;
