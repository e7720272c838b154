//! Domain model for lifetrace
//!
//! This module contains core domain types and errors that provide:
//! - Compile-time safety via newtype pattern
//! - Self-documenting function signatures
//! - Structured error handling

pub mod errors;
pub mod types;

// Re-export common types for convenience
pub use types::{ObjectId, ObjectType, SourceLocId, Timestamp, GLOBAL_OBJECT_ID};

pub use errors::{AnalyzerError, EngineError, ExportError, TraceReadError};
