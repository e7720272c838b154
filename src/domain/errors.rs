//! Structured error types for lifetrace
//!
//! Using thiserror for automatic Display implementation and error chaining.
//! Three taxonomies mirror the three failure classes in the analyzer's design:
//! contract violations raised by the bookkeeping engine itself, I/O failures
//! while writing the emitted streams, and malformed input while reading the
//! trace file.

use crate::domain::types::ObjectId;
use thiserror::Error;

/// Fatal trace-contract violations raised by the bookkeeping engine (§7).
///
/// Every variant here indicates the trace itself is internally inconsistent;
/// none of these are retried or recovered locally.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("updateIID referenced unknown object {0}")]
    UnknownObjectForUpdateIid(ObjectId),

    #[error("end_execution reached with {0} object(s) still live")]
    LiveObjectsAtEndOfExecution(usize),

    #[error("remove_dom_child: child {child} is not in parent {parent}'s child set")]
    ChildNotInParent { parent: ObjectId, child: ObjectId },

    #[error("two-parent set already contained {0}")]
    DuplicateTwoParentEntry(ObjectId),

    #[error("DOM traversal visited {0}, which has no forest entry")]
    MissingForestEntry(ObjectId),

    #[error("function_exit popped an empty call-stack shadow")]
    CallStackUnderflow,
}

/// Failures while writing the emitted streams (§6.2, §6.3).
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("failed to serialize per-object record: {0}")]
    SerializationFailed(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Failures while reading the input trace (ambient, §4.7).
///
/// Distinct from [`EngineError`]: these indicate a syntactically broken trace
/// file rather than a semantically inconsistent but well-formed one.
#[derive(Error, Debug)]
pub enum TraceReadError {
    #[error("malformed trace line {line_no}: {source}")]
    MalformedLine { line_no: usize, source: serde_json::Error },

    #[error("unrecognized trace operation {op:?} at line {line_no}")]
    UnknownOperation { line_no: usize, op: String },

    #[error("a second `init` event appeared after the leading one; the source-location registry is already borrowed and cannot be updated mid-trace")]
    UnexpectedReinit,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Unified error type for [`crate::engine::analyzer::EventSink`]: every
/// handler can fail either on an engine-contract violation or while
/// flushing one of the output streams.
#[derive(Error, Debug)]
pub enum AnalyzerError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Export(#[from] ExportError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_error_display_includes_object_id() {
        let err = EngineError::UnknownObjectForUpdateIid(ObjectId(42));
        assert!(err.to_string().contains("#42"));
    }

    #[test]
    fn child_not_in_parent_display_names_both_ids() {
        let err = EngineError::ChildNotInParent { parent: ObjectId(1), child: ObjectId(2) };
        let msg = err.to_string();
        assert!(msg.contains("#1"));
        assert!(msg.contains("#2"));
    }

    #[test]
    fn unknown_operation_display_includes_line_number() {
        let err = TraceReadError::UnknownOperation { line_no: 7, op: "frobnicate".to_string() };
        assert!(err.to_string().contains('7'));
        assert!(err.to_string().contains("frobnicate"));
    }
}
