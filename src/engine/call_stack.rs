//! Call-stack shadow (§2 item 3, §4.3).
//!
//! Mirrors the instrumented program's call stack so that allocations can be
//! attributed to the call path that created them. Pushed on `function_enter`,
//! popped on `function_exit`, snapshotted on `create`/`create_fun`/`updateIID`.

use crate::domain::errors::EngineError;
use crate::domain::types::SourceLocId;

/// A stack of call-site ids, snapshotted by value.
///
/// Snapshots are independent `Vec` copies: later pushes/pops never mutate a
/// previously captured snapshot (see SPEC_FULL.md §9, "Call-stack snapshots
/// on allocation").
#[derive(Debug, Default)]
pub struct CallStackShadow {
    frames: Vec<SourceLocId>,
}

impl CallStackShadow {
    #[must_use]
    pub fn new() -> Self {
        CallStackShadow { frames: Vec::new() }
    }

    pub fn push(&mut self, call_site: SourceLocId) {
        self.frames.push(call_site);
    }

    /// Pop the top frame. A pop on an empty stack is a trace defect (§4.3);
    /// the caller decides whether that is fatal.
    pub fn pop(&mut self) -> Result<SourceLocId, EngineError> {
        self.frames.pop().ok_or(EngineError::CallStackUnderflow)
    }

    /// A logical copy of the current stack, bottom-to-top (innermost last),
    /// matching the JSON stream's `creation_call_stack` ordering (§6.2).
    #[must_use]
    pub fn snapshot(&self) -> Vec<SourceLocId> {
        self.frames.clone()
    }

    #[must_use]
    pub fn depth(&self) -> usize {
        self.frames.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_is_independent_of_later_mutation() {
        let mut shadow = CallStackShadow::new();
        shadow.push(SourceLocId::new(1, 1));
        let snap = shadow.snapshot();
        shadow.push(SourceLocId::new(2, 2));
        assert_eq!(snap, vec![SourceLocId::new(1, 1)]);
        assert_eq!(shadow.snapshot(), vec![SourceLocId::new(1, 1), SourceLocId::new(2, 2)]);
    }

    #[test]
    fn pop_on_empty_stack_is_reported_not_panicked() {
        let mut shadow = CallStackShadow::new();
        assert!(matches!(shadow.pop(), Err(EngineError::CallStackUnderflow)));
    }

    #[test]
    fn push_then_pop_restores_depth() {
        let mut shadow = CallStackShadow::new();
        shadow.push(SourceLocId::new(1, 1));
        shadow.push(SourceLocId::new(2, 2));
        assert_eq!(shadow.depth(), 2);
        assert_eq!(shadow.pop().unwrap(), SourceLocId::new(2, 2));
        assert_eq!(shadow.depth(), 1);
    }
}
