//! The bookkeeping engine: call-stack shadow, DOM forest, per-object tables,
//! and the [`analyzer::Analyzer`] that ties them together behind the
//! [`analyzer::EventSink`] trait (§2, §4).

pub mod analyzer;
pub mod call_stack;
pub mod dom_forest;
pub mod tables;

pub use analyzer::{Analyzer, EventSink};
