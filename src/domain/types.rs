//! Domain types providing compile-time safety and self-documentation
//!
//! Newtype wrappers prevent mixing up object ids with timestamps or site ids,
//! and make the engine's function signatures self-describing.

use std::fmt;

/// Stable, non-negative object id assigned upstream by the instrumented runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub i32);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<i32> for ObjectId {
    fn from(id: i32) -> Self {
        ObjectId(id)
    }
}

/// The id reserved for the script global object; never tracked.
pub const GLOBAL_OBJECT_ID: ObjectId = ObjectId(0);

/// A timestamp in the trace's own time base. `0` means "unknown"/"not yet observed".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Timestamp(pub u64);

impl Timestamp {
    pub const UNKNOWN: Timestamp = Timestamp(0);

    #[must_use]
    pub fn is_known(self) -> bool {
        self.0 > 0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque source-location identifier: `(file_id, iid)`.
///
/// Resolved to a printable string only through a [`crate::location::SourceLocationRegistry`];
/// the engine itself never interprets the components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceLocId {
    pub file_id: i32,
    pub iid: i32,
}

impl SourceLocId {
    #[must_use]
    pub const fn new(file_id: i32, iid: i32) -> Self {
        SourceLocId { file_id, iid }
    }

    /// Sentinel used when no real location is known.
    pub const UNKNOWN: SourceLocId = SourceLocId::new(-1, -1);

    /// Sentinel reported as the use-site for a DOM node detached by `remove_dom_child`.
    pub const REMOVE_FROM_DOM: SourceLocId = SourceLocId::new(-2, -2);
}

impl Default for SourceLocId {
    fn default() -> Self {
        SourceLocId::UNKNOWN
    }
}

/// Tag distinguishing the four kinds of tracked heap object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectType {
    Object,
    Dom,
    Function,
    Prototype,
}

impl ObjectType {
    /// Canonical name used in the per-object JSON stream (§6.2).
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ObjectType::Object => "OBJECT",
            ObjectType::Dom => "DOM",
            ObjectType::Function => "FUNCTION",
            ObjectType::Prototype => "PROTOTYPE",
        }
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
