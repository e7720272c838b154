//! Output stream serialization (§4.6, §6.2, §6.3).
//!
//! This module provides pure serialization functions for the three binary
//! streams and the per-object JSON stream. It owns no state of its own — the
//! engine (see [`crate::engine`]) decides what to emit and in what order.

pub mod binary;
pub mod json_stream;

pub use binary::{write_iid_update_record, write_last_use_record, write_unreachable_record};
pub use json_stream::write_object_record;
