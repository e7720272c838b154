//! Per-object JSON stream (§4.6, §6.2).
//!
//! One JSON array per line, UTF-8, exactly nine elements, written for every
//! object flushed out of the pending-unreachable table.

use crate::domain::errors::ExportError;
use crate::domain::types::{ObjectId, SourceLocId};
use crate::engine::tables::{AllocInfo, LastUseUnreachableInfo};
use crate::location::SourceLocationRegistry;
use serde_json::{json, Value};
use std::io::Write;

/// Builds the nine-element JSON array for one object record.
fn build_record(
    registry: &dyn SourceLocationRegistry,
    oid: ObjectId,
    alloc: &AllocInfo,
    info: &LastUseUnreachableInfo,
) -> Value {
    let call_stack: Vec<Value> =
        alloc.creation_call_stack.iter().map(|site| json!(registry.resolve(*site))).collect();

    json!([
        oid.0,
        alloc.object_type.as_str(),
        registry.resolve(alloc.allocation_site),
        alloc.creation_time.0,
        call_stack,
        info.most_recent_use_time.0,
        registry.resolve(info.most_recent_use_site),
        info.unreachable_time.0,
        registry.resolve(info.unreachable_site),
    ])
}

/// Writes one object's combined record as a single JSON line.
pub fn write_object_record<W: Write + ?Sized>(
    writer: &mut W,
    registry: &dyn SourceLocationRegistry,
    oid: ObjectId,
    alloc: &AllocInfo,
    info: &LastUseUnreachableInfo,
) -> Result<(), ExportError> {
    let record = build_record(registry, oid, alloc, info);
    serde_json::to_writer(&mut *writer, &record)?;
    writer.write_all(b"\n")?;
    Ok(())
}
