//! Line-delimited JSON trace ingestion (ambient, see SPEC_FULL.md §4.7).
//!
//! Deserializes one tagged event record per line and dispatches it to the
//! [`EventSink`] trait in file order. This module performs no bookkeeping of
//! its own and has no visibility into the engine's internal tables; it is a
//! pure adapter at the boundary named out of scope by §1.

use std::io::BufRead;

use anyhow::Context;
use serde::Deserialize;

use crate::domain::errors::TraceReadError;
use crate::domain::types::{ObjectId, SourceLocId, Timestamp};
use crate::engine::analyzer::EventSink;
use crate::location::InMemorySourceMap;

/// A source-location id as it appears on the wire: a two-element
/// `[file_id, iid]` array.
#[derive(Debug, Clone, Copy, Deserialize)]
struct RawSite(i32, i32);

impl From<RawSite> for SourceLocId {
    fn from(raw: RawSite) -> Self {
        SourceLocId::new(raw.0, raw.1)
    }
}

/// One tagged trace record, dispatched on its `"op"` field (§6.1).
#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum TraceEvent {
    Init {
        timer: u64,
        #[serde(default)]
        source_map: serde_json::Map<String, serde_json::Value>,
    },
    Create {
        site: RawSite,
        oid: i32,
        time: u64,
        is_dom: bool,
    },
    CreateFun {
        site: RawSite,
        oid: i32,
        proto_id: i32,
        enter_iid: RawSite,
        #[serde(default)]
        closure_names: Vec<String>,
        #[serde(default)]
        ctx: Option<i32>,
        time: u64,
    },
    LastUse {
        oid: i32,
        site: RawSite,
        time: u64,
    },
    UnreachableObject {
        site: RawSite,
        oid: i32,
        time: u64,
        #[serde(default)]
        shallow_size: u64,
    },
    UpdateIid {
        oid: i32,
        new_site: RawSite,
    },
    FunctionEnter {
        site: RawSite,
        fun_id: i32,
        call_site: RawSite,
        #[serde(default)]
        ctx: Option<i32>,
        time: u64,
    },
    FunctionExit {
        site: RawSite,
        #[serde(default)]
        ctx: Option<i32>,
        #[serde(default)]
        unref: bool,
        time: u64,
    },
    AddDomChild {
        parent: i32,
        child: i32,
        time: u64,
    },
    RemoveDomChild {
        parent: i32,
        child: i32,
        time: u64,
    },
    DomRoot {
        oid: i32,
    },
    EndLastUse {},
    EndExecution {
        time: u64,
    },
    // Accepted silently per §6.1; carried no further than this match arm.
    Declare,
    PutField,
    Write,
    TopLevelFlush,
    Debug,
    ReturnStmt,
    AddToChildSet,
    RemoveFromChildSet,
    ScriptEnter,
    ScriptExit,
    UnreachableContext,
}

const KNOWN_OPS: &[&str] = &[
    "init",
    "create",
    "create_fun",
    "last_use",
    "unreachable_object",
    "update_iid",
    "function_enter",
    "function_exit",
    "add_dom_child",
    "remove_dom_child",
    "dom_root",
    "end_last_use",
    "end_execution",
    "declare",
    "put_field",
    "write",
    "top_level_flush",
    "debug",
    "return_stmt",
    "add_to_child_set",
    "remove_from_child_set",
    "script_enter",
    "script_exit",
    "unreachable_context",
];

/// Parses one line into its op tag plus the [`TraceEvent`] it deserializes
/// to, or a [`TraceReadError`] naming which of the two failed.
fn parse_line(line: &str, line_no: usize) -> Result<(String, TraceEvent), TraceReadError> {
    let value: serde_json::Value = serde_json::from_str(line)
        .map_err(|source| TraceReadError::MalformedLine { line_no, source })?;
    let op = value.get("op").and_then(serde_json::Value::as_str).unwrap_or("").to_string();
    if !KNOWN_OPS.contains(&op.as_str()) {
        return Err(TraceReadError::UnknownOperation { line_no, op });
    }
    let event = serde_json::from_value(value)
        .map_err(|source| TraceReadError::MalformedLine { line_no, source })?;
    Ok((op, event))
}

/// Consumes the leading `init` event from `reader`, returning the
/// source-location registry it populates. Per SPEC_FULL.md §4.7, `init` is
/// required to be the trace's first non-blank line: the registry must be
/// fully populated before the analyzer borrows it (§5), so there is no
/// support for a source map that arrives incrementally mid-trace.
pub fn read_init<R: BufRead>(reader: &mut R) -> anyhow::Result<InMemorySourceMap> {
    let mut registry = InMemorySourceMap::new();

    for (idx, line) in (&mut *reader).lines().enumerate() {
        let line_no = idx + 1;
        let line = line.map_err(TraceReadError::Io)?;
        if line.trim().is_empty() {
            continue;
        }
        let (op, event) = parse_line(&line, line_no)?;
        let TraceEvent::Init { source_map, .. } = event else {
            anyhow::bail!("trace line {line_no}: expected the first event to be `init`, found `{op}`");
        };
        registry.load_from_json(&source_map);
        return Ok(registry);
    }

    Ok(registry)
}

/// Dispatches every remaining line of `reader` to `sink` in file order.
/// `first_line_no` is the 1-based line number of the first line `reader`
/// will yield, for accurate error reporting when lines were already
/// consumed upstream (e.g. by [`read_init`]).
pub fn ingest_events<R: BufRead, S: EventSink>(
    reader: R,
    sink: &mut S,
    first_line_no: usize,
) -> anyhow::Result<()> {
    for (idx, line) in reader.lines().enumerate() {
        let line_no = first_line_no + idx;
        let line = line.map_err(TraceReadError::Io)?;
        if line.trim().is_empty() {
            continue;
        }
        let (op, event) = parse_line(&line, line_no)?;
        dispatch(event, sink).with_context(|| format!("trace line {line_no} (op = {op})"))?;
    }

    Ok(())
}

/// The registry borrowed by the analyzer (§5) is populated once, up front, by
/// [`read_init`]; it is shared by reference for the analyzer's lifetime and
/// must not be mutated while the analyzer runs. A second `init` line reaching
/// this function has nowhere to apply its source map and is therefore a
/// trace defect, not a silent no-op.
fn dispatch<S: EventSink>(event: TraceEvent, sink: &mut S) -> anyhow::Result<()> {
    match event {
        TraceEvent::Init { .. } => {
            return Err(TraceReadError::UnexpectedReinit.into());
        }
        TraceEvent::Create { site, oid, time, is_dom } => {
            sink.create(site.into(), ObjectId(oid), Timestamp(time), is_dom)?;
        }
        TraceEvent::CreateFun { site, oid, proto_id, enter_iid, closure_names, ctx, time } => {
            sink.create_fun(
                site.into(),
                ObjectId(oid),
                ObjectId(proto_id),
                enter_iid.into(),
                closure_names,
                ctx.map(ObjectId),
                Timestamp(time),
            )?;
        }
        TraceEvent::LastUse { oid, site, time } => {
            sink.last_use(ObjectId(oid), site.into(), Timestamp(time))?;
        }
        TraceEvent::UnreachableObject { site, oid, time, shallow_size } => {
            sink.unreachable_object(site.into(), ObjectId(oid), Timestamp(time), shallow_size)?;
        }
        TraceEvent::UpdateIid { oid, new_site } => {
            sink.update_iid(ObjectId(oid), new_site.into())?;
        }
        TraceEvent::FunctionEnter { site, fun_id, call_site, ctx, time } => {
            sink.function_enter(
                site.into(),
                ObjectId(fun_id),
                call_site.into(),
                ctx.map(ObjectId),
                Timestamp(time),
            )?;
        }
        TraceEvent::FunctionExit { site, ctx, unref, time } => {
            sink.function_exit(site.into(), ctx.map(ObjectId), unref, Timestamp(time))?;
        }
        TraceEvent::AddDomChild { parent, child, time } => {
            sink.add_dom_child(ObjectId(parent), ObjectId(child), Timestamp(time))?;
        }
        TraceEvent::RemoveDomChild { parent, child, time } => {
            sink.remove_dom_child(ObjectId(parent), ObjectId(child), Timestamp(time))?;
        }
        TraceEvent::DomRoot { oid } => {
            sink.dom_root(ObjectId(oid))?;
        }
        TraceEvent::EndLastUse {} => {
            sink.end_last_use()?;
        }
        TraceEvent::EndExecution { time } => {
            sink.end_execution(Timestamp(time))?;
        }
        TraceEvent::Declare
        | TraceEvent::PutField
        | TraceEvent::Write
        | TraceEvent::TopLevelFlush
        | TraceEvent::Debug
        | TraceEvent::ReturnStmt
        | TraceEvent::AddToChildSet
        | TraceEvent::RemoveFromChildSet
        | TraceEvent::ScriptEnter
        | TraceEvent::ScriptExit
        | TraceEvent::UnreachableContext => {}
    }
    Ok(())
}
