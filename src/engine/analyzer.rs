//! The event-driven bookkeeping engine (§2, §4).
//!
//! [`Analyzer`] owns the live/unreachable object tables, the call-stack
//! shadow, and the live DOM forest, and implements [`EventSink`] — the fixed
//! set of operations the trace driver invokes in trace order (§6.1).

use std::collections::{BTreeMap, VecDeque};
use std::io::Write;

use crate::domain::errors::{AnalyzerError, EngineError};
use crate::domain::types::{ObjectId, ObjectType, SourceLocId, Timestamp, GLOBAL_OBJECT_ID};
use crate::engine::call_stack::CallStackShadow;
use crate::engine::dom_forest::DomForest;
use crate::engine::tables::{AllocInfo, IidUpdateRecord, InfoTable, LastUseUnreachableInfo};
use crate::export;
use crate::location::SourceLocationRegistry;

/// The fixed set of event-handling operations invoked by the trace driver,
/// in trace order (§6.1). Operations not named here (`declare`, `put_field`,
/// `write`, `top_level_flush`, `debug`, `return_stmt`, `add_to_child_set`,
/// `remove_from_child_set`, `script_enter`, `script_exit`,
/// `unreachable_context`) are no-ops for this analyzer; a trace driver should
/// simply not call through for them.
pub trait EventSink {
    fn init(&mut self, timer: Timestamp) -> Result<(), AnalyzerError>;

    fn create(
        &mut self,
        site: SourceLocId,
        oid: ObjectId,
        time: Timestamp,
        is_dom: bool,
    ) -> Result<(), AnalyzerError>;

    #[allow(clippy::too_many_arguments)]
    fn create_fun(
        &mut self,
        site: SourceLocId,
        oid: ObjectId,
        proto_id: ObjectId,
        enter_iid: SourceLocId,
        closure_names: Vec<String>,
        ctx: Option<ObjectId>,
        time: Timestamp,
    ) -> Result<(), AnalyzerError>;

    fn last_use(
        &mut self,
        oid: ObjectId,
        site: SourceLocId,
        time: Timestamp,
    ) -> Result<(), AnalyzerError>;

    fn unreachable_object(
        &mut self,
        site: SourceLocId,
        oid: ObjectId,
        time: Timestamp,
        shallow_size: u64,
    ) -> Result<(), AnalyzerError>;

    fn update_iid(&mut self, oid: ObjectId, new_site: SourceLocId) -> Result<(), AnalyzerError>;

    fn function_enter(
        &mut self,
        site: SourceLocId,
        fun_id: ObjectId,
        call_site: SourceLocId,
        ctx: Option<ObjectId>,
        time: Timestamp,
    ) -> Result<(), AnalyzerError>;

    fn function_exit(
        &mut self,
        site: SourceLocId,
        ctx: Option<ObjectId>,
        unref: bool,
        time: Timestamp,
    ) -> Result<(), AnalyzerError>;

    fn add_dom_child(
        &mut self,
        parent: ObjectId,
        child: ObjectId,
        time: Timestamp,
    ) -> Result<(), AnalyzerError>;

    fn remove_dom_child(
        &mut self,
        parent: ObjectId,
        child: ObjectId,
        time: Timestamp,
    ) -> Result<(), AnalyzerError>;

    fn dom_root(&mut self, oid: ObjectId) -> Result<(), AnalyzerError>;

    fn end_last_use(&mut self) -> Result<(), AnalyzerError>;

    fn end_execution(&mut self, time: Timestamp) -> Result<(), AnalyzerError>;
}

/// The bookkeeping engine. Generic over the (externally owned) registry and
/// the four output sinks, all borrowed for the analyzer's lifetime (§5).
pub struct Analyzer<'a, R: SourceLocationRegistry> {
    registry: &'a R,
    objects_out: &'a mut dyn Write,
    last_use_out: &'a mut dyn Write,
    unreachable_out: &'a mut dyn Write,
    iid_out: &'a mut dyn Write,

    live: BTreeMap<ObjectId, AllocInfo>,
    pending_unreachable: BTreeMap<ObjectId, AllocInfo>,
    info: InfoTable,
    forest: DomForest,
    call_stack: CallStackShadow,
    iid_log: Vec<IidUpdateRecord>,
    start_timer: Option<Timestamp>,
}

impl<'a, R: SourceLocationRegistry> Analyzer<'a, R> {
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        registry: &'a R,
        objects_out: &'a mut dyn Write,
        last_use_out: &'a mut dyn Write,
        unreachable_out: &'a mut dyn Write,
        iid_out: &'a mut dyn Write,
    ) -> Self {
        Analyzer {
            registry,
            objects_out,
            last_use_out,
            unreachable_out,
            iid_out,
            live: BTreeMap::new(),
            pending_unreachable: BTreeMap::new(),
            info: InfoTable::new(),
            forest: DomForest::new(),
            call_stack: CallStackShadow::new(),
            iid_log: Vec::new(),
            start_timer: None,
        }
    }

    #[must_use]
    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// The monotone-max write shared by every handler that updates
    /// `most_recent_use_*` (§4.2, §9 "Monotone-max writes"): the site only
    /// ever advances together with the time.
    fn update_most_recent_use(&mut self, oid: ObjectId, time: Timestamp, site: SourceLocId) {
        let entry = self.info.get_or_create(oid);
        if time.0 > entry.most_recent_use_time.0 {
            entry.most_recent_use_time = time;
            entry.most_recent_use_site = site;
        }
    }

    fn insert_live(&mut self, oid: ObjectId, alloc: AllocInfo) {
        // Revival (§3 invariant): an id lives in at most one of the two tables.
        self.pending_unreachable.remove(&oid);
        self.live.insert(oid, alloc);
    }

    /// Flushes `pending_unreachable` to the per-object JSON stream (§4.5,
    /// used by both `end_last_use` and the residual flush in `end_execution`).
    fn flush_pending_unreachable(&mut self) -> Result<(), AnalyzerError> {
        for (oid, alloc) in std::mem::take(&mut self.pending_unreachable) {
            let info = self
                .info
                .get(oid)
                .cloned()
                .unwrap_or_else(|| LastUseUnreachableInfo::new(oid));
            export::write_object_record(self.objects_out, self.registry, oid, &alloc, &info)?;
        }
        Ok(())
    }
}

impl<'a, R: SourceLocationRegistry> EventSink for Analyzer<'a, R> {
    fn init(&mut self, timer: Timestamp) -> Result<(), AnalyzerError> {
        self.start_timer = Some(timer);
        Ok(())
    }

    fn create(
        &mut self,
        site: SourceLocId,
        oid: ObjectId,
        time: Timestamp,
        is_dom: bool,
    ) -> Result<(), AnalyzerError> {
        if oid == GLOBAL_OBJECT_ID {
            return Ok(());
        }
        let object_type = if is_dom { ObjectType::Dom } else { ObjectType::Object };
        let snapshot = self.call_stack.snapshot();
        self.insert_live(oid, AllocInfo::new(object_type, site, time, snapshot));
        self.update_most_recent_use(oid, time, site);
        Ok(())
    }

    fn create_fun(
        &mut self,
        site: SourceLocId,
        oid: ObjectId,
        proto_id: ObjectId,
        _enter_iid: SourceLocId,
        _closure_names: Vec<String>,
        _ctx: Option<ObjectId>,
        time: Timestamp,
    ) -> Result<(), AnalyzerError> {
        let snapshot = self.call_stack.snapshot();
        self.insert_live(
            oid,
            AllocInfo::new(ObjectType::Function, site, time, snapshot.clone()),
        );
        self.insert_live(proto_id, AllocInfo::new(ObjectType::Prototype, site, time, snapshot));
        self.update_most_recent_use(oid, time, site);
        self.update_most_recent_use(proto_id, time, site);
        Ok(())
    }

    fn last_use(
        &mut self,
        oid: ObjectId,
        site: SourceLocId,
        time: Timestamp,
    ) -> Result<(), AnalyzerError> {
        if oid == GLOBAL_OBJECT_ID {
            return Ok(());
        }
        self.update_most_recent_use(oid, time, site);
        let entry = self.info.get_or_create(oid);
        if entry.unreachable_time.is_known() && entry.unreachable_time.0 < time.0 {
            entry.unreachable_time = time;
            entry.unreachable_site = site;
        }
        Ok(())
    }

    fn unreachable_object(
        &mut self,
        site: SourceLocId,
        oid: ObjectId,
        time: Timestamp,
        _shallow_size: u64,
    ) -> Result<(), AnalyzerError> {
        let entry = self.info.get_or_create(oid);
        if entry.unreachable_time.0 < time.0 {
            entry.unreachable_time = time;
            entry.unreachable_site = site;
        }

        if self.forest.contains(oid) {
            self.update_most_recent_use(oid, time, site);
            self.forest.remove_entry(oid);
        }

        if let Some(alloc) = self.live.remove(&oid) {
            self.pending_unreachable.insert(oid, alloc);
        } else {
            self.pending_unreachable.entry(oid).or_insert_with(AllocInfo::synthesize_dom);
        }
        Ok(())
    }

    fn update_iid(&mut self, oid: ObjectId, new_site: SourceLocId) -> Result<(), AnalyzerError> {
        let snapshot = self.call_stack.snapshot();
        let alloc = self
            .live
            .get_mut(&oid)
            .ok_or(EngineError::UnknownObjectForUpdateIid(oid))?;
        alloc.allocation_site = new_site;
        alloc.creation_call_stack = snapshot;
        self.iid_log.push(IidUpdateRecord {
            object_id: oid,
            creation_time: alloc.creation_time,
            new_site,
        });
        Ok(())
    }

    fn function_enter(
        &mut self,
        _site: SourceLocId,
        _fun_id: ObjectId,
        call_site: SourceLocId,
        _ctx: Option<ObjectId>,
        _time: Timestamp,
    ) -> Result<(), AnalyzerError> {
        self.call_stack.push(call_site);
        Ok(())
    }

    fn function_exit(
        &mut self,
        _site: SourceLocId,
        _ctx: Option<ObjectId>,
        _unref: bool,
        _time: Timestamp,
    ) -> Result<(), AnalyzerError> {
        self.call_stack.pop()?;
        Ok(())
    }

    fn add_dom_child(
        &mut self,
        parent: ObjectId,
        child: ObjectId,
        _time: Timestamp,
    ) -> Result<(), AnalyzerError> {
        let acted = self.forest.attach(parent, child)?;
        if acted && !self.live.contains_key(&child) {
            self.insert_live(child, AllocInfo::synthesize_dom());
        }
        Ok(())
    }

    fn remove_dom_child(
        &mut self,
        parent: ObjectId,
        child: ObjectId,
        time: Timestamp,
    ) -> Result<(), AnalyzerError> {
        if !self.forest.detach(parent, child)? {
            return Ok(());
        }

        // Breadth-first over the detached subtree (§4.4); order only affects
        // which forest entries disappear in which sequence, not the recorded
        // most-recent-use time.
        let mut queue = VecDeque::from([child]);
        while let Some(node) = queue.pop_front() {
            if self.forest.clear_two_parent(node) {
                continue;
            }
            let children = self
                .forest
                .remove_entry(node)
                .ok_or(EngineError::MissingForestEntry(node))?;
            self.update_most_recent_use(node, time, SourceLocId::REMOVE_FROM_DOM);
            queue.extend(children);
        }
        Ok(())
    }

    fn dom_root(&mut self, oid: ObjectId) -> Result<(), AnalyzerError> {
        self.forest.establish_root(oid);
        Ok(())
    }

    fn end_last_use(&mut self) -> Result<(), AnalyzerError> {
        self.flush_pending_unreachable()
    }

    fn end_execution(&mut self, _time: Timestamp) -> Result<(), AnalyzerError> {
        if !self.live.is_empty() {
            return Err(EngineError::LiveObjectsAtEndOfExecution(self.live.len()).into());
        }
        self.flush_pending_unreachable()?;

        let entries = std::mem::take(&mut self.info).into_entries();

        let mut by_last_use = entries.clone();
        by_last_use.sort_by(|a, b| last_use_sort_key(a).cmp(&last_use_sort_key(b)));
        for entry in &by_last_use {
            match entry {
                Some(e) if e.most_recent_use_time.is_known() => {
                    export::write_last_use_record(
                        self.last_use_out,
                        e.object_id,
                        e.most_recent_use_time,
                        e.most_recent_use_site,
                    )?;
                }
                _ => break,
            }
        }

        let mut by_unreachable = entries;
        by_unreachable.sort_by(|a, b| unreachable_sort_key(a).cmp(&unreachable_sort_key(b)));
        for entry in &by_unreachable {
            match entry {
                Some(e) => {
                    export::write_unreachable_record(
                        self.unreachable_out,
                        e.object_id,
                        e.unreachable_time,
                        e.unreachable_site,
                    )?;
                }
                None => break,
            }
        }

        let mut iid_log = std::mem::take(&mut self.iid_log);
        iid_log.sort_by_key(|record| record.creation_time);
        for record in &iid_log {
            export::write_iid_update_record(self.iid_out, record.object_id, record.new_site)?;
        }

        Ok(())
    }
}

/// Populated entries sort by ascending time; null/zero entries sort last
/// (§4.5 step 3).
fn last_use_sort_key(entry: &Option<LastUseUnreachableInfo>) -> (bool, u64) {
    match entry {
        Some(e) if e.most_recent_use_time.is_known() => (false, e.most_recent_use_time.0),
        _ => (true, u64::MAX),
    }
}

/// Populated entries (including `unreachable_time == 0`) sort by ascending
/// time; null entries sort last (§4.5 step 4).
fn unreachable_sort_key(entry: &Option<LastUseUnreachableInfo>) -> (bool, u64) {
    match entry {
        Some(e) => (false, e.unreachable_time.0),
        None => (true, u64::MAX),
    }
}
