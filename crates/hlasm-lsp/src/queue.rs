//! The work queue / orchestrator (`spec.md` §4.8).
//!
//! Grounded in `examples/original_source/parser_library/src/workspace_manager_impl.h`'s
//! `ws_path_match` (workspace resolution) and its single work-queue loop: one
//! logical worker advances items in FIFO order, pulling configuration through
//! a pending response channel before a workspace-open/settings-change item is
//! allowed to advance.
//!
//! `hlasm-ide`'s [`Workspace`] resolves a parse synchronously on every edit,
//! so unlike the original there is no separate "parse task in flight" to
//! resume between queue items; `drain` below folds the original's
//! run-item-then-advance-parse-loop into a single step per item. The queue
//! abstraction, workspace resolution, enqueue discipline, and cancellation
//! semantics are preserved in full.

use hlasm_core::location::ResourceLocation;
use hlasm_core::Diagnostic;
use hlasm_ide::Workspace;
use rustc_hash::FxHashMap;
use std::collections::VecDeque;

use crate::channel::{Consumer, Producer};
use crate::config::WorkspaceSettings;

/// A handle to one logical workspace tracked by the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WorkspaceId(usize);

struct Entry {
    name: String,
    root: String,
    quiet: bool,
    workspace: Workspace,
    settings: WorkspaceSettings,
    removed: bool,
}

/// The action carried by a queued item.
pub enum Action {
    /// A file-manager mutation: `did_open`/`did_change`/`did_close` applied
    /// to the owning workspace (bound to no workspace per se, but routed
    /// here since each `hlasm_ide::Workspace` owns its own file manager).
    FileChange {
        loc: ResourceLocation,
        version: i32,
        text: Option<String>,
    },
    /// Register a new workspace, pending its initial configuration pull.
    WorkspaceOpen { name: String, root: String },
    /// The client pushed new settings for this workspace.
    SettingsChange,
    /// A synchronous query, reported back through `response`.
    Query(QueryFn),
}

/// A boxed query body: given the workspace, returns diagnostics-free query
/// output already rendered by the caller into `T`.
pub type QueryFn = Box<dyn FnOnce(&Workspace) -> serde_json::Value>;

struct WorkItem {
    workspace: WorkspaceId,
    action: Action,
    pending_config: Option<Consumer<WorkspaceSettings>>,
    query_channel: Option<Consumer<serde_json::Value>>,
    query_producer: Option<Producer<serde_json::Value>>,
}

/// The implicit (no matching root) and quiet-implicit (suppressed
/// diagnostics) workspace names, matching `spec.md` §4.8(d).
const IMPLICIT: &str = "";
const QUIET_IMPLICIT: &str = "";

/// Single-threaded cooperative driver over a set of workspaces.
pub struct Orchestrator {
    entries: Vec<Entry>,
    queue: VecDeque<WorkItem>,
    implicit: WorkspaceId,
    quiet_implicit: WorkspaceId,
}

impl Orchestrator {
    /// Creates an orchestrator with the two always-present implicit
    /// workspaces already registered.
    #[must_use]
    pub fn new() -> Self {
        let mut entries = vec![
            Entry {
                name: "<implicit>".to_string(),
                root: IMPLICIT.to_string(),
                quiet: false,
                workspace: Workspace::new(),
                settings: WorkspaceSettings::empty(),
                removed: false,
            },
            Entry {
                name: "<quiet-implicit>".to_string(),
                root: QUIET_IMPLICIT.to_string(),
                quiet: true,
                workspace: Workspace::new(),
                settings: WorkspaceSettings::empty(),
                removed: false,
            },
        ];
        Self {
            entries,
            queue: VecDeque::new(),
            implicit: WorkspaceId(0),
            quiet_implicit: WorkspaceId(1),
        }
    }

    /// Registers a real workspace rooted at `root`, returning its id.
    pub fn open_workspace(&mut self, name: impl Into<String>, root: impl Into<String>) -> WorkspaceId {
        let id = WorkspaceId(self.entries.len());
        self.entries.push(Entry {
            name: name.into(),
            root: root.into(),
            quiet: false,
            workspace: Workspace::new(),
            settings: WorkspaceSettings::empty(),
            removed: false,
        });
        id
    }

    /// Removes a workspace: marks every in-queue item targeting it
    /// `workspace_removed` by invalidating pending channels and dropping the
    /// items outright (`spec.md` §4.8 cancellation).
    pub fn remove_workspace(&mut self, id: WorkspaceId) {
        if let Some(entry) = self.entries.get_mut(id.0) {
            entry.removed = true;
        }
        self.queue.retain(|item| {
            if item.workspace == id {
                if let Some(producer) = &item.query_producer {
                    producer.invalidate();
                }
                false
            } else {
                true
            }
        });
    }

    /// Resolves the workspace that should own `loc`, per `spec.md` §4.8:
    /// virtual-file workspace id, `hlasm-external` decode-and-restart, the
    /// longest matching root prefix, then the (quiet) implicit workspace.
    #[must_use]
    pub fn resolve_workspace(&self, loc: &ResourceLocation) -> WorkspaceId {
        if let Some((ws_name, _member)) = loc.hlasm_id_and_member() {
            if let Some(pos) = self.entries.iter().position(|e| e.name == ws_name) {
                return WorkspaceId(pos);
            }
        }
        if let Some((host, _member)) = loc.hlasm_external_host_and_member() {
            if let Some(decoded) = decode_base16(host) {
                return self.resolve_workspace(&ResourceLocation::new(decoded));
            }
        }

        let uri = loc.as_str();
        let best = self
            .entries
            .iter()
            .enumerate()
            .skip(2)
            .filter(|(_, e)| !e.removed && uri.starts_with(e.root.as_str()) && e.root.len() >= e.name.len())
            .max_by_key(|(_, e)| e.root.len());

        if let Some((idx, _)) = best {
            return WorkspaceId(idx);
        }

        match loc.scheme() {
            Some("file") | Some("untitled") => self.implicit,
            _ => self.quiet_implicit,
        }
    }

    /// Enqueues a file-change request: a file-manager mutation followed by a
    /// workspace-side reparse task, per the two-item enqueue discipline.
    pub fn enqueue_file_change(&mut self, loc: ResourceLocation, version: i32, text: Option<String>) {
        let workspace = self.resolve_workspace(&loc);
        self.queue.push_back(WorkItem {
            workspace,
            action: Action::FileChange { loc, version, text },
            pending_config: None,
            query_channel: None,
            query_producer: None,
        });
    }

    /// Enqueues a workspace-open request with its configuration pull.
    pub fn enqueue_workspace_open(&mut self, id: WorkspaceId, name: String, root: String, pending_config: Consumer<WorkspaceSettings>) {
        self.queue.push_back(WorkItem {
            workspace: id,
            action: Action::WorkspaceOpen { name, root },
            pending_config: Some(pending_config),
            query_channel: None,
            query_producer: None,
        });
    }

    /// Enqueues a settings-change request with its configuration pull.
    pub fn enqueue_settings_change(&mut self, id: WorkspaceId, pending_config: Consumer<WorkspaceSettings>) {
        self.queue.push_back(WorkItem {
            workspace: id,
            action: Action::SettingsChange,
            pending_config: Some(pending_config),
            query_channel: None,
            query_producer: None,
        });
    }

    /// Enqueues a query bound to the workspace resolved for `loc`, reporting
    /// its result (or cancellation) through `producer`.
    pub fn enqueue_query(
        &mut self,
        loc: &ResourceLocation,
        query: QueryFn,
        producer: Producer<serde_json::Value>,
        cancel: Consumer<serde_json::Value>,
    ) {
        let workspace = self.resolve_workspace(loc);
        self.queue.push_back(WorkItem {
            workspace,
            action: Action::Query(query),
            pending_config: None,
            query_channel: Some(cancel),
            query_producer: Some(producer),
        });
    }

    /// Drains every ready item from the head of the queue, applying file
    /// changes, configuration, and queries against their workspace. Items
    /// whose configuration pull is still pending, or whose query channel was
    /// invalidated, block/drop per `spec.md` §4.8's advance rule.
    ///
    /// Returns the diagnostics produced by any file-change item that ran.
    pub fn drain(&mut self) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        while let Some(item) = self.queue.front() {
            if let Some(channel) = &item.query_channel {
                if !channel.is_pending() {
                    // invalidated: drop without running
                    self.queue.pop_front();
                    continue;
                }
            }
            if let Some(pending) = &item.pending_config {
                if pending.is_pending() {
                    break;
                }
            }
            let item = self.queue.pop_front().expect("front just checked Some");
            diagnostics.extend(self.run(item));
        }
        diagnostics
    }

    fn run(&mut self, item: WorkItem) -> Vec<Diagnostic> {
        let WorkItem { workspace, action, pending_config, query_producer, .. } = item;
        let Some(entry) = self.entries.get_mut(workspace.0) else {
            return Vec::new();
        };
        if let Some(pending) = pending_config {
            use crate::channel::ChannelState;
            entry.settings = match pending.state() {
                ChannelState::Provided(settings) => settings,
                ChannelState::Errored(_, _) | ChannelState::Invalidated => WorkspaceSettings::empty(),
                ChannelState::Pending => unreachable!("advance rule blocks pending channels"),
            };
        }
        match action {
            Action::FileChange { loc, version, text } => {
                let diags = match text {
                    Some(text) if entry.workspace.files().get_file(&loc).is_some() => {
                        entry.workspace.did_change_file(loc, version, text)
                    }
                    Some(text) => entry.workspace.did_open_file(loc, version, text),
                    None => {
                        entry.workspace.did_close_file(&loc);
                        Vec::new()
                    }
                };
                if entry.quiet {
                    Vec::new()
                } else {
                    diags
                }
            }
            Action::WorkspaceOpen { name, root } => {
                entry.name = name;
                entry.root = root;
                Vec::new()
            }
            Action::SettingsChange => Vec::new(),
            Action::Query(query) => {
                if let Some(producer) = query_producer {
                    producer.provide(query(&entry.workspace));
                }
                Vec::new()
            }
        }
    }

    /// Mutable access to a workspace's state, for the LSP handlers that read
    /// query results directly rather than through [`Orchestrator::drain`].
    pub fn workspace_mut(&mut self, id: WorkspaceId) -> &mut Workspace {
        &mut self.entries[id.0].workspace
    }

    /// Read access to a workspace's state.
    #[must_use]
    pub fn workspace(&self, id: WorkspaceId) -> &Workspace {
        &self.entries[id.0].workspace
    }

    /// Invalidates every configured library's cached file listing for a
    /// workspace, in response to `workspace/didChangeWatchedFiles`.
    pub fn refresh_libraries(&mut self, id: WorkspaceId) {
        for library in self.entries[id.0].workspace.libraries_mut() {
            library.refresh();
        }
    }

    /// All currently registered non-implicit workspace ids.
    #[must_use]
    pub fn real_workspace_ids(&self) -> Vec<WorkspaceId> {
        (2..self.entries.len()).map(WorkspaceId).collect()
    }

    /// The configured root of a workspace, if it still exists.
    #[must_use]
    pub fn workspace_root(&self, id: WorkspaceId) -> Option<&str> {
        self.entries.get(id.0).map(|e| e.root.as_str())
    }
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self::new()
    }
}

fn decode_base16(host: &str) -> Option<String> {
    if host.len() % 2 != 0 {
        return None;
    }
    let bytes: Option<Vec<u8>> = (0..host.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&host[i..i + 2], 16).ok())
        .collect();
    String::from_utf8(bytes?).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::make_response;

    #[test]
    fn longest_root_prefix_wins() {
        let mut orch = Orchestrator::new();
        let outer = orch.open_workspace("outer", "file:///proj");
        let inner = orch.open_workspace("inner", "file:///proj/sub");
        let loc = ResourceLocation::new("file:///proj/sub/a.hlasm");
        assert_eq!(orch.resolve_workspace(&loc), inner);
        let loc2 = ResourceLocation::new("file:///proj/a.hlasm");
        assert_eq!(orch.resolve_workspace(&loc2), outer);
    }

    #[test]
    fn unmatched_file_uri_falls_back_to_implicit() {
        let orch = Orchestrator::new();
        let loc = ResourceLocation::new("file:///elsewhere/a.hlasm");
        assert_eq!(orch.resolve_workspace(&loc), orch.implicit);
    }

    #[test]
    fn unmatched_other_scheme_falls_back_to_quiet_implicit() {
        let orch = Orchestrator::new();
        let loc = ResourceLocation::new("ftp:///elsewhere/a.hlasm");
        assert_eq!(orch.resolve_workspace(&loc), orch.quiet_implicit);
    }

    #[test]
    fn hlasm_external_host_decodes_and_restarts_resolution() {
        let mut orch = Orchestrator::new();
        let outer = orch.open_workspace("outer", "file:///proj");
        let encoded = "66696c653a2f2f2f70726f6a2f612e686c61736d"; // "file:///proj/a.hlasm"
        let loc = ResourceLocation::new(format!("hlasm-external://{encoded}/MEMBER"));
        assert_eq!(orch.resolve_workspace(&loc), outer);
    }

    #[test]
    fn file_change_item_blocks_until_configuration_resolves() {
        let mut orch = Orchestrator::new();
        let ws = orch.open_workspace("proj", "file:///proj");
        let (config_producer, config_consumer) = make_response::<WorkspaceSettings>();
        orch.enqueue_workspace_open(ws, "proj".to_string(), "file:///proj".to_string(), config_consumer);
        orch.enqueue_file_change(
            ResourceLocation::new("file:///proj/a.hlasm"),
            1,
            Some("MYLABEL DS F\n".to_string()),
        );

        assert!(orch.drain().is_empty());
        assert_eq!(orch.queue.len(), 2);

        config_producer.provide(WorkspaceSettings::empty());
        orch.drain();
        assert!(orch.queue.is_empty());
        assert!(orch.workspace(ws).index(&ResourceLocation::new("file:///proj/a.hlasm")).is_some());
    }

    #[test]
    fn invalidated_query_is_dropped_without_running() {
        let mut orch = Orchestrator::new();
        let (producer, consumer) = make_response::<serde_json::Value>();
        producer.invalidate();
        orch.enqueue_query(
            &ResourceLocation::new("file:///a.hlasm"),
            Box::new(|_ws| serde_json::Value::Null),
            producer,
            consumer,
        );
        assert!(orch.drain().is_empty());
        assert!(orch.queue.is_empty());
    }

    #[test]
    fn removing_workspace_invalidates_its_queued_items() {
        let mut orch = Orchestrator::new();
        let ws = orch.open_workspace("proj", "file:///proj");
        let (producer, consumer) = make_response::<serde_json::Value>();
        orch.enqueue_query(
            &ResourceLocation::new("file:///proj/a.hlasm"),
            Box::new(|_ws| serde_json::Value::Null),
            producer.clone(),
            consumer,
        );
        orch.remove_workspace(ws);
        assert!(!producer.valid());
        assert!(orch.queue.is_empty());
    }
}
