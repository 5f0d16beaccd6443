//! [`WmLink`] implementation backed by i3/sway IPC.
//!
//! One persistent connection carries the event subscription; queries and
//! commands each use a short-lived connection, so replies never interleave
//! with events.
//!
//! The layout tree is deserialized into a minimal [`Node`] covering only the
//! fields the engine needs.  Window ids are i3 container ids (stable for the
//! container's lifetime), workspace ids are the workspace containers' ids.

use crate::i3::ipc::{
    Frame, IpcError, IpcStream, EVENT_WINDOW, EVENT_WORKSPACE, GET_TREE, RUN_COMMAND, SUBSCRIBE,
};
use crate::store::{Window, WindowId, WorkspaceId};
use crate::traits::{WmEvent, WmLink, WorkspaceSnapshot};
use log::{debug, info};
use serde::Deserialize;

/// i3-backed window-manager link.
#[derive(Default)]
pub struct I3Link {
    events: Option<IpcStream>,
}

impl I3Link {
    /// Create an unconnected link.
    pub fn new() -> Self {
        Self::default()
    }

    /// Query the full layout tree over a short-lived connection.
    fn get_tree(&self) -> Result<Node, IpcError> {
        let mut stream = IpcStream::connect()?;
        let payload = stream.request(GET_TREE, b"")?;
        Ok(serde_json::from_slice(&payload)?)
    }

    /// Run a command string and check every status in the reply.
    fn run_command(&self, command: &str) -> Result<(), IpcError> {
        let mut stream = IpcStream::connect()?;
        let payload = stream.request(RUN_COMMAND, command.as_bytes())?;
        let statuses: Vec<CommandStatus> = serde_json::from_slice(&payload)?;
        for status in statuses {
            if !status.success {
                return Err(IpcError::Protocol(format!(
                    "command failed: {}",
                    status.error.unwrap_or_else(|| command.to_string())
                )));
            }
        }
        Ok(())
    }

    /// The workspace currently holding `window`, resolved via a tree query.
    ///
    /// i3's window events carry the container but not its workspace, so
    /// `new` and `move` events need this lookup.
    fn workspace_of(&self, window: WindowId) -> Result<Option<WorkspaceId>, IpcError> {
        let tree = self.get_tree()?;
        for ws in tree.workspaces() {
            if ws.leaves().iter().any(|leaf| leaf.id == window) {
                return Ok(Some(ws.id));
            }
        }
        Ok(None)
    }

    /// Translate one IPC event frame, or `None` for frames the engine does
    /// not care about.
    fn translate(&self, frame: &Frame) -> Result<Option<WmEvent>, IpcError> {
        match frame.event_type() {
            EVENT_WINDOW => {
                let ev: WindowEventJson = serde_json::from_slice(&frame.payload)?;
                let id = ev.container.id;
                Ok(match ev.change.as_str() {
                    "new" => self.workspace_of(id)?.map(|ws| WmEvent::WindowOpened {
                        window: ev.container.to_window(),
                        workspace: ws,
                    }),
                    "close" => Some(WmEvent::WindowClosed { window: id }),
                    "move" => self.workspace_of(id)?.map(|ws| WmEvent::WindowMoved {
                        window: id,
                        to_workspace: ws,
                    }),
                    "title" => Some(WmEvent::WindowTitle {
                        window: id,
                        title: ev.container.name.unwrap_or_default(),
                    }),
                    "focus" => Some(WmEvent::FocusChanged { window: id }),
                    _ => None,
                })
            }
            EVENT_WORKSPACE => {
                let ev: WorkspaceEventJson = serde_json::from_slice(&frame.payload)?;
                let Some(current) = ev.current else {
                    return Ok(None);
                };
                Ok(match ev.change.as_str() {
                    "init" => Some(WmEvent::WorkspaceInit {
                        workspace: current.to_snapshot(),
                    }),
                    "empty" => Some(WmEvent::WorkspaceEmpty {
                        workspace: current.id,
                    }),
                    "rename" => Some(WmEvent::WorkspaceRenamed {
                        workspace: current.id,
                        number: current.number(),
                        name: current.name.unwrap_or_default(),
                    }),
                    _ => None,
                })
            }
            other => {
                debug!("ignoring event type {}", other);
                Ok(None)
            }
        }
    }
}

impl WmLink for I3Link {
    type Error = IpcError;

    fn connect(&mut self) -> Result<(), IpcError> {
        let mut stream = IpcStream::connect()?;
        stream.send(SUBSCRIBE, br#"["workspace","window"]"#)?;
        let reply = stream.recv()?;
        let status: SubscribeStatus = serde_json::from_slice(&reply.payload)?;
        if !status.success {
            return Err(IpcError::Protocol("subscribe rejected".into()));
        }
        info!("subscribed to workspace and window events");
        self.events = Some(stream);
        Ok(())
    }

    fn snapshot(&mut self) -> Result<Vec<WorkspaceSnapshot>, IpcError> {
        let tree = self.get_tree()?;
        Ok(tree
            .workspaces()
            .into_iter()
            .map(Node::to_snapshot_ref)
            .collect())
    }

    fn next_event(&mut self) -> Result<WmEvent, IpcError> {
        loop {
            let received = match self.events.as_mut() {
                Some(stream) => stream.recv(),
                None => return Err(IpcError::Protocol("not connected".into())),
            };
            let frame = match received {
                Ok(frame) => frame,
                Err(e) => {
                    self.events = None;
                    return Err(e);
                }
            };
            if !frame.is_event() {
                continue;
            }
            if let Some(event) = self.translate(&frame)? {
                return Ok(event);
            }
        }
    }

    fn rename_workspace(&mut self, from: &str, to: &str) -> Result<(), IpcError> {
        // Names must be double-quoted; single quotes don't work.
        let command = format!(
            r#"rename workspace "{}" to "{}""#,
            escape_name(from),
            escape_name(to)
        );
        self.run_command(&command)
    }

    fn list_windows(&mut self) -> Result<Vec<Window>, IpcError> {
        let tree = self.get_tree()?;
        Ok(tree.leaves().into_iter().map(Node::to_window).collect())
    }
}

/// Escape a workspace name for embedding in a double-quoted command string.
fn escape_name(name: &str) -> String {
    name.replace('\\', r"\\").replace('"', r#"\""#)
}

//  Minimal serde structs for the JSON we care about

/// Subset of an i3 tree container.
#[derive(Debug, Clone, Deserialize)]
struct Node {
    id: i64,
    #[serde(default)]
    name: Option<String>,
    #[serde(rename = "type")]
    node_type: String,
    #[serde(default)]
    num: Option<i32>,
    #[serde(default)]
    focused: bool,
    #[serde(default)]
    window_properties: Option<WindowProperties>,
    #[serde(default)]
    nodes: Vec<Node>,
    #[serde(default)]
    floating_nodes: Vec<Node>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct WindowProperties {
    #[serde(default)]
    class: Option<String>,
    #[serde(default)]
    instance: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WindowEventJson {
    change: String,
    container: Node,
}

#[derive(Debug, Deserialize)]
struct WorkspaceEventJson {
    change: String,
    #[serde(default)]
    current: Option<Node>,
}

#[derive(Debug, Deserialize)]
struct SubscribeStatus {
    success: bool,
}

#[derive(Debug, Deserialize)]
struct CommandStatus {
    success: bool,
    #[serde(default)]
    error: Option<String>,
}

impl Node {
    fn children(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().chain(self.floating_nodes.iter())
    }

    /// Every workspace container, skipping i3's internal ones
    /// (`__i3_scratch` etc).
    fn workspaces(&self) -> Vec<&Node> {
        let mut out = Vec::new();
        self.collect_workspaces(&mut out);
        out
    }

    fn collect_workspaces<'a>(&'a self, out: &mut Vec<&'a Node>) {
        if self.node_type == "workspace"
            && !self.name.as_deref().unwrap_or("").starts_with("__")
        {
            out.push(self);
            return;
        }
        for child in self.children() {
            child.collect_workspaces(out);
        }
    }

    /// Every window container below this node.
    fn leaves(&self) -> Vec<&Node> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a Node>) {
        let is_leaf = self.nodes.is_empty()
            && self.floating_nodes.is_empty()
            && matches!(self.node_type.as_str(), "con" | "floating_con");
        if is_leaf {
            out.push(self);
            return;
        }
        for child in self.children() {
            child.collect_leaves(out);
        }
    }

    /// The numeric prefix, or `None` — i3 reports `-1` for workspaces
    /// without one.
    fn number(&self) -> Option<i32> {
        self.num.filter(|n| *n >= 0)
    }

    fn to_window(&self) -> Window {
        let props = self.window_properties.clone().unwrap_or_default();
        Window {
            id: self.id,
            class: props.class.unwrap_or_default(),
            instance: props.instance.unwrap_or_default(),
            title: self.name.clone().unwrap_or_default(),
        }
    }

    fn to_snapshot_ref(&self) -> WorkspaceSnapshot {
        let leaves = self.leaves();
        WorkspaceSnapshot {
            id: self.id,
            number: self.number(),
            name: self.name.clone().unwrap_or_default(),
            windows: leaves.iter().map(|n| n.to_window()).collect(),
            focused: leaves.iter().find(|n| n.focused).map(|n| n.id),
        }
    }

    fn to_snapshot(self) -> WorkspaceSnapshot {
        self.to_snapshot_ref()
    }
}

//  Tests

#[cfg(test)]
mod tests {
    use super::*;

    const TREE: &str = r#"{
        "id": 1, "name": "root", "type": "root", "nodes": [
            { "id": 2, "name": "eDP-1", "type": "output", "nodes": [
                { "id": 100, "name": "1", "type": "workspace", "num": 1, "nodes": [
                    { "id": 10, "name": "rust - Mozilla Firefox", "type": "con",
                      "focused": true,
                      "window_properties": { "class": "Firefox", "instance": "Navigator" } }
                ] },
                { "id": 200, "name": "2:work:🖥️✎", "type": "workspace", "num": 2, "nodes": [
                    { "id": 20, "name": "zsh", "type": "con",
                      "window_properties": { "class": "st", "instance": "st" } }
                ], "floating_nodes": [
                    { "id": 21, "name": "notes.md", "type": "floating_con",
                      "window_properties": { "class": "gvim", "instance": "gvim" } }
                ] },
                { "id": 300, "name": "scratch", "type": "workspace", "num": -1, "nodes": [] },
                { "id": 900, "name": "__i3_scratch", "type": "workspace", "num": -1, "nodes": [] }
            ] }
        ]
    }"#;

    fn tree() -> Node {
        serde_json::from_str(TREE).unwrap()
    }

    #[test]
    fn workspaces_skip_internal_ones() {
        let t = tree();
        let ids: Vec<i64> = t.workspaces().iter().map(|w| w.id).collect();
        assert_eq!(ids, vec![100, 200, 300]);
    }

    #[test]
    fn leaves_include_floating_windows() {
        let t = tree();
        let ids: Vec<i64> = t.leaves().iter().map(|w| w.id).collect();
        assert_eq!(ids, vec![10, 20, 21]);
    }

    #[test]
    fn snapshot_carries_metadata_and_focus() {
        let t = tree();
        let snapshots: Vec<WorkspaceSnapshot> =
            t.workspaces().into_iter().map(Node::to_snapshot_ref).collect();

        let first = &snapshots[0];
        assert_eq!(first.id, 100);
        assert_eq!(first.number, Some(1));
        assert_eq!(first.name, "1");
        assert_eq!(first.focused, Some(10));
        assert_eq!(first.windows[0].class, "Firefox");
        assert_eq!(first.windows[0].instance, "Navigator");
        assert_eq!(first.windows[0].title, "rust - Mozilla Firefox");

        let second = &snapshots[1];
        assert_eq!(second.windows.len(), 2);
        assert_eq!(second.focused, None);
    }

    #[test]
    fn unnumbered_workspace_has_no_number() {
        let t = tree();
        let snapshots: Vec<WorkspaceSnapshot> =
            t.workspaces().into_iter().map(Node::to_snapshot_ref).collect();
        assert_eq!(snapshots[2].number, None);
        assert_eq!(snapshots[2].name, "scratch");
    }

    #[test]
    fn missing_window_properties_become_empty_fields() {
        let node: Node = serde_json::from_str(
            r#"{ "id": 5, "name": "xterm", "type": "con" }"#,
        )
        .unwrap();
        let w = node.to_window();
        assert_eq!(w.class, "");
        assert_eq!(w.instance, "");
        assert_eq!(w.title, "xterm");
    }

    #[test]
    fn workspace_rename_event_parses() {
        let json = r#"{ "change": "rename",
            "current": { "id": 200, "name": "2:new", "type": "workspace", "num": 2 } }"#;
        let ev: WorkspaceEventJson = serde_json::from_str(json).unwrap();
        assert_eq!(ev.change, "rename");
        let current = ev.current.unwrap();
        assert_eq!(current.id, 200);
        assert_eq!(current.number(), Some(2));
        assert_eq!(current.name.as_deref(), Some("2:new"));
    }

    #[test]
    fn window_event_parses() {
        let json = r#"{ "change": "focus",
            "container": { "id": 10, "name": "zsh", "type": "con",
                "window_properties": { "class": "st" } } }"#;
        let ev: WindowEventJson = serde_json::from_str(json).unwrap();
        assert_eq!(ev.change, "focus");
        assert_eq!(ev.container.id, 10);
    }

    #[test]
    fn names_are_escaped_for_command_strings() {
        assert_eq!(escape_name("plain"), "plain");
        assert_eq!(escape_name(r#"say "hi""#), r#"say \"hi\""#);
        assert_eq!(escape_name(r"back\slash"), r"back\\slash");
    }
}
