//! Core trait that decouples the synchronization engine from any specific
//! window manager or transport mechanism.
//!
//! The concrete backend (i3/sway IPC, a test harness, …) implements
//! [`WmLink`].  The [`SyncEngine`](crate::engine::SyncEngine) only depends
//! on this abstraction.

use crate::store::{Window, WindowId, WorkspaceId};

/// A typed window-manager event, already reduced to what the engine needs.
///
/// Transport-level events with no bearing on labels (workspace focus without
/// a window focus change, urgency hints, …) are filtered out by the backend
/// and never reach the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WmEvent {
    /// A window appeared on `workspace`.
    WindowOpened {
        window: Window,
        workspace: WorkspaceId,
    },
    /// A window was closed.
    WindowClosed { window: WindowId },
    /// A window moved to another workspace.
    WindowMoved {
        window: WindowId,
        to_workspace: WorkspaceId,
    },
    /// A window's title changed.
    WindowTitle { window: WindowId, title: String },
    /// Input focus moved to a window.
    FocusChanged { window: WindowId },
    /// The window manager created a workspace.
    WorkspaceInit { workspace: WorkspaceSnapshot },
    /// The window manager removed an emptied workspace.
    WorkspaceEmpty { workspace: WorkspaceId },
    /// A workspace's label changed — externally, or as the echo of a
    /// rename this process issued.
    WorkspaceRenamed {
        workspace: WorkspaceId,
        number: Option<i32>,
        name: String,
    },
}

/// One workspace as reported by the window manager's tree query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceSnapshot {
    pub id: WorkspaceId,
    pub number: Option<i32>,
    /// The raw label currently on the workspace.
    pub name: String,
    /// Windows on the workspace, in tree order.
    pub windows: Vec<Window>,
    /// The focused window, if input focus is on this workspace.
    pub focused: Option<WindowId>,
}

/// Abstraction over a window-manager connection.
///
/// An implementation might talk to i3 or sway over their IPC socket, or it
/// might be a scripted test double.
///
/// # Contract
///
/// * [`connect`](WmLink::connect) establishes the event subscription; it is
///   called again after a transport failure.
/// * [`next_event`](WmLink::next_event) **blocks** until an event arrives
///   and errors when the connection is lost.
/// * [`rename_workspace`](WmLink::rename_workspace) is fire-and-forget from
///   the engine's point of view: the engine records what it wrote before
///   calling it and does not wait for the resulting rename event.
pub trait WmLink {
    /// The error type produced by this link.
    type Error: std::error::Error + Send + 'static;

    /// Connect and subscribe to window and workspace events.
    fn connect(&mut self) -> Result<(), Self::Error>;

    /// Query the current workspaces and their windows.
    fn snapshot(&mut self) -> Result<Vec<WorkspaceSnapshot>, Self::Error>;

    /// Block until the next relevant event arrives.
    fn next_event(&mut self) -> Result<WmEvent, Self::Error>;

    /// Rename the workspace currently labelled `from` to `to`.
    fn rename_workspace(&mut self, from: &str, to: &str) -> Result<(), Self::Error>;

    /// List every open window.  Used by the one-shot diagnostic mode; does
    /// not require a prior [`connect`](WmLink::connect).
    fn list_windows(&mut self) -> Result<Vec<Window>, Self::Error>;
}
