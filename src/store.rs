//! The workspace state store.
//!
//! [`Store`] is the single owner of all workspace and window records the
//! daemon knows about.  It is rebuilt from a window-manager snapshot on
//! every (re)connect and mutated one event at a time by the
//! [`SyncEngine`](crate::engine::SyncEngine); nothing else holds copies.
//!
//! Besides the window sets themselves the store keeps, per workspace, the
//! raw label currently on the workspace and the last label this process
//! wrote.  The former gates redundant rename commands, the latter lets the
//! engine recognise the echo event produced by its own writes.

use std::collections::{BTreeMap, HashMap};

/// Stable window-manager container id for a window.
pub type WindowId = i64;
/// Stable window-manager id for a workspace.
pub type WorkspaceId = i64;

/// Metadata for one window.
///
/// Fields other than `id` may be empty — the window manager reports class
/// and instance only for windows that set them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Window {
    pub id: WindowId,
    pub class: String,
    pub instance: String,
    pub title: String,
}

/// One workspace and the windows assigned to it.
#[derive(Debug, Clone)]
pub struct Workspace {
    pub id: WorkspaceId,
    /// Leading numeric prefix of the label, if any.
    pub number: Option<i32>,
    /// User-assigned name, without number prefix or glyph section.
    pub custom_name: String,
    /// Window ids in insertion order.  No duplicates.
    pub windows: Vec<WindowId>,
    /// The focused window, if focus is on this workspace.
    pub focused: Option<WindowId>,
    /// The raw label currently set on the workspace.
    pub current_label: String,
    /// The last label this process pushed, for echo detection.
    pub last_written: Option<String>,
}

/// Result of [`Store::set_focus`]: which workspaces changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FocusChange {
    /// Workspace that now holds the focused window.
    pub workspace: WorkspaceId,
    /// Workspace that lost its focused window, if different.
    pub previous: Option<WorkspaceId>,
}

/// An event referenced a window or workspace the store does not know.
///
/// Benign during startup races; callers log and carry on.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("unknown window {0}")]
    UnknownWindow(WindowId),
    #[error("unknown workspace {0}")]
    UnknownWorkspace(WorkspaceId),
}

/// In-memory mapping from workspace to windows, names, and label caches.
#[derive(Debug, Default)]
pub struct Store {
    workspaces: BTreeMap<WorkspaceId, Workspace>,
    windows: HashMap<WindowId, Window>,
    /// `window id -> owning workspace`, kept in sync with the order lists.
    window_homes: HashMap<WindowId, WorkspaceId>,
}

impl Store {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop all state, e.g. on disconnect before a fresh snapshot load.
    pub fn clear(&mut self) {
        self.workspaces.clear();
        self.windows.clear();
        self.window_homes.clear();
    }

    //  Accessors

    /// Look up a workspace.
    pub fn workspace(&self, id: WorkspaceId) -> Option<&Workspace> {
        self.workspaces.get(&id)
    }

    /// Look up a window.
    pub fn window(&self, id: WindowId) -> Option<&Window> {
        self.windows.get(&id)
    }

    /// The workspace a window currently lives on.
    pub fn home_of(&self, window: WindowId) -> Option<WorkspaceId> {
        self.window_homes.get(&window).copied()
    }

    /// All known workspace ids, in id order.
    pub fn workspace_ids(&self) -> Vec<WorkspaceId> {
        self.workspaces.keys().copied().collect()
    }

    //  Mutations

    /// Create a workspace, or update the number and raw label of an
    /// existing one.  Custom names survive an upsert.
    pub fn upsert_workspace(&mut self, id: WorkspaceId, number: Option<i32>, raw_label: &str) {
        match self.workspaces.get_mut(&id) {
            Some(ws) => {
                ws.number = number;
                ws.current_label = raw_label.to_string();
            }
            None => {
                self.workspaces.insert(
                    id,
                    Workspace {
                        id,
                        number,
                        custom_name: String::new(),
                        windows: Vec::new(),
                        focused: None,
                        current_label: raw_label.to_string(),
                        last_written: None,
                    },
                );
            }
        }
    }

    /// Remove a workspace and every window on it.  This also garbage
    /// collects its custom name and label caches, so records do not
    /// accumulate for workspaces that emptied out and disappeared.
    pub fn remove_workspace(&mut self, id: WorkspaceId) -> Result<(), StoreError> {
        let ws = self
            .workspaces
            .remove(&id)
            .ok_or(StoreError::UnknownWorkspace(id))?;
        for win in ws.windows {
            self.windows.remove(&win);
            self.window_homes.remove(&win);
        }
        Ok(())
    }

    /// Add a window to a workspace.  Re-adding a known window updates its
    /// metadata without duplicating its order entry.
    pub fn add_window(&mut self, workspace: WorkspaceId, window: Window) -> Result<(), StoreError> {
        let ws = self
            .workspaces
            .get_mut(&workspace)
            .ok_or(StoreError::UnknownWorkspace(workspace))?;
        if !ws.windows.contains(&window.id) {
            ws.windows.push(window.id);
        }
        self.window_homes.insert(window.id, workspace);
        self.windows.insert(window.id, window);
        Ok(())
    }

    /// Remove a window.  Returns the workspace it was removed from.
    /// Remaining windows keep their relative order.
    pub fn remove_window(&mut self, window: WindowId) -> Result<WorkspaceId, StoreError> {
        let home = self
            .window_homes
            .remove(&window)
            .ok_or(StoreError::UnknownWindow(window))?;
        self.windows.remove(&window);
        if let Some(ws) = self.workspaces.get_mut(&home) {
            ws.windows.retain(|w| *w != window);
            if ws.focused == Some(window) {
                ws.focused = None;
            }
        }
        Ok(home)
    }

    /// Move a window to another workspace.  Returns the workspace it left.
    /// The window is appended to the target's order; focus moves with it.
    pub fn move_window(
        &mut self,
        window: WindowId,
        to: WorkspaceId,
    ) -> Result<WorkspaceId, StoreError> {
        if !self.workspaces.contains_key(&to) {
            return Err(StoreError::UnknownWorkspace(to));
        }
        let from = self
            .window_homes
            .get(&window)
            .copied()
            .ok_or(StoreError::UnknownWindow(window))?;
        let was_focused = if let Some(ws) = self.workspaces.get_mut(&from) {
            ws.windows.retain(|w| *w != window);
            let f = ws.focused == Some(window);
            if f {
                ws.focused = None;
            }
            f
        } else {
            false
        };
        if let Some(target) = self.workspaces.get_mut(&to) {
            if !target.windows.contains(&window) {
                target.windows.push(window);
            }
            if was_focused {
                target.focused = Some(window);
            }
        }
        self.window_homes.insert(window, to);
        Ok(from)
    }

    /// Focus a window, clearing focus everywhere else.
    ///
    /// At most one window across the whole store is focused at any time.
    pub fn set_focus(&mut self, window: WindowId) -> Result<FocusChange, StoreError> {
        let home = self
            .window_homes
            .get(&window)
            .copied()
            .ok_or(StoreError::UnknownWindow(window))?;
        let mut previous = None;
        for ws in self.workspaces.values_mut() {
            if ws.focused.is_some() && ws.id != home {
                previous = Some(ws.id);
            }
            ws.focused = None;
        }
        let ws = self
            .workspaces
            .get_mut(&home)
            .ok_or(StoreError::UnknownWorkspace(home))?;
        ws.focused = Some(window);
        Ok(FocusChange {
            workspace: home,
            previous,
        })
    }

    /// Set a workspace's custom name.
    pub fn set_custom_name(&mut self, id: WorkspaceId, name: &str) -> Result<(), StoreError> {
        let ws = self
            .workspaces
            .get_mut(&id)
            .ok_or(StoreError::UnknownWorkspace(id))?;
        ws.custom_name = name.to_string();
        Ok(())
    }

    /// Update a window's title.  Returns its workspace so the caller can
    /// refresh the label (the title may change the classification).
    pub fn set_title(&mut self, window: WindowId, title: &str) -> Result<WorkspaceId, StoreError> {
        let win = self
            .windows
            .get_mut(&window)
            .ok_or(StoreError::UnknownWindow(window))?;
        win.title = title.to_string();
        self.window_homes
            .get(&window)
            .copied()
            .ok_or(StoreError::UnknownWindow(window))
    }

    //  Label caches

    /// Record the raw label observed on a workspace (from a rename event).
    pub fn note_current_label(&mut self, id: WorkspaceId, label: &str) -> Result<(), StoreError> {
        let ws = self
            .workspaces
            .get_mut(&id)
            .ok_or(StoreError::UnknownWorkspace(id))?;
        ws.current_label = label.to_string();
        Ok(())
    }

    /// Record a label this process is about to write.  Called synchronously
    /// *before* the rename command is issued, so the echo event can be
    /// matched no matter how quickly it is delivered.
    pub fn note_written_label(&mut self, id: WorkspaceId, label: &str) -> Result<(), StoreError> {
        let ws = self
            .workspaces
            .get_mut(&id)
            .ok_or(StoreError::UnknownWorkspace(id))?;
        ws.last_written = Some(label.to_string());
        ws.current_label = label.to_string();
        Ok(())
    }

    /// Whether `label` is the last label this process wrote for `id`.
    pub fn is_own_write(&self, id: WorkspaceId, label: &str) -> bool {
        self.workspaces
            .get(&id)
            .and_then(|ws| ws.last_written.as_deref())
            == Some(label)
    }
}

//  Tests
