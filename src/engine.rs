//! The label synchronization engine.
//!
//! [`SyncEngine`] owns the [`Store`] and reacts to [`WmEvent`]s by updating
//! the store and pushing recomputed labels through the [`WmLink`] trait.
//! It is the only writer to the window manager's naming state.
//!
//! # Lifecycle
//!
//! `Disconnected → Connecting → Syncing → Steady`.  A transport failure in
//! `Steady` drops back to `Connecting` with exponential backoff (capped,
//! retried forever); the store is cleared and rebuilt from a fresh snapshot
//! on every reconnect.  Only a failure to establish the *first* connection
//! is fatal.
//!
//! # Feedback loops
//!
//! Every rename the engine issues comes back as a rename event.  The label
//! is recorded in the store before the command is sent; an incoming rename
//! event carrying exactly that label is absorbed without further action.
//! Pushes are additionally skipped when the computed label already matches
//! the label currently on the workspace, so identical recomputations issue
//! no command at all.

use crate::classify::Classifier;
use crate::config::Config;
use crate::glyphs::GlyphRegistry;
use crate::label::LabelCodec;
use crate::store::{Store, WorkspaceId};
use crate::traits::{WmEvent, WmLink, WorkspaceSnapshot};
use log::{debug, info, warn};
use std::time::Duration;

/// Fatal engine failure.  Everything after the first successful sync is
/// retried instead.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("cannot reach the window manager: {0}")]
    InitialConnect(String),
}

/// Connection lifecycle state, tracked for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EngineState {
    Disconnected,
    Connecting,
    Syncing,
    Steady,
}

/// Capped exponential reconnect delay.
struct Backoff {
    delay: Duration,
}

const BACKOFF_INITIAL: Duration = Duration::from_millis(250);
const BACKOFF_MAX: Duration = Duration::from_secs(8);

impl Backoff {
    fn new() -> Self {
        Self {
            delay: BACKOFF_INITIAL,
        }
    }

    fn reset(&mut self) {
        self.delay = BACKOFF_INITIAL;
    }

    fn next_delay(&mut self) -> Duration {
        let delay = self.delay;
        self.delay = (delay * 2).min(BACKOFF_MAX);
        delay
    }

    fn sleep(&mut self) {
        let delay = self.next_delay();
        debug!("reconnecting in {:?}", delay);
        std::thread::sleep(delay);
    }
}

/// Orchestrates event handling and label pushes.
///
/// The engine is generic over any [`WmLink`] implementation, making it
/// completely independent of i3 or any other concrete backend.
///
/// # Typical usage
///
/// ```ignore
/// let link = I3Link::new();
/// let mut engine = SyncEngine::new(link, &config);
/// engine.run()?;
/// ```
pub struct SyncEngine<L: WmLink> {
    link: L,
    store: Store,
    classifier: Classifier,
    glyphs: GlyphRegistry,
    codec: LabelCodec,
    state: EngineState,
}

impl<L: WmLink> SyncEngine<L> {
    /// Create an engine with the built-in classification rules.
    pub fn new(link: L, config: &Config) -> Self {
        Self {
            link,
            store: Store::new(),
            classifier: Classifier::new(),
            glyphs: GlyphRegistry::from_config(config),
            codec: LabelCodec::from_config(config),
            state: EngineState::Disconnected,
        }
    }

    /// Replace the classifier, e.g. with additional rules.
    pub fn set_classifier(&mut self, classifier: Classifier) {
        self.classifier = classifier;
    }

    /// Shared view of the engine's state store.
    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Connect, sync, and process events until the process is killed.
    ///
    /// Returns an error only when the very first connection or snapshot
    /// load fails; after that, transport failures reconnect forever.
    pub fn run(&mut self) -> Result<(), EngineError> {
        let mut synced_once = false;
        let mut backoff = Backoff::new();

        loop {
            self.set_state(EngineState::Connecting);
            if let Err(e) = self.link.connect() {
                if !synced_once {
                    return Err(EngineError::InitialConnect(e.to_string()));
                }
                warn!("connect failed: {}", e);
                self.set_state(EngineState::Disconnected);
                backoff.sleep();
                continue;
            }

            self.set_state(EngineState::Syncing);
            if let Err(e) = self.sync() {
                if !synced_once {
                    return Err(EngineError::InitialConnect(e.to_string()));
                }
                warn!("snapshot load failed: {}", e);
                self.set_state(EngineState::Disconnected);
                backoff.sleep();
                continue;
            }
            synced_once = true;
            backoff.reset();

            self.set_state(EngineState::Steady);
            loop {
                match self.link.next_event() {
                    Ok(event) => self.handle_event(event),
                    Err(e) => {
                        warn!("event stream lost: {}", e);
                        break;
                    }
                }
            }

            self.set_state(EngineState::Disconnected);
            self.store.clear();
            backoff.sleep();
        }
    }

    /// Rebuild the store from a fresh snapshot and push every label.
    ///
    /// Custom names are recovered by decoding the labels found in the
    /// snapshot, so a restart picks up names left by a previous run.
    pub fn sync(&mut self) -> Result<(), L::Error> {
        self.store.clear();
        let workspaces = self.link.snapshot()?;
        info!("synced {} workspace(s)", workspaces.len());
        for ws in workspaces {
            self.load_workspace(ws);
        }
        for id in self.store.workspace_ids() {
            self.refresh(id);
        }
        Ok(())
    }

    /// Process a single event.
    ///
    /// Never panics and never propagates an error: store misses are logged
    /// no-ops, label collisions skip the push, rename failures are logged.
    pub fn handle_event(&mut self, event: WmEvent) {
        match event {
            WmEvent::WindowOpened { window, workspace } => {
                debug!("window {} opened on workspace {}", window.id, workspace);
                match self.store.add_window(workspace, window) {
                    Ok(()) => self.refresh(workspace),
                    Err(e) => warn!("ignoring window open: {}", e),
                }
            }

            WmEvent::WindowClosed { window } => match self.store.remove_window(window) {
                Ok(home) => self.refresh(home),
                Err(e) => debug!("ignoring window close: {}", e),
            },

            WmEvent::WindowMoved {
                window,
                to_workspace,
            } => match self.store.move_window(window, to_workspace) {
                Ok(from) => {
                    self.refresh(from);
                    self.refresh(to_workspace);
                }
                Err(e) => warn!("ignoring window move: {}", e),
            },

            WmEvent::WindowTitle { window, title } => {
                // The title feeds classification, so the glyph may change.
                match self.store.set_title(window, &title) {
                    Ok(home) => self.refresh(home),
                    Err(e) => debug!("ignoring title change: {}", e),
                }
            }

            WmEvent::FocusChanged { window } => match self.store.set_focus(window) {
                Ok(change) => {
                    if let Some(previous) = change.previous {
                        self.refresh(previous);
                    }
                    self.refresh(change.workspace);
                }
                Err(e) => debug!("ignoring focus change: {}", e),
            },

            WmEvent::WorkspaceInit { workspace } => {
                debug!("workspace {} created", workspace.id);
                let id = workspace.id;
                self.load_workspace(workspace);
                self.refresh(id);
            }

            WmEvent::WorkspaceEmpty { workspace } => {
                debug!("workspace {} removed", workspace);
                if let Err(e) = self.store.remove_workspace(workspace) {
                    debug!("ignoring workspace removal: {}", e);
                }
            }

            WmEvent::WorkspaceRenamed {
                workspace,
                number,
                name,
            } => self.on_renamed(workspace, number, &name),
        }
    }

    /// Handle a rename event: absorb echoes of our own writes, adopt
    /// external renames as the new custom name.
    fn on_renamed(&mut self, workspace: WorkspaceId, number: Option<i32>, name: &str) {
        if self.store.is_own_write(workspace, name) {
            debug!("workspace {}: rename echo absorbed", workspace);
            let _ = self.store.note_current_label(workspace, name);
            return;
        }
        let Some(known) = self.store.workspace(workspace) else {
            debug!("rename for unknown workspace {}", workspace);
            return;
        };
        // A label without a numeric prefix is reported with no number, but
        // the workspace keeps the number it had; decode against that.
        let number = number.or(known.number);

        self.store.upsert_workspace(workspace, number, name);
        let custom = self.codec.decode(name, number, &self.glyphs);
        match self.codec.validate_custom_name(number, &custom) {
            Ok(()) => {
                let _ = self.store.set_custom_name(workspace, &custom);
            }
            Err(e) => {
                // Keep the last valid name; the refresh below restores it.
                warn!("workspace {}: {}", workspace, e);
            }
        }
        // Re-attach the glyph section the rename may have stripped.
        self.refresh(workspace);
    }

    /// Insert a snapshot's workspace and windows into the store.
    fn load_workspace(&mut self, ws: WorkspaceSnapshot) {
        self.store.upsert_workspace(ws.id, ws.number, &ws.name);
        let custom = self.codec.decode(&ws.name, ws.number, &self.glyphs);
        let _ = self.store.set_custom_name(ws.id, &custom);
        for window in ws.windows {
            let _ = self.store.add_window(ws.id, window);
        }
        if let Some(focused) = ws.focused {
            let _ = self.store.set_focus(focused);
        }
    }

    /// Recompute a workspace's label and push it if it changed.
    ///
    /// The written label is recorded *before* the rename command goes out,
    /// so the echo event can be matched whenever it arrives.
    fn refresh(&mut self, workspace: WorkspaceId) {
        let (number, custom, current, focused, window_ids) = {
            let Some(ws) = self.store.workspace(workspace) else {
                return;
            };
            (
                ws.number,
                ws.custom_name.clone(),
                ws.current_label.clone(),
                ws.focused,
                ws.windows.clone(),
            )
        };

        let glyph_run: Vec<String> = window_ids
            .iter()
            .filter_map(|id| self.store.window(*id).map(|w| (*id, w)))
            .map(|(id, window)| {
                let app = self.classifier.classify(window);
                if focused == Some(id) {
                    self.glyphs.highlighted_glyph_for(app)
                } else {
                    self.glyphs.glyph_for(app).to_string()
                }
            })
            .collect();

        match self.codec.encode(number, &custom, &glyph_run) {
            Ok(label) => {
                if label == current {
                    return;
                }
                if self.store.note_written_label(workspace, &label).is_err() {
                    return;
                }
                debug!("workspace {}: {:?} -> {:?}", workspace, current, label);
                if let Err(e) = self.link.rename_workspace(&current, &label) {
                    warn!("rename of workspace {} failed: {}", workspace, e);
                }
            }
            Err(e) => warn!("label push for workspace {} skipped: {}", workspace, e),
        }
    }

    fn set_state(&mut self, state: EngineState) {
        if self.state != state {
            debug!("{:?} -> {:?}", self.state, state);
            self.state = state;
        }
    }
}

//  Tests
