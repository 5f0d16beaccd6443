//! The i3 IPC wire protocol.
//!
//! Communicates directly with i3 (or sway) through the Unix socket named by
//! `$I3SOCK` / `$SWAYSOCK`, avoiding any shell command invocation or
//! third-party crate for socket discovery.
//!
//! # Framing
//!
//! Every message in either direction is
//!
//! ```text
//! "i3-ipc" <payload length: u32 LE> <message type: u32 LE> <payload>
//! ```
//!
//! Replies carry the request's type; events carry the event type with the
//! high bit set.  Payloads are JSON.

use std::io::{Read, Write};
use std::os::unix::net::UnixStream;
use std::path::PathBuf;

/// Magic bytes opening every frame.
pub const MAGIC: &[u8; 6] = b"i3-ipc";

/// Request: run a command string (`rename workspace …`).
pub const RUN_COMMAND: u32 = 0;
/// Request: subscribe to an event list.
pub const SUBSCRIBE: u32 = 2;
/// Request: query the layout tree.
pub const GET_TREE: u32 = 4;

/// Bit set on the type field of event frames.
pub const EVENT_BIT: u32 = 0x8000_0000;
/// Workspace event (init, empty, rename, …).
pub const EVENT_WORKSPACE: u32 = 0;
/// Window event (new, close, move, title, focus, …).
pub const EVENT_WINDOW: u32 = 3;

/// Errors that can occur when talking to the window manager.
#[derive(Debug, thiserror::Error)]
pub enum IpcError {
    #[error("neither I3SOCK nor SWAYSOCK is set")]
    NoSocket,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("protocol error: {0}")]
    Protocol(String),
}

/// Resolve the window manager's IPC socket path.
///
/// i3 exports it as `$I3SOCK`, sway as `$SWAYSOCK`.
pub fn socket_path() -> Result<PathBuf, IpcError> {
    std::env::var_os("I3SOCK")
        .or_else(|| std::env::var_os("SWAYSOCK"))
        .map(PathBuf::from)
        .ok_or(IpcError::NoSocket)
}

/// One received frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub frame_type: u32,
    pub payload: Vec<u8>,
}

impl Frame {
    /// Whether this frame is an event rather than a reply.
    pub fn is_event(&self) -> bool {
        self.frame_type & EVENT_BIT != 0
    }

    /// The event type with the event bit masked off.
    pub fn event_type(&self) -> u32 {
        self.frame_type & !EVENT_BIT
    }
}

/// A framed connection to the IPC socket.
pub struct IpcStream {
    stream: UnixStream,
}

impl IpcStream {
    /// Connect to the socket named by the environment.
    pub fn connect() -> Result<Self, IpcError> {
        let path = socket_path()?;
        let stream = UnixStream::connect(&path).map_err(|e| {
            IpcError::Protocol(format!("connect to {}: {}", path.display(), e))
        })?;
        Ok(Self { stream })
    }

    /// Wrap an already-connected stream.
    pub fn from_stream(stream: UnixStream) -> Self {
        Self { stream }
    }

    /// Write one frame.
    pub fn send(&mut self, msg_type: u32, payload: &[u8]) -> Result<(), IpcError> {
        let mut frame = Vec::with_capacity(MAGIC.len() + 8 + payload.len());
        frame.extend_from_slice(MAGIC);
        frame.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        frame.extend_from_slice(&msg_type.to_le_bytes());
        frame.extend_from_slice(payload);
        self.stream.write_all(&frame)?;
        Ok(())
    }

    /// Read one frame, blocking until it is complete.
    pub fn recv(&mut self) -> Result<Frame, IpcError> {
        let mut header = [0u8; 14];
        self.stream.read_exact(&mut header)?;
        if &header[..6] != MAGIC {
            return Err(IpcError::Protocol("bad magic in frame header".into()));
        }
        let len = u32::from_le_bytes([header[6], header[7], header[8], header[9]]) as usize;
        let frame_type = u32::from_le_bytes([header[10], header[11], header[12], header[13]]);
        let mut payload = vec![0u8; len];
        self.stream.read_exact(&mut payload)?;
        Ok(Frame {
            frame_type,
            payload,
        })
    }

    /// Send a request and return the matching reply's payload.
    ///
    /// Event frames interleaved before the reply are discarded, so this is
    /// only safe on connections that are not the event subscription.
    pub fn request(&mut self, msg_type: u32, payload: &[u8]) -> Result<Vec<u8>, IpcError> {
        self.send(msg_type, payload)?;
        loop {
            let frame = self.recv()?;
            if !frame.is_event() {
                if frame.frame_type != msg_type {
                    return Err(IpcError::Protocol(format!(
                        "reply type {} for request type {}",
                        frame.frame_type, msg_type
                    )));
                }
                return Ok(frame.payload);
            }
        }
    }
}

//  Tests
