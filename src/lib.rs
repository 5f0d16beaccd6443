//! **i3-glyphs** — workspace labels that show what is running on them.
//!
//! Each workspace label is rewritten as
//! `<number><sep><custom name><sep><glyphs>`, where the glyph section holds
//! one small unicode symbol per application on the workspace and the focused
//! application's glyph is highlighted.  User-assigned custom names are
//! preserved across rewrites.
//!
//! # Architecture
//!
//! The crate is organised around one core trait:
//!
//! * [`traits::WmLink`] — abstracts the window-manager connection (snapshot
//!   query, event stream, rename command) so the synchronization engine is
//!   not coupled to any specific compositor and can be driven by a test
//!   harness.
//!
//! The concrete implementation lives in [`i3`] (i3/sway IPC).  The engine
//! itself is in [`engine`]; its collaborators are [`classify`] (window →
//! application identity), [`glyphs`] (identity → glyph), [`label`] (label
//! grammar) and [`store`] (the single owned workspace state).

pub mod classify;
pub mod config;
pub mod engine;
pub mod glyphs;
pub mod i3;
pub mod label;
pub mod store;
pub mod traits;
