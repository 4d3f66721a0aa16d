//! Tilecast pairing and synchronized playback server.
//!
//! Admin controllers pair with display clients through short-lived numeric
//! codes, then start playback on every paired display at one shared instant,
//! optionally split into a tiled video wall.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

pub mod config;
