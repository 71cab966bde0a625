//! Level Up Live XP coordinator
//!
//! Accumulates XP from audio, manual and test triggers, advances levels
//! against thresholds loaded from the level catalog, and fans state changes
//! and sound cues out to every connected client.

pub mod api;
pub mod bridge;
pub mod catalog;
pub mod config;
pub mod coordinator;
pub mod db;
pub mod error;
pub mod session;
pub mod xp;

pub use bridge::{NotificationBridge, SoundSink};
pub use coordinator::XpCoordinator;
pub use error::{Error, Result};
