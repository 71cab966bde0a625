//! Test helper modules for levelup-xp integration tests
//!
//! - FakeLevelCatalog / FakeSessionCatalog: in-memory collaborators with
//!   switchable failures
//! - RecordingSink: captures published sound cues
//! - TestCoordinator: a coordinator wired to the fakes

#![allow(dead_code)]

pub mod fakes;

pub use fakes::{
    drain, levels, FakeLevelCatalog, FakeSessionCatalog, RecordingSink, TestCoordinator,
};
