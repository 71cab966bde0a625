//! In-memory collaborators for coordinator tests

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use levelup_common::config::XpConfig;
use levelup_common::events::{EventBus, LiveEvent, SoundCue};
use levelup_common::models::{Level, LevelSounds, LiveSession};
use levelup_xp::catalog::{LevelCatalog, SessionCatalog};
use levelup_xp::session::SessionController;
use levelup_xp::{Error, NotificationBridge, Result, SoundSink, XpCoordinator};
use tokio::sync::broadcast;

/// Levels with blank sounds for `(order, threshold)` pairs
pub fn levels(thresholds: &[(u32, u64)]) -> Vec<Level> {
    thresholds
        .iter()
        .map(|&(order, xp_threshold)| Level {
            id: format!("level-{}", order),
            order,
            name: format!("Level {}", order),
            xp_threshold,
            sounds: LevelSounds::default(),
        })
        .collect()
}

#[derive(Default)]
pub struct FakeLevelCatalog {
    levels: Mutex<Vec<Level>>,
    failing: AtomicBool,
}

impl FakeLevelCatalog {
    pub fn new(levels: Vec<Level>) -> Self {
        Self {
            levels: Mutex::new(levels),
            failing: AtomicBool::new(false),
        }
    }

    pub fn set_levels(&self, levels: Vec<Level>) {
        *self.levels.lock().unwrap() = levels;
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::Catalog("level catalog unavailable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl LevelCatalog for FakeLevelCatalog {
    async fn all_levels(&self) -> Result<Vec<Level>> {
        self.check()?;
        let mut levels = self.levels.lock().unwrap().clone();
        levels.sort_by_key(|l| l.order);
        Ok(levels)
    }

    async fn level_by_order(&self, order: u32) -> Result<Option<Level>> {
        self.check()?;
        Ok(self
            .levels
            .lock()
            .unwrap()
            .iter()
            .find(|l| l.order == order)
            .cloned())
    }
}

#[derive(Default)]
pub struct FakeSessionCatalog {
    sessions: Mutex<Vec<LiveSession>>,
    fail_writes: AtomicBool,
}

impl FakeSessionCatalog {
    pub fn set_fail_writes(&self, failing: bool) {
        self.fail_writes.store(failing, Ordering::SeqCst);
    }

    pub fn stored(&self) -> Vec<LiveSession> {
        self.sessions.lock().unwrap().clone()
    }

    fn check(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::Catalog("session catalog unavailable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl SessionCatalog for FakeSessionCatalog {
    async fn create_session(&self, session: &LiveSession) -> Result<()> {
        self.check()?;
        self.sessions.lock().unwrap().push(session.clone());
        Ok(())
    }

    async fn update_session(&self, session: &LiveSession) -> Result<()> {
        self.check()?;
        let mut sessions = self.sessions.lock().unwrap();
        match sessions.iter_mut().find(|s| s.id == session.id) {
            Some(stored) => {
                *stored = session.clone();
                Ok(())
            }
            None => Err(Error::NotFound(format!("Session {}", session.id))),
        }
    }

    async fn session_by_id(&self, id: &str) -> Result<Option<LiveSession>> {
        Ok(self
            .sessions
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.id == id)
            .cloned())
    }

    async fn all_sessions(&self) -> Result<Vec<LiveSession>> {
        let mut sessions = self.sessions.lock().unwrap().clone();
        sessions.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        Ok(sessions)
    }
}

#[derive(Default)]
pub struct RecordingSink {
    cues: Mutex<Vec<SoundCue>>,
}

impl RecordingSink {
    pub fn cues(&self) -> Vec<SoundCue> {
        self.cues.lock().unwrap().clone()
    }

    /// Wait until at least `count` cues arrived (cues are published from
    /// detached tasks)
    pub async fn wait_for(&self, count: usize) -> Vec<SoundCue> {
        let deadline = Instant::now() + Duration::from_secs(2);
        loop {
            let cues = self.cues();
            if cues.len() >= count || Instant::now() >= deadline {
                return cues;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    /// Give detached cue tasks time to run, then return what arrived
    pub async fn settle(&self) -> Vec<SoundCue> {
        tokio::time::sleep(Duration::from_millis(50)).await;
        self.cues()
    }
}

impl SoundSink for RecordingSink {
    fn publish(&self, cue: SoundCue) {
        self.cues.lock().unwrap().push(cue);
    }
}

/// Coordinator wired to in-memory fakes
pub struct TestCoordinator {
    pub coordinator: Arc<XpCoordinator>,
    pub levels: Arc<FakeLevelCatalog>,
    pub sessions: Arc<FakeSessionCatalog>,
    pub sink: Arc<RecordingSink>,
    pub events: EventBus,
}

impl TestCoordinator {
    /// Build with default XP config and load the given thresholds
    pub async fn new(thresholds: &[(u32, u64)]) -> Self {
        Self::with_config(levels(thresholds), XpConfig::default()).await
    }

    pub async fn with_config(levels: Vec<Level>, config: XpConfig) -> Self {
        let levels = Arc::new(FakeLevelCatalog::new(levels));
        let sessions = Arc::new(FakeSessionCatalog::default());
        let sink = Arc::new(RecordingSink::default());
        let events = EventBus::new(256);

        let bridge = NotificationBridge::new(events.clone(), levels.clone(), sink.clone());
        let coordinator = Arc::new(XpCoordinator::new(
            config,
            levels.clone(),
            SessionController::new(sessions.clone()),
            bridge,
        ));
        coordinator
            .load_thresholds()
            .await
            .expect("threshold load should succeed");

        Self {
            coordinator,
            levels,
            sessions,
            sink,
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LiveEvent> {
        self.events.subscribe()
    }
}

/// Drain everything currently buffered on a receiver
pub fn drain(rx: &mut broadcast::Receiver<LiveEvent>) -> Vec<LiveEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
