//! Notification bridge
//!
//! Broadcasts typed [`LiveEvent`]s on the [`EventBus`] and resolves sound cue
//! requests against the level catalog before handing them to a
//! [`SoundSink`]. Cue resolution never blocks the XP path: it runs on a
//! detached task and failures are logged and dropped.

use std::sync::Arc;

use levelup_common::events::{EventBus, LiveEvent, SoundCue, SoundCueKind};
use tracing::{debug, warn};

use crate::catalog::LevelCatalog;
use crate::xp::CueRequest;

/// Receiver for resolved sound cues
pub trait SoundSink: Send + Sync {
    fn publish(&self, cue: SoundCue);
}

impl SoundSink for EventBus {
    fn publish(&self, cue: SoundCue) {
        self.emit_lossy(LiveEvent::SoundTriggered {
            cue,
            timestamp: levelup_common::time::now(),
        });
    }
}

/// Built-in asset used when a level leaves a cue unconfigured
///
/// Transitions have no default and are skipped when unconfigured.
pub fn default_sound_path(kind: SoundCueKind) -> Option<&'static str> {
    match kind {
        SoundCueKind::XpGain => Some("assets/sounds/xp/xp.mp3"),
        SoundCueKind::Drop => Some("assets/sounds/drops/drop.mp3"),
        SoundCueKind::BuildUp => Some("assets/sounds/buildups/builups.mp3"),
        SoundCueKind::LevelUp => Some("assets/sounds/levelups/level-up.mp3"),
        SoundCueKind::ViewerJoin => Some("assets/sounds/viewers/viewers.mp3"),
        SoundCueKind::Transition => None,
    }
}

#[derive(Clone)]
pub struct NotificationBridge {
    events: EventBus,
    levels: Arc<dyn LevelCatalog>,
    sink: Arc<dyn SoundSink>,
}

impl NotificationBridge {
    pub fn new(events: EventBus, levels: Arc<dyn LevelCatalog>, sink: Arc<dyn SoundSink>) -> Self {
        Self {
            events,
            levels,
            sink,
        }
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Broadcast to every subscriber; having none is not an error
    pub fn notify(&self, event: LiveEvent) {
        debug!("Broadcasting {}", event.event_type());
        self.events.emit_lossy(event);
    }

    /// Look up the sound for a cue
    ///
    /// Returns None (after logging) when the level is missing, the catalog
    /// fails, or the cue has neither a configured nor a default path.
    pub async fn resolve_cue(&self, request: &CueRequest) -> Option<SoundCue> {
        let level = match self.levels.level_by_order(request.level).await {
            Ok(Some(level)) => level,
            Ok(None) => {
                warn!(
                    "No level {} in catalog, dropping {:?} cue",
                    request.level, request.kind
                );
                return None;
            }
            Err(e) => {
                warn!(
                    "Failed to look up level {} for {:?} cue: {}",
                    request.level, request.kind, e
                );
                return None;
            }
        };

        let sound_path = match level.sounds.path_for(request.kind) {
            Some(path) => path.to_string(),
            None => match default_sound_path(request.kind) {
                Some(path) => path.to_string(),
                None => {
                    debug!(
                        "Level {} has no {:?} sound configured",
                        request.level, request.kind
                    );
                    return None;
                }
            },
        };

        Some(SoundCue {
            kind: request.kind,
            sound_path,
            level_id: Some(level.id),
            metadata: request.metadata.clone(),
        })
    }

    /// Resolve and publish one cue; returns whether anything was published
    pub async fn play_cue(&self, request: CueRequest) -> bool {
        match self.resolve_cue(&request).await {
            Some(cue) => {
                debug!("Playing {:?} sound {}", cue.kind, cue.sound_path);
                self.sink.publish(cue);
                true
            }
            None => false,
        }
    }

    /// Resolve and publish cues on a detached task
    pub fn fire(&self, cues: Vec<CueRequest>) {
        if cues.is_empty() {
            return;
        }
        let bridge = self.clone();
        tokio::spawn(async move {
            for request in cues {
                bridge.play_cue(request).await;
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use levelup_common::events::CueMetadata;
    use levelup_common::models::{Level, LevelSounds};
    use std::sync::Mutex;

    use crate::{Error, Result};

    struct OneLevel(Level);

    #[async_trait]
    impl LevelCatalog for OneLevel {
        async fn all_levels(&self) -> Result<Vec<Level>> {
            Ok(vec![self.0.clone()])
        }

        async fn level_by_order(&self, order: u32) -> Result<Option<Level>> {
            Ok((order == self.0.order).then(|| self.0.clone()))
        }
    }

    struct BrokenCatalog;

    #[async_trait]
    impl LevelCatalog for BrokenCatalog {
        async fn all_levels(&self) -> Result<Vec<Level>> {
            Err(Error::Catalog("offline".into()))
        }

        async fn level_by_order(&self, _order: u32) -> Result<Option<Level>> {
            Err(Error::Catalog("offline".into()))
        }
    }

    #[derive(Default)]
    struct Recorder(Mutex<Vec<SoundCue>>);

    impl SoundSink for Recorder {
        fn publish(&self, cue: SoundCue) {
            self.0.lock().unwrap().push(cue);
        }
    }

    fn level_one(sounds: LevelSounds) -> Level {
        Level {
            id: "lvl-1".to_string(),
            order: 1,
            name: "One".to_string(),
            xp_threshold: 0,
            sounds,
        }
    }

    fn request(kind: SoundCueKind, level: u32) -> CueRequest {
        CueRequest {
            kind,
            level,
            metadata: CueMetadata::default(),
        }
    }

    fn bridge(levels: Arc<dyn LevelCatalog>) -> (NotificationBridge, Arc<Recorder>) {
        let recorder = Arc::new(Recorder::default());
        let bridge = NotificationBridge::new(EventBus::new(16), levels, recorder.clone());
        (bridge, recorder)
    }

    #[tokio::test]
    async fn test_configured_path_wins() {
        let sounds = LevelSounds {
            drop: "assets/sounds/custom/boom.mp3".to_string(),
            ..Default::default()
        };
        let (bridge, recorder) = bridge(Arc::new(OneLevel(level_one(sounds))));

        assert!(bridge.play_cue(request(SoundCueKind::Drop, 1)).await);

        let cues = recorder.0.lock().unwrap();
        assert_eq!(cues[0].sound_path, "assets/sounds/custom/boom.mp3");
        assert_eq!(cues[0].level_id.as_deref(), Some("lvl-1"));
    }

    #[tokio::test]
    async fn test_falls_back_to_default_asset() {
        let (bridge, _) = bridge(Arc::new(OneLevel(level_one(LevelSounds::default()))));

        for kind in SoundCueKind::ALL {
            let cue = bridge.resolve_cue(&request(kind, 1)).await;
            match default_sound_path(kind) {
                Some(path) => assert_eq!(cue.unwrap().sound_path, path),
                None => assert!(cue.is_none()),
            }
        }
    }

    #[tokio::test]
    async fn test_missing_level_suppresses_cue() {
        let (bridge, recorder) = bridge(Arc::new(OneLevel(level_one(LevelSounds::default()))));

        assert!(!bridge.play_cue(request(SoundCueKind::LevelUp, 7)).await);
        assert!(recorder.0.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_catalog_failure_suppresses_cue() {
        let (bridge, recorder) = bridge(Arc::new(BrokenCatalog));

        assert!(!bridge.play_cue(request(SoundCueKind::XpGain, 1)).await);
        assert!(recorder.0.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_event_bus_sink_emits_sound_event() {
        let bus = EventBus::new(4);
        let mut rx = bus.subscribe();

        bus.publish(SoundCue {
            kind: SoundCueKind::ViewerJoin,
            sound_path: "assets/sounds/viewers/viewers.mp3".to_string(),
            level_id: None,
            metadata: CueMetadata {
                viewer_name: Some("ana".to_string()),
                ..Default::default()
            },
        });

        let event = rx.try_recv().unwrap();
        assert_eq!(event.event_type(), "SoundViewerJoin");
    }
}
