// Scene: owns the store and every controller, routes shell events, and steps one frame.
// Events apply immediately in arrival order; `tick` then runs the controllers in a fixed
// order (ending, camera, photos, audio) so each sees the flags the previous one set.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::camera::{CameraFrame, CameraRig, CameraView};
use crate::catalog::PhotoCatalog;
use crate::dissolve::ParticleFrame;
use crate::eggs::{EggAction, EggTracker, EggView};
use crate::ending::{EndingOverlay, EndingSequencer};
use crate::error::EngineError;
use crate::lyrics::{CaptionTrack, Lyrics};
use crate::media::{AudioEvent, BackgroundMusic, MediaCommand};
use crate::photos::{PhotoField, PhotoInstance};
use crate::state::{AppState, StateSnapshot};
use crate::stories::{StoryNavigator, StoryStep};
use crate::storage::KeyValueStore;
use crate::types::*;

/// Intents and pointer input from the shell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SceneEvent {
    SetPhase { phase: Phase },
    NextIntroStep,
    ShowPhotos { show: bool },
    StartMusic,
    Story { step: StoryStep },
    ToggleMemoryMode,
    ResetCamera,
    SetChat { open: bool },
    SetNovel { open: bool },
    SelectPhoto { index: usize },
    /// Click that hit no photo.
    ClickEmpty,
    HoverPhoto { index: Option<usize> },
    ImageReady { url: String, width: f32, height: f32 },
    PointerDown { x: f32, y: f32 },
    PointerMove { x: f32, y: f32 },
    PointerUp,
    Wheel { delta_y: f32 },
    /// `KeyboardEvent.key` of a key press.
    Key { key: String },
}

/// One frame's worth of input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct FrameTick {
    #[serde(flatten)]
    pub input: FrameInput,
    /// Audio element notifications since the last frame.
    #[serde(default)]
    pub audio: Vec<AudioEvent>,
}

/// Everything the shell renders for one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameOutput {
    pub phase: Phase,
    pub state: StateSnapshot,
    pub camera: CameraFrame,
    pub photos: Vec<PhotoInstance>,
    pub particles: Option<ParticleFrame>,
    pub overlay: Option<EndingOverlay>,
    pub media: Vec<MediaCommand>,
    pub lyric: Option<String>,
}

pub struct Scene {
    state: AppState,
    camera: CameraRig,
    field: PhotoField,
    stories: StoryNavigator,
    ending: EndingSequencer,
    music: BackgroundMusic,
    lyrics: Lyrics,
    eggs: EggTracker,
    now: Timestamp,
}

impl Scene {
    pub fn new(config: EngineConfig) -> Self {
        let catalog = PhotoCatalog::new(&config.catalog);
        let stories = StoryNavigator::new(catalog.story_count());
        let lyrics = Lyrics::new(CaptionTrack::from_lrc(&config.catalog.lyrics));
        Scene {
            state: AppState::new(),
            camera: CameraRig::new(config.camera),
            field: PhotoField::new(config.photos, catalog, config.narrow_viewport),
            stories,
            ending: EndingSequencer::new(
                config.ending,
                config.catalog.gallery,
                config.catalog.portrait,
                config.narrow_viewport,
            ),
            music: BackgroundMusic::new(),
            lyrics,
            eggs: EggTracker::new(config.eggs),
            now: Timestamp::default(),
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut AppState {
        &mut self.state
    }

    pub fn snapshot(&self) -> StateSnapshot {
        self.state.snapshot().clone()
    }

    pub fn handle(&mut self, event: SceneEvent) {
        let phase = self.state.phase();
        match event {
            SceneEvent::SetPhase { phase } => self.state.set_phase(phase),
            SceneEvent::NextIntroStep => self.state.next_intro_step(),
            SceneEvent::ShowPhotos { show } => self.state.set_show_photos(show),
            SceneEvent::StartMusic => self.state.set_music_started(true),
            SceneEvent::Story { step } => self.stories.step(&mut self.state, step),
            SceneEvent::ToggleMemoryMode => {
                let on = !self.state.is_memory_mode();
                self.state.set_memory_mode(on);
            }
            SceneEvent::ResetCamera => self.state.reset_camera(),
            SceneEvent::SetChat { open } => self.state.set_show_chat(open),
            SceneEvent::SetNovel { open } => self.state.set_show_novel(open),
            SceneEvent::SelectPhoto { index } => self.field.select(&mut self.state, index),
            SceneEvent::ClickEmpty => self.field.deselect(),
            SceneEvent::HoverPhoto { index } => self.field.hover(index),
            SceneEvent::ImageReady { url, width, height } => self.field.image_ready(&url, width, height),
            SceneEvent::PointerDown { x, y } => self.camera.pointer_down(x, y, phase),
            SceneEvent::PointerMove { x, y } => self.camera.pointer_move(x, y),
            SceneEvent::PointerUp => self.camera.pointer_up(),
            SceneEvent::Wheel { delta_y } => {
                if phase == Phase::Stories {
                    self.stories.wheel(&mut self.state, delta_y, self.now);
                } else {
                    self.camera.wheel(delta_y);
                }
            }
            SceneEvent::Key { key } => self.key(&key),
        }
    }

    fn key(&mut self, key: &str) {
        if self.state.phase() == Phase::Stories {
            let step = match key {
                "ArrowRight" | "ArrowDown" | " " | "Enter" => StoryStep::Next,
                "ArrowLeft" | "ArrowUp" => StoryStep::Previous,
                "Escape" => StoryStep::Skip,
                _ => return,
            };
            self.stories.step(&mut self.state, step);
        } else if key == "Escape" {
            self.field.deselect();
        }
    }

    pub fn tick(&mut self, tick: &FrameTick) -> FrameOutput {
        self.now = tick.input.now;
        let overlay = self.ending.tick(&mut self.state, &tick.audio, self.now);

        let view = CameraView {
            phase: self.state.phase(),
            memory_mode: self.state.is_memory_mode(),
            reset_trigger: self.state.camera_reset_trigger(),
        };
        let camera = self.camera.tick(&tick.input, view);
        let field = self.field.tick(&mut self.state, &camera, self.now);

        let mut media = self.ending.take_media();
        self.music.update(&self.state, &tick.audio, &mut media);
        self.lyrics.update(&tick.audio);

        FrameOutput {
            phase: self.state.phase(),
            state: self.snapshot(),
            camera,
            photos: field.photos,
            particles: field.particles,
            overlay,
            media,
            lyric: self.lyrics.current(&self.state).map(str::to_string),
        }
    }

    pub fn init_eggs<S: KeyValueStore + ?Sized>(
        &mut self,
        store: &mut S,
        now: NaiveDateTime,
        now_ms: i64,
    ) -> Result<EggView, EngineError> {
        self.eggs.init(store, now, now_ms)?;
        Ok(self.eggs.view())
    }

    pub fn egg_action<S: KeyValueStore + ?Sized>(
        &mut self,
        store: &mut S,
        action: EggAction,
        now: NaiveDateTime,
        now_ms: i64,
    ) -> Result<EggView, EngineError> {
        self.eggs.apply(store, action, now, now_ms)?;
        Ok(self.eggs.view())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ending::EndingStage;
    use crate::storage::MemoryStore;
    use chrono::NaiveDate;
    use glam::Vec3;

    fn scene(photos: usize) -> Scene {
        let mut config = EngineConfig::default();
        config.catalog.photos = (0..photos).map(|i| format!("/p/{i}.webp")).collect();
        config.catalog.gallery = vec!["/g/0.webp".to_string()];
        Scene::new(config)
    }

    fn frame(scene: &mut Scene, ms: u64) -> FrameOutput {
        scene.tick(&FrameTick {
            input: FrameInput {
                now: Timestamp::from_millis(ms),
                ..Default::default()
            },
            audio: Vec::new(),
        })
    }

    fn events(scene: &mut Scene, json: &str) {
        let events: Vec<SceneEvent> = serde_json::from_str(json).unwrap();
        for event in events {
            scene.handle(event);
        }
    }

    #[test]
    fn event_wire_format() {
        let mut scene = scene(0);
        events(
            &mut scene,
            r#"[{"type":"set_phase","phase":"intro"},{"type":"next_intro_step"},
                {"type":"show_photos","show":true},{"type":"hover_photo","index":null},
                {"type":"story","step":"Next"}]"#,
        );
        let snapshot = scene.snapshot();
        assert_eq!(snapshot.phase, Phase::Intro);
        assert_eq!(snapshot.intro_step, 1);
        assert!(snapshot.show_photos);
    }

    #[test]
    fn frame_input_is_flattened() {
        let tick: FrameTick = serde_json::from_str(
            r#"{"now":16000,"keys":{"forward":true},"audio":[{"track":"background","kind":"ended"}]}"#,
        )
        .unwrap();
        assert_eq!(tick.input.now, Timestamp::from_millis(16));
        assert!(tick.input.keys.forward);
        assert_eq!(tick.audio.len(), 1);
    }

    #[test]
    fn ready_field_spawns_and_renders() {
        let mut scene = scene(3);
        scene.handle(SceneEvent::SetPhase { phase: Phase::Intro });
        scene.handle(SceneEvent::SetPhase { phase: Phase::Stories });
        scene.handle(SceneEvent::ShowPhotos { show: true });
        scene.handle(SceneEvent::Key { key: "Escape".to_string() });
        assert_eq!(scene.state().phase(), Phase::Ready);

        for i in 0..3 {
            scene.handle(SceneEvent::ImageReady {
                url: format!("/p/{i}.webp"),
                width: 800.0,
                height: 600.0,
            });
        }
        let mut out = frame(&mut scene, 0);
        for ms in (16..1_400).step_by(16) {
            out = frame(&mut scene, ms);
        }
        assert!(out.state.photos_loaded);
        assert_eq!(out.photos.len(), 3);
        assert!(out.overlay.is_none());
    }

    #[test]
    fn escape_deselects_outside_stories() {
        let mut scene = scene(2);
        scene.handle(SceneEvent::SetPhase { phase: Phase::Intro });
        scene.handle(SceneEvent::SetPhase { phase: Phase::Stories });
        scene.handle(SceneEvent::Story { step: StoryStep::Skip });
        scene.handle(SceneEvent::ShowPhotos { show: true });
        for i in 0..2 {
            scene.handle(SceneEvent::ImageReady {
                url: format!("/p/{i}.webp"),
                width: 600.0,
                height: 800.0,
            });
        }
        for ms in (0..400).step_by(16) {
            frame(&mut scene, ms);
        }
        scene.handle(SceneEvent::SelectPhoto { index: 1 });
        let out = frame(&mut scene, 400);
        let selected: Vec<&PhotoInstance> = out.photos.iter().filter(|p| p.selected).collect();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].index, 1);
        scene.handle(SceneEvent::Key { key: "Escape".to_string() });
        scene.handle(SceneEvent::ClickEmpty);
        let out = frame(&mut scene, 416);
        assert!(out.photos.iter().all(|p| !p.selected));
    }

    #[test]
    fn ending_overlay_and_music_fade() {
        let mut scene = scene(1);
        scene.handle(SceneEvent::StartMusic);
        let out = frame(&mut scene, 0);
        assert_eq!(out.media.len(), 1);

        scene.state_mut().set_phase(Phase::Ready);
        scene.handle(SceneEvent::SetPhase { phase: Phase::Ending });
        let out = frame(&mut scene, 100);
        assert_eq!(out.overlay.as_ref().map(|o| o.stage), Some(EndingStage::BlinkPre));
        let out = frame(&mut scene, 100 + 1800 + 1250);
        assert!(out.state.bgm_fade_out);
        assert!(out
            .media
            .iter()
            .any(|m| matches!(m, MediaCommand::FadeOut { .. })));
    }

    #[test]
    fn memory_toggle_moves_camera_smoothly() {
        let mut scene = scene(0);
        scene.state_mut().set_phase(Phase::Intro);
        scene.state_mut().set_phase(Phase::Stories);
        scene.state_mut().set_phase(Phase::Ready);
        let before = frame(&mut scene, 0).camera.position;
        scene.handle(SceneEvent::ToggleMemoryMode);
        let after = frame(&mut scene, 16).camera.position;
        assert!((after - before).length() < 1.0);
        assert_eq!(before, Vec3::new(0.0, 0.0, 70.0));
    }

    #[test]
    fn eggs_round_trip_through_store() {
        let mut scene = scene(0);
        let mut store = MemoryStore::new();
        let now = NaiveDate::from_ymd_opt(2026, 2, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        let view = scene.init_eggs(&mut store, now, 0).unwrap();
        assert!(view.show_missed_prompt);
        let view = scene
            .egg_action(&mut store, EggAction::DismissMissedPrompt, now, 1)
            .unwrap();
        assert!(!view.show_missed_prompt);
        assert!(scene
            .egg_action(&mut store, EggAction::Trigger { id: "x".to_string() }, now, 2)
            .is_err());
    }
}
