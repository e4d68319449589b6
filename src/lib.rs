// letter_core: Rust/WASM core of the starfield love-letter scene.
// The JS shell renders, plays audio and mirrors storage; every decision lives here.

mod camera;
mod catalog;
mod dissolve;
mod eggs;
mod ending;
mod error;
mod layout;
mod lyrics;
mod media;
mod photos;
mod scene;
mod state;
mod storage;
mod stories;
mod timers;
mod types;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

pub use camera::{advance, CameraFrame, CameraRig, CameraView, FrameSignals, RigState};
pub use catalog::PhotoCatalog;
pub use dissolve::{DissolveCloud, ParticleFrame};
pub use eggs::{default_eggs, EasterEgg, EggAction, EggTracker, EggTrigger, EggView};
pub use ending::{EndingOverlay, EndingSequencer, EndingStage};
pub use error::EngineError;
pub use layout::FloatLayout;
pub use lyrics::{parse_lrc, CaptionTrack};
pub use media::{AudioEvent, AudioEventKind, MediaCommand, Track};
pub use photos::{PhotoField, PhotoInstance};
pub use scene::{FrameOutput, FrameTick, Scene, SceneEvent};
pub use state::{AppState, StateField, StateSnapshot};
pub use storage::{ChatMessage, EggRecord, KeyValueStore, MemoryStore, MessageKind};
pub use stories::{StoryNavigator, StoryStep};
pub use timers::{TimerHandle, Timers};
pub use types::*;

/// Initialize panic hook and console logging.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
    #[cfg(target_arch = "wasm32")]
    let _ = console_log::init_with_level(log::Level::Info);
}

/// Local wall clock from the shell. The core has no clock of its own.
#[derive(Debug, Deserialize)]
struct WallClock {
    /// Local date and time, `YYYY-MM-DDTHH:MM:SS`.
    now: NaiveDateTime,
    /// Milliseconds since the Unix epoch.
    now_ms: i64,
}

#[derive(Debug, Deserialize)]
struct EggRequest {
    #[serde(flatten)]
    action: EggAction,
    now: NaiveDateTime,
    now_ms: i64,
}

#[derive(Debug, Deserialize)]
struct ChatRequest {
    content: String,
    sender: String,
    #[serde(default, rename = "type")]
    kind: MessageKind,
    now_ms: i64,
}

/// Result of any call that touched storage: the shell persists `storage` verbatim.
#[derive(Debug, Serialize)]
struct StoredResponse<T: Serialize> {
    #[serde(flatten)]
    value: T,
    storage: MemoryStore,
}

#[derive(Debug, Serialize)]
struct ChatResponse {
    message: Option<ChatMessage>,
}

#[derive(Debug, Serialize)]
struct Records {
    unlocked: bool,
    key_hint_shown: bool,
    chat: Vec<ChatMessage>,
}

fn to_js(err: EngineError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// Main engine interface exposed to JavaScript.
/// Batch interface to minimize JS↔WASM crossings.
#[wasm_bindgen]
pub struct Engine {
    scene: Scene,
    store: MemoryStore,
}

#[wasm_bindgen]
impl Engine {
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: &str) -> Result<Engine, JsValue> {
        Self::from_config_json(config_json).map_err(to_js)
    }

    /// Apply a JSON array of [`SceneEvent`]s in order.
    pub fn handle_events(&mut self, events_json: &str) -> Result<(), JsValue> {
        self.apply_events(events_json).map_err(to_js)
    }

    /// Step one frame. Input is a [`FrameTick`], output a [`FrameOutput`].
    pub fn tick(&mut self, frame_json: &str) -> Result<String, JsValue> {
        self.step(frame_json).map_err(to_js)
    }

    pub fn snapshot(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.scene.snapshot()).map_err(|e| to_js(e.into()))
    }

    /// Load the mirrored storage and evaluate easter eggs for this visit.
    pub fn init_eggs(&mut self, clock_json: &str, storage_json: &str) -> Result<String, JsValue> {
        self.start_visit(clock_json, storage_json).map_err(to_js)
    }

    pub fn egg_action(&mut self, action_json: &str) -> Result<String, JsValue> {
        self.apply_egg_action(action_json).map_err(to_js)
    }

    /// Unlock flag, key-hint flag and chat log.
    pub fn records(&self) -> Result<String, JsValue> {
        self.read_records().map_err(to_js)
    }

    pub fn unlock(&mut self) -> Result<String, JsValue> {
        storage::set_unlocked(&mut self.store);
        self.respond(()).map_err(to_js)
    }

    pub fn mark_key_hint_shown(&mut self) -> Result<String, JsValue> {
        storage::set_key_hint_shown(&mut self.store);
        self.respond(()).map_err(to_js)
    }

    pub fn send_chat(&mut self, chat_json: &str) -> Result<String, JsValue> {
        self.append_chat(chat_json).map_err(to_js)
    }
}

impl Engine {
    pub fn from_config_json(config_json: &str) -> Result<Engine, EngineError> {
        let config: EngineConfig =
            serde_json::from_str(config_json).map_err(|e| EngineError::InvalidConfig(e.to_string()))?;
        log::info!(
            "engine created: {} photos, {} stories, {} eggs",
            config.catalog.photos.len(),
            config.catalog.stories.len(),
            config.eggs.len()
        );
        Ok(Engine {
            scene: Scene::new(config),
            store: MemoryStore::new(),
        })
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    fn apply_events(&mut self, events_json: &str) -> Result<(), EngineError> {
        let events: Vec<SceneEvent> =
            serde_json::from_str(events_json).map_err(|e| EngineError::InvalidEvent(e.to_string()))?;
        for event in events {
            self.scene.handle(event);
        }
        Ok(())
    }

    fn step(&mut self, frame_json: &str) -> Result<String, EngineError> {
        let tick: FrameTick =
            serde_json::from_str(frame_json).map_err(|e| EngineError::InvalidEvent(e.to_string()))?;
        let output = self.scene.tick(&tick);
        Ok(serde_json::to_string(&output)?)
    }

    fn respond<T: Serialize>(&self, value: T) -> Result<String, EngineError> {
        Ok(serde_json::to_string(&StoredResponse {
            value,
            storage: self.store.clone(),
        })?)
    }

    fn start_visit(&mut self, clock_json: &str, storage_json: &str) -> Result<String, EngineError> {
        let clock: WallClock =
            serde_json::from_str(clock_json).map_err(|e| EngineError::InvalidEvent(e.to_string()))?;
        self.store = MemoryStore::from_json(storage_json)?;
        let view = self.scene.init_eggs(&mut self.store, clock.now, clock.now_ms)?;
        self.respond(view)
    }

    fn apply_egg_action(&mut self, action_json: &str) -> Result<String, EngineError> {
        let request: EggRequest =
            serde_json::from_str(action_json).map_err(|e| EngineError::InvalidEvent(e.to_string()))?;
        let view = self
            .scene
            .egg_action(&mut self.store, request.action, request.now, request.now_ms)?;
        self.respond(view)
    }

    fn read_records(&self) -> Result<String, EngineError> {
        Ok(serde_json::to_string(&Records {
            unlocked: storage::is_unlocked(&self.store),
            key_hint_shown: storage::key_hint_shown(&self.store),
            chat: storage::load_chat_log(&self.store),
        })?)
    }

    fn append_chat(&mut self, chat_json: &str) -> Result<String, EngineError> {
        let request: ChatRequest =
            serde_json::from_str(chat_json).map_err(|e| EngineError::InvalidEvent(e.to_string()))?;
        let message =
            storage::append_chat_message(&mut self.store, &request.content, &request.sender, request.kind, request.now_ms)?;
        self.respond(ChatResponse { message })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CLOCK: &str = r#"{"now":"2026-03-02T12:00:00","now_ms":1772452800000}"#;

    #[test]
    fn engine_creation_works() {
        let engine = Engine::new(r#"{"catalog":{"photos":["/a.webp"]},"narrow_viewport":true}"#);
        assert!(engine.is_ok());
        assert!(Engine::from_config_json("{}").is_ok());
    }

    #[test]
    fn bad_config_is_invalid_config() {
        let err = Engine::from_config_json(r#"{"camera":{"free_lerp":"fast"}}"#).err();
        assert!(matches!(err, Some(EngineError::InvalidConfig(_))));
    }

    #[test]
    fn batch_events_then_tick() {
        let mut engine = Engine::from_config_json("{}").unwrap();
        engine
            .handle_events(r#"[{"type":"set_phase","phase":"intro"},{"type":"start_music"}]"#)
            .unwrap();
        let out = engine.tick(r#"{"now":16000}"#).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["phase"], "intro");
        assert_eq!(value["media"][0]["command"], "play");
        assert_eq!(value["camera"]["position"][2], 70.0);

        let snapshot = engine.snapshot().unwrap();
        assert!(snapshot.contains("\"music_started\":true"));
    }

    #[test]
    fn malformed_batches_are_rejected_before_applying() {
        let mut engine = Engine::from_config_json("{}").unwrap();
        let err = engine.apply_events(r#"[{"type":"set_phase","phase":"intro"},{"type":"warp"}]"#);
        assert!(matches!(err, Err(EngineError::InvalidEvent(_))));
        assert_eq!(engine.scene().state().phase(), Phase::Start);
    }

    #[test]
    fn egg_flow_returns_storage_to_persist() {
        let mut engine = Engine::from_config_json("{}").unwrap();
        let stored = r#"{"love-letter-easter-eggs":"{\"visitCount\":9,\"shownEggs\":[],\"lastVisitDate\":\"2026-03-01\"}"}"#;
        let out = engine.init_eggs(CLOCK, stored).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["visit_count"], 10);
        assert_eq!(value["current"]["title"], "第十次");
        assert!(value["storage"]["love-letter-easter-eggs"]
            .as_str()
            .unwrap()
            .contains("\"visitCount\":10"));

        let out = engine
            .egg_action(r#"{"action":"dismiss","now":"2026-03-02T12:01:00","now_ms":1772452860000}"#)
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert!(value["current"].is_null());
    }

    #[test]
    fn records_and_chat() {
        let mut engine = Engine::from_config_json("{}").unwrap();
        engine.init_eggs(CLOCK, "").unwrap();
        engine.unlock().unwrap();
        let out = engine
            .send_chat(r#"{"content":"想你了","sender":"me","now_ms":1772452800000}"#)
            .unwrap();
        assert!(out.contains("msg-1772452800000"));
        let records: serde_json::Value = serde_json::from_str(&engine.records().unwrap()).unwrap();
        assert_eq!(records["unlocked"], true);
        assert_eq!(records["key_hint_shown"], false);
        assert_eq!(records["chat"][0]["content"], "想你了");
    }
}
