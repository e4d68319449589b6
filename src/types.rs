// Strong typing over strings. Newtypes for timestamps, a closed phase enum, and settings.
// Every settings field has a serde default so the shell can send a partial config.

use std::collections::HashMap;

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::eggs::EasterEgg;

/// Timestamp in microseconds. Newtype for type safety.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct Timestamp(u64);

impl Timestamp {
    pub fn from_micros(us: u64) -> Self {
        Timestamp(us)
    }

    pub fn from_millis(ms: u64) -> Self {
        Timestamp(ms * 1000)
    }

    /// Seconds from the shell's clock. Negative and non-finite values clamp to zero.
    pub fn from_secs_f64(secs: f64) -> Self {
        if secs.is_finite() && secs > 0.0 {
            Timestamp((secs * 1_000_000.0).round() as u64)
        } else {
            Timestamp(0)
        }
    }

    pub fn as_micros(&self) -> u64 {
        self.0
    }

    pub fn as_secs(&self) -> f64 {
        self.0 as f64 / 1_000_000.0
    }

    pub fn plus_millis(&self, ms: u64) -> Self {
        Timestamp(self.0.saturating_add(ms * 1000))
    }

    /// Microseconds elapsed since `earlier`; zero if `earlier` is in the future.
    pub fn since(&self, earlier: Timestamp) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

/// Top-level screen the experience is in. Exactly one is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    #[default]
    Start,
    Intro,
    Stories,
    Ready,
    Reading,
    Ending,
}

impl Phase {
    pub const ALL: [Phase; 6] = [
        Phase::Start,
        Phase::Intro,
        Phase::Stories,
        Phase::Ready,
        Phase::Reading,
        Phase::Ending,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Start => "start",
            Phase::Intro => "intro",
            Phase::Stories => "stories",
            Phase::Ready => "ready",
            Phase::Reading => "reading",
            Phase::Ending => "ending",
        }
    }

    /// Documented transition graph. Not enforced; the store only reports violations.
    pub fn allows_transition_to(&self, next: Phase) -> bool {
        if *self == next {
            return true;
        }
        matches!(
            (self, next),
            (Phase::Start, Phase::Intro)
                | (Phase::Intro, Phase::Stories)
                | (Phase::Stories, Phase::Ready)
                | (Phase::Ready, Phase::Stories)
                | (Phase::Ready, Phase::Reading)
                | (Phase::Reading, Phase::Ready)
                | (Phase::Ready, Phase::Ending)
        )
    }

    /// Phases in which pointer drag and wheel never move the camera.
    pub fn locks_camera_input(&self) -> bool {
        matches!(self, Phase::Reading | Phase::Stories)
    }
}

/// Keys currently held down (WASD + vertical fly).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct HeldKeys {
    pub forward: bool,
    pub back: bool,
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
}

impl HeldKeys {
    pub fn any(&self) -> bool {
        self.forward || self.back || self.left || self.right || self.up || self.down
    }
}

/// Continuous per-frame input sampled by the shell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct FrameInput {
    pub now: Timestamp,
    #[serde(default)]
    pub keys: HeldKeys,
    /// Pointer in normalized device coordinates (-1..1, y up).
    #[serde(default)]
    pub pointer: Vec2,
}

/// Camera position plus yaw/pitch orientation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: Vec3,
    pub yaw: f32,
    pub pitch: f32,
}

impl Pose {
    pub fn new(position: Vec3) -> Self {
        Pose {
            position,
            yaw: 0.0,
            pitch: 0.0,
        }
    }

    /// Unit vector the camera looks along.
    pub fn forward(&self) -> Vec3 {
        let cos_pitch = self.pitch.cos();
        Vec3::new(
            -self.yaw.sin() * cos_pitch,
            self.pitch.sin(),
            -self.yaw.cos() * cos_pitch,
        )
    }
}

/// Narrative record attached to a photo by filename.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhotoStory {
    #[serde(default)]
    pub title: Option<String>,
    pub content: String,
    /// `YYYY.MM.DD` or `YYYY-MM-DD`.
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub object_position: Option<String>,
    #[serde(default)]
    pub scale: Option<f32>,
}

/// Timed caption, `time` in seconds from the start of its track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Caption {
    pub time: f64,
    pub text: String,
}

impl Caption {
    pub fn new(time: f64, text: impl Into<String>) -> Self {
        Caption {
            time,
            text: text.into(),
        }
    }
}

/// Engine configuration passed from JS.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub camera: CameraSettings,
    #[serde(default)]
    pub photos: PhotoSettings,
    #[serde(default)]
    pub ending: EndingSettings,
    #[serde(default)]
    pub catalog: CatalogSettings,
    #[serde(default = "crate::eggs::default_eggs")]
    pub eggs: Vec<EasterEgg>,
    #[serde(default)]
    pub narrow_viewport: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            camera: CameraSettings::default(),
            photos: PhotoSettings::default(),
            ending: EndingSettings::default(),
            catalog: CatalogSettings::default(),
            eggs: crate::eggs::default_eggs(),
            narrow_viewport: false,
        }
    }
}

/// Camera rig behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraSettings {
    #[serde(default = "default_home")]
    pub home: Vec3,
    #[serde(default = "default_reading_position")]
    pub reading_position: Vec3,
    /// Smoothing factor for free-fly, reading and stories.
    #[serde(default = "default_free_lerp")]
    pub free_lerp: f32,
    /// Smoothing factor inside the memory tunnel.
    #[serde(default = "default_memory_lerp")]
    pub memory_lerp: f32,
    /// Radians of yaw/pitch per pixel of drag.
    #[serde(default = "default_drag_sensitivity")]
    pub drag_sensitivity: f32,
    /// World units per wheel unit when dollying.
    #[serde(default = "default_wheel_dolly")]
    pub wheel_dolly: f32,
    /// World units per wheel unit along the memory tunnel.
    #[serde(default = "default_wheel_depth")]
    pub wheel_depth: f32,
    /// World units per frame while a fly key is held.
    #[serde(default = "default_fly_speed")]
    pub fly_speed: f32,
    /// Half-width of the free-fly cube.
    #[serde(default = "default_fly_bound")]
    pub fly_bound: f32,
    #[serde(default = "default_memory_near")]
    pub memory_near: f32,
    #[serde(default = "default_memory_far")]
    pub memory_far: f32,
    #[serde(default = "default_parallax")]
    pub parallax: f32,
    #[serde(default = "default_stories_decay")]
    pub stories_decay: f32,
    #[serde(default = "default_stories_depth")]
    pub stories_depth: f32,
    #[serde(default = "default_stories_depth_lerp")]
    pub stories_depth_lerp: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        CameraSettings {
            home: default_home(),
            reading_position: default_reading_position(),
            free_lerp: default_free_lerp(),
            memory_lerp: default_memory_lerp(),
            drag_sensitivity: default_drag_sensitivity(),
            wheel_dolly: default_wheel_dolly(),
            wheel_depth: default_wheel_depth(),
            fly_speed: default_fly_speed(),
            fly_bound: default_fly_bound(),
            memory_near: default_memory_near(),
            memory_far: default_memory_far(),
            parallax: default_parallax(),
            stories_decay: default_stories_decay(),
            stories_depth: default_stories_depth(),
            stories_depth_lerp: default_stories_depth_lerp(),
        }
    }
}

fn default_home() -> Vec3 {
    Vec3::new(0.0, 0.0, 70.0)
}

fn default_reading_position() -> Vec3 {
    Vec3::new(-45.0, 0.0, 55.0)
}

fn default_free_lerp() -> f32 {
    0.08
}

fn default_memory_lerp() -> f32 {
    0.05
}

fn default_drag_sensitivity() -> f32 {
    0.003
}

fn default_wheel_dolly() -> f32 {
    0.15
}

fn default_wheel_depth() -> f32 {
    0.1
}

fn default_fly_speed() -> f32 {
    0.4
}

fn default_fly_bound() -> f32 {
    300.0
}

fn default_memory_near() -> f32 {
    150.0
}

fn default_memory_far() -> f32 {
    -8500.0
}

fn default_parallax() -> f32 {
    20.0
}

fn default_stories_decay() -> f32 {
    0.95
}

fn default_stories_depth() -> f32 {
    60.0
}

fn default_stories_depth_lerp() -> f32 {
    0.03
}

/// Photo field timing and smoothing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhotoSettings {
    #[serde(default = "default_spawn_stagger_ms")]
    pub spawn_stagger_ms: u64,
    /// Delay between the last spawn and `photosLoaded`.
    #[serde(default = "default_loaded_delay_ms")]
    pub loaded_delay_ms: u64,
    /// Delay before `photosLoaded` when there is nothing to spawn.
    #[serde(default = "default_empty_loaded_delay_ms")]
    pub empty_loaded_delay_ms: u64,
    #[serde(default = "default_dissolve_interval_ms")]
    pub dissolve_interval_ms: u64,
    #[serde(default = "default_selected_lerp")]
    pub selected_lerp: f32,
    #[serde(default = "default_idle_lerp")]
    pub idle_lerp: f32,
    /// Seconds an entity takes to ease in after spawning.
    #[serde(default = "default_appear_secs")]
    pub appear_secs: f32,
    /// Particle budget for the dissolve; halved on narrow viewports.
    #[serde(default = "default_particle_budget")]
    pub particle_budget: usize,
}

impl Default for PhotoSettings {
    fn default() -> Self {
        PhotoSettings {
            spawn_stagger_ms: default_spawn_stagger_ms(),
            loaded_delay_ms: default_loaded_delay_ms(),
            empty_loaded_delay_ms: default_empty_loaded_delay_ms(),
            dissolve_interval_ms: default_dissolve_interval_ms(),
            selected_lerp: default_selected_lerp(),
            idle_lerp: default_idle_lerp(),
            appear_secs: default_appear_secs(),
            particle_budget: default_particle_budget(),
        }
    }
}

fn default_spawn_stagger_ms() -> u64 {
    60
}

fn default_loaded_delay_ms() -> u64 {
    1000
}

fn default_empty_loaded_delay_ms() -> u64 {
    100
}

fn default_dissolve_interval_ms() -> u64 {
    30
}

fn default_selected_lerp() -> f32 {
    0.06
}

fn default_idle_lerp() -> f32 {
    0.05
}

fn default_appear_secs() -> f32 {
    2.0
}

fn default_particle_budget() -> usize {
    2000
}

/// Volume fade applied by the shell to an audio element.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VolumeRamp {
    pub target: f32,
    pub step: f32,
    pub interval_ms: u64,
}

/// Ending sequence timing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndingSettings {
    #[serde(default = "default_pre_blink_ms")]
    pub pre_blink_ms: Vec<u64>,
    #[serde(default = "default_post_blink_ms")]
    pub post_blink_ms: Vec<u64>,
    /// Pre-blink step after which background music fades.
    #[serde(default = "default_bgm_fade_step")]
    pub bgm_fade_step: u32,
    /// Used when the ending track reports no usable duration.
    #[serde(default = "default_fallback_duration_secs")]
    pub fallback_duration_secs: f64,
    /// Seconds of the ending track left for the closing caption.
    #[serde(default = "default_lead_out_secs")]
    pub lead_out_secs: f64,
    #[serde(default = "default_min_interval_ms")]
    pub min_interval_ms: u64,
    #[serde(default = "default_more_photos_ms")]
    pub more_photos_ms: u64,
    #[serde(default = "default_more_photos_text")]
    pub more_photos_text: String,
    #[serde(default = "default_credits_grace_ms")]
    pub credits_grace_ms: u64,
    #[serde(default = "default_credits_scroll_secs")]
    pub credits_scroll_secs: f64,
    #[serde(default = "default_portrait_delay_ms")]
    pub portrait_delay_ms: u64,
    #[serde(default = "default_captions")]
    pub captions: Vec<Caption>,
    #[serde(default = "default_ending_ramp")]
    pub ending_ramp: VolumeRamp,
    #[serde(default = "default_credits_ramp")]
    pub credits_ramp: VolumeRamp,
}

impl Default for EndingSettings {
    fn default() -> Self {
        EndingSettings {
            pre_blink_ms: default_pre_blink_ms(),
            post_blink_ms: default_post_blink_ms(),
            bgm_fade_step: default_bgm_fade_step(),
            fallback_duration_secs: default_fallback_duration_secs(),
            lead_out_secs: default_lead_out_secs(),
            min_interval_ms: default_min_interval_ms(),
            more_photos_ms: default_more_photos_ms(),
            more_photos_text: default_more_photos_text(),
            credits_grace_ms: default_credits_grace_ms(),
            credits_scroll_secs: default_credits_scroll_secs(),
            portrait_delay_ms: default_portrait_delay_ms(),
            captions: default_captions(),
            ending_ramp: default_ending_ramp(),
            credits_ramp: default_credits_ramp(),
        }
    }
}

fn default_pre_blink_ms() -> Vec<u64> {
    vec![1800, 1250, 1600, 1250, 1400]
}

fn default_post_blink_ms() -> Vec<u64> {
    vec![1250, 1600, 1250, 1400]
}

fn default_bgm_fade_step() -> u32 {
    2
}

fn default_fallback_duration_secs() -> f64 {
    33.0
}

fn default_lead_out_secs() -> f64 {
    5.0
}

fn default_min_interval_ms() -> u64 {
    50
}

fn default_more_photos_ms() -> u64 {
    1800
}

fn default_more_photos_text() -> String {
    "还有好多照片没有放上来...".to_string()
}

fn default_credits_grace_ms() -> u64 {
    1500
}

fn default_credits_scroll_secs() -> f64 {
    137.0
}

fn default_portrait_delay_ms() -> u64 {
    5000
}

fn default_captions() -> Vec<Caption> {
    vec![
        Caption::new(4.0, "我们好不容易"),
        Caption::new(6.0, "我们身不由己"),
        Caption::new(11.0, "我怕时间太快"),
        Caption::new(13.0, "不够将你看仔细"),
        Caption::new(18.0, "我怕时间太慢"),
        Caption::new(20.0, "日夜担心失去你"),
        Caption::new(25.0, "恨不得一夜之间白头"),
        Caption::new(29.0, "永不分离"),
    ]
}

fn default_ending_ramp() -> VolumeRamp {
    VolumeRamp {
        target: 0.8,
        step: 0.02,
        interval_ms: 60,
    }
}

fn default_credits_ramp() -> VolumeRamp {
    VolumeRamp {
        target: 0.6,
        step: 0.02,
        interval_ms: 80,
    }
}

/// Static photo data resolved by the bundler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogSettings {
    /// Field photos in display order.
    #[serde(default)]
    pub photos: Vec<String>,
    /// Stories keyed by original filename.
    #[serde(default)]
    pub stories: HashMap<String, PhotoStory>,
    #[serde(default = "default_chat_trigger")]
    pub chat_trigger: String,
    /// Photos cycled by the ending gallery.
    #[serde(default)]
    pub gallery: Vec<String>,
    #[serde(default)]
    pub portrait: Option<String>,
    /// Raw LRC text for the background track.
    #[serde(default)]
    pub lyrics: String,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        CatalogSettings {
            photos: Vec::new(),
            stories: HashMap::new(),
            chat_trigger: default_chat_trigger(),
            gallery: Vec::new(),
            portrait: None,
            lyrics: String::new(),
        }
    }
}

fn default_chat_trigger() -> String {
    "IMG_20250901_002915.webp".to_string()
}
