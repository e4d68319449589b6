// Audio plumbing. The shell owns the audio elements; the core only says what to play
// and hears back what happened. Playback failures arrive as events and are dropped.

use serde::{Deserialize, Serialize};

use crate::state::AppState;
use crate::types::VolumeRamp;

/// Background music fade: volume lost per step.
const BGM_FADE_STEP: f32 = 0.05;
const BGM_FADE_INTERVAL_MS: u64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Track {
    Background,
    Ending,
    Credits,
}

/// Instruction for the shell's audio layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum MediaCommand {
    /// Start from zero volume and ramp up to `ramp.target`.
    Play { track: Track, ramp: Option<VolumeRamp> },
    /// Lower the volume by `step` every `interval_ms`, then pause.
    FadeOut { track: Track, step: f32, interval_ms: u64 },
    Stop { track: Track },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AudioEventKind {
    /// Metadata is available. Non-finite or zero durations are possible.
    Loaded { duration_secs: f64 },
    Progress { time_secs: f64 },
    Ended,
    /// Playback was rejected (autoplay policy, decode error).
    Failed {
        #[serde(default)]
        message: String,
    },
}

/// Something the shell's audio element reported since the last tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioEvent {
    pub track: Track,
    #[serde(flatten)]
    pub kind: AudioEventKind,
}

impl AudioEvent {
    pub fn new(track: Track, kind: AudioEventKind) -> Self {
        AudioEvent { track, kind }
    }
}

/// Watches the music flags and turns their edges into commands.
#[derive(Debug, Clone, Default)]
pub struct BackgroundMusic {
    playing: bool,
    fading: bool,
}

impl BackgroundMusic {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, state: &AppState, audio: &[AudioEvent], out: &mut Vec<MediaCommand>) {
        for event in audio.iter().filter(|e| e.track == Track::Background) {
            if let AudioEventKind::Failed { message } = &event.kind {
                log::debug!("background music failed: {message}");
            }
        }

        let started = state.snapshot().music_started;
        if started && !self.playing && !self.fading {
            self.playing = true;
            out.push(MediaCommand::Play {
                track: Track::Background,
                ramp: None,
            });
        }
        if state.bgm_fade_out() && !self.fading {
            self.fading = true;
            if self.playing {
                out.push(MediaCommand::FadeOut {
                    track: Track::Background,
                    step: BGM_FADE_STEP,
                    interval_ms: BGM_FADE_INTERVAL_MS,
                });
            }
        }
    }
}
