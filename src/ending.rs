// Ending sequencer: blink-pre → gallery → blink-post → credits.
// Strictly linear. Re-initialized on every entry into `ending`; every timer it owns is
// dropped on exit, so nothing scheduled here can touch the store from another phase.

use serde::{Deserialize, Serialize};

use crate::media::{AudioEvent, AudioEventKind, MediaCommand, Track};
use crate::state::AppState;
use crate::timers::Timers;
use crate::types::{EndingSettings, Phase, Timestamp};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndingStage {
    BlinkPre,
    Gallery,
    MorePhotos,
    BlinkPost,
    /// Blink-post finished; waiting for the ending track to end.
    AwaitAudio,
    Credits,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EndingTimer {
    PreBlink,
    GalleryAdvance,
    MorePhotosDone,
    PostBlink,
    CreditsStart,
}

/// Everything the shell draws on top of the scene during the ending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndingOverlay {
    pub stage: EndingStage,
    /// Opaque black cover during the dark blink steps.
    pub blackout: bool,
    pub gallery_photo: Option<String>,
    pub caption: Option<String>,
    pub more_photos: Option<String>,
    /// 0..=1 scroll position of the credits block.
    pub credits_progress: Option<f32>,
    pub portrait: Option<String>,
}

/// Drives the ending once `phase` becomes `ending`.
#[derive(Debug, Clone)]
pub struct EndingSequencer {
    settings: EndingSettings,
    gallery: Vec<String>,
    portrait: Option<String>,
    narrow_viewport: bool,
    timers: Timers<EndingTimer>,
    active: bool,
    stage: EndingStage,
    blink_step: usize,
    gallery_index: usize,
    gallery_started: Option<Timestamp>,
    interval_ms: Option<u64>,
    audio_time: f64,
    audio_ended: Option<Timestamp>,
    credits_started: Option<Timestamp>,
    media: Vec<MediaCommand>,
}

impl EndingSequencer {
    pub fn new(settings: EndingSettings, gallery: Vec<String>, portrait: Option<String>, narrow_viewport: bool) -> Self {
        EndingSequencer {
            settings,
            gallery,
            portrait,
            narrow_viewport,
            timers: Timers::new(),
            active: false,
            stage: EndingStage::BlinkPre,
            blink_step: 0,
            gallery_index: 0,
            gallery_started: None,
            interval_ms: None,
            audio_time: 0.0,
            audio_ended: None,
            credits_started: None,
            media: Vec::new(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn stage(&self) -> Option<EndingStage> {
        self.active.then_some(self.stage)
    }

    /// Per-photo gallery interval once the ending track's duration is known.
    pub fn interval_ms(&self) -> Option<u64> {
        self.interval_ms
    }

    /// Commands produced since the last call.
    pub fn take_media(&mut self) -> Vec<MediaCommand> {
        std::mem::take(&mut self.media)
    }

    /// `max(min_interval, floor((duration − lead_out) · 1000 / count))`.
    pub fn gallery_interval_ms(&self, duration_secs: f64, count: usize) -> u64 {
        let duration = if duration_secs.is_finite() && duration_secs > 0.0 {
            duration_secs
        } else {
            self.settings.fallback_duration_secs
        };
        let span_ms = ((duration - self.settings.lead_out_secs) * 1000.0).max(0.0);
        let interval = (span_ms / count.max(1) as f64).floor() as u64;
        interval.max(self.settings.min_interval_ms)
    }

    pub fn tick(&mut self, state: &mut AppState, audio: &[AudioEvent], now: Timestamp) -> Option<EndingOverlay> {
        let in_ending = state.phase() == Phase::Ending;
        if in_ending && !self.active {
            self.enter(state, now);
        } else if !in_ending && self.active {
            self.exit(state);
        }
        if !self.active {
            return None;
        }

        // Timers first so an event arriving on the same tick sees the current stage.
        self.run_timers(state, now);
        for event in audio {
            self.on_audio(state, event, now);
        }
        self.run_timers(state, now);
        Some(self.overlay(now))
    }

    fn enter(&mut self, state: &mut AppState, now: Timestamp) {
        log::info!("ending: blink-pre");
        self.timers.clear();
        self.active = true;
        self.stage = EndingStage::BlinkPre;
        self.blink_step = 0;
        self.gallery_index = 0;
        self.gallery_started = None;
        self.interval_ms = None;
        self.audio_time = 0.0;
        self.audio_ended = None;
        self.credits_started = None;
        state.set_hide_lyrics(false);
        self.schedule_blink(EndingTimer::PreBlink, now);
    }

    fn exit(&mut self, state: &mut AppState) {
        log::info!("ending: left");
        self.timers.clear();
        self.active = false;
        state.set_photos_fading(false);
        self.media.push(MediaCommand::Stop { track: Track::Ending });
        self.media.push(MediaCommand::Stop { track: Track::Credits });
    }

    fn blink_delays(&self, timer: EndingTimer) -> &[u64] {
        match timer {
            EndingTimer::PreBlink => &self.settings.pre_blink_ms,
            _ => &self.settings.post_blink_ms,
        }
    }

    /// Schedule the end of the current blink step, if any remain.
    fn schedule_blink(&mut self, timer: EndingTimer, from: Timestamp) -> bool {
        match self.blink_delays(timer).get(self.blink_step).copied() {
            Some(delay) => {
                self.timers.schedule(from.plus_millis(delay), timer);
                true
            }
            None => false,
        }
    }

    fn on_audio(&mut self, state: &mut AppState, event: &AudioEvent, now: Timestamp) {
        match (&event.track, &event.kind) {
            (Track::Ending, AudioEventKind::Loaded { duration_secs }) => {
                self.start_gallery_clock(state, *duration_secs, now);
            }
            (Track::Ending, AudioEventKind::Progress { time_secs }) => {
                if time_secs.is_finite() {
                    self.audio_time = *time_secs;
                }
            }
            (Track::Ending, AudioEventKind::Ended) => {
                self.audio_ended = Some(now);
                self.maybe_schedule_credits(now);
            }
            (Track::Ending, AudioEventKind::Failed { message }) => {
                log::debug!("ending track failed: {message}");
                self.start_gallery_clock(state, f64::NAN, now);
            }
            (track, AudioEventKind::Failed { message }) => {
                log::debug!("{track:?} track failed: {message}");
            }
            _ => {}
        }
    }

    fn run_timers(&mut self, state: &mut AppState, now: Timestamp) {
        loop {
            let due = self.timers.drain_due(now);
            if due.is_empty() {
                break;
            }
            for (at, timer) in due {
                self.fire(state, timer, at);
            }
        }
    }

    fn fire(&mut self, state: &mut AppState, timer: EndingTimer, at: Timestamp) {
        match timer {
            EndingTimer::PreBlink => {
                self.blink_step += 1;
                if self.blink_step >= self.settings.bgm_fade_step as usize {
                    state.set_bgm_fade_out(true);
                }
                if !self.schedule_blink(EndingTimer::PreBlink, at) {
                    self.begin_gallery(state);
                }
            }
            EndingTimer::GalleryAdvance => {
                self.gallery_index += 1;
                if self.gallery_index >= self.gallery.len() {
                    log::info!("ending: more photos");
                    self.stage = EndingStage::MorePhotos;
                    self.timers
                        .schedule(at.plus_millis(self.settings.more_photos_ms), EndingTimer::MorePhotosDone);
                } else if let Some(interval) = self.interval_ms {
                    self.timers.schedule(at.plus_millis(interval), EndingTimer::GalleryAdvance);
                }
            }
            EndingTimer::MorePhotosDone => {
                log::info!("ending: blink-post");
                self.stage = EndingStage::BlinkPost;
                self.blink_step = 0;
                if !self.schedule_blink(EndingTimer::PostBlink, at) {
                    self.finish_blink_post(state, at);
                }
            }
            EndingTimer::PostBlink => {
                self.blink_step += 1;
                if !self.schedule_blink(EndingTimer::PostBlink, at) {
                    self.finish_blink_post(state, at);
                }
            }
            EndingTimer::CreditsStart => {
                log::info!("ending: credits");
                self.stage = EndingStage::Credits;
                self.credits_started = Some(at);
                self.media.push(MediaCommand::Play {
                    track: Track::Credits,
                    ramp: Some(self.settings.credits_ramp),
                });
            }
        }
    }

    fn begin_gallery(&mut self, state: &mut AppState) {
        log::info!("ending: gallery");
        self.stage = EndingStage::Gallery;
        state.set_hide_lyrics(true);
        self.media.push(MediaCommand::Play {
            track: Track::Ending,
            ramp: Some(self.settings.ending_ramp),
        });
    }

    /// The ending track reported its duration (or failed). Starts cycling photos.
    fn start_gallery_clock(&mut self, state: &mut AppState, duration_secs: f64, now: Timestamp) {
        if self.stage != EndingStage::Gallery || self.gallery_started.is_some() {
            return;
        }
        self.gallery_started = Some(now);
        if self.gallery.is_empty() {
            // Nothing to show: close the gallery and dissolve straight away.
            self.finish_blink_post(state, now);
            return;
        }
        let interval = self.gallery_interval_ms(duration_secs, self.gallery.len());
        self.interval_ms = Some(interval);
        self.timers.schedule(now.plus_millis(interval), EndingTimer::GalleryAdvance);
    }

    fn finish_blink_post(&mut self, state: &mut AppState, at: Timestamp) {
        self.stage = EndingStage::AwaitAudio;
        state.set_photos_fading(true);
        self.maybe_schedule_credits(at);
    }

    /// Credits need both the ending track ended and blink-post done.
    fn maybe_schedule_credits(&mut self, now: Timestamp) {
        let Some(ended) = self.audio_ended else {
            return;
        };
        if self.stage != EndingStage::AwaitAudio || self.timers.contains(&EndingTimer::CreditsStart) {
            return;
        }
        let due = ended.plus_millis(self.settings.credits_grace_ms).max(now);
        self.timers.schedule(due, EndingTimer::CreditsStart);
    }

    fn caption_at(&self, now: Timestamp) -> Option<String> {
        let started = self.gallery_started?;
        let elapsed = if self.audio_time > 0.0 {
            self.audio_time
        } else {
            now.since(started) as f64 / 1_000_000.0
        };
        self.settings
            .captions
            .iter()
            .take_while(|c| c.time <= elapsed)
            .last()
            .map(|c| c.text.clone())
    }

    fn overlay(&self, now: Timestamp) -> EndingOverlay {
        // Blink-pre opens and closes transparent; blink-post starts black.
        let blackout = match self.stage {
            EndingStage::BlinkPre => self.blink_step % 2 == 1,
            EndingStage::BlinkPost => self.blink_step % 2 == 0,
            _ => false,
        };
        let mut overlay = EndingOverlay {
            stage: self.stage,
            blackout,
            gallery_photo: None,
            caption: None,
            more_photos: None,
            credits_progress: None,
            portrait: None,
        };
        match self.stage {
            EndingStage::Gallery => {
                if self.gallery_started.is_some() {
                    overlay.gallery_photo = self.gallery.get(self.gallery_index).cloned();
                }
                overlay.caption = self.caption_at(now);
            }
            EndingStage::MorePhotos => {
                overlay.caption = self.caption_at(now);
                overlay.more_photos = Some(self.settings.more_photos_text.clone());
            }
            EndingStage::Credits => {
                if let Some(started) = self.credits_started {
                    let elapsed = now.since(started);
                    let progress = elapsed as f64 / 1_000_000.0 / self.settings.credits_scroll_secs;
                    overlay.credits_progress = Some(progress.clamp(0.0, 1.0) as f32);
                    if !self.narrow_viewport && elapsed >= self.settings.portrait_delay_ms * 1000 {
                        overlay.portrait = self.portrait.clone();
                    }
                }
            }
            _ => {}
        }
        overlay
    }
}
