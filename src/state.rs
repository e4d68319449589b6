// The app store: one phase plus a loosely coupled vector of flags.
// Setters are total and synchronous; subscribers hear each change in call order.
// No transactional grouping: two setters are two notifications.

use serde::{Deserialize, Serialize};

use crate::types::Phase;

/// Which store field changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StateField {
    Phase,
    IntroStep,
    ShowPhotos,
    PhotosLoaded,
    MusicStarted,
    CurrentStoryIndex,
    StoriesComplete,
    PhotosFading,
    MemoryMode,
    CameraReset,
    BgmFadeOut,
    HideLyrics,
    ShowChat,
    ShowNovel,
}

/// Subscription id returned by [`AppState::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(StateField, &StateSnapshot)>;

/// Plain copy of every field, handed to subscribers and serialized for the shell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct StateSnapshot {
    pub phase: Phase,
    pub intro_step: u32,
    pub show_photos: bool,
    pub photos_loaded: bool,
    pub music_started: bool,
    pub current_story_index: usize,
    pub stories_complete: bool,
    pub photos_fading: bool,
    pub is_memory_mode: bool,
    pub camera_reset_trigger: u64,
    pub bgm_fade_out: bool,
    pub hide_lyrics: bool,
    pub show_chat: bool,
    pub show_novel: bool,
}

/// Single source of truth for the active screen and cross-cutting flags.
pub struct AppState {
    snapshot: StateSnapshot,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
    off_graph_transitions: u32,
}

impl AppState {
    pub fn new() -> Self {
        AppState {
            snapshot: StateSnapshot::default(),
            listeners: Vec::new(),
            next_subscription: 0,
            off_graph_transitions: 0,
        }
    }

    pub fn snapshot(&self) -> &StateSnapshot {
        &self.snapshot
    }

    pub fn phase(&self) -> Phase {
        self.snapshot.phase
    }

    pub fn show_photos(&self) -> bool {
        self.snapshot.show_photos
    }

    pub fn photos_loaded(&self) -> bool {
        self.snapshot.photos_loaded
    }

    pub fn photos_fading(&self) -> bool {
        self.snapshot.photos_fading
    }

    pub fn is_memory_mode(&self) -> bool {
        self.snapshot.is_memory_mode
    }

    pub fn current_story_index(&self) -> usize {
        self.snapshot.current_story_index
    }

    pub fn camera_reset_trigger(&self) -> u64 {
        self.snapshot.camera_reset_trigger
    }

    pub fn bgm_fade_out(&self) -> bool {
        self.snapshot.bgm_fade_out
    }

    pub fn hide_lyrics(&self) -> bool {
        self.snapshot.hide_lyrics
    }

    pub fn show_chat(&self) -> bool {
        self.snapshot.show_chat
    }

    /// Number of `set_phase` calls that left the documented transition graph.
    pub fn off_graph_transitions(&self) -> u32 {
        self.off_graph_transitions
    }

    /// Register a listener called synchronously after every change.
    pub fn subscribe(&mut self, listener: impl FnMut(StateField, &StateSnapshot) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() != before
    }

    /// Unconditional overwrite. Transitions outside the documented graph are
    /// logged and counted, never rejected.
    pub fn set_phase(&mut self, phase: Phase) {
        let previous = self.snapshot.phase;
        if previous == phase {
            return;
        }
        if !previous.allows_transition_to(phase) {
            self.off_graph_transitions += 1;
            log::warn!(
                "phase {} -> {} is outside the documented transition graph",
                previous.as_str(),
                phase.as_str()
            );
        }
        log::info!("phase {} -> {}", previous.as_str(), phase.as_str());
        self.snapshot.phase = phase;
        self.notify(StateField::Phase);
    }

    pub fn next_intro_step(&mut self) {
        self.snapshot.intro_step += 1;
        self.notify(StateField::IntroStep);
    }

    pub fn set_show_photos(&mut self, show: bool) {
        self.update(StateField::ShowPhotos, |s| &mut s.show_photos, show);
    }

    pub fn set_photos_loaded(&mut self, loaded: bool) {
        self.update(StateField::PhotosLoaded, |s| &mut s.photos_loaded, loaded);
    }

    pub fn set_music_started(&mut self, started: bool) {
        self.update(StateField::MusicStarted, |s| &mut s.music_started, started);
    }

    pub fn set_current_story_index(&mut self, index: usize) {
        if self.snapshot.current_story_index != index {
            self.snapshot.current_story_index = index;
            self.notify(StateField::CurrentStoryIndex);
        }
    }

    pub fn set_stories_complete(&mut self, complete: bool) {
        self.update(StateField::StoriesComplete, |s| &mut s.stories_complete, complete);
    }

    pub fn set_photos_fading(&mut self, fading: bool) {
        self.update(StateField::PhotosFading, |s| &mut s.photos_fading, fading);
    }

    pub fn set_memory_mode(&mut self, mode: bool) {
        self.update(StateField::MemoryMode, |s| &mut s.is_memory_mode, mode);
    }

    /// Bump the reset counter. Consumers compare against the last value they saw.
    pub fn reset_camera(&mut self) {
        self.snapshot.camera_reset_trigger += 1;
        self.notify(StateField::CameraReset);
    }

    pub fn set_bgm_fade_out(&mut self, fade_out: bool) {
        self.update(StateField::BgmFadeOut, |s| &mut s.bgm_fade_out, fade_out);
    }

    pub fn set_hide_lyrics(&mut self, hide: bool) {
        self.update(StateField::HideLyrics, |s| &mut s.hide_lyrics, hide);
    }

    pub fn set_show_chat(&mut self, show: bool) {
        self.update(StateField::ShowChat, |s| &mut s.show_chat, show);
    }

    pub fn set_show_novel(&mut self, show: bool) {
        self.update(StateField::ShowNovel, |s| &mut s.show_novel, show);
    }

    fn update(&mut self, field: StateField, slot: impl FnOnce(&mut StateSnapshot) -> &mut bool, value: bool) {
        let target = slot(&mut self.snapshot);
        if *target != value {
            *target = value;
            self.notify(field);
        }
    }

    fn notify(&mut self, field: StateField) {
        let snapshot = &self.snapshot;
        for (_, listener) in self.listeners.iter_mut() {
            listener(field, snapshot);
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("snapshot", &self.snapshot)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn starts_at_start() {
        let state = AppState::new();
        assert_eq!(state.phase(), Phase::Start);
        assert!(!state.show_photos());
        assert_eq!(state.camera_reset_trigger(), 0);
    }

    #[test]
    fn subscribers_see_changes_in_call_order() {
        let mut state = AppState::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        state.subscribe(move |field, snap| sink.borrow_mut().push((field, snap.phase)));

        state.set_show_photos(true);
        state.set_phase(Phase::Intro);
        state.set_show_photos(true); // no change, no notification

        let seen = seen.borrow();
        assert_eq!(
            *seen,
            vec![(StateField::ShowPhotos, Phase::Start), (StateField::Phase, Phase::Intro)]
        );
    }

    #[test]
    fn unsubscribe_stops_notifications() {
        let mut state = AppState::new();
        let count = Rc::new(RefCell::new(0));
        let sink = count.clone();
        let id = state.subscribe(move |_, _| *sink.borrow_mut() += 1);
        state.reset_camera();
        assert!(state.unsubscribe(id));
        state.reset_camera();
        assert_eq!(*count.borrow(), 1);
        assert_eq!(state.camera_reset_trigger(), 2);
    }

    #[test]
    fn off_graph_transition_is_applied_and_counted() {
        let mut state = AppState::new();
        state.set_phase(Phase::Reading);
        assert_eq!(state.phase(), Phase::Reading);
        assert_eq!(state.off_graph_transitions(), 1);

        state.set_phase(Phase::Ready);
        assert_eq!(state.off_graph_transitions(), 1);
    }

    #[test]
    fn flags_are_independent_of_phase() {
        let mut state = AppState::new();
        state.set_phase(Phase::Reading);
        state.set_memory_mode(true);
        assert!(state.is_memory_mode());
        assert_eq!(state.phase(), Phase::Reading);
    }

    proptest! {
        #[test]
        fn phase_round_trip(path in prop::collection::vec(0usize..6, 1..20)) {
            let mut state = AppState::new();
            for i in path {
                let phase = Phase::ALL[i];
                state.set_phase(phase);
                prop_assert_eq!(state.phase(), phase);
            }
        }
    }
}
