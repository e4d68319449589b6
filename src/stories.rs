// Story slideshow navigation during the `stories` phase.

use serde::{Deserialize, Serialize};

use crate::state::AppState;
use crate::types::{Phase, Timestamp};

/// Minimum spacing between wheel-driven steps.
const WHEEL_THROTTLE_MS: u64 = 800;

/// Navigation intent from keys, wheel or the on-screen controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoryStep {
    Next,
    Previous,
    Skip,
}

/// Walks `current_story_index` through `story_count` stories.
#[derive(Debug, Clone)]
pub struct StoryNavigator {
    story_count: usize,
    last_wheel: Option<Timestamp>,
}

impl StoryNavigator {
    pub fn new(story_count: usize) -> Self {
        StoryNavigator {
            story_count,
            last_wheel: None,
        }
    }

    pub fn story_count(&self) -> usize {
        self.story_count
    }

    /// Apply a step. Ignored outside `stories`. Next on the last story and Skip
    /// both leave for `ready` and rewind the index.
    pub fn step(&mut self, state: &mut AppState, step: StoryStep) {
        if state.phase() != Phase::Stories {
            return;
        }
        let index = state.current_story_index();
        match step {
            StoryStep::Next if index + 1 < self.story_count => {
                state.set_current_story_index(index + 1);
            }
            StoryStep::Next | StoryStep::Skip => {
                state.set_stories_complete(true);
                state.set_phase(Phase::Ready);
                state.set_current_story_index(0);
            }
            StoryStep::Previous => {
                if index > 0 {
                    state.set_current_story_index(index - 1);
                }
            }
        }
    }

    /// Wheel input: positive delta advances. At most one step per throttle window.
    pub fn wheel(&mut self, state: &mut AppState, delta_y: f32, now: Timestamp) {
        if state.phase() != Phase::Stories || delta_y == 0.0 {
            return;
        }
        if let Some(last) = self.last_wheel {
            if now.since(last) < WHEEL_THROTTLE_MS * 1000 {
                return;
            }
        }
        self.last_wheel = Some(now);
        let step = if delta_y > 0.0 {
            StoryStep::Next
        } else {
            StoryStep::Previous
        };
        self.step(state, step);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn in_stories() -> AppState {
        let mut state = AppState::new();
        state.set_phase(Phase::Intro);
        state.set_phase(Phase::Stories);
        state
    }

    #[test]
    fn next_walks_then_leaves_for_ready() {
        let mut state = in_stories();
        let mut nav = StoryNavigator::new(2);
        nav.step(&mut state, StoryStep::Next);
        assert_eq!(state.current_story_index(), 1);
        nav.step(&mut state, StoryStep::Next);
        assert_eq!(state.phase(), Phase::Ready);
        assert_eq!(state.current_story_index(), 0);
        assert!(state.snapshot().stories_complete);
    }

    #[test]
    fn previous_stops_at_zero() {
        let mut state = in_stories();
        let mut nav = StoryNavigator::new(3);
        nav.step(&mut state, StoryStep::Previous);
        assert_eq!(state.current_story_index(), 0);
        assert_eq!(state.phase(), Phase::Stories);
    }

    #[test]
    fn ignored_outside_stories() {
        let mut state = AppState::new();
        let mut nav = StoryNavigator::new(3);
        nav.step(&mut state, StoryStep::Skip);
        assert_eq!(state.phase(), Phase::Start);
    }

    #[test]
    fn wheel_is_throttled() {
        let mut state = in_stories();
        let mut nav = StoryNavigator::new(5);
        nav.wheel(&mut state, 100.0, Timestamp::from_millis(1_000));
        nav.wheel(&mut state, 100.0, Timestamp::from_millis(1_500));
        assert_eq!(state.current_story_index(), 1);
        nav.wheel(&mut state, 100.0, Timestamp::from_millis(1_800));
        assert_eq!(state.current_story_index(), 2);
        nav.wheel(&mut state, -100.0, Timestamp::from_millis(2_700));
        assert_eq!(state.current_story_index(), 1);
    }
}
