// Easter eggs: conditional one-off messages keyed on visit count, calendar date or clock.
//
// Evaluation is pure over (definitions, visit count, last visit, shown ids, now).
// `EggTracker` layers the persisted bookkeeping on top: one visit per calendar day,
// per-day eggs re-armed each new day, and the "missed" list for date windows that
// closed before the egg was ever shown.

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::storage::{self, EggRecord, KeyValueStore};

/// When an egg fires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EggTrigger {
    #[serde(rename_all = "camelCase")]
    VisitCount { trigger_count: u32 },
    /// Inclusive of both calendar days.
    #[serde(rename_all = "camelCase")]
    DateRange { start_date: NaiveDate, end_date: NaiveDate },
    /// `MM-DD`, every year.
    #[serde(rename_all = "camelCase")]
    Anniversary { anniversary_date: String },
    /// `[start_hour, end_hour)`, wrapping past midnight when start > end.
    #[serde(rename_all = "camelCase")]
    TimeRange { start_hour: u32, end_hour: u32 },
    #[serde(rename_all = "camelCase")]
    LongAbsence { absence_days: i64 },
}

impl EggTrigger {
    /// Lower fires first.
    pub fn priority(&self) -> u8 {
        match self {
            EggTrigger::VisitCount { .. } => 0,
            EggTrigger::DateRange { .. } => 1,
            EggTrigger::Anniversary { .. } => 2,
            EggTrigger::LongAbsence { .. } => 3,
            EggTrigger::TimeRange { .. } => 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextColor {
    Light,
    Dark,
}

/// One easter-egg definition. Presentation fields pass straight through to the modal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EasterEgg {
    pub id: String,
    #[serde(flatten)]
    pub trigger: EggTrigger,
    pub title: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emoji: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_color: Option<TextColor>,
    #[serde(default)]
    pub show_confetti: bool,
    /// Auto-dismiss after this many milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
}

fn egg(id: &str, trigger: EggTrigger, title: &str, message: &str, emoji: &str, background: &str) -> EasterEgg {
    EasterEgg {
        id: id.to_string(),
        trigger,
        title: title.to_string(),
        message: message.to_string(),
        emoji: Some(emoji.to_string()),
        background: Some(background.to_string()),
        text_color: None,
        show_confetti: false,
        duration: None,
    }
}

/// Built-in definitions.
pub fn default_eggs() -> Vec<EasterEgg> {
    let mut eggs = vec![
        egg(
            "visit_10",
            EggTrigger::VisitCount { trigger_count: 10 },
            "第十次",
            "这是你第十次来看我啦\n\n谢谢你的陪伴",
            "🌟",
            "linear-gradient(135deg, #6A00FF 0%, #FF2D95 55%, #FFD166 100%)",
        ),
        egg(
            "late_night",
            EggTrigger::TimeRange {
                start_hour: 0,
                end_hour: 5,
            },
            "夜深了",
            "这么晚了还不睡吗\n\n早点休息吧\n\n晚安",
            "🌙",
            "linear-gradient(135deg, #0F2027 0%, #203A43 55%, #2C5364 100%)",
        ),
        egg(
            "good_morning",
            EggTrigger::TimeRange {
                start_hour: 6,
                end_hour: 9,
            },
            "早安",
            "早上好！\n\n新的一天开始了\n\n今天也要加油哦",
            "☀️",
            "linear-gradient(135deg, #f5af19 0%, #f12711 55%, #FFD166 100%)",
        ),
    ];
    if let (Some(start_date), Some(end_date)) = (NaiveDate::from_ymd_opt(2026, 1, 1), NaiveDate::from_ymd_opt(2026, 1, 3)) {
        eggs.insert(
            1,
            egg(
                "new_year",
                EggTrigger::DateRange { start_date, end_date },
                "新年快乐",
                "新年快乐！\n\n祝你新的一年\n身体健康\n万事如意",
                "🎆",
                "linear-gradient(135deg, #4776E6 0%, #8E54E9 55%, #FF3CAC 100%)",
            ),
        );
    }
    for egg in eggs.iter_mut().filter(|e| e.id == "visit_10" || e.id == "new_year") {
        egg.show_confetti = true;
    }
    eggs
}

pub fn in_date_range(start: NaiveDate, end: NaiveDate, now: NaiveDateTime) -> bool {
    let today = now.date();
    start <= today && today <= end
}

/// `MM-DD` matches today's month and day.
pub fn is_anniversary(anniversary: &str, now: NaiveDateTime) -> bool {
    let mut parts = anniversary.split('-').map(|p| p.trim().parse::<u32>());
    match (parts.next(), parts.next()) {
        (Some(Ok(month)), Some(Ok(day))) => now.month() == month && now.day() == day,
        _ => false,
    }
}

pub fn in_time_range(start_hour: u32, end_hour: u32, now: NaiveDateTime) -> bool {
    let hour = now.hour();
    if start_hour <= end_hour {
        hour >= start_hour && hour < end_hour
    } else {
        hour >= start_hour || hour < end_hour
    }
}

fn fires(trigger: &EggTrigger, visit_count: u32, last_visit: Option<NaiveDate>, now: NaiveDateTime) -> bool {
    match trigger {
        EggTrigger::VisitCount { trigger_count } => *trigger_count > 0 && visit_count == *trigger_count,
        EggTrigger::DateRange { start_date, end_date } => in_date_range(*start_date, *end_date, now),
        EggTrigger::Anniversary { anniversary_date } => is_anniversary(anniversary_date, now),
        EggTrigger::LongAbsence { absence_days } => {
            last_visit.is_some_and(|last| *absence_days > 0 && (now.date() - last).num_days() >= *absence_days)
        }
        EggTrigger::TimeRange { start_hour, end_hour } => in_time_range(*start_hour, *end_hour, now),
    }
}

/// Highest-priority unshown egg that fires now. Definition order breaks ties.
pub fn triggered_egg<'a>(
    eggs: &'a [EasterEgg],
    visit_count: u32,
    last_visit: Option<NaiveDate>,
    shown: &[String],
    now: NaiveDateTime,
) -> Option<&'a EasterEgg> {
    (0..=4u8).find_map(|priority| {
        eggs.iter().find(|egg| {
            egg.trigger.priority() == priority
                && !shown.contains(&egg.id)
                && fires(&egg.trigger, visit_count, last_visit, now)
        })
    })
}

/// Date-range eggs whose window has closed without being shown.
pub fn missed_eggs<'a>(eggs: &'a [EasterEgg], shown: &[String], now: NaiveDateTime) -> Vec<&'a EasterEgg> {
    eggs.iter()
        .filter(|egg| !shown.contains(&egg.id))
        .filter(|egg| matches!(egg.trigger, EggTrigger::DateRange { end_date, .. } if now.date() > end_date))
        .collect()
}

/// What the modal and missed-egg prompt should show.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct EggView {
    pub visit_count: u32,
    pub current: Option<EasterEgg>,
    pub missed: Vec<EasterEgg>,
    pub show_missed_prompt: bool,
}

/// User actions on the easter-egg UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum EggAction {
    Dismiss,
    ResetShown,
    Trigger { id: String },
    ViewMissed { id: String },
    DismissMissedPrompt,
    IgnoreMissed { id: String },
}

/// Easter-egg state for one page load.
#[derive(Debug, Clone)]
pub struct EggTracker {
    eggs: Vec<EasterEgg>,
    initialized: bool,
    visit_count: u32,
    shown: Vec<String>,
    current: Option<EasterEgg>,
    missed: Vec<EasterEgg>,
    show_missed_prompt: bool,
}

impl EggTracker {
    pub fn new(eggs: Vec<EasterEgg>) -> Self {
        EggTracker {
            eggs,
            initialized: false,
            visit_count: 0,
            shown: Vec::new(),
            current: None,
            missed: Vec::new(),
            show_missed_prompt: false,
        }
    }

    fn is_date_range(&self, id: &str) -> bool {
        self.eggs
            .iter()
            .any(|egg| egg.id == id && matches!(egg.trigger, EggTrigger::DateRange { .. }))
    }

    pub fn view(&self) -> EggView {
        EggView {
            visit_count: self.visit_count,
            current: self.current.clone(),
            missed: self.missed.clone(),
            show_missed_prompt: self.show_missed_prompt,
        }
    }

    /// Record this visit and evaluate. Runs once per page load.
    pub fn init<S: KeyValueStore + ?Sized>(
        &mut self,
        store: &mut S,
        now: NaiveDateTime,
        now_ms: i64,
    ) -> Result<(), EngineError> {
        if self.initialized {
            return Ok(());
        }
        let stored = storage::load_egg_record(store);
        let today = now.date();
        let new_day = stored.last_visit_date != Some(today);

        let visit_count = if new_day {
            stored.visit_count.saturating_add(1)
        } else {
            stored.visit_count
        };
        // Per-day eggs re-arm on a new day. Date-range ids stay on record so a window
        // that closes after the egg was seen never reports it as missed.
        let mut shown = stored.shown_eggs;
        let armed: Vec<String> = if new_day {
            shown.retain(|id| id.starts_with("visit_") || self.is_date_range(id));
            shown.iter().filter(|id| !self.is_date_range(id)).cloned().collect()
        } else {
            shown.clone()
        };

        let current = triggered_egg(&self.eggs, visit_count, stored.last_visit_date, &armed, now).cloned();
        let missed: Vec<EasterEgg> = missed_eggs(&self.eggs, &shown, now)
            .into_iter()
            .filter(|egg| !stored.dismissed_missed.contains(&egg.id))
            .cloned()
            .collect();

        storage::save_egg_record(
            store,
            &EggRecord {
                visit_count,
                shown_eggs: shown.clone(),
                last_visit_date: Some(today),
                last_visit_time: Some(now_ms),
                dismissed_missed: stored.dismissed_missed,
                install_date: stored.install_date.or(Some(today)),
            },
        )?;

        if let Some(egg) = &current {
            log::info!("easter egg {} triggered on visit {visit_count}", egg.id);
        }
        self.show_missed_prompt = current.is_none() && !missed.is_empty();
        self.visit_count = visit_count;
        self.shown = shown;
        self.current = current;
        self.missed = missed;
        self.initialized = true;
        Ok(())
    }

    pub fn apply<S: KeyValueStore + ?Sized>(
        &mut self,
        store: &mut S,
        action: EggAction,
        now: NaiveDateTime,
        now_ms: i64,
    ) -> Result<(), EngineError> {
        match action {
            EggAction::Dismiss => self.dismiss(store, now, now_ms),
            EggAction::ResetShown => self.reset_shown(store, now, now_ms),
            EggAction::Trigger { id } => self.trigger_by_id(&id),
            EggAction::ViewMissed { id } => self.view_missed(store, &id),
            EggAction::DismissMissedPrompt => {
                self.show_missed_prompt = false;
                Ok(())
            }
            EggAction::IgnoreMissed { id } => self.ignore_missed(store, &id),
        }
    }

    /// Close the current egg and remember it as shown.
    pub fn dismiss<S: KeyValueStore + ?Sized>(
        &mut self,
        store: &mut S,
        now: NaiveDateTime,
        now_ms: i64,
    ) -> Result<(), EngineError> {
        let Some(egg) = self.current.take() else {
            return Ok(());
        };
        if !self.shown.contains(&egg.id) {
            self.shown.push(egg.id);
        }
        let stored = storage::load_egg_record(store);
        storage::save_egg_record(
            store,
            &EggRecord {
                visit_count: self.visit_count,
                shown_eggs: self.shown.clone(),
                last_visit_date: Some(now.date()),
                last_visit_time: Some(now_ms),
                dismissed_missed: stored.dismissed_missed,
                install_date: stored.install_date,
            },
        )?;
        self.show_missed_prompt = !self.missed.is_empty();
        Ok(())
    }

    /// Forget every shown and dismissed id. The visit count stays.
    pub fn reset_shown<S: KeyValueStore + ?Sized>(
        &mut self,
        store: &mut S,
        now: NaiveDateTime,
        now_ms: i64,
    ) -> Result<(), EngineError> {
        let stored = storage::load_egg_record(store);
        storage::save_egg_record(
            store,
            &EggRecord {
                visit_count: self.visit_count,
                shown_eggs: Vec::new(),
                last_visit_date: Some(now.date()),
                last_visit_time: Some(now_ms),
                dismissed_missed: Vec::new(),
                install_date: stored.install_date,
            },
        )?;
        self.shown.clear();
        self.missed.clear();
        self.show_missed_prompt = false;
        Ok(())
    }

    /// Show an egg regardless of its trigger. Not recorded until dismissed.
    pub fn trigger_by_id(&mut self, id: &str) -> Result<(), EngineError> {
        let egg = self
            .eggs
            .iter()
            .find(|e| e.id == id)
            .ok_or_else(|| EngineError::UnknownEgg(id.to_string()))?;
        self.current = Some(egg.clone());
        self.show_missed_prompt = false;
        Ok(())
    }

    /// Open a missed egg from the prompt; it counts as shown from now on.
    pub fn view_missed<S: KeyValueStore + ?Sized>(&mut self, store: &mut S, id: &str) -> Result<(), EngineError> {
        let position = self
            .missed
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| EngineError::UnknownEgg(id.to_string()))?;
        let egg = self.missed.remove(position);
        if !self.shown.contains(&egg.id) {
            self.shown.push(egg.id.clone());
        }

        let mut stored = storage::load_egg_record(store);
        stored.shown_eggs = self.shown.clone();
        storage::save_egg_record(store, &stored)?;

        self.current = Some(egg);
        self.show_missed_prompt = false;
        Ok(())
    }

    /// Never offer this missed egg again.
    pub fn ignore_missed<S: KeyValueStore + ?Sized>(&mut self, store: &mut S, id: &str) -> Result<(), EngineError> {
        let mut stored = storage::load_egg_record(store);
        if !stored.dismissed_missed.iter().any(|d| d == id) {
            stored.dismissed_missed.push(id.to_string());
        }
        storage::save_egg_record(store, &stored)?;

        self.missed.retain(|e| e.id != id);
        self.show_missed_prompt = !self.missed.is_empty();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn ids(eggs: &[&EasterEgg]) -> Vec<String> {
        eggs.iter().map(|e| e.id.clone()).collect()
    }

    #[test]
    fn default_definitions() {
        let eggs = default_eggs();
        let names: Vec<&str> = eggs.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(names, ["visit_10", "new_year", "late_night", "good_morning"]);
        assert!(eggs[0].show_confetti && eggs[1].show_confetti && !eggs[2].show_confetti);
    }

    #[test]
    fn definition_wire_format() {
        let json = r#"{"id":"ann","type":"anniversary","anniversaryDate":"05-20","title":"t","message":"m","textColor":"dark"}"#;
        let egg: EasterEgg = serde_json::from_str(json).unwrap();
        assert_eq!(
            egg.trigger,
            EggTrigger::Anniversary {
                anniversary_date: "05-20".to_string()
            }
        );
        assert_eq!(egg.text_color, Some(TextColor::Dark));
        assert!(is_anniversary("05-20", at(2027, 5, 20, 12)));
        assert!(!is_anniversary("5/20", at(2027, 5, 20, 12)));
    }

    #[test]
    fn visit_count_egg_fires_once() {
        let eggs = default_eggs();
        let noon = at(2026, 3, 1, 12);
        let hit = triggered_egg(&eggs, 10, None, &[], noon).unwrap();
        assert_eq!(hit.title, "第十次");
        assert!(triggered_egg(&eggs, 10, None, &["visit_10".to_string()], noon).is_none());
    }

    #[test]
    fn priority_prefers_date_over_time() {
        let eggs = default_eggs();
        let early = at(2026, 1, 2, 3);
        assert_eq!(triggered_egg(&eggs, 1, None, &[], early).unwrap().id, "new_year");
        let shown = vec!["new_year".to_string()];
        assert_eq!(triggered_egg(&eggs, 1, None, &shown, early).unwrap().id, "late_night");
    }

    #[test]
    fn date_range_is_inclusive_of_last_day() {
        let start = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2026, 1, 3).unwrap();
        assert!(in_date_range(start, end, at(2026, 1, 3, 23)));
        assert!(!in_date_range(start, end, at(2026, 1, 4, 0)));
    }

    #[test]
    fn time_range_wraps_midnight() {
        assert!(in_time_range(22, 2, at(2026, 1, 1, 23)));
        assert!(in_time_range(22, 2, at(2026, 1, 1, 1)));
        assert!(!in_time_range(22, 2, at(2026, 1, 1, 2)));
        assert!(!in_time_range(6, 9, at(2026, 1, 1, 9)));
    }

    #[test]
    fn long_absence_counts_whole_days() {
        let eggs = vec![EasterEgg {
            id: "miss_you".to_string(),
            trigger: EggTrigger::LongAbsence { absence_days: 7 },
            title: "t".to_string(),
            message: "m".to_string(),
            emoji: None,
            background: None,
            text_color: None,
            show_confetti: false,
            duration: None,
        }];
        let last = NaiveDate::from_ymd_opt(2026, 3, 1);
        assert!(triggered_egg(&eggs, 2, last, &[], at(2026, 3, 7, 23)).is_none());
        assert!(triggered_egg(&eggs, 2, last, &[], at(2026, 3, 8, 0)).is_some());
        assert!(triggered_egg(&eggs, 2, None, &[], at(2026, 3, 8, 0)).is_none());
    }

    #[test]
    fn missed_only_after_window_closes() {
        let eggs = default_eggs();
        assert!(missed_eggs(&eggs, &[], at(2026, 1, 3, 23)).is_empty());
        assert_eq!(ids(&missed_eggs(&eggs, &[], at(2026, 2, 1, 12))), ["new_year"]);
        assert!(missed_eggs(&eggs, &["new_year".to_string()], at(2026, 2, 1, 12)).is_empty());
    }

    #[test]
    fn tenth_visit_scenario() {
        let mut store = MemoryStore::new();
        storage::save_egg_record(
            &mut store,
            &EggRecord {
                visit_count: 9,
                last_visit_date: NaiveDate::from_ymd_opt(2026, 3, 1),
                ..Default::default()
            },
        )
        .unwrap();

        let mut tracker = EggTracker::new(default_eggs());
        tracker.init(&mut store, at(2026, 3, 2, 12), 0).unwrap();
        let view = tracker.view();
        assert_eq!(view.visit_count, 10);
        assert_eq!(view.current.unwrap().title, "第十次");

        // Same day again: no new visit, and once dismissed it stays dismissed.
        tracker.dismiss(&mut store, at(2026, 3, 2, 12), 1).unwrap();
        let mut again = EggTracker::new(default_eggs());
        again.init(&mut store, at(2026, 3, 2, 13), 2).unwrap();
        assert_eq!(again.view().visit_count, 10);
        assert!(again.view().current.is_none());
    }

    #[test]
    fn init_is_idempotent() {
        let mut store = MemoryStore::new();
        let mut tracker = EggTracker::new(default_eggs());
        tracker.init(&mut store, at(2026, 3, 2, 12), 0).unwrap();
        tracker.init(&mut store, at(2026, 3, 3, 12), 0).unwrap();
        assert_eq!(tracker.view().visit_count, 1);
        let record = storage::load_egg_record(&store);
        assert_eq!(record.install_date, NaiveDate::from_ymd_opt(2026, 3, 2));
    }

    #[test]
    fn new_day_rearms_daily_eggs_only() {
        let mut store = MemoryStore::new();
        storage::save_egg_record(
            &mut store,
            &EggRecord {
                visit_count: 12,
                shown_eggs: vec!["visit_10".to_string(), "good_morning".to_string()],
                last_visit_date: NaiveDate::from_ymd_opt(2026, 3, 1),
                ..Default::default()
            },
        )
        .unwrap();
        let mut tracker = EggTracker::new(default_eggs());
        tracker.init(&mut store, at(2026, 3, 2, 7), 0).unwrap();
        assert_eq!(tracker.view().current.unwrap().id, "good_morning");
        assert_eq!(storage::load_egg_record(&store).shown_eggs, ["visit_10"]);
    }

    #[test]
    fn egg_seen_inside_window_is_not_missed_later() {
        let mut store = MemoryStore::new();
        let mut tracker = EggTracker::new(default_eggs());
        tracker.init(&mut store, at(2026, 1, 2, 12), 0).unwrap();
        assert_eq!(tracker.view().current.unwrap().id, "new_year");
        tracker.dismiss(&mut store, at(2026, 1, 2, 12), 1).unwrap();

        // Still inside the window on the next day: shown again.
        let mut next_day = EggTracker::new(default_eggs());
        next_day.init(&mut store, at(2026, 1, 3, 12), 2).unwrap();
        assert_eq!(next_day.view().current.unwrap().id, "new_year");

        let mut later = EggTracker::new(default_eggs());
        later.init(&mut store, at(2026, 2, 1, 12), 3).unwrap();
        let view = later.view();
        assert!(view.missed.is_empty());
        assert!(!view.show_missed_prompt);
        assert!(storage::load_egg_record(&store)
            .shown_eggs
            .contains(&"new_year".to_string()));
    }

    #[test]
    fn missed_prompt_flow() {
        let mut store = MemoryStore::new();
        let mut tracker = EggTracker::new(default_eggs());
        tracker.init(&mut store, at(2026, 2, 1, 12), 0).unwrap();
        let view = tracker.view();
        assert!(view.show_missed_prompt);
        assert_eq!(view.missed.len(), 1);

        tracker
            .apply(
                &mut store,
                EggAction::IgnoreMissed {
                    id: "new_year".to_string(),
                },
                at(2026, 2, 1, 12),
                1,
            )
            .unwrap();
        assert!(!tracker.view().show_missed_prompt);

        let mut next_day = EggTracker::new(default_eggs());
        next_day.init(&mut store, at(2026, 2, 2, 12), 2).unwrap();
        assert!(next_day.view().missed.is_empty());
    }

    #[test]
    fn viewing_missed_egg_marks_it_shown() {
        let mut store = MemoryStore::new();
        let mut tracker = EggTracker::new(default_eggs());
        tracker.init(&mut store, at(2026, 2, 1, 12), 0).unwrap();
        tracker.view_missed(&mut store, "new_year").unwrap();
        assert_eq!(tracker.view().current.unwrap().id, "new_year");
        assert!(tracker.view().missed.is_empty());
        assert!(storage::load_egg_record(&store)
            .shown_eggs
            .contains(&"new_year".to_string()));
    }

    #[test]
    fn unknown_ids_are_errors() {
        let mut tracker = EggTracker::new(default_eggs());
        assert!(matches!(tracker.trigger_by_id("nope"), Err(EngineError::UnknownEgg(_))));
        tracker.trigger_by_id("late_night").unwrap();
        assert_eq!(tracker.view().current.unwrap().id, "late_night");
    }

    #[test]
    fn reset_clears_shown_and_dismissed() {
        let mut store = MemoryStore::new();
        let mut tracker = EggTracker::new(default_eggs());
        tracker.init(&mut store, at(2026, 2, 1, 12), 0).unwrap();
        tracker.ignore_missed(&mut store, "new_year").unwrap();
        tracker.reset_shown(&mut store, at(2026, 2, 1, 12), 1).unwrap();
        let record = storage::load_egg_record(&store);
        assert!(record.shown_eggs.is_empty() && record.dismissed_missed.is_empty());
        assert_eq!(record.visit_count, 1);
    }
}
