// Background-track lyrics from LRC text.

use crate::media::{AudioEvent, AudioEventKind, Track};
use crate::state::AppState;
use crate::types::Caption;

/// Lines are shown slightly ahead of the audio.
const LEAD_SECS: f64 = 0.5;

/// Parse lines carrying a `[mm:ss.xx]` / `[mm:ss.xxx]` stamp, in file order.
/// Title and credit lines are dropped.
pub fn parse_lrc(text: &str) -> Vec<Caption> {
    text.lines().filter_map(parse_line).collect()
}

/// The first valid stamp anywhere on the line sets the time; other tags stay in the text.
fn parse_line(line: &str) -> Option<Caption> {
    let (start, end, time) = line.match_indices('[').find_map(|(start, _)| {
        let end = start + line[start..].find(']')?;
        parse_stamp(&line[start + 1..end]).map(|time| (start, end, time))
    })?;
    let text = format!("{}{}", &line[..start], &line[end + 1..]);
    let text = text.trim();
    if text.is_empty() || text.contains("词：") || text.contains("曲：") || text.contains(" - ") {
        return None;
    }
    Some(Caption::new(time, text))
}

fn parse_stamp(stamp: &str) -> Option<f64> {
    let (minutes, rest) = stamp.split_once(':')?;
    let (seconds, fraction) = rest.split_once('.')?;
    let all_digits = |s: &str, lens: &[usize]| lens.contains(&s.len()) && s.bytes().all(|b| b.is_ascii_digit());
    if !all_digits(minutes, &[2]) || !all_digits(seconds, &[2]) || !all_digits(fraction, &[2, 3]) {
        return None;
    }
    let millis: f64 = fraction.parse::<f64>().ok()? * if fraction.len() == 2 { 10.0 } else { 1.0 };
    Some(minutes.parse::<f64>().ok()? * 60.0 + seconds.parse::<f64>().ok()? + millis / 1000.0)
}

/// Time-sorted captions with threshold lookup.
#[derive(Debug, Clone, Default)]
pub struct CaptionTrack {
    lines: Vec<Caption>,
}

impl CaptionTrack {
    pub fn new(mut lines: Vec<Caption>) -> Self {
        lines.sort_by(|a, b| a.time.total_cmp(&b.time));
        CaptionTrack { lines }
    }

    pub fn from_lrc(text: &str) -> Self {
        CaptionTrack::new(parse_lrc(text))
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Index of the last line starting at or before `time`.
    pub fn index_at(&self, time: f64) -> Option<usize> {
        self.lines.partition_point(|c| c.time <= time).checked_sub(1)
    }

    pub fn line_at(&self, time: f64) -> Option<&str> {
        self.index_at(time).map(|i| self.lines[i].text.as_str())
    }
}

/// Follows the background track and picks the line to show.
#[derive(Debug, Clone, Default)]
pub struct Lyrics {
    track: CaptionTrack,
    playing: bool,
    time: f64,
}

impl Lyrics {
    pub fn new(track: CaptionTrack) -> Self {
        Lyrics {
            track,
            playing: false,
            time: 0.0,
        }
    }

    pub fn update(&mut self, audio: &[AudioEvent]) {
        for event in audio.iter().filter(|e| e.track == Track::Background) {
            match &event.kind {
                AudioEventKind::Progress { time_secs } if time_secs.is_finite() => {
                    self.playing = true;
                    self.time = *time_secs;
                }
                AudioEventKind::Ended | AudioEventKind::Failed { .. } => self.playing = false,
                _ => {}
            }
        }
    }

    pub fn current(&self, state: &AppState) -> Option<&str> {
        if !self.playing || state.hide_lyrics() {
            return None;
        }
        self.track.line_at(self.time + LEAD_SECS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LRC: &str = "[00:00.00]约定 - 周蕙\n[00:01.50]词：姚谦\n[00:02.00]曲：陈小霞\n\
                       [00:12.34]你我约定 难过的往事不许提\n[00:20.456]也答应永远都不让对方担心\n\
                       [00:30.00]\nno stamp here\n[1:00.00]bad stamp";

    #[test]
    fn parses_and_filters_credit_lines() {
        let track = CaptionTrack::from_lrc(LRC);
        assert_eq!(track.len(), 2);
        assert!((track.lines[0].time - 12.34).abs() < 1e-9);
        assert!((track.lines[1].time - 20.456).abs() < 1e-9);
    }

    #[test]
    fn stamp_after_other_tags_is_found() {
        let lines = parse_lrc("[ar:x][00:01.00]第一句\n[00:03.00]第三句\n[00:02.00]第二句");
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].text, "[ar:x]第一句");
        assert!((lines[0].time - 1.0).abs() < 1e-9);

        let track = CaptionTrack::from_lrc("[00:03.00]第三句\n[ar:x][00:01.00]第一句");
        assert_eq!(track.line_at(1.5), Some("[ar:x]第一句"));
        assert_eq!(track.line_at(3.0), Some("第三句"));
    }

    #[test]
    fn lookup_is_last_line_at_or_before() {
        let track = CaptionTrack::from_lrc(LRC);
        assert_eq!(track.index_at(0.0), None);
        assert_eq!(track.index_at(12.34), Some(0));
        assert_eq!(track.index_at(20.0), Some(0));
        assert_eq!(track.index_at(99.0), Some(1));
    }

    #[test]
    fn lyrics_lead_and_hide() {
        let mut lyrics = Lyrics::new(CaptionTrack::from_lrc(LRC));
        let mut state = AppState::new();
        assert_eq!(lyrics.current(&state), None);

        lyrics.update(&[AudioEvent::new(
            Track::Background,
            AudioEventKind::Progress { time_secs: 11.9 },
        )]);
        assert_eq!(lyrics.current(&state), Some("你我约定 难过的往事不许提"));

        state.set_hide_lyrics(true);
        assert_eq!(lyrics.current(&state), None);
    }
}
