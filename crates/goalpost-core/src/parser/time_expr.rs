//! Time expression resolution.
//!
//! Turns phrases like "in 2 hours" or "at 9 pm" into an offset from a
//! caller-supplied `now`. Patterns are tried in table order and the first
//! match wins, even when a later pattern would be more specific
//! ("tomorrow at 9 am" resolves as "tomorrow").

use std::sync::LazyLock;

use chrono::{DateTime, Duration, NaiveTime, TimeZone};
use regex::{Captures, Regex};
use tracing::debug;

/// Minutes from now used when no time phrase is recognised.
pub const DEFAULT_OFFSET_MINUTES: i64 = 30;

/// Offset applied when no time phrase is recognised.
pub fn default_offset() -> Duration {
    Duration::minutes(DEFAULT_OFFSET_MINUTES)
}

/// What a matched pattern asks for, before `now` is taken into account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimeTarget {
    /// A fixed span from now.
    Offset(Duration),
    /// The next occurrence of a wall-clock time in `now`'s zone.
    ClockTime { hour: u32, minute: u32 },
}

type Handler = fn(&Captures<'_>) -> Option<TimeTarget>;

struct PatternRule {
    name: &'static str,
    pattern: Regex,
    handler: Handler,
}

/// Ordered pattern table. Position is the tie-breaker.
static RULES: LazyLock<Vec<PatternRule>> = LazyLock::new(|| {
    let table: [(&'static str, &'static str, Handler); 7] = [
        ("in_hours", r"in (\d+) hour", in_hours),
        ("in_minutes", r"in (\d+) minute", in_minutes),
        ("in_an_hour", r"in an hour", in_an_hour),
        ("tomorrow", r"tomorrow", tomorrow),
        ("next_week", r"next week", next_week),
        ("at_clock", r"at (\d{1,2}):(\d{2})", at_clock),
        ("at_meridiem", r"at (\d{1,2}) (am|pm)", at_meridiem),
    ];
    table
        .into_iter()
        .map(|(name, pattern, handler)| PatternRule {
            name,
            // Table patterns are static; a bad one is a programming error.
            pattern: Regex::new(&format!("(?i){pattern}")).expect("invalid time pattern"),
            handler,
        })
        .collect()
});

/// A meridiem directly after a matched phrase ("at 9:30 pm").
static TRAILING_MERIDIEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s+[ap]m\b").expect("invalid meridiem pattern"));

fn capture_u32(caps: &Captures<'_>, index: usize) -> Option<u32> {
    caps.get(index)?.as_str().parse().ok()
}

fn capture_i64(caps: &Captures<'_>, index: usize) -> Option<i64> {
    caps.get(index)?.as_str().parse().ok()
}

fn in_hours(caps: &Captures<'_>) -> Option<TimeTarget> {
    Duration::try_hours(capture_i64(caps, 1)?).map(TimeTarget::Offset)
}

fn in_minutes(caps: &Captures<'_>) -> Option<TimeTarget> {
    Duration::try_minutes(capture_i64(caps, 1)?).map(TimeTarget::Offset)
}

fn in_an_hour(_: &Captures<'_>) -> Option<TimeTarget> {
    Some(TimeTarget::Offset(Duration::hours(1)))
}

fn tomorrow(_: &Captures<'_>) -> Option<TimeTarget> {
    Some(TimeTarget::Offset(Duration::days(1)))
}

fn next_week(_: &Captures<'_>) -> Option<TimeTarget> {
    Some(TimeTarget::Offset(Duration::days(7)))
}

fn at_clock(caps: &Captures<'_>) -> Option<TimeTarget> {
    let hour = capture_u32(caps, 1)?;
    let minute = capture_u32(caps, 2)?;
    (hour < 24 && minute < 60).then_some(TimeTarget::ClockTime { hour, minute })
}

fn at_meridiem(caps: &Captures<'_>) -> Option<TimeTarget> {
    let hour = capture_u32(caps, 1)?;
    let is_pm = caps.get(2)?.as_str().eq_ignore_ascii_case("pm");
    Some(TimeTarget::ClockTime {
        hour: to_24_hour(hour, is_pm)?,
        minute: 0,
    })
}

/// 12am is midnight, 12pm is noon, other pm hours shift by twelve.
fn to_24_hour(hour: u32, is_pm: bool) -> Option<u32> {
    if !(1..=12).contains(&hour) {
        return None;
    }
    Some(match (hour, is_pm) {
        (12, false) => 0,
        (12, true) => 12,
        (h, true) => h + 12,
        (h, false) => h,
    })
}

/// Offset from `now` to the next `hour:minute` on the wall clock of `now`'s
/// zone. A time already passed today rolls forward one day; the current
/// minute itself does not roll.
fn until_clock_time<Tz: TimeZone>(now: &DateTime<Tz>, hour: u32, minute: u32) -> Option<Duration> {
    let clock = NaiveTime::from_hms_opt(hour, minute, 0)?;
    let today = now.date_naive().and_time(clock);
    let mut target = now.timezone().from_local_datetime(&today).earliest()?;
    if target < *now {
        let tomorrow = today.checked_add_signed(Duration::days(1))?;
        target = now.timezone().from_local_datetime(&tomorrow).earliest()?;
    }
    Some(target.signed_duration_since(now.clone()))
}

/// Resolves free text to an offset from a reference instant.
///
/// Stateless; the pattern table is compiled once per process and shared.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeExpressionResolver;

impl TimeExpressionResolver {
    pub fn new() -> Self {
        Self
    }

    /// Offset to add to `now` to reach the intended start.
    ///
    /// Never fails: unmatched text, and any match whose captures cannot be
    /// turned into a valid instant, resolve to [`default_offset`].
    pub fn resolve<Tz: TimeZone>(&self, text: &str, now: &DateTime<Tz>) -> Duration {
        let Some((rule, caps)) = RULES
            .iter()
            .find_map(|rule| rule.pattern.captures(text).map(|caps| (rule, caps)))
        else {
            debug!("no time expression found, using default offset");
            return default_offset();
        };

        let offset = (rule.handler)(&caps).and_then(|target| match target {
            TimeTarget::Offset(offset) => Some(offset),
            TimeTarget::ClockTime { hour, minute } => until_clock_time(now, hour, minute),
        });

        match offset.filter(|offset| now.clone().checked_add_signed(*offset).is_some()) {
            Some(offset) => {
                debug!(rule = rule.name, matched = &caps[0], "resolved time expression");
                offset
            }
            None => {
                debug!(rule = rule.name, matched = &caps[0], "unusable time expression, using default offset");
                default_offset()
            }
        }
    }

    /// Removes every recognised time phrase from `text`, leaving the rest
    /// untouched. Used by rule-based extractors to isolate the task.
    pub fn strip_time_phrases(text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut cursor = 0;
        for (start, end) in phrase_spans(text) {
            out.push_str(&text[cursor..start]);
            out.push(' ');
            cursor = end;
        }
        out.push_str(&text[cursor..]);
        out
    }

    /// Every recognised time phrase in `text`, in order of appearance.
    pub fn find_time_phrases(text: &str) -> Vec<String> {
        phrase_spans(text)
            .into_iter()
            .map(|(start, end)| text[start..end].to_string())
            .collect()
    }
}

/// Byte spans of all pattern matches, widened to whole words ("in 2 hour"
/// covers "in 2 hours") and a trailing am/pm, then merged where they overlap.
fn phrase_spans(text: &str) -> Vec<(usize, usize)> {
    let is_word = |c: char| c.is_alphanumeric();
    let mut spans: Vec<(usize, usize)> = RULES
        .iter()
        .flat_map(|rule| rule.pattern.find_iter(text))
        .map(|m| {
            let start = text[..m.start()]
                .char_indices()
                .rev()
                .take_while(|&(_, c)| is_word(c))
                .last()
                .map_or(m.start(), |(i, _)| i);
            let end = text[m.end()..]
                .char_indices()
                .take_while(|&(_, c)| is_word(c))
                .last()
                .map_or(m.end(), |(i, c)| m.end() + i + c.len_utf8());
            let end = TRAILING_MERIDIEM
                .find(&text[end..])
                .map_or(end, |meridiem| end + meridiem.end());
            (start, end)
        })
        .collect();
    spans.sort_unstable();

    let mut merged: Vec<(usize, usize)> = Vec::with_capacity(spans.len());
    for (start, end) in spans {
        match merged.last_mut() {
            Some(last) if start <= last.1 => last.1 = last.1.max(end),
            _ => merged.push((start, end)),
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Utc};

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn relative_offsets() {
        let now = at("2024-01-01T10:00:00Z");
        let r = TimeExpressionResolver::new();
        assert_eq!(r.resolve("call John in 2 hours", &now), Duration::hours(2));
        assert_eq!(r.resolve("stretch in 45 minutes", &now), Duration::minutes(45));
        assert_eq!(r.resolve("check oven in an hour", &now), Duration::hours(1));
        assert_eq!(r.resolve("call mom tomorrow", &now), Duration::days(1));
        assert_eq!(r.resolve("review plan next week", &now), Duration::days(7));
    }

    #[test]
    fn matching_ignores_case() {
        let now = at("2024-01-01T10:00:00Z");
        let r = TimeExpressionResolver::new();
        assert_eq!(r.resolve("Call mom TOMORROW", &now), Duration::days(1));
        assert_eq!(r.resolve("In 3 Hours water plants", &now), Duration::hours(3));
        assert_eq!(r.resolve("gym at 7 PM", &now), Duration::hours(9));
    }

    #[test]
    fn unmatched_text_uses_default() {
        let now = at("2024-01-01T10:00:00Z");
        let r = TimeExpressionResolver::new();
        assert_eq!(r.resolve("buy milk", &now), default_offset());
        assert_eq!(r.resolve("", &now), default_offset());
        assert_eq!(r.resolve("at noon", &now), default_offset());
    }

    #[test]
    fn first_match_wins_over_specificity() {
        let now = at("2024-01-01T10:00:00Z");
        let r = TimeExpressionResolver::new();
        assert_eq!(r.resolve("dentist tomorrow at 9 am", &now), Duration::days(1));
        assert_eq!(r.resolve("next week, in 2 hours", &now), Duration::hours(2));
        assert_eq!(r.resolve("at 14:30 or at 3 pm", &now), Duration::minutes(270));
    }

    #[test]
    fn clock_time_later_today() {
        let now = at("2024-01-01T10:00:00Z");
        let offset = TimeExpressionResolver::new().resolve("meeting at 14:30", &now);
        assert_eq!(now + offset, at("2024-01-01T14:30:00Z"));
    }

    #[test]
    fn clock_time_already_passed_rolls_to_tomorrow() {
        let now = at("2024-01-01T15:00:00Z");
        let offset = TimeExpressionResolver::new().resolve("meeting at 14:30", &now);
        assert_eq!(now + offset, at("2024-01-02T14:30:00Z"));
    }

    #[test]
    fn clock_time_drops_seconds_of_now() {
        let now = at("2024-01-01T10:00:42Z");
        let offset = TimeExpressionResolver::new().resolve("at 11:15", &now);
        assert_eq!(now + offset, at("2024-01-01T11:15:00Z"));
    }

    #[test]
    fn clock_time_equal_to_now_does_not_roll() {
        let now = at("2024-01-01T14:30:00Z");
        let offset = TimeExpressionResolver::new().resolve("at 14:30", &now);
        assert_eq!(offset, Duration::zero());
    }

    #[test]
    fn meridiem_edges() {
        let now = at("2024-01-01T10:00:00Z");
        let r = TimeExpressionResolver::new();
        assert_eq!(now + r.resolve("at 12 pm", &now), at("2024-01-01T12:00:00Z"));
        assert_eq!(now + r.resolve("at 12 am", &now), at("2024-01-02T00:00:00Z"));
        assert_eq!(now + r.resolve("at 1 am", &now), at("2024-01-02T01:00:00Z"));
        assert_eq!(now + r.resolve("at 11 pm", &now), at("2024-01-01T23:00:00Z"));
    }

    #[test]
    fn meridiem_matches_24_hour_form() {
        let now = at("2024-01-01T06:10:00Z");
        let r = TimeExpressionResolver::new();
        assert_eq!(now + r.resolve("at 9 am", &now), now + r.resolve("at 09:00", &now));
        assert_eq!(now + r.resolve("at 9 pm", &now), now + r.resolve("at 21:00", &now));
    }

    #[test]
    fn invalid_captures_fall_back_to_default() {
        let now = at("2024-01-01T10:00:00Z");
        let r = TimeExpressionResolver::new();
        assert_eq!(r.resolve("at 25:00", &now), default_offset());
        assert_eq!(r.resolve("at 10:75", &now), default_offset());
        assert_eq!(r.resolve("at 13 pm", &now), default_offset());
        assert_eq!(r.resolve("at 0 am", &now), default_offset());
        assert_eq!(r.resolve("in 99999999999999999999 hours", &now), default_offset());
        assert_eq!(r.resolve("in 9000000000000 hours", &now), default_offset());
    }

    #[test]
    fn clock_time_uses_zone_of_now() {
        let denver = FixedOffset::west_opt(7 * 3600).unwrap();
        let now = denver.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap();
        let offset = TimeExpressionResolver::new().resolve("standup at 9 am", &now);
        assert_eq!(offset, Duration::hours(1));
    }

    #[test]
    fn strip_widens_to_whole_words() {
        let stripped = TimeExpressionResolver::strip_time_phrases("call John in 2 hours please");
        assert_eq!(
            stripped.split_whitespace().collect::<Vec<_>>(),
            ["call", "John", "please"]
        );
        assert_eq!(
            TimeExpressionResolver::find_time_phrases("water plants in 10 minutes"),
            vec!["in 10 minutes".to_string()]
        );
    }

    #[test]
    fn strip_and_find_time_phrases() {
        let text = "Call John tomorrow at 14:30";
        assert_eq!(
            TimeExpressionResolver::find_time_phrases(text),
            vec!["tomorrow".to_string(), "at 14:30".to_string()]
        );
        let stripped = TimeExpressionResolver::strip_time_phrases(text);
        assert_eq!(stripped.split_whitespace().collect::<Vec<_>>(), ["Call", "John"]);
    }

    #[test]
    fn strip_takes_meridiem_after_24_hour_form() {
        let text = "meeting at 9:30 pm";
        assert_eq!(
            TimeExpressionResolver::find_time_phrases(text),
            vec!["at 9:30 pm".to_string()]
        );
        let stripped = TimeExpressionResolver::strip_time_phrases(text);
        assert_eq!(stripped.split_whitespace().collect::<Vec<_>>(), ["meeting"]);

        let stripped = TimeExpressionResolver::strip_time_phrases("in 2 hours amend the PR");
        assert_eq!(
            stripped.split_whitespace().collect::<Vec<_>>(),
            ["amend", "the", "PR"]
        );
    }
}
