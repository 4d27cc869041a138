use chrono::{
    DateTime, Datelike, Days, Duration, Local, NaiveDate, NaiveDateTime, NaiveTime, Weekday,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Candidate starts are generated on a fixed 30-minute grid from each window start.
pub const SLOT_STEP_MINUTES: i64 = 30;

/// Longest lesson, requested or booked.
pub const MAX_DURATION_MINUTES: i64 = 24 * 60;

/// Longest lead time a flow may require (90 days).
pub const MAX_LEAD_MINUTES: i64 = 90 * 24 * 60;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SlotError {
    #[error("lesson duration must be 1..=1440 minutes (got {minutes})")]
    InvalidDuration { minutes: i64 },

    #[error("{field} is outside the supported date range")]
    OutOfRange { field: &'static str },

    #[error("malformed {field}: {value:?}")]
    MalformedTime { field: String, value: String },

    #[error("no bookable slots on {date}")]
    NoSlots { date: NaiveDate },

    #[error("no bookable slots in the {days} days from {from}")]
    NoSlotsInHorizon { from: NaiveDate, days: i64 },

    #[error("{proposed} is not a bookable slot")]
    SlotUnavailable { proposed: NaiveDateTime },
}

fn malformed(field: &str, value: &str) -> SlotError {
    SlotError::MalformedTime {
        field: field.to_string(),
        value: value.to_string(),
    }
}

/// How windows from recurring availability and date overrides are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergePolicy {
    /// Plain concatenation; an instant covered by two windows is offered twice.
    #[default]
    Concatenate,
    /// Identical windows and identical start instants collapse to one.
    Dedup,
}

impl MergePolicy {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "concatenate" => Some(Self::Concatenate),
            "dedup" => Some(Self::Dedup),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Concatenate => "concatenate",
            Self::Dedup => "dedup",
        }
    }
}

/// Whether a candidate may run past the end of the window it was generated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitPolicy {
    /// Legacy behavior: a slot starting near the window end is kept even if it overhangs.
    Overhang,
    #[default]
    WithinWindow,
}

impl FitPolicy {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "overhang" => Some(Self::Overhang),
            "within_window" => Some(Self::WithinWindow),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Overhang => "overhang",
            Self::WithinWindow => "within_window",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecurringWindow {
    pub day_of_week: Weekday,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub is_available: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverrideWindow {
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub is_available: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookedLesson {
    pub start: NaiveDateTime,
    pub duration_minutes: i64,
}

impl BookedLesson {
    /// `None` when the end does not fit in a `NaiveDateTime`.
    pub fn end(&self) -> Option<NaiveDateTime> {
        Duration::try_minutes(self.duration_minutes).and_then(|d| self.start.checked_add_signed(d))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Window {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Slot {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl Slot {
    /// Half-open intersection: touching intervals do not overlap.
    pub fn overlaps(&self, lesson: &BookedLesson) -> bool {
        let before_end = lesson.end().map_or(true, |end| self.start < end);
        before_end && self.end > lesson.start
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotQuery {
    pub date: NaiveDate,
    pub duration_minutes: i64,
    pub now: NaiveDateTime,
    pub lead_time: Duration,
    pub merge: MergePolicy,
    pub fit: FitPolicy,
}

impl SlotQuery {
    /// Earliest bookable start. A slot starting exactly at the cutoff is bookable.
    pub fn cutoff(&self) -> Result<NaiveDateTime, SlotError> {
        self.now
            .checked_add_signed(self.lead_time)
            .ok_or(SlotError::OutOfRange { field: "now" })
    }

    pub fn on(self, date: NaiveDate) -> Self {
        Self { date, ..self }
    }
}

/// Accepts `HH:MM` and `HH:MM:SS` (database `time` columns carry seconds).
pub fn parse_time_of_day(field: &str, raw: &str) -> Result<NaiveTime, SlotError> {
    let s = raw.trim();
    NaiveTime::parse_from_str(s, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
        .map_err(|_| malformed(field, raw))
}

pub fn parse_date(field: &str, raw: &str) -> Result<NaiveDate, SlotError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| malformed(field, raw))
}

/// Local wall-clock date-time. Input carrying an offset (RFC 3339, backend `timestamptz`) is
/// converted to the sidecar's local zone, the same frame as the default `now`.
pub fn parse_date_time(field: &str, raw: &str) -> Result<NaiveDateTime, SlotError> {
    let s = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Local).naive_local());
    }
    const FORMATS: [&str; 5] = [
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
    ];
    FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .ok_or_else(|| malformed(field, raw))
}

/// Day index as stored by the booking backend: 0 = Sunday .. 6 = Saturday.
pub fn weekday_from_index(idx: i64) -> Option<Weekday> {
    match idx {
        0 => Some(Weekday::Sun),
        1 => Some(Weekday::Mon),
        2 => Some(Weekday::Tue),
        3 => Some(Weekday::Wed),
        4 => Some(Weekday::Thu),
        5 => Some(Weekday::Fri),
        6 => Some(Weekday::Sat),
        _ => None,
    }
}

/// Windows that apply to `date`: matching recurring rows first, then that date's overrides.
/// Entries flagged unavailable contribute nothing.
pub fn windows_for_date(
    recurring: &[RecurringWindow],
    overrides: &[OverrideWindow],
    date: NaiveDate,
    merge: MergePolicy,
) -> Vec<Window> {
    let weekday = date.weekday();
    let from_recurring = recurring
        .iter()
        .filter(|w| w.is_available && w.day_of_week == weekday)
        .map(|w| Window {
            start: date.and_time(w.start_time),
            end: date.and_time(w.end_time),
        });
    let from_overrides = overrides
        .iter()
        .filter(|w| w.is_available && w.date == date)
        .map(|w| Window {
            start: date.and_time(w.start_time),
            end: date.and_time(w.end_time),
        });

    let mut out: Vec<Window> = from_recurring.chain(from_overrides).collect();
    if merge == MergePolicy::Dedup {
        let mut seen = Vec::with_capacity(out.len());
        out.retain(|w| {
            if seen.contains(w) {
                false
            } else {
                seen.push(*w);
                true
            }
        });
    }
    out
}

fn candidates(
    windows: &[Window],
    duration: Duration,
    fit: FitPolicy,
) -> Result<Vec<Slot>, SlotError> {
    let step = Duration::minutes(SLOT_STEP_MINUTES);
    let mut out = Vec::new();
    for w in windows {
        let mut start = w.start;
        while start < w.end {
            match (fit, start.checked_add_signed(duration)) {
                (FitPolicy::Overhang, Some(end)) => out.push(Slot { start, end }),
                (FitPolicy::Overhang, None) => return Err(SlotError::OutOfRange { field: "date" }),
                (FitPolicy::WithinWindow, Some(end)) if end <= w.end => {
                    out.push(Slot { start, end })
                }
                (FitPolicy::WithinWindow, _) => break,
            }
            let Some(next) = start.checked_add_signed(step) else {
                break;
            };
            start = next;
        }
    }
    Ok(out)
}

fn checked_duration(minutes: i64) -> Result<Duration, SlotError> {
    if !(1..=MAX_DURATION_MINUTES).contains(&minutes) {
        return Err(SlotError::InvalidDuration { minutes });
    }
    Ok(Duration::minutes(minutes))
}

/// Bookable starts for `query.date`, ascending.
///
/// Candidates are walked from every applicable window, then dropped if they start before
/// `now + lead_time` or intersect an already booked lesson. An empty result is reported as
/// [`SlotError::NoSlots`] so callers can tell "nothing free" apart from bad input.
pub fn derive_slots(
    recurring: &[RecurringWindow],
    overrides: &[OverrideWindow],
    booked: &[BookedLesson],
    query: &SlotQuery,
) -> Result<Vec<Slot>, SlotError> {
    let duration = checked_duration(query.duration_minutes)?;
    for b in booked {
        checked_duration(b.duration_minutes)?;
    }

    let windows = windows_for_date(recurring, overrides, query.date, query.merge);
    let cutoff = query.cutoff()?;

    let mut slots: Vec<Slot> = candidates(&windows, duration, query.fit)?
        .into_iter()
        .filter(|s| s.start >= cutoff)
        .filter(|s| !booked.iter().any(|b| s.overlaps(b)))
        .collect();
    slots.sort_by_key(|s| s.start);
    if query.merge == MergePolicy::Dedup {
        slots.dedup_by_key(|s| s.start);
    }

    if slots.is_empty() {
        return Err(SlotError::NoSlots { date: query.date });
    }
    Ok(slots)
}

/// First day from `query.date` (inclusive) within `horizon_days` that has any bookable slot.
pub fn next_available(
    recurring: &[RecurringWindow],
    overrides: &[OverrideWindow],
    booked: &[BookedLesson],
    query: &SlotQuery,
    horizon_days: i64,
) -> Result<(NaiveDate, Vec<Slot>), SlotError> {
    for offset in 0..horizon_days.max(0) as u64 {
        let date = query
            .date
            .checked_add_days(Days::new(offset))
            .ok_or(SlotError::OutOfRange { field: "fromDate" })?;
        match derive_slots(recurring, overrides, booked, &query.on(date)) {
            Ok(slots) => return Ok((date, slots)),
            Err(SlotError::NoSlots { .. }) => continue,
            Err(e) => return Err(e),
        }
    }
    Err(SlotError::NoSlotsInHorizon {
        from: query.date,
        days: horizon_days,
    })
}

/// The reschedule screen only accepts a start that is one of the derived slots.
pub fn check_proposed_start(slots: &[Slot], proposed: NaiveDateTime) -> Result<Slot, SlotError> {
    slots
        .iter()
        .find(|s| s.start == proposed)
        .copied()
        .ok_or(SlotError::SlotUnavailable { proposed })
}
