//! Date engine for shifts: day normalization, recurrence generation,
//! occurrence membership and recurring-shift expansion.
//!
//! Everything here is pure. Callers own filtering, persistence and logging.

use chrono::{DateTime, Days, Local, NaiveDate, NaiveDateTime, TimeZone};
use uuid::Uuid;

use crate::models::{CalendarDay, RecurrencePattern, ShiftDefinition, ShiftKind, ShiftOccurrence};

/// Recurrences without an explicit end stop this many days after the anchor.
pub const DEFAULT_HORIZON_DAYS: u64 = 365;

/// Upper bound on generated dates for a single recurrence.
pub const DEFAULT_MAX_OCCURRENCES: usize = 100;

/// Namespace for series ids derived from a shift id.
const SERIES_NAMESPACE: Uuid = Uuid::from_u128(0x6f1c_52a4_9e3b_4d7a_8c21_0b5e_f4a9_d3c7);

// ═══════════════════════════════════════════
// Normalization
// ═══════════════════════════════════════════

/// Anything that can be collapsed onto a local calendar day.
pub trait IntoCalendarDay {
    fn calendar_day(&self) -> CalendarDay;
}

impl IntoCalendarDay for NaiveDate {
    fn calendar_day(&self) -> CalendarDay {
        *self
    }
}

impl IntoCalendarDay for NaiveDateTime {
    fn calendar_day(&self) -> CalendarDay {
        self.date()
    }
}

impl<Tz: TimeZone> IntoCalendarDay for DateTime<Tz> {
    fn calendar_day(&self) -> CalendarDay {
        self.with_timezone(&Local).date_naive()
    }
}

/// Strip the time-of-day from a timestamp. Idempotent.
pub fn normalize<T: IntoCalendarDay + ?Sized>(value: &T) -> CalendarDay {
    value.calendar_day()
}

// ═══════════════════════════════════════════
// Recurrence generation
// ═══════════════════════════════════════════

/// A finite, restartable sequence of occurrence dates.
///
/// Holds only the recurrence parameters; each call to [`OccurrenceDates::iter`]
/// starts again from the anchor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OccurrenceDates {
    start: CalendarDay,
    horizon: CalendarDay,
    pattern: RecurrencePattern,
    max_occurrences: usize,
}

impl OccurrenceDates {
    pub fn start(&self) -> CalendarDay {
        self.start
    }

    /// Exclusive upper bound for every date after the anchor.
    pub fn horizon(&self) -> CalendarDay {
        self.horizon
    }

    pub fn max_occurrences(&self) -> usize {
        self.max_occurrences
    }

    pub fn iter(&self) -> OccurrenceIter {
        OccurrenceIter {
            next: Some(self.start),
            horizon: self.horizon,
            step: Days::new(self.pattern.step_days()),
            remaining: self.max_occurrences,
            at_anchor: true,
        }
    }

    pub fn to_vec(&self) -> Vec<CalendarDay> {
        self.iter().collect()
    }
}

impl<'a> IntoIterator for &'a OccurrenceDates {
    type Item = CalendarDay;
    type IntoIter = OccurrenceIter;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over [`OccurrenceDates`].
#[derive(Debug, Clone)]
pub struct OccurrenceIter {
    next: Option<CalendarDay>,
    horizon: CalendarDay,
    step: Days,
    remaining: usize,
    at_anchor: bool,
}

impl Iterator for OccurrenceIter {
    type Item = CalendarDay;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let current = self.next?;
        // The anchor is always emitted; later dates must fall strictly before the horizon.
        if !self.at_anchor && current >= self.horizon {
            self.next = None;
            return None;
        }
        self.at_anchor = false;
        self.remaining -= 1;
        self.next = current.checked_add_days(self.step);
        Some(current)
    }
}

/// Build the occurrence dates for a recurrence anchored at `start`.
///
/// The horizon is `end` when given, otherwise `start` plus
/// [`DEFAULT_HORIZON_DAYS`]. The horizon date itself is never produced.
/// At most `max_occurrences` dates are produced; callers detect truncation
/// by comparing the count against the cap.
pub fn generate_occurrence_dates(
    start: CalendarDay,
    end: Option<CalendarDay>,
    pattern: RecurrencePattern,
    max_occurrences: usize,
) -> OccurrenceDates {
    let start = normalize(&start);
    let horizon = match end {
        Some(end) => normalize(&end),
        None => default_horizon(start),
    };
    OccurrenceDates {
        start,
        horizon,
        pattern,
        max_occurrences,
    }
}

fn default_horizon(start: CalendarDay) -> CalendarDay {
    start
        .checked_add_days(Days::new(DEFAULT_HORIZON_DAYS))
        .unwrap_or(NaiveDate::MAX)
}

// ═══════════════════════════════════════════
// Membership
// ═══════════════════════════════════════════

/// Whether `shift` is active on `date`.
///
/// Single-day records match on equality; spans (vacations) match when
/// `start_date <= date <= end_date`.
pub fn occurs_on(shift: &ShiftDefinition, date: CalendarDay) -> bool {
    let start = normalize(&shift.start_date);
    let end = normalize(&shift.end_date);
    let date = normalize(&date);

    if start == end {
        date == start
    } else {
        start <= date && date <= end
    }
}

// ═══════════════════════════════════════════
// Expansion
// ═══════════════════════════════════════════

/// Expand a definition into its occurrences, capped at [`DEFAULT_MAX_OCCURRENCES`].
pub fn expand_shift(base: &ShiftDefinition) -> Vec<ShiftOccurrence> {
    expand_shift_with(base, DEFAULT_MAX_OCCURRENCES)
}

/// Expand a definition into its occurrences.
///
/// Non-recurring definitions expand to themselves. Recurring ones produce one
/// occurrence per generated date; occurrence `0` keeps the base id and later
/// ones are `"{id}-{index}"`, so repeated expansions yield identical records.
pub fn expand_shift_with(base: &ShiftDefinition, max_occurrences: usize) -> Vec<ShiftOccurrence> {
    let (pattern, recurrence_end_date) = match base.kind {
        ShiftKind::Recurring {
            pattern,
            recurrence_end_date,
        } => (pattern, recurrence_end_date),
        ShiftKind::Single | ShiftKind::Vacation => {
            let is_part_of_series = base.series_id.is_some();
            return vec![ShiftOccurrence {
                is_part_of_series,
                ..ShiftOccurrence::standalone(base.clone())
            }];
        }
    };

    let series_id = base
        .series_id
        .clone()
        .unwrap_or_else(|| synthesize_series_id(&base.id));

    generate_occurrence_dates(
        normalize(&base.start_date),
        recurrence_end_date.map(|d| normalize(&d)),
        pattern,
        max_occurrences,
    )
    .iter()
    .enumerate()
    .map(|(index, date)| ShiftOccurrence {
        shift: ShiftDefinition {
            id: occurrence_id(&base.id, index),
            start_date: date,
            end_date: date,
            series_id: Some(series_id.clone()),
            ..base.clone()
        },
        series_index: index,
        is_part_of_series: true,
    })
    .collect()
}

/// Identifier of the `index`-th occurrence of the shift `base_id`.
pub fn occurrence_id(base_id: &str, index: usize) -> String {
    if index == 0 {
        base_id.to_string()
    } else {
        format!("{base_id}-{index}")
    }
}

/// Inverse of [`occurrence_id`] for later occurrences: `"A-3"` gives
/// `("A", 3)`. The anchor id is the base id itself, so it never parses.
pub fn parse_occurrence_id(id: &str) -> Option<(&str, usize)> {
    let (base_id, index) = id.rsplit_once('-')?;
    let index: usize = index.parse().ok()?;
    if base_id.is_empty() || index == 0 || occurrence_id(base_id, index) != id {
        return None;
    }
    Some((base_id, index))
}

/// Series id for a recurring definition that was stored without one.
///
/// Derived from the shift id so every expansion of the same record agrees.
/// Records without an id get a random series.
pub fn synthesize_series_id(shift_id: &str) -> String {
    if shift_id.is_empty() {
        Uuid::new_v4().to_string()
    } else {
        Uuid::new_v5(&SERIES_NAMESPACE, shift_id.as_bytes()).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    fn d(y: i32, m: u32, day: u32) -> CalendarDay {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn dates(start: CalendarDay, end: Option<CalendarDay>, p: RecurrencePattern) -> Vec<CalendarDay> {
        generate_occurrence_dates(start, end, p, DEFAULT_MAX_OCCURRENCES).to_vec()
    }

    // ───────────────────────────────────────
    // normalize
    // ───────────────────────────────────────

    #[test]
    fn normalize_strips_time_of_day() {
        let ts = d(2026, 3, 9).and_time(NaiveTime::from_hms_opt(17, 45, 12).unwrap());
        assert_eq!(normalize(&ts), d(2026, 3, 9));
    }

    #[test]
    fn normalize_is_idempotent() {
        let ts = d(2026, 3, 9).and_hms_opt(8, 0, 0).unwrap();
        let once = normalize(&ts);
        assert_eq!(normalize(&once), once);
    }

    #[test]
    fn normalize_local_timestamp_keeps_local_day() {
        let local = Local.with_ymd_and_hms(2026, 3, 9, 23, 30, 0).unwrap();
        assert_eq!(normalize(&local), d(2026, 3, 9));
    }

    // ───────────────────────────────────────
    // generate_occurrence_dates
    // ───────────────────────────────────────

    #[test]
    fn weekly_stops_before_horizon() {
        let got = dates(d(2026, 3, 9), Some(d(2026, 3, 19)), RecurrencePattern::Weekly);
        assert_eq!(got, vec![d(2026, 3, 9), d(2026, 3, 16)]);
    }

    #[test]
    fn horizon_date_itself_is_excluded() {
        let got = dates(d(2026, 3, 16), Some(d(2026, 3, 19)), RecurrencePattern::Daily);
        assert_eq!(got, vec![d(2026, 3, 16), d(2026, 3, 17), d(2026, 3, 18)]);
    }

    #[test]
    fn anchor_is_first_even_when_horizon_equals_start() {
        let got = dates(d(2026, 3, 9), Some(d(2026, 3, 9)), RecurrencePattern::Daily);
        assert_eq!(got, vec![d(2026, 3, 9)]);
    }

    #[test]
    fn dates_strictly_increase_by_pattern_step() {
        for pattern in [
            RecurrencePattern::Daily,
            RecurrencePattern::Weekly,
            RecurrencePattern::Biweekly,
        ] {
            let got = dates(d(2026, 1, 1), None, pattern);
            assert_eq!(got[0], d(2026, 1, 1));
            for pair in got.windows(2) {
                assert_eq!(
                    pair[1],
                    pair[0].checked_add_days(Days::new(pattern.step_days())).unwrap()
                );
            }
        }
    }

    #[test]
    fn default_horizon_is_one_year() {
        let start = d(2026, 1, 5);
        let seq = generate_occurrence_dates(start, None, RecurrencePattern::Weekly, 1000);
        assert_eq!(seq.horizon(), d(2027, 1, 5));
        let got = seq.to_vec();
        // 2026-01-05 + 52 weeks = 2027-01-04, still before the horizon.
        assert_eq!(got.len(), 53);
        assert!(got.iter().all(|day| *day < seq.horizon()));
    }

    #[test]
    fn cap_limits_daily_default_horizon() {
        let got = dates(d(2026, 1, 1), None, RecurrencePattern::Daily);
        assert_eq!(got.len(), DEFAULT_MAX_OCCURRENCES);
        assert_eq!(got.last().copied(), Some(d(2026, 4, 10)));
    }

    #[test]
    fn zero_cap_produces_nothing() {
        let seq = generate_occurrence_dates(d(2026, 1, 1), None, RecurrencePattern::Daily, 0);
        assert_eq!(seq.iter().count(), 0);
    }

    #[test]
    fn biweekly_crosses_month_and_year_boundaries() {
        let got = dates(d(2025, 12, 22), Some(d(2026, 2, 1)), RecurrencePattern::Biweekly);
        assert_eq!(got, vec![d(2025, 12, 22), d(2026, 1, 5), d(2026, 1, 19)]);
    }

    #[test]
    fn sequence_is_restartable() {
        let seq = generate_occurrence_dates(
            d(2026, 3, 1),
            Some(d(2026, 3, 29)),
            RecurrencePattern::Weekly,
            DEFAULT_MAX_OCCURRENCES,
        );
        let first: Vec<_> = seq.iter().collect();
        let second: Vec<_> = (&seq).into_iter().collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 4);
    }

    #[test]
    fn explicit_end_is_not_clipped_to_default_horizon() {
        // An explicit end replaces the one-year horizon; only the cap bounds it.
        let got = dates(d(2026, 1, 5), Some(d(2028, 1, 3)), RecurrencePattern::Weekly);
        assert_eq!(got.len(), DEFAULT_MAX_OCCURRENCES);
        assert_eq!(got.last().copied(), Some(d(2027, 11, 29)));
    }

    #[test]
    fn horizon_before_start_yields_only_anchor() {
        let got = dates(d(2026, 3, 9), Some(d(2026, 3, 1)), RecurrencePattern::Daily);
        assert_eq!(got, vec![d(2026, 3, 9)]);
    }

    // ───────────────────────────────────────
    // occurs_on
    // ───────────────────────────────────────

    #[test]
    fn vacation_span_is_inclusive() {
        let vacation = ShiftDefinition::vacation("p1", "c1", d(2026, 3, 15), d(2026, 3, 19));
        for day in 15..=19 {
            assert!(occurs_on(&vacation, d(2026, 3, day)), "day {day}");
        }
        assert!(!occurs_on(&vacation, d(2026, 3, 14)));
        assert!(!occurs_on(&vacation, d(2026, 3, 20)));
    }

    #[test]
    fn single_day_matches_exact_date_only() {
        let shift = ShiftDefinition::single("p1", "c1", d(2026, 3, 9));
        assert!(occurs_on(&shift, d(2026, 3, 9)));
        assert!(!occurs_on(&shift, d(2026, 3, 8)));
        assert!(!occurs_on(&shift, d(2026, 3, 10)));
    }

    #[test]
    fn inverted_span_never_matches() {
        let mut shift = ShiftDefinition::vacation("p1", "c1", d(2026, 3, 19), d(2026, 3, 15));
        assert!(!occurs_on(&shift, d(2026, 3, 17)));
        shift.end_date = shift.start_date;
        assert!(occurs_on(&shift, d(2026, 3, 19)));
    }

    // ───────────────────────────────────────
    // expand_shift
    // ───────────────────────────────────────

    #[test]
    fn non_recurring_expands_to_itself() {
        let single = ShiftDefinition::single("p1", "c1", d(2026, 3, 9)).with_id("S");
        let vacation =
            ShiftDefinition::vacation("p1", "c1", d(2026, 3, 15), d(2026, 3, 19)).with_id("V");
        for shift in [single, vacation] {
            let expanded = expand_shift(&shift);
            assert_eq!(expanded.len(), 1);
            assert_eq!(expanded[0].shift, shift);
            assert_eq!(expanded[0].series_index, 0);
            assert!(!expanded[0].is_part_of_series);
        }
    }

    #[test]
    fn stored_series_member_expands_to_itself_flagged_in_series() {
        let mut member = ShiftDefinition::single("p1", "c1", d(2026, 3, 17)).with_id("A-1");
        member.series_id = Some("series-1".into());
        let expanded = expand_shift(&member);
        assert_eq!(expanded.len(), 1);
        assert_eq!(expanded[0].shift, member);
        assert!(expanded[0].is_part_of_series);
    }

    #[test]
    fn daily_expansion_assigns_ids_and_indices() {
        let base = ShiftDefinition::recurring(
            "p1",
            "c1",
            d(2026, 3, 16),
            RecurrencePattern::Daily,
            Some(d(2026, 3, 19)),
        )
        .with_id("A");

        let expanded = expand_shift(&base);
        let ids: Vec<_> = expanded.iter().map(|o| o.id().to_string()).collect();
        let days: Vec<_> = expanded.iter().map(|o| o.date()).collect();
        let indices: Vec<_> = expanded.iter().map(|o| o.series_index).collect();

        assert_eq!(ids, vec!["A", "A-1", "A-2"]);
        assert_eq!(days, vec![d(2026, 3, 16), d(2026, 3, 17), d(2026, 3, 18)]);
        assert_eq!(indices, vec![0, 1, 2]);

        let series = expanded[0].series_id().unwrap().to_string();
        for occ in &expanded {
            assert_eq!(occ.series_id(), Some(series.as_str()));
            assert_eq!(occ.shift.start_date, occ.shift.end_date);
            assert!(occ.is_part_of_series);
            assert_eq!(occ.shift.provider_id, "p1");
        }
    }

    #[test]
    fn expansion_reuses_existing_series_id() {
        let mut base = ShiftDefinition::recurring(
            "p1",
            "c1",
            d(2026, 3, 2),
            RecurrencePattern::Weekly,
            Some(d(2026, 3, 30)),
        )
        .with_id("W");
        base.series_id = Some("existing-series".into());

        let expanded = expand_shift(&base);
        assert_eq!(expanded.len(), 4);
        assert!(expanded
            .iter()
            .all(|o| o.series_id() == Some("existing-series")));
    }

    #[test]
    fn expansion_is_idempotent() {
        let base = ShiftDefinition::recurring(
            "p1",
            "c1",
            d(2026, 3, 2),
            RecurrencePattern::Biweekly,
            None,
        )
        .with_id("B");
        assert_eq!(expand_shift(&base), expand_shift(&base));
    }

    #[test]
    fn expansion_honours_custom_cap() {
        let base = ShiftDefinition::recurring("p1", "c1", d(2026, 1, 1), RecurrencePattern::Daily, None)
            .with_id("D");
        assert_eq!(expand_shift_with(&base, 5).len(), 5);
    }

    #[test]
    fn occurrence_ids_parse_back_to_base_and_index() {
        assert_eq!(parse_occurrence_id("A-3"), Some(("A", 3)));
        assert_eq!(parse_occurrence_id(&occurrence_id("day-shift", 12)), Some(("day-shift", 12)));
        assert_eq!(parse_occurrence_id("A"), None);
        assert_eq!(parse_occurrence_id("A-0"), None);
        assert_eq!(parse_occurrence_id("A-03"), None);
        assert_eq!(parse_occurrence_id("A-x"), None);
        assert_eq!(parse_occurrence_id("-4"), None);
    }

    #[test]
    fn synthesized_series_id_is_stable_per_shift() {
        assert_eq!(synthesize_series_id("A"), synthesize_series_id("A"));
        assert_ne!(synthesize_series_id("A"), synthesize_series_id("B"));
        assert_ne!(synthesize_series_id(""), synthesize_series_id(""));
    }
}
