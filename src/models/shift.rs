use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::enums::RecurrencePattern;

/// A calendar day with no time-of-day component, in the local calendar.
pub type CalendarDay = NaiveDate;

/// What kind of shift a definition describes.
///
/// Expansion and membership logic match on this instead of probing optional
/// fields, so a recurring shift always carries its pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ShiftKind {
    /// One calendar day.
    Single,
    /// Anchored at `start_date`, repeating by `pattern`.
    Recurring {
        #[serde(rename = "recurrencePattern")]
        pattern: RecurrencePattern,
        /// Exclusive horizon. `None` means one year from the anchor.
        #[serde(rename = "recurrenceEndDate", default)]
        recurrence_end_date: Option<CalendarDay>,
    },
    /// Inclusive `start_date..=end_date` span.
    Vacation,
}

/// The stored, authoritative record of a shift.
///
/// An empty `id` means the record has not been created yet; `create_shift`
/// assigns one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftDefinition {
    #[serde(default)]
    pub id: String,
    pub provider_id: String,
    pub clinic_type_id: String,
    pub start_date: CalendarDay,
    pub end_date: CalendarDay,
    #[serde(flatten)]
    pub kind: ShiftKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub series_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl ShiftDefinition {
    /// A single-day shift with no id yet.
    pub fn single(provider_id: &str, clinic_type_id: &str, date: CalendarDay) -> Self {
        Self {
            id: String::new(),
            provider_id: provider_id.to_string(),
            clinic_type_id: clinic_type_id.to_string(),
            start_date: date,
            end_date: date,
            kind: ShiftKind::Single,
            series_id: None,
            notes: None,
            location: None,
        }
    }

    /// A vacation covering `start..=end`.
    pub fn vacation(
        provider_id: &str,
        clinic_type_id: &str,
        start: CalendarDay,
        end: CalendarDay,
    ) -> Self {
        Self {
            end_date: end,
            kind: ShiftKind::Vacation,
            ..Self::single(provider_id, clinic_type_id, start)
        }
    }

    /// A recurring shift anchored at `start`.
    pub fn recurring(
        provider_id: &str,
        clinic_type_id: &str,
        start: CalendarDay,
        pattern: RecurrencePattern,
        recurrence_end_date: Option<CalendarDay>,
    ) -> Self {
        Self {
            kind: ShiftKind::Recurring {
                pattern,
                recurrence_end_date,
            },
            ..Self::single(provider_id, clinic_type_id, start)
        }
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = id.to_string();
        self
    }

    pub fn has_id(&self) -> bool {
        !self.id.is_empty()
    }

    pub fn is_vacation(&self) -> bool {
        matches!(self.kind, ShiftKind::Vacation)
    }

    pub fn is_recurring(&self) -> bool {
        matches!(self.kind, ShiftKind::Recurring { .. })
    }

    pub fn recurrence_pattern(&self) -> Option<RecurrencePattern> {
        match self.kind {
            ShiftKind::Recurring { pattern, .. } => Some(pattern),
            _ => None,
        }
    }
}

/// A materialized, displayable instance derived from a `ShiftDefinition`.
///
/// Never persisted on its own; recomputed whenever a view needs it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftOccurrence {
    #[serde(flatten)]
    pub shift: ShiftDefinition,
    pub series_index: usize,
    pub is_part_of_series: bool,
}

impl ShiftOccurrence {
    /// The identity expansion of a definition: the record itself.
    pub fn standalone(shift: ShiftDefinition) -> Self {
        Self {
            shift,
            series_index: 0,
            is_part_of_series: false,
        }
    }

    pub fn id(&self) -> &str {
        &self.shift.id
    }

    pub fn date(&self) -> CalendarDay {
        self.shift.start_date
    }

    pub fn series_id(&self) -> Option<&str> {
        self.shift.series_id.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> CalendarDay {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn single_shift_spans_one_day() {
        let shift = ShiftDefinition::single("p1", "c1", d(2026, 3, 9));
        assert_eq!(shift.start_date, shift.end_date);
        assert!(!shift.has_id());
        assert!(!shift.is_recurring());
        assert!(!shift.is_vacation());
    }

    #[test]
    fn recurring_shift_exposes_pattern() {
        let shift = ShiftDefinition::recurring(
            "p1",
            "c1",
            d(2026, 3, 9),
            RecurrencePattern::Weekly,
            None,
        );
        assert!(shift.is_recurring());
        assert_eq!(shift.recurrence_pattern(), Some(RecurrencePattern::Weekly));
    }

    #[test]
    fn definition_serializes_camel_case_with_kind_tag() {
        let shift = ShiftDefinition::recurring(
            "p1",
            "c1",
            d(2026, 3, 9),
            RecurrencePattern::Biweekly,
            Some(d(2026, 6, 1)),
        )
        .with_id("A");
        let json = serde_json::to_value(&shift).unwrap();
        assert_eq!(json["kind"], "recurring");
        assert_eq!(json["recurrencePattern"], "biweekly");
        assert_eq!(json["recurrenceEndDate"], "2026-06-01");
        assert_eq!(json["providerId"], "p1");
        assert_eq!(json["startDate"], "2026-03-09");
        assert!(json.get("seriesId").is_none());

        let back: ShiftDefinition = serde_json::from_value(json).unwrap();
        assert_eq!(back, shift);
    }

    #[test]
    fn occurrence_flattens_definition() {
        let occ = ShiftOccurrence::standalone(
            ShiftDefinition::vacation("p1", "c1", d(2026, 3, 15), d(2026, 3, 19)).with_id("V"),
        );
        let json = serde_json::to_value(&occ).unwrap();
        assert_eq!(json["id"], "V");
        assert_eq!(json["kind"], "vacation");
        assert_eq!(json["seriesIndex"], 0);
        assert_eq!(json["isPartOfSeries"], false);
    }
}
