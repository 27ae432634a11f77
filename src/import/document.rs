use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::ImportError;
use crate::date_utils::normalize;
use crate::models::*;

/// A whole calendar as exchanged with users.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportDocument {
    pub providers: Vec<Provider>,
    pub clinic_types: Vec<ClinicType>,
    pub shifts: Vec<ImportShift>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub monthly_notes: Vec<MonthlyNote>,
}

/// Shift as written in an import document. Times are ISO-8601 strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportShift {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub provider_id: String,
    pub clinic_type_id: String,
    pub start_time: String,
    pub end_time: String,
    #[serde(default)]
    pub is_vacation: bool,
    #[serde(default)]
    pub is_recurring: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurrence_pattern: Option<RecurrencePattern>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurrence_end_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub series_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl ImportShift {
    /// Convert to a definition. An absent id stays empty so creation assigns one.
    pub fn to_definition(&self) -> Result<ShiftDefinition, ImportError> {
        let start_date = parse_timestamp("startTime", &self.start_time)?;
        let end_date = parse_timestamp("endTime", &self.end_time)?;

        let kind = match (self.is_recurring, self.recurrence_pattern) {
            (true, Some(pattern)) => ShiftKind::Recurring {
                pattern,
                recurrence_end_date: self
                    .recurrence_end_date
                    .as_deref()
                    .map(|d| parse_timestamp("recurrenceEndDate", d))
                    .transpose()?,
            },
            _ if self.is_vacation => ShiftKind::Vacation,
            _ => ShiftKind::Single,
        };

        Ok(ShiftDefinition {
            id: self.id.clone().unwrap_or_default(),
            provider_id: self.provider_id.clone(),
            clinic_type_id: self.clinic_type_id.clone(),
            start_date,
            end_date,
            kind,
            series_id: self.series_id.clone(),
            notes: self.notes.clone(),
            location: self.location.clone(),
        })
    }

    pub fn from_definition(shift: &ShiftDefinition) -> Self {
        let (is_recurring, recurrence_pattern, recurrence_end_date) = match shift.kind {
            ShiftKind::Recurring {
                pattern,
                recurrence_end_date,
            } => (true, Some(pattern), recurrence_end_date.map(|d| d.to_string())),
            ShiftKind::Single | ShiftKind::Vacation => (false, None, None),
        };
        Self {
            id: Some(shift.id.clone()),
            provider_id: shift.provider_id.clone(),
            clinic_type_id: shift.clinic_type_id.clone(),
            start_time: day_start(shift.start_date),
            end_time: day_start(shift.end_date),
            is_vacation: shift.is_vacation(),
            is_recurring,
            recurrence_pattern,
            recurrence_end_date,
            series_id: shift.series_id.clone(),
            notes: shift.notes.clone(),
            location: shift.location.clone(),
        }
    }
}

fn day_start(date: NaiveDate) -> String {
    format!("{}T00:00:00", date.format("%Y-%m-%d"))
}

/// Parse an ISO-8601 timestamp (with or without offset) or a bare date,
/// collapsing it to its local calendar day.
pub fn parse_timestamp(field: &str, value: &str) -> Result<CalendarDay, ImportError> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Ok(normalize(&ts));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(ts) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(normalize(&ts));
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| ImportError::InvalidTimestamp {
        field: field.into(),
        value: value.into(),
    })
}

/// Validate an import document.
///
/// The whole document is rejected on the first problem; nothing is partially
/// accepted.
pub fn validate_import(json: &str) -> Result<ImportDocument, ImportError> {
    let value: Value = serde_json::from_str(json)?;
    match value {
        Value::Array(_) => return Err(ImportError::TopLevelArray),
        Value::Object(_) => {}
        _ => return Err(ImportError::NotAnObject),
    }

    let document: ImportDocument =
        serde_json::from_value(value).map_err(|e| ImportError::Schema(e.to_string()))?;

    for (index, shift) in document.shifts.iter().enumerate() {
        let definition = shift.to_definition()?;
        if definition.end_date < definition.start_date {
            return Err(ImportError::InvalidRange { index });
        }
        if shift.is_recurring && shift.recurrence_pattern.is_none() {
            tracing::warn!(index, "Imported recurring shift has no pattern, importing as single");
        }
    }

    Ok(document)
}

/// A filled-in example users can edit and import back.
pub fn template_document() -> ImportDocument {
    ImportDocument {
        providers: vec![
            Provider {
                id: "provider-1".into(),
                name: "Dr. Jane Smith".into(),
                credentials: Some("MD".into()),
            },
            Provider {
                id: "provider-2".into(),
                name: "Alex Johnson".into(),
                credentials: Some("NP".into()),
            },
        ],
        clinic_types: vec![
            ClinicType {
                id: "clinic-1".into(),
                name: "Primary Care".into(),
                color: "#2563eb".into(),
            },
            ClinicType {
                id: "clinic-2".into(),
                name: "Urgent Care".into(),
                color: "#dc2626".into(),
            },
        ],
        shifts: vec![
            ImportShift {
                id: None,
                provider_id: "provider-1".into(),
                clinic_type_id: "clinic-1".into(),
                start_time: "2026-03-09T08:00:00".into(),
                end_time: "2026-03-09T17:00:00".into(),
                is_vacation: false,
                is_recurring: true,
                recurrence_pattern: Some(RecurrencePattern::Weekly),
                recurrence_end_date: Some("2026-06-01".into()),
                series_id: None,
                notes: Some("Monday clinic".into()),
                location: Some("Main Campus".into()),
            },
            ImportShift {
                id: None,
                provider_id: "provider-2".into(),
                clinic_type_id: "clinic-2".into(),
                start_time: "2026-03-10T12:00:00".into(),
                end_time: "2026-03-10T20:00:00".into(),
                is_vacation: false,
                is_recurring: false,
                recurrence_pattern: None,
                recurrence_end_date: None,
                series_id: None,
                notes: None,
                location: None,
            },
            ImportShift {
                id: None,
                provider_id: "provider-2".into(),
                clinic_type_id: "clinic-2".into(),
                start_time: "2026-03-15T00:00:00".into(),
                end_time: "2026-03-19T00:00:00".into(),
                is_vacation: true,
                is_recurring: false,
                recurrence_pattern: None,
                recurrence_end_date: None,
                series_id: None,
                notes: Some("Spring break".into()),
                location: None,
            },
        ],
        monthly_notes: vec![MonthlyNote {
            id: String::new(),
            month: "2026-03".into(),
            content: "Quarterly staff meeting on the 20th.".into(),
        }],
    }
}

/// The template rendered as pretty JSON.
pub fn template_json() -> Result<String, ImportError> {
    Ok(serde_json::to_string_pretty(&template_document())?)
}
