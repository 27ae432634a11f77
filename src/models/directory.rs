use serde::{Deserialize, Serialize};

/// A provider that can be scheduled onto shifts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Provider {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials: Option<String>,
}

/// A clinic type a shift is worked in (e.g. urgent care, telehealth).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClinicType {
    pub id: String,
    pub name: String,
    /// CSS colour used by the calendar grid.
    pub color: String,
}

/// Free-text note attached to a calendar month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyNote {
    #[serde(default)]
    pub id: String,
    /// `YYYY-MM`
    pub month: String,
    pub content: String,
}
