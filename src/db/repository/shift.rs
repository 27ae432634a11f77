use std::str::FromStr;

use chrono::NaiveDate;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use crate::db::DatabaseError;
use crate::models::*;
use crate::shifts::ShiftStore;

const SHIFT_COLUMNS: &str = "id, provider_id, clinic_type_id, start_date, end_date, is_vacation,
     is_recurring, recurrence_pattern, recurrence_end_date, series_id, notes, location";

/// Flat record shape used at the persistence boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftRow {
    pub id: String,
    pub provider_id: String,
    pub clinic_type_id: String,
    pub start_date: String,
    pub end_date: String,
    pub is_vacation: bool,
    pub is_recurring: bool,
    pub recurrence_pattern: Option<String>,
    pub recurrence_end_date: Option<String>,
    pub series_id: Option<String>,
    pub notes: Option<String>,
    pub location: Option<String>,
}

impl From<&ShiftDefinition> for ShiftRow {
    fn from(shift: &ShiftDefinition) -> Self {
        let (is_recurring, recurrence_pattern, recurrence_end_date) = match &shift.kind {
            ShiftKind::Recurring {
                pattern,
                recurrence_end_date,
            } => (
                true,
                Some(pattern.as_str().to_string()),
                recurrence_end_date.map(|d| d.to_string()),
            ),
            ShiftKind::Single | ShiftKind::Vacation => (false, None, None),
        };
        Self {
            id: shift.id.clone(),
            provider_id: shift.provider_id.clone(),
            clinic_type_id: shift.clinic_type_id.clone(),
            start_date: shift.start_date.to_string(),
            end_date: shift.end_date.to_string(),
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

impl ShiftRow {
    /// Translate the flat record into a definition.
    ///
    /// A row flagged recurring without a pattern is read as a plain shift so
    /// it still expands to itself.
    pub fn into_definition(self) -> Result<ShiftDefinition, DatabaseError> {
        let start_date = parse_date("start_date", &self.start_date)?;
        let end_date = parse_date("end_date", &self.end_date)?;

        let kind = match (self.is_recurring, self.recurrence_pattern.as_deref()) {
            (true, Some(pattern)) => ShiftKind::Recurring {
                pattern: RecurrencePattern::from_str(pattern)?,
                recurrence_end_date: self
                    .recurrence_end_date
                    .as_deref()
                    .map(|d| parse_date("recurrence_end_date", d))
                    .transpose()?,
            },
            (true, None) => {
                tracing::warn!(id = %self.id, "Recurring shift without pattern, treating as single");
                if self.is_vacation {
                    ShiftKind::Vacation
                } else {
                    ShiftKind::Single
                }
            }
            (false, _) if self.is_vacation => ShiftKind::Vacation,
            (false, _) => ShiftKind::Single,
        };

        Ok(ShiftDefinition {
            id: self.id,
            provider_id: self.provider_id,
            clinic_type_id: self.clinic_type_id,
            start_date,
            end_date,
            kind,
            series_id: self.series_id,
            notes: self.notes,
            location: self.location,
        })
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            provider_id: row.get(1)?,
            clinic_type_id: row.get(2)?,
            start_date: row.get(3)?,
            end_date: row.get(4)?,
            is_vacation: row.get::<_, i32>(5)? != 0,
            is_recurring: row.get::<_, i32>(6)? != 0,
            recurrence_pattern: row.get(7)?,
            recurrence_end_date: row.get(8)?,
            series_id: row.get(9)?,
            notes: row.get(10)?,
            location: row.get(11)?,
        })
    }
}

fn parse_date(field: &str, value: &str) -> Result<NaiveDate, DatabaseError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| DatabaseError::InvalidDate {
        field: field.into(),
        value: value.into(),
    })
}

/// `YYYY-MM` prefix for the month containing `date`, as used by change-feed filters.
pub fn month_prefix(date: NaiveDate) -> String {
    date.format("%Y-%m").to_string()
}

pub fn insert_shift_record(conn: &Connection, shift: &ShiftDefinition) -> Result<(), DatabaseError> {
    let row = ShiftRow::from(shift);
    conn.execute(
        "INSERT INTO shifts (id, provider_id, clinic_type_id, start_date, end_date, is_vacation,
         is_recurring, recurrence_pattern, recurrence_end_date, series_id, notes, location)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            row.id,
            row.provider_id,
            row.clinic_type_id,
            row.start_date,
            row.end_date,
            row.is_vacation as i32,
            row.is_recurring as i32,
            row.recurrence_pattern,
            row.recurrence_end_date,
            row.series_id,
            row.notes,
            row.location,
        ],
    )?;
    Ok(())
}

pub fn get_shift_record(conn: &Connection, id: &str) -> Result<Option<ShiftDefinition>, DatabaseError> {
    let row = conn
        .query_row(
            &format!("SELECT {SHIFT_COLUMNS} FROM shifts WHERE id = ?1"),
            params![id],
            ShiftRow::from_row,
        )
        .optional()?;
    row.map(ShiftRow::into_definition).transpose()
}

/// Returns `false` when no row has `shift.id`.
pub fn update_shift_record(conn: &Connection, shift: &ShiftDefinition) -> Result<bool, DatabaseError> {
    let row = ShiftRow::from(shift);
    let changed = conn.execute(
        "UPDATE shifts SET provider_id = ?2, clinic_type_id = ?3, start_date = ?4, end_date = ?5,
         is_vacation = ?6, is_recurring = ?7, recurrence_pattern = ?8, recurrence_end_date = ?9,
         series_id = ?10, notes = ?11, location = ?12, updated_at = datetime('now')
         WHERE id = ?1",
        params![
            row.id,
            row.provider_id,
            row.clinic_type_id,
            row.start_date,
            row.end_date,
            row.is_vacation as i32,
            row.is_recurring as i32,
            row.recurrence_pattern,
            row.recurrence_end_date,
            row.series_id,
            row.notes,
            row.location,
        ],
    )?;
    Ok(changed > 0)
}

/// Returns `false` when no row has `id`.
pub fn delete_shift_record(conn: &Connection, id: &str) -> Result<bool, DatabaseError> {
    let changed = conn.execute("DELETE FROM shifts WHERE id = ?1", params![id])?;
    Ok(changed > 0)
}

pub fn list_shift_records(
    conn: &Connection,
    filter: &ShiftFilter,
) -> Result<Vec<ShiftDefinition>, DatabaseError> {
    let mut clauses: Vec<String> = Vec::new();
    let mut values: Vec<String> = Vec::new();

    if let Some(prefix) = &filter.date_prefix {
        // Literal prefix match; `%` and `_` carry no meaning here.
        values.push(prefix.clone());
        let n = values.len();
        clauses.push(format!("substr(start_date, 1, length(?{n})) = ?{n}"));
    }
    if let Some(provider_id) = &filter.provider_id {
        values.push(provider_id.clone());
        clauses.push(format!("provider_id = ?{}", values.len()));
    }
    if let Some(clinic_type_id) = &filter.clinic_type_id {
        values.push(clinic_type_id.clone());
        clauses.push(format!("clinic_type_id = ?{}", values.len()));
    }
    if let Some(series_id) = &filter.series_id {
        values.push(series_id.clone());
        clauses.push(format!("series_id = ?{}", values.len()));
    }

    let where_clause = if clauses.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", clauses.join(" AND "))
    };
    let sql = format!("SELECT {SHIFT_COLUMNS} FROM shifts{where_clause} ORDER BY start_date, id");

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(values.iter()), ShiftRow::from_row)?;

    let mut shifts = Vec::new();
    for row in rows {
        shifts.push(row?.into_definition()?);
    }
    Ok(shifts)
}

/// SQLite-backed shift store.
pub struct SqliteShiftStore {
    conn: Connection,
}

impl SqliteShiftStore {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl ShiftStore for SqliteShiftStore {
    fn list(&self, filter: &ShiftFilter) -> Result<Vec<ShiftDefinition>, DatabaseError> {
        list_shift_records(&self.conn, filter)
    }

    fn get(&self, id: &str) -> Result<Option<ShiftDefinition>, DatabaseError> {
        get_shift_record(&self.conn, id)
    }

    fn insert(&self, shift: &ShiftDefinition) -> Result<(), DatabaseError> {
        insert_shift_record(&self.conn, shift)
    }

    fn update(&self, shift: &ShiftDefinition) -> Result<bool, DatabaseError> {
        update_shift_record(&self.conn, shift)
    }

    fn delete(&self, id: &str) -> Result<bool, DatabaseError> {
        delete_shift_record(&self.conn, id)
    }

    fn apply_batch(
        &self,
        delete: &[String],
        insert: &[ShiftDefinition],
    ) -> Result<Vec<String>, DatabaseError> {
        let tx = self.conn.unchecked_transaction()?;
        let mut deleted = Vec::new();
        for id in delete {
            if delete_shift_record(&tx, id)? {
                deleted.push(id.clone());
            }
        }
        for shift in insert {
            insert_shift_record(&tx, shift)?;
        }
        tx.commit()?;
        Ok(deleted)
    }
}
