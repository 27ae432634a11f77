use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::document::{ImportDocument, ImportShift};
use super::ImportError;
use crate::db::repository;
use crate::db::DatabaseError;
use crate::models::ShiftFilter;
use crate::shifts::assign_identity;

/// Counts of records written by an import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub providers: usize,
    pub clinic_types: usize,
    pub shifts: usize,
    pub monthly_notes: usize,
}

/// Write a validated document in one transaction. Any failure rolls the
/// whole import back.
pub fn apply_import(conn: &Connection, document: &ImportDocument) -> Result<ImportSummary, ImportError> {
    let tx = conn.unchecked_transaction().map_err(DatabaseError::from)?;
    let mut summary = ImportSummary::default();

    for provider in &document.providers {
        repository::insert_provider(&tx, provider)?;
        summary.providers += 1;
    }
    for clinic in &document.clinic_types {
        repository::insert_clinic_type(&tx, clinic)?;
        summary.clinic_types += 1;
    }
    for (index, shift) in document.shifts.iter().enumerate() {
        let mut definition = shift.to_definition()?;
        if definition.end_date < definition.start_date {
            return Err(ImportError::InvalidRange { index });
        }
        assign_identity(&mut definition);
        repository::insert_shift_record(&tx, &definition)?;
        summary.shifts += 1;
    }
    for note in &document.monthly_notes {
        let mut note = note.clone();
        if note.id.is_empty() {
            note.id = Uuid::new_v4().to_string();
        }
        repository::insert_monthly_note(&tx, &note)?;
        summary.monthly_notes += 1;
    }

    tx.commit().map_err(DatabaseError::from)?;

    tracing::info!(
        providers = summary.providers,
        clinic_types = summary.clinic_types,
        shifts = summary.shifts,
        monthly_notes = summary.monthly_notes,
        "Calendar import committed"
    );
    Ok(summary)
}

/// Validate `json` and apply it.
pub fn import_json(conn: &Connection, json: &str) -> Result<ImportSummary, ImportError> {
    let document = super::validate_import(json).inspect_err(|e| {
        tracing::warn!(error = %e, "Calendar import rejected");
    })?;
    apply_import(conn, &document)
}

/// Snapshot the stored calendar as an import document.
pub fn export_document(conn: &Connection) -> Result<ImportDocument, ImportError> {
    let shifts = repository::list_shift_records(conn, &ShiftFilter::default())?
        .iter()
        .map(ImportShift::from_definition)
        .collect();

    Ok(ImportDocument {
        providers: repository::get_all_providers(conn)?,
        clinic_types: repository::get_all_clinic_types(conn)?,
        shifts,
        monthly_notes: repository::get_all_monthly_notes(conn)?,
    })
}
