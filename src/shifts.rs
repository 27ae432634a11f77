//! Shift store seam and the mutation resolver.
//!
//! All writes to the shift collection go through `create_shift`,
//! `update_shift` and `delete_shift`. Stores only persist records; the
//! series-aware delete rules live here.
//!
//! Ids handed out by expansion (`"A-3"`) resolve back to the stored recurring
//! definition. Touching a single occurrence of such a definition first
//! replaces it with one stored record per occurrence, in one batch.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::slice;
use std::sync::RwLock;

use thiserror::Error;
use uuid::Uuid;

use crate::date_utils::{expand_shift_with, parse_occurrence_id, DEFAULT_MAX_OCCURRENCES};
use crate::db::DatabaseError;
use crate::models::{DeleteScope, FutureDeleteMode, ShiftDefinition, ShiftFilter, ShiftKind};

#[derive(Error, Debug)]
pub enum ShiftError {
    #[error("Shift not found: {0}")]
    NotFound(String),

    #[error("Invalid calendar month: {year}-{month}")]
    InvalidMonth { year: i32, month: u32 },

    #[error("Store error: {0}")]
    Store(#[from] DatabaseError),
}

/// Persistence for shift records, keyed by id with a secondary series index.
///
/// Callers serialize mutations; implementations need no cross-call locking.
pub trait ShiftStore {
    fn list(&self, filter: &ShiftFilter) -> Result<Vec<ShiftDefinition>, DatabaseError>;
    fn get(&self, id: &str) -> Result<Option<ShiftDefinition>, DatabaseError>;
    fn insert(&self, shift: &ShiftDefinition) -> Result<(), DatabaseError>;
    /// Returns `false` when no record has `shift.id`.
    fn update(&self, shift: &ShiftDefinition) -> Result<bool, DatabaseError>;
    /// Returns `false` when no record has `id`.
    fn delete(&self, id: &str) -> Result<bool, DatabaseError>;

    /// Remove `delete`, then insert `insert`, as one unit: on error nothing
    /// changes. Returns the ids that were actually removed.
    fn apply_batch(
        &self,
        delete: &[String],
        insert: &[ShiftDefinition],
    ) -> Result<Vec<String>, DatabaseError>;

    fn insert_all(&self, shifts: &[ShiftDefinition]) -> Result<(), DatabaseError> {
        self.apply_batch(&[], shifts).map(|_| ())
    }

    fn delete_all(&self, ids: &[String]) -> Result<Vec<String>, DatabaseError> {
        self.apply_batch(ids, &[])
    }
}

// ═══════════════════════════════════════════
// In-memory store
// ═══════════════════════════════════════════

#[derive(Debug, Default)]
struct MemoryInner {
    shifts: HashMap<String, ShiftDefinition>,
    by_series: HashMap<String, BTreeSet<String>>,
}

impl MemoryInner {
    fn index(&mut self, shift: &ShiftDefinition) {
        if let Some(series_id) = &shift.series_id {
            self.by_series
                .entry(series_id.clone())
                .or_default()
                .insert(shift.id.clone());
        }
    }

    fn unindex(&mut self, shift: &ShiftDefinition) {
        if let Some(series_id) = &shift.series_id {
            if let Some(ids) = self.by_series.get_mut(series_id) {
                ids.remove(&shift.id);
                if ids.is_empty() {
                    self.by_series.remove(series_id);
                }
            }
        }
    }
}

/// Shift store held in process memory.
#[derive(Debug, Default)]
pub struct MemoryShiftStore {
    inner: RwLock<MemoryInner>,
}

impl MemoryShiftStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> Result<usize, DatabaseError> {
        let inner = self.inner.read().map_err(|_| DatabaseError::LockPoisoned)?;
        Ok(inner.shifts.len())
    }

    pub fn is_empty(&self) -> Result<bool, DatabaseError> {
        Ok(self.len()? == 0)
    }
}

impl ShiftStore for MemoryShiftStore {
    fn list(&self, filter: &ShiftFilter) -> Result<Vec<ShiftDefinition>, DatabaseError> {
        let inner = self.inner.read().map_err(|_| DatabaseError::LockPoisoned)?;
        let mut shifts: Vec<ShiftDefinition> = match &filter.series_id {
            Some(series_id) => inner
                .by_series
                .get(series_id)
                .into_iter()
                .flatten()
                .filter_map(|id| inner.shifts.get(id))
                .filter(|s| filter.matches(s))
                .cloned()
                .collect(),
            None => inner
                .shifts
                .values()
                .filter(|s| filter.matches(s))
                .cloned()
                .collect(),
        };
        shifts.sort_by(|a, b| a.start_date.cmp(&b.start_date).then_with(|| a.id.cmp(&b.id)));
        Ok(shifts)
    }

    fn get(&self, id: &str) -> Result<Option<ShiftDefinition>, DatabaseError> {
        let inner = self.inner.read().map_err(|_| DatabaseError::LockPoisoned)?;
        Ok(inner.shifts.get(id).cloned())
    }

    fn insert(&self, shift: &ShiftDefinition) -> Result<(), DatabaseError> {
        let mut inner = self.inner.write().map_err(|_| DatabaseError::LockPoisoned)?;
        if inner.shifts.contains_key(&shift.id) {
            return Err(DatabaseError::ConstraintViolation(format!(
                "duplicate shift id {}",
                shift.id
            )));
        }
        inner.index(shift);
        inner.shifts.insert(shift.id.clone(), shift.clone());
        Ok(())
    }

    fn update(&self, shift: &ShiftDefinition) -> Result<bool, DatabaseError> {
        let mut inner = self.inner.write().map_err(|_| DatabaseError::LockPoisoned)?;
        let Some(previous) = inner.shifts.remove(&shift.id) else {
            return Ok(false);
        };
        inner.unindex(&previous);
        inner.index(shift);
        inner.shifts.insert(shift.id.clone(), shift.clone());
        Ok(true)
    }

    fn delete(&self, id: &str) -> Result<bool, DatabaseError> {
        let mut inner = self.inner.write().map_err(|_| DatabaseError::LockPoisoned)?;
        match inner.shifts.remove(id) {
            Some(previous) => {
                inner.unindex(&previous);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn apply_batch(
        &self,
        delete: &[String],
        insert: &[ShiftDefinition],
    ) -> Result<Vec<String>, DatabaseError> {
        let mut inner = self.inner.write().map_err(|_| DatabaseError::LockPoisoned)?;

        // Every id is checked before anything is touched.
        let freed: HashSet<&str> = delete.iter().map(String::as_str).collect();
        let mut incoming: HashSet<&str> = HashSet::new();
        for shift in insert {
            let taken = inner.shifts.contains_key(&shift.id) && !freed.contains(shift.id.as_str());
            if taken || !incoming.insert(shift.id.as_str()) {
                return Err(DatabaseError::ConstraintViolation(format!(
                    "duplicate shift id {}",
                    shift.id
                )));
            }
        }

        let mut deleted = Vec::new();
        for id in delete {
            if let Some(previous) = inner.shifts.remove(id) {
                inner.unindex(&previous);
                deleted.push(id.clone());
            }
        }
        for shift in insert {
            inner.index(shift);
            inner.shifts.insert(shift.id.clone(), shift.clone());
        }
        Ok(deleted)
    }
}

// ═══════════════════════════════════════════
// Mutation resolver
// ═══════════════════════════════════════════

/// Insert a new shift, assigning an id and (for recurring shifts) a series id
/// when absent. Returns the stored record.
pub fn create_shift<S: ShiftStore + ?Sized>(
    store: &S,
    mut shift: ShiftDefinition,
) -> Result<ShiftDefinition, ShiftError> {
    assign_identity(&mut shift);
    store.insert(&shift)?;
    Ok(shift)
}

/// Replace the record with `shift.id`, capping derived series at
/// [`DEFAULT_MAX_OCCURRENCES`].
pub fn update_shift<S: ShiftStore + ?Sized>(
    store: &S,
    shift: &ShiftDefinition,
) -> Result<(), ShiftError> {
    update_shift_with(store, shift, DEFAULT_MAX_OCCURRENCES)
}

/// Replace the record with `shift.id`. Series siblings are left as they are.
///
/// A stored id replaces that record; for a recurring definition that is the
/// whole series. An occurrence id of a recurring definition stores the series
/// as individual records and replaces only that occurrence.
pub fn update_shift_with<S: ShiftStore + ?Sized>(
    store: &S,
    shift: &ShiftDefinition,
    max_occurrences: usize,
) -> Result<(), ShiftError> {
    if store.update(shift)? {
        return Ok(());
    }

    let not_found = || ShiftError::NotFound(shift.id.clone());
    let owner = recurring_owner(store, &shift.id)?.ok_or_else(not_found)?;
    let mut records = series_records(&owner, max_occurrences);
    let slot = records
        .iter_mut()
        .find(|record| record.id == shift.id)
        .ok_or_else(not_found)?;
    *slot = shift.clone();
    // An occurrence stays a one-day record.
    if slot.is_recurring() {
        slot.kind = ShiftKind::Single;
    }

    store.apply_batch(slice::from_ref(&owner.id), &records)?;
    tracing::debug!(id = %owner.id, count = records.len(), "Recurring shift split into records");
    Ok(())
}

/// [`delete_shift_with`] capping derived series at [`DEFAULT_MAX_OCCURRENCES`].
pub fn delete_shift<S: ShiftStore + ?Sized>(
    store: &S,
    id: &str,
    scope: DeleteScope,
    future_mode: FutureDeleteMode,
) -> Result<Vec<String>, ShiftError> {
    delete_shift_with(store, id, scope, future_mode, DEFAULT_MAX_OCCURRENCES)
}

/// Delete `id` and, depending on `scope`, its series siblings.
///
/// `id` may be a stored record or an occurrence of a stored recurring
/// definition. [`DeleteScope::All`] removes such a definition outright; the
/// other scopes first store its occurrences as individual records (capped at
/// `max_occurrences`, matching what expansion showed) and then apply.
///
/// `future_mode` picks how [`DeleteScope::Future`] reads:
/// - [`FutureDeleteMode::BeforeTarget`] removes siblings dated strictly before
///   the target and keeps the target and everything after it.
/// - [`FutureDeleteMode::TargetAndLater`] removes the target and every sibling
///   dated on or after it.
///
/// Records without a series behave like [`DeleteScope::Single`] under every
/// scope. The removal happens in one batch. Returns the ids removed.
pub fn delete_shift_with<S: ShiftStore + ?Sized>(
    store: &S,
    id: &str,
    scope: DeleteScope,
    future_mode: FutureDeleteMode,
    max_occurrences: usize,
) -> Result<Vec<String>, ShiftError> {
    let not_found = || ShiftError::NotFound(id.to_string());
    let owner = match store.get(id)? {
        Some(shift) => shift,
        None => recurring_owner(store, id)?.ok_or_else(not_found)?,
    };

    let target = if owner.is_recurring() {
        let records = series_records(&owner, max_occurrences);
        let occurrence = records.iter().find(|record| record.id == id).cloned();
        match (scope, occurrence) {
            (DeleteScope::All, _) if owner.id == id => owner,
            (DeleteScope::All, Some(_)) => owner,
            (_, Some(occurrence)) => {
                store.apply_batch(slice::from_ref(&owner.id), &records)?;
                tracing::debug!(id = %owner.id, count = records.len(), "Recurring shift split into records");
                occurrence
            }
            (_, None) => return Err(not_found()),
        }
    } else {
        owner
    };

    let doomed: Vec<String> = match (&target.series_id, scope) {
        (None, _) | (Some(_), DeleteScope::Single) => vec![target.id.clone()],
        (Some(series_id), DeleteScope::All) => store
            .list(&ShiftFilter::series(series_id))?
            .into_iter()
            .map(|s| s.id)
            .collect(),
        (Some(series_id), DeleteScope::Future) => store
            .list(&ShiftFilter::series(series_id))?
            .into_iter()
            .filter(|s| match future_mode {
                FutureDeleteMode::BeforeTarget => s.start_date < target.start_date,
                FutureDeleteMode::TargetAndLater => {
                    s.id == target.id || s.start_date >= target.start_date
                }
            })
            .map(|s| s.id)
            .collect(),
    };

    Ok(store.delete_all(&doomed)?)
}

/// Persist every occurrence of a recurring definition as its own single-day
/// record sharing one series id. Non-recurring definitions are stored as-is.
/// Either every record is stored or none is.
pub fn materialize_series<S: ShiftStore + ?Sized>(
    store: &S,
    mut definition: ShiftDefinition,
    max_occurrences: usize,
) -> Result<Vec<ShiftDefinition>, ShiftError> {
    assign_identity(&mut definition);
    let records = series_records(&definition, max_occurrences);
    store.insert_all(&records)?;
    Ok(records)
}

/// Occurrences of `definition` as storable records.
fn series_records(definition: &ShiftDefinition, max_occurrences: usize) -> Vec<ShiftDefinition> {
    expand_shift_with(definition, max_occurrences)
        .into_iter()
        .map(|occurrence| {
            let mut record = occurrence.shift;
            if occurrence.is_part_of_series {
                record.kind = ShiftKind::Single;
            }
            record
        })
        .collect()
}

/// The stored recurring definition an occurrence id was derived from.
fn recurring_owner<S: ShiftStore + ?Sized>(
    store: &S,
    id: &str,
) -> Result<Option<ShiftDefinition>, ShiftError> {
    let Some((base_id, _)) = parse_occurrence_id(id) else {
        return Ok(None);
    };
    Ok(store.get(base_id)?.filter(ShiftDefinition::is_recurring))
}

pub(crate) fn assign_identity(shift: &mut ShiftDefinition) {
    if !shift.has_id() {
        shift.id = Uuid::new_v4().to_string();
    }
    if shift.is_recurring() && shift.series_id.is_none() {
        shift.series_id = Some(Uuid::new_v4().to_string());
    }
}
