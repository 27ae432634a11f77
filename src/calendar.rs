//! Calendar service: the entry point presentation code talks to.
//!
//! Wraps a `ShiftStore` with the injected `CalendarConfig`. Reads expand
//! stored definitions on demand; writes go through the mutation resolver.

use std::collections::BTreeMap;

use chrono::{Months, NaiveDate};

use crate::config::CalendarConfig;
use crate::date_utils::{expand_shift_with, occurs_on};
use crate::models::*;
use crate::shifts::{self, ShiftError, ShiftStore};

pub struct CalendarService<S: ShiftStore> {
    store: S,
    config: CalendarConfig,
}

impl<S: ShiftStore> CalendarService<S> {
    pub fn new(store: S, config: CalendarConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &CalendarConfig {
        &self.config
    }

    // ── Reads ───────────────────────────────────────────────

    /// Every occurrence of every stored shift matching `filter`.
    pub fn occurrences(&self, filter: &ShiftFilter) -> Result<Vec<ShiftOccurrence>, ShiftError> {
        let occurrences = self
            .store
            .list(filter)?
            .iter()
            .flat_map(|shift| expand_shift_with(shift, self.config.max_occurrences))
            .collect();
        Ok(occurrences)
    }

    /// Occurrences active on `date`, vacations included.
    pub fn shifts_on(&self, date: CalendarDay) -> Result<Vec<ShiftOccurrence>, ShiftError> {
        Ok(self
            .occurrences(&ShiftFilter::default())?
            .into_iter()
            .filter(|occ| occurs_on(&occ.shift, date))
            .collect())
    }

    /// Occurrences per day of a month. A vacation appears under each day it covers.
    pub fn shifts_in_month(
        &self,
        year: i32,
        month: u32,
    ) -> Result<BTreeMap<CalendarDay, Vec<ShiftOccurrence>>, ShiftError> {
        let first = NaiveDate::from_ymd_opt(year, month, 1)
            .ok_or(ShiftError::InvalidMonth { year, month })?;
        let last = first
            .checked_add_months(Months::new(1))
            .and_then(|next| next.pred_opt())
            .ok_or(ShiftError::InvalidMonth { year, month })?;

        let mut days: BTreeMap<CalendarDay, Vec<ShiftOccurrence>> = BTreeMap::new();
        for occ in self.occurrences(&ShiftFilter::default())? {
            let from = occ.shift.start_date.max(first);
            let to = occ.shift.end_date.min(last);
            for day in from.iter_days().take_while(|day| *day <= to) {
                if occurs_on(&occ.shift, day) {
                    days.entry(day).or_default().push(occ.clone());
                }
            }
        }

        tracing::debug!(year, month, days = days.len(), "Month view assembled");
        Ok(days)
    }

    // ── Writes ──────────────────────────────────────────────

    pub fn add_shift(&self, shift: ShiftDefinition) -> Result<ShiftDefinition, ShiftError> {
        let created = shifts::create_shift(&self.store, shift)?;
        tracing::info!(id = %created.id, recurring = created.is_recurring(), "Shift created");
        Ok(created)
    }

    /// Store each occurrence of a recurring shift as its own record.
    pub fn add_shift_series(
        &self,
        shift: ShiftDefinition,
    ) -> Result<Vec<ShiftDefinition>, ShiftError> {
        let records = shifts::materialize_series(&self.store, shift, self.config.max_occurrences)?;
        tracing::info!(
            count = records.len(),
            series_id = records.first().and_then(|r| r.series_id.as_deref()).unwrap_or(""),
            "Shift series created"
        );
        Ok(records)
    }

    /// Replace a stored record, or one occurrence of a recurring shift.
    pub fn update_shift(&self, shift: &ShiftDefinition) -> Result<(), ShiftError> {
        shifts::update_shift_with(&self.store, shift, self.config.max_occurrences)
            .inspect_err(|e| {
                tracing::warn!(id = %shift.id, error = %e, "Shift update failed");
            })?;
        tracing::info!(id = %shift.id, "Shift updated");
        Ok(())
    }

    /// Delete with the configured reading of [`DeleteScope::Future`].
    ///
    /// Accepts any id this service hands out, including occurrence ids of
    /// recurring shifts added with [`CalendarService::add_shift`].
    pub fn delete_shift(&self, id: &str, scope: DeleteScope) -> Result<Vec<String>, ShiftError> {
        let deleted = shifts::delete_shift_with(
            &self.store,
            id,
            scope,
            self.config.future_delete_mode,
            self.config.max_occurrences,
        )
        .inspect_err(|e| {
            tracing::warn!(id, scope = %scope, error = %e, "Shift delete failed");
        })?;
        tracing::info!(id, scope = %scope, count = deleted.len(), "Shifts deleted");
        Ok(deleted)
    }

    // ── Defaults ────────────────────────────────────────────

    pub fn providers_or_default(&self, stored: Vec<Provider>) -> Vec<Provider> {
        if stored.is_empty() {
            self.config.default_providers.clone()
        } else {
            stored
        }
    }

    pub fn clinic_types_or_default(&self, stored: Vec<ClinicType>) -> Vec<ClinicType> {
        if stored.is_empty() {
            self.config.default_clinic_types.clone()
        } else {
            stored
        }
    }
}
