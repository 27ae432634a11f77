use super::shift::ShiftDefinition;

/// Selection over stored shift records.
///
/// `date_prefix` follows the change-feed scoping: `"2026-03"` selects every
/// record whose `start_date` (rendered `YYYY-MM-DD`) starts with it.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ShiftFilter {
    pub date_prefix: Option<String>,
    pub provider_id: Option<String>,
    pub clinic_type_id: Option<String>,
    pub series_id: Option<String>,
}

impl ShiftFilter {
    pub fn series(series_id: &str) -> Self {
        Self {
            series_id: Some(series_id.to_string()),
            ..Self::default()
        }
    }

    pub fn date_prefix(prefix: &str) -> Self {
        Self {
            date_prefix: Some(prefix.to_string()),
            ..Self::default()
        }
    }

    pub fn matches(&self, shift: &ShiftDefinition) -> bool {
        if let Some(prefix) = &self.date_prefix {
            if !shift.start_date.format("%Y-%m-%d").to_string().starts_with(prefix.as_str()) {
                return false;
            }
        }
        if let Some(provider_id) = &self.provider_id {
            if &shift.provider_id != provider_id {
                return false;
            }
        }
        if let Some(clinic_type_id) = &self.clinic_type_id {
            if &shift.clinic_type_id != clinic_type_id {
                return false;
            }
        }
        if let Some(series_id) = &self.series_id {
            if shift.series_id.as_ref() != Some(series_id) {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn shift_on(y: i32, m: u32, d: u32) -> ShiftDefinition {
        ShiftDefinition::single("p1", "c1", NaiveDate::from_ymd_opt(y, m, d).unwrap())
    }

    #[test]
    fn empty_filter_matches_everything() {
        assert!(ShiftFilter::default().matches(&shift_on(2026, 3, 9)));
    }

    #[test]
    fn date_prefix_scopes_by_month() {
        let filter = ShiftFilter::date_prefix("2026-03");
        assert!(filter.matches(&shift_on(2026, 3, 1)));
        assert!(filter.matches(&shift_on(2026, 3, 31)));
        assert!(!filter.matches(&shift_on(2026, 4, 1)));
        assert!(!filter.matches(&shift_on(2025, 3, 9)));
    }

    #[test]
    fn series_filter_requires_matching_series() {
        let mut member = shift_on(2026, 3, 9);
        let filter = ShiftFilter::series("s1");
        assert!(!filter.matches(&member));
        member.series_id = Some("s1".into());
        assert!(filter.matches(&member));
    }

    #[test]
    fn provider_and_clinic_filters_combine() {
        let filter = ShiftFilter {
            provider_id: Some("p1".into()),
            clinic_type_id: Some("c2".into()),
            ..ShiftFilter::default()
        };
        assert!(!filter.matches(&shift_on(2026, 3, 9)));
        let mut shift = shift_on(2026, 3, 9);
        shift.clinic_type_id = "c2".into();
        assert!(filter.matches(&shift));
    }
}
