use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

str_enum!(RecurrencePattern {
    Daily => "daily",
    Weekly => "weekly",
    Biweekly => "biweekly",
});

impl RecurrencePattern {
    /// Calendar days between two consecutive occurrences.
    /// Weekends count; filtering is left to the consumer.
    pub fn step_days(&self) -> u64 {
        match self {
            Self::Daily => 1,
            Self::Weekly => 7,
            Self::Biweekly => 14,
        }
    }
}

str_enum!(DeleteScope {
    Single => "single",
    Future => "future",
    All => "all",
});

str_enum!(FutureDeleteMode {
    BeforeTarget => "before_target",
    TargetAndLater => "target_and_later",
});

impl Default for FutureDeleteMode {
    fn default() -> Self {
        Self::BeforeTarget
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn pattern_round_trips_through_str() {
        for p in [
            RecurrencePattern::Daily,
            RecurrencePattern::Weekly,
            RecurrencePattern::Biweekly,
        ] {
            assert_eq!(RecurrencePattern::from_str(p.as_str()).unwrap(), p);
        }
    }

    #[test]
    fn pattern_step_sizes() {
        assert_eq!(RecurrencePattern::Daily.step_days(), 1);
        assert_eq!(RecurrencePattern::Weekly.step_days(), 7);
        assert_eq!(RecurrencePattern::Biweekly.step_days(), 14);
    }

    #[test]
    fn unknown_pattern_is_invalid_enum() {
        let err = RecurrencePattern::from_str("monthly").unwrap_err();
        match err {
            DatabaseError::InvalidEnum { field, value } => {
                assert_eq!(field, "RecurrencePattern");
                assert_eq!(value, "monthly");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn delete_scope_serializes_snake_case() {
        let json = serde_json::to_string(&DeleteScope::Future).unwrap();
        assert_eq!(json, "\"future\"");
        let mode: FutureDeleteMode = serde_json::from_str("\"target_and_later\"").unwrap();
        assert_eq!(mode, FutureDeleteMode::TargetAndLater);
    }

    #[test]
    fn future_delete_mode_defaults_to_before_target() {
        assert_eq!(FutureDeleteMode::default(), FutureDeleteMode::BeforeTarget);
    }
}
