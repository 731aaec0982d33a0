use crate::db::StoreError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
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
            type Err = StoreError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(StoreError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(ConditionSeverity {
    Mild => "mild",
    Moderate => "moderate",
    Severe => "severe",
});

str_enum!(ConditionStatus {
    Active => "active",
    Inactive => "inactive",
    Resolved => "resolved",
});

str_enum!(AllergySeverity {
    Mild => "mild",
    Moderate => "moderate",
    Severe => "severe",
    // Hyphenated in the schema CHECK, matching the rows the superseded app wrote.
    LifeThreatening => "life-threatening",
});

str_enum!(ConsultationSeverity {
    Low => "low",
    Medium => "medium",
    High => "high",
});

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn enum_round_trip() {
        assert_eq!(
            ConditionStatus::from_str(ConditionStatus::Resolved.as_str()).unwrap(),
            ConditionStatus::Resolved
        );
        assert_eq!(AllergySeverity::LifeThreatening.as_str(), "life-threatening");
        assert_eq!(
            AllergySeverity::from_str("life-threatening").unwrap(),
            AllergySeverity::LifeThreatening
        );
    }

    #[test]
    fn unknown_value_is_invalid_enum() {
        let err = ConsultationSeverity::from_str("critical").unwrap_err();
        assert!(matches!(err, StoreError::InvalidEnum { .. }));
    }
}
