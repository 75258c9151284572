//! Recurrence configuration for repeating tasks.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// How often a recurring task repeats.
///
/// Periods are always anchored to calendar boundaries (Monday, 1st of the
/// month, Jan 1), never to the task's creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodKind {
    /// Every calendar day
    Daily,
    /// Every ISO week (Monday through Sunday)
    Weekly,
    /// Every two ISO weeks, on a fixed global grid
    Biweekly,
    /// Every calendar month
    Monthly,
    /// Every calendar quarter (Jan/Apr/Jul/Oct)
    Quarterly,
    /// Every calendar year
    Yearly,
}

impl PeriodKind {
    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            PeriodKind::Daily => "daily",
            PeriodKind::Weekly => "weekly",
            PeriodKind::Biweekly => "biweekly",
            PeriodKind::Monthly => "monthly",
            PeriodKind::Quarterly => "quarterly",
            PeriodKind::Yearly => "yearly",
        }
    }
}

impl std::fmt::Display for PeriodKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Recurrence settings for a repeating task.
///
/// A task either has a rule (recurring) or none at all; a rule always carries
/// a period. Targets are evaluated per period: by completion count, or by
/// accumulated value when `target_value` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurrenceRule {
    /// Period the target applies to
    pub period: PeriodKind,

    /// Required completions per period (count semantics)
    pub target_count: u32,

    /// Required accumulated value per period; when set, it replaces count
    /// semantics (e.g. 30 minutes rather than 1 completion)
    pub target_value: Option<f64>,

    /// When the recurring schedule ends (optional)
    pub end_date: Option<NaiveDate>,
}

impl RecurrenceRule {
    /// Create a rule with the default target of one completion per period.
    pub fn new(period: PeriodKind) -> Self {
        Self {
            period,
            target_count: 1,
            target_value: None,
            end_date: None,
        }
    }

    /// Set the required completion count per period.
    pub fn with_target_count(mut self, count: u32) -> Self {
        self.target_count = count;
        self
    }

    /// Set a value target, switching the rule to accumulated-value semantics.
    pub fn with_target_value(mut self, value: f64) -> Self {
        self.target_value = Some(value);
        self
    }

    /// Validate the configuration. Rejected rules are fatal at creation.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.target_count == 0 {
            return Err(ModelError::InvalidRule(
                "target_count must be at least 1".to_string(),
            ));
        }
        if let Some(v) = self.target_value {
            if !v.is_finite() || v <= 0.0 {
                return Err(ModelError::InvalidRule(format!(
                    "target_value must be a positive number, got {v}"
                )));
            }
        }
        Ok(())
    }

    /// Whether this rule measures progress by accumulated value.
    pub fn is_value_based(&self) -> bool {
        self.target_value.is_some()
    }

    /// Human-readable recurrence description, e.g. "3 times weekly".
    pub fn describe(&self) -> String {
        if self.target_count == 1 {
            format!("Once {}", self.period)
        } else {
            format!("{} times {}", self.target_count, self.period)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_rule_is_once_per_period() {
        let rule = RecurrenceRule::new(PeriodKind::Daily);
        assert_eq!(rule.target_count, 1);
        assert!(rule.target_value.is_none());
        assert!(rule.validate().is_ok());
        assert_eq!(rule.describe(), "Once daily");
    }

    #[test]
    fn zero_target_count_rejected() {
        let rule = RecurrenceRule::new(PeriodKind::Weekly).with_target_count(0);
        assert!(matches!(rule.validate(), Err(ModelError::InvalidRule(_))));
    }

    #[test]
    fn non_positive_target_value_rejected() {
        let rule = RecurrenceRule::new(PeriodKind::Weekly).with_target_value(0.0);
        assert!(rule.validate().is_err());
        let rule = RecurrenceRule::new(PeriodKind::Weekly).with_target_value(-5.0);
        assert!(rule.validate().is_err());
        let rule = RecurrenceRule::new(PeriodKind::Weekly).with_target_value(f64::NAN);
        assert!(rule.validate().is_err());
    }

    #[test]
    fn describe_includes_count() {
        let rule = RecurrenceRule::new(PeriodKind::Weekly).with_target_count(3);
        assert_eq!(rule.describe(), "3 times weekly");
    }

    #[test]
    fn period_kind_serializes_lowercase() {
        let json = serde_json::to_string(&PeriodKind::Biweekly).unwrap();
        assert_eq!(json, "\"biweekly\"");
    }
}
