use crate::calendar::{PeriodCalendar, PeriodUnit};
use crate::error::SettingsError;
use crate::node::Period;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Per-project scheduling settings supplied by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectSettings {
    pub project_name: String,
    #[serde(default)]
    pub project_description: String,
    /// Calendar date of period 0.
    pub epoch_date: NaiveDate,
    #[serde(default)]
    pub period_unit: PeriodUnit,
    /// Period at which nodes without predecessors or baselines start.
    #[serde(default)]
    pub project_start: Period,
    /// Optional user-specified project finish used to seed the backward pass.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_constraint: Option<Period>,
}

impl Default for ProjectSettings {
    fn default() -> Self {
        Self {
            project_name: "New Project".to_string(),
            project_description: "No description".to_string(),
            epoch_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap_or_default(),
            period_unit: PeriodUnit::Month,
            project_start: 0,
            finish_constraint: None,
        }
    }
}

impl ProjectSettings {
    pub fn validate(&self) -> Result<(), SettingsError> {
        if let Some(finish) = self.finish_constraint {
            if finish < self.project_start {
                return Err(SettingsError::FinishBeforeStart {
                    start: self.project_start,
                    finish,
                });
            }
        }
        Ok(())
    }

    pub fn calendar(&self) -> PeriodCalendar {
        PeriodCalendar::new(self.epoch_date, self.period_unit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_are_monthly_from_period_zero() {
        let settings = ProjectSettings::default();
        assert_eq!(settings.period_unit, PeriodUnit::Month);
        assert_eq!(settings.project_start, 0);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn finish_constraint_before_start_is_rejected() {
        let settings = ProjectSettings {
            project_start: 4,
            finish_constraint: Some(3),
            ..ProjectSettings::default()
        };
        assert_eq!(
            settings.validate(),
            Err(SettingsError::FinishBeforeStart {
                start: 4,
                finish: 3
            })
        );
    }

    #[test]
    fn settings_deserialize_with_defaults() {
        let json = r#"{"project_name":"Harbor Lofts","epoch_date":"2026-03-01"}"#;
        let settings: ProjectSettings = serde_json::from_str(json).unwrap();
        assert_eq!(settings.project_name, "Harbor Lofts");
        assert_eq!(settings.period_unit, PeriodUnit::Month);
        assert_eq!(settings.finish_constraint, None);
    }
}
