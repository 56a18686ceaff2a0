use serde::{Deserialize, Serialize};

/// Driver hour limits and vehicle compliance flags.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SafetySettings {
    pub max_driving_hours_per_day: f64,
    pub max_on_duty_hours_per_day: f64,
    pub max_driving_hours_per_7days: f64,
    pub required_break_minutes_after_hours: f64,
    pub in_cab_camera_installed: bool,
    pub outward_camera_installed: bool,
    pub fatigue_check_enabled: bool,
    pub allow_ai_to_block_jobs_when_over_hours: bool,
}

impl Default for SafetySettings {
    fn default() -> Self {
        Self {
            max_driving_hours_per_day: 11.0,
            max_on_duty_hours_per_day: 14.0,
            max_driving_hours_per_7days: 60.0,
            required_break_minutes_after_hours: 30.0,
            in_cab_camera_installed: false,
            outward_camera_installed: false,
            fatigue_check_enabled: true,
            allow_ai_to_block_jobs_when_over_hours: true,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SafetySettingsPatch {
    pub max_driving_hours_per_day: Option<f64>,
    pub max_on_duty_hours_per_day: Option<f64>,
    pub max_driving_hours_per_7days: Option<f64>,
    pub required_break_minutes_after_hours: Option<f64>,
    pub in_cab_camera_installed: Option<bool>,
    pub outward_camera_installed: Option<bool>,
    pub fatigue_check_enabled: Option<bool>,
    pub allow_ai_to_block_jobs_when_over_hours: Option<bool>,
}

impl SafetySettings {
    pub fn apply(&mut self, patch: SafetySettingsPatch) {
        if let Some(hours) = patch.max_driving_hours_per_day {
            self.max_driving_hours_per_day = hours;
        }
        if let Some(hours) = patch.max_on_duty_hours_per_day {
            self.max_on_duty_hours_per_day = hours;
        }
        if let Some(hours) = patch.max_driving_hours_per_7days {
            self.max_driving_hours_per_7days = hours;
        }
        if let Some(minutes) = patch.required_break_minutes_after_hours {
            self.required_break_minutes_after_hours = minutes;
        }
        if let Some(installed) = patch.in_cab_camera_installed {
            self.in_cab_camera_installed = installed;
        }
        if let Some(installed) = patch.outward_camera_installed {
            self.outward_camera_installed = installed;
        }
        if let Some(enabled) = patch.fatigue_check_enabled {
            self.fatigue_check_enabled = enabled;
        }
        if let Some(allow) = patch.allow_ai_to_block_jobs_when_over_hours {
            self.allow_ai_to_block_jobs_when_over_hours = allow;
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        let limits = [
            ("max_driving_hours_per_day", self.max_driving_hours_per_day),
            ("max_on_duty_hours_per_day", self.max_on_duty_hours_per_day),
            ("max_driving_hours_per_7days", self.max_driving_hours_per_7days),
        ];
        for (name, value) in limits {
            if !value.is_finite() || value <= 0.0 {
                return Err(format!("{name} must be a positive number"));
            }
        }
        if !self.required_break_minutes_after_hours.is_finite()
            || self.required_break_minutes_after_hours < 0.0
        {
            return Err("required_break_minutes_after_hours must be >= 0".to_string());
        }
        Ok(())
    }
}

/// Hours worked, derived from punch sessions and completed trips.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq)]
pub struct DutyHours {
    pub today_driving_hours: f64,
    pub today_on_duty_hours: f64,
    pub week_driving_hours: f64,
    /// Minutes since the current shift began; zero while off the clock.
    pub last_break_minutes_ago: f64,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct SafetyStatus {
    pub can_accept_more_driving: bool,
    pub needs_break: bool,
    pub cameras_compliant: bool,
}
