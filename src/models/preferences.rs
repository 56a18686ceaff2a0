use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkingHours {
    pub id: String,
    pub day: Weekday,
    /// "HH:MM"; only the hour takes part in scoring.
    pub start_time: String,
    pub end_time: String,
    #[serde(default = "default_true")]
    pub recurring: bool,
}

impl WorkingHours {
    pub fn new(id: &str, day: Weekday, start_time: &str, end_time: &str) -> Self {
        Self {
            id: id.to_string(),
            day,
            start_time: start_time.to_string(),
            end_time: end_time.to_string(),
            recurring: true,
        }
    }

    /// `(start_hour, end_hour)` or `None` when either side is malformed.
    pub fn hour_bounds(&self) -> Option<(u32, u32)> {
        Some((parse_hour(&self.start_time)?, parse_hour(&self.end_time)?))
    }
}

fn parse_hour(raw: &str) -> Option<u32> {
    let hour_part = raw.trim().split(':').next()?;
    let hour = hour_part.parse::<u32>().ok()?;
    (hour <= 24).then_some(hour)
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DayOff {
    pub id: String,
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Zone {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub enabled: bool,
}

impl Zone {
    fn new(id: &str, name: &str, description: &str, enabled: bool) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: Some(description.to_string()),
            enabled,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AutomationPreferences {
    pub enabled: bool,
    pub min_payout: f64,
    pub max_payout: Option<f64>,
    pub max_distance: f64,
    pub working_hours: Vec<WorkingHours>,
    pub days_off: Vec<DayOff>,
    pub max_daily_hours: f64,
    pub auto_accept: bool,
    pub auto_bid: bool,
    pub zones: Vec<Zone>,
}

impl Default for AutomationPreferences {
    fn default() -> Self {
        let weekdays = [
            Weekday::Mon,
            Weekday::Tue,
            Weekday::Wed,
            Weekday::Thu,
            Weekday::Fri,
        ];

        Self {
            enabled: false,
            min_payout: 15.0,
            max_payout: Some(200.0),
            max_distance: 30.0,
            working_hours: weekdays
                .iter()
                .enumerate()
                .map(|(idx, day)| WorkingHours::new(&(idx + 1).to_string(), *day, "08:00", "18:00"))
                .collect(),
            days_off: Vec::new(),
            max_daily_hours: 10.0,
            auto_accept: false,
            auto_bid: false,
            zones: vec![
                Zone::new("zone-downtown", "Downtown", "City center and financial district", true),
                Zone::new("zone-airport", "Airport", "Airport pickups and dropoffs", true),
                Zone::new("zone-suburbs", "Suburbs", "Residential areas outside city center", true),
                Zone::new("zone-coastal", "Coastal", "Beach and waterfront areas", false),
            ],
        }
    }
}

/// Partial update; absent fields keep their current value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PreferencesPatch {
    pub enabled: Option<bool>,
    pub min_payout: Option<f64>,
    pub max_payout: Option<f64>,
    pub max_distance: Option<f64>,
    pub working_hours: Option<Vec<WorkingHours>>,
    pub days_off: Option<Vec<DayOff>>,
    pub max_daily_hours: Option<f64>,
    pub auto_accept: Option<bool>,
    pub auto_bid: Option<bool>,
    pub zones: Option<Vec<Zone>>,
}

impl AutomationPreferences {
    pub fn apply(&mut self, patch: PreferencesPatch) {
        if let Some(enabled) = patch.enabled {
            self.enabled = enabled;
        }
        if let Some(min_payout) = patch.min_payout {
            self.min_payout = min_payout;
        }
        if let Some(max_payout) = patch.max_payout {
            self.max_payout = Some(max_payout);
        }
        if let Some(max_distance) = patch.max_distance {
            self.max_distance = max_distance;
        }
        if let Some(working_hours) = patch.working_hours {
            self.working_hours = working_hours;
        }
        if let Some(days_off) = patch.days_off {
            self.days_off = days_off;
        }
        if let Some(max_daily_hours) = patch.max_daily_hours {
            self.max_daily_hours = max_daily_hours;
        }
        if let Some(auto_accept) = patch.auto_accept {
            self.auto_accept = auto_accept;
        }
        if let Some(auto_bid) = patch.auto_bid {
            self.auto_bid = auto_bid;
        }
        if let Some(zones) = patch.zones {
            self.zones = zones;
        }
    }

    /// Returns a description of the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        if !self.min_payout.is_finite() || self.min_payout < 0.0 {
            return Err("min_payout must be a non-negative number".to_string());
        }
        if !self.max_distance.is_finite() || self.max_distance < 0.0 {
            return Err("max_distance must be a non-negative number".to_string());
        }
        if !self.max_daily_hours.is_finite() || self.max_daily_hours <= 0.0 {
            return Err("max_daily_hours must be a positive number".to_string());
        }
        if let Some(max_payout) = self.max_payout {
            if max_payout < self.min_payout {
                return Err("max_payout must be >= min_payout".to_string());
            }
        }
        for window in &self.working_hours {
            let (start, end) = window.hour_bounds().ok_or_else(|| {
                format!("working hours {} must use HH:MM times", window.id)
            })?;
            if start >= end {
                return Err(format!("working hours {} must end after they start", window.id));
            }
        }
        Ok(())
    }

    pub fn toggle_zone(&mut self, zone_id: &str) -> Option<&Zone> {
        let zone = self.zones.iter_mut().find(|zone| zone.id == zone_id)?;
        zone.enabled = !zone.enabled;
        Some(zone)
    }
}

fn default_true() -> bool {
    true
}
