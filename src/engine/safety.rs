use chrono::{DateTime, Duration, NaiveTime, Utc};

use crate::engine::punch::PunchClock;
use crate::models::job::{Job, JobStatus};
use crate::models::safety::{DutyHours, SafetySettings, SafetyStatus};

const BREAK_AFTER_DRIVING_HOURS: f64 = 8.0;
const MS_PER_HOUR: f64 = 3_600_000.0;

fn overlap_hours(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> f64 {
    let start = start.max(from);
    let end = end.min(to);
    if end <= start {
        return 0.0;
    }
    end.signed_duration_since(start).num_milliseconds() as f64 / MS_PER_HOUR
}

/// On-duty time comes from punch sessions overlapping the current UTC day.
/// Driving time is the duration of trips completed today and over the last
/// seven days.
pub fn duty_hours<'a>(
    clock: &PunchClock,
    trips: impl IntoIterator<Item = &'a Job>,
    now: DateTime<Utc>,
) -> DutyHours {
    let day_start = now.date_naive().and_time(NaiveTime::MIN).and_utc();
    let week_start = now - Duration::days(7);

    let today_on_duty_hours: f64 = clock
        .sessions
        .iter()
        .chain(clock.current.iter())
        .map(|session| {
            let end = session.ended_at.unwrap_or(now);
            overlap_hours(session.started_at, end, day_start, now)
        })
        .sum();

    let (today_driving_hours, week_driving_hours) = trips
        .into_iter()
        .filter(|job| job.status == JobStatus::Completed)
        .filter_map(|job| job.completed_at.map(|at| (at, job.duration / 60.0)))
        .filter(|(at, _)| *at <= now)
        .fold((0.0, 0.0), |(today, week), (at, hours)| {
            (
                if at >= day_start { today + hours } else { today },
                if at > week_start { week + hours } else { week },
            )
        });

    let last_break_minutes_ago = clock
        .current
        .as_ref()
        .map(|session| {
            let elapsed = now.signed_duration_since(session.started_at).num_seconds();
            elapsed.max(0) as f64 / 60.0
        })
        .unwrap_or(0.0);

    DutyHours {
        today_driving_hours,
        today_on_duty_hours,
        week_driving_hours,
        last_break_minutes_ago,
    }
}

pub fn safety_status(settings: &SafetySettings, hours: &DutyHours) -> SafetyStatus {
    let can_accept_more_driving = hours.today_driving_hours < settings.max_driving_hours_per_day
        && hours.today_on_duty_hours < settings.max_on_duty_hours_per_day
        && hours.week_driving_hours < settings.max_driving_hours_per_7days;

    let needs_break = settings.fatigue_check_enabled
        && hours.today_driving_hours >= BREAK_AFTER_DRIVING_HOURS
        && hours.last_break_minutes_ago >= settings.required_break_minutes_after_hours;

    SafetyStatus {
        can_accept_more_driving,
        needs_break,
        cameras_compliant: settings.in_cab_camera_installed && settings.outward_camera_installed,
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};
    use uuid::Uuid;

    use super::{duty_hours, safety_status};
    use crate::engine::punch::PunchClock;
    use crate::engine::scoring::tests::{job, monday_at};
    use crate::models::job::{Job, JobStatus};
    use crate::models::safety::{DutyHours, SafetySettings};
    use crate::models::session::PunchSession;

    fn session(start_hour: u32, end_hour: Option<u32>) -> PunchSession {
        let at = |hour| Utc.with_ymd_and_hms(2025, 6, 2, hour, 0, 0).unwrap();
        PunchSession {
            id: Uuid::new_v4(),
            started_at: at(start_hour),
            ended_at: end_hour.map(at),
            start_odometer: 0.0,
            end_odometer: None,
            total_miles: None,
            total_duration_secs: None,
        }
    }

    #[test]
    fn on_duty_counts_closed_and_open_sessions_today() {
        let now = Utc.with_ymd_and_hms(2025, 6, 2, 15, 0, 0).unwrap();
        let yesterday = PunchSession {
            started_at: now - Duration::hours(30),
            ended_at: Some(now - Duration::hours(26)),
            ..session(0, None)
        };
        let clock = PunchClock {
            current: Some(session(13, None)),
            sessions: vec![session(6, Some(10)), yesterday],
        };

        let hours = duty_hours(&clock, std::iter::empty::<&Job>(), now);
        assert!((hours.today_on_duty_hours - 6.0).abs() < 1e-9);
        assert!((hours.last_break_minutes_ago - 120.0).abs() < 1e-9);
    }

    #[test]
    fn driving_counts_completed_trips_only() {
        let now = Utc.with_ymd_and_hms(2025, 6, 2, 15, 0, 0).unwrap();

        let mut today = job(20.0, 5.0, monday_at(9, 0));
        today.status = JobStatus::Completed;
        today.duration = 90.0;
        today.completed_at = Some(now - Duration::hours(2));

        let mut earlier = today.clone();
        earlier.completed_at = Some(now - Duration::days(3));

        let mut pending = today.clone();
        pending.status = JobStatus::Assigned;

        let hours = duty_hours(&PunchClock::default(), [&today, &earlier, &pending], now);
        assert!((hours.today_driving_hours - 1.5).abs() < 1e-9);
        assert!((hours.week_driving_hours - 3.0).abs() < 1e-9);
        assert_eq!(hours.last_break_minutes_ago, 0.0);
    }

    #[test]
    fn limits_stop_more_driving() {
        let settings = SafetySettings::default();
        let fresh = DutyHours::default();
        assert!(safety_status(&settings, &fresh).can_accept_more_driving);

        for hours in [
            DutyHours { today_driving_hours: 11.0, ..fresh },
            DutyHours { today_on_duty_hours: 14.0, ..fresh },
            DutyHours { week_driving_hours: 60.0, ..fresh },
        ] {
            assert!(!safety_status(&settings, &hours).can_accept_more_driving);
        }
    }

    #[test]
    fn break_is_due_after_long_driving_stretch() {
        let mut settings = SafetySettings::default();
        let tired = DutyHours {
            today_driving_hours: 8.5,
            last_break_minutes_ago: 45.0,
            ..DutyHours::default()
        };
        assert!(safety_status(&settings, &tired).needs_break);

        let rested = DutyHours { last_break_minutes_ago: 10.0, ..tired };
        assert!(!safety_status(&settings, &rested).needs_break);

        settings.fatigue_check_enabled = false;
        assert!(!safety_status(&settings, &tired).needs_break);
    }

    #[test]
    fn cameras_need_both_installed() {
        let mut settings = SafetySettings {
            in_cab_camera_installed: true,
            ..SafetySettings::default()
        };
        assert!(!safety_status(&settings, &DutyHours::default()).cameras_compliant);

        settings.outward_camera_installed = true;
        assert!(safety_status(&settings, &DutyHours::default()).cameras_compliant);
    }
}
