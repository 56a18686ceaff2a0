use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::session::PunchSession;
use crate::storage::{load_json, save_json, KeyValueStore, PUNCH_CURRENT_KEY, PUNCH_SESSIONS_KEY};

/// At most one open session; closed sessions are kept newest first.
#[derive(Debug, Clone, Default)]
pub struct PunchClock {
    pub current: Option<PunchSession>,
    pub sessions: Vec<PunchSession>,
}

impl PunchClock {
    pub fn load(store: &dyn KeyValueStore) -> Result<Self, AppError> {
        Ok(Self {
            current: load_json::<PunchSession>(store, PUNCH_CURRENT_KEY)?
                .filter(PunchSession::is_open),
            sessions: load_json(store, PUNCH_SESSIONS_KEY)?.unwrap_or_default(),
        })
    }

    pub fn punch_in(
        &mut self,
        start_odometer: f64,
        at: DateTime<Utc>,
        store: &dyn KeyValueStore,
    ) -> Result<PunchSession, AppError> {
        if let Some(open) = &self.current {
            return Err(AppError::Conflict(format!(
                "already punched in since {}",
                open.started_at.to_rfc3339()
            )));
        }
        if !start_odometer.is_finite() || start_odometer < 0.0 {
            return Err(AppError::BadRequest(
                "start_odometer must be a non-negative number".to_string(),
            ));
        }

        let session = PunchSession {
            id: Uuid::new_v4(),
            started_at: at,
            ended_at: None,
            start_odometer,
            end_odometer: None,
            total_miles: None,
            total_duration_secs: None,
        };

        save_json(store, PUNCH_CURRENT_KEY, &session)?;
        self.current = Some(session.clone());
        Ok(session)
    }

    pub fn punch_out(
        &mut self,
        end_odometer: f64,
        at: DateTime<Utc>,
        store: &dyn KeyValueStore,
    ) -> Result<PunchSession, AppError> {
        let open = self
            .current
            .as_ref()
            .ok_or_else(|| AppError::Conflict("not punched in".to_string()))?;

        if !end_odometer.is_finite() || end_odometer < open.start_odometer {
            return Err(AppError::BadRequest(format!(
                "end_odometer must be >= start_odometer ({})",
                open.start_odometer
            )));
        }

        let closed = PunchSession {
            ended_at: Some(at),
            end_odometer: Some(end_odometer),
            total_miles: Some(end_odometer - open.start_odometer),
            total_duration_secs: Some(at.signed_duration_since(open.started_at).num_seconds()),
            ..open.clone()
        };

        let mut sessions = Vec::with_capacity(self.sessions.len() + 1);
        sessions.push(closed.clone());
        sessions.extend(self.sessions.iter().cloned());

        save_json(store, PUNCH_SESSIONS_KEY, &sessions)?;
        store.remove(PUNCH_CURRENT_KEY)?;

        self.sessions = sessions;
        self.current = None;
        Ok(closed)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::PunchClock;
    use crate::error::AppError;
    use crate::storage::MemoryStore;

    #[test]
    fn punch_out_totals_miles_and_duration() {
        let store = MemoryStore::new();
        let start = Utc.with_ymd_and_hms(2025, 6, 2, 8, 0, 0).unwrap();
        let mut clock = PunchClock::default();

        clock.punch_in(12_000.0, start, &store).unwrap();
        let closed = clock
            .punch_out(12_085.5, start + Duration::hours(8), &store)
            .unwrap();

        assert_eq!(closed.total_miles, Some(85.5));
        assert_eq!(closed.total_duration_secs, Some(8 * 3600));
        assert!(clock.current.is_none());
        assert_eq!(clock.sessions.len(), 1);
    }

    #[test]
    fn sessions_survive_reload() {
        let store = MemoryStore::new();
        let start = Utc.with_ymd_and_hms(2025, 6, 2, 8, 0, 0).unwrap();
        let mut clock = PunchClock::default();

        clock.punch_in(100.0, start, &store).unwrap();
        clock.punch_out(150.0, start + Duration::hours(1), &store).unwrap();
        clock.punch_in(150.0, start + Duration::hours(2), &store).unwrap();

        let reloaded = PunchClock::load(&store).unwrap();
        assert!(reloaded.current.is_some());
        assert_eq!(reloaded.sessions.len(), 1);
        assert_eq!(reloaded.sessions[0].total_miles, Some(50.0));
    }

    #[test]
    fn double_punch_in_conflicts() {
        let store = MemoryStore::new();
        let mut clock = PunchClock::default();
        clock.punch_in(0.0, Utc::now(), &store).unwrap();

        let second = clock.punch_in(0.0, Utc::now(), &store);
        assert!(matches!(second, Err(AppError::Conflict(_))));
    }

    #[test]
    fn punch_out_without_session_conflicts() {
        let store = MemoryStore::new();
        let mut clock = PunchClock::default();
        let result = clock.punch_out(10.0, Utc::now(), &store);
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[test]
    fn odometer_cannot_run_backwards() {
        let store = MemoryStore::new();
        let mut clock = PunchClock::default();
        clock.punch_in(500.0, Utc::now(), &store).unwrap();

        let result = clock.punch_out(499.0, Utc::now(), &store);
        assert!(matches!(result, Err(AppError::BadRequest(_))));
        assert!(clock.current.is_some());
    }
}
