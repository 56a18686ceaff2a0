use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, info};
use uuid::Uuid;

use crate::models::decision::Action;
use crate::models::job::Job;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notification {
    NewJob {
        job_id: Uuid,
        pickup_address: String,
        payout: f64,
        distance: f64,
    },
    UnoAction {
        job_id: Uuid,
        action: Action,
        pickup_address: String,
        payout: f64,
    },
}

impl Notification {
    pub fn new_job(job: &Job) -> Self {
        Notification::NewJob {
            job_id: job.id,
            pickup_address: job.pickup.address.clone(),
            payout: job.driver_share,
            distance: job.distance,
        }
    }

    pub fn uno_action(job: &Job, action: Action) -> Self {
        Notification::UnoAction {
            job_id: job.id,
            action,
            pickup_address: job.pickup.address.clone(),
            payout: job.driver_share,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Notification::NewJob { .. } => "New Ride Request",
            Notification::UnoAction { action, .. } => match action {
                Action::Accept => "Uno Auto-Accepted Job",
                Action::Bid => "Uno Placed Bid",
                Action::Decline => "Uno Declined Job",
            },
        }
    }

    pub fn body(&self) -> String {
        match self {
            Notification::NewJob {
                pickup_address,
                payout,
                distance,
                ..
            } => format!("{payout:.2} • {distance}mi\n{pickup_address}"),
            Notification::UnoAction {
                action,
                pickup_address,
                payout,
                ..
            } => {
                let verb = match action {
                    Action::Accept => "Job accepted",
                    Action::Bid => "Bid placed",
                    Action::Decline => "Job declined",
                };
                format!("{verb}: {payout:.2}\n{pickup_address}")
            }
        }
    }
}

pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Logs each notification and fans it out to subscribers (the `/ws` stream).
pub struct BroadcastNotifier {
    tx: broadcast::Sender<Notification>,
}

impl BroadcastNotifier {
    pub fn new(buffer_size: usize) -> Self {
        let (tx, _unused_rx) = broadcast::channel(buffer_size);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.tx.subscribe()
    }
}

impl Notifier for BroadcastNotifier {
    fn notify(&self, notification: Notification) {
        info!(title = notification.title(), body = %notification.body(), "notification");
        if self.tx.send(notification).is_err() {
            debug!("no notification subscribers");
        }
    }
}
