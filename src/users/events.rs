use serde::Serialize;
use time::Date;
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{info, warn};

/// Notification emitted after a successful registration.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserRegistered {
    pub user_id: i64,
    pub email: String,
    pub username: String,
    pub created_date: Date,
}

/// Fire-and-forget sink for registration notifications.
pub trait RegistrationPublisher: Send + Sync {
    fn publish(&self, event: UserRegistered);
}

/// Publisher handing events to an in-process consumer task.
#[derive(Clone)]
pub struct ChannelPublisher {
    tx: mpsc::UnboundedSender<UserRegistered>,
}

impl ChannelPublisher {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<UserRegistered>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Publisher whose consumer logs every event.
    pub fn with_log_consumer() -> (Self, JoinHandle<()>) {
        let (publisher, rx) = Self::new();
        (publisher, spawn_log_consumer(rx))
    }
}

impl RegistrationPublisher for ChannelPublisher {
    fn publish(&self, event: UserRegistered) {
        let user_id = event.user_id;
        if self.tx.send(event).is_err() {
            warn!(user_id, "registration consumer gone; event dropped");
        }
    }
}

pub fn spawn_log_consumer(mut rx: mpsc::UnboundedReceiver<UserRegistered>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(ev) = rx.recv().await {
            info!(
                user_id = ev.user_id,
                email = %ev.email,
                username = %ev.username,
                created_date = %ev.created_date,
                "user registered event"
            );
        }
    })
}
