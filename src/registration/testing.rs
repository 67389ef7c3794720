use crate::communication::notifier::{NotificationError, Notifier};
use crate::database::{DatabaseError, User, UserStore};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Stored(i64),
    Notified(i64),
}

/// Records store writes and sends in the order they complete.
#[derive(Default)]
pub struct EventLog(Mutex<Vec<Event>>);

impl EventLog {
    fn push(&self, event: Event) {
        self.0.lock().unwrap().push(event);
    }

    pub fn events(&self) -> Vec<Event> {
        self.0.lock().unwrap().clone()
    }
}

pub struct MemoryStore {
    users: Mutex<HashMap<i64, User>>,
    events: Arc<EventLog>,
    failing: AtomicBool,
    delay: Option<Duration>,
}

impl MemoryStore {
    pub fn new(events: Arc<EventLog>) -> Self {
        Self {
            users: Mutex::new(HashMap::new()),
            events,
            failing: AtomicBool::new(false),
            delay: None,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn user(&self, tg_id: i64) -> Option<User> {
        self.users.lock().unwrap().get(&tg_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.users.lock().unwrap().len()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn ensure_schema(&self) -> Result<(), DatabaseError> {
        Ok(())
    }

    async fn upsert_user(&self, user: &User) -> Result<(), DatabaseError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(DatabaseError::ConnectionError("connection refused".to_string()));
        }
        self.users.lock().unwrap().insert(user.tg_id, user.clone());
        self.events.push(Event::Stored(user.tg_id));
        Ok(())
    }

    async fn get_user(&self, tg_id: i64) -> Result<Option<User>, DatabaseError> {
        Ok(self.user(tg_id))
    }
}

pub struct RecordingNotifier {
    sent: Mutex<Vec<(i64, String)>>,
    events: Arc<EventLog>,
    unreachable: HashSet<i64>,
    delay: Option<Duration>,
}

impl RecordingNotifier {
    pub fn new(events: Arc<EventLog>) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            events,
            unreachable: HashSet::new(),
            delay: None,
        }
    }

    /// Sends to `recipient` fail with a delivery error.
    pub fn unreachable(mut self, recipient: i64) -> Self {
        self.unreachable.insert(recipient);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn sent(&self) -> Vec<(i64, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, recipient: i64, text: &str) -> Result<(), NotificationError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.unreachable.contains(&recipient) {
            return Err(NotificationError::DeliveryError(
                "Forbidden: bot was blocked by the user".to_string(),
            ));
        }
        self.sent.lock().unwrap().push((recipient, text.to_string()));
        self.events.push(Event::Notified(recipient));
        Ok(())
    }
}
