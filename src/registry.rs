//! Per-session waiter registry
//!
//! Maps a session to the single channel its pending listener is blocked on.
//! The dispatcher delivers into it, the listener registers and releases.
//! The lock only ever guards map access and is never held across an await.

use crate::error::ListenError;
use crate::message::{Message, SessionId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tokio::sync::mpsc;

/// What happens when a second listener registers for a busy session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BusySessionPolicy {
    /// Overwrite the entry; the previous waiter is orphaned until its own timeout
    #[default]
    Replace,

    /// Refuse the new registration with `ListenError::SessionBusy`
    Reject,
}

struct Slot {
    ticket: u64,
    sender: mpsc::Sender<Message>,
}

/// Receiving end of a registration
///
/// Keeps its own sender clone so the channel never reports closure when the
/// registry entry is overwritten or removed: an orphaned waiter stays pending.
/// Dropping it releases the entry if it still owns it.
pub struct Registration {
    session: SessionId,
    ticket: u64,
    receiver: mpsc::Receiver<Message>,
    _keepalive: mpsc::Sender<Message>,
    registry: Weak<WaiterRegistry>,
}

impl Registration {
    pub fn session(&self) -> SessionId {
        self.session
    }

    pub fn ticket(&self) -> u64 {
        self.ticket
    }

    /// Wait for the next delivered message
    pub async fn recv(&mut self) -> Option<Message> {
        self.receiver.recv().await
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.release(self);
        }
    }
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("session", &self.session)
            .field("ticket", &self.ticket)
            .finish()
    }
}

/// Session-keyed map of pending waiters
pub struct WaiterRegistry {
    waiters: Mutex<HashMap<SessionId, Slot>>,
    next_ticket: AtomicU64,
    policy: BusySessionPolicy,
}

impl WaiterRegistry {
    pub fn new(policy: BusySessionPolicy) -> Self {
        Self {
            waiters: Mutex::new(HashMap::new()),
            next_ticket: AtomicU64::new(1),
            policy,
        }
    }

    pub fn policy(&self) -> BusySessionPolicy {
        self.policy
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<SessionId, Slot>> {
        self.waiters.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a waiter for `session`
    pub fn register(self: &Arc<Self>, session: SessionId) -> Result<Registration, ListenError> {
        let (sender, receiver) = mpsc::channel(1);
        let ticket = self.next_ticket.fetch_add(1, Ordering::Relaxed);

        let replaced = {
            let mut waiters = self.lock();
            if let Some(existing) = waiters.get(&session) {
                // A waiter whose receiver is gone no longer counts as busy
                if self.policy == BusySessionPolicy::Reject && !existing.sender.is_closed() {
                    return Err(ListenError::SessionBusy { session });
                }
            }
            waiters
                .insert(
                    session,
                    Slot {
                        ticket,
                        sender: sender.clone(),
                    },
                )
                .map(|slot| slot.ticket)
        };

        if let Some(orphaned) = replaced {
            tracing::debug!(%session, ticket, orphaned, "Replaced pending waiter");
        } else {
            tracing::debug!(%session, ticket, "Registered waiter");
        }

        Ok(Registration {
            session,
            ticket,
            receiver,
            _keepalive: sender,
            registry: Arc::downgrade(self),
        })
    }

    /// Hand `message` to the waiter for `session`
    ///
    /// Returns false when nobody is waiting (or the waiter went away), in which
    /// case the message should go through normal routing.
    pub async fn deliver(&self, session: SessionId, message: Message) -> bool {
        let sender = {
            let waiters = self.lock();
            match waiters.get(&session) {
                Some(slot) => slot.sender.clone(),
                None => return false,
            }
        };

        let delivered = sender.send(message).await.is_ok();
        tracing::debug!(%session, delivered, "Delivered message to waiter");
        delivered
    }

    /// Remove whatever waiter is registered for `session`
    pub fn unregister(&self, session: SessionId) -> bool {
        let removed = self.lock().remove(&session).is_some();
        if removed {
            tracing::debug!(%session, "Unregistered waiter");
        }
        removed
    }

    /// Remove the entry only if it still belongs to `registration`
    pub fn release(&self, registration: &Registration) -> bool {
        let mut waiters = self.lock();
        match waiters.get(&registration.session) {
            Some(slot) if slot.ticket == registration.ticket => {
                waiters.remove(&registration.session);
                tracing::debug!(
                    session = %registration.session,
                    ticket = registration.ticket,
                    "Released waiter"
                );
                true
            }
            _ => false,
        }
    }

    pub fn is_waiting(&self, session: SessionId) -> bool {
        self.lock().contains_key(&session)
    }

    /// Ticket of the current waiter for `session`
    pub fn current_ticket(&self, session: SessionId) -> Option<u64> {
        self.lock().get(&session).map(|slot| slot.ticket)
    }

    /// Number of sessions with a pending waiter
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for WaiterRegistry {
    fn default() -> Self {
        Self::new(BusySessionPolicy::default())
    }
}
