//! Per-type actor manager
//!
//! TigerStyle: Single-threaded per-actor execution, explicit turn routing.
//!
//! Each active actor is owned by a dedicated task fed through a bounded
//! channel: turns are delivered one at a time per actor id, upholding the
//! turn-based concurrency contract by queueing rather than locking, while
//! different actors' turns run fully in parallel.

use crate::context::{ActorContext, RuntimeContext};
use crate::instance::{Actor, ActorInstance};
use bytes::Bytes;
use selkie_core::{ActorId, Error, Result};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument};

// =============================================================================
// Actor factory
// =============================================================================

/// Factory for creating actor implementations
pub trait ActorFactory: Send + Sync + 'static {
    /// Create a new actor for the given id
    fn create(&self, id: &ActorId) -> Box<dyn Actor>;
}

/// Factory that clones a prototype actor
pub struct CloneFactory<A: Actor + Clone> {
    prototype: A,
}

impl<A: Actor + Clone> CloneFactory<A> {
    /// Create a new clone factory
    pub fn new(prototype: A) -> Self {
        Self { prototype }
    }
}

impl<A: Actor + Clone> ActorFactory for CloneFactory<A> {
    fn create(&self, _id: &ActorId) -> Box<dyn Actor> {
        Box::new(self.prototype.clone())
    }
}

/// Factory backed by a closure
pub struct FnFactory<F> {
    f: F,
}

impl<F> FnFactory<F>
where
    F: Fn(&ActorId) -> Box<dyn Actor> + Send + Sync + 'static,
{
    /// Create a new closure factory
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> ActorFactory for FnFactory<F>
where
    F: Fn(&ActorId) -> Box<dyn Actor> + Send + Sync + 'static,
{
    fn create(&self, id: &ActorId) -> Box<dyn Actor> {
        (self.f)(id)
    }
}

// =============================================================================
// Turns
// =============================================================================

/// A queued request against one actor
#[derive(Debug)]
enum TurnRequest {
    Invoke { method: String, payload: Bytes },
    FireTimer { name: String, payload: Bytes },
    FireReminder { name: String, payload: Bytes },
    Deactivate,
}

/// One unit of work queued for an actor task
struct Turn {
    request: TurnRequest,
    reply_tx: oneshot::Sender<Result<Bytes>>,
}

struct ActiveEntry {
    turn_tx: mpsc::Sender<Turn>,
    task: JoinHandle<()>,
}

// =============================================================================
// ActorManager
// =============================================================================

/// Manager for all active actors of one registered type
pub struct ActorManager {
    context: Arc<RuntimeContext>,
    factory: Arc<dyn ActorFactory>,
    mailbox_depth: usize,
    active: Mutex<HashMap<String, ActiveEntry>>,
}

impl ActorManager {
    /// Create a manager for one actor type
    pub fn new(
        context: Arc<RuntimeContext>,
        factory: Arc<dyn ActorFactory>,
        mailbox_depth: usize,
    ) -> Self {
        debug_assert!(mailbox_depth > 0, "mailbox depth must be positive");

        Self {
            context,
            factory,
            mailbox_depth,
            active: Mutex::new(HashMap::new()),
        }
    }

    /// Get the actor type name this manager serves
    pub fn actor_type(&self) -> &str {
        self.context.actor_type()
    }

    /// Activate an actor as directed by the host
    ///
    /// Builds the instance, runs the activation sequence, and installs the
    /// actor task only on success. A failed activation discards the
    /// half-constructed instance; it is never reachable for dispatch.
    #[instrument(skip(self), fields(actor_type = %self.actor_type(), actor_id = %id), level = "debug")]
    pub async fn activate(&self, id: &ActorId) -> Result<()> {
        if self.active.lock().unwrap().contains_key(id.as_str()) {
            return Err(Error::ActorAlreadyActive { id: id.to_string() });
        }

        let actor = self.factory.create(id);
        let actor_context = ActorContext::new(id.clone(), self.context.clone());
        let mut instance = ActorInstance::new(actor, actor_context);

        // The host guarantees no other turn for this id until activation
        // completes, so the sequence runs outside the map lock.
        instance.activate().await?;

        let (turn_tx, turn_rx) = mpsc::channel(self.mailbox_depth);
        let task = tokio::spawn(run_actor_task(instance, turn_rx));

        let mut active = self.active.lock().unwrap();
        if active.contains_key(id.as_str()) {
            // Lost a race against a concurrent activation for the same id;
            // discard the instance we just built.
            task.abort();
            return Err(Error::ActorAlreadyActive { id: id.to_string() });
        }
        active.insert(id.to_string(), ActiveEntry { turn_tx, task });

        debug!(actor_id = %id, "Actor installed");
        Ok(())
    }

    /// Invoke a method on an active actor
    pub async fn invoke(&self, id: &ActorId, method: &str, payload: Bytes) -> Result<Bytes> {
        self.submit(
            id,
            TurnRequest::Invoke {
                method: method.to_string(),
                payload,
            },
        )
        .await
    }

    /// Deliver a timer fire to an active actor
    pub async fn fire_timer(&self, id: &ActorId, name: &str, payload: Bytes) -> Result<()> {
        self.submit(
            id,
            TurnRequest::FireTimer {
                name: name.to_string(),
                payload,
            },
        )
        .await
        .map(|_| ())
    }

    /// Deliver a reminder fire to an active actor
    pub async fn fire_reminder(&self, id: &ActorId, name: &str, payload: Bytes) -> Result<()> {
        self.submit(
            id,
            TurnRequest::FireReminder {
                name: name.to_string(),
                payload,
            },
        )
        .await
        .map(|_| ())
    }

    /// Deactivate an actor and discard its instance
    ///
    /// Turns already queued drain first; the instance is gone afterwards
    /// regardless of the deactivation sequence's outcome.
    #[instrument(skip(self), fields(actor_type = %self.actor_type(), actor_id = %id), level = "debug")]
    pub async fn deactivate(&self, id: &ActorId) -> Result<()> {
        let entry = self
            .active
            .lock()
            .unwrap()
            .remove(id.as_str())
            .ok_or_else(|| Error::actor_not_active(id.as_str()))?;

        let (reply_tx, reply_rx) = oneshot::channel();
        let sent = entry
            .turn_tx
            .send(Turn {
                request: TurnRequest::Deactivate,
                reply_tx,
            })
            .await;

        if sent.is_err() {
            // Task already gone; nothing left to run the sequence against
            return Err(Error::internal(format!(
                "actor task for {} stopped before deactivation",
                id
            )));
        }

        let result = reply_rx
            .await
            .map_err(|_| Error::internal("deactivation reply channel closed"))?;

        if let Err(e) = entry.task.await {
            error!(actor_id = %id, error = %e, "Actor task join failed");
        }

        result.map(|_| ())
    }

    /// Deactivate every active actor (process shutdown)
    pub async fn deactivate_all(&self) {
        let ids: Vec<String> = self.active.lock().unwrap().keys().cloned().collect();
        for id in ids {
            let id = ActorId::new_unchecked(id);
            if let Err(e) = self.deactivate(&id).await {
                error!(actor_id = %id, error = %e, "Deactivation failed during shutdown");
            }
        }
    }

    /// Number of active actors
    pub fn active_count(&self) -> usize {
        self.active.lock().unwrap().len()
    }

    /// Check if an actor is active
    pub fn is_active(&self, id: &ActorId) -> bool {
        self.active.lock().unwrap().contains_key(id.as_str())
    }

    /// Queue one turn and await its result
    async fn submit(&self, id: &ActorId, request: TurnRequest) -> Result<Bytes> {
        let turn_tx = self
            .active
            .lock()
            .unwrap()
            .get(id.as_str())
            .map(|entry| entry.turn_tx.clone())
            .ok_or_else(|| Error::actor_not_active(id.as_str()))?;

        let (reply_tx, reply_rx) = oneshot::channel();
        turn_tx
            .try_send(Turn { request, reply_tx })
            .map_err(|e| match e {
                mpsc::error::TrySendError::Full(_) => Error::MailboxFull {
                    id: id.to_string(),
                    depth: self.mailbox_depth,
                    max: self.mailbox_depth,
                },
                mpsc::error::TrySendError::Closed(_) => Error::actor_not_active(id.as_str()),
            })?;

        reply_rx
            .await
            .map_err(|_| Error::ActorDeactivated { id: id.to_string() })?
    }
}

/// The per-actor task: processes queued turns one at a time
async fn run_actor_task(mut instance: ActorInstance, mut turn_rx: mpsc::Receiver<Turn>) {
    while let Some(turn) = turn_rx.recv().await {
        match turn.request {
            TurnRequest::Invoke { method, payload } => {
                let result = instance.invoke(&method, payload).await;
                let _ = turn.reply_tx.send(result);
            }
            TurnRequest::FireTimer { name, payload } => {
                let result = instance.fire_timer(&name, payload).await.map(|_| Bytes::new());
                let _ = turn.reply_tx.send(result);
            }
            TurnRequest::FireReminder { name, payload } => {
                let result = instance
                    .fire_reminder(&name, payload)
                    .await
                    .map(|_| Bytes::new());
                let _ = turn.reply_tx.send(result);
            }
            TurnRequest::Deactivate => {
                let result = instance.deactivate().await.map(|_| Bytes::new());
                let _ = turn.reply_tx.send(result);
                break;
            }
        }
    }

    // Reject anything still queued behind the deactivation
    turn_rx.close();
    while let Ok(turn) = turn_rx.try_recv() {
        let _ = turn.reply_tx.send(Err(Error::ActorDeactivated {
            id: instance.id().to_string(),
        }));
    }

    info!(actor_id = %instance.id(), "Actor task stopped");
}
