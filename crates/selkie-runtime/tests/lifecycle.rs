//! End-to-end lifecycle tests against the in-memory host

use async_trait::async_trait;
use bytes::Bytes;
use selkie_core::{ActorId, ActorTrace, ActorTypeInformation, Error, ReminderParams, Result};
use selkie_host::{HostClient, MemoryHost, StateOperation};
use selkie_runtime::{Actor, ActorContext, ActorRuntime, CloneFactory};
use std::sync::{Arc, Mutex};
use std::time::Duration;

type Events = Arc<Mutex<Vec<String>>>;

fn push(events: &Events, event: impl Into<String>) {
    events.lock().unwrap().push(event.into());
}

// =============================================================================
// Shopping cart scenario
// =============================================================================

#[derive(Clone)]
struct ShoppingCartActor;

#[async_trait]
impl Actor for ShoppingCartActor {
    async fn invoke(
        &self,
        ctx: &mut ActorContext,
        method: &str,
        payload: Bytes,
    ) -> Result<Bytes> {
        match method {
            "add_item" => {
                let items = ctx
                    .get_state("items")
                    .await?
                    .ok_or_else(|| Error::internal("cart not initialized"))?;
                let mut skus: Vec<String> = serde_json::from_slice(&items)
                    .map_err(|e| Error::DeserializationFailed {
                        reason: e.to_string(),
                    })?;
                skus.push(String::from_utf8_lossy(&payload).into_owned());
                let updated = serde_json::to_vec(&skus)
                    .map_err(|e| Error::serialization_failed(e.to_string()))?;
                ctx.set_state("items", Bytes::from(updated.clone()))?;
                Ok(Bytes::from(updated))
            }
            _ => Err(Error::InvalidOperation {
                operation: method.to_string(),
            }),
        }
    }

    async fn on_activate(&self, ctx: &mut ActorContext) -> Result<()> {
        ctx.set_state("items", Bytes::from("[]"))?;
        Ok(())
    }
}

#[tokio::test]
async fn test_shopping_cart_scenario() {
    let host = MemoryHost::new();
    let runtime = ActorRuntime::builder()
        .with_host(Arc::new(host.clone()))
        .register_actor(
            ActorTypeInformation::new("ShoppingCart").unwrap(),
            Arc::new(CloneFactory::new(ShoppingCartActor)),
        )
        .build()
        .unwrap();

    let id = ActorId::new("cart-42").unwrap();

    // Activation: empty cache, on_activate sets items = "[]", save flushes it
    runtime.activate("ShoppingCart", &id).await.unwrap();
    assert_eq!(host.save_state_calls(), 1);
    assert_eq!(
        host.stored_state("ShoppingCart", &id, "items").await,
        Some(Bytes::from("[]"))
    );

    // Invocation: user method updates items, post-turn save flushes the update
    runtime
        .invoke("ShoppingCart", &id, "add_item", Bytes::from("sku-7"))
        .await
        .unwrap();
    assert_eq!(host.save_state_calls(), 2);
    assert_eq!(
        host.stored_state("ShoppingCart", &id, "items").await,
        Some(Bytes::from("[\"sku-7\"]"))
    );

    // Deactivation: clear discards the cache, nothing dirty, empty save
    // short-circuits without a host call
    runtime.deactivate("ShoppingCart", &id).await.unwrap();
    assert_eq!(host.save_state_calls(), 2);
    assert!(!runtime.is_active("ShoppingCart", &id).unwrap());

    // The durable store still holds the flushed cart
    assert_eq!(
        host.stored_state("ShoppingCart", &id, "items").await,
        Some(Bytes::from("[\"sku-7\"]"))
    );
}

// =============================================================================
// Activation step ordering
// =============================================================================

/// Host wrapper that records the order of its calls
#[derive(Clone)]
struct RecordingHost {
    inner: MemoryHost,
    events: Events,
}

#[async_trait]
impl HostClient for RecordingHost {
    async fn get_state(
        &self,
        actor_type: &str,
        actor_id: &ActorId,
        key: &str,
    ) -> Result<Option<Bytes>> {
        push(&self.events, "host:get_state");
        self.inner.get_state(actor_type, actor_id, key).await
    }

    async fn save_state(
        &self,
        actor_type: &str,
        actor_id: &ActorId,
        operations: &[StateOperation],
    ) -> Result<()> {
        push(&self.events, "host:save_state");
        self.inner.save_state(actor_type, actor_id, operations).await
    }

    async fn register_reminder(
        &self,
        actor_type: &str,
        actor_id: &ActorId,
        name: &str,
        payload: Bytes,
    ) -> Result<()> {
        push(&self.events, "host:register_reminder");
        self.inner
            .register_reminder(actor_type, actor_id, name, payload)
            .await
    }

    async fn unregister_reminder(
        &self,
        actor_type: &str,
        actor_id: &ActorId,
        name: &str,
    ) -> Result<()> {
        self.inner
            .unregister_reminder(actor_type, actor_id, name)
            .await
    }

    async fn register_timer(
        &self,
        actor_type: &str,
        actor_id: &ActorId,
        name: &str,
        payload: Bytes,
    ) -> Result<()> {
        push(&self.events, "host:register_timer");
        self.inner
            .register_timer(actor_type, actor_id, name, payload)
            .await
    }

    async fn unregister_timer(
        &self,
        actor_type: &str,
        actor_id: &ActorId,
        name: &str,
    ) -> Result<()> {
        self.inner.unregister_timer(actor_type, actor_id, name).await
    }
}

/// Trace sink that records every message
struct RecordingTrace {
    events: Events,
}

impl ActorTrace for RecordingTrace {
    fn write_info(&self, _category: &str, _entity_id: &str, message: &str) {
        push(&self.events, format!("trace:{}", message));
    }
}

#[derive(Clone)]
struct SlowActivateActor {
    events: Events,
}

#[async_trait]
impl Actor for SlowActivateActor {
    async fn invoke(
        &self,
        _ctx: &mut ActorContext,
        _method: &str,
        payload: Bytes,
    ) -> Result<Bytes> {
        Ok(payload)
    }

    async fn on_activate(&self, ctx: &mut ActorContext) -> Result<()> {
        // A slow hook must not let later steps start early
        tokio::time::sleep(Duration::from_millis(50)).await;
        ctx.set_state("ready", Bytes::from("true"))?;
        push(&self.events, "hook:on_activate");
        Ok(())
    }
}

#[tokio::test]
async fn test_activation_steps_complete_strictly_in_order() {
    let events: Events = Default::default();
    let host = RecordingHost {
        inner: MemoryHost::new(),
        events: events.clone(),
    };
    let runtime = ActorRuntime::builder()
        .with_host(Arc::new(host))
        .with_trace(Arc::new(RecordingTrace {
            events: events.clone(),
        }))
        .register_actor(
            ActorTypeInformation::new("Slow").unwrap(),
            Arc::new(CloneFactory::new(SlowActivateActor {
                events: events.clone(),
            })),
        )
        .build()
        .unwrap();

    let id = ActorId::new("slow-1").unwrap();
    runtime.activate("Slow", &id).await.unwrap();

    let recorded = events.lock().unwrap().clone();
    assert_eq!(
        recorded,
        vec![
            "trace:Activating ...",
            "hook:on_activate",
            "trace:Activated",
            "host:save_state",
        ]
    );
}

// =============================================================================
// Lifecycle rejection
// =============================================================================

#[derive(Clone)]
struct BrokenActor;

#[async_trait]
impl Actor for BrokenActor {
    async fn invoke(
        &self,
        _ctx: &mut ActorContext,
        _method: &str,
        _payload: Bytes,
    ) -> Result<Bytes> {
        Ok(Bytes::new())
    }

    async fn on_activate(&self, _ctx: &mut ActorContext) -> Result<()> {
        Err(anyhow::anyhow!("dependency unavailable").into())
    }
}

#[tokio::test]
async fn test_failed_activation_rejects_later_invocations() {
    let host = MemoryHost::new();
    let runtime = ActorRuntime::builder()
        .with_host(Arc::new(host.clone()))
        .register_actor(
            ActorTypeInformation::new("Broken").unwrap(),
            Arc::new(CloneFactory::new(BrokenActor)),
        )
        .build()
        .unwrap();

    let id = ActorId::new("broken-1").unwrap();
    let result = runtime.activate("Broken", &id).await;
    assert!(matches!(result, Err(Error::LifecycleStepFailed { .. })));
    assert!(!runtime.is_active("Broken", &id).unwrap());

    // No instance reachable for dispatch
    let result = runtime.invoke("Broken", &id, "anything", Bytes::new()).await;
    assert!(matches!(result, Err(Error::ActorNotActive { .. })));

    // The aborted activation never flushed state
    assert_eq!(host.save_state_calls(), 0);
}

// =============================================================================
// Timers and reminders end to end
// =============================================================================

#[derive(Clone)]
struct SchedulingActor;

#[async_trait]
impl Actor for SchedulingActor {
    async fn invoke(
        &self,
        ctx: &mut ActorContext,
        method: &str,
        payload: Bytes,
    ) -> Result<Bytes> {
        match method {
            "arm_unnamed_timers" => {
                let first = ctx
                    .register_timer(
                        None,
                        "on_tick",
                        Bytes::new(),
                        Duration::from_secs(1),
                        Duration::from_secs(1),
                    )
                    .await?;
                let second = ctx
                    .register_timer(
                        None,
                        "on_tick",
                        Bytes::new(),
                        Duration::from_secs(1),
                        Duration::from_secs(1),
                    )
                    .await?;
                Ok(Bytes::from(format!("{},{}", first.name(), second.name())))
            }
            "schedule_expiry" => {
                ctx.register_reminder(
                    "expiry",
                    ReminderParams::new(payload, Duration::from_secs(60), Duration::from_secs(0)),
                )
                .await?;
                Ok(Bytes::new())
            }
            "on_tick" => {
                ctx.set_state("ticks", Bytes::from("1"))?;
                Ok(Bytes::new())
            }
            _ => Err(Error::InvalidOperation {
                operation: method.to_string(),
            }),
        }
    }

    async fn on_reminder(
        &self,
        ctx: &mut ActorContext,
        name: &str,
        _payload: Bytes,
    ) -> Result<()> {
        ctx.set_state("last_reminder", Bytes::from(name.to_string()))?;
        Ok(())
    }
}

#[tokio::test]
async fn test_timer_names_are_synthesized_per_actor() {
    let host = MemoryHost::new();
    let runtime = ActorRuntime::builder()
        .with_host(Arc::new(host.clone()))
        .register_actor(
            ActorTypeInformation::new("Scheduler").unwrap(),
            Arc::new(CloneFactory::new(SchedulingActor)),
        )
        .build()
        .unwrap();

    let id = ActorId::new("sched-1").unwrap();
    runtime.activate("Scheduler", &id).await.unwrap();

    let names = runtime
        .invoke("Scheduler", &id, "arm_unnamed_timers", Bytes::new())
        .await
        .unwrap();
    assert_eq!(names, Bytes::from("sched-1_Timer_1,sched-1_Timer_2"));

    let mut registered = host.timer_names("Scheduler", &id).await;
    registered.sort_unstable();
    assert_eq!(registered, vec!["sched-1_Timer_1", "sched-1_Timer_2"]);

    // Firing a synthesized timer routes to its target method and flushes
    runtime
        .fire_timer("Scheduler", &id, "sched-1_Timer_1", Bytes::new())
        .await
        .unwrap();
    assert_eq!(
        host.stored_state("Scheduler", &id, "ticks").await,
        Some(Bytes::from("1"))
    );
}

#[tokio::test]
async fn test_reminder_registration_and_fire() {
    let host = MemoryHost::new();
    let runtime = ActorRuntime::builder()
        .with_host(Arc::new(host.clone()))
        .register_actor(
            ActorTypeInformation::new("Scheduler").unwrap(),
            Arc::new(CloneFactory::new(SchedulingActor)),
        )
        .build()
        .unwrap();

    let id = ActorId::new("sched-2").unwrap();
    runtime.activate("Scheduler", &id).await.unwrap();

    runtime
        .invoke("Scheduler", &id, "schedule_expiry", Bytes::from("order-9"))
        .await
        .unwrap();
    assert_eq!(
        host.reminder_names("Scheduler", &id).await,
        vec!["expiry".to_string()]
    );

    // The host later fires the reminder back at the runtime
    runtime
        .fire_reminder("Scheduler", &id, "expiry", Bytes::from("order-9"))
        .await
        .unwrap();
    assert_eq!(
        host.stored_state("Scheduler", &id, "last_reminder").await,
        Some(Bytes::from("expiry"))
    );
}
