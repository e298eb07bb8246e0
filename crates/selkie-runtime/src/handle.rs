//! Actor handles for external invocations
//!
//! A handle is a cloneable (type, id)-bound convenience wrapper over the
//! runtime's dispatcher boundary.

use crate::runtime::ActorRuntime;
use bytes::Bytes;
use selkie_core::{ActorId, Error, Result};
use std::sync::Arc;

/// Handle bound to one actor
#[derive(Clone)]
pub struct ActorHandle {
    actor_type: String,
    id: ActorId,
    runtime: Arc<ActorRuntime>,
}

impl ActorHandle {
    /// Create a new handle
    pub(crate) fn new(actor_type: String, id: ActorId, runtime: Arc<ActorRuntime>) -> Self {
        Self {
            actor_type,
            id,
            runtime,
        }
    }

    /// Get the actor's id
    pub fn id(&self) -> &ActorId {
        &self.id
    }

    /// Get the actor's type name
    pub fn actor_type(&self) -> &str {
        &self.actor_type
    }

    /// Activate the actor
    pub async fn activate(&self) -> Result<()> {
        self.runtime.activate(&self.actor_type, &self.id).await
    }

    /// Invoke a method with a raw payload
    pub async fn invoke(&self, method: &str, payload: Bytes) -> Result<Bytes> {
        self.runtime
            .invoke(&self.actor_type, &self.id, method, payload)
            .await
    }

    /// Invoke with a typed request and response
    ///
    /// Serializes the request to JSON, invokes the actor, and deserializes
    /// the response.
    pub async fn request<Req, Resp>(&self, method: &str, request: &Req) -> Result<Resp>
    where
        Req: serde::Serialize,
        Resp: serde::de::DeserializeOwned,
    {
        let payload = serde_json::to_vec(request)
            .map_err(|e| Error::serialization_failed(format!("request for {}: {}", method, e)))?;

        let response = self.invoke(method, Bytes::from(payload)).await?;

        serde_json::from_slice(&response).map_err(|e| Error::DeserializationFailed {
            reason: format!("response for {}: {}", method, e),
        })
    }

    /// Deactivate the actor
    pub async fn deactivate(&self) -> Result<()> {
        self.runtime.deactivate(&self.actor_type, &self.id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ActorContext;
    use crate::instance::Actor;
    use crate::manager::CloneFactory;
    use crate::runtime::ActorRuntime;
    use async_trait::async_trait;
    use selkie_core::ActorTypeInformation;
    use selkie_host::MemoryHost;

    #[derive(serde::Serialize, serde::Deserialize)]
    struct EchoRequest {
        message: String,
    }

    #[derive(serde::Serialize, serde::Deserialize)]
    struct EchoResponse {
        message: String,
    }

    #[derive(Clone)]
    struct JsonEchoActor;

    #[async_trait]
    impl Actor for JsonEchoActor {
        async fn invoke(
            &self,
            _ctx: &mut ActorContext,
            method: &str,
            payload: Bytes,
        ) -> Result<Bytes> {
            match method {
                "echo" => {
                    let req: EchoRequest = serde_json::from_slice(&payload).map_err(|e| {
                        Error::DeserializationFailed {
                            reason: e.to_string(),
                        }
                    })?;
                    let resp = EchoResponse {
                        message: req.message.to_uppercase(),
                    };
                    let bytes = serde_json::to_vec(&resp)
                        .map_err(|e| Error::serialization_failed(e.to_string()))?;
                    Ok(Bytes::from(bytes))
                }
                _ => Err(Error::InvalidOperation {
                    operation: method.to_string(),
                }),
            }
        }
    }

    fn runtime() -> Arc<ActorRuntime> {
        Arc::new(
            ActorRuntime::builder()
                .with_host(Arc::new(MemoryHost::new()))
                .register_actor(
                    ActorTypeInformation::new("JsonEcho").unwrap(),
                    Arc::new(CloneFactory::new(JsonEchoActor)),
                )
                .build()
                .unwrap(),
        )
    }

    #[tokio::test]
    async fn test_handle_lifecycle_and_typed_request() {
        let runtime = runtime();
        let handle = runtime
            .actor("JsonEcho", ActorId::new("echo-1").unwrap())
            .unwrap();

        handle.activate().await.unwrap();

        let request = EchoRequest {
            message: "hello world".to_string(),
        };
        let response: EchoResponse = handle.request("echo", &request).await.unwrap();
        assert_eq!(response.message, "HELLO WORLD");

        handle.deactivate().await.unwrap();
    }

    #[tokio::test]
    async fn test_handle_unknown_type_fails_fast() {
        let runtime = runtime();
        let result = runtime.actor("Unknown", ActorId::new("x").unwrap());
        assert!(matches!(result, Err(Error::ActorTypeNotRegistered { .. })));
    }
}
