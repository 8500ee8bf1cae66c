//! Policy router: explicit event-type to handler dispatch.
//!
//! Handlers are registered against exact `event_type` strings at construction
//! time. An event with no registered handler is not an error; routing returns
//! `None` and the processor moves on.

use std::collections::HashMap;
use std::sync::Arc;

use sqlx::SqliteConnection;
use tracing::debug;

use crate::domain::errors::DomainResult;
use crate::domain::models::{Decision, SupervisorEvent};
use crate::domain::ports::PolicyHandler;

#[derive(Default)]
pub struct PolicyRouter {
    handlers: HashMap<String, Arc<dyn PolicyHandler>>,
}

impl PolicyRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for one event type, replacing any previous one.
    pub fn register(&mut self, event_type: impl Into<String>, handler: Arc<dyn PolicyHandler>) {
        let event_type = event_type.into();
        if self.handlers.insert(event_type.clone(), handler).is_some() {
            debug!(event_type = %event_type, "Replaced policy handler");
        }
    }

    pub fn is_registered(&self, event_type: &str) -> bool {
        self.handlers.contains_key(event_type)
    }

    /// Registered event types, sorted for stable output.
    pub fn event_types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        types.sort_unstable();
        types
    }

    /// Dispatch an event to its handler, if one is registered.
    pub async fn route(
        &self,
        event: &SupervisorEvent,
        conn: &mut SqliteConnection,
    ) -> DomainResult<Option<Decision>> {
        let Some(handler) = self.handlers.get(&event.event_type) else {
            debug!(
                event_id = %event.event_id,
                event_type = %event.event_type,
                "No policy registered"
            );
            return Ok(None);
        };
        handler.handle(event, conn).await
    }
}
