//! Shared fixtures for use case tests.

use std::{collections::HashMap, sync::Arc};

use serde_json::Value;
use tilecast_shared::time::{Clock, ManualClock};
use tokio::sync::{Mutex, mpsc};

use crate::{
    domain::{
        ConnectionId, DisplayName, HubPolicy, HubRepository, MessagePusher, PairingCode,
        PairingHub, Role, Timestamp, pairing_code::MockCodeGenerator,
    },
    infrastructure::{message_pusher::WebSocketMessagePusher, repository::InMemoryHubRepository},
};

pub const T0: i64 = 1_700_000_000_000;

/// Repository, pusher and clock wired together, with codes 482913, 482914, ...
pub struct Harness {
    pub repository: Arc<InMemoryHubRepository>,
    pub message_pusher: Arc<WebSocketMessagePusher>,
    pub clock: Arc<ManualClock>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_policy(HubPolicy::default())
    }

    pub fn with_policy(policy: HubPolicy) -> Self {
        let mut generator = MockCodeGenerator::new();
        let mut next = 482_913;
        generator.expect_generate().returning(move || {
            let code = PairingCode::from_number(next);
            next += 1;
            code
        });
        let hub = PairingHub::new(policy, Box::new(generator));
        Self {
            repository: Arc::new(InMemoryHubRepository::new(Arc::new(Mutex::new(hub)))),
            message_pusher: Arc::new(WebSocketMessagePusher::new(Arc::new(Mutex::new(
                HashMap::new(),
            )))),
            clock: Arc::new(ManualClock::new(T0)),
        }
    }

    pub fn now(&self) -> Timestamp {
        Timestamp::new(self.clock.now_millis())
    }

    /// Open and register a connection, returning its outbound queue.
    pub async fn join(
        &self,
        role: Role,
        name: &str,
    ) -> (ConnectionId, mpsc::UnboundedReceiver<String>) {
        let id = ConnectionId::generate();
        let (tx, rx) = mpsc::unbounded_channel();
        self.message_pusher.register_client(id.clone(), tx).await;
        self.repository.open(&id, self.now()).await.result.unwrap();
        self.repository
            .register(
                &id,
                role,
                Some(DisplayName::new(name.to_string()).unwrap()),
                self.now(),
            )
            .await
            .result
            .unwrap();
        (id, rx)
    }
}

/// Everything queued so far, decoded as JSON.
pub fn drain(rx: &mut mpsc::UnboundedReceiver<String>) -> Vec<Value> {
    let mut messages = Vec::new();
    while let Ok(text) = rx.try_recv() {
        messages.push(serde_json::from_str(&text).unwrap());
    }
    messages
}

/// Types of the queued messages, in order.
pub fn drain_types(rx: &mut mpsc::UnboundedReceiver<String>) -> Vec<String> {
    drain(rx)
        .into_iter()
        .map(|m| m["type"].as_str().unwrap_or_default().to_string())
        .collect()
}
