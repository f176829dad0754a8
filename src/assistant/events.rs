use crate::models::types::{ApprovalRequest, ToolCallResult};

use serde_derive::Serialize;
use serde_json::Value as JsonValue;
use tokio::sync::mpsc;

/// Lifecycle events forwarded from the conversation loop to the UI.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AssistantEvent {
    ToolCallStart {
        call_id: String,
        name: String,
        arguments: JsonValue,
    },
    ToolCallResult {
        call_id: String,
        name: String,
        success: bool,
        payload: JsonValue,
    },
    AssistantDelta {
        text: String,
    },
    ApprovalRequired {
        request: ApprovalRequest,
    },
    ApprovalResolved {
        request_id: uuid::Uuid,
        approved: bool,
    },
    Error {
        message: String,
    },
    TurnComplete,
}

impl AssistantEvent {
    pub fn tool_result(result: &ToolCallResult) -> Self {
        AssistantEvent::ToolCallResult {
            call_id: result.call_id.clone(),
            name: result.name.clone(),
            success: result.is_success(),
            payload: result.payload(),
        }
    }
}

pub type EventReceiver = mpsc::UnboundedReceiver<AssistantEvent>;

/// Sending half of the relay. Events are delivered in emission order, at most
/// once, to a single receiver.
#[derive(Clone)]
pub struct EventRelay {
    tx: mpsc::UnboundedSender<AssistantEvent>,
}

impl EventRelay {
    pub fn channel() -> (EventRelay, EventReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        (EventRelay { tx }, rx)
    }

    pub fn emit(&self, event: AssistantEvent) {
        if let Err(e) = self.tx.send(event) {
            log::debug!("No UI subscribed, dropping event: {:?}", e.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_event_wire_format() {
        let event = AssistantEvent::ToolCallStart {
            call_id: "call_1".to_string(),
            name: "get_accounts".to_string(),
            arguments: json!({"customer_id": "C001"}),
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "tool_call_start");
        assert_eq!(value["arguments"]["customer_id"], "C001");

        let delta = serde_json::to_value(AssistantEvent::AssistantDelta {
            text: "Hi".to_string(),
        })
        .unwrap();
        assert_eq!(delta, json!({"type": "assistant_delta", "text": "Hi"}));

        let done = serde_json::to_value(AssistantEvent::TurnComplete).unwrap();
        assert_eq!(done, json!({"type": "turn_complete"}));
    }

    #[tokio::test]
    async fn test_relay_preserves_order() {
        let (relay, mut rx) = EventRelay::channel();
        for i in 0..5 {
            relay.emit(AssistantEvent::AssistantDelta { text: i.to_string() });
        }
        for i in 0..5 {
            assert_eq!(
                rx.recv().await.unwrap(),
                AssistantEvent::AssistantDelta { text: i.to_string() }
            );
        }
    }

    #[test]
    fn test_emit_without_receiver_is_silent() {
        let (relay, rx) = EventRelay::channel();
        drop(rx);
        relay.emit(AssistantEvent::TurnComplete);
    }
}
