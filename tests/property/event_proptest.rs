//! Property-based tests for the event contract

use convoflow::shared::{ClientEvent, MessageKind};
use proptest::prelude::*;
use uuid::Uuid;

proptest! {
    #[test]
    fn test_decode_never_panics(frame in ".*") {
        let _ = ClientEvent::decode(&frame);
    }

    #[test]
    fn test_unknown_event_names_are_rejected(name in "[a-zA-Z]{1,24}") {
        prop_assume!(![
            "sendMessage",
            "markMessagesAsSeen",
            "addReaction",
            "forwardMessage",
            "deleteMessage",
        ]
        .contains(&name.as_str()));

        let frame = serde_json::json!({ "event": name, "data": {} }).to_string();
        prop_assert!(ClientEvent::decode(&frame).is_err());
    }

    #[test]
    fn test_send_message_keeps_content(content in ".*", raw_id in any::<u128>()) {
        let receiver_id = Uuid::from_u128(raw_id);
        let frame = serde_json::json!({
            "event": "sendMessage",
            "data": { "receiverId": receiver_id, "content": content },
        })
        .to_string();

        let decoded = ClientEvent::decode(&frame).unwrap();
        prop_assert_eq!(
            decoded,
            ClientEvent::SendMessage {
                receiver_id,
                kind: MessageKind::Text,
                content: Some(content),
                payload_id: None,
                duration_ms: None,
            }
        );
    }
}
