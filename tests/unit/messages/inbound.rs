use gambit::hub::HubError;
use gambit::messages::{InboundMessage, OutboundMessage};
use serde_json::json;

#[cfg(test)]
mod decode_tests {
    use super::*;

    #[test]
    fn test_every_kind_decodes() {
        let cases = vec![
            (
                json!({"type": "auth", "credential": "alice.sig"}),
                InboundMessage::Auth {
                    credential: "alice.sig".to_string(),
                },
            ),
            (
                json!({"type": "join_game", "gameId": "g1"}),
                InboundMessage::JoinGame {
                    game_id: "g1".to_string(),
                },
            ),
            (
                json!({"type": "leave_game", "gameId": "g1"}),
                InboundMessage::LeaveGame {
                    game_id: "g1".to_string(),
                },
            ),
            (json!({"type": "ping"}), InboundMessage::Ping),
            (
                json!({"type": "submit_move", "gameId": "g1", "move": "Nf3"}),
                InboundMessage::SubmitMove {
                    game_id: "g1".to_string(),
                    token: "Nf3".to_string(),
                },
            ),
            (
                json!({"type": "resign", "gameId": "g1"}),
                InboundMessage::Resign {
                    game_id: "g1".to_string(),
                },
            ),
            (
                json!({"type": "offer_draw", "gameId": "g1"}),
                InboundMessage::OfferDraw {
                    game_id: "g1".to_string(),
                },
            ),
            (
                json!({"type": "accept_draw", "gameId": "g1"}),
                InboundMessage::AcceptDraw {
                    game_id: "g1".to_string(),
                },
            ),
            (json!({"type": "find_match"}), InboundMessage::FindMatch),
            (json!({"type": "cancel_match"}), InboundMessage::CancelMatch),
        ];

        for (value, expected) in cases {
            let decoded = InboundMessage::decode(&value).unwrap();
            assert_eq!(decoded.kind(), value["type"].as_str().unwrap());
            assert_eq!(decoded, expected);
        }
    }

    #[test]
    fn test_rejections_carry_codes() {
        let unknown = InboundMessage::decode(&json!({"type": "teleport"})).unwrap_err();
        assert!(matches!(unknown, HubError::UnknownMessageType(ref t) if t == "teleport"));
        assert_eq!(unknown.code(), "UNKNOWN_MESSAGE_TYPE");

        let missing = InboundMessage::decode(&json!({"type": "submit_move", "gameId": "g1"}))
            .unwrap_err();
        assert_eq!(missing.code(), "MISSING_FIELD");
        assert_eq!(missing.to_string(), "Missing move");

        let empty = InboundMessage::decode(&json!({"type": "join_game", "gameId": ""}))
            .unwrap_err();
        assert!(matches!(empty, HubError::MissingField(ref f) if f == "gameId"));

        let no_type = InboundMessage::decode(&json!({"gameId": "g1"})).unwrap_err();
        assert!(matches!(no_type, HubError::MissingField(ref f) if f == "type"));

        let not_object = InboundMessage::decode(&json!(["ping"])).unwrap_err();
        assert_eq!(not_object.code(), "MALFORMED_MESSAGE");

        let wrong_type = InboundMessage::decode(&json!({"type": "join_game", "gameId": 7}))
            .unwrap_err();
        assert!(matches!(wrong_type, HubError::Malformed(_)));
    }

    #[test]
    fn test_error_frame_shape() {
        let value = serde_json::to_value(OutboundMessage::error("MISSING_FIELD", "Missing move"))
            .unwrap();
        assert_eq!(
            value,
            json!({"type": "error", "code": "MISSING_FIELD", "message": "Missing move"})
        );
    }
}
