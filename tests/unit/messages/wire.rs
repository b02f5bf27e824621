use gambit::messages::{FramedMessage, WireConfig, WireProtocolError};
use serde_json::{json, Value};
use std::time::Duration;
use tokio_test::io::Builder;

fn frame(body: &[u8]) -> Vec<u8> {
    let mut bytes = (body.len() as u32).to_be_bytes().to_vec();
    bytes.extend_from_slice(body);
    bytes
}

#[cfg(test)]
mod partial_io_tests {
    use super::*;

    #[tokio::test]
    async fn test_frame_split_across_reads() {
        let body = br#"{"type":"ping"}"#;
        let bytes = frame(body);
        let mut reader = Builder::new()
            .read(&bytes[..2])
            .read(&bytes[2..5])
            .read(&bytes[5..9])
            .read(&bytes[9..])
            .build();

        let framed = FramedMessage::default();
        let value = framed.read_message(&mut reader).await.unwrap();
        assert_eq!(value, Some(json!({"type": "ping"})));
    }

    #[tokio::test]
    async fn test_back_to_back_frames() {
        let mut bytes = frame(br#"{"type":"ping"}"#);
        bytes.extend(frame(br#"{"type":"find_match"}"#));
        let mut reader = Builder::new().read(&bytes).build();

        let framed = FramedMessage::default();
        let first = framed.read_message(&mut reader).await.unwrap().unwrap();
        let second = framed.read_message(&mut reader).await.unwrap().unwrap();
        assert_eq!(first["type"], "ping");
        assert_eq!(second["type"], "find_match");
        assert_eq!(framed.read_message(&mut reader).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_eof_inside_prefix_or_body() {
        let framed = FramedMessage::default();

        let mut truncated_prefix = Builder::new().read(&[0, 0]).build();
        assert!(matches!(
            framed.read_message(&mut truncated_prefix).await,
            Err(WireProtocolError::UnexpectedEof { .. })
        ));

        let bytes = frame(br#"{"type":"ping"}"#);
        let mut truncated_body = Builder::new().read(&bytes[..8]).build();
        assert!(matches!(
            framed.read_message(&mut truncated_body).await,
            Err(WireProtocolError::UnexpectedEof { .. })
        ));
    }
}

#[cfg(test)]
mod length_prefix_tests {
    use super::*;

    #[tokio::test]
    async fn test_zero_length_rejected() {
        let mut reader = Builder::new().read(&[0, 0, 0, 0]).build();
        assert!(matches!(
            FramedMessage::default().read_message(&mut reader).await,
            Err(WireProtocolError::InvalidLength { length: 0 })
        ));
    }

    #[tokio::test]
    async fn test_oversized_prefix_rejected_before_body() {
        let framed = FramedMessage::new(WireConfig::with_max_message_size(16));
        let mut reader = Builder::new().read(&1024u32.to_be_bytes()).build();
        match framed.read_message(&mut reader).await {
            Err(WireProtocolError::MessageTooLarge { size, max_size }) => {
                assert_eq!(size, 1024);
                assert_eq!(max_size, 16);
            }
            other => panic!("expected MessageTooLarge, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_oversized_outbound_rejected() {
        let framed = FramedMessage::new(WireConfig::with_max_message_size(8));
        let mut sink = Vec::new();
        let result = framed
            .write_message(&mut sink, &json!({"type": "pong", "padding": "xxxxxxxx"}))
            .await;
        assert!(matches!(result, Err(WireProtocolError::MessageTooLarge { .. })));
        assert!(sink.is_empty());
    }
}

#[cfg(test)]
mod body_tests {
    use super::*;

    #[tokio::test]
    async fn test_non_json_body_is_recoverable() {
        let mut bytes = frame(b"not json");
        bytes.extend(frame(br#"{"type":"ping"}"#));
        let mut reader = Builder::new().read(&bytes).build();

        let framed = FramedMessage::default();
        let err = framed.read_message(&mut reader).await.unwrap_err();
        assert!(err.is_recoverable());

        // The stream stays aligned on the next frame
        let next = framed.read_message(&mut reader).await.unwrap().unwrap();
        assert_eq!(next["type"], "ping");
    }

    #[tokio::test]
    async fn test_written_frame_reads_back() {
        let (mut client, mut server) = tokio::io::duplex(1024);
        let framed = FramedMessage::default();
        let message = json!({"type": "submit_move", "gameId": "g1", "move": "e4"});

        framed.write_message(&mut client, &message).await.unwrap();
        let received: Value = framed.read_message(&mut server).await.unwrap().unwrap();
        assert_eq!(received, message);
    }

    #[tokio::test]
    async fn test_read_timeout() {
        let (_client, mut server) = tokio::io::duplex(64);
        let framed = FramedMessage::new(WireConfig::new(
            1024,
            Duration::from_millis(20),
            Duration::from_secs(1),
        ));
        assert!(matches!(
            framed.read_message_with_timeout(&mut server).await,
            Err(WireProtocolError::ReadTimeout { .. })
        ));
    }
}
