//! Wire types for the WhatsApp gateway API.

use serde::{Deserialize, Serialize};

/// Request body for sending a message.
#[derive(Debug, Clone, Serialize)]
pub struct SendParams {
    /// Recipient phone number.
    pub to: String,
    /// Text body (or caption when `media_url` is set).
    pub body: String,
    /// Media to attach, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_url: Option<String>,
}

/// Delivery receipt returned by the gateway on a successful send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryReceipt {
    /// Gateway-assigned message ID.
    pub message_id: String,
    /// Delivery status reported at accept time (e.g., "queued", "sent").
    pub status: String,
    /// Gateway timestamp (epoch milliseconds).
    pub timestamp: i64,
}

/// The content of an inbound message, tagged by kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InboundBody {
    /// Plain text message.
    Text {
        /// The message text.
        body: String,
    },
    /// Voice note or audio file.
    Audio {
        /// Where the gateway stored the media.
        media_url: String,
        /// MIME type (e.g., "audio/ogg").
        mime_type: String,
        /// Transcription, when the gateway provides one.
        #[serde(default)]
        transcription: Option<String>,
    },
    /// Image/video/document attachment.
    Media {
        /// Where the gateway stored the media.
        media_url: String,
        /// MIME type.
        mime_type: String,
        /// Caption typed by the sender, if any.
        #[serde(default)]
        caption: Option<String>,
    },
    /// Shared location pin.
    Location {
        /// Latitude.
        latitude: f64,
        /// Longitude.
        longitude: f64,
    },
}

/// An inbound message delivered to the webhook endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundPayload {
    /// Gateway-assigned message ID.
    pub message_id: String,
    /// Sender phone number.
    pub from: String,
    /// Sender's WhatsApp profile name, if shared.
    #[serde(default)]
    pub profile_name: Option<String>,
    /// Gateway timestamp (epoch milliseconds).
    pub timestamp: i64,
    /// The message content.
    #[serde(flatten)]
    pub body: InboundBody,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_text_payload() {
        let json = r#"{
            "message_id": "wamid.1",
            "from": "+5511999887766",
            "profile_name": "Maria",
            "timestamp": 1767225600000,
            "kind": "text",
            "body": "hi, how much is it?"
        }"#;

        let payload: InboundPayload = serde_json::from_str(json).unwrap();
        assert_eq!(payload.from, "+5511999887766");
        assert_eq!(
            payload.body,
            InboundBody::Text {
                body: "hi, how much is it?".to_string()
            }
        );
    }

    #[test]
    fn test_parse_audio_payload_with_transcription() {
        let json = r#"{
            "message_id": "wamid.2",
            "from": "+5511999887766",
            "timestamp": 1767225600000,
            "kind": "audio",
            "media_url": "https://cdn.example.com/a.ogg",
            "mime_type": "audio/ogg",
            "transcription": "I want to book a visit"
        }"#;

        let payload: InboundPayload = serde_json::from_str(json).unwrap();
        assert!(payload.profile_name.is_none());
        match payload.body {
            InboundBody::Audio { transcription, .. } => {
                assert_eq!(transcription.as_deref(), Some("I want to book a visit"));
            }
            other => panic!("expected audio, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_location_payload() {
        let json = r#"{
            "message_id": "wamid.3",
            "from": "+5511999887766",
            "timestamp": 1767225600000,
            "kind": "location",
            "latitude": -23.5613,
            "longitude": -46.6565
        }"#;

        let payload: InboundPayload = serde_json::from_str(json).unwrap();
        match payload.body {
            InboundBody::Location { latitude, longitude } => {
                assert!((latitude - -23.5613).abs() < 1e-9);
                assert!((longitude - -46.6565).abs() < 1e-9);
            }
            other => panic!("expected location, got {:?}", other),
        }
    }

    #[test]
    fn test_send_params_skips_missing_media() {
        let params = SendParams {
            to: "+5511999887766".to_string(),
            body: "hello".to_string(),
            media_url: None,
        };
        let json = serde_json::to_string(&params).unwrap();
        assert!(!json.contains("media_url"));
    }
}
