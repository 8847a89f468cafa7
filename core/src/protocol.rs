use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// One row of a tabular result: field name to scalar value, in the order the
/// backend sent the fields.
pub type Record = Map<String, Value>;

/// Body of the single `POST` issued per round trip.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub message: String,
    pub conversation_id: Option<String>,
}

impl ChatRequest {
    pub fn new(message: impl Into<String>, conversation_id: Option<String>) -> Self {
        Self {
            message: message.into(),
            conversation_id,
        }
    }
}

/// Decoded reply for one round trip.
///
/// `ok = false` is an application-level failure even when the transport
/// succeeded; a missing `ok` field counts as a failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChatReply {
    #[serde(default)]
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_response: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_payload",
        skip_serializing_if = "Option::is_none"
    )]
    pub data: Option<Payload>,
}

impl ChatReply {
    pub fn text(ai_response: impl Into<String>) -> Self {
        Self {
            ok: true,
            ai_response: Some(ai_response.into()),
            ..Self::default()
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            error: Some(error.into()),
            ..Self::default()
        }
    }

    pub fn with_payload(payload: Payload) -> Self {
        Self {
            ok: true,
            data: Some(payload),
            ..Self::default()
        }
    }

    pub fn with_conversation_id(mut self, id: impl Into<String>) -> Self {
        self.conversation_id = Some(id.into());
        self
    }

    pub fn with_intent(mut self, intent: Value) -> Self {
        self.intent = Some(intent);
        self
    }

    /// Free-text narrative; an empty string counts as none.
    pub fn narrative(&self) -> Option<&str> {
        self.ai_response.as_deref().filter(|text| !text.is_empty())
    }

    /// Server-supplied failure reason; an empty string counts as none.
    pub fn error_reason(&self) -> Option<&str> {
        self.error.as_deref().filter(|text| !text.is_empty())
    }
}

/// Structured part of a reply, discriminated by its `type` field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Payload {
    Shipments(RecordSet),
    Tasks(RecordSet),
    Insights(Insights),
    /// Any tag this client does not know about.
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RecordSet {
    #[serde(
        default,
        deserialize_with = "lenient_count",
        skip_serializing_if = "Option::is_none"
    )]
    pub count: Option<u64>,
    #[serde(default)]
    pub records: Vec<Record>,
}

impl RecordSet {
    pub fn new(records: Vec<Record>) -> Self {
        Self {
            count: Some(records.len() as u64),
            records,
        }
    }

    /// Count reported by the backend, or the number of records when it sent none.
    pub fn count(&self) -> u64 {
        self.count.unwrap_or(self.records.len() as u64)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Insights {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_used: Option<DataUsed>,
}

/// How many records of each category informed an insights narrative.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DataUsed {
    #[serde(default)]
    pub shipments: u64,
    #[serde(default)]
    pub tasks: u64,
}

// Counts arrive as numbers or numeric strings; anything else is treated as
// missing so the records still come through.
fn lenient_count<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(number)) => number.as_u64(),
        Some(Value::String(text)) => text.trim().parse().ok(),
        _ => None,
    })
}

// A payload that does not fit any known shape degrades to `Unknown` instead of
// failing the whole reply.
fn lenient_payload<'de, D>(deserializer: D) -> Result<Option<Payload>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(match raw {
        None | Some(Value::Null) => None,
        Some(value) => match serde_json::from_value::<Payload>(value) {
            Ok(payload) => Some(payload),
            Err(err) => {
                tracing::warn!(%err, "unrecognised payload shape, rendering as plain reply");
                Some(Payload::Unknown)
            }
        },
    })
}
