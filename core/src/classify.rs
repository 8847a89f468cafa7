//! Turns a decoded backend reply into what the transcript shows.

use crate::protocol::{ChatReply, DataUsed, Insights, Payload, Record, RecordSet};

pub const ACKNOWLEDGEMENT: &str = "✅ I understood your request. Processing...";
pub const FAILURE_NOTICE: &str = "❌ Failed to process your request.";
pub const RETRY_HINT: &str = "Please try again.";
pub const SERVER_FAILURE_FALLBACK: &str = "Failed to process request";

/// Display text plus the records to attach, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct Classified {
    pub content: String,
    pub data: Option<Vec<Record>>,
}

impl Classified {
    fn text(content: String) -> Self {
        Self {
            content,
            data: None,
        }
    }
}

pub fn classify(reply: &ChatReply) -> Classified {
    match &reply.data {
        None | Some(Payload::Unknown) => Classified::text(
            reply
                .narrative()
                .unwrap_or(ACKNOWLEDGEMENT)
                .to_string(),
        ),
        Some(Payload::Shipments(set)) => records(reply, set, RecordKind::Shipments),
        Some(Payload::Tasks(set)) => records(reply, set, RecordKind::Tasks),
        Some(Payload::Insights(insights)) => Classified::text(narrative(reply, insights)),
    }
}

/// Transcript text for a failed round trip.
pub fn failure_notice(detail: Option<&str>) -> String {
    let detail = detail
        .map(str::trim)
        .filter(|detail| !detail.is_empty())
        .unwrap_or(RETRY_HINT);
    format!("{FAILURE_NOTICE} {detail}")
}

#[derive(Clone, Copy)]
enum RecordKind {
    Shipments,
    Tasks,
}

impl RecordKind {
    fn summary(self, count: u64) -> String {
        match self {
            Self::Shipments if count == 0 => {
                format!("Found {count} shipment(s). Try adjusting your filters.")
            }
            Self::Shipments => format!("Found {count} shipment(s). Showing records below 👇"),
            Self::Tasks if count == 0 => format!("Found {count} task(s). No tasks found."),
            Self::Tasks => format!("Found {count} task(s). Showing records below 👇"),
        }
    }
}

fn records(reply: &ChatReply, set: &RecordSet, kind: RecordKind) -> Classified {
    let content = reply
        .narrative()
        .map(str::to_string)
        .unwrap_or_else(|| kind.summary(set.count()));
    Classified {
        content,
        data: Some(set.records.clone()),
    }
}

fn narrative(reply: &ChatReply, insights: &Insights) -> String {
    let mut content = insights
        .response
        .as_deref()
        .filter(|response| !response.is_empty())
        .or_else(|| reply.narrative())
        .unwrap_or_default()
        .to_string();
    if let Some(sources) = insights.data_used.as_ref().and_then(sources_line) {
        content.push_str("\n\n📊 Analysis based on: ");
        content.push_str(&sources);
    }
    content
}

fn sources_line(used: &DataUsed) -> Option<String> {
    let parts: Vec<String> = [(used.shipments, "shipments"), (used.tasks, "tasks")]
        .into_iter()
        .filter(|(count, _)| *count > 0)
        .map(|(count, name)| format!("{count} {name}"))
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(", "))
    }
}
