use serde::Deserialize;
use serde_json::Value;

use trawl_types::{EventDraft, EventRole, ParseOutcome, SkipReason, parse_ts};

// Typed view of the record shapes we recognize. Everything is optional or
// defaulted: a line that deviates from this schema falls back to the opaque
// path instead of being rejected.

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
#[serde(rename_all = "snake_case")]
enum RawRecord {
    SessionMeta(SessionMetaRecord),
    ResponseItem(ResponseItemRecord),
    EventMsg(EventMsgRecord),
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Deserialize)]
struct SessionMetaRecord {
    #[serde(default)]
    timestamp: Option<String>,
    #[serde(default)]
    payload: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct ResponseItemRecord {
    #[serde(default)]
    timestamp: Option<String>,
    payload: ResponseItemPayload,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
#[serde(rename_all = "snake_case")]
enum ResponseItemPayload {
    Message(MessagePayload),
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Deserialize)]
struct MessagePayload {
    #[serde(default)]
    role: String,
    #[serde(default)]
    content: Vec<MessageContent>,
    /// Some sessions store encrypted content but still include a plaintext
    /// summary; index it so those messages stay findable.
    #[serde(default)]
    summary: Vec<SummaryText>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
#[serde(rename_all = "snake_case")]
enum MessageContent {
    InputText {
        text: String,
    },
    OutputText {
        text: String,
    },
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Deserialize)]
struct SummaryText {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EventMsgRecord {
    #[serde(default)]
    timestamp: Option<String>,
    payload: EventMsgPayload,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
#[serde(rename_all = "snake_case")]
enum EventMsgPayload {
    /// Echoes of messages that already exist as response_item records.
    UserMessage,
    AgentMessage,
    AgentReasoning {
        #[serde(default)]
        text: Option<String>,
    },
    ItemCompleted {
        #[serde(default)]
        item: Option<Value>,
    },
    ExitedReviewMode {
        #[serde(default)]
        review_output: Option<Value>,
    },
    #[serde(other)]
    Unknown,
}

/// Convert one line of a session file into an event draft or a skip
/// decision. Decode failures never escape this boundary.
pub fn parse_line(line: &str) -> ParseOutcome {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return ParseOutcome::Skipped(SkipReason::EmptyLine);
    }

    let value: Value = match serde_json::from_str(trimmed) {
        Ok(value) => value,
        Err(_) => return ParseOutcome::Skipped(SkipReason::Malformed),
    };

    if !value.is_object() {
        return ParseOutcome::Skipped(SkipReason::NotAnObject);
    }

    match serde_json::from_value::<RawRecord>(value.clone()) {
        Ok(RawRecord::SessionMeta(record)) => session_meta_draft(record),
        Ok(RawRecord::ResponseItem(record)) => response_item_draft(record, &value),
        Ok(RawRecord::EventMsg(record)) => event_msg_draft(record, &value),
        // Recognized as a record but with a type we know nothing about, or
        // not matching any typed shape at all: keep it, opaquely.
        Ok(RawRecord::Unknown) | Err(_) => opaque_draft(&value),
    }
}

fn session_meta_draft(record: SessionMetaRecord) -> ParseOutcome {
    let ts = record
        .timestamp
        .as_deref()
        .and_then(parse_ts)
        .or_else(|| payload_ts(record.payload.as_ref()));

    let content = match &record.payload {
        Some(payload) => payload
            .get("instructions")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| compact_json(payload)),
        None => return ParseOutcome::Skipped(SkipReason::NoContent),
    };

    ParseOutcome::Accepted(EventDraft {
        ts,
        role: EventRole::Internal,
        content,
        opaque: false,
    })
}

fn response_item_draft(record: ResponseItemRecord, raw: &Value) -> ParseOutcome {
    let message = match record.payload {
        ResponseItemPayload::Message(message) => message,
        ResponseItemPayload::Unknown => return opaque_draft(raw),
    };

    let mut segments: Vec<String> = Vec::new();
    for item in &message.content {
        match item {
            MessageContent::InputText { text } | MessageContent::OutputText { text } => {
                if !text.trim().is_empty() {
                    segments.push(text.clone());
                }
            }
            MessageContent::Unknown => {}
        }
    }
    for summary in &message.summary {
        if let Some(text) = &summary.text
            && !text.trim().is_empty()
        {
            segments.push(text.clone());
        }
    }

    if segments.is_empty() {
        return ParseOutcome::Skipped(SkipReason::NoContent);
    }

    ParseOutcome::Accepted(EventDraft {
        ts: record.timestamp.as_deref().and_then(parse_ts),
        role: EventRole::from_message_role(&message.role),
        content: segments.join("\n"),
        opaque: false,
    })
}

fn event_msg_draft(record: EventMsgRecord, raw: &Value) -> ParseOutcome {
    let ts = record.timestamp.as_deref().and_then(parse_ts);

    let content = match record.payload {
        EventMsgPayload::UserMessage | EventMsgPayload::AgentMessage => {
            return ParseOutcome::Skipped(SkipReason::Duplicate);
        }
        EventMsgPayload::AgentReasoning { text } => match text {
            Some(text) if !text.trim().is_empty() => text,
            _ => return ParseOutcome::Skipped(SkipReason::NoContent),
        },
        EventMsgPayload::ItemCompleted { item } => {
            match item
                .as_ref()
                .and_then(|i| i.get("text"))
                .and_then(Value::as_str)
            {
                Some(text) if !text.trim().is_empty() => text.to_string(),
                _ => return ParseOutcome::Skipped(SkipReason::NoContent),
            }
        }
        EventMsgPayload::ExitedReviewMode { review_output } => match review_output {
            Some(output) => {
                serde_json::to_string_pretty(&output).unwrap_or_else(|_| compact_json(&output))
            }
            None => return ParseOutcome::Skipped(SkipReason::NoContent),
        },
        EventMsgPayload::Unknown => return opaque_draft(raw),
    };

    ParseOutcome::Accepted(EventDraft {
        ts,
        role: EventRole::Internal,
        content,
        opaque: false,
    })
}

/// Unrecognized but well-formed records are captured verbatim so no
/// information silently disappears from the index.
fn opaque_draft(raw: &Value) -> ParseOutcome {
    let ts = raw
        .get("timestamp")
        .and_then(Value::as_str)
        .and_then(parse_ts);

    ParseOutcome::Accepted(EventDraft {
        ts,
        role: EventRole::Internal,
        content: compact_json(raw),
        opaque: true,
    })
}

fn payload_ts(payload: Option<&Value>) -> Option<chrono::DateTime<chrono::Utc>> {
    payload?
        .get("timestamp")
        .and_then(Value::as_str)
        .and_then(parse_ts)
}

fn compact_json(value: &Value) -> String {
    serde_json::to_string(value).unwrap_or_default()
}
