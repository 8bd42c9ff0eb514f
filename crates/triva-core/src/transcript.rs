//! Bounded, append-only transcript store.
//!
//! The transcript is the single mutable record of a conversation. Messages
//! are appended in order and only the active assistant message is ever
//! mutated — by streaming deltas, by a one-way freeze into structured
//! content, or by the error/empty-turn replacement rules. Overflow drops the
//! oldest messages until the store is back at capacity.
//!
//! Mutation guards are deliberate no-ops rather than errors: a delta that
//! arrives after its message was frozen, or that targets anything but the
//! most recent message, is stale by definition and must not be applied.

use tracing::debug;

use crate::constants::TRANSCRIPT_CAPACITY;
use crate::ids::MessageId;
use crate::messages::{Message, MessageContent};
use crate::report::ClinicalReport;

/// Ordered, capacity-bounded sequence of conversation messages.
#[derive(Clone, Debug, Default)]
pub struct Transcript {
    messages: Vec<Message>,
    capacity: usize,
}

impl Transcript {
    /// Create an empty transcript with the standard capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(TRANSCRIPT_CAPACITY)
    }

    /// Create an empty transcript with a custom capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            messages: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a user message, returning its ID.
    pub fn append_user(
        &mut self,
        text: impl Into<String>,
        transcription_time_ms: Option<u64>,
    ) -> MessageId {
        let message = Message::user(text, transcription_time_ms);
        let id = message.id.clone();
        self.messages.push(message);
        id
    }

    /// Append an empty assistant placeholder, returning its ID.
    ///
    /// The placeholder is appended before the network call is dispatched, so
    /// observers see the pending turn immediately.
    pub fn append_assistant_placeholder(&mut self) -> MessageId {
        let message = Message::assistant_placeholder();
        let id = message.id.clone();
        self.messages.push(message);
        id
    }

    /// Append streamed delta text to the active assistant message.
    ///
    /// Applies only when `id` names the most-recently-appended message, that
    /// message is an assistant message, and its content is still plain text.
    /// Anything else is a stale or out-of-order application and is silently
    /// ignored; returns whether the delta was applied.
    pub fn apply_delta(&mut self, id: &MessageId, text: &str) -> bool {
        let Some(last) = self.messages.last_mut() else {
            return false;
        };
        if last.id != *id || !last.is_assistant() {
            return false;
        }
        match &mut last.content {
            MessageContent::Text(existing) => {
                existing.push_str(text);
                true
            }
            MessageContent::Structured(_) => false,
        }
    }

    /// Replace a message's content wholesale with a structured report.
    ///
    /// One-way transition: content that is already structured is never
    /// replaced again, and later [`apply_delta`](Self::apply_delta) calls
    /// against the frozen message are no-ops. Returns whether the freeze
    /// happened.
    pub fn freeze_as_structured(&mut self, id: &MessageId, report: ClinicalReport) -> bool {
        let Some(message) = self.get_mut(id) else {
            return false;
        };
        if !message.is_assistant() || message.content.is_structured() {
            return false;
        }
        message.content = MessageContent::Structured(Box::new(report));
        true
    }

    /// Drop the oldest messages until the transcript is back at capacity.
    ///
    /// Returns the number of evicted messages so the session can latch its
    /// sticky limit-reached condition on the first eviction.
    pub fn enforce_capacity(&mut self) -> usize {
        if self.messages.len() <= self.capacity {
            return 0;
        }
        let excess = self.messages.len() - self.capacity;
        self.messages.drain(..excess).for_each(drop);
        debug!(evicted = excess, "transcript truncated to capacity");
        excess
    }

    /// Attach the time-to-first-byte metric. First write wins; later calls
    /// never overwrite an existing value.
    pub fn attach_ttfb(&mut self, id: &MessageId, ttfb_ms: u64) {
        if let Some(message) = self.get_mut(id) {
            if message.ttfb_ms.is_none() {
                message.ttfb_ms = Some(ttfb_ms);
            }
        }
    }

    /// Attach the total turn duration metric.
    pub fn attach_response_time(&mut self, id: &MessageId, response_time_ms: u64) {
        if let Some(message) = self.get_mut(id) {
            message.response_time_ms = Some(response_time_ms);
        }
    }

    /// Replace a message's plain-text content.
    ///
    /// Used by the transport-failure and empty-turn paths. Refuses to touch
    /// frozen structured content; returns whether the replacement happened.
    pub fn replace_text(&mut self, id: &MessageId, text: impl Into<String>) -> bool {
        let Some(message) = self.get_mut(id) else {
            return false;
        };
        match &mut message.content {
            MessageContent::Text(existing) => {
                *existing = text.into();
                true
            }
            MessageContent::Structured(_) => false,
        }
    }

    /// Look up a message by ID.
    #[must_use]
    pub fn get(&self, id: &MessageId) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == *id)
    }

    fn get_mut(&mut self, id: &MessageId) -> Option<&mut Message> {
        self.messages.iter_mut().find(|m| m.id == *id)
    }

    /// The most recently appended message.
    #[must_use]
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// All messages in order.
    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// An owned, immutable copy of the current messages.
    ///
    /// This is the observation surface: hosts render from snapshots rather
    /// than holding references into the store.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Message> {
        self.messages.clone()
    }

    /// Number of messages currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether the transcript holds no messages.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// The configured capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn report_with(symptom: &str) -> ClinicalReport {
        ClinicalReport {
            symptoms: vec![symptom.to_owned()],
            ..ClinicalReport::default()
        }
    }

    // -- append --

    #[test]
    fn append_user_then_placeholder() {
        let mut transcript = Transcript::new();
        let user_id = transcript.append_user("I feel dizzy", None);
        let assistant_id = transcript.append_assistant_placeholder();

        assert_eq!(transcript.len(), 2);
        assert_ne!(user_id, assistant_id);
        assert!(transcript.get(&user_id).unwrap().is_user());
        assert_eq!(
            transcript.get(&assistant_id).unwrap().content.as_text(),
            Some("")
        );
    }

    #[test]
    fn ids_are_session_unique() {
        let mut transcript = Transcript::new();
        let a = transcript.append_user("one", None);
        let b = transcript.append_user("two", None);
        let c = transcript.append_assistant_placeholder();
        assert_ne!(a, b);
        assert_ne!(b, c);
    }

    // -- apply_delta --

    #[test]
    fn deltas_concatenate_in_order() {
        let mut transcript = Transcript::new();
        let _ = transcript.append_user("hi", None);
        let id = transcript.append_assistant_placeholder();

        assert!(transcript.apply_delta(&id, "Hel"));
        assert!(transcript.apply_delta(&id, "lo"));
        assert!(transcript.apply_delta(&id, " there"));

        assert_eq!(
            transcript.get(&id).unwrap().content.as_text(),
            Some("Hello there")
        );
    }

    #[test]
    fn delta_ignored_when_not_most_recent() {
        let mut transcript = Transcript::new();
        let stale = transcript.append_assistant_placeholder();
        let _ = transcript.append_user("newer", None);

        assert!(!transcript.apply_delta(&stale, "late"));
        assert_eq!(transcript.get(&stale).unwrap().content.as_text(), Some(""));
    }

    #[test]
    fn delta_ignored_on_user_message() {
        let mut transcript = Transcript::new();
        let id = transcript.append_user("mine", None);
        assert!(!transcript.apply_delta(&id, "x"));
        assert_eq!(transcript.get(&id).unwrap().content.as_text(), Some("mine"));
    }

    #[test]
    fn delta_ignored_on_empty_transcript() {
        let mut transcript = Transcript::new();
        assert!(!transcript.apply_delta(&MessageId::new(), "x"));
    }

    // -- freeze_as_structured --

    #[test]
    fn freeze_replaces_content_wholesale() {
        let mut transcript = Transcript::new();
        let id = transcript.append_assistant_placeholder();
        assert!(transcript.apply_delta(&id, "partial prose"));

        assert!(transcript.freeze_as_structured(&id, report_with("chest pain")));

        let content = &transcript.get(&id).unwrap().content;
        assert!(content.is_structured());
        assert_eq!(
            content.as_report().unwrap().symptoms,
            vec!["chest pain".to_owned()]
        );
    }

    #[test]
    fn deltas_after_freeze_are_no_ops() {
        let mut transcript = Transcript::new();
        let id = transcript.append_assistant_placeholder();
        assert!(transcript.freeze_as_structured(&id, report_with("fever")));

        assert!(!transcript.apply_delta(&id, "too late"));
        let report = transcript.get(&id).unwrap().content.as_report().unwrap();
        assert_eq!(report.symptoms, vec!["fever".to_owned()]);
    }

    #[test]
    fn freeze_is_one_way() {
        let mut transcript = Transcript::new();
        let id = transcript.append_assistant_placeholder();
        assert!(transcript.freeze_as_structured(&id, report_with("first")));
        assert!(!transcript.freeze_as_structured(&id, report_with("second")));

        let report = transcript.get(&id).unwrap().content.as_report().unwrap();
        assert_eq!(report.symptoms, vec!["first".to_owned()]);
    }

    #[test]
    fn freeze_refuses_user_messages() {
        let mut transcript = Transcript::new();
        let id = transcript.append_user("hello", None);
        assert!(!transcript.freeze_as_structured(&id, report_with("x")));
        assert!(transcript.get(&id).unwrap().content.is_text());
    }

    // -- enforce_capacity --

    #[test]
    fn capacity_drops_oldest_first() {
        let mut transcript = Transcript::with_capacity(3);
        let first = transcript.append_user("one", None);
        let _ = transcript.append_user("two", None);
        let _ = transcript.append_user("three", None);
        let _ = transcript.append_user("four", None);

        assert_eq!(transcript.enforce_capacity(), 1);
        assert_eq!(transcript.len(), 3);
        assert!(transcript.get(&first).is_none());
        assert_eq!(
            transcript.messages()[0].content.as_text(),
            Some("two")
        );
    }

    #[test]
    fn capacity_noop_under_limit() {
        let mut transcript = Transcript::with_capacity(5);
        let _ = transcript.append_user("one", None);
        assert_eq!(transcript.enforce_capacity(), 0);
        assert_eq!(transcript.len(), 1);
    }

    #[test]
    fn capacity_drops_multiple_when_needed() {
        let mut transcript = Transcript::with_capacity(2);
        for i in 0..5 {
            let _ = transcript.append_user(format!("m{i}"), None);
        }
        assert_eq!(transcript.enforce_capacity(), 3);
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript.messages()[0].content.as_text(), Some("m3"));
    }

    // -- metric attachment --

    #[test]
    fn ttfb_first_write_wins() {
        let mut transcript = Transcript::new();
        let id = transcript.append_assistant_placeholder();
        transcript.attach_ttfb(&id, 120);
        transcript.attach_ttfb(&id, 999);
        assert_eq!(transcript.get(&id).unwrap().ttfb_ms, Some(120));
    }

    #[test]
    fn response_time_attaches() {
        let mut transcript = Transcript::new();
        let id = transcript.append_assistant_placeholder();
        transcript.attach_response_time(&id, 2300);
        assert_eq!(transcript.get(&id).unwrap().response_time_ms, Some(2300));
    }

    #[test]
    fn metrics_on_unknown_id_are_ignored() {
        let mut transcript = Transcript::new();
        transcript.attach_ttfb(&MessageId::new(), 1);
        transcript.attach_response_time(&MessageId::new(), 1);
        assert!(transcript.is_empty());
    }

    // -- replace_text --

    #[test]
    fn replace_text_overwrites_plain_content() {
        let mut transcript = Transcript::new();
        let id = transcript.append_assistant_placeholder();
        assert!(transcript.replace_text(&id, "Error fetching response."));
        assert_eq!(
            transcript.get(&id).unwrap().content.as_text(),
            Some("Error fetching response.")
        );
    }

    #[test]
    fn replace_text_refuses_frozen_content() {
        let mut transcript = Transcript::new();
        let id = transcript.append_assistant_placeholder();
        assert!(transcript.freeze_as_structured(&id, report_with("fever")));
        assert!(!transcript.replace_text(&id, "overwrite attempt"));
        assert!(transcript.get(&id).unwrap().content.is_structured());
    }

    // -- snapshot --

    #[test]
    fn snapshot_is_detached() {
        let mut transcript = Transcript::new();
        let id = transcript.append_assistant_placeholder();
        let snapshot = transcript.snapshot();

        assert!(transcript.apply_delta(&id, "later"));
        assert_eq!(snapshot[0].content.as_text(), Some(""));
        assert_eq!(transcript.get(&id).unwrap().content.as_text(), Some("later"));
    }

    #[test]
    fn snapshot_serializes_for_observers() {
        let mut transcript = Transcript::new();
        let _ = transcript.append_user("hi", Some(300));
        let v = serde_json::to_value(transcript.snapshot()).unwrap();
        assert_eq!(v[0]["role"], json!("user"));
        assert_eq!(v[0]["transcriptionTimeMs"], json!(300));
    }
}
