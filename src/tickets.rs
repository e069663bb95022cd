//! Per-event resumption state.
//!
//! The server replays each event stream from the last id the client has
//! acknowledged. The tracker remembers the last id seen per event name and
//! serializes the whole map into the body of every connect attempt.

use std::collections::HashMap;

use serde::Serialize;

use crate::frame::Frame;

/// Body of every connect request: `{"tickets": {<event>: <lastId>, ...}}`.
#[derive(Serialize)]
struct ResumeRequest<'a> {
    tickets: &'a HashMap<String, String>,
}

/// Maps event name to the id of the last frame seen for that event.
///
/// Entries are overwritten whenever a frame for the event carries an id;
/// frames without an id never mutate the map. There is no expiry.
#[derive(Debug, Default)]
pub struct TicketTracker {
    tickets: HashMap<String, String>,
}

impl TicketTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the frame's id under its event name, when both are present.
    pub fn record(&mut self, frame: &Frame) {
        if let (Some(event), Some(id)) = (frame.event_name(), frame.id.as_deref()) {
            self.tickets.insert(event.to_string(), id.to_string());
        }
    }

    /// Last id recorded for `event`, if any.
    pub fn last_id(&self, event: &str) -> Option<&str> {
        self.tickets.get(event).map(String::as_str)
    }

    /// Serialize the accumulated map as the next connect request body.
    pub fn request_body(&self) -> serde_json::Result<String> {
        serde_json::to_string(&ResumeRequest {
            tickets: &self.tickets,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(id: Option<&str>, event: Option<&str>) -> Frame {
        Frame {
            id: id.map(String::from),
            event: event.map(String::from),
            data: serde_json::Value::Null,
        }
    }

    #[test]
    fn test_records_id_per_event() {
        let mut tracker = TicketTracker::new();
        tracker.record(&frame(Some("42"), Some("x")));
        assert_eq!(tracker.last_id("x"), Some("42"));
        assert_eq!(tracker.last_id("y"), None);
    }

    #[test]
    fn test_newer_id_overwrites() {
        let mut tracker = TicketTracker::new();
        tracker.record(&frame(Some("42"), Some("x")));
        tracker.record(&frame(Some("43"), Some("x")));
        assert_eq!(tracker.last_id("x"), Some("43"));
    }

    #[test]
    fn test_frame_without_id_leaves_tracker_unchanged() {
        let mut tracker = TicketTracker::new();
        tracker.record(&frame(Some("42"), Some("x")));
        tracker.record(&frame(None, Some("x")));
        assert_eq!(tracker.last_id("x"), Some("42"));
    }

    #[test]
    fn test_frame_without_event_is_ignored() {
        let mut tracker = TicketTracker::new();
        tracker.record(&frame(Some("42"), None));
        tracker.record(&frame(Some("42"), Some("")));
        assert!(tracker.request_body().unwrap().contains(r#""tickets":{}"#));
    }

    #[test]
    fn test_request_body_shape() {
        let mut tracker = TicketTracker::new();
        tracker.record(&frame(Some("7"), Some("news")));

        let body: serde_json::Value =
            serde_json::from_str(&tracker.request_body().unwrap()).unwrap();
        assert_eq!(body, serde_json::json!({"tickets": {"news": "7"}}));
    }

    #[test]
    fn test_empty_tracker_body() {
        let tracker = TicketTracker::new();
        assert_eq!(tracker.request_body().unwrap(), r#"{"tickets":{}}"#);
    }
}
