// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message bodies as literal text interleaved with named slots.
//!
//! A rendered body is parsed once against the known slot tokens and then
//! filled by name. Filled values are never scanned for tokens, so a generated
//! URL cannot be rewritten by a marker that happens to occur inside it.

use std::collections::HashMap;

/// Token for the bare opt-out URL.
pub const OPT_OUT_URL_TOKEN: &str = "{optOutUrl}";

/// Token for the opt-out anchor element.
pub const OPT_OUT_LINK_TOKEN: &str = "{optOutLink}";

/// A named hole in a message body.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Slot {
    OptOutUrl,
    OptOutLink,
    /// A tracking link, keyed by the tracking URL's id.
    TrackingUrl(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Text(String),
    Slot(Slot),
}

/// Text that marks a slot in the source body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotMarker {
    pub token: String,
    pub slot: Slot,
}

impl SlotMarker {
    pub fn new(token: impl Into<String>, slot: Slot) -> Self {
        Self {
            token: token.into(),
            slot,
        }
    }

    /// The opt-out URL and opt-out link markers.
    pub fn opt_out() -> [SlotMarker; 2] {
        [
            SlotMarker::new(OPT_OUT_URL_TOKEN, Slot::OptOutUrl),
            SlotMarker::new(OPT_OUT_LINK_TOKEN, Slot::OptOutLink),
        ]
    }
}

/// Values to fill slots with. Slots without a value render as their original token.
#[derive(Debug, Clone, Default)]
pub struct SlotValues {
    values: HashMap<Slot, String>,
}

impl SlotValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, slot: Slot, value: impl Into<String>) -> &mut Self {
        self.values.insert(slot, value.into());
        self
    }

    pub fn get(&self, slot: &Slot) -> Option<&str> {
        self.values.get(slot).map(String::as_str)
    }
}

/// A parsed body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotBody {
    segments: Vec<Segment>,
    tokens: HashMap<Slot, String>,
}

impl SlotBody {
    /// Split `body` at every occurrence of a marker token.
    ///
    /// When two tokens start at the same offset the longer one wins. Markers
    /// with an empty token are ignored.
    pub fn parse(body: &str, markers: &[SlotMarker]) -> Self {
        let markers: Vec<&SlotMarker> = markers.iter().filter(|m| !m.token.is_empty()).collect();
        let tokens = markers
            .iter()
            .map(|m| (m.slot.clone(), m.token.clone()))
            .collect();

        let mut segments = Vec::new();
        let mut rest = body;
        loop {
            let next = markers
                .iter()
                .filter_map(|m| rest.find(m.token.as_str()).map(|pos| (pos, *m)))
                .min_by(|(a_pos, a), (b_pos, b)| {
                    a_pos.cmp(b_pos).then(b.token.len().cmp(&a.token.len()))
                });

            let Some((pos, marker)) = next else {
                if !rest.is_empty() {
                    segments.push(Segment::Text(rest.to_string()));
                }
                break;
            };

            if pos > 0 {
                segments.push(Segment::Text(rest[..pos].to_string()));
            }
            segments.push(Segment::Slot(marker.slot.clone()));
            rest = &rest[pos + marker.token.len()..];
        }

        Self { segments, tokens }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn contains(&self, slot: &Slot) -> bool {
        self.segments
            .iter()
            .any(|s| matches!(s, Segment::Slot(found) if found == slot))
    }

    /// Concatenate the body with every slot replaced by its value.
    pub fn fill(&self, values: &SlotValues) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Slot(slot) => match values.get(slot) {
                    Some(value) => out.push_str(value),
                    None => {
                        if let Some(token) = self.tokens.get(slot) {
                            out.push_str(token);
                        }
                    }
                },
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn markers() -> Vec<SlotMarker> {
        let mut markers = SlotMarker::opt_out().to_vec();
        markers.push(SlotMarker::new(
            "{trackingUrl1}",
            Slot::TrackingUrl("tu-1".into()),
        ));
        markers
    }

    #[test]
    fn parses_text_and_slots_in_order() {
        let body = SlotBody::parse("Hi {optOutLink} and {trackingUrl1}.", &markers());
        assert_eq!(
            body.segments(),
            &[
                Segment::Text("Hi ".into()),
                Segment::Slot(Slot::OptOutLink),
                Segment::Text(" and ".into()),
                Segment::Slot(Slot::TrackingUrl("tu-1".into())),
                Segment::Text(".".into()),
            ]
        );
        assert!(body.contains(&Slot::OptOutLink));
        assert!(!body.contains(&Slot::OptOutUrl));
    }

    #[test]
    fn filled_values_are_not_rescanned() {
        let body = SlotBody::parse("{trackingUrl1} {optOutUrl}", &markers());
        let mut values = SlotValues::new();
        values
            .set(Slot::TrackingUrl("tu-1".into()), "https://x/?u={optOutUrl}")
            .set(Slot::OptOutUrl, "https://x/?unsub=1");

        assert_eq!(
            body.fill(&values),
            "https://x/?u={optOutUrl} https://x/?unsub=1"
        );
    }

    #[test]
    fn unfilled_slots_keep_their_token() {
        let body = SlotBody::parse("a {optOutUrl} b", &markers());
        assert_eq!(body.fill(&SlotValues::new()), "a {optOutUrl} b");
    }

    #[test]
    fn longest_marker_wins_at_same_offset() {
        let markers = vec![
            SlotMarker::new("http://t", Slot::TrackingUrl("short".into())),
            SlotMarker::new("http://t/long", Slot::TrackingUrl("long".into())),
        ];
        let body = SlotBody::parse("go http://t/long now", &markers);
        assert!(body.contains(&Slot::TrackingUrl("long".into())));
        assert!(!body.contains(&Slot::TrackingUrl("short".into())));
    }

    #[test]
    fn empty_markers_are_ignored() {
        let markers = vec![SlotMarker::new("", Slot::TrackingUrl("blank".into()))];
        let body = SlotBody::parse("plain", &markers);
        assert_eq!(body.segments(), &[Segment::Text("plain".into())]);
    }

    #[test]
    fn repeated_marker_fills_every_occurrence() {
        let body = SlotBody::parse("{optOutUrl}|{optOutUrl}", &markers());
        let mut values = SlotValues::new();
        values.set(Slot::OptOutUrl, "u");
        assert_eq!(body.fill(&values), "u|u");
    }
}
