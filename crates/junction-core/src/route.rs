//! Routing rules and the per-message filter/transform applied by each rule.

use crate::error::{Error, Result};
use crate::message::{is_transposable, message_type, ACTIVE_SENSE};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeSet;
use std::fmt;

/// Semitone offset applied to note-bearing messages, limited to one octave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub struct Transpose(i8);

impl Transpose {
    pub const MIN: i8 = -12;
    pub const MAX: i8 = 12;

    pub fn new(semitones: i32) -> Result<Self> {
        if (Self::MIN as i32..=Self::MAX as i32).contains(&semitones) {
            Ok(Self(semitones as i8))
        } else {
            Err(Error::TransposeOutOfRange(semitones))
        }
    }

    #[inline]
    pub fn semitones(self) -> i8 {
        self.0
    }

    #[inline]
    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Shift a 7-bit data byte. `None` when the result leaves 0..=127.
    #[inline]
    pub fn shift(self, data: u8) -> Option<u8> {
        let shifted = data as i16 + self.0 as i16;
        (0..=127).contains(&shifted).then_some(shifted as u8)
    }

    /// All selectable offsets, highest first.
    pub fn options() -> impl Iterator<Item = Transpose> {
        (Self::MIN..=Self::MAX).rev().map(Transpose)
    }

    /// Long form used when listing the options, e.g. `+2 semitones`.
    pub fn label(self) -> String {
        let unit = if self.0.abs() == 1 { "semitone" } else { "semitones" };
        format!("{} {}", self, unit)
    }
}

impl TryFrom<i32> for Transpose {
    type Error = Error;

    fn try_from(value: i32) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Transpose> for i32 {
    fn from(t: Transpose) -> Self {
        t.0 as i32
    }
}

impl fmt::Display for Transpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 > 0 {
            write!(f, "+{}", self.0)
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// Which message types a route lets through.
///
/// Stored as `null` (all) or an array of nibble codes.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Option<Vec<u8>>", into = "Option<Vec<u8>>")]
pub enum MessageTypeFilter {
    #[default]
    All,
    Only(BTreeSet<u8>),
}

impl MessageTypeFilter {
    pub fn only(codes: impl IntoIterator<Item = u8>) -> Self {
        Self::Only(codes.into_iter().collect())
    }

    #[inline]
    pub fn allows(&self, code: u8) -> bool {
        match self {
            Self::All => true,
            Self::Only(codes) => codes.contains(&code),
        }
    }

    pub fn is_restricted(&self) -> bool {
        matches!(self, Self::Only(_))
    }
}

impl From<Option<Vec<u8>>> for MessageTypeFilter {
    fn from(codes: Option<Vec<u8>>) -> Self {
        match codes {
            None => Self::All,
            Some(codes) => Self::only(codes),
        }
    }
}

impl From<MessageTypeFilter> for Option<Vec<u8>> {
    fn from(filter: MessageTypeFilter) -> Self {
        match filter {
            MessageTypeFilter::All => None,
            MessageTypeFilter::Only(codes) => Some(codes.into_iter().collect()),
        }
    }
}

impl fmt::Display for MessageTypeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Only(codes) => {
                let joined: Vec<String> = codes.iter().map(|c| c.to_string()).collect();
                f.write_str(&joined.join(", "))
            }
        }
    }
}

/// The editable part of a route.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RouteSettings {
    pub transpose: Transpose,
    pub message_types: MessageTypeFilter,
    pub active_sense: bool,
}

/// A rule forwarding messages from one input port to one output port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    pub in_id: String,
    pub out_id: String,
    #[serde(default)]
    pub transpose: Transpose,
    #[serde(default)]
    pub message_types: MessageTypeFilter,
    #[serde(default)]
    pub active_sense: bool,
}

/// What a single route does with a single message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision<'a> {
    /// Send these bytes to the route's output.
    Forward(Cow<'a, [u8]>),
    /// Message type not in the route's filter (or message empty).
    Filtered,
    /// Active sense suppressed.
    ActiveSense,
    /// Transposing would push the data byte outside 0..=127.
    OutOfRange,
}

impl Route {
    pub fn new(in_id: impl Into<String>, out_id: impl Into<String>) -> Self {
        Self {
            in_id: in_id.into(),
            out_id: out_id.into(),
            transpose: Transpose::default(),
            message_types: MessageTypeFilter::All,
            active_sense: false,
        }
    }

    pub fn with_settings(mut self, settings: RouteSettings) -> Self {
        self.apply_settings(settings);
        self
    }

    pub fn apply_settings(&mut self, settings: RouteSettings) {
        self.transpose = settings.transpose;
        self.message_types = settings.message_types;
        self.active_sense = settings.active_sense;
    }

    pub fn settings(&self) -> RouteSettings {
        RouteSettings {
            transpose: self.transpose,
            message_types: self.message_types.clone(),
            active_sense: self.active_sense,
        }
    }

    /// Decide what to send for `message`. Only copies when transposing.
    pub fn process<'a>(&self, message: &'a [u8]) -> RouteDecision<'a> {
        let Some(&status) = message.first() else {
            return RouteDecision::Filtered;
        };
        let mt = message_type(status);

        if !self.message_types.allows(mt) {
            return RouteDecision::Filtered;
        }

        if mt == ACTIVE_SENSE && !self.active_sense {
            return RouteDecision::ActiveSense;
        }

        if !self.transpose.is_zero() && is_transposable(message) {
            let Some(data) = self.transpose.shift(message[1]) else {
                return RouteDecision::OutOfRange;
            };
            let mut shifted = message.to_vec();
            shifted[1] = data;
            return RouteDecision::Forward(Cow::Owned(shifted));
        }

        RouteDecision::Forward(Cow::Borrowed(message))
    }

    /// Three-line description shown next to a route.
    pub fn summary(&self) -> String {
        format!(
            "Transpose: {}\nMessage types: {}\nActive Sense: {}",
            self.transpose,
            self.message_types,
            if self.active_sense { "yes" } else { "no" }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn forwarded(decision: RouteDecision<'_>) -> Vec<u8> {
        match decision {
            RouteDecision::Forward(bytes) => bytes.into_owned(),
            other => panic!("Expected Forward, got {:?}", other),
        }
    }

    #[test]
    fn test_transpose_range() {
        assert!(Transpose::new(12).is_ok());
        assert!(Transpose::new(-12).is_ok());
        assert!(matches!(
            Transpose::new(13),
            Err(Error::TransposeOutOfRange(13))
        ));
        assert!(Transpose::new(-13).is_err());
    }

    #[test]
    fn test_transpose_labels() {
        let labels: Vec<String> = Transpose::options().map(|t| t.label()).collect();
        assert_eq!(labels.len(), 25);
        assert_eq!(labels[0], "+12 semitones");
        assert_eq!(labels[11], "+1 semitone");
        assert_eq!(labels[12], "0 semitones");
        assert_eq!(labels[24], "-12 semitones");
    }

    #[test]
    fn test_transpose_shift_bounds() {
        let up = Transpose::new(12).unwrap();
        let down = Transpose::new(-12).unwrap();
        assert_eq!(up.shift(60), Some(72));
        assert_eq!(up.shift(115), Some(127));
        assert_eq!(up.shift(116), None);
        assert_eq!(down.shift(12), Some(0));
        assert_eq!(down.shift(5), None);
    }

    #[test]
    fn test_out_of_range_notes_are_not_merged() {
        let route = Route::new("in", "out").with_settings(RouteSettings {
            transpose: Transpose::new(12).unwrap(),
            ..Default::default()
        });

        assert_eq!(forwarded(route.process(&[0x90, 115, 100])), vec![0x90, 127, 100]);
        assert_eq!(route.process(&[0x90, 118, 100]), RouteDecision::OutOfRange);
        assert_eq!(route.process(&[0x90, 120, 100]), RouteDecision::OutOfRange);
        assert_eq!(route.process(&[0x80, 118, 0]), RouteDecision::OutOfRange);
        // Messages that aren't transposed pass whatever their data byte
        assert_eq!(forwarded(route.process(&[0xB0, 120, 0])), vec![0xB0, 120, 0]);
    }

    #[test]
    fn test_filter_and_transpose_example() {
        let route = Route::new("in", "out").with_settings(RouteSettings {
            transpose: Transpose::new(2).unwrap(),
            message_types: MessageTypeFilter::only([9]),
            active_sense: false,
        });

        assert_eq!(forwarded(route.process(&[0x90, 60, 100])), vec![0x90, 62, 100]);
        assert_eq!(route.process(&[0x80, 60, 100]), RouteDecision::Filtered);
    }

    #[test]
    fn test_all_filter_forwards_unchanged() {
        let route = Route::new("in", "out");
        let cc = [0xB3, 7, 90];
        match route.process(&cc) {
            RouteDecision::Forward(Cow::Borrowed(bytes)) => assert_eq!(bytes, &cc),
            other => panic!("Expected borrowed forward, got {:?}", other),
        }
    }

    #[test]
    fn test_active_sense_dropped_by_default() {
        let mut route = Route::new("in", "out");
        assert_eq!(route.process(&[0xFE]), RouteDecision::ActiveSense);
        // Every system message shares nibble 15
        assert_eq!(route.process(&[0xF8]), RouteDecision::ActiveSense);

        route.active_sense = true;
        assert_eq!(forwarded(route.process(&[0xFE])), vec![0xFE]);
    }

    #[test]
    fn test_active_sense_still_needs_filter() {
        let route = Route::new("in", "out").with_settings(RouteSettings {
            message_types: MessageTypeFilter::only([9]),
            active_sense: true,
            ..Default::default()
        });
        assert_eq!(route.process(&[0xFE]), RouteDecision::Filtered);
    }

    #[test]
    fn test_transpose_skips_above_poly_aftertouch() {
        let route = Route::new("in", "out").with_settings(RouteSettings {
            transpose: Transpose::new(-3).unwrap(),
            ..Default::default()
        });

        assert_eq!(forwarded(route.process(&[0xA0, 60, 40])), vec![0xA0, 57, 40]);
        assert_eq!(forwarded(route.process(&[0xB0, 60, 40])), vec![0xB0, 60, 40]);
        assert_eq!(forwarded(route.process(&[0xE0, 0, 64])), vec![0xE0, 0, 64]);
    }

    #[test]
    fn test_empty_message_filtered() {
        assert_eq!(Route::new("a", "b").process(&[]), RouteDecision::Filtered);
    }

    #[test]
    fn test_summary() {
        let route = Route::new("in", "out").with_settings(RouteSettings {
            transpose: Transpose::new(5).unwrap(),
            message_types: MessageTypeFilter::only([9, 8]),
            active_sense: true,
        });
        assert_eq!(
            route.summary(),
            "Transpose: +5\nMessage types: 8, 9\nActive Sense: yes"
        );
        assert_eq!(
            Route::new("in", "out").summary(),
            "Transpose: 0\nMessage types: all\nActive Sense: no"
        );
    }

    #[test]
    fn test_json_encoding_matches_stored_format() {
        let route = Route::new("in-1", "out-1").with_settings(RouteSettings {
            transpose: Transpose::new(-1).unwrap(),
            message_types: MessageTypeFilter::only([11, 9]),
            active_sense: false,
        });
        let json = serde_json::to_value(&route).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "inId": "in-1",
                "outId": "out-1",
                "transpose": -1,
                "messageTypes": [9, 11],
                "activeSense": false
            })
        );

        let all: Route = serde_json::from_str(
            r#"{"inId":"a","outId":"b","transpose":0,"messageTypes":null,"activeSense":true}"#,
        )
        .unwrap();
        assert_eq!(all.message_types, MessageTypeFilter::All);
        assert!(all.active_sense);
    }

    #[test]
    fn test_out_of_range_transpose_rejected_on_decode() {
        let result: std::result::Result<Route, _> = serde_json::from_str(
            r#"{"inId":"a","outId":"b","transpose":24,"messageTypes":null,"activeSense":false}"#,
        );
        assert!(result.is_err());
    }
}
