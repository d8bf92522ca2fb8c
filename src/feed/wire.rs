//! Arena feed wire format.
//!
//! One JSON object per WebSocket text frame:
//! `{"t": <unix seconds>, "e": "W"|"H"|"L"|"R", "b": <bot id>, "a": <amount?>}`
//!
//! The feed is receive-only; nothing is ever written back on this channel.
//! Malformed frames are expected (buggy or adversarial producers) and are
//! dropped at decode time without touching any consumer-visible state.

use serde::{Deserialize, Serialize};

/// Closed set of arena event categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    Wager,
    Heartbeat,
    Liquidation,
    Research,
}

impl EventKind {
    /// Map a wire category code to a kind. Unknown codes are rejected,
    /// which drops the whole frame.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "W" => Some(Self::Wager),
            "H" => Some(Self::Heartbeat),
            "L" => Some(Self::Liquidation),
            "R" => Some(Self::Research),
            _ => None,
        }
    }

    pub fn as_code(&self) -> &'static str {
        match self {
            Self::Wager => "W",
            Self::Heartbeat => "H",
            Self::Liquidation => "L",
            Self::Research => "R",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Wager => "wager",
            Self::Heartbeat => "heartbeat",
            Self::Liquidation => "liquidation",
            Self::Research => "research",
        }
    }
}

/// One decoded arena event. Immutable once decoded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ArenaEvent {
    /// Server-assigned unix timestamp (seconds).
    pub ts: i64,
    pub kind: EventKind,
    /// Id of the bot/agent that produced the event.
    pub bot_id: i64,
    /// Category-dependent payload (wager size, liquidation value, ...).
    pub amount: Option<f64>,
}

/// Raw inbound frame. All fields optional so a partial object still parses
/// and validation decides what to keep; unknown extra fields are ignored.
#[derive(Debug, Deserialize)]
struct RawFrame {
    #[serde(default)]
    t: Option<f64>,
    #[serde(default)]
    e: Option<String>,
    #[serde(default)]
    b: Option<f64>,
    #[serde(default)]
    a: Option<f64>,
}

/// Decode and validate one inbound text frame.
///
/// Returns `None` for anything that is not a well-formed event: non-JSON
/// payloads, missing/non-numeric `t` or `b`, missing/empty/unknown `e`.
pub fn decode_frame(text: &str) -> Option<ArenaEvent> {
    let raw: RawFrame = serde_json::from_str(text).ok()?;

    let ts = raw.t.filter(|t| t.is_finite())? as i64;
    let bot_id = raw.b.filter(|b| b.is_finite())? as i64;
    let kind = EventKind::from_code(raw.e.as_deref()?.trim())?;
    let amount = raw.a.filter(|a| a.is_finite());

    Some(ArenaEvent {
        ts,
        kind,
        bot_id,
        amount,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_full_frame() {
        let ev = decode_frame(r#"{"t": 1712345678, "e": "L", "b": 5, "a": 100.0}"#).unwrap();
        assert_eq!(ev.ts, 1712345678);
        assert_eq!(ev.kind, EventKind::Liquidation);
        assert_eq!(ev.bot_id, 5);
        assert_eq!(ev.amount, Some(100.0));
    }

    #[test]
    fn test_decode_amount_optional() {
        let ev = decode_frame(r#"{"t": 1712345678, "e": "H", "b": 1}"#).unwrap();
        assert_eq!(ev.kind, EventKind::Heartbeat);
        assert_eq!(ev.amount, None);
    }

    #[test]
    fn test_decode_rejects_missing_category() {
        assert!(decode_frame(r#"{"t": 1712345678, "b": 1}"#).is_none());
        assert!(decode_frame(r#"{"t": 1712345678, "e": "", "b": 1}"#).is_none());
    }

    #[test]
    fn test_decode_rejects_unknown_category() {
        assert!(decode_frame(r#"{"t": 1712345678, "e": "X", "b": 1}"#).is_none());
    }

    #[test]
    fn test_decode_rejects_missing_or_bad_numbers() {
        assert!(decode_frame(r#"{"e": "W", "b": 1}"#).is_none());
        assert!(decode_frame(r#"{"t": "soon", "e": "W", "b": 1}"#).is_none());
        assert!(decode_frame(r#"{"t": 1712345678, "e": "W"}"#).is_none());
        assert!(decode_frame(r#"{"t": 1712345678, "e": "W", "b": "five"}"#).is_none());
    }

    #[test]
    fn test_decode_rejects_non_json() {
        assert!(decode_frame("PONG").is_none());
        assert!(decode_frame("").is_none());
        assert!(decode_frame("{not json").is_none());
    }

    #[test]
    fn test_decode_ignores_extra_fields() {
        let ev = decode_frame(r#"{"t": 10, "e": "W", "b": 2, "a": 3.5, "seq": 99}"#).unwrap();
        assert_eq!(ev.kind, EventKind::Wager);
        assert_eq!(ev.bot_id, 2);
    }

    #[test]
    fn test_kind_codes_roundtrip() {
        for kind in [
            EventKind::Wager,
            EventKind::Heartbeat,
            EventKind::Liquidation,
            EventKind::Research,
        ] {
            assert_eq!(EventKind::from_code(kind.as_code()), Some(kind));
        }
    }
}
