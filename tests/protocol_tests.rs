//! Protocol Tests
//!
//! Tests for argument encoding and the reply model.

use std::fmt;

use restkv::error::CommandError;
use restkv::protocol::{Arg, CommandArg, Reply};
use serde_json::{json, Value};

// =============================================================================
// Argument Encoding Tests
// =============================================================================

#[test]
fn test_encode_string() {
    assert_eq!(Arg::from("hello").to_token(), json!("hello"));
    assert_eq!(Arg::from(String::from("hello")).to_token(), json!("hello"));
}

#[test]
fn test_encode_bytes_as_string_view() {
    assert_eq!(Arg::from(b"hello".as_slice()).to_token(), json!("hello"));
    assert_eq!(Arg::from(b"hello".to_vec()).to_token(), json!("hello"));
}

#[test]
fn test_encode_numbers_preserved() {
    assert_eq!(Arg::from(42).to_token(), json!(42));
    assert_eq!(Arg::from(-7i64).to_token(), json!(-7));
    assert_eq!(Arg::from(1.5).to_token(), json!(1.5));
}

#[test]
fn test_encode_bool_as_one_or_zero() {
    assert_eq!(Arg::from(true).to_token(), json!("1"));
    assert_eq!(Arg::from(false).to_token(), json!("0"));
}

#[test]
fn test_encode_nil_as_empty_string() {
    assert_eq!(Arg::Nil.to_token(), json!(""));
    assert_eq!(Arg::from(None::<i64>).to_token(), json!(""));
    assert_eq!(Arg::from(Some("x")).to_token(), json!("x"));
}

#[test]
fn test_encode_display_fallback() {
    assert_eq!(Arg::display('z').to_token(), json!("z"));
    assert_eq!(Arg::display(3u128).to_token(), json!("3"));
}

// A value that encodes itself as its identifier.
struct Tagged(u32);

impl fmt::Display for Tagged {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tagged:{}", self.0)
    }
}

impl CommandArg for Tagged {
    fn to_arg(&self) -> Arg {
        Arg::Str(format!("tag-{}", self.0))
    }
}

// A value that misbehaves by returning another self-describing value.
struct Nested(u32);

impl fmt::Display for Nested {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "nested:{}", self.0)
    }
}

impl CommandArg for Nested {
    fn to_arg(&self) -> Arg {
        Arg::custom(Nested(self.0 + 1))
    }
}

#[test]
fn test_encode_custom_argument() {
    assert_eq!(Arg::custom(Tagged(7)).to_token(), json!("tag-7"));
}

#[test]
fn test_encode_custom_one_level_deep_only() {
    // the nested self-describing value is stringified, not expanded again
    assert_eq!(Arg::custom(Nested(1)).to_token(), json!("nested:2"));
}

// =============================================================================
// Round-Trip Tests
// =============================================================================

#[test]
fn test_round_trip_through_token() {
    let s: String = serde_json::from_value(Arg::from("abc").to_token()).unwrap();
    assert_eq!(s, "abc");

    let i: i64 = serde_json::from_value(Arg::from(42i64).to_token()).unwrap();
    assert_eq!(i, 42);

    let f: f64 = serde_json::from_value(Arg::from(1.5).to_token()).unwrap();
    assert_eq!(f, 1.5);

    let b: String = serde_json::from_value(Arg::from(b"raw".as_slice()).to_token()).unwrap();
    assert_eq!(b.as_bytes(), b"raw");

    // booleans are encoded as the wire convention "1"/"0"
    let t: String = serde_json::from_value(Arg::from(true).to_token()).unwrap();
    assert_eq!(t, "1");
}

// =============================================================================
// Reply Model Tests
// =============================================================================

#[test]
fn test_reply_decodes_success() {
    let reply: Reply = serde_json::from_str(r#"{"result": "OK"}"#).unwrap();
    assert!(!reply.is_error());
    assert_eq!(reply.decode::<String>().unwrap(), Some("OK".to_string()));
}

#[test]
fn test_reply_decodes_error() {
    let reply: Reply = serde_json::from_str(r#"{"error": "ERR boom"}"#).unwrap();
    assert!(reply.is_error());
    assert_eq!(reply.error, "ERR boom");
    assert_eq!(reply.decode::<Value>().unwrap(), None);
}

#[test]
fn test_reply_result_stays_raw_until_decoded() {
    let reply: Reply = serde_json::from_str(r#"{"result": [1, 2, 3]}"#).unwrap();
    let raw = reply.result.as_deref().unwrap();
    assert_eq!(raw.get(), "[1, 2, 3]");
    assert_eq!(reply.decode::<Vec<i64>>().unwrap(), Some(vec![1, 2, 3]));
}

// =============================================================================
// Command Error Tests
// =============================================================================

#[test]
fn test_command_error_kind_is_first_token() {
    let err = CommandError::new("WRONGTYPE Operation against a key", 2);
    assert_eq!(err.kind, "WRONGTYPE");
    assert_eq!(err.pipeline_index, 2);
    assert_eq!(err.to_string(), "WRONGTYPE Operation against a key");
}

#[test]
fn test_command_error_kind_empty_without_space() {
    let err = CommandError::new("Unauthorized", -1);
    assert_eq!(err.kind, "");
    assert_eq!(err.pipeline_index, -1);
}
