//! Properties of the public `validate` entry point.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;

use tokenscan::models::token::{Provenance, Verdict};
use tokenscan::parser::{validate, DISCORD_EPOCH, TOKEN_EPOCH};

const USER_ID: &str = "MTAxNTI2NDk3NjQ2MjA5NjU5Mg";
const TIME: &str = "X-5mAA";
const HMAC: &str = "a1b2c3d4e5f6g7h8i9j0k1l2m3n";

fn both(input: &str) -> [Verdict; 2] {
    [
        validate(input, Provenance::Text),
        validate(input, Provenance::Image),
    ]
}

#[test]
fn test_total_over_awkward_inputs() {
    let long = "A.".repeat(50_000);
    let inputs = [
        "",
        ".",
        "..",
        "\0\0\0",
        "ééééééééééééééééééééééééééé.éééééé.ééééééééééééééééééééééééééé",
        long.as_str(),
        "----------------------------.-------.---------------------------",
        "____________________________._______.___________________________",
    ];
    for input in inputs {
        for v in both(input) {
            assert_eq!(v.raw_data, input);
            assert!(!v.reason.is_empty());
        }
    }
}

#[test]
fn test_separator_only_tokens_are_invalid() {
    // every segment is matched, but nothing decodes
    for v in both("----------------------------.-------.---------------------------") {
        assert!(v.token_string.is_some());
        assert!(!v.is_valid);
    }
}

#[test]
fn test_second_match_never_changes_verdict() {
    let first = format!("{}.{}.{}", USER_ID, TIME, HMAC);
    let baseline = validate(&first, Provenance::Text);
    for second in [
        "AAAAAAAAAAAAAAAAAAAAAAAAAAAA.BBBBBBB.CCCCCCCCCCCCCCCCCCCCCCCCCCC",
        "MTAxNTI2NDk3NjQ2MjA5NjU5Mg.X-5mAA.zyxwvutsrqponmlkjihgfedcbaZ",
    ] {
        let input = format!("{} {}", first, second);
        let v = validate(&input, Provenance::Text);
        assert_eq!(v.token_string, baseline.token_string);
        assert_eq!(v.user_id, baseline.user_id);
        assert_eq!(v.timestamp, baseline.timestamp);
        assert_eq!(v.hmac, baseline.hmac);
        assert_eq!(v.is_valid, baseline.is_valid);
    }
}

#[test]
fn test_epoch_boundary_through_public_api() {
    let boundary = (DISCORD_EPOCH - TOKEN_EPOCH) as u32;
    let seg = |v: u32| URL_SAFE_NO_PAD.encode(v.to_be_bytes());

    for (value, accepted) in [(boundary - 1, false), (boundary, true), (boundary + 1, true)] {
        let input = format!("{}.{}.{}", USER_ID, seg(value), HMAC);
        let v = validate(&input, Provenance::Image);
        assert_eq!(v.timestamp.is_some(), accepted, "timestamp {}", value);
        assert_eq!(v.is_valid, accepted, "timestamp {}", value);
    }
}

#[test]
fn test_verdict_json_roundtrip() {
    let inputs = [
        format!("{}.{}.{}", USER_ID, TIME, HMAC),
        format!("{}.{}.{}", "A".repeat(28), TIME, HMAC),
        "no token".to_string(),
    ];
    for input in &inputs {
        for v in both(input) {
            let json = serde_json::to_value(&v).unwrap();
            for key in ["token_string", "user_id", "timestamp", "hmac"] {
                assert!(json.get(key).is_some(), "{} must not be omitted", key);
            }
            let back: Verdict = serde_json::from_value(json).unwrap();
            assert_eq!(back, v);
        }
    }
}
