//! Locates bot-token shaped substrings in arbitrary text.

use once_cell::sync::Lazy;
use regex::Regex;

// user id . timestamp . hmac
static BOT_TOKEN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)([a-z0-9_-]{23,28})\.([a-z0-9_-]{6,7})\.([a-z0-9_-]{27})").unwrap()
});

/// The three raw segments of the first token-shaped match in a string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenCandidate<'a> {
    pub id_segment: &'a str,
    pub time_segment: &'a str,
    pub integrity_segment: &'a str,
}

impl TokenCandidate<'_> {
    /// The segments re-joined with `.` separators.
    pub fn token_string(&self) -> String {
        format!(
            "{}.{}.{}",
            self.id_segment, self.time_segment, self.integrity_segment
        )
    }
}

/// Return the leftmost match only. Anything after it is never inspected.
pub fn find_candidate(input: &str) -> Option<TokenCandidate<'_>> {
    let caps = BOT_TOKEN_RE.captures(input)?;
    Some(TokenCandidate {
        id_segment: caps.get(1)?.as_str(),
        time_segment: caps.get(2)?.as_str(),
        integrity_segment: caps.get(3)?.as_str(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const ID: &str = "MTAxNTI2NDk3NjQ2MjA5NjU5Mg"; // 26 chars
    const TS: &str = "GXq4Ag";
    const HMAC: &str = "a1b2c3d4e5f6g7h8i9j0k1l2m3n";

    #[test]
    fn test_finds_token_inside_text() {
        let input = format!("my token is {}.{}.{} oops", ID, TS, HMAC);
        let c = find_candidate(&input).expect("should match");
        assert_eq!(c.id_segment, ID);
        assert_eq!(c.time_segment, TS);
        assert_eq!(c.integrity_segment, HMAC);
        assert_eq!(c.token_string(), format!("{}.{}.{}", ID, TS, HMAC));
    }

    #[test]
    fn test_no_candidate() {
        assert!(find_candidate("").is_none());
        assert!(find_candidate("just some words. nothing here.").is_none());
        // hmac one char short
        let short = format!("{}.{}.{}", ID, TS, &HMAC[..26]);
        assert!(find_candidate(&short).is_none());
        // id segment too short
        let input = format!("{}.{}.{}", &ID[..22], TS, HMAC);
        assert!(find_candidate(&input).is_none());
    }

    #[test]
    fn test_mixed_case_and_url_safe_chars() {
        let input = "AbCdEfGhIjKlMnOpQrStUvW-_.Xy-_z9.ZZzz__--0099aaBBccDDeeFFggHH1";
        let c = find_candidate(input).expect("should match");
        assert_eq!(c.id_segment, "AbCdEfGhIjKlMnOpQrStUvW-_");
        assert_eq!(c.time_segment, "Xy-_z9");
        assert_eq!(c.integrity_segment, "ZZzz__--0099aaBBccDDeeFFggH");
    }

    #[test]
    fn test_first_match_wins() {
        let second = "BBBBBBBBBBBBBBBBBBBBBBBBBBBB.BBBBBBB.BBBBBBBBBBBBBBBBBBBBBBBBBBB";
        let input = format!("{}.{}.{} and {}", ID, TS, HMAC, second);
        let c = find_candidate(&input).unwrap();
        assert_eq!(c.id_segment, ID);
    }

    #[test]
    fn test_greedy_segment_lengths() {
        // a 30 char run before the first dot: the match starts 2 chars in
        let input = format!("xy{}.{}.{}", "A".repeat(28), "B".repeat(7), "C".repeat(27));
        let c = find_candidate(&input).unwrap();
        assert_eq!(c.id_segment.len(), 28);
        assert_eq!(c.time_segment.len(), 7);
    }
}
