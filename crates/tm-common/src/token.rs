use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::{RngCore, rngs::OsRng};

const ACCESS_TOKEN_BYTES: usize = 32;

/// Opaque, unguessable token shared by every entry of one shortlist.
/// 32 bytes from the OS RNG, URL-safe base64 without padding (43 chars).
pub fn generate_access_token() -> String {
    let mut bytes = [0u8; ACCESS_TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Cheap shape check before hitting storage with a token from a link.
pub fn is_well_formed(token: &str) -> bool {
    token.len() == 43
        && token
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn tokens_are_url_safe_and_unique() {
        let tokens: HashSet<_> = (0..64).map(|_| generate_access_token()).collect();
        assert_eq!(tokens.len(), 64);
        assert!(tokens.iter().all(|t| is_well_formed(t)));
    }

    #[test]
    fn rejects_malformed_tokens() {
        assert!(!is_well_formed(""));
        assert!(!is_well_formed("short"));
        assert!(!is_well_formed(&"a/".repeat(22)[..43]));
    }
}
