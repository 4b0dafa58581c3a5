use std::fmt;

/// Length of the `state` nonce sent with every authorization request.
pub const STATE_LEN: usize = 8;

const ALPHABET: &[u8; 62] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
// Largest multiple of 62 that fits in a byte; anything above is rejected to keep the draw uniform.
const UNBIASED_LIMIT: u8 = 248;

/// Random alphanumeric nonce correlating a redirect with the request that started it.
///
/// A fresh value is generated for every login attempt and dropped with it.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthState(String);

impl AuthState {
    pub fn generate() -> Self {
        let mut out = String::with_capacity(STATE_LEN);
        while out.len() < STATE_LEN {
            let id = uuid::Uuid::new_v4();
            // bytes 0..6 of a v4 UUID carry no version or variant bits
            for &byte in &id.as_bytes()[..6] {
                if out.len() == STATE_LEN {
                    break;
                }
                if byte < UNBIASED_LIMIT {
                    out.push(ALPHABET[(byte % 62) as usize] as char);
                }
            }
        }
        Self(out)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn matches(&self, candidate: &str) -> bool {
        self.0 == candidate
    }
}

impl fmt::Debug for AuthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthState(..)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn state_is_eight_alphanumeric_chars() {
        for _ in 0..100 {
            let state = AuthState::generate();
            assert_eq!(state.as_str().len(), STATE_LEN);
            assert!(state.as_str().chars().all(|c| c.is_ascii_alphanumeric()));
        }
    }

    #[test]
    fn consecutive_states_differ() {
        let states: HashSet<String> = (0..200)
            .map(|_| AuthState::generate().as_str().to_string())
            .collect();
        assert_eq!(states.len(), 200);
    }

    #[test]
    fn matches_requires_exact_value() {
        let state = AuthState::generate();
        let upper = state.as_str().to_ascii_uppercase();
        assert!(state.matches(state.as_str()));
        assert!(!state.matches(""));
        assert!(!state.matches(&format!("{}x", state.as_str())));
        if upper != state.as_str() {
            assert!(!state.matches(&upper));
        }
    }
}
