// =============================================================================
// OAuth State Store — CSRF tokens for the brokerage linking flow
// =============================================================================
//
// Pending authorize states live in process memory: issued when a user starts
// the OAuth flow, consumed exactly once by the callback. Entries expire after
// ten minutes and the map is capped, with the entries closest to expiry
// evicted first, so abandoned flows cannot grow the store without bound.
// =============================================================================

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use uuid::Uuid;

/// How long an issued state stays redeemable.
const STATE_TTL: Duration = Duration::from_secs(600);

/// Upper bound on concurrently pending states.
const MAX_PENDING_STATES: usize = 256;

struct PendingState {
    user_id: String,
    deadline: Instant,
}

/// In-memory store of pending OAuth states.
#[derive(Default)]
pub struct OauthStateStore {
    states: RwLock<HashMap<String, PendingState>>,
}

impl OauthStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint a state token for `user_id` and remember it until the callback
    /// redeems it or the TTL lapses.
    pub fn issue(&self, user_id: &str) -> String {
        let state = Uuid::new_v4().simple().to_string();
        let now = Instant::now();

        let mut states = self.states.write();
        states.retain(|_, pending| now < pending.deadline);
        while states.len() >= MAX_PENDING_STATES {
            let closest = states
                .iter()
                .min_by_key(|(_, pending)| pending.deadline)
                .map(|(token, _)| token.clone());
            match closest {
                Some(token) => {
                    states.remove(&token);
                }
                None => break,
            }
        }
        states.insert(
            state.clone(),
            PendingState {
                user_id: user_id.to_string(),
                deadline: now + STATE_TTL,
            },
        );
        state
    }

    /// Redeem a state token. Returns the user it was issued for, or `None`
    /// when the token is unknown, already used, or expired. The entry is
    /// removed either way.
    pub fn take(&self, state: &str) -> Option<String> {
        let pending = self.states.write().remove(state)?;
        if Instant::now() >= pending.deadline {
            return None;
        }
        Some(pending.user_id)
    }

    /// Number of states currently pending.
    pub fn pending_count(&self) -> usize {
        self.states.read().len()
    }

    #[cfg(test)]
    fn insert_with_deadline(&self, state: &str, user_id: &str, deadline: Instant) {
        self.states.write().insert(
            state.to_string(),
            PendingState {
                user_id: user_id.to_string(),
                deadline,
            },
        );
    }
}

// =============================================================================
// Tests
// =============================================================================
