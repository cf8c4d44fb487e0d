// Copyright 2025 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use super::challenge::ChallengeState;
use super::errors::Error;
use super::IChallengeStore;
use std::collections::HashMap;
use std::sync::Mutex;

/// In-memory challenge store.  Challenges never expire unless a TTL is set.
#[derive(Debug, Default)]
pub struct MemoChallengeStore {
    p: Mutex<HashMap<Vec<u8>, ChallengeState>>,
    ttl_secs: Option<u64>,
}

impl MemoChallengeStore {
    pub fn new() -> Self {
        Self {
            p: Default::default(),
            ttl_secs: None,
        }
    }

    /// Returns a store whose challenges can only be redeemed within
    /// `ttl_secs` seconds of being issued
    pub fn with_ttl(ttl_secs: u64) -> Self {
        Self {
            p: Default::default(),
            ttl_secs: Some(ttl_secs),
        }
    }

    pub fn len(&self) -> Result<usize, Error> {
        Ok(self.p.lock()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, Error> {
        Ok(self.len()? == 0)
    }

    /// Drop expired challenges, returning how many were removed
    pub fn purge_expired(&self, now: i64) -> Result<usize, Error> {
        let mut p = self.p.lock()?;
        let before = p.len();

        p.retain(|_, s| !s.is_expired(self.ttl_secs, now));

        Ok(before - p.len())
    }

    /// Add the challenges found in the given JSON snapshot.  Nothing is
    /// added if any of them is invalid.
    pub fn load_json(&self, j: &str) -> Result<(), Error> {
        let states: Vec<ChallengeState> =
            serde_json::from_str(j).map_err(|e| Error::Syntax(e.to_string()))?;

        let states = states
            .iter()
            .map(|s| ChallengeState::new(s.nonce(), s.raw_claim(), s.created_at()))
            .collect::<Result<Vec<_>, _>>()?;

        for s in states {
            self.save(s)?;
        }

        Ok(())
    }

    pub fn to_json(&self) -> Result<String, Error> {
        let p = self.p.lock()?;

        let mut states: Vec<&ChallengeState> = p.values().collect();
        states.sort_by_key(|s| s.created_at());

        serde_json::to_string_pretty(&states).map_err(|e| Error::Syntax(e.to_string()))
    }
}

impl IChallengeStore for MemoChallengeStore {
    fn save(&self, state: ChallengeState) -> Result<(), Error> {
        let mut p = self.p.lock()?;

        if p.contains_key(state.nonce()) {
            return Err(Error::Conflict(format!(
                "nonce {} is already outstanding",
                hex::encode(state.nonce())
            )));
        }

        p.insert(state.nonce().to_vec(), state);

        Ok(())
    }

    fn consume(&self, nonce: &[u8]) -> Result<Option<ChallengeState>, Error> {
        let state = self.p.lock()?.remove(nonce);

        Ok(state.filter(|s| !s.is_expired(self.ttl_secs, crate::unix_time())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Barrier};
    use std::thread;

    const TEST_NONCE: [u8; 20] = [0x11; 20];

    #[test]
    fn save_and_consume_once() {
        let s = MemoChallengeStore::new();

        s.save(ChallengeState::new(&TEST_NONCE, b"claim", 1).unwrap())
            .unwrap();

        let got = s.consume(&TEST_NONCE).unwrap().unwrap();
        assert_eq!(got.raw_claim(), b"claim");

        assert!(s.consume(&TEST_NONCE).unwrap().is_none());
        assert!(s.is_empty().unwrap());
    }

    #[test]
    fn unknown_nonce() {
        let s = MemoChallengeStore::new();

        assert!(s.consume(&[0x22; 20]).unwrap().is_none());
    }

    #[test]
    fn duplicate_nonce_is_rejected() {
        let s = MemoChallengeStore::new();

        s.save(ChallengeState::new(&TEST_NONCE, b"first", 1).unwrap())
            .unwrap();

        let r = s.save(ChallengeState::new(&TEST_NONCE, b"second", 2).unwrap());
        assert!(matches!(r, Err(Error::Conflict(_))));

        let got = s.consume(&TEST_NONCE).unwrap().unwrap();
        assert_eq!(got.raw_claim(), b"first");
    }

    #[test]
    fn short_nonce_is_rejected() {
        assert!(ChallengeState::new(&[0u8; 7], b"claim", 0).is_err());
        assert!(ChallengeState::new(&[0u8; 8], b"claim", 0).is_ok());
    }

    #[test]
    fn concurrent_consume_has_one_winner() {
        for _ in 0..20 {
            let s = Arc::new(MemoChallengeStore::new());
            s.save(ChallengeState::new(&TEST_NONCE, b"claim", 1).unwrap())
                .unwrap();

            let barrier = Arc::new(Barrier::new(2));

            let handles: Vec<_> = (0..2)
                .map(|_| {
                    let s = Arc::clone(&s);
                    let b = Arc::clone(&barrier);
                    thread::spawn(move || {
                        b.wait();
                        s.consume(&TEST_NONCE).unwrap()
                    })
                })
                .collect();

            let winners = handles
                .into_iter()
                .map(|h| h.join().unwrap())
                .filter(Option::is_some)
                .count();

            assert_eq!(winners, 1);
        }
    }

    #[test]
    fn expired_challenge_is_not_redeemable() {
        let s = MemoChallengeStore::with_ttl(60);
        let now = crate::unix_time();

        s.save(ChallengeState::new(&TEST_NONCE, b"old", now - 3600).unwrap())
            .unwrap();
        s.save(ChallengeState::new(&[0x33; 20], b"fresh", now).unwrap())
            .unwrap();

        assert!(s.consume(&TEST_NONCE).unwrap().is_none());
        assert!(s.consume(&[0x33; 20]).unwrap().is_some());
    }

    #[test]
    fn purge() {
        let s = MemoChallengeStore::with_ttl(60);

        s.save(ChallengeState::new(&TEST_NONCE, b"old", 100).unwrap())
            .unwrap();
        s.save(ChallengeState::new(&[0x33; 20], b"fresh", 1000).unwrap())
            .unwrap();

        assert_eq!(s.purge_expired(1030).unwrap(), 1);
        assert_eq!(s.len().unwrap(), 1);
    }

    #[test]
    fn json_snapshot() {
        let s = MemoChallengeStore::new();
        s.save(ChallengeState::new(&TEST_NONCE, &[0xca, 0xfe], 42).unwrap())
            .unwrap();

        let j = s.to_json().unwrap();
        assert!(j.contains("\"raw_claim\": \"cafe\""));

        let t = MemoChallengeStore::new();
        t.load_json(&j).unwrap();

        let got = t.consume(&TEST_NONCE).unwrap().unwrap();
        assert_eq!(got.created_at(), 42);
    }

    #[test]
    fn json_snapshot_with_short_nonce() {
        let j = r#"[
            {"nonce": "1111111111111111", "raw_claim": "cafe", "created_at": 1},
            {"nonce": "0011", "raw_claim": "cafe", "created_at": 2}
        ]"#;

        let s = MemoChallengeStore::new();

        assert!(matches!(s.load_json(j), Err(Error::Sema(_))));
        assert!(s.is_empty().unwrap());
    }
}
