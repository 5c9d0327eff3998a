use crate::transaction::PublicKey;
use ed25519_dalek::SigningKey;
use sha2::{Digest, Sha256};
use std::collections::HashMap;

/// Deterministic owner name -> ed25519 key mapping, used to build
/// reproducible scenarios and to print owners back by name.
#[derive(Default)]
pub struct KeyRing {
    keys_by_owner: HashMap<String, SigningKey>,
    owners_by_key: HashMap<PublicKey, String>,
}

impl KeyRing {
    fn derive_key(owner: &str) -> SigningKey {
        let digest = Sha256::digest(owner.as_bytes());
        let mut seed = [0u8; 32];
        seed.copy_from_slice(&digest);
        SigningKey::from_bytes(&seed)
    }

    pub fn signing_key(&mut self, owner: &str) -> &SigningKey {
        let owners_by_key = &mut self.owners_by_key;
        self.keys_by_owner
            .entry(owner.to_string())
            .or_insert_with(|| {
                let key = Self::derive_key(owner);
                owners_by_key.insert(PublicKey::from(&key), owner.to_string());
                key
            })
    }

    pub fn public_key(&mut self, owner: &str) -> PublicKey {
        PublicKey::from(self.signing_key(owner))
    }

    pub fn owner_of(&self, key: &PublicKey) -> Option<&str> {
        self.owners_by_key.get(key).map(|owner| owner.as_str())
    }

    pub fn len(&self) -> usize {
        self.keys_by_owner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
