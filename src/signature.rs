use crate::transaction::PublicKey;
use ed25519_dalek::{Signature, VerifyingKey};

/// Capability to check that `signature` over `message` was produced by the
/// holder of `public_key`.
pub trait SignatureVerifier {
    fn verify_signature(&self, public_key: &PublicKey, message: &[u8], signature: &[u8]) -> bool;
}

impl<T: SignatureVerifier + ?Sized> SignatureVerifier for &T {
    fn verify_signature(&self, public_key: &PublicKey, message: &[u8], signature: &[u8]) -> bool {
        (**self).verify_signature(public_key, message, signature)
    }
}

/// Strict ed25519 verification. Malformed keys and signatures verify as
/// false.
#[derive(Clone, Copy, Debug, Default)]
pub struct Ed25519Verifier;

impl SignatureVerifier for Ed25519Verifier {
    fn verify_signature(&self, public_key: &PublicKey, message: &[u8], signature: &[u8]) -> bool {
        let key = match VerifyingKey::from_bytes(public_key.as_bytes()) {
            Ok(key) => key,
            Err(err) => {
                tracing::trace!("malformed public key {:?}: {}", public_key, err);
                return false;
            }
        };
        let signature = match Signature::from_slice(signature) {
            Ok(signature) => signature,
            Err(err) => {
                tracing::trace!("malformed signature of {} bytes: {}", signature.len(), err);
                return false;
            }
        };
        key.verify_strict(message, &signature).is_ok()
    }
}
