use crate::error::{PoolError, PoolResult, TransactionError};
use crate::value::{Balance, Value};
use ed25519_dalek::{Signer, SigningKey, VerifyingKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

pub const HASH_LEN: usize = 32;
pub const PUBLIC_KEY_LEN: usize = 32;

mod hex_bytes {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<T: AsRef<[u8]>, S: Serializer>(
        bytes: &T,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes.as_ref()))
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<T, D::Error>
    where
        T: TryFrom<Vec<u8>>,
        D: Deserializer<'de>,
    {
        let encoded = String::deserialize(deserializer)?;
        let bytes = hex::decode(&encoded).map_err(D::Error::custom)?;
        let len = bytes.len();
        T::try_from(bytes).map_err(|_| D::Error::custom(format!("unexpected byte length {}", len)))
    }
}

fn sha256(bytes: &[u8]) -> [u8; HASH_LEN] {
    let digest = Sha256::digest(bytes);
    let mut out = [0u8; HASH_LEN];
    out.copy_from_slice(&digest);
    out
}

/// Content hash of a transaction.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TxHash(#[serde(with = "hex_bytes")] [u8; HASH_LEN]);

impl TxHash {
    pub const fn new(bytes: [u8; HASH_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; HASH_LEN] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TxHash({})", self.to_hex())
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Owner of an output. Raw ed25519 verifying key bytes; whether they form
/// a valid point is the verifier's business.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PublicKey(#[serde(with = "hex_bytes")] [u8; PUBLIC_KEY_LEN]);

impl PublicKey {
    pub const fn new(bytes: [u8; PUBLIC_KEY_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_LEN] {
        &self.0
    }
}

impl From<&VerifyingKey> for PublicKey {
    fn from(key: &VerifyingKey) -> Self {
        Self(key.to_bytes())
    }
}

impl From<&SigningKey> for PublicKey {
    fn from(key: &SigningKey) -> Self {
        Self(key.verifying_key().to_bytes())
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", hex::encode(self.0))
    }
}

/// Identity of a spendable output: the hash of the transaction that
/// created it and its position among that transaction's outputs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OutputRef {
    pub tx_hash: TxHash,
    pub index: u32,
}

impl OutputRef {
    pub const fn new(tx_hash: TxHash, index: u32) -> Self {
        Self { tx_hash, index }
    }

    pub fn for_position(tx_hash: TxHash, position: usize) -> PoolResult<Self> {
        let index = u32::try_from(position).map_err(|_| PoolError::MalformedIndex(position))?;
        Ok(Self::new(tx_hash, index))
    }

    fn write_to(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(self.tx_hash.as_bytes());
        buf.extend_from_slice(&self.index.to_be_bytes());
    }
}

impl fmt::Display for OutputRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.tx_hash, self.index)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Output {
    #[serde(rename = "val")]
    pub value: Value,
    #[serde(rename = "addr")]
    pub address: PublicKey,
}

impl Output {
    pub fn new(value: i64, address: PublicKey) -> Self {
        Self {
            value: Value::new(value),
            address,
        }
    }

    fn write_to(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.value.as_i64().to_be_bytes());
        buf.extend_from_slice(self.address.as_bytes());
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Input {
    pub prev_tx_hash: TxHash,
    pub output_index: u32,
    #[serde(rename = "sig", with = "hex_bytes")]
    pub signature: Vec<u8>,
}

impl Input {
    pub fn output_ref(&self) -> OutputRef {
        OutputRef::new(self.prev_tx_hash, self.output_index)
    }
}

/// Bytes the owner of `output_ref` signs to authorize spending it into
/// `outputs`. Signatures are never part of it.
pub fn signable_payload(output_ref: &OutputRef, outputs: &[Output]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(HASH_LEN + 4 + outputs.len() * (8 + PUBLIC_KEY_LEN));
    output_ref.write_to(&mut buf);
    for output in outputs.iter() {
        output.write_to(&mut buf);
    }
    buf
}

/// Wire form of a transaction. Only becomes a `Transaction` once its
/// stored hash is checked against the content.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawTransaction {
    hash: TxHash,
    inputs: Vec<Input>,
    outputs: Vec<Output>,
}

/// A sealed transaction. `hash` always matches the content, so outputs are
/// never filed under a reference the transaction doesn't own.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawTransaction")]
pub struct Transaction {
    hash: TxHash,
    inputs: Vec<Input>,
    outputs: Vec<Output>,
}

impl TryFrom<RawTransaction> for Transaction {
    type Error = TransactionError;

    fn try_from(raw: RawTransaction) -> Result<Self, Self::Error> {
        let tx = Transaction::new(raw.inputs, raw.outputs);
        if tx.hash != raw.hash {
            return Err(TransactionError::HashMismatch {
                stored: raw.hash,
                computed: tx.hash,
            });
        }
        Ok(tx)
    }
}

impl Transaction {
    /// Seals already signed inputs and outputs with their content hash.
    pub fn new(inputs: Vec<Input>, outputs: Vec<Output>) -> Self {
        let mut tx = Self {
            hash: TxHash::default(),
            inputs,
            outputs,
        };
        tx.hash = tx.compute_hash();
        tx
    }

    pub fn hash(&self) -> TxHash {
        self.hash
    }

    pub fn inputs(&self) -> &[Input] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[Output] {
        &self.outputs
    }

    pub fn raw_data_to_sign(&self, index: usize) -> Option<Vec<u8>> {
        self.inputs
            .get(index)
            .map(|input| signable_payload(&input.output_ref(), &self.outputs))
    }

    /// Hash preimage. Counts and signature lengths are prefixed so that no
    /// two different transactions share it.
    pub fn raw_tx(&self) -> Vec<u8> {
        let mut buf = vec![];
        buf.extend_from_slice(&(self.inputs.len() as u64).to_be_bytes());
        for input in self.inputs.iter() {
            input.output_ref().write_to(&mut buf);
            buf.extend_from_slice(&(input.signature.len() as u64).to_be_bytes());
            buf.extend_from_slice(&input.signature);
        }
        buf.extend_from_slice(&(self.outputs.len() as u64).to_be_bytes());
        for output in self.outputs.iter() {
            output.write_to(&mut buf);
        }
        buf
    }

    pub fn compute_hash(&self) -> TxHash {
        TxHash::new(sha256(&self.raw_tx()))
    }

    pub fn total_output(&self) -> Balance {
        let mut total = Balance::zero();
        for output in self.outputs.iter() {
            total += &output.value;
        }
        total
    }

    /// The fresh references this transaction's outputs live under once accepted.
    pub fn produced_refs(&self) -> PoolResult<Vec<(OutputRef, Output)>> {
        self.outputs
            .iter()
            .enumerate()
            .map(|(position, output)| Ok((OutputRef::for_position(self.hash, position)?, *output)))
            .collect()
    }
}

enum PendingSignature {
    Key(Box<SigningKey>),
    Raw(Vec<u8>),
}

/// Collects inputs and outputs, then signs every input over its payload.
#[derive(Default)]
pub struct TransactionBuilder {
    inputs: Vec<(OutputRef, PendingSignature)>,
    outputs: Vec<Output>,
}

impl TransactionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_input(mut self, output_ref: OutputRef, signer: &SigningKey) -> Self {
        self.inputs
            .push((output_ref, PendingSignature::Key(Box::new(signer.clone()))));
        self
    }

    pub fn add_input_with_signature(mut self, output_ref: OutputRef, signature: Vec<u8>) -> Self {
        self.inputs.push((output_ref, PendingSignature::Raw(signature)));
        self
    }

    pub fn add_output(mut self, value: i64, address: PublicKey) -> Self {
        self.outputs.push(Output::new(value, address));
        self
    }

    pub fn build(self) -> Transaction {
        let outputs = self.outputs;
        let inputs = self
            .inputs
            .into_iter()
            .map(|(output_ref, pending)| {
                let signature = match pending {
                    PendingSignature::Key(key) => key
                        .sign(&signable_payload(&output_ref, &outputs))
                        .to_bytes()
                        .to_vec(),
                    PendingSignature::Raw(raw) => raw,
                };
                Input {
                    prev_tx_hash: output_ref.tx_hash,
                    output_index: output_ref.index,
                    signature,
                }
            })
            .collect();
        Transaction::new(inputs, outputs)
    }
}

#[cfg(test)]
mod tests {
    use crate::batch_utils::key_ring::KeyRing;
    use crate::error::PoolError;
    use crate::transaction::{OutputRef, Transaction, TransactionBuilder, TxHash};

    fn sample(keys: &mut KeyRing) -> Transaction {
        let alice = keys.signing_key("alice").clone();
        TransactionBuilder::new()
            .add_input(OutputRef::new(TxHash::new([7u8; 32]), 1), &alice)
            .add_output(4, keys.public_key("bob"))
            .add_output(5, keys.public_key("carol"))
            .build()
    }

    #[test]
    fn payload_excludes_signatures() {
        let mut keys = KeyRing::default();
        let tx = sample(&mut keys);
        let payload = tx.raw_data_to_sign(0).unwrap();

        let mut stripped = tx.inputs().to_vec();
        stripped[0].signature = vec![];
        let unsigned = Transaction::new(stripped, tx.outputs().to_vec());

        assert_eq!(unsigned.raw_data_to_sign(0).unwrap(), payload);
        assert_ne!(unsigned.hash(), tx.hash());
        assert!(tx.raw_data_to_sign(1).is_none());
    }

    #[test]
    fn hash_covers_content() {
        let mut keys = KeyRing::default();
        let tx = sample(&mut keys);
        assert_eq!(tx.hash(), tx.compute_hash());
        assert_eq!(tx.hash(), sample(&mut keys).hash());

        let json = serde_json::to_string(&tx).unwrap();
        let restored: Transaction = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, tx);

        let tampered = json.replace("\"val\":4", "\"val\":40");
        let error_string = serde_json::from_str::<Transaction>(&tampered)
            .err()
            .unwrap()
            .to_string();
        assert!(error_string.contains("doesn't match its content hash"), "{}", error_string);
    }

    #[test]
    fn stored_hash_of_another_transaction_is_refused() {
        let mut keys = KeyRing::default();
        let tx = sample(&mut keys);
        let json = serde_json::to_string(&tx).unwrap();
        let forged = json.replace(&tx.hash().to_hex(), &TxHash::new([7u8; 32]).to_hex());
        assert_ne!(forged, json);
        assert!(serde_json::from_str::<Transaction>(&forged).is_err());
    }

    #[test]
    fn moving_bytes_between_signature_and_outputs_changes_hash() {
        let mut keys = KeyRing::default();
        let tx = sample(&mut keys);
        let output = tx.outputs()[0];

        // the first output's bytes appended to the signature instead
        let mut inputs = tx.inputs().to_vec();
        inputs[0].signature.extend_from_slice(&output.value.as_i64().to_be_bytes());
        inputs[0].signature.extend_from_slice(output.address.as_bytes());
        let shifted = Transaction::new(inputs, tx.outputs()[1..].to_vec());

        assert_ne!(shifted.raw_tx(), tx.raw_tx());
        assert_ne!(shifted.hash(), tx.hash());
    }

    #[test]
    fn produced_refs_use_own_hash() {
        let mut keys = KeyRing::default();
        let tx = sample(&mut keys);
        let refs = tx.produced_refs().unwrap();
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[0].0, OutputRef::new(tx.hash(), 0));
        assert_eq!(refs[1].0, OutputRef::new(tx.hash(), 1));
        assert_eq!(refs[1].1.value.as_i64(), 5);
    }

    #[test]
    fn oversized_position_is_malformed() {
        if usize::BITS > 32 {
            let position = u32::MAX as usize + 1;
            assert_eq!(
                OutputRef::for_position(TxHash::default(), position),
                Err(PoolError::MalformedIndex(position))
            );
        }
    }
}
