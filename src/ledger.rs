use crate::error::PoolResult;
use crate::resolver::{BatchResolver, Resolution, ResolverConfig};
use crate::signature::{Ed25519Verifier, SignatureVerifier};
use crate::transaction::Transaction;
use crate::utxo_pool::UtxoPool;

/// Ledger state carried across epochs: an exclusively owned pool plus the
/// resolver that admits each epoch's batch into it.
pub struct Ledger<V = Ed25519Verifier> {
    pool: UtxoPool,
    resolver: BatchResolver<V>,
}

impl Ledger<Ed25519Verifier> {
    /// Starts from a copy of `pool`; the caller's pool is never touched.
    pub fn new(pool: &UtxoPool) -> Self {
        Self::with_verifier(pool, Ed25519Verifier, ResolverConfig::default())
    }
}

impl<V: SignatureVerifier> Ledger<V> {
    pub fn with_verifier(pool: &UtxoPool, verifier: V, config: ResolverConfig) -> Self {
        Self {
            pool: pool.clone(),
            resolver: BatchResolver::new(verifier, config),
        }
    }

    pub fn is_valid_tx(&self, tx: &Transaction) -> bool {
        self.resolver.validator().is_valid(tx, &self.pool)
    }

    pub fn handle_txs(&mut self, txs: Vec<Transaction>) -> PoolResult<Resolution> {
        self.resolver.resolve(txs, &mut self.pool)
    }

    pub fn utxo_pool(&self) -> &UtxoPool {
        &self.pool
    }

    pub fn into_utxo_pool(self) -> UtxoPool {
        self.pool
    }
}

#[cfg(test)]
mod tests {
    use crate::batch_utils::key_ring::KeyRing;
    use crate::generation_utils::{genesis_pool, genesis_ref, GENESIS_HASH};
    use crate::ledger::Ledger;
    use crate::resolver::{ResolverConfig, SelectionPolicy};
    use crate::signature::Ed25519Verifier;
    use crate::transaction::{OutputRef, Transaction, TransactionBuilder};

    #[test]
    fn ledger_pool_is_a_private_copy() {
        let mut keys = KeyRing::default();
        let pool = genesis_pool(&mut keys, &[("alice", 10)]).unwrap();
        let alice = keys.signing_key("alice").clone();
        let tx = TransactionBuilder::new()
            .add_input(genesis_ref(0), &alice)
            .add_output(10, keys.public_key("bob"))
            .build();

        let mut ledger = Ledger::new(&pool);
        assert!(ledger.is_valid_tx(&tx));
        let resolution = ledger.handle_txs(vec![tx.clone()]).unwrap();
        assert_eq!(resolution.accepted, vec![tx.clone()]);

        assert!(pool.contains(&genesis_ref(0)));
        assert!(!pool.contains(&OutputRef::new(tx.hash(), 0)));
        assert!(!ledger.utxo_pool().contains(&genesis_ref(0)));
        assert!(!ledger.is_valid_tx(&tx));
    }

    #[test]
    fn epochs_build_on_each_other() {
        let mut keys = KeyRing::default();
        let pool = genesis_pool(&mut keys, &[("alice", 10)]).unwrap();
        let alice = keys.signing_key("alice").clone();
        let bob = keys.signing_key("bob").clone();
        let first = TransactionBuilder::new()
            .add_input(genesis_ref(0), &alice)
            .add_output(9, keys.public_key("bob"))
            .build();
        let second = TransactionBuilder::new()
            .add_input(OutputRef::new(first.hash(), 0), &bob)
            .add_output(7, keys.public_key("carol"))
            .build();

        let mut ledger = Ledger::with_verifier(
            &pool,
            Ed25519Verifier,
            ResolverConfig::with_policy(SelectionPolicy::FeeGreedy),
        );
        assert!(!ledger.is_valid_tx(&second));

        let epoch_one = ledger.handle_txs(vec![first]).unwrap();
        assert_eq!(epoch_one.accepted.len(), 1);
        assert!(ledger.is_valid_tx(&second));

        let epoch_two = ledger.handle_txs(vec![second.clone()]).unwrap();
        assert_eq!(epoch_two.accepted, vec![second.clone()]);

        let final_pool = ledger.into_utxo_pool();
        assert_eq!(final_pool.len(), 1);
        assert_eq!(
            final_pool
                .get_output(&OutputRef::new(second.hash(), 0))
                .unwrap()
                .address,
            keys.public_key("carol")
        );
    }

    #[test]
    fn relabelled_transaction_cannot_take_over_an_output() {
        let mut keys = KeyRing::default();
        let pool = genesis_pool(&mut keys, &[("victim", 1000), ("mallory", 1)]).unwrap();
        let mallory = keys.signing_key("mallory").clone();
        let tx = TransactionBuilder::new()
            .add_input(genesis_ref(1), &mallory)
            .add_output(1, keys.public_key("mallory"))
            .build();

        let json = serde_json::to_string(&tx).unwrap();
        let relabelled = json.replace(&tx.hash().to_hex(), &GENESIS_HASH.to_hex());
        assert_ne!(relabelled, json);
        assert!(serde_json::from_str::<Transaction>(&relabelled).is_err());

        let mut ledger = Ledger::new(&pool);
        let restored: Transaction = serde_json::from_str(&json).unwrap();
        let resolution = ledger.handle_txs(vec![restored]).unwrap();
        assert_eq!(resolution.accepted.len(), 1);

        let victim_output = ledger.utxo_pool().get_output(&genesis_ref(0)).unwrap();
        assert_eq!(victim_output.value.as_i64(), 1000);
        assert_eq!(victim_output.address, keys.public_key("victim"));
        assert_eq!(ledger.utxo_pool().len(), 2);
    }
}
