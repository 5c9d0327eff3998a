use crate::batch_utils::key_ring::KeyRing;
use crate::error::PoolResult;
use crate::transaction::{Output, OutputRef, Transaction, TransactionBuilder, TxHash};
use crate::utxo_pool::UtxoPool;
use anyhow::anyhow;
use serde::{Deserialize, Serialize};

/// Hash the initial allocations of a generated pool live under. No real
/// transaction hashes to all zeroes.
pub const GENESIS_HASH: TxHash = TxHash::new([0u8; 32]);

pub fn genesis_ref(index: u32) -> OutputRef {
    OutputRef::new(GENESIS_HASH, index)
}

/// Pool holding one genesis output per `(owner, value)` allocation, in order.
pub fn genesis_pool(keys: &mut KeyRing, allocations: &[(&str, i64)]) -> PoolResult<UtxoPool> {
    allocations
        .iter()
        .enumerate()
        .map(|(position, (owner, value))| {
            Ok((
                OutputRef::for_position(GENESIS_HASH, position)?,
                Output::new(*value, keys.public_key(owner)),
            ))
        })
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GenerationConfig {
    /// Independent payment chains, one per genesis owner.
    pub owners: usize,
    pub initial_value: i64,
    /// Payments per chain; each spends the previous payment's output.
    pub chain_length: usize,
    /// Fee paid by every chain link.
    pub fee: i64,
    /// Add, for every link, a zero-fee double spend of the same output.
    #[serde(default)]
    pub with_conflicts: bool,
}

pub struct Scenario {
    pub keys: KeyRing,
    pub pool: UtxoPool,
    /// Children before parents, so resolving needs several passes.
    pub candidates: Vec<Transaction>,
}

pub fn generate_scenario(config: &GenerationConfig) -> anyhow::Result<Scenario> {
    let lowest_value = config.initial_value - config.fee * config.chain_length as i64;
    if config.fee < 0 || lowest_value < 0 {
        return Err(anyhow!(
            "chain of {} payments with fee {} can't be funded by {}",
            config.chain_length,
            config.fee,
            config.initial_value
        ));
    }

    let mut keys = KeyRing::default();
    let owners = (0..config.owners)
        .map(|owner| format!("owner-{}", owner))
        .collect::<Vec<_>>();
    let allocations = owners
        .iter()
        .map(|owner| (owner.as_str(), config.initial_value))
        .collect::<Vec<_>>();
    let pool = genesis_pool(&mut keys, &allocations)?;

    let mut candidates = vec![];
    for (chain, owner) in owners.iter().enumerate() {
        let mut holder = owner.clone();
        let mut spent = OutputRef::for_position(GENESIS_HASH, chain)?;
        let mut value = config.initial_value;

        for link in 0..config.chain_length {
            let signer = keys.signing_key(&holder).clone();
            let next_holder = format!("{}-hop-{}", owner, link);
            let payment = TransactionBuilder::new()
                .add_input(spent, &signer)
                .add_output(value - config.fee, keys.public_key(&next_holder))
                .build();

            if config.with_conflicts {
                let thief = format!("{}-rival-{}", owner, link);
                candidates.push(
                    TransactionBuilder::new()
                        .add_input(spent, &signer)
                        .add_output(value, keys.public_key(&thief))
                        .build(),
                );
            }

            spent = OutputRef::new(payment.hash(), 0);
            value -= config.fee;
            holder = next_holder;
            candidates.push(payment);
        }
    }
    candidates.reverse();

    tracing::info!(
        "generated {} candidates over {} genesis outputs",
        candidates.len(),
        pool.len()
    );

    Ok(Scenario {
        keys,
        pool,
        candidates,
    })
}

#[cfg(test)]
mod tests {
    use crate::generation_utils::{generate_scenario, GenerationConfig, GENESIS_HASH};
    use crate::signature::Ed25519Verifier;
    use crate::validator::validate;

    #[test]
    fn scenario_shape() {
        let config = GenerationConfig {
            owners: 2,
            initial_value: 50,
            chain_length: 3,
            fee: 1,
            with_conflicts: true,
        };
        let scenario = generate_scenario(&config).unwrap();

        assert_eq!(scenario.pool.len(), 2);
        assert!(scenario
            .pool
            .iter()
            .all(|(output_ref, _)| output_ref.tx_hash == GENESIS_HASH));
        assert_eq!(scenario.candidates.len(), 12);

        // only the heads of the chains and their rivals are admissible up front
        let admissible = scenario
            .candidates
            .iter()
            .filter(|tx| validate(tx, &scenario.pool, Ed25519Verifier))
            .count();
        assert_eq!(admissible, 4);
    }

    #[test]
    fn unfundable_chain_is_refused() {
        let config = GenerationConfig {
            owners: 1,
            initial_value: 2,
            chain_length: 3,
            fee: 1,
            with_conflicts: false,
        };
        assert!(generate_scenario(&config).is_err());
    }
}
