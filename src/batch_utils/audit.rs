use crate::transaction::Transaction;
use crate::utxo_pool::UtxoPool;
use crate::value::Balance;
use anyhow::{anyhow, Context};
use itertools::Itertools;

/// Replays `accepted` on a copy of `initial_pool` and checks the value
/// rules of the batch: every consumed output exists when it is spent, no
/// output is consumed twice, no output is negative and no transaction
/// creates value. Returns the total fee. Signatures are not rechecked.
pub fn verify_resolution(
    initial_pool: &UtxoPool,
    accepted: &[Transaction],
) -> anyhow::Result<Balance> {
    let consumed = accepted
        .iter()
        .flat_map(|tx| tx.inputs().iter().map(|input| input.output_ref()))
        .collect::<Vec<_>>();
    if !consumed.iter().all_unique() {
        return Err(anyhow!(
            "found output consumed more than once among {} accepted txs",
            accepted.len()
        ));
    }

    let mut pool = initial_pool.clone();
    let mut total_fees = Balance::zero();
    for tx in accepted.iter() {
        let mut balance = Balance::zero();
        for input in tx.inputs().iter() {
            let output = pool
                .get_output(&input.output_ref())
                .with_context(|| format!("tx {} spends an unavailable output", tx.hash()))?;
            balance += &output.value;
        }

        for (position, output) in tx.outputs().iter().enumerate() {
            if output.value.is_negative() {
                return Err(anyhow!(
                    "tx {} has negative output {} at position {}",
                    tx.hash(),
                    output.value,
                    position
                ));
            }
            balance -= &output.value;
        }

        if balance.is_negative() {
            return Err(anyhow!("tx {} is not balanced: balance {}", tx.hash(), balance));
        }

        total_fees += &balance;
        pool.apply_transaction(tx)?;
    }

    Ok(total_fees)
}
