use crate::error::{PoolError, PoolResult};
use crate::transaction::{Output, OutputRef, Transaction};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// One line of a serialized pool.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UtxoEntry {
    pub output_ref: OutputRef,
    pub output: Output,
}

/// The set of currently spendable outputs.
///
/// `Clone` is a full value copy: a cloned pool shares nothing with its
/// source.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UtxoPool {
    utxos: HashMap<OutputRef, Output>,
}

impl UtxoPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, output_ref: &OutputRef) -> bool {
        self.utxos.contains_key(output_ref)
    }

    pub fn get_output(&self, output_ref: &OutputRef) -> PoolResult<&Output> {
        self.utxos
            .get(output_ref)
            .ok_or(PoolError::NotFound(*output_ref))
    }

    /// Overwrites any output already stored under `output_ref`.
    pub fn add_output(&mut self, output_ref: OutputRef, output: Output) {
        self.utxos.insert(output_ref, output);
    }

    pub fn remove_output(&mut self, output_ref: &OutputRef) -> PoolResult<Output> {
        self.utxos
            .remove(output_ref)
            .ok_or(PoolError::NotFound(*output_ref))
    }

    /// Spends every input of `tx` and adds every output of `tx` under the
    /// transaction's own hash, as one step. If any consumed output is
    /// missing, any produced position can't be referenced or a produced
    /// reference is already taken, the pool is left untouched.
    pub fn apply_transaction(&mut self, tx: &Transaction) -> PoolResult<()> {
        let produced = tx.produced_refs()?;
        let mut claimed = HashSet::with_capacity(tx.inputs().len());
        for input in tx.inputs().iter() {
            let output_ref = input.output_ref();
            // a second claim would find the output already removed
            if !self.contains(&output_ref) || !claimed.insert(output_ref) {
                return Err(PoolError::NotFound(output_ref));
            }
        }
        if let Some((output_ref, _)) = produced
            .iter()
            .find(|(output_ref, _)| self.contains(output_ref) && !claimed.contains(output_ref))
        {
            return Err(PoolError::AlreadyPresent(*output_ref));
        }

        for input in tx.inputs().iter() {
            self.remove_output(&input.output_ref())?;
        }
        for (output_ref, output) in produced.into_iter() {
            self.add_output(output_ref, output);
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.utxos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.utxos.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&OutputRef, &Output)> {
        self.utxos.iter()
    }

    /// Entries sorted by reference, so dumps of equal pools are identical.
    pub fn entries(&self) -> Vec<UtxoEntry> {
        let mut entries: Vec<UtxoEntry> = self
            .utxos
            .iter()
            .map(|(output_ref, output)| UtxoEntry {
                output_ref: *output_ref,
                output: *output,
            })
            .collect();
        entries.sort_by_key(|entry| entry.output_ref);
        entries
    }

    pub fn from_entries(entries: Vec<UtxoEntry>) -> Self {
        entries
            .into_iter()
            .map(|entry| (entry.output_ref, entry.output))
            .collect()
    }
}

impl FromIterator<(OutputRef, Output)> for UtxoPool {
    fn from_iter<T: IntoIterator<Item = (OutputRef, Output)>>(iter: T) -> Self {
        Self {
            utxos: iter.into_iter().collect(),
        }
    }
}
