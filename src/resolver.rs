use crate::error::PoolResult;
use crate::signature::SignatureVerifier;
use crate::transaction::{Transaction, TxHash};
use crate::utxo_pool::UtxoPool;
use crate::validator::{Admission, TransactionValidator};
use crate::value::Balance;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashSet;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionPolicy {
    /// Accept anything that validates, in worklist order, until a full
    /// pass accepts nothing.
    #[default]
    FirstValid,
    /// Accept the single highest-fee admissible candidate, re-score the
    /// rest against the new pool, repeat. Greedy: a cheap parent that
    /// unlocks an expensive child can lose to a mid-fee conflict.
    FeeGreedy,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResolverConfig {
    #[serde(default)]
    pub policy: SelectionPolicy,
    /// Stop after this many passes; whatever is still pending is rejected.
    #[serde(default)]
    pub max_passes: Option<usize>,
}

impl ResolverConfig {
    pub fn with_policy(policy: SelectionPolicy) -> Self {
        Self {
            policy,
            max_passes: None,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Resolution {
    /// In acceptance order.
    pub accepted: Vec<Transaction>,
    pub rejected: Vec<Transaction>,
    pub total_fees: Balance,
    pub passes: usize,
}

/// A candidate's standing against the current pool. Sorts best first:
/// admissible before inadmissible, then higher fee, then earlier position.
#[derive(Clone, Copy, Debug)]
struct ScoredCandidate {
    position: usize,
    fee: Balance,
    admission: Option<Admission>,
}

impl PartialEq for ScoredCandidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ScoredCandidate {}

impl PartialOrd for ScoredCandidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScoredCandidate {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .admission
            .is_some()
            .cmp(&self.admission.is_some())
            .then_with(|| other.fee.cmp(&self.fee))
            .then_with(|| self.position.cmp(&other.position))
    }
}

/// Picks a mutually consistent subset out of an unordered batch, applying
/// each accepted transaction to the pool before looking further, so that
/// children can spend outputs of parents from the same batch.
pub struct BatchResolver<V> {
    validator: TransactionValidator<V>,
    config: ResolverConfig,
}

impl<V: SignatureVerifier> BatchResolver<V> {
    pub fn new(verifier: V, config: ResolverConfig) -> Self {
        Self {
            validator: TransactionValidator::new(verifier),
            config,
        }
    }

    pub fn validator(&self) -> &TransactionValidator<V> {
        &self.validator
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Resolves `candidates` against `pool`, mutating it in place.
    ///
    /// Candidates that never become admissible end up in `rejected`; that is
    /// not an error. An error means the pool contract itself was broken and
    /// resolution stopped; transactions accepted before that stay applied.
    pub fn resolve(
        &self,
        candidates: Vec<Transaction>,
        pool: &mut UtxoPool,
    ) -> PoolResult<Resolution> {
        let mut resolution = Resolution::default();

        let mut seen = HashSet::<TxHash>::with_capacity(candidates.len());
        let mut worklist = Vec::with_capacity(candidates.len());
        for tx in candidates.into_iter() {
            if seen.insert(tx.hash()) {
                worklist.push(tx);
            } else {
                tracing::debug!("duplicate candidate {} skipped", tx.hash());
                resolution.rejected.push(tx);
            }
        }

        let mut leftover = match self.config.policy {
            SelectionPolicy::FirstValid => {
                self.resolve_first_valid(worklist, pool, &mut resolution)?
            }
            SelectionPolicy::FeeGreedy => {
                self.resolve_fee_greedy(worklist, pool, &mut resolution)?
            }
        };
        resolution.rejected.append(&mut leftover);

        tracing::info!(
            "batch resolved: accepted {}, rejected {}, fees {}, passes {}",
            resolution.accepted.len(),
            resolution.rejected.len(),
            resolution.total_fees,
            resolution.passes,
        );
        Ok(resolution)
    }

    fn pass_allowed(&self, passes: usize) -> bool {
        self.config.max_passes.map_or(true, |max| passes < max)
    }

    fn accept(
        &self,
        tx: Transaction,
        admission: Admission,
        pool: &mut UtxoPool,
        resolution: &mut Resolution,
    ) -> PoolResult<()> {
        pool.apply_transaction(&tx)?;
        let fee = admission.fee();
        tracing::debug!(
            "accepted {} with fee {} in pass {}",
            tx.hash(),
            fee,
            resolution.passes
        );
        resolution.total_fees += &fee;
        resolution.accepted.push(tx);
        Ok(())
    }

    fn resolve_first_valid(
        &self,
        mut worklist: Vec<Transaction>,
        pool: &mut UtxoPool,
        resolution: &mut Resolution,
    ) -> PoolResult<Vec<Transaction>> {
        while !worklist.is_empty() && self.pass_allowed(resolution.passes) {
            resolution.passes += 1;
            let mut progress = false;
            let mut pending = Vec::with_capacity(worklist.len());

            for tx in worklist.into_iter() {
                match self.validator.check(&tx, pool) {
                    Ok(admission) => {
                        self.accept(tx, admission, pool, resolution)?;
                        progress = true;
                    }
                    Err(rejection) => {
                        tracing::debug!("{} not admissible: {:?}", tx.hash(), rejection);
                        pending.push(tx);
                    }
                }
            }

            worklist = pending;
            if !progress {
                break;
            }
        }
        Ok(worklist)
    }

    fn resolve_fee_greedy(
        &self,
        mut worklist: Vec<Transaction>,
        pool: &mut UtxoPool,
        resolution: &mut Resolution,
    ) -> PoolResult<Vec<Transaction>> {
        while !worklist.is_empty() && self.pass_allowed(resolution.passes) {
            resolution.passes += 1;

            // scores are only valid for this pool state
            let best = worklist
                .iter()
                .enumerate()
                .map(|(position, tx)| self.score(position, tx, pool))
                .min();

            match best {
                Some(ScoredCandidate {
                    position,
                    admission: Some(admission),
                    ..
                }) => {
                    let tx = worklist.remove(position);
                    self.accept(tx, admission, pool, resolution)?;
                }
                _ => break,
            }
        }
        Ok(worklist)
    }

    fn score(&self, position: usize, tx: &Transaction, pool: &UtxoPool) -> ScoredCandidate {
        let admission = match self.validator.check(tx, pool) {
            Ok(admission) => Some(admission),
            Err(rejection) => {
                tracing::trace!("{} scored as inadmissible: {:?}", tx.hash(), rejection);
                None
            }
        };
        // an inadmissible candidate claims no input value
        let fee = match admission {
            Some(admission) => admission.fee(),
            None => Balance::zero() - tx.total_output(),
        };
        ScoredCandidate {
            position,
            fee,
            admission,
        }
    }
}

/// Resolves `candidates` against `pool` and returns the accepted subset.
pub fn resolve_batch<V: SignatureVerifier>(
    candidates: Vec<Transaction>,
    pool: &mut UtxoPool,
    verifier: V,
    policy: SelectionPolicy,
) -> PoolResult<Vec<Transaction>> {
    BatchResolver::new(verifier, ResolverConfig::with_policy(policy))
        .resolve(candidates, pool)
        .map(|resolution| resolution.accepted)
}
