use crate::signature::SignatureVerifier;
use crate::transaction::{OutputRef, Transaction};
use crate::utxo_pool::UtxoPool;
use crate::value::{Balance, Value};
use std::collections::HashSet;

/// Why a transaction is not admissible against a pool. Only used for
/// diagnostics; callers see a plain `bool` from `is_valid`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Rejection {
    NoInputs,
    MissingInput {
        position: usize,
        output_ref: OutputRef,
    },
    BadSignature {
        position: usize,
        output_ref: OutputRef,
    },
    DuplicateInput {
        position: usize,
        output_ref: OutputRef,
    },
    NegativeOutput {
        position: usize,
        value: Value,
    },
    Overspend {
        total_in: Balance,
        total_out: Balance,
    },
}

/// Totals of a transaction that passed validation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Admission {
    pub total_in: Balance,
    pub total_out: Balance,
}

impl Admission {
    pub fn fee(&self) -> Balance {
        self.total_in - self.total_out
    }
}

pub struct TransactionValidator<V> {
    verifier: V,
}

impl<V: SignatureVerifier> TransactionValidator<V> {
    pub fn new(verifier: V) -> Self {
        Self { verifier }
    }

    pub fn is_valid(&self, tx: &Transaction, pool: &UtxoPool) -> bool {
        self.check(tx, pool).is_ok()
    }

    /// Checks every input, in order, for presence in `pool`, a valid
    /// signature by the referenced output's owner and a unique claim;
    /// then that no output is negative and outputs don't exceed inputs.
    /// The pool is only read.
    pub fn check(&self, tx: &Transaction, pool: &UtxoPool) -> Result<Admission, Rejection> {
        if tx.inputs().is_empty() {
            return Err(Rejection::NoInputs);
        }

        let mut claimed = HashSet::with_capacity(tx.inputs().len());
        let mut total_in = Balance::zero();
        for (position, input) in tx.inputs().iter().enumerate() {
            let output_ref = input.output_ref();
            let spent = match pool.get_output(&output_ref) {
                Ok(output) => output,
                Err(_) => {
                    return Err(Rejection::MissingInput {
                        position,
                        output_ref,
                    })
                }
            };

            let authorized = tx.raw_data_to_sign(position).map_or(false, |payload| {
                self.verifier
                    .verify_signature(&spent.address, &payload, &input.signature)
            });
            if !authorized {
                return Err(Rejection::BadSignature {
                    position,
                    output_ref,
                });
            }

            if !claimed.insert(output_ref) {
                return Err(Rejection::DuplicateInput {
                    position,
                    output_ref,
                });
            }

            total_in += &spent.value;
        }

        let mut total_out = Balance::zero();
        for (position, output) in tx.outputs().iter().enumerate() {
            if output.value.is_negative() {
                return Err(Rejection::NegativeOutput {
                    position,
                    value: output.value,
                });
            }
            total_out += &output.value;
        }

        if total_out > total_in {
            return Err(Rejection::Overspend {
                total_in,
                total_out,
            });
        }

        Ok(Admission {
            total_in,
            total_out,
        })
    }
}

/// Whether `tx` is admissible against `pool`.
pub fn validate<V: SignatureVerifier>(tx: &Transaction, pool: &UtxoPool, verifier: V) -> bool {
    TransactionValidator::new(verifier).is_valid(tx, pool)
}
