pub mod batch_utils;
pub mod error;
pub mod generation_utils;
pub mod ledger;
pub mod resolver;
pub mod signature;
pub mod transaction;
pub mod utils;
pub mod utxo_pool;
pub mod validator;
pub mod value;
