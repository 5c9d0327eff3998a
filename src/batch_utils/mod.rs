pub mod audit;
pub mod key_ring;
pub mod stats_accumulator;
