pub mod audit;
pub mod qualification;
