pub mod decoy;
pub mod visit;
