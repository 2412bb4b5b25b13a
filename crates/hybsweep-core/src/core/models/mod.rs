//! Data structures describing probes and the conditions they are evaluated at.

pub mod condition;
pub mod melt;
pub mod oligo;
pub mod structure;
