//! # Core Module
//!
//! Fundamental building blocks shared by the engine and the workflows.
//!
//! - **Probe Representation** ([`models`]) - Structures, oligos, probes, hybridization
//!   conditions, and melt fractions
//! - **Thermodynamics** ([`thermo`]) - Two-state duplex and fold fractions with salt and
//!   formamide corrections
//! - **File I/O** ([`io`]) - FASTA input and tab-separated tables
//! - **Utilities** ([`utils`]) - Numeric helpers

pub mod io;
pub mod models;
pub mod thermo;
pub mod utils;
