//! # hybsweep Core Library
//!
//! A temperature sweep and scoring engine for picking the hybridization conditions of
//! multi-oligonucleotide FISH probes, for both the probe-to-target (H1) and the
//! labeled-oligo-to-color-flap (H2) reactions.
//!
//! ## Architectural Philosophy
//!
//! The library follows a three-layer architecture:
//!
//! - **[`core`]: The Foundation.** Stateless data models (`Structure`, `Probe`, `Condition`),
//!   the two-state thermodynamic fraction model, and FASTA/TSV input-output.
//!
//! - **[`engine`]: The Logic Core.** The melt evaluator boundary, the score engine, the
//!   sweep plan and its sequential/parallel explorers, condition selection, and the
//!   formamide equivalence calculation.
//!
//! - **[`workflows`]: The Public API.** Ties `engine` and `core` together into the complete
//!   two-stage condition picking procedure.

pub mod core;
pub mod engine;
pub mod workflows;
