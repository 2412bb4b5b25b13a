//! # Engine Module
//!
//! The condition search machinery: everything between a validated probe and the best
//! hybridization condition of a stage.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Stage conditions, temperature ranges, sweep strategy
//! - **Error Handling** ([`error`]) - The engine's error taxonomy
//! - **Progress Monitoring** ([`progress`]) - Callback-based progress reporting
//! - **State** ([`state`]) - Condition scores, ledgers, and selected conditions
//! - **Evaluation** ([`evaluator`]) - The melt evaluator boundary and its implementations
//! - **Scoring** ([`scoring`]) - Per-oligo goodness and condition scores
//! - **Search** ([`plan`], [`explorer`], [`selection`]) - Sweep planning, sequential and
//!   parallel exploration, and optimum selection
//! - **Reporting** ([`equivalence`], [`report`]) - Formamide equivalence and output tables
//!
//! Every evaluated condition writes its artifacts under its own directory (see
//! [`workspace`]), which is what lets the parallel explorer run conditions on independent
//! workers without any shared mutable state.

pub mod config;
pub mod equivalence;
pub mod error;
pub mod evaluator;
pub mod explorer;
pub mod plan;
pub mod progress;
pub mod report;
pub mod scoring;
pub mod selection;
pub mod state;
pub mod workspace;
