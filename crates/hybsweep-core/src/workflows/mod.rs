//! # Workflows Module
//!
//! Top-level entry points tying the [`engine`](crate::engine) and [`core`](crate::core)
//! layers together.
//!
//! - **Pick Workflow** ([`pick`]) - Validates the run, sweeps the H1 and H2 stages,
//!   selects the best condition of each and derives its equivalent formamide.
//!
//! Workflows never write the final reports themselves; callers decide where the
//! ledgers and picked records go once a complete result is available.

pub mod pick;
