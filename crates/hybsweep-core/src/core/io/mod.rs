//! Reading probes from FASTA and exchanging tables in tab-separated form.
//!
//! Every table is read and written through the `csv` crate with a tab delimiter and a
//! header row, so the files stay readable by the shell tools and scripts that usually
//! sit around a probe design pipeline.

pub mod fasta;
pub mod tsv;
