use crate::cli::ValidateArgs;
use crate::error::{CliError, Result};
use hybsweep::core::io::fasta;
use hybsweep::core::models::structure::{Segment, Structure};
use std::str::FromStr;
use tracing::info;

pub fn run(args: ValidateArgs) -> Result<()> {
    let structure =
        Structure::from_str(&args.structure).map_err(|e| CliError::Argument(e.to_string()))?;

    info!("Loading probe oligos from {:?}", &args.input);
    let records = fasta::read_from_path(&args.input).map_err(|e| CliError::FileParsing {
        path: args.input.clone(),
        source: e.into(),
    })?;

    let offsets = structure
        .validate(
            records
                .iter()
                .map(|r| (r.name.as_str(), r.sequence.as_str())),
        )
        .map_err(|e| CliError::Core(e.into()))?;

    println!(
        "✓ {} oligo(s) match structure {} (length {}).",
        records.len(),
        structure,
        structure.total_length()
    );
    for (segment, offset) in Segment::ALL.iter().zip(offsets) {
        println!(
            "  {:<8} starts at {:>4}, length {}",
            segment.to_string(),
            offset,
            structure.segment_length(*segment)
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;

    fn args(input: &Path, structure: &str) -> ValidateArgs {
        ValidateArgs {
            input: input.to_path_buf(),
            structure: structure.to_string(),
        }
    }

    #[test]
    fn accepts_matching_oligos() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("probe.fa");
        fs::write(&input, ">o1\nAACCGGTTAC\n>o2\nTTGGCCAAGT\n").unwrap();
        assert!(run(args(&input, "2,3,4,1")).is_ok());
    }

    #[test]
    fn rejects_length_mismatch_as_structure_error() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("probe.fa");
        fs::write(&input, ">o1\nAACCGGTTAC\n").unwrap();
        let err = run(args(&input, "2,3,4,2")).unwrap_err();
        assert!(matches!(err, CliError::Core(_)));
    }

    #[test]
    fn rejects_malformed_structure_and_fasta() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("probe.fa");
        fs::write(&input, "ACGT\n").unwrap();
        assert!(matches!(
            run(args(&input, "2,3,x,1")),
            Err(CliError::Argument(_))
        ));
        assert!(matches!(
            run(args(&input, "1,1,1,1")),
            Err(CliError::FileParsing { .. })
        ));
    }
}
