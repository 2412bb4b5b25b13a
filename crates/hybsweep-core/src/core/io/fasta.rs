use crate::core::models::oligo::SequenceRecord;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FastaError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {kind}")]
    Parse { line: usize, kind: FastaParseErrorKind },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FastaParseErrorKind {
    #[error("Sequence data found before the first '>' header")]
    SequenceBeforeHeader,
    #[error("Header line has no identifier")]
    EmptyHeader,
    #[error("Record '{0}' has no sequence")]
    EmptyRecord(String),
    #[error("Invalid nucleotide character '{0}'")]
    InvalidCharacter(char),
}

fn parse_error(line: usize, kind: FastaParseErrorKind) -> FastaError {
    FastaError::Parse { line, kind }
}

/// Reads FASTA records in file order.
///
/// The identifier is the first whitespace-delimited word of the header. Sequences may
/// span several lines and are upper-cased. Duplicated identifiers are kept here and
/// rejected later when the probe is validated.
pub fn read_from(reader: &mut impl BufRead) -> Result<Vec<SequenceRecord>, FastaError> {
    let mut records: Vec<SequenceRecord> = Vec::new();
    let mut header_line = 0;

    for (index, line) in reader.lines().enumerate() {
        let line_num = index + 1;
        let line = line?;
        let line = line.trim();

        if line.is_empty() {
            continue;
        }

        if let Some(header) = line.strip_prefix('>') {
            close_record(records.last(), header_line)?;
            let name = header
                .split_whitespace()
                .next()
                .ok_or_else(|| parse_error(line_num, FastaParseErrorKind::EmptyHeader))?;
            records.push(SequenceRecord::new(name, String::new()));
            header_line = line_num;
            continue;
        }

        let record = records
            .last_mut()
            .ok_or_else(|| parse_error(line_num, FastaParseErrorKind::SequenceBeforeHeader))?;
        for c in line.chars() {
            if !c.is_ascii_alphabetic() && c != '-' {
                return Err(parse_error(line_num, FastaParseErrorKind::InvalidCharacter(c)));
            }
            record.sequence.push(c.to_ascii_uppercase());
        }
    }

    close_record(records.last(), header_line)?;
    Ok(records)
}

fn close_record(record: Option<&SequenceRecord>, header_line: usize) -> Result<(), FastaError> {
    match record {
        Some(r) if r.sequence.is_empty() => Err(parse_error(
            header_line,
            FastaParseErrorKind::EmptyRecord(r.name.clone()),
        )),
        _ => Ok(()),
    }
}

pub fn read_from_path<P: AsRef<Path>>(path: P) -> Result<Vec<SequenceRecord>, FastaError> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    read_from(&mut reader)
}

/// Writes one single-line record per entry.
pub fn write_to(records: &[SequenceRecord], writer: &mut impl Write) -> io::Result<()> {
    for record in records {
        writeln!(writer, ">{}", record.name)?;
        writeln!(writer, "{}", record.sequence)?;
    }
    Ok(())
}

pub fn write_to_path<P: AsRef<Path>>(records: &[SequenceRecord], path: P) -> io::Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    write_to(records, &mut writer)?;
    writer.flush()
}
