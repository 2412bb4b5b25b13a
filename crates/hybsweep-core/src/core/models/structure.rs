use std::collections::HashSet;
use std::fmt;
use std::ops::Range;
use std::str::FromStr;
use thiserror::Error;

/// Number of segments every oligo is made of.
pub const SEGMENT_COUNT: usize = 4;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum StructureError {
    #[error("Structure '{raw}' must have exactly 4 comma-separated parts, found {found}")]
    WrongPartCount { raw: String, found: usize },

    #[error("Structure part '{part}' is not a positive integer")]
    InvalidPart { part: String },

    #[error("Oligo '{oligo}' has length {actual}, but the structure expects {expected}")]
    LengthMismatch {
        oligo: String,
        expected: usize,
        actual: usize,
    },

    #[error("Oligo '{oligo}' has length {actual}, while the first oligo of the probe has length {expected}")]
    NonUniformLength {
        oligo: String,
        expected: usize,
        actual: usize,
    },

    #[error("Oligo identifier '{0}' appears more than once in the probe")]
    DuplicateOligo(String),

    #[error("Probe contains no oligos")]
    EmptyProbe,
}

/// The four consecutive segments of a probe oligo, 5' to 3'.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Segment {
    Color,
    Forward,
    Target,
    Reverse,
}

impl Segment {
    pub const ALL: [Segment; SEGMENT_COUNT] = [
        Segment::Color,
        Segment::Forward,
        Segment::Target,
        Segment::Reverse,
    ];

    fn index(self) -> usize {
        match self {
            Segment::Color => 0,
            Segment::Forward => 1,
            Segment::Target => 2,
            Segment::Reverse => 3,
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Segment::Color => "color",
            Segment::Forward => "forward",
            Segment::Target => "target",
            Segment::Reverse => "reverse",
        };
        f.write_str(name)
    }
}

/// Start offset (0-based) of each segment, in [`Segment::ALL`] order.
pub type SegmentOffsets = [usize; SEGMENT_COUNT];

/// Segment lengths shared by every oligo of a probe.
///
/// A `Structure` can only be built with four positive lengths, so holding one
/// means the layout itself is valid. Whether a given set of oligos matches it is
/// checked by [`Structure::validate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Structure {
    lengths: [usize; SEGMENT_COUNT],
}

impl Structure {
    pub fn new(lengths: [usize; SEGMENT_COUNT]) -> Result<Self, StructureError> {
        if let Some(zero) = lengths.iter().find(|&&len| len == 0) {
            return Err(StructureError::InvalidPart {
                part: zero.to_string(),
            });
        }
        Ok(Self { lengths })
    }

    pub fn lengths(&self) -> [usize; SEGMENT_COUNT] {
        self.lengths
    }

    pub fn segment_length(&self, segment: Segment) -> usize {
        self.lengths[segment.index()]
    }

    /// Expected length of every oligo.
    pub fn total_length(&self) -> usize {
        self.lengths.iter().sum()
    }

    /// Cumulative start offsets of the segments.
    pub fn offsets(&self) -> SegmentOffsets {
        let mut offsets = [0; SEGMENT_COUNT];
        for i in 1..SEGMENT_COUNT {
            offsets[i] = offsets[i - 1] + self.lengths[i - 1];
        }
        offsets
    }

    pub fn range(&self, segment: Segment) -> Range<usize> {
        let start = self.offsets()[segment.index()];
        start..start + self.segment_length(segment)
    }

    /// Checks a probe's oligos against this structure.
    ///
    /// The oligos must be non-empty, uniquely named, of uniform length, and that
    /// length must equal [`Structure::total_length`]. Returns the segment offsets
    /// used to slice every oligo.
    pub fn validate<'a, I>(&self, oligos: I) -> Result<SegmentOffsets, StructureError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut seen = HashSet::new();
        let mut first_length: Option<usize> = None;

        for (name, sequence) in oligos {
            if !seen.insert(name) {
                return Err(StructureError::DuplicateOligo(name.to_string()));
            }

            let actual = sequence.len();
            match first_length {
                None => first_length = Some(actual),
                Some(expected) if expected != actual => {
                    return Err(StructureError::NonUniformLength {
                        oligo: name.to_string(),
                        expected,
                        actual,
                    });
                }
                Some(_) => {}
            }

            if actual != self.total_length() {
                return Err(StructureError::LengthMismatch {
                    oligo: name.to_string(),
                    expected: self.total_length(),
                    actual,
                });
            }
        }

        if first_length.is_none() {
            return Err(StructureError::EmptyProbe);
        }
        Ok(self.offsets())
    }
}

impl FromStr for Structure {
    type Err = StructureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != SEGMENT_COUNT {
            return Err(StructureError::WrongPartCount {
                raw: s.to_string(),
                found: parts.len(),
            });
        }

        let mut lengths = [0; SEGMENT_COUNT];
        for (slot, part) in lengths.iter_mut().zip(&parts) {
            *slot = match part.parse::<usize>() {
                Ok(len) if len > 0 => len,
                _ => {
                    return Err(StructureError::InvalidPart {
                        part: part.to_string(),
                    });
                }
            };
        }
        Self::new(lengths)
    }
}

impl fmt::Display for Structure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [c, fw, t, r] = self.lengths;
        write!(f, "{},{},{},{}", c, fw, t, r)
    }
}
