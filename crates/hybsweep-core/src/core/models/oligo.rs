use super::structure::{Segment, Structure, StructureError};

/// A named nucleic-acid sequence, as read from or written to FASTA.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceRecord {
    pub name: String,
    pub sequence: String,
}

impl SequenceRecord {
    pub fn new(name: impl Into<String>, sequence: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sequence: sequence.into(),
        }
    }
}

/// Which part of every oligo a hybridization stage looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SequenceSubset {
    Full,
    Segment(Segment),
    ColorForward,
}

/// One probe oligonucleotide, sliced according to the probe's [`Structure`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Oligo {
    id: String,
    sequence: String,
    structure: Structure,
}

impl Oligo {
    fn new(id: String, sequence: String, structure: Structure) -> Self {
        Self {
            id,
            sequence,
            structure,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn sequence(&self) -> &str {
        &self.sequence
    }

    pub fn segment(&self, segment: Segment) -> &str {
        &self.sequence[self.structure.range(segment)]
    }

    pub fn color(&self) -> &str {
        self.segment(Segment::Color)
    }

    pub fn target(&self) -> &str {
        self.segment(Segment::Target)
    }

    /// Color flap together with the forward primer site.
    pub fn color_forward(&self) -> &str {
        let end = self.structure.range(Segment::Forward).end;
        &self.sequence[0..end]
    }

    pub fn subset(&self, subset: SequenceSubset) -> &str {
        match subset {
            SequenceSubset::Full => self.sequence(),
            SequenceSubset::Segment(segment) => self.segment(segment),
            SequenceSubset::ColorForward => self.color_forward(),
        }
    }
}

/// A set of oligos sharing one [`Structure`], in input order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Probe {
    name: String,
    structure: Structure,
    oligos: Vec<Oligo>,
}

impl Probe {
    /// Builds a probe from raw records, rejecting any record set that does not
    /// match `structure` (see [`Structure::validate`]).
    pub fn new(
        name: impl Into<String>,
        structure: Structure,
        records: Vec<SequenceRecord>,
    ) -> Result<Self, StructureError> {
        structure.validate(
            records
                .iter()
                .map(|r| (r.name.as_str(), r.sequence.as_str())),
        )?;

        let oligos = records
            .into_iter()
            .map(|r| Oligo::new(r.name, r.sequence, structure))
            .collect();

        Ok(Self {
            name: name.into(),
            structure,
            oligos,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn structure(&self) -> &Structure {
        &self.structure
    }

    pub fn oligos(&self) -> &[Oligo] {
        &self.oligos
    }

    pub fn len(&self) -> usize {
        self.oligos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.oligos.is_empty()
    }

    pub fn oligo(&self, id: &str) -> Option<&Oligo> {
        self.oligos.iter().find(|o| o.id == id)
    }

    pub fn oligo_ids(&self) -> impl Iterator<Item = &str> {
        self.oligos.iter().map(Oligo::id)
    }

    /// The given sub-sequence of every oligo, keyed by oligo identifier.
    pub fn records(&self, subset: SequenceSubset) -> Vec<SequenceRecord> {
        self.oligos
            .iter()
            .map(|o| SequenceRecord::new(o.id.clone(), o.subset(subset)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn structure() -> Structure {
        "2,3,4,1".parse().unwrap()
    }

    fn probe() -> Probe {
        Probe::new(
            "probe",
            structure(),
            vec![
                SequenceRecord::new("o1", "CCAAATTTTG"),
                SequenceRecord::new("o2", "GGCCCAAAAT"),
            ],
        )
        .unwrap()
    }

    #[test]
    fn oligo_segments_follow_structure_offsets() {
        let probe = probe();
        let oligo = probe.oligo("o1").unwrap();
        assert_eq!(oligo.color(), "CC");
        assert_eq!(oligo.segment(Segment::Forward), "AAA");
        assert_eq!(oligo.target(), "TTTT");
        assert_eq!(oligo.segment(Segment::Reverse), "G");
        assert_eq!(oligo.color_forward(), "CCAAA");
        assert_eq!(oligo.subset(SequenceSubset::Full), "CCAAATTTTG");
    }

    #[test]
    fn probe_keeps_insertion_order() {
        let probe = probe();
        let ids: Vec<_> = probe.oligo_ids().collect();
        assert_eq!(ids, vec!["o1", "o2"]);
        assert_eq!(probe.len(), 2);
        assert_eq!(probe.name(), "probe");
    }

    #[test]
    fn records_extract_the_requested_subset() {
        let probe = probe();
        let targets = probe.records(SequenceSubset::Segment(Segment::Target));
        assert_eq!(
            targets,
            vec![
                SequenceRecord::new("o1", "TTTT"),
                SequenceRecord::new("o2", "AAAA"),
            ]
        );

        let flaps = probe.records(SequenceSubset::ColorForward);
        assert_eq!(flaps[1].sequence, "GGCCC");
    }

    #[test]
    fn probe_rejects_records_that_do_not_match_structure() {
        let err = Probe::new(
            "bad",
            structure(),
            vec![
                SequenceRecord::new("o1", "CCAAATTTTG"),
                SequenceRecord::new("o2", "CCAAATTTT"),
            ],
        )
        .unwrap_err();
        assert!(matches!(err, StructureError::NonUniformLength { .. }));
    }
}
