//! Packed genotype model: allele codes, per-sample genotypes, and hom/het
//! classification.
//!
//! Alleles travel as packed 32-bit codes, one per allele per sample: bit 0 is
//! the phased flag and the remaining bits hold the allele index shifted up by
//! one, so `-1` (missing), `0` (reference), and `n >= 1` (the n-th alternate)
//! are all representable.

use std::fmt;

/// A single allele call, packed into a 32-bit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Allele(i32);

impl Allele {
    /// Packs an allele index and phased flag into a code.
    pub const fn new(value: i32, phased: bool) -> Self {
        Self(((value + 1) << 1) | phased as i32)
    }

    /// Wraps a raw packed code.
    pub const fn from_raw(raw: i32) -> Self {
        Self(raw)
    }

    /// Returns the raw packed code.
    pub const fn raw(self) -> i32 {
        self.0
    }

    /// Returns the allele index: `-1` for missing, `0` for reference,
    /// `n >= 1` for the n-th alternate allele.
    pub const fn value(self) -> i32 {
        (self.0 >> 1) - 1
    }

    /// Returns whether this allele is phased.
    pub const fn is_phased(self) -> bool {
        self.0 & 1 == 1
    }

    /// Returns whether this allele call is missing/unknown.
    pub const fn is_missing(self) -> bool {
        self.value() < 0
    }
}

impl fmt::Display for Allele {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_missing() {
            f.write_str(".")
        } else {
            write!(f, "{}", self.value())
        }
    }
}

/// Classification of one genotype.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenotypeClass {
    /// Every allele is the reference allele.
    HomRef,
    /// Mixed reference/alternate or mixed alternate alleles.
    Het,
    /// Every allele is the same alternate allele.
    HomAlt,
    /// Missing or otherwise uncallable.
    Unknown,
}

/// One sample's ordered allele calls.
#[derive(Debug, Clone, Copy)]
pub struct Genotype<'g> {
    codes: &'g [i32],
}

impl<'g> Genotype<'g> {
    fn new(codes: &'g [i32]) -> Self {
        Self { codes }
    }

    /// Returns the number of alleles in this genotype.
    pub fn ploidy(&self) -> usize {
        self.codes.len()
    }

    /// Returns the i-th allele, in stored order.
    pub fn allele(&self, i: usize) -> Option<Allele> {
        self.codes.get(i).copied().map(Allele::from_raw)
    }

    /// Iterates the alleles in stored order.
    pub fn alleles(&self) -> impl Iterator<Item = Allele> + 'g {
        self.codes.iter().copied().map(Allele::from_raw)
    }

    /// Classifies this genotype as hom-ref, het, hom-alt, or unknown.
    ///
    /// The diploid case is decided directly from the two allele values. Other
    /// ploidies tally allele values into buckets for 0..=3 plus a shared
    /// bucket for anything higher; alternate indices beyond 3 are therefore
    /// not distinguished from one another, and a genotype made entirely of
    /// such alleles classifies as [`GenotypeClass::Het`].
    pub fn classify(&self) -> GenotypeClass {
        match *self.codes {
            [] => GenotypeClass::Unknown,
            [a, b] => classify_diploid(Allele::from_raw(a).value(), Allele::from_raw(b).value()),
            _ => classify_general(self.alleles()),
        }
    }
}

impl fmt::Display for Genotype<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ploidy = self.ploidy();

        for (i, allele) in self.alleles().enumerate() {
            write!(f, "{}", allele)?;

            // each allele carries its own separator; the trailing one is dropped
            if i + 1 < ploidy {
                f.write_str(if allele.is_phased() { "|" } else { "/" })?;
            }
        }

        Ok(())
    }
}

fn classify_diploid(a: i32, b: i32) -> GenotypeClass {
    if (a == 0 && b == 1) || (a == 1 && b == 0) {
        GenotypeClass::Het
    } else if a == 0 && b == 0 {
        GenotypeClass::HomRef
    } else if (a == 0 && b < 0) || (a < 0 && b == 0) {
        GenotypeClass::HomRef
    } else if a == b && a >= 1 {
        GenotypeClass::HomAlt
    } else if a >= 0 && b >= 0 {
        // both called, already known unequal
        GenotypeClass::Het
    } else {
        GenotypeClass::Unknown
    }
}

fn classify_general(alleles: impl Iterator<Item = Allele>) -> GenotypeClass {
    // explicit buckets for allele values 0..=3; higher values share one bucket
    let mut counts = [0usize; 4];
    let mut other = 0usize;
    let mut missing = 0usize;
    let mut total = 0usize;

    for allele in alleles {
        total += 1;

        let value = allele.value();

        if value < 0 {
            missing += 1;
        } else if (value as usize) < counts.len() {
            counts[value as usize] += 1;
        } else {
            other += 1;
        }
    }

    if missing == total {
        return GenotypeClass::Unknown;
    }

    if missing > 0 {
        // missing alongside reference-only calls counts as hom-ref; missing
        // alongside any alternate is uncallable
        return if counts[0] + missing == total {
            GenotypeClass::HomRef
        } else {
            GenotypeClass::Unknown
        };
    }

    if counts[0] == total {
        return GenotypeClass::HomRef;
    }

    if counts[1..].iter().any(|&count| count == total) {
        return GenotypeClass::HomAlt;
    }

    // reference mixed with alternates, multiple alternate buckets, or alleles
    // beyond the tracked value range
    GenotypeClass::Het
}

/// All samples' genotypes for one record, viewing the caller's code buffer.
///
/// Ploidy is derived, not configured: the flat code sequence must divide
/// evenly by the sample count, and every genotype spans exactly `ploidy`
/// consecutive codes.
#[derive(Debug, Clone, Copy)]
pub struct Genotypes<'g> {
    codes: &'g [i32],
    ploidy: usize,
}

impl<'g> Genotypes<'g> {
    pub(crate) fn new(codes: &'g [i32], ploidy: usize) -> Self {
        debug_assert!(ploidy == 0 || codes.len() % ploidy == 0);

        Self { codes, ploidy }
    }

    /// Returns the number of samples.
    pub fn len(&self) -> usize {
        if self.ploidy == 0 {
            0
        } else {
            self.codes.len() / self.ploidy
        }
    }

    /// Returns whether there are no genotypes.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the shared ploidy.
    pub fn ploidy(&self) -> usize {
        self.ploidy
    }

    /// Returns the i-th sample's genotype.
    pub fn get(&self, i: usize) -> Option<Genotype<'g>> {
        if self.ploidy == 0 {
            return None;
        }

        self.codes
            .chunks(self.ploidy)
            .nth(i)
            .map(Genotype::new)
    }

    /// Iterates genotypes in sample order.
    pub fn iter(&self) -> impl Iterator<Item = Genotype<'g>> + '_ {
        self.codes.chunks(self.ploidy.max(1)).map(Genotype::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn genotype(values: &[(i32, bool)]) -> Vec<i32> {
        values
            .iter()
            .map(|&(value, phased)| Allele::new(value, phased).raw())
            .collect()
    }

    #[test]
    fn test_allele_roundtrip() {
        for value in -1..=3 {
            for phased in [false, true] {
                let allele = Allele::new(value, phased);
                assert_eq!(allele.value(), value);
                assert_eq!(allele.is_phased(), phased);
                assert_eq!(Allele::from_raw(allele.raw()), allele);
            }
        }
    }

    #[test]
    fn test_classify_diploid() {
        let cases = [
            (vec![(0, false), (0, false)], GenotypeClass::HomRef),
            (vec![(0, false), (1, false)], GenotypeClass::Het),
            (vec![(1, false), (0, false)], GenotypeClass::Het),
            (vec![(1, true), (1, true)], GenotypeClass::HomAlt),
            (vec![(2, false), (2, false)], GenotypeClass::HomAlt),
            (vec![(1, false), (2, false)], GenotypeClass::Het),
            (vec![(0, false), (2, false)], GenotypeClass::Het),
            (vec![(-1, false), (-1, false)], GenotypeClass::Unknown),
            (vec![(0, false), (-1, false)], GenotypeClass::HomRef),
            (vec![(-1, false), (0, false)], GenotypeClass::HomRef),
            (vec![(1, false), (-1, false)], GenotypeClass::Unknown),
        ];

        for (alleles, expected) in cases {
            let codes = genotype(&alleles);
            let gt = Genotype::new(&codes);
            assert_eq!(gt.classify(), expected, "alleles: {alleles:?}");
        }
    }

    #[test]
    fn test_classify_triploid() {
        let cases = [
            (vec![(0, false); 3], GenotypeClass::HomRef),
            (vec![(2, false); 3], GenotypeClass::HomAlt),
            (vec![(0, false), (0, false), (1, false)], GenotypeClass::Het),
            (vec![(1, false), (2, false), (0, false)], GenotypeClass::Het),
            (vec![(1, false), (3, false), (3, false)], GenotypeClass::Het),
            (vec![(-1, false); 3], GenotypeClass::Unknown),
            (vec![(0, false), (-1, false), (-1, false)], GenotypeClass::HomRef),
            (vec![(1, false), (-1, false), (-1, false)], GenotypeClass::Unknown),
            // allele values past the tracked buckets collapse into one bucket
            (vec![(4, false); 3], GenotypeClass::Het),
            (vec![(4, false), (5, false), (4, false)], GenotypeClass::Het),
        ];

        for (alleles, expected) in cases {
            let codes = genotype(&alleles);
            let gt = Genotype::new(&codes);
            assert_eq!(gt.classify(), expected, "alleles: {alleles:?}");
        }
    }

    #[test]
    fn test_classify_haploid() {
        let hom_ref = genotype(&[(0, false)]);
        assert_eq!(Genotype::new(&hom_ref).classify(), GenotypeClass::HomRef);

        let hom_alt = genotype(&[(1, false)]);
        assert_eq!(Genotype::new(&hom_alt).classify(), GenotypeClass::HomAlt);

        let missing = genotype(&[(-1, false)]);
        assert_eq!(Genotype::new(&missing).classify(), GenotypeClass::Unknown);
    }

    #[test]
    fn test_display() {
        let unphased = genotype(&[(0, false), (1, false)]);
        assert_eq!(Genotype::new(&unphased).to_string(), "0/1");

        let phased = genotype(&[(1, true), (1, true)]);
        assert_eq!(Genotype::new(&phased).to_string(), "1|1");

        let missing = genotype(&[(-1, false), (-1, false)]);
        assert_eq!(Genotype::new(&missing).to_string(), "./.");

        let triploid = genotype(&[(0, false), (1, true), (2, false)]);
        assert_eq!(Genotype::new(&triploid).to_string(), "0/1|2");
    }

    #[test]
    fn test_genotypes_layout() {
        let codes = genotype(&[(0, false), (1, false), (1, false), (1, false)]);
        let genotypes = Genotypes::new(&codes, 2);

        assert_eq!(genotypes.len(), 2);
        assert_eq!(genotypes.ploidy(), 2);
        assert_eq!(genotypes.get(0).unwrap().to_string(), "0/1");
        assert_eq!(genotypes.get(1).unwrap().to_string(), "1/1");
        assert!(genotypes.get(2).is_none());

        let classes: Vec<_> = genotypes.iter().map(|gt| gt.classify()).collect();
        assert_eq!(classes, [GenotypeClass::Het, GenotypeClass::HomAlt]);
    }
}
