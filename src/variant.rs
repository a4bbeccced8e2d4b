//! Variant record views.

use std::borrow::Cow;

use noodles::vcf::variant::Record as _;
use noodles::vcf::variant::RecordBuf;

use crate::error::Result;
use crate::fields::{Format, Info};
use crate::genotype::Genotypes;
use crate::header::Header;

/// One variant record, viewed through the session's header dictionary.
///
/// Values produced by iteration are *borrowed views*: the record aliases the
/// owning [`VariantFile`](crate::file::VariantFile)'s shared buffer and is
/// overwritten by the next iteration step — the borrow checker enforces that
/// a view cannot outlive the step that produced it. [`Variant::copy`]
/// produces an *owned* value with an independent record that stays valid
/// after the session advances.
pub struct Variant<'r> {
    header: Header,
    record: Cow<'r, RecordBuf>,
}

impl<'r> Variant<'r> {
    pub(crate) fn borrowed(header: Header, record: &'r RecordBuf) -> Self {
        Self {
            header,
            record: Cow::Borrowed(record),
        }
    }

    /// Returns the header this record is decoded against.
    pub fn header(&self) -> &Header {
        &self.header
    }

    pub(crate) fn record(&self) -> &RecordBuf {
        self.record.as_ref()
    }

    /// Returns whether this variant owns its record.
    ///
    /// Borrowed views return false; only owned values release a record on
    /// drop.
    pub fn is_owned(&self) -> bool {
        matches!(self.record, Cow::Owned(_))
    }

    /// Deep-copies this variant into an owned value.
    ///
    /// The clone is independent of the session's shared buffer and remains
    /// decodable after the source file advances or is dropped.
    pub fn copy(&self) -> Variant<'static> {
        let copy = Variant {
            header: self.header.clone(),
            record: Cow::Owned(self.record.as_ref().clone()),
        };

        debug_assert!(copy.is_owned());

        copy
    }

    /// Returns the chromosome (reference sequence) name.
    pub fn chrom(&self) -> &str {
        self.record.reference_sequence_name()
    }

    /// Returns the 1-based display position, or 0 when the position is
    /// missing.
    pub fn pos(&self) -> usize {
        self.record.variant_start().map(|p| p.get()).unwrap_or(0)
    }

    /// Returns the 0-based start position.
    pub fn start(&self) -> usize {
        self.pos().saturating_sub(1)
    }

    /// Returns the 0-based exclusive end position.
    ///
    /// Uses the record's declared length where the header allows computing
    /// it, falling back to the reference allele span.
    pub fn end(&self) -> usize {
        self.record
            .variant_end(self.header.dict())
            .map(|p| p.get())
            .unwrap_or_else(|_| self.start() + self.record.reference_bases().len())
    }

    /// Returns the record identifier, `;`-joined when several are stored, or
    /// `"."` when none is.
    pub fn id(&self) -> String {
        let ids = self.record.ids();

        if ids.as_ref().is_empty() {
            return String::from(".");
        }

        let mut out = String::new();
        join_into(&mut out, ids.as_ref().iter().map(String::as_str), ';');
        out
    }

    /// Returns the FILTER column: `"PASS"` when no filter is set, the single
    /// name when one is, and a `;`-joined list in stored order otherwise.
    pub fn filters(&self) -> String {
        let filters = self.record.filters();

        if filters.as_ref().is_empty() {
            return String::from("PASS");
        }

        let mut out = String::new();
        join_into(&mut out, filters.as_ref().iter().map(String::as_str), ';');
        out
    }

    /// Returns the quality score, or `default` when the stored value is the
    /// missing sentinel.
    pub fn qual(&self, default: f32) -> f32 {
        self.record.quality_score().unwrap_or(default)
    }

    /// Returns the reference allele.
    pub fn reference(&self) -> &str {
        self.record.reference_bases()
    }

    /// Returns the alternate alleles, in stored order.
    pub fn alternates(&self) -> &[String] {
        self.record.alternate_bases().as_ref()
    }

    /// Returns the INFO field accessor for this record.
    pub fn info(&self) -> Info<'_, 'r> {
        Info::new(self)
    }

    /// Returns the FORMAT field accessor for this record.
    pub fn format(&self) -> Format<'_, 'r> {
        Format::new(self)
    }

    /// Decodes the genotype field into `buf` and returns the genotype view.
    ///
    /// Shorthand for [`Format::genotypes`].
    pub fn genotypes<'b>(&self, buf: &'b mut Vec<i32>) -> Result<Genotypes<'b>> {
        self.format().genotypes(buf)
    }
}

/// Joins displayable items into a reusable buffer with a separator, avoiding
/// an intermediate allocation.
fn join_into<'a>(buf: &mut String, iter: impl Iterator<Item = &'a str>, sep: char) {
    let mut first = true;

    for item in iter {
        if !first {
            buf.push(sep);
        }

        first = false;
        buf.push_str(item);
    }
}
