//! Typed INFO and FORMAT field extraction.
//!
//! Accessors decode one named field of the current record into a reusable
//! caller buffer and report the outcome through [`Status`]. Absence is an
//! expected, high-frequency outcome on a hot path, so it is a status value,
//! never an error or a panic.

use std::fmt::Write as _;
use std::str::FromStr;

use noodles::vcf::header::record::value::map::format::Type as FormatType;
use noodles::vcf::header::record::value::map::info::Type as InfoType;
use noodles::vcf::variant::record::samples::keys::key;
use noodles::vcf::variant::record::samples::series::value::genotype::Phasing;
use noodles::vcf::variant::record_buf::info::field::{value::Array as InfoArray, Value as InfoValue};
use noodles::vcf::variant::record_buf::samples::sample::value::genotype::Genotype as GenotypeValue;
use noodles::vcf::variant::record_buf::samples::sample::{value::Array as SampleArray, Value as SampleValue};

use crate::error::{Error, Result};
use crate::genotype::{Allele, Genotypes};
use crate::variant::Variant;

/// Sentinel written for missing integer elements, matching the BCF missing
/// value.
pub const MISSING_INTEGER: i32 = i32::MIN;

/// Sentinel written for missing float elements.
pub const MISSING_FLOAT: f32 = f32::NAN;

/// Outcome of a single field-accessor call.
///
/// The three non-OK values map the three stages a lookup can fail at: the
/// key is not defined in the header dictionary at all, the key is defined
/// but with a different value type than requested, or the key is defined
/// and well-typed but absent from this particular record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "field extraction reports absence through this status"]
pub enum Status {
    /// The buffer holds the decoded values.
    Ok,
    /// The key is absent from the header dictionary.
    UndefinedTag,
    /// The key is defined with a different value type than requested.
    UnexpectedType,
    /// The key is absent from this record.
    NotFound,
}

impl Status {
    /// Returns whether this status is [`Status::Ok`].
    pub fn is_ok(self) -> bool {
        matches!(self, Status::Ok)
    }
}

fn fill_numeric<T: Copy>(buf: &mut Vec<T>, values: &[Option<T>], missing: T) {
    // keep the existing allocation whenever the lengths already match
    if buf.len() != values.len() {
        buf.resize(values.len(), missing);
    }

    for (dst, value) in buf.iter_mut().zip(values) {
        *dst = value.unwrap_or(missing);
    }
}

fn set_string(slot: &mut String, value: &str) {
    slot.clear();
    slot.push_str(value);
}

/// Per-variant (INFO) field accessor.
pub struct Info<'v, 'r> {
    variant: &'v Variant<'r>,
}

impl<'v, 'r> Info<'v, 'r> {
    pub(crate) fn new(variant: &'v Variant<'r>) -> Self {
        Self { variant }
    }

    fn lookup(&self, name: &str) -> std::result::Result<Option<&'v InfoValue>, Status> {
        match self.variant.record().info().as_ref().get(name) {
            Some(Some(value)) => Ok(Some(value)),
            Some(None) => Ok(None),
            None => Err(Status::NotFound),
        }
    }

    /// Decodes an Integer-typed INFO field into `buf`.
    ///
    /// On success the buffer is resized to exactly the stored value count,
    /// reusing its allocation when the length already matches; missing
    /// elements become [`MISSING_INTEGER`]. On any other status the buffer
    /// contents are unspecified and must not be read.
    pub fn ints(&self, name: &str, buf: &mut Vec<i32>) -> Status {
        let Some(definition) = self.variant.header().dict().infos().get(name) else {
            return Status::UndefinedTag;
        };

        if definition.ty() != InfoType::Integer {
            return Status::UnexpectedType;
        }

        match self.lookup(name) {
            Ok(Some(InfoValue::Integer(n))) => {
                fill_numeric(buf, &[Some(*n)], MISSING_INTEGER);
                Status::Ok
            }
            Ok(Some(InfoValue::Array(InfoArray::Integer(values)))) => {
                fill_numeric(buf, values, MISSING_INTEGER);
                Status::Ok
            }
            Ok(Some(_)) => Status::UnexpectedType,
            Ok(None) => Status::NotFound,
            Err(status) => status,
        }
    }

    /// Decodes a Float-typed INFO field into `buf`.
    ///
    /// Same buffer contract as [`Info::ints`]; missing elements become NaN.
    pub fn floats(&self, name: &str, buf: &mut Vec<f32>) -> Status {
        let Some(definition) = self.variant.header().dict().infos().get(name) else {
            return Status::UndefinedTag;
        };

        if definition.ty() != InfoType::Float {
            return Status::UnexpectedType;
        }

        match self.lookup(name) {
            Ok(Some(InfoValue::Float(n))) => {
                fill_numeric(buf, &[Some(*n)], MISSING_FLOAT);
                Status::Ok
            }
            Ok(Some(InfoValue::Array(InfoArray::Float(values)))) => {
                fill_numeric(buf, values, MISSING_FLOAT);
                Status::Ok
            }
            Ok(Some(_)) => Status::UnexpectedType,
            Ok(None) => Status::NotFound,
            Err(status) => status,
        }
    }

    /// Decodes a String- or Character-typed INFO field into `buf`, one entry
    /// per stored value.
    ///
    /// On any non-OK status the buffer is truncated to zero length.
    pub fn strings(&self, name: &str, buf: &mut Vec<String>) -> Status {
        let status = self.strings_inner(name, buf);

        if !status.is_ok() {
            buf.clear();
        }

        status
    }

    fn strings_inner(&self, name: &str, buf: &mut Vec<String>) -> Status {
        let Some(definition) = self.variant.header().dict().infos().get(name) else {
            return Status::UndefinedTag;
        };

        if !matches!(definition.ty(), InfoType::String | InfoType::Character) {
            return Status::UnexpectedType;
        }

        let value = match self.lookup(name) {
            Ok(Some(value)) => value,
            Ok(None) => return Status::NotFound,
            Err(status) => return status,
        };

        match value {
            InfoValue::String(s) => {
                buf.resize_with(1, String::new);
                set_string(&mut buf[0], s);
                Status::Ok
            }
            InfoValue::Character(c) => {
                buf.resize_with(1, String::new);
                buf[0].clear();
                buf[0].push(*c);
                Status::Ok
            }
            InfoValue::Array(InfoArray::String(values)) => {
                if buf.len() != values.len() {
                    buf.resize_with(values.len(), String::new);
                }

                for (slot, value) in buf.iter_mut().zip(values) {
                    set_string(slot, value.as_deref().unwrap_or("."));
                }

                Status::Ok
            }
            InfoValue::Array(InfoArray::Character(values)) => {
                if buf.len() != values.len() {
                    buf.resize_with(values.len(), String::new);
                }

                for (slot, value) in buf.iter_mut().zip(values) {
                    slot.clear();
                    slot.push(value.unwrap_or('.'));
                }

                Status::Ok
            }
            _ => Status::UnexpectedType,
        }
    }

    /// Returns whether a Flag-typed INFO key is present on this record.
    ///
    /// Flags carry no payload: this is true only for a key that the header
    /// declares as a flag and that the record stores as a zero-length field.
    pub fn flag(&self, name: &str) -> bool {
        let Some(definition) = self.variant.header().dict().infos().get(name) else {
            return false;
        };

        if definition.ty() != InfoType::Flag {
            return false;
        }

        matches!(self.lookup(name), Ok(None) | Ok(Some(InfoValue::Flag)))
    }
}

/// Per-sample (FORMAT) field accessor.
pub struct Format<'v, 'r> {
    variant: &'v Variant<'r>,
}

impl<'v, 'r> Format<'v, 'r> {
    pub(crate) fn new(variant: &'v Variant<'r>) -> Self {
        Self { variant }
    }

    fn column(&self, i: usize) -> usize {
        self.variant.header().selection().map_or(i, |columns| columns[i])
    }

    /// Decodes an Integer-typed FORMAT field into `buf`, one fixed-width
    /// stride per active sample.
    ///
    /// Every sample occupies `buf.len() / sample_count` consecutive slots;
    /// short or absent values are padded with [`MISSING_INTEGER`]. The
    /// genotype key decodes into packed allele codes instead (see
    /// [`Format::genotypes`]) and is not padded, so mixed-ploidy records
    /// remain detectable.
    pub fn ints(&self, name: &str, buf: &mut Vec<i32>) -> Status {
        if name == key::GENOTYPE {
            return self.genotype_ints(buf);
        }

        let Some(definition) = self.variant.header().dict().formats().get(name) else {
            return Status::UndefinedTag;
        };

        if definition.ty() != FormatType::Integer {
            return Status::UnexpectedType;
        }

        let samples = self.variant.record().samples();
        let Some(series) = samples.select(name) else {
            return Status::NotFound;
        };

        let n = self.variant.header().sample_count();

        // fixed per-sample stride: the widest stored value
        let mut width = 1;

        for i in 0..n {
            if let Some(Some(SampleValue::Array(SampleArray::Integer(values)))) =
                series.get(self.column(i))
            {
                width = width.max(values.len());
            }
        }

        if buf.len() != n * width {
            buf.resize(n * width, MISSING_INTEGER);
        }

        for i in 0..n {
            let out = &mut buf[i * width..(i + 1) * width];
            out.fill(MISSING_INTEGER);

            match series.get(self.column(i)) {
                Some(Some(SampleValue::Integer(value))) => out[0] = *value,
                Some(Some(SampleValue::Array(SampleArray::Integer(values)))) => {
                    for (dst, value) in out.iter_mut().zip(values) {
                        *dst = value.unwrap_or(MISSING_INTEGER);
                    }
                }
                Some(Some(_)) => return Status::UnexpectedType,
                Some(None) | None => {}
            }
        }

        Status::Ok
    }

    /// Decodes a Float-typed FORMAT field into `buf`, one fixed-width stride
    /// per active sample, padded with NaN.
    pub fn floats(&self, name: &str, buf: &mut Vec<f32>) -> Status {
        let Some(definition) = self.variant.header().dict().formats().get(name) else {
            return Status::UndefinedTag;
        };

        if definition.ty() != FormatType::Float {
            return Status::UnexpectedType;
        }

        let samples = self.variant.record().samples();
        let Some(series) = samples.select(name) else {
            return Status::NotFound;
        };

        let n = self.variant.header().sample_count();
        let mut width = 1;

        for i in 0..n {
            if let Some(Some(SampleValue::Array(SampleArray::Float(values)))) =
                series.get(self.column(i))
            {
                width = width.max(values.len());
            }
        }

        if buf.len() != n * width {
            buf.resize(n * width, MISSING_FLOAT);
        }

        for i in 0..n {
            let out = &mut buf[i * width..(i + 1) * width];
            out.fill(MISSING_FLOAT);

            match series.get(self.column(i)) {
                Some(Some(SampleValue::Float(value))) => out[0] = *value,
                Some(Some(SampleValue::Array(SampleArray::Float(values)))) => {
                    for (dst, value) in out.iter_mut().zip(values) {
                        *dst = value.unwrap_or(MISSING_FLOAT);
                    }
                }
                Some(Some(_)) => return Status::UnexpectedType,
                Some(None) | None => {}
            }
        }

        Status::Ok
    }

    /// Decodes a String- or Character-typed FORMAT field into `buf`, one
    /// rendered entry per active sample (array values joined with `,`,
    /// missing values as `.`).
    ///
    /// On any non-OK status the buffer is truncated to zero length.
    pub fn strings(&self, name: &str, buf: &mut Vec<String>) -> Status {
        let status = self.strings_inner(name, buf);

        if !status.is_ok() {
            buf.clear();
        }

        status
    }

    fn strings_inner(&self, name: &str, buf: &mut Vec<String>) -> Status {
        let Some(definition) = self.variant.header().dict().formats().get(name) else {
            return Status::UndefinedTag;
        };

        if !matches!(definition.ty(), FormatType::String | FormatType::Character) {
            return Status::UnexpectedType;
        }

        let samples = self.variant.record().samples();
        let Some(series) = samples.select(name) else {
            return Status::NotFound;
        };

        let n = self.variant.header().sample_count();

        if buf.len() != n {
            buf.resize_with(n, String::new);
        }

        for i in 0..n {
            let slot = &mut buf[i];
            slot.clear();

            match series.get(self.column(i)) {
                Some(Some(SampleValue::String(s))) => slot.push_str(s),
                Some(Some(SampleValue::Character(c))) => slot.push(*c),
                Some(Some(SampleValue::Genotype(genotype))) => {
                    render_genotype(slot, genotype.as_ref())
                }
                Some(Some(SampleValue::Array(SampleArray::String(values)))) => {
                    for (j, value) in values.iter().enumerate() {
                        if j > 0 {
                            slot.push(',');
                        }

                        slot.push_str(value.as_deref().unwrap_or("."));
                    }
                }
                Some(Some(SampleValue::Array(SampleArray::Character(values)))) => {
                    for (j, value) in values.iter().enumerate() {
                        if j > 0 {
                            slot.push(',');
                        }

                        slot.push(value.unwrap_or('.'));
                    }
                }
                Some(Some(_)) => return Status::UnexpectedType,
                Some(None) | None => slot.push('.'),
            }
        }

        Status::Ok
    }

    /// Decodes the genotype field into packed allele codes and wraps them in
    /// a [`Genotypes`] view over `buf`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingGenotypes`] when the header defines no
    /// genotype key, the record does not carry one, or no samples are
    /// active, and [`Error::MalformedGenotypes`] when the flat code sequence
    /// does not divide evenly across the samples.
    pub fn genotypes<'b>(&self, buf: &'b mut Vec<i32>) -> Result<Genotypes<'b>> {
        match self.ints(key::GENOTYPE, buf) {
            Status::Ok => {}
            Status::UndefinedTag | Status::NotFound => return Err(Error::MissingGenotypes),
            Status::UnexpectedType => {
                return Err(Error::MalformedGenotypes(
                    "genotype values are not allele calls".into(),
                ))
            }
        }

        let n = self.variant.header().sample_count();

        if n == 0 {
            return Err(Error::MissingGenotypes);
        }

        if buf.len() % n != 0 {
            return Err(Error::MalformedGenotypes(format!(
                "{} allele codes across {} samples",
                buf.len(),
                n
            )));
        }

        let ploidy = buf.len() / n;

        Ok(Genotypes::new(buf, ploidy))
    }

    fn genotype_ints(&self, buf: &mut Vec<i32>) -> Status {
        if self
            .variant
            .header()
            .dict()
            .formats()
            .get(key::GENOTYPE)
            .is_none()
        {
            return Status::UndefinedTag;
        }

        let samples = self.variant.record().samples();
        let Some(series) = samples.select(key::GENOTYPE) else {
            return Status::NotFound;
        };

        let n = self.variant.header().sample_count();
        buf.clear();

        for i in 0..n {
            match series.get(self.column(i)) {
                Some(Some(SampleValue::Genotype(genotype))) => {
                    pack_genotype(buf, genotype.as_ref());
                }
                Some(Some(SampleValue::String(s))) => match GenotypeValue::from_str(s) {
                    Ok(genotype) => pack_genotype(buf, genotype.as_ref()),
                    Err(_) => return Status::UnexpectedType,
                },
                Some(Some(_)) => return Status::UnexpectedType,
                Some(None) | None => buf.push(Allele::new(-1, false).raw()),
            }
        }

        Status::Ok
    }
}

type SampleAllele = noodles::vcf::variant::record_buf::samples::sample::value::genotype::Allele;

fn pack_genotype(buf: &mut Vec<i32>, alleles: &[SampleAllele]) {
    for allele in alleles {
        let value = allele.position().map_or(-1, |position| position as i32);
        let phased = matches!(allele.phasing(), Phasing::Phased);
        buf.push(Allele::new(value, phased).raw());
    }
}

fn render_genotype(out: &mut String, alleles: &[SampleAllele]) {
    for (i, allele) in alleles.iter().enumerate() {
        match allele.position() {
            Some(position) => {
                let _ = write!(out, "{}", position);
            }
            None => out.push('.'),
        }

        if i + 1 < alleles.len() {
            out.push(if matches!(allele.phasing(), Phasing::Phased) {
                '|'
            } else {
                '/'
            });
        }
    }
}
