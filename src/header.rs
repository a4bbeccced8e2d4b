//! Header dictionary wrapper and the active sample selection.

use std::sync::Arc;

use noodles::vcf;

use crate::error::{Error, Result};

/// Read-only view over the parsed header dictionary.
///
/// Cloning is cheap (the dictionary and sample list are shared), which is
/// what lets owned [`Variant`](crate::variant::Variant) copies stay decodable
/// after the producing [`VariantFile`](crate::file::VariantFile) has moved on.
///
/// Apart from the one-time sample selection applied through
/// [`VariantFile::set_samples`](crate::file::VariantFile::set_samples), a
/// header never changes after construction.
#[derive(Debug, Clone)]
pub struct Header {
    dict: Arc<vcf::Header>,
    samples: Arc<[String]>,
    // file column index per active sample; None selects every column
    selection: Option<Arc<[usize]>>,
}

impl Header {
    pub(crate) fn new(dict: vcf::Header) -> Self {
        let samples: Arc<[String]> = dict.sample_names().iter().cloned().collect();

        Self {
            dict: Arc::new(dict),
            samples,
            selection: None,
        }
    }

    /// Builds a copy of this header restricted to the given samples.
    ///
    /// `None` keeps every sample; `Some(&[])` decodes none. The subset keeps
    /// the file's column order regardless of the order names are supplied,
    /// so `samples()` always matches FORMAT decoding order.
    pub(crate) fn subset(&self, names: Option<&[&str]>) -> Result<Self> {
        let Some(names) = names else {
            return Ok(Self {
                dict: Arc::clone(&self.dict),
                samples: self.dict.sample_names().iter().cloned().collect(),
                selection: None,
            });
        };

        let all = self.dict.sample_names();
        let mut columns = Vec::with_capacity(names.len());

        for name in names {
            match all.get_index_of(*name) {
                Some(column) => columns.push(column),
                None => return Err(Error::UnknownSample((*name).to_string())),
            }
        }

        columns.sort_unstable();
        columns.dedup();

        let samples = columns
            .iter()
            .filter_map(|&column| all.get_index(column).cloned())
            .collect();

        Ok(Self {
            dict: Arc::clone(&self.dict),
            samples,
            selection: Some(columns.into()),
        })
    }

    /// Returns the active sample names, in FORMAT column order.
    pub fn samples(&self) -> &[String] {
        &self.samples
    }

    /// Returns the number of active samples.
    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    /// Resolves a contig dictionary id to its name.
    pub fn contig_name(&self, id: usize) -> Option<&str> {
        self.dict.contigs().get_index(id).map(|(name, _)| name.as_str())
    }

    /// Resolves a contig name to its dictionary id.
    pub fn contig_id(&self, name: &str) -> Option<usize> {
        self.dict.contigs().get_index_of(name)
    }

    /// Resolves a filter dictionary id to its name.
    pub fn filter_name(&self, id: usize) -> Option<&str> {
        self.dict.filters().get_index(id).map(|(name, _)| name.as_str())
    }

    pub(crate) fn dict(&self) -> &vcf::Header {
        &self.dict
    }

    pub(crate) fn selection(&self) -> Option<&[usize]> {
        self.selection.as_deref()
    }
}
