//! The variant file session and its iteration engine.

use std::io;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use log::debug;
use noodles::core::Region;
use noodles::csi;
use noodles::tabix;
use noodles::vcf::variant::RecordBuf;

use crate::error::{Error, Result};
use crate::header::Header;
use crate::storage::{self, CompressionType, FormatKind, QueryHandle, RecordReader};
use crate::variant::Variant;

/// An open VCF/BCF file: the header, one shared record buffer, and the
/// lazily loaded region indexes.
///
/// Records are produced by pull cursors ([`Records`], [`RegionQuery`]) that
/// decode into the file's single shared buffer; only one cursor can exist at
/// a time, and only its most recent view is valid.
pub struct VariantFile {
    path: PathBuf,
    format: FormatKind,
    compression: CompressionType,
    // declaration order is release order: dictionary, indexes, reader
    // handles, record buffer
    header: Header,
    tbi: Option<tabix::Index>,
    csi: Option<csi::Index>,
    reader: RecordReader,
    query_reader: Option<QueryHandle>,
    record: RecordBuf,
    started: bool,
    samples_set: bool,
}

/// Open options for a [`VariantFile`].
#[derive(Default)]
pub struct Builder {
    samples: Option<Vec<String>>,
    worker_threads: Option<NonZeroUsize>,
}

impl Builder {
    /// Restricts decoding to the given samples (an empty set decodes none).
    pub fn set_samples<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.samples = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Sets the worker count for multithreaded BGZF decompression.
    ///
    /// Only block decompression is parallelized; record production stays a
    /// single pull cursor.
    pub fn set_worker_threads(mut self, worker_count: NonZeroUsize) -> Self {
        self.worker_threads = Some(worker_count);
        self
    }

    /// Opens a variant file with these options.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened, is neither VCF nor
    /// BCF, its header is invalid, or a requested sample is unknown.
    pub fn open<P: AsRef<Path>>(self, path: P) -> Result<VariantFile> {
        let path = path.as_ref();

        let compression = storage::detect_compression(path)?;
        let format = storage::detect_format(path, compression)?;

        let mut reader = storage::open_record_reader(path, format, compression, self.worker_threads)?;
        let dict = reader.read_header()?;

        let mut header = Header::new(dict);

        if let Some(names) = &self.samples {
            let names: Vec<&str> = names.iter().map(String::as_str).collect();
            header = header.subset(Some(&names))?;
        }

        debug!(
            "opened {} ({:?}/{:?}, {} active samples)",
            path.display(),
            format,
            compression,
            header.sample_count()
        );

        Ok(VariantFile {
            path: path.to_path_buf(),
            format,
            compression,
            header,
            tbi: None,
            csi: None,
            reader,
            query_reader: None,
            record: RecordBuf::default(),
            started: false,
            samples_set: self.samples.is_some(),
        })
    }
}

impl VariantFile {
    /// Opens a variant file with default options.
    ///
    /// # Errors
    ///
    /// See [`Builder::open`].
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Builder::default().open(path)
    }

    /// Returns a builder for open options.
    pub fn builder() -> Builder {
        Builder::default()
    }

    /// Returns the path this file was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the detected data format.
    pub fn format(&self) -> FormatKind {
        self.format
    }

    /// Returns the header.
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Returns the number of active samples.
    pub fn sample_count(&self) -> usize {
        self.header.sample_count()
    }

    /// Restricts decoding to the given samples.
    ///
    /// `None` keeps every sample; `Some(&[])` decodes none. May be applied
    /// at most once, and only before any record has been read.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SamplesLocked`] if iteration has started or a
    /// selection was already applied, and [`Error::UnknownSample`] for names
    /// absent from the header.
    pub fn set_samples(&mut self, names: Option<&[&str]>) -> Result<()> {
        if self.started || self.samples_set {
            return Err(Error::SamplesLocked);
        }

        self.header = self.header.subset(names)?;
        self.samples_set = true;

        Ok(())
    }

    /// Starts sequential iteration over every record, in on-disk order.
    ///
    /// The cursor is single-pass and non-restartable; each step overwrites
    /// the shared record buffer, so views must be deep-copied to survive the
    /// next step.
    pub fn records(&mut self) -> Records<'_> {
        self.started = true;

        Records {
            file: self,
            done: false,
        }
    }

    /// Starts an indexed query for `region` (`"contig"` or
    /// `"contig:start-stop"`, 1-based inclusive display coordinates).
    ///
    /// VCF inputs resolve the region through the `{path}.tbi` tabix index,
    /// BCF inputs through the `{path}.csi` index; either is loaded on first
    /// use and cached for the life of the file. Yields the matching records
    /// in index order as borrowed views into the shared buffer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRegion`] for malformed region strings,
    /// [`Error::NotIndexable`] for inputs without seekable compression,
    /// [`Error::MissingIndex`] when the sidecar index does not exist, and
    /// an I/O error if the index or file cannot be read.
    pub fn query(&mut self, region: &str) -> Result<RegionQuery<'_>> {
        let parsed: Region = region.parse().map_err(|e: noodles::core::region::ParseError| {
            Error::InvalidRegion {
                region: region.to_string(),
                reason: e.to_string(),
            }
        })?;

        self.started = true;

        match self.format {
            FormatKind::Vcf => {
                if self.compression != CompressionType::BGZF {
                    return Err(Error::NotIndexable(self.path.clone()));
                }

                if self.tbi.is_none() {
                    self.tbi = Some(storage::read_tabix_index(&self.path)?);
                }
            }
            FormatKind::Bcf => {
                if self.csi.is_none() {
                    self.csi = Some(storage::read_csi_index(&self.path)?);
                }
            }
        }

        if self.query_reader.is_none() {
            self.query_reader = Some(storage::open_query_handle(&self.path, self.format)?);
        }

        debug!("querying {} for {}", self.path.display(), region);

        let header = self.header.clone();
        let dict = self.header.dict();
        let record = &mut self.record;

        let inner: Box<dyn Iterator<Item = io::Result<RecordBuf>> + '_> = match self
            .query_reader
            .as_mut()
            .expect("query reader was just initialized")
        {
            QueryHandle::Vcf(reader) => {
                let index = self.tbi.as_ref().expect("tabix index was just loaded");
                let decode_header = header.clone();

                Box::new(reader.query(dict, index, &parsed)?.map(move |result| {
                    result.and_then(|raw| {
                        RecordBuf::try_from_variant_record(decode_header.dict(), &raw)
                    })
                }))
            }
            QueryHandle::Bcf(reader) => {
                let index = self.csi.as_ref().expect("csi index was just loaded");
                let decode_header = header.clone();

                Box::new(reader.query(dict, index, &parsed)?.map(move |result| {
                    result.and_then(|raw| {
                        RecordBuf::try_from_variant_record(decode_header.dict(), &raw)
                    })
                }))
            }
        };

        Ok(RegionQuery {
            header,
            inner,
            record,
            done: false,
        })
    }
}

/// Sequential pull cursor over a [`VariantFile`].
///
/// Produced by [`VariantFile::records`].
pub struct Records<'f> {
    file: &'f mut VariantFile,
    done: bool,
}

impl Records<'_> {
    /// Advances to the next record and returns a borrowed view of it, or
    /// `None` at end of input.
    ///
    /// The cursor is fused: after the end (or an error) it keeps returning
    /// `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend reports a read or parse failure
    /// mid-stream; the cursor is unusable afterwards.
    pub fn try_next(&mut self) -> Result<Option<Variant<'_>>> {
        if self.done {
            return Ok(None);
        }

        let file = &mut *self.file;

        match file.reader.read_record_buf(file.header.dict(), &mut file.record) {
            Ok(0) => {
                self.done = true;
                Ok(None)
            }
            Ok(_) => Ok(Some(Variant::borrowed(file.header.clone(), &file.record))),
            Err(e) => {
                self.done = true;
                Err(e.into())
            }
        }
    }
}

/// Indexed region pull cursor over a [`VariantFile`].
///
/// Produced by [`VariantFile::query`]. Backend-side query resources are
/// released when the cursor is dropped, whether it was exhausted or
/// abandoned early.
pub struct RegionQuery<'f> {
    header: Header,
    inner: Box<dyn Iterator<Item = io::Result<RecordBuf>> + 'f>,
    record: &'f mut RecordBuf,
    done: bool,
}

impl RegionQuery<'_> {
    /// Advances to the next record in the queried interval and returns a
    /// borrowed view of it, or `None` when the interval is exhausted.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend reports a read or parse failure
    /// mid-stream; the cursor is unusable afterwards.
    pub fn try_next(&mut self) -> Result<Option<Variant<'_>>> {
        if self.done {
            return Ok(None);
        }

        match self.inner.next() {
            None => {
                self.done = true;
                Ok(None)
            }
            Some(Err(e)) => {
                self.done = true;
                Err(e.into())
            }
            Some(Ok(decoded)) => {
                *self.record = decoded;
                Ok(Some(Variant::borrowed(self.header.clone(), self.record)))
            }
        }
    }
}
