//! Storage layer: format/compression detection, reader construction, and
//! sidecar index loading.
//!
//! Everything here is local, synchronous I/O. The reader handles are plain
//! enums with one variant per concrete reader shape, dispatched with `match`.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use flate2::read::MultiGzDecoder;
use log::debug;
use noodles::bcf;
use noodles::bgzf;
use noodles::csi;
use noodles::tabix;
use noodles::vcf;
use noodles::vcf::variant::RecordBuf;

use crate::error::{Error, Result};

/// GZIP magic number; BGZF additionally sets FEXTRA and carries a "BC" subfield.
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// BCF2 magic: "BCF\2\1"
const BCF_MAGIC: [u8; 5] = [b'B', b'C', b'F', 0x02, 0x01];

/// Container compression of the input file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionType {
    /// Blocked gzip (seekable, index-capable).
    BGZF,
    /// Plain gzip (sequential reading only).
    GZIP,
    /// Uncompressed.
    NONE,
}

/// Logical format of the variant data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatKind {
    /// Plain-text variant call format.
    Vcf,
    /// Binary variant call format.
    Bcf,
}

fn open_file(path: &Path) -> Result<File> {
    File::open(path).map_err(|e| Error::Open {
        path: path.to_path_buf(),
        source: e,
    })
}

fn read_upto(reader: &mut impl Read, buf: &mut [u8]) -> io::Result<usize> {
    let mut total = 0;

    while total < buf.len() {
        let n = reader.read(&mut buf[total..])?;

        if n == 0 {
            break;
        }

        total += n;
    }

    Ok(total)
}

/// Detects the container compression of a file from its magic bytes.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or read.
pub(crate) fn detect_compression(path: &Path) -> Result<CompressionType> {
    let mut file = open_file(path)?;
    let mut magic = [0u8; 18];
    let n = read_upto(&mut file, &mut magic)?;

    if n < 2 || magic[..2] != GZIP_MAGIC {
        return Ok(CompressionType::NONE);
    }

    // BGZF is gzip with FEXTRA set and a "BC" subfield at the fixed offset
    if n >= 14 && magic[3] & 0x04 != 0 && magic[12] == b'B' && magic[13] == b'C' {
        return Ok(CompressionType::BGZF);
    }

    Ok(CompressionType::GZIP)
}

/// Detects whether a file holds VCF text or BCF records, looking through the
/// detected compression layer.
///
/// # Errors
///
/// Returns [`Error::UnrecognizedFormat`] if the content is neither
/// `#`-prefixed VCF text nor BCF (raw BCF outside a BGZF container is not
/// supported), and an I/O error if the file cannot be read.
pub(crate) fn detect_format(path: &Path, compression: CompressionType) -> Result<FormatKind> {
    let mut magic = [0u8; 5];

    let n = match compression {
        CompressionType::BGZF => {
            read_upto(&mut bgzf::io::Reader::new(open_file(path)?), &mut magic)?
        }
        CompressionType::GZIP => {
            read_upto(&mut MultiGzDecoder::new(open_file(path)?), &mut magic)?
        }
        CompressionType::NONE => read_upto(&mut open_file(path)?, &mut magic)?,
    };

    if n >= BCF_MAGIC.len() && magic == BCF_MAGIC {
        if compression == CompressionType::BGZF {
            return Ok(FormatKind::Bcf);
        }

        return Err(Error::UnrecognizedFormat(path.to_path_buf()));
    }

    if n >= 1 && magic[0] == b'#' {
        return Ok(FormatKind::Vcf);
    }

    Err(Error::UnrecognizedFormat(path.to_path_buf()))
}

/// Sequential record reader, one variant per supported reader shape.
pub(crate) enum RecordReader {
    PlainVcf(vcf::io::Reader<BufReader<File>>),
    GzipVcf(vcf::io::Reader<BufReader<MultiGzDecoder<File>>>),
    BgzfVcf(vcf::io::Reader<bgzf::io::Reader<File>>),
    BgzfVcfThreaded(vcf::io::Reader<bgzf::io::MultithreadedReader<File>>),
    Bcf(bcf::io::Reader<bgzf::io::Reader<File>>),
    BcfThreaded(bcf::io::Reader<bgzf::io::MultithreadedReader<File>>),
}

impl RecordReader {
    pub(crate) fn read_header(&mut self) -> io::Result<vcf::Header> {
        match self {
            Self::PlainVcf(reader) => reader.read_header(),
            Self::GzipVcf(reader) => reader.read_header(),
            Self::BgzfVcf(reader) => reader.read_header(),
            Self::BgzfVcfThreaded(reader) => reader.read_header(),
            Self::Bcf(reader) => reader.read_header(),
            Self::BcfThreaded(reader) => reader.read_header(),
        }
    }

    pub(crate) fn read_record_buf(
        &mut self,
        header: &vcf::Header,
        record: &mut RecordBuf,
    ) -> io::Result<usize> {
        match self {
            Self::PlainVcf(reader) => reader.read_record_buf(header, record),
            Self::GzipVcf(reader) => reader.read_record_buf(header, record),
            Self::BgzfVcf(reader) => reader.read_record_buf(header, record),
            Self::BgzfVcfThreaded(reader) => reader.read_record_buf(header, record),
            Self::Bcf(reader) => reader.read_record_buf(header, record),
            Self::BcfThreaded(reader) => reader.read_record_buf(header, record),
        }
    }
}

/// Opens the sequential reader for a detected format/compression pair.
///
/// A worker-thread hint greater than one selects the multithreaded BGZF
/// reader; it only parallelizes block decompression, record production stays
/// a single pull cursor.
pub(crate) fn open_record_reader(
    path: &Path,
    format: FormatKind,
    compression: CompressionType,
    worker_threads: Option<NonZeroUsize>,
) -> Result<RecordReader> {
    let file = open_file(path)?;
    let threaded = worker_threads.filter(|threads| threads.get() > 1);

    let reader = match (format, compression) {
        (FormatKind::Vcf, CompressionType::NONE) => {
            RecordReader::PlainVcf(vcf::io::Reader::new(BufReader::new(file)))
        }
        (FormatKind::Vcf, CompressionType::GZIP) => {
            debug!("{}: plain gzip input, queries unavailable", path.display());
            RecordReader::GzipVcf(vcf::io::Reader::new(BufReader::new(MultiGzDecoder::new(file))))
        }
        (FormatKind::Vcf, CompressionType::BGZF) => match threaded {
            Some(threads) => RecordReader::BgzfVcfThreaded(vcf::io::Reader::new(
                bgzf::io::MultithreadedReader::with_worker_count(threads, file),
            )),
            None => RecordReader::BgzfVcf(vcf::io::Reader::new(bgzf::io::Reader::new(file))),
        },
        (FormatKind::Bcf, CompressionType::BGZF) => match threaded {
            Some(threads) => RecordReader::BcfThreaded(bcf::io::Reader::from(
                bgzf::io::MultithreadedReader::with_worker_count(threads, file),
            )),
            None => RecordReader::Bcf(bcf::io::Reader::from(bgzf::io::Reader::new(file))),
        },
        (FormatKind::Bcf, _) => return Err(Error::UnrecognizedFormat(path.to_path_buf())),
    };

    Ok(reader)
}

/// Seekable reader used by region queries, kept separate from the sequential
/// cursor so queries never clobber its position.
pub(crate) enum QueryHandle {
    Vcf(vcf::io::Reader<bgzf::io::Reader<File>>),
    Bcf(bcf::io::Reader<bgzf::io::Reader<File>>),
}

/// Opens a query-side reader positioned past the header.
pub(crate) fn open_query_handle(path: &Path, format: FormatKind) -> Result<QueryHandle> {
    let file = open_file(path)?;

    match format {
        FormatKind::Vcf => {
            let mut reader = vcf::io::Reader::new(bgzf::io::Reader::new(file));
            reader.read_header()?;
            Ok(QueryHandle::Vcf(reader))
        }
        FormatKind::Bcf => {
            let mut reader = bcf::io::Reader::from(bgzf::io::Reader::new(file));
            reader.read_header()?;
            Ok(QueryHandle::Bcf(reader))
        }
    }
}

fn sidecar_path(src: &Path, extension: &str) -> PathBuf {
    let mut path = src.as_os_str().to_os_string();
    path.push(".");
    path.push(extension);
    PathBuf::from(path)
}

/// Loads the tabix index next to a bgzipped VCF (`{path}.tbi`).
///
/// # Errors
///
/// Returns [`Error::MissingIndex`] if no index file exists, and an I/O error
/// if one exists but cannot be read.
pub(crate) fn read_tabix_index(src: &Path) -> Result<tabix::Index> {
    let index_path = sidecar_path(src, "tbi");

    if !index_path.exists() {
        return Err(Error::MissingIndex(index_path));
    }

    debug!("loading tabix index from {}", index_path.display());
    Ok(tabix::fs::read(index_path)?)
}

/// Loads the CSI index next to a BCF (`{path}.csi`).
///
/// # Errors
///
/// Returns [`Error::MissingIndex`] if no index file exists, and an I/O error
/// if one exists but cannot be read.
pub(crate) fn read_csi_index(src: &Path) -> Result<csi::Index> {
    let index_path = sidecar_path(src, "csi");

    if !index_path.exists() {
        return Err(Error::MissingIndex(index_path));
    }

    debug!("loading csi index from {}", index_path.display());
    Ok(csi::fs::read(index_path)?)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_detect_compression_none() -> Result<()> {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"##fileformat=VCFv4.3\n").unwrap();
        file.flush().unwrap();

        assert_eq!(detect_compression(file.path())?, CompressionType::NONE);
        assert_eq!(detect_format(file.path(), CompressionType::NONE)?, FormatKind::Vcf);

        Ok(())
    }

    #[test]
    fn test_detect_compression_gzip() -> Result<()> {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let mut encoder =
            flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(b"##fileformat=VCFv4.3\n").unwrap();
        file.write_all(&encoder.finish().unwrap()).unwrap();
        file.flush().unwrap();

        assert_eq!(detect_compression(file.path())?, CompressionType::GZIP);
        assert_eq!(detect_format(file.path(), CompressionType::GZIP)?, FormatKind::Vcf);

        Ok(())
    }

    #[test]
    fn test_detect_compression_bgzf() -> Result<()> {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let mut writer = bgzf::io::Writer::new(Vec::new());
        writer.write_all(b"##fileformat=VCFv4.3\n").unwrap();
        file.write_all(&writer.finish().unwrap()).unwrap();
        file.flush().unwrap();

        assert_eq!(detect_compression(file.path())?, CompressionType::BGZF);
        assert_eq!(detect_format(file.path(), CompressionType::BGZF)?, FormatKind::Vcf);

        Ok(())
    }

    #[test]
    fn test_detect_format_rejects_garbage() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"not a variant file").unwrap();
        file.flush().unwrap();

        assert!(matches!(
            detect_format(file.path(), CompressionType::NONE),
            Err(Error::UnrecognizedFormat(_))
        ));
    }

    #[test]
    fn test_sidecar_path() {
        assert_eq!(
            sidecar_path(Path::new("/data/sample.vcf.gz"), "tbi"),
            PathBuf::from("/data/sample.vcf.gz.tbi")
        );
    }
}
