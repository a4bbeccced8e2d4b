//! Typed sequential and indexed access to VCF/BCF variant-call files.
//!
//! This crate wraps the `noodles` variant format stack with a session model
//! built for streaming millions of records: one shared record buffer, pull
//! cursors that yield borrowed views into it, typed INFO/FORMAT extraction
//! into reusable caller buffers with explicit status codes, and a packed
//! genotype model with hom/het classification.
//!
//! # Features
//!
//! - Sequential iteration over VCF (plain, gzip, or BGZF) and BCF inputs
//! - Indexed region queries (tabix for VCF, CSI for BCF), indexes loaded
//!   lazily and cached
//! - Typed INFO/FORMAT field extraction with buffer reuse and
//!   [`Status`](fields::Status) outcomes
//! - Packed per-sample genotypes with hom-ref/het/hom-alt classification
//! - One-time sample subsetting before iteration
//!
//! # Example
//!
//! ```no_run
//! use varfile::{GenotypeClass, Status, VariantFile};
//!
//! # fn main() -> varfile::Result<()> {
//! let mut file = VariantFile::open("sample.vcf.gz")?;
//!
//! let mut depths = Vec::new();
//! let mut codes = Vec::new();
//!
//! let mut records = file.query("chr1:10000-20000")?;
//!
//! while let Some(variant) = records.try_next()? {
//!     if variant.info().ints("DP", &mut depths) == Status::Ok {
//!         println!("{}:{} DP={}", variant.chrom(), variant.pos(), depths[0]);
//!     }
//!
//!     let genotypes = variant.genotypes(&mut codes)?;
//!
//!     for (sample, genotype) in variant.header().samples().iter().zip(genotypes.iter()) {
//!         if genotype.classify() == GenotypeClass::Het {
//!             println!("  {sample}: {genotype}");
//!         }
//!     }
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod fields;
pub mod file;
pub mod genotype;
pub mod header;
mod storage;
pub mod variant;

pub use error::{Error, Result};
pub use fields::{Format, Info, Status, MISSING_FLOAT, MISSING_INTEGER};
pub use file::{Builder, Records, RegionQuery, VariantFile};
pub use genotype::{Allele, Genotype, GenotypeClass, Genotypes};
pub use header::Header;
pub use storage::{CompressionType, FormatKind};
pub use variant::Variant;
