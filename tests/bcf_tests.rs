use std::fs::File;
use std::path::{Path, PathBuf};

use noodles::bcf;
use noodles::vcf;
use noodles::vcf::variant::io::Write as _;
use tempfile::TempDir;
use varfile::{Error, FormatKind, GenotypeClass, Status, VariantFile};

const VCF_CONTENT: &str = concat!(
    "##fileformat=VCFv4.3\n",
    "##FILTER=<ID=PASS,Description=\"All filters passed\">\n",
    "##FILTER=<ID=q10,Description=\"Quality below 10\">\n",
    "##INFO=<ID=DP,Number=1,Type=Integer,Description=\"Total read depth\">\n",
    "##INFO=<ID=AF,Number=A,Type=Float,Description=\"Allele frequency\">\n",
    "##FORMAT=<ID=GT,Number=1,Type=String,Description=\"Genotype\">\n",
    "##FORMAT=<ID=DP,Number=1,Type=Integer,Description=\"Read depth\">\n",
    "##contig=<ID=chr1,length=248956422>\n",
    "##contig=<ID=chr2,length=242193529>\n",
    "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\ts1\ts2\n",
    "chr1\t1000\trs1\tA\tT\t29.5\tPASS\tDP=10;AF=0.5\tGT:DP\t0/1:10\t1|1:12\n",
    "chr1\t2000\t.\tG\tC\t.\tq10\tDP=20\tGT:DP\t0/0:8\t./.:9\n",
    "chr2\t100\t.\tC\tG\t10\tPASS\tDP=3\tGT:DP\t0/1:1\t0/0:2\n",
);

/// Re-encodes the text fixture as BCF through the backend's writer.
fn write_bcf(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);

    let mut reader = vcf::io::Reader::new(VCF_CONTENT.as_bytes());
    let header = reader.read_header().unwrap();

    let mut writer = bcf::io::Writer::new(File::create(&path).unwrap());
    writer.write_header(&header).unwrap();

    let mut record = vcf::variant::RecordBuf::default();

    while reader.read_record_buf(&header, &mut record).unwrap() != 0 {
        writer.write_variant_record(&header, &record).unwrap();
    }

    writer.try_finish().unwrap();

    path
}

#[test]
fn test_bcf_sequential_scan() {
    let dir = TempDir::new().unwrap();
    let path = write_bcf(dir.path(), "sample.bcf");

    let mut file = VariantFile::open(&path).expect("open BCF");
    assert_eq!(file.format(), FormatKind::Bcf);
    assert_eq!(file.header().samples(), ["s1", "s2"]);

    let mut seen = Vec::new();
    let mut records = file.records();

    while let Some(variant) = records.try_next().expect("read BCF record") {
        seen.push((
            variant.chrom().to_string(),
            variant.pos(),
            variant.filters(),
            variant.id(),
        ));
    }

    assert_eq!(
        seen,
        [
            ("chr1".to_string(), 1000, "PASS".to_string(), "rs1".to_string()),
            ("chr1".to_string(), 2000, "q10".to_string(), ".".to_string()),
            ("chr2".to_string(), 100, "PASS".to_string(), ".".to_string()),
        ],
        "BCF decoding must match the text fixture"
    );
}

#[test]
fn test_bcf_fields_and_genotypes() {
    let dir = TempDir::new().unwrap();
    let path = write_bcf(dir.path(), "sample.bcf");

    let mut file = VariantFile::open(&path).unwrap();
    let mut records = file.records();

    let first = records.try_next().unwrap().unwrap();

    let mut ints = Vec::new();
    assert_eq!(first.info().ints("DP", &mut ints), Status::Ok);
    assert_eq!(ints, [10]);

    let mut floats = Vec::new();
    assert_eq!(first.info().floats("AF", &mut floats), Status::Ok);
    assert_eq!(floats, [0.5]);

    assert_eq!(first.format().ints("DP", &mut ints), Status::Ok);
    assert_eq!(ints, [10, 12]);

    let mut codes = Vec::new();
    let genotypes = first.genotypes(&mut codes).expect("decode BCF genotypes");
    assert_eq!(genotypes.len(), 2);
    assert_eq!(genotypes.ploidy(), 2);

    let classes: Vec<GenotypeClass> = genotypes.iter().map(|gt| gt.classify()).collect();
    assert_eq!(classes, [GenotypeClass::Het, GenotypeClass::HomAlt]);

    let second = records.try_next().unwrap().unwrap();
    assert_eq!(
        second.qual(0.0),
        0.0,
        "missing quality survives the binary roundtrip"
    );

    let genotypes = second.genotypes(&mut codes).unwrap();
    let classes: Vec<GenotypeClass> = genotypes.iter().map(|gt| gt.classify()).collect();
    assert_eq!(classes, [GenotypeClass::HomRef, GenotypeClass::Unknown]);
}

#[test]
fn test_bcf_query_requires_csi() {
    let dir = TempDir::new().unwrap();
    let path = write_bcf(dir.path(), "sample.bcf");

    let mut file = VariantFile::open(&path).unwrap();
    assert!(
        matches!(file.query("chr1:1-2000"), Err(Error::MissingIndex(_))),
        "BCF queries resolve through a csi sidecar index"
    );
}
