use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use flate2::write::GzEncoder;
use zip::write::FileOptions;
use zip::CompressionMethod;

use csv_db_loader::ingestion::{get_reader, open_file, Compression};
use csv_db_loader::LoadError;

const PEOPLE: &str = "id,name\n1,\"Lovelace, Ada\"\n2,Grace Hopper\n";

fn write_gzip(path: &Path, content: &str) {
    let mut enc = GzEncoder::new(File::create(path).unwrap(), flate2::Compression::default());
    enc.write_all(content.as_bytes()).unwrap();
    enc.finish().unwrap();
}

fn write_zip(path: &Path, entries: &[(&str, &str)], method: CompressionMethod) {
    let mut zip = zip::ZipWriter::new(File::create(path).unwrap());
    let options = FileOptions::default().compression_method(method);
    for (name, content) in entries {
        zip.start_file(*name, options).unwrap();
        zip.write_all(content.as_bytes()).unwrap();
    }
    zip.finish().unwrap();
}

fn records(path: &Path) -> Vec<Vec<String>> {
    let mut file = open_file(path).unwrap();
    get_reader(file.stream().unwrap(), ',', '"')
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap()
}

fn try_read_all(path: &PathBuf) -> std::io::Result<String> {
    let mut out = String::new();
    open_file(path).unwrap().stream().unwrap().read_to_string(&mut out)?;
    Ok(out)
}

fn read_all(path: &PathBuf) -> String {
    try_read_all(path).unwrap()
}

#[test]
fn gzip_and_plain_files_yield_identical_records() {
    let dir = tempfile::tempdir().unwrap();
    let plain = dir.path().join("people.csv");
    let gz = dir.path().join("people.csv.gz");
    fs::write(&plain, PEOPLE).unwrap();
    write_gzip(&gz, PEOPLE);

    assert_eq!(open_file(&gz).unwrap().compression(), Compression::Gzip);
    let expected = records(&plain);
    assert_eq!(expected.len(), 3);
    assert_eq!(expected[1], vec!["1", "Lovelace, Ada"]);
    assert_eq!(records(&gz), expected);
}

#[test]
fn zip_reads_only_the_first_entry() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("people.csv.zip");
    write_zip(
        &path,
        &[("a.csv", "id\n1\n"), ("b.csv", "id\n2\n")],
        CompressionMethod::Deflated,
    );

    assert_eq!(read_all(&path), "id\n1\n");
}

#[test]
fn stored_zip_entry_is_read_verbatim() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("people.csv.zip");
    write_zip(&path, &[("people.csv", PEOPLE)], CompressionMethod::Stored);

    assert_eq!(read_all(&path), PEOPLE);
}

#[test]
fn bzip2_zip_entry_is_decoded() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("people.csv.zip");
    write_zip(&path, &[("people.csv", PEOPLE)], CompressionMethod::Bzip2);

    assert_eq!(records(&path)[2], vec!["2", "Grace Hopper"]);
}

#[test]
fn damaged_stored_zip_entry_fails_its_checksum() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ids.csv.zip");
    write_zip(&path, &[("ids.csv", "id\n111\n")], CompressionMethod::Stored);
    let mut bytes = fs::read(&path).unwrap();
    let at = bytes
        .windows(7)
        .position(|w| w == b"id\n111\n")
        .expect("stored payload");
    bytes[at + 3] = b'9';
    fs::write(&path, bytes).unwrap();

    let err = try_read_all(&path).unwrap_err();
    assert!(err.to_string().contains("checksum"), "{err}");
}

#[test]
fn zip_without_entries_is_file_access_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty.csv.zip");
    write_zip(&path, &[], CompressionMethod::Stored);

    let err = open_file(&path).unwrap_err();
    assert!(matches!(err, LoadError::FileAccess { .. }));
    assert!(err.to_string().contains("no entries"));
}

#[test]
fn plain_text_with_gz_suffix_is_file_access_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fake.csv.gz");
    fs::write(&path, PEOPLE).unwrap();

    let err = open_file(&path).unwrap_err();
    assert!(matches!(err, LoadError::FileAccess { .. }));
}

#[test]
fn corrupt_zip_is_file_access_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.csv.zip");
    fs::write(&path, b"PK\x03\x04 definitely not an archive").unwrap();

    assert!(matches!(open_file(&path).unwrap_err(), LoadError::FileAccess { .. }));
}
