//! Backend tests: listing, directory flags and entry streams per container format.

mod common;

use common::{bzip2, gzip, tar_bytes, tar_with_symlink, xz, zip_bytes};
use schemadump::archive::{ArchiveHandle, ContainerKind, TarCompression, children_of, detect_path};
use schemadump::{EntryKind, SampleError};
use std::collections::BTreeSet;
use std::io::Read;
use std::path::Path;

const MEMBERS: &[(&str, &[u8])] = &[
    ("top.csv", b"a,b\n1,2\n"),
    ("dir/", b""),
    ("dir/inner.txt", b"hello\nworld\n"),
    ("dir/deeper/x.tsv", b"k\tv\n"),
];

fn file_names(handle: &ArchiveHandle) -> BTreeSet<String> {
    handle
        .list_entries()
        .iter()
        .filter(|e| !handle.is_directory(e))
        .map(|e| e.name.clone())
        .collect()
}

fn expected_files() -> BTreeSet<String> {
    ["top.csv", "dir/inner.txt", "dir/deeper/x.tsv"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn open_written(dir: &Path, name: &str, data: &[u8]) -> ArchiveHandle {
    let path = dir.join(name);
    std::fs::write(&path, data).unwrap();
    ArchiveHandle::open_path(&path, name).unwrap()
}

fn read_entry(handle: &ArchiveHandle, name: &str) -> Vec<u8> {
    let entry = handle
        .list_entries()
        .iter()
        .find(|e| e.name == name)
        .unwrap()
        .clone();
    handle
        .open_entry(&entry, |mut stream| {
            let mut out = Vec::new();
            stream.reader.read_to_end(&mut out).unwrap();
            Ok(out)
        })
        .unwrap()
}

#[test]
fn test_zip_listing_matches_members() {
    let tmp = tempfile::tempdir().unwrap();
    let handle = open_written(tmp.path(), "data.zip", &zip_bytes(MEMBERS));
    assert_eq!(file_names(&handle), expected_files());
    assert_eq!(read_entry(&handle, "dir/inner.txt"), b"hello\nworld\n");
    handle.close().unwrap();
}

#[test]
fn test_tar_family_listing_matches_members() {
    let tmp = tempfile::tempdir().unwrap();
    let tar = tar_bytes(MEMBERS);
    let variants = [
        ("data.tar", tar.clone()),
        ("data.tar.gz", gzip(&tar)),
        ("data.tar.bz2", bzip2(&tar)),
        ("data.tar.xz", xz(&tar)),
    ];
    for (name, bytes) in variants {
        let handle = open_written(tmp.path(), name, &bytes);
        assert_eq!(file_names(&handle), expected_files(), "{name}");
        assert_eq!(read_entry(&handle, "top.csv"), b"a,b\n1,2\n", "{name}");
        handle.close().unwrap();
    }
}

#[test]
fn test_detect_path_ignores_extension() {
    let tmp = tempfile::tempdir().unwrap();
    let misnamed = tmp.path().join("really-a-zip.csv");
    std::fs::write(&misnamed, zip_bytes(MEMBERS)).unwrap();
    assert_eq!(detect_path(&misnamed).unwrap(), ContainerKind::Zip);

    let gz = tmp.path().join("rows.bin");
    std::fs::write(&gz, gzip(&tar_bytes(MEMBERS))).unwrap();
    assert_eq!(
        detect_path(&gz).unwrap(),
        ContainerKind::Tar(TarCompression::Gzip)
    );

    assert_eq!(
        detect_path(tmp.path()).unwrap(),
        ContainerKind::Unsupported("inode/directory".to_string())
    );
    assert!(matches!(
        detect_path(&tmp.path().join("nope")),
        Err(SampleError::NotFound { .. })
    ));
}

#[test]
fn test_zip_without_directory_records() {
    let tmp = tempfile::tempdir().unwrap();
    let handle = open_written(
        tmp.path(),
        "flat.zip",
        &zip_bytes(&[("a/b/c.txt", &b"c\n"[..]), ("a/d.txt", &b"d\n"[..])]),
    );
    let root = children_of(handle.list_entries(), "");
    assert_eq!(root.len(), 1);
    assert_eq!(root[0].name, "a/");
    assert_eq!(root[0].kind, EntryKind::Directory);
    assert!(handle.is_directory(&root[0]));

    let names: Vec<String> = children_of(handle.list_entries(), "a/")
        .into_iter()
        .map(|e| e.name)
        .collect();
    assert_eq!(names, vec!["a/b/".to_string(), "a/d.txt".to_string()]);
}

#[test]
fn test_concurrent_reads_of_one_handle() {
    let tmp = tempfile::tempdir().unwrap();
    let members: Vec<(String, Vec<u8>)> = (0..32)
        .map(|i| (format!("f{i}.csv"), format!("col\n{i}\n").into_bytes()))
        .collect();
    let borrowed: Vec<(&str, &[u8])> = members
        .iter()
        .map(|(n, d)| (n.as_str(), d.as_slice()))
        .collect();
    let handle = open_written(tmp.path(), "many.zip", &zip_bytes(&borrowed));

    std::thread::scope(|scope| {
        for (name, data) in &members {
            let handle = &handle;
            scope.spawn(move || assert_eq!(&read_entry(handle, name), data));
        }
    });
}

#[test]
fn test_corrupt_zip_is_corrupt_archive() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("bad.zip");
    std::fs::write(&path, b"PK\x03\x04 this is not really a zip file").unwrap();
    let err = ArchiveHandle::open_path(&path, "bad.zip").err().unwrap();
    assert!(matches!(err, SampleError::CorruptArchive { .. }));
    assert!(err.to_string().contains("bad.zip"));
}

#[test]
fn test_binary_file_is_unsupported() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("blob.bin");
    std::fs::write(&path, [0u8, 159, 146, 150, 0, 1, 2]).unwrap();
    let err = ArchiveHandle::open_path(&path, "blob.bin").err().unwrap();
    match err {
        SampleError::UnsupportedFormat { mime, .. } => {
            assert_eq!(mime, "application/octet-stream")
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_tar_symlink_has_no_stream() {
    let tmp = tempfile::tempdir().unwrap();
    let handle = open_written(tmp.path(), "links.tar", &tar_with_symlink());
    let link = handle
        .list_entries()
        .iter()
        .find(|e| e.name == "rows-link.csv")
        .unwrap()
        .clone();
    let err = handle.open_entry(&link, |_| Ok(())).unwrap_err();
    assert!(matches!(err, SampleError::CorruptEntry { .. }));
    assert_eq!(read_entry(&handle, "rows.csv"), b"id,name\n1,a\n");
}

#[test]
fn test_plain_file_is_one_synthetic_entry() {
    let tmp = tempfile::tempdir().unwrap();
    let handle = open_written(tmp.path(), "rows.csv", b"x,y\n1,2\n");
    assert!(handle.is_plain());
    assert_eq!(handle.list_entries().len(), 1);
    assert_eq!(handle.list_entries()[0].name, "");
    assert_eq!(read_entry(&handle, ""), b"x,y\n1,2\n");
}

/// Builds `data.rar` with the `rar` command-line tool; `None` when it is not installed.
fn rar_fixture(dir: &Path) -> Option<std::path::PathBuf> {
    let src = dir.join("src");
    std::fs::create_dir_all(src.join("dir")).unwrap();
    std::fs::write(src.join("top.csv"), b"a,b\n1,2\n").unwrap();
    std::fs::write(src.join("dir/inner.txt"), b"hello\nworld\n").unwrap();
    let archive = dir.join("data.rar");
    let status = std::process::Command::new("rar")
        .current_dir(&src)
        .args(["a", "-r", "-idq"])
        .arg(&archive)
        .arg(".")
        .status();
    if !matches!(status, Ok(s) if s.success()) {
        eprintln!("rar not available, skipping");
        return None;
    }
    Some(archive)
}

#[test]
fn test_rar_listing_matches_members() {
    let tmp = tempfile::tempdir().unwrap();
    let Some(archive) = rar_fixture(tmp.path()) else {
        return;
    };

    let handle = ArchiveHandle::open_path(&archive, "data.rar").unwrap();
    let expected: BTreeSet<String> = ["top.csv", "dir/inner.txt"]
        .into_iter()
        .map(String::from)
        .collect();
    assert_eq!(file_names(&handle), expected);
    assert_eq!(read_entry(&handle, "dir/inner.txt"), b"hello\nworld\n");
    handle.close().unwrap();
}

#[test]
fn test_rar_large_members_stream_from_disk() {
    let tmp = tempfile::tempdir().unwrap();
    let Some(archive) = rar_fixture(tmp.path()) else {
        return;
    };

    let handle = match ArchiveHandle::open_path(&archive, "data.rar").unwrap() {
        ArchiveHandle::Rar(rar) => ArchiveHandle::Rar(rar.with_spill_threshold(0)),
        _ => panic!("expected a rar handle"),
    };
    assert_eq!(read_entry(&handle, "top.csv"), b"a,b\n1,2\n");
    assert_eq!(read_entry(&handle, "dir/inner.txt"), b"hello\nworld\n");
    handle.close().unwrap();
}
