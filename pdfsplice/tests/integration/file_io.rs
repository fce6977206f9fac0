//! Integration tests for loading from and saving to disk.

use pdfsplice::PdfSpliceError;
use pdfsplice::io::{PdfReader, PdfWriter};
use pdfsplice::ops::merge_documents;
use pdfsplice::{Document, Options};
use std::path::PathBuf;
use tempfile::TempDir;

use crate::common::{encrypted_pdf, page_markers, simple_pdf, write_fixture};

#[tokio::test]
async fn test_load_merge_save_reload() {
    let dir = TempDir::new().unwrap();
    let paths: Vec<PathBuf> = (1..=5)
        .map(|n| {
            let markers: Vec<String> = (1..=n).map(|p| format!("f{n}p{p}")).collect();
            let markers: Vec<&str> = markers.iter().map(String::as_str).collect();
            write_fixture(&dir, &format!("part{n}.pdf"), &simple_pdf(&markers))
        })
        .collect();

    let (results, stats) = PdfReader::new().load_all(&paths, 4).await;
    assert_eq!(stats.success_count, 5);
    assert_eq!(stats.total_pages, 15);

    let loaded: Vec<_> = results.into_iter().map(Result::unwrap).collect();
    for (pdf, path) in loaded.iter().zip(&paths) {
        assert_eq!(&pdf.path, path);
    }

    let documents: Vec<Document> = loaded.into_iter().map(|pdf| pdf.document).collect();
    let bytes = merge_documents(&documents, &Options::default()).unwrap();

    let output = dir.path().join("out").join("merged.pdf");
    std::fs::create_dir(dir.path().join("out")).unwrap();
    let writer = PdfWriter::new();
    writer.can_write(&output).await.unwrap();
    let written = writer.save_with_stats(bytes, &output).await.unwrap();
    assert!(written.file_size > 0);

    let reloaded = PdfReader::new().load(&output).await.unwrap();
    assert_eq!(reloaded.page_count, 15);
    let markers = page_markers(&std::fs::read(&output).unwrap());
    assert_eq!(markers.first().map(String::as_str), Some("f1p1"));
    assert_eq!(markers.last().map(String::as_str), Some("f5p5"));
}

#[tokio::test]
async fn test_load_failures_are_reported_in_place() {
    let dir = TempDir::new().unwrap();
    let good = write_fixture(&dir, "good.pdf", &simple_pdf(&["g"]));
    let locked = write_fixture(&dir, "locked.pdf", &encrypted_pdf());
    let missing = dir.path().join("missing.pdf");

    let paths = vec![good, missing, locked, dir.path().to_path_buf()];
    let (results, stats) = PdfReader::new().load_all(&paths, 2).await;

    assert_eq!(stats.success_count, 1);
    assert_eq!(stats.failure_count, 3);
    assert!(results[0].is_ok());
    assert!(matches!(
        results[1],
        Err(PdfSpliceError::FileNotFound { .. })
    ));
    assert!(matches!(results[2], Err(PdfSpliceError::EncryptedDocument)));
    assert!(matches!(results[3], Err(PdfSpliceError::NotAFile { .. })));
}

#[tokio::test]
async fn test_atomic_save_replaces_existing_file() {
    let dir = TempDir::new().unwrap();
    let output = write_fixture(&dir, "out.pdf", b"old contents");

    PdfWriter::new()
        .save(simple_pdf(&["new"]), &output)
        .await
        .unwrap();

    assert_eq!(page_markers(&std::fs::read(&output).unwrap()), ["new"]);
    let leftovers: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name())
        .collect();
    assert_eq!(leftovers, ["out.pdf"]);
}
