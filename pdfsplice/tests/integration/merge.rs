//! Integration tests for merging.

use pdfsplice::{
    Document, Metadata, Options, PdfSpliceError, WriteOptions, get_metadata, merge, merge_with,
    split,
};

use crate::common::{
    count_typed, nested_pdf, object_stream_pdf, page_markers, simple_pdf, xref_stream_pdf,
};

#[test]
fn test_merge_keeps_source_and_page_order() {
    let a = simple_pdf(&["a1", "a2"]);
    let b = simple_pdf(&["b1", "b2", "b3"]);

    let merged = merge(&[&a, &b]).unwrap();
    assert_eq!(get_metadata(&merged).unwrap().page_count, 5);
    assert_eq!(page_markers(&merged), ["a1", "a2", "b1", "b2", "b3"]);

    let reversed = merge(&[&b, &a]).unwrap();
    assert_eq!(page_markers(&reversed), ["b1", "b2", "b3", "a1", "a2"]);
}

#[test]
fn test_merge_page_counts_add_up_across_layouts() {
    let sources = [
        simple_pdf(&["c1", "c2", "c3"]),
        xref_stream_pdf(&["x1", "x2"]),
        object_stream_pdf(&["o1", "o2"]),
        nested_pdf(),
    ];

    let merged = merge(&sources).unwrap();
    assert_eq!(get_metadata(&merged).unwrap().page_count, 10);
    assert_eq!(
        page_markers(&merged),
        ["c1", "c2", "c3", "x1", "x2", "o1", "o2", "N1", "N2", "N3"]
    );
}

#[test]
fn test_merge_then_split_everything_round_trips() {
    let merged = merge(&[simple_pdf(&["a1", "a2"]), simple_pdf(&["b1", "b2", "b3"])]).unwrap();

    let parts = split(&merged, "1-5").unwrap();
    assert_eq!(parts.len(), 1);
    assert_eq!(page_markers(&parts[0]), page_markers(&merged));
}

#[test]
fn test_merge_single_source() {
    let merged = merge(&[simple_pdf(&["solo"])]).unwrap();
    assert_eq!(page_markers(&merged), ["solo"]);
}

#[test]
fn test_merge_nothing() {
    let sources: [Vec<u8>; 0] = [];
    assert!(matches!(
        merge(&sources).unwrap_err(),
        PdfSpliceError::NoDocuments
    ));
}

#[test]
fn test_merge_reports_which_source_failed() {
    let good = simple_pdf(&["ok"]);
    let bad = b"%PDF-1.4\nnot really a pdf\n".to_vec();

    let err = merge(&[good.clone(), good, bad]).unwrap_err();
    match &err {
        PdfSpliceError::SourceFailed { index, source } => {
            assert_eq!(*index, 2);
            assert!(matches!(**source, PdfSpliceError::MalformedDocument { .. }));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(err.to_string().starts_with("Input #3"));
}

#[test]
fn test_shared_resources_are_copied_once_per_source() {
    let source = simple_pdf(&["p1", "p2", "p3", "p4"]);

    let merged = merge(&[&source, &source]).unwrap();
    let doc = Document::load_mem(&merged).unwrap();
    assert_eq!(doc.page_count().unwrap(), 8);
    assert_eq!(count_typed(&doc, b"Font"), 2);
}

#[test]
fn test_inherited_attributes_are_materialised() {
    let merged = merge(&[nested_pdf()]).unwrap();
    let doc = Document::load_mem(&merged).unwrap();

    for page in doc.pages().unwrap().iter() {
        let dict = page.dictionary();
        assert!(dict.has(b"MediaBox"));
        assert!(dict.has(b"Resources"));
        assert_eq!(dict.get(b"Rotate").and_then(|r| r.as_i64()), Some(90));
        assert_eq!(page.media_box(), Some([0.0, 0.0, 500.0, 500.0]));
    }
}

#[test]
fn test_output_version_is_the_highest_input_version() {
    let merged = merge(&[simple_pdf(&["a"]), xref_stream_pdf(&["b"])]).unwrap();
    assert!(merged.starts_with(b"%PDF-1.5"));
    assert_eq!(get_metadata(&merged).unwrap().version, "1.5");
}

#[test]
fn test_merge_with_metadata() {
    let options = Options {
        metadata: Metadata::new(
            Some("Collected Works".to_string()),
            Some("A. Writer".to_string()),
            None,
            Some("poems, essays".to_string()),
        ),
        ..Options::default()
    };

    let merged = merge_with(&[simple_pdf(&["a"]), simple_pdf(&["b"])], &options).unwrap();
    let meta = get_metadata(&merged).unwrap();
    assert_eq!(meta.title.as_deref(), Some("Collected Works"));
    assert_eq!(meta.author.as_deref(), Some("A. Writer"));
    assert_eq!(meta.keywords.as_deref(), Some("poems, essays"));
    assert_eq!(meta.subject, None);
    assert_eq!(meta.producer.as_deref(), Some("pdfsplice"));
}

#[test]
fn test_source_info_is_not_carried_over() {
    let merged = merge(&[simple_pdf(&["a"])]).unwrap();
    let meta = get_metadata(&merged).unwrap();
    assert_eq!(meta.title, None);
    assert_eq!(meta.author, None);
}

#[test]
fn test_uncompressed_output_keeps_content_readable() {
    let options = Options {
        write: WriteOptions::uncompressed(),
        ..Options::default()
    };
    let plain = merge_with(&[simple_pdf(&["visible"])], &options).unwrap();
    let packed = merge(&[simple_pdf(&["visible"])]).unwrap();

    let needle = b"(visible) Tj";
    assert!(plain.windows(needle.len()).any(|w| w == needle));
    assert!(!packed.windows(needle.len()).any(|w| w == needle));
    assert_eq!(page_markers(&packed), ["visible"]);
}
