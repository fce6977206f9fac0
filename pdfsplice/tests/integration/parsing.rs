//! Integration tests for reading documents in their various layouts.

use pdfsplice::{Document, PdfSpliceError, get_metadata};
use rstest::rstest;

use crate::common::{
    encrypted_pdf, nested_pdf, object_stream_pdf, page_markers, simple_pdf, updated_pdf,
    with_leading_junk, xref_stream_pdf,
};

#[test]
fn test_metadata_of_simple_document() {
    let meta = get_metadata(&simple_pdf(&["a", "b", "c"])).unwrap();

    assert_eq!(meta.page_count, 3);
    assert_eq!(meta.version, "1.4");
    assert_eq!(meta.title.as_deref(), Some("Fixture"));
    assert_eq!(meta.author.as_deref(), Some("Test Suite"));
    assert_eq!(meta.producer.as_deref(), Some("hand"));
    assert_eq!(meta.subject, None);
}

#[rstest]
#[case::classic_table(simple_pdf(&["p1", "p2", "p3"]))]
#[case::xref_stream(xref_stream_pdf(&["p1", "p2", "p3"]))]
#[case::object_stream(object_stream_pdf(&["p1", "p2", "p3"]))]
#[case::leading_junk(with_leading_junk(&simple_pdf(&["p1", "p2", "p3"])))]
fn test_every_layout_reads_the_same_pages(#[case] bytes: Vec<u8>) {
    let doc = Document::load_mem(&bytes).unwrap();
    assert_eq!(doc.page_count().unwrap(), 3);
    assert_eq!(page_markers(&bytes), ["p1", "p2", "p3"]);
}

#[test]
fn test_object_stream_members_resolve() {
    let bytes = object_stream_pdf(&["only"]);
    let doc = Document::load_mem(&bytes).unwrap();
    let page = doc.page_at(0).unwrap();

    let fonts = page.resources().unwrap().get(b"Font").unwrap();
    let f1 = doc.resolve(fonts).as_dict().unwrap().get(b"F1").unwrap();
    let font = doc.resolve(f1).as_dict().unwrap();
    assert_eq!(font.get_name(b"BaseFont"), Some(&b"Helvetica"[..]));

    let meta = get_metadata(&bytes).unwrap();
    assert_eq!(meta.version, "1.5");
    assert_eq!(meta.title.as_deref(), Some("Fixture"));
}

#[test]
fn test_nested_tree_order_and_inheritance() {
    let bytes = nested_pdf();
    let doc = Document::load_mem(&bytes).unwrap();
    let pages = doc.pages().unwrap();

    assert_eq!(pages.len(), 3);
    assert_eq!(page_markers(&bytes), ["N1", "N2", "N3"]);
    for page in pages.iter() {
        assert_eq!(page.media_box(), Some([0.0, 0.0, 500.0, 500.0]));
        assert_eq!(page.rotation(), 90);
        assert!(page.resources().is_some());
        assert!(!page.dictionary().has(b"MediaBox"));
    }
}

#[test]
fn test_incremental_update_newest_revision_wins() {
    let bytes = updated_pdf(&["one", "two", "three"], 1, "TWO");
    let doc = Document::load_mem(&bytes).unwrap();

    assert_eq!(doc.page_count().unwrap(), 3);
    assert_eq!(page_markers(&bytes), ["one", "TWO", "three"]);
    assert!(doc.trailer().has(b"Prev"));
}

#[rstest]
#[case::load(|bytes: &[u8]| Document::load_mem(bytes).map(|_| ()))]
#[case::metadata(|bytes: &[u8]| get_metadata(bytes).map(|_| ()))]
#[case::split(|bytes: &[u8]| pdfsplice::split(bytes, "1").map(|_| ()))]
#[case::split_pages(|bytes: &[u8]| pdfsplice::split_pages(bytes).map(|_| ()))]
#[case::merge(|bytes: &[u8]| pdfsplice::merge(&[bytes]).map(|_| ()))]
fn test_encrypted_input_is_rejected(#[case] operation: fn(&[u8]) -> pdfsplice::Result<()>) {
    let err = operation(&encrypted_pdf()).unwrap_err();
    assert!(err.is_encrypted(), "unexpected error: {err:?}");
    assert_eq!(err.exit_code(), 3);
}

#[rstest]
#[case::empty(b"".to_vec())]
#[case::not_pdf(b"<html><body>hello</body></html>".to_vec())]
#[case::header_only(b"%PDF-1.7\n%%EOF\n".to_vec())]
#[case::truncated(simple_pdf(&["x"])[..60].to_vec())]
fn test_garbage_is_malformed(#[case] bytes: Vec<u8>) {
    let err = Document::load_mem(&bytes).unwrap_err();
    assert!(
        matches!(err, PdfSpliceError::MalformedDocument { .. }),
        "unexpected error: {err:?}"
    );
}
