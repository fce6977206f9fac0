//! Integration tests for splitting.

use pdfsplice::{Document, PdfSpliceError, get_metadata, split, split_pages};
use rstest::rstest;

use crate::common::{count_typed, nested_pdf, object_stream_pdf, page_markers, simple_pdf};

fn five_pages() -> Vec<u8> {
    simple_pdf(&["p1", "p2", "p3", "p4", "p5"])
}

fn markers_of(parts: &[Vec<u8>]) -> Vec<Vec<String>> {
    parts.iter().map(|part| page_markers(part)).collect()
}

#[rstest]
#[case("1,3-4", &[&["p1"][..], &["p3", "p4"]])]
#[case("2-2", &[&["p2"][..]])]
#[case(" 5 , 1 - 2 ", &[&["p5"][..], &["p1", "p2"]])]
#[case("4-9", &[&["p4", "p5"][..]])]
#[case("1-2, 9, 4", &[&["p1", "p2"][..], &["p4"]])]
#[case("3-1,2", &[&["p2"][..]])]
#[case("2,2", &[&["p2"][..], &["p2"]])]
#[case("1,,5", &[&["p1"][..], &["p5"]])]
fn test_split_by_expression(#[case] expression: &str, #[case] expected: &[&[&str]]) {
    let parts = split(&five_pages(), expression).unwrap();
    assert_eq!(markers_of(&parts), expected);
}

#[test]
fn test_ranges_past_the_end_produce_nothing() {
    let parts = split(&five_pages(), "7-10").unwrap();
    assert!(parts.is_empty());
}

#[rstest]
#[case("abc", "abc")]
#[case("1,x-3", "x-3")]
#[case("1-2-3", "1-2-3")]
#[case("-4", "-4")]
fn test_malformed_expression(#[case] expression: &str, #[case] token: &str) {
    match split(&five_pages(), expression).unwrap_err() {
        PdfSpliceError::MalformedExpression { token: got } => assert_eq!(got, token),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_split_pages_gives_one_document_per_page() {
    let parts = split_pages(&five_pages()).unwrap();
    assert_eq!(parts.len(), 5);
    for (n, part) in parts.iter().enumerate() {
        assert_eq!(get_metadata(part).unwrap().page_count, 1);
        assert_eq!(page_markers(part), [format!("p{}", n + 1)]);
    }
}

#[test]
fn test_split_output_only_holds_what_its_pages_need() {
    let parts = split(&five_pages(), "2").unwrap();
    let doc = Document::load_mem(&parts[0]).unwrap();

    assert_eq!(doc.page_count().unwrap(), 1);
    assert_eq!(count_typed(&doc, b"Font"), 1);
    // catalog, page tree, page, content, font, info
    assert_eq!(doc.object_count(), 6);
}

#[test]
fn test_split_keeps_source_version() {
    let parts = split(&object_stream_pdf(&["a", "b"]), "2").unwrap();
    assert!(parts[0].starts_with(b"%PDF-1.5"));
    assert_eq!(page_markers(&parts[0]), ["b"]);
}

#[test]
fn test_split_nested_page_keeps_inherited_attributes() {
    let parts = split(&nested_pdf(), "2").unwrap();
    let doc = Document::load_mem(&parts[0]).unwrap();
    let page = doc.page_at(0).unwrap();

    assert_eq!(page_markers(&parts[0]), ["N2"]);
    assert_eq!(page.media_box(), Some([0.0, 0.0, 500.0, 500.0]));
    assert_eq!(page.rotation(), 90);
    assert!(page.dictionary().has(b"Resources"));
}

#[test]
fn test_split_outputs_split_again() {
    let first = split(&five_pages(), "2-4").unwrap();
    let second = split(&first[0], "2").unwrap();
    assert_eq!(page_markers(&second[0]), ["p3"]);
}

#[test]
fn test_split_pages_of_a_large_document() {
    let markers: Vec<String> = (1..=3000).map(|n| format!("L{n}")).collect();
    let markers: Vec<&str> = markers.iter().map(String::as_str).collect();
    let source = simple_pdf(&markers);

    let parts = split_pages(&source).unwrap();
    assert_eq!(parts.len(), 3000);
    for index in [0, 1499, 2999] {
        assert_eq!(page_markers(&parts[index]), [markers[index]]);
    }

    let parts = split(&source, "2999-3000, 1").unwrap();
    assert_eq!(markers_of(&parts), [vec!["L2999", "L3000"], vec!["L1"]]);
}
