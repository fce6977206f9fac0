//! Outputs must open in an independent PDF reader.

use pdfsplice::{Options, WriteOptions, merge, merge_with, split, split_pages};

use crate::common::{nested_pdf, object_stream_pdf, simple_pdf, xref_stream_pdf};

fn lopdf_page_count(bytes: &[u8]) -> usize {
    let doc = lopdf::Document::load_mem(bytes).expect("lopdf failed to parse output");
    doc.get_pages().len()
}

#[test]
fn test_merged_output_opens_in_lopdf() {
    let merged = merge(&[
        simple_pdf(&["a1", "a2"]),
        xref_stream_pdf(&["b1"]),
        object_stream_pdf(&["c1", "c2"]),
        nested_pdf(),
    ])
    .unwrap();

    assert_eq!(lopdf_page_count(&merged), 8);
}

#[test]
fn test_split_outputs_open_in_lopdf() {
    let source = simple_pdf(&["p1", "p2", "p3", "p4"]);

    let parts = split(&source, "1-2, 4").unwrap();
    let counts: Vec<usize> = parts.iter().map(|part| lopdf_page_count(part)).collect();
    assert_eq!(counts, [2, 1]);

    for part in split_pages(&source).unwrap() {
        assert_eq!(lopdf_page_count(&part), 1);
    }
}

#[test]
fn test_lopdf_sees_page_content_in_order() {
    let options = Options {
        write: WriteOptions::uncompressed(),
        ..Options::default()
    };
    let merged = merge_with(&[simple_pdf(&["first"]), simple_pdf(&["second"])], &options).unwrap();

    let doc = lopdf::Document::load_mem(&merged).unwrap();
    let contents: Vec<String> = doc
        .get_pages()
        .values()
        .map(|&id| String::from_utf8_lossy(&doc.get_page_content(id).unwrap()).into_owned())
        .collect();
    assert_eq!(contents.len(), 2);
    assert!(contents[0].contains("(first) Tj"));
    assert!(contents[1].contains("(second) Tj"));
}
