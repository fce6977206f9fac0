//! Common test utilities.
//!
//! Fixtures are assembled byte by byte so the parser is exercised on files
//! it did not write itself. Every page carries a content stream of the form
//! `(marker) Tj`, which lets tests follow pages through merge and split.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::io::Write;

use flate2::Compression;
use flate2::write::ZlibEncoder;
use pdfsplice::Document;
use tempfile::TempDir;

/// One indirect object: its number and the text between `obj` and `endobj`.
pub struct RawObject {
    pub number: u32,
    pub body: Vec<u8>,
}

pub fn raw(number: u32, body: impl AsRef<[u8]>) -> RawObject {
    RawObject {
        number,
        body: body.as_ref().to_vec(),
    }
}

/// Body of a stream object with `/Length` filled in.
pub fn stream_body(extra: &str, data: &[u8]) -> Vec<u8> {
    let mut body = format!("<< /Length {} {extra} >>\nstream\n", data.len()).into_bytes();
    body.extend_from_slice(data);
    body.extend_from_slice(b"\nendstream");
    body
}

pub fn zlib(data: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

fn page_content(marker: &str) -> Vec<u8> {
    format!("BT /F1 24 Tf 72 720 Td ({marker}) Tj ET").into_bytes()
}

/// Header plus objects; returns the bytes and each object's offset.
fn write_objects(version: &str, objects: &[RawObject]) -> (Vec<u8>, BTreeMap<u32, usize>) {
    let mut out = format!("%PDF-{version}\n").into_bytes();
    out.extend_from_slice(b"%\xe2\xe3\xcf\xd3\n");
    let mut offsets = BTreeMap::new();
    for object in objects {
        offsets.insert(object.number, out.len());
        write!(out, "{} 0 obj\n", object.number).unwrap();
        out.extend_from_slice(&object.body);
        out.extend_from_slice(b"\nendobj\n");
    }
    (out, offsets)
}

/// Append a classic `xref` table covering `0..size`, a trailer and
/// `startxref`.
fn finish_classic(mut out: Vec<u8>, offsets: &BTreeMap<u32, usize>, trailer: &str) -> Vec<u8> {
    let size = offsets.keys().next_back().map_or(1, |max| max + 1);
    let xref_offset = out.len();
    write!(out, "xref\n0 {size}\n0000000000 65535 f\r\n").unwrap();
    for number in 1..size {
        match offsets.get(&number) {
            Some(offset) => write!(out, "{offset:010} 00000 n\r\n").unwrap(),
            None => out.extend_from_slice(b"0000000000 00000 f\r\n"),
        }
    }
    write!(
        out,
        "trailer\n<< /Size {size} {trailer} >>\nstartxref\n{xref_offset}\n%%EOF\n"
    )
    .unwrap();
    out
}

/// A complete file with a classic cross-reference table.
pub fn classic_file(version: &str, objects: &[RawObject], trailer: &str) -> Vec<u8> {
    let (out, offsets) = write_objects(version, objects);
    finish_classic(out, &offsets, trailer)
}

/// Catalog, flat page tree, shared font and info dictionary, followed by
/// one page and one content stream per marker.
///
/// Numbering: 1 catalog, 2 pages, 3 font, 4 info, then page `5 + 2i` and
/// its content `6 + 2i`. The page tree holds the `/MediaBox`, so pages only
/// have it by inheritance.
fn flat_objects(markers: &[&str]) -> Vec<RawObject> {
    let kids: Vec<String> = (0..markers.len())
        .map(|i| format!("{} 0 R", 5 + 2 * i))
        .collect();
    let mut objects = vec![
        raw(1, "<< /Type /Catalog /Pages 2 0 R >>"),
        raw(
            2,
            format!(
                "<< /Type /Pages /Kids [{}] /Count {} /MediaBox [0 0 612 792] >>",
                kids.join(" "),
                markers.len()
            ),
        ),
        raw(3, "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>"),
        raw(4, "<< /Title (Fixture) /Author (Test Suite) /Producer (hand) >>"),
    ];
    for (i, marker) in markers.iter().enumerate() {
        let page = 5 + 2 * i as u32;
        objects.push(raw(
            page,
            format!(
                "<< /Type /Page /Parent 2 0 R /Resources << /Font << /F1 3 0 R >> >> /Contents {} 0 R >>",
                page + 1
            ),
        ));
        objects.push(raw(page + 1, stream_body("", &page_content(marker))));
    }
    objects
}

/// A PDF 1.4 file with one page per marker.
pub fn simple_pdf(markers: &[&str]) -> Vec<u8> {
    classic_file("1.4", &flat_objects(markers), "/Root 1 0 R /Info 4 0 R")
}

/// `simple_pdf` with a page tree two levels deep.
///
/// The root holds `/MediaBox [0 0 500 500]` and `/Rotate 90`; the
/// intermediate node holds `/Resources`. Page order is "N1", "N2" (under
/// the intermediate node), then "N3" (directly under the root, with its own
/// resources).
pub fn nested_pdf() -> Vec<u8> {
    let objects = vec![
        raw(1, "<< /Type /Catalog /Pages 2 0 R >>"),
        raw(
            2,
            "<< /Type /Pages /Kids [3 0 R 10 0 R] /Count 3 /MediaBox [0 0 500 500] /Rotate 90 >>",
        ),
        raw(
            3,
            "<< /Type /Pages /Parent 2 0 R /Kids [6 0 R 8 0 R] /Count 2 /Resources << /Font << /F1 4 0 R >> >> >>",
        ),
        raw(4, "<< /Type /Font /Subtype /Type1 /BaseFont /Courier >>"),
        raw(6, "<< /Type /Page /Parent 3 0 R /Contents 7 0 R >>"),
        raw(7, stream_body("", &page_content("N1"))),
        raw(8, "<< /Type /Page /Parent 3 0 R /Contents 9 0 R >>"),
        raw(9, stream_body("", &page_content("N2"))),
        raw(
            10,
            "<< /Type /Page /Parent 2 0 R /Resources << /Font << /F1 4 0 R >> >> /Contents 11 0 R >>",
        ),
        raw(11, stream_body("", &page_content("N3"))),
    ];
    classic_file("1.4", &objects, "/Root 1 0 R")
}

/// Encode rows with the PNG "Up" predictor, as xref streams usually are.
fn png_up(rows: &[Vec<u8>]) -> Vec<u8> {
    let mut out = Vec::new();
    let mut previous = vec![0u8; rows.first().map_or(0, Vec::len)];
    for row in rows {
        out.push(2);
        out.extend(row.iter().zip(&previous).map(|(b, p)| b.wrapping_sub(*p)));
        previous.clone_from(row);
    }
    out
}

/// Cross-reference stream row with `/W [1 4 2]`.
fn xref_row(kind: u8, field2: u32, field3: u16) -> Vec<u8> {
    let mut row = vec![kind];
    row.extend_from_slice(&field2.to_be_bytes());
    row.extend_from_slice(&field3.to_be_bytes());
    row
}

/// Append a flate-compressed, PNG-predicted xref stream as object
/// `xref_number` and finish the file.
fn finish_with_xref_stream(
    mut out: Vec<u8>,
    mut rows: BTreeMap<u32, Vec<u8>>,
    xref_number: u32,
    trailer: &str,
) -> Vec<u8> {
    let xref_offset = out.len();
    rows.insert(xref_number, xref_row(1, xref_offset as u32, 0));
    let size = xref_number + 1;
    let table: Vec<Vec<u8>> = (0..size)
        .map(|n| match rows.get(&n) {
            Some(row) => row.clone(),
            None if n == 0 => xref_row(0, 0, 65535),
            None => xref_row(0, 0, 0),
        })
        .collect();
    let data = zlib(&png_up(&table));
    let dict = format!(
        "/Type /XRef /Size {size} /W [1 4 2] {trailer} /Filter /FlateDecode /DecodeParms << /Predictor 12 /Columns 7 >>"
    );
    write!(out, "{xref_number} 0 obj\n").unwrap();
    out.extend_from_slice(&stream_body(&dict, &data));
    write!(out, "\nendobj\nstartxref\n{xref_offset}\n%%EOF\n").unwrap();
    out
}

/// `simple_pdf` content indexed by a cross-reference stream instead of a
/// table (PDF 1.5).
pub fn xref_stream_pdf(markers: &[&str]) -> Vec<u8> {
    let objects = flat_objects(markers);
    let xref_number = objects.iter().map(|o| o.number).max().unwrap_or(0) + 1;
    let (out, offsets) = write_objects("1.5", &objects);
    let rows = offsets
        .iter()
        .map(|(&number, &offset)| (number, xref_row(1, offset as u32, 0)))
        .collect();
    finish_with_xref_stream(out, rows, xref_number, "/Root 1 0 R /Info 4 0 R")
}

/// `simple_pdf` content with the font and every page dictionary stored in
/// a compressed object stream.
pub fn object_stream_pdf(markers: &[&str]) -> Vec<u8> {
    let all = flat_objects(markers);
    let (packed, loose): (Vec<RawObject>, Vec<RawObject>) = all
        .into_iter()
        .partition(|o| o.number == 3 || (o.number >= 5 && o.number % 2 == 1));

    let objstm_number = loose.iter().chain(&packed).map(|o| o.number).max().unwrap_or(0) + 1;
    let xref_number = objstm_number + 1;

    let mut header = String::new();
    let mut bodies = Vec::new();
    for object in &packed {
        header.push_str(&format!("{} {} ", object.number, bodies.len()));
        bodies.extend_from_slice(&object.body);
        bodies.push(b'\n');
    }
    let first = header.len();
    let mut payload = header.into_bytes();
    payload.extend_from_slice(&bodies);

    let mut objects = loose;
    objects.push(raw(
        objstm_number,
        stream_body(
            &format!(
                "/Type /ObjStm /N {} /First {first} /Filter /FlateDecode",
                packed.len()
            ),
            &zlib(&payload),
        ),
    ));

    let (out, offsets) = write_objects("1.5", &objects);
    let mut rows: BTreeMap<u32, Vec<u8>> = offsets
        .iter()
        .map(|(&number, &offset)| (number, xref_row(1, offset as u32, 0)))
        .collect();
    for (index, object) in packed.iter().enumerate() {
        rows.insert(object.number, xref_row(2, objstm_number, index as u16));
    }
    finish_with_xref_stream(out, rows, xref_number, "/Root 1 0 R /Info 4 0 R")
}

/// A file whose trailer declares `/Encrypt`.
pub fn encrypted_pdf() -> Vec<u8> {
    let mut objects = flat_objects(&["secret"]);
    objects.push(raw(
        7,
        "<< /Filter /Standard /V 2 /R 3 /Length 128 /P -3904 /O <00> /U <00> >>",
    ));
    classic_file(
        "1.6",
        &objects,
        "/Root 1 0 R /Encrypt 7 0 R /ID [<0102> <0102>]",
    )
}

/// `bytes` behind some garbage, so every stored offset is off by the
/// length of the prefix.
pub fn with_leading_junk(bytes: &[u8]) -> Vec<u8> {
    let mut out = b"From: scanner@example.com\r\nContent-Type: application/pdf\r\n\r\n".to_vec();
    out.extend_from_slice(bytes);
    out
}

fn startxref_of(bytes: &[u8]) -> usize {
    let text = String::from_utf8_lossy(bytes);
    let tail = &text[text.rfind("startxref").unwrap() + "startxref".len()..];
    tail.split_whitespace().next().unwrap().parse().unwrap()
}

/// `simple_pdf(markers)` plus one incremental update that points page
/// `index` at a new content stream showing `replacement`.
pub fn updated_pdf(markers: &[&str], index: usize, replacement: &str) -> Vec<u8> {
    let mut out = simple_pdf(markers);
    let previous = startxref_of(&out);
    let page = 5 + 2 * index as u32;
    let content = 5 + 2 * markers.len() as u32;

    let page_offset = out.len();
    write!(
        out,
        "{page} 0 obj\n<< /Type /Page /Parent 2 0 R /Resources << /Font << /F1 3 0 R >> >> /Contents {content} 0 R >>\nendobj\n"
    )
    .unwrap();
    let content_offset = out.len();
    write!(out, "{content} 0 obj\n").unwrap();
    out.extend_from_slice(&stream_body("", &page_content(replacement)));
    out.extend_from_slice(b"\nendobj\n");

    let xref_offset = out.len();
    write!(
        out,
        "xref\n0 1\n0000000000 65535 f\r\n{page} 1\n{page_offset:010} 00000 n\r\n{content} 1\n{content_offset:010} 00000 n\r\n"
    )
    .unwrap();
    write!(
        out,
        "trailer\n<< /Size {} /Root 1 0 R /Info 4 0 R /Prev {previous} >>\nstartxref\n{xref_offset}\n%%EOF\n",
        content + 1
    )
    .unwrap();
    out
}

/// The `(marker)` shown by each page, in page order.
pub fn page_markers(bytes: &[u8]) -> Vec<String> {
    let doc = Document::load_mem(bytes).unwrap();
    let pages = doc.pages().unwrap();
    pages
        .iter()
        .map(|page| {
            let contents = page.dictionary().get(b"Contents").unwrap();
            let stream = doc.resolve(contents).as_stream().unwrap();
            marker_of(&stream.decoded_content().unwrap())
        })
        .collect()
}

fn marker_of(content: &[u8]) -> String {
    let text = String::from_utf8_lossy(content);
    let start = text.find('(').unwrap() + 1;
    let end = text[start..].find(')').unwrap() + start;
    text[start..end].to_string()
}

/// Write `bytes` into `dir` under `name`.
pub fn write_fixture(dir: &TempDir, name: &str, bytes: &[u8]) -> std::path::PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, bytes).unwrap();
    path
}

/// Count objects of the given `/Type` in a parsed document.
pub fn count_typed(doc: &Document, type_name: &[u8]) -> usize {
    doc.object_ids()
        .filter_map(|id| doc.get_dict(id))
        .filter(|dict| dict.is_type(type_name))
        .count()
}
