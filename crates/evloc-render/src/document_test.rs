use image::{Rgb, RgbImage};

use super::*;

fn sample_png(width: u32, height: u32) -> Vec<u8> {
    let image = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    let mut png = Vec::new();
    image
        .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
        .unwrap();
    png
}

fn image_streams(doc: &Document) -> Vec<&Stream> {
    doc.objects
        .values()
        .filter_map(|o| match o {
            Object::Stream(s) => Some(s),
            _ => None,
        })
        .filter(|s| s.dict.get(b"Subtype").and_then(Object::as_name).ok() == Some(&b"Image"[..]))
        .collect()
}

fn stream_bytes(stream: &Stream) -> Vec<u8> {
    if stream.dict.has(b"Filter") {
        stream.decompressed_content().unwrap()
    } else {
        stream.content.clone()
    }
}

#[test]
fn header_only_document_has_one_page_and_no_image() {
    let bytes = build_document(None).unwrap();
    assert!(bytes.starts_with(b"%PDF-1.4"));
    let doc = Document::load_mem(&bytes).unwrap();
    assert_eq!(doc.get_pages().len(), 1);
    assert!(image_streams(&doc).is_empty());
}

#[test]
fn header_text_is_in_page_content() {
    let doc = Document::load_mem(&build_document(None).unwrap()).unwrap();
    let page_id = *doc.get_pages().values().next().unwrap();
    let content = doc.get_page_content(page_id).unwrap();
    let text = String::from_utf8_lossy(&content);
    assert!(text.contains(DOCUMENT_TITLE), "content: {text}");
}

#[test]
fn embedded_image_matches_saved_pixels() {
    let png = sample_png(60, 40);
    let doc = Document::load_mem(&build_document(Some(&png)).unwrap()).unwrap();
    assert_eq!(doc.get_pages().len(), 1);

    let images = image_streams(&doc);
    assert_eq!(images.len(), 1);
    let stream = images[0];
    assert_eq!(stream.dict.get(b"Width").unwrap().as_i64().unwrap(), 60);
    assert_eq!(stream.dict.get(b"Height").unwrap().as_i64().unwrap(), 40);

    let expected = image::load_from_memory(&png).unwrap().to_rgb8().into_raw();
    assert_eq!(stream_bytes(stream), expected);
}

#[test]
fn document_output_is_deterministic() {
    let png = sample_png(30, 20);
    assert_eq!(
        build_document(Some(&png)).unwrap(),
        build_document(Some(&png)).unwrap()
    );
}

#[test]
fn corrupt_image_is_a_document_encoding_error() {
    let err = build_document(Some(b"definitely not a png")).unwrap_err();
    assert!(matches!(err, RenderError::DocumentEncoding(_)), "got: {err:?}");
}

#[test]
fn helvetica_width_of_title_fits_header_cell() {
    let width = helvetica_width_pt(DOCUMENT_TITLE, FONT_SIZE_PT);
    assert!(width > 0.0 && width < mm(HEADER_CELL_WIDTH_MM));
    // "AAAA" is 4 * 667 units.
    assert!((helvetica_width_pt("AAAA", 10.0) - 26.68).abs() < 1e-3);
}

#[test]
fn exported_document_carries_download_metadata() {
    let exported = ExportedDocument::new(vec![1, 2, 3]);
    assert_eq!(exported.filename, "result.pdf");
    assert_eq!(exported.media_type, "application/pdf");
}
