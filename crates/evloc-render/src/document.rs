//! Single-page PDF export of the last rendered plot.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, Stream};

use crate::error::RenderError;

pub const DOCUMENT_TITLE: &str = "EV Charging Station Finder Result";
pub const DOCUMENT_FILENAME: &str = "result.pdf";
pub const DOCUMENT_MEDIA_TYPE: &str = "application/pdf";

// A4 portrait, millimetres.
const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const MARGIN_MM: f32 = 10.0;
const HEADER_CELL_WIDTH_MM: f32 = 200.0;
const HEADER_CELL_HEIGHT_MM: f32 = 10.0;
const IMAGE_X_MM: f32 = 10.0;
const IMAGE_Y_MM: f32 = 20.0;
const IMAGE_WIDTH_MM: f32 = 180.0;
const FONT_SIZE_PT: f32 = 12.0;

const FONT_RESOURCE: &str = "F1";
const IMAGE_RESOURCE: &str = "Im1";

/// Helvetica advance widths (1/1000 em) for ASCII 32..=126.
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // '0'..'9'
    278, 278, 584, 584, 584, 556, 1015, // ':'..'@'
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, // 'A'..'M'
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // 'N'..'Z'
    278, 278, 278, 469, 556, 333, // '['..'`'
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, // 'a'..'m'
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // 'n'..'z'
    334, 260, 334, 584, // '{'..'~'
];

/// A finished document plus the metadata a download response needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedDocument {
    pub bytes: Vec<u8>,
    pub filename: &'static str,
    pub media_type: &'static str,
}

impl ExportedDocument {
    #[must_use]
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            filename: DOCUMENT_FILENAME,
            media_type: DOCUMENT_MEDIA_TYPE,
        }
    }
}

fn mm(v: f32) -> f32 {
    v * 72.0 / 25.4
}

#[allow(clippy::cast_precision_loss)]
fn helvetica_width_pt(text: &str, size: f32) -> f32 {
    let units: u32 = text
        .chars()
        .map(|c| {
            let code = u32::from(c);
            if (32..=126).contains(&code) {
                u32::from(HELVETICA_WIDTHS[(code - 32) as usize])
            } else {
                556
            }
        })
        .sum();
    units as f32 * size / 1000.0
}

fn encoding_error(context: &str, e: impl std::fmt::Display) -> RenderError {
    RenderError::DocumentEncoding(format!("{context}: {e}"))
}

/// Header text centred in the top cell, baseline placed as a 10 mm line box
/// would place it.
fn header_operations() -> Vec<Operation> {
    let text_width = helvetica_width_pt(DOCUMENT_TITLE, FONT_SIZE_PT);
    let x = mm(MARGIN_MM) + (mm(HEADER_CELL_WIDTH_MM) - text_width) / 2.0;
    let baseline_from_top = mm(MARGIN_MM) + mm(HEADER_CELL_HEIGHT_MM) / 2.0 + 0.3 * FONT_SIZE_PT;
    let y = mm(PAGE_HEIGHT_MM) - baseline_from_top;

    vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec![FONT_RESOURCE.into(), FONT_SIZE_PT.into()]),
        Operation::new("Td", vec![x.into(), y.into()]),
        Operation::new("Tj", vec![Object::string_literal(DOCUMENT_TITLE)]),
        Operation::new("ET", vec![]),
    ]
}

/// Build the export PDF: the fixed header and, when given, the plot image
/// 180 mm wide at (10 mm, 20 mm) from the top-left corner.
///
/// Output contains no timestamps, so identical input gives identical bytes.
///
/// # Errors
///
/// Returns `RenderError::DocumentEncoding` if `image` is not a decodable
/// raster or the PDF writer fails.
#[allow(clippy::cast_precision_loss)]
pub fn build_document(image: Option<&[u8]>) -> Result<Vec<u8>, RenderError> {
    let mut doc = Document::with_version("1.4");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });

    let mut operations = header_operations();
    let mut xobjects = Dictionary::new();

    if let Some(png) = image {
        let raster = image::load_from_memory(png)
            .map_err(|e| encoding_error("plot image is not decodable", e))?
            .to_rgb8();
        let (width_px, height_px) = raster.dimensions();
        if width_px == 0 || height_px == 0 {
            return Err(RenderError::DocumentEncoding(
                "plot image has zero size".to_string(),
            ));
        }

        let image_id = doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => i64::from(width_px),
                "Height" => i64::from(height_px),
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
            },
            raster.into_raw(),
        ));
        xobjects.set(IMAGE_RESOURCE, image_id);

        let width = mm(IMAGE_WIDTH_MM);
        let height = width * height_px as f32 / width_px as f32;
        let x = mm(IMAGE_X_MM);
        let y = mm(PAGE_HEIGHT_MM) - mm(IMAGE_Y_MM) - height;
        operations.extend([
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    width.into(),
                    0.into(),
                    0.into(),
                    height.into(),
                    x.into(),
                    y.into(),
                ],
            ),
            Operation::new("Do", vec![IMAGE_RESOURCE.into()]),
            Operation::new("Q", vec![]),
        ]);
    }

    let content = Content { operations }
        .encode()
        .map_err(|e| encoding_error("page content", e))?;
    let content_id = doc.add_object(Stream::new(dictionary! {}, content));

    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { FONT_RESOURCE => font_id },
        "XObject" => xobjects,
    });
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "Resources" => resources_id,
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
            "MediaBox" => vec![
                0.into(),
                0.into(),
                mm(PAGE_WIDTH_MM).into(),
                mm(PAGE_HEIGHT_MM).into(),
            ],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)
        .map_err(|e| encoding_error("pdf writer", e))?;
    Ok(bytes)
}

#[cfg(test)]
#[path = "document_test.rs"]
mod tests;
