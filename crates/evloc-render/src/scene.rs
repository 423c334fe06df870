//! Result plot composition.
//!
//! Draws, back to front: grid and axes, every catalog station, the query
//! point, the selected station, a dashed connector, point labels, then the
//! legend and titles. Output is a fixed-size PNG; the same inputs always
//! produce the same bytes.

use std::io::Cursor;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use ab_glyph::{Font, FontRef, PxScale, ScaleFont};
use base64::Engine;
use evloc_core::{Point, SelectionKind, Station};
use image::{imageops, ImageFormat, Rgb, RgbImage};
use imageproc::drawing::{
    draw_filled_circle_mut, draw_filled_rect_mut, draw_hollow_rect_mut, draw_line_segment_mut,
    draw_text_mut, text_size,
};
use imageproc::rect::Rect;

use crate::error::RenderError;
use crate::store::ArtifactStore;

static FONT_DATA: &[u8] = include_bytes!("../assets/DejaVuSansMono.ttf");

/// 6x4 inches at 100 dpi.
pub const PLOT_WIDTH: u32 = 600;
pub const PLOT_HEIGHT: u32 = 400;

pub const PLOT_TITLE: &str = "Charging Stations and Shortest Path";
const X_AXIS_TITLE: &str = "Longitude";
const Y_AXIS_TITLE: &str = "Latitude";
const QUERY_LABEL: &str = "User";
const QUERY_LEGEND: &str = "User Location";
const CATALOG_LEGEND: &str = "Charging Stations";

const MARGIN_LEFT: u32 = 80;
const MARGIN_RIGHT: u32 = 20;
const MARGIN_TOP: u32 = 30;
const MARGIN_BOTTOM: u32 = 45;

const TICKS: u32 = 4;
const PADDING_FRACTION: f64 = 0.05;
/// Smallest axis span in degrees, so a lone point still gets a frame.
const MIN_SPAN: f64 = 1e-3;

const DASH_PX: f32 = 8.0;
const GAP_PX: f32 = 5.0;

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
const BLACK: Rgb<u8> = Rgb([0, 0, 0]);
const GRID: Rgb<u8> = Rgb([224, 224, 224]);
const LEGEND_BORDER: Rgb<u8> = Rgb([204, 204, 204]);
const CATALOG_BLUE: Rgb<u8> = Rgb([31, 119, 180]);
const QUERY_RED: Rgb<u8> = Rgb([214, 39, 40]);
const SELECTED_GREEN: Rgb<u8> = Rgb([44, 160, 44]);

const CATALOG_RADIUS: i32 = 3;
const HIGHLIGHT_RADIUS: i32 = 6;

const TITLE_PX: f32 = 16.0;
const AXIS_TITLE_PX: f32 = 14.0;
const LABEL_PX: f32 = 13.0;
const TICK_PX: f32 = 11.0;
const LEGEND_PX: f32 = 11.0;

/// Encoded plot bytes as returned to callers and written to the artifact slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPlot {
    pub png: Vec<u8>,
}

impl RenderedPlot {
    /// `data:image/png;base64,...` form for inline embedding.
    #[must_use]
    pub fn data_uri(&self) -> String {
        format!(
            "data:image/png;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(&self.png)
        )
    }
}

/// Renders query results and persists each plot into the shared artifact slot.
#[derive(Debug, Clone)]
pub struct ResultRenderer {
    store: Arc<ArtifactStore>,
}

impl ResultRenderer {
    #[must_use]
    pub fn new(store: Arc<ArtifactStore>) -> Self {
        Self { store }
    }

    #[must_use]
    pub fn store(&self) -> &Arc<ArtifactStore> {
        &self.store
    }

    /// Render the plot and overwrite the artifact slot with the same bytes.
    ///
    /// `cancelled` is checked between encoding and the slot write; once set,
    /// the slot is left alone and `Ok(None)` is returned.
    ///
    /// # Errors
    ///
    /// Returns `RenderError` if PNG encoding or the slot write fails.
    pub fn render(
        &self,
        query: Point,
        selected: &Station,
        kind: SelectionKind,
        catalog: &[Station],
        cancelled: &AtomicBool,
    ) -> Result<Option<RenderedPlot>, RenderError> {
        let png = render_png(query, selected, kind, catalog)?;
        if cancelled.load(Ordering::Acquire) {
            tracing::warn!(%kind, "render cancelled; artifact slot left unchanged");
            return Ok(None);
        }
        self.store.save(&png)?;
        Ok(Some(RenderedPlot { png }))
    }
}

/// Render the plot to PNG bytes without touching the artifact store.
///
/// # Errors
///
/// Returns `RenderError::Encode` if the PNG encoder fails.
pub fn render_png(
    query: Point,
    selected: &Station,
    kind: SelectionKind,
    catalog: &[Station],
) -> Result<Vec<u8>, RenderError> {
    let typeface = Typeface::load()?;
    let image = compose(&typeface, query, selected, kind, catalog);
    let mut png = Vec::new();
    image.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;
    tracing::debug!(bytes = png.len(), stations = catalog.len(), %kind, "plot rendered");
    Ok(png)
}

/// The bundled label font.
struct Typeface {
    font: FontRef<'static>,
}

impl Typeface {
    fn load() -> Result<Self, RenderError> {
        Ok(Self {
            font: FontRef::try_from_slice(FONT_DATA)?,
        })
    }

    fn width(&self, text: &str, px: f32) -> i32 {
        to_i32(text_size(PxScale::from(px), &self.font, text).0)
    }

    #[allow(clippy::cast_possible_truncation)]
    fn line_height(&self, px: f32) -> i32 {
        self.font.as_scaled(PxScale::from(px)).height().ceil() as i32
    }

    /// `(x, y)` is the top-left corner of the line box.
    fn draw(&self, image: &mut RgbImage, text: &str, (x, y): (i32, i32), px: f32) {
        draw_text_mut(image, BLACK, x, y, PxScale::from(px), &self.font, text);
    }

    /// Text reading bottom to top, with `(x, bottom)` the lower-left corner.
    #[allow(clippy::cast_sign_loss)]
    fn draw_vertical(&self, image: &mut RgbImage, text: &str, (x, bottom): (i32, i32), px: f32) {
        let width = self.width(text, px).max(1);
        let height = self.line_height(px).max(1);
        let mut strip = RgbImage::from_pixel(width as u32, height as u32, WHITE);
        self.draw(&mut strip, text, (0, 0), px);
        let rotated = imageops::rotate270(&strip);
        imageops::replace(image, &rotated, i64::from(x), i64::from(bottom - width));
    }
}

fn compose(
    typeface: &Typeface,
    query: Point,
    selected: &Station,
    kind: SelectionKind,
    catalog: &[Station],
) -> RgbImage {
    let mut image = RgbImage::from_pixel(PLOT_WIDTH, PLOT_HEIGHT, WHITE);
    let target = selected.position();
    let frame = Frame::fit(
        catalog
            .iter()
            .map(Station::position)
            .chain([query, target])
            .filter(Point::is_finite),
    );

    frame.draw_axes(&mut image, typeface);

    for station in catalog {
        let p = station.position();
        if p.is_finite() {
            draw_filled_circle_mut(&mut image, frame.pixel(p), CATALOG_RADIUS, CATALOG_BLUE);
        }
    }

    let (qx, qy) = frame.pixel(query);
    let (sx, sy) = frame.pixel(target);
    draw_filled_circle_mut(&mut image, (qx, qy), HIGHLIGHT_RADIUS, QUERY_RED);
    draw_filled_circle_mut(&mut image, (sx, sy), HIGHLIGHT_RADIUS, SELECTED_GREEN);

    draw_dashed_line(&mut image, frame.pixel_f32(query), frame.pixel_f32(target), BLACK);

    let label_offset = HIGHLIGHT_RADIUS + 4;
    let label_half_height = typeface.line_height(LABEL_PX) / 2;
    typeface.draw(
        &mut image,
        QUERY_LABEL,
        (
            qx - label_offset - typeface.width(QUERY_LABEL, LABEL_PX),
            qy - label_half_height,
        ),
        LABEL_PX,
    );
    typeface.draw(
        &mut image,
        kind.marker_label(),
        (sx + label_offset, sy - label_half_height),
        LABEL_PX,
    );

    let mut legend = vec![
        (QUERY_LEGEND, QUERY_RED, HIGHLIGHT_RADIUS - 2),
        (kind.legend_label(), SELECTED_GREEN, HIGHLIGHT_RADIUS - 2),
    ];
    if !catalog.is_empty() {
        legend.push((CATALOG_LEGEND, CATALOG_BLUE, CATALOG_RADIUS));
    }
    let occupied: Vec<(i32, i32)> = catalog
        .iter()
        .map(Station::position)
        .chain([query, target])
        .filter(Point::is_finite)
        .map(|p| frame.pixel(p))
        .collect();
    frame.draw_legend(&mut image, typeface, &legend, &occupied);
    draw_titles(&mut image, typeface, &frame);

    image
}

/// Plot area in pixels and the data window mapped onto it.
#[derive(Debug, Clone, Copy)]
struct Frame {
    left: f64,
    top: f64,
    right: f64,
    bottom: f64,
    min_lon: f64,
    max_lon: f64,
    min_lat: f64,
    max_lat: f64,
}

impl Frame {
    fn fit(points: impl Iterator<Item = Point>) -> Self {
        let mut min_lon = f64::INFINITY;
        let mut max_lon = f64::NEG_INFINITY;
        let mut min_lat = f64::INFINITY;
        let mut max_lat = f64::NEG_INFINITY;
        for p in points {
            min_lon = min_lon.min(p.lon);
            max_lon = max_lon.max(p.lon);
            min_lat = min_lat.min(p.lat);
            max_lat = max_lat.max(p.lat);
        }
        if min_lon > max_lon {
            (min_lon, max_lon, min_lat, max_lat) = (0.0, 0.0, 0.0, 0.0);
        }
        let (min_lon, max_lon) = padded(min_lon, max_lon);
        let (min_lat, max_lat) = padded(min_lat, max_lat);

        Self {
            left: f64::from(MARGIN_LEFT),
            top: f64::from(MARGIN_TOP),
            right: f64::from(PLOT_WIDTH - MARGIN_RIGHT),
            bottom: f64::from(PLOT_HEIGHT - MARGIN_BOTTOM),
            min_lon,
            max_lon,
            min_lat,
            max_lat,
        }
    }

    fn x(&self, lon: f64) -> f64 {
        let span = self.max_lon - self.min_lon;
        if span > 0.0 {
            self.left + (lon - self.min_lon) / span * (self.right - self.left)
        } else {
            (self.left + self.right) / 2.0
        }
    }

    fn y(&self, lat: f64) -> f64 {
        let span = self.max_lat - self.min_lat;
        if span > 0.0 {
            self.bottom - (lat - self.min_lat) / span * (self.bottom - self.top)
        } else {
            (self.top + self.bottom) / 2.0
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn pixel(&self, p: Point) -> (i32, i32) {
        (self.x(p.lon).round() as i32, self.y(p.lat).round() as i32)
    }

    #[allow(clippy::cast_possible_truncation)]
    fn pixel_f32(&self, p: Point) -> (f32, f32) {
        (self.x(p.lon) as f32, self.y(p.lat) as f32)
    }

    #[allow(clippy::cast_possible_truncation)]
    fn draw_axes(&self, image: &mut RgbImage, typeface: &Typeface) {
        let (left, top, right, bottom) = (
            self.left as i32,
            self.top as i32,
            self.right as i32,
            self.bottom as i32,
        );
        let lon_step = (self.max_lon - self.min_lon) / f64::from(TICKS);
        let lat_step = (self.max_lat - self.min_lat) / f64::from(TICKS);

        for i in 0..=TICKS {
            let lon = self.min_lon + lon_step * f64::from(i);
            let x = self.x(lon).round() as i32;
            draw_line_segment_mut(image, (x as f32, top as f32), (x as f32, bottom as f32), GRID);
            let label = tick_label(lon, lon_step);
            typeface.draw(
                image,
                &label,
                (x - typeface.width(&label, TICK_PX) / 2, bottom + 4),
                TICK_PX,
            );

            let lat = self.min_lat + lat_step * f64::from(i);
            let y = self.y(lat).round() as i32;
            draw_line_segment_mut(image, (left as f32, y as f32), (right as f32, y as f32), GRID);
            let label = tick_label(lat, lat_step);
            typeface.draw(
                image,
                &label,
                (
                    left - 5 - typeface.width(&label, TICK_PX),
                    y - typeface.line_height(TICK_PX) / 2,
                ),
                TICK_PX,
            );
        }

        draw_hollow_rect_mut(
            image,
            Rect::at(left, top).of_size((right - left) as u32 + 1, (bottom - top) as u32 + 1),
            BLACK,
        );
    }

    /// Draw the legend in whichever plot corner hides the fewest markers,
    /// preferring upper right, upper left, lower left, lower right in that
    /// order on ties.
    #[allow(clippy::cast_possible_truncation)]
    fn draw_legend(
        &self,
        image: &mut RgbImage,
        typeface: &Typeface,
        entries: &[(&str, Rgb<u8>, i32)],
        occupied: &[(i32, i32)],
    ) {
        const SWATCH: u32 = 20;
        const PAD: u32 = 6;

        let row = u32::try_from(typeface.line_height(LEGEND_PX) + 2).unwrap_or(16);
        let label_width = entries
            .iter()
            .map(|(label, _, _)| u32::try_from(typeface.width(label, LEGEND_PX)).unwrap_or(0))
            .max()
            .unwrap_or(0);
        let width = PAD + SWATCH + label_width + PAD;
        let height = PAD + row * u32::try_from(entries.len()).unwrap_or(0) + PAD / 2;
        let (w, h) = (to_i32(width), to_i32(height));
        let west = self.left as i32 + 6;
        let east = self.right as i32 - w - 6;
        let north = self.top as i32 + 6;
        let south = self.bottom as i32 - h - 6;
        let hidden = |(x, y): (i32, i32)| {
            let reach = HIGHLIGHT_RADIUS;
            occupied
                .iter()
                .filter(|(px, py)| {
                    *px + reach >= x && *px - reach <= x + w && *py + reach >= y && *py - reach <= y + h
                })
                .count()
        };
        let (x, y) = [(east, north), (west, north), (west, south), (east, south)]
            .into_iter()
            .min_by_key(|corner| hidden(*corner))
            .unwrap_or((east, north));

        let rect = Rect::at(x, y).of_size(width, height);
        draw_filled_rect_mut(image, rect, WHITE);
        draw_hollow_rect_mut(image, rect, LEGEND_BORDER);

        let mut row_y = y + to_i32(PAD);
        for (label, color, radius) in entries {
            let center = (
                x + to_i32(PAD + SWATCH / 2),
                row_y + typeface.line_height(LEGEND_PX) / 2,
            );
            draw_filled_circle_mut(image, center, *radius, *color);
            typeface.draw(image, label, (x + to_i32(PAD + SWATCH), row_y), LEGEND_PX);
            row_y += to_i32(row);
        }
    }
}

fn padded(min: f64, max: f64) -> (f64, f64) {
    let (mut min, mut max) = (min, max);
    if max - min < MIN_SPAN {
        let mid = (min + max) / 2.0;
        min = mid - MIN_SPAN / 2.0;
        max = mid + MIN_SPAN / 2.0;
    }
    let pad = (max - min) * PADDING_FRACTION;
    (min - pad, max + pad)
}

/// Enough decimals to tell adjacent ticks apart.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn tick_label(value: f64, step: f64) -> String {
    // A zero step comes from a span too narrow to represent at this magnitude.
    let decimals = if step.is_nan() || step <= 0.0 || step >= 1.0 {
        1
    } else {
        (-step.log10()).ceil().clamp(0.0, 5.0) as usize + 1
    };
    let label = format!("{value:.decimals$}");
    // Avoid "-0.00" for values that round to zero.
    if label.trim_start_matches('-').chars().all(|c| c == '0' || c == '.') {
        label.trim_start_matches('-').to_string()
    } else {
        label
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss, clippy::cast_sign_loss)]
fn draw_dashed_line(image: &mut RgbImage, from: (f32, f32), to: (f32, f32), color: Rgb<u8>) {
    let (dx, dy) = (to.0 - from.0, to.1 - from.1);
    let length = dx.hypot(dy);
    if length < 1.0 {
        return;
    }
    let (ux, uy) = (dx / length, dy / length);
    let period = DASH_PX + GAP_PX;
    let dashes = (length / period).ceil() as u32;
    for i in 0..dashes {
        let start = i as f32 * period;
        let end = (start + DASH_PX).min(length);
        draw_line_segment_mut(
            image,
            (from.0 + ux * start, from.1 + uy * start),
            (from.0 + ux * end, from.1 + uy * end),
            color,
        );
    }
}

#[allow(clippy::cast_possible_truncation)]
fn draw_titles(image: &mut RgbImage, typeface: &Typeface, frame: &Frame) {
    let center_x = ((frame.left + frame.right) / 2.0) as i32;
    let center_y = ((frame.top + frame.bottom) / 2.0) as i32;

    typeface.draw(
        image,
        PLOT_TITLE,
        (center_x - typeface.width(PLOT_TITLE, TITLE_PX) / 2, 6),
        TITLE_PX,
    );
    typeface.draw(
        image,
        X_AXIS_TITLE,
        (
            center_x - typeface.width(X_AXIS_TITLE, AXIS_TITLE_PX) / 2,
            frame.bottom as i32 + 22,
        ),
        AXIS_TITLE_PX,
    );
    typeface.draw_vertical(
        image,
        Y_AXIS_TITLE,
        (6, center_y + typeface.width(Y_AXIS_TITLE, AXIS_TITLE_PX) / 2),
        AXIS_TITLE_PX,
    );
}

fn to_i32(v: u32) -> i32 {
    i32::try_from(v).unwrap_or(i32::MAX)
}

#[cfg(test)]
#[path = "scene_test.rs"]
mod tests;
