//! Frame annotation with confirmed track boxes.

use image::{Rgb, RgbImage};

use vigil_models::BBox;

/// Box color for animal tracks.
const ANIMAL_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
/// Box color for everything else (people).
const OTHER_COLOR: Rgb<u8> = Rgb([255, 0, 0]);

const BORDER: u32 = 2;
const TAG_HEIGHT: u32 = 10;

/// Draw confirmed track boxes onto a frame.
///
/// Each entry is `(track_id, class_label, bbox)`. Animals are drawn green,
/// everything else red, matching the colors the live dashboard expects. A
/// filled tag band above the box marks where the label overlay goes; its
/// width scales with the track id so distinct identities are visually
/// distinguishable even without text rendering.
pub fn annotate_tracks<'a>(
    image: &mut RgbImage,
    tracks: impl IntoIterator<Item = (u64, &'a str, BBox)>,
) {
    for (track_id, class_label, bbox) in tracks {
        let color = if class_label == "animal" {
            ANIMAL_COLOR
        } else {
            OTHER_COLOR
        };

        let (x1, y1, x2, y2) = clamp_box(image, &bbox);
        if x2 <= x1 || y2 <= y1 {
            continue;
        }

        // Border
        for t in 0..BORDER {
            draw_hline(image, x1, x2, y1.saturating_add(t).min(y2), color);
            draw_hline(image, x1, x2, y2.saturating_sub(t).max(y1), color);
            draw_vline(image, y1, y2, x1.saturating_add(t).min(x2), color);
            draw_vline(image, y1, y2, x2.saturating_sub(t).max(x1), color);
        }

        // Tag band above the box
        let tag_w = (20 + (track_id % 8) * 6).min((x2 - x1) as u64) as u32;
        let tag_y1 = y1.saturating_sub(TAG_HEIGHT);
        for y in tag_y1..y1 {
            draw_hline(image, x1, x1 + tag_w, y, color);
        }
    }
}

fn clamp_box(image: &RgbImage, bbox: &BBox) -> (u32, u32, u32, u32) {
    let max_x = image.width().saturating_sub(1);
    let max_y = image.height().saturating_sub(1);
    let [x1, y1, x2, y2] = bbox.to_tlbr();
    (
        (x1.max(0.0) as u32).min(max_x),
        (y1.max(0.0) as u32).min(max_y),
        (x2.max(0.0) as u32).min(max_x),
        (y2.max(0.0) as u32).min(max_y),
    )
}

fn draw_hline(image: &mut RgbImage, x1: u32, x2: u32, y: u32, color: Rgb<u8>) {
    if y >= image.height() {
        return;
    }
    for x in x1..=x2.min(image.width().saturating_sub(1)) {
        image.put_pixel(x, y, color);
    }
}

fn draw_vline(image: &mut RgbImage, y1: u32, y2: u32, x: u32, color: Rgb<u8>) {
    if x >= image.width() {
        return;
    }
    for y in y1..=y2.min(image.height().saturating_sub(1)) {
        image.put_pixel(x, y, color);
    }
}
