//! Overlay geometry: the phase slider, its readout and mosaic cells.

use orbit::illuminated_fraction;
use renderer::{MosaicCell, OutputEncoding, OverlayBatch};

use crate::state::MoonScene;

const TRACK_COLOR: [f32; 4] = [0.25, 0.25, 0.28, 0.9];
const FILL_COLOR: [f32; 4] = [0.75, 0.75, 0.72, 0.9];
const HANDLE_COLOR: [f32; 4] = [1.0, 1.0, 1.0, 1.0];
const HANDLE_DRAG_COLOR: [f32; 4] = [1.0, 0.86, 0.45, 1.0];
const TEXT_COLOR: [f32; 4] = [0.9, 0.9, 0.9, 1.0];
const PANEL_COLOR: [f32; 4] = [0.0, 0.0, 0.0, 0.45];

/// Handle edge in pixels.
const HANDLE_SIZE: f32 = 14.0;
/// Glyph scale of the readout.
const TEXT_SCALE: f32 = 3.0;

/// Build the HUD: slider track, fill, handle, numeric readout and lit percentage.
pub fn build(scene: &MoonScene, sw: f32, sh: f32, encoding: OutputEncoding) -> OverlayBatch {
    let mut batch = OverlayBatch::new(sw, sh, encoding);
    let slider = &scene.slider;
    let track = slider.track();
    let handle = slider.handle_center();

    let line_h = OverlayBatch::line_height(TEXT_SCALE);
    let panel_top = track.y - line_h - 16.0;
    batch.add_rect(0.0, panel_top, sw, sh - panel_top, PANEL_COLOR);

    batch.add_rect(track.x, track.y, track.w, track.h, TRACK_COLOR);
    batch.add_rect(track.x, track.y, handle.x - track.x, track.h, FILL_COLOR);

    let handle_color = if slider.is_dragging() {
        HANDLE_DRAG_COLOR
    } else {
        HANDLE_COLOR
    };
    batch.add_rect(
        handle.x - HANDLE_SIZE * 0.5,
        handle.y - HANDLE_SIZE * 0.5,
        HANDLE_SIZE,
        HANDLE_SIZE,
        handle_color,
    );

    // Readout to the right of the track, vertically centered on it.
    let text_x = track.x + track.w + 16.0;
    let text_y = handle.y - line_h * 0.5;
    batch.add_number(text_x, text_y, &slider.readout(), TEXT_SCALE, TEXT_COLOR);

    // Lit percentage above the left end of the track.
    let percent = format!("{:.0}%", illuminated_fraction(slider.value()) * 100.0);
    batch.add_number(track.x, panel_top + 8.0, &percent, TEXT_SCALE, TEXT_COLOR);

    batch
}

/// One flat rectangle per mosaic cell.
pub fn add_mosaic(batch: &mut OverlayBatch, cells: &[MosaicCell]) {
    for cell in cells {
        let r = cell.rect;
        batch.add_rect(r.x as f32, r.y as f32, r.w as f32, r.h as f32, cell.color());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use renderer::CellRect;

    #[test]
    fn mosaic_cells_become_quads() {
        let mut batch = OverlayBatch::new(40.0, 20.0, OutputEncoding::Raw);
        let cells = [
            MosaicCell {
                rect: CellRect { x: 0, y: 0, w: 20, h: 20 },
                rgb: [255, 0, 0],
            },
            MosaicCell {
                rect: CellRect { x: 20, y: 0, w: 20, h: 20 },
                rgb: [0, 0, 255],
            },
        ];
        add_mosaic(&mut batch, &cells);
        assert_eq!(batch.vertices.len(), 8);
        assert_eq!(batch.indices.len(), 12);
        assert_eq!(batch.vertices[0].color, [1.0, 0.0, 0.0, 1.0]);
        // Left cell spans the left half of NDC.
        assert_eq!(batch.vertices[0].position, [-1.0, 1.0]);
    }

    #[test]
    fn hud_has_track_handle_and_text() {
        let mut scene = MoonScene::new(&AppConfig::default());
        scene.slider.layout(800.0, 600.0);
        let batch = build(&scene, 800.0, 600.0, OutputEncoding::Raw);
        // Panel, track, fill and handle, plus glyph pixels.
        assert!(batch.vertices.len() > 4 * 4);
        assert!(batch.vertices.iter().all(|v| v.position[0] >= -1.0 && v.position[0] <= 1.0));
    }
}
