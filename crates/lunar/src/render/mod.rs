//! Per-frame render passes for each view mode, plus the HUD.

mod overlay;

use anyhow::Result;
use renderer::{mosaic, OverlayBatch, Renderer};

use crate::state::{MoonScene, ViewMode};

/// Draw one frame. Called from `MoonScene::render_frame` after uniforms are uploaded.
pub fn run(scene: &MoonScene, renderer: &mut Renderer) -> Result<()> {
    let Some(mesh) = scene.mesh.as_ref() else {
        return Ok(());
    };
    let Some((output, mut encoder)) = renderer.begin_frame()? else {
        return Ok(());
    };
    let view = output.texture.create_view(&wgpu::TextureViewDescriptor::default());
    let (sw, sh) = renderer.dimensions();
    let (sw, sh) = (sw as f32, sh as f32);

    match scene.mode {
        ViewMode::Lit | ViewMode::Relief => {
            renderer.render_moon(&mut encoder, &view, mesh, scene.mode.shading());
        }
        ViewMode::Mosaic => {
            // Blocks on the GPU: render offscreen, read back, average.
            let cells = renderer.read_scene(mesh, scene.mode.shading(), |pixels| {
                mosaic(pixels, scene.mosaic_cell_size)
            })?;
            let mut batch = OverlayBatch::new(sw, sh, renderer.encoding());
            overlay::add_mosaic(&mut batch, &cells);
            renderer.render_overlay(&mut encoder, &view, &batch, true);
        }
    }

    if scene.slider_enabled && scene.hud_visible {
        let hud = overlay::build(scene, sw, sh, renderer.encoding());
        renderer.render_overlay(&mut encoder, &view, &hud, false);
    }

    renderer.end_frame(output, encoder);
    Ok(())
}
