//! Snapshot renderer
//!
//! Opens a small three-d window, renders the normalized points as instanced
//! spheres from the recentered camera pose, and saves the frame as a PNG.

use anyhow::Context as _;
use std::path::Path;
use three_d::*;
use tracing::{error, info};

use crate::camera::CameraPose;
use crate::color::HexColor;
use crate::normalize::NormalizedPoint;

/// Sphere radius in scene units
const SPHERE_RADIUS: f32 = 0.01;

pub struct SnapshotSettings {
    pub size: u32,
    pub fov_degrees: f64,
    pub background: HexColor,
}

/// Render `points` as seen from `pose` and write a PNG to `output`
pub fn render_png(
    points: &[NormalizedPoint],
    pose: CameraPose,
    settings: SnapshotSettings,
    output: &Path,
) -> anyhow::Result<()> {
    let size = settings.size;
    let window = Window::new(WindowSettings {
        title: "Geo Scatter - Snapshot".to_string(),
        max_size: Some((size, size)),
        min_size: (size, size),
        ..Default::default()
    })?;

    let context = window.gl();

    let mut camera = Camera::new_perspective(
        Viewport {
            x: 0,
            y: 0,
            width: size,
            height: size,
        },
        to_vec3(pose.position),
        to_vec3(pose.look_at),
        vec3(0.0, 1.0, 0.0),
        degrees(settings.fov_degrees as f32),
        0.01,
        100.0,
    );

    let instances = build_instances(points);
    let spheres = if instances.transformations.is_empty() {
        None
    } else {
        Some(Gm::new(
            InstancedMesh::new(&context, &instances, &CpuMesh::sphere(16)),
            ColorMaterial::default(),
        ))
    };

    let bg = settings.background.rgb().map(|c| c as f32 / 255.0);
    let output = output.to_path_buf();
    let count = points.len();

    window.render_loop(move |frame_input| {
        camera.set_viewport(frame_input.viewport);

        frame_input
            .screen()
            .clear(ClearState::color_and_depth(bg[0], bg[1], bg[2], 1.0, 1.0));
        if let Some(spheres) = &spheres {
            spheres.render(&camera, &[]);
        }

        // The render loop never returns, so a failed save has to end the process here
        let vp = frame_input.viewport;
        let pixels: Vec<[u8; 4]> = frame_input.screen().read_color();
        match save_frame(&pixels, vp.width, vp.height, &output) {
            Ok(()) => {
                info!("Saved snapshot of {} points to {}", count, output.display());
                println!("Saved {}", output.display());
            }
            Err(e) => {
                error!("Snapshot failed: {:#}", e);
                eprintln!("Error: {:#}", e);
                std::process::exit(1);
            }
        }

        FrameOutput {
            exit: true,
            ..Default::default()
        }
    });

    Ok(())
}

/// Write captured RGBA pixels to `output` as a PNG
fn save_frame(pixels: &[[u8; 4]], width: u32, height: u32, output: &Path) -> anyhow::Result<()> {
    let flat: Vec<u8> = pixels.iter().flat_map(|p| p.iter().copied()).collect();
    let img = image::RgbaImage::from_raw(width, height, flat).ok_or_else(|| {
        anyhow::anyhow!(
            "Captured {} pixels, viewport is {}x{}",
            pixels.len(),
            width,
            height
        )
    })?;
    img.save(output)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    Ok(())
}

fn build_instances(points: &[NormalizedPoint]) -> Instances {
    let transformations = points
        .iter()
        .map(|p| Mat4::from_translation(to_vec3(p.position)) * Mat4::from_scale(SPHERE_RADIUS))
        .collect();
    let colors = points.iter().map(|p| srgba(p.color)).collect();

    Instances {
        transformations,
        colors: Some(colors),
        ..Default::default()
    }
}

fn to_vec3(p: [f64; 3]) -> Vec3 {
    vec3(p[0] as f32, p[1] as f32, p[2] as f32)
}

fn srgba(c: HexColor) -> Srgba {
    let [r, g, b] = c.rgb();
    Srgba::new(r, g, b, 255)
}
