//! Oscillatory deformation of the cage mesh.
//!
//! Per-vertex sinusoidal offsets blended against the rest pose by a fixed
//! shape-retention factor. The offset is re-derived from rest every frame,
//! never accumulated, so the cage always springs back instead of drifting.

use nannou::prelude::*;

use super::mesh::Mesh;

/// Fraction of the rest pose retained each frame.
pub const KEEP_SHAPE: f32 = 0.86;

/// Inputs to one cage deformation pass.
#[derive(Clone, Copy, Debug, Default)]
pub struct CageParams {
    pub bass: f32,
    pub mid: f32,
    /// Elapsed time in seconds; the cage runs on its own 1.05x clock.
    pub elapsed: f32,
    /// How far the artifact currently outgrows the cage (0 when contained).
    /// Couples the two meshes: the cage shudders hardest when threatened.
    pub overlap_boost: f32,
}

fn finite_or_zero(v: f32) -> f32 {
    if v.is_finite() {
        v
    } else {
        0.0
    }
}

/// Deformation strength for the current frame.
pub fn deform_strength(p: &CageParams) -> f32 {
    0.025 * finite_or_zero(p.bass)
        + 0.012 * finite_or_zero(p.mid)
        + finite_or_zero(p.overlap_boost).max(0.0) * 0.15
}

/// Run one deformation pass: rest pose in, live buffer out.
pub fn deform(mesh: &mut Mesh, params: &CageParams) {
    let deform = deform_strength(params);
    let t = finite_or_zero(params.elapsed) * 1.05;

    mesh.map_rest_to_live(|i, rest, _| {
        let i = i as f32;
        let n = (i * 0.93 + t * 1.2).sin() + (i * 1.11 + t * 0.95).cos();
        // Equivalent to (rest + offset) * (1 - keep) + rest * keep, written
        // so a zero offset reproduces rest bit-for-bit
        let offset = n * deform * (1.0 - KEEP_SHAPE);
        rest + Vec3::splat(offset)
    });
}
