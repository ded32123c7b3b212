//! Deterministic 3D gradient noise.
//!
//! Hash-based value noise over unit lattice cells with smoothstep
//! interpolation. Pure function of its input: identical coordinates always
//! yield the identical scalar, which keeps the deformed surface stable
//! across frames for the same audio/time state.

use nannou::prelude::*;

fn fract(x: f32) -> f32 {
    x - x.floor()
}

fn mix(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Pseudo-random gradient for a lattice cell corner, in [-1, 1] per axis.
fn hash3(p: Vec3) -> Vec3 {
    let q = vec3(
        p.dot(vec3(127.1, 311.7, 74.7)),
        p.dot(vec3(269.5, 183.3, 246.1)),
        p.dot(vec3(113.5, 271.9, 124.6)),
    );
    vec3(
        -1.0 + 2.0 * fract(q.x.sin() * 43758.5453123),
        -1.0 + 2.0 * fract(q.y.sin() * 43758.5453123),
        -1.0 + 2.0 * fract(q.z.sin() * 43758.5453123),
    )
}

/// Smooth scalar noise field over 3D space, roughly in [-1, 1].
pub fn noise3(p: Vec3) -> f32 {
    let i = p.floor();
    let f = p - i;
    // Smoothstep weights: 3f^2 - 2f^3 per axis
    let u = f * f * (Vec3::splat(3.0) - 2.0 * f);

    let corner = |cx: f32, cy: f32, cz: f32| {
        let offset = vec3(cx, cy, cz);
        hash3(i + offset).dot(f - offset)
    };

    mix(
        mix(
            mix(corner(0.0, 0.0, 0.0), corner(1.0, 0.0, 0.0), u.x),
            mix(corner(0.0, 1.0, 0.0), corner(1.0, 1.0, 0.0), u.x),
            u.y,
        ),
        mix(
            mix(corner(0.0, 0.0, 1.0), corner(1.0, 0.0, 1.0), u.x),
            mix(corner(0.0, 1.0, 1.0), corner(1.0, 1.0, 1.0), u.x),
            u.y,
        ),
        u.z,
    )
}
