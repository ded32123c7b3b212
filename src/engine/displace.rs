//! Audio-driven surface displacement for the artifact mesh.
//!
//! Port of the blob vertex shader: every vertex is displaced along its
//! normal by layered gradient noise whose amplitude and spatial frequency
//! follow the band energies. Runs as a per-vertex map over the rest pose,
//! so a frame is a pure function of (rest pose, uniforms) and never feeds
//! back into itself.

use nannou::prelude::*;

use super::mesh::Mesh;
use super::noise::noise3;

/// The per-frame scalar/vector state pushed into the displacement stage.
/// Mirrors the shader uniform block: nothing here outlives the frame.
#[derive(Clone, Copy, Debug)]
pub struct SurfaceUniforms {
    pub time: f32,
    pub bass: f32,
    pub treble: f32,
    pub mid: f32,
    pub reactivity: f32,
    pub speed: f32,
    pub color: [f32; 3],
}

impl Default for SurfaceUniforms {
    fn default() -> Self {
        Self {
            time: 0.0,
            bass: 0.0,
            treble: 0.0,
            mid: 0.0,
            reactivity: 1.0,
            speed: 1.0,
            color: [0.0, 1.0, 1.0],
        }
    }
}

/// Non-finite uniform values would corrupt the mesh for every later frame
/// (there is no self-healing pass), so they degrade to 0 instead.
fn finite_or_zero(v: f32) -> f32 {
    if v.is_finite() {
        v
    } else {
        0.0
    }
}

impl SurfaceUniforms {
    fn sanitized(&self) -> Self {
        Self {
            time: finite_or_zero(self.time),
            bass: finite_or_zero(self.bass),
            treble: finite_or_zero(self.treble),
            mid: finite_or_zero(self.mid),
            reactivity: finite_or_zero(self.reactivity).max(0.0),
            speed: finite_or_zero(self.speed),
            color: self.color,
        }
    }
}

/// Displace a single vertex along its normal. Deterministic for identical
/// inputs; the noise layering is what keeps the motion non-periodic.
pub fn displace_vertex(position: Vec3, normal: Vec3, u: &SurfaceUniforms) -> Vec3 {
    let t = u.time * u.speed;

    let bass = u.bass * u.reactivity;
    let treble = u.treble * u.reactivity;
    let mid = u.mid * u.reactivity;

    let amp = 0.25 + bass * 0.9 + treble * 0.65;
    let freq = 3.4 + treble * 2.0 + mid * 1.3;

    // Warp the sample position before the noise lookup: the field itself
    // flows instead of rippling in place
    let warp = vec3(
        (t * 1.1).sin() * 0.85,
        (t * 0.85).cos() * 0.85,
        (t * 1.4).sin() * 0.85,
    );
    let p = position * freq + warp;

    // Three noise layers drifting on different axes and rates
    let n1 = noise3(p + vec3(t * 0.9, t * 0.7, t * 0.8));
    let n2 = noise3(p * 1.9 - vec3(t * 1.05, t * 0.6, t * 0.85));
    let n3 = noise3(p * 3.6 + vec3(t * 0.5, -t * 0.75, t * 0.4));
    let n = n1 * 0.5 + n2 * 0.35 + n3 * 0.15;

    let displacement = amp * (0.3 + n);
    position + normal * displacement
}

/// Apply the displacement map over the whole mesh, rest pose in, live
/// buffer out. The GPU would run this once per vertex in parallel; at a few
/// hundred vertices a sequential map is cheaper than farming it out.
pub fn displace_mesh(mesh: &mut Mesh, uniforms: &SurfaceUniforms) {
    let u = uniforms.sanitized();
    mesh.map_rest_to_live(|_, position, normal| displace_vertex(position, normal, &u));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_displacement_is_deterministic() {
        let u = SurfaceUniforms {
            time: 12.75,
            bass: 0.8,
            treble: 0.3,
            mid: 0.5,
            reactivity: 1.2,
            speed: 1.0,
            color: [1.0, 0.0, 1.0],
        };
        let pos = vec3(0.7, 0.0, 0.0);
        let normal = vec3(1.0, 0.0, 0.0);

        let first = displace_vertex(pos, normal, &u);
        for _ in 0..10 {
            let again = displace_vertex(pos, normal, &u);
            assert_eq!(first.x.to_bits(), again.x.to_bits());
            assert_eq!(first.y.to_bits(), again.y.to_bits());
            assert_eq!(first.z.to_bits(), again.z.to_bits());
        }
    }

    #[test]
    fn test_silent_amplitude_is_baseline() {
        // With zero band energies displacement magnitude is 0.25 * (0.3 + n),
        // bounded by the noise range; the surface still time-animates.
        let u = SurfaceUniforms {
            time: 3.0,
            ..Default::default()
        };
        let pos = vec3(0.0, 0.7, 0.0);
        let normal = vec3(0.0, 1.0, 0.0);

        let displaced = displace_vertex(pos, normal, &u);
        let magnitude = (displaced - pos).length();
        assert!(magnitude <= 0.25 * (0.3 + 2.0));

        // Different time, different surface
        let later = displace_vertex(
            pos,
            normal,
            &SurfaceUniforms {
                time: 4.0,
                ..Default::default()
            },
        );
        assert_ne!(displaced, later);
    }

    #[test]
    fn test_nan_uniforms_do_not_corrupt_mesh() {
        let mut mesh = Mesh::icosphere(0.7, 1);
        let u = SurfaceUniforms {
            time: f32::NAN,
            bass: f32::INFINITY,
            treble: f32::NAN,
            mid: -f32::NAN,
            reactivity: -3.0,
            speed: f32::NAN,
            color: [0.0; 3],
        };

        displace_mesh(&mut mesh, &u);
        for v in mesh.live() {
            assert!(v.x.is_finite() && v.y.is_finite() && v.z.is_finite());
        }
    }

    #[test]
    fn test_displace_mesh_leaves_rest_untouched() {
        let mut mesh = Mesh::icosphere(0.7, 1);
        let rest_before = mesh.rest().to_vec();

        let u = SurfaceUniforms {
            time: 5.0,
            bass: 1.0,
            ..Default::default()
        };
        displace_mesh(&mut mesh, &u);

        assert_eq!(rest_before, mesh.rest());
        assert!(mesh.take_dirty());
        // And the live buffer actually moved
        assert_ne!(mesh.rest(), mesh.live());
    }
}
