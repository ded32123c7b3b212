//! Scene drawing: projection, wireframes, particles, post tinting.
//!
//! This layer only consumes what the engine computed for the frame (live
//! vertex buffers, colors, scales, post intensities) and maps it onto the
//! nannou canvas through a fixed camera. No visual state is decided here.

use nannou::prelude::*;
use rand::Rng;

use crate::engine::{color, FrameDriver, Mesh, Rgb, LIME, MAGENTA, VOID};

/// Number of background particles
const NUM_PARTICLES: usize = if cfg!(debug_assertions) { 300 } else { 800 };

/// Camera position, looking at the origin.
const EYE: [f32; 3] = [0.0, 1.2, 4.2];

/// Vertical field of view in degrees.
const FOV_DEGREES: f32 = 60.0;

/// Nearest depth that still projects; anything closer is culled.
const NEAR: f32 = 0.1;

const NOTIFICATION_FRAMES: u32 = 180; // ~3 seconds at 60fps

struct Particle {
    position: Vec3,
    color: Rgb,
}

/// Fixed-camera scene renderer for the engine's per-frame output.
pub struct Scene {
    particles: Vec<Particle>,
    notification_text: Option<String>,
    notification_frames: u32,
}

/// Euler XYZ rotation, applied X then Y then Z.
fn rotate(p: Vec3, rotation: Vec3) -> Vec3 {
    let (sx, cx) = rotation.x.sin_cos();
    let (sy, cy) = rotation.y.sin_cos();
    let (sz, cz) = rotation.z.sin_cos();

    let p = vec3(p.x, p.y * cx - p.z * sx, p.y * sx + p.z * cx);
    let p = vec3(p.x * cy + p.z * sy, p.y, -p.x * sy + p.z * cy);
    vec3(p.x * cz - p.y * sz, p.x * sz + p.y * cz, p.z)
}

/// View basis and focal length for the fixed camera.
struct Camera {
    eye: Vec3,
    right: Vec3,
    up: Vec3,
    forward: Vec3,
    focal: f32,
}

impl Camera {
    fn new(bounds: Rect) -> Self {
        let eye = vec3(EYE[0], EYE[1], EYE[2]);
        let forward = (-eye).normalize();
        let right = forward.cross(vec3(0.0, 1.0, 0.0)).normalize();
        let up = right.cross(forward);
        let focal = (bounds.h() * 0.5) / (FOV_DEGREES.to_radians() * 0.5).tan();

        Self {
            eye,
            right,
            up,
            forward,
            focal,
        }
    }

    /// Project a world-space point to canvas coordinates plus depth.
    fn project(&self, p: Vec3) -> Option<(Point2, f32)> {
        let d = p - self.eye;
        let depth = d.dot(self.forward);
        if depth < NEAR {
            return None;
        }
        let x = d.dot(self.right) * self.focal / depth;
        let y = d.dot(self.up) * self.focal / depth;
        Some((pt2(x, y), depth))
    }
}

impl Scene {
    pub fn new() -> Self {
        let mut rng = rand::rng();

        // Particles on a loose spherical shell around the artifact,
        // flattened vertically, split between the two accent colors
        let particles = (0..NUM_PARTICLES)
            .map(|_| {
                let r = 3.0 + rng.random_range(0.0..2.5f32);
                let theta = rng.random_range(0.0..std::f32::consts::TAU);
                let phi = (rng.random_range(-1.0..1.0f32)).acos();

                let position = vec3(
                    r * phi.sin() * theta.cos(),
                    r * phi.cos() * 0.5,
                    r * phi.sin() * theta.sin(),
                );
                let hex = if rng.random_range(0.0..1.0) > 0.5 {
                    LIME
                } else {
                    MAGENTA
                };

                Particle {
                    position,
                    color: color::hex_to_rgb(hex),
                }
            })
            .collect();

        Self {
            particles,
            notification_text: None,
            notification_frames: 0,
        }
    }

    /// Shows a status message for 3 seconds
    pub fn show_notification(&mut self, text: String) {
        self.notification_text = Some(text);
        self.notification_frames = NOTIFICATION_FRAMES;
    }

    /// Per-frame bookkeeping for overlays; called once per update.
    pub fn update(&mut self) {
        if self.notification_frames > 0 {
            self.notification_frames -= 1;
            if self.notification_frames == 0 {
                self.notification_text = None;
            }
        }
    }

    pub fn draw(&self, draw: &Draw, bounds: Rect, driver: &FrameDriver) {
        let [br, bg, bb] = color::hex_to_rgb(VOID);
        draw.background().color(rgb(br, bg, bb));

        let camera = Camera::new(bounds);

        self.draw_grid(draw, &camera);
        self.draw_particles(draw, &camera, driver);

        let post = driver.post();
        let glow = post.glow_strength;

        // Cage first so the artifact reads on top of it
        let cage_color = driver.cage_color();
        Self::draw_wireframe(
            draw,
            &camera,
            driver.cage(),
            driver.cage_scale(),
            driver.cage_rotation(),
            cage_color,
            0.4,
            1.0,
        );

        // Chromatic aberration: red/blue copies of the artifact offset
        // horizontally by the rgb-shift amount
        let artifact_color = driver.uniforms().color;
        let shift = post.rgb_shift * bounds.w();
        for (channel_color, dx) in [
            ([artifact_color[0], 0.0, 0.0], -shift),
            ([0.0, 0.0, artifact_color[2]], shift),
        ] {
            Self::draw_wireframe_offset(
                draw,
                &camera,
                driver.artifact(),
                driver.artifact_scale(),
                driver.artifact_rotation(),
                channel_color,
                0.18,
                1.0,
                dx,
            );
        }

        // Glow pass: wide faint strokes under the crisp wireframe
        Self::draw_wireframe(
            draw,
            &camera,
            driver.artifact(),
            driver.artifact_scale(),
            driver.artifact_rotation(),
            artifact_color,
            (0.10 * glow).min(1.0),
            2.5 + driver.post().glow_radius * 2.0,
        );
        Self::draw_wireframe(
            draw,
            &camera,
            driver.artifact(),
            driver.artifact_scale(),
            driver.artifact_rotation(),
            artifact_color,
            0.32,
            1.0,
        );

        if let Some(ref text) = self.notification_text {
            let alpha = (self.notification_frames as f32 / NOTIFICATION_FRAMES as f32).min(1.0);
            draw.text(text)
                .x_y(0.0, bounds.top() - 30.0)
                .color(rgba(1.0, 1.0, 1.0, alpha))
                .font_size(24);
        }
    }

    fn draw_wireframe(
        draw: &Draw,
        camera: &Camera,
        mesh: &Mesh,
        scale: f32,
        rotation: Vec3,
        color: Rgb,
        alpha: f32,
        weight: f32,
    ) {
        Self::draw_wireframe_offset(draw, camera, mesh, scale, rotation, color, alpha, weight, 0.0);
    }

    #[allow(clippy::too_many_arguments)]
    fn draw_wireframe_offset(
        draw: &Draw,
        camera: &Camera,
        mesh: &Mesh,
        scale: f32,
        rotation: Vec3,
        color: Rgb,
        alpha: f32,
        weight: f32,
        dx: f32,
    ) {
        let live = mesh.live();
        let tint = rgba(color[0], color[1], color[2], alpha);

        for &(a, b) in mesh.edges() {
            let pa = rotate(live[a as usize] * scale, rotation);
            let pb = rotate(live[b as usize] * scale, rotation);

            if let (Some((sa, _)), Some((sb, _))) = (camera.project(pa), camera.project(pb)) {
                draw.line()
                    .start(pt2(sa.x + dx, sa.y))
                    .end(pt2(sb.x + dx, sb.y))
                    .weight(weight)
                    .color(tint);
            }
        }
    }

    fn draw_particles(&self, draw: &Draw, camera: &Camera, driver: &FrameDriver) {
        let rotation = driver.particle_rotation();

        for particle in &self.particles {
            let p = rotate(particle.position, rotation);
            if let Some((screen, depth)) = camera.project(p) {
                // 0.04 world units, perspective-correct
                let diameter = 0.04 * camera.focal / depth;
                let [r, g, b] = particle.color;
                draw.ellipse()
                    .xy(screen)
                    .w_h(diameter, diameter)
                    .color(rgba(r, g, b, 0.9));
            }
        }
    }

    fn draw_grid(&self, draw: &Draw, camera: &Camera) {
        const HALF: f32 = 20.0;
        const STEP: f32 = 4.0; // 40 units / 10 segments
        const Y: f32 = -3.0;

        let [r, g, b] = color::hex_to_rgb(VOID);
        let tint = rgba(r + 0.08, g + 0.08, b + 0.10, 0.15);

        let line = |from: Vec3, to: Vec3| {
            if let (Some((a, _)), Some((bp, _))) = (camera.project(from), camera.project(to)) {
                draw.line().start(a).end(bp).weight(1.0).color(tint);
            }
        };

        let mut k = -HALF;
        while k <= HALF {
            line(vec3(k, Y, -HALF), vec3(k, Y, HALF));
            line(vec3(-HALF, Y, k), vec3(HALF, Y, k));
            k += STEP;
        }
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_scene_is_ready_to_draw() {
        let scene = Scene::default();
        assert_eq!(scene.particles.len(), NUM_PARTICLES);
        assert!(scene.notification_text.is_none());
    }

    #[test]
    fn test_projection_centers_the_origin() {
        let bounds = Rect::from_w_h(1280.0, 720.0);
        let camera = Camera::new(bounds);

        let (screen, depth) = camera.project(vec3(0.0, 0.0, 0.0)).unwrap();
        // The camera looks straight at the origin
        assert!(screen.x.abs() < 1e-3);
        assert!(screen.y.abs() < 1e-3);
        assert!(depth > 0.0);
    }

    #[test]
    fn test_points_behind_camera_are_culled() {
        let bounds = Rect::from_w_h(800.0, 600.0);
        let camera = Camera::new(bounds);

        // Far behind the eye along the view direction
        assert!(camera.project(vec3(0.0, 3.0, 12.0)).is_none());
    }

    #[test]
    fn test_rotation_preserves_length() {
        let p = vec3(1.0, 2.0, -0.5);
        let rotated = rotate(p, vec3(0.3, -1.2, 2.2));
        assert!((rotated.length() - p.length()).abs() < 1e-4);
    }

    #[test]
    fn test_zero_rotation_is_identity() {
        let p = vec3(0.7, -0.3, 1.9);
        let same = rotate(p, Vec3::ZERO);
        assert!((same - p).length() < 1e-6);
    }
}
