//! Per-frame orchestration: audio in, visual state out.

pub mod cage;
pub mod color;
pub mod displace;
pub mod mesh;
pub mod noise;

pub use cage::CageParams;
pub use color::{ColorPair, Rgb};
pub use displace::SurfaceUniforms;
pub use mesh::Mesh;

use nannou::prelude::*;

use crate::audio::{self, BandEnergies, SpectrumFrame, SpectrumSampler};

/// Base color palette.
pub const VOID: u32 = 0x0d0414;
pub const MAGENTA: u32 = 0xff00ff;
pub const CYAN: u32 = 0x00ffff;
pub const LIME: u32 = 0xbaff00;

const ARTIFACT_RADIUS: f32 = 0.7;
const ARTIFACT_SUBDIVISIONS: u32 = 3;
const CAGE_RADIUS: f32 = 1.05;
const CAGE_SUBDIVISIONS: u32 = 2;

/// User-tunable visual parameters, owned by the [`FrameDriver`] and mutated
/// only through its `apply_*` setters. The frame loop reads this at the start
/// of each tick; UI handlers never touch per-frame state directly.
#[derive(Clone, Copy, Debug)]
pub struct ModulationState {
    pub gain: f32,
    pub reactivity: f32,
    pub deform_speed: f32,
    pub bloom_strength: f32,
    pub bloom_radius: f32,
    pub artifact_colors: ColorPair,
    pub cage_colors: ColorPair,
}

impl Default for ModulationState {
    fn default() -> Self {
        Self {
            gain: 1.0,
            reactivity: 1.0,
            deform_speed: 1.0,
            bloom_strength: 0.45,
            bloom_radius: 0.6,
            artifact_colors: ColorPair {
                a: LIME,
                b: 0x80e0ff,
            },
            cage_colors: ColorPair { a: MAGENTA, b: CYAN },
        }
    }
}

/// Screen-space post-effect intensities, recomputed every tick.
#[derive(Clone, Copy, Debug, Default)]
pub struct PostParams {
    /// Chromatic-aberration amount (the image tears on bass hits).
    pub rgb_shift: f32,
    /// Glow strength (brighter on bass hits).
    pub glow_strength: f32,
    pub glow_radius: f32,
}

/// The per-frame pipeline: sample spectrum, extract bands, then recompute
/// every modulated parameter and both deformed meshes.
///
/// Scheduling is external (the display refresh drives `tick`); the driver
/// itself has no idle state and keeps animating on time alone when the
/// audio goes silent.
pub struct FrameDriver {
    /// Seconds since start. Monotonic, never reset while running.
    elapsed: f32,
    state: ModulationState,

    sampler: SpectrumSampler,
    frame: SpectrumFrame,
    bands: BandEnergies,

    artifact: Mesh,
    cage: Mesh,

    artifact_scale: f32,
    cage_scale: f32,
    artifact_rotation: Vec3,
    cage_rotation: Vec3,
    particle_rotation: Vec3,

    uniforms: SurfaceUniforms,
    cage_color: Rgb,
    post: PostParams,
}

/// Artifact pulse scale for a bass energy: `1 + min(bass * 1.4, 1.8)`.
fn pulse_scale(bass: f32) -> f32 {
    1.0 + (bass * 1.4).min(1.8)
}

fn finite_or_zero(v: f32) -> f32 {
    if v.is_finite() {
        v
    } else {
        0.0
    }
}

impl FrameDriver {
    pub fn new(fft_size: usize, state: ModulationState) -> Self {
        let sampler = SpectrumSampler::new(fft_size);
        let frame = SpectrumFrame::new(sampler.bin_count());

        Self {
            elapsed: 0.0,
            state,
            sampler,
            frame,
            bands: BandEnergies::default(),
            artifact: Mesh::icosphere(ARTIFACT_RADIUS, ARTIFACT_SUBDIVISIONS),
            cage: Mesh::icosphere(CAGE_RADIUS, CAGE_SUBDIVISIONS),
            artifact_scale: 1.0,
            cage_scale: 1.0,
            artifact_rotation: Vec3::ZERO,
            cage_rotation: Vec3::ZERO,
            particle_rotation: Vec3::ZERO,
            uniforms: SurfaceUniforms::default(),
            cage_color: color::hex_to_rgb(MAGENTA),
            post: PostParams::default(),
        }
    }

    /// Advance one frame. `dt` is the wall-clock delta since the previous
    /// tick; `samples` is the best-available audio window (zeros when no
    /// source is active). Never fails and never blocks.
    pub fn tick(&mut self, dt: f32, samples: &[f32]) {
        self.elapsed += finite_or_zero(dt).max(0.0);

        // Audio analysis
        self.sampler.sample_into(samples, &mut self.frame);
        self.bands = audio::extract(&self.frame, self.state.gain, self.state.reactivity);
        let BandEnergies { bass, mid, treble } = self.bands;

        // Constant object rotation, spun up by the audio
        self.artifact_rotation.x += 0.0025;
        self.artifact_rotation.y += 0.0035;
        self.cage_rotation.x -= 0.0015;
        self.cage_rotation.y -= 0.0012;
        self.cage_rotation.z += treble * 0.02;
        self.particle_rotation.y += 0.0008;
        self.particle_rotation.x += mid * 0.007;

        // Artifact pulses with bass
        let scale = pulse_scale(bass);
        self.artifact_scale = scale;

        // Cage stays a little larger than the artifact, smoothed so it
        // trails the pulse instead of snapping
        let target_cage = (scale * 1.08).max(1.04 + treble * 0.12);
        let follow = (0.22 + treble * 0.25).clamp(0.0, 1.0);
        self.cage_scale += (target_cage - self.cage_scale) * follow;

        // Colors
        let (artifact_color, cage_color) = color::modulate(
            self.elapsed,
            bass,
            treble,
            mid,
            &self.state.artifact_colors,
            &self.state.cage_colors,
        );
        self.cage_color = cage_color;

        // Uniform set for the displacement stage
        self.uniforms = SurfaceUniforms {
            time: self.elapsed,
            bass,
            treble,
            mid,
            reactivity: self.state.reactivity,
            speed: self.state.deform_speed,
            color: artifact_color,
        };
        displace::displace_mesh(&mut self.artifact, &self.uniforms);

        // Cage deformation, intensified when the artifact outgrows it
        let overlap_boost = (scale - self.cage_scale).max(0.0);
        cage::deform(
            &mut self.cage,
            &CageParams {
                bass,
                mid,
                elapsed: self.elapsed,
                overlap_boost,
            },
        );

        // Post-effect intensities
        self.post = PostParams {
            rgb_shift: 0.0012 + bass * 0.003,
            glow_strength: self.state.bloom_strength + bass * 0.65,
            glow_radius: self.state.bloom_radius,
        };
    }

    // --- UI-facing mutation (applied between ticks) ---

    pub fn apply_gain(&mut self, gain: f32) {
        self.state.gain = gain.max(0.0);
    }

    pub fn apply_reactivity(&mut self, reactivity: f32) {
        self.state.reactivity = reactivity.max(0.0);
    }

    pub fn apply_deform_speed(&mut self, speed: f32) {
        self.state.deform_speed = speed;
    }

    pub fn apply_bloom(&mut self, strength: f32, radius: f32) {
        self.state.bloom_strength = strength.max(0.0);
        self.state.bloom_radius = radius.max(0.0);
    }

    pub fn apply_colors(&mut self, artifact: ColorPair, cage: ColorPair) {
        self.state.artifact_colors = artifact;
        self.state.cage_colors = cage;
    }

    /// Change spectrum resolution. Safe between ticks; the next tick works
    /// on a frame of the new length.
    pub fn set_resolution(&mut self, fft_size: usize) {
        self.sampler.set_resolution(fft_size);
    }

    // --- Read surface for the renderer and tests ---

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn state(&self) -> &ModulationState {
        &self.state
    }

    pub fn fft_size(&self) -> usize {
        self.sampler.fft_size()
    }

    pub fn spectrum(&self) -> &SpectrumFrame {
        &self.frame
    }

    pub fn bands(&self) -> BandEnergies {
        self.bands
    }

    pub fn uniforms(&self) -> &SurfaceUniforms {
        &self.uniforms
    }

    pub fn post(&self) -> PostParams {
        self.post
    }

    pub fn artifact(&self) -> &Mesh {
        &self.artifact
    }

    pub fn artifact_mut(&mut self) -> &mut Mesh {
        &mut self.artifact
    }

    pub fn cage(&self) -> &Mesh {
        &self.cage
    }

    pub fn cage_mut(&mut self) -> &mut Mesh {
        &mut self.cage
    }

    pub fn artifact_scale(&self) -> f32 {
        self.artifact_scale
    }

    pub fn cage_scale(&self) -> f32 {
        self.cage_scale
    }

    pub fn artifact_rotation(&self) -> Vec3 {
        self.artifact_rotation
    }

    pub fn cage_rotation(&self) -> Vec3 {
        self.cage_rotation
    }

    pub fn particle_rotation(&self) -> Vec3 {
        self.particle_rotation
    }

    pub fn cage_color(&self) -> Rgb {
        self.cage_color
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    fn silent_ticks(driver: &mut FrameDriver, n: usize) {
        let silence = vec![0.0; 1024];
        for _ in 0..n {
            driver.tick(DT, &silence);
        }
    }

    #[test]
    fn test_elapsed_time_is_monotonic() {
        let mut driver = FrameDriver::new(1024, ModulationState::default());
        let mut last = driver.elapsed();

        let silence = vec![0.0; 1024];
        for _ in 0..10 {
            driver.tick(DT, &silence);
            assert!(driver.elapsed() > last);
            last = driver.elapsed();
        }

        // Bad deltas advance by zero instead of corrupting the clock
        driver.tick(f32::NAN, &silence);
        assert_eq!(driver.elapsed(), last);
        driver.tick(-5.0, &silence);
        assert_eq!(driver.elapsed(), last);
    }

    #[test]
    fn test_silent_frame_idles_but_still_animates() {
        let mut driver = FrameDriver::new(1024, ModulationState::default());
        silent_ticks(&mut driver, 20);

        let bands = driver.bands();
        assert_eq!(bands.bass, 0.0);
        assert_eq!(bands.mid, 0.0);
        assert_eq!(bands.treble, 0.0);

        // No audio-driven pulse
        assert_eq!(driver.artifact_scale(), 1.0);

        // But the surface keeps moving on time alone
        let live_before = driver.artifact().live().to_vec();
        silent_ticks(&mut driver, 5);
        assert_ne!(live_before, driver.artifact().live());
    }

    #[test]
    fn test_full_spectrum_pulse_scale() {
        // bands = 1 * 1 * 1.35, pulse capped at 1.8 -> scale 2.8
        assert_eq!(pulse_scale(1.35), 2.8);
        assert_eq!(pulse_scale(0.0), 1.0);
        // Below the cap the scale follows bass linearly
        assert!((pulse_scale(0.5) - 1.7).abs() < 1e-6);
    }

    #[test]
    fn test_resolution_change_between_ticks() {
        let mut driver = FrameDriver::new(1024, ModulationState::default());
        silent_ticks(&mut driver, 1);
        assert_eq!(driver.spectrum().len(), 512);

        driver.set_resolution(512);
        silent_ticks(&mut driver, 1);
        assert_eq!(driver.spectrum().len(), 256);
    }

    #[test]
    fn test_meshes_marked_dirty_each_tick() {
        let mut driver = FrameDriver::new(1024, ModulationState::default());
        silent_ticks(&mut driver, 1);
        assert!(driver.artifact_mut().take_dirty());
        assert!(driver.cage_mut().take_dirty());
    }

    #[test]
    fn test_cage_scale_tracks_artifact() {
        let mut driver = FrameDriver::new(1024, ModulationState::default());
        silent_ticks(&mut driver, 200);

        // At rest the cage settles onto its silent target
        assert!((driver.cage_scale() - 1.08).abs() < 1e-3);
        assert!(driver.cage_scale() > driver.artifact_scale());
    }

    #[test]
    fn test_post_params_at_silence() {
        let mut driver = FrameDriver::new(1024, ModulationState::default());
        silent_ticks(&mut driver, 5);

        let post = driver.post();
        assert!((post.rgb_shift - 0.0012).abs() < 1e-7);
        assert!((post.glow_strength - 0.45).abs() < 1e-6);
    }

    #[test]
    fn test_apply_setters_feed_next_tick() {
        let mut driver = FrameDriver::new(1024, ModulationState::default());
        driver.apply_deform_speed(2.5);
        driver.apply_gain(3.0);
        driver.apply_reactivity(-1.0); // clamped

        silent_ticks(&mut driver, 1);
        assert_eq!(driver.uniforms().speed, 2.5);
        assert_eq!(driver.state().gain, 3.0);
        assert_eq!(driver.state().reactivity, 0.0);
    }
}
