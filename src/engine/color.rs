//! Time- and audio-driven color mixing.
//!
//! Blends each user-selected color pair by factors derived from elapsed time
//! and the band energies. Every factor is clamped before it is used as a
//! lerp parameter: the raw chaos/treble/bass sums can leave [0, 1] and an
//! unclamped lerp would produce out-of-range channels.

pub type Rgb = [f32; 3];

const WHITE: Rgb = [1.0, 1.0, 1.0];

/// A user-selected pair of colors, as 0xRRGGBB.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ColorPair {
    pub a: u32,
    pub b: u32,
}

/// Decode 0xRRGGBB to normalized channels.
pub fn hex_to_rgb(hex: u32) -> Rgb {
    [
        ((hex >> 16) & 0xff) as f32 / 255.0,
        ((hex >> 8) & 0xff) as f32 / 255.0,
        (hex & 0xff) as f32 / 255.0,
    ]
}

fn lerp_rgb(a: Rgb, b: Rgb, t: f32) -> Rgb {
    [
        a[0] + (b[0] - a[0]) * t,
        a[1] + (b[1] - a[1]) * t,
        a[2] + (b[2] - a[2]) * t,
    ]
}

fn finite_or_zero(v: f32) -> f32 {
    if v.is_finite() {
        v
    } else {
        0.0
    }
}

/// Final tints for the artifact and the cage this frame.
///
/// The cage reuses the artifact's mix coefficients over its own pair so the
/// two meshes stay visually coherent.
pub fn modulate(
    t: f32,
    bass: f32,
    treble: f32,
    mid: f32,
    primary: &ColorPair,
    secondary: &ColorPair,
) -> (Rgb, Rgb) {
    let t = finite_or_zero(t);
    let bass = finite_or_zero(bass);
    let treble = finite_or_zero(treble);
    let mid = finite_or_zero(mid);

    let chaos = ((t * 2.4).sin() + 1.0) * 0.5;
    let mix_a = (chaos * 0.5 + treble * 0.35 + bass * 0.15).clamp(0.0, 1.0);
    let mix_b = ((1.0 - chaos) * 0.4 + mid * 0.4 + treble * 0.2).clamp(0.0, 1.0);
    let swing = ((t * 1.3 + treble * 3.0).sin() + 1.0) * 0.5;

    let pa = hex_to_rgb(primary.a);
    let pb = hex_to_rgb(primary.b);
    let mixed = lerp_rgb(pa, pb, mix_a);
    let whitened = lerp_rgb(WHITE, mixed, mix_b * 0.7 + 0.3);
    let artifact = lerp_rgb(mixed, whitened, swing);

    let ca = hex_to_rgb(secondary.a);
    let cb = hex_to_rgb(secondary.b);
    let cage = lerp_rgb(lerp_rgb(ca, cb, mix_a), cb, swing);

    (artifact, cage)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PRIMARY: ColorPair = ColorPair {
        a: 0xbaff00,
        b: 0x80e0ff,
    };
    const SECONDARY: ColorPair = ColorPair {
        a: 0xff00ff,
        b: 0x00ffff,
    };

    fn assert_valid(color: Rgb) {
        for c in color {
            assert!(c.is_finite());
            assert!((0.0..=1.0).contains(&c), "channel {} out of range", c);
        }
    }

    #[test]
    fn test_channels_always_in_range() {
        // Sweep wildly out-of-range band energies and times
        for i in 0..200 {
            let t = (i as f32 - 100.0) * 7.31;
            let bass = (i as f32) * 0.11 - 4.0;
            let treble = (i as f32) * 0.07 - 2.0;
            let mid = (i as f32) * 0.05 - 1.0;

            let (artifact, cage) = modulate(t, bass, treble, mid, &PRIMARY, &SECONDARY);
            assert_valid(artifact);
            assert_valid(cage);
        }
    }

    #[test]
    fn test_non_finite_inputs_are_tolerated() {
        let (artifact, cage) = modulate(
            f32::NAN,
            f32::INFINITY,
            f32::NEG_INFINITY,
            f32::NAN,
            &PRIMARY,
            &SECONDARY,
        );
        assert_valid(artifact);
        assert_valid(cage);
    }

    #[test]
    fn test_hex_decode() {
        assert_eq!(hex_to_rgb(0xff0000), [1.0, 0.0, 0.0]);
        assert_eq!(hex_to_rgb(0x00ff00), [0.0, 1.0, 0.0]);
        assert_eq!(hex_to_rgb(0x0000ff), [0.0, 0.0, 1.0]);
        assert_eq!(hex_to_rgb(0x000000), [0.0, 0.0, 0.0]);
        assert_eq!(hex_to_rgb(0xffffff), [1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_colors_evolve_over_time() {
        let (early, _) = modulate(1.0, 0.2, 0.1, 0.3, &PRIMARY, &SECONDARY);
        let (late, _) = modulate(2.0, 0.2, 0.1, 0.3, &PRIMARY, &SECONDARY);
        assert_ne!(early, late);
    }
}
