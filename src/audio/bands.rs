//! Bass / mid / treble band extraction.
//!
//! Reduces a spectrum frame to three scalar energies. The low end gets a
//! fixed 10-bin slice rather than a proportional one: bass drives most of the
//! visuals, so it keeps full per-bin resolution at every FFT size.

use super::spectrum::SpectrumFrame;

/// Fixed multiplier on every band, amplifying perceived responsiveness.
pub const REACTIVITY_BOOST: f32 = 1.35;

/// Number of bins in the bass slice (absolute, not proportional).
const BASS_BINS: usize = 10;

/// Per-frame band energies, roughly [0, 1] before gain/reactivity scaling.
/// High gain can push these past 1 on purpose; nothing here clamps.
#[derive(Clone, Copy, Debug, Default)]
pub struct BandEnergies {
    pub bass: f32,
    pub mid: f32,
    pub treble: f32,
}

/// The three contiguous bin ranges for a frame of `n` bins:
/// bass `[0, 10)`, mid `[10, n/2)`, treble `[3n/4, n)`.
pub fn partitions(n: usize) -> [(usize, usize); 3] {
    [
        (0, BASS_BINS.min(n)),
        (BASS_BINS.min(n / 2), n / 2),
        (n * 3 / 4, n),
    ]
}

fn mean(bins: &[u8]) -> f32 {
    if bins.is_empty() {
        return 0.0;
    }
    bins.iter().map(|&b| b as u32).sum::<u32>() as f32 / bins.len() as f32
}

/// Sanitize a user-tunable multiplier: non-finite or negative degrades to 0
/// so a bad slider value can never push NaN into the deformation stage.
fn sane(factor: f32) -> f32 {
    if factor.is_finite() {
        factor.max(0.0)
    } else {
        0.0
    }
}

/// Reduce `frame` to band energies, scaled by `gain * reactivity * 1.35`.
pub fn extract(frame: &SpectrumFrame, gain: f32, reactivity: f32) -> BandEnergies {
    let bins = frame.bins();
    let scale = sane(gain) * sane(reactivity) * REACTIVITY_BOOST;

    let [bass_range, mid_range, treble_range] = partitions(bins.len());
    let energy = |(lo, hi): (usize, usize)| mean(&bins[lo..hi]) / 255.0 * scale;

    BandEnergies {
        bass: energy(bass_range),
        mid: energy(mid_range),
        treble: energy(treble_range),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame_of(value: u8, bins: usize) -> SpectrumFrame {
        SpectrumFrame::filled(value, bins)
    }

    #[test]
    fn test_partitions_valid_for_all_resolutions() {
        for n in [32, 64, 128, 256, 512, 1024] {
            let [bass, mid, treble] = partitions(n);

            // Non-empty
            assert!(bass.1 > bass.0, "empty bass at n={}", n);
            assert!(mid.1 > mid.0, "empty mid at n={}", n);
            assert!(treble.1 > treble.0, "empty treble at n={}", n);

            // Non-overlapping and within bounds
            assert!(bass.1 <= mid.0);
            assert!(mid.1 <= treble.0);
            assert!(treble.1 <= n);
        }
    }

    #[test]
    fn test_zero_frame_gives_zero_energies() {
        let frame = SpectrumFrame::new(512);
        let bands = extract(&frame, 1.0, 1.0);
        assert_eq!(bands.bass, 0.0);
        assert_eq!(bands.mid, 0.0);
        assert_eq!(bands.treble, 0.0);
    }

    #[test]
    fn test_full_frame_hits_reactivity_boost() {
        let frame = frame_of(255, 512);
        let bands = extract(&frame, 1.0, 1.0);
        assert!((bands.bass - REACTIVITY_BOOST).abs() < 1e-5);
        assert!((bands.mid - REACTIVITY_BOOST).abs() < 1e-5);
        assert!((bands.treble - REACTIVITY_BOOST).abs() < 1e-5);
    }

    #[test]
    fn test_monotonic_in_gain() {
        let frame = frame_of(128, 256);
        let low = extract(&frame, 1.0, 1.0);
        let high = extract(&frame, 2.0, 1.0);
        assert!(high.bass > low.bass);
        assert!(high.mid > low.mid);
        assert!(high.treble > low.treble);

        // At zero input the scalars hold at zero instead of increasing
        let silent = SpectrumFrame::new(256);
        assert_eq!(extract(&silent, 5.0, 1.0).bass, 0.0);
    }

    #[test]
    fn test_bad_multipliers_degrade_to_zero() {
        let frame = frame_of(200, 128);
        assert_eq!(extract(&frame, f32::NAN, 1.0).bass, 0.0);
        assert_eq!(extract(&frame, 1.0, f32::NEG_INFINITY).mid, 0.0);
        assert_eq!(extract(&frame, -2.0, 1.0).treble, 0.0);
    }
}
