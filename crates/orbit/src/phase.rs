//! Phase value handling: clamping, angle mapping, naming.

use std::f32::consts::{PI, TAU};
use std::fmt;

/// Smallest phase value (new moon).
pub const PHASE_MIN: f32 = 0.0;
/// Largest phase value; one full synodic cycle, back to new moon.
pub const PHASE_MAX: f32 = 30.0;
/// Phase used when no slider is available.
pub const DEFAULT_PHASE: f32 = 15.0;

/// Clamp a raw phase into `[PHASE_MIN, PHASE_MAX]`. NaN maps to `PHASE_MIN`.
pub fn clamp_phase(phase: f32) -> f32 {
    if phase.is_nan() {
        return PHASE_MIN;
    }
    phase.clamp(PHASE_MIN, PHASE_MAX)
}

/// Elongation of the moon from the sun as seen from the camera, in `[0, 2π]`.
///
/// 0 at new moon, π at full moon.
pub fn elongation(phase: f32) -> f32 {
    clamp_phase(phase) / PHASE_MAX * TAU
}

/// Angle added to the sun azimuth to place the moon, normalized into `[0, 2π)`.
///
/// The half-turn puts the moon between camera and sun at phase 0.
pub fn phase_offset(phase: f32) -> f32 {
    (elongation(phase) + PI).rem_euclid(TAU)
}

/// Fraction of the visible disk that is lit: `(1 - cos e) / 2`.
pub fn illuminated_fraction(phase: f32) -> f32 {
    (1.0 - elongation(phase).cos()) * 0.5
}

/// The eight conventional names of the lunar cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseName {
    New,
    WaxingCrescent,
    FirstQuarter,
    WaxingGibbous,
    Full,
    WaningGibbous,
    LastQuarter,
    WaningCrescent,
}

impl PhaseName {
    const ORDER: [PhaseName; 8] = [
        PhaseName::New,
        PhaseName::WaxingCrescent,
        PhaseName::FirstQuarter,
        PhaseName::WaxingGibbous,
        PhaseName::Full,
        PhaseName::WaningGibbous,
        PhaseName::LastQuarter,
        PhaseName::WaningCrescent,
    ];

    /// Name of the phase bucket nearest to `phase`.
    pub fn from_phase(phase: f32) -> Self {
        let bucket = PHASE_MAX / Self::ORDER.len() as f32;
        let index = (clamp_phase(phase) / bucket).round() as usize % Self::ORDER.len();
        Self::ORDER[index]
    }

    pub fn label(self) -> &'static str {
        match self {
            PhaseName::New => "New Moon",
            PhaseName::WaxingCrescent => "Waxing Crescent",
            PhaseName::FirstQuarter => "First Quarter",
            PhaseName::WaxingGibbous => "Waxing Gibbous",
            PhaseName::Full => "Full Moon",
            PhaseName::WaningGibbous => "Waning Gibbous",
            PhaseName::LastQuarter => "Last Quarter",
            PhaseName::WaningCrescent => "Waning Crescent",
        }
    }
}

impl fmt::Display for PhaseName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn angle_eq(a: f32, b: f32) -> bool {
        let d = (a - b).rem_euclid(TAU);
        d < 1e-4 || TAU - d < 1e-4
    }

    #[test]
    fn start_and_end_of_cycle_are_both_new_moon() {
        assert!(angle_eq(phase_offset(0.0), phase_offset(30.0)));
        assert!(angle_eq(phase_offset(0.0), PI));
    }

    #[test]
    fn offset_is_monotonic_until_full_moon_then_wraps() {
        let mut prev = phase_offset(0.0);
        let mut p = 0.1;
        while p < 15.0 - 0.05 {
            let cur = phase_offset(p);
            assert!(cur >= prev, "offset decreased at phase {p}: {prev} -> {cur}");
            prev = cur;
            p += 0.1;
        }
        assert!(phase_offset(15.0) < prev, "offset should wrap at full moon");
        assert!(phase_offset(15.5) > phase_offset(15.0));
    }

    #[test]
    fn out_of_range_phase_is_clamped() {
        assert_eq!(clamp_phase(-4.0), 0.0);
        assert_eq!(clamp_phase(31.5), 30.0);
        assert_eq!(clamp_phase(f32::NAN), 0.0);
        assert!(angle_eq(phase_offset(-100.0), phase_offset(0.0)));
        assert!(angle_eq(phase_offset(1000.0), phase_offset(30.0)));
    }

    #[test]
    fn illuminated_fraction_spans_new_to_full() {
        assert!(illuminated_fraction(0.0).abs() < 1e-6);
        assert!((illuminated_fraction(15.0) - 1.0).abs() < 1e-6);
        assert!((illuminated_fraction(7.5) - 0.5).abs() < 1e-5);
        assert!((illuminated_fraction(22.5) - 0.5).abs() < 1e-5);
        assert!(illuminated_fraction(30.0).abs() < 1e-6);
    }

    #[test]
    fn phase_names_at_quarter_points() {
        assert_eq!(PhaseName::from_phase(0.0), PhaseName::New);
        assert_eq!(PhaseName::from_phase(7.5), PhaseName::FirstQuarter);
        assert_eq!(PhaseName::from_phase(15.0), PhaseName::Full);
        assert_eq!(PhaseName::from_phase(22.5), PhaseName::LastQuarter);
        assert_eq!(PhaseName::from_phase(29.5), PhaseName::New);
        assert_eq!(PhaseName::from_phase(4.0), PhaseName::WaxingCrescent);
        assert_eq!(PhaseName::Full.to_string(), "Full Moon");
    }
}
