//! Locating a pitch class on the fretboard.

use crate::note::PitchClass;
use crate::tuning::Tuning;

/// One (string, fret) location and the pitch it sounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FretPosition {
    /// 0-based index into the tuning, 0 = lowest string.
    pub string: usize,
    pub fret: u8,
    pub pitch: PitchClass,
}

impl FretPosition {
    /// Whether this position sounds the currently quizzed target.
    /// Derived on demand, never stored, so it can't go stale.
    pub fn is_root(&self, target: PitchClass) -> bool {
        self.pitch == target
    }

    /// Spelled name under the given preference.
    pub fn name(&self, use_sharps: bool) -> &'static str {
        self.pitch.name(use_sharps)
    }
}

/// Pitch sounding at a given string and fret.
pub fn note_at(tuning: &Tuning, string: usize, fret: u8) -> PitchClass {
    tuning.open(string).transpose(fret)
}

/// Every location of `target` within `0..=max_fret`, string-major then
/// fret-minor. Complete and duplicate-free over that range; the ordering is
/// part of the contract.
pub fn resolve(target: PitchClass, tuning: &Tuning, max_fret: u8) -> Vec<FretPosition> {
    let mut positions = Vec::new();
    for string in 0..tuning.string_count() {
        for fret in 0..=max_fret {
            let pitch = tuning.open(string).transpose(fret);
            if pitch == target {
                positions.push(FretPosition {
                    string,
                    fret,
                    pitch,
                });
            }
        }
    }
    positions
}
