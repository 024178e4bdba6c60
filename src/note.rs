//! Pitch classes and their enharmonic spellings.

/// Note names spelled with sharps, indexed by semitone (C=0, B=11).
pub const NAMES_SHARP: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Note names spelled with flats, indexed by semitone.
pub const NAMES_FLAT: [&str; 12] = [
    "C", "Db", "D", "Eb", "E", "F", "Gb", "G", "Ab", "A", "Bb", "B",
];

/// A note identity modulo octave: one of 12 chromatic semitones (C=0, B=11).
///
/// Equality is always on the semitone; the sharp/flat spelling is a display
/// preference applied in `name`, never part of the identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PitchClass(u8);

impl PitchClass {
    /// Wrap an arbitrary semitone count into 0..=11.
    pub fn new(semitone: u8) -> Self {
        PitchClass(semitone % 12)
    }

    /// Look up a name in the sharp table, then the flat table.
    /// Returns `None` for anything that matches neither.
    pub fn from_name(name: &str) -> Option<Self> {
        NAMES_SHARP
            .iter()
            .position(|&n| n == name)
            .or_else(|| NAMES_FLAT.iter().position(|&n| n == name))
            .map(|i| PitchClass(i as u8))
    }

    /// Semitone index within an octave (C=0, B=11).
    pub fn semitone(self) -> u8 {
        self.0
    }

    /// Spelled name under the given preference.
    pub fn name(self, use_sharps: bool) -> &'static str {
        if use_sharps {
            NAMES_SHARP[self.0 as usize]
        } else {
            NAMES_FLAT[self.0 as usize]
        }
    }

    /// The pitch class sounding `semitones` frets above this one.
    pub fn transpose(self, semitones: u8) -> Self {
        PitchClass((self.0 + semitones % 12) % 12)
    }

    /// Reference-tone frequency in Hz, placed in the octave of middle C
    /// (A4 = 440 Hz equal temperament).
    pub fn to_freq(self) -> f64 {
        let midi = 60 + self.0 as i32;
        440.0 * 2.0_f64.powf((midi as f64 - 69.0) / 12.0)
    }

    /// All twelve pitch classes in semitone order.
    pub fn all() -> impl Iterator<Item = PitchClass> {
        (0..12).map(PitchClass)
    }
}
