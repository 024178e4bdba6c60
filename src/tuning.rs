//! Instruments, standard tunings, and difficulty tiers.

use clap::ValueEnum;

use crate::note::PitchClass;

/// Highest fret the board can display.
pub const FRET_COUNT: u8 = 15;

/// Supported instruments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Instrument {
    Guitar,
    Bass,
}

impl Instrument {
    /// Standard tuning for this instrument.
    pub fn tuning(self) -> Tuning {
        match self {
            Instrument::Guitar => Tuning::from_names("Standard E", &["E", "A", "D", "G", "B", "E"]),
            Instrument::Bass => Tuning::from_names("Standard E", &["E", "A", "D", "G"]),
        }
    }

    /// The other instrument (used by the in-app toggle).
    pub fn toggled(self) -> Instrument {
        match self {
            Instrument::Guitar => Instrument::Bass,
            Instrument::Bass => Instrument::Guitar,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Instrument::Guitar => "Guitar",
            Instrument::Bass => "Bass",
        }
    }
}

/// Difficulty tier, bounding how far up the neck targets can sit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

impl Difficulty {
    /// Highest fret included in the answer space for this tier.
    pub fn max_fret(self) -> u8 {
        match self {
            Difficulty::Beginner => 3,
            Difficulty::Intermediate => 12,
            Difficulty::Advanced => FRET_COUNT,
        }
    }

    /// Next tier in the in-app cycle, wrapping back to Beginner.
    pub fn cycled(self) -> Difficulty {
        match self {
            Difficulty::Beginner => Difficulty::Intermediate,
            Difficulty::Intermediate => Difficulty::Advanced,
            Difficulty::Advanced => Difficulty::Beginner,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Difficulty::Beginner => "Beginner",
            Difficulty::Intermediate => "Intermediate",
            Difficulty::Advanced => "Advanced",
        }
    }
}

/// Open-string pitches of an instrument, index 0 = lowest-pitched string.
/// Replaced wholesale on instrument switch, never mutated in place.
#[derive(Debug, Clone)]
pub struct Tuning {
    pub name: &'static str,
    open: Vec<PitchClass>,
}

impl Tuning {
    /// Build from note names out of the fixed tables. Only called with names
    /// from the tables above; a miss is a typo there and fails loudly rather
    /// than silently dropping a string.
    fn from_names(name: &'static str, notes: &[&str]) -> Self {
        let open = notes
            .iter()
            .map(|&n| PitchClass::from_name(n))
            .collect::<Option<Vec<_>>>()
            .unwrap_or_else(|| panic!("tuning {} uses a name outside the note tables", name));
        Tuning { name, open }
    }

    /// Number of strings.
    pub fn string_count(&self) -> usize {
        self.open.len()
    }

    /// Open pitch of string `i` (0 = lowest).
    pub fn open(&self, i: usize) -> PitchClass {
        self.open[i]
    }

    /// Open pitches low to high.
    pub fn strings(&self) -> &[PitchClass] {
        &self.open
    }
}
