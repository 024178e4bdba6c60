mod app;
mod audio;
mod fretboard;
mod generator;
mod note;
mod session;
mod tuning;
mod ui;

use clap::{Parser, Subcommand};

use note::PitchClass;
use session::Session;
use tuning::{Difficulty, Instrument};

#[derive(Parser)]
#[command(name = "fretquiz", about = "Terminal fretboard note trainer")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Interactive trainer: self-paced practice and a timed challenge
    Train {
        #[arg(long, value_enum, default_value_t = Instrument::Guitar)]
        instrument: Instrument,

        #[arg(long, value_enum, default_value_t = Difficulty::Beginner)]
        difficulty: Difficulty,

        /// Spell notes with flats instead of sharps
        #[arg(long)]
        flats: bool,

        /// Auto-play cycle length in seconds (2-10)
        #[arg(long, default_value_t = 5.0)]
        interval: f64,

        /// Metronome tempo (40-200 BPM)
        #[arg(long, default_value_t = 90)]
        bpm: u32,
    },

    /// List every fretboard position sounding a note
    Positions {
        /// Note name, e.g. A, C#, Bb
        note: String,

        #[arg(long, value_enum, default_value_t = Instrument::Guitar)]
        instrument: Instrument,

        #[arg(long, value_enum, default_value_t = Difficulty::Advanced)]
        difficulty: Difficulty,

        /// Spell positions with flats instead of sharps
        #[arg(long)]
        flats: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Command::Train {
            instrument,
            difficulty,
            flats,
            interval,
            bpm,
        } => {
            let session = Session::new(instrument, difficulty, !flats, interval, bpm);
            if let Err(e) = app::run(session) {
                eprintln!("trainer error: {}", e);
                std::process::exit(1);
            }
        }
        Command::Positions {
            note,
            instrument,
            difficulty,
            flats,
        } => {
            let target = PitchClass::from_name(&note).unwrap_or_else(|| {
                eprintln!("unknown note: {}", note);
                std::process::exit(1);
            });
            print_positions(target, instrument, difficulty, !flats);
        }
    }
}

fn print_positions(
    target: PitchClass,
    instrument: Instrument,
    difficulty: Difficulty,
    use_sharps: bool,
) {
    let tuning = instrument.tuning();
    let max_fret = difficulty.max_fret();
    let positions = fretboard::resolve(target, &tuning, max_fret);

    println!(
        "{} on {} ({}, frets 0-{}):",
        target.name(use_sharps),
        instrument.label(),
        tuning.name,
        max_fret
    );
    for pos in &positions {
        println!(
            "  string {} (open {:>2})  fret {:>2}",
            pos.string + 1,
            tuning.open(pos.string).name(use_sharps),
            pos.fret
        );
    }
    println!("{} position(s)", positions.len());
}
