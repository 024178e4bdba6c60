//! Terminal rendering of the session: target note, fretboard grid, status.

use crossterm::{
    cursor::MoveTo,
    queue,
    style::{Attribute, Color, Print, ResetColor, SetAttribute, SetForegroundColor},
    terminal::{self, ClearType},
};
use std::io::{Write, stdout};

use crate::session::{AnswerResult, Mode, Session};

/// Frets carrying an inlay marker on a real neck.
const INLAY_FRETS: [u8; 6] = [3, 5, 7, 9, 12, 15];

const CELL_WIDTH: usize = 4;

/// Redraw the whole screen. The board is small enough that a full repaint
/// per event-loop pass is cheaper than damage tracking.
pub fn draw(session: &Session, cursor: Option<(usize, u8)>) -> std::io::Result<()> {
    let mut out = stdout();
    queue!(out, terminal::Clear(ClearType::All), MoveTo(0, 0))?;

    draw_header(&mut out, session)?;
    draw_status(&mut out, session)?;
    draw_target(&mut out, session)?;

    let board_visible = session.mode() == Mode::Challenge || session.revealed();
    if board_visible {
        draw_board(&mut out, session, cursor)?;
    }
    draw_help(&mut out, session, board_visible)?;

    out.flush()
}

fn draw_header(out: &mut impl Write, session: &Session) -> std::io::Result<()> {
    let spelling = if session.use_sharps() { "sharps" } else { "flats" };
    queue!(
        out,
        MoveTo(0, 0),
        SetForegroundColor(Color::Cyan),
        SetAttribute(Attribute::Bold),
        Print("fretquiz"),
        SetAttribute(Attribute::Reset),
        ResetColor,
        Print(format!(
            "  {} ({}) | {} (frets 0-{}) | {}",
            session.instrument().label(),
            session.tuning().name,
            session.difficulty().label(),
            session.max_fret(),
            spelling
        ))
    )
}

fn draw_status(out: &mut impl Write, session: &Session) -> std::io::Result<()> {
    queue!(out, MoveTo(0, 2))?;
    match session.mode() {
        Mode::Practice => {
            queue!(
                out,
                SetForegroundColor(Color::Green),
                Print("PRACTICE"),
                ResetColor
            )?;
            if session.auto_play() {
                queue!(
                    out,
                    Print(format!("  auto {}s", session.auto_interval_secs()))
                )?;
            }
            if session.metronome() {
                queue!(out, Print(format!("  {} bpm ", session.bpm())))?;
                for i in 0..4u8 {
                    let (dot, color) = if session.beat() == Some(i) {
                        ("●", if i == 0 { Color::Magenta } else { Color::White })
                    } else {
                        ("○", Color::DarkGrey)
                    };
                    queue!(out, SetForegroundColor(color), Print(dot), ResetColor)?;
                    queue!(out, Print(" "))?;
                }
            }
        }
        Mode::Challenge => {
            let time_color = if session.remaining_secs() < 10 {
                Color::Red
            } else {
                Color::White
            };
            queue!(
                out,
                SetForegroundColor(Color::Yellow),
                Print("CHALLENGE"),
                ResetColor,
                Print("  time "),
                SetForegroundColor(time_color),
                Print(format!("{:>2}s", session.remaining_secs())),
                ResetColor,
                Print("  score "),
                SetForegroundColor(Color::Green),
                Print(format!("{}", session.score())),
                ResetColor
            )?;
            if !session.running() {
                queue!(
                    out,
                    SetForegroundColor(Color::Red),
                    Print("   TIME'S UP"),
                    ResetColor
                )?;
            }
        }
    }
    Ok(())
}

fn draw_target(out: &mut impl Write, session: &Session) -> std::io::Result<()> {
    let label = match session.mode() {
        Mode::Practice => "Note",
        Mode::Challenge => "Find",
    };
    let color = match session.last_result() {
        Some(AnswerResult::Correct) => Color::Green,
        Some(AnswerResult::Incorrect) => Color::Red,
        None => Color::White,
    };
    queue!(
        out,
        MoveTo(0, 4),
        Print(format!("{}: ", label)),
        SetForegroundColor(color),
        SetAttribute(Attribute::Bold),
        Print(session.target_name()),
        SetAttribute(Attribute::Reset),
        ResetColor
    )
}

/// Center `text` in a cell of `CELL_WIDTH - 1` columns.
fn cell(text: &str) -> String {
    format!("{:^width$}", text, width = CELL_WIDTH - 1)
}

fn draw_board(
    out: &mut impl Write,
    session: &Session,
    cursor: Option<(usize, u8)>,
) -> std::io::Result<()> {
    let tuning = session.tuning();
    let max_fret = session.max_fret();
    let top = 6u16;

    // Fret number header, inlay frets dotted.
    queue!(out, MoveTo(0, top), Print("   "))?;
    for fret in 0..=max_fret {
        let label = if INLAY_FRETS.contains(&fret) {
            format!("·{}", fret)
        } else {
            fret.to_string()
        };
        queue!(
            out,
            SetForegroundColor(Color::DarkGrey),
            Print(cell(&label)),
            ResetColor,
            Print(" ")
        )?;
    }

    // Strings, highest on top to match how a player sees the neck.
    for (row, string) in (0..tuning.string_count()).rev().enumerate() {
        queue!(
            out,
            MoveTo(0, top + 1 + row as u16),
            Print(format!("{:>2} ", tuning.open(string).name(session.use_sharps())))
        )?;
        for fret in 0..=max_fret {
            let marked = session.revealed()
                && session.mode() == Mode::Practice
                && session
                    .positions()
                    .iter()
                    .any(|p| p.string == string && p.fret == fret);
            let selected = cursor == Some((string, fret));

            let body = if marked {
                cell(session.target_name())
            } else if fret == 0 {
                cell(" ")
            } else {
                cell("-")
            };

            if selected {
                queue!(
                    out,
                    SetForegroundColor(Color::Yellow),
                    SetAttribute(Attribute::Reverse),
                    Print(&body),
                    SetAttribute(Attribute::Reset),
                    ResetColor
                )?;
            } else if marked {
                queue!(
                    out,
                    SetForegroundColor(Color::Green),
                    SetAttribute(Attribute::Bold),
                    Print(&body),
                    SetAttribute(Attribute::Reset),
                    ResetColor
                )?;
            } else {
                queue!(
                    out,
                    SetForegroundColor(Color::DarkGrey),
                    Print(&body),
                    ResetColor
                )?;
            }
            // The nut sits after the open-string column.
            let sep = if fret == 0 { "║" } else { "|" };
            queue!(out, SetForegroundColor(Color::DarkGrey), Print(sep), ResetColor)?;
        }
    }
    Ok(())
}

fn draw_help(out: &mut impl Write, session: &Session, board_visible: bool) -> std::io::Result<()> {
    let board_rows = if board_visible {
        session.tuning().string_count() as u16 + 2
    } else {
        0
    };
    let row = 6 + board_rows + 1;
    let help = match session.mode() {
        Mode::Practice => {
            "n next · space reveal · t tone · a auto ([ ] interval) · m metronome (-/+ bpm) · \
             c challenge · i instrument · d difficulty · f sharps/flats · q quit"
        }
        Mode::Challenge => {
            if session.running() {
                "arrows move · enter answer · c stop · q quit"
            } else {
                "c play again · esc return to practice · q quit"
            }
        }
    };
    queue!(
        out,
        MoveTo(0, row),
        SetForegroundColor(Color::DarkGrey),
        Print(help),
        ResetColor
    )
}
