//! Interactive trainer loop: raw-mode terminal, key handling, timer pump.

use std::io;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{cursor, execute};

use crate::audio::{AudioEngine, AudioSink};
use crate::session::{Mode, Session};
use crate::ui;

/// Longest the loop sleeps between repaints when no timer is pending.
const IDLE_POLL: Duration = Duration::from_millis(50);

/// Run the trainer until the user quits.
pub fn run(mut session: Session) -> Result<(), String> {
    let mut audio = AudioEngine::new();

    let mut stdout = io::stdout();
    terminal::enable_raw_mode().map_err(|e| format!("failed to enable raw mode: {}", e))?;
    execute!(stdout, EnterAlternateScreen, cursor::Hide)
        .map_err(|e| format!("alternate screen: {}", e))?;

    let result = event_loop(&mut session, &mut audio);

    // Restore terminal no matter how the loop ended.
    let _ = execute!(stdout, cursor::Show, LeaveAlternateScreen);
    let _ = terminal::disable_raw_mode();

    result
}

fn event_loop(session: &mut Session, audio: &mut AudioEngine) -> Result<(), String> {
    // Answer cursor for challenge mode: (string, fret).
    let mut cursor: (usize, u8) = (0, 0);

    loop {
        let now = Instant::now();
        session.tick(now, audio);

        clamp_cursor(session, &mut cursor);
        let shown_cursor =
            (session.mode() == Mode::Challenge && session.running()).then_some(cursor);
        ui::draw(session, shown_cursor).map_err(|e| format!("render error: {}", e))?;

        // Wake for the next session deadline, or idle-poll for input.
        let timeout = session
            .next_deadline()
            .map(|d| d.saturating_duration_since(now))
            .unwrap_or(IDLE_POLL)
            .min(IDLE_POLL);

        if !event::poll(timeout).map_err(|e| format!("event poll error: {}", e))? {
            continue;
        }

        let ev = event::read().map_err(|e| format!("event read error: {}", e))?;
        let Event::Key(key) = ev else { continue };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        // First-interaction gate for the audio stream; idempotent after.
        audio.resume();

        let now = Instant::now();
        if handle_key(session, audio, &mut cursor, key, now) {
            return Ok(());
        }
    }
}

/// Apply one key press. Returns true when the user asked to quit.
fn handle_key(
    session: &mut Session,
    audio: &mut AudioEngine,
    cursor: &mut (usize, u8),
    key: KeyEvent,
    now: Instant,
) -> bool {
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => return true,
        KeyCode::Char('q') => return true,
        KeyCode::Esc => {
            if session.mode() == Mode::Challenge {
                session.stop_challenge(now);
            } else {
                return true;
            }
        }

        KeyCode::Char('n') => session.next_note(now),
        KeyCode::Char(' ') => session.toggle_reveal(),
        KeyCode::Char('t') => session.play_target_tone(audio),
        KeyCode::Char('a') => session.toggle_auto_play(now),
        KeyCode::Char('m') => session.toggle_metronome(now),
        KeyCode::Char('f') => session.toggle_spelling(),
        KeyCode::Char('i') => session.switch_instrument(now),
        KeyCode::Char('d') => {
            let next = session.difficulty().cycled();
            session.set_difficulty(next, now);
        }
        KeyCode::Char('c') => {
            if session.mode() == Mode::Challenge && session.running() {
                session.stop_challenge(now);
            } else {
                session.start_challenge(now, audio);
            }
        }

        KeyCode::Char('[') => {
            session.set_auto_interval(session.auto_interval_secs() - 0.5, now);
        }
        KeyCode::Char(']') => {
            session.set_auto_interval(session.auto_interval_secs() + 0.5, now);
        }
        KeyCode::Char('-') => session.set_bpm(session.bpm().saturating_sub(5), now),
        KeyCode::Char('+') | KeyCode::Char('=') => session.set_bpm(session.bpm() + 5, now),

        // Board navigation; the board is drawn highest string on top.
        KeyCode::Up => cursor.0 = (cursor.0 + 1).min(session.tuning().string_count() - 1),
        KeyCode::Down => cursor.0 = cursor.0.saturating_sub(1),
        KeyCode::Right => cursor.1 = (cursor.1 + 1).min(session.max_fret()),
        KeyCode::Left => cursor.1 = cursor.1.saturating_sub(1),
        KeyCode::Enter => session.answer(cursor.0, cursor.1, now, audio),

        _ => {}
    }
    false
}

/// Keep the cursor inside the board after instrument/difficulty changes.
fn clamp_cursor(session: &Session, cursor: &mut (usize, u8)) {
    cursor.0 = cursor.0.min(session.tuning().string_count() - 1);
    cursor.1 = cursor.1.min(session.max_fret());
}
