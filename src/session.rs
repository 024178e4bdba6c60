//! The quiz session: mode, score, countdown, and the three timer cycles.
//!
//! Single-threaded by construction. Each periodic or deferred process is an
//! explicit `Option<Instant>` deadline owned by the session; `tick` fires
//! whatever is due and re-arms or clears it. Every transition that changes a
//! governing condition rewrites its deadline fields synchronously, so a
//! cancelled cycle can never fire against since-replaced state.

use std::time::{Duration, Instant};

use crate::audio::AudioSink;
use crate::fretboard::{self, FretPosition};
use crate::generator;
use crate::note::PitchClass;
use crate::tuning::{Difficulty, Instrument, Tuning};

/// Fixed challenge round length.
pub const CHALLENGE_SECS: u32 = 60;

/// How long an incorrect answer stays marked before clearing.
const INCORRECT_FLASH: Duration = Duration::from_millis(500);

/// Auto-play reveals at 40% of the cycle, capped here so long intervals
/// still give the answer early enough to study.
const MAX_REVEAL_DELAY: Duration = Duration::from_secs(2);

pub const MIN_AUTO_INTERVAL: f64 = 2.0;
pub const MAX_AUTO_INTERVAL: f64 = 10.0;
pub const MIN_BPM: u32 = 40;
pub const MAX_BPM: u32 = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Practice,
    Challenge,
}

/// Outcome of the most recent candidate answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerResult {
    Correct,
    Incorrect,
}

pub struct Session {
    // Configuration.
    instrument: Instrument,
    difficulty: Difficulty,
    tuning: Tuning,
    use_sharps: bool,
    auto_interval_secs: f64,
    bpm: u32,

    // Quiz state.
    mode: Mode,
    target: PitchClass,
    positions: Vec<FretPosition>,
    revealed: bool,
    last_result: Option<AnswerResult>,

    // Challenge round.
    running: bool,
    score: u32,
    remaining_secs: u32,

    // Practice cycles.
    auto_play: bool,
    metronome: bool,
    beat: Option<u8>,

    // Timer handles. `None` means cancelled.
    reveal_at: Option<Instant>,
    advance_at: Option<Instant>,
    click_at: Option<Instant>,
    countdown_at: Option<Instant>,
    flash_until: Option<Instant>,
}

impl Session {
    pub fn new(
        instrument: Instrument,
        difficulty: Difficulty,
        use_sharps: bool,
        auto_interval_secs: f64,
        bpm: u32,
    ) -> Self {
        let tuning = instrument.tuning();
        let target = PitchClass::from_name("C").unwrap_or(PitchClass::new(0));
        let positions = fretboard::resolve(target, &tuning, difficulty.max_fret());
        Session {
            instrument,
            difficulty,
            tuning,
            use_sharps,
            auto_interval_secs: auto_interval_secs.clamp(MIN_AUTO_INTERVAL, MAX_AUTO_INTERVAL),
            bpm: bpm.clamp(MIN_BPM, MAX_BPM),
            mode: Mode::Practice,
            target,
            positions,
            revealed: false,
            last_result: None,
            running: false,
            score: 0,
            remaining_secs: CHALLENGE_SECS,
            auto_play: false,
            metronome: false,
            beat: None,
            reveal_at: None,
            advance_at: None,
            click_at: None,
            countdown_at: None,
            flash_until: None,
        }
    }

    // --- Accessors for the render surface ---

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn target(&self) -> PitchClass {
        self.target
    }

    pub fn target_name(&self) -> &'static str {
        self.target.name(self.use_sharps)
    }

    pub fn positions(&self) -> &[FretPosition] {
        &self.positions
    }

    pub fn revealed(&self) -> bool {
        self.revealed
    }

    pub fn last_result(&self) -> Option<AnswerResult> {
        self.last_result
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    pub fn running(&self) -> bool {
        self.running
    }

    pub fn auto_play(&self) -> bool {
        self.auto_play
    }

    pub fn auto_interval_secs(&self) -> f64 {
        self.auto_interval_secs
    }

    pub fn metronome(&self) -> bool {
        self.metronome
    }

    /// Current beat 0..=3, or `None` while the metronome is off.
    pub fn beat(&self) -> Option<u8> {
        self.beat
    }

    pub fn bpm(&self) -> u32 {
        self.bpm
    }

    pub fn instrument(&self) -> Instrument {
        self.instrument
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn use_sharps(&self) -> bool {
        self.use_sharps
    }

    pub fn max_fret(&self) -> u8 {
        self.difficulty.max_fret()
    }

    // --- Transitions ---

    /// Manual "next note" in practice mode. No-op in challenge; the round
    /// advances itself on correct answers.
    pub fn next_note(&mut self, now: Instant) {
        if self.mode == Mode::Practice {
            self.new_target(now);
        }
    }

    /// Show/hide the answer positions. Ignored while auto-play owns the
    /// reveal, and in challenge mode where positions are never shown.
    pub fn toggle_reveal(&mut self) {
        if self.mode == Mode::Practice && !self.auto_play {
            self.revealed = !self.revealed;
        }
    }

    /// Start or stop the auto-play cycle. Turning it on draws a fresh
    /// target immediately; turning it off cancels both pending timers and
    /// leaves the current reveal state alone.
    pub fn toggle_auto_play(&mut self, now: Instant) {
        if self.mode != Mode::Practice {
            return;
        }
        self.auto_play = !self.auto_play;
        if self.auto_play {
            self.new_target(now);
        } else {
            self.reveal_at = None;
            self.advance_at = None;
        }
    }

    /// Change the auto-play cycle length, restarting the cycle for the
    /// current target when it is running.
    pub fn set_auto_interval(&mut self, secs: f64, now: Instant) {
        self.auto_interval_secs = secs.clamp(MIN_AUTO_INTERVAL, MAX_AUTO_INTERVAL);
        if self.auto_play && self.mode == Mode::Practice {
            self.arm_auto_cycle(now);
        }
    }

    /// Start or stop the metronome. Stopping clears the visual beat and the
    /// pending click so no orphaned tick can fire.
    pub fn toggle_metronome(&mut self, now: Instant) {
        if self.mode != Mode::Practice {
            return;
        }
        if self.metronome {
            self.stop_metronome();
        } else {
            self.metronome = true;
            self.beat = None;
            self.click_at = Some(now + self.click_period());
        }
    }

    /// Change tempo. A running metronome restarts its cycle from now and
    /// drops back to "no beat" until the first new click.
    pub fn set_bpm(&mut self, bpm: u32, now: Instant) {
        self.bpm = bpm.clamp(MIN_BPM, MAX_BPM);
        if self.metronome {
            self.beat = None;
            self.click_at = Some(now + self.click_period());
        }
    }

    /// Begin a timed round: zeroed score, full countdown, metronome forced
    /// off, fresh target. Positions are always "shown" in challenge in the
    /// sense that the board is live, but never marked.
    pub fn start_challenge(&mut self, now: Instant, audio: &mut dyn AudioSink) {
        audio.resume();
        self.score = 0;
        self.remaining_secs = CHALLENGE_SECS;
        self.running = true;
        self.mode = Mode::Challenge;
        self.stop_metronome();
        self.countdown_at = Some(now + Duration::from_secs(1));
        self.new_target(now);
    }

    /// Manual stop / return to practice. Clears the countdown display and
    /// hides positions; a still-enabled auto-play cycle resumes.
    pub fn stop_challenge(&mut self, now: Instant) {
        self.running = false;
        self.countdown_at = None;
        self.mode = Mode::Practice;
        self.revealed = false;
        self.remaining_secs = CHALLENGE_SECS;
        self.arm_auto_cycle(now);
    }

    /// A tapped (string, fret) candidate. Only a running challenge round
    /// judges answers; anywhere else this is a silent no-op.
    pub fn answer(&mut self, string: usize, fret: u8, now: Instant, audio: &mut dyn AudioSink) {
        if self.mode != Mode::Challenge || !self.running {
            return;
        }
        if string >= self.tuning.string_count() {
            return;
        }
        let tapped = fretboard::note_at(&self.tuning, string, fret);
        if tapped == self.target {
            audio.play_success();
            self.score += 1;
            self.last_result = Some(AnswerResult::Correct);
            self.new_target(now);
        } else {
            audio.play_incorrect();
            self.last_result = Some(AnswerResult::Incorrect);
            self.flash_until = Some(now + INCORRECT_FLASH);
        }
    }

    /// Swap guitar/bass. The tuning is replaced atomically and positions
    /// recomputed for the unchanged target; a running round is stopped
    /// because the switch invalidates its answer space.
    pub fn switch_instrument(&mut self, now: Instant) {
        if self.running {
            self.stop_challenge(now);
        }
        self.instrument = self.instrument.toggled();
        self.tuning = self.instrument.tuning();
        self.revealed = false;
        self.recompute_positions();
    }

    /// Change the fret bound. Same mid-round rule as the instrument switch.
    pub fn set_difficulty(&mut self, difficulty: Difficulty, now: Instant) {
        if self.running {
            self.stop_challenge(now);
        }
        self.difficulty = difficulty;
        self.recompute_positions();
    }

    /// Flip sharps/flats. Pure respelling — target identity and positions
    /// are untouched, names are derived at render time.
    pub fn toggle_spelling(&mut self) {
        if self.mode == Mode::Practice {
            self.use_sharps = !self.use_sharps;
        }
    }

    /// Play the target's reference tone on demand (practice only).
    pub fn play_target_tone(&mut self, audio: &mut dyn AudioSink) {
        if self.mode == Mode::Practice {
            audio.resume();
            audio.play_tone(self.target);
        }
    }

    // --- Timer pump ---

    /// Fire every due deadline. Call from the event loop before rendering;
    /// `now` flows into any re-armed cycle.
    pub fn tick(&mut self, now: Instant, audio: &mut dyn AudioSink) {
        if let Some(at) = self.flash_until {
            if now >= at {
                self.flash_until = None;
                self.last_result = None;
            }
        }

        if let Some(at) = self.reveal_at {
            if now >= at {
                self.reveal_at = None;
                self.revealed = true;
                audio.play_tone(self.target);
            }
        }

        if let Some(at) = self.advance_at {
            if now >= at {
                // Re-arms both auto timers for the new target.
                self.new_target(now);
            }
        }

        while let Some(at) = self.click_at {
            if now < at {
                break;
            }
            let beat = self.beat.map_or(0, |b| (b + 1) % 4);
            self.beat = Some(beat);
            audio.play_click(beat == 0);
            // Re-arm from the previous deadline, not from `now`, so the
            // cycle doesn't drift with poll latency.
            self.click_at = Some(at + self.click_period());
        }

        while let Some(at) = self.countdown_at {
            if now < at || !self.running {
                break;
            }
            self.remaining_secs = self.remaining_secs.saturating_sub(1);
            if self.remaining_secs == 0 {
                // Round over: terminal until a restart or manual return.
                self.running = false;
                self.countdown_at = None;
            } else {
                self.countdown_at = Some(at + Duration::from_secs(1));
            }
        }
    }

    /// Earliest pending deadline, for sizing the event-loop poll timeout.
    pub fn next_deadline(&self) -> Option<Instant> {
        [
            self.reveal_at,
            self.advance_at,
            self.click_at,
            self.countdown_at,
            self.flash_until,
        ]
        .iter()
        .flatten()
        .min()
        .copied()
    }

    // --- Internals ---

    fn new_target(&mut self, now: Instant) {
        self.target = generator::next_target(Some(self.target));
        self.recompute_positions();
        self.revealed = false;
        self.last_result = None;
        self.flash_until = None;
        self.arm_auto_cycle(now);
    }

    fn recompute_positions(&mut self) {
        self.positions = fretboard::resolve(self.target, &self.tuning, self.difficulty.max_fret());
    }

    /// Schedule (or cancel) the auto-play reveal and advance for the
    /// current target. Both hang off the same target-changed instant.
    fn arm_auto_cycle(&mut self, now: Instant) {
        if self.mode == Mode::Practice && self.auto_play {
            let cycle = Duration::from_secs_f64(self.auto_interval_secs);
            let reveal = MAX_REVEAL_DELAY.min(cycle.mul_f64(0.4));
            self.reveal_at = Some(now + reveal);
            self.advance_at = Some(now + cycle);
        } else {
            self.reveal_at = None;
            self.advance_at = None;
        }
    }

    fn stop_metronome(&mut self) {
        self.metronome = false;
        self.beat = None;
        self.click_at = None;
    }

    fn click_period(&self) -> Duration {
        Duration::from_secs_f64(60.0 / self.bpm as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Records every cue instead of making sound.
    #[derive(Default)]
    struct RecordingSink {
        cues: Vec<String>,
        resumes: u32,
    }

    impl AudioSink for RecordingSink {
        fn resume(&mut self) {
            self.resumes += 1;
        }
        fn play_tone(&mut self, pitch: PitchClass) {
            self.cues.push(format!("tone:{}", pitch.name(true)));
        }
        fn play_click(&mut self, accent: bool) {
            self.cues
                .push(if accent { "click:accent" } else { "click" }.to_string());
        }
        fn play_success(&mut self) {
            self.cues.push("success".to_string());
        }
        fn play_incorrect(&mut self) {
            self.cues.push("incorrect".to_string());
        }
    }

    fn session() -> Session {
        Session::new(Instrument::Guitar, Difficulty::Beginner, true, 5.0, 90)
    }

    /// Fret on string 0 that sounds the current target (may exceed the
    /// difficulty bound; answer conversion is pure mod-12 arithmetic).
    fn correct_fret(s: &Session) -> u8 {
        (s.target().semitone() + 12 - s.tuning().open(0).semitone()) % 12
    }

    /// A fret on string 0 guaranteed not to sound the target.
    fn wrong_fret(s: &Session) -> u8 {
        (correct_fret(s) + 1) % 12
    }

    #[test]
    fn test_initial_state() {
        let s = session();
        assert_eq!(s.mode(), Mode::Practice);
        assert!(!s.revealed());
        assert!(!s.auto_play());
        assert!(!s.metronome());
        assert_eq!(s.beat(), None);
        assert_eq!(s.score(), 0);
        assert_eq!(s.remaining_secs(), CHALLENGE_SECS);
        assert_eq!(s.last_result(), None);
        assert_eq!(s.next_deadline(), None);
        assert!(!s.positions().is_empty());
    }

    #[test]
    fn test_reveal_toggle_in_practice() {
        let mut s = session();
        s.toggle_reveal();
        assert!(s.revealed());
        s.toggle_reveal();
        assert!(!s.revealed());
    }

    #[test]
    fn test_next_note_resets_reveal_and_result() {
        let mut s = session();
        let now = Instant::now();
        s.toggle_reveal();
        s.next_note(now);
        assert!(!s.revealed());
        assert_eq!(s.last_result(), None);
        // Positions always match the (new) target.
        for p in s.positions() {
            assert!(p.is_root(s.target()));
        }
    }

    #[test]
    fn test_start_challenge_resets_round_state() {
        let mut s = session();
        let now = Instant::now();
        let mut audio = RecordingSink::default();
        s.toggle_metronome(now);
        assert!(s.metronome());

        s.start_challenge(now, &mut audio);
        assert_eq!(s.mode(), Mode::Challenge);
        assert!(s.running());
        assert_eq!(s.score(), 0);
        assert_eq!(s.remaining_secs(), CHALLENGE_SECS);
        // Metronome is forced off and cannot tick again.
        assert!(!s.metronome());
        assert_eq!(s.beat(), None);
        assert!(audio.resumes >= 1);

        // Only the countdown is pending.
        assert_eq!(s.next_deadline(), Some(now + Duration::from_secs(1)));
    }

    #[test]
    fn test_correct_answer_scores_and_advances() {
        let mut s = session();
        let now = Instant::now();
        let mut audio = RecordingSink::default();
        s.start_challenge(now, &mut audio);

        let before = s.target();
        s.answer(0, correct_fret(&s), now, &mut audio);
        assert_eq!(s.score(), 1);
        assert!(audio.cues.contains(&"success".to_string()));
        // A new target was drawn and the result flag re-cleared by it.
        assert_eq!(s.last_result(), None);
        for p in s.positions() {
            assert!(p.is_root(s.target()));
        }
        // The old target may repeat by chance; only the structure is fixed.
        let _ = before;
    }

    #[test]
    fn test_incorrect_answer_flashes_then_clears() {
        let mut s = session();
        let now = Instant::now();
        let mut audio = RecordingSink::default();
        s.start_challenge(now, &mut audio);

        let target = s.target();
        s.answer(0, wrong_fret(&s), now, &mut audio);
        assert_eq!(s.score(), 0);
        assert_eq!(s.target(), target);
        assert_eq!(s.last_result(), Some(AnswerResult::Incorrect));
        assert!(audio.cues.contains(&"incorrect".to_string()));

        // Not yet cleared just before the flash deadline.
        s.tick(now + Duration::from_millis(499), &mut audio);
        assert_eq!(s.last_result(), Some(AnswerResult::Incorrect));
        s.tick(now + Duration::from_millis(500), &mut audio);
        assert_eq!(s.last_result(), None);
    }

    #[test]
    fn test_answer_ignored_outside_running_challenge() {
        let mut s = session();
        let now = Instant::now();
        let mut audio = RecordingSink::default();

        // Practice: silent no-op.
        s.answer(0, correct_fret(&s), now, &mut audio);
        assert_eq!(s.score(), 0);
        assert_eq!(s.last_result(), None);
        assert!(audio.cues.is_empty());

        // Expired round: also a no-op.
        s.start_challenge(now, &mut audio);
        let mut t = now;
        for _ in 0..CHALLENGE_SECS {
            t += Duration::from_secs(1);
            s.tick(t, &mut audio);
        }
        assert!(!s.running());
        audio.cues.clear();
        s.answer(0, correct_fret(&s), t, &mut audio);
        assert_eq!(s.score(), 0);
        assert_eq!(s.last_result(), None);
        assert!(audio.cues.is_empty());
    }

    #[test]
    fn test_out_of_range_string_is_ignored() {
        let mut s = session();
        let now = Instant::now();
        let mut audio = RecordingSink::default();
        s.start_challenge(now, &mut audio);
        s.answer(99, 0, now, &mut audio);
        assert_eq!(s.score(), 0);
        assert_eq!(s.last_result(), None);
    }

    #[test]
    fn test_countdown_reaches_zero_exactly_once() {
        let mut s = session();
        let now = Instant::now();
        let mut audio = RecordingSink::default();
        s.start_challenge(now, &mut audio);

        let mut t = now;
        for expected in (0..CHALLENGE_SECS).rev() {
            t += Duration::from_secs(1);
            s.tick(t, &mut audio);
            assert_eq!(s.remaining_secs(), expected);
        }
        assert!(!s.running());
        // Mode stays Challenge so the final score remains on screen.
        assert_eq!(s.mode(), Mode::Challenge);

        // Further ticks never push below zero or revive the round.
        s.tick(t + Duration::from_secs(5), &mut audio);
        assert_eq!(s.remaining_secs(), 0);
        assert!(!s.running());
    }

    #[test]
    fn test_countdown_catches_up_after_a_stall() {
        let mut s = session();
        let now = Instant::now();
        let mut audio = RecordingSink::default();
        s.start_challenge(now, &mut audio);

        // One tick 3.5 s late decrements for each elapsed second.
        s.tick(now + Duration::from_millis(3500), &mut audio);
        assert_eq!(s.remaining_secs(), CHALLENGE_SECS - 3);
    }

    #[test]
    fn test_manual_stop_returns_to_practice() {
        let mut s = session();
        let now = Instant::now();
        let mut audio = RecordingSink::default();
        s.start_challenge(now, &mut audio);
        s.tick(now + Duration::from_secs(2), &mut audio);

        s.stop_challenge(now + Duration::from_secs(2));
        assert_eq!(s.mode(), Mode::Practice);
        assert!(!s.running());
        assert!(!s.revealed());
        assert_eq!(s.remaining_secs(), CHALLENGE_SECS);
        assert_eq!(s.next_deadline(), None);
    }

    #[test]
    fn test_auto_play_cycle_reveals_then_advances() {
        let mut s = session();
        let t0 = Instant::now();
        let mut audio = RecordingSink::default();

        s.toggle_auto_play(t0);
        assert!(s.auto_play());
        assert!(!s.revealed());

        // interval 5 s -> reveal at min(2, 0.4*5) = 2 s.
        s.tick(t0 + Duration::from_millis(1999), &mut audio);
        assert!(!s.revealed());
        s.tick(t0 + Duration::from_secs(2), &mut audio);
        assert!(s.revealed());
        let expected_tone = format!("tone:{}", s.target().name(true));
        assert_eq!(audio.cues, [expected_tone]);

        // Full interval: new target, hidden again, cycle re-armed.
        s.tick(t0 + Duration::from_secs(5), &mut audio);
        assert!(!s.revealed());
        let next = s.next_deadline().unwrap();
        assert!(next > t0 + Duration::from_secs(5));
    }

    #[test]
    fn test_short_interval_reveal_is_fraction_of_cycle() {
        let mut s = session();
        let t0 = Instant::now();
        let mut audio = RecordingSink::default();
        s.set_auto_interval(2.0, t0);
        s.toggle_auto_play(t0);

        // 0.4 * 2 s = 800 ms, below the 2 s cap.
        s.tick(t0 + Duration::from_millis(799), &mut audio);
        assert!(!s.revealed());
        s.tick(t0 + Duration::from_millis(800), &mut audio);
        assert!(s.revealed());
    }

    #[test]
    fn test_manual_next_cancels_stale_auto_timers() {
        let mut s = session();
        let t0 = Instant::now();
        let mut audio = RecordingSink::default();
        s.toggle_auto_play(t0);

        // Manual advance at 1 s reschedules both timers from there.
        s.next_note(t0 + Duration::from_secs(1));
        // The first reveal deadline (t0+2s) must not fire.
        s.tick(t0 + Duration::from_millis(2500), &mut audio);
        assert!(!s.revealed());
        assert!(audio.cues.is_empty());
        // The rescheduled reveal (t0+3s) does.
        s.tick(t0 + Duration::from_secs(3), &mut audio);
        assert!(s.revealed());
    }

    #[test]
    fn test_auto_play_off_cancels_cleanly() {
        let mut s = session();
        let t0 = Instant::now();
        let mut audio = RecordingSink::default();
        s.toggle_auto_play(t0);
        s.tick(t0 + Duration::from_secs(2), &mut audio);
        assert!(s.revealed());

        // Turning off keeps the reveal state and fires nothing further.
        s.toggle_auto_play(t0 + Duration::from_secs(3));
        assert!(!s.auto_play());
        assert!(s.revealed());
        assert_eq!(s.next_deadline(), None);
        audio.cues.clear();
        s.tick(t0 + Duration::from_secs(30), &mut audio);
        assert!(audio.cues.is_empty());
    }

    #[test]
    fn test_reveal_toggle_is_noop_while_auto_play_active() {
        let mut s = session();
        let t0 = Instant::now();
        s.toggle_auto_play(t0);
        s.toggle_reveal();
        assert!(!s.revealed());
    }

    #[test]
    fn test_metronome_beats_and_accents() {
        let mut s = session();
        let t0 = Instant::now();
        let mut audio = RecordingSink::default();
        s.set_bpm(60, t0);
        s.toggle_metronome(t0);
        assert_eq!(s.beat(), None);

        for i in 0..8u64 {
            s.tick(t0 + Duration::from_secs(i + 1), &mut audio);
        }
        assert_eq!(s.beat(), Some(3));
        assert_eq!(
            audio.cues,
            [
                "click:accent",
                "click",
                "click",
                "click",
                "click:accent",
                "click",
                "click",
                "click"
            ]
        );
    }

    #[test]
    fn test_metronome_off_resets_beat_and_cancels() {
        let mut s = session();
        let t0 = Instant::now();
        let mut audio = RecordingSink::default();
        s.set_bpm(60, t0);
        s.toggle_metronome(t0);
        s.tick(t0 + Duration::from_secs(2), &mut audio);
        assert!(s.beat().is_some());

        s.toggle_metronome(t0 + Duration::from_secs(2));
        assert_eq!(s.beat(), None);
        assert_eq!(s.next_deadline(), None);
        audio.cues.clear();
        s.tick(t0 + Duration::from_secs(60), &mut audio);
        assert!(audio.cues.is_empty());
    }

    #[test]
    fn test_bpm_change_restarts_cycle() {
        let mut s = session();
        let t0 = Instant::now();
        let mut audio = RecordingSink::default();
        s.set_bpm(60, t0);
        s.toggle_metronome(t0);
        s.tick(t0 + Duration::from_secs(1), &mut audio);
        assert_eq!(s.beat(), Some(0));

        // Retiming drops the visual beat until the new cycle's first click.
        let t1 = t0 + Duration::from_millis(1500);
        s.set_bpm(120, t1);
        assert_eq!(s.beat(), None);
        s.tick(t1 + Duration::from_millis(500), &mut audio);
        assert_eq!(s.beat(), Some(0));
    }

    #[test]
    fn test_instrument_switch_stops_running_round() {
        let mut s = session();
        let now = Instant::now();
        let mut audio = RecordingSink::default();
        s.start_challenge(now, &mut audio);
        let target = s.target();

        s.switch_instrument(now + Duration::from_secs(1));
        assert_eq!(s.mode(), Mode::Practice);
        assert!(!s.running());
        assert_eq!(s.instrument(), Instrument::Bass);
        // Target survives the switch; positions were recomputed against
        // the new tuning.
        assert_eq!(s.target(), target);
        for p in s.positions() {
            assert!(p.is_root(target));
            assert!(p.string < s.tuning().string_count());
        }
    }

    #[test]
    fn test_difficulty_change_rebounds_positions() {
        let mut s = session();
        let now = Instant::now();
        let mut audio = RecordingSink::default();
        s.set_difficulty(Difficulty::Advanced, now);
        let wide = s.positions().len();
        s.set_difficulty(Difficulty::Beginner, now);
        let narrow = s.positions().len();
        assert!(narrow <= wide);
        assert!(s.positions().iter().all(|p| p.fret <= 3));

        // Mid-round change forces a stop.
        s.start_challenge(now, &mut audio);
        s.set_difficulty(Difficulty::Intermediate, now);
        assert!(!s.running());
        assert_eq!(s.mode(), Mode::Practice);
    }

    #[test]
    fn test_spelling_toggle_respells_without_moving_anything() {
        let mut s = session();
        let before: Vec<(usize, u8)> = s.positions().iter().map(|p| (p.string, p.fret)).collect();
        let target = s.target();
        s.toggle_spelling();
        assert!(!s.use_sharps());
        assert_eq!(s.target(), target);
        let after: Vec<(usize, u8)> = s.positions().iter().map(|p| (p.string, p.fret)).collect();
        assert_eq!(before, after);
    }
}
