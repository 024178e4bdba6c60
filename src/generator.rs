//! Random target selection with a single repeat-avoiding re-draw.

use rand::Rng;

use crate::note::PitchClass;

/// Draw the next quiz target. A draw equal to `previous` is re-drawn once;
/// a second identical draw is accepted, so immediate repeats are rare but
/// still possible (roughly 1 in 144).
pub fn draw<R: Rng>(rng: &mut R, previous: Option<PitchClass>) -> PitchClass {
    let first = PitchClass::new(rng.gen_range(0..12));
    if Some(first) == previous {
        return PitchClass::new(rng.gen_range(0..12));
    }
    first
}

/// `draw` against the thread-local generator.
pub fn next_target(previous: Option<PitchClass>) -> PitchClass {
    draw(&mut rand::thread_rng(), previous)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_avoidance_lowers_repeat_rate() {
        let n = 5000;

        let mut rng = StdRng::seed_from_u64(7);
        let mut previous = None;
        let mut repeats_avoided = 0;
        for _ in 0..n {
            let next = draw(&mut rng, previous);
            if Some(next) == previous {
                repeats_avoided += 1;
            }
            previous = Some(next);
        }

        let mut rng = StdRng::seed_from_u64(7);
        let mut previous: Option<PitchClass> = None;
        let mut repeats_naive = 0;
        for _ in 0..n {
            let next = PitchClass::new(rng.gen_range(0..12));
            if Some(next) == previous {
                repeats_naive += 1;
            }
            previous = Some(next);
        }

        // Expected ~n/144 vs ~n/12; a wide margin keeps this stable.
        assert!(
            repeats_avoided < repeats_naive,
            "avoided {} vs naive {}",
            repeats_avoided,
            repeats_naive
        );
        assert!(repeats_avoided < n / 48);
    }

    #[test]
    fn test_every_class_reachable() {
        let mut rng = StdRng::seed_from_u64(21);
        let mut seen = [false; 12];
        let mut previous = None;
        for _ in 0..1000 {
            let next = draw(&mut rng, previous);
            seen[next.semitone() as usize] = true;
            previous = Some(next);
        }
        assert!(seen.iter().all(|&s| s));
    }
}
