// The magic 8-ball's answer pools and mood weighting.

use rand::Rng;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mood {
    Negative,
    Neutral,
    Positive,
}

const NEGATIVE: &[&str] = &[
    "Very doubtful.",
    "My sources say no.",
    "Don't count on it.",
    "The outlook is not good.",
    "Absolutely not.",
];

const NEUTRAL: &[&str] = &[
    "Ask again later.",
    "Better not tell you now.",
    "The answer is hazy, try again.",
    "Cannot predict right now.",
    "Concentrate and ask again.",
];

const POSITIVE: &[&str] = &[
    "It is certain.",
    "Without a doubt.",
    "You may rely on it.",
    "Signs point to yes.",
    "Most likely.",
    "Yes, definitely.",
];

/// Draw an answer: 3-in-10 negative, 3-in-10 neutral, 4-in-10 positive.
pub fn draw<R: Rng>(rng: &mut R) -> (Mood, &'static str) {
    let roll = rng.gen_range(0..10);
    let (mood, pool) = if roll < 3 {
        (Mood::Negative, NEGATIVE)
    } else if roll < 6 {
        (Mood::Neutral, NEUTRAL)
    } else {
        (Mood::Positive, POSITIVE)
    };
    (mood, pool[rng.gen_range(0..pool.len())])
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn draw_returns_an_answer_from_the_mood_pool() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let (mood, answer) = draw(&mut rng);
            let pool = match mood {
                Mood::Negative => NEGATIVE,
                Mood::Neutral => NEUTRAL,
                Mood::Positive => POSITIVE,
            };
            assert!(pool.contains(&answer));
        }
    }

    #[test]
    fn all_moods_occur() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut seen = [false; 3];
        for _ in 0..200 {
            match draw(&mut rng).0 {
                Mood::Negative => seen[0] = true,
                Mood::Neutral => seen[1] = true,
                Mood::Positive => seen[2] = true,
            }
        }
        assert_eq!(seen, [true; 3]);
    }
}
