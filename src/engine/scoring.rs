//! Points awarded for a single answer.

use crate::state::quiz::Question;

/// Remaining seconds that earn no bonus.
pub const BONUS_FREE_SECONDS: u32 = 10;
/// Bonus points per remaining second above [`BONUS_FREE_SECONDS`].
pub const BONUS_POINTS_PER_SECOND: u32 = 2;

/// Points for picking `chosen_option_index` with `seconds_remaining` left on
/// the clock.
///
/// Wrong answers score zero. Correct answers score
/// `round((base_points + bonus * 2) * multiplier)` where `bonus` is the number
/// of remaining seconds above ten and `multiplier` follows the difficulty.
pub fn score(question: &Question, chosen_option_index: usize, seconds_remaining: u32) -> u32 {
    if chosen_option_index != question.correct_option_index {
        return 0;
    }

    let time_bonus = seconds_remaining.saturating_sub(BONUS_FREE_SECONDS);
    let raw = f64::from(question.base_points)
        + f64::from(time_bonus) * f64::from(BONUS_POINTS_PER_SECOND);
    (raw * question.difficulty.multiplier()).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::quiz::Difficulty;

    fn question(difficulty: Difficulty, base_points: u32) -> Question {
        Question {
            id: "q".into(),
            text: "Which planet is known as the Red Planet?".into(),
            options: vec!["Venus".into(), "Mars".into(), "Jupiter".into()],
            correct_option_index: 1,
            category: "Science".into(),
            difficulty,
            time_limit_seconds: 30,
            base_points,
            explanation: None,
        }
    }

    #[test]
    fn medium_full_time_earns_bonus() {
        assert_eq!(score(&question(Difficulty::Medium, 100), 1, 30), 168);
    }

    #[test]
    fn no_bonus_at_or_below_ten_seconds() {
        let q = question(Difficulty::Medium, 100);
        assert_eq!(score(&q, 1, 5), 120);
        assert_eq!(score(&q, 1, 10), 120);
        assert_eq!(score(&q, 1, 0), 120);
        assert_eq!(score(&q, 1, 11), 122);
    }

    #[test]
    fn wrong_answer_scores_zero() {
        let q = question(Difficulty::Hard, 100);
        for remaining in [0, 5, 10, 25, 30] {
            assert_eq!(score(&q, 0, remaining), 0);
            assert_eq!(score(&q, 2, remaining), 0);
        }
    }

    #[test]
    fn difficulty_scales_points() {
        assert_eq!(score(&question(Difficulty::Easy, 100), 1, 25), 130);
        assert_eq!(score(&question(Difficulty::Hard, 100), 1, 25), 195);
    }

    #[test]
    fn halves_round_up() {
        // (25 + 0) * 1.5 = 37.5
        assert_eq!(score(&question(Difficulty::Hard, 25), 1, 3), 38);
    }
}
