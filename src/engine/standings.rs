//! Leaderboard ordering and per-player statistics.

use uuid::Uuid;

use crate::state::quiz::Player;

/// One leaderboard row.
#[derive(Debug, Clone, PartialEq)]
pub struct Standing {
    /// Competition rank: tied scores share a rank and the next rank skips.
    pub rank: usize,
    /// Player identifier.
    pub player_id: Uuid,
    /// Display name.
    pub name: String,
    /// Total points.
    pub score: u32,
    /// Number of correct answers.
    pub correct_answers: usize,
    /// Number of answers given.
    pub total_answers: usize,
    /// Share of correct answers, 0 to 100.
    pub accuracy_percent: f64,
    /// Mean seconds taken to answer, 0 when nothing was answered.
    pub average_seconds_to_answer: f64,
    /// Presence flag.
    pub connected: bool,
}

/// Rank players by score, highest first. Ties keep join order.
pub fn rank<'a>(players: impl IntoIterator<Item = &'a Player>) -> Vec<Standing> {
    let mut ordered: Vec<&Player> = players.into_iter().collect();
    ordered.sort_by(|a, b| b.score.cmp(&a.score));

    let mut standings = Vec::with_capacity(ordered.len());
    let mut previous: Option<(u32, usize)> = None;
    for (position, player) in ordered.into_iter().enumerate() {
        let rank = match previous {
            Some((score, rank)) if score == player.score => rank,
            _ => position + 1,
        };
        previous = Some((player.score, rank));
        standings.push(standing(player, rank));
    }
    standings
}

fn standing(player: &Player, rank: usize) -> Standing {
    let total_answers = player.answers.len();
    let correct_answers = player.answers.iter().filter(|a| a.is_correct).count();
    let (accuracy_percent, average_seconds_to_answer) = if total_answers == 0 {
        (0.0, 0.0)
    } else {
        let total = total_answers as f64;
        let seconds: u64 = player
            .answers
            .iter()
            .map(|a| u64::from(a.seconds_to_answer))
            .sum();
        (
            correct_answers as f64 * 100.0 / total,
            seconds as f64 / total,
        )
    };

    Standing {
        rank,
        player_id: player.id,
        name: player.name.clone(),
        score: player.score,
        correct_answers,
        total_answers,
        accuracy_percent,
        average_seconds_to_answer,
        connected: player.connected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::quiz::Answer;

    fn player(name: &str, score: u32) -> Player {
        let mut player = Player::new(name.into());
        player.score = score;
        player
    }

    #[test]
    fn ties_share_rank_and_keep_join_order() {
        let players = [
            player("Ada", 100),
            player("Bob", 130),
            player("Cy", 100),
            player("Dee", 50),
        ];
        let standings = rank(&players);

        let view: Vec<_> = standings
            .iter()
            .map(|s| (s.name.as_str(), s.rank))
            .collect();
        assert_eq!(view, vec![("Bob", 1), ("Ada", 2), ("Cy", 2), ("Dee", 4)]);
    }

    #[test]
    fn stats_are_derived_from_answers() {
        let mut p = player("Ada", 0);
        for (i, (correct, seconds)) in [(true, 4), (false, 10), (true, 7), (true, 3)]
            .into_iter()
            .enumerate()
        {
            p.answers.push(Answer {
                question_index: i,
                chosen_option_index: 0,
                is_correct: correct,
                points_awarded: 0,
                seconds_to_answer: seconds,
            });
        }

        let standing = &rank([&p])[0];
        assert_eq!(standing.correct_answers, 3);
        assert_eq!(standing.total_answers, 4);
        assert_eq!(standing.accuracy_percent, 75.0);
        assert_eq!(standing.average_seconds_to_answer, 6.0);
    }

    #[test]
    fn empty_ledger_has_zero_stats() {
        let standing = &rank([&player("Ada", 0)])[0];
        assert_eq!(standing.rank, 1);
        assert_eq!(standing.accuracy_percent, 0.0);
        assert_eq!(standing.average_seconds_to_answer, 0.0);
    }
}
