//! Leaderboard projection

use crate::ws::protocol::LeaderboardEntry;

use super::store::Player;

/// Players ordered by score descending; equal scores keep join order
pub fn standings<'a>(players: impl IntoIterator<Item = &'a Player>) -> Vec<LeaderboardEntry> {
    let mut ranked: Vec<&Player> = players.into_iter().collect();
    ranked.sort_by(|a, b| b.score.cmp(&a.score).then(a.join_seq.cmp(&b.join_seq)));
    ranked
        .into_iter()
        .map(|p| LeaderboardEntry {
            name: p.name.clone(),
            score: p.score,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::store::LifeState;
    use glam::{Quat, Vec3};
    use uuid::Uuid;

    fn player(name: &str, score: u32, join_seq: u64) -> Player {
        Player {
            id: Uuid::new_v4(),
            name: name.into(),
            position: Vec3::ZERO,
            orientation: Quat::IDENTITY,
            health: 100,
            score,
            color: 0,
            life: LifeState::Alive,
            join_seq,
        }
    }

    #[test]
    fn sorted_by_score_then_join_order() {
        let players = vec![
            player("late", 200, 5),
            player("low", 100, 0),
            player("early", 200, 1),
            player("top", 900, 3),
        ];
        let names: Vec<String> = standings(players.iter().rev())
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, vec!["top", "early", "late", "low"]);
    }

    #[test]
    fn empty_arena_has_empty_board() {
        assert!(standings(std::iter::empty()).is_empty());
    }
}
