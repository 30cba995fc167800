//! Leaderboard returned by the score sink.

use serde::{Deserialize, Serialize};

/// One player's cumulative score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub username: String,
    #[serde(
        rename = "totalScore",
        alias = "total_score",
        alias = "pontuacao_total"
    )]
    pub total_score: u64,
}

/// A ranked entry borrowed from a [`Leaderboard`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankedEntry<'a> {
    /// 1-based position.
    pub rank: usize,
    pub entry: &'a LeaderboardEntry,
}

/// Leaderboard as delivered by `GET /ranking`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Leaderboard {
    #[serde(default)]
    pub ranking: Vec<LeaderboardEntry>,
}

impl Leaderboard {
    pub fn new(ranking: Vec<LeaderboardEntry>) -> Self {
        Self { ranking }
    }

    /// Entries by descending score. Equal scores keep the order the sink
    /// delivered them in.
    pub fn ranked(&self) -> Vec<RankedEntry<'_>> {
        let mut entries: Vec<&LeaderboardEntry> = self.ranking.iter().collect();
        entries.sort_by(|a, b| b.total_score.cmp(&a.total_score));
        entries
            .into_iter()
            .enumerate()
            .map(|(i, entry)| RankedEntry {
                rank: i + 1,
                entry,
            })
            .collect()
    }

    /// 1-based rank of `username`, if present.
    pub fn rank_of(&self, username: &str) -> Option<usize> {
        self.ranked()
            .into_iter()
            .find(|r| r.entry.username == username)
            .map(|r| r.rank)
    }

    pub fn is_empty(&self) -> bool {
        self.ranking.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ranking.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(username: &str, total_score: u64) -> LeaderboardEntry {
        LeaderboardEntry {
            username: username.into(),
            total_score,
        }
    }

    #[test]
    fn ranks_by_descending_score() {
        let board = Leaderboard::new(vec![entry("ana", 10), entry("bia", 30), entry("caio", 20)]);
        let names: Vec<_> = board
            .ranked()
            .iter()
            .map(|r| (r.rank, r.entry.username.as_str()))
            .collect();
        assert_eq!(names, vec![(1, "bia"), (2, "caio"), (3, "ana")]);
    }

    #[test]
    fn ties_keep_input_order() {
        let board = Leaderboard::new(vec![
            entry("zeca", 20),
            entry("ana", 20),
            entry("bia", 40),
            entry("davi", 20),
        ]);
        let names: Vec<_> = board
            .ranked()
            .iter()
            .map(|r| r.entry.username.clone())
            .collect();
        assert_eq!(names, vec!["bia", "zeca", "ana", "davi"]);
    }

    #[test]
    fn rank_of_finds_user() {
        let board = Leaderboard::new(vec![entry("ana", 10), entry("bia", 30)]);
        assert_eq!(board.rank_of("ana"), Some(2));
        assert_eq!(board.rank_of("caio"), None);
    }

    #[test]
    fn parses_wire_and_legacy_field_names() {
        let board: Leaderboard = serde_json::from_str(
            r#"{"ranking": [{"username": "ana", "totalScore": 40},
                            {"username": "bia", "pontuacao_total": 20}]}"#,
        )
        .unwrap();
        assert_eq!(board.len(), 2);
        assert_eq!(board.ranking[1].total_score, 20);

        let json = serde_json::to_value(&board.ranking[0]).unwrap();
        assert_eq!(json["totalScore"], 40);
    }
}
