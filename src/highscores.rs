//! High score leaderboard system
//!
//! Tracks the top 10 scores in memory. The table is serde-serializable so
//! the host can persist it however it likes.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Maximum number of high scores to keep
pub const MAX_HIGH_SCORES: usize = 10;
/// Longest name accepted on the entry screen
pub const MAX_NAME_LENGTH: usize = 16;

/// A single high score entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighScoreEntry {
    pub name: String,
    pub score: u64,
    /// Level reached
    pub level: u32,
}

/// High score leaderboard, sorted by descending score
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HighScores {
    pub entries: Vec<HighScoreEntry>,
}

impl HighScores {
    /// Create empty leaderboard
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// A score qualifies while the table has free slots or when it beats
    /// the lowest entry
    pub fn qualifies(&self, score: u64) -> bool {
        if self.entries.len() < MAX_HIGH_SCORES {
            return true;
        }
        self.entries.last().is_none_or(|e| score > e.score)
    }

    /// Add a new score, returning its 1-indexed rank
    pub fn add_score(&mut self, name: &str, score: u64, level: u32) -> Result<usize> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::HighscoreNameEmpty);
        }
        let len = name.chars().count();
        if len > MAX_NAME_LENGTH {
            return Err(Error::HighscoreNameTooLong {
                len,
                max: MAX_NAME_LENGTH,
            });
        }
        if !self.qualifies(score) {
            return Err(Error::ScoreNotQualified { score });
        }

        let entry = HighScoreEntry {
            name: name.to_string(),
            score,
            level,
        };

        // Ties go below existing entries
        let pos = self
            .entries
            .iter()
            .position(|e| score > e.score)
            .unwrap_or(self.entries.len());
        self.entries.insert(pos, entry);
        self.entries.truncate(MAX_HIGH_SCORES);

        log::info!("New highscore #{}: {} ({})", pos + 1, name, score);
        Ok(pos + 1)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn top_score(&self) -> Option<u64> {
        self.entries.first().map(|e| e.score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_table() -> HighScores {
        let mut scores = HighScores::new();
        for i in 0..MAX_HIGH_SCORES as u64 {
            scores.add_score("AAA", (i + 1) * 100, 1).unwrap();
        }
        scores
    }

    #[test]
    fn test_empty_table_accepts_zero() {
        let scores = HighScores::new();
        assert!(scores.qualifies(0));
    }

    #[test]
    fn test_full_table_requires_beating_lowest() {
        let scores = full_table();
        assert_eq!(scores.entries.len(), MAX_HIGH_SCORES);
        assert!(!scores.qualifies(100));
        assert!(scores.qualifies(101));
    }

    #[test]
    fn test_add_score_ranks_and_truncates() {
        let mut scores = full_table();
        let rank = scores.add_score("BOB", 550, 4).unwrap();
        assert_eq!(rank, 6);
        assert_eq!(scores.entries.len(), MAX_HIGH_SCORES);
        assert_eq!(scores.top_score(), Some(1000));
        assert_eq!(scores.entries.last().map(|e| e.score), Some(200));
    }

    #[test]
    fn test_add_score_rejects_bad_names() {
        let mut scores = HighScores::new();
        assert!(matches!(
            scores.add_score("   ", 10, 1),
            Err(Error::HighscoreNameEmpty)
        ));
        let long = "X".repeat(MAX_NAME_LENGTH + 1);
        assert!(matches!(
            scores.add_score(&long, 10, 1),
            Err(Error::HighscoreNameTooLong { .. })
        ));
        assert!(scores.is_empty());
    }

    #[test]
    fn test_add_score_not_qualified() {
        let mut scores = full_table();
        assert!(matches!(
            scores.add_score("LOW", 50, 1),
            Err(Error::ScoreNotQualified { score: 50 })
        ));
    }
}
