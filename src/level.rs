//! Lint severity levels.
//!
//! A [`LevelScale`] maps a lint error count to a level number. Level 1 tolerates
//! the most errors and the highest level tolerates none. Scores that fall
//! outside every range, including anything above the widest range, resolve to
//! [`NO_LEVEL`], which callers treat as an automatic failure.

use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Returned when a score or alias matches no level.
pub const NO_LEVEL: i32 = -1;

/// Error counts above this value draw remarks from the uncivilized pool.
pub const UNCIVILIZED_SCORE: u64 = 100;

/// One severity tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Level {
    /// Level number, starting at 1.
    pub number: i32,
    /// Names accepted in place of the number.
    pub aliases: Vec<String>,
    /// Inclusive `[min, max]` error count range.
    pub score_range: [u64; 2],
    /// Remarks shown when a commit lands on this level.
    pub comments: Vec<String>,
}

impl Level {
    fn new(number: i32, aliases: &[&str], score_range: [u64; 2], comments: &[&str]) -> Self {
        Self {
            number,
            aliases: aliases.iter().map(ToString::to_string).collect(),
            score_range,
            comments: comments.iter().map(ToString::to_string).collect(),
        }
    }

    /// Whether `score` lies within the inclusive range.
    #[must_use]
    pub fn contains(&self, score: u64) -> bool {
        score >= self.score_range[0] && score <= self.score_range[1]
    }
}

/// A configured level reference: either the level number or one of its aliases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LevelRef {
    /// Level number.
    Number(i64),
    /// Level alias such as `beginner`.
    Alias(String),
}

impl Default for LevelRef {
    fn default() -> Self {
        Self::Alias("beginner".to_string())
    }
}

impl fmt::Display for LevelRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Alias(alias) => write!(f, "{alias}"),
        }
    }
}

/// Ordered set of levels, scanned first to last.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelScale {
    levels: Vec<Level>,
}

impl Default for LevelScale {
    fn default() -> Self {
        Self::new(vec![
            Level::new(
                1,
                &["beginner", "初级", "初来乍到"],
                [21, 100],
                &["You are at the beginner level. Aim a little higher next time."],
            ),
            Level::new(
                2,
                &["intermediate", "中级", "略有小成"],
                [11, 20],
                &["A step up from beginner. You can do better still."],
            ),
            Level::new(
                3,
                &["merit", "优秀", "渐入佳境"],
                [4, 10],
                &["Not bad at all. A bit more effort and it will be spotless."],
            ),
            Level::new(
                4,
                &["distinction", "卓越", "炉火纯青"],
                [1, 3],
                &["So close to perfect. Why stop here?"],
            ),
            Level::new(
                5,
                &["master", "大师", "登峰造极"],
                [0, 0],
                &[
                    "Keep it up.",
                    "Impressive.",
                    "Clean as a whistle.",
                    "Nothing to see here, in the best way.",
                    "Is this what a senior engineer looks like?",
                    "Ship it.",
                    "Done and dusted.",
                ],
            ),
        ])
    }
}

impl LevelScale {
    /// Creates a scale from explicit levels.
    #[must_use]
    pub const fn new(levels: Vec<Level>) -> Self {
        Self { levels }
    }

    /// The levels in scan order.
    #[must_use]
    pub fn levels(&self) -> &[Level] {
        &self.levels
    }

    /// Looks a level up by number.
    #[must_use]
    pub fn level(&self, number: i32) -> Option<&Level> {
        self.levels.iter().find(|l| l.number == number)
    }

    /// Returns the first level whose range contains `score`, or [`NO_LEVEL`].
    #[must_use]
    pub fn get_level_by_score(&self, score: u64) -> i32 {
        self.levels
            .iter()
            .find(|l| l.contains(score))
            .map_or(NO_LEVEL, |l| l.number)
    }

    /// Resolves a level number (`"3"`) or alias (`"merit"`), or [`NO_LEVEL`].
    #[must_use]
    pub fn get_level_by_alias(&self, alias: &str) -> i32 {
        let number = alias.trim().parse::<i32>().ok();
        self.levels
            .iter()
            .find(|l| Some(l.number) == number || l.aliases.iter().any(|a| a == alias))
            .map_or(NO_LEVEL, |l| l.number)
    }

    /// Resolves a configured level reference.
    #[must_use]
    pub fn resolve(&self, level: &LevelRef) -> i32 {
        self.get_level_by_alias(&level.to_string())
    }
}

/// Supplies the remark shown next to a lint result.
pub trait RemarkProvider {
    /// Returns a remark for an error count of `score` that resolved to `level`.
    fn remark(&self, scale: &LevelScale, level: i32, score: u64) -> String;
}

/// Picks a remark uniformly from the level's comment pool, or from the
/// uncivilized pool once the error count exceeds [`UNCIVILIZED_SCORE`].
#[derive(Debug, Clone)]
pub struct RandomRemarks {
    uncivilized: Vec<String>,
}

impl Default for RandomRemarks {
    fn default() -> Self {
        Self::new(
            [
                "This is not code, this is a crime scene.",
                "The linter needs a holiday after this one.",
                "Over a hundred errors. Please read the style guide.",
                "Did you write this with your elbows?",
                "Tidy up before anyone else sees this.",
            ]
            .iter()
            .map(ToString::to_string)
            .collect(),
        )
    }
}

impl RandomRemarks {
    /// Creates a provider with a custom uncivilized pool.
    #[must_use]
    pub const fn new(uncivilized: Vec<String>) -> Self {
        Self { uncivilized }
    }
}

impl RemarkProvider for RandomRemarks {
    fn remark(&self, scale: &LevelScale, level: i32, score: u64) -> String {
        let mut rng = rand::thread_rng();
        let pool = if score > UNCIVILIZED_SCORE {
            Some(self.uncivilized.as_slice())
        } else {
            scale.level(level).map(|l| l.comments.as_slice())
        };
        pool.and_then(|p| p.choose(&mut rng))
            .cloned()
            .unwrap_or_default()
    }
}
