use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::StatsSource;
use crate::problem::Difficulty;

/// Field whose values are ranked in `top_topics`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupingField {
    Difficulty,
    #[default]
    TopicTags,
}

impl GroupingField {
    pub fn as_str(&self) -> &'static str {
        match self {
            GroupingField::Difficulty => "difficulty",
            GroupingField::TopicTags => "topic_tags",
        }
    }
}

impl fmt::Display for GroupingField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GroupingField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "difficulty" => Ok(GroupingField::Difficulty),
            "topic_tags" | "topics" | "tags" => Ok(GroupingField::TopicTags),
            other => Err(format!("unknown grouping field '{}'", other)),
        }
    }
}

/// One ranked group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicCount {
    pub topic: String,
    pub count: u64,
}

/// Summary of a set of problems.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticsSummary {
    pub total_count: u64,
    /// Always holds all three difficulties.
    pub count_by_difficulty: BTreeMap<Difficulty, u64>,
    pub top_topics: Vec<TopicCount>,
}

/// Group, count and rank `items` by `field`.
///
/// Ranking is by descending count; ties keep the order in which groups
/// were first seen. A record contributes once per distinct tag. `top_n <= 0`
/// yields an empty ranking.
pub fn summarize<T: StatsSource>(
    items: &[T],
    field: GroupingField,
    top_n: i64,
) -> StatisticsSummary {
    let mut count_by_difficulty: BTreeMap<Difficulty, u64> =
        Difficulty::ALL.iter().map(|d| (*d, 0)).collect();

    // Insertion-ordered counter
    let mut order: Vec<String> = Vec::new();
    let mut counts: HashMap<String, u64> = HashMap::new();
    let mut bump = |key: &str| match counts.get_mut(key) {
        Some(count) => *count += 1,
        None => {
            order.push(key.to_string());
            counts.insert(key.to_string(), 1);
        }
    };

    for item in items {
        *count_by_difficulty.entry(item.difficulty()).or_insert(0) += 1;

        match field {
            GroupingField::Difficulty => bump(item.difficulty().as_str()),
            GroupingField::TopicTags => {
                let mut seen = HashSet::new();
                for tag in item.topic_tags() {
                    if seen.insert(tag.as_str()) {
                        bump(tag);
                    }
                }
            }
        }
    }

    let top_topics = if top_n <= 0 {
        Vec::new()
    } else {
        let mut ranked: Vec<TopicCount> = order
            .into_iter()
            .map(|topic| {
                let count = counts.get(&topic).copied().unwrap_or(0);
                TopicCount { topic, count }
            })
            .collect();
        // sort_by is stable, so equal counts keep first-seen order
        ranked.sort_by(|a, b| b.count.cmp(&a.count));
        ranked.truncate(usize::try_from(top_n).unwrap_or(usize::MAX));
        ranked
    };

    StatisticsSummary {
        total_count: items.len() as u64,
        count_by_difficulty,
        top_topics,
    }
}
