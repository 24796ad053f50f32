//! End-of-round ranking

use super::registry::Participant;

/// Shown for participants that never set a name
pub const ANONYMOUS: &str = "Anonymous";

#[derive(Debug, Clone, PartialEq)]
pub struct RankEntry {
    pub avatar: &'static str,
    pub name: String,
    pub score: u32,
    pub scored: Vec<&'static str>,
}

/// Frozen result of a finished round
#[derive(Debug, Clone, PartialEq)]
pub struct RoundSummary {
    pub final_score: u32,
    pub final_combo: u32,
    /// Descending score, ties in encounter order
    pub ranking: Vec<RankEntry>,
}

impl RoundSummary {
    pub fn build<'a>(
        final_score: u32,
        final_combo: u32,
        participants: impl IntoIterator<Item = &'a Participant>,
    ) -> Self {
        let mut ranking: Vec<RankEntry> = participants
            .into_iter()
            .map(|p| RankEntry {
                avatar: p.avatar,
                name: display_name(&p.name).to_string(),
                score: p.score,
                scored: p.scored.clone(),
            })
            .collect();
        // sort_by is stable
        ranking.sort_by(|a, b| b.score.cmp(&a.score));

        Self {
            final_score,
            final_combo,
            ranking,
        }
    }

    /// Plain-text rendition for logs and the terminal
    pub fn lines(&self) -> Vec<String> {
        let mut lines = vec![
            format!("Final score: {}", self.final_score),
            format!("Final combo: {}", self.final_combo),
        ];
        if self.ranking.is_empty() {
            lines.push("No participants".to_string());
            return lines;
        }
        for (place, entry) in self.ranking.iter().enumerate() {
            lines.push(format!(
                "{}. {} {} {} {}",
                place + 1,
                entry.avatar,
                entry.name,
                entry.score,
                entry.scored.concat()
            ));
        }
        lines
    }
}

/// Placeholder for an empty name
pub fn display_name(name: &str) -> &str {
    if name.is_empty() {
        ANONYMOUS
    } else {
        name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn participant(n: u128, name: &str, score: u32) -> Participant {
        Participant {
            id: Uuid::from_u128(n),
            name: name.to_string(),
            avatar: "🐝",
            score,
            scored: vec!["🍎"; (score / 10) as usize],
            x: 0.0,
            y: 0.0,
            motion: (0.0, 0.0),
            updated_ms: 0,
        }
    }

    #[test]
    fn ranks_descending_and_keeps_tie_order() {
        let people = [
            participant(1, "a", 10),
            participant(2, "", 30),
            participant(3, "c", 10),
        ];
        let summary = RoundSummary::build(120, 4, people.iter());

        let names: Vec<&str> = summary.ranking.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec![ANONYMOUS, "a", "c"]);
        assert_eq!(summary.ranking[0].scored.len(), 3);
        assert_eq!(summary.lines()[2], "1. 🐝 Anonymous 30 🍎🍎🍎");
    }

    #[test]
    fn empty_ranking_says_so() {
        let summary = RoundSummary::build(0, 0, std::iter::empty());
        assert_eq!(summary.lines().last().map(String::as_str), Some("No participants"));
    }
}
