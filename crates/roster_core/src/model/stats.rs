//! Aggregate projections over the user table.
//!
//! Both statistics serialize as a JSON object whose key order is the
//! projection order (brackets youngest first, domains by descending count).

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// Fixed decade-based age grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AgeBracket {
    /// Everyone under 20.
    Teens,
    Twenties,
    Thirties,
    Forties,
    Fifties,
    /// 60 and older.
    SixtiesAndOver,
}

impl AgeBracket {
    pub const ALL: [AgeBracket; 6] = [
        AgeBracket::Teens,
        AgeBracket::Twenties,
        AgeBracket::Thirties,
        AgeBracket::Forties,
        AgeBracket::Fifties,
        AgeBracket::SixtiesAndOver,
    ];

    pub fn for_age(age: i64) -> Self {
        match age {
            i64::MIN..=19 => Self::Teens,
            20..=29 => Self::Twenties,
            30..=39 => Self::Thirties,
            40..=49 => Self::Forties,
            50..=59 => Self::Fifties,
            _ => Self::SixtiesAndOver,
        }
    }

    /// Position in `ALL`; also the value stored by the grouping query.
    pub fn ordinal(self) -> i64 {
        match self {
            Self::Teens => 0,
            Self::Twenties => 1,
            Self::Thirties => 2,
            Self::Forties => 3,
            Self::Fifties => 4,
            Self::SixtiesAndOver => 5,
        }
    }

    pub fn from_ordinal(value: i64) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|bracket| bracket.ordinal() == value)
    }

    /// Display label used as the statistics key.
    pub fn label(self) -> &'static str {
        match self {
            Self::Teens => "10대",
            Self::Twenties => "20대",
            Self::Thirties => "30대",
            Self::Forties => "40대",
            Self::Fifties => "50대",
            Self::SixtiesAndOver => "60대 이상",
        }
    }
}

/// User counts per age bracket. Brackets with no users are absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AgeStatistics {
    counts: Vec<(AgeBracket, u64)>,
}

impl AgeStatistics {
    /// Builds statistics from arbitrary-order counts, merging duplicates.
    pub fn from_counts(counts: impl IntoIterator<Item = (AgeBracket, u64)>) -> Self {
        let mut merged: Vec<(AgeBracket, u64)> = Vec::new();
        for (bracket, count) in counts {
            if count == 0 {
                continue;
            }
            match merged.iter_mut().find(|(existing, _)| *existing == bracket) {
                Some((_, total)) => *total += count,
                None => merged.push((bracket, count)),
            }
        }
        merged.sort_by_key(|(bracket, _)| *bracket);
        Self { counts: merged }
    }

    /// Count for `bracket`, zero when absent.
    pub fn count(&self, bracket: AgeBracket) -> u64 {
        self.counts
            .iter()
            .find(|(existing, _)| *existing == bracket)
            .map_or(0, |(_, count)| *count)
    }

    pub fn iter(&self) -> impl Iterator<Item = (AgeBracket, u64)> + '_ {
        self.counts.iter().copied()
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().map(|(_, count)| count).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

impl Serialize for AgeStatistics {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.counts.len()))?;
        for (bracket, count) in &self.counts {
            map.serialize_entry(bracket.label(), count)?;
        }
        map.end()
    }
}

/// User counts per email domain, most common first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DomainStatistics {
    counts: Vec<(String, u64)>,
}

impl DomainStatistics {
    /// Keeps the given order; the store already sorts by count.
    pub fn from_ordered(counts: Vec<(String, u64)>) -> Self {
        Self { counts }
    }

    pub fn count(&self, domain: &str) -> u64 {
        self.counts
            .iter()
            .find(|(existing, _)| existing == domain)
            .map_or(0, |(_, count)| *count)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> + '_ {
        self.counts
            .iter()
            .map(|(domain, count)| (domain.as_str(), *count))
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

impl Serialize for DomainStatistics {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.counts.len()))?;
        for (domain, count) in &self.counts {
            map.serialize_entry(domain, count)?;
        }
        map.end()
    }
}
