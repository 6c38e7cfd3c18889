use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier for a block or milestone.
///
/// Ids are handed out monotonically by the store and serialized as strings;
/// on load the counter is reseeded to the highest existing id plus one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct ItemId(pub u64);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<ItemId> for String {
    fn from(id: ItemId) -> Self {
        id.0.to_string()
    }
}

impl TryFrom<String> for ItemId {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value
            .parse::<u64>()
            .map(ItemId)
            .map_err(|_| format!("invalid item id '{}'", value))
    }
}

/// The three-value category badge shown on a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Badge {
    #[default]
    A,
    B,
    C,
}

impl Badge {
    /// The badge after this one in the fixed A → B → C → A cycle.
    pub fn next(self) -> Self {
        match self {
            Badge::A => Badge::B,
            Badge::B => Badge::C,
            Badge::C => Badge::A,
        }
    }

    pub fn letter(self) -> &'static str {
        match self {
            Badge::A => "A",
            Badge::B => "B",
            Badge::C => "C",
        }
    }
}

/// A duration-bearing span on the timeline.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub id: ItemId,
    pub start_date: NaiveDate,
    /// Whole days, never below 1.
    pub duration: i64,
    pub row: usize,
    pub label: String,
    pub badge: Badge,
}

impl Block {
    /// Exclusive right edge: the first date no longer covered by the block.
    pub fn end_date(&self) -> NaiveDate {
        self.start_date + chrono::Duration::days(self.duration)
    }
}

/// A point-in-time annotation anchored at a (date, row) grid intersection.
#[derive(Debug, Clone, PartialEq)]
pub struct Milestone {
    pub id: ItemId,
    pub date: NaiveDate,
    pub row: usize,
    pub text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn badge_cycles_through_all_three() {
        assert_eq!(Badge::A.next(), Badge::B);
        assert_eq!(Badge::B.next(), Badge::C);
        assert_eq!(Badge::C.next(), Badge::A);
    }

    #[test]
    fn item_id_round_trips_through_string() {
        let id = ItemId(42);
        let s: String = id.into();
        assert_eq!(ItemId::try_from(s).unwrap(), id);
        assert!(ItemId::try_from("not-a-number".to_string()).is_err());
    }

    #[test]
    fn block_end_date_is_exclusive() {
        let b = Block {
            id: ItemId(1),
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            duration: 5,
            row: 0,
            label: String::new(),
            badge: Badge::A,
        };
        assert_eq!(b.end_date(), NaiveDate::from_ymd_opt(2024, 1, 6).unwrap());
    }
}
