use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::model::{Badge, Block, ItemId, ItemStore, Milestone};

fn default_zoom() -> f32 {
    1.0
}

/// The persisted document, matching the wire shape collaborators expect.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub timeline: TimelineSection,
    #[serde(default)]
    pub off_timeline: OffTimelineSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineSection {
    #[serde(default)]
    pub items: Vec<WireItem>,
    #[serde(default)]
    pub annotations: Vec<WireItem>,
    #[serde(default = "default_zoom")]
    pub zoom: f32,
    #[serde(default)]
    pub scroll_position: f32,
    /// Absent in some older documents; defaults to today on load.
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub last_badge_value: Badge,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OffTimelineSection {
    #[serde(default)]
    pub blocks: Vec<WireItem>,
}

/// One tagged entry in the `items`/`annotations` arrays.
///
/// Blocks may carry a legacy `startDay` (milestones: `day`) relative-day
/// field instead of an absolute date; those are migrated on load against
/// the document's `startDate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum WireItem {
    #[serde(rename_all = "camelCase")]
    Block {
        id: ItemId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        start_date: Option<NaiveDate>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        start_day: Option<i64>,
        duration: i64,
        #[serde(default)]
        label: String,
        #[serde(default)]
        row: usize,
        #[serde(default)]
        badge: Badge,
    },
    #[serde(rename_all = "camelCase")]
    Milestone {
        id: ItemId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        date: Option<NaiveDate>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        day: Option<i64>,
        #[serde(default)]
        row: usize,
        #[serde(default)]
        text: String,
    },
}

enum ParsedItem {
    Block(Block),
    Milestone(Milestone),
}

fn parse_item(item: WireItem, origin: NaiveDate) -> Result<ParsedItem, String> {
    match item {
        WireItem::Block {
            id,
            start_date,
            start_day,
            duration,
            label,
            row,
            badge,
        } => {
            let date = start_date
                .or_else(|| start_day.map(|d| origin + chrono::Duration::days(d)))
                .ok_or_else(|| format!("block {}: missing startDate", id))?;
            Ok(ParsedItem::Block(Block {
                id,
                start_date: date,
                duration,
                row,
                label,
                badge,
            }))
        }
        WireItem::Milestone {
            id,
            date,
            day,
            row,
            text,
        } => {
            let date = date
                .or_else(|| day.map(|d| origin + chrono::Duration::days(d)))
                .ok_or_else(|| format!("milestone {}: missing date", id))?;
            Ok(ParsedItem::Milestone(Milestone {
                id,
                date,
                row,
                text,
            }))
        }
    }
}

impl Document {
    pub fn from_store(store: &ItemStore) -> Self {
        let block_wire = |b: &Block| WireItem::Block {
            id: b.id,
            start_date: Some(b.start_date),
            start_day: None,
            duration: b.duration,
            label: b.label.clone(),
            row: b.row,
            badge: b.badge,
        };
        Self {
            timeline: TimelineSection {
                items: store.blocks().iter().map(block_wire).collect(),
                annotations: store
                    .milestones()
                    .iter()
                    .map(|m| WireItem::Milestone {
                        id: m.id,
                        date: Some(m.date),
                        day: None,
                        row: m.row,
                        text: m.text.clone(),
                    })
                    .collect(),
                zoom: store.zoom(),
                scroll_position: store.scroll_position(),
                start_date: Some(store.start_date()),
                last_badge_value: store.last_badge(),
            },
            off_timeline: OffTimelineSection {
                blocks: store.off_timeline_blocks().iter().map(block_wire).collect(),
            },
        }
    }

    /// Build a store from the document, migrating legacy relative-day
    /// entries. Fails wholesale on any malformed entry; the caller keeps
    /// its current store in that case.
    pub fn into_store(self) -> Result<ItemStore, String> {
        let origin = self
            .timeline
            .start_date
            .unwrap_or_else(|| chrono::Local::now().date_naive());

        let mut blocks = Vec::new();
        let mut milestones = Vec::new();
        for item in self
            .timeline
            .items
            .into_iter()
            .chain(self.timeline.annotations)
        {
            match parse_item(item, origin)? {
                ParsedItem::Block(b) => blocks.push(b),
                ParsedItem::Milestone(m) => milestones.push(m),
            }
        }

        let mut off_timeline = Vec::new();
        for item in self.off_timeline.blocks {
            match parse_item(item, origin)? {
                ParsedItem::Block(b) => off_timeline.push(b),
                ParsedItem::Milestone(m) => {
                    return Err(format!("milestone {} in offTimeline blocks", m.id));
                }
            }
        }

        Ok(ItemStore::from_parts(
            origin,
            blocks,
            milestones,
            off_timeline,
            self.timeline.zoom,
            self.timeline.scroll_position,
            self.timeline.last_badge_value,
        ))
    }
}
