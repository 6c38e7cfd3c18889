use super::item::ItemId;
use super::store::ItemStore;

/// The fixed affected set for one resize gesture.
///
/// Captured once at gesture start against the block's pre-resize right
/// edge; re-evaluating mid-gesture would let a just-shifted block drift
/// into the inclusion test and feed back on itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushPlan {
    /// The block being resized.
    pub block: ItemId,
    /// Its duration when the gesture started.
    pub old_duration: i64,
    /// Same-row blocks starting at or after the old right edge, in store
    /// order. Each shifts by the final duration delta at commit.
    pub affected: Vec<ItemId>,
}

/// Compute the push plan for resizing `id`. Returns `None` for unknown ids.
pub fn plan_resize(store: &ItemStore, id: ItemId) -> Option<PushPlan> {
    let resized = store.block(id)?;
    let old_edge = resized.end_date();
    let affected = store
        .blocks()
        .iter()
        .filter(|x| x.id != id && x.row == resized.row && x.start_date >= old_edge)
        .map(|x| x.id)
        .collect();
    Some(PushPlan {
        block: id,
        old_duration: resized.duration,
        affected,
    })
}
