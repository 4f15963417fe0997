use crate::metadata::VolumeMetadata;
use crate::state::WorkItem;
use std::collections::HashSet;

/// Derives the deduplicated work item list from volume records
///
/// Records missing either the reporter slug or the volume number are skipped.
/// Repeated `(reporter, volume)` pairs collapse to their first occurrence, so
/// the output keeps first-seen order.
pub fn extract_work_items(volumes: &[VolumeMetadata]) -> Vec<WorkItem> {
    let mut seen = HashSet::new();
    let mut items = Vec::new();

    for volume in volumes {
        let Some(reporter) = volume.reporter_slug.as_deref().filter(|s| !s.is_empty()) else {
            continue;
        };
        let Some(number) = volume.volume_number.as_ref().and_then(|n| n.as_segment()) else {
            continue;
        };

        let item = WorkItem::new(reporter, number);
        if seen.insert(item.clone()) {
            items.push(item);
        }
    }

    items
}
