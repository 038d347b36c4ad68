use crate::models::{DateGroup, HistoryEntry};

/// Partitions entries by calendar date, preserving the store's entry order
/// inside each group and the first-seen order of the dates themselves.
pub fn group_by_date(entries: &[HistoryEntry]) -> Vec<DateGroup> {
    let mut groups: Vec<DateGroup> = Vec::new();

    for entry in entries {
        let date = entry.group_date();
        match groups.iter_mut().find(|group| group.date == date) {
            Some(group) => group.entries.push(entry.clone()),
            None => groups.push(DateGroup {
                date,
                entries: vec![entry.clone()],
            }),
        }
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ImageRef, PredictionResult, RipenessClass};
    use chrono::{DateTime, Utc};

    fn entry_at(stamp: &str) -> HistoryEntry {
        let mut entry = HistoryEntry::new(
            ImageRef::new("/tmp/pomelo.jpg"),
            PredictionResult::from_top_label(RipenessClass::Overripe, 0.7),
        );
        entry.captured_at = stamp.parse::<DateTime<Utc>>().unwrap();
        entry
    }

    #[test]
    fn partitions_by_date_in_first_seen_order() {
        let entries = vec![
            entry_at("2026-08-30T18:00:00Z"),
            entry_at("2026-08-30T09:00:00Z"),
            entry_at("2026-08-29T22:00:00Z"),
            entry_at("2026-08-30T01:00:00Z"),
        ];

        let groups = group_by_date(&entries);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].date.to_string(), "2026-08-30");
        assert_eq!(groups[1].date.to_string(), "2026-08-29");
        assert_eq!(groups[0].entries.len(), 3);
        assert_eq!(groups[1].entries.len(), 1);

        // No entry is lost or duplicated by the projection.
        let total: usize = groups.iter().map(|g| g.entries.len()).sum();
        assert_eq!(total, entries.len());

        // Within a group, the store ordering is preserved.
        assert_eq!(groups[0].entries[0].id, entries[0].id);
        assert_eq!(groups[0].entries[1].id, entries[1].id);
        assert_eq!(groups[0].entries[2].id, entries[3].id);
    }

    #[test]
    fn empty_input_yields_no_groups() {
        assert!(group_by_date(&[]).is_empty());
    }

    #[test]
    fn midnight_boundary_splits_groups_deterministically() {
        let before = entry_at("2026-08-29T23:59:59Z");
        let after = entry_at("2026-08-30T00:00:00Z");

        let groups = group_by_date(&[before, after]);
        assert_eq!(groups.len(), 2);
    }
}
