//! Non-destructive merge of a date partition into the stored aggregate.
//!
//! Singular fields (sign-in, sign-out) keep their stored value; a new value
//! only fills an empty slot. List fields are merged against the stored lists
//! by identity key (kind + timestamp) before the write, so a re-scrape of the
//! same day does not duplicate rows. The stored record wins a collision,
//! except that an open nap picks up the end time a later scrape reports.

use std::collections::HashSet;

use chrono::NaiveDate;
use kidpulse_core::{ChildSummary, DailySummary, EventRecord, IdentityKey, NapEvent, Result};
use kidpulse_store::SummaryStore;
use tracing::debug;

/// Merge one child's new events into its stored summary.
///
/// Returns the number of records added or updated.
pub fn merge_child(stored: &mut ChildSummary, new: &ChildSummary) -> usize {
    let mut changed = 0;

    let new_sign_in = new.all_sign_ins().into_iter().min();
    if stored.sign_in.is_none() && new_sign_in.is_some() {
        stored.sign_in = new_sign_in;
        changed += 1;
    }
    let new_sign_out = new.all_sign_outs().into_iter().max();
    if stored.sign_out.is_none() && new_sign_out.is_some() {
        stored.sign_out = new_sign_out;
        changed += 1;
    }

    let mut seen: HashSet<IdentityKey> = stored.records().iter().map(EventRecord::identity_key).collect();
    for record in new.records() {
        let key = record.identity_key();
        match record {
            EventRecord::SignIn(_) | EventRecord::SignOut(_) => {}
            EventRecord::Napping(nap) if seen.contains(&key) => {
                if close_open_nap(&mut stored.naps, &nap) {
                    changed += 1;
                }
            }
            record => {
                if seen.insert(key) {
                    stored.push(record);
                    changed += 1;
                }
            }
        }
    }

    stored.collapse_attendance();
    stored.retain_single_active_nap();
    changed
}

/// Fill in the end (and position) of a stored open nap with the same start.
fn close_open_nap(naps: &mut [NapEvent], update: &NapEvent) -> bool {
    let Some(existing) = naps.iter_mut().find(|n| n.start == update.start) else {
        return false;
    };
    let mut changed = false;
    if existing.end.is_none() && update.end.is_some() {
        existing.end = update.end;
        changed = true;
    }
    if existing.position.is_none() && update.position.is_some() {
        existing.position = update.position.clone();
        changed = true;
    }
    changed
}

/// Merge a date partition into the stored aggregate for that date.
pub fn merge_summaries(existing: Option<DailySummary>, partial: &DailySummary) -> DailySummary {
    let mut merged = existing.unwrap_or_else(|| DailySummary::new(partial.date));
    for (name, child) in &partial.children {
        let changed = merge_child(merged.child_mut(name), child);
        debug!("Merged {} changes for {} on {}", changed, name, partial.date);
    }
    merged
}

/// Read-modify-write one date in the store. Atomic per date.
pub fn merge_into_store(
    store: &dyn SummaryStore,
    date: NaiveDate,
    partial: &DailySummary,
) -> Result<DailySummary> {
    store.update_summary(date, &|existing| merge_summaries(existing, partial))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;
    use kidpulse_core::*;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 1, 30)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn diaper(time: NaiveDateTime, diaper_type: DiaperType) -> EventRecord {
        EventRecord::Diaper(DiaperEvent {
            time,
            diaper_type,
            notes: None,
        })
    }

    fn nap(start: NaiveDateTime, end: Option<NaiveDateTime>, position: Option<&str>) -> NapEvent {
        NapEvent {
            start,
            end,
            position: position.map(str::to_string),
        }
    }

    #[test]
    fn test_stored_attendance_preserved() {
        let mut stored = ChildSummary::new("Jane Doe");
        stored.sign_in = Some(at(8, 0));

        let mut new = ChildSummary::new("Jane Doe");
        new.push(EventRecord::SignIn(at(7, 30)));
        new.push(EventRecord::SignOut(at(17, 0)));

        assert_eq!(merge_child(&mut stored, &new), 1);
        assert_eq!(stored.sign_in, Some(at(8, 0)));
        assert_eq!(stored.sign_out, Some(at(17, 0)));
    }

    #[test]
    fn test_rescrape_does_not_duplicate() {
        let mut stored = ChildSummary::new("Jane Doe");
        stored.push(diaper(at(9, 0), DiaperType::Wet));

        let mut new = ChildSummary::new("Jane Doe");
        new.push(diaper(at(9, 0), DiaperType::Bm));
        new.push(diaper(at(11, 0), DiaperType::Dry));

        assert_eq!(merge_child(&mut stored, &new), 1);
        assert_eq!(stored.diapers.len(), 2);
        assert_eq!(stored.diapers[0].diaper_type, DiaperType::Wet);
        assert_eq!(stored.diapers[1].time, at(11, 0));
    }

    #[test]
    fn test_same_time_different_kind_is_kept() {
        let mut stored = ChildSummary::new("Jane Doe");
        stored.push(diaper(at(9, 0), DiaperType::Wet));

        let mut new = ChildSummary::new("Jane Doe");
        new.push(EventRecord::Fluids(FluidsEvent {
            time: at(9, 0),
            ounces: 2.0,
            meal_label: None,
        }));

        merge_child(&mut stored, &new);
        assert_eq!(stored.diapers.len(), 1);
        assert_eq!(stored.fluids.len(), 1);
    }

    #[test]
    fn test_open_nap_gets_closed() {
        let mut stored = ChildSummary::new("Jane Doe");
        stored.naps.push(nap(at(13, 0), None, None));

        let mut new = ChildSummary::new("Jane Doe");
        new.naps.push(nap(at(13, 0), Some(at(14, 30)), Some("Back")));

        assert_eq!(merge_child(&mut stored, &new), 1);
        assert_eq!(stored.naps.len(), 1);
        assert_eq!(stored.naps[0].duration_minutes(), Some(90));
        assert_eq!(stored.naps[0].position.as_deref(), Some("Back"));
    }

    #[test]
    fn test_closed_nap_not_reopened() {
        let mut stored = ChildSummary::new("Jane Doe");
        stored.naps.push(nap(at(13, 0), Some(at(14, 0)), None));

        let mut new = ChildSummary::new("Jane Doe");
        new.naps.push(nap(at(13, 0), None, None));

        assert_eq!(merge_child(&mut stored, &new), 0);
        assert_eq!(stored.naps[0].end, Some(at(14, 0)));
    }

    #[test]
    fn test_merge_summaries_creates_and_adds_children() {
        let date = at(0, 0).date();
        let mut partial = DailySummary::new(date);
        partial.child_mut("Jane Doe").push(EventRecord::SignIn(at(8, 0)));

        let first = merge_summaries(None, &partial);
        assert_eq!(first.date, date);
        assert_eq!(first.children["Jane Doe"].sign_in, Some(at(8, 0)));

        let mut partial = DailySummary::new(date);
        partial.child_mut("Sam Doe").push(EventRecord::SignIn(at(8, 15)));
        let second = merge_summaries(Some(first), &partial);
        assert_eq!(second.children.len(), 2);
        assert_eq!(second.children["Jane Doe"].sign_in, Some(at(8, 0)));
    }
}
