//! Splitting a scrape result by the calendar date of each event.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use kidpulse_core::{ChildSummary, DailySummary};
use tracing::debug;

/// Group every child's events by the date component of their own timestamp.
///
/// The `date` of the input is ignored: it is whatever day the scrape ran on,
/// which says nothing about when the events happened. Each output summary
/// holds one sign-in and one sign-out per child at most, and at most one open
/// nap per child.
pub fn partition_by_date(scrape: &DailySummary) -> BTreeMap<NaiveDate, DailySummary> {
    let mut partitions: BTreeMap<NaiveDate, DailySummary> = BTreeMap::new();

    for child in scrape.children.values() {
        for (date, slice) in partition_child(child) {
            partitions
                .entry(date)
                .or_insert_with(|| DailySummary::new(date))
                .children
                .insert(slice.name.clone(), slice);
        }
    }

    if partitions.len() > 1 {
        debug!(
            "Scrape spans {} dates: {:?}",
            partitions.len(),
            partitions.keys().collect::<Vec<_>>()
        );
    }
    partitions
}

/// Per-date slices of a single child's events.
pub fn partition_child(child: &ChildSummary) -> BTreeMap<NaiveDate, ChildSummary> {
    let mut slices: BTreeMap<NaiveDate, ChildSummary> = BTreeMap::new();

    for record in child.records() {
        slices
            .entry(record.date())
            .or_insert_with(|| ChildSummary::new(child.name.as_str()))
            .push(record);
    }

    for slice in slices.values_mut() {
        slice.collapse_attendance();
        slice.retain_single_active_nap();
    }
    slices
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;
    use kidpulse_core::*;

    fn at(d: u32, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 1, d)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, d).unwrap()
    }

    fn bottle(time: NaiveDateTime) -> EventRecord {
        EventRecord::Bottle(BottleEvent {
            time,
            milk_type: MilkType::Formula,
            ounces_offered: 4.0,
            ounces_consumed: 3.0,
        })
    }

    #[test]
    fn test_partition_by_event_date_not_scrape_date() {
        let mut scrape = DailySummary::new(day(31));
        let child = scrape.child_mut("Jane Doe");
        child.push(bottle(at(29, 9, 0)));
        child.push(bottle(at(30, 9, 0)));

        let parts = partition_by_date(&scrape);
        assert_eq!(parts.keys().copied().collect::<Vec<_>>(), vec![day(29), day(30)]);
        for (date, summary) in &parts {
            assert_eq!(summary.date, *date);
            let bottles = &summary.children["Jane Doe"].bottles;
            assert_eq!(bottles.len(), 1);
            assert_eq!(bottles[0].time.date(), *date);
        }
    }

    #[test]
    fn test_attendance_collapses_per_date() {
        let mut child = ChildSummary::new("Jane Doe");
        child.push(EventRecord::SignIn(at(29, 8, 30)));
        child.push(EventRecord::SignIn(at(29, 7, 55)));
        child.push(EventRecord::SignOut(at(29, 12, 0)));
        child.push(EventRecord::SignOut(at(29, 17, 10)));
        child.push(EventRecord::SignIn(at(30, 8, 5)));

        let slices = partition_child(&child);
        let jan29 = &slices[&day(29)];
        assert_eq!(jan29.sign_in, Some(at(29, 7, 55)));
        assert_eq!(jan29.sign_out, Some(at(29, 17, 10)));
        assert!(jan29.sign_in_events.is_empty());

        let jan30 = &slices[&day(30)];
        assert_eq!(jan30.sign_in, Some(at(30, 8, 5)));
        assert_eq!(jan30.sign_out, None);
    }

    #[test]
    fn test_single_open_nap_per_date() {
        let mut child = ChildSummary::new("Jane Doe");
        for (d, h) in [(29, 13), (30, 10), (30, 13)] {
            child.push(EventRecord::Napping(NapEvent {
                start: at(d, h, 0),
                end: None,
                position: None,
            }));
        }
        child.push(EventRecord::Napping(NapEvent {
            start: at(30, 9, 0),
            end: Some(at(30, 9, 40)),
            position: None,
        }));

        let slices = partition_child(&child);
        assert_eq!(slices[&day(29)].naps.len(), 1);

        let naps = &slices[&day(30)].naps;
        assert_eq!(naps.len(), 2);
        let open: Vec<_> = naps.iter().filter(|n| n.is_active()).collect();
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].start, at(30, 13, 0));
    }

    #[test]
    fn test_children_stay_separate() {
        let mut scrape = DailySummary::new(day(30));
        scrape.child_mut("Jane Doe").push(bottle(at(30, 9, 0)));
        scrape.child_mut("Sam Doe").push(bottle(at(30, 10, 0)));

        let parts = partition_by_date(&scrape);
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[&day(30)].children.len(), 2);
        assert_eq!(parts[&day(30)].children["Sam Doe"].bottles[0].time, at(30, 10, 0));
    }

    #[test]
    fn test_empty_scrape_has_no_partitions() {
        let mut scrape = DailySummary::new(day(30));
        scrape.child_mut("Jane Doe");
        assert!(partition_by_date(&scrape).is_empty());
    }
}
