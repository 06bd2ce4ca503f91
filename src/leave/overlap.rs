use crate::leave::error::LeaveResult;
use crate::leave::registry::LeaveRangeStore;
use crate::model::leave_request::DateRange;

/// Returns the first stored range that overlaps `candidate`.
pub fn find_overlap<'a, I>(candidate: &DateRange, ranges: I) -> Option<DateRange>
where
    I: IntoIterator<Item = &'a DateRange>,
{
    ranges.into_iter().find(|r| r.overlaps(candidate)).copied()
}

/// True when any approved range of `employee_id` overlaps `candidate`.
/// An employee with no approved leave never overlaps.
pub async fn has_overlap(
    store: &dyn LeaveRangeStore,
    employee_id: u64,
    candidate: &DateRange,
) -> LeaveResult<bool> {
    let ranges = store.ranges_for(employee_id).await?;
    Ok(find_overlap(candidate, &ranges).is_some())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn range(from: (u32, u32), to: (u32, u32)) -> DateRange {
        DateRange::new(
            NaiveDate::from_ymd_opt(2024, from.0, from.1).unwrap(),
            NaiveDate::from_ymd_opt(2024, to.0, to.1).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_find_overlap_returns_clashing_range() {
        let stored = vec![range((1, 1), (1, 5)), range((2, 1), (2, 10))];
        let hit = find_overlap(&range((2, 5), (2, 15)), &stored);
        assert_eq!(hit, Some(range((2, 1), (2, 10))));
    }

    #[test]
    fn test_adjacent_ranges_do_not_overlap() {
        let stored = vec![range((2, 1), (2, 10))];
        assert!(find_overlap(&range((2, 11), (2, 12)), &stored).is_none());
        assert!(find_overlap(&range((1, 20), (1, 31)), &stored).is_none());
    }

    #[test]
    fn test_enclosing_range_overlaps() {
        let stored = vec![range((2, 3), (2, 4))];
        assert!(find_overlap(&range((2, 1), (2, 28)), &stored).is_some());
    }

    #[test]
    fn test_empty_set_never_overlaps() {
        assert!(find_overlap(&range((2, 1), (2, 28)), &[]).is_none());
    }
}
