use chrono::NaiveDate;
use licencias::{HolidayCalendar, business_days};

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

#[test]
fn test_known_spans() {
    // 2024-01-01 is a Monday
    assert_eq!(business_days(d(2024, 1, 1), d(2024, 1, 10), None), 8);
    assert_eq!(business_days(d(2024, 1, 1), d(2024, 1, 7), None), 5);
    assert_eq!(business_days(d(2024, 2, 1), d(2024, 2, 29), None), 21);
}

#[test]
fn test_single_day_boundaries() {
    assert_eq!(business_days(d(2024, 1, 5), d(2024, 1, 5), None), 1);
    assert_eq!(business_days(d(2024, 1, 6), d(2024, 1, 6), None), 0);
    assert_eq!(business_days(d(2024, 1, 7), d(2024, 1, 7), None), 0);

    let holidays: HolidayCalendar = [d(2024, 1, 5)].into_iter().collect();
    assert_eq!(business_days(d(2024, 1, 5), d(2024, 1, 5), Some(&holidays)), 0);
}

#[test]
fn test_symmetric_and_repeatable() {
    let holidays = HolidayCalendar::parse_list("2024-03-28,2024-03-29,2024-05-01").unwrap();
    let pairs = [
        (d(2024, 1, 1), d(2024, 12, 31)),
        (d(2024, 3, 25), d(2024, 4, 5)),
        (d(2023, 12, 30), d(2024, 1, 2)),
    ];
    for (a, b) in pairs {
        let first = business_days(a, b, Some(&holidays));
        assert_eq!(first, business_days(b, a, Some(&holidays)));
        assert_eq!(first, business_days(a, b, Some(&holidays)));
    }
}

#[test]
fn test_empty_holidays_equal_none() {
    let empty = HolidayCalendar::new();
    for month in 1..=12 {
        let start = d(2024, month, 1);
        let end = d(2024, month, 28);
        assert_eq!(
            business_days(start, end, Some(&empty)),
            business_days(start, end, None)
        );
    }
}

#[test]
fn test_holidays_only_remove_weekdays() {
    // Good Friday 2024-03-29 plus a Saturday that would not count anyway
    let holidays: HolidayCalendar = [d(2024, 3, 29), d(2024, 3, 30)].into_iter().collect();
    assert_eq!(business_days(d(2024, 3, 25), d(2024, 3, 31), None), 5);
    assert_eq!(business_days(d(2024, 3, 25), d(2024, 3, 31), Some(&holidays)), 4);
}
