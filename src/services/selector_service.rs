use chrono::NaiveDate;

use crate::error::{Error, Result};
use crate::utils::time::days_since_epoch;

/// Picks the question of the day.
///
/// Ids are sorted and indexed by the number of days since the Unix epoch, so
/// the choice only depends on the date and the id set.
pub fn today_question_id<'a, I>(ids: I, today: NaiveDate) -> Result<String>
where
    I: IntoIterator<Item = &'a String>,
{
    let mut ids: Vec<&String> = ids.into_iter().collect();
    if ids.is_empty() {
        return Err(Error::EmptySet);
    }
    ids.sort();
    ids.dedup();

    let idx = days_since_epoch(today).rem_euclid(ids.len() as i64) as usize;
    Ok(ids[idx].clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn same_date_gives_same_question() {
        let set = ids(&["q3", "q1", "q2"]);
        let day = date(2024, 5, 17);
        let first = today_question_id(&set, day).unwrap();
        for _ in 0..10 {
            assert_eq!(today_question_id(&set, day).unwrap(), first);
        }
    }

    #[test]
    fn input_order_does_not_matter() {
        let day = date(2024, 5, 17);
        let a = today_question_id(&ids(&["q1", "q2", "q3"]), day).unwrap();
        let b = today_question_id(&ids(&["q3", "q2", "q1"]), day).unwrap();
        let set: BTreeSet<String> = ids(&["q2", "q3", "q1"]).into_iter().collect();
        let c = today_question_id(&set, day).unwrap();
        assert_eq!(a, b);
        assert_eq!(a, c);
    }

    #[test]
    fn consecutive_days_rotate_through_sorted_ids() {
        let set = ids(&["b", "a", "c"]);
        // 1970-01-01 is day zero.
        assert_eq!(today_question_id(&set, date(1970, 1, 1)).unwrap(), "a");
        assert_eq!(today_question_id(&set, date(1970, 1, 2)).unwrap(), "b");
        assert_eq!(today_question_id(&set, date(1970, 1, 3)).unwrap(), "c");
        assert_eq!(today_question_id(&set, date(1970, 1, 4)).unwrap(), "a");
    }

    #[test]
    fn dates_before_epoch_still_select() {
        let set = ids(&["a", "b", "c"]);
        assert_eq!(today_question_id(&set, date(1969, 12, 31)).unwrap(), "c");
    }

    #[test]
    fn empty_set_is_an_error() {
        let empty: Vec<String> = Vec::new();
        let err = today_question_id(&empty, date(2024, 1, 1)).unwrap_err();
        assert!(matches!(err, Error::EmptySet));
    }
}
