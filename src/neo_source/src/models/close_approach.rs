//! Upcoming close approaches after a refreshed orbit solution.
//!
//! When an object's orbit is re-determined, the approaches that lie after the new
//! determination date are the ones whose predictions actually changed. The sync
//! engine reports them alongside a superseded snapshot.

use chrono::NaiveDateTime;

use crate::models::neo::CloseApproach;

/// Format of `orbital_data.orbit_determination_date`.
pub const ORBIT_DETERMINATION_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Format of `close_approach_data[].close_approach_date_full`.
pub const CLOSE_APPROACH_FORMAT: &str = "%Y-%b-%d %H:%M";

/// Returns the approaches dated strictly after `current_determination`.
///
/// Yields `None` when the current determination is not strictly newer than
/// `previous_determination`, when either date does not parse, or when no
/// approach lies in the future of the new solution. Approaches with a missing
/// or unparseable date are ignored.
pub fn future_close_approaches<'a>(
    approaches: &'a [CloseApproach],
    current_determination: &str,
    previous_determination: &str,
) -> Option<Vec<&'a CloseApproach>> {
    let current =
        NaiveDateTime::parse_from_str(current_determination, ORBIT_DETERMINATION_FORMAT).ok()?;
    let previous =
        NaiveDateTime::parse_from_str(previous_determination, ORBIT_DETERMINATION_FORMAT).ok()?;

    if current <= previous {
        return None;
    }

    let upcoming: Vec<&CloseApproach> = approaches
        .iter()
        .filter(|a| {
            a.close_approach_date_full
                .as_deref()
                .and_then(|d| NaiveDateTime::parse_from_str(d, CLOSE_APPROACH_FORMAT).ok())
                .is_some_and(|d| d > current)
        })
        .collect();

    if upcoming.is_empty() { None } else { Some(upcoming) }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approaches(dates: &[&str]) -> Vec<CloseApproach> {
        dates
            .iter()
            .map(|d| CloseApproach {
                close_approach_date_full: Some((*d).to_string()),
            })
            .collect()
    }

    #[test]
    fn equal_determination_dates_yield_none() {
        let data = approaches(&["2030-Jan-01 12:00"]);
        assert!(
            future_close_approaches(&data, "2001-01-05 12:00:00", "2001-01-05 12:00:00").is_none()
        );
    }

    #[test]
    fn older_determination_date_yields_none() {
        let data = approaches(&["2030-Jan-01 12:00"]);
        assert!(
            future_close_approaches(&data, "2001-01-04 12:00:00", "2001-01-05 12:00:00").is_none()
        );
    }

    #[test]
    fn newer_determination_keeps_only_later_approaches() {
        let data = approaches(&[
            "2000-Jan-01 12:00",
            "2001-Jan-01 12:00",
            "2002-Jan-01 12:00",
            "2003-Jan-01 12:00",
        ]);

        let upcoming =
            future_close_approaches(&data, "2001-01-06 12:00:00", "2001-01-05 12:00:00").unwrap();
        let dates: Vec<&str> = upcoming
            .iter()
            .filter_map(|a| a.close_approach_date_full.as_deref())
            .collect();
        assert_eq!(dates, vec!["2002-Jan-01 12:00", "2003-Jan-01 12:00"]);
    }

    #[test]
    fn no_later_approaches_yields_none() {
        let data = approaches(&["2000-Jan-01 12:00", "2001-Jan-02 12:00"]);
        assert!(
            future_close_approaches(&data, "2001-01-05 12:00:00", "2001-01-01 12:00:00").is_none()
        );
    }

    #[test]
    fn unparseable_dates_are_ignored() {
        let mut data = approaches(&["not a date", "2040-Mar-15 08:30"]);
        data.push(CloseApproach::default());

        let upcoming =
            future_close_approaches(&data, "2024-02-01 00:00:00", "2024-01-01 00:00:00").unwrap();
        assert_eq!(upcoming.len(), 1);

        assert!(future_close_approaches(&data, "garbage", "2024-01-01 00:00:00").is_none());
    }
}
