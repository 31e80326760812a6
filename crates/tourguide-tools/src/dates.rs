//! Search window and night-count normalization
//!
//! `datefrom`/`dateto` bound the window of *departure* dates, not the stay.
//! Models regularly confuse the two, so the window is repaired before
//! submission. Corrections are returned so the caller can log and count them.

use crate::coerce::{format_wire_date, parse_wire_date, safe_int};
use crate::error::{Error, Result};
use chrono::{Duration, NaiveDate};
use serde_json::{Map, Value};

/// Width of a repaired departure window, in days
pub const DEFAULT_WINDOW_DAYS: i64 = 2;

/// Shortest stay sold as a package tour
pub const MIN_NIGHTS: i64 = 3;

/// Night count assumed when the request names none
const FALLBACK_NIGHTS: i64 = 7;

/// A silent repair applied to the departure window
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateCorrection {
    /// `dateto` was missing
    EndDefaulted {
        /// New `dateto`
        dateto: NaiveDate,
    },
    /// `dateto` equalled `datefrom`
    EndWidened {
        /// New `dateto`
        dateto: NaiveDate,
    },
    /// `dateto` looked like a return date (`datefrom + nights`)
    EndClamped {
        /// `dateto` as requested
        requested: NaiveDate,
        /// New `dateto`
        dateto: NaiveDate,
        /// Requested window length in days
        span_days: i64,
        /// Night count the span was compared with
        nights: i64,
    },
    /// `datefrom` was in the past
    StartShifted {
        /// `datefrom` as requested
        requested: NaiveDate,
        /// New `datefrom`
        datefrom: NaiveDate,
    },
    /// `dateto` fell before the shifted `datefrom`
    EndShifted {
        /// New `dateto`
        dateto: NaiveDate,
    },
}

/// A silent repair applied to the night range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NightsCorrection {
    /// `nightsfrom` was below [`MIN_NIGHTS`]
    RaisedToMinimum {
        /// Requested value
        requested: i64,
    },
    /// `nightsfrom` exceeded `nightsto`
    CappedAtMaximum {
        /// Value before capping
        requested: i64,
        /// `nightsto`
        nightsto: i64,
    },
}

fn date_arg(args: &Map<String, Value>, key: &str) -> Result<Option<NaiveDate>> {
    match args.get(key).and_then(Value::as_str).map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => parse_wire_date(raw)
            .map(Some)
            .ok_or_else(|| Error::InvalidInput(format!("{key}={raw} is not DD.MM.YYYY"))),
    }
}

fn int_arg(args: &Map<String, Value>, key: &str) -> Option<i64> {
    args.get(key)
        .filter(|v| !v.is_null())
        .map(|v| safe_int(Some(v), 0))
}

/// Repair `datefrom`/`dateto` in place.
///
/// No-op when `datefrom` is absent. Fails without touching `args` when either
/// date is present but unparsable.
pub fn normalize_search_window(
    args: &mut Map<String, Value>,
    today: NaiveDate,
) -> Result<Vec<DateCorrection>> {
    let Some(mut from) = date_arg(args, "datefrom")? else {
        return Ok(Vec::new());
    };
    let requested_to = date_arg(args, "dateto")?;
    let window = Duration::days(DEFAULT_WINDOW_DAYS);
    let mut corrections = Vec::new();

    let mut to = match requested_to {
        None => {
            let to = from + window;
            corrections.push(DateCorrection::EndDefaulted { dateto: to });
            to
        }
        Some(to) if to == from => {
            let to = from + window;
            corrections.push(DateCorrection::EndWidened { dateto: to });
            to
        }
        Some(to) => {
            let nightsfrom = int_arg(args, "nightsfrom");
            let nightsto = int_arg(args, "nightsto");
            let span_days = (to - from).num_days();
            let nights = nightsto
                .filter(|n| *n != 0)
                .or(nightsfrom.filter(|n| *n != 0))
                .unwrap_or(FALLBACK_NIGHTS);
            let has_nights = nightsfrom.is_some() || nightsto.is_some();
            let near_nights = span_days
                .checked_sub(nights)
                .is_some_and(|gap| gap.abs() <= 2);
            if has_nights && span_days >= 4 && near_nights {
                let clamped = from + window;
                corrections.push(DateCorrection::EndClamped {
                    requested: to,
                    dateto: clamped,
                    span_days,
                    nights,
                });
                clamped
            } else {
                to
            }
        }
    };

    if from < today {
        let shifted = today + Duration::days(1);
        corrections.push(DateCorrection::StartShifted {
            requested: from,
            datefrom: shifted,
        });
        from = shifted;
        if to < from {
            to = from + window;
            corrections.push(DateCorrection::EndShifted { dateto: to });
        }
    }

    if !corrections.is_empty() {
        args.insert("datefrom".into(), Value::String(format_wire_date(from)));
        args.insert("dateto".into(), Value::String(format_wire_date(to)));
    }
    Ok(corrections)
}

/// Enforce `nightsfrom >= MIN_NIGHTS` and `nightsfrom <= nightsto`, in that order.
pub fn normalize_nights(args: &mut Map<String, Value>) -> Vec<NightsCorrection> {
    let Some(mut nightsfrom) = int_arg(args, "nightsfrom") else {
        return Vec::new();
    };
    let nightsto = int_arg(args, "nightsto");
    let mut corrections = Vec::new();

    if nightsfrom < MIN_NIGHTS {
        corrections.push(NightsCorrection::RaisedToMinimum {
            requested: nightsfrom,
        });
        nightsfrom = MIN_NIGHTS;
    }
    if let Some(nightsto) = nightsto {
        if nightsfrom > nightsto {
            corrections.push(NightsCorrection::CappedAtMaximum {
                requested: nightsfrom,
                nightsto,
            });
            nightsfrom = nightsto;
        }
    }

    if !corrections.is_empty() {
        args.insert("nightsfrom".into(), Value::from(nightsfrom));
    }
    corrections
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 10).unwrap()
    }

    #[test]
    fn test_missing_end_defaults_to_two_days() {
        let mut a = args(json!({"datefrom": "01.03.2026"}));
        let fixes = normalize_search_window(&mut a, today()).unwrap();
        assert_eq!(a["dateto"], "03.03.2026");
        assert!(matches!(fixes[..], [DateCorrection::EndDefaulted { .. }]));
    }

    #[test]
    fn test_equal_end_is_widened() {
        let mut a = args(json!({"datefrom": "01.03.2026", "dateto": "01.03.2026"}));
        normalize_search_window(&mut a, today()).unwrap();
        assert_eq!(a["dateto"], "03.03.2026");
    }

    #[test]
    fn test_return_date_is_clamped() {
        let mut a = args(json!({
            "datefrom": "01.03.2026",
            "dateto": "08.03.2026",
            "nightsfrom": 7
        }));
        let fixes = normalize_search_window(&mut a, today()).unwrap();
        assert_eq!(a["dateto"], "03.03.2026");
        assert_eq!(
            fixes,
            vec![DateCorrection::EndClamped {
                requested: NaiveDate::from_ymd_opt(2026, 3, 8).unwrap(),
                dateto: NaiveDate::from_ymd_opt(2026, 3, 3).unwrap(),
                span_days: 7,
                nights: 7,
            }]
        );
    }

    #[test]
    fn test_wide_window_without_nights_is_kept() {
        let mut a = args(json!({"datefrom": "01.03.2026", "dateto": "08.03.2026"}));
        let fixes = normalize_search_window(&mut a, today()).unwrap();
        assert!(fixes.is_empty());
        assert_eq!(a["dateto"], "08.03.2026");
    }

    #[test]
    fn test_window_far_from_night_count_is_kept() {
        let mut a = args(json!({
            "datefrom": "01.03.2026",
            "dateto": "31.03.2026",
            "nightsfrom": 7,
            "nightsto": 10
        }));
        assert!(normalize_search_window(&mut a, today()).unwrap().is_empty());
        assert_eq!(a["dateto"], "31.03.2026");
    }

    #[test]
    fn test_extreme_night_count_is_ignored() {
        let mut a = args(json!({
            "datefrom": "01.03.2026",
            "dateto": "08.03.2026",
            "nightsto": "-9223372036854775808"
        }));
        assert!(normalize_search_window(&mut a, today()).unwrap().is_empty());
        assert_eq!(a["dateto"], "08.03.2026");

        let mut a = args(json!({
            "datefrom": "01.03.2026",
            "dateto": "08.03.2026",
            "nightsfrom": i64::MIN
        }));
        assert!(normalize_search_window(&mut a, today()).unwrap().is_empty());
    }

    #[test]
    fn test_past_start_shifts_to_tomorrow_and_cascades() {
        let mut a = args(json!({"datefrom": "01.01.2026", "dateto": "05.01.2026"}));
        let fixes = normalize_search_window(&mut a, today()).unwrap();
        assert_eq!(a["datefrom"], "11.01.2026");
        assert_eq!(a["dateto"], "13.01.2026");
        assert!(matches!(
            fixes[..],
            [DateCorrection::StartShifted { .. }, DateCorrection::EndShifted { .. }]
        ));
    }

    #[test]
    fn test_past_start_keeps_future_end() {
        let mut a = args(json!({"datefrom": "05.01.2026", "dateto": "20.01.2026"}));
        normalize_search_window(&mut a, today()).unwrap();
        assert_eq!(a["datefrom"], "11.01.2026");
        assert_eq!(a["dateto"], "20.01.2026");
    }

    #[test]
    fn test_unparsable_dates_leave_args_untouched() {
        let mut a = args(json!({"datefrom": "2026-03-01", "dateto": "08.03.2026"}));
        assert!(normalize_search_window(&mut a, today()).is_err());
        assert_eq!(a["datefrom"], "2026-03-01");

        let mut none = args(json!({"country": 4}));
        assert!(normalize_search_window(&mut none, today()).unwrap().is_empty());
    }

    #[test]
    fn test_nights_minimum() {
        let mut a = args(json!({"nightsfrom": 1, "nightsto": 10}));
        let fixes = normalize_nights(&mut a);
        assert_eq!(a["nightsfrom"], 3);
        assert_eq!(fixes, vec![NightsCorrection::RaisedToMinimum { requested: 1 }]);
    }

    #[test]
    fn test_nights_inverted_range() {
        let mut a = args(json!({"nightsfrom": 10, "nightsto": 7}));
        normalize_nights(&mut a);
        assert_eq!(a["nightsfrom"], 7);
    }

    #[test]
    fn test_nights_untouched_when_valid_or_absent() {
        let mut a = args(json!({"nightsfrom": "7", "nightsto": "10"}));
        assert!(normalize_nights(&mut a).is_empty());
        assert_eq!(a["nightsfrom"], "7");

        let mut b = args(json!({}));
        assert!(normalize_nights(&mut b).is_empty());
    }
}
