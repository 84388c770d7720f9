//! Season string parsing to `(start_year, end_year)`.
//!
//! Three shapes are recognized, tried in order of specificity: a 4-digit
//! start paired with a 2-to-4-digit end (`2020/21`, `2020-2021`), a bare
//! 2-digit pair (`20-21`), and a lone 4-digit year (`2020`). The bare-pair
//! branch implements the inclusive variant mandated for this store: earlier
//! upstream data sometimes carries seasons as bare `YY-YY` strings, and those
//! must resolve the same way a modern `2020-21` string would.

use once_cell::sync::Lazy;
use regex::Regex;

static FOUR_DIGIT_PAIR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?P<start>\d{4})\s*[-/]\s*(?P<end>\d{2,4})").unwrap());
static BARE_TWO_DIGIT_PAIR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?P<y1>\d{2})\s*[-/]\s*(?P<y2>\d{2})").unwrap());
static SINGLE_YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?P<year>\d{4})").unwrap());

fn expand_two_digit(yy: i32) -> i32 {
    if yy <= 30 { 2000 + yy } else { 1900 + yy }
}

pub fn normalize_season(season_name: &str) -> (Option<i32>, Option<i32>) {
    if season_name.is_empty() {
        return (None, None);
    }
    if let Some(caps) = FOUR_DIGIT_PAIR.captures(season_name) {
        let start: i32 = caps["start"].parse().unwrap();
        let raw_end = &caps["end"];
        let mut end: i32 = if raw_end.len() == 4 {
            raw_end.parse().unwrap()
        } else {
            let century = (start / 100) * 100;
            century + raw_end.parse::<i32>().unwrap()
        };
        if end < start {
            end = start + 1;
        }
        return (Some(start), Some(end));
    }
    if let Some(caps) = BARE_TWO_DIGIT_PAIR.captures(season_name) {
        let y1: i32 = caps["y1"].parse().unwrap();
        let y2: i32 = caps["y2"].parse().unwrap();
        let start = expand_two_digit(y1);
        let mut end = expand_two_digit(y2);
        if end < start {
            end = start + 1;
        }
        return (Some(start), Some(end));
    }
    if let Some(caps) = SINGLE_YEAR.captures(season_name) {
        let year: i32 = caps["year"].parse().unwrap();
        return (Some(year), Some(year + 1));
    }
    (None, None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slash_pair() {
        assert_eq!(normalize_season("2020/21"), (Some(2020), Some(2021)));
    }

    #[test]
    fn bare_two_digit_pair() {
        assert_eq!(normalize_season("20-21"), (Some(2020), Some(2021)));
    }

    #[test]
    fn single_year() {
        assert_eq!(normalize_season("2020"), (Some(2020), Some(2021)));
    }

    #[test]
    fn full_four_digit_pair() {
        assert_eq!(normalize_season("2020-2021"), (Some(2020), Some(2021)));
    }

    #[test]
    fn empty_input_is_none() {
        assert_eq!(normalize_season(""), (None, None));
    }

    #[test]
    fn nineties_two_digit_pair() {
        assert_eq!(normalize_season("98-99"), (Some(1998), Some(1999)));
    }
}
