//! Competition name normalization: lowercase and strip configured sponsor phrases.

use once_cell::sync::Lazy;
use regex::Regex;

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

pub fn normalize_competition(name: &str, sponsor_phrases: &[String]) -> String {
    if name.is_empty() {
        return String::new();
    }
    let mut lowered = name.to_lowercase();
    for sponsor in sponsor_phrases {
        lowered = lowered.replace(&sponsor.to_lowercase(), "");
    }
    WHITESPACE.replace_all(lowered.trim(), " ").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_sponsor_case_insensitively() {
        let sponsors = vec!["Premier".to_string()];
        assert_eq!(normalize_competition("Premier League", &sponsors), "league");
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert_eq!(normalize_competition("", &[]), "");
    }
}
