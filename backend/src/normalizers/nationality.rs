//! Country/nationality alias normalization via a configured lookup table.

use std::collections::HashMap;

/// Case-insensitive lookup into `countries`; pass through unknown values
/// unchanged. Empty input yields empty output.
pub fn normalize_country(value: &str, countries: &HashMap<String, String>) -> String {
    if value.is_empty() {
        return String::new();
    }
    let lower = value.to_lowercase();
    countries.get(&lower).cloned().unwrap_or_else(|| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passes_through_unknown_value() {
        let table = HashMap::new();
        assert_eq!(normalize_country("Narnia", &table), "Narnia");
    }

    #[test]
    fn looks_up_case_insensitively() {
        let mut table = HashMap::new();
        table.insert("uk".to_string(), "United Kingdom".to_string());
        assert_eq!(normalize_country("UK", &table), "United Kingdom");
    }

    #[test]
    fn empty_input_yields_empty_output() {
        let table = HashMap::new();
        assert_eq!(normalize_country("", &table), "");
    }
}
