//! Line-oriented config parsing.
//!
//! Format: `#` comments, blank lines ignored, `key = value` pairs. Parsing
//! never aborts; unusable lines become [`ConfigParseError`] diagnostics.

use crate::error::ConfigParseError;
use cartography_types::{CategoryId, KeyError};

/// Key that sets the fallback cost.
pub const DEFAULT_COST_KEY: &str = "default.cost";

/// One classified `key = value` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigEntry {
    /// `default.cost = <count> <item>`
    DefaultCost { line: usize, value: String },
    /// `<namespace:path> = <count> <item>`
    CategoryCost {
        line: usize,
        category: CategoryId,
        value: String,
    },
    /// Any other dotted key
    Tunable {
        line: usize,
        key: String,
        value: String,
    },
}

/// Result of parsing a whole source.
#[derive(Debug, Clone, Default)]
pub struct ParsedSource {
    pub entries: Vec<ConfigEntry>,
    pub errors: Vec<ConfigParseError>,
}

/// Parse config text into classified entries plus per-line errors.
pub fn parse_source(text: &str) -> ParsedSource {
    let mut parsed = ParsedSource::default();

    for (index, raw) in text.lines().enumerate() {
        let line = index + 1;
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        match parse_line(line, trimmed) {
            Ok(entry) => parsed.entries.push(entry),
            Err(reason) => parsed.errors.push(ConfigParseError {
                line,
                content: trimmed.to_string(),
                reason,
            }),
        }
    }

    parsed
}

fn parse_line(line: usize, trimmed: &str) -> Result<ConfigEntry, String> {
    let (key, value) = trimmed
        .split_once('=')
        .ok_or_else(|| "expected 'key = value'".to_string())?;
    let key = key.trim();
    let value = value.trim();

    if key.is_empty() {
        return Err("empty key".to_string());
    }
    if value.is_empty() {
        return Err(format!("empty value for '{}'", key));
    }

    if key == DEFAULT_COST_KEY {
        return Ok(ConfigEntry::DefaultCost {
            line,
            value: value.to_string(),
        });
    }

    if key.contains(cartography_types::ids::KEY_SEPARATOR) {
        let category = CategoryId::parse(key).map_err(|e: KeyError| e.to_string())?;
        return Ok(ConfigEntry::CategoryCost {
            line,
            category,
            value: value.to_string(),
        });
    }

    Ok(ConfigEntry::Tunable {
        line,
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_lines() {
        let parsed = parse_source(
            "# header\n\
             \n\
             search.sampleSize = 40\n\
             default.cost = 10 currency:gold\n\
             zone:ruins = 1 currency:silver\n",
        );
        assert!(parsed.errors.is_empty());
        assert_eq!(parsed.entries.len(), 3);
        assert!(matches!(
            &parsed.entries[0],
            ConfigEntry::Tunable { line: 3, key, value } if key == "search.sampleSize" && value == "40"
        ));
        assert!(matches!(&parsed.entries[1], ConfigEntry::DefaultCost { line: 4, .. }));
        assert!(matches!(
            &parsed.entries[2],
            ConfigEntry::CategoryCost { category, .. } if category.as_str() == "zone:ruins"
        ));
    }

    #[test]
    fn bad_lines_are_reported_not_fatal() {
        let parsed = parse_source(
            "just some words\n\
             = 5\n\
             trader.mapCount =\n\
             Zone:Bad = 1 currency:gold\n\
             trader.mapCount = 3\n",
        );
        assert_eq!(parsed.errors.len(), 4);
        assert_eq!(parsed.errors[0].line, 1);
        assert_eq!(parsed.errors[3].line, 4);
        assert_eq!(parsed.entries.len(), 1);
    }

    #[test]
    fn value_may_contain_equals() {
        let parsed = parse_source("search.strategy = a=b");
        assert!(matches!(
            &parsed.entries[0],
            ConfigEntry::Tunable { value, .. } if value == "a=b"
        ));
    }
}
