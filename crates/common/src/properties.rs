//! `Key=Value` properties codec used for `environment.properties`

use std::collections::BTreeMap;

/// Render ordered key/value pairs as `Key=Value` lines.
///
/// Lines are joined with `\n` and carry no trailing newline, matching what the
/// report-build tool reads.
pub fn to_properties<K, V>(pairs: &[(K, V)]) -> String
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    pairs
        .iter()
        .map(|(k, v)| format!("{}={}", k.as_ref(), v.as_ref()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Parse `Key=Value` lines.
///
/// Splits on the first `=`; keys and values are trimmed. Lines without a key
/// (blank, comments, `=value`) are ignored. Later keys win.
pub fn parse_properties(content: &str) -> BTreeMap<String, String> {
    let mut map = BTreeMap::new();

    for line in content.lines() {
        let line = line.trim();
        if line.starts_with('#') || line.starts_with('!') {
            continue;
        }
        let Some(idx) = line.find('=') else {
            continue;
        };
        if idx == 0 {
            continue;
        }
        let key = line[..idx].trim();
        let value = line[idx + 1..].trim();
        map.insert(key.to_string(), value.to_string());
    }

    map
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_lines() {
        let out = to_properties(&[("Environment", "qa"), ("Browser", "chrome")]);
        assert_eq!(out, "Environment=qa\nBrowser=chrome");
    }

    #[test]
    fn test_parse_splits_on_first_equals() {
        let map = parse_properties("BaseURL=https://x.test/?a=b\r\nBrowser = webkit \n");
        assert_eq!(map["BaseURL"], "https://x.test/?a=b");
        assert_eq!(map["Browser"], "webkit");
    }

    #[test]
    fn test_parse_skips_junk() {
        let map = parse_properties("# comment\n\n=orphan\nnovalue\nKey=\n");
        assert_eq!(map.len(), 1);
        assert_eq!(map["Key"], "");
    }
}
