//! Conversion between `.strings` tables and JSON, for editing an app's
//! bundled localizations outside the bundle.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use once_cell::sync::Lazy;
use regex::Regex;

static RE_ENTRY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^"(.*?)"\s*=\s*"(.*?)";?$"#).unwrap());

/// Parse `"key" = "value";` lines. Anything that does not match the
/// entry shape (comments, blank lines) is skipped.
pub fn strings_to_map(input: &str) -> BTreeMap<String, String> {
    input
        .lines()
        .filter_map(|line| {
            let caps = RE_ENTRY.captures(line.trim())?;
            Some((caps[1].to_string(), caps[2].to_string()))
        })
        .collect()
}

pub fn map_to_strings(map: &BTreeMap<String, String>) -> String {
    let mut out = String::new();
    for (key, value) in map {
        out.push_str(&format!("\"{key}\" = \"{value}\";\n"));
    }
    out
}

/// Convert between the two formats based on the input extension:
/// `.strings` becomes a JSON sibling and `.json` becomes a `.strings`
/// sibling. Returns the path written.
pub fn convert_file(input: &Path) -> Result<PathBuf> {
    let extension = input.extension().and_then(|e| e.to_str());
    match extension {
        Some("strings") => {
            let map = strings_to_map(&std::fs::read_to_string(input)?);
            let output = input.with_extension("json");
            std::fs::write(&output, serde_json::to_string_pretty(&map)?)?;
            Ok(output)
        }
        Some("json") => {
            let map: BTreeMap<String, String> =
                serde_json::from_str(&std::fs::read_to_string(input)?)?;
            let output = input.with_extension("strings");
            std::fs::write(&output, map_to_strings(&map))?;
            Ok(output)
        }
        _ => bail!("{} is neither a .strings nor a .json file", input.display()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_parse_and_junk_is_skipped() {
        let input = concat!(
            "/* comment */\n",
            "\"greeting\" = \"Hello\";\n",
            "\n",
            "\"farewell\"=\"Bye\"\n",
            "not an entry\n",
        );
        let map = strings_to_map(input);
        assert_eq!(map.len(), 2);
        assert_eq!(map["greeting"], "Hello");
        assert_eq!(map["farewell"], "Bye");
    }

    #[test]
    fn render_is_deterministic_and_terminated() {
        let map = BTreeMap::from([
            ("b".to_string(), "2".to_string()),
            ("a".to_string(), "1".to_string()),
        ]);
        assert_eq!(map_to_strings(&map), "\"a\" = \"1\";\n\"b\" = \"2\";\n");
    }

    #[test]
    fn round_trips_through_files() {
        let dir = tempfile::tempdir().unwrap();
        let strings = dir.path().join("Localizable.strings");
        std::fs::write(&strings, "\"k\" = \"v\";\n").unwrap();

        let json = convert_file(&strings).unwrap();
        assert_eq!(json, dir.path().join("Localizable.json"));

        let back = convert_file(&json).unwrap();
        assert_eq!(std::fs::read_to_string(back).unwrap(), "\"k\" = \"v\";\n");
    }

    #[test]
    fn unknown_extension_is_rejected() {
        assert!(convert_file(Path::new("notes.txt")).is_err());
    }
}
