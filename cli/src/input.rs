//! Patient input files and `--set key=value` overrides.
//!
//! An input file is a flat TOML or JSON map from form key to scalar. Values
//! are turned back into the strings a form would hold, so they go through
//! exactly the same validation as typed input.

use std::path::Path;

use bono_contracts::error::{BonoError, BonoResult};

/// Read `path` as a flat map of form inputs. `.json` files are parsed as
/// JSON, anything else as TOML.
pub fn load_input(path: &Path) -> BonoResult<Vec<(String, String)>> {
    let contents = std::fs::read_to_string(path).map_err(|e| BonoError::Config {
        reason: format!("failed to read input file '{}': {}", path.display(), e),
    })?;
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        parse_json(&contents)
    } else {
        parse_toml(&contents)
    }
}

pub fn parse_toml(s: &str) -> BonoResult<Vec<(String, String)>> {
    let table: toml::Table = toml::from_str(s).map_err(|e| BonoError::Config {
        reason: format!("failed to parse input TOML: {e}"),
    })?;
    table
        .into_iter()
        .map(|(key, value)| {
            let text = match value {
                toml::Value::String(s) => s,
                toml::Value::Integer(i) => i.to_string(),
                toml::Value::Float(f) => f.to_string(),
                toml::Value::Boolean(b) => b.to_string(),
                _ => return Err(not_scalar(&key)),
            };
            Ok((key, text))
        })
        .collect()
}

pub fn parse_json(s: &str) -> BonoResult<Vec<(String, String)>> {
    let map: serde_json::Map<String, serde_json::Value> =
        serde_json::from_str(s).map_err(|e| BonoError::Config {
            reason: format!("failed to parse input JSON: {e}"),
        })?;
    map.into_iter()
        .map(|(key, value)| {
            let text = match value {
                serde_json::Value::String(s) => s,
                serde_json::Value::Number(n) => n.to_string(),
                serde_json::Value::Bool(b) => b.to_string(),
                serde_json::Value::Null => String::new(),
                _ => return Err(not_scalar(&key)),
            };
            Ok((key, text))
        })
        .collect()
}

/// Split a `key=value` override. The value may be empty.
pub fn parse_assignment(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(format!("expected key=value, got '{s}'")),
    }
}

fn not_scalar(key: &str) -> BonoError {
    BonoError::Config {
        reason: format!("input '{key}' must be a string, number or boolean"),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_toml_scalars_become_form_strings() {
        let entries = parse_toml("age = 72\ntscore_neck = -2.5\ncopd = true\nsex = \"female\"\n").unwrap();
        assert!(entries.contains(&("age".to_string(), "72".to_string())));
        assert!(entries.contains(&("tscore_neck".to_string(), "-2.5".to_string())));
        assert!(entries.contains(&("copd".to_string(), "true".to_string())));
        assert!(entries.contains(&("sex".to_string(), "female".to_string())));
    }

    #[test]
    fn test_json_null_is_an_empty_input() {
        let entries = parse_json(r#"{"number_of_falls": null, "weight": 58}"#).unwrap();
        assert!(entries.contains(&("number_of_falls".to_string(), String::new())));
        assert!(entries.contains(&("weight".to_string(), "58".to_string())));
    }

    #[test]
    fn test_nested_values_rejected() {
        assert!(parse_toml("[treatments]\nhrt = true\n").is_err());
        assert!(parse_json(r#"{"age": [1, 2]}"#).is_err());
    }

    #[test]
    fn test_assignments() {
        assert_eq!(parse_assignment("age=70"), Ok(("age".to_string(), "70".to_string())));
        assert_eq!(parse_assignment("tbs="), Ok(("tbs".to_string(), String::new())));
        assert!(parse_assignment("age").is_err());
        assert!(parse_assignment("=5").is_err());
    }

    #[test]
    fn test_load_input_picks_format_by_extension() {
        let mut json = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(json, r#"{{"age": 66}}"#).unwrap();
        assert_eq!(load_input(json.path()).unwrap(), vec![("age".to_string(), "66".to_string())]);

        let mut toml = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        write!(toml, "age = 67\n").unwrap();
        assert_eq!(load_input(toml.path()).unwrap(), vec![("age".to_string(), "67".to_string())]);
    }
}
