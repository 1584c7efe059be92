use serde_json::Value;
use std::io::{self, Read};

/// Read piped JSON or YAML from stdin.
/// Returns None if stdin is a TTY (interactive) or empty.
pub fn read_stdin() -> Result<Option<Value>, Box<dyn std::error::Error>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }

    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;

    let trimmed = buffer.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    parse_document(trimmed).map(Some)
}

fn parse_document(text: &str) -> Result<Value, Box<dyn std::error::Error>> {
    match serde_json::from_str(text) {
        Ok(value) => Ok(value),
        Err(json_err) => serde_yaml::from_str(text)
            .map_err(|yaml_err| format!("stdin is neither JSON ({json_err}) nor YAML ({yaml_err})").into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_json_document() {
        let v = parse_document(r#"{"monthly_rent": "2500"}"#).unwrap();
        assert_eq!(v["monthly_rent"], "2500");
    }

    #[test]
    fn test_parse_yaml_document() {
        let v = parse_document("purchase_price: \"300000\"\nloan_term_years: 30\n").unwrap();
        assert_eq!(v["purchase_price"], "300000");
        assert_eq!(v["loan_term_years"], 30);
    }
}
