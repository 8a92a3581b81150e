//! Company name input from `.csv`, `.json` or `.txt` files
//!
//! Supports:
//! - CSV with a `company`, `name` or `common_name` header, or one name per row
//! - JSON array of names, array of objects with a `name` field, or an object
//!   with a `companies` array
//! - Plain text with one name per line (`#` starts a comment line)

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::Path;

/// Input format for company name files
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputFormat {
    Csv,
    Json,
    Text,
}

impl InputFormat {
    /// Detect format from file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str()).map(|e| e.to_lowercase()).as_deref() {
            Some("csv") => Some(Self::Csv),
            Some("json") => Some(Self::Json),
            Some("txt") => Some(Self::Text),
            _ => None,
        }
    }
}

const NAME_HEADERS: [&str; 3] = ["company", "name", "common_name"];

/// Parse company names from a file (format from extension)
pub fn parse_company_file(path: &Path) -> Result<Vec<String>> {
    let format = InputFormat::from_path(path).with_context(|| {
        format!(
            "Cannot determine input format from file extension. Expected .csv, .json or .txt: {}",
            path.display()
        )
    })?;

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read input file: {}", path.display()))?;

    match format {
        InputFormat::Csv => parse_csv_companies(&content),
        InputFormat::Json => parse_json_companies(&content),
        InputFormat::Text => Ok(parse_text_companies(&content)),
    }
}

fn clean(name: &str) -> Option<String> {
    let name = name.trim();
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

/// Parse CSV content: a recognised header column, or the first field of each row
pub fn parse_csv_companies(content: &str) -> Result<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut records = reader.records();
    let first = match records.next() {
        Some(record) => record.context("Failed to parse CSV record")?,
        None => return Ok(Vec::new()),
    };

    let header_idx = first
        .iter()
        .position(|h| NAME_HEADERS.contains(&h.trim().to_lowercase().as_str()));

    let mut names = Vec::new();
    let column = match header_idx {
        Some(idx) => idx,
        None => {
            if let Some(name) = first.get(0).and_then(clean) {
                if !name.starts_with('#') {
                    names.push(name);
                }
            }
            0
        }
    };

    for record in records {
        let record = record.context("Failed to parse CSV record")?;
        if let Some(name) = record.get(column).and_then(clean) {
            if header_idx.is_none() && name.starts_with('#') {
                continue;
            }
            names.push(name);
        }
    }

    Ok(names)
}

/// Parse JSON content
pub fn parse_json_companies(content: &str) -> Result<Vec<String>> {
    let value: serde_json::Value = serde_json::from_str(content)
        .context("Failed to parse JSON content")?;

    match &value {
        serde_json::Value::Array(arr) => Ok(parse_json_array(arr)),
        serde_json::Value::Object(obj) => match obj.get("companies") {
            Some(serde_json::Value::Array(arr)) => Ok(parse_json_array(arr)),
            Some(_) => bail!("'companies' field must be an array"),
            None => bail!("JSON object must have a 'companies' array field"),
        },
        _ => bail!("JSON must be an array of company names or an object with 'companies' field"),
    }
}

fn parse_json_array(arr: &[serde_json::Value]) -> Vec<String> {
    arr.iter()
        .filter_map(|item| match item {
            serde_json::Value::String(name) => clean(name),
            serde_json::Value::Object(obj) => obj.get("name").and_then(|v| v.as_str()).and_then(clean),
            _ => None,
        })
        .collect()
}

/// Parse one name per line
pub fn parse_text_companies(content: &str) -> Vec<String> {
    content
        .lines()
        .filter(|line| !line.trim_start().starts_with('#'))
        .filter_map(clean)
        .collect()
}

/// Combine names given on the command line with names from an input file
pub fn gather_company_names(cli_names: &[String], input_file: Option<&Path>) -> Result<Vec<String>> {
    let mut names: Vec<String> = cli_names.iter().filter_map(|n| clean(n)).collect();
    if let Some(path) = input_file {
        names.extend(parse_company_file(path)?);
    }
    if names.is_empty() {
        bail!("No company names given (use --company or --input-file)");
    }
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csv_with_header() {
        let content = "ticker,company\nINTC,Intel Corp\nTXN,\"Texas Instruments, Inc\"\nX,\n";
        let names = parse_csv_companies(content).unwrap();
        assert_eq!(names, vec!["Intel Corp".to_string(), "Texas Instruments, Inc".to_string()]);
    }

    #[test]
    fn test_csv_without_header() {
        let content = "Intel Corp\nSK Hynix Inc\n\n# skipped\n";
        let names = parse_csv_companies(content).unwrap();
        assert_eq!(names, vec!["Intel Corp".to_string(), "SK Hynix Inc".to_string()]);
    }

    #[test]
    fn test_csv_leading_comment_is_not_a_name() {
        let content = "# seed list\nIntel Corp\n";
        let names = parse_csv_companies(content).unwrap();
        assert_eq!(names, vec!["Intel Corp".to_string()]);
    }

    #[test]
    fn test_json_shapes() {
        assert_eq!(
            parse_json_companies(r#"["Intel Corp", " ", "SK Hynix Inc"]"#).unwrap(),
            vec!["Intel Corp".to_string(), "SK Hynix Inc".to_string()]
        );
        assert_eq!(
            parse_json_companies(r#"[{"name": "Intel Corp"}, {"ticker": "TXN"}]"#).unwrap(),
            vec!["Intel Corp".to_string()]
        );
        assert_eq!(
            parse_json_companies(r#"{"companies": ["Taiwan Semiconductor Manufacturing Co Ltd"]}"#).unwrap(),
            vec!["Taiwan Semiconductor Manufacturing Co Ltd".to_string()]
        );
        assert!(parse_json_companies(r#"{"firms": []}"#).is_err());
    }

    #[test]
    fn test_text_lines() {
        let names = parse_text_companies("# seeds\nIntel Corp\n\n  Texas Instruments Inc  \n");
        assert_eq!(names, vec!["Intel Corp".to_string(), "Texas Instruments Inc".to_string()]);
    }

    #[test]
    fn test_gather_requires_a_name() {
        assert!(gather_company_names(&[" ".to_string()], None).is_err());
        let names = gather_company_names(&["Intel Corp".to_string()], None).unwrap();
        assert_eq!(names.len(), 1);
    }

    #[test]
    fn test_unknown_extension_rejected() {
        assert!(parse_company_file(Path::new("companies.xlsx")).is_err());
    }
}
