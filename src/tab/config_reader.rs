use crate::tab::*;

use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(rename = "contestName")]
    pub contest_name: String,
    #[serde(rename = "contestDate")]
    pub contest_date: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub contest: String,
    pub date: Option<String>,
    #[serde(rename = "tieBreak")]
    pub tie_break: String,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct FileSource {
    pub provider: String,
    #[serde(rename = "filePath")]
    pub file_path: String,
    #[serde(rename = "firstValueRowIndex")]
    pub _first_value_row_index: Option<JSValue>,
    #[serde(rename = "firstValueColumnIndex")]
    pub _first_value_column_index: Option<JSValue>,
    #[serde(rename = "excelWorksheetName")]
    pub excel_worksheet_name: Option<String>,
}

impl FileSource {
    /// The first row holding valuations, starting at 0.
    pub fn first_value_row_index(&self) -> TabResult<usize> {
        first_index(&self._first_value_row_index)
    }

    /// The first column holding valuations, starting at 0.
    pub fn first_value_column_index(&self) -> TabResult<usize> {
        first_index(&self._first_value_column_index)
    }
}

// The indexes are given from 1, in the excel tradition.
fn first_index(x: &Option<JSValue>) -> TabResult<usize> {
    match x {
        None => Ok(0),
        Some(_) => {
            let idx = read_js_int(x)?;
            ensure!(idx >= 1, ParsingJsonNumberSnafu { content: "0" });
            Ok(idx - 1)
        }
    }
}

#[derive(PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleSettings {
    pub rules: Option<Vec<String>>,
    #[serde(rename = "tieBreak")]
    pub tie_break: Option<JSValue>,
    #[serde(rename = "scoreVector")]
    pub score_vector: Option<Vec<f64>>,
    pub dictator: Option<u32>,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ElectionConfig {
    #[serde(rename = "outputSettings")]
    pub output_settings: OutputSettings,
    #[serde(rename = "valuationSources")]
    pub valuation_sources: Vec<FileSource>,
    #[serde(default)]
    pub rules: RuleSettings,
}

pub fn read_config(path: &str) -> TabResult<ElectionConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let config: ElectionConfig =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(config)
}

pub fn read_summary(path: String) -> TabResult<JSValue> {
    let contents = fs::read_to_string(path.clone()).context(OpeningJsonSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    debug!("read_summary: {:?}", js);
    Ok(js)
}

/// Reads a positive integer, given as a number, a string of digits, or
/// excel-style column letters ("A" is 1, "AA" is 27).
pub fn read_js_int(x: &Option<JSValue>) -> TabResult<usize> {
    match x {
        Some(JSValue::Number(n)) => n.as_u64().map(|x| x as usize).context(ParsingJsonNumberSnafu {
            content: n.to_string(),
        }),
        Some(JSValue::String(s)) if !s.is_empty() && s.chars().all(|c| c.is_ascii_alphabetic()) => s
            .to_ascii_uppercase()
            .chars()
            .try_fold(0usize, |acc, c| {
                acc.checked_mul(26)?
                    .checked_add(c as usize - 'A' as usize + 1)
            })
            .context(ParsingJsonNumberSnafu { content: s }),
        Some(JSValue::String(s)) => s
            .trim()
            .parse::<usize>()
            .ok()
            .context(ParsingJsonNumberSnafu { content: s }),
        _ => None.context(ParsingJsonNumberSnafu {
            content: format!("{:?}", x),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn column_letters() {
        assert_eq!(read_js_int(&Some(json!("A"))).unwrap(), 1);
        assert_eq!(read_js_int(&Some(json!("c"))).unwrap(), 3);
        assert_eq!(read_js_int(&Some(json!("AA"))).unwrap(), 27);
        assert_eq!(read_js_int(&Some(json!("12"))).unwrap(), 12);
        assert_eq!(read_js_int(&Some(json!(4))).unwrap(), 4);
        assert!(matches!(
            read_js_int(&Some(json!("ZZZZZZZZZZZZZZZZ"))),
            Err(TabError::ParsingJsonNumber { .. })
        ));
        assert!(read_js_int(&Some(json!(-1))).is_err());
        assert!(read_js_int(&Some(json!(true))).is_err());
        assert!(read_js_int(&None).is_err());
    }

    #[test]
    fn source_indexes_default_to_the_first_cell() {
        let fs: FileSource = serde_json::from_value(json!({
            "provider": "csv",
            "filePath": "values.csv",
            "firstValueColumnIndex": "B"
        }))
        .unwrap();
        assert_eq!(fs.first_value_row_index().unwrap(), 0);
        assert_eq!(fs.first_value_column_index().unwrap(), 1);
    }

    #[test]
    fn rules_are_optional() {
        let config: ElectionConfig = serde_json::from_value(json!({
            "outputSettings": { "contestName": "test" },
            "valuationSources": []
        }))
        .unwrap();
        assert_eq!(config.rules, RuleSettings::default());
        assert_eq!(config.output_settings.contest_date, None);
    }
}
