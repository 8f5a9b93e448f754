use std::path::Path;

use social_choice::builder::Builder;
use social_choice::{AlternativeId, Score};

use crate::tab::*;

/// A row of valuations, as parsed by the readers.
/// The first element is the first value column. Empty cells are `None`.
#[derive(PartialEq, Debug, Clone)]
pub struct ParsedRow {
    pub lineno: usize,
    pub values: Vec<Option<Score>>,
}

pub fn simplify_file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string())
}

/// Reads the content of a cell, if it is not blank.
pub fn parse_score(s: &str) -> Option<Option<Score>> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Some(None);
    }
    trimmed.parse::<Score>().ok().map(Some)
}

/// Adds the rows to the table, one agent per row. Rows without any value are skipped.
pub fn add_rows(builder: &mut Builder, rows: &[ParsedRow], source_name: &str) -> TabResult<()> {
    for row in rows.iter() {
        if row.values.iter().all(|v| v.is_none()) {
            warn!(
                "add_rows: {}: line {}: no valuation, skipping",
                source_name, row.lineno
            );
            continue;
        }
        let agent = builder.add_agent().context(VotingSnafu {})?;
        debug!(
            "add_rows: {}: line {} -> agent {}: {:?}",
            source_name, row.lineno, agent, row.values
        );
        for (idx, v) in row.values.iter().enumerate() {
            if let Some(score) = v {
                builder
                    .add_valuation(agent, AlternativeId((idx + 1) as u32), *score)
                    .context(VotingSnafu {})?;
            }
        }
    }
    Ok(())
}
