// Primitives for reading CSV files.

use std::fs::File;

use crate::tab::{
    io_common::{parse_score, ParsedRow},
    *,
};

pub fn read_csv_valuations(path: &str, cfs: &FileSource) -> TabResult<Vec<ParsedRow>> {
    let first_row = cfs.first_value_row_index()?;
    let first_col = cfs.first_value_column_index()?;

    let mut res: Vec<ParsedRow> = Vec::new();
    for (idx, line_r) in get_records(path)?.enumerate() {
        // The line numbers start at 1 to respect most conventions in the excel world
        let lineno = idx + 1;
        let line = line_r.context(CsvLineParseSnafu { lineno })?;
        if idx < first_row {
            debug!("read_csv_valuations: skipping header line {}: {:?}", lineno, line);
            continue;
        }
        let mut values: Vec<Option<f64>> = Vec::new();
        for field in line.iter().skip(first_col) {
            let v = parse_score(field).context(WrongCellTypeSnafu {
                lineno,
                content: field,
            })?;
            values.push(v);
        }
        debug!("read_csv_valuations: lineno: {:?} row: {:?}", lineno, &values);
        res.push(ParsedRow { lineno, values });
    }
    Ok(res)
}

fn get_records(path: &str) -> TabResult<csv::StringRecordsIntoIter<File>> {
    let rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .context(CsvOpenSnafu { path })?;
    Ok(rdr.into_records())
}
