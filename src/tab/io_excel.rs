use calamine::DataType;

use crate::tab::{
    io_common::{parse_score, ParsedRow},
    *,
};

pub fn read_excel_valuations(path: &str, cfs: &FileSource) -> TabResult<Vec<ParsedRow>> {
    let wrange = get_range(path, cfs)?;
    // The range starts at the first non-empty cell of the worksheet.
    let (start_row, start_col) = wrange.start().context(EmptyExcelSnafu { path })?;
    let first_row = cfs.first_value_row_index()?;
    let first_col = cfs.first_value_column_index()?;
    debug!(
        "read_excel_valuations: range start: {:?} first value cell: {:?}",
        (start_row, start_col),
        (first_row, first_col)
    );

    let mut res: Vec<ParsedRow> = Vec::new();
    for (idx, row) in wrange.rows().enumerate() {
        let abs_row = start_row as usize + idx;
        let lineno = abs_row + 1;
        if abs_row < first_row {
            debug!("read_excel_valuations: skipping header line {}: {:?}", lineno, row);
            continue;
        }
        let width = (start_col as usize + row.len()).saturating_sub(first_col);
        let mut values: Vec<Option<f64>> = vec![None; width];
        for (col_idx, cell) in row.iter().enumerate() {
            let abs_col = start_col as usize + col_idx;
            if abs_col < first_col {
                continue;
            }
            values[abs_col - first_col] = read_cell(cell, lineno)?;
        }
        debug!("read_excel_valuations: lineno: {:?} row: {:?}", lineno, &values);
        res.push(ParsedRow { lineno, values });
    }
    Ok(res)
}

fn read_cell(cell: &DataType, lineno: usize) -> TabResult<Option<f64>> {
    match cell {
        DataType::Float(f) => Ok(Some(*f)),
        DataType::Int(i) => Ok(Some(*i as f64)),
        DataType::Empty => Ok(None),
        // Some spreadsheets store the numbers as text.
        DataType::String(s) => parse_score(s).context(WrongCellTypeSnafu {
            lineno,
            content: s,
        }),
        _ => WrongCellTypeSnafu {
            lineno,
            content: format!("{:?}", cell),
        }
        .fail(),
    }
}

fn get_range(path: &str, cfs: &FileSource) -> TabResult<calamine::Range<DataType>> {
    let worksheet_name_o = cfs.excel_worksheet_name.clone();
    debug!(
        "read_excel_file: path: {:?} worksheet: {:?}",
        &path, &worksheet_name_o
    );
    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu { path })?;

    // A worksheet name was provided, use it.
    if let Some(worksheet_name) = worksheet_name_o {
        let wrange = workbook
            .worksheet_range(&worksheet_name)
            .context(MissingWorksheetSnafu {
                path,
                name: worksheet_name.clone(),
            })?
            .context(OpeningExcelSnafu { path })?;

        Ok(wrange)
    } else {
        let all_worksheets = workbook.worksheets();
        match all_worksheets.as_slice() {
            [] => EmptyExcelSnafu { path }.fail(),
            [(worksheet_name, wrange)] => {
                debug!(
                    "read_excel_file: path: {:?} worksheet: {:?}",
                    &path, &worksheet_name
                );
                Ok(wrange.clone())
            }
            _ => TooManyWorksheetsSnafu { path }.fail(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn workbook_path() -> String {
        format!(
            "{}/tests/data/committee_workbook/valuations.xlsx",
            env!("CARGO_MANIFEST_DIR")
        )
    }

    fn source(worksheet: Option<&str>) -> FileSource {
        FileSource {
            provider: "xlsx".to_string(),
            file_path: workbook_path(),
            _first_value_row_index: Some(serde_json::json!(2)),
            _first_value_column_index: Some(serde_json::json!("C")),
            excel_worksheet_name: worksheet.map(|s| s.to_string()),
        }
    }

    #[test]
    fn rows_start_at_the_first_value_cell() {
        let rows = read_excel_valuations(&workbook_path(), &source(Some("Valuations"))).unwrap();
        let linenos: Vec<usize> = rows.iter().map(|r| r.lineno).collect();
        assert_eq!(linenos, vec![2, 3, 4, 5, 6]);
        assert_eq!(rows[0].values, vec![Some(3.0), Some(1.0), Some(2.0)]);
        assert_eq!(rows[2].values, vec![None, None, None]);
        // The first valuation of this row is stored as text.
        assert_eq!(rows[4].values, vec![Some(2.0), Some(1.0), Some(3.0)]);
    }

    #[test]
    fn label_column_is_rejected_as_a_value() {
        let mut cfs = source(Some("Valuations"));
        cfs._first_value_column_index = Some(serde_json::json!("B"));
        assert!(matches!(
            read_excel_valuations(&workbook_path(), &cfs),
            Err(TabError::WrongCellType { lineno: 2, .. })
        ));
    }

    #[test]
    fn worksheet_selection() {
        assert!(matches!(
            read_excel_valuations(&workbook_path(), &source(None)),
            Err(TabError::TooManyWorksheets { .. })
        ));
        assert!(matches!(
            read_excel_valuations(&workbook_path(), &source(Some("Ballots"))),
            Err(TabError::MissingWorksheet { .. })
        ));
    }

    #[test]
    fn numeric_cells() {
        assert_eq!(read_cell(&DataType::Float(2.5), 1).unwrap(), Some(2.5));
        assert_eq!(read_cell(&DataType::Int(4), 1).unwrap(), Some(4.0));
        assert_eq!(read_cell(&DataType::String("7".to_string()), 1).unwrap(), Some(7.0));
        assert_eq!(read_cell(&DataType::Empty, 1).unwrap(), None);
        assert_eq!(read_cell(&DataType::String(" ".to_string()), 1).unwrap(), None);
    }

    #[test]
    fn other_cells_are_rejected() {
        assert!(matches!(
            read_cell(&DataType::String("Alice".to_string()), 3),
            Err(TabError::WrongCellType { lineno: 3, .. })
        ));
        assert!(matches!(
            read_cell(&DataType::Bool(true), 5),
            Err(TabError::WrongCellType { lineno: 5, .. })
        ));
    }
}
