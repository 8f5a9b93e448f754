/*!

This is the long-form manual for `social_choice` and `choicetab`.

## Rules

Every rule returns a single alternative. All the rules except range voting
work on the preference profile derived from the valuations: each agent ranks
the alternatives by decreasing score, and exactly equal scores are ordered by
decreasing alternative number.

* `dictatorship` the first choice of a designated agent.
* `scoring_rule` a score vector with one weight per alternative. The weights
  are sorted in decreasing order, then the alternative at rank `j` gets the
  `j`-th weight from every agent.
* `plurality` one point for the first choice of each agent.
* `veto` one point for every alternative except the last choice of each agent.
* `borda` `m - 1 - j` points for the alternative at rank `j` (out of `m`).
* `harmonic` `1 / (j + 1)` points for the alternative at rank `j`. The sums
  are floating point numbers, and two alternatives are only tied if their sums
  are exactly equal.
* `stv` single transferable vote: the alternative ranked first by the fewest
  agents is removed from all the rankings, until one alternative is left.
* `range_voting` the alternative with the largest sum of raw valuations.

## Tie-breaking

The same policy is used by all the rules when several alternatives share the
best score (or, for `stv`, the fewest first places):

* `max` the alternative with the greatest number.
* `min` the alternative with the smallest number.
* an agent number: the alternative this agent ranks highest. For `stv`, the
  ranking of the agent is always taken from the full profile, not from the
  rankings reduced by the previous eliminations.

An agent that is not part of the election is rejected when a tie actually
needs to be broken.

## Input formats

### `xlsx`

An Excel workbook with one row per agent and one column per alternative. The
first row containing values is agent `1`, the first column containing values
is alternative `1`. Use `firstValueRowIndex` and `firstValueColumnIndex` (or
`--first-row` and `--first-column`) to skip header rows and label columns.
Empty cells are missing valuations.

|           | Alice | Bob | Carol |
|-----------|-------|-----|-------|
| voter 1   | 3     | 1   | 2     |
| voter 2   | 1     | 3   | 2     |

With `firstValueRowIndex: 2` and `firstValueColumnIndex: "B"`, `Alice` is
alternative `1` and `voter 2` is agent `2`.

When the workbook has more than one worksheet, the name of the worksheet must
be provided with `excelWorksheetName` (or `--excel-worksheet-name`).

### `csv`

The same layout, as comma separated values.

## Command line

```bash
choicetab -i values.xlsx --rule borda --rule stv --tie-break min
```

```bash
choicetab -i values.csv --first-row 2 --first-column 2 \
  --rule scoring_rule --score-vector 3,1,0 --out stdout
```

## Configuration

All the options can also be given in a JSON file with `--config`. Paths are
relative to the configuration file.

```json
{
  "outputSettings": { "contestName": "Committee", "contestDate": "2026-10-01" },
  "valuationSources": [
    { "provider": "csv", "filePath": "values.csv",
      "firstValueRowIndex": 2, "firstValueColumnIndex": "B" }
  ],
  "rules": {
    "rules": ["dictatorship", "borda", "stv", "range_voting"],
    "tieBreak": "min",
    "dictator": 2
  }
}
```

## Library

```
use social_choice::builder::Builder;
use social_choice::*;

let mut builder = Builder::new();
builder.add_row(&[1.0, 2.0, 3.0])?;
builder.add_row(&[2.0, 3.0, 1.0])?;
builder.add_row(&[3.0, 1.0, 2.0])?;
let table = builder.build()?;

let profile = derive_preferences(&table)?;
assert_eq!(profile.ranking(AgentId(1)), Some(&[AlternativeId(3), AlternativeId(2), AlternativeId(1)][..]));
assert_eq!(stv(&profile, TieBreak::Min)?, AlternativeId(3));
assert_eq!(range_voting(&table, TieBreak::Max)?, AlternativeId(3));

# Ok::<(), VotingErrors>(())
```

*/
