use log::{debug, info, warn};

use snafu::{prelude::*, Snafu};
use social_choice::builder::Builder;
use social_choice::*;

use std::fs;
use std::path::{Path, PathBuf};

use calamine::{open_workbook, Reader, Xlsx};

use serde_json::json;
use serde_json::Map as JSMap;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::args::Args;
use crate::tab::config_reader::*;

mod config_reader;
mod io_common;
mod io_csv;
mod io_excel;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum TabError {
    #[snafu(display("Error opening file {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("The workbook {path} has no data"))]
    EmptyExcel { path: String },
    #[snafu(display("The workbook {path} has no worksheet named {name:?}"))]
    MissingWorksheet { path: String, name: String },
    #[snafu(display(
        "The workbook {path} has several worksheets, the worksheet name must be provided"
    ))]
    TooManyWorksheets { path: String },
    #[snafu(display("Line {lineno}: could not read a valuation in {content}"))]
    WrongCellType { lineno: usize, content: String },
    #[snafu(display("Error opening file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Line {lineno}: could not parse the csv record"))]
    CsvLineParse { source: csv::Error, lineno: usize },
    #[snafu(display("Error opening file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing json"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Expected a positive number but found {content}"))]
    ParsingJsonNumber { content: String },
    #[snafu(display("Error writing file {path}"))]
    WritingOutput {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("No input provided: use --input or --config"))]
    MissingInput {},
    #[snafu(display("Provider not implemented {provider:?}"))]
    UnknownProvider { provider: String },
    #[snafu(display("Unknown rule {name:?}"))]
    UnknownRule { name: String },
    #[snafu(display("The dictatorship rule requires an agent"))]
    MissingDictator {},
    #[snafu(display("The scoring rule requires a score vector"))]
    MissingScoreVector {},
    #[snafu(display("Could not read the score vector {content:?}"))]
    InvalidScoreVector { content: String },
    #[snafu(display("Could not read the tie-break policy {content}"))]
    InvalidTieBreak { content: String },
    #[snafu(display("Voting error"))]
    Voting { source: VotingErrors },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type TabResult<T> = Result<T, TabError>;

const DEFAULT_RULES: [&str; 6] = ["plurality", "veto", "borda", "harmonic", "stv", "range_voting"];

fn result_stats_to_json(rule: &Rule, rr: &RuleResult) -> JSValue {
    let mut js = json!({"rule": rule.name(), "winner": rr.winner.0});
    if let Rule::Dictatorship(agent) = rule {
        js["agent"] = json!(agent.0);
    }
    if !rr.tally.is_empty() {
        let mut tally: JSMap<String, JSValue> = JSMap::new();
        for (alt, score) in rr.tally.iter() {
            tally.insert(alt.to_string(), json!(score.to_string()));
        }
        js["tally"] = JSValue::Object(tally);
    }
    if !rr.tied.is_empty() {
        let tied: Vec<u32> = rr.tied.iter().map(|alt| alt.0).collect();
        js["tied"] = json!(tied);
    }
    if !rr.round_stats.is_empty() {
        let mut rounds: Vec<JSValue> = Vec::new();
        for round_stat in rr.round_stats.iter() {
            let mut tally: JSMap<String, JSValue> = JSMap::new();
            for (alt, count) in round_stat.tally.iter() {
                tally.insert(alt.to_string(), json!(count.to_string()));
            }
            rounds.push(json!({
                "round": round_stat.round,
                "tally": tally,
                "eliminated": round_stat.eliminated.0,
                "tiebreak": round_stat.tiebreak
            }));
        }
        js["rounds"] = JSValue::Array(rounds);
    }
    js
}

fn validate_tie_break(tie_break: &Option<JSValue>) -> TabResult<TieBreak> {
    match tie_break {
        None => Ok(TieBreak::Max),
        Some(JSValue::String(s)) => s.parse::<TieBreak>().context(VotingSnafu {}),
        Some(JSValue::Number(n)) => n
            .as_u64()
            .and_then(|x| u32::try_from(x).ok())
            .map(|x| TieBreak::Agent(AgentId(x)))
            .context(InvalidTieBreakSnafu {
                content: n.to_string(),
            }),
        Some(x) => InvalidTieBreakSnafu {
            content: x.to_string(),
        }
        .fail(),
    }
}

fn validate_rules(settings: &RuleSettings) -> TabResult<(Vec<Rule>, TieBreak)> {
    let tie_break = validate_tie_break(&settings.tie_break)?;

    let names: Vec<String> = match settings.rules.clone() {
        Some(names) => names,
        None => {
            // Only the rules that can be run with the given parameters.
            let mut names: Vec<String> = Vec::new();
            if settings.dictator.is_some() {
                names.push("dictatorship".to_string());
            }
            if settings.score_vector.is_some() {
                names.push("scoring_rule".to_string());
            }
            names.extend(DEFAULT_RULES.iter().map(|s| s.to_string()));
            names
        }
    };

    let mut rules: Vec<Rule> = Vec::new();
    for name in names.iter() {
        let rule = match name.as_str() {
            "dictatorship" => {
                Rule::Dictatorship(AgentId(settings.dictator.context(MissingDictatorSnafu {})?))
            }
            "scoring_rule" | "scoringRule" => Rule::ScoringRule(
                settings
                    .score_vector
                    .clone()
                    .context(MissingScoreVectorSnafu {})?,
            ),
            "plurality" => Rule::Plurality,
            "veto" => Rule::Veto,
            "borda" => Rule::Borda,
            "harmonic" => Rule::Harmonic,
            "stv" | "STV" => Rule::Stv,
            "range_voting" | "rangeVoting" => Rule::RangeVoting,
            x => return UnknownRuleSnafu { name: x }.fail(),
        };
        rules.push(rule);
    }
    Ok((rules, tie_break))
}

fn parse_score_vector(s: &str) -> TabResult<Vec<f64>> {
    s.split(',')
        .map(|w| {
            w.trim()
                .parse::<f64>()
                .ok()
                .context(InvalidScoreVectorSnafu { content: s })
        })
        .collect()
}

fn read_valuations(root_path: &Path, sources: &[FileSource]) -> TabResult<ValuationTable> {
    let mut builder = Builder::new();
    for cfs in sources.iter() {
        let p: PathBuf = root_path.join(&cfs.file_path);
        let p2 = p.as_path().display().to_string();
        info!("Attempting to read valuation file {:?}", p2);
        let rows = match cfs.provider.as_str() {
            "xlsx" | "excel" => io_excel::read_excel_valuations(&p2, cfs)?,
            "csv" => io_csv::read_csv_valuations(&p2, cfs)?,
            x => return UnknownProviderSnafu { provider: x }.fail(),
        };
        io_common::add_rows(&mut builder, &rows, &io_common::simplify_file_name(&p2))?;
    }
    builder.build().context(VotingSnafu {})
}

fn build_summary_js(
    config: &ElectionConfig,
    tie_break: TieBreak,
    results: &[(Rule, RuleResult)],
) -> JSValue {
    let c = OutputConfig {
        contest: config.output_settings.contest_name.clone(),
        date: config.output_settings.contest_date.clone(),
        tie_break: tie_break.to_string(),
    };
    let js_results: Vec<JSValue> = results
        .iter()
        .map(|(rule, rr)| result_stats_to_json(rule, rr))
        .collect();
    json!({
        "config": c,
        "results": js_results })
}

fn source_from_args(input: &str, args: &Args) -> FileSource {
    let provider = match args.input_type.clone() {
        Some(x) => x,
        None if input.to_lowercase().ends_with(".csv") => "csv".to_string(),
        None => "xlsx".to_string(),
    };
    FileSource {
        provider,
        file_path: input.to_string(),
        _first_value_row_index: args.first_row.map(|x| json!(x)),
        _first_value_column_index: args.first_column.map(|x| json!(x)),
        excel_worksheet_name: args.excel_worksheet_name.clone(),
    }
}

/// Applies the command line options on top of the configuration.
fn merge_args(config: &mut ElectionConfig, args: &Args) -> TabResult<()> {
    if let Some(input) = args.input.clone() {
        config.valuation_sources = vec![source_from_args(&input, args)];
    }
    if let Some(rules) = args.rule.clone() {
        config.rules.rules = Some(rules);
    }
    if let Some(tb) = args.tie_break.clone() {
        config.rules.tie_break = Some(JSValue::String(tb));
    }
    if let Some(sv) = args.score_vector.clone() {
        config.rules.score_vector = Some(parse_score_vector(&sv)?);
    }
    if let Some(agent) = args.agent {
        config.rules.dictator = Some(agent);
    }
    Ok(())
}

pub fn run_election_cli(args: &Args) -> TabResult<()> {
    let (mut config, root_p) = match args.config.clone() {
        Some(config_path) => {
            let config = read_config(&config_path)?;
            let root_p = Path::new(config_path.as_str())
                .parent()
                .map(|p| p.to_path_buf())
                .unwrap_or_default();
            (config, root_p)
        }
        None => {
            ensure!(args.input.is_some(), MissingInputSnafu {});
            let config = ElectionConfig {
                output_settings: OutputSettings {
                    contest_name: "election".to_string(),
                    contest_date: None,
                },
                valuation_sources: Vec::new(),
                rules: RuleSettings::default(),
            };
            (config, PathBuf::new())
        }
    };
    merge_args(&mut config, args)?;
    run_election_config(&config, &root_p, args.reference.clone(), args.out.clone())
}

pub fn run_election(
    config_path: String,
    check_summary_path: Option<String>,
    out_path: Option<String>,
) -> TabResult<()> {
    let config = read_config(&config_path)?;
    let root_p = Path::new(config_path.as_str())
        .parent()
        .map(|p| p.to_path_buf())
        .unwrap_or_default();
    run_election_config(&config, &root_p, check_summary_path, out_path)
}

fn run_election_config(
    config: &ElectionConfig,
    root_p: &Path,
    check_summary_path: Option<String>,
    out_path: Option<String>,
) -> TabResult<()> {
    info!("config: {:?}", config);

    // Validate the rules:
    let (rules, tie_break) = validate_rules(&config.rules)?;

    ensure!(!config.valuation_sources.is_empty(), MissingInputSnafu {});
    let table = read_valuations(root_p, &config.valuation_sources)?;
    info!(
        "Read valuations for {} agents from {} source(s)",
        table.num_agents(),
        config.valuation_sources.len()
    );

    let mut results: Vec<(Rule, RuleResult)> = Vec::new();
    for rule in rules.into_iter() {
        let rr = run_rule_stats(&table, &rule, tie_break).context(VotingSnafu {})?;
        info!("{}: winner: {}", rule.name(), rr.winner);
        if !rr.tied.is_empty() {
            info!(
                "{}: tie between {:?} resolved with {}",
                rule.name(),
                rr.tied,
                tie_break
            );
        }
        results.push((rule, rr));
    }

    // Assemble the final json
    let result_js = build_summary_js(config, tie_break, &results);
    let pretty_js_stats = serde_json::to_string_pretty(&result_js).context(ParsingJsonSnafu {})?;

    match out_path.as_deref() {
        Some("stdout") => {
            println!("{}", pretty_js_stats);
        }
        Some(p) => {
            fs::write(p, &pretty_js_stats).context(WritingOutputSnafu { path: p })?;
            info!("Summary written to {}", p);
        }
        None => {
            debug!("summary: {}", pretty_js_stats);
        }
    }

    // The reference summary, if provided for comparison
    if let Some(summary_p) = check_summary_path {
        let summary_ref = read_summary(summary_p)?;
        let pretty_js_summary_ref =
            serde_json::to_string_pretty(&summary_ref).context(ParsingJsonSnafu {})?;
        if pretty_js_summary_ref != pretty_js_stats {
            warn!("Found differences with the reference string");
            print_diff(
                pretty_js_summary_ref.as_str(),
                pretty_js_stats.as_str(),
                "\n",
            );
            whatever!("Difference detected between calculated summary and reference summary")
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_dir(test_name: &str) -> String {
        format!("{}/tests/data/{}", env!("CARGO_MANIFEST_DIR"), test_name)
    }

    fn test_wrapper(test_name: &str) {
        let dir = test_dir(test_name);
        let res = run_election(
            format!("{}/{}_config.json", dir, test_name),
            Some(format!("{}/{}_expected_summary.json", dir, test_name)),
            None,
        );
        if let Err(e) = res {
            panic!("An error occured {}: {:?}", e, e);
        }
    }

    fn settings(rules: &[&str]) -> RuleSettings {
        RuleSettings {
            rules: Some(rules.iter().map(|s| s.to_string()).collect()),
            ..RuleSettings::default()
        }
    }

    #[test]
    fn small_committee() {
        test_wrapper("small_committee");
    }

    #[test]
    fn committee_workbook() {
        test_wrapper("committee_workbook");
    }

    #[test]
    fn workbook_agents_are_numbered_over_non_empty_rows() {
        let dir = test_dir("committee_workbook");
        let config = read_config(&format!("{}/committee_workbook_config.json", dir)).unwrap();
        let table = read_valuations(Path::new(&dir), &config.valuation_sources).unwrap();
        assert_eq!(
            table.agents().collect::<Vec<_>>(),
            vec![AgentId(1), AgentId(2), AgentId(3), AgentId(4)]
        );
        let third = table.valuations(AgentId(3)).unwrap();
        assert_eq!(third.get(&AlternativeId(1)), Some(&3.0));
        assert_eq!(third.get(&AlternativeId(3)), Some(&1.0));
    }

    #[test]
    fn small_committee_agent_tiebreak() {
        test_wrapper("small_committee_agent_tiebreak");
    }

    #[test]
    fn reference_mismatch_is_an_error() {
        let dir = test_dir("small_committee");
        let res = run_election(
            format!("{}/small_committee_config.json", dir),
            Some(format!(
                "{}/../small_committee_agent_tiebreak/small_committee_agent_tiebreak_expected_summary.json",
                dir
            )),
            None,
        );
        assert!(matches!(res, Err(TabError::Whatever { .. })));
    }

    #[test]
    fn csv_reader() {
        let dir = test_dir("small_committee");
        let config = read_config(&format!("{}/small_committee_config.json", dir)).unwrap();
        let table = read_valuations(Path::new(&dir), &config.valuation_sources).unwrap();
        assert_eq!(table.num_agents(), 4);
        let second = table.valuations(AgentId(2)).unwrap();
        let values: Vec<(AlternativeId, f64)> = second.iter().map(|(a, s)| (*a, *s)).collect();
        assert_eq!(
            values,
            vec![
                (AlternativeId(1), 1.0),
                (AlternativeId(2), 3.0),
                (AlternativeId(3), 2.0)
            ]
        );
    }

    #[test]
    fn default_rules_depend_on_parameters() {
        let (rules, tie_break) = validate_rules(&RuleSettings::default()).unwrap();
        assert_eq!(tie_break, TieBreak::Max);
        assert_eq!(
            rules,
            vec![
                Rule::Plurality,
                Rule::Veto,
                Rule::Borda,
                Rule::Harmonic,
                Rule::Stv,
                Rule::RangeVoting
            ]
        );

        let with_params = RuleSettings {
            dictator: Some(3),
            score_vector: Some(vec![1.0, 0.0]),
            ..RuleSettings::default()
        };
        let (rules, _) = validate_rules(&with_params).unwrap();
        assert_eq!(rules[0], Rule::Dictatorship(AgentId(3)));
        assert_eq!(rules[1], Rule::ScoringRule(vec![1.0, 0.0]));
        assert_eq!(rules.len(), 8);
    }

    #[test]
    fn rule_parameters_are_required() {
        assert!(matches!(
            validate_rules(&settings(&["dictatorship"])),
            Err(TabError::MissingDictator {})
        ));
        assert!(matches!(
            validate_rules(&settings(&["scoring_rule"])),
            Err(TabError::MissingScoreVector {})
        ));
        assert!(matches!(
            validate_rules(&settings(&["condorcet"])),
            Err(TabError::UnknownRule { .. })
        ));
    }

    #[test]
    fn tie_break_settings() {
        assert_eq!(
            validate_tie_break(&Some(json!("min"))).unwrap(),
            TieBreak::Min
        );
        assert_eq!(
            validate_tie_break(&Some(json!(2))).unwrap(),
            TieBreak::Agent(AgentId(2))
        );
        assert_eq!(
            validate_tie_break(&Some(json!("4"))).unwrap(),
            TieBreak::Agent(AgentId(4))
        );
        assert!(matches!(
            validate_tie_break(&Some(json!("coin"))),
            Err(TabError::Voting {
                source: VotingErrors::InvalidPolicy { .. }
            })
        ));
        assert!(matches!(
            validate_tie_break(&Some(json!(4294967298u64))),
            Err(TabError::InvalidTieBreak { .. })
        ));
        assert!(matches!(
            validate_tie_break(&Some(json!("4294967298"))),
            Err(TabError::Voting {
                source: VotingErrors::InvalidPolicy { .. }
            })
        ));
        assert!(matches!(
            validate_tie_break(&Some(json!([1]))),
            Err(TabError::InvalidTieBreak { .. })
        ));
    }

    #[test]
    fn score_vectors() {
        assert_eq!(parse_score_vector("3, 2,0.5").unwrap(), vec![3.0, 2.0, 0.5]);
        assert!(matches!(
            parse_score_vector("3,two"),
            Err(TabError::InvalidScoreVector { .. })
        ));
    }

    #[test]
    fn summary_json() {
        let rr = RuleResult {
            winner: AlternativeId(1),
            tally: vec![(AlternativeId(1), 3.0), (AlternativeId(2), 3.0)],
            tied: vec![AlternativeId(1), AlternativeId(2)],
            round_stats: Vec::new(),
        };
        assert_eq!(
            result_stats_to_json(&Rule::Veto, &rr),
            json!({
                "rule": "veto",
                "winner": 1,
                "tally": {"1": "3", "2": "3"},
                "tied": [1, 2]
            })
        );
        let dict = RuleResult {
            winner: AlternativeId(2),
            tally: Vec::new(),
            tied: Vec::new(),
            round_stats: Vec::new(),
        };
        assert_eq!(
            result_stats_to_json(&Rule::Dictatorship(AgentId(4)), &dict),
            json!({"rule": "dictatorship", "agent": 4, "winner": 2})
        );
    }
}
