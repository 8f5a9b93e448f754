use clap::Parser;

/// This is a tabulation program for classical social choice rules.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) The file containing the election description in JSON format.
    /// The other options, if provided, override the content of this file.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,
    /// (file path) A reference file containing the outcome of an election in JSON format. If provided, choicetab will
    /// check that the tabulated output matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (file path, 'stdout' or empty) If specified, the summary of the election will be written in JSON format to the given
    /// location.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path or empty) The file containing the valuations, one row per agent and one column per alternative.
    /// Setting this option overrides the sources that may be specified with the --config option.
    #[clap(short, long, value_parser)]
    pub input: Option<String>,

    /// (xlsx or csv) The type of the input. By default, it is guessed from the extension of the file.
    #[clap(long, value_parser)]
    pub input_type: Option<String>,

    /// (repeatable) The rules to run: dictatorship, scoring_rule, plurality, veto, borda, harmonic, stv, range_voting.
    /// By default, all the rules that can be run with the other options are run.
    #[clap(long, value_parser)]
    pub rule: Option<Vec<String>>,

    /// (max, min or an agent number, default max) The policy to decide between tied alternatives.
    #[clap(long, value_parser)]
    pub tie_break: Option<String>,

    /// (comma-separated numbers) The weights of the scoring rule, one per alternative.
    #[clap(long, value_parser)]
    pub score_vector: Option<String>,

    /// (agent number) The agent deciding the outcome of the dictatorship rule.
    #[clap(long, value_parser)]
    pub agent: Option<u32>,

    /// (default 1) The first row of the input containing valuations.
    #[clap(long, value_parser)]
    pub first_row: Option<u32>,

    /// (default 1) The first column of the input containing valuations.
    #[clap(long, value_parser)]
    pub first_column: Option<u32>,

    /// When using an Excel file with several worksheets, indicates the name of the worksheet to use.
    #[clap(long, value_parser)]
    pub excel_worksheet_name: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
