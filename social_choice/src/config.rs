// ********* Input data structures ***********

use snafu::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Display;
use std::str::FromStr;

/// An agent (voter). Identifiers start at 1.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub struct AgentId(pub u32);

/// An alternative (candidate). Identifiers start at 1.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub struct AlternativeId(pub u32);

impl Display for AgentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Display for AlternativeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A numeric valuation, or a summed score.
pub type Score = f64;

/// The numeric score every agent gives to every alternative.
///
/// Tables are assembled with the [`crate::builder::Builder`]. A table never
/// holds two valuations for the same (agent, alternative) pair.
#[derive(PartialEq, Debug, Clone, Default)]
pub struct ValuationTable {
    pub(crate) rows: BTreeMap<AgentId, BTreeMap<AlternativeId, Score>>,
}

impl ValuationTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn num_agents(&self) -> usize {
        self.rows.len()
    }

    pub fn agents(&self) -> impl Iterator<Item = AgentId> + '_ {
        self.rows.keys().copied()
    }

    /// The valuations recorded for one agent, by alternative.
    pub fn valuations(&self, agent: AgentId) -> Option<&BTreeMap<AlternativeId, Score>> {
        self.rows.get(&agent)
    }

    /// All the entries, by increasing agent then alternative.
    pub fn entries(&self) -> impl Iterator<Item = (AgentId, AlternativeId, Score)> + '_ {
        self.rows.iter().flat_map(|(agent, vals)| {
            vals.iter()
                .map(move |(alternative, score)| (*agent, *alternative, *score))
        })
    }

    pub(crate) fn rows(&self) -> impl Iterator<Item = (&AgentId, &BTreeMap<AlternativeId, Score>)> {
        self.rows.iter()
    }
}

/// The ranking of every agent, most preferred alternative first.
///
/// Invariant: there is at least one agent, and all the agents rank the same
/// non-empty set of alternatives, each exactly once.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct PreferenceProfile {
    rankings: BTreeMap<AgentId, Vec<AlternativeId>>,
}

impl PreferenceProfile {
    pub fn new(
        rankings: BTreeMap<AgentId, Vec<AlternativeId>>,
    ) -> Result<PreferenceProfile, VotingErrors> {
        let profile = PreferenceProfile { rankings };
        profile.check()?;
        Ok(profile)
    }

    fn check(&self) -> Result<(), VotingErrors> {
        let (first_agent, first) = self
            .rankings
            .iter()
            .next()
            .context(EmptyElectionSnafu {})?;
        let expected: BTreeSet<AlternativeId> = first.iter().copied().collect();
        ensure!(
            !expected.is_empty(),
            MalformedProfileSnafu {
                reason: format!("agent {} ranks no alternative", first_agent),
            }
        );
        ensure!(
            !expected.contains(&AlternativeId(0)),
            MalformedProfileSnafu {
                reason: "alternative identifiers start at 1",
            }
        );
        for (agent, ranking) in self.rankings.iter() {
            let seen: BTreeSet<AlternativeId> = ranking.iter().copied().collect();
            ensure!(
                seen.len() == ranking.len(),
                MalformedProfileSnafu {
                    reason: format!("agent {} ranks an alternative twice", agent),
                }
            );
            ensure!(
                seen == expected,
                MalformedProfileSnafu {
                    reason: format!(
                        "agent {} ranks {:?} but agent {} ranks {:?}",
                        agent, seen, first_agent, expected
                    ),
                }
            );
        }
        Ok(())
    }

    /// The number of alternatives ranked by each agent.
    pub fn width(&self) -> usize {
        self.rankings.values().next().map(|r| r.len()).unwrap_or(0)
    }

    pub fn num_agents(&self) -> usize {
        self.rankings.len()
    }

    pub fn ranking(&self, agent: AgentId) -> Option<&[AlternativeId]> {
        self.rankings.get(&agent).map(|r| r.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (AgentId, &[AlternativeId])> {
        self.rankings.iter().map(|(a, r)| (*a, r.as_slice()))
    }

    /// The alternatives, in increasing order.
    pub fn alternatives(&self) -> Vec<AlternativeId> {
        let mut res: Vec<AlternativeId> = self
            .rankings
            .values()
            .next()
            .cloned()
            .unwrap_or_default();
        res.sort();
        res
    }

    /// Removes the alternative from every ranking at once.
    pub(crate) fn remove_alternative(
        &mut self,
        alternative: AlternativeId,
    ) -> Result<(), VotingErrors> {
        for ranking in self.rankings.values_mut() {
            ranking.retain(|a| *a != alternative);
        }
        self.check()
    }
}

// ********* Configuration **********

/// How to pick a single winner among alternatives with the same score.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum TieBreak {
    /// The alternative with the greatest identifier.
    Max,
    /// The alternative with the smallest identifier.
    Min,
    /// The alternative this agent ranks highest.
    Agent(AgentId),
}

impl FromStr for TieBreak {
    type Err = VotingErrors;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "max" => Ok(TieBreak::Max),
            "min" => Ok(TieBreak::Min),
            x => x
                .parse::<u32>()
                .ok()
                .map(|id| TieBreak::Agent(AgentId(id)))
                .context(InvalidPolicySnafu { policy: x }),
        }
    }
}

impl Display for TieBreak {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TieBreak::Max => write!(f, "max"),
            TieBreak::Min => write!(f, "min"),
            TieBreak::Agent(agent) => write!(f, "{}", agent),
        }
    }
}

/// Alternatives sharing the same score, handed over to the tie-breaker.
pub type TieSet = BTreeMap<AlternativeId, Score>;

/// The rules that can be run against a valuation table.
#[derive(PartialEq, Debug, Clone)]
pub enum Rule {
    Dictatorship(AgentId),
    /// A score vector with one weight per rank. The weights are applied in
    /// decreasing order, whatever order they are given in.
    ScoringRule(Vec<Score>),
    Plurality,
    Veto,
    Borda,
    Harmonic,
    Stv,
    RangeVoting,
}

impl Rule {
    pub fn name(&self) -> &'static str {
        match self {
            Rule::Dictatorship(_) => "dictatorship",
            Rule::ScoringRule(_) => "scoring_rule",
            Rule::Plurality => "plurality",
            Rule::Veto => "veto",
            Rule::Borda => "borda",
            Rule::Harmonic => "harmonic",
            Rule::Stv => "stv",
            Rule::RangeVoting => "range_voting",
        }
    }
}

// ******** Output data structures *********

/// Statistics for one elimination round of STV.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct RoundStats {
    pub round: u32,
    /// Number of agents ranking each remaining alternative first.
    pub tally: Vec<(AlternativeId, u64)>,
    pub eliminated: AlternativeId,
    /// True if the eliminated alternative was picked by the tie-breaker.
    pub tiebreak: bool,
}

#[derive(PartialEq, Debug, Clone)]
pub struct RuleResult {
    pub winner: AlternativeId,
    /// The final score of every alternative, by increasing identifier.
    /// Empty for the rules that do not sum scores.
    pub tally: Vec<(AlternativeId, Score)>,
    /// The alternatives that shared the best score, if the tie-breaker was needed.
    pub tied: Vec<AlternativeId>,
    pub round_stats: Vec<RoundStats>,
}

/// Errors that prevent a rule from producing a winner.
#[derive(Debug, Snafu, PartialEq)]
#[snafu(visibility(pub(crate)))]
pub enum VotingErrors {
    #[snafu(display("The election has no agent or no alternative"))]
    EmptyElection {},
    #[snafu(display("Invalid input: {reason}"))]
    InvalidInput { reason: String },
    #[snafu(display("Agent {agent} is not part of the preference profile"))]
    InvalidAgent { agent: AgentId },
    #[snafu(display("The score vector has {actual} weights but there are {expected} alternatives"))]
    LengthMismatch { expected: usize, actual: usize },
    #[snafu(display("Unknown tie-break policy {policy:?}: expected max, min or an agent"))]
    InvalidPolicy { policy: String },
    #[snafu(display("Malformed preference profile: {reason}"))]
    MalformedProfile { reason: String },
    #[snafu(display("The elimination did not converge to a single alternative"))]
    NoConvergence {},
}
