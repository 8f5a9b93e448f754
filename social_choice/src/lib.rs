pub mod builder;
mod config;
pub mod manual;

use log::{debug, info};
use snafu::prelude::*;

use std::{cmp::Ordering, collections::BTreeMap};

pub use crate::config::*;

/// Ranks the alternatives of every agent from its valuations.
///
/// Alternatives are sorted by decreasing score. Two alternatives with exactly
/// the same score are ordered by decreasing identifier.
pub fn derive_preferences(table: &ValuationTable) -> Result<PreferenceProfile, VotingErrors> {
    ensure!(!table.is_empty(), EmptyElectionSnafu {});
    let mut rankings: BTreeMap<AgentId, Vec<AlternativeId>> = BTreeMap::new();
    for (agent, vals) in table.rows() {
        ensure!(
            !vals.is_empty(),
            InvalidInputSnafu {
                reason: format!("agent {} has no valuation", agent),
            }
        );
        let mut scored: Vec<(AlternativeId, Score)> = vals.iter().map(|(a, s)| (*a, *s)).collect();
        scored.sort_by(|(a1, s1), (a2, s2)| {
            s2.partial_cmp(s1)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a2.cmp(a1))
        });
        let ranking: Vec<AlternativeId> = scored.into_iter().map(|(a, _)| a).collect();
        debug!("derive_preferences: agent {}: {:?}", agent, ranking);
        rankings.insert(*agent, ranking);
    }
    PreferenceProfile::new(rankings)
}

/// Picks a single alternative among tied alternatives.
///
/// The profile is only consulted when the policy names an agent. An agent
/// absent from the profile is an invalid policy.
pub fn resolve_tie(
    policy: TieBreak,
    tied: &TieSet,
    profile: &PreferenceProfile,
) -> Result<AlternativeId, VotingErrors> {
    match policy {
        TieBreak::Agent(agent) => resolve_by_agent(agent, tied, profile),
        TieBreak::Max | TieBreak::Min => resolve_by_identifier(policy, tied),
    }
}

fn resolve_by_identifier(policy: TieBreak, tied: &TieSet) -> Result<AlternativeId, VotingErrors> {
    let mut ids = tied.keys().copied();
    let picked = match policy {
        TieBreak::Max => ids.next_back(),
        TieBreak::Min => ids.next(),
        TieBreak::Agent(agent) => {
            return InvalidPolicySnafu {
                policy: agent.to_string(),
            }
            .fail()
        }
    };
    let res = picked.context(EmptyElectionSnafu {})?;
    debug!("resolve_tie: {} among {:?} -> {}", policy, tied, res);
    Ok(res)
}

fn resolve_by_agent(
    agent: AgentId,
    tied: &TieSet,
    profile: &PreferenceProfile,
) -> Result<AlternativeId, VotingErrors> {
    let ranking = profile.ranking(agent).context(InvalidPolicySnafu {
        policy: agent.to_string(),
    })?;
    let res = ranking
        .iter()
        .find(|alt| tied.contains_key(*alt))
        .copied()
        .context(MalformedProfileSnafu {
            reason: format!("agent {} ranks none of {:?}", agent, tied),
        })?;
    debug!(
        "resolve_tie: agent {} ({:?}) among {:?} -> {}",
        agent, ranking, tied, res
    );
    Ok(res)
}

/// The alternatives reaching the best score.
///
/// Scores are compared for exact equality, including the floating point sums
/// of the harmonic rule.
fn top_scorers(tally: &BTreeMap<AlternativeId, Score>) -> TieSet {
    let best = tally.values().copied().fold(f64::NEG_INFINITY, f64::max);
    tally
        .iter()
        .filter(|(_, score)| **score == best)
        .map(|(alt, score)| (*alt, *score))
        .collect()
}

fn single(tied: &TieSet) -> Option<AlternativeId> {
    match tied.len() {
        1 => tied.keys().next().copied(),
        _ => None,
    }
}

fn conclude(
    tally: BTreeMap<AlternativeId, Score>,
    tied: &TieSet,
    winner: AlternativeId,
) -> RuleResult {
    RuleResult {
        winner,
        tally: tally.into_iter().collect(),
        tied: if tied.len() > 1 {
            tied.keys().copied().collect()
        } else {
            Vec::new()
        },
        round_stats: Vec::new(),
    }
}

// ********* Dictatorship **********

pub fn dictatorship(
    profile: &PreferenceProfile,
    agent: AgentId,
) -> Result<AlternativeId, VotingErrors> {
    dictatorship_stats(profile, agent).map(|rr| rr.winner)
}

pub fn dictatorship_stats(
    profile: &PreferenceProfile,
    agent: AgentId,
) -> Result<RuleResult, VotingErrors> {
    let ranking = profile
        .ranking(agent)
        .context(InvalidAgentSnafu { agent })?;
    let winner = ranking.first().copied().context(EmptyElectionSnafu {})?;
    Ok(RuleResult {
        winner,
        tally: Vec::new(),
        tied: Vec::new(),
        round_stats: Vec::new(),
    })
}

// ********* Positional scoring **********

/// Runs a positional scoring rule.
///
/// `position_value(rank, m)` is the value an agent gives to the alternative it
/// ranks at `rank` (0 for the first one), out of `m` alternatives. The values
/// are summed over all the agents and the alternative with the largest sum
/// wins.
pub fn positional_score<F>(
    profile: &PreferenceProfile,
    position_value: F,
    tie_break: TieBreak,
) -> Result<AlternativeId, VotingErrors>
where
    F: Fn(usize, usize) -> Score,
{
    positional_stats(profile, position_value, tie_break).map(|rr| rr.winner)
}

pub fn positional_stats<F>(
    profile: &PreferenceProfile,
    position_value: F,
    tie_break: TieBreak,
) -> Result<RuleResult, VotingErrors>
where
    F: Fn(usize, usize) -> Score,
{
    let m = profile.width();
    let mut tally: BTreeMap<AlternativeId, Score> =
        profile.alternatives().into_iter().map(|a| (a, 0.0)).collect();
    for (_, ranking) in profile.iter() {
        for (rank, alt) in ranking.iter().enumerate() {
            *tally.entry(*alt).or_insert(0.0) += position_value(rank, m);
        }
    }
    debug!("positional_stats: tally: {:?}", tally);

    let tied = top_scorers(&tally);
    let winner = match single(&tied) {
        Some(alt) => alt,
        None => resolve_tie(tie_break, &tied, profile)?,
    };
    Ok(conclude(tally, &tied, winner))
}

/// The generic scoring rule: the weights of `score_vector`, sorted in
/// decreasing order, are given to the ranks in order.
pub fn scoring_rule(
    profile: &PreferenceProfile,
    score_vector: &[Score],
    tie_break: TieBreak,
) -> Result<AlternativeId, VotingErrors> {
    scoring_rule_stats(profile, score_vector, tie_break).map(|rr| rr.winner)
}

pub fn scoring_rule_stats(
    profile: &PreferenceProfile,
    score_vector: &[Score],
    tie_break: TieBreak,
) -> Result<RuleResult, VotingErrors> {
    ensure!(
        score_vector.len() == profile.width(),
        LengthMismatchSnafu {
            expected: profile.width(),
            actual: score_vector.len(),
        }
    );
    ensure!(
        score_vector.iter().all(|w| w.is_finite()),
        InvalidInputSnafu {
            reason: format!("non-finite weight in score vector {:?}", score_vector),
        }
    );
    let mut weights = score_vector.to_vec();
    weights.sort_by(|a, b| b.partial_cmp(a).unwrap_or(Ordering::Equal));
    positional_stats(profile, |rank, _| weights[rank], tie_break)
}

pub fn plurality(
    profile: &PreferenceProfile,
    tie_break: TieBreak,
) -> Result<AlternativeId, VotingErrors> {
    plurality_stats(profile, tie_break).map(|rr| rr.winner)
}

pub fn plurality_stats(
    profile: &PreferenceProfile,
    tie_break: TieBreak,
) -> Result<RuleResult, VotingErrors> {
    positional_stats(
        profile,
        |rank, _| if rank == 0 { 1.0 } else { 0.0 },
        tie_break,
    )
}

pub fn veto(profile: &PreferenceProfile, tie_break: TieBreak) -> Result<AlternativeId, VotingErrors> {
    veto_stats(profile, tie_break).map(|rr| rr.winner)
}

pub fn veto_stats(
    profile: &PreferenceProfile,
    tie_break: TieBreak,
) -> Result<RuleResult, VotingErrors> {
    positional_stats(
        profile,
        |rank, m| if rank + 1 == m { 0.0 } else { 1.0 },
        tie_break,
    )
}

pub fn borda(
    profile: &PreferenceProfile,
    tie_break: TieBreak,
) -> Result<AlternativeId, VotingErrors> {
    borda_stats(profile, tie_break).map(|rr| rr.winner)
}

pub fn borda_stats(
    profile: &PreferenceProfile,
    tie_break: TieBreak,
) -> Result<RuleResult, VotingErrors> {
    positional_stats(profile, |rank, m| (m - 1 - rank) as Score, tie_break)
}

pub fn harmonic(
    profile: &PreferenceProfile,
    tie_break: TieBreak,
) -> Result<AlternativeId, VotingErrors> {
    harmonic_stats(profile, tie_break).map(|rr| rr.winner)
}

/// The alternative at rank `j` (starting at 1) receives `1/j`.
///
/// Sums are floating point numbers, and two alternatives are only tied when
/// their sums are exactly equal.
pub fn harmonic_stats(
    profile: &PreferenceProfile,
    tie_break: TieBreak,
) -> Result<RuleResult, VotingErrors> {
    positional_stats(profile, |rank, _| 1.0 / (rank + 1) as Score, tie_break)
}

// ********* Single transferable vote **********

pub fn stv(profile: &PreferenceProfile, tie_break: TieBreak) -> Result<AlternativeId, VotingErrors> {
    stv_stats(profile, tie_break).map(|rr| rr.winner)
}

/// Repeatedly removes the alternative ranked first by the fewest agents, until
/// a single alternative is left.
///
/// The elimination works on a private copy of the profile. Ties between the
/// least popular alternatives are resolved against the profile as it was
/// given.
pub fn stv_stats(
    profile: &PreferenceProfile,
    tie_break: TieBreak,
) -> Result<RuleResult, VotingErrors> {
    let mut remaining: PreferenceProfile = profile.clone();
    let mut round_stats: Vec<RoundStats> = Vec::new();

    for round_id in 1..=(profile.width() as u32) {
        let alternatives = remaining.alternatives();
        if let [winner] = alternatives.as_slice() {
            info!("stv: round {}: {} is the last alternative", round_id, winner);
            return Ok(RuleResult {
                winner: *winner,
                tally: Vec::new(),
                tied: Vec::new(),
                round_stats,
            });
        }

        // Alternatives that nobody ranks first still take part with 0.
        let mut first_counts: BTreeMap<AlternativeId, u64> =
            alternatives.iter().map(|a| (*a, 0)).collect();
        for (_, ranking) in remaining.iter() {
            if let Some(first) = ranking.first() {
                *first_counts.entry(*first).or_insert(0) += 1;
            }
        }
        debug!("stv: round {}: tally: {:?}", round_id, first_counts);

        let fewest = first_counts
            .values()
            .copied()
            .min()
            .context(EmptyElectionSnafu {})?;
        let least: TieSet = first_counts
            .iter()
            .filter(|(_, count)| **count == fewest)
            .map(|(alt, count)| (*alt, *count as Score))
            .collect();

        let (eliminated, tiebreak) = match single(&least) {
            Some(alt) => (alt, false),
            None => (resolve_tie(tie_break, &least, profile)?, true),
        };
        info!(
            "stv: round {}: eliminating {} ({} first places{})",
            round_id,
            eliminated,
            fewest,
            if tiebreak { ", after tiebreak" } else { "" }
        );

        round_stats.push(RoundStats {
            round: round_id,
            tally: first_counts.into_iter().collect(),
            eliminated,
            tiebreak,
        });
        remaining.remove_alternative(eliminated)?;
    }
    NoConvergenceSnafu {}.fail()
}

// ********* Range voting **********

pub fn range_voting(
    table: &ValuationTable,
    tie_break: TieBreak,
) -> Result<AlternativeId, VotingErrors> {
    range_voting_stats(table, tie_break).map(|rr| rr.winner)
}

/// The alternative with the largest sum of valuations.
///
/// The preferences are only derived from the table if a tie has to be
/// resolved by an agent.
pub fn range_voting_stats(
    table: &ValuationTable,
    tie_break: TieBreak,
) -> Result<RuleResult, VotingErrors> {
    let mut tally: BTreeMap<AlternativeId, Score> = BTreeMap::new();
    for (_, alt, score) in table.entries() {
        *tally.entry(alt).or_insert(0.0) += score;
    }
    ensure!(!tally.is_empty(), EmptyElectionSnafu {});
    debug!("range_voting_stats: tally: {:?}", tally);

    let tied = top_scorers(&tally);
    let winner = match (single(&tied), tie_break) {
        (Some(alt), _) => alt,
        (None, TieBreak::Agent(agent)) => {
            let profile = derive_preferences(table)?;
            resolve_by_agent(agent, &tied, &profile)?
        }
        (None, _) => resolve_by_identifier(tie_break, &tied)?,
    };
    Ok(conclude(tally, &tied, winner))
}

// ********* Dispatch **********

/// Runs the given rule over a valuation table.
///
/// Arguments:
/// * `table` the valuations of every agent
/// * `rule` the rule to apply
/// * `tie_break` the policy used whenever several alternatives are tied
pub fn run_rule_stats(
    table: &ValuationTable,
    rule: &Rule,
    tie_break: TieBreak,
) -> Result<RuleResult, VotingErrors> {
    info!(
        "Processing rule {} over {} agents, tie-break: {}",
        rule.name(),
        table.num_agents(),
        tie_break
    );
    match rule {
        Rule::RangeVoting => range_voting_stats(table, tie_break),
        _ => {
            let profile = derive_preferences(table)?;
            run_profile_rule_stats(&profile, rule, tie_break)
        }
    }
}

fn run_profile_rule_stats(
    profile: &PreferenceProfile,
    rule: &Rule,
    tie_break: TieBreak,
) -> Result<RuleResult, VotingErrors> {
    match rule {
        Rule::Dictatorship(agent) => dictatorship_stats(profile, *agent),
        Rule::ScoringRule(score_vector) => scoring_rule_stats(profile, score_vector, tie_break),
        Rule::Plurality => plurality_stats(profile, tie_break),
        Rule::Veto => veto_stats(profile, tie_break),
        Rule::Borda => borda_stats(profile, tie_break),
        Rule::Harmonic => harmonic_stats(profile, tie_break),
        Rule::Stv => stv_stats(profile, tie_break),
        Rule::RangeVoting => InvalidInputSnafu {
            reason: "range voting needs the valuation table",
        }
        .fail(),
    }
}
