pub use crate::config::*;

use snafu::prelude::*;

/// A builder for assembling a valuation table.
///
/// Rows are added one agent at a time. The columns of a row are the
/// alternatives `1, 2, ...`.
///
/// ```
/// pub use social_choice::builder::Builder;
/// pub use social_choice::{borda, derive_preferences, AlternativeId, TieBreak};
/// # use social_choice::VotingErrors;
///
/// let mut builder = Builder::new();
/// builder.add_row(&[3.0, 1.0, 2.0])?;
/// builder.add_row(&[1.0, 2.0, 3.0])?;
/// let table = builder.build()?;
///
/// let profile = derive_preferences(&table)?;
/// assert_eq!(borda(&profile, TieBreak::Max)?, AlternativeId(3));
///
/// # Ok::<(), VotingErrors>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct Builder {
    _table: ValuationTable,
}

impl Builder {
    pub fn new() -> Builder {
        Builder {
            _table: ValuationTable::default(),
        }
    }

    /// Registers a new agent, numbered after the last registered agent.
    pub fn add_agent(&mut self) -> Result<AgentId, VotingErrors> {
        let next = match self._table.rows.keys().next_back() {
            Some(last) => last.0.checked_add(1).context(InvalidInputSnafu {
                reason: format!("no agent identifier left after agent {}", last),
            })?,
            None => 1,
        };
        let agent = AgentId(next);
        self._table.rows.entry(agent).or_default();
        Ok(agent)
    }

    /// Adds one valuation.
    ///
    /// Agents do not need to be registered beforehand, but each
    /// (agent, alternative) pair may only be given once.
    pub fn add_valuation(
        &mut self,
        agent: AgentId,
        alternative: AlternativeId,
        score: Score,
    ) -> Result<(), VotingErrors> {
        ensure!(
            agent.0 > 0 && alternative.0 > 0,
            InvalidInputSnafu {
                reason: format!(
                    "identifiers start at 1 (agent {}, alternative {})",
                    agent, alternative
                ),
            }
        );
        ensure!(
            score.is_finite(),
            InvalidInputSnafu {
                reason: format!(
                    "agent {} gives a non-finite score to alternative {}",
                    agent, alternative
                ),
            }
        );
        let vals = self._table.rows.entry(agent).or_default();
        ensure!(
            !vals.contains_key(&alternative),
            InvalidInputSnafu {
                reason: format!(
                    "agent {} values alternative {} more than once",
                    agent, alternative
                ),
            }
        );
        vals.insert(alternative, score);
        Ok(())
    }

    /// Adds a full row of scores for a new agent.
    ///
    /// It is the simplest use case for most cases.
    ///
    /// Nothing is added if one of the scores is rejected.
    pub fn add_row(&mut self, scores: &[Score]) -> Result<AgentId, VotingErrors> {
        if let Some(idx) = scores.iter().position(|s| !s.is_finite()) {
            return InvalidInputSnafu {
                reason: format!("non-finite score for alternative {}", idx + 1),
            }
            .fail();
        }
        let agent = self.add_agent()?;
        for (idx, score) in scores.iter().enumerate() {
            self.add_valuation(agent, AlternativeId((idx + 1) as u32), *score)?;
        }
        Ok(agent)
    }

    pub fn build(self) -> Result<ValuationTable, VotingErrors> {
        ensure!(!self._table.is_empty(), EmptyElectionSnafu {});
        Ok(self._table)
    }
}
