//! Prep-time brainstorming: concurrent fan-out, join-all fan-in.

use crate::error::DebateError;
use crate::providers::BrainstormProvider;
use crate::role::Team;

use std::sync::Arc;
use tracing::info;

/// Per-team strategic briefs, populated exactly once before the first turn.
/// There is no mutation API; a `ClueSet` is always complete.
#[derive(Debug, Clone, Default)]
pub struct ClueSet {
    clues: [String; 4],
}

impl ClueSet {
    pub fn get(&self, team: Team) -> &str {
        &self.clues[team.index()]
    }
}

/// Fans one analysis request out per team and joins the results back in,
/// bound by input position.
pub struct BrainstormCoordinator {
    provider: Arc<dyn BrainstormProvider>,
}

impl BrainstormCoordinator {
    pub fn new(provider: Arc<dyn BrainstormProvider>) -> Self {
        Self { provider }
    }

    /// Runs every team's request concurrently and waits for all of them.
    /// If any single request fails, the whole preparatory phase fails; a
    /// partial `ClueSet` is never exposed. `ClueSet[teams[k]]` is bound to
    /// the k-th input team regardless of completion order.
    pub async fn prepare(&self, motion: &str, teams: &[Team]) -> Result<ClueSet, DebateError> {
        info!("brainstorming for {} teams", teams.len());

        let handles: Vec<_> = teams
            .iter()
            .map(|&team| {
                let provider = Arc::clone(&self.provider);
                let motion = motion.to_owned();
                tokio::spawn(async move { provider.brainstorm(&motion, team).await })
            })
            .collect();

        // Join every task before inspecting any result.
        let mut results = Vec::with_capacity(handles.len());
        for (&team, handle) in teams.iter().zip(handles) {
            let joined = handle.await.map_err(|e| DebateError::Brainstorm {
                team: team.display_name().to_string(),
                message: format!("task failed: {e}"),
            })?;
            results.push((team, joined));
        }

        let mut clues: [String; 4] = Default::default();
        for (team, result) in results {
            match result {
                Ok(text) => clues[team.index()] = text,
                Err(e) => return Err(e),
            }
        }

        info!("brainstorming complete");
        Ok(ClueSet { clues })
    }
}
