use std::collections::HashMap;

use futures::future::BoxFuture;
use tracing::{debug, warn};

use weft_core::error::{EngineError, Result};
use weft_core::traits::QuotaService;
use weft_core::types::{AgentId, Team, TeamId};

/// Execution-time allowance for free teams: 30 minutes.
pub const FREE_AGENT_TIME_LIMIT_MS: u64 = 30 * 60 * 1000;

/// Pre-flight authorization: resolve the agent's owning team and ask the
/// quota service whether execution time is available.
///
/// Zero teams means the agent does not exist; more than one violates the
/// one-team-per-agent invariant and is surfaced distinctly so it can alert.
pub async fn ensure_time_available(quota: &dyn QuotaService, agent_id: &AgentId) -> Result<Team> {
    let mut teams = quota.teams_for_agent(agent_id).await?;
    if teams.is_empty() {
        return Err(EngineError::AgentNotFound(agent_id.clone()));
    }
    if teams.len() > 1 {
        warn!(agent_id = %agent_id, teams = teams.len(), "agent mapped to multiple teams");
        return Err(EngineError::AgentInMultipleTeams(agent_id.clone()));
    }
    let team = teams.remove(0);
    if quota.is_time_available(&team).await? {
        debug!(agent_id = %agent_id, team = %team.id, "execution time available");
        Ok(team)
    } else {
        Err(EngineError::AgentTimeNotAvailable)
    }
}

/// The execution-time limit for a team, in milliseconds.
///
/// `None` means unlimited. Restricted teams get a hard zero; pro teams with
/// an active subscription are unmetered; everyone else gets the free
/// allowance.
pub fn agent_time_limit_ms(team: &Team, restricted: &[TeamId]) -> Option<u64> {
    if restricted.contains(&team.id) {
        return Some(0);
    }
    if team.is_pro() {
        return None;
    }
    Some(FREE_AGENT_TIME_LIMIT_MS)
}

/// Quota service computing availability from recorded usage.
///
/// Team membership, elapsed usage, and the restricted list are supplied by
/// the embedder; nothing is cached between calls.
#[derive(Default)]
pub struct UsageBasedQuota {
    teams_by_agent: HashMap<AgentId, Vec<Team>>,
    used_ms_by_team: HashMap<TeamId, u64>,
    restricted: Vec<TeamId>,
}

impl UsageBasedQuota {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_agent(mut self, agent_id: AgentId, team: Team) -> Self {
        self.teams_by_agent.entry(agent_id).or_default().push(team);
        self
    }

    pub fn with_usage(mut self, team_id: TeamId, used_ms: u64) -> Self {
        self.used_ms_by_team.insert(team_id, used_ms);
        self
    }

    pub fn with_restricted(mut self, team_id: TeamId) -> Self {
        self.restricted.push(team_id);
        self
    }
}

impl QuotaService for UsageBasedQuota {
    fn teams_for_agent(&self, agent_id: &AgentId) -> BoxFuture<'_, Result<Vec<Team>>> {
        let agent_id = agent_id.clone();
        Box::pin(async move {
            Ok(self
                .teams_by_agent
                .get(&agent_id)
                .cloned()
                .unwrap_or_default())
        })
    }

    fn is_time_available(&self, team: &Team) -> BoxFuture<'_, Result<bool>> {
        let team = team.clone();
        Box::pin(async move {
            let available = match agent_time_limit_ms(&team, &self.restricted) {
                None => true,
                Some(limit_ms) => {
                    let used_ms = self.used_ms_by_team.get(&team.id).copied().unwrap_or(0);
                    used_ms < limit_ms
                }
            };
            Ok(available)
        })
    }
}
