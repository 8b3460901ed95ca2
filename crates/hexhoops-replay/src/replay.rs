//! Replaying an action script against a fresh match.

use hexhoops_core::{
    ActionEngine, CardDefinition, Catalog, GameAction, GameError, GameState, MatchConfig,
    TriggerRegistry,
};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Action {index} ({action}) failed: {source}")]
    Action {
        index: usize,
        action: String,
        source: GameError,
    },
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ReplayError> {
    let text = std::fs::read_to_string(path).map_err(|source| ReplayError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| ReplayError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Files a replay reads
#[derive(Debug, Clone)]
pub struct ReplayInputs {
    pub catalog: PathBuf,
    pub match_config: PathBuf,
    pub actions: PathBuf,
}

/// A loaded script, ready to run
pub struct Replay {
    pub catalog: Catalog,
    pub config: MatchConfig,
    pub actions: Vec<GameAction>,
    /// Keep going after a recoverable rejection instead of stopping
    pub keep_going: bool,
}

/// What a replay produced
#[derive(Debug)]
pub struct ReplayOutcome {
    pub state: GameState,
    pub applied: usize,
    pub rejected: Vec<(usize, GameError)>,
}

impl Replay {
    pub fn load(inputs: &ReplayInputs) -> Result<Self, ReplayError> {
        let definitions: Vec<CardDefinition> = read_json(&inputs.catalog)?;
        let config: MatchConfig = read_json(&inputs.match_config)?;
        let actions: Vec<GameAction> = read_json(&inputs.actions)?;

        info!(
            cards = definitions.len(),
            actions = actions.len(),
            "Loaded replay script"
        );

        Ok(Self {
            catalog: Catalog::from_definitions(definitions),
            config,
            actions,
            keep_going: false,
        })
    }

    /// Apply every action in order.
    ///
    /// Card abilities are re-bound before each step so reactive effects
    /// follow whoever is on court at that moment. Invariant violations always
    /// stop the replay.
    pub fn run(&self) -> Result<ReplayOutcome, ReplayError> {
        let mut state = GameState::new(&self.config, &self.catalog);
        let mut applied = 0;
        let mut rejected = Vec::new();

        for (index, action) in self.actions.iter().enumerate() {
            let mut registry = TriggerRegistry::new();
            registry.register_card_abilities(&state, &self.catalog);
            let engine = ActionEngine::new(&self.catalog).with_triggers(&registry);

            match engine.apply(&state, action.clone()) {
                Ok(next) => {
                    debug!(index, kind = ?action.kind(), "Replayed action");
                    state = next;
                    applied += 1;
                }
                Err(err) if self.keep_going && !err.is_fatal() => {
                    warn!(index, %err, "Skipping rejected action");
                    rejected.push((index, err));
                }
                Err(source) => {
                    return Err(ReplayError::Action {
                        index,
                        action: format!("{:?}", action.kind()),
                        source,
                    })
                }
            }
        }

        Ok(ReplayOutcome {
            state,
            applied,
            rejected,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hexhoops_core::{HexPosition, Team, TeamConfig};

    fn replay(actions: Vec<GameAction>) -> Replay {
        Replay {
            catalog: Catalog::new(),
            config: MatchConfig::new(
                TeamConfig {
                    deck: vec!["card-1".into(), "card-2".into()],
                    roster: vec!["center".into()],
                },
                TeamConfig::default(),
            ),
            actions,
            keep_going: false,
        }
    }

    #[test]
    fn test_run_applies_in_order() {
        let outcome = replay(vec![
            GameAction::DrawCards {
                team: Team::Home,
                count: 1,
            },
            GameAction::MovePlayer {
                player_id: "HOME-center-0".into(),
                to: HexPosition::new(2, 3),
                ignore_speed: false,
            },
        ])
        .run()
        .unwrap();

        assert_eq!(outcome.applied, 2);
        assert_eq!(outcome.state.events().len(), 2);
        assert_eq!(outcome.state.hand(Team::Home).len(), 1);
    }

    #[test]
    fn test_rejection_stops_or_skips() {
        let actions = vec![
            GameAction::PopStack,
            GameAction::DrawCards {
                team: Team::Home,
                count: 2,
            },
        ];

        let err = replay(actions.clone()).run().unwrap_err();
        assert!(matches!(err, ReplayError::Action { index: 0, .. }));

        let mut lenient = replay(actions);
        lenient.keep_going = true;
        let outcome = lenient.run().unwrap();
        assert_eq!(outcome.applied, 1);
        assert_eq!(outcome.rejected.len(), 1);
        assert_eq!(outcome.rejected[0].0, 0);
    }

    #[test]
    fn test_load_reports_missing_file() {
        let inputs = ReplayInputs {
            catalog: PathBuf::from("/nonexistent/catalog.json"),
            match_config: PathBuf::from("/nonexistent/match.json"),
            actions: PathBuf::from("/nonexistent/actions.json"),
        };
        assert!(matches!(Replay::load(&inputs), Err(ReplayError::Read { .. })));
    }
}
