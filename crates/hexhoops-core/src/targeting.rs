//! Interaction targets for the standard actions.
//!
//! Every categorization looks at one acting player and sorts the candidate
//! players by why they can or cannot be targeted. `get_valid_standard_action_targets`
//! keeps only the valid ones.

use crate::board::Team;
use crate::cards::Requirement;
use crate::game::GameState;
use crate::player::BasketballPlayer;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// How far from the target hoop a shot may be taken
pub const SHOOT_RANGE: u32 = 7;

/// The five standard basketball actions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StandardActionKind {
    Shoot,
    Block,
    Screen,
    Pass,
    Steal,
}

/// Whether the actor can shoot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ShootAvailability {
    NotBallCarrier,
    OutOfRange,
    Available,
}

/// Why a candidate player can or cannot be targeted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TargetCategory {
    NotAdjacent,
    NotBallCarrier,
    PathBlocked,
    ActorExhausted,
    Valid,
}

/// A valid target of a standard action
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "kebab-case")]
pub enum Target {
    /// The actor itself (shooting)
    #[serde(rename = "self")]
    SelfTarget,
    Player(String),
}

/// Candidate player id -> category
pub type Categorized = BTreeMap<String, TargetCategory>;

fn actor<'s>(state: &'s GameState, actor_id: &str) -> Option<(Team, &'s BasketballPlayer)> {
    let team = state.basketball_player_team(actor_id)?;
    let player = state.basketball_player(actor_id)?;
    Some((team, player))
}

pub fn categorize_shoot_availability(state: &GameState, actor_id: &str) -> ShootAvailability {
    if !state.is_ball_carrier(actor_id) {
        return ShootAvailability::NotBallCarrier;
    }
    let in_range = actor(state, actor_id).and_then(|(team, player)| {
        player
            .position
            .map(|pos| pos.distance_to(&team.target_hoop()) <= SHOOT_RANGE)
    });
    match in_range {
        Some(true) => ShootAvailability::Available,
        _ => ShootAvailability::OutOfRange,
    }
}

/// Opponents the actor could block; only the adjacent ball carrier is valid
pub fn categorize_block_targets(state: &GameState, actor_id: &str) -> Categorized {
    categorize_adjacent_opponents(state, actor_id, true)
}

/// Opponents the actor could screen; any adjacent opponent is valid
pub fn categorize_screen_targets(state: &GameState, actor_id: &str) -> Categorized {
    categorize_adjacent_opponents(state, actor_id, false)
}

/// Opponents the actor could steal from; only the adjacent ball carrier is valid
pub fn categorize_steal_targets(state: &GameState, actor_id: &str) -> Categorized {
    categorize_adjacent_opponents(state, actor_id, true)
}

fn categorize_adjacent_opponents(
    state: &GameState,
    actor_id: &str,
    needs_ball: bool,
) -> Categorized {
    let Some((team, player)) = actor(state, actor_id) else {
        return Categorized::new();
    };
    let Some(origin) = player.position else {
        return Categorized::new();
    };

    state
        .on_court(team.opponent())
        .filter_map(|candidate| {
            let pos = candidate.position?;
            let category = if origin.distance_to(&pos) != 1 {
                TargetCategory::NotAdjacent
            } else if needs_ball && !state.is_ball_carrier(&candidate.id) {
                TargetCategory::NotBallCarrier
            } else if player.exhausted {
                TargetCategory::ActorExhausted
            } else {
                TargetCategory::Valid
            };
            Some((candidate.id.clone(), category))
        })
        .collect()
}

/// Teammates the ball carrier could pass to, needing a clear line
pub fn categorize_pass_targets(state: &GameState, actor_id: &str) -> Categorized {
    let Some((team, player)) = actor(state, actor_id) else {
        return Categorized::new();
    };
    let Some(origin) = player.position else {
        return Categorized::new();
    };
    let carrier = state.is_ball_carrier(actor_id);

    state
        .on_court(team)
        .filter(|candidate| candidate.id != actor_id)
        .filter_map(|candidate| {
            let pos = candidate.position?;
            let category = if !carrier {
                TargetCategory::NotBallCarrier
            } else if !state.board.path_clear(&origin, &pos) {
                TargetCategory::PathBlocked
            } else if player.exhausted {
                TargetCategory::ActorExhausted
            } else {
                TargetCategory::Valid
            };
            Some((candidate.id.clone(), category))
        })
        .collect()
}

/// Every valid target of `kind` for the actor
pub fn get_valid_standard_action_targets(
    state: &GameState,
    actor_id: &str,
    kind: StandardActionKind,
) -> BTreeSet<Target> {
    let categorized = match kind {
        StandardActionKind::Shoot => {
            let mut targets = BTreeSet::new();
            if categorize_shoot_availability(state, actor_id) == ShootAvailability::Available {
                targets.insert(Target::SelfTarget);
            }
            return targets;
        }
        StandardActionKind::Block => categorize_block_targets(state, actor_id),
        StandardActionKind::Screen => categorize_screen_targets(state, actor_id),
        StandardActionKind::Pass => categorize_pass_targets(state, actor_id),
        StandardActionKind::Steal => categorize_steal_targets(state, actor_id),
    };

    categorized
        .into_iter()
        .filter(|(_, category)| *category == TargetCategory::Valid)
        .map(|(id, _)| Target::Player(id))
        .collect()
}

/// Whether the actor satisfies every requirement of an action mode
pub fn requirements_met(state: &GameState, actor_id: &str, requirements: &[Requirement]) -> bool {
    let Some((team, player)) = actor(state, actor_id) else {
        return false;
    };

    requirements.iter().all(|requirement| match requirement {
        Requirement::BallCarrier => state.is_ball_carrier(actor_id),
        Requirement::NotBallCarrier => !state.is_ball_carrier(actor_id),
        Requirement::NotExhausted => !player.exhausted,
        Requirement::AdjacentToOpponent => player.position.is_some_and(|origin| {
            state
                .on_court(team.opponent())
                .filter_map(|p| p.position)
                .any(|pos| origin.distance_to(&pos) == 1)
        }),
        Requirement::WithinRangeOfBasket { hexes } => player
            .position
            .is_some_and(|pos| pos.distance_to(&team.target_hoop()) <= *hexes),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Occupant;
    use crate::cards::Catalog;
    use crate::game::{Ball, MatchConfig, TeamConfig};
    use crate::hex::HexPosition;
    use pretty_assertions::assert_eq;

    const SHOOTER: &str = "HOME-shooter-0";
    const WING: &str = "HOME-wing-1";
    const GUARD: &str = "AWAY-guard-0";
    const FORWARD: &str = "AWAY-forward-1";

    fn game() -> GameState {
        let config = MatchConfig::new(
            TeamConfig {
                deck: vec![],
                roster: vec!["shooter".into(), "wing".into()],
            },
            TeamConfig {
                deck: vec![],
                roster: vec!["guard".into(), "forward".into()],
            },
        );
        GameState::new(&config, &Catalog::new())
    }

    fn place(state: &mut GameState, id: &str, pos: HexPosition) {
        state.basketball_player_mut(id).unwrap().position = Some(pos);
        state.board.set_occupant(pos, Occupant::player(id));
    }

    fn give_ball(state: &mut GameState, id: &str) {
        state.ball = Ball::Possessed {
            holder_id: id.to_string(),
        };
    }

    #[test]
    fn test_shoot_availability() {
        let mut state = game();
        place(&mut state, SHOOTER, HexPosition::new(2, 4));
        assert_eq!(
            categorize_shoot_availability(&state, SHOOTER),
            ShootAvailability::NotBallCarrier
        );

        give_ball(&mut state, SHOOTER);
        // Home attacks (2,13): nine columns away
        assert_eq!(
            categorize_shoot_availability(&state, SHOOTER),
            ShootAvailability::OutOfRange
        );

        place(&mut state, SHOOTER, HexPosition::new(2, 6));
        state.board.remove_occupant(&HexPosition::new(2, 4));
        assert_eq!(
            categorize_shoot_availability(&state, SHOOTER),
            ShootAvailability::Available
        );
        assert_eq!(
            get_valid_standard_action_targets(&state, SHOOTER, StandardActionKind::Shoot),
            BTreeSet::from([Target::SelfTarget])
        );
    }

    #[test]
    fn test_block_targets() {
        let mut state = game();
        place(&mut state, SHOOTER, HexPosition::new(2, 6));
        place(&mut state, GUARD, HexPosition::new(2, 7));
        place(&mut state, FORWARD, HexPosition::new(2, 10));
        give_ball(&mut state, SHOOTER);

        // The away guard tries to block the home shooter
        let categories = categorize_block_targets(&state, GUARD);
        assert_eq!(
            categories,
            Categorized::from([
                (SHOOTER.to_string(), TargetCategory::Valid),
            ])
        );

        // The wing is off court, so it is not a candidate; move it adjacent
        place(&mut state, WING, HexPosition::new(1, 7));
        let categories = categorize_block_targets(&state, GUARD);
        assert_eq!(categories[WING], TargetCategory::NotBallCarrier);

        let categories = categorize_block_targets(&state, FORWARD);
        assert_eq!(categories[SHOOTER], TargetCategory::NotAdjacent);

        state.basketball_player_mut(GUARD).unwrap().exhausted = true;
        let categories = categorize_block_targets(&state, GUARD);
        assert_eq!(categories[SHOOTER], TargetCategory::ActorExhausted);
        assert!(get_valid_standard_action_targets(&state, GUARD, StandardActionKind::Block)
            .is_empty());
    }

    #[test]
    fn test_screen_ignores_possession() {
        let mut state = game();
        place(&mut state, SHOOTER, HexPosition::new(2, 6));
        place(&mut state, GUARD, HexPosition::new(2, 7));

        assert_eq!(
            get_valid_standard_action_targets(&state, SHOOTER, StandardActionKind::Screen),
            BTreeSet::from([Target::Player(GUARD.to_string())])
        );
        assert!(get_valid_standard_action_targets(&state, SHOOTER, StandardActionKind::Block)
            .is_empty());
    }

    #[test]
    fn test_pass_targets() {
        let mut state = game();
        place(&mut state, SHOOTER, HexPosition::new(2, 3));
        place(&mut state, WING, HexPosition::new(2, 7));

        let categories = categorize_pass_targets(&state, SHOOTER);
        assert_eq!(categories[WING], TargetCategory::NotBallCarrier);

        give_ball(&mut state, SHOOTER);
        assert_eq!(
            get_valid_standard_action_targets(&state, SHOOTER, StandardActionKind::Pass),
            BTreeSet::from([Target::Player(WING.to_string())])
        );

        // A defender in the lane blocks the pass
        place(&mut state, GUARD, HexPosition::new(2, 5));
        let categories = categorize_pass_targets(&state, SHOOTER);
        assert_eq!(categories[WING], TargetCategory::PathBlocked);
    }

    #[test]
    fn test_steal_targets() {
        let mut state = game();
        place(&mut state, SHOOTER, HexPosition::new(2, 6));
        place(&mut state, GUARD, HexPosition::new(2, 7));

        assert_eq!(
            categorize_steal_targets(&state, GUARD)[SHOOTER],
            TargetCategory::NotBallCarrier
        );
        give_ball(&mut state, SHOOTER);
        assert_eq!(
            get_valid_standard_action_targets(&state, GUARD, StandardActionKind::Steal),
            BTreeSet::from([Target::Player(SHOOTER.to_string())])
        );
    }

    #[test]
    fn test_unknown_or_benched_actor() {
        let state = game();
        assert!(categorize_block_targets(&state, "nobody").is_empty());
        assert!(categorize_pass_targets(&state, SHOOTER).is_empty());
        assert_eq!(
            categorize_shoot_availability(&state, SHOOTER),
            ShootAvailability::NotBallCarrier
        );
    }

    #[test]
    fn test_requirements() {
        let mut state = game();
        place(&mut state, SHOOTER, HexPosition::new(2, 9));
        place(&mut state, GUARD, HexPosition::new(2, 10));

        assert!(requirements_met(&state, SHOOTER, &[]));
        assert!(requirements_met(
            &state,
            SHOOTER,
            &[Requirement::NotBallCarrier, Requirement::NotExhausted]
        ));
        assert!(!requirements_met(&state, SHOOTER, &[Requirement::BallCarrier]));
        assert!(requirements_met(&state, SHOOTER, &[Requirement::AdjacentToOpponent]));
        assert!(requirements_met(
            &state,
            SHOOTER,
            &[Requirement::WithinRangeOfBasket { hexes: 4 }]
        ));
        assert!(!requirements_met(
            &state,
            SHOOTER,
            &[Requirement::WithinRangeOfBasket { hexes: 3 }]
        ));
        assert!(!requirements_met(&state, "nobody", &[]));
    }

    #[test]
    fn test_target_serialization() {
        assert_eq!(
            serde_json::to_value(Target::SelfTarget).unwrap(),
            serde_json::json!({"type": "self"})
        );
        assert_eq!(
            serde_json::to_value(Target::Player("p".into())).unwrap(),
            serde_json::json!({"type": "player", "id": "p"})
        );
    }
}
