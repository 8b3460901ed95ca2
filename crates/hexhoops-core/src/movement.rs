//! Player movement: speed, reachable hexes and directional constraints.

use crate::board::Team;
use crate::cards::Catalog;
use crate::game::GameState;
use crate::hex::HexPosition;
use crate::player::{apply_modifier, BasketballPlayer, Stat, DEFAULT_SPEED};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet, VecDeque};

/// A restriction on where a move may end
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum MoveConstraint {
    /// Closer to the hoop the mover's team attacks
    TowardBasket,
    AwayFromBasket,
    /// Closer to the loose ball or the ball carrier
    TowardBall,
    AdjacentToBall,
    TowardPlayer {
        target_player_id: String,
    },
    /// Within one hex of a non-exhausted opponent
    IntoZoc,
    /// More than one hex from every non-exhausted opponent
    OutOfZoc,
    /// Any constraint this engine does not know; never filters
    #[serde(other)]
    Unrecognized,
}

/// Movement queries against one snapshot
pub struct MovementResolver<'a> {
    state: &'a GameState,
    catalog: Option<&'a Catalog>,
}

impl<'a> MovementResolver<'a> {
    pub fn new(state: &'a GameState) -> Self {
        Self {
            state,
            catalog: None,
        }
    }

    /// Use the catalog as a speed fallback for players without printed stats
    #[must_use]
    pub fn with_catalog(mut self, catalog: &'a Catalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Movement budget of a player: own speed, else the catalog's printed
    /// speed, else `DEFAULT_SPEED`; modifiers on speed apply to all three.
    pub fn player_speed(&self, player_id: &str) -> u32 {
        let Some(player) = self.state.basketball_player(player_id) else {
            return DEFAULT_SPEED;
        };

        let base = player
            .stats
            .map(|s| s.speed)
            .or_else(|| {
                self.catalog
                    .and_then(|c| c.get_card(&player.card_slug))
                    .and_then(|d| d.stats())
                    .map(|s| s.speed)
            })
            .unwrap_or(DEFAULT_SPEED);

        apply_modifier(base, player.modifier_total(Stat::Speed))
    }

    /// Every hex the player can end a move on, or `None` when the player is
    /// off court.
    ///
    /// Breadth-first over unoccupied hexes, so routes bend around blockers
    /// instead of needing a straight clear line. The origin is excluded.
    pub fn valid_move_positions(&self, player_id: &str) -> Option<BTreeSet<HexPosition>> {
        let player = self.state.basketball_player(player_id)?;
        let origin = player.position?;
        let speed = self.player_speed(player_id);
        let board = &self.state.board;

        let mut visited: HashSet<HexPosition> = HashSet::from([origin]);
        let mut queue: VecDeque<(HexPosition, u32)> = VecDeque::from([(origin, 0)]);
        let mut reachable = BTreeSet::new();

        while let Some((pos, steps)) = queue.pop_front() {
            if steps == speed {
                continue;
            }
            for next in pos.neighbors() {
                if visited.contains(&next) || board.is_occupied(&next) {
                    continue;
                }
                visited.insert(next);
                reachable.insert(next);
                queue.push_back((next, steps + 1));
            }
        }

        Some(reachable)
    }

    pub fn can_move_to(&self, player_id: &str, to: &HexPosition) -> bool {
        self.valid_move_positions(player_id)
            .is_some_and(|positions| positions.contains(to))
    }

    /// `valid_move_positions` narrowed by a constraint.
    ///
    /// When the constraint is absent, unrecognized, or would leave nothing,
    /// the unfiltered set is returned instead.
    pub fn constrained_move_positions(
        &self,
        player_id: &str,
        constraint: Option<&MoveConstraint>,
    ) -> Option<BTreeSet<HexPosition>> {
        let valid = self.valid_move_positions(player_id)?;
        let Some(constraint) = constraint else {
            return Some(valid);
        };
        let Some(player) = self.state.basketball_player(player_id) else {
            return Some(valid);
        };
        let Some(origin) = player.position else {
            return Some(valid);
        };

        let filtered: BTreeSet<HexPosition> = match self.constraint_filter(player, origin, constraint) {
            Some(keep) => valid.iter().copied().filter(|pos| keep(pos)).collect(),
            None => BTreeSet::new(),
        };

        if filtered.is_empty() {
            Some(valid)
        } else {
            Some(filtered)
        }
    }

    /// Predicate for a constraint, or `None` when it cannot be evaluated
    fn constraint_filter(
        &self,
        player: &BasketballPlayer,
        origin: HexPosition,
        constraint: &MoveConstraint,
    ) -> Option<Box<dyn Fn(&HexPosition) -> bool + 'a>> {
        let team = self.state.basketball_player_team(&player.id)?;

        let filter: Box<dyn Fn(&HexPosition) -> bool + 'a> = match constraint {
            MoveConstraint::TowardBasket => {
                let hoop = team.target_hoop();
                let current = origin.distance_to(&hoop);
                Box::new(move |pos| pos.distance_to(&hoop) < current)
            }
            MoveConstraint::AwayFromBasket => {
                let hoop = team.target_hoop();
                let current = origin.distance_to(&hoop);
                Box::new(move |pos| pos.distance_to(&hoop) > current)
            }
            MoveConstraint::TowardBall => {
                let ball = self.state.ball_position()?;
                let current = origin.distance_to(&ball);
                Box::new(move |pos| pos.distance_to(&ball) < current)
            }
            MoveConstraint::AdjacentToBall => {
                let ball = self.state.ball_position()?;
                Box::new(move |pos| pos.distance_to(&ball) <= 1)
            }
            MoveConstraint::TowardPlayer { target_player_id } => {
                let target = self.state.basketball_player(target_player_id)?.position?;
                let current = origin.distance_to(&target);
                Box::new(move |pos| pos.distance_to(&target) < current)
            }
            MoveConstraint::IntoZoc => {
                let threats = self.zoc_sources(team);
                Box::new(move |pos| threats.iter().any(|t| pos.distance_to(t) <= 1))
            }
            MoveConstraint::OutOfZoc => {
                let threats = self.zoc_sources(team);
                Box::new(move |pos| threats.iter().all(|t| pos.distance_to(t) > 1))
            }
            MoveConstraint::Unrecognized => return None,
        };
        Some(filter)
    }

    /// Positions of the non-exhausted opponents of `team`
    fn zoc_sources(&self, team: Team) -> Vec<HexPosition> {
        self.state
            .on_court(team.opponent())
            .filter(|p| !p.exhausted)
            .filter_map(|p| p.position)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Occupant;
    use crate::cards::{CardDefinition, CardPayload};
    use crate::game::{Ball, MatchConfig, TeamConfig};
    use crate::player::{Modifier, PlayerStats};

    const HOME: &str = "HOME-runner-0";
    const AWAY: &str = "AWAY-stopper-0";

    fn game() -> GameState {
        let config = MatchConfig::new(
            TeamConfig {
                deck: vec![],
                roster: vec!["runner".into(), "helper".into()],
            },
            TeamConfig {
                deck: vec![],
                roster: vec!["stopper".into()],
            },
        );
        GameState::new(&config, &Catalog::new())
    }

    fn place(state: &mut GameState, id: &str, pos: HexPosition) {
        state.basketball_player_mut(id).unwrap().position = Some(pos);
        state.board.set_occupant(pos, Occupant::player(id));
    }

    #[test]
    fn test_speed_fallbacks() {
        let mut state = game();
        assert_eq!(MovementResolver::new(&state).player_speed(HOME), DEFAULT_SPEED);

        let catalog = Catalog::from_definitions(vec![CardDefinition {
            slug: "runner".into(),
            name: "Runner".into(),
            set_slug: "core".into(),
            payload: CardPayload::Player {
                stats: PlayerStats {
                    speed: 4,
                    ..PlayerStats::default()
                },
                abilities: vec![],
            },
        }]);
        assert_eq!(
            MovementResolver::new(&state).with_catalog(&catalog).player_speed(HOME),
            4
        );

        state.basketball_player_mut(HOME).unwrap().stats = Some(PlayerStats {
            speed: 1,
            ..PlayerStats::default()
        });
        assert_eq!(
            MovementResolver::new(&state).with_catalog(&catalog).player_speed(HOME),
            1
        );

        state.basketball_player_mut(HOME).unwrap().modifiers.push(Modifier {
            id: "boost".into(),
            stat: Stat::Speed,
            amount: 2,
            source: None,
            expiry: None,
        });
        assert_eq!(MovementResolver::new(&state).player_speed(HOME), 3);
    }

    #[test]
    fn test_off_court_player_has_no_moves() {
        let state = game();
        assert_eq!(MovementResolver::new(&state).valid_move_positions(HOME), None);
        assert!(!MovementResolver::new(&state).can_move_to(HOME, &HexPosition::new(0, 0)));
    }

    #[test]
    fn test_open_court_moves_match_range() {
        let mut state = game();
        let origin = HexPosition::new(2, 6);
        place(&mut state, HOME, origin);

        let moves = MovementResolver::new(&state).valid_move_positions(HOME).unwrap();
        let expected: BTreeSet<HexPosition> =
            origin.range(2).into_iter().filter(|p| *p != origin).collect();
        assert_eq!(moves, expected);
        assert!(!moves.contains(&origin));
    }

    #[test]
    fn test_occupied_hexes_excluded() {
        let mut state = game();
        place(&mut state, HOME, HexPosition::new(2, 6));
        place(&mut state, AWAY, HexPosition::new(2, 7));

        let resolver = MovementResolver::new(&state);
        let moves = resolver.valid_move_positions(HOME).unwrap();
        assert!(!moves.contains(&HexPosition::new(2, 7)));
        assert!(!resolver.can_move_to(HOME, &HexPosition::new(2, 7)));
    }

    #[test]
    fn test_routes_around_blockers() {
        let mut state = game();
        // Corner hex (0,0) has two neighbors: (0,1) and (1,0)
        place(&mut state, HOME, HexPosition::new(0, 0));
        state.board.set_occupant(HexPosition::new(0, 1), Occupant::marker("cone"));

        let origin = HexPosition::new(0, 0);
        let moves = MovementResolver::new(&state).valid_move_positions(HOME).unwrap();
        assert!(moves.contains(&HexPosition::new(1, 0)));
        assert!(!moves.contains(&HexPosition::new(0, 1)));

        // The straight line to (1,1) crosses the cone; the walk goes via (1,0)
        assert_eq!(
            origin.line_to(&HexPosition::new(1, 1)),
            vec![origin, HexPosition::new(0, 1), HexPosition::new(1, 1)]
        );
        assert!(moves.contains(&HexPosition::new(1, 1)));

        // (0,2) is in range but four steps away once the cone is avoided
        assert_eq!(origin.distance_to(&HexPosition::new(0, 2)), 2);
        assert!(!moves.contains(&HexPosition::new(0, 2)));

        // Wall the player in completely
        state.board.set_occupant(HexPosition::new(1, 0), Occupant::marker("cone-2"));
        let moves = MovementResolver::new(&state).valid_move_positions(HOME).unwrap();
        assert!(moves.is_empty());
    }

    #[test]
    fn test_toward_and_away_from_basket() {
        let mut state = game();
        let origin = HexPosition::new(2, 6);
        place(&mut state, HOME, origin);
        let hoop = Team::Home.target_hoop();
        let resolver = MovementResolver::new(&state);

        let toward = resolver
            .constrained_move_positions(HOME, Some(&MoveConstraint::TowardBasket))
            .unwrap();
        assert!(!toward.is_empty());
        assert!(toward
            .iter()
            .all(|p| p.distance_to(&hoop) < origin.distance_to(&hoop)));

        let away = resolver
            .constrained_move_positions(HOME, Some(&MoveConstraint::AwayFromBasket))
            .unwrap();
        assert!(away
            .iter()
            .all(|p| p.distance_to(&hoop) > origin.distance_to(&hoop)));
    }

    #[test]
    fn test_ball_constraints_follow_carrier() {
        let mut state = game();
        place(&mut state, HOME, HexPosition::new(2, 3));
        place(&mut state, "HOME-helper-1", HexPosition::new(2, 5));
        state.ball = Ball::Possessed {
            holder_id: "HOME-helper-1".into(),
        };
        let resolver = MovementResolver::new(&state);

        let adjacent = resolver
            .constrained_move_positions(HOME, Some(&MoveConstraint::AdjacentToBall))
            .unwrap();
        assert!(!adjacent.is_empty());
        assert!(adjacent
            .iter()
            .all(|p| p.distance_to(&HexPosition::new(2, 5)) <= 1));
    }

    #[test]
    fn test_zoc_constraints() {
        let mut state = game();
        place(&mut state, HOME, HexPosition::new(2, 6));
        place(&mut state, AWAY, HexPosition::new(2, 8));
        let opponent = HexPosition::new(2, 8);

        let resolver = MovementResolver::new(&state);
        let into = resolver
            .constrained_move_positions(HOME, Some(&MoveConstraint::IntoZoc))
            .unwrap();
        assert!(!into.is_empty());
        assert!(into.iter().all(|p| p.distance_to(&opponent) <= 1));

        let out = resolver
            .constrained_move_positions(HOME, Some(&MoveConstraint::OutOfZoc))
            .unwrap();
        assert!(out.iter().all(|p| p.distance_to(&opponent) > 1));

        // An exhausted opponent projects no zone, so "into" has nothing to
        // keep and falls back to every valid move
        state.basketball_player_mut(AWAY).unwrap().exhausted = true;
        let resolver = MovementResolver::new(&state);
        let all = resolver.valid_move_positions(HOME).unwrap();
        let into = resolver
            .constrained_move_positions(HOME, Some(&MoveConstraint::IntoZoc))
            .unwrap();
        assert_eq!(into, all);
    }

    #[test]
    fn test_fallbacks_return_unfiltered() {
        let mut state = game();
        place(&mut state, HOME, HexPosition::new(2, 6));
        let resolver = MovementResolver::new(&state);
        let all = resolver.valid_move_positions(HOME).unwrap();

        assert_eq!(resolver.constrained_move_positions(HOME, None).unwrap(), all);
        assert_eq!(
            resolver
                .constrained_move_positions(HOME, Some(&MoveConstraint::Unrecognized))
                .unwrap(),
            all
        );
        // Target player off court
        assert_eq!(
            resolver
                .constrained_move_positions(
                    HOME,
                    Some(&MoveConstraint::TowardPlayer {
                        target_player_id: AWAY.into()
                    })
                )
                .unwrap(),
            all
        );
    }

    #[test]
    fn test_unknown_constraint_deserializes() {
        let constraint: MoveConstraint =
            serde_json::from_str(r#"{"type":"toward-the-crowd"}"#).unwrap();
        assert_eq!(constraint, MoveConstraint::Unrecognized);

        let constraint: MoveConstraint =
            serde_json::from_str(r#"{"type":"toward-player","target_player_id":"x"}"#).unwrap();
        assert_eq!(
            constraint,
            MoveConstraint::TowardPlayer {
                target_player_id: "x".into()
            }
        );
    }
}
