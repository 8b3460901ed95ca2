//! Canonical match state.
//!
//! This module contains the `GameState` snapshot, its construction from a
//! `MatchConfig`, and the read accessors other components use. A snapshot is
//! never changed after it is handed out; `ActionEngine::apply` produces the
//! next one.

use crate::actions::LoggedEvent;
use crate::board::{Board, InvariantReport, Team, CENTER_COURT};
use crate::cards::{CardInstance, Catalog, PendingEffect};
use crate::hex::HexPosition;
use crate::player::{Attachment, BasketballPlayer, Deck};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Players per team who start on court unless configured otherwise
pub const DEFAULT_STARTERS: usize = 5;

/// Phase of the current turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Phase {
    /// Rosters placed, nothing played yet
    Setup,
    Upkeep,
    Actions,
    Cleanup,
    GameOver,
}

/// Why the ball is in the air
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InAirKind {
    Shot,
    Pass,
}

/// Where the ball is
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "kebab-case")]
pub enum Ball {
    Possessed {
        holder_id: String,
    },
    Loose {
        position: HexPosition,
    },
    InAir {
        origin: HexPosition,
        target: HexPosition,
        action_kind: InAirKind,
    },
}

impl Ball {
    pub fn holder(&self) -> Option<&str> {
        match self {
            Ball::Possessed { holder_id } => Some(holder_id),
            _ => None,
        }
    }
}

/// Errors that can occur when applying actions
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum GameError {
    #[error("Invalid action: {0}")]
    InvalidAction(String),

    #[error("Card {instance_id} is not in {team}'s hand")]
    CardNotInHand { team: Team, instance_id: String },

    #[error("Placements must cover the examined cards exactly (missing: {missing:?}, unexpected: {unexpected:?})")]
    IncompletePlacement {
        missing: Vec<String>,
        unexpected: Vec<String>,
    },

    #[error("Board invariant violated: {0}")]
    InvariantViolation(InvariantReport),
}

impl GameError {
    /// True when the error means the input state was corrupt rather than
    /// the action being refused
    pub fn is_fatal(&self) -> bool {
        matches!(self, GameError::InvariantViolation(_))
    }

    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        GameError::InvalidAction(reason.into())
    }
}

/// Deck list and roster for one team
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TeamConfig {
    /// Card slugs, top of the draw pile first
    pub deck: Vec<String>,
    /// Player card slugs; the first `starters` entries start on court
    pub roster: Vec<String>,
}

/// Everything needed to start a match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchConfig {
    pub home: TeamConfig,
    pub away: TeamConfig,
    #[serde(default = "default_starters")]
    pub starters: usize,
}

fn default_starters() -> usize {
    DEFAULT_STARTERS
}

impl MatchConfig {
    pub fn new(home: TeamConfig, away: TeamConfig) -> Self {
        Self {
            home,
            away,
            starters: DEFAULT_STARTERS,
        }
    }

    pub fn team(&self, team: Team) -> &TeamConfig {
        match team {
            Team::Home => &self.home,
            Team::Away => &self.away,
        }
    }
}

/// Score of both teams
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Score {
    pub home: u32,
    pub away: u32,
}

impl Score {
    pub fn get(&self, team: Team) -> u32 {
        match team {
            Team::Home => self.home,
            Team::Away => self.away,
        }
    }

    pub(crate) fn add(&mut self, team: Team, points: u32) -> u32 {
        let slot = match team {
            Team::Home => &mut self.home,
            Team::Away => &mut self.away,
        };
        *slot = slot.saturating_add(points);
        *slot
    }
}

/// Everything one team owns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamState {
    /// Roster in configured order (substitutions swap entries)
    pub players: Vec<BasketballPlayer>,
    pub deck: Deck,
    pub assets: Vec<CardInstance>,
    pub actions_remaining: u32,
}

/// A card staged in the shared play area
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayAreaEntry {
    pub card: CardInstance,
    pub played_by: Team,
}

/// The complete state of one match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    pub board: Board,
    pub home: TeamState,
    pub away: TeamState,
    pub ball: Ball,
    pub score: Score,
    /// Turn number (starts at 1)
    pub turn_number: u32,
    pub active_team: Team,
    pub phase: Phase,
    /// Append-only
    pub events: Vec<LoggedEvent>,
    /// Last entry is the top of the stack
    pub effect_stack: Vec<PendingEffect>,
    pub play_area: Vec<PlayAreaEntry>,
    /// How many of each roster start on court
    pub starters: usize,
    /// Counter behind token and virtual card instance ids
    next_instance: u32,
}

impl GameState {
    /// Build the opening state of a match.
    ///
    /// Player names and stats come from the catalog when the roster slug is
    /// present there; otherwise the slug doubles as the name and the player
    /// has no printed stats.
    pub fn new(config: &MatchConfig, catalog: &Catalog) -> Self {
        let build_team = |team: Team| {
            let team_config = config.team(team);
            let players = team_config
                .roster
                .iter()
                .enumerate()
                .map(|(index, slug)| {
                    let definition = catalog.get_card(slug);
                    let name = definition
                        .map(|d| d.name.clone())
                        .unwrap_or_else(|| slug.clone());
                    let stats = definition.and_then(|d| d.stats()).copied();
                    BasketballPlayer::new(team, slug, index, name, stats)
                })
                .collect();
            let draw_pile = team_config
                .deck
                .iter()
                .enumerate()
                .map(|(index, slug)| {
                    CardInstance::from_catalog(format!("{}-deck-{}-{}", team, index, slug), slug)
                })
                .collect();

            TeamState {
                players,
                deck: Deck::new(draw_pile),
                assets: Vec::new(),
                actions_remaining: 0,
            }
        };

        Self {
            board: Board::new(),
            home: build_team(Team::Home),
            away: build_team(Team::Away),
            ball: Ball::Loose {
                position: CENTER_COURT,
            },
            score: Score::default(),
            turn_number: 1,
            active_team: Team::Home,
            phase: Phase::Setup,
            events: Vec::new(),
            effect_stack: Vec::new(),
            play_area: Vec::new(),
            starters: config.starters,
            next_instance: 0,
        }
    }

    // ==================== Read Accessors ====================

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// The team whose turn it is
    pub fn active_team(&self) -> Team {
        self.active_team
    }

    pub fn score(&self, team: Team) -> u32 {
        self.score.get(team)
    }

    pub fn ball(&self) -> &Ball {
        &self.ball
    }

    pub fn team(&self, team: Team) -> &TeamState {
        match team {
            Team::Home => &self.home,
            Team::Away => &self.away,
        }
    }

    pub(crate) fn team_mut(&mut self, team: Team) -> &mut TeamState {
        match team {
            Team::Home => &mut self.home,
            Team::Away => &mut self.away,
        }
    }

    pub fn hand(&self, team: Team) -> &[CardInstance] {
        &self.team(team).deck.hand
    }

    pub fn discard(&self, team: Team) -> &[CardInstance] {
        &self.team(team).deck.discard
    }

    pub fn removed(&self, team: Team) -> &[CardInstance] {
        &self.team(team).deck.removed
    }

    pub fn draw_pile(&self, team: Team) -> &[CardInstance] {
        &self.team(team).deck.draw_pile
    }

    pub fn examined(&self, team: Team) -> &[CardInstance] {
        &self.team(team).deck.examined
    }

    pub fn assets(&self, team: Team) -> &[CardInstance] {
        &self.team(team).assets
    }

    pub fn actions_remaining(&self, team: Team) -> u32 {
        self.team(team).actions_remaining
    }

    /// First `starters` roster entries
    pub fn starters(&self, team: Team) -> &[BasketballPlayer] {
        let players = &self.team(team).players;
        &players[..self.starters.min(players.len())]
    }

    /// Players of a team that have a board position
    pub fn on_court(&self, team: Team) -> impl Iterator<Item = &BasketballPlayer> {
        self.team(team).players.iter().filter(|p| p.is_on_court())
    }

    pub fn basketball_player(&self, id: &str) -> Option<&BasketballPlayer> {
        Team::ALL
            .iter()
            .flat_map(|team| self.team(*team).players.iter())
            .find(|p| p.id == id)
    }

    pub fn basketball_player_team(&self, id: &str) -> Option<Team> {
        Team::ALL
            .into_iter()
            .find(|team| self.team(*team).players.iter().any(|p| p.id == id))
    }

    pub(crate) fn basketball_player_mut(&mut self, id: &str) -> Option<&mut BasketballPlayer> {
        let team = self.basketball_player_team(id)?;
        self.team_mut(team).players.iter_mut().find(|p| p.id == id)
    }

    pub fn attachments(&self, player_id: &str) -> Option<&[Attachment]> {
        self.basketball_player(player_id)
            .map(|p| p.attachments.as_slice())
    }

    /// Board position of the ball: the loose position, or the holder's hex.
    /// `None` while in the air or when the holder is off court.
    pub fn ball_position(&self) -> Option<HexPosition> {
        match &self.ball {
            Ball::Loose { position } => Some(*position),
            Ball::Possessed { holder_id } => self.basketball_player(holder_id)?.position,
            Ball::InAir { .. } => None,
        }
    }

    pub fn is_ball_carrier(&self, player_id: &str) -> bool {
        self.ball.holder() == Some(player_id)
    }

    pub fn events(&self) -> &[LoggedEvent] {
        &self.events
    }

    pub fn effect_stack(&self) -> &[PendingEffect] {
        &self.effect_stack
    }

    pub fn play_area(&self) -> &[PlayAreaEntry] {
        &self.play_area
    }

    /// Allocate an instance id for a synthesized card
    pub(crate) fn next_instance_id(&mut self, prefix: &str) -> String {
        let id = format!("{}-{}", prefix, self.next_instance);
        self.next_instance += 1;
        id
    }

    /// Export the full state as JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::{CardDefinition, CardPayload};
    use crate::player::PlayerStats;

    fn config() -> MatchConfig {
        MatchConfig::new(
            TeamConfig {
                deck: vec!["card-1".into(), "card-2".into()],
                roster: vec!["orc-center".into(), "goblin-guard".into()],
            },
            TeamConfig {
                deck: vec!["card-1".into()],
                roster: vec!["elf-forward".into()],
            },
        )
    }

    fn catalog() -> Catalog {
        Catalog::from_definitions(vec![CardDefinition {
            slug: "orc-center".into(),
            name: "Orc Center".into(),
            set_slug: "core".into(),
            payload: CardPayload::Player {
                stats: PlayerStats {
                    size: 4,
                    speed: 1,
                    shooting: 1,
                    passing: 1,
                    defense: 3,
                },
                abilities: vec![],
            },
        }])
    }

    #[test]
    fn test_new_game_defaults() {
        let game = GameState::new(&config(), &catalog());

        assert_eq!(game.phase(), Phase::Setup);
        assert_eq!(game.turn_number, 1);
        assert_eq!(game.active_team(), Team::Home);
        assert_eq!(game.score(Team::Home), 0);
        assert_eq!(game.score(Team::Away), 0);
        assert_eq!(
            game.ball(),
            &Ball::Loose {
                position: HexPosition::new(2, 7)
            }
        );
        assert!(game.events().is_empty());
        assert!(game.effect_stack().is_empty());
        assert_eq!(game.draw_pile(Team::Home).len(), 2);
        assert_eq!(game.draw_pile(Team::Away).len(), 1);
        assert!(game.hand(Team::Home).is_empty());
    }

    #[test]
    fn test_players_from_roster() {
        let game = GameState::new(&config(), &catalog());

        let center = game.basketball_player("HOME-orc-center-0").unwrap();
        assert_eq!(center.name, "Orc Center");
        assert_eq!(center.stats.map(|s| s.size), Some(4));
        assert_eq!(center.position, None);
        assert!(!center.exhausted);

        let guard = game.basketball_player("HOME-goblin-guard-1").unwrap();
        assert_eq!(guard.name, "goblin-guard");
        assert_eq!(guard.stats, None);

        assert_eq!(game.basketball_player_team("AWAY-elf-forward-0"), Some(Team::Away));
        assert_eq!(game.basketball_player_team("nobody"), None);
        assert_eq!(game.attachments("HOME-orc-center-0").map(<[_]>::len), Some(0));
    }

    #[test]
    fn test_instance_ids_unique_across_teams() {
        let game = GameState::new(&config(), &catalog());
        let home = &game.draw_pile(Team::Home)[0].instance_id;
        let away = &game.draw_pile(Team::Away)[0].instance_id;
        assert_ne!(home, away);
        assert_eq!(home, "HOME-deck-0-card-1");
    }

    #[test]
    fn test_starters() {
        let mut cfg = config();
        cfg.starters = 1;
        let game = GameState::new(&cfg, &catalog());
        let starters: Vec<&str> = game.starters(Team::Home).iter().map(|p| p.id.as_str()).collect();
        assert_eq!(starters, vec!["HOME-orc-center-0"]);

        cfg.starters = 10;
        let game = GameState::new(&cfg, &catalog());
        assert_eq!(game.starters(Team::Home).len(), 2);
    }

    #[test]
    fn test_state_serializes_to_json() {
        let game = GameState::new(&config(), &catalog());
        let json = game.to_json().unwrap();
        let restored: GameState = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, game);
    }

    #[test]
    fn test_error_fatality() {
        assert!(!GameError::invalid("nope").is_fatal());
        assert!(GameError::InvariantViolation(InvariantReport {
            duplicates: Default::default()
        })
        .is_fatal());
    }
}
