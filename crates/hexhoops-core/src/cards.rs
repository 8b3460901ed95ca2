//! Cards: catalog definitions, effects and in-match card instances.
//!
//! This module contains:
//! - `CardDefinition`, whose payload is a tagged union over card type
//! - `Effect`, the structured effect language shared by abilities, plays,
//!   standard actions, coaching calls and asset powers
//! - `Catalog`, the read-only slug -> definition lookup table
//! - `CardInstance`, a copy of a card inside one match (catalog-backed,
//!   token or virtual)
//! - `PartialCardDefinition`, which fills in catalog defaults for inline
//!   (token) definitions

use crate::actions::EventKind;
use crate::board::Team;
use crate::movement::MoveConstraint;
use crate::player::{ModifierExpiry, PlayerStats, Stat, DEFAULT_SPEED};
use crate::targeting::StandardActionKind;
use crate::triggers::TriggerCondition;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Set slug given to definitions that don't name one
pub const DEFAULT_SET_SLUG: &str = "core";

/// Slug given to inline definitions that name neither slug nor name
pub const DEFAULT_TOKEN_SLUG: &str = "token";

/// Card type, derived from the payload variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CardType {
    Player,
    Ability,
    Play,
    StandardAction,
    SplitPlay,
    Coaching,
    TeamAsset,
}

/// Something a card does when it resolves
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Effect {
    #[default]
    Nothing,
    DrawCards {
        count: u32,
    },
    GainActions {
        amount: u32,
    },
    ModifyStat {
        stat: Stat,
        amount: i32,
        #[serde(default)]
        expiry: Option<ModifierExpiry>,
    },
    Exhaust,
    Refresh,
    Move {
        #[serde(default)]
        constraint: Option<MoveConstraint>,
    },
    StandardAction {
        action: StandardActionKind,
    },
    Score {
        points: u32,
    },
    Sequence {
        effects: Vec<Effect>,
    },
    /// Game-specific effect identified by name; interpreted by the caller
    Custom {
        id: String,
    },
}

/// A condition the acting player must satisfy to use an action mode
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Requirement {
    BallCarrier,
    NotBallCarrier,
    NotExhausted,
    AdjacentToOpponent,
    WithinRangeOfBasket { hexes: u32 },
}

/// What an action mode targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TargetSpec {
    #[default]
    None,
    #[serde(rename = "self")]
    SelfOnly,
    Teammate,
    Opponent,
    AnyPlayer,
    Hex,
}

/// A reactive ability: when an event of `event` kind satisfying `condition`
/// happens, `effect` goes onto the stack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ability {
    pub name: String,
    pub event: EventKind,
    #[serde(default)]
    pub condition: TriggerCondition,
    pub effect: Effect,
}

/// Play card definition
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PlayDefinition {
    #[serde(default)]
    pub requirements: Vec<Requirement>,
    #[serde(default)]
    pub target: TargetSpec,
    #[serde(default)]
    pub effect: Effect,
}

/// One half (offense or defense) of a standard action or split play
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionMode {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub requirements: Vec<Requirement>,
    #[serde(default)]
    pub target: TargetSpec,
    #[serde(default)]
    pub effect: Effect,
}

impl ActionMode {
    fn placeholder(slug: &str, side: &str) -> Self {
        Self {
            id: format!("{}-{}", slug, side),
            name: side.to_string(),
            requirements: Vec::new(),
            target: TargetSpec::None,
            effect: Effect::Nothing,
        }
    }
}

/// A coaching card's call or signal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoachingAction {
    pub name: String,
    #[serde(default)]
    pub effect: Effect,
}

/// A team asset's power, optionally with a reactive response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetPower {
    pub name: String,
    #[serde(default)]
    pub effect: Effect,
    #[serde(default)]
    pub response: Option<Ability>,
}

/// Type-specific part of a card definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "card_type", rename_all = "kebab-case")]
pub enum CardPayload {
    Player {
        stats: PlayerStats,
        #[serde(default)]
        abilities: Vec<Ability>,
    },
    Ability {
        #[serde(default)]
        abilities: Vec<Ability>,
    },
    Play {
        play: PlayDefinition,
    },
    StandardAction {
        offense: ActionMode,
        defense: ActionMode,
    },
    SplitPlay {
        offense: ActionMode,
        defense: ActionMode,
    },
    Coaching {
        #[serde(default)]
        call: Option<CoachingAction>,
        #[serde(default)]
        signal: Option<CoachingAction>,
    },
    TeamAsset {
        power: AssetPower,
    },
}

/// A catalog entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardDefinition {
    pub slug: String,
    pub name: String,
    pub set_slug: String,
    #[serde(flatten)]
    pub payload: CardPayload,
}

impl CardDefinition {
    pub fn card_type(&self) -> CardType {
        match self.payload {
            CardPayload::Player { .. } => CardType::Player,
            CardPayload::Ability { .. } => CardType::Ability,
            CardPayload::Play { .. } => CardType::Play,
            CardPayload::StandardAction { .. } => CardType::StandardAction,
            CardPayload::SplitPlay { .. } => CardType::SplitPlay,
            CardPayload::Coaching { .. } => CardType::Coaching,
            CardPayload::TeamAsset { .. } => CardType::TeamAsset,
        }
    }

    /// Abilities of player and ability cards
    pub fn abilities(&self) -> Option<&[Ability]> {
        match &self.payload {
            CardPayload::Player { abilities, .. } | CardPayload::Ability { abilities } => {
                Some(abilities)
            }
            _ => None,
        }
    }

    pub fn stats(&self) -> Option<&PlayerStats> {
        match &self.payload {
            CardPayload::Player { stats, .. } => Some(stats),
            _ => None,
        }
    }

    pub fn play(&self) -> Option<&PlayDefinition> {
        match &self.payload {
            CardPayload::Play { play } => Some(play),
            _ => None,
        }
    }

    pub fn offense(&self) -> Option<&ActionMode> {
        match &self.payload {
            CardPayload::StandardAction { offense, .. } | CardPayload::SplitPlay { offense, .. } => {
                Some(offense)
            }
            _ => None,
        }
    }

    pub fn defense(&self) -> Option<&ActionMode> {
        match &self.payload {
            CardPayload::StandardAction { defense, .. } | CardPayload::SplitPlay { defense, .. } => {
                Some(defense)
            }
            _ => None,
        }
    }

    pub fn call(&self) -> Option<&CoachingAction> {
        match &self.payload {
            CardPayload::Coaching { call, .. } => call.as_ref(),
            _ => None,
        }
    }

    pub fn signal(&self) -> Option<&CoachingAction> {
        match &self.payload {
            CardPayload::Coaching { signal, .. } => signal.as_ref(),
            _ => None,
        }
    }

    pub fn asset_power(&self) -> Option<&AssetPower> {
        match &self.payload {
            CardPayload::TeamAsset { power } => Some(power),
            _ => None,
        }
    }
}

/// A card definition with every field optional except its type.
///
/// `into_definition` fills the gaps with the same defaults the catalog uses,
/// so inline token cards look exactly like catalog cards afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialCardDefinition {
    pub card_type: CardType,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub set_slug: Option<String>,
    #[serde(default)]
    pub stats: Option<PlayerStats>,
    #[serde(default)]
    pub abilities: Vec<Ability>,
    #[serde(default)]
    pub play: Option<PlayDefinition>,
    #[serde(default)]
    pub offense: Option<ActionMode>,
    #[serde(default)]
    pub defense: Option<ActionMode>,
    #[serde(default)]
    pub call: Option<CoachingAction>,
    #[serde(default)]
    pub signal: Option<CoachingAction>,
    #[serde(default)]
    pub power: Option<AssetPower>,
}

impl PartialCardDefinition {
    /// Start a partial definition of the given type
    pub fn new(card_type: CardType) -> Self {
        Self {
            card_type,
            slug: None,
            name: None,
            set_slug: None,
            stats: None,
            abilities: Vec::new(),
            play: None,
            offense: None,
            defense: None,
            call: None,
            signal: None,
            power: None,
        }
    }

    #[must_use]
    pub fn with_slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = Some(slug.into());
        self
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_ability(mut self, ability: Ability) -> Self {
        self.abilities.push(ability);
        self
    }

    #[must_use]
    pub fn with_power(mut self, power: AssetPower) -> Self {
        self.power = Some(power);
        self
    }

    /// Fill in defaults and produce a complete definition
    pub fn into_definition(self) -> CardDefinition {
        let slug = self
            .slug
            .or_else(|| self.name.as_deref().map(slugify))
            .unwrap_or_else(|| DEFAULT_TOKEN_SLUG.to_string());
        let name = self.name.unwrap_or_else(|| slug.clone());
        let set_slug = self
            .set_slug
            .unwrap_or_else(|| DEFAULT_SET_SLUG.to_string());

        let payload = match self.card_type {
            CardType::Player => CardPayload::Player {
                stats: self.stats.unwrap_or(PlayerStats {
                    speed: DEFAULT_SPEED,
                    ..PlayerStats::default()
                }),
                abilities: self.abilities,
            },
            CardType::Ability => CardPayload::Ability {
                abilities: self.abilities,
            },
            CardType::Play => CardPayload::Play {
                play: self.play.unwrap_or_default(),
            },
            CardType::StandardAction => CardPayload::StandardAction {
                offense: self
                    .offense
                    .unwrap_or_else(|| ActionMode::placeholder(&slug, "offense")),
                defense: self
                    .defense
                    .unwrap_or_else(|| ActionMode::placeholder(&slug, "defense")),
            },
            CardType::SplitPlay => CardPayload::SplitPlay {
                offense: self
                    .offense
                    .unwrap_or_else(|| ActionMode::placeholder(&slug, "offense")),
                defense: self
                    .defense
                    .unwrap_or_else(|| ActionMode::placeholder(&slug, "defense")),
            },
            CardType::Coaching => CardPayload::Coaching {
                call: self.call,
                signal: self.signal,
            },
            CardType::TeamAsset => CardPayload::TeamAsset {
                power: self.power.unwrap_or_else(|| AssetPower {
                    name: name.clone(),
                    effect: Effect::Nothing,
                    response: None,
                }),
            },
        };

        CardDefinition {
            slug,
            name,
            set_slug,
            payload,
        }
    }
}

/// Lowercase, hyphen-separated form of a display name
fn slugify(name: &str) -> String {
    name.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(str::to_ascii_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

/// Read-only slug -> definition lookup table.
///
/// Shared by every match; never mutated by the engine.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    cards: HashMap<String, CardDefinition>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from complete definitions; later duplicates win
    pub fn from_definitions(definitions: impl IntoIterator<Item = CardDefinition>) -> Self {
        let mut catalog = Self::new();
        for definition in definitions {
            catalog.insert(definition);
        }
        catalog
    }

    pub fn insert(&mut self, definition: CardDefinition) {
        self.cards.insert(definition.slug.clone(), definition);
    }

    /// Insert a partial definition after filling in defaults; returns its slug
    pub fn insert_partial(&mut self, partial: PartialCardDefinition) -> String {
        let definition = partial.into_definition();
        let slug = definition.slug.clone();
        self.insert(definition);
        slug
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn get_card(&self, slug: &str) -> Option<&CardDefinition> {
        self.cards.get(slug)
    }

    pub fn get_abilities(&self, slug: &str) -> Option<&[Ability]> {
        self.get_card(slug)?.abilities()
    }

    pub fn get_play(&self, slug: &str) -> Option<&PlayDefinition> {
        self.get_card(slug)?.play()
    }

    pub fn get_offense(&self, slug: &str) -> Option<&ActionMode> {
        self.get_card(slug)?.offense()
    }

    pub fn get_defense(&self, slug: &str) -> Option<&ActionMode> {
        self.get_card(slug)?.defense()
    }

    pub fn get_call(&self, slug: &str) -> Option<&CoachingAction> {
        self.get_card(slug)?.call()
    }

    pub fn get_signal(&self, slug: &str) -> Option<&CoachingAction> {
        self.get_card(slug)?.signal()
    }

    pub fn get_asset_power(&self, slug: &str) -> Option<&AssetPower> {
        self.get_card(slug)?.asset_power()
    }

    /// Definition behind a card instance: inline for tokens, catalog lookup
    /// otherwise. Virtual cards have none.
    pub fn resolve<'a>(&'a self, card: &'a CardInstance) -> Option<&'a CardDefinition> {
        match &card.source {
            CardSource::Catalog { slug } => self.get_card(slug),
            CardSource::Token { definition } => Some(definition),
            CardSource::Virtual { .. } => None,
        }
    }

    pub fn card_type_of(&self, card: &CardInstance) -> Option<CardType> {
        self.resolve(card).map(CardDefinition::card_type)
    }
}

/// Where an instance's definition comes from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "kebab-case")]
pub enum CardSource {
    Catalog { slug: String },
    /// Inline definition carried by the instance itself
    Token { definition: Box<CardDefinition> },
    /// Stand-in for a standard action paid for by discarding cards
    Virtual { discarded: Vec<String> },
}

/// One copy of a card inside a match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardInstance {
    pub instance_id: String,
    #[serde(flatten)]
    pub source: CardSource,
}

impl CardInstance {
    pub fn from_catalog(instance_id: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            instance_id: instance_id.into(),
            source: CardSource::Catalog { slug: slug.into() },
        }
    }

    pub fn token(instance_id: impl Into<String>, definition: CardDefinition) -> Self {
        Self {
            instance_id: instance_id.into(),
            source: CardSource::Token {
                definition: Box::new(definition),
            },
        }
    }

    pub fn virtual_card(instance_id: impl Into<String>, discarded: Vec<String>) -> Self {
        Self {
            instance_id: instance_id.into(),
            source: CardSource::Virtual { discarded },
        }
    }

    /// Catalog slug, or the inline definition's slug for tokens
    pub fn slug(&self) -> Option<&str> {
        match &self.source {
            CardSource::Catalog { slug } => Some(slug),
            CardSource::Token { definition } => Some(&definition.slug),
            CardSource::Virtual { .. } => None,
        }
    }

    pub fn is_token(&self) -> bool {
        matches!(self.source, CardSource::Token { .. })
    }

    pub fn is_virtual(&self) -> bool {
        matches!(self.source, CardSource::Virtual { .. })
    }
}

/// An effect waiting on the effect stack
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingEffect {
    pub id: String,
    pub effect: Effect,
    /// Player or card instance the effect came from
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub controller: Option<Team>,
    #[serde(default)]
    pub target: Option<String>,
}

impl PendingEffect {
    pub fn new(id: impl Into<String>, effect: Effect) -> Self {
        Self {
            id: id.into(),
            effect,
            source: None,
            controller: None,
            target: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_catalog() -> Catalog {
        Catalog::from_definitions(vec![
            CardDefinition {
                slug: "orc-center".into(),
                name: "Orc Center".into(),
                set_slug: "core".into(),
                payload: CardPayload::Player {
                    stats: PlayerStats {
                        size: 4,
                        speed: 1,
                        shooting: 1,
                        passing: 2,
                        defense: 4,
                    },
                    abilities: vec![Ability {
                        name: "Box Out".into(),
                        event: EventKind::SetBallLoose,
                        condition: TriggerCondition::Always,
                        effect: Effect::GainActions { amount: 1 },
                    }],
                },
            },
            CardDefinition {
                slug: "shoot".into(),
                name: "Shoot".into(),
                set_slug: "core".into(),
                payload: CardPayload::StandardAction {
                    offense: ActionMode {
                        id: "shoot".into(),
                        name: "Shoot".into(),
                        requirements: vec![Requirement::BallCarrier],
                        target: TargetSpec::SelfOnly,
                        effect: Effect::StandardAction {
                            action: StandardActionKind::Shoot,
                        },
                    },
                    defense: ActionMode {
                        id: "block".into(),
                        name: "Block".into(),
                        requirements: vec![Requirement::AdjacentToOpponent],
                        target: TargetSpec::Opponent,
                        effect: Effect::StandardAction {
                            action: StandardActionKind::Block,
                        },
                    },
                },
            },
            PartialCardDefinition::new(CardType::Coaching)
                .with_slug("timeout")
                .into_definition(),
        ])
    }

    #[test]
    fn test_accessors_by_type() {
        let catalog = sample_catalog();

        assert_eq!(catalog.get_abilities("orc-center").map(<[_]>::len), Some(1));
        assert!(catalog.get_abilities("shoot").is_none());

        assert_eq!(catalog.get_offense("shoot").map(|m| m.id.as_str()), Some("shoot"));
        assert_eq!(catalog.get_defense("shoot").map(|m| m.id.as_str()), Some("block"));
        assert!(catalog.get_offense("orc-center").is_none());

        assert!(catalog.get_play("shoot").is_none());
        assert!(catalog.get_call("timeout").is_none());
        assert!(catalog.get_asset_power("timeout").is_none());
        assert!(catalog.get_card("missing").is_none());
    }

    #[test]
    fn test_partial_defaults_match_catalog_defaults() {
        let definition = PartialCardDefinition::new(CardType::TeamAsset)
            .with_name("Home Crowd")
            .into_definition();

        assert_eq!(definition.slug, "home-crowd");
        assert_eq!(definition.name, "Home Crowd");
        assert_eq!(definition.set_slug, DEFAULT_SET_SLUG);
        assert_eq!(definition.card_type(), CardType::TeamAsset);
        assert_eq!(
            definition.asset_power().map(|p| p.name.as_str()),
            Some("Home Crowd")
        );

        let mut catalog = Catalog::new();
        let slug = catalog.insert_partial(
            PartialCardDefinition::new(CardType::TeamAsset).with_name("Home Crowd"),
        );
        assert_eq!(catalog.get_card(&slug), Some(&definition));
    }

    #[test]
    fn test_anonymous_partial() {
        let definition = PartialCardDefinition::new(CardType::Player).into_definition();
        assert_eq!(definition.slug, DEFAULT_TOKEN_SLUG);
        assert_eq!(definition.stats().map(|s| s.speed), Some(DEFAULT_SPEED));

        let split = PartialCardDefinition::new(CardType::SplitPlay)
            .with_slug("give-and-go")
            .into_definition();
        assert_eq!(split.offense().map(|m| m.id.as_str()), Some("give-and-go-offense"));
        assert_eq!(split.defense().map(|m| m.id.as_str()), Some("give-and-go-defense"));
    }

    #[test]
    fn test_resolve_token_bypasses_catalog() {
        let catalog = sample_catalog();
        let definition = PartialCardDefinition::new(CardType::Ability)
            .with_slug("hot-hand")
            .into_definition();
        let token = CardInstance::token("token-1", definition.clone());

        assert!(catalog.get_card("hot-hand").is_none());
        assert_eq!(catalog.resolve(&token), Some(&definition));
        assert_eq!(catalog.card_type_of(&token), Some(CardType::Ability));
        assert_eq!(token.slug(), Some("hot-hand"));
    }

    #[test]
    fn test_virtual_card_has_no_definition() {
        let catalog = sample_catalog();
        let card = CardInstance::virtual_card("virtual-1", vec!["a".into(), "b".into()]);
        assert!(card.is_virtual());
        assert!(catalog.resolve(&card).is_none());
        assert_eq!(card.slug(), None);
    }

    #[test]
    fn test_definition_serde_shape() {
        let catalog = sample_catalog();
        let card = catalog.get_card("shoot").unwrap();
        let json = serde_json::to_value(card).unwrap();
        assert_eq!(json["card_type"], "standard-action");

        let restored: CardDefinition = serde_json::from_value(json).unwrap();
        assert_eq!(&restored, card);
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Orc  Center!"), "orc-center");
        assert_eq!(slugify("3-Point Specialist"), "3-point-specialist");
    }
}
