//! Trigger registry.
//!
//! The registry is a plain value owned by whoever hosts a match. It maps an
//! event kind plus a condition to an effect; `dispatch` returns the effects
//! whose bindings match a logged event, in registration order, for the
//! caller to push onto the effect stack.

use crate::actions::{EventKind, LoggedEvent};
use crate::board::Team;
use crate::cards::{Ability, Catalog, Effect, PendingEffect};
use crate::game::{GameState, Phase};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::trace;

/// Unique identifier for a trigger binding within one registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TriggerId(pub u32);

impl fmt::Display for TriggerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "trigger-{}", self.0)
    }
}

/// Extra condition a binding checks beyond the event kind.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TriggerCondition {
    #[default]
    Always,
    Never,

    // === Teams ===
    /// Event concerns the given team
    TeamIs(Team),
    /// Event concerns the binding's controller
    ControllerTeam,
    /// Event concerns the controller's opponent
    OpponentTeam,
    /// It is the given team's turn
    ActiveTeam(Team),
    /// It is the controller's turn
    ControllerActive,

    // === Players and cards ===
    PlayerInvolved(String),
    /// Event names the player the binding belongs to
    OwnPlayerInvolved,
    /// Event moved or revealed a card with this slug
    CardSlug(String),

    InPhase(Phase),

    // === Combinators ===
    All(Vec<TriggerCondition>),
    Any(Vec<TriggerCondition>),
    Not(Box<TriggerCondition>),
}

impl TriggerCondition {
    pub fn all(conditions: impl IntoIterator<Item = TriggerCondition>) -> Self {
        Self::All(conditions.into_iter().collect())
    }

    pub fn any(conditions: impl IntoIterator<Item = TriggerCondition>) -> Self {
        Self::Any(conditions.into_iter().collect())
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(condition: TriggerCondition) -> Self {
        Self::Not(Box::new(condition))
    }

    /// Check the condition for one binding against one event
    pub fn evaluate(&self, ctx: &ConditionContext<'_>) -> bool {
        let event = &ctx.event.event;
        match self {
            TriggerCondition::Always => true,
            TriggerCondition::Never => false,
            TriggerCondition::TeamIs(team) => event.team() == Some(*team),
            TriggerCondition::ControllerTeam => {
                ctx.binding.controller.is_some() && event.team() == ctx.binding.controller
            }
            TriggerCondition::OpponentTeam => ctx
                .binding
                .controller
                .is_some_and(|c| event.team() == Some(c.opponent())),
            TriggerCondition::ActiveTeam(team) => ctx.state.active_team() == *team,
            TriggerCondition::ControllerActive => {
                ctx.binding.controller == Some(ctx.state.active_team())
            }
            TriggerCondition::PlayerInvolved(id) => event.players().contains(&id.as_str()),
            TriggerCondition::OwnPlayerInvolved => ctx
                .binding
                .player_id
                .as_deref()
                .is_some_and(|id| event.players().contains(&id)),
            TriggerCondition::CardSlug(slug) => event
                .cards()
                .iter()
                .any(|card| card.slug() == Some(slug.as_str())),
            TriggerCondition::InPhase(phase) => ctx.state.phase() == *phase,
            TriggerCondition::All(conditions) => conditions.iter().all(|c| c.evaluate(ctx)),
            TriggerCondition::Any(conditions) => conditions.iter().any(|c| c.evaluate(ctx)),
            TriggerCondition::Not(condition) => !condition.evaluate(ctx),
        }
    }
}

/// Everything a condition can look at
pub struct ConditionContext<'a> {
    pub binding: &'a TriggerBinding,
    pub event: &'a LoggedEvent,
    /// State after the event was applied
    pub state: &'a GameState,
}

/// One registered event kind + condition -> effect mapping
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerBinding {
    /// Assigned by the registry on registration
    pub id: TriggerId,
    pub name: String,
    /// Fires for this kind and every kind deriving from it
    pub event: EventKind,
    pub condition: TriggerCondition,
    pub effect: Effect,
    /// Player or card instance the binding came from
    pub source: Option<String>,
    /// Player the ability belongs to (a bearer for attachments)
    pub player_id: Option<String>,
    pub controller: Option<Team>,
}

impl TriggerBinding {
    pub fn new(name: impl Into<String>, event: EventKind, effect: Effect) -> Self {
        Self {
            id: TriggerId(0),
            name: name.into(),
            event,
            condition: TriggerCondition::Always,
            effect,
            source: None,
            player_id: None,
            controller: None,
        }
    }

    /// Binding for a card ability
    pub fn from_ability(ability: &Ability) -> Self {
        Self::new(ability.name.clone(), ability.event, ability.effect.clone())
            .with_condition(ability.condition.clone())
    }

    #[must_use]
    pub fn with_condition(mut self, condition: TriggerCondition) -> Self {
        self.condition = condition;
        self
    }

    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    #[must_use]
    pub fn with_player(mut self, player_id: impl Into<String>) -> Self {
        self.player_id = Some(player_id.into());
        self
    }

    #[must_use]
    pub fn with_controller(mut self, controller: Team) -> Self {
        self.controller = Some(controller);
        self
    }

    /// Whether the binding fires for this event in this state
    pub fn matches(&self, event: &LoggedEvent, state: &GameState) -> bool {
        if !event.kind().derives_from(self.event) {
            return false;
        }
        self.condition.evaluate(&ConditionContext {
            binding: self,
            event,
            state,
        })
    }
}

/// Ordered table of trigger bindings.
#[derive(Clone, Debug, Default)]
pub struct TriggerRegistry {
    /// Registration order
    bindings: Vec<TriggerBinding>,
    next_id: u32,
}

impl TriggerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a binding, returns its ID
    pub fn register(&mut self, mut binding: TriggerBinding) -> TriggerId {
        let id = TriggerId(self.next_id);
        self.next_id += 1;
        binding.id = id;
        self.bindings.push(binding);
        id
    }

    pub fn unregister(&mut self, id: TriggerId) -> Option<TriggerBinding> {
        let index = self.bindings.iter().position(|b| b.id == id)?;
        Some(self.bindings.remove(index))
    }

    /// Remove every binding that came from `source`; returns how many
    pub fn remove_for_source(&mut self, source: &str) -> usize {
        let before = self.bindings.len();
        self.bindings.retain(|b| b.source.as_deref() != Some(source));
        before - self.bindings.len()
    }

    pub fn get(&self, id: TriggerId) -> Option<&TriggerBinding> {
        self.bindings.iter().find(|b| b.id == id)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TriggerBinding> {
        self.bindings.iter()
    }

    /// Bind the reactive abilities of everything a match has in play:
    /// - abilities printed on on-court players
    /// - abilities of cards attached to any player (inline for tokens)
    /// - responses of team asset powers
    pub fn register_card_abilities(&mut self, state: &GameState, catalog: &Catalog) -> Vec<TriggerId> {
        let mut registered = Vec::new();

        for team in Team::ALL {
            for player in state.on_court(team) {
                for ability in catalog.get_abilities(&player.card_slug).unwrap_or_default() {
                    let binding = TriggerBinding::from_ability(ability)
                        .with_source(player.id.clone())
                        .with_player(player.id.clone())
                        .with_controller(team);
                    registered.push(self.register(binding));
                }
            }

            for player in &state.team(team).players {
                for attachment in &player.attachments {
                    let Some(definition) = catalog.resolve(&attachment.card) else {
                        continue;
                    };
                    for ability in definition.abilities().unwrap_or_default() {
                        let binding = TriggerBinding::from_ability(ability)
                            .with_source(attachment.card.instance_id.clone())
                            .with_player(player.id.clone())
                            .with_controller(attachment.owner);
                        registered.push(self.register(binding));
                    }
                }
            }

            for asset in state.assets(team) {
                let response = catalog
                    .resolve(asset)
                    .and_then(|d| d.asset_power())
                    .and_then(|p| p.response.as_ref());
                if let Some(ability) = response {
                    let binding = TriggerBinding::from_ability(ability)
                        .with_source(asset.instance_id.clone())
                        .with_controller(team);
                    registered.push(self.register(binding));
                }
            }
        }

        registered
    }

    /// Effects of every binding matching the event, in registration order
    pub fn dispatch(&self, event: &LoggedEvent, state: &GameState) -> Vec<PendingEffect> {
        let effects: Vec<PendingEffect> = self
            .bindings
            .iter()
            .filter(|b| b.matches(event, state))
            .map(|b| PendingEffect {
                id: format!("{}-event-{}", b.id, event.sequence),
                effect: b.effect.clone(),
                source: b.source.clone(),
                controller: b.controller,
                target: b.player_id.clone(),
            })
            .collect();

        trace!(
            sequence = event.sequence,
            kind = ?event.kind(),
            fired = effects.len(),
            "Dispatched triggers"
        );
        effects
    }
}
