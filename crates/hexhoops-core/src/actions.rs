//! Actions that change a match and the events they leave in the log.
//!
//! Every state change goes through exactly one `GameAction`. Applying it
//! appends exactly one `LoggedEvent` whose `GameEvent` payload describes what
//! happened.

use crate::board::Team;
use crate::cards::{CardInstance, PartialCardDefinition, PendingEffect};
use crate::game::{GameError, InAirKind, Phase};
use crate::hex::HexPosition;
use crate::player::{DetachDestination, Modifier};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where an examined card goes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExamineDestination {
    Top,
    Bottom,
    Discard,
}

/// Placement of one examined card
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExaminedPlacement {
    pub instance_id: String,
    pub destination: ExamineDestination,
}

impl ExaminedPlacement {
    pub fn new(instance_id: impl Into<String>, destination: ExamineDestination) -> Self {
        Self {
            instance_id: instance_id.into(),
            destination,
        }
    }
}

/// Where a card ended up after leaving a zone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CardDestination {
    Hand,
    Discard,
    Removed,
    Assets,
    Attachment,
    /// Tokens and virtual cards cease to exist instead of changing zone
    Deleted,
}

impl From<DetachDestination> for CardDestination {
    fn from(destination: DetachDestination) -> Self {
        match destination {
            DetachDestination::Hand => CardDestination::Hand,
            DetachDestination::Discard => CardDestination::Discard,
            DetachDestination::Removed => CardDestination::Removed,
        }
    }
}

/// All possible actions against a match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum GameAction {
    // ==================== Turn Structure ====================
    SetPhase {
        phase: Phase,
    },
    /// Increment the turn number and hand the turn to the other team
    AdvanceTurn,
    SetActions {
        team: Team,
        actions: u32,
    },

    // ==================== Deck Zones ====================
    DrawCards {
        team: Team,
        count: u32,
    },
    DiscardCards {
        team: Team,
        instance_ids: Vec<String>,
    },
    RemoveCards {
        team: Team,
        instance_ids: Vec<String>,
    },
    ExamineCards {
        team: Team,
        count: u32,
    },
    ResolveExaminedCards {
        team: Team,
        placements: Vec<ExaminedPlacement>,
    },
    ShuffleDrawPile {
        team: Team,
        seed: u64,
    },

    // ==================== Players ====================
    MovePlayer {
        player_id: String,
        to: HexPosition,
        /// Skip the speed/pathing check (bounds and occupancy still apply)
        #[serde(default)]
        ignore_speed: bool,
    },
    ExhaustPlayer {
        player_id: String,
    },
    RefreshPlayer {
        player_id: String,
    },
    AddModifier {
        player_id: String,
        modifier: Modifier,
    },
    RemoveModifier {
        player_id: String,
        modifier_id: String,
    },
    Substitute {
        team: Team,
        out_player_id: String,
        in_player_id: String,
    },

    // ==================== Ball & Score ====================
    SetBallPossessed {
        holder_id: String,
    },
    SetBallLoose {
        position: HexPosition,
    },
    SetBallInAir {
        origin: HexPosition,
        target: HexPosition,
        action_kind: InAirKind,
    },
    AddScore {
        team: Team,
        points: u32,
    },

    // ==================== Effect Stack ====================
    PushStack {
        effect: PendingEffect,
    },
    PopStack,
    ClearStack,

    // ==================== Cards In Play ====================
    PlayCard {
        team: Team,
        instance_id: String,
    },
    StageCard {
        team: Team,
        instance_id: String,
    },
    ResolveCard {
        instance_id: String,
        #[serde(default)]
        target_player_id: Option<String>,
    },
    /// Discard two cards from hand to stage a virtual standard action
    StageVirtualStandardAction {
        team: Team,
        discard_instance_ids: Vec<String>,
    },
    MoveAsset {
        team: Team,
        instance_id: String,
        destination: DetachDestination,
    },
    AttachAbility {
        team: Team,
        instance_id: String,
        player_id: String,
        #[serde(default = "default_removable")]
        removable: bool,
        #[serde(default)]
        detach_to: DetachDestination,
    },
    DetachAbility {
        player_id: String,
        instance_id: String,
        /// Overrides the attachment's own detach destination
        #[serde(default)]
        destination: Option<DetachDestination>,
    },
    CreateToken {
        team: Team,
        definition: PartialCardDefinition,
        #[serde(default)]
        attach_to: Option<String>,
    },
}

fn default_removable() -> bool {
    true
}

impl GameAction {
    /// Decode an action from JSON. Unknown action kinds, unknown phase names
    /// and malformed payloads are all `InvalidAction`.
    pub fn from_json(json: &str) -> Result<Self, GameError> {
        serde_json::from_str(json).map_err(|e| GameError::InvalidAction(e.to_string()))
    }

    pub fn kind(&self) -> EventKind {
        match self {
            GameAction::SetPhase { .. } => EventKind::SetPhase,
            GameAction::AdvanceTurn => EventKind::AdvanceTurn,
            GameAction::SetActions { .. } => EventKind::SetActions,
            GameAction::DrawCards { .. } => EventKind::DrawCards,
            GameAction::DiscardCards { .. } => EventKind::DiscardCards,
            GameAction::RemoveCards { .. } => EventKind::RemoveCards,
            GameAction::ExamineCards { .. } => EventKind::ExamineCards,
            GameAction::ResolveExaminedCards { .. } => EventKind::ResolveExaminedCards,
            GameAction::ShuffleDrawPile { .. } => EventKind::ShuffleDrawPile,
            GameAction::MovePlayer { .. } => EventKind::MovePlayer,
            GameAction::ExhaustPlayer { .. } => EventKind::ExhaustPlayer,
            GameAction::RefreshPlayer { .. } => EventKind::RefreshPlayer,
            GameAction::AddModifier { .. } => EventKind::AddModifier,
            GameAction::RemoveModifier { .. } => EventKind::RemoveModifier,
            GameAction::Substitute { .. } => EventKind::Substitute,
            GameAction::SetBallPossessed { .. } => EventKind::SetBallPossessed,
            GameAction::SetBallLoose { .. } => EventKind::SetBallLoose,
            GameAction::SetBallInAir { .. } => EventKind::SetBallInAir,
            GameAction::AddScore { .. } => EventKind::AddScore,
            GameAction::PushStack { .. } => EventKind::PushStack,
            GameAction::PopStack => EventKind::PopStack,
            GameAction::ClearStack => EventKind::ClearStack,
            GameAction::PlayCard { .. } => EventKind::PlayCard,
            GameAction::StageCard { .. } => EventKind::StageCard,
            GameAction::ResolveCard { .. } => EventKind::ResolveCard,
            GameAction::StageVirtualStandardAction { .. } => EventKind::StageVirtualStandardAction,
            GameAction::MoveAsset { .. } => EventKind::MoveAsset,
            GameAction::AttachAbility { .. } => EventKind::AttachAbility,
            GameAction::DetachAbility { .. } => EventKind::DetachAbility,
            GameAction::CreateToken { .. } => EventKind::CreateToken,
        }
    }
}

/// Kind of a logged event.
///
/// Leaf kinds correspond one-to-one with actions. Group kinds (`CardMoved`,
/// `BallChanged`, ...) only appear as ancestors; a trigger registered on a
/// group kind fires for every leaf beneath it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventKind {
    // Groups
    Any,
    TurnChanged,
    DeckChanged,
    CardMoved,
    PlayerChanged,
    BallChanged,
    StackChanged,

    // Leaves
    SetPhase,
    AdvanceTurn,
    SetActions,
    DrawCards,
    DiscardCards,
    RemoveCards,
    ExamineCards,
    ResolveExaminedCards,
    ShuffleDrawPile,
    MovePlayer,
    ExhaustPlayer,
    RefreshPlayer,
    AddModifier,
    RemoveModifier,
    Substitute,
    SetBallPossessed,
    SetBallLoose,
    SetBallInAir,
    AddScore,
    PushStack,
    PopStack,
    ClearStack,
    PlayCard,
    StageCard,
    ResolveCard,
    StageVirtualStandardAction,
    MoveAsset,
    AttachAbility,
    DetachAbility,
    CreateToken,
}

impl EventKind {
    /// The kind this one derives from; `None` only for `Any`
    pub fn parent(self) -> Option<EventKind> {
        use EventKind::*;
        match self {
            Any => None,
            TurnChanged | DeckChanged | CardMoved | PlayerChanged | BallChanged | StackChanged => {
                Some(Any)
            }
            SetPhase | AdvanceTurn | SetActions => Some(TurnChanged),
            DrawCards | ExamineCards | ResolveExaminedCards | ShuffleDrawPile => Some(DeckChanged),
            DiscardCards | RemoveCards | PlayCard | StageCard | ResolveCard
            | StageVirtualStandardAction | MoveAsset | AttachAbility | DetachAbility
            | CreateToken => Some(CardMoved),
            MovePlayer | ExhaustPlayer | RefreshPlayer | AddModifier | RemoveModifier
            | Substitute => Some(PlayerChanged),
            SetBallPossessed | SetBallLoose | SetBallInAir => Some(BallChanged),
            AddScore => Some(Any),
            PushStack | PopStack | ClearStack => Some(StackChanged),
        }
    }

    /// Whether `self` is `ancestor` or lies beneath it
    pub fn derives_from(self, ancestor: EventKind) -> bool {
        let mut current = Some(self);
        while let Some(kind) = current {
            if kind == ancestor {
                return true;
            }
            current = kind.parent();
        }
        false
    }
}

/// What happened, with the details callers and triggers need
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum GameEvent {
    SetPhase {
        from: Phase,
        to: Phase,
    },
    AdvanceTurn {
        turn: u32,
        active_team: Team,
        /// `(player id, modifier id)` pairs dropped by expiry
        expired_modifiers: Vec<(String, String)>,
    },
    SetActions {
        team: Team,
        actions: u32,
    },
    DrawCards {
        team: Team,
        requested: u32,
        cards: Vec<CardInstance>,
    },
    DiscardCards {
        team: Team,
        cards: Vec<CardInstance>,
    },
    RemoveCards {
        team: Team,
        cards: Vec<CardInstance>,
    },
    ExamineCards {
        team: Team,
        requested: u32,
        actual: u32,
        cards: Vec<CardInstance>,
    },
    ResolveExaminedCards {
        team: Team,
        placements: Vec<ExaminedPlacement>,
    },
    ShuffleDrawPile {
        team: Team,
        seed: u64,
    },
    MovePlayer {
        team: Team,
        player_id: String,
        from: Option<HexPosition>,
        to: HexPosition,
    },
    ExhaustPlayer {
        team: Team,
        player_id: String,
    },
    RefreshPlayer {
        team: Team,
        player_id: String,
    },
    AddModifier {
        team: Team,
        player_id: String,
        modifier: Modifier,
    },
    RemoveModifier {
        team: Team,
        player_id: String,
        modifier: Modifier,
    },
    Substitute {
        team: Team,
        out_player_id: String,
        in_player_id: String,
        position: Option<HexPosition>,
        attachments_moved: usize,
    },
    SetBallPossessed {
        holder_id: String,
        team: Team,
    },
    SetBallLoose {
        position: HexPosition,
    },
    SetBallInAir {
        origin: HexPosition,
        target: HexPosition,
        action_kind: InAirKind,
    },
    AddScore {
        team: Team,
        points: u32,
        total: u32,
    },
    PushStack {
        effect: PendingEffect,
    },
    PopStack {
        effect: PendingEffect,
    },
    ClearStack {
        cleared: usize,
    },
    PlayCard {
        team: Team,
        /// Revealed card
        card: CardInstance,
        destination: CardDestination,
    },
    StageCard {
        team: Team,
        card: CardInstance,
    },
    ResolveCard {
        team: Team,
        card: CardInstance,
        destination: CardDestination,
        target_player_id: Option<String>,
        #[serde(rename = "virtual")]
        virtual_card: bool,
    },
    StageVirtualStandardAction {
        team: Team,
        card: CardInstance,
        discarded: Vec<CardInstance>,
    },
    MoveAsset {
        team: Team,
        card: CardInstance,
        destination: CardDestination,
        token_deleted: bool,
    },
    AttachAbility {
        team: Team,
        player_id: String,
        card: CardInstance,
    },
    DetachAbility {
        team: Team,
        player_id: String,
        card: CardInstance,
        destination: CardDestination,
        token_deleted: bool,
    },
    CreateToken {
        team: Team,
        card: CardInstance,
        attached_to: Option<String>,
    },
}

impl GameEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            GameEvent::SetPhase { .. } => EventKind::SetPhase,
            GameEvent::AdvanceTurn { .. } => EventKind::AdvanceTurn,
            GameEvent::SetActions { .. } => EventKind::SetActions,
            GameEvent::DrawCards { .. } => EventKind::DrawCards,
            GameEvent::DiscardCards { .. } => EventKind::DiscardCards,
            GameEvent::RemoveCards { .. } => EventKind::RemoveCards,
            GameEvent::ExamineCards { .. } => EventKind::ExamineCards,
            GameEvent::ResolveExaminedCards { .. } => EventKind::ResolveExaminedCards,
            GameEvent::ShuffleDrawPile { .. } => EventKind::ShuffleDrawPile,
            GameEvent::MovePlayer { .. } => EventKind::MovePlayer,
            GameEvent::ExhaustPlayer { .. } => EventKind::ExhaustPlayer,
            GameEvent::RefreshPlayer { .. } => EventKind::RefreshPlayer,
            GameEvent::AddModifier { .. } => EventKind::AddModifier,
            GameEvent::RemoveModifier { .. } => EventKind::RemoveModifier,
            GameEvent::Substitute { .. } => EventKind::Substitute,
            GameEvent::SetBallPossessed { .. } => EventKind::SetBallPossessed,
            GameEvent::SetBallLoose { .. } => EventKind::SetBallLoose,
            GameEvent::SetBallInAir { .. } => EventKind::SetBallInAir,
            GameEvent::AddScore { .. } => EventKind::AddScore,
            GameEvent::PushStack { .. } => EventKind::PushStack,
            GameEvent::PopStack { .. } => EventKind::PopStack,
            GameEvent::ClearStack { .. } => EventKind::ClearStack,
            GameEvent::PlayCard { .. } => EventKind::PlayCard,
            GameEvent::StageCard { .. } => EventKind::StageCard,
            GameEvent::ResolveCard { .. } => EventKind::ResolveCard,
            GameEvent::StageVirtualStandardAction { .. } => EventKind::StageVirtualStandardAction,
            GameEvent::MoveAsset { .. } => EventKind::MoveAsset,
            GameEvent::AttachAbility { .. } => EventKind::AttachAbility,
            GameEvent::DetachAbility { .. } => EventKind::DetachAbility,
            GameEvent::CreateToken { .. } => EventKind::CreateToken,
        }
    }

    /// Team the event concerns, if any
    pub fn team(&self) -> Option<Team> {
        match self {
            GameEvent::SetPhase { .. }
            | GameEvent::SetBallLoose { .. }
            | GameEvent::SetBallInAir { .. }
            | GameEvent::PushStack { .. }
            | GameEvent::PopStack { .. }
            | GameEvent::ClearStack { .. } => None,
            GameEvent::AdvanceTurn { active_team, .. } => Some(*active_team),
            GameEvent::SetActions { team, .. }
            | GameEvent::DrawCards { team, .. }
            | GameEvent::DiscardCards { team, .. }
            | GameEvent::RemoveCards { team, .. }
            | GameEvent::ExamineCards { team, .. }
            | GameEvent::ResolveExaminedCards { team, .. }
            | GameEvent::ShuffleDrawPile { team, .. }
            | GameEvent::MovePlayer { team, .. }
            | GameEvent::ExhaustPlayer { team, .. }
            | GameEvent::RefreshPlayer { team, .. }
            | GameEvent::AddModifier { team, .. }
            | GameEvent::RemoveModifier { team, .. }
            | GameEvent::Substitute { team, .. }
            | GameEvent::SetBallPossessed { team, .. }
            | GameEvent::AddScore { team, .. }
            | GameEvent::PlayCard { team, .. }
            | GameEvent::StageCard { team, .. }
            | GameEvent::ResolveCard { team, .. }
            | GameEvent::StageVirtualStandardAction { team, .. }
            | GameEvent::MoveAsset { team, .. }
            | GameEvent::AttachAbility { team, .. }
            | GameEvent::DetachAbility { team, .. }
            | GameEvent::CreateToken { team, .. } => Some(*team),
        }
    }

    /// Basketball players named by the event
    pub fn players(&self) -> Vec<&str> {
        match self {
            GameEvent::MovePlayer { player_id, .. }
            | GameEvent::ExhaustPlayer { player_id, .. }
            | GameEvent::RefreshPlayer { player_id, .. }
            | GameEvent::AddModifier { player_id, .. }
            | GameEvent::RemoveModifier { player_id, .. }
            | GameEvent::AttachAbility { player_id, .. }
            | GameEvent::DetachAbility { player_id, .. } => vec![player_id.as_str()],
            GameEvent::SetBallPossessed { holder_id, .. } => vec![holder_id.as_str()],
            GameEvent::Substitute {
                out_player_id,
                in_player_id,
                ..
            } => vec![out_player_id.as_str(), in_player_id.as_str()],
            GameEvent::ResolveCard {
                target_player_id: Some(target),
                ..
            } => vec![target.as_str()],
            GameEvent::CreateToken {
                attached_to: Some(target),
                ..
            } => vec![target.as_str()],
            _ => Vec::new(),
        }
    }

    /// Cards the event moved or revealed
    pub fn cards(&self) -> Vec<&CardInstance> {
        match self {
            GameEvent::DrawCards { cards, .. }
            | GameEvent::DiscardCards { cards, .. }
            | GameEvent::RemoveCards { cards, .. }
            | GameEvent::ExamineCards { cards, .. } => cards.iter().collect(),
            GameEvent::PlayCard { card, .. }
            | GameEvent::StageCard { card, .. }
            | GameEvent::ResolveCard { card, .. }
            | GameEvent::MoveAsset { card, .. }
            | GameEvent::AttachAbility { card, .. }
            | GameEvent::DetachAbility { card, .. }
            | GameEvent::CreateToken { card, .. } => vec![card],
            GameEvent::StageVirtualStandardAction { card, discarded, .. } => {
                std::iter::once(card).chain(discarded.iter()).collect()
            }
            _ => Vec::new(),
        }
    }
}

/// An entry in a match's append-only event log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggedEvent {
    /// Position in the log, starting at 0
    pub sequence: u64,
    /// Turn number at the time the action was applied
    pub turn: u32,
    pub timestamp: DateTime<Utc>,
    pub event: GameEvent,
}

impl LoggedEvent {
    pub fn kind(&self) -> EventKind {
        self.event.kind()
    }
}
