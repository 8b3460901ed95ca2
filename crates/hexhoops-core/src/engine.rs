//! The action engine: the only way a match changes.
//!
//! `ActionEngine::apply` takes a snapshot and one action and returns the next
//! snapshot with exactly one event appended, or an error. The input snapshot
//! is never touched, so a rejected action needs no rollback.

use crate::actions::{
    CardDestination, ExamineDestination, ExaminedPlacement, GameAction, GameEvent, LoggedEvent,
};
use crate::board::{Occupant, Team};
use crate::cards::{CardInstance, CardType, Catalog, PartialCardDefinition};
use crate::game::{Ball, GameError, GameState, PlayAreaEntry, TeamState};
use crate::hex::HexPosition;
use crate::movement::MovementResolver;
use crate::player::{Attachment, BasketballPlayer, DetachDestination, Modifier};
use crate::triggers::TriggerRegistry;
use chrono::Utc;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::HashSet;
use tracing::{debug, error, warn};

/// Number of hand cards paid for a virtual standard action
pub const VIRTUAL_ACTION_COST: usize = 2;

/// Validates and applies actions against a catalog and, optionally, a
/// trigger registry.
pub struct ActionEngine<'a> {
    catalog: &'a Catalog,
    triggers: Option<&'a TriggerRegistry>,
}

impl<'a> ActionEngine<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        Self {
            catalog,
            triggers: None,
        }
    }

    /// Push the effects of matching triggers onto the stack after each action
    #[must_use]
    pub fn with_triggers(mut self, triggers: &'a TriggerRegistry) -> Self {
        self.triggers = Some(triggers);
        self
    }

    pub fn catalog(&self) -> &Catalog {
        self.catalog
    }

    /// Apply one action.
    ///
    /// On success the returned state carries one more logged event. On
    /// failure the caller keeps `state`; `InvariantViolation` means `state`
    /// itself was corrupt.
    pub fn apply(&self, state: &GameState, action: GameAction) -> Result<GameState, GameError> {
        let kind = action.kind();
        let mut next = state.clone();

        let event = match self.transform(&mut next, action) {
            Ok(event) => event,
            Err(err) => {
                warn!(?kind, turn = state.turn_number, %err, "Action rejected");
                return Err(err);
            }
        };

        next.events.push(LoggedEvent {
            sequence: next.events.len() as u64,
            turn: next.turn_number,
            timestamp: Utc::now(),
            event,
        });

        if let Some(triggers) = self.triggers {
            if let Some(logged) = next.events.last() {
                let effects = triggers.dispatch(logged, &next);
                next.effect_stack.extend(effects);
            }
        }

        if let Some(report) = next.board.check_invariants() {
            error!(?kind, %report, "Board invariant violated");
            return Err(GameError::InvariantViolation(report));
        }

        debug!(
            ?kind,
            turn = next.turn_number,
            active_team = %next.active_team,
            "Action applied"
        );
        Ok(next)
    }

    fn transform(&self, state: &mut GameState, action: GameAction) -> Result<GameEvent, GameError> {
        match action {
            // ==================== Turn Structure ====================
            GameAction::SetPhase { phase } => {
                let from = state.phase;
                state.phase = phase;
                Ok(GameEvent::SetPhase { from, to: phase })
            }

            GameAction::AdvanceTurn => {
                state.turn_number += 1;
                state.active_team = state.active_team.opponent();
                let turn = state.turn_number;

                let mut expired_modifiers = Vec::new();
                for team in Team::ALL {
                    for player in &mut state.team_mut(team).players {
                        for modifier_id in player.expire_modifiers(turn) {
                            expired_modifiers.push((player.id.clone(), modifier_id));
                        }
                    }
                }

                Ok(GameEvent::AdvanceTurn {
                    turn,
                    active_team: state.active_team,
                    expired_modifiers,
                })
            }

            GameAction::SetActions { team, actions } => {
                state.team_mut(team).actions_remaining = actions;
                Ok(GameEvent::SetActions { team, actions })
            }

            // ==================== Deck Zones ====================
            GameAction::DrawCards { team, count } => {
                require_positive(count, "draw-cards")?;
                let cards = state.team_mut(team).deck.draw(count as usize);
                Ok(GameEvent::DrawCards {
                    team,
                    requested: count,
                    cards,
                })
            }

            GameAction::DiscardCards { team, instance_ids } => {
                let deck = &mut state.team_mut(team).deck;
                let cards = take_from_hand(team, &mut deck.hand, &instance_ids)?;
                deck.discard.extend(cards.iter().cloned());
                Ok(GameEvent::DiscardCards { team, cards })
            }

            GameAction::RemoveCards { team, instance_ids } => {
                let deck = &mut state.team_mut(team).deck;
                let cards = take_from_hand(team, &mut deck.hand, &instance_ids)?;
                deck.removed.extend(cards.iter().cloned());
                Ok(GameEvent::RemoveCards { team, cards })
            }

            GameAction::ExamineCards { team, count } => {
                require_positive(count, "examine-cards")?;
                let cards = state.team_mut(team).deck.examine(count as usize);
                Ok(GameEvent::ExamineCards {
                    team,
                    requested: count,
                    actual: cards.len() as u32,
                    cards,
                })
            }

            GameAction::ResolveExaminedCards { team, placements } => {
                resolve_examined(state.team_mut(team), &placements)?;
                Ok(GameEvent::ResolveExaminedCards { team, placements })
            }

            GameAction::ShuffleDrawPile { team, seed } => {
                let mut rng = StdRng::seed_from_u64(seed);
                state.team_mut(team).deck.draw_pile.shuffle(&mut rng);
                Ok(GameEvent::ShuffleDrawPile { team, seed })
            }

            // ==================== Players ====================
            GameAction::MovePlayer {
                player_id,
                to,
                ignore_speed,
            } => self.move_player(state, player_id, to, ignore_speed),

            GameAction::ExhaustPlayer { player_id } => {
                let team = player_team(state, &player_id)?;
                player_mut(state, &player_id)?.exhausted = true;
                Ok(GameEvent::ExhaustPlayer { team, player_id })
            }

            GameAction::RefreshPlayer { player_id } => {
                let team = player_team(state, &player_id)?;
                player_mut(state, &player_id)?.exhausted = false;
                Ok(GameEvent::RefreshPlayer { team, player_id })
            }

            GameAction::AddModifier {
                player_id,
                modifier,
            } => {
                let team = player_team(state, &player_id)?;
                let player = player_mut(state, &player_id)?;
                if player.modifiers.iter().any(|m| m.id == modifier.id) {
                    return Err(GameError::invalid(format!(
                        "Player {} already has modifier {}",
                        player_id, modifier.id
                    )));
                }
                player.modifiers.push(modifier.clone());
                Ok(GameEvent::AddModifier {
                    team,
                    player_id,
                    modifier,
                })
            }

            GameAction::RemoveModifier {
                player_id,
                modifier_id,
            } => {
                let team = player_team(state, &player_id)?;
                let player = player_mut(state, &player_id)?;
                let index = player
                    .modifiers
                    .iter()
                    .position(|m| m.id == modifier_id)
                    .ok_or_else(|| {
                        GameError::invalid(format!(
                            "Player {} has no modifier {}",
                            player_id, modifier_id
                        ))
                    })?;
                let modifier: Modifier = player.modifiers.remove(index);
                Ok(GameEvent::RemoveModifier {
                    team,
                    player_id,
                    modifier,
                })
            }

            GameAction::Substitute {
                team,
                out_player_id,
                in_player_id,
            } => substitute(state, team, out_player_id, in_player_id),

            // ==================== Ball & Score ====================
            GameAction::SetBallPossessed { holder_id } => {
                let team = player_team(state, &holder_id)?;
                if !player_ref(state, &holder_id)?.is_on_court() {
                    return Err(GameError::invalid(format!(
                        "Player {} is not on court",
                        holder_id
                    )));
                }
                state.ball = Ball::Possessed {
                    holder_id: holder_id.clone(),
                };
                Ok(GameEvent::SetBallPossessed { holder_id, team })
            }

            GameAction::SetBallLoose { position } => {
                require_on_board(&position)?;
                state.ball = Ball::Loose { position };
                Ok(GameEvent::SetBallLoose { position })
            }

            GameAction::SetBallInAir {
                origin,
                target,
                action_kind,
            } => {
                require_on_board(&origin)?;
                require_on_board(&target)?;
                state.ball = Ball::InAir {
                    origin,
                    target,
                    action_kind,
                };
                Ok(GameEvent::SetBallInAir {
                    origin,
                    target,
                    action_kind,
                })
            }

            GameAction::AddScore { team, points } => {
                require_positive(points, "add-score")?;
                let total = state.score.add(team, points);
                Ok(GameEvent::AddScore {
                    team,
                    points,
                    total,
                })
            }

            // ==================== Effect Stack ====================
            GameAction::PushStack { effect } => {
                state.effect_stack.push(effect.clone());
                Ok(GameEvent::PushStack { effect })
            }

            GameAction::PopStack => {
                let effect = state
                    .effect_stack
                    .pop()
                    .ok_or_else(|| GameError::invalid("Effect stack is empty"))?;
                Ok(GameEvent::PopStack { effect })
            }

            GameAction::ClearStack => {
                let cleared = state.effect_stack.len();
                state.effect_stack.clear();
                Ok(GameEvent::ClearStack { cleared })
            }

            // ==================== Cards In Play ====================
            GameAction::PlayCard { team, instance_id } => {
                let card = take_one_from_hand(state, team, &instance_id)?;
                let destination = if self.catalog.card_type_of(&card) == Some(CardType::TeamAsset) {
                    state.team_mut(team).assets.push(card.clone());
                    CardDestination::Assets
                } else {
                    send_to_zone(state.team_mut(team), card.clone(), DetachDestination::Discard)
                };
                Ok(GameEvent::PlayCard {
                    team,
                    card,
                    destination,
                })
            }

            GameAction::StageCard { team, instance_id } => {
                let card = take_one_from_hand(state, team, &instance_id)?;
                state.play_area.push(PlayAreaEntry {
                    card: card.clone(),
                    played_by: team,
                });
                Ok(GameEvent::StageCard { team, card })
            }

            GameAction::ResolveCard {
                instance_id,
                target_player_id,
            } => self.resolve_card(state, instance_id, target_player_id),

            GameAction::StageVirtualStandardAction {
                team,
                discard_instance_ids,
            } => {
                let distinct: HashSet<&String> = discard_instance_ids.iter().collect();
                if discard_instance_ids.len() != VIRTUAL_ACTION_COST
                    || distinct.len() != VIRTUAL_ACTION_COST
                {
                    return Err(GameError::invalid(format!(
                        "A virtual standard action needs exactly {} different cards from hand",
                        VIRTUAL_ACTION_COST
                    )));
                }

                let deck = &mut state.team_mut(team).deck;
                let discarded = take_from_hand(team, &mut deck.hand, &discard_instance_ids)?;
                deck.discard.extend(discarded.iter().cloned());

                let id = state.next_instance_id("virtual");
                let card = CardInstance::virtual_card(id, discard_instance_ids);
                state.play_area.push(PlayAreaEntry {
                    card: card.clone(),
                    played_by: team,
                });
                Ok(GameEvent::StageVirtualStandardAction {
                    team,
                    card,
                    discarded,
                })
            }

            GameAction::MoveAsset {
                team,
                instance_id,
                destination,
            } => {
                let team_state = state.team_mut(team);
                let index = team_state
                    .assets
                    .iter()
                    .position(|c| c.instance_id == instance_id)
                    .ok_or_else(|| {
                        GameError::invalid(format!("{} has no asset {}", team, instance_id))
                    })?;
                let card = team_state.assets.remove(index);
                let token_deleted = card.is_token();
                let destination = send_to_zone(team_state, card.clone(), destination);
                Ok(GameEvent::MoveAsset {
                    team,
                    card,
                    destination,
                    token_deleted,
                })
            }

            GameAction::AttachAbility {
                team,
                instance_id,
                player_id,
                removable,
                detach_to,
            } => {
                player_ref(state, &player_id)?;
                let card = take_one_from_hand(state, team, &instance_id)?;
                if self.catalog.card_type_of(&card) != Some(CardType::Ability) {
                    return Err(GameError::invalid(format!(
                        "Card {} is not an ability card",
                        instance_id
                    )));
                }
                player_mut(state, &player_id)?.attachments.push(Attachment {
                    card: card.clone(),
                    owner: team,
                    removable,
                    detach_to,
                });
                Ok(GameEvent::AttachAbility {
                    team,
                    player_id,
                    card,
                })
            }

            GameAction::DetachAbility {
                player_id,
                instance_id,
                destination,
            } => {
                let player = player_mut(state, &player_id)?;
                let index = player
                    .attachments
                    .iter()
                    .position(|a| a.card.instance_id == instance_id)
                    .ok_or_else(|| {
                        GameError::invalid(format!(
                            "Player {} has no attachment {}",
                            player_id, instance_id
                        ))
                    })?;
                if !player.attachments[index].removable {
                    return Err(GameError::invalid(format!(
                        "Attachment {} cannot be removed",
                        instance_id
                    )));
                }
                let attachment = player.attachments.remove(index);
                let team = attachment.owner;
                let token_deleted = attachment.is_token();
                let destination = send_to_zone(
                    state.team_mut(team),
                    attachment.card.clone(),
                    destination.unwrap_or(attachment.detach_to),
                );
                Ok(GameEvent::DetachAbility {
                    team,
                    player_id,
                    card: attachment.card,
                    destination,
                    token_deleted,
                })
            }

            GameAction::CreateToken {
                team,
                definition,
                attach_to,
            } => create_token(state, team, definition, attach_to),
        }
    }

    fn move_player(
        &self,
        state: &mut GameState,
        player_id: String,
        to: HexPosition,
        ignore_speed: bool,
    ) -> Result<GameEvent, GameError> {
        let team = player_team(state, &player_id)?;
        let from = player_ref(state, &player_id)?.position;

        require_on_board(&to)?;
        if state.board.is_occupied(&to) {
            return Err(GameError::invalid(format!("Position {} is occupied", to)));
        }
        if from.is_some() && !ignore_speed {
            let reachable = MovementResolver::new(state)
                .with_catalog(self.catalog)
                .can_move_to(&player_id, &to);
            if !reachable {
                return Err(GameError::invalid(format!(
                    "Player {} cannot reach {}",
                    player_id, to
                )));
            }
        }

        let moved = from.is_some_and(|from| state.board.move_occupant(&from, to));
        if !moved {
            state.board.set_occupant(to, Occupant::player(player_id.clone()));
        }
        player_mut(state, &player_id)?.position = Some(to);

        Ok(GameEvent::MovePlayer {
            team,
            player_id,
            from,
            to,
        })
    }

    fn resolve_card(
        &self,
        state: &mut GameState,
        instance_id: String,
        target_player_id: Option<String>,
    ) -> Result<GameEvent, GameError> {
        let index = state
            .play_area
            .iter()
            .position(|e| e.card.instance_id == instance_id)
            .ok_or_else(|| {
                GameError::invalid(format!("Card {} is not in the play area", instance_id))
            })?;
        if let Some(target) = &target_player_id {
            player_ref(state, target)?;
        }

        let PlayAreaEntry { card, played_by } = state.play_area.remove(index);
        let team = played_by;
        let virtual_card = card.is_virtual();

        let destination = match (self.catalog.card_type_of(&card), &target_player_id) {
            _ if virtual_card => CardDestination::Deleted,
            (Some(CardType::TeamAsset), _) => {
                state.team_mut(team).assets.push(card.clone());
                CardDestination::Assets
            }
            (Some(CardType::Ability), Some(target)) => {
                player_mut(state, target)?.attachments.push(Attachment {
                    card: card.clone(),
                    owner: team,
                    removable: true,
                    detach_to: DetachDestination::default(),
                });
                CardDestination::Attachment
            }
            _ => send_to_zone(state.team_mut(team), card.clone(), DetachDestination::Discard),
        };

        Ok(GameEvent::ResolveCard {
            team,
            card,
            destination,
            target_player_id,
            virtual_card,
        })
    }
}

fn require_positive(count: u32, action: &str) -> Result<(), GameError> {
    if count == 0 {
        return Err(GameError::invalid(format!("{} needs a positive count", action)));
    }
    Ok(())
}

fn require_on_board(pos: &HexPosition) -> Result<(), GameError> {
    if !pos.is_valid() {
        return Err(GameError::invalid(format!("Position {} is off the board", pos)));
    }
    Ok(())
}

fn unknown_player(id: &str) -> GameError {
    GameError::invalid(format!("Unknown player {}", id))
}

fn player_team(state: &GameState, id: &str) -> Result<Team, GameError> {
    state
        .basketball_player_team(id)
        .ok_or_else(|| unknown_player(id))
}

fn player_ref<'s>(
    state: &'s GameState,
    id: &str,
) -> Result<&'s BasketballPlayer, GameError> {
    state.basketball_player(id).ok_or_else(|| unknown_player(id))
}

fn player_mut<'s>(
    state: &'s mut GameState,
    id: &str,
) -> Result<&'s mut BasketballPlayer, GameError> {
    state
        .basketball_player_mut(id)
        .ok_or_else(|| unknown_player(id))
}

/// Take the named cards out of a hand, in the order named
fn take_from_hand(
    team: Team,
    hand: &mut Vec<CardInstance>,
    instance_ids: &[String],
) -> Result<Vec<CardInstance>, GameError> {
    instance_ids
        .iter()
        .map(|id| {
            let index = hand
                .iter()
                .position(|c| &c.instance_id == id)
                .ok_or_else(|| GameError::CardNotInHand {
                    team,
                    instance_id: id.clone(),
                })?;
            Ok(hand.remove(index))
        })
        .collect()
}

fn take_one_from_hand(
    state: &mut GameState,
    team: Team,
    instance_id: &str,
) -> Result<CardInstance, GameError> {
    state
        .team_mut(team)
        .deck
        .take_from_hand(instance_id)
        .ok_or_else(|| GameError::CardNotInHand {
            team,
            instance_id: instance_id.to_string(),
        })
}

/// Put a card that left play into one of the team's zones.
/// Tokens and virtual cards are dropped instead.
fn send_to_zone(
    team_state: &mut TeamState,
    card: CardInstance,
    destination: DetachDestination,
) -> CardDestination {
    if card.is_token() || card.is_virtual() {
        return CardDestination::Deleted;
    }
    let deck = &mut team_state.deck;
    match destination {
        DetachDestination::Hand => deck.hand.push(card),
        DetachDestination::Discard => deck.discard.push(card),
        DetachDestination::Removed => deck.removed.push(card),
    }
    destination.into()
}

/// Route every examined card to the top or bottom of the draw pile or to
/// the discard. Placements must name exactly the examined cards.
fn resolve_examined(
    team_state: &mut TeamState,
    placements: &[ExaminedPlacement],
) -> Result<(), GameError> {
    let deck = &mut team_state.deck;

    let mut seen = HashSet::new();
    let mut unexpected = Vec::new();
    for placement in placements {
        let known = deck
            .examined
            .iter()
            .any(|c| c.instance_id == placement.instance_id);
        if !known || !seen.insert(placement.instance_id.as_str()) {
            unexpected.push(placement.instance_id.clone());
        }
    }
    let missing: Vec<String> = deck
        .examined
        .iter()
        .filter(|c| !seen.contains(c.instance_id.as_str()))
        .map(|c| c.instance_id.clone())
        .collect();

    if !missing.is_empty() || !unexpected.is_empty() {
        return Err(GameError::IncompletePlacement {
            missing,
            unexpected,
        });
    }

    let mut examined = std::mem::take(&mut deck.examined);
    let mut take = |id: &str| {
        examined
            .iter()
            .position(|c| c.instance_id == id)
            .map(|index| examined.remove(index))
    };

    let mut top = Vec::new();
    let mut bottom = Vec::new();
    for placement in placements {
        let Some(card) = take(&placement.instance_id) else {
            continue;
        };
        match placement.destination {
            ExamineDestination::Top => top.push(card),
            ExamineDestination::Bottom => bottom.push(card),
            ExamineDestination::Discard => deck.discard.push(card),
        }
    }

    top.append(&mut deck.draw_pile);
    top.append(&mut bottom);
    deck.draw_pile = top;
    Ok(())
}

/// Swap an on-court player for a bench player of the same team. The
/// incoming player takes the position, roster slot, attachments and (if
/// held) the ball.
fn substitute(
    state: &mut GameState,
    team: Team,
    out_player_id: String,
    in_player_id: String,
) -> Result<GameEvent, GameError> {
    let players = &state.team(team).players;
    let out_index = players
        .iter()
        .position(|p| p.id == out_player_id)
        .ok_or_else(|| unknown_player(&out_player_id))?;
    let in_index = players
        .iter()
        .position(|p| p.id == in_player_id)
        .ok_or_else(|| unknown_player(&in_player_id))?;

    let position = players[out_index].position.ok_or_else(|| {
        GameError::invalid(format!("Player {} is not on court", out_player_id))
    })?;
    if players[in_index].is_on_court() {
        return Err(GameError::invalid(format!(
            "Player {} is already on court",
            in_player_id
        )));
    }

    state.board.remove_occupant(&position);
    state
        .board
        .set_occupant(position, Occupant::player(in_player_id.clone()));

    let players = &mut state.team_mut(team).players;
    let attachments = std::mem::take(&mut players[out_index].attachments);
    let attachments_moved = attachments.len();
    players[out_index].position = None;
    players[in_index].attachments.extend(attachments);
    players[in_index].position = Some(position);
    players.swap(out_index, in_index);

    if state.is_ball_carrier(&out_player_id) {
        state.ball = Ball::Possessed {
            holder_id: in_player_id.clone(),
        };
    }

    Ok(GameEvent::Substitute {
        team,
        out_player_id,
        in_player_id,
        position: Some(position),
        attachments_moved,
    })
}

fn create_token(
    state: &mut GameState,
    team: Team,
    definition: PartialCardDefinition,
    attach_to: Option<String>,
) -> Result<GameEvent, GameError> {
    if let Some(player_id) = &attach_to {
        player_ref(state, player_id)?;
    }

    let id = state.next_instance_id("token");
    let card = CardInstance::token(id, definition.into_definition());

    match &attach_to {
        Some(player_id) => player_mut(state, player_id)?.attachments.push(Attachment {
            card: card.clone(),
            owner: team,
            removable: true,
            detach_to: DetachDestination::default(),
        }),
        None => state.team_mut(team).assets.push(card.clone()),
    }

    Ok(GameEvent::CreateToken {
        team,
        card,
        attached_to: attach_to,
    })
}
