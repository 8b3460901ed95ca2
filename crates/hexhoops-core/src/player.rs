//! Basketball players and per-team card zones.
//!
//! This module contains:
//! - `BasketballPlayer` with stats, modifiers and attached cards
//! - `Deck`, the five ordered card zones a team owns
//! - Stat modifiers and their expiry rules

use crate::board::Team;
use crate::cards::CardInstance;
use crate::hex::HexPosition;
use serde::{Deserialize, Serialize};

/// Speed used when neither the player nor the catalog says otherwise
pub const DEFAULT_SPEED: u32 = 2;

/// A player statistic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stat {
    Size,
    Speed,
    Shooting,
    Passing,
    Defense,
}

/// Printed statistics of a player card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PlayerStats {
    pub size: u32,
    pub speed: u32,
    pub shooting: u32,
    pub passing: u32,
    pub defense: u32,
}

impl PlayerStats {
    pub fn get(&self, stat: Stat) -> u32 {
        match stat {
            Stat::Size => self.size,
            Stat::Speed => self.speed,
            Stat::Shooting => self.shooting,
            Stat::Passing => self.passing,
            Stat::Defense => self.defense,
        }
    }
}

/// When a modifier stops applying
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ModifierExpiry {
    /// Dropped when the turn advances
    EndOfTurn,
    /// Dropped once the turn number passes `turn`
    EndOfTurnNumber { turn: u32 },
}

impl ModifierExpiry {
    /// Whether a modifier with this expiry is gone once `new_turn` begins
    pub fn expired_at(&self, new_turn: u32) -> bool {
        match self {
            ModifierExpiry::EndOfTurn => true,
            ModifierExpiry::EndOfTurnNumber { turn } => *turn < new_turn,
        }
    }
}

/// A temporary adjustment to one stat
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifier {
    pub id: String,
    pub stat: Stat,
    pub amount: i32,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub expiry: Option<ModifierExpiry>,
}

/// Where an attachment goes when it is detached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DetachDestination {
    Hand,
    #[default]
    Discard,
    Removed,
}

/// A card attached to a player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub card: CardInstance,
    /// Team whose zones receive the card when it leaves play
    pub owner: Team,
    pub removable: bool,
    pub detach_to: DetachDestination,
}

impl Attachment {
    pub fn is_token(&self) -> bool {
        self.card.is_token()
    }
}

/// A player on a team's roster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasketballPlayer {
    /// Derived as `{TEAM}-{slug}-{index}`
    pub id: String,
    pub card_slug: String,
    pub name: String,
    /// Printed stats; `None` when the card is not in the catalog
    pub stats: Option<PlayerStats>,
    /// `None` while off court
    pub position: Option<HexPosition>,
    pub exhausted: bool,
    pub modifiers: Vec<Modifier>,
    pub attachments: Vec<Attachment>,
}

impl BasketballPlayer {
    /// Create a roster entry with no position
    pub fn new(team: Team, card_slug: &str, index: usize, name: String, stats: Option<PlayerStats>) -> Self {
        Self {
            id: Self::derive_id(team, card_slug, index),
            card_slug: card_slug.to_string(),
            name,
            stats,
            position: None,
            exhausted: false,
            modifiers: Vec::new(),
            attachments: Vec::new(),
        }
    }

    /// Deterministic id of the `index`th roster entry
    pub fn derive_id(team: Team, card_slug: &str, index: usize) -> String {
        format!("{}-{}-{}", team, card_slug, index)
    }

    pub fn is_on_court(&self) -> bool {
        self.position.is_some()
    }

    /// Sum of modifier amounts on one stat
    pub fn modifier_total(&self, stat: Stat) -> i32 {
        self.modifiers
            .iter()
            .filter(|m| m.stat == stat)
            .map(|m| m.amount)
            .sum()
    }

    /// Base stat plus modifiers, floored at zero. `None` without printed stats.
    pub fn effective_stat(&self, stat: Stat) -> Option<u32> {
        self.stats
            .map(|stats| apply_modifier(stats.get(stat), self.modifier_total(stat)))
    }

    /// Drop modifiers that expire when `new_turn` begins; returns their ids
    pub fn expire_modifiers(&mut self, new_turn: u32) -> Vec<String> {
        let mut expired = Vec::new();
        self.modifiers.retain(|m| {
            let gone = m.expiry.is_some_and(|e| e.expired_at(new_turn));
            if gone {
                expired.push(m.id.clone());
            }
            !gone
        });
        expired
    }
}

/// Add a signed modifier to a stat without going below zero
pub fn apply_modifier(base: u32, amount: i32) -> u32 {
    let value = i64::from(base) + i64::from(amount);
    value.clamp(0, i64::from(u32::MAX)) as u32
}

/// The five ordered card zones of one team
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Deck {
    /// Index 0 is the top of the pile
    pub draw_pile: Vec<CardInstance>,
    pub hand: Vec<CardInstance>,
    pub discard: Vec<CardInstance>,
    pub removed: Vec<CardInstance>,
    pub examined: Vec<CardInstance>,
}

impl Deck {
    /// Create a deck with everything in the draw pile
    pub fn new(draw_pile: Vec<CardInstance>) -> Self {
        Self {
            draw_pile,
            ..Self::default()
        }
    }

    /// Move up to `count` cards from the top of the draw pile to the hand
    pub fn draw(&mut self, count: usize) -> Vec<CardInstance> {
        let n = count.min(self.draw_pile.len());
        let drawn: Vec<CardInstance> = self.draw_pile.drain(..n).collect();
        self.hand.extend(drawn.iter().cloned());
        drawn
    }

    /// Move up to `count` cards from the top of the draw pile to the examined zone
    pub fn examine(&mut self, count: usize) -> Vec<CardInstance> {
        let n = count.min(self.draw_pile.len());
        let examined: Vec<CardInstance> = self.draw_pile.drain(..n).collect();
        self.examined.extend(examined.iter().cloned());
        examined
    }

    pub fn hand_contains(&self, instance_id: &str) -> bool {
        self.hand.iter().any(|c| c.instance_id == instance_id)
    }

    /// Take a card out of the hand
    pub fn take_from_hand(&mut self, instance_id: &str) -> Option<CardInstance> {
        let index = self.hand.iter().position(|c| c.instance_id == instance_id)?;
        Some(self.hand.remove(index))
    }

    /// Total cards across all zones
    pub fn total(&self) -> usize {
        self.draw_pile.len()
            + self.hand.len()
            + self.discard.len()
            + self.removed.len()
            + self.examined.len()
    }
}
