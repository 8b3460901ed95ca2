//! Court representation: terrain tiles and occupants.
//!
//! This module contains:
//! - The two teams and which half of the court each defends
//! - Terrain kinds and the fixed court layout
//! - Occupant placement with the id-uniqueness invariant
//! - Line-of-sight (`path_clear`) queries

use crate::hex::{all_positions, HexPosition};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Center of the court, where the ball starts
pub const CENTER_COURT: HexPosition = HexPosition::new(2, 7);

/// Hoop defended by the home team (attacked by away)
pub const HOME_HOOP: HexPosition = HexPosition::new(2, 0);

/// Hoop defended by the away team (attacked by home)
pub const AWAY_HOOP: HexPosition = HexPosition::new(2, 13);

/// One of the two teams in a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Team {
    Home,
    Away,
}

impl Team {
    /// Both teams, home first
    pub const ALL: [Team; 2] = [Team::Home, Team::Away];

    /// The other team
    pub const fn opponent(self) -> Team {
        match self {
            Team::Home => Team::Away,
            Team::Away => Team::Home,
        }
    }

    /// The hoop this team shoots at
    pub const fn target_hoop(self) -> HexPosition {
        match self {
            Team::Home => AWAY_HOOP,
            Team::Away => HOME_HOOP,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Team::Home => "HOME",
            Team::Away => "AWAY",
        }
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of terrain on a hex
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TerrainKind {
    Hoop,
    Paint,
    ThreePointLine,
    Court,
    CenterCourt,
}

/// Terrain descriptor for one hex
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    pub terrain: TerrainKind,
    /// Which half of the court; `None` on the center line
    pub side: Option<Team>,
}

impl Tile {
    /// Terrain for a position according to the fixed court layout
    pub fn for_position(pos: HexPosition) -> Self {
        let terrain = if (pos.r == 0 || pos.r == 13) && pos.q == 2 {
            TerrainKind::Hoop
        } else if pos.r <= 2 || pos.r >= 11 {
            TerrainKind::Paint
        } else if pos.r == 3 || pos.r == 10 {
            TerrainKind::ThreePointLine
        } else if pos.r == CENTER_COURT.r {
            TerrainKind::CenterCourt
        } else {
            TerrainKind::Court
        };

        let side = match pos.r.cmp(&CENTER_COURT.r) {
            std::cmp::Ordering::Less => Some(Team::Home),
            std::cmp::Ordering::Greater => Some(Team::Away),
            std::cmp::Ordering::Equal => None,
        };

        Self { terrain, side }
    }
}

/// What kind of thing occupies a hex
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OccupantKind {
    /// A basketball player
    Player,
    /// A token or other marker placed by an effect
    Marker,
}

/// Something standing on a hex
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Occupant {
    pub kind: OccupantKind,
    pub id: String,
}

impl Occupant {
    pub fn player(id: impl Into<String>) -> Self {
        Self {
            kind: OccupantKind::Player,
            id: id.into(),
        }
    }

    pub fn marker(id: impl Into<String>) -> Self {
        Self {
            kind: OccupantKind::Marker,
            id: id.into(),
        }
    }
}

/// Occupant ids found at more than one position, with every position each
/// was found at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvariantReport {
    pub duplicates: BTreeMap<String, Vec<HexPosition>>,
}

impl fmt::Display for InvariantReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .duplicates
            .iter()
            .map(|(id, positions)| {
                let positions: Vec<String> = positions.iter().map(ToString::to_string).collect();
                format!("{} at {}", id, positions.join(", "))
            })
            .collect();
        write!(f, "duplicate occupants: {}", parts.join("; "))
    }
}

/// The court: fixed terrain plus whatever is standing on it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "BoardJson", from = "BoardJson")]
pub struct Board {
    /// Terrain indexed by position, computed once at creation
    tiles: HashMap<HexPosition, Tile>,
    /// Occupant standing on each position
    occupants: HashMap<HexPosition, Occupant>,
}

impl Board {
    /// Create an empty court with the standard layout
    pub fn new() -> Self {
        let tiles = all_positions()
            .map(|pos| (pos, Tile::for_position(pos)))
            .collect();
        Self {
            tiles,
            occupants: HashMap::new(),
        }
    }

    pub fn get_tile(&self, pos: &HexPosition) -> Option<&Tile> {
        self.tiles.get(pos)
    }

    pub fn occupant_at(&self, pos: &HexPosition) -> Option<&Occupant> {
        self.occupants.get(pos)
    }

    pub fn is_occupied(&self, pos: &HexPosition) -> bool {
        self.occupants.contains_key(pos)
    }

    /// Place an occupant, replacing whatever stood there.
    ///
    /// This does not check whether the same id already stands elsewhere;
    /// `check_invariants` reports that.
    pub fn set_occupant(&mut self, pos: HexPosition, occupant: Occupant) {
        self.occupants.insert(pos, occupant);
    }

    pub fn remove_occupant(&mut self, pos: &HexPosition) -> Option<Occupant> {
        self.occupants.remove(pos)
    }

    /// Move whatever stands on `from` to `to`. Returns false if `from` is empty.
    pub fn move_occupant(&mut self, from: &HexPosition, to: HexPosition) -> bool {
        match self.occupants.remove(from) {
            Some(occupant) => {
                self.occupants.insert(to, occupant);
                true
            }
            None => false,
        }
    }

    /// Position of the occupant with the given id (linear scan)
    pub fn find_occupant(&self, id: &str) -> Option<HexPosition> {
        self.occupants
            .iter()
            .find(|(_, occupant)| occupant.id == id)
            .map(|(pos, _)| *pos)
    }

    /// All occupied positions and what stands on them, in position order
    pub fn occupants(&self) -> Vec<(HexPosition, &Occupant)> {
        let mut entries: Vec<_> = self.occupants.iter().map(|(pos, o)| (*pos, o)).collect();
        entries.sort_by_key(|(pos, _)| *pos);
        entries
    }

    /// True iff nothing stands strictly between `from` and `to` on the line
    /// connecting them.
    pub fn path_clear(&self, from: &HexPosition, to: &HexPosition) -> bool {
        let line = from.line_to(to);
        if line.len() <= 2 {
            return true;
        }
        line[1..line.len() - 1]
            .iter()
            .all(|pos| !self.is_occupied(pos))
    }

    /// Check that no occupant id stands on more than one position.
    pub fn check_invariants(&self) -> Option<InvariantReport> {
        let mut by_id: BTreeMap<String, Vec<HexPosition>> = BTreeMap::new();
        for (pos, occupant) in &self.occupants {
            by_id.entry(occupant.id.clone()).or_default().push(*pos);
        }

        let duplicates: BTreeMap<String, Vec<HexPosition>> = by_id
            .into_iter()
            .filter(|(_, positions)| positions.len() >= 2)
            .map(|(id, mut positions)| {
                positions.sort();
                (id, positions)
            })
            .collect();

        if duplicates.is_empty() {
            None
        } else {
            Some(InvariantReport { duplicates })
        }
    }

    /// Export to a JSON-friendly format (position-keyed maps cannot be JSON
    /// object keys)
    pub fn to_json_friendly(&self) -> BoardJson {
        BoardJson {
            occupants: self
                .occupants()
                .into_iter()
                .map(|(pos, occupant)| OccupantJson {
                    q: pos.q,
                    r: pos.r,
                    kind: occupant.kind,
                    id: occupant.id.clone(),
                })
                .collect(),
        }
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

/// JSON-friendly board; terrain is implied by the fixed layout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardJson {
    pub occupants: Vec<OccupantJson>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OccupantJson {
    pub q: i32,
    pub r: i32,
    pub kind: OccupantKind,
    pub id: String,
}

impl From<Board> for BoardJson {
    fn from(board: Board) -> Self {
        board.to_json_friendly()
    }
}

impl From<BoardJson> for Board {
    fn from(json: BoardJson) -> Self {
        let mut board = Board::new();
        for entry in json.occupants {
            board.set_occupant(
                HexPosition::new(entry.q, entry.r),
                Occupant {
                    kind: entry.kind,
                    id: entry.id,
                },
            );
        }
        board
    }
}
