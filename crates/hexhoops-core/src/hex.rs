//! Hex coordinate system for the court.
//!
//! Positions are stored as odd-column offset coordinates `(q, r)`:
//! - `q` is the row, `0..BOARD_WIDTH`
//! - `r` is the column, `0..BOARD_HEIGHT`
//! - odd columns are drawn half a hex lower than even columns
//!
//! Distance, lines and rounding are computed in cube coordinates, where the
//! arithmetic is uniform, and converted back to offset coordinates.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of rows on the court
pub const BOARD_WIDTH: i32 = 5;

/// Number of columns on the court
pub const BOARD_HEIGHT: i32 = 14;

/// Neighbor offsets `(dq, dr)` for hexes in an even column
const EVEN_COLUMN_OFFSETS: [(i32, i32); 6] = [(0, 1), (-1, 1), (-1, 0), (-1, -1), (0, -1), (1, 0)];

/// Neighbor offsets `(dq, dr)` for hexes in an odd column
const ODD_COLUMN_OFFSETS: [(i32, i32); 6] = [(1, 1), (0, 1), (-1, 0), (0, -1), (1, -1), (1, 0)];

/// Offset coordinate of a hex on the court.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub struct HexPosition {
    /// Row, `0..BOARD_WIDTH`
    pub q: i32,
    /// Column, `0..BOARD_HEIGHT`
    pub r: i32,
}

impl HexPosition {
    /// Create a new position (not checked against the board bounds)
    pub const fn new(q: i32, r: i32) -> Self {
        Self { q, r }
    }

    /// Whether this position lies on the 5x14 court
    pub const fn is_valid(&self) -> bool {
        self.q >= 0 && self.q < BOARD_WIDTH && self.r >= 0 && self.r < BOARD_HEIGHT
    }

    /// Convert to cube coordinates
    pub fn to_cube(self) -> CubeCoord {
        let x = self.r;
        let z = self.q - (self.r - (self.r & 1)) / 2;
        CubeCoord::new(x, -x - z, z)
    }

    /// The neighboring hexes that lie on the court
    pub fn neighbors(&self) -> Vec<HexPosition> {
        let offsets = if self.r & 1 == 0 {
            &EVEN_COLUMN_OFFSETS
        } else {
            &ODD_COLUMN_OFFSETS
        };
        offsets
            .iter()
            .map(|(dq, dr)| HexPosition::new(self.q + dq, self.r + dr))
            .filter(HexPosition::is_valid)
            .collect()
    }

    /// Distance to another hex (in hex steps)
    pub fn distance_to(&self, other: &HexPosition) -> u32 {
        self.to_cube().distance_to(&other.to_cube())
    }

    /// Every valid position within `n` steps of this one (including itself)
    pub fn range(&self, n: u32) -> Vec<HexPosition> {
        all_positions()
            .filter(|pos| self.distance_to(pos) <= n)
            .collect()
    }

    /// The hexes a straight line from `self` to `other` passes through,
    /// both endpoints included.
    pub fn line_to(&self, other: &HexPosition) -> Vec<HexPosition> {
        let steps = self.distance_to(other);
        if steps == 0 {
            return vec![*self];
        }

        let a = self.to_cube();
        let b = other.to_cube();
        (0..=steps)
            .map(|i| {
                let t = f64::from(i) / f64::from(steps);
                CubeCoord::round(
                    lerp(a.x, b.x, t),
                    lerp(a.y, b.y, t),
                    lerp(a.z, b.z, t),
                )
                .to_offset()
            })
            .collect()
    }

    /// Convert to pixel coordinates (center of hex).
    /// Uses flat-top orientation with the given hex size (radius).
    pub fn to_pixel(&self, hex_size: f64) -> (f64, f64) {
        let x = hex_size * 1.5 * f64::from(self.r);
        let y = hex_size * 3.0_f64.sqrt() * (f64::from(self.q) + 0.5 * f64::from(self.r & 1));
        (x, y)
    }

    /// Convert from pixel coordinates to the hex containing that point
    pub fn from_pixel(x: f64, y: f64, hex_size: f64) -> Self {
        let fx = (2.0 / 3.0 * x) / hex_size;
        let fz = (-1.0 / 3.0 * x + 3.0_f64.sqrt() / 3.0 * y) / hex_size;
        CubeCoord::round(fx, -fx - fz, fz).to_offset()
    }
}

impl fmt::Display for HexPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.q, self.r)
    }
}

/// Cube coordinate; always satisfies `x + y + z == 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CubeCoord {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl CubeCoord {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Distance to another cube coordinate (in hex steps)
    pub fn distance_to(&self, other: &CubeCoord) -> u32 {
        let dx = (self.x - other.x).abs();
        let dy = (self.y - other.y).abs();
        let dz = (self.z - other.z).abs();
        ((dx + dy + dz) / 2) as u32
    }

    /// Back to odd-column offset coordinates
    pub fn to_offset(self) -> HexPosition {
        let r = self.x;
        let q = self.z + (self.x - (self.x & 1)) / 2;
        HexPosition::new(q, r)
    }

    /// Round fractional cube coordinates to the nearest hex.
    ///
    /// The component with the largest rounding error is recomputed from the
    /// other two; ties go to x, then y, then z.
    pub fn round(x: f64, y: f64, z: f64) -> Self {
        let mut rx = x.round();
        let mut ry = y.round();
        let mut rz = z.round();

        let x_diff = (rx - x).abs();
        let y_diff = (ry - y).abs();
        let z_diff = (rz - z).abs();

        if x_diff > y_diff && x_diff > z_diff {
            rx = -ry - rz;
        } else if y_diff > z_diff {
            ry = -rx - rz;
        } else {
            rz = -rx - ry;
        }

        Self::new(rx as i32, ry as i32, rz as i32)
    }
}

fn lerp(a: i32, b: i32, t: f64) -> f64 {
    f64::from(a) + (f64::from(b) - f64::from(a)) * t
}

/// Every position on the court, row-major
pub fn all_positions() -> impl Iterator<Item = HexPosition> {
    (0..BOARD_WIDTH).flat_map(|q| (0..BOARD_HEIGHT).map(move |r| HexPosition::new(q, r)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_bounds() {
        assert!(HexPosition::new(0, 0).is_valid());
        assert!(HexPosition::new(4, 13).is_valid());
        assert!(!HexPosition::new(5, 0).is_valid());
        assert!(!HexPosition::new(0, 14).is_valid());
        assert!(!HexPosition::new(-1, 3).is_valid());
        assert_eq!(all_positions().count(), 70);
    }

    #[test]
    fn test_interior_hex_has_six_neighbors() {
        for center in [HexPosition::new(2, 6), HexPosition::new(2, 7)] {
            let neighbors = center.neighbors();
            let unique: HashSet<_> = neighbors.iter().collect();
            assert_eq!(unique.len(), 6);

            for neighbor in &neighbors {
                assert_eq!(center.distance_to(neighbor), 1);
            }
        }
    }

    #[test]
    fn test_corner_neighbors_are_filtered() {
        let corner = HexPosition::new(0, 0);
        let neighbors = corner.neighbors();
        assert!(neighbors.iter().all(HexPosition::is_valid));
        assert_eq!(neighbors.len(), 2);
    }

    #[test]
    fn test_odd_column_shifts_down() {
        // (2,5) is in an odd column, so its right-hand neighbors are rows 2 and 3
        let neighbors = HexPosition::new(2, 5).neighbors();
        assert!(neighbors.contains(&HexPosition::new(2, 6)));
        assert!(neighbors.contains(&HexPosition::new(3, 6)));
        assert!(!neighbors.contains(&HexPosition::new(1, 6)));
    }

    #[test]
    fn test_distance() {
        let a = HexPosition::new(2, 3);
        assert_eq!(a.distance_to(&a), 0);

        let b = HexPosition::new(2, 5);
        assert_eq!(a.distance_to(&b), 2);
        assert_eq!(b.distance_to(&a), 2);

        assert_eq!(HexPosition::new(2, 5).distance_to(&HexPosition::new(1, 7)), 2);
        assert_eq!(HexPosition::new(2, 0).distance_to(&HexPosition::new(2, 13)), 13);
    }

    #[test]
    fn test_distance_symmetric_across_court() {
        for a in all_positions() {
            for b in all_positions() {
                assert_eq!(a.distance_to(&b), b.distance_to(&a));
            }
        }
    }

    #[test]
    fn test_range() {
        let center = HexPosition::new(2, 6);
        assert_eq!(center.range(0), vec![center]);
        assert_eq!(center.range(1).len(), 7);
        assert!(center.range(2).iter().all(|p| center.distance_to(p) <= 2));
    }

    #[test]
    fn test_line_to_self_is_singleton() {
        let a = HexPosition::new(1, 1);
        assert_eq!(a.line_to(&a), vec![a]);
    }

    #[test]
    fn test_line_endpoints_and_length() {
        let a = HexPosition::new(2, 2);
        let b = HexPosition::new(2, 8);
        let line = a.line_to(&b);

        assert_eq!(line.len(), a.distance_to(&b) as usize + 1);
        assert_eq!(line.first(), Some(&a));
        assert_eq!(line.last(), Some(&b));

        // Consecutive cells are adjacent
        for pair in line.windows(2) {
            assert_eq!(pair[0].distance_to(&pair[1]), 1);
        }
    }

    #[test]
    fn test_cube_round_keeps_invariant() {
        let c = CubeCoord::round(0.4, -0.3, -0.1);
        assert_eq!(c.x + c.y + c.z, 0);
    }

    #[test]
    fn test_pixel_round_trip() {
        for original in all_positions() {
            let (x, y) = original.to_pixel(30.0);
            let recovered = HexPosition::from_pixel(x, y, 30.0);
            assert_eq!(original, recovered);
        }
    }
}
