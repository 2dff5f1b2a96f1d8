//! Board model: colors, intersections, adjacency, and mill detection.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::constants::{MILLS, NUM_POINTS, POINTS};

/// A valid intersection, represented as an index into [`POINTS`].
pub type Point = usize;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Blue,
    Orange,
}

impl Color {
    pub const BOTH: [Color; 2] = [Color::Blue, Color::Orange];

    pub fn opponent(self) -> Color {
        match self {
            Color::Blue => Color::Orange,
            Color::Orange => Color::Blue,
        }
    }

    /// Index into per-color arrays (blue = 0, orange = 1).
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Color::Blue => 0,
            Color::Orange => 1,
        }
    }

    /// Token sent to a player to tell it which color it plays.
    pub fn token(self) -> &'static str {
        match self {
            Color::Blue => "blue",
            Color::Orange => "orange",
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Parse an intersection label such as `"d3"` into a [`Point`].
///
/// Returns `None` for labels that are not one of the 24 intersections.
pub fn parse_point(s: &str) -> Option<Point> {
    POINTS.iter().position(|&label| label == s)
}

/// Label of a [`Point`], e.g. `"d3"`.
pub fn str_point(pt: Point) -> &'static str {
    POINTS[pt]
}

/// Mill lines passing through a point (always exactly two).
pub fn mills_through(pt: Point) -> impl Iterator<Item = &'static [Point; 3]> {
    MILLS.iter().filter(move |line| line.contains(&pt))
}

/// Intersections directly connected to `pt`.
pub fn neighbors(pt: Point) -> impl Iterator<Item = Point> {
    mills_through(pt).flat_map(move |line| {
        line.windows(2).filter_map(move |pair| match *pair {
            [a, b] if a == pt => Some(b),
            [a, b] if b == pt => Some(a),
            _ => None,
        })
    })
}

/// Whether two intersections are directly connected.
pub fn is_adjacent(a: Point, b: Point) -> bool {
    neighbors(a).any(|n| n == b)
}

/// Occupancy of the 24 intersections.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Board {
    cells: [Option<Color>; NUM_POINTS],
}

impl Board {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn get(&self, pt: Point) -> Option<Color> {
        self.cells[pt]
    }

    #[inline]
    pub fn set(&mut self, pt: Point, occupant: Option<Color>) {
        self.cells[pt] = occupant;
    }

    #[inline]
    pub fn is_empty_at(&self, pt: Point) -> bool {
        self.cells[pt].is_none()
    }

    /// Number of pieces of `color` on the board.
    pub fn count(&self, color: Color) -> usize {
        self.cells.iter().filter(|&&c| c == Some(color)).count()
    }

    /// Points occupied by `color`.
    pub fn pieces(&self, color: Color) -> impl Iterator<Item = Point> + '_ {
        (0..NUM_POINTS).filter(move |&pt| self.cells[pt] == Some(color))
    }

    /// Empty points.
    pub fn empties(&self) -> impl Iterator<Item = Point> + '_ {
        (0..NUM_POINTS).filter(move |&pt| self.cells[pt].is_none())
    }

    /// Whether `color` would complete a mill by occupying `target`, with
    /// `vacated` (the moving piece's origin, if any) treated as empty.
    ///
    /// Only the lines through `target` are inspected.
    pub fn completes_mill(&self, target: Point, color: Color, vacated: Option<Point>) -> bool {
        mills_through(target).any(|line| {
            line.iter()
                .filter(|&&p| {
                    if p == target {
                        true
                    } else if Some(p) == vacated {
                        false
                    } else {
                        self.cells[p] == Some(color)
                    }
                })
                .count()
                == 3
        })
    }

    /// Whether the piece at `pt` is currently part of a mill.
    pub fn in_mill(&self, pt: Point) -> bool {
        match self.cells[pt] {
            Some(color) => {
                mills_through(pt).any(|line| line.iter().all(|&p| self.cells[p] == Some(color)))
            }
            None => false,
        }
    }

    /// Label to occupant map, for snapshots.
    pub fn snapshot(&self) -> BTreeMap<String, Option<Color>> {
        POINTS
            .iter()
            .zip(self.cells.iter())
            .map(|(label, &c)| (label.to_string(), c))
            .collect()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Rows 7 down to 1, each column printed at its letter's offset.
        for row in (1..=7u8).rev() {
            write!(f, "{row} ")?;
            for col in b'a'..=b'g' {
                let label = format!("{}{}", col as char, row);
                let ch = match parse_point(&label) {
                    Some(pt) => match self.cells[pt] {
                        Some(Color::Blue) => 'B',
                        Some(Color::Orange) => 'O',
                        None => '.',
                    },
                    None => ' ',
                };
                write!(f, "{ch} ")?;
            }
            writeln!(f)?;
        }
        writeln!(f, "  a b c d e f g")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt(s: &str) -> Point {
        parse_point(s).unwrap()
    }

    #[test]
    fn test_parse_str_point_roundtrip() {
        for p in 0..NUM_POINTS {
            assert_eq!(parse_point(str_point(p)), Some(p));
        }
    }

    #[test]
    fn test_invalid_labels() {
        for label in ["a2", "d4", "b1", "g5", "h1", "r0", "", "a", "a10"] {
            assert_eq!(parse_point(label), None, "{label} should be invalid");
        }
        let valid = (b'a'..=b'g')
            .flat_map(|c| (1..=7).map(move |r| format!("{}{}", c as char, r)))
            .filter(|l| parse_point(l).is_some())
            .count();
        assert_eq!(valid, NUM_POINTS);
    }

    #[test]
    fn test_mills_are_straight_lines() {
        for line in MILLS {
            let labels: Vec<&str> = line.iter().map(|&p| str_point(p)).collect();
            let same_col = labels.iter().all(|l| l.as_bytes()[0] == labels[0].as_bytes()[0]);
            let same_row = labels.iter().all(|l| l.as_bytes()[1] == labels[0].as_bytes()[1]);
            assert!(same_col ^ same_row, "{labels:?} is not a line");
        }
    }

    #[test]
    fn test_every_point_on_two_mills() {
        for p in 0..NUM_POINTS {
            assert_eq!(mills_through(p).count(), 2, "{}", str_point(p));
        }
    }

    #[test]
    fn test_neighbors() {
        let mut n: Vec<&str> = neighbors(pt("d2")).map(str_point).collect();
        n.sort();
        assert_eq!(n, vec!["b2", "d1", "d3", "f2"]);

        let mut n: Vec<&str> = neighbors(pt("a1")).map(str_point).collect();
        n.sort();
        assert_eq!(n, vec!["a4", "d1"]);

        // Middle of both of its lines
        let mut n: Vec<&str> = neighbors(pt("d6")).map(str_point).collect();
        n.sort();
        assert_eq!(n, vec!["b6", "d5", "d7", "f6"]);

        // c4 and e4 are not connected across the center
        assert!(!is_adjacent(pt("c4"), pt("e4")));
        assert!(is_adjacent(pt("c4"), pt("b4")));
    }

    #[test]
    fn test_adjacency_is_symmetric() {
        let mut edges = 0;
        for a in 0..NUM_POINTS {
            for b in neighbors(a) {
                assert!(is_adjacent(b, a));
                edges += 1;
            }
        }
        assert_eq!(edges / 2, 32);
    }

    #[test]
    fn test_completes_mill() {
        let mut board = Board::new();
        board.set(pt("a1"), Some(Color::Blue));
        board.set(pt("a4"), Some(Color::Blue));
        assert!(board.completes_mill(pt("a7"), Color::Blue, None));
        assert!(!board.completes_mill(pt("a7"), Color::Orange, None));
        // Sliding a4 up to a7 vacates a4, so no mill
        assert!(!board.completes_mill(pt("a7"), Color::Blue, Some(pt("a4"))));
    }

    #[test]
    fn test_completes_mill_is_local() {
        let mut board = Board::new();
        board.set(pt("a1"), Some(Color::Blue));
        board.set(pt("a4"), Some(Color::Blue));
        let before = board.completes_mill(pt("a7"), Color::Blue, None);
        // Pieces off the lines through a7 do not matter
        for label in ["c3", "e5", "g1", "f4"] {
            board.set(pt(label), Some(Color::Orange));
        }
        assert_eq!(board.completes_mill(pt("a7"), Color::Blue, None), before);
    }

    #[test]
    fn test_in_mill() {
        let mut board = Board::new();
        for label in ["b2", "b4", "b6"] {
            board.set(pt(label), Some(Color::Orange));
        }
        board.set(pt("d2"), Some(Color::Orange));
        assert!(board.in_mill(pt("b4")));
        assert!(board.in_mill(pt("b2")));
        assert!(!board.in_mill(pt("d2")));
        assert!(!board.in_mill(pt("a1")));
    }

    #[test]
    fn test_display() {
        let mut board = Board::new();
        board.set(pt("a7"), Some(Color::Blue));
        board.set(pt("g1"), Some(Color::Orange));
        let s = board.to_string();
        assert!(s.starts_with("7 B     .     . "));
        assert!(s.contains("1 .     .     O "));
    }
}
