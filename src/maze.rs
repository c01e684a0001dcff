use std::collections::BTreeSet;
use std::fmt;

use crate::types::{Direction, Vec2};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TileKind {
    Empty,
    Wall,
    Pellet,
    PowerPellet,
    Hazard,
    Shortcut,
    Spawn,
}

impl TileKind {
    pub fn is_wall(self) -> bool {
        matches!(self, Self::Wall)
    }

    pub fn is_collectible(self) -> bool {
        matches!(self, Self::Pellet | Self::PowerPellet)
    }

    pub fn from_char(ch: char) -> Option<Self> {
        match ch {
            '#' => Some(Self::Wall),
            '.' => Some(Self::Pellet),
            'o' => Some(Self::PowerPellet),
            ' ' | 'P' => Some(Self::Empty),
            '^' => Some(Self::Hazard),
            '=' => Some(Self::Shortcut),
            'R' => Some(Self::Spawn),
            _ => None,
        }
    }

    pub fn to_char(self) -> char {
        match self {
            Self::Empty => ' ',
            Self::Wall => '#',
            Self::Pellet => '.',
            Self::PowerPellet => 'o',
            Self::Hazard => '^',
            Self::Shortcut => '=',
            Self::Spawn => 'R',
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MazeError {
    Empty,
    RaggedRow {
        row: usize,
        expected: usize,
        actual: usize,
    },
    UnknownTile {
        row: usize,
        col: usize,
        ch: char,
    },
    BadEdge {
        line: usize,
    },
    EdgeNotAdjacent {
        a: Vec2,
        b: Vec2,
    },
    EdgeOutOfBounds {
        a: Vec2,
        b: Vec2,
    },
}

impl fmt::Display for MazeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "maze has no rows or no walkable tile"),
            Self::RaggedRow {
                row,
                expected,
                actual,
            } => write!(f, "row {row} has {actual} tiles, expected {expected}"),
            Self::UnknownTile { row, col, ch } => {
                write!(f, "unknown tile {ch:?} at row {row}, column {col}")
            }
            Self::BadEdge { line } => write!(f, "malformed !block directive on line {line}"),
            Self::EdgeNotAdjacent { a, b } => write!(
                f,
                "blocked edge ({},{})-({},{}) does not join adjacent tiles",
                a.x, a.y, b.x, b.y
            ),
            Self::EdgeOutOfBounds { a, b } => write!(
                f,
                "blocked edge ({},{})-({},{}) leaves the grid",
                a.x, a.y, b.x, b.y
            ),
        }
    }
}

impl std::error::Error for MazeError {}

const CLASSIC_LAYOUT: &str = "\
###########
#P..#.#...#
#.#.#.#.#.#
#.#o....#.#
#.#######.#
#...#.#...#
###.#R#.###
#o..R...R.#
###########
!block 5,3 6,3
";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Maze {
    pub width: i32,
    pub height: i32,
    cells: Vec<Vec<TileKind>>,
    blocked_edges: BTreeSet<(Vec2, Vec2)>,
    pub player_start: Option<Vec2>,
}

impl Maze {
    pub fn from_cells(cells: Vec<Vec<TileKind>>) -> Result<Self, MazeError> {
        let Some(first) = cells.first() else {
            return Err(MazeError::Empty);
        };
        let expected = first.len();
        if expected == 0 {
            return Err(MazeError::Empty);
        }
        for (row, line) in cells.iter().enumerate() {
            if line.len() != expected {
                return Err(MazeError::RaggedRow {
                    row,
                    expected,
                    actual: line.len(),
                });
            }
        }
        Ok(Self {
            width: expected as i32,
            height: cells.len() as i32,
            cells,
            blocked_edges: BTreeSet::new(),
            player_start: None,
        })
    }

    /// `!block x1,y1 x2,y2` lines close the edge between two adjacent tiles.
    pub fn parse(text: &str) -> Result<Self, MazeError> {
        let mut rows = Vec::new();
        let mut player_start = None;
        let mut edges = Vec::new();
        let mut blank_after_rows = false;

        for (line_no, line) in text.lines().enumerate() {
            if let Some(rest) = line.strip_prefix("!block") {
                let (a, b) = parse_edge(rest).ok_or(MazeError::BadEdge { line: line_no + 1 })?;
                edges.push((a, b));
                continue;
            }
            if line.is_empty() {
                blank_after_rows |= !rows.is_empty();
                continue;
            }

            let row_idx = rows.len();
            if blank_after_rows {
                let expected = rows.first().map(Vec::len).unwrap_or(0);
                return Err(MazeError::RaggedRow {
                    row: row_idx,
                    expected,
                    actual: 0,
                });
            }
            let mut row = Vec::with_capacity(line.len());
            for (col, ch) in line.chars().enumerate() {
                let kind = TileKind::from_char(ch).ok_or(MazeError::UnknownTile {
                    row: row_idx,
                    col,
                    ch,
                })?;
                if ch == 'P' && player_start.is_none() {
                    player_start = Some(Vec2::new(col as i32, row_idx as i32));
                }
                row.push(kind);
            }
            rows.push(row);
        }

        let mut maze = Self::from_cells(rows)?;
        maze.player_start = player_start;
        for (a, b) in edges {
            maze.block_edge(a, b)?;
        }
        Ok(maze)
    }

    pub fn classic() -> Self {
        match Self::parse(CLASSIC_LAYOUT) {
            Ok(maze) => maze,
            Err(error) => unreachable!("built-in layout is valid: {error}"),
        }
    }

    pub fn in_bounds(&self, tile: Vec2) -> bool {
        tile.x >= 0 && tile.y >= 0 && tile.x < self.width && tile.y < self.height
    }

    pub fn get(&self, tile: Vec2) -> Option<TileKind> {
        if !self.in_bounds(tile) {
            return None;
        }
        self.cells
            .get(tile.y as usize)
            .and_then(|row| row.get(tile.x as usize))
            .copied()
    }

    pub fn is_walkable(&self, tile: Vec2) -> bool {
        self.get(tile).map(|kind| !kind.is_wall()).unwrap_or(false)
    }

    pub fn block_edge(&mut self, a: Vec2, b: Vec2) -> Result<(), MazeError> {
        if !self.in_bounds(a) || !self.in_bounds(b) {
            return Err(MazeError::EdgeOutOfBounds { a, b });
        }
        if (a.x - b.x).abs() + (a.y - b.y).abs() != 1 {
            return Err(MazeError::EdgeNotAdjacent { a, b });
        }
        self.blocked_edges.insert(edge_key(a, b));
        Ok(())
    }

    pub fn is_edge_blocked(&self, a: Vec2, b: Vec2) -> bool {
        self.blocked_edges.contains(&edge_key(a, b))
    }

    pub fn blocked_edges(&self) -> impl Iterator<Item = &(Vec2, Vec2)> {
        self.blocked_edges.iter()
    }

    pub fn can_move_between(&self, from: Vec2, to: Vec2) -> bool {
        self.is_walkable(to) && !self.is_edge_blocked(from, to)
    }

    pub fn can_move(&self, tile: Vec2, dir: Direction) -> bool {
        self.can_move_between(tile, tile.neighbor(dir))
    }

    pub fn open_directions(&self, tile: Vec2) -> Vec<Direction> {
        Direction::ALL
            .into_iter()
            .filter(|dir| self.can_move(tile, *dir))
            .collect()
    }

    /// More than two non-wall neighbours. Edge overrides are not counted.
    pub fn is_intersection(&self, tile: Vec2) -> bool {
        Direction::ALL
            .into_iter()
            .filter(|dir| self.is_walkable(tile.neighbor(*dir)))
            .count()
            > 2
    }

    pub fn consume(&mut self, tile: Vec2) -> Option<TileKind> {
        if !self.in_bounds(tile) {
            return None;
        }
        let cell = self
            .cells
            .get_mut(tile.y as usize)
            .and_then(|row| row.get_mut(tile.x as usize))?;
        if !cell.is_collectible() {
            return None;
        }
        let taken = *cell;
        *cell = TileKind::Empty;
        Some(taken)
    }

    pub fn collectibles_left(&self) -> usize {
        self.cells
            .iter()
            .flat_map(|row| row.iter())
            .filter(|kind| kind.is_collectible())
            .count()
    }

    pub fn tiles_of(&self, kind: TileKind) -> Vec<Vec2> {
        let mut out = Vec::new();
        for (y, row) in self.cells.iter().enumerate() {
            for (x, cell) in row.iter().enumerate() {
                if *cell == kind {
                    out.push(Vec2::new(x as i32, y as i32));
                }
            }
        }
        out
    }

    pub fn robot_spawns(&self) -> Vec<Vec2> {
        self.tiles_of(TileKind::Spawn)
    }

    pub fn first_walkable(&self) -> Option<Vec2> {
        for (y, row) in self.cells.iter().enumerate() {
            for (x, cell) in row.iter().enumerate() {
                if !cell.is_wall() {
                    return Some(Vec2::new(x as i32, y as i32));
                }
            }
        }
        None
    }

    pub fn rows(&self) -> Vec<String> {
        self.cells
            .iter()
            .map(|row| row.iter().map(|kind| kind.to_char()).collect::<String>())
            .collect()
    }
}

fn edge_key(a: Vec2, b: Vec2) -> (Vec2, Vec2) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

fn parse_edge(rest: &str) -> Option<(Vec2, Vec2)> {
    let mut parts = rest.split_whitespace();
    let a = parse_tile(parts.next()?)?;
    let b = parse_tile(parts.next()?)?;
    if parts.next().is_some() {
        return None;
    }
    Some((a, b))
}

fn parse_tile(raw: &str) -> Option<Vec2> {
    let (x, y) = raw.split_once(',')?;
    Some(Vec2::new(x.trim().parse().ok()?, y.trim().parse().ok()?))
}
