//! Square observation windows cut from the grid.
//!
//! Near an edge the clipped source rectangle is copied into the top-left
//! corner of the window; the window is never re-centred, so cells past the
//! world edge stay `Empty` at the bottom/right of the buffer.

use std::fmt;

use serde::Serialize;

use crate::components::{Position, Tag};
use crate::error::WorldError;
use crate::spatial::GridStore;

pub const DEFAULT_OBSERVATION_RADIUS: usize = 1;

/// Window side length for a given radius, or `None` when it overflows.
pub fn window_size_for(radius: usize) -> Option<usize> {
    radius.checked_mul(2)?.checked_add(1)
}

/// Validate a window side length and return its cell count.
pub fn window_cells(window_size: usize) -> Result<usize, WorldError> {
    if window_size == 0 || window_size % 2 == 0 {
        return Err(WorldError::InvalidWindowSize(window_size));
    }
    window_size
        .checked_mul(window_size)
        .ok_or(WorldError::InvalidWindowSize(window_size))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Observation {
    size: usize,
    cells: Vec<Tag>,
}

impl Observation {
    fn empty(size: usize) -> Result<Self, WorldError> {
        let len = window_cells(size)?;
        let mut cells = Vec::new();
        cells
            .try_reserve_exact(len)
            .map_err(|_| WorldError::InvalidWindowSize(size))?;
        cells.resize(len, Tag::Empty);
        Ok(Self { size, cells })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Tag at window offset `(i, j)`, where `i` runs along x and `j` along y.
    pub fn get(&self, i: usize, j: usize) -> Option<Tag> {
        if i < self.size && j < self.size {
            Some(self.cells[i * self.size + j])
        } else {
            None
        }
    }

    fn set(&mut self, i: usize, j: usize, tag: Tag) {
        self.cells[i * self.size + j] = tag;
    }

    /// Nested `[i][j]` integer codes.
    pub fn to_codes(&self) -> Vec<Vec<u8>> {
        self.cells
            .chunks(self.size)
            .map(|column| column.iter().map(|tag| tag.code()).collect())
            .collect()
    }
}

impl fmt::Display for Observation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for j in 0..self.size {
            let row: String = (0..self.size)
                .map(|i| self.cells[i * self.size + j].glyph())
                .collect();
            writeln!(f, "{row}")?;
        }
        Ok(())
    }
}

pub fn observe(
    grid: &GridStore,
    center: Position,
    window_size: usize,
) -> Result<Observation, WorldError> {
    window_cells(window_size)?;
    if !grid.contains(center) {
        return Err(WorldError::out_of_bounds(
            center.x as i64,
            center.y as i64,
            grid.width(),
            grid.height(),
        ));
    }

    let half = u32::try_from(window_size / 2).unwrap_or(u32::MAX);
    let x_min = center.x.saturating_sub(half);
    let x_max = center.x.saturating_add(half).saturating_add(1).min(grid.width());
    let y_min = center.y.saturating_sub(half);
    let y_max = center.y.saturating_add(half).saturating_add(1).min(grid.height());

    let mut window = Observation::empty(window_size)?;
    for (x, y, tag) in grid.cells_in(x_min, x_max, y_min, y_max) {
        window.set((x - x_min) as usize, (y - y_min) as usize, tag);
    }
    Ok(window)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_with(entities: &[(Tag, u32, u32)]) -> GridStore {
        let mut grid = GridStore::new(5, 5).unwrap();
        for (tag, x, y) in entities {
            grid.insert(*tag, Position::new(*x, *y)).unwrap();
        }
        grid
    }

    #[test]
    fn centred_window_copies_neighbourhood() {
        let grid = grid_with(&[
            (Tag::Agent, 2, 2),
            (Tag::Food, 1, 1),
            (Tag::Wall, 3, 3),
        ]);
        let window = observe(&grid, Position::new(2, 2), 3).unwrap();

        assert_eq!(
            window.to_codes(),
            vec![vec![2, 0, 0], vec![0, 1, 0], vec![0, 0, 3]]
        );
    }

    #[test]
    fn edge_window_is_clipped_into_the_top_left_corner() {
        let grid = grid_with(&[(Tag::Agent, 0, 0), (Tag::Wall, 1, 1)]);
        let window = observe(&grid, Position::new(0, 0), 3).unwrap();

        assert_eq!(window.get(0, 0), Some(Tag::Agent));
        assert_eq!(window.get(1, 1), Some(Tag::Wall));
        for k in 0..3 {
            assert_eq!(window.get(2, k), Some(Tag::Empty));
            assert_eq!(window.get(k, 2), Some(Tag::Empty));
        }
    }

    #[test]
    fn far_edge_window_keeps_source_order() {
        let grid = grid_with(&[(Tag::Agent, 4, 4), (Tag::Food, 3, 4)]);
        let window = observe(&grid, Position::new(4, 4), 3).unwrap();

        // Source columns 3..5 land in window columns 0..2.
        assert_eq!(window.get(0, 1), Some(Tag::Food));
        assert_eq!(window.get(1, 1), Some(Tag::Agent));
        let empty = (0..3)
            .flat_map(|i| (0..3).map(move |j| (i, j)))
            .filter(|&(i, j)| window.get(i, j) == Some(Tag::Empty))
            .count();
        assert_eq!(empty, 7);
    }

    #[test]
    fn even_window_sizes_are_rejected() {
        let grid = grid_with(&[]);
        assert_eq!(
            observe(&grid, Position::new(0, 0), 4),
            Err(WorldError::InvalidWindowSize(4))
        );
        assert!(observe(&grid, Position::new(0, 0), 0).is_err());
    }

    #[test]
    fn radius_maps_to_odd_window() {
        assert_eq!(window_size_for(DEFAULT_OBSERVATION_RADIUS), Some(3));
        assert_eq!(window_size_for(0), Some(1));
        assert_eq!(window_size_for(3), Some(7));
        assert_eq!(window_size_for(usize::MAX / 2 + 1), None);
    }

    #[test]
    fn oversized_windows_are_rejected() {
        let grid = grid_with(&[(Tag::Agent, 0, 0)]);
        let size = usize::MAX / 2;
        assert_eq!(
            observe(&grid, Position::new(0, 0), size),
            Err(WorldError::InvalidWindowSize(size))
        );
    }

    #[test]
    fn display_renders_rows_by_y() {
        let grid = grid_with(&[(Tag::Agent, 2, 2), (Tag::Food, 3, 1)]);
        let window = observe(&grid, Position::new(2, 2), 3).unwrap();
        assert_eq!(window.to_string(), "..F\n.A.\n...\n");
    }
}
