//! Grid store and entity index.
//!
//! The dense cell array is the authoritative spatial index; the per-tag
//! position lists mirror it and are kept in insertion order.

use std::collections::HashMap;

use crate::components::{Position, Tag};
use crate::error::WorldError;

pub type CellIndex = usize;

#[derive(Debug, Clone)]
pub struct GridStore {
    width: u32,
    height: u32,
    cells: Vec<Tag>,
    positions: HashMap<Tag, Vec<Position>>,
}

impl GridStore {
    pub fn new(width: u32, height: u32) -> Result<Self, WorldError> {
        if width == 0 || height == 0 {
            return Err(WorldError::InvalidDimensions { width, height });
        }
        Ok(Self {
            width,
            height,
            cells: vec![Tag::Empty; width as usize * height as usize],
            positions: HashMap::new(),
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn contains(&self, pos: Position) -> bool {
        pos.x < self.width && pos.y < self.height
    }

    /// Convert a position to its row-major cell index.
    pub fn pos_to_index(&self, pos: Position) -> Option<CellIndex> {
        if self.contains(pos) {
            Some(pos.y as usize * self.width as usize + pos.x as usize)
        } else {
            None
        }
    }

    fn checked_index(&self, pos: Position) -> Result<CellIndex, WorldError> {
        self.pos_to_index(pos).ok_or_else(|| {
            WorldError::out_of_bounds(pos.x as i64, pos.y as i64, self.width, self.height)
        })
    }

    pub fn get(&self, pos: Position) -> Result<Tag, WorldError> {
        let index = self.checked_index(pos)?;
        Ok(self.cells[index])
    }

    /// Tag at a position that is already known to be in bounds.
    pub(crate) fn tag_at(&self, pos: Position) -> Tag {
        self.pos_to_index(pos)
            .map(|index| self.cells[index])
            .unwrap_or(Tag::Empty)
    }

    pub fn positions_of(&self, tag: Tag) -> &[Position] {
        self.positions
            .get(&tag)
            .map(|list| list.as_slice())
            .unwrap_or(&[])
    }

    /// Write `tag` into the cell and append the position to its list.
    ///
    /// Does not look at the previous occupant; callers clear the cell first.
    pub fn insert(&mut self, tag: Tag, pos: Position) -> Result<(), WorldError> {
        if !tag.is_entity() {
            return Err(WorldError::EmptyTag);
        }
        let index = self.checked_index(pos)?;
        self.cells[index] = tag;
        self.positions.entry(tag).or_default().push(pos);
        Ok(())
    }

    pub fn relocate(&mut self, tag: Tag, from: Position, to: Position) -> Result<(), WorldError> {
        if !tag.is_entity() {
            return Err(WorldError::EmptyTag);
        }
        let from_index = self.checked_index(from)?;
        let to_index = self.checked_index(to)?;
        let slot = self.slot_of(tag, from)?;
        if from_index != to_index && self.cells[to_index] != Tag::Empty {
            return Err(WorldError::InvariantViolation(format!(
                "cannot move {tag:?} onto ({}, {}) occupied by {:?}",
                to.x, to.y, self.cells[to_index]
            )));
        }

        self.cells[from_index] = Tag::Empty;
        self.cells[to_index] = tag;
        let list = self.positions.entry(tag).or_default();
        list.remove(slot);
        list.push(to);
        Ok(())
    }

    pub fn vacate(&mut self, tag: Tag, pos: Position) -> Result<(), WorldError> {
        if !tag.is_entity() {
            return Err(WorldError::EmptyTag);
        }
        let index = self.checked_index(pos)?;
        let slot = self.slot_of(tag, pos)?;
        self.cells[index] = Tag::Empty;
        if let Some(list) = self.positions.get_mut(&tag) {
            list.remove(slot);
        }
        Ok(())
    }

    fn slot_of(&self, tag: Tag, pos: Position) -> Result<usize, WorldError> {
        let slot = self
            .positions_of(tag)
            .iter()
            .position(|candidate| *candidate == pos)
            .ok_or_else(|| {
                WorldError::InvariantViolation(format!(
                    "{tag:?} has no entry at ({}, {})",
                    pos.x, pos.y
                ))
            })?;
        if self.tag_at(pos) != tag {
            return Err(WorldError::InvariantViolation(format!(
                "index lists {tag:?} at ({}, {}) but the cell holds {:?}",
                pos.x,
                pos.y,
                self.tag_at(pos)
            )));
        }
        Ok(slot)
    }

    /// Cells of the rectangle `[x0, x1) x [y0, y1)`, x-major.
    pub(crate) fn cells_in(
        &self,
        x0: u32,
        x1: u32,
        y0: u32,
        y1: u32,
    ) -> impl Iterator<Item = (u32, u32, Tag)> + '_ {
        (x0..x1).flat_map(move |x| (y0..y1).map(move |y| (x, y, self.tag_at(Position { x, y }))))
    }

    /// Audit grid and index agreement.
    pub fn check(&self) -> Result<(), WorldError> {
        let mut indexed = 0usize;
        for (tag, list) in &self.positions {
            if !tag.is_entity() && !list.is_empty() {
                return Err(WorldError::InvariantViolation(
                    "empty tag has indexed positions".into(),
                ));
            }
            for pos in list {
                let cell = self.get(*pos)?;
                if cell != *tag {
                    return Err(WorldError::InvariantViolation(format!(
                        "{tag:?} indexed at ({}, {}) but the cell holds {cell:?}",
                        pos.x, pos.y
                    )));
                }
            }
            indexed += list.len();
        }

        let occupied = self.cells.iter().filter(|tag| tag.is_entity()).count();
        if occupied != indexed {
            return Err(WorldError::InvariantViolation(format!(
                "{occupied} occupied cells but {indexed} indexed positions"
            )));
        }
        Ok(())
    }
}
