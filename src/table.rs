//! A fixed-size table of opened devices.
//!
//! Each [`Access`] occupies one cell for its whole life, and is addressed by that cell's index. Freed cells
//! are reused by later inserts, lowest index first.

use crate::access::{Access, AccessError};

pub struct AccessTable {
    cells: Box<[Option<Access>]>,
}
impl AccessTable {
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            cells: std::iter::repeat_with(|| None).take(capacity).collect(),
        }
    }
    /// Fill the lowest free cell with the record built by `make`, which is told the cell's index.
    ///
    /// # Errors
    /// [`AccessError::TableFull`] if there's no free cell, or whatever `make` fails with.
    pub fn insert_with(
        &mut self,
        make: impl FnOnce(usize) -> Result<Access, AccessError>,
    ) -> Result<usize, AccessError> {
        let (index, cell) = self
            .cells
            .iter_mut()
            .enumerate()
            .find(|(_, cell)| cell.is_none())
            .ok_or(AccessError::TableFull)?;
        *cell = Some(make(index)?);
        Ok(index)
    }
    /// # Errors
    /// [`AccessError::InvalidCell`] if nothing is open in `cell`.
    pub fn get(&self, cell: usize) -> Result<&Access, AccessError> {
        self.cells
            .get(cell)
            .and_then(Option::as_ref)
            .ok_or(AccessError::InvalidCell(cell))
    }
    /// # Errors
    /// [`AccessError::InvalidCell`] if nothing is open in `cell`.
    pub fn get_mut(&mut self, cell: usize) -> Result<&mut Access, AccessError> {
        self.cells
            .get_mut(cell)
            .and_then(Option::as_mut)
            .ok_or(AccessError::InvalidCell(cell))
    }
    /// Take the record out of its cell, freeing the cell. Dropping the record closes its context.
    ///
    /// # Errors
    /// [`AccessError::InvalidCell`] if nothing is open in `cell`.
    pub fn remove(&mut self, cell: usize) -> Result<Access, AccessError> {
        self.cells
            .get_mut(cell)
            .and_then(Option::take)
            .ok_or(AccessError::InvalidCell(cell))
    }
    pub fn iter(&self) -> impl Iterator<Item = &Access> {
        self.cells.iter().flatten()
    }
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Access> {
        self.cells.iter_mut().flatten()
    }
    /// Number of occupied cells.
    #[must_use]
    pub fn len(&self) -> usize {
        self.iter().count()
    }
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.cells.len()
    }
}
