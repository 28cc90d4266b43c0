//! The ordered page collection: single source of truth for the working
//! document
//!
//! Ingestion appends whole batches, the grid reorders, rotates and removes,
//! export only reads. Every mutation either succeeds completely or leaves
//! the collection untouched.

use crate::command::PageCommand;
use crate::error::PageFlowError;
use crate::page::{PageEntry, PageId, Rotation};
use std::collections::HashSet;

#[derive(Debug, Default)]
pub struct PageCollection {
    entries: Vec<PageEntry>,
}

impl PageCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[PageEntry] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &PageEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn ids(&self) -> Vec<PageId> {
        self.entries.iter().map(PageEntry::id).collect()
    }

    pub fn get(&self, id: PageId) -> Option<&PageEntry> {
        self.entries.iter().find(|e| e.id() == id)
    }

    pub fn position(&self, id: PageId) -> Option<usize> {
        self.entries.iter().position(|e| e.id() == id)
    }

    fn require(&self, id: PageId) -> Result<usize, PageFlowError> {
        self.position(id).ok_or(PageFlowError::UnknownPage(id))
    }

    /// Append a batch of entries in one step
    ///
    /// If any id collides with an existing entry (or another entry of the
    /// batch) nothing is appended.
    pub fn append(&mut self, batch: Vec<PageEntry>) -> Result<usize, PageFlowError> {
        let mut seen: HashSet<PageId> = self.entries.iter().map(PageEntry::id).collect();
        for entry in &batch {
            if !seen.insert(entry.id()) {
                return Err(PageFlowError::DuplicatePage(entry.id()));
            }
        }

        let added = batch.len();
        self.entries.extend(batch);
        tracing::debug!(added, total = self.entries.len(), "appended page batch");
        Ok(added)
    }

    /// Move `from` into the slot currently held by `to`
    ///
    /// Entries between the two slots shift by one, like dragging a card
    /// across a grid.
    pub fn reorder(&mut self, from: PageId, to: PageId) -> Result<(), PageFlowError> {
        let old_index = self.require(from)?;
        let new_index = self.require(to)?;
        if old_index != new_index {
            let entry = self.entries.remove(old_index);
            self.entries.insert(new_index, entry);
        }
        Ok(())
    }

    /// Apply a complete new ordering
    pub fn set_order(&mut self, ids: &[PageId]) -> Result<(), PageFlowError> {
        if ids.len() != self.entries.len() {
            return Err(PageFlowError::InvalidOrder(format!(
                "expected {} ids, got {}",
                self.entries.len(),
                ids.len()
            )));
        }

        let mut seen = HashSet::with_capacity(ids.len());
        let mut indices = Vec::with_capacity(ids.len());
        for &id in ids {
            if !seen.insert(id) {
                return Err(PageFlowError::InvalidOrder(format!("duplicate id {}", id)));
            }
            indices.push(self.require(id)?);
        }

        let mut slots: Vec<Option<PageEntry>> = self.entries.drain(..).map(Some).collect();
        self.entries = indices
            .into_iter()
            .filter_map(|index| slots[index].take())
            .collect();
        Ok(())
    }

    /// Turn one entry a quarter turn clockwise; returns its new rotation
    pub fn rotate(&mut self, id: PageId) -> Result<Rotation, PageFlowError> {
        let index = self.require(id)?;
        Ok(self.entries[index].rotate_cw())
    }

    /// Remove exactly one entry
    ///
    /// Dropping the returned entry releases the source file (and its
    /// preview) once no other entry refers to it.
    pub fn remove(&mut self, id: PageId) -> Result<PageEntry, PageFlowError> {
        let index = self.require(id)?;
        Ok(self.entries.remove(index))
    }

    /// Remove every entry; returns how many were removed
    pub fn clear(&mut self) -> usize {
        let removed = self.entries.len();
        self.entries.clear();
        removed
    }

    pub fn apply(&mut self, command: PageCommand) -> Result<(), PageFlowError> {
        match command {
            PageCommand::Reorder { from, to } => self.reorder(from, to),
            PageCommand::Rotate { id } => self.rotate(id).map(|_| ()),
            PageCommand::Delete { id } => self.remove(id).map(|_| ()),
            PageCommand::SetOrder { ids } => self.set_order(&ids),
            PageCommand::Clear => {
                self.clear();
                Ok(())
            }
        }
    }
}
