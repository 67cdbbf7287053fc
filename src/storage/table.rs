use crate::core::{MoatError, Result};
use crate::model::Entity;
use std::collections::HashMap;

/// Default upper bound on records per store.
pub const DEFAULT_MAX_SIZE: usize = 1000;

/// uid-keyed record table with a hard capacity.
///
/// Entities go in and come out by value; callers never get a reference to
/// a stored record.
#[derive(Debug)]
pub struct StoreTable {
    rows: HashMap<String, Entity>,
    max_size: usize,
}

impl StoreTable {
    pub fn new(max_size: usize) -> Self {
        Self {
            rows: HashMap::new(),
            max_size,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Insert a new record; fails on a duplicate uid or a full table.
    pub fn insert(&mut self, entity: Entity) -> Result<Entity> {
        let uid = required_uid(&entity)?;
        if self.rows.contains_key(&uid) {
            return Err(MoatError::DuplicateEntry(uid));
        }
        if self.rows.len() >= self.max_size {
            return Err(MoatError::CapacityExceeded(self.max_size));
        }
        let stored = entity.clone();
        self.rows.insert(uid, entity);
        Ok(stored)
    }

    /// Replace the record at the entity's uid, inserting it when absent.
    pub fn replace(&mut self, entity: Entity) -> Result<Entity> {
        let uid = required_uid(&entity)?;
        if !self.rows.contains_key(&uid) && self.rows.len() >= self.max_size {
            return Err(MoatError::CapacityExceeded(self.max_size));
        }
        let stored = entity.clone();
        self.rows.insert(uid, entity);
        Ok(stored)
    }

    /// Copy the named fields onto an existing record.
    pub fn update_fields(&mut self, entity: &Entity, fields: &[String]) -> Result<Entity> {
        let uid = required_uid(entity)?;
        let current = self
            .rows
            .get_mut(&uid)
            .ok_or(MoatError::MissingEntry(uid))?;
        current.copy_fields_from(entity, fields);
        Ok(current.clone())
    }

    pub fn remove(&mut self, uid: &str) -> Result<Entity> {
        self.rows
            .remove(uid)
            .ok_or_else(|| MoatError::MissingEntry(uid.to_string()))
    }

    pub fn get(&self, uid: &str) -> Result<Entity> {
        self.rows
            .get(uid)
            .cloned()
            .ok_or_else(|| MoatError::MissingEntry(uid.to_string()))
    }

    pub fn uids(&self) -> Vec<String> {
        self.rows.keys().cloned().collect()
    }
}

impl Default for StoreTable {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SIZE)
    }
}

fn required_uid(entity: &Entity) -> Result<String> {
    entity
        .uid()
        .filter(|uid| !uid.is_empty())
        .map(str::to_string)
        .ok_or_else(|| MoatError::MissingArgument("entity.uid".to_string()))
}
