//! # Records and Slot Tables
//!
//! A [`Record`] stores one string value per schema field. A [`SlotTable`] is a
//! fixed-length array of optional records: the slot count is chosen at
//! construction and never changes, and any slot may be empty.

use crate::error::{Result, StateError};
use crate::fields::{FieldSchema, PlayerField, ServerField, TeamField};
use gsemu_core::EntityKind;
use std::marker::PhantomData;

/// Largest slot count a table may have
///
/// The query protocol carries slot positions in a single byte, and the
/// encoder may need to emit a cursor equal to the slot count.
pub const MAX_SLOTS: usize = u8::MAX as usize;

/// One record: a value for every field of schema `F`
///
/// Unset fields hold the empty string, which is also how they go on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record<F: FieldSchema> {
    values: Box<[String]>,
    schema: PhantomData<F>,
}

/// Server header record
pub type ServerInfo = Record<ServerField>;

/// Player record
pub type Player = Record<PlayerField>;

/// Team record
pub type Team = Record<TeamField>;

impl<F: FieldSchema> Record<F> {
    /// Create a record with every field unset
    pub fn new() -> Self {
        Self {
            values: vec![String::new(); F::count()].into_boxed_slice(),
            schema: PhantomData,
        }
    }

    #[inline]
    pub fn get(&self, field: F) -> &str {
        &self.values[field.index()]
    }

    #[inline]
    pub fn set(&mut self, field: F, value: impl Into<String>) {
        self.values[field.index()] = value.into();
    }

    /// Builder-style `set`
    pub fn with(mut self, field: F, value: impl Into<String>) -> Self {
        self.set(field, value);
        self
    }

    /// Look a value up by wire name
    pub fn get_by_name(&self, name: &str) -> Result<&str> {
        let field = Self::resolve(name)?;
        Ok(self.get(field))
    }

    /// Overwrite a value by wire name
    ///
    /// # Errors
    /// - `UnknownField` if `name` is not in the schema
    /// - `InvalidValue` if `value` contains a NUL byte
    pub fn set_by_name(&mut self, name: &str, value: impl Into<String>) -> Result<()> {
        let field = Self::resolve(name)?;
        let value = checked_value(F::KIND, name, value.into())?;
        self.set(field, value);
        Ok(())
    }

    /// Iterate `(field, value)` pairs in wire order
    pub fn iter(&self) -> impl Iterator<Item = (F, &str)> + '_ {
        F::ALL.iter().map(move |field| (*field, self.get(*field)))
    }

    fn resolve(name: &str) -> Result<F> {
        F::from_name(name).ok_or_else(|| StateError::UnknownField {
            kind: F::KIND,
            name: name.to_string(),
        })
    }
}

impl<F: FieldSchema> Default for Record<F> {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixed-length array of optional records
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotTable<F: FieldSchema> {
    slots: Vec<Option<Record<F>>>,
}

impl<F: FieldSchema> SlotTable<F> {
    /// Create a table of `slots` empty slots
    ///
    /// # Errors
    /// `TooManySlots` if `slots` exceeds [`MAX_SLOTS`]
    pub fn new(slots: usize) -> Result<Self> {
        if slots > MAX_SLOTS {
            return Err(StateError::TooManySlots {
                kind: F::KIND,
                requested: slots,
                max: MAX_SLOTS,
            });
        }
        Ok(Self {
            slots: vec![None; slots],
        })
    }

    /// Table of a length already known to be within [`MAX_SLOTS`]
    pub(crate) fn with_len(slots: usize) -> Self {
        debug_assert!(slots <= MAX_SLOTS);
        Self {
            slots: vec![None; slots.min(MAX_SLOTS)],
        }
    }

    /// Occupy an in-range slot
    pub(crate) fn fill(&mut self, index: usize) {
        if let Some(slot) = self.slots.get_mut(index) {
            slot.get_or_insert_with(Record::new);
        }
    }

    /// Number of slots, occupied or not
    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of occupied slots
    pub fn occupied(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// Record in `index`, if the slot exists and is occupied
    pub fn get(&self, index: usize) -> Option<&Record<F>> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    /// Value of `field` in slot `index`; empty for missing slots
    pub fn value(&self, index: usize, field: F) -> &str {
        self.get(index).map_or("", |record| record.get(field))
    }

    /// Mutable record in slot `index`, creating an empty one if the slot is free
    pub fn occupy(&mut self, index: usize) -> Result<&mut Record<F>> {
        let slots = self.slots.len();
        let slot = self.slots.get_mut(index).ok_or(StateError::SlotOutOfRange {
            kind: F::KIND,
            index,
            slots,
        })?;
        Ok(slot.get_or_insert_with(Record::new))
    }

    /// Place `record` into slot `index`, replacing whatever was there
    pub fn insert(&mut self, index: usize, record: Record<F>) -> Result<()> {
        *self.occupy(index)? = record;
        Ok(())
    }

    /// Empty slot `index`, returning the record it held
    pub fn clear(&mut self, index: usize) -> Result<Option<Record<F>>> {
        let slots = self.slots.len();
        let slot = self.slots.get_mut(index).ok_or(StateError::SlotOutOfRange {
            kind: F::KIND,
            index,
            slots,
        })?;
        Ok(slot.take())
    }
}

/// Reject values that would split into two tokens on the wire
pub(crate) fn checked_value(kind: EntityKind, name: &str, value: String) -> Result<String> {
    if value.contains('\0') {
        return Err(StateError::InvalidValue {
            kind,
            name: name.to_string(),
        });
    }
    Ok(value)
}
