//! # Storage Layer
//!
//! Clients and invoices live in two independent collections. Each collection is one
//! document holding its records and the counter used to assign the next id:
//!
//! ```text
//! data/
//! ├── clients.json     # { "clients":  [...], "next_id": 4 }
//! ├── invoices.json    # { "invoices": [...], "next_id": 9 }
//! └── config.json      # optional, see config.rs
//! ```
//!
//! The [`DataStore`] trait hides where those documents live:
//!
//! - [`fs::FileStore`]: production storage, one JSON file per collection, written
//!   atomically (temp file, then rename).
//! - [`memory::InMemoryStore`]: keeps the serialized documents in memory for tests.
//!
//! ## Availability Over Strictness
//!
//! `load` never fails. A missing document is an empty collection, and a damaged one is
//! repaired as far as possible (see [`recovery`]): records are kept whenever the record
//! list itself is readable, while a bad counter is simply recomputed. A record that
//! does not decode is carried through untouched and written back on the next save.
//! Damage is logged with `tracing` and otherwise invisible to callers.
//!
//! `save` does propagate I/O failures. There is no recovery strategy for a full disk.
//!
//! ## Locking
//!
//! The store does no locking of its own. [`crate::api::BillbookApi`] serializes every
//! load → mutate → save cycle per collection.

use crate::error::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fmt;

pub mod fs;
pub mod memory;
pub mod recovery;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Clients,
    Invoices,
}

impl Collection {
    /// Key under which the record list is stored.
    pub fn key(&self) -> &'static str {
        match self {
            Collection::Clients => "clients",
            Collection::Invoices => "invoices",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// An entity persisted in one of the collections.
pub trait Record: Serialize + DeserializeOwned + Clone {
    const COLLECTION: Collection;

    fn id(&self) -> u64;
}

impl Record for crate::model::Client {
    const COLLECTION: Collection = Collection::Clients;

    fn id(&self) -> u64 {
        self.id
    }
}

impl Record for crate::model::Invoice {
    const COLLECTION: Collection = Collection::Invoices;

    fn id(&self) -> u64 {
        self.id
    }
}

/// The full contents of one collection.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionState<R> {
    pub records: Vec<R>,
    pub next_id: u64,
    /// Stored entries that did not decode, with their position in the stored list.
    pub unreadable: Vec<(usize, Value)>,
}

impl<R> Default for CollectionState<R> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            next_id: 1,
            unreadable: Vec::new(),
        }
    }
}

impl<R: Record> CollectionState<R> {
    pub fn new(records: Vec<R>, next_id: u64) -> Self {
        Self {
            records,
            next_id,
            unreadable: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn find(&self, id: u64) -> Option<&R> {
        self.records.iter().find(|r| r.id() == id)
    }

    pub fn find_mut(&mut self, id: u64) -> Option<&mut R> {
        self.records.iter_mut().find(|r| r.id() == id)
    }

    /// Appends a record built with the next id and advances the counter.
    pub fn insert_with(&mut self, build: impl FnOnce(u64) -> R) -> &R {
        let id = self.next_id;
        self.records.push(build(id));
        self.next_id += 1;
        &self.records[self.records.len() - 1]
    }

    /// Counter value implied by the records alone.
    pub fn derived_next_id(&self) -> u64 {
        self.records.iter().map(Record::id).max().unwrap_or(0) + 1
    }
}

/// Abstract interface for collection persistence.
pub trait DataStore {
    /// Current state of the collection. Never fails; see [`recovery`].
    fn load<R: Record>(&self) -> CollectionState<R>;

    /// Overwrites the collection with `state`.
    fn save<R: Record>(&self, state: &CollectionState<R>) -> Result<()>;

    /// Looks a record up by id. Absence is `None`, not an error.
    fn find_by_id<R: Record>(&self, id: u64) -> Option<R> {
        self.load::<R>().records.into_iter().find(|r| r.id() == id)
    }
}
