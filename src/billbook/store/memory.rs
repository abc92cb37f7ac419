use super::recovery::{decode_state, encode_state};
use super::{Collection, CollectionState, DataStore, Record};
use crate::error::Result;
use parking_lot::Mutex;
use std::collections::HashMap;

/// In-memory storage for testing and development.
/// Does NOT persist data.
///
/// Documents are kept serialized, so loads go through the same recovery path as
/// files on disk.
#[derive(Default)]
pub struct InMemoryStore {
    documents: Mutex<HashMap<Collection, String>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a collection with arbitrary text, damaged or not.
    pub fn with_raw(self, collection: Collection, raw: impl Into<String>) -> Self {
        self.documents.lock().insert(collection, raw.into());
        self
    }

    pub fn raw(&self, collection: Collection) -> Option<String> {
        self.documents.lock().get(&collection).cloned()
    }
}

impl DataStore for InMemoryStore {
    fn load<R: Record>(&self) -> CollectionState<R> {
        let raw = self.raw(R::COLLECTION);
        decode_state(raw.as_deref())
    }

    fn save<R: Record>(&self, state: &CollectionState<R>) -> Result<()> {
        let content = encode_state(state)?;
        self.documents.lock().insert(R::COLLECTION, content);
        Ok(())
    }
}

// --- Test Fixtures ---

#[cfg(any(test, feature = "test_utils"))]
pub mod fixtures {
    use super::*;
    use crate::model::{Client, Invoice, InvoiceItem, InvoiceStatus, NewClient};

    pub struct StoreFixture {
        pub store: InMemoryStore,
    }

    impl Default for StoreFixture {
        fn default() -> Self {
            Self::new()
        }
    }

    impl StoreFixture {
        pub fn new() -> Self {
            Self {
                store: InMemoryStore::new(),
            }
        }

        /// Adds a client with an explicit creation time.
        pub fn with_client(self, name: &str, company: Option<&str>, created_at: &str) -> Self {
            let mut state: CollectionState<Client> = self.store.load();
            let mut input = NewClient::new(name, format!("{}@example.com", slug(name)));
            input.company = company.map(str::to_string);
            state.insert_with(|id| {
                input
                    .validate()
                    .unwrap()
                    .into_client(id, created_at.to_string())
            });
            self.store.save(&state).unwrap();
            self
        }

        /// Adds an invoice with a single line worth `total`.
        pub fn with_invoice(
            self,
            client_id: u64,
            total: f64,
            status: InvoiceStatus,
            created_at: &str,
        ) -> Self {
            let mut state: CollectionState<Invoice> = self.store.load();
            state.insert_with(|id| Invoice {
                id,
                client_id,
                client_name: format!("Client {client_id}"),
                items: vec![InvoiceItem::new("Services", 1.0, total).unwrap()],
                status,
                notes: None,
                created_at: created_at.to_string(),
                due_date: None,
                total,
                extra: Default::default(),
            });
            self.store.save(&state).unwrap();
            self
        }
    }

    fn slug(name: &str) -> String {
        name.to_lowercase()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect()
    }
}
