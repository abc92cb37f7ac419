//! # API Facade
//!
//! The API layer is a **thin facade** over the command layer and the single entry point
//! for every operation, whichever transport is in front of it.
//!
//! ## Role and Responsibilities
//!
//! The API facade:
//! - **Dispatches** to the appropriate command function
//! - **Serializes writers** per collection (see below)
//! - **Supplies configuration** the commands need (e.g. the dashboard's recent limit)
//!
//! Business rules live in `commands/*.rs`; storage behavior lives in `store/`.
//!
//! ## Generic Over DataStore
//!
//! `BillbookApi<S: DataStore>` is generic over the storage backend:
//! - Production: `BillbookApi<FileStore>`
//! - Testing: `BillbookApi<InMemoryStore>`
//!
//! ## Locking
//!
//! Every mutating operation is a load → mutate → save cycle. Two overlapping cycles on
//! the same collection would assign the same id twice or lose an update, so each
//! collection has its own mutex held for the whole cycle. The collections are
//! independent: a client write never waits on an invoice write. Reads take no lock,
//! since every save replaces a document whole.

use crate::commands::{clients, dashboard, invoices};
use crate::config::BillbookConfig;
use crate::error::Result;
use crate::model::NewClient;
use crate::store::DataStore;
use parking_lot::Mutex;

pub use crate::commands::clients::ClientSearch;
pub use crate::commands::invoices::{InvoiceFilter, NewInvoice};
pub use crate::commands::{
    ClientList, ClientPayload, Dashboard, Envelope, InvoiceDetail, InvoiceList, InvoicePayload,
};

/// The main API facade for billbook operations.
///
/// All methods take `&self`, so one instance can be shared across threads.
pub struct BillbookApi<S: DataStore> {
    store: S,
    config: BillbookConfig,
    clients_lock: Mutex<()>,
    invoices_lock: Mutex<()>,
}

impl<S: DataStore> BillbookApi<S> {
    pub fn new(store: S, config: BillbookConfig) -> Self {
        Self {
            store,
            config,
            clients_lock: Mutex::new(()),
            invoices_lock: Mutex::new(()),
        }
    }

    pub fn add_client(&self, input: NewClient) -> Result<Envelope<ClientPayload>> {
        let _guard = self.clients_lock.lock();
        clients::add(&self.store, input)
    }

    pub fn search_clients(&self, filter: &ClientSearch) -> ClientList {
        clients::search(&self.store, filter)
    }

    pub fn get_client(&self, client_id: i64) -> Envelope<ClientPayload> {
        clients::get(&self.store, client_id)
    }

    pub fn list_all_clients(&self) -> ClientList {
        clients::list_all(&self.store)
    }

    pub fn create_invoice(&self, input: NewInvoice) -> Result<Envelope<InvoicePayload>> {
        let _guard = self.invoices_lock.lock();
        invoices::create(&self.store, input)
    }

    pub fn get_invoice(&self, invoice_id: i64) -> Envelope<InvoiceDetail> {
        invoices::get(&self.store, invoice_id)
    }

    pub fn list_invoices(&self, filter: &InvoiceFilter) -> InvoiceList {
        invoices::list(&self.store, filter)
    }

    pub fn update_invoice_status(
        &self,
        invoice_id: i64,
        status: &str,
    ) -> Result<Envelope<InvoicePayload>> {
        let _guard = self.invoices_lock.lock();
        invoices::update_status(&self.store, invoice_id, status)
    }

    pub fn dashboard(&self) -> Dashboard {
        dashboard::run(&self.store, self.config.recent_limit)
    }

    pub fn config(&self) -> &BillbookConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}
