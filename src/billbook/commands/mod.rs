//! # Operations
//!
//! One function per callable operation, grouped by collection. Each takes the store,
//! reads what it needs, and returns a serializable result.
//!
//! Mutating and lookup operations return an [`Envelope`]: `{"success": true, ...}` with
//! the payload flattened in, or `{"success": false, "error": "..."}`. Expected failures
//! (validation, unknown ids, bad status) are envelopes, never `Err`. `Err` is reserved
//! for write failures in the store.
//!
//! Listing operations return their payload directly (`{"count": n, ...}`); an empty
//! match is a normal result.
//!
//! Ids arrive from callers as any JSON integer. An id that cannot name a stored record
//! (zero or negative) is simply not found.
//!
//! Locking is the caller's job: see [`crate::api::BillbookApi`].

use crate::model::{Client, DashboardStats, Invoice};
use serde::Serialize;
use std::fmt;

pub mod clients;
pub mod dashboard;
pub mod invoices;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(flatten)]
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            error: None,
            data: Some(data),
        }
    }

    pub fn fail(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            data: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }

    pub fn into_data(self) -> Option<T> {
        self.data
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientPayload {
    pub client: Client,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvoicePayload {
    pub invoice: Invoice,
}

/// An invoice together with the client it references, if that client still exists.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvoiceDetail {
    pub invoice: Invoice,
    pub client: Option<Client>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientList {
    pub count: usize,
    pub clients: Vec<Client>,
}

impl From<Vec<Client>> for ClientList {
    fn from(clients: Vec<Client>) -> Self {
        Self {
            count: clients.len(),
            clients,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvoiceList {
    pub count: usize,
    pub total_amount: f64,
    pub invoices: Vec<Invoice>,
}

impl From<Vec<Invoice>> for InvoiceList {
    fn from(invoices: Vec<Invoice>) -> Self {
        Self {
            count: invoices.len(),
            total_amount: invoices.iter().fold(0.0, |sum, i| sum + i.total),
            invoices,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub statistics: DashboardStats,
    pub recent_invoices: Vec<Invoice>,
    pub recent_clients: Vec<Client>,
}

/// The stored id a caller-supplied id refers to, if it can refer to one at all.
pub fn stored_id(id: i64) -> Option<u64> {
    u64::try_from(id).ok().filter(|id| *id > 0)
}

pub fn client_not_found(id: impl fmt::Display) -> String {
    format!("Client with ID {} not found", id)
}

pub fn invoice_not_found(id: impl fmt::Display) -> String {
    format!("Invoice with ID {} not found", id)
}
