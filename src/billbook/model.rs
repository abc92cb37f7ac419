//! # Domain Model
//!
//! Persisted entities are [`Client`] and [`Invoice`] (with its [`InvoiceItem`] lines);
//! [`DashboardStats`] is derived on demand and never stored.
//!
//! Ids are assigned by the storage layer from a per-collection counter and never change.
//! The only field mutated after creation is [`Invoice::status`].
//!
//! ## Construction
//!
//! Input is validated before anything touches storage:
//!
//! - [`NewClient::validate`] checks `name` and `email` and reports every violation.
//! - [`InvoiceItem::from_value`] reads one loosely-typed line item. Missing fields are
//!   reported before type or range problems.
//! - [`InvoiceStatus`] parses case-insensitively and is stored lowercase.
//!
//! ## Unknown fields
//!
//! Stored records may carry fields this crate does not know about. Each entity keeps
//! them in an `extra` map and writes them back unchanged.
//!
//! ## Timestamps
//!
//! Timestamps are RFC 3339 strings with fixed microsecond precision in UTC (see
//! [`timestamp`]), so ordering them as strings orders them in time.
//!
//! ## Totals
//!
//! [`InvoiceItem::line_total`] is always recomputed from quantity and price. An invoice
//! `total` is computed once at creation and persisted; no operation edits items.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::validation::{self, ValidationErrors};

/// Current time in the persisted timestamp format.
pub fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    pub id: u64,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Client fields as supplied by a caller, before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewClient {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
}

impl NewClient {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            ..Self::default()
        }
    }

    pub fn with_company(mut self, company: impl Into<String>) -> Self {
        self.company = Some(company.into());
        self
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    pub fn validate(self) -> Result<ValidClient, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self.name.is_empty() {
            errors.add("name", validation::MSG_EMPTY);
        }
        if !validation::is_valid_email(&self.email) {
            errors.add("email", validation::MSG_BAD_EMAIL);
        }
        errors.finish(ValidClient(self))
    }
}

/// A [`NewClient`] that passed validation and only lacks an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidClient(NewClient);

impl ValidClient {
    pub fn into_client(self, id: u64, now: String) -> Client {
        let NewClient {
            name,
            email,
            phone,
            address,
            company,
        } = self.0;
        Client {
            id,
            name,
            email,
            phone,
            address,
            company,
            created_at: now.clone(),
            updated_at: now,
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceItem {
    pub description: String,
    pub quantity: f64,
    pub unit_price: f64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Why a loosely-typed line item could not become an [`InvoiceItem`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemError {
    Missing(Vec<&'static str>),
    Invalid(ValidationErrors),
}

impl InvoiceItem {
    pub const REQUIRED_FIELDS: [&'static str; 3] = ["description", "quantity", "unit_price"];

    pub fn new(
        description: impl Into<String>,
        quantity: f64,
        unit_price: f64,
    ) -> Result<Self, ValidationErrors> {
        let description = description.into();
        let mut errors = ValidationErrors::new();
        if description.is_empty() {
            errors.add("description", validation::MSG_EMPTY);
        }
        check_quantity(&mut errors, quantity);
        check_unit_price(&mut errors, unit_price);
        if errors.is_empty() {
            check_line_total(&mut errors, quantity, unit_price);
        }
        errors.finish(Self {
            description,
            quantity,
            unit_price,
            extra: Map::new(),
        })
    }

    /// Builds an item from a JSON object such as `{"description": "A", "quantity": 2,
    /// "unit_price": 10}`. Anything other than an object counts as missing every field.
    pub fn from_value(value: &Value) -> Result<Self, ItemError> {
        let missing: Vec<&'static str> = Self::REQUIRED_FIELDS
            .into_iter()
            .filter(|f| value.get(f).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(ItemError::Missing(missing));
        }

        let mut errors = ValidationErrors::new();
        let description = validation::required_text(&mut errors, "description", &value["description"]);
        if let Some(q) = validation::number(&mut errors, "quantity", &value["quantity"]) {
            check_quantity(&mut errors, q);
        }
        if let Some(p) = validation::number(&mut errors, "unit_price", &value["unit_price"]) {
            check_unit_price(&mut errors, p);
        }
        if !errors.is_empty() {
            return Err(ItemError::Invalid(errors));
        }

        let quantity = value_as_f64(&value["quantity"]);
        let unit_price = value_as_f64(&value["unit_price"]);
        check_line_total(&mut errors, quantity, unit_price);
        if !errors.is_empty() {
            return Err(ItemError::Invalid(errors));
        }

        Ok(Self {
            description,
            quantity,
            unit_price,
            extra: Map::new(),
        })
    }

    pub fn line_total(&self) -> f64 {
        self.quantity * self.unit_price
    }
}

fn check_quantity(errors: &mut ValidationErrors, quantity: f64) {
    if quantity <= 0.0 || quantity.is_nan() {
        errors.add("quantity", validation::MSG_NOT_POSITIVE);
    }
}

fn check_unit_price(errors: &mut ValidationErrors, unit_price: f64) {
    if unit_price < 0.0 || unit_price.is_nan() {
        errors.add("unit_price", validation::MSG_NEGATIVE);
    }
}

// JSON has no representation for an infinite amount.
fn check_line_total(errors: &mut ValidationErrors, quantity: f64, unit_price: f64) {
    if !(quantity * unit_price).is_finite() {
        errors.add("line_total", validation::MSG_OUT_OF_RANGE);
    }
}

// Only called once `validation::number` accepted the value.
fn value_as_f64(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or_default(),
        Value::String(s) => s.trim().parse().unwrap_or_default(),
        _ => 0.0,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    #[default]
    Draft,
    Sent,
    Paid,
    Overdue,
}

impl InvoiceStatus {
    pub const ALL: [InvoiceStatus; 4] = [
        InvoiceStatus::Draft,
        InvoiceStatus::Sent,
        InvoiceStatus::Paid,
        InvoiceStatus::Overdue,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Draft => "draft",
            InvoiceStatus::Sent => "sent",
            InvoiceStatus::Paid => "paid",
            InvoiceStatus::Overdue => "overdue",
        }
    }

    /// Sent but not yet paid, whether or not it is late.
    pub fn is_pending(&self) -> bool {
        matches!(self, InvoiceStatus::Sent | InvoiceStatus::Overdue)
    }

    /// The accepted values as a bracketed list: `['draft', 'sent', 'paid', 'overdue']`.
    pub fn allowed_values() -> String {
        let quoted = Self::ALL
            .iter()
            .map(|s| format!("'{}'", s.as_str()))
            .collect::<Vec<_>>()
            .join(", ");
        format!("[{}]", quoted)
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidStatus(pub String);

impl fmt::Display for InvalidStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Invalid status. Must be one of: {}",
            InvoiceStatus::allowed_values()
        )
    }
}

impl FromStr for InvoiceStatus {
    type Err = InvalidStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_lowercase();
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == lower)
            .ok_or_else(|| InvalidStatus(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: u64,
    pub client_id: u64,
    /// Client name as it was when the invoice was created.
    #[serde(default)]
    pub client_name: String,
    pub items: Vec<InvoiceItem>,
    #[serde(default)]
    pub status: InvoiceStatus,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub total: f64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Invoice {
    pub fn items_total(items: &[InvoiceItem]) -> f64 {
        items.iter().map(InvoiceItem::line_total).sum()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub total_clients: usize,
    pub total_invoices: usize,
    pub total_revenue: f64,
    pub pending_invoices: usize,
    pub paid_invoices: usize,
    pub draft_invoices: usize,
}

impl DashboardStats {
    pub fn compute(clients: &[Client], invoices: &[Invoice]) -> Self {
        let mut stats = DashboardStats {
            total_clients: clients.len(),
            total_invoices: invoices.len(),
            ..Default::default()
        };
        for invoice in invoices {
            match invoice.status {
                InvoiceStatus::Paid => {
                    stats.paid_invoices += 1;
                    stats.total_revenue += invoice.total;
                }
                InvoiceStatus::Draft => stats.draft_invoices += 1,
                InvoiceStatus::Sent | InvoiceStatus::Overdue => stats.pending_invoices += 1,
            }
        }
        stats
    }
}
