//! # Billbook Architecture
//!
//! Billbook keeps clients and invoices in flat JSON files and exposes a fixed set of
//! callable operations over them. It is a library first; the binary is one transport
//! (a line-delimited JSON-RPC loop, plus one-shot calls) in front of it.
//!
//! ## Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Binary (main.rs, args.rs)                                  │
//! │  - Parses arguments, sets up logging, picks the data dir    │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Transport (server.rs) and Tool Surface (tools.rs)          │
//! │  - Operation names, argument decoding, JSON results         │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  API Layer (api.rs)                                         │
//! │  - Thin facade over commands, per-collection write locks    │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Command Layer (commands/*.rs)                              │
//! │  - Business rules, result envelopes                         │
//! │  - Validation through model.rs and validation.rs            │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Storage Layer (store/)                                     │
//! │  - Abstract DataStore trait, damage-tolerant loading        │
//! │  - FileStore (production), InMemoryStore (testing)          │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Failure Classes
//!
//! 1. **Expected failures** (bad input, unknown ids, bad status) are values: an
//!    [`commands::Envelope`] with `success: false` and a readable message.
//! 2. **Damaged storage** is repaired on load and logged; callers never see it.
//! 3. **Write failures** (disk full, permissions) propagate as
//!    [`error::BillbookError`] and abort the operation.
//!
//! ## Module Overview
//!
//! - [`api`]: The API facade, entry point for all operations
//! - [`commands`]: Business logic for each operation
//! - [`store`]: Storage abstraction and implementations
//! - [`model`]: Entities (`Client`, `Invoice`, `InvoiceItem`, `DashboardStats`)
//! - [`validation`]: Field-level validation and error aggregation
//! - [`tools`]: Named tools with JSON arguments and results
//! - [`server`]: JSON-RPC loop over stdin/stdout
//! - [`config`]: Configuration management
//! - [`error`]: Error types

pub mod api;
pub mod commands;
pub mod config;
pub mod error;
pub mod model;
pub mod server;
pub mod store;
pub mod tools;
pub mod validation;

#[cfg(test)]
pub mod test_utils;
