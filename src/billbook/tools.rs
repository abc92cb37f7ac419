//! # Tool Surface
//!
//! The externally callable operations, addressed by name with a JSON object of
//! arguments and answering with a JSON value. Callers bind to these names and field
//! names, so they are fixed:
//!
//! | Tool                    | Arguments                                            |
//! |-------------------------|------------------------------------------------------|
//! | `add_client`            | `name`, `email`, `phone?`, `address?`, `company?`    |
//! | `search_clients`        | `query?`, `email?`, `company?`                       |
//! | `get_client`            | `client_id`                                          |
//! | `list_all_clients`      |                                                      |
//! | `create_invoice`        | `client_id`, `items`, `notes?`, `due_date?`, `status?` |
//! | `get_invoice`           | `invoice_id`                                         |
//! | `list_invoices`         | `client_id?`, `status?`                              |
//! | `update_invoice_status` | `invoice_id`, `status`                               |
//! | `dashboard`             |                                                      |
//!
//! Arguments that cannot be decoded into those shapes (a string where an id belongs, a
//! missing required argument) are rejected with [`BillbookError::InvalidArguments`]
//! before any operation runs. Everything past that point answers with the operation's
//! own result shape.

use crate::api::{BillbookApi, ClientSearch, InvoiceFilter, NewInvoice};
use crate::error::{BillbookError, Result};
use crate::model::NewClient;
use crate::store::DataStore;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    AddClient,
    SearchClients,
    GetClient,
    ListAllClients,
    CreateInvoice,
    GetInvoice,
    ListInvoices,
    UpdateInvoiceStatus,
    Dashboard,
}

/// A tool as advertised to callers.
#[derive(Debug, Clone, Serialize)]
pub struct ToolDefinition {
    pub name: &'static str,
    pub description: &'static str,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

#[derive(Debug, Deserialize)]
struct ClientIdArgs {
    client_id: i64,
}

#[derive(Debug, Deserialize)]
struct InvoiceIdArgs {
    invoice_id: i64,
}

#[derive(Debug, Deserialize)]
struct StatusUpdateArgs {
    invoice_id: i64,
    status: String,
}

impl Tool {
    pub const ALL: [Tool; 9] = [
        Tool::AddClient,
        Tool::SearchClients,
        Tool::GetClient,
        Tool::ListAllClients,
        Tool::CreateInvoice,
        Tool::GetInvoice,
        Tool::ListInvoices,
        Tool::UpdateInvoiceStatus,
        Tool::Dashboard,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Tool::AddClient => "add_client",
            Tool::SearchClients => "search_clients",
            Tool::GetClient => "get_client",
            Tool::ListAllClients => "list_all_clients",
            Tool::CreateInvoice => "create_invoice",
            Tool::GetInvoice => "get_invoice",
            Tool::ListInvoices => "list_invoices",
            Tool::UpdateInvoiceStatus => "update_invoice_status",
            Tool::Dashboard => "dashboard",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Tool::AddClient => "Add a new client. Returns the created client with its ID.",
            Tool::SearchClients => {
                "Search clients by name, email, or company (case-insensitive substring match; all given filters must match)."
            }
            Tool::GetClient => "Get a client by ID.",
            Tool::ListAllClients => "List every client with a count.",
            Tool::CreateInvoice => {
                "Create an invoice for an existing client. Each item needs description, quantity, and unit_price. Status defaults to draft."
            }
            Tool::GetInvoice => "Get an invoice by ID together with its client.",
            Tool::ListInvoices => {
                "List invoices, optionally filtered by client ID and status, with the summed total."
            }
            Tool::UpdateInvoiceStatus => "Set an invoice's status: draft, sent, paid, or overdue.",
            Tool::Dashboard => "Overview statistics plus the most recent invoices and clients.",
        }
    }

    pub fn input_schema(&self) -> Value {
        let status = json!({"type": "string", "enum": ["draft", "sent", "paid", "overdue"]});
        match self {
            Tool::AddClient => object(
                json!({
                    "name": {"type": "string", "description": "Client's full name"},
                    "email": {"type": "string", "description": "Client's email address"},
                    "phone": {"type": "string"},
                    "address": {"type": "string"},
                    "company": {"type": "string"}
                }),
                &["name", "email"],
            ),
            Tool::SearchClients => object(
                json!({
                    "query": {"type": "string", "description": "Matched against the name"},
                    "email": {"type": "string"},
                    "company": {"type": "string"}
                }),
                &[],
            ),
            Tool::GetClient => object(json!({"client_id": {"type": "integer"}}), &["client_id"]),
            Tool::ListAllClients | Tool::Dashboard => object(json!({}), &[]),
            Tool::CreateInvoice => object(
                json!({
                    "client_id": {"type": "integer"},
                    "items": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "description": {"type": "string"},
                                "quantity": {"type": "number", "exclusiveMinimum": 0},
                                "unit_price": {"type": "number", "minimum": 0}
                            },
                            "required": ["description", "quantity", "unit_price"]
                        }
                    },
                    "notes": {"type": "string"},
                    "due_date": {"type": "string", "description": "Due date, YYYY-MM-DD"},
                    "status": status
                }),
                &["client_id", "items"],
            ),
            Tool::GetInvoice => {
                object(json!({"invoice_id": {"type": "integer"}}), &["invoice_id"])
            }
            Tool::ListInvoices => object(
                json!({
                    "client_id": {"type": "integer"},
                    "status": {"type": "string"}
                }),
                &[],
            ),
            Tool::UpdateInvoiceStatus => object(
                json!({
                    "invoice_id": {"type": "integer"},
                    "status": status
                }),
                &["invoice_id", "status"],
            ),
        }
    }

    pub fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name(),
            description: self.description(),
            input_schema: self.input_schema(),
        }
    }
}

impl FromStr for Tool {
    type Err = BillbookError;

    fn from_str(s: &str) -> Result<Self> {
        Tool::ALL
            .into_iter()
            .find(|t| t.name() == s)
            .ok_or_else(|| BillbookError::UnknownTool(s.to_string()))
    }
}

fn object(properties: Value, required: &[&str]) -> Value {
    json!({
        "type": "object",
        "properties": properties,
        "required": required
    })
}

pub fn definitions() -> Vec<ToolDefinition> {
    Tool::ALL.iter().map(Tool::definition).collect()
}

fn parse_args<T: DeserializeOwned>(tool: Tool, args: Value) -> Result<T> {
    let args = if args.is_null() { json!({}) } else { args };
    serde_json::from_value(args).map_err(|e| BillbookError::InvalidArguments {
        tool: tool.name().to_string(),
        reason: e.to_string(),
    })
}

/// Runs `tool` with JSON `args` and returns its JSON result.
pub fn call<S: DataStore>(api: &BillbookApi<S>, tool: Tool, args: Value) -> Result<Value> {
    let result = match tool {
        Tool::AddClient => {
            let input: NewClient = parse_args(tool, args)?;
            serde_json::to_value(api.add_client(input)?)?
        }
        Tool::SearchClients => {
            let filter: ClientSearch = parse_args(tool, args)?;
            serde_json::to_value(api.search_clients(&filter))?
        }
        Tool::GetClient => {
            let ClientIdArgs { client_id } = parse_args(tool, args)?;
            serde_json::to_value(api.get_client(client_id))?
        }
        Tool::ListAllClients => serde_json::to_value(api.list_all_clients())?,
        Tool::CreateInvoice => {
            let input: NewInvoice = parse_args(tool, args)?;
            serde_json::to_value(api.create_invoice(input)?)?
        }
        Tool::GetInvoice => {
            let InvoiceIdArgs { invoice_id } = parse_args(tool, args)?;
            serde_json::to_value(api.get_invoice(invoice_id))?
        }
        Tool::ListInvoices => {
            let filter: InvoiceFilter = parse_args(tool, args)?;
            serde_json::to_value(api.list_invoices(&filter))?
        }
        Tool::UpdateInvoiceStatus => {
            let StatusUpdateArgs { invoice_id, status } = parse_args(tool, args)?;
            serde_json::to_value(api.update_invoice_status(invoice_id, &status)?)?
        }
        Tool::Dashboard => serde_json::to_value(api.dashboard())?,
    };
    Ok(result)
}

/// Like [`call`], resolving the tool by name first.
pub fn call_by_name<S: DataStore>(api: &BillbookApi<S>, name: &str, args: Value) -> Result<Value> {
    call(api, name.parse()?, args)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BillbookConfig;
    use crate::store::memory::InMemoryStore;

    fn api() -> BillbookApi<InMemoryStore> {
        BillbookApi::new(InMemoryStore::new(), BillbookConfig::default())
    }

    #[test]
    fn every_tool_round_trips_its_name() {
        for tool in Tool::ALL {
            assert_eq!(tool.name().parse::<Tool>().unwrap(), tool);
            assert_eq!(tool.input_schema()["type"], "object");
        }
        assert!(matches!(
            "delete_client".parse::<Tool>(),
            Err(BillbookError::UnknownTool(_))
        ));
    }

    #[test]
    fn add_client_returns_envelope_shape() {
        let api = api();
        let result = call_by_name(
            &api,
            "add_client",
            json!({"name": "Ann", "email": "ann@example.com", "company": "Acme"}),
        )
        .unwrap();

        assert_eq!(result["success"], true);
        assert_eq!(result["client"]["id"], 1);
        assert_eq!(result["client"]["company"], "Acme");
        assert_eq!(result["client"]["phone"], Value::Null);
    }

    #[test]
    fn validation_failure_is_a_result_not_an_error() {
        let api = api();
        let result =
            call_by_name(&api, "add_client", json!({"name": "", "email": "bad"})).unwrap();
        assert_eq!(result["success"], false);
        assert!(result["error"].as_str().unwrap().contains("email: "));
        assert!(result.get("client").is_none());
    }

    #[test]
    fn undecodable_arguments_are_rejected() {
        let api = api();
        let err = call_by_name(&api, "get_client", json!({"client_id": "one"})).unwrap_err();
        assert!(matches!(err, BillbookError::InvalidArguments { .. }));

        let err = call_by_name(&api, "add_client", json!({"name": "Ann"})).unwrap_err();
        assert!(matches!(err, BillbookError::InvalidArguments { .. }));
    }

    #[test]
    fn negative_ids_are_not_found_envelopes() {
        let api = api();
        let client = call_by_name(&api, "get_client", json!({"client_id": -1})).unwrap();
        assert_eq!(
            client,
            json!({"success": false, "error": "Client with ID -1 not found"})
        );

        let invoice = call_by_name(
            &api,
            "create_invoice",
            json!({"client_id": -1, "items": []}),
        )
        .unwrap();
        assert_eq!(invoice["error"], "Client with ID -1 not found");

        let detail = call_by_name(&api, "get_invoice", json!({"invoice_id": -3})).unwrap();
        assert_eq!(detail["error"], "Invoice with ID -3 not found");

        let updated = call_by_name(
            &api,
            "update_invoice_status",
            json!({"invoice_id": 0, "status": "paid"}),
        )
        .unwrap();
        assert_eq!(updated["error"], "Invoice with ID 0 not found");

        let listed = call_by_name(&api, "list_invoices", json!({"client_id": -1})).unwrap();
        assert_eq!(listed["count"], 0);
    }

    #[test]
    fn list_shapes_have_no_success_flag() {
        let api = api();
        let clients = call_by_name(&api, "list_all_clients", Value::Null).unwrap();
        assert_eq!(clients, json!({"count": 0, "clients": []}));

        let invoices = call_by_name(&api, "list_invoices", json!({})).unwrap();
        assert_eq!(
            invoices,
            json!({"count": 0, "total_amount": 0.0, "invoices": []})
        );
    }

    #[test]
    fn invoice_flow_through_tools() {
        let api = api();
        call_by_name(&api, "add_client", json!({"name": "Ann", "email": "ann@example.com"}))
            .unwrap();
        let created = call_by_name(
            &api,
            "create_invoice",
            json!({
                "client_id": 1,
                "items": [
                    {"description": "A", "quantity": 2, "unit_price": 10},
                    {"description": "B", "quantity": 1, "unit_price": 5}
                ],
                "due_date": "2024-12-31",
                "notes": "Thanks!"
            }),
        )
        .unwrap();
        assert_eq!(created["invoice"]["total"], 25.0);
        assert_eq!(created["invoice"]["status"], "draft");
        assert_eq!(created["invoice"]["client_name"], "Ann");
        assert_eq!(created["invoice"]["due_date"], "2024-12-31");

        let updated = call_by_name(
            &api,
            "update_invoice_status",
            json!({"invoice_id": 1, "status": "PAID"}),
        )
        .unwrap();
        assert_eq!(updated["invoice"]["status"], "paid");

        let detail = call_by_name(&api, "get_invoice", json!({"invoice_id": 1})).unwrap();
        assert_eq!(detail["client"]["name"], "Ann");

        let dashboard = call_by_name(&api, "dashboard", json!({})).unwrap();
        assert_eq!(dashboard["statistics"]["total_revenue"], 25.0);
        assert_eq!(dashboard["statistics"]["paid_invoices"], 1);
        assert_eq!(dashboard["recent_invoices"].as_array().unwrap().len(), 1);
    }
}
