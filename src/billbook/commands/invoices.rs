use super::{
    client_not_found, invoice_not_found, stored_id, Envelope, InvoiceDetail, InvoiceList,
    InvoicePayload,
};
use crate::error::Result;
use crate::model::{timestamp, Client, Invoice, InvoiceItem, InvoiceStatus, ItemError};
use crate::store::{CollectionState, DataStore};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

/// Invoice fields as supplied by a caller. Items stay loosely typed until
/// [`create`] validates them one by one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewInvoice {
    pub client_id: i64,
    pub items: Vec<Value>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// Filters for [`list`]. The status filter is a plain case-insensitive comparison.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceFilter {
    #[serde(default)]
    pub client_id: Option<i64>,
    #[serde(default)]
    pub status: Option<String>,
}

impl InvoiceFilter {
    pub fn matches(&self, invoice: &Invoice) -> bool {
        if let Some(client_id) = self.client_id {
            if stored_id(client_id) != Some(invoice.client_id) {
                return false;
            }
        }
        if let Some(status) = self.status.as_deref().filter(|s| !s.is_empty()) {
            if !invoice.status.as_str().eq_ignore_ascii_case(status) {
                return false;
            }
        }
        true
    }
}

/// Checks run in a fixed order: client, status, item presence, then each item.
pub fn create<S: DataStore>(store: &S, input: NewInvoice) -> Result<Envelope<InvoicePayload>> {
    let Some(client) = stored_id(input.client_id).and_then(|id| store.find_by_id::<Client>(id))
    else {
        return Ok(Envelope::fail(client_not_found(input.client_id)));
    };

    let status = match input.status.as_deref() {
        None => InvoiceStatus::default(),
        Some(raw) => match raw.parse::<InvoiceStatus>() {
            Ok(status) => status,
            Err(e) => return Ok(Envelope::fail(e.to_string())),
        },
    };

    if input.items.is_empty() {
        return Ok(Envelope::fail("At least one invoice item is required"));
    }

    let mut items = Vec::with_capacity(input.items.len());
    for (i, raw) in input.items.iter().enumerate() {
        match InvoiceItem::from_value(raw) {
            Ok(item) => items.push(item),
            Err(ItemError::Missing(fields)) => {
                return Ok(Envelope::fail(format!(
                    "Item {} is missing required fields: {}",
                    i + 1,
                    fields.join(", ")
                )))
            }
            Err(ItemError::Invalid(errors)) => {
                return Ok(Envelope::fail(format!(
                    "Item {} validation failed: {}",
                    i + 1,
                    errors
                )))
            }
        }
    }

    let total = Invoice::items_total(&items);
    if !total.is_finite() {
        return Ok(Envelope::fail("Invoice total is too large"));
    }

    let mut state: CollectionState<Invoice> = store.load();
    let invoice = state
        .insert_with(|id| Invoice {
            id,
            client_id: client.id,
            client_name: client.name,
            items,
            status,
            notes: input.notes,
            created_at: timestamp(),
            due_date: input.due_date,
            total,
            extra: Default::default(),
        })
        .clone();
    store.save(&state)?;

    info!(id = invoice.id, client_id = invoice.client_id, total = invoice.total, "invoice created");
    Ok(Envelope::ok(InvoicePayload { invoice }))
}

pub fn get<S: DataStore>(store: &S, invoice_id: i64) -> Envelope<InvoiceDetail> {
    match stored_id(invoice_id).and_then(|id| store.find_by_id::<Invoice>(id)) {
        Some(invoice) => {
            let client = store.find_by_id::<Client>(invoice.client_id);
            Envelope::ok(InvoiceDetail { invoice, client })
        }
        None => Envelope::fail(invoice_not_found(invoice_id)),
    }
}

pub fn list<S: DataStore>(store: &S, filter: &InvoiceFilter) -> InvoiceList {
    let state: CollectionState<Invoice> = store.load();
    state
        .records
        .into_iter()
        .filter(|i| filter.matches(i))
        .collect::<Vec<_>>()
        .into()
}

/// Status is the only field that changes after creation.
pub fn update_status<S: DataStore>(
    store: &S,
    invoice_id: i64,
    status: &str,
) -> Result<Envelope<InvoicePayload>> {
    let status = match status.parse::<InvoiceStatus>() {
        Ok(status) => status,
        Err(e) => return Ok(Envelope::fail(e.to_string())),
    };

    let mut state: CollectionState<Invoice> = store.load();
    let found = match stored_id(invoice_id) {
        Some(id) => state.find_mut(id),
        None => None,
    };
    let Some(invoice) = found else {
        return Ok(Envelope::fail(invoice_not_found(invoice_id)));
    };
    let previous = invoice.status;
    invoice.status = status;
    let invoice = invoice.clone();
    store.save(&state)?;

    info!(id = invoice_id, from = %previous, to = %status, "invoice status updated");
    Ok(Envelope::ok(InvoicePayload { invoice }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::clients;
    use crate::model::NewClient;
    use crate::store::memory::InMemoryStore;
    use serde_json::json;

    fn store_with_client() -> InMemoryStore {
        let store = InMemoryStore::new();
        clients::add(&store, NewClient::new("Jane Roe", "jane@example.com")).unwrap();
        store
    }

    fn new_invoice(client_id: i64, items: Vec<Value>) -> NewInvoice {
        NewInvoice {
            client_id,
            items,
            ..Default::default()
        }
    }

    fn line(desc: &str, qty: f64, price: f64) -> Value {
        json!({"description": desc, "quantity": qty, "unit_price": price})
    }

    #[test]
    fn total_is_sum_of_line_totals() {
        let store = store_with_client();
        let result = create(
            &store,
            new_invoice(1, vec![line("A", 2.0, 10.0), line("B", 1.0, 5.0)]),
        )
        .unwrap();

        let invoice = result.into_data().unwrap().invoice;
        assert_eq!(invoice.total, 25.0);
        assert_eq!(invoice.id, 1);
        assert_eq!(invoice.status, InvoiceStatus::Draft);
        assert_eq!(invoice.client_name, "Jane Roe");
        assert!(!invoice.created_at.is_empty());
    }

    #[test]
    fn unknown_client_fails_before_anything_else() {
        let store = store_with_client();
        let mut input = new_invoice(9, Vec::new());
        input.status = Some("bogus".into());

        let result = create(&store, input).unwrap();
        assert_eq!(result.error(), Some("Client with ID 9 not found"));
        assert!(store.load::<Invoice>().is_empty());
    }

    #[test]
    fn negative_client_id_is_not_found() {
        let store = store_with_client();
        let result = create(&store, new_invoice(-1, Vec::new())).unwrap();
        assert_eq!(result.error(), Some("Client with ID -1 not found"));
    }

    #[test]
    fn overflowing_amounts_are_rejected_and_nothing_is_stored() {
        let store = store_with_client();
        let result = create(&store, new_invoice(1, vec![line("Huge", 1e200, 1e200)])).unwrap();
        let message = result.error().unwrap();
        assert!(message.starts_with("Item 1 validation failed: line_total: "));

        let lines = vec![line("A", 1.0, f64::MAX), line("B", 1.0, f64::MAX)];
        let result = create(&store, new_invoice(1, lines)).unwrap();
        assert_eq!(result.error(), Some("Invoice total is too large"));
        assert!(store.load::<Invoice>().is_empty());

        create(&store, new_invoice(1, vec![line("A", 2.0, 1e150)])).unwrap();
        let stored = store.raw(crate::store::Collection::Invoices).unwrap();
        assert!(!stored.contains("\"total\": null"));
        assert_eq!(get(&store, 1).into_data().unwrap().invoice.total, 2e150);
    }

    #[test]
    fn status_is_checked_before_items() {
        let store = store_with_client();
        let mut input = new_invoice(1, Vec::new());
        input.status = Some("cancelled".into());

        let result = create(&store, input).unwrap();
        assert!(result.error().unwrap().starts_with("Invalid status"));
    }

    #[test]
    fn status_is_normalized_to_lowercase() {
        let store = store_with_client();
        let mut input = new_invoice(1, vec![line("A", 1.0, 1.0)]);
        input.status = Some("SENT".into());

        let invoice = create(&store, input).unwrap().into_data().unwrap().invoice;
        assert_eq!(invoice.status, InvoiceStatus::Sent);
        let raw = store.raw(crate::store::Collection::Invoices).unwrap();
        assert!(raw.contains("\"status\": \"sent\""));
    }

    #[test]
    fn empty_items_are_rejected() {
        let store = store_with_client();
        let result = create(&store, new_invoice(1, Vec::new())).unwrap();
        assert_eq!(result.error(), Some("At least one invoice item is required"));
    }

    #[test]
    fn item_errors_carry_one_based_index() {
        let store = store_with_client();
        let items = vec![
            line("ok", 1.0, 1.0),
            json!({"description": "no price", "quantity": 1}),
        ];
        let result = create(&store, new_invoice(1, items)).unwrap();
        assert_eq!(
            result.error(),
            Some("Item 2 is missing required fields: unit_price")
        );

        let items = vec![line("", 0.0, -1.0)];
        let result = create(&store, new_invoice(1, items)).unwrap();
        let message = result.error().unwrap();
        assert!(message.starts_with("Item 1 validation failed: "));
        assert!(message.contains("description: "));
        assert!(message.contains("quantity: "));
        assert!(message.contains("unit_price: "));
        assert!(store.load::<Invoice>().is_empty());
    }

    #[test]
    fn client_name_is_a_snapshot() {
        let store = store_with_client();
        create(&store, new_invoice(1, vec![line("A", 1.0, 1.0)])).unwrap();

        let mut clients: CollectionState<Client> = store.load();
        clients.find_mut(1).unwrap().name = "Jane Doe".into();
        store.save(&clients).unwrap();

        let detail = get(&store, 1).into_data().unwrap();
        assert_eq!(detail.invoice.client_name, "Jane Roe");
        assert_eq!(detail.client.unwrap().name, "Jane Doe");
    }

    #[test]
    fn get_tolerates_missing_client() {
        let store = store_with_client();
        create(&store, new_invoice(1, vec![line("A", 1.0, 1.0)])).unwrap();
        store.save(&CollectionState::<Client>::default()).unwrap();

        let detail = get(&store, 1).into_data().unwrap();
        assert!(detail.client.is_none());
        assert_eq!(get(&store, 2).error(), Some("Invoice with ID 2 not found"));
    }

    #[test]
    fn list_filters_and_totals() {
        let store = store_with_client();
        clients::add(&store, NewClient::new("Max", "max@example.com")).unwrap();
        create(&store, new_invoice(1, vec![line("A", 1.0, 100.0)])).unwrap();
        create(&store, new_invoice(2, vec![line("B", 2.0, 30.0)])).unwrap();
        let mut paid = new_invoice(1, vec![line("C", 1.0, 7.5)]);
        paid.status = Some("paid".into());
        create(&store, paid).unwrap();

        let all = list(&store, &InvoiceFilter::default());
        assert_eq!(all.count, 3);
        assert_eq!(all.total_amount, 167.5);

        let for_jane = list(
            &store,
            &InvoiceFilter {
                client_id: Some(1),
                status: Some("DRAFT".into()),
            },
        );
        assert_eq!(for_jane.count, 1);
        assert_eq!(for_jane.total_amount, 100.0);

        let none = list(
            &store,
            &InvoiceFilter {
                status: Some("void".into()),
                ..Default::default()
            },
        );
        assert_eq!(none.count, 0);
        assert_eq!(none.total_amount, 0.0);

        let negative = list(
            &store,
            &InvoiceFilter {
                client_id: Some(-1),
                ..Default::default()
            },
        );
        assert_eq!(negative.count, 0);
    }

    #[test]
    fn update_status_mutates_only_status() {
        let store = store_with_client();
        let created = create(&store, new_invoice(1, vec![line("A", 3.0, 4.0)]))
            .unwrap()
            .into_data()
            .unwrap()
            .invoice;

        let updated = update_status(&store, 1, "Paid")
            .unwrap()
            .into_data()
            .unwrap()
            .invoice;
        assert_eq!(updated.status, InvoiceStatus::Paid);
        assert_eq!(updated.total, created.total);
        assert_eq!(updated.created_at, created.created_at);
        assert_eq!(store.find_by_id::<Invoice>(1).unwrap().status, InvoiceStatus::Paid);
    }

    #[test]
    fn invalid_status_never_mutates() {
        let store = store_with_client();
        create(&store, new_invoice(1, vec![line("A", 1.0, 1.0)])).unwrap();
        let before = store.raw(crate::store::Collection::Invoices);

        for bad in ["", "void", "paid!", "drafts"] {
            let result = update_status(&store, 1, bad).unwrap();
            assert!(!result.is_success());
            assert!(result.error().unwrap().starts_with("Invalid status"));
        }
        assert_eq!(store.raw(crate::store::Collection::Invoices), before);
    }

    #[test]
    fn update_unknown_invoice_is_not_found() {
        let store = store_with_client();
        let result = update_status(&store, 5, "sent").unwrap();
        assert_eq!(result.error(), Some("Invoice with ID 5 not found"));

        let result = update_status(&store, -5, "sent").unwrap();
        assert_eq!(result.error(), Some("Invoice with ID -5 not found"));
        let result = update_status(&store, -5, "void").unwrap();
        assert!(result.error().unwrap().starts_with("Invalid status"));
        assert_eq!(get(&store, -1).error(), Some("Invoice with ID -1 not found"));
    }
}
