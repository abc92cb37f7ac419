use super::{client_not_found, stored_id, ClientList, ClientPayload, Envelope};
use crate::error::Result;
use crate::model::{timestamp, Client, NewClient};
use crate::store::{CollectionState, DataStore};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Filters for [`search`]. Unset or empty filters match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientSearch {
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
}

impl ClientSearch {
    pub fn matches(&self, client: &Client) -> bool {
        if let Some(query) = active(&self.query) {
            if !contains_ci(&client.name, query) {
                return false;
            }
        }
        if let Some(email) = active(&self.email) {
            if !contains_ci(&client.email, email) {
                return false;
            }
        }
        if let Some(company) = active(&self.company) {
            // A client without a company never matches a company filter.
            match client.company.as_deref().filter(|c| !c.is_empty()) {
                Some(c) if contains_ci(c, company) => {}
                _ => return false,
            }
        }
        true
    }
}

fn active(filter: &Option<String>) -> Option<&str> {
    filter.as_deref().filter(|f| !f.is_empty())
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

pub fn add<S: DataStore>(store: &S, input: NewClient) -> Result<Envelope<ClientPayload>> {
    let valid = match input.validate() {
        Ok(valid) => valid,
        Err(errors) => return Ok(Envelope::fail(format!("Validation failed: {}", errors))),
    };

    let mut state: CollectionState<Client> = store.load();
    let client = state
        .insert_with(|id| valid.into_client(id, timestamp()))
        .clone();
    store.save(&state)?;

    info!(id = client.id, name = %client.name, "client added");
    Ok(Envelope::ok(ClientPayload { client }))
}

pub fn search<S: DataStore>(store: &S, filter: &ClientSearch) -> ClientList {
    let state: CollectionState<Client> = store.load();
    state
        .records
        .into_iter()
        .filter(|c| filter.matches(c))
        .collect::<Vec<_>>()
        .into()
}

pub fn get<S: DataStore>(store: &S, client_id: i64) -> Envelope<ClientPayload> {
    match stored_id(client_id).and_then(|id| store.find_by_id::<Client>(id)) {
        Some(client) => Envelope::ok(ClientPayload { client }),
        None => Envelope::fail(client_not_found(client_id)),
    }
}

pub fn list_all<S: DataStore>(store: &S) -> ClientList {
    store.load::<Client>().records.into()
}
