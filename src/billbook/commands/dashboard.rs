use super::Dashboard;
use crate::model::{Client, DashboardStats, Invoice};
use crate::store::DataStore;

pub fn run<S: DataStore>(store: &S, recent_limit: usize) -> Dashboard {
    let clients = store.load::<Client>().records;
    let invoices = store.load::<Invoice>().records;

    let statistics = DashboardStats::compute(&clients, &invoices);

    Dashboard {
        statistics,
        recent_invoices: most_recent(invoices, recent_limit),
        recent_clients: most_recent(clients, recent_limit),
    }
}

trait Created {
    fn created_at(&self) -> &str;
}

impl Created for Client {
    fn created_at(&self) -> &str {
        &self.created_at
    }
}

impl Created for Invoice {
    fn created_at(&self) -> &str {
        &self.created_at
    }
}

/// Newest first by timestamp string. Ties keep their stored order.
fn most_recent<T: Created>(mut records: Vec<T>, limit: usize) -> Vec<T> {
    records.sort_by(|a, b| b.created_at().cmp(a.created_at()));
    records.truncate(limit);
    records
}
