use once_cell::sync::Lazy;
use prometheus::{register_int_counter_vec, IntCounterVec};

use crate::errors::InventoryError;

// Prometheus metrics (default registry)
pub static STORE_OPERATIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "assetdb_store_operations_total",
        "Store operations by kind and outcome",
        &["op", "outcome"]
    )
    .expect("register store_operations_total")
});

pub static NOTIFICATIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "assetdb_notifications_total",
        "Over-assignment notifications by outcome",
        &["outcome"]
    )
    .expect("register notifications_total")
});

/// Count one store operation. Notification failures after a successful
/// mutation still count the store operation as `ok`.
pub fn record_op<T>(op: &str, res: &Result<T, InventoryError>) {
    let outcome = match res {
        Ok(_) | Err(InventoryError::Notify(_)) => "ok",
        Err(_) => "error",
    };
    STORE_OPERATIONS_TOTAL.with_label_values(&[op, outcome]).inc();
}

pub fn record_notification(delivered: bool) {
    let outcome = if delivered { "sent" } else { "failed" };
    NOTIFICATIONS_TOTAL.with_label_values(&[outcome]).inc();
}
