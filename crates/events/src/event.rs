use chrono::{DateTime, Utc};

/// A domain event: an immutable fact about a committed change.
pub trait Event: Clone + core::fmt::Debug + Send + Sync + 'static {
    /// Stable event name (e.g. "invoicing.invoice.payment_applied").
    fn event_type(&self) -> &'static str;

    /// Schema version for this event type.
    fn version(&self) -> u32;

    /// When the change happened (business time).
    fn occurred_at(&self) -> DateTime<Utc>;
}
