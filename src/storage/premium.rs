//! Paid full-resolution downloads.

use crate::auth::Access;
use crate::models::PhotoRecord;

/// Decides whether a non-admin caller has paid for a photo's original.
pub trait PaymentGate: Send + Sync {
    fn is_paid(&self, access: &Access, photo: &PhotoRecord) -> bool;
}

/// No payment provider is wired in; every guest is refused.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPayments;

impl PaymentGate for NoPayments {
    fn is_paid(&self, _access: &Access, _photo: &PhotoRecord) -> bool {
        false
    }
}
