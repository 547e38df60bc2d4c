use crate::traits::{BrandManagement, LedgerManagement, OrderManagement, PayoutManagement, ReturnManagement};

/// The full set of storage behaviour for a marketplace backend.
pub trait MarketplaceDatabase:
    Clone + OrderManagement + BrandManagement + LedgerManagement + PayoutManagement + ReturnManagement
{
    /// The URL of the database
    fn url(&self) -> &str;
}
