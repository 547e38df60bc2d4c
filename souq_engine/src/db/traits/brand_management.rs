use crate::{
    db_types::{Brand, BrandId, NewBrand},
    traits::StorageError,
};

#[allow(async_fn_in_trait)]
pub trait BrandManagement {
    /// Creates the brand, or updates its name and rates if it already exists. Rates that are not supplied fall back
    /// to the marketplace defaults.
    async fn upsert_brand(&self, brand: NewBrand) -> Result<Brand, StorageError>;

    async fn fetch_brand(&self, brand_id: &BrandId) -> Result<Option<Brand>, StorageError>;

    /// Fetches every brand in `brand_ids` that exists. Missing brands are silently absent from the result.
    async fn fetch_brands(&self, brand_ids: &[BrandId]) -> Result<Vec<Brand>, StorageError>;
}
