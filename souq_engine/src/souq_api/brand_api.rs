use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{Brand, BrandId, NewBrand, Rate, DEFAULT_COMMISSION_RATE, DEFAULT_TAX_RATE},
    souq_api::errors::BrandApiError,
    traits::BrandManagement,
};

/// Registration and lookup of the brands that sell on the marketplace.
pub struct BrandApi<B> {
    db: B,
}

impl<B> Debug for BrandApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "BrandApi")
    }
}

impl<B> BrandApi<B>
where B: BrandManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    /// Creates or updates a brand. Rates that are left out default to 15% commission and 14% VAT.
    pub async fn upsert_brand(&self, brand: NewBrand) -> Result<Brand, BrandApiError> {
        if brand.id.as_str().trim().is_empty() {
            return Err(BrandApiError::ValidationError("Brand id is required".into()));
        }
        if brand.name.trim().is_empty() {
            return Err(BrandApiError::ValidationError("Brand name is required".into()));
        }
        let commission_rate = brand.commission_rate.unwrap_or(DEFAULT_COMMISSION_RATE);
        let tax_rate = brand.tax_rate.unwrap_or(DEFAULT_TAX_RATE);
        check_rate("commission", commission_rate)?;
        check_rate("tax", tax_rate)?;
        let brand = self.db.upsert_brand(brand).await?;
        info!("🏷️ Brand {} ({}) registered", brand.id, brand.name);
        Ok(brand)
    }

    pub async fn fetch_brand(&self, brand_id: &BrandId) -> Result<Brand, BrandApiError> {
        self.db.fetch_brand(brand_id).await?.ok_or_else(|| BrandApiError::NotFound(format!("Brand {brand_id}")))
    }
}

fn check_rate(name: &str, rate: Rate) -> Result<(), BrandApiError> {
    if (0..=souq_common::BASIS_POINTS).contains(&rate.bps()) {
        Ok(())
    } else {
        Err(BrandApiError::ValidationError(format!("The {name} rate must be between 0% and 100%, not {rate}")))
    }
}
