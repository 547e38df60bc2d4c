mod money;
mod rate;

pub mod helpers;
pub mod op;
mod secret;

pub use money::{round_half_away, Money, MoneyConversionError};
pub use rate::{Rate, RateConversionError, BASIS_POINTS};
pub use secret::Secret;
