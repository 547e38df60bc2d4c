//! Transaction callback signatures.
//!
//! Paymob signs every transaction-processed callback with HMAC-SHA512, keyed with the merchant's HMAC secret. The
//! signed message is the concatenation of a fixed set of transaction fields, in lexicographic order of their keys.
//! The hex-encoded digest arrives in the `hmac` query parameter.
use hmac::{Hmac, Mac};
use log::*;
use sha2::Sha512;

use crate::{data_objects::CallbackEnvelope, PaymobApiError, TransactionCallback};

type HmacSha512 = Hmac<Sha512>;

/// Builds the message that Paymob signs for the given transaction.
pub fn signed_message(tx: &TransactionCallback) -> String {
    [
        tx.amount_cents.to_string(),
        tx.created_at.clone(),
        tx.currency.clone(),
        tx.error_occured.to_string(),
        tx.has_parent_transaction.to_string(),
        tx.id.to_string(),
        tx.integration_id.to_string(),
        tx.is_3d_secure.to_string(),
        tx.is_auth.to_string(),
        tx.is_capture.to_string(),
        tx.is_refunded.to_string(),
        tx.is_standalone_payment.to_string(),
        tx.is_voided.to_string(),
        tx.order.id.to_string(),
        tx.owner.to_string(),
        tx.pending.to_string(),
        tx.source_data.pan.clone(),
        tx.source_data.sub_type.clone(),
        tx.source_data.kind.clone(),
        tx.success.to_string(),
    ]
    .concat()
}

/// Hex-encoded HMAC-SHA512 of `message`.
pub fn calculate_hmac(secret: &str, message: &str) -> String {
    // HMAC accepts keys of any length, so this cannot fail
    let mut mac = match HmacSha512::new_from_slice(secret.as_bytes()) {
        Ok(m) => m,
        Err(_) => return String::default(),
    };
    mac.update(message.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Checks `signature` against the HMAC of the transaction. The comparison is constant-time.
pub fn verify_signature(secret: &str, tx: &TransactionCallback, signature: &str) -> bool {
    let Ok(expected) = hex::decode(signature.trim()) else {
        debug!("🔐️ Callback signature is not valid hex");
        return false;
    };
    let Ok(mut mac) = HmacSha512::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(signed_message(tx).as_bytes());
    mac.verify_slice(&expected).is_ok()
}

/// Parses a raw callback body and verifies its signature.
pub fn verify_callback_body(secret: &str, body: &[u8], signature: &str) -> Result<bool, PaymobApiError> {
    let envelope = serde_json::from_slice::<CallbackEnvelope>(body).map_err(|e| PaymobApiError::JsonError(e.to_string()))?;
    Ok(verify_signature(secret, &envelope.obj, signature))
}
