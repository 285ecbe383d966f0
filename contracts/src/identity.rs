//! # Account Identities
//!
//! Accounts are identified by hex-encoded public keys, optionally carrying
//! a `0x` prefix. The contracts never interpret the key material — an
//! address is an opaque identity compared for equality. The one distinction
//! that matters is the *null* address: the all-zero identity that stands in
//! for "nobody" and is rejected anywhere a real account is required.

/// Hex-encoded public key identifying an account.
pub type Address = String;

/// Returns the canonical null address: twenty zero bytes, `0x`-prefixed.
pub fn null_address() -> Address {
    format!("0x{}", "0".repeat(40))
}

/// Returns `true` if `address` is the null identity.
///
/// An address is null when it is empty or when its hex payload decodes to
/// all-zero bytes, regardless of length or `0x` prefix. Strings that are
/// not valid hex are opaque identities, not null.
pub fn is_null(address: &str) -> bool {
    let payload = address.strip_prefix("0x").unwrap_or(address);
    match hex::decode(payload) {
        Ok(bytes) => bytes.iter().all(|b| *b == 0),
        Err(_) => false,
    }
}
