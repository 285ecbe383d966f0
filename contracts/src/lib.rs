//! # AURUM Timelock Contracts
//!
//! Custody logic for the AURUM vault suite. These contracts implement a
//! narrow but sharp-edged primitive: locking fungible-token balances under
//! a time-based release schedule, with a permanent root authority that can
//! reassign operational control at any time.
//!
//! - **Timelock Vault** — per-token locked-balance accounting behind a
//!   single unlock schedule, operated by a reassignable controller and
//!   ultimately owned by a fixed root identity.
//! - **Token Ledger** — the fungible-token transfer interface the vault
//!   calls through, plus a deterministic in-memory implementation used as
//!   a reference and a test stand-in.
//!
//! ## Design Principles
//!
//! 1. All monetary operations check for overflow — we use `checked_add` and
//!    `checked_sub` everywhere, because wrapping arithmetic and money do not
//!    mix.
//! 2. Reject before mutate: every precondition is validated up front, so a
//!    failed call leaves no partial state behind.
//! 3. Authority is a stored identity compared on each call — there is no
//!    inherited role-management machinery to subvert.
//! 4. Every public type is serializable (serde) for wire transport and
//!    persistent storage.

pub mod identity;
pub mod timelock_vault;
pub mod token_ledger;
