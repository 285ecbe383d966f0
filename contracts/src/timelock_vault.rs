//! # Timelock Vault Contract
//!
//! Holds fungible-token balances in custody for a single controller and
//! releases them only once a configurable time window has elapsed. The
//! lifecycle is deliberately flat:
//!
//! 1. **Create** — the root identity deploys the vault; root and controller
//!    both start as the creator, and the schedule origin is captured.
//! 2. **Lock** — the controller deposits tokens; balances accumulate per
//!    token identifier.
//! 3. **Withdraw** — once the unlock point passes, the controller drains a
//!    token's full balance in one call.
//!
//! ## Authority Model
//!
//! Two roles, one of them permanent. The *controller* operates the vault:
//! locking, withdrawing, adjusting the unlock duration. The *root* identity
//! is fixed at creation and holds exactly one power — deciding who the
//! controller is. Reassignment and reclaim check root specifically, never
//! "whoever currently holds the controller role", so root can recover
//! control unilaterally no matter where it was delegated.
//!
//! ## Schedule Model
//!
//! The unlock point is always derived: `schedule_start + unlock_duration`.
//! The start is immutable; only the duration moves. Updates compound from
//! the fixed origin, never from "now", so repeated adjustments cannot
//! drift the deadline. Shortening the duration below the elapsed time
//! unlocks already-deposited funds immediately — the controller may loosen
//! or tighten its own lock at will, but never move the origin.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use crate::identity::{self, Address};
use crate::token_ledger::{LedgerError, TokenId, TokenTransfers};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur during vault operations.
///
/// Every failure is a rejected precondition, reported before any state is
/// mutated. Nothing is retried internally — the caller decides whether to
/// retry after the condition clears (a larger allowance, a passed unlock
/// point, a restored role).
#[derive(Debug, Error)]
pub enum VaultError {
    /// The caller does not hold the controller role.
    #[error("caller is not the controller: {caller}")]
    NotController {
        /// The identity that attempted the operation.
        caller: Address,
    },

    /// The caller is not the root authority.
    #[error("caller is not the root authority: {caller}")]
    NotRoot {
        /// The identity that attempted the operation.
        caller: Address,
    },

    /// The null token identifier was supplied where a real one is required.
    #[error("invalid token: the null identifier cannot be locked or withdrawn")]
    InvalidToken,

    /// The null address was supplied where a real identity is required.
    #[error("invalid identity: the null address cannot hold a role")]
    InvalidIdentity,

    /// A zero amount was supplied to a lock operation.
    #[error("invalid amount: must be greater than zero")]
    InvalidAmount,

    /// A zero duration was supplied for the unlock schedule.
    #[error("invalid duration: must be greater than zero")]
    InvalidDuration,

    /// The external transfer service rejected or failed the movement.
    #[error("token transfer failed: {0}")]
    TransferFailed(#[from] LedgerError),

    /// Withdrawal attempted before the unlock point.
    #[error("tokens are locked until {unlock_at}")]
    Locked {
        /// The earliest instant at which withdrawal becomes possible.
        unlock_at: DateTime<Utc>,
    },

    /// Withdrawal attempted on a token with a zero locked balance.
    #[error("nothing to withdraw for this token")]
    NothingToWithdraw,

    /// Locking would overflow the token's accumulated balance.
    #[error("amount overflow: locked balance would exceed u64::MAX")]
    AmountOverflow,
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Notifications appended by successful mutating operations.
///
/// The log is append-only and externally observable — one entry per
/// successful lock, withdrawal, or controller change, in call order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum VaultEvent {
    /// Tokens were pulled into custody.
    TokenLocked {
        /// The token that was locked.
        token_id: TokenId,
        /// The amount added to the locked balance.
        amount: u64,
    },
    /// A token's full locked balance was released to the controller.
    Withdraw {
        /// The token that was withdrawn.
        token_id: TokenId,
        /// The amount that was released.
        amount: u64,
    },
    /// The controller role moved to a new identity.
    ControllerChanged {
        /// The identity that held the role before the call.
        previous: Address,
        /// The identity that holds the role after the call.
        current: Address,
    },
}

// ---------------------------------------------------------------------------
// Vault
// ---------------------------------------------------------------------------

/// A custodial vault with per-token locked balances behind a single
/// time-based release schedule.
///
/// The vault owns no token logic of its own — deposits and releases go
/// through an injected [`TokenTransfers`] capability, and the vault's
/// ledger entry for a token is only updated once the external movement
/// has confirmed. Operations run to completion one at a time; there is no
/// internal concurrency to coordinate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelockVault {
    /// Unique identifier for this vault instance.
    vault_id: String,
    /// The vault's own custody address — the destination of locked funds
    /// and the source of withdrawals.
    address: Address,
    /// The permanent authority. Set once at creation, never changes.
    root: Address,
    /// The operational authority. Initially equal to `root`; reassignable
    /// by `root` alone.
    controller: Address,
    /// The fixed origin of the unlock schedule, captured at creation.
    schedule_start: DateTime<Utc>,
    /// The current unlock window, in seconds past `schedule_start`.
    unlock_duration_secs: u64,
    /// Locked balance per token. Keys appear on first lock and remain
    /// observable at zero after a full withdrawal.
    locked: HashMap<TokenId, u64>,
    /// Append-only notification log.
    events: Vec<VaultEvent>,
    /// Timestamp when the vault was created.
    created_at: DateTime<Utc>,
    /// Timestamp of the most recent state change.
    updated_at: DateTime<Utc>,
}

impl TimelockVault {
    /// Creates a new vault controlled and rooted by `root`.
    ///
    /// The schedule origin is captured now; the unlock point starts at
    /// `now + unlock_duration_secs` and thereafter follows duration
    /// updates, always anchored to this origin.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::InvalidIdentity`] if `root` is the null address.
    /// Returns [`VaultError::InvalidDuration`] if the duration is zero.
    pub fn create(root: &str, unlock_duration_secs: u64) -> Result<Self, VaultError> {
        if identity::is_null(root) {
            return Err(VaultError::InvalidIdentity);
        }
        if unlock_duration_secs == 0 {
            return Err(VaultError::InvalidDuration);
        }

        let now = Utc::now();
        let vault_id = Uuid::new_v4();
        let vault = Self {
            vault_id: vault_id.to_string(),
            address: format!("vault:{}", hex::encode(vault_id.as_bytes())),
            root: root.to_string(),
            controller: root.to_string(),
            schedule_start: now,
            unlock_duration_secs,
            locked: HashMap::new(),
            events: Vec::new(),
            created_at: now,
            updated_at: now,
        };

        info!(
            vault_id = %vault.vault_id,
            root,
            unlock_duration_secs,
            "timelock vault created"
        );
        Ok(vault)
    }

    // -----------------------------------------------------------------------
    // Read Accessors
    // -----------------------------------------------------------------------

    /// Returns the vault's unique instance identifier.
    pub fn vault_id(&self) -> &str {
        &self.vault_id
    }

    /// Returns the vault's own custody address.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Returns the permanent root identity.
    pub fn root(&self) -> &str {
        &self.root
    }

    /// Returns the current controller identity.
    pub fn controller(&self) -> &str {
        &self.controller
    }

    /// Returns the immutable schedule origin.
    pub fn schedule_start(&self) -> DateTime<Utc> {
        self.schedule_start
    }

    /// Returns the current unlock duration in seconds.
    pub fn unlock_duration_secs(&self) -> u64 {
        self.unlock_duration_secs
    }

    /// Returns the instant at which withdrawals become possible.
    ///
    /// Always derived as `schedule_start + unlock_duration` — the unlock
    /// point is never stored, so it cannot drift from its origin.
    pub fn unlock_at(&self) -> DateTime<Utc> {
        self.schedule_start + Duration::seconds(self.unlock_duration_secs as i64)
    }

    /// Returns `true` if the time gate is open at `now`.
    pub fn is_unlocked(&self, now: DateTime<Utc>) -> bool {
        now >= self.unlock_at()
    }

    /// Returns the locked balance for `token_id`, or 0 for tokens that
    /// were never locked.
    pub fn locked_amount(&self, token_id: &str) -> u64 {
        self.locked.get(token_id).copied().unwrap_or(0)
    }

    /// Returns the per-token locked balances, including entries drained
    /// to zero by past withdrawals.
    pub fn locked_balances(&self) -> &HashMap<TokenId, u64> {
        &self.locked
    }

    /// Returns the append-only notification log.
    pub fn events(&self) -> &[VaultEvent] {
        &self.events
    }

    /// Returns when this vault was created.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the timestamp of the most recent state change.
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    // -----------------------------------------------------------------------
    // Guards
    // -----------------------------------------------------------------------

    fn ensure_controller(&self, caller: &str) -> Result<(), VaultError> {
        if caller != self.controller {
            return Err(VaultError::NotController {
                caller: caller.to_string(),
            });
        }
        Ok(())
    }

    fn ensure_root(&self, caller: &str) -> Result<(), VaultError> {
        if caller != self.root {
            return Err(VaultError::NotRoot {
                caller: caller.to_string(),
            });
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Token Operations
    // -----------------------------------------------------------------------

    /// Pulls `amount` of `token_id` from the caller into custody.
    ///
    /// The caller must have granted the vault a sufficient allowance on
    /// the transfer service beforehand. Repeated locks accumulate into the
    /// same balance entry. The ledger entry is only updated once the
    /// external transfer has confirmed, so a rejected transfer leaves the
    /// vault untouched.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::NotController`] if the caller is not the controller.
    /// Returns [`VaultError::InvalidToken`] for the null token identifier.
    /// Returns [`VaultError::InvalidAmount`] for a zero amount.
    /// Returns [`VaultError::AmountOverflow`] if the accumulated balance
    /// would overflow — checked before the transfer so failure never
    /// strands moved funds.
    /// Returns [`VaultError::TransferFailed`] if the transfer service
    /// rejects the movement.
    pub fn lock_token(
        &mut self,
        caller: &str,
        token_id: &str,
        amount: u64,
        transfers: &mut dyn TokenTransfers,
    ) -> Result<(), VaultError> {
        self.ensure_controller(caller)?;
        if identity::is_null(token_id) {
            return Err(VaultError::InvalidToken);
        }
        if amount == 0 {
            return Err(VaultError::InvalidAmount);
        }

        let current = self.locked_amount(token_id);
        let accumulated = current
            .checked_add(amount)
            .ok_or(VaultError::AmountOverflow)?;

        transfers.transfer_from(token_id, &self.address, caller, &self.address, amount)?;

        self.locked.insert(token_id.to_string(), accumulated);
        self.events.push(VaultEvent::TokenLocked {
            token_id: token_id.to_string(),
            amount,
        });
        self.updated_at = Utc::now();

        debug!(
            vault_id = %self.vault_id,
            token_id,
            amount,
            locked = accumulated,
            "tokens locked"
        );
        Ok(())
    }

    /// Releases the full locked balance of `token_id` to the controller.
    ///
    /// The time gate is evaluated against the caller-supplied `now` — the
    /// vault does no clock reading of its own for guard conditions.
    /// Withdrawal is all-or-nothing per token; the balance entry is zeroed
    /// but the key remains observable. Returns the amount released.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::NotController`] if the caller is not the controller.
    /// Returns [`VaultError::InvalidToken`] for the null token identifier.
    /// Returns [`VaultError::Locked`] while `now` precedes the unlock point.
    /// Returns [`VaultError::NothingToWithdraw`] on a zero balance.
    /// Returns [`VaultError::TransferFailed`] if the transfer service
    /// rejects the movement; the locked balance is left as it was.
    pub fn safe_withdraw(
        &mut self,
        caller: &str,
        token_id: &str,
        now: DateTime<Utc>,
        transfers: &mut dyn TokenTransfers,
    ) -> Result<u64, VaultError> {
        self.ensure_controller(caller)?;
        if identity::is_null(token_id) {
            return Err(VaultError::InvalidToken);
        }

        let unlock_at = self.unlock_at();
        if now < unlock_at {
            return Err(VaultError::Locked { unlock_at });
        }

        let amount = self.locked_amount(token_id);
        if amount == 0 {
            return Err(VaultError::NothingToWithdraw);
        }

        transfers.transfer(token_id, &self.address, &self.controller, amount)?;

        // Zero the entry, keep the key.
        self.locked.insert(token_id.to_string(), 0);
        self.events.push(VaultEvent::Withdraw {
            token_id: token_id.to_string(),
            amount,
        });
        self.updated_at = Utc::now();

        info!(
            vault_id = %self.vault_id,
            token_id,
            amount,
            controller = %self.controller,
            "locked tokens withdrawn"
        );
        Ok(amount)
    }

    // -----------------------------------------------------------------------
    // Schedule
    // -----------------------------------------------------------------------

    /// Replaces the unlock duration.
    ///
    /// The effective unlock point becomes `schedule_start + new_duration`,
    /// which may land earlier or later than before — including in the
    /// past, immediately unlocking already-deposited funds. The origin
    /// never moves.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::NotController`] if the caller is not the controller.
    /// Returns [`VaultError::InvalidDuration`] for a zero duration.
    pub fn update_unlock_duration(
        &mut self,
        caller: &str,
        new_duration_secs: u64,
    ) -> Result<(), VaultError> {
        self.ensure_controller(caller)?;
        if new_duration_secs == 0 {
            return Err(VaultError::InvalidDuration);
        }

        self.unlock_duration_secs = new_duration_secs;
        self.updated_at = Utc::now();

        debug!(
            vault_id = %self.vault_id,
            new_duration_secs,
            unlock_at = %self.unlock_at(),
            "unlock duration updated"
        );
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Authority Transitions
    // -----------------------------------------------------------------------

    /// Hands the controller role to `new_controller`.
    ///
    /// Root-gated: only the root identity may call this, even when root
    /// currently holds the controller role itself. The swap is atomic —
    /// exactly one controller is authoritative at any instant.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::NotRoot`] if the caller is not root.
    /// Returns [`VaultError::InvalidIdentity`] for the null address.
    pub fn reassign_controller(
        &mut self,
        caller: &str,
        new_controller: &str,
    ) -> Result<(), VaultError> {
        self.ensure_root(caller)?;
        if identity::is_null(new_controller) {
            return Err(VaultError::InvalidIdentity);
        }

        let previous = std::mem::replace(&mut self.controller, new_controller.to_string());
        self.events.push(VaultEvent::ControllerChanged {
            previous: previous.clone(),
            current: self.controller.clone(),
        });
        self.updated_at = Utc::now();

        info!(
            vault_id = %self.vault_id,
            previous = %previous,
            current = %self.controller,
            "controller reassigned"
        );
        Ok(())
    }

    /// Takes the controller role back to root itself.
    ///
    /// Succeeds regardless of who currently holds the role and without
    /// that holder's cooperation. Calling it while root already controls
    /// the vault is permitted and still records the transition.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::NotRoot`] if the caller is not root.
    pub fn reclaim_controller(&mut self, caller: &str) -> Result<(), VaultError> {
        self.ensure_root(caller)?;

        let previous = std::mem::replace(&mut self.controller, self.root.clone());
        self.events.push(VaultEvent::ControllerChanged {
            previous: previous.clone(),
            current: self.controller.clone(),
        });
        self.updated_at = Utc::now();

        info!(
            vault_id = %self.vault_id,
            previous = %previous,
            "controller reclaimed by root"
        );
        Ok(())
    }
}
