//! # Token Ledger
//!
//! The fungible-token side of the vault: a transfer interface plus a
//! deterministic in-memory ledger implementing it.
//!
//! The vault never touches token balances directly. It calls through the
//! [`TokenTransfers`] trait, so any balance service with ERC-20-shaped
//! transfer semantics can sit behind it — a chain adapter in production,
//! the [`TokenLedger`] here in tests and simulations.
//!
//! ## Allowance Model
//!
//! `transfer` moves a holder's own funds. `transfer_from` moves someone
//! else's funds on behalf of a spender and consumes the allowance the
//! owner previously granted via [`TokenLedger::approve`]. Approvals set
//! the allowance outright rather than adding to it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The referenced token does not exist.
    #[error("token not found: {0}")]
    UnknownToken(String),

    /// A token with this symbol already exists.
    #[error("duplicate symbol: a token with symbol '{0}' already exists")]
    DuplicateSymbol(String),

    /// The sender does not hold enough of the token.
    #[error("insufficient balance: {holder} has {balance}, tried to move {requested}")]
    InsufficientBalance {
        /// The account whose funds were to be moved.
        holder: String,
        /// The holder's current balance.
        balance: u64,
        /// The amount the caller tried to move.
        requested: u64,
    },

    /// The spender's allowance does not cover the requested amount.
    #[error("insufficient allowance: {spender} may spend {allowance} of {owner}'s funds, tried to move {requested}")]
    InsufficientAllowance {
        /// The account that granted the allowance.
        owner: String,
        /// The account spending on the owner's behalf.
        spender: String,
        /// The currently granted allowance.
        allowance: u64,
        /// The amount the spender tried to move.
        requested: u64,
    },

    /// Crediting the recipient would overflow its balance.
    #[error("balance overflow: crediting {amount} would exceed u64::MAX")]
    BalanceOverflow {
        /// The amount that was being credited.
        amount: u64,
    },
}

// ---------------------------------------------------------------------------
// Transfer Interface
// ---------------------------------------------------------------------------

/// Unique identifier for a token, assigned by the ledger at registration.
pub type TokenId = String;

/// The transfer capability the vault calls through.
///
/// Every method is synchronous and atomic: it either moves the funds in
/// full or returns an error with no balances changed. Callers treat any
/// error as a plain rejection — the variant only matters for diagnostics.
pub trait TokenTransfers {
    /// Moves `amount` of `token_id` from `from`'s own balance to `to`.
    fn transfer(
        &mut self,
        token_id: &str,
        from: &str,
        to: &str,
        amount: u64,
    ) -> Result<(), LedgerError>;

    /// Moves `amount` of `token_id` from `from` to `to` on behalf of
    /// `spender`, consuming `spender`'s allowance granted by `from`.
    fn transfer_from(
        &mut self,
        token_id: &str,
        spender: &str,
        from: &str,
        to: &str,
        amount: u64,
    ) -> Result<(), LedgerError>;

    /// Returns `holder`'s balance of `token_id`, or 0 for unknown tokens
    /// and holders.
    fn balance_of(&self, token_id: &str, holder: &str) -> u64;
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Metadata and supply information for a registered token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenInfo {
    /// Unique token identifier.
    pub token_id: TokenId,
    /// Human-readable token name (e.g., "Unifarm Token").
    pub name: String,
    /// Ticker symbol (e.g., "UFARM"). Unique across the ledger.
    pub symbol: String,
    /// Number of decimal places. Display-only — arithmetic never divides.
    pub decimals: u8,
    /// Fixed total supply in the smallest denomination.
    pub total_supply: u64,
    /// Timestamp when the token was registered.
    pub created_at: DateTime<Utc>,
}

/// An in-memory fungible-token ledger.
///
/// Tracks registered tokens, per-holder balances, and spender allowances.
/// In production the balances would live behind a chain adapter; this
/// representation exists for validation logic and testing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenLedger {
    /// Registered tokens keyed by their unique ID.
    tokens: HashMap<TokenId, TokenInfo>,
    /// Per-token, per-holder balances: `token_id -> (holder -> balance)`.
    balances: HashMap<TokenId, HashMap<String, u64>>,
    /// Per-token allowances: `token_id -> (owner -> (spender -> amount))`.
    allowances: HashMap<TokenId, HashMap<String, HashMap<String, u64>>>,
    /// Index from symbol to token ID for uniqueness enforcement.
    symbol_index: HashMap<String, TokenId>,
}

impl TokenLedger {
    /// Creates a new, empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new token and credits its entire supply to `holder`.
    ///
    /// Mirrors the usual mock-token constructor: the deployer receives the
    /// full fixed supply up front. There is no further issuance.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::DuplicateSymbol`] if the symbol is already taken.
    pub fn register_token(
        &mut self,
        name: &str,
        symbol: &str,
        decimals: u8,
        initial_supply: u64,
        holder: &str,
    ) -> Result<TokenId, LedgerError> {
        // Enforce symbol uniqueness.
        let symbol_upper = symbol.to_uppercase();
        if self.symbol_index.contains_key(&symbol_upper) {
            return Err(LedgerError::DuplicateSymbol(symbol.to_string()));
        }

        let token_id = Uuid::new_v4().to_string();
        let info = TokenInfo {
            token_id: token_id.clone(),
            name: name.to_string(),
            symbol: symbol_upper.clone(),
            decimals,
            total_supply: initial_supply,
            created_at: Utc::now(),
        };

        let mut holders = HashMap::new();
        holders.insert(holder.to_string(), initial_supply);

        self.tokens.insert(token_id.clone(), info);
        self.balances.insert(token_id.clone(), holders);
        self.allowances.insert(token_id.clone(), HashMap::new());
        self.symbol_index.insert(symbol_upper, token_id.clone());

        Ok(token_id)
    }

    /// Sets `spender`'s allowance over `owner`'s funds to exactly `amount`.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::UnknownToken`] if the token does not exist.
    pub fn approve(
        &mut self,
        token_id: &str,
        owner: &str,
        spender: &str,
        amount: u64,
    ) -> Result<(), LedgerError> {
        if !self.tokens.contains_key(token_id) {
            return Err(LedgerError::UnknownToken(token_id.to_string()));
        }

        self.allowances
            .entry(token_id.to_string())
            .or_default()
            .entry(owner.to_string())
            .or_default()
            .insert(spender.to_string(), amount);

        Ok(())
    }

    /// Returns `spender`'s remaining allowance over `owner`'s funds, or 0.
    pub fn allowance(&self, token_id: &str, owner: &str, spender: &str) -> u64 {
        self.allowances
            .get(token_id)
            .and_then(|owners| owners.get(owner))
            .and_then(|spenders| spenders.get(spender))
            .copied()
            .unwrap_or(0)
    }

    /// Returns metadata for a token, or `None` if it does not exist.
    pub fn token_info(&self, token_id: &str) -> Option<&TokenInfo> {
        self.tokens.get(token_id)
    }

    /// Returns the total supply of a token, or 0 if it does not exist.
    pub fn total_supply(&self, token_id: &str) -> u64 {
        self.tokens
            .get(token_id)
            .map(|t| t.total_supply)
            .unwrap_or(0)
    }

    /// Returns the number of registered tokens.
    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }

    /// Moves `amount` from `from` to `to`, validating every precondition
    /// before touching either balance.
    fn move_balance(
        &mut self,
        token_id: &str,
        from: &str,
        to: &str,
        amount: u64,
    ) -> Result<(), LedgerError> {
        if !self.tokens.contains_key(token_id) {
            return Err(LedgerError::UnknownToken(token_id.to_string()));
        }

        let balances = self.balances.entry(token_id.to_string()).or_default();

        let from_balance = balances.get(from).copied().unwrap_or(0);
        if from_balance < amount {
            return Err(LedgerError::InsufficientBalance {
                holder: from.to_string(),
                balance: from_balance,
                requested: amount,
            });
        }

        // Compute the credited balance up front so an overflow rejects the
        // whole transfer before the debit lands. Self-transfers net out.
        let to_balance = if from == to {
            from_balance - amount
        } else {
            balances.get(to).copied().unwrap_or(0)
        };
        let credited = to_balance
            .checked_add(amount)
            .ok_or(LedgerError::BalanceOverflow { amount })?;

        balances.insert(from.to_string(), from_balance - amount);
        balances.insert(to.to_string(), credited);

        Ok(())
    }
}

impl TokenTransfers for TokenLedger {
    fn transfer(
        &mut self,
        token_id: &str,
        from: &str,
        to: &str,
        amount: u64,
    ) -> Result<(), LedgerError> {
        self.move_balance(token_id, from, to, amount)
    }

    fn transfer_from(
        &mut self,
        token_id: &str,
        spender: &str,
        from: &str,
        to: &str,
        amount: u64,
    ) -> Result<(), LedgerError> {
        if !self.tokens.contains_key(token_id) {
            return Err(LedgerError::UnknownToken(token_id.to_string()));
        }

        let allowance = self.allowance(token_id, from, spender);
        if allowance < amount {
            return Err(LedgerError::InsufficientAllowance {
                owner: from.to_string(),
                spender: spender.to_string(),
                allowance,
                requested: amount,
            });
        }

        self.move_balance(token_id, from, to, amount)?;

        // Only burn the allowance once the move has committed.
        self.allowances
            .entry(token_id.to_string())
            .or_default()
            .entry(from.to_string())
            .or_default()
            .insert(spender.to_string(), allowance - amount);

        Ok(())
    }

    fn balance_of(&self, token_id: &str, holder: &str) -> u64 {
        self.balances
            .get(token_id)
            .and_then(|b| b.get(holder))
            .copied()
            .unwrap_or(0)
    }
}
