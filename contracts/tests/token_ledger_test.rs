//! Integration tests for the in-memory token ledger.
//!
//! These tests treat the ledger the way the vault does — through the
//! `TokenTransfers` trait — and cover the allowance bookkeeping a custody
//! flow depends on: approve, pull via `transfer_from`, pay out via
//! `transfer`, with balances conserved throughout.

use aurum_contracts::token_ledger::{LedgerError, TokenLedger, TokenTransfers};

const DEPLOYER: &str = "0xaaaa000000000000000000000000000000000001";
const CUSTODIAN: &str = "vault:00112233445566778899aabbccddeeff";
const RECIPIENT: &str = "0xbbbb000000000000000000000000000000000002";

// ---------------------------------------------------------------------------
// Custody Flow
// ---------------------------------------------------------------------------

#[test]
fn approve_pull_payout_conserves_supply() {
    let mut ledger = TokenLedger::new();
    let token = ledger
        .register_token("Aurum Silver", "AUS", 18, 7_500, DEPLOYER)
        .unwrap();

    ledger.approve(&token, DEPLOYER, CUSTODIAN, 7_500).unwrap();

    // The custodian pulls in two tranches.
    ledger
        .transfer_from(&token, CUSTODIAN, DEPLOYER, CUSTODIAN, 5_000)
        .unwrap();
    ledger
        .transfer_from(&token, CUSTODIAN, DEPLOYER, CUSTODIAN, 2_500)
        .unwrap();
    assert_eq!(ledger.balance_of(&token, CUSTODIAN), 7_500);
    assert_eq!(ledger.balance_of(&token, DEPLOYER), 0);
    assert_eq!(ledger.allowance(&token, DEPLOYER, CUSTODIAN), 0);

    // Pay out to a third party from the custodian's own funds.
    ledger
        .transfer(&token, CUSTODIAN, RECIPIENT, 7_500)
        .unwrap();
    assert_eq!(ledger.balance_of(&token, RECIPIENT), 7_500);

    // Supply is conserved across every hop.
    assert_eq!(ledger.total_supply(&token), 7_500);
}

#[test]
fn pull_beyond_allowance_rejected_midway() {
    let mut ledger = TokenLedger::new();
    let token = ledger
        .register_token("Aurum Gold", "AUG", 18, 5_000, DEPLOYER)
        .unwrap();
    ledger.approve(&token, DEPLOYER, CUSTODIAN, 3_000).unwrap();

    ledger
        .transfer_from(&token, CUSTODIAN, DEPLOYER, CUSTODIAN, 3_000)
        .unwrap();

    // The allowance is spent; another pull must fail even though the
    // deployer still has balance.
    let result = ledger.transfer_from(&token, CUSTODIAN, DEPLOYER, CUSTODIAN, 1_000);
    assert!(matches!(
        result,
        Err(LedgerError::InsufficientAllowance { .. })
    ));
    assert_eq!(ledger.balance_of(&token, DEPLOYER), 2_000);
    assert_eq!(ledger.balance_of(&token, CUSTODIAN), 3_000);
}

#[test]
fn distinct_spenders_hold_distinct_allowances() {
    let mut ledger = TokenLedger::new();
    let token = ledger
        .register_token("Test Token", "TST", 8, 10_000, DEPLOYER)
        .unwrap();

    ledger.approve(&token, DEPLOYER, CUSTODIAN, 4_000).unwrap();
    ledger.approve(&token, DEPLOYER, RECIPIENT, 1_000).unwrap();

    ledger
        .transfer_from(&token, CUSTODIAN, DEPLOYER, CUSTODIAN, 4_000)
        .unwrap();
    assert_eq!(ledger.allowance(&token, DEPLOYER, CUSTODIAN), 0);
    assert_eq!(ledger.allowance(&token, DEPLOYER, RECIPIENT), 1_000);
}

// ---------------------------------------------------------------------------
// Registration
// ---------------------------------------------------------------------------

#[test]
fn symbols_are_unique_case_insensitively() {
    let mut ledger = TokenLedger::new();
    ledger
        .register_token("Aurum Silver", "AUS", 18, 100, DEPLOYER)
        .unwrap();
    let result = ledger.register_token("Other", "aus", 18, 100, DEPLOYER);
    assert!(matches!(result, Err(LedgerError::DuplicateSymbol(_))));
    assert_eq!(ledger.token_count(), 1);
}

#[test]
fn registration_records_metadata() {
    let mut ledger = TokenLedger::new();
    let token = ledger
        .register_token("Aurum Gold", "AUG", 18, 5_000, DEPLOYER)
        .unwrap();
    let info = ledger.token_info(&token).unwrap();
    assert_eq!(info.name, "Aurum Gold");
    assert_eq!(info.symbol, "AUG");
    assert_eq!(info.decimals, 18);
    assert_eq!(info.total_supply, 5_000);
}

// ---------------------------------------------------------------------------
// Serialization
// ---------------------------------------------------------------------------

#[test]
fn ledger_serialization_roundtrip() {
    let mut ledger = TokenLedger::new();
    let token = ledger
        .register_token("Test Token", "TST", 8, 1_000, DEPLOYER)
        .unwrap();
    ledger.approve(&token, DEPLOYER, CUSTODIAN, 400).unwrap();
    ledger
        .transfer_from(&token, CUSTODIAN, DEPLOYER, CUSTODIAN, 250)
        .unwrap();

    let json = serde_json::to_string(&ledger).unwrap();
    let restored: TokenLedger = serde_json::from_str(&json).unwrap();

    assert_eq!(restored.balance_of(&token, DEPLOYER), 750);
    assert_eq!(restored.balance_of(&token, CUSTODIAN), 250);
    assert_eq!(restored.allowance(&token, DEPLOYER, CUSTODIAN), 150);
    assert_eq!(restored.total_supply(&token), 1_000);
}
