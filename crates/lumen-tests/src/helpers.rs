//! Shared test helpers: an in-memory ledger and a local external signer.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

use lumen_core::amount::Amount;
use lumen_core::constants::{BASE_FEE, Network};
use lumen_core::crypto::{self, KeyPair, PublicKey};
use lumen_core::error::{IntentError, LedgerError};
use lumen_core::records::{AccountRecord, BalanceLine, OperationRecord, Order, SubmitResponse};
use lumen_core::traits::{IntentRequest, IntentResponse, IntentTransport, LedgerApi};
use lumen_core::types::{Operation, TransactionEnvelope};
use lumen_wallet::{MemoryStore, PaymentSummary, WalletFactory};

/// Deterministic keypair from a seed byte.
pub fn keypair(seed: u8) -> KeyPair {
    KeyPair::from_seed_bytes([seed; 32])
}

pub fn lumens(n: i64) -> Amount {
    Amount::from_lumens(n).unwrap()
}

/// A payment form paying `amount` lumens from `from` to `to`.
pub fn summary(from: &KeyPair, to: &PublicKey, amount: &str) -> PaymentSummary {
    PaymentSummary {
        signer_key: from.secret_seed().to_string(),
        destination_public_key: to.account_id(),
        amount: amount.to_string(),
        memo: "test".to_string(),
        time_out_in_seconds: 30,
        fee: i64::from(BASE_FEE),
    }
}

/// Factory over a fresh memory store and a signer holding `signer`.
pub fn factory(signer: LocalSigner) -> (Arc<MemoryStore>, WalletFactory) {
    let store = Arc::new(MemoryStore::new());
    let factory = WalletFactory::new(store.clone(), Arc::new(signer));
    (store, factory)
}

const FRIENDBOT: &str = "GAIH3ULLFQ4DGSECF2AR555KZ4KNDGEKN4AFI4SU2M7B43MGK3QJZNSR";

#[derive(Clone, Debug)]
struct Account {
    sequence: i64,
    balance: Amount,
}

#[derive(Default)]
struct LedgerState {
    accounts: HashMap<String, Account>,
    /// Operations per account, oldest first.
    operations: HashMap<String, Vec<OperationRecord>>,
    next_op_id: u64,
    submissions: usize,
}

impl LedgerState {
    fn record(&mut self, kind: &str, hash: &str, op: OperationRecord, parties: &[&str]) {
        self.next_op_id += 1;
        let n = self.next_op_id;
        let record = OperationRecord {
            id: n.to_string(),
            kind: kind.to_string(),
            created_at: format!("2024-03-{:02}T{:02}:{:02}:00Z", 1 + n % 28, n % 24, n % 60),
            transaction_hash: hash.to_string(),
            ..op
        };
        for party in parties {
            self.operations
                .entry(party.to_string())
                .or_default()
                .push(record.clone());
        }
    }
}

fn blank_operation() -> OperationRecord {
    OperationRecord {
        id: String::new(),
        kind: String::new(),
        created_at: String::new(),
        transaction_hash: String::new(),
        transaction_successful: true,
        source_account: None,
        from: None,
        to: None,
        amount: None,
        asset_type: None,
        funder: None,
        account: None,
        starting_balance: None,
    }
}

fn rejected(code: &str, ops: &[&str]) -> LedgerError {
    LedgerError::Rejected {
        transaction: code.to_string(),
        operations: ops.iter().map(|s| s.to_string()).collect(),
    }
}

/// Ledger that applies native payments in memory.
///
/// Enforces the checks a real ledger performs on submission: a valid source
/// signature, `sequence == current + 1`, a fee of at least `BASE_FEE` per
/// operation, an existing destination and sufficient balance.
pub struct InMemoryLedger {
    network: Network,
    state: Mutex<LedgerState>,
}

impl InMemoryLedger {
    pub fn new(network: Network) -> Self {
        Self {
            network,
            state: Mutex::new(LedgerState::default()),
        }
    }

    /// Create `account` with a starting balance, as a faucet would.
    pub fn fund(&self, account: &PublicKey, starting_balance: Amount) {
        let mut state = self.state.lock();
        let id = account.account_id();
        let created = state.accounts.len() as i64 + 1;
        state.accounts.insert(
            id.clone(),
            Account {
                sequence: created << 32,
                balance: starting_balance,
            },
        );
        let op = OperationRecord {
            source_account: Some(FRIENDBOT.to_string()),
            funder: Some(FRIENDBOT.to_string()),
            account: Some(id.clone()),
            starting_balance: Some(starting_balance),
            ..blank_operation()
        };
        state.record("create_account", "friendbot", op, &[&id]);
    }

    pub fn balance(&self, account: &PublicKey) -> Option<Amount> {
        self.state
            .lock()
            .accounts
            .get(&account.account_id())
            .map(|a| a.balance)
    }

    pub fn sequence(&self, account: &PublicKey) -> Option<i64> {
        self.state
            .lock()
            .accounts
            .get(&account.account_id())
            .map(|a| a.sequence)
    }

    /// Number of submissions received, accepted or not.
    pub fn submissions(&self) -> usize {
        self.state.lock().submissions
    }
}

#[async_trait]
impl LedgerApi for InMemoryLedger {
    async fn load_account(&self, account: &PublicKey) -> Result<AccountRecord, LedgerError> {
        let state = self.state.lock();
        let id = account.account_id();
        let acc = state
            .accounts
            .get(&id)
            .ok_or_else(|| LedgerError::NotFound(id.clone()))?;
        Ok(AccountRecord {
            account_id: id,
            sequence: acc.sequence,
            balances: vec![BalanceLine {
                balance: acc.balance,
                asset_type: "native".to_string(),
            }],
        })
    }

    async fn operations_for_account(
        &self,
        account: &PublicKey,
        limit: u32,
        order: Order,
    ) -> Result<Vec<OperationRecord>, LedgerError> {
        let state = self.state.lock();
        let id = account.account_id();
        if !state.accounts.contains_key(&id) {
            return Err(LedgerError::NotFound(id));
        }
        let mut ops = state.operations.get(&id).cloned().unwrap_or_default();
        if order == Order::Desc {
            ops.reverse();
        }
        ops.truncate(limit as usize);
        Ok(ops)
    }

    async fn submit_transaction(&self, envelope_xdr: &str) -> Result<SubmitResponse, LedgerError> {
        let mut state = self.state.lock();
        state.submissions += 1;

        let env = TransactionEnvelope::from_xdr_base64(envelope_xdr).map_err(|e| {
            LedgerError::Http {
                status: 400,
                message: e.to_string(),
            }
        })?;
        let tx = &env.tx;
        let source_id = tx.source_account.account_id();
        let source = state
            .accounts
            .get(&source_id)
            .cloned()
            .ok_or_else(|| rejected("tx_no_source_account", &[]))?;

        if crypto::verify_envelope(&env, &tx.source_account, self.network).is_err() {
            return Err(rejected("tx_bad_auth", &[]));
        }
        if tx.sequence != source.sequence + 1 {
            return Err(rejected("tx_bad_seq", &[]));
        }
        if i64::from(tx.fee) < i64::from(BASE_FEE) * tx.operations.len() as i64 {
            return Err(rejected("tx_insufficient_fee", &[]));
        }

        let mut spent = i64::from(tx.fee);
        for op in &tx.operations {
            let Operation::Payment {
                destination,
                amount,
            } = op;
            if !state.accounts.contains_key(&destination.account_id()) {
                return Err(rejected("tx_failed", &["op_no_destination"]));
            }
            spent += amount.stroops();
        }
        if spent > source.balance.stroops() {
            return Err(rejected("tx_failed", &["op_underfunded"]));
        }

        let hash = env.hash_hex(self.network);
        if let Some(acc) = state.accounts.get_mut(&source_id) {
            acc.sequence = tx.sequence;
            acc.balance = acc.balance.saturating_sub(Amount::from_stroops(i64::from(tx.fee)).unwrap_or(Amount::ZERO));
        }
        for op in &tx.operations {
            let Operation::Payment {
                destination,
                amount,
            } = op;
            let dest_id = destination.account_id();
            if let Some(acc) = state.accounts.get_mut(&source_id) {
                acc.balance = acc.balance.saturating_sub(*amount);
            }
            if let Some(acc) = state.accounts.get_mut(&dest_id) {
                acc.balance = acc.balance.checked_add(*amount).unwrap_or(acc.balance);
            }
            let record = OperationRecord {
                source_account: Some(source_id.clone()),
                from: Some(source_id.clone()),
                to: Some(dest_id.clone()),
                amount: Some(*amount),
                asset_type: Some("native".to_string()),
                ..blank_operation()
            };
            state.record("payment", &hash, record, &[&source_id, &dest_id]);
        }

        Ok(SubmitResponse {
            hash,
            ledger: Some(state.next_op_id as u32),
            successful: true,
        })
    }
}

/// External signer holding a keypair locally.
pub struct LocalSigner {
    keypair: KeyPair,
    reject: bool,
}

impl LocalSigner {
    pub fn new(keypair: KeyPair) -> Self {
        Self {
            keypair,
            reject: false,
        }
    }

    /// A signer whose user declines every request.
    pub fn rejecting(keypair: KeyPair) -> Self {
        Self {
            keypair,
            reject: true,
        }
    }
}

#[async_trait]
impl IntentTransport for LocalSigner {
    async fn request(&self, request: IntentRequest) -> Result<IntentResponse, IntentError> {
        if self.reject {
            return Err(IntentError::Rejected);
        }
        match request {
            IntentRequest::PublicKey => Ok(IntentResponse {
                pubkey: Some(self.keypair.public_key().account_id()),
                signed_envelope_xdr: None,
            }),
            IntentRequest::Tx { xdr, network } => {
                let network: Network = network.parse().map_err(IntentError::InvalidResponse)?;
                let mut env = TransactionEnvelope::from_xdr_base64(&xdr)
                    .map_err(|e| IntentError::InvalidResponse(e.to_string()))?;
                crypto::sign_envelope(&mut env, &self.keypair, network);
                Ok(IntentResponse {
                    pubkey: None,
                    signed_envelope_xdr: Some(env.to_xdr_base64()),
                })
            }
        }
    }
}
