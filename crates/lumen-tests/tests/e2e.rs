//! End-to-end wallet flows against the in-memory ledger.

use std::sync::Arc;

use lumen_core::amount::Amount;
use lumen_core::constants::{BASE_FEE, Network};
use lumen_core::crypto;
use lumen_core::error::LedgerError;
use lumen_core::traits::{KeyValueStore, LedgerApi};
use lumen_core::types::{Memo, Operation, TransactionEnvelope};
use lumen_tests::helpers::{InMemoryLedger, LocalSigner, factory, keypair, lumens, summary};
use lumen_wallet::storage::{PUBLIC_KEY, SECRET_KEY, WALLET};
use lumen_wallet::{
    AccountReader, FileStore, PaymentResult, PaymentService, Session, WalletError, WalletFactory,
    WalletKind, is_form_valid, paginate,
};

fn setup() -> Arc<InMemoryLedger> {
    let ledger = Arc::new(InMemoryLedger::new(Network::Testnet));
    ledger.fund(&keypair(1).public_key(), lumens(18173));
    ledger.fund(&keypair(2).public_key(), lumens(100));
    ledger
}

#[tokio::test]
async fn secret_key_payment_flow() {
    let ledger = setup();
    let (store, factory) = factory(LocalSigner::new(keypair(9)));
    let sender = keypair(1);
    let receiver = keypair(2).public_key();

    // Sign in.
    let mut wallet = factory.create("secretKey").unwrap();
    let pk = wallet.get_public_key(Some(sender.secret_seed().as_str())).await.unwrap();
    assert_eq!(pk, sender.public_key());
    assert_eq!(store.get_item(SECRET_KEY).unwrap(), None);

    // Dashboard.
    let reader = AccountReader::new(ledger.clone());
    let balance = reader.get_balance(&pk).await.unwrap();
    assert_eq!(balance, lumens(18173));

    // Pay 110.
    let form = summary(&sender, &receiver, "110");
    assert!(is_form_valid(&form, Some(balance), false).is_empty());
    let service = PaymentService::new(ledger.clone(), Network::Testnet);
    let result = service.send_payment(&form, &mut wallet, Some(balance)).await;
    assert!(result.is_success(), "{result:?}");
    assert_eq!(result.status(), "Success");

    let fee = Amount::from_stroops(i64::from(BASE_FEE)).unwrap();
    let expected = lumens(18173).checked_sub(lumens(110)).unwrap().checked_sub(fee).unwrap();
    assert_eq!(ledger.balance(&pk), Some(expected));
    assert_eq!(ledger.balance(&receiver), Some(lumens(210)));

    // History, newest first.
    let history = reader.payments_history(&receiver).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].kind, "payment");
    assert_eq!(history[0].source_account, Some(pk.account_id()));
    assert_eq!(history[0].amount, Some(lumens(110)));
    assert_eq!(history[1].kind, "create_account");
    match result {
        PaymentResult::Success {
            transaction_hash, ..
        } => assert_eq!(history[0].transaction_hash, transaction_hash),
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test]
async fn consecutive_payments_advance_sequence() {
    let ledger = setup();
    let (_, factory) = factory(LocalSigner::new(keypair(9)));
    let sender = keypair(1);
    let receiver = keypair(2).public_key();
    let start = ledger.sequence(&sender.public_key()).unwrap();

    let service = PaymentService::new(ledger.clone(), Network::Testnet);
    let mut wallet = factory.create_kind(WalletKind::SecretKey);
    for amount in ["1", "2.5", "0.0000001"] {
        let balance = ledger.balance(&sender.public_key());
        let result = service
            .send_payment(&summary(&sender, &receiver, amount), &mut wallet, balance)
            .await;
        assert!(result.is_success(), "{result:?}");
    }
    assert_eq!(ledger.sequence(&sender.public_key()), Some(start + 3));
}

#[tokio::test]
async fn replayed_envelope_is_rejected() {
    let ledger = setup();
    let sender = keypair(1);
    let service = PaymentService::new(ledger.clone(), Network::Testnet);
    let tx = service
        .build_transaction(
            &sender.public_key(),
            &keypair(2).public_key(),
            lumens(5),
            "once",
            100,
            60,
        )
        .await
        .unwrap();
    let mut env = TransactionEnvelope::unsigned(tx);
    crypto::sign_envelope(&mut env, &sender, Network::Testnet);
    let xdr = env.to_xdr_base64();

    ledger.submit_transaction(&xdr).await.unwrap();
    assert_eq!(
        ledger.submit_transaction(&xdr).await,
        Err(LedgerError::Rejected {
            transaction: "tx_bad_seq".into(),
            operations: vec![],
        })
    );
}

#[tokio::test]
async fn wrong_network_signature_is_rejected() {
    let ledger = setup();
    let sender = keypair(1);
    let service = PaymentService::new(ledger.clone(), Network::Public);
    let (_, factory) = factory(LocalSigner::new(keypair(9)));
    let mut wallet = factory.create_kind(WalletKind::SecretKey);

    let result = service
        .send_payment(
            &summary(&sender, &keypair(2).public_key(), "1"),
            &mut wallet,
            Some(lumens(18173)),
        )
        .await;
    assert_eq!(result.error_message(), Some("transaction rejected: tx_bad_auth"));
}

#[tokio::test]
async fn albedo_payment_flow() {
    let ledger = setup();
    let sender = keypair(1);
    let (store, factory) = factory(LocalSigner::new(sender.clone()));

    let mut wallet = factory.create("albedo").unwrap();
    assert_eq!(wallet.extension(), Some("https://albedo.link/"));
    let pk = wallet.get_public_key(None).await.unwrap();
    assert_eq!(store.get_item(WALLET).unwrap().as_deref(), Some("albedo"));

    let mut form = summary(&sender, &keypair(2).public_key(), "42");
    form.signer_key.clear();
    assert!(is_form_valid(&form, ledger.balance(&pk), true).is_empty());

    let service = PaymentService::new(ledger.clone(), Network::Testnet);
    let result = service.send_payment(&form, &mut wallet, ledger.balance(&pk)).await;
    assert!(result.is_success(), "{result:?}");
    assert_eq!(ledger.balance(&keypair(2).public_key()), Some(lumens(142)));
}

#[tokio::test]
async fn albedo_rejection_stops_sign_in() {
    let (store, factory) = factory(LocalSigner::rejecting(keypair(1)));
    let mut wallet = factory.create("albedo").unwrap();
    assert_eq!(wallet.get_public_key(None).await, Err(WalletError::UserRejected));
    assert_eq!(store.get_item(PUBLIC_KEY).unwrap(), None);
}

#[tokio::test]
async fn unfunded_destination_fails_without_submitting() {
    let ledger = setup();
    let sender = keypair(1);
    let (_, factory) = factory(LocalSigner::new(keypair(9)));
    let mut wallet = factory.create_kind(WalletKind::SecretKey);
    let service = PaymentService::new(ledger.clone(), Network::Testnet);

    let result = service
        .send_payment(
            &summary(&sender, &keypair(77).public_key(), "1"),
            &mut wallet,
            Some(lumens(18173)),
        )
        .await;
    assert_eq!(result.message(), "Payment Failed");
    assert_eq!(
        result.error_message(),
        Some("The destination account does not exist!")
    );
    assert_eq!(ledger.submissions(), 0);
}

#[tokio::test]
async fn overspending_is_caught_by_validation() {
    let ledger = setup();
    let sender = keypair(2);
    let (_, factory) = factory(LocalSigner::new(keypair(9)));
    let mut wallet = factory.create_kind(WalletKind::SecretKey);
    let service = PaymentService::new(ledger.clone(), Network::Testnet);

    // Exactly balance - BASE_FEE is allowed.
    let all_in = lumens(100)
        .checked_sub(Amount::from_stroops(100).unwrap())
        .unwrap()
        .to_string();
    let too_much = summary(&sender, &keypair(1).public_key(), "100");
    let result = service
        .send_payment(&too_much, &mut wallet, ledger.balance(&sender.public_key()))
        .await;
    assert!(!result.is_success());
    assert_eq!(ledger.submissions(), 0);

    let result = service
        .send_payment(
            &summary(&sender, &keypair(1).public_key(), &all_in),
            &mut wallet,
            ledger.balance(&sender.public_key()),
        )
        .await;
    assert!(result.is_success(), "{result:?}");
    assert_eq!(ledger.balance(&sender.public_key()), Some(Amount::ZERO));
}

#[tokio::test]
async fn unfunded_account_overview() {
    let ledger = setup();
    let reader = AccountReader::new(ledger);
    let overview = reader.account_overview(&keypair(50).public_key()).await.unwrap();
    assert!(!overview.funded);
    assert_eq!(overview.balance, Amount::ZERO);
}

#[tokio::test]
async fn history_pagination() {
    let ledger = setup();
    let sender = keypair(1);
    let receiver = keypair(2).public_key();
    let (_, factory) = factory(LocalSigner::new(keypair(9)));
    let mut wallet = factory.create_kind(WalletKind::SecretKey);
    let service = PaymentService::new(ledger.clone(), Network::Testnet);
    for i in 1..=7 {
        let result = service
            .send_payment(
                &summary(&sender, &receiver, &i.to_string()),
                &mut wallet,
                ledger.balance(&sender.public_key()),
            )
            .await;
        assert!(result.is_success());
    }

    let history = AccountReader::new(ledger)
        .payments_history(&sender.public_key())
        .await
        .unwrap();
    // 7 payments + account creation
    assert_eq!(history.len(), 8);
    let first = paginate(&history, 1, 3);
    assert_eq!(first[0].amount, Some(lumens(7)));
    assert_eq!(paginate(&history, 3, 3).len(), 2);
    assert!(paginate(&history, 4, 3).is_empty());
}

#[tokio::test]
async fn session_survives_restart_with_file_store() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("storage.json");
    let sender = keypair(1);

    {
        let store = Arc::new(FileStore::open(&path).unwrap());
        let factory = WalletFactory::new(store, Arc::new(LocalSigner::new(keypair(9))));
        let mut wallet = factory.create("secretKey").unwrap();
        wallet.get_public_key(Some(sender.secret_seed().as_str())).await.unwrap();
    }

    let raw = std::fs::read_to_string(&path).unwrap();
    assert!(!raw.contains(sender.secret_seed().as_str()));

    let store = Arc::new(FileStore::open(&path).unwrap());
    let session = Session::new(store.clone());
    assert_eq!(session.public_key().unwrap(), Some(sender.public_key()));

    let factory = WalletFactory::new(store.clone(), Arc::new(LocalSigner::new(keypair(9))));
    let restored = factory.restore().unwrap().unwrap();
    assert_eq!(restored.kind(), WalletKind::SecretKey);
    assert!(!restored.can_sign());

    session.sign_out().unwrap();
    assert_eq!(session.public_key().unwrap(), None);
    assert!(factory.restore().unwrap().is_none());
}

#[tokio::test]
async fn restored_wallet_pays_without_switching_account() {
    let ledger = setup();
    let payer = keypair(3);
    ledger.fund(&payer.public_key(), lumens(500));

    let dir = tempfile::TempDir::new().unwrap();
    let store = Arc::new(FileStore::open(dir.path().join("storage.json")).unwrap());
    let factory = WalletFactory::new(store.clone(), Arc::new(LocalSigner::new(keypair(9))));
    factory
        .create("secretKey")
        .unwrap()
        .get_public_key(Some(keypair(1).secret_seed().as_str()))
        .await
        .unwrap();

    let mut wallet = factory.restore().unwrap().unwrap();
    let service = PaymentService::new(ledger.clone(), Network::Testnet);
    let result = service
        .send_payment(
            &summary(&payer, &keypair(2).public_key(), "5"),
            &mut wallet,
            ledger.balance(&payer.public_key()),
        )
        .await;
    assert!(result.is_success(), "{result:?}");
    assert_eq!(ledger.balance(&keypair(2).public_key()), Some(lumens(105)));

    assert_eq!(
        Session::new(store.clone()).public_key().unwrap(),
        Some(keypair(1).public_key())
    );
    assert_eq!(store.get_item(SECRET_KEY).unwrap(), None);
}

#[tokio::test]
async fn built_transaction_round_trips_through_xdr() {
    let ledger = setup();
    let sender = keypair(1);
    let service = PaymentService::new(ledger.clone(), Network::Testnet);
    let tx = service
        .build_transaction(
            &sender.public_key(),
            &keypair(2).public_key(),
            lumens(110),
            "coffee",
            100,
            30,
        )
        .await
        .unwrap();
    let mut env = TransactionEnvelope::unsigned(tx);
    crypto::sign_envelope(&mut env, &sender, Network::Testnet);

    let decoded = TransactionEnvelope::from_xdr_base64(&env.to_xdr_base64()).unwrap();
    assert_eq!(decoded.tx.source_account, sender.public_key());
    assert_eq!(decoded.tx.memo, Memo::Text("coffee".into()));
    let Operation::Payment {
        destination,
        amount,
    } = &decoded.tx.operations[0];
    assert_eq!(*destination, keypair(2).public_key());
    assert_eq!(*amount, lumens(110));
    crypto::verify_envelope(&decoded, &sender.public_key(), Network::Testnet).unwrap();
}

#[test]
fn unknown_wallet_name() {
    let (_, factory) = factory(LocalSigner::new(keypair(9)));
    assert_eq!(
        factory.create("freighter").unwrap_err(),
        WalletError::InvalidWallet("freighter".into())
    );
}

#[test]
fn sign_out_clears_memory_store() {
    let store = Arc::new(lumen_wallet::MemoryStore::new());
    let session = Session::new(store.clone());
    session.persist_wallet(WalletKind::Albedo, &keypair(3).public_key()).unwrap();
    session.sign_out().unwrap();
    assert!(store.is_empty());
}
