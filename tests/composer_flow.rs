//! End-to-end composer cycles
//!
//! - HTTP node behind mockito: params, submission retry, confirmation
//! - In-memory node: group ids, explicit signers, created asset/app ids

use algo_composer::composer::{
    AppCallArgs, AppCreateParams, AssetCreateParams, CommonParams, ComposerError, ComposerSettings,
    PaymentParams, SendParams, TransactionComposer,
};
use algo_composer::node::HttpNodeClient;
use algo_composer::signer::{SignerRegistry, SigningCredential};
use algo_composer::test_utils::{MockNode, FIRST_CREATED_ID};
use algo_composer::transaction::{Address, OnApplicationComplete, SignatureArtifact, Transaction};
use algo_composer::transport::RetryConfig;
use ed25519_dalek::SigningKey;
use mockito::Matcher;
use std::sync::Arc;
use std::time::Duration;

const PARAMS_BODY: &str = r#"{
    "consensus-version": "future",
    "fee": 0,
    "genesis-hash": "AQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQE=",
    "genesis-id": "testnet-v1.0",
    "last-round": 500,
    "min-fee": 1000
}"#;

fn settings() -> ComposerSettings {
    ComposerSettings {
        poll_interval: Duration::from_millis(5),
        ..Default::default()
    }
}

fn http_client(server: &mockito::ServerGuard) -> Arc<HttpNodeClient> {
    Arc::new(
        HttpNodeClient::new(
            server.url(),
            Some("token".to_string()),
            Duration::from_secs(5),
            RetryConfig {
                max_attempts: 3,
                base_backoff_ms: 1,
                max_backoff_ms: 5,
            },
        )
        .unwrap(),
    )
}

fn pay(from: Address, to: Address, amount: u64) -> PaymentParams {
    PaymentParams {
        common: CommonParams::new(from),
        receiver: to,
        amount,
    }
}

#[tokio::test]
async fn test_http_cycle_with_submission_retry() {
    let mut server = mockito::Server::new_async().await;
    let params = server
        .mock("GET", "/v2/transactions/params")
        .with_status(200)
        .with_body(PARAMS_BODY)
        .expect(1)
        .create_async()
        .await;
    let busy = server
        .mock("POST", "/v2/transactions")
        .with_status(503)
        .expect(1)
        .create_async()
        .await;
    let accepted = server
        .mock("POST", "/v2/transactions")
        .with_status(200)
        .with_body(r#"{"txId":"IGNORED"}"#)
        .expect(1)
        .create_async()
        .await;
    let pending = server
        .mock("GET", Matcher::Regex(r"^/v2/transactions/pending/".to_string()))
        .with_status(200)
        .with_body(r#"{"confirmed-round": 501, "pool-error": ""}"#)
        .expect(2)
        .create_async()
        .await;

    let registry = SignerRegistry::new();
    let alice = registry.add_credential(SigningCredential::from_seed([1u8; 32]));
    let bob = registry.add_credential(SigningCredential::from_seed([2u8; 32]));

    let mut composer = TransactionComposer::new(http_client(&server), registry).with_settings(settings());
    composer.add(pay(alice, bob, 10)).unwrap();
    composer.add(pay(bob, alice, 4)).unwrap();
    let results = composer.send(SendParams::default()).await.unwrap();

    assert!(results.group_id.is_some());
    assert!(results.all_confirmed());
    assert_eq!(results.transaction_ids.len(), 2);
    for result in &results.results {
        assert_eq!(result.settlement().unwrap().confirmed_round, 501);
        assert_eq!(result.transaction.header().first_valid, 500);
        assert_eq!(result.transaction.header().last_valid, 510);
        assert_eq!(result.transaction.header().fee, Some(1000));
    }

    params.assert_async().await;
    busy.assert_async().await;
    accepted.assert_async().await;
    pending.assert_async().await;
}

#[tokio::test]
async fn test_http_rejection_skips_polling() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/v2/transactions/params")
        .with_status(200)
        .with_body(PARAMS_BODY)
        .create_async()
        .await;
    let rejected = server
        .mock("POST", "/v2/transactions")
        .with_status(400)
        .with_body(r#"{"message":"overspend"}"#)
        .expect(1)
        .create_async()
        .await;
    let pending = server
        .mock("GET", Matcher::Regex(r"^/v2/transactions/pending/".to_string()))
        .expect(0)
        .create_async()
        .await;

    let registry = SignerRegistry::new();
    let alice = registry.add_credential(SigningCredential::from_seed([1u8; 32]));
    let mut composer = TransactionComposer::new(http_client(&server), registry).with_settings(settings());
    composer.add(pay(alice, alice, 1)).unwrap();

    let err = composer.send(SendParams::default()).await.unwrap_err();
    assert_eq!(
        err,
        ComposerError::NodeRejected {
            status: 400,
            message: "overspend".to_string()
        }
    );
    rejected.assert_async().await;
    pending.assert_async().await;
}

#[tokio::test]
async fn test_group_id_depends_on_order() {
    let node = Arc::new(MockNode::new());
    let registry = SignerRegistry::new();
    let alice = registry.add_credential(SigningCredential::from_seed([1u8; 32]));
    let bob = registry.add_credential(SigningCredential::from_seed([2u8; 32]));

    let mut forward = TransactionComposer::new(node.clone(), registry.clone());
    forward.add(pay(alice, bob, 1)).unwrap().add(pay(bob, alice, 2)).unwrap();
    let mut reversed = TransactionComposer::new(node.clone(), registry.clone());
    reversed.add(pay(bob, alice, 2)).unwrap().add(pay(alice, bob, 1)).unwrap();

    let forward = forward.build().await.unwrap();
    let reversed = reversed.build().await.unwrap();
    assert_eq!(forward[0].header().group, forward[1].header().group);
    assert_ne!(forward[0].header().group, reversed[0].header().group);
}

#[tokio::test]
async fn test_explicit_multisig_signer_bypasses_registry() {
    let node = Arc::new(MockNode::new());
    let keys: Vec<SigningKey> = (1u8..=3).map(|i| SigningKey::from_bytes(&[i; 32])).collect();
    let multisig = SigningCredential::Multisig {
        version: 1,
        threshold: 2,
        participants: keys.iter().map(|k| k.verifying_key().to_bytes()).collect(),
        keys: keys[..2].to_vec(),
    };
    let multisig_address = multisig.address();

    let mut composer = TransactionComposer::new(node.clone(), SignerRegistry::new()).with_settings(settings());
    composer
        .add(PaymentParams {
            common: CommonParams::new(multisig_address).with_signer(Arc::new(multisig)),
            receiver: Address([7u8; 32]),
            amount: 3,
        })
        .unwrap();
    let results = composer.send(SendParams::default()).await.unwrap();
    assert!(results.all_confirmed());

    let submitted = &node.submitted_groups()[0][0];
    match &submitted.signature {
        SignatureArtifact::Multisig(msig) => assert_eq!(msig.signature_count(), 2),
        other => panic!("expected multisig, got {other:?}"),
    }
    assert!(submitted.auth_address.is_none());
}

#[tokio::test]
async fn test_created_ids_reported_in_order() {
    let node = Arc::new(MockNode::new());
    let registry = SignerRegistry::new();
    let creator = registry.add_credential(SigningCredential::from_seed([6u8; 32]));

    let mut composer = TransactionComposer::new(node.clone(), registry).with_settings(settings());
    composer
        .add(AssetCreateParams {
            common: CommonParams::new(creator).with_note("launch"),
            total: 1_000_000,
            decimals: Some(6),
            asset_name: Some("Token".to_string()),
            unit_name: Some("TOK".to_string()),
            ..Default::default()
        })
        .unwrap();
    composer
        .add(AppCreateParams {
            common: CommonParams::new(creator),
            on_complete: OnApplicationComplete::NoOp,
            approval_program: vec![0x08, 0x81, 0x01],
            clear_state_program: vec![0x08, 0x81, 0x01],
            global_state_schema: None,
            local_state_schema: None,
            extra_program_pages: None,
            call: AppCallArgs::default(),
        })
        .unwrap();

    let results = composer.send(SendParams::default()).await.unwrap();
    let asset = results.results[0].settlement().unwrap();
    let app = results.results[1].settlement().unwrap();
    assert_eq!(asset.asset_id, Some(FIRST_CREATED_ID));
    assert_eq!(app.app_id, Some(FIRST_CREATED_ID + 1));
    assert!(matches!(results.results[0].transaction, Transaction::AssetConfig(_)));
}

#[tokio::test]
async fn test_prebuilt_transaction_joins_group() {
    let node = Arc::new(MockNode::new());
    let registry = SignerRegistry::new();
    let alice = registry.add_credential(SigningCredential::from_seed([1u8; 32]));

    let mut draft = TransactionComposer::new(node.clone(), registry.clone());
    draft.add(pay(alice, alice, 42)).unwrap();
    let prebuilt = draft.build().await.unwrap().remove(0);

    let mut composer = TransactionComposer::new(node.clone(), registry).with_settings(settings());
    composer.add(prebuilt).unwrap();
    composer.add(pay(alice, alice, 1)).unwrap();
    let results = composer.send(SendParams::default()).await.unwrap();

    assert_eq!(results.len(), 2);
    let group = results.group_id.unwrap();
    for signed in &node.submitted_groups()[0] {
        assert_eq!(signed.transaction.header().group, Some(group));
    }
}
