//! Turning requests into concrete transactions
//!
//! Pure functions of (requests, network parameters, windows); no I/O.

use super::errors::ComposerError;
use super::params::{CommonParams, OperationRequest};
use crate::config::ComposerConfig;
use crate::transaction::{
    assign_group, ApplicationCallFields, AssetConfigFields, AssetFreezeFields, AssetParams,
    AssetTransferFields, FeeParams, KeyRegistrationFields, NetworkParameters,
    OnApplicationComplete, PaymentFields, Transaction, TransactionError, TransactionHeader,
    MAX_TX_GROUP_SIZE,
};

/// Validity window for a network: wider on local development networks
pub fn default_validity_window(params: &NetworkParameters, windows: &ComposerConfig) -> u64 {
    if params.is_localnet() {
        windows.localnet_validity_window
    } else {
        windows.default_validity_window
    }
}

fn header(common: &CommonParams, params: &NetworkParameters, window: u64) -> TransactionHeader {
    let first_valid = common.first_valid_round.unwrap_or(params.last_round);
    let last_valid = common.last_valid_round.unwrap_or_else(|| {
        first_valid.saturating_add(common.validity_window.unwrap_or(window))
    });

    TransactionHeader {
        sender: common.sender,
        fee: common.static_fee,
        first_valid,
        last_valid,
        genesis_id: Some(params.genesis_id.clone()),
        genesis_hash: Some(params.genesis_hash),
        note: common.note.clone(),
        rekey_to: common.rekey_to,
        lease: common.lease,
        group: None,
    }
}

fn app_call(
    header: TransactionHeader,
    app_id: u64,
    on_complete: OnApplicationComplete,
    call: &super::params::AppCallArgs,
) -> ApplicationCallFields {
    ApplicationCallFields {
        header,
        app_id,
        on_complete,
        approval_program: None,
        clear_state_program: None,
        global_state_schema: None,
        local_state_schema: None,
        extra_program_pages: None,
        args: call.args.clone(),
        account_references: call.account_references.clone(),
        app_references: call.app_references.clone(),
        asset_references: call.asset_references.clone(),
    }
}

fn key_registration(header: TransactionHeader, non_participation: Option<bool>) -> KeyRegistrationFields {
    KeyRegistrationFields {
        header,
        vote_key: None,
        selection_key: None,
        state_proof_key: None,
        vote_first: None,
        vote_last: None,
        vote_key_dilution: None,
        non_participation,
    }
}

/// Build one transaction with its fee set
pub fn build_transaction(
    request: &OperationRequest,
    params: &NetworkParameters,
    windows: &ComposerConfig,
) -> Result<Transaction, TransactionError> {
    let window = default_validity_window(params, windows);
    let stamp = |common: &CommonParams| header(common, params, window);

    let transaction = match request {
        // Prebuilt transactions keep their own fee and validity window
        OperationRequest::Transaction { transaction, .. } => return Ok(transaction.clone()),
        OperationRequest::Payment(p) => Transaction::Payment(PaymentFields {
            header: stamp(&p.common),
            receiver: p.receiver,
            amount: p.amount,
            close_remainder_to: None,
        }),
        OperationRequest::AccountClose(p) => Transaction::Payment(PaymentFields {
            header: stamp(&p.common),
            receiver: p.common.sender,
            amount: 0,
            close_remainder_to: Some(p.close_remainder_to),
        }),
        OperationRequest::AssetTransfer(p) => Transaction::AssetTransfer(AssetTransferFields {
            header: stamp(&p.common),
            asset_id: p.asset_id,
            amount: p.amount,
            receiver: p.receiver,
            asset_sender: None,
            close_remainder_to: None,
        }),
        OperationRequest::AssetOptIn(p) => Transaction::AssetTransfer(AssetTransferFields {
            header: stamp(&p.common),
            asset_id: p.asset_id,
            amount: 0,
            receiver: p.common.sender,
            asset_sender: None,
            close_remainder_to: None,
        }),
        OperationRequest::AssetOptOut(p) => Transaction::AssetTransfer(AssetTransferFields {
            header: stamp(&p.common),
            asset_id: p.asset_id,
            amount: 0,
            receiver: p.common.sender,
            asset_sender: None,
            close_remainder_to: p.close_remainder_to,
        }),
        OperationRequest::AssetClawback(p) => Transaction::AssetTransfer(AssetTransferFields {
            header: stamp(&p.common),
            asset_id: p.asset_id,
            amount: p.amount,
            receiver: p.receiver,
            asset_sender: Some(p.clawback_target),
            close_remainder_to: None,
        }),
        OperationRequest::AssetCreate(p) => Transaction::AssetConfig(AssetConfigFields {
            header: stamp(&p.common),
            asset_id: 0,
            params: Some(p.asset_params()),
        }),
        OperationRequest::AssetReconfigure(p) => Transaction::AssetConfig(AssetConfigFields {
            header: stamp(&p.common),
            asset_id: p.asset_id,
            params: Some(AssetParams {
                manager: p.manager,
                reserve: p.reserve,
                freeze: p.freeze,
                clawback: p.clawback,
                ..Default::default()
            }),
        }),
        OperationRequest::AssetDestroy(p) => Transaction::AssetConfig(AssetConfigFields {
            header: stamp(&p.common),
            asset_id: p.asset_id,
            params: None,
        }),
        OperationRequest::AssetFreeze(p) => Transaction::AssetFreeze(AssetFreezeFields {
            header: stamp(&p.common),
            asset_id: p.asset_id,
            freeze_target: p.target,
            frozen: true,
        }),
        OperationRequest::AssetUnfreeze(p) => Transaction::AssetFreeze(AssetFreezeFields {
            header: stamp(&p.common),
            asset_id: p.asset_id,
            freeze_target: p.target,
            frozen: false,
        }),
        OperationRequest::AppCall(p) => {
            Transaction::ApplicationCall(app_call(stamp(&p.common), p.app_id, p.on_complete, &p.call))
        }
        OperationRequest::AppCreate(p) => {
            let mut fields = app_call(stamp(&p.common), 0, p.on_complete, &p.call);
            fields.approval_program = Some(p.approval_program.clone());
            fields.clear_state_program = Some(p.clear_state_program.clone());
            fields.global_state_schema = p.global_state_schema;
            fields.local_state_schema = p.local_state_schema;
            fields.extra_program_pages = p.extra_program_pages;
            Transaction::ApplicationCall(fields)
        }
        OperationRequest::AppUpdate(p) => {
            let mut fields = app_call(
                stamp(&p.common),
                p.app_id,
                OnApplicationComplete::UpdateApplication,
                &p.call,
            );
            fields.approval_program = Some(p.approval_program.clone());
            fields.clear_state_program = Some(p.clear_state_program.clone());
            Transaction::ApplicationCall(fields)
        }
        OperationRequest::AppDelete(p) => Transaction::ApplicationCall(app_call(
            stamp(&p.common),
            p.app_id,
            OnApplicationComplete::DeleteApplication,
            &p.call,
        )),
        OperationRequest::OnlineKeyRegistration(p) => {
            let mut fields = key_registration(stamp(&p.common), None);
            fields.vote_key = Some(p.vote_key);
            fields.selection_key = Some(p.selection_key);
            fields.state_proof_key = p.state_proof_key.clone();
            fields.vote_first = Some(p.vote_first);
            fields.vote_last = Some(p.vote_last);
            fields.vote_key_dilution = Some(p.vote_key_dilution);
            Transaction::KeyRegistration(fields)
        }
        OperationRequest::OfflineKeyRegistration(p) => {
            Transaction::KeyRegistration(key_registration(stamp(&p.common), None))
        }
        OperationRequest::NonParticipationKeyRegistration(p) => {
            Transaction::KeyRegistration(key_registration(stamp(&p.common), Some(true)))
        }
    };

    match request.common() {
        Some(common) if common.static_fee.is_none() => transaction.assign_fee(FeeParams {
            fee_per_byte: params.fee_per_byte,
            min_fee: params.min_fee,
            extra_fee: common.extra_fee,
            max_fee: common.max_fee,
        }),
        _ => Ok(transaction),
    }
}

/// Build every request in order; more than one transaction gets a shared
/// group id, a single transaction stays ungrouped.
pub fn build_group(
    requests: &[OperationRequest],
    params: &NetworkParameters,
    windows: &ComposerConfig,
) -> Result<Vec<Transaction>, ComposerError> {
    if requests.len() > MAX_TX_GROUP_SIZE {
        return Err(ComposerError::GroupSizeExceeded {
            size: requests.len(),
            max: MAX_TX_GROUP_SIZE,
        });
    }

    let transactions = requests
        .iter()
        .map(|request| build_transaction(request, params, windows))
        .collect::<Result<Vec<_>, _>>()?;

    if transactions.len() > 1 {
        Ok(assign_group(transactions)?)
    } else {
        Ok(transactions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composer::params::{
        AccountCloseParams, AssetCreateParams, AssetOptOutParams, PaymentParams,
    };
    use crate::transaction::Address;

    fn network(genesis_id: &str) -> NetworkParameters {
        NetworkParameters {
            consensus_version: "v40".to_string(),
            fee_per_byte: 0,
            min_fee: 1000,
            genesis_id: genesis_id.to_string(),
            genesis_hash: [5u8; 32],
            last_round: 1_000,
        }
    }

    fn payment(amount: u64) -> OperationRequest {
        PaymentParams {
            common: CommonParams::new(Address([1u8; 32])),
            receiver: Address([2u8; 32]),
            amount,
        }
        .into()
    }

    #[test]
    fn test_default_window_and_genesis_binding() {
        let tx = build_transaction(&payment(1), &network("testnet-v1.0"), &ComposerConfig::default()).unwrap();
        let header = tx.header();
        assert_eq!(header.first_valid, 1_000);
        assert_eq!(header.last_valid, 1_010);
        assert_eq!(header.genesis_id.as_deref(), Some("testnet-v1.0"));
        assert_eq!(header.genesis_hash, Some([5u8; 32]));
        assert_eq!(header.fee, Some(1000));
    }

    #[test]
    fn test_localnet_window() {
        let tx = build_transaction(&payment(1), &network("dockernet-v1"), &ComposerConfig::default()).unwrap();
        assert_eq!(tx.header().last_valid, 2_000);
    }

    #[test]
    fn test_explicit_validity_is_respected() {
        let mut common = CommonParams::new(Address([1u8; 32]));
        common.first_valid_round = Some(50);
        common.validity_window = Some(5);
        let request: OperationRequest = PaymentParams {
            common: common.clone(),
            receiver: Address([2u8; 32]),
            amount: 1,
        }
        .into();
        let tx = build_transaction(&request, &network("testnet-v1.0"), &ComposerConfig::default()).unwrap();
        assert_eq!((tx.header().first_valid, tx.header().last_valid), (50, 55));

        common.last_valid_round = Some(80);
        let request: OperationRequest = PaymentParams {
            common,
            receiver: Address([2u8; 32]),
            amount: 1,
        }
        .into();
        let tx = build_transaction(&request, &network("testnet-v1.0"), &ComposerConfig::default()).unwrap();
        assert_eq!(tx.header().last_valid, 80);
    }

    #[test]
    fn test_static_fee_skips_calculation() {
        let mut common = CommonParams::new(Address([1u8; 32]));
        common.static_fee = Some(3);
        let request: OperationRequest = AccountCloseParams {
            common,
            close_remainder_to: Address([4u8; 32]),
        }
        .into();
        let tx = build_transaction(&request, &network("testnet-v1.0"), &ComposerConfig::default()).unwrap();
        assert_eq!(tx.header().fee, Some(3));
        let Transaction::Payment(pay) = tx else {
            panic!("expected payment");
        };
        assert_eq!(pay.receiver, Address([1u8; 32]));
        assert_eq!(pay.close_remainder_to, Some(Address([4u8; 32])));
    }

    #[test]
    fn test_max_fee_is_enforced() {
        let mut common = CommonParams::new(Address([1u8; 32]));
        common.max_fee = Some(500);
        let request: OperationRequest = AssetOptOutParams {
            common,
            asset_id: 9,
            close_remainder_to: None,
        }
        .into();
        assert!(matches!(
            build_transaction(&request, &network("testnet-v1.0"), &ComposerConfig::default()),
            Err(TransactionError::MaxFeeExceeded { fee: 1000, max_fee: 500 })
        ));
    }

    #[test]
    fn test_asset_create_has_zero_id() {
        let request: OperationRequest = AssetCreateParams {
            common: CommonParams::new(Address([1u8; 32])),
            total: 1_000,
            decimals: Some(2),
            unit_name: Some("UNIT".to_string()),
            ..Default::default()
        }
        .into();
        let tx = build_transaction(&request, &network("testnet-v1.0"), &ComposerConfig::default()).unwrap();
        let Transaction::AssetConfig(cfg) = tx else {
            panic!("expected asset config");
        };
        assert_eq!(cfg.asset_id, 0);
        assert_eq!(cfg.params.and_then(|p| p.total), Some(1_000));
    }

    #[test]
    fn test_prebuilt_transaction_is_not_restamped() {
        let prebuilt = build_transaction(&payment(7), &network("testnet-v1.0"), &ComposerConfig::default()).unwrap();

        let mut later = network("dockernet-v1");
        later.last_round = 5_000;
        later.min_fee = 2_000;
        let request: OperationRequest = prebuilt.clone().into();
        let rebuilt = build_transaction(&request, &later, &ComposerConfig::default()).unwrap();

        assert_eq!(rebuilt, prebuilt);
        assert_eq!(rebuilt.header().first_valid, 1_000);
        assert_eq!(rebuilt.header().fee, Some(1000));
    }

    #[test]
    fn test_single_transaction_is_ungrouped() {
        let txs = build_group(&[payment(1)], &network("testnet-v1.0"), &ComposerConfig::default()).unwrap();
        assert_eq!(txs.len(), 1);
        assert!(txs[0].header().group.is_none());
    }

    #[test]
    fn test_group_is_shared_and_order_sensitive() {
        let params = network("testnet-v1.0");
        let windows = ComposerConfig::default();
        let forward = build_group(&[payment(1), payment(2), payment(3)], &params, &windows).unwrap();
        let group = forward[0].header().group;
        assert!(group.is_some());
        assert!(forward.iter().all(|tx| tx.header().group == group));

        let reversed = build_group(&[payment(3), payment(2), payment(1)], &params, &windows).unwrap();
        assert_ne!(reversed[0].header().group, group);

        let changed = build_group(&[payment(1), payment(2), payment(4)], &params, &windows).unwrap();
        assert_ne!(changed[0].header().group, group);
    }

    #[test]
    fn test_oversized_group() {
        let requests: Vec<_> = (0..=MAX_TX_GROUP_SIZE as u64).map(payment).collect();
        assert!(matches!(
            build_group(&requests, &network("testnet-v1.0"), &ComposerConfig::default()),
            Err(ComposerError::GroupSizeExceeded { size: 17, max: 16 })
        ));
    }
}
