//! Application manager
//!
//! TEAL compilation with a content-addressed cache, template compilation,
//! and decoded reads of global and local application state.

pub mod errors;
pub mod state;
pub mod template;

pub use errors::{AppError, StateDecodeError, TemplateError};
pub use state::{decode_app_state, AppState, AppStateValue};
pub use template::{
    find_unquoted, replace_deploy_time_controls, replace_template_variables, strip_teal_comments,
    DeploymentControls, TemplateParams, TemplateValue, DELETABLE_TEMPLATE_NAME,
    UPDATABLE_TEMPLATE_NAME,
};

use crate::metrics::SdkMetrics;
use crate::node::NodeApi;
use crate::transaction::{sha512_256, Address};
use base64::{engine::general_purpose::STANDARD, Engine};
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

const APP_ID_PREFIX: &[u8] = b"appID";

/// Escrow address controlled by an application
pub fn app_address(app_id: u64) -> Address {
    let mut preimage = APP_ID_PREFIX.to_vec();
    preimage.extend_from_slice(&app_id.to_be_bytes());
    Address(sha512_256(&preimage))
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompiledTeal {
    pub teal: String,
    /// Base64 as returned by the node
    pub compiled: String,
    pub compiled_hash: String,
    pub compiled_bytes: Vec<u8>,
    pub source_map: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppInformation {
    pub app_id: u64,
    pub app_address: Address,
    pub approval_program: Vec<u8>,
    pub clear_state_program: Vec<u8>,
    pub creator: String,
    pub local_ints: u64,
    pub local_byte_slices: u64,
    pub global_ints: u64,
    pub global_byte_slices: u64,
    pub extra_program_pages: u32,
    pub global_state: HashMap<String, AppState>,
}

pub struct AppManager {
    node: Arc<dyn NodeApi>,
    /// Keyed by hex SHA-512/256 of the exact source. Append-only.
    compilation_results: DashMap<String, CompiledTeal>,
    metrics: Option<Arc<SdkMetrics>>,
}

impl AppManager {
    pub fn new(node: Arc<dyn NodeApi>) -> Self {
        Self {
            node,
            compilation_results: DashMap::new(),
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<SdkMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    fn cache_key(teal: &str) -> String {
        hex::encode(sha512_256(teal.as_bytes()))
    }

    pub async fn compile_teal(&self, teal: &str) -> Result<CompiledTeal, AppError> {
        let key = Self::cache_key(teal);
        if let Some(cached) = self.compilation_results.get(&key) {
            if let Some(metrics) = &self.metrics {
                metrics.compile_cache_hits.inc();
            }
            debug!(cache_key = %key, "Compile cache hit");
            return Ok(cached.clone());
        }
        if let Some(metrics) = &self.metrics {
            metrics.compile_cache_misses.inc();
        }

        let response = self.node.compile_program(teal).await?;
        let compiled_bytes = STANDARD
            .decode(&response.result)
            .map_err(|e| AppError::InvalidProgram(e.to_string()))?;

        let compiled = CompiledTeal {
            teal: teal.to_string(),
            compiled: response.result,
            compiled_hash: response.hash,
            compiled_bytes,
            source_map: response.sourcemap,
        };
        debug!(cache_key = %key, hash = %compiled.compiled_hash, "Program compiled");
        self.compilation_results.insert(key, compiled.clone());
        Ok(compiled)
    }

    /// Strip comments, substitute placeholders, apply deploy-time controls,
    /// then compile.
    pub async fn compile_teal_template(
        &self,
        template: &str,
        params: Option<&TemplateParams>,
        controls: Option<&DeploymentControls>,
    ) -> Result<CompiledTeal, AppError> {
        let mut teal = strip_teal_comments(template);
        if let Some(params) = params {
            teal = replace_template_variables(&teal, params);
        }
        if let Some(controls) = controls {
            teal = replace_deploy_time_controls(&teal, controls)?;
        }
        self.compile_teal(&teal).await
    }

    /// Cached result for exactly this source, if it was compiled before
    pub fn get_compilation_result(&self, teal: &str) -> Option<CompiledTeal> {
        self.compilation_results
            .get(&Self::cache_key(teal))
            .map(|entry| entry.clone())
    }

    pub async fn get_by_id(&self, app_id: u64) -> Result<AppInformation, AppError> {
        let app = self.node.application_by_id(app_id).await?;
        let params = app.params;
        Ok(AppInformation {
            app_id,
            app_address: app_address(app_id),
            global_state: decode_app_state(&params.global_state)?,
            approval_program: params.approval_program,
            clear_state_program: params.clear_state_program,
            creator: params.creator,
            local_ints: params.local_state_schema.num_uint,
            local_byte_slices: params.local_state_schema.num_byte_slice,
            global_ints: params.global_state_schema.num_uint,
            global_byte_slices: params.global_state_schema.num_byte_slice,
            extra_program_pages: params.extra_program_pages.unwrap_or_default(),
        })
    }

    pub async fn get_global_state(&self, app_id: u64) -> Result<HashMap<String, AppState>, AppError> {
        Ok(self.get_by_id(app_id).await?.global_state)
    }

    pub async fn get_local_state(
        &self,
        app_id: u64,
        address: &Address,
    ) -> Result<HashMap<String, AppState>, AppError> {
        let info = self.node.account_application_information(address, app_id).await?;
        let local_state = info.app_local_state.ok_or(AppError::LocalStateNotFound {
            address: *address,
            app_id,
        })?;
        Ok(decode_app_state(&local_state.key_value)?)
    }
}

impl std::fmt::Debug for AppManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppManager")
            .field("cached_programs", &self.compilation_results.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{
        Application, ApplicationLocalState, ApplicationParams, ApplicationStateSchema, TealKeyValue,
        TealValue,
    };
    use crate::test_utils::MockNode;

    fn manager() -> (Arc<MockNode>, AppManager) {
        let node = Arc::new(MockNode::new());
        (node.clone(), AppManager::new(node))
    }

    fn uint_entry(key: &[u8], uint: u64) -> TealKeyValue {
        TealKeyValue {
            key: STANDARD.encode(key),
            value: TealValue {
                value_type: 2,
                bytes: String::new(),
                uint,
            },
        }
    }

    #[tokio::test]
    async fn test_compile_is_cached_by_source() {
        let (node, manager) = manager();
        let metrics = Arc::new(SdkMetrics::new().unwrap());
        let manager = manager.with_metrics(metrics.clone());

        let first = manager.compile_teal("#pragma version 8\nint 1").await.unwrap();
        let second = manager.compile_teal("#pragma version 8\nint 1").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.compiled_bytes, b"#pragma version 8\nint 1");
        assert_eq!(node.compile_calls(), 1);
        assert_eq!(metrics.compile_cache_hits.get(), 1);
        assert_eq!(metrics.compile_cache_misses.get(), 1);

        assert!(manager.get_compilation_result("#pragma version 8\nint 1").is_some());
        assert!(manager.get_compilation_result("int 2").is_none());
    }

    #[tokio::test]
    async fn test_compile_template() {
        let (_node, manager) = manager();
        let params: TemplateParams = [("VALUE".to_string(), TemplateValue::Int(42))].into();
        let controls = DeploymentControls {
            updatable: Some(true),
            deletable: Some(false),
        };

        let compiled = manager
            .compile_teal_template(
                "#pragma version 3 // header\npushint TMPL_VALUE\npushint TMPL_UPDATABLE\npushint TMPL_DELETABLE",
                Some(&params),
                Some(&controls),
            )
            .await
            .unwrap();
        assert_eq!(compiled.teal, "#pragma version 3\npushint 42\npushint 1\npushint 0");
        assert!(manager.get_compilation_result(&compiled.teal).is_some());
    }

    #[tokio::test]
    async fn test_missing_deploy_control_fails_before_compile() {
        let (node, manager) = manager();
        let err = manager
            .compile_teal_template(
                "int 1",
                None,
                Some(&DeploymentControls {
                    deletable: Some(true),
                    ..Default::default()
                }),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Template(_)));
        assert_eq!(node.compile_calls(), 0);
    }

    #[tokio::test]
    async fn test_global_and_local_state() {
        let (node, manager) = manager();
        let holder = Address([9u8; 32]);
        node.set_application(Application {
            id: 77,
            params: ApplicationParams {
                creator: holder.to_string(),
                approval_program: vec![1],
                clear_state_program: vec![2],
                global_state: vec![uint_entry(b"g", 5)],
                global_state_schema: ApplicationStateSchema {
                    num_uint: 1,
                    num_byte_slice: 0,
                },
                local_state_schema: ApplicationStateSchema::default(),
                extra_program_pages: None,
            },
        });
        node.set_local_state(
            holder,
            ApplicationLocalState {
                id: 77,
                key_value: vec![uint_entry(b"l", 6)],
                schema: ApplicationStateSchema::default(),
            },
        );

        let info = manager.get_by_id(77).await.unwrap();
        assert_eq!(info.app_address, app_address(77));
        assert_eq!(info.global_ints, 1);

        let global = manager.get_global_state(77).await.unwrap();
        assert_eq!(global[&STANDARD.encode(b"g")].as_uint(), Some(5));

        let local = manager.get_local_state(77, &holder).await.unwrap();
        assert_eq!(local[&STANDARD.encode(b"l")].as_uint(), Some(6));

        let stranger = Address([3u8; 32]);
        assert_eq!(
            manager.get_local_state(77, &stranger).await.unwrap_err(),
            AppError::LocalStateNotFound {
                address: stranger,
                app_id: 77
            }
        );
    }

    #[test]
    fn test_app_address_is_stable() {
        assert_eq!(app_address(1), app_address(1));
        assert_ne!(app_address(1), app_address(2));
    }
}
