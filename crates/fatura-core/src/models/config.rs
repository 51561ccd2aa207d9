//! Per-customer processing configuration.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;
use tracing::info;

use crate::error::{PipelineError, Result};
use crate::models::invoice::{Currency, Language};

/// Processing policy for one customer.
///
/// Loaded once at session start and read-only thereafter. Hot reload means
/// publishing a new instance, never mutating a shared one, so concurrent
/// readers can never observe a partially-updated configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerConfig {
    /// Unique customer identifier.
    pub customer_id: String,

    /// Display name.
    pub customer_name: String,

    /// ERP connector kind: excel, csv, sap_sftp_xml, oracle_rest, webhook.
    pub connector_type: String,

    /// Connector-specific settings, passed through untouched.
    #[serde(default)]
    pub connector_config: Map<String, Value>,

    /// Forward accepted invoices without human intervention.
    #[serde(default = "default_true")]
    pub auto_process: bool,

    /// Hold accepted invoices for manual approval.
    #[serde(default)]
    pub require_approval: bool,

    /// Languages this customer's documents may arrive in.
    #[serde(default = "default_languages")]
    pub languages: Vec<Language>,

    /// Currency assumed when the document does not state one.
    #[serde(default)]
    pub default_currency: Currency,

    /// Path to the customer's vendor mapping file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vendor_mapping_file: Option<String>,
}

fn default_true() -> bool {
    true
}

fn default_languages() -> Vec<Language> {
    vec![Language::Ar, Language::En]
}

impl CustomerConfig {
    /// Check required fields.
    pub fn validate(&self) -> Result<()> {
        if self.customer_id.trim().is_empty() {
            return Err(PipelineError::Configuration {
                message: "customer_id must not be empty".to_string(),
                config_file: None,
            });
        }
        if self.customer_name.trim().is_empty() {
            return Err(PipelineError::Configuration {
                message: "customer_name must not be empty".to_string(),
                config_file: None,
            });
        }
        Ok(())
    }

    /// Load and validate a customer configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let source = path.display().to_string();
        let content = std::fs::read_to_string(path).map_err(|e| PipelineError::Configuration {
            message: format!("failed to read configuration: {e}"),
            config_file: Some(source.clone()),
        })?;
        let config: Self =
            serde_json::from_str(&content).map_err(|e| PipelineError::Configuration {
                message: format!("failed to parse configuration: {e}"),
                config_file: Some(source.clone()),
            })?;
        config.validate()?;
        info!(customer_id = %config.customer_id, config_file = %source, "customer configuration loaded");
        Ok(config)
    }
}
