use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;

use crate::availability::SupplierInfo;
use crate::ConfigError;

/// One validated supplier entry from the suppliers file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupplierConfig {
    pub supplier_id: i64,
    pub supplier_gln: String,
    pub supplier_name: String,
}

impl SupplierConfig {
    /// Combine this supplier with the configured retailer identity.
    #[must_use]
    pub fn supplier_info(&self, retailer_id: &str, retailer_gln: &str) -> SupplierInfo {
        SupplierInfo {
            retailer_id: retailer_id.to_string(),
            retailer_gln: retailer_gln.to_string(),
            supplier_id: self.supplier_id,
            supplier_gln: self.supplier_gln.clone(),
            supplier_name: self.supplier_name.clone(),
        }
    }
}

/// Entry as it appears on disk. Both snake_case and SCREAMING_CASE keys are
/// accepted, and the GLN may be written as a number.
#[derive(Debug, Deserialize)]
struct RawSupplierEntry {
    #[serde(alias = "SUPPLIER_ID")]
    supplier_id: Option<i64>,
    #[serde(alias = "SUPPLIER_GLN")]
    supplier_gln: Option<GlnValue>,
    #[serde(alias = "SUPPLIER_NAME")]
    supplier_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum GlnValue {
    Text(String),
    Number(u64),
}

impl GlnValue {
    fn into_string(self) -> String {
        match self {
            GlnValue::Text(s) => s.trim().to_string(),
            GlnValue::Number(n) => n.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SuppliersFile {
    Wrapped { suppliers: Vec<RawSupplierEntry> },
    List(Vec<RawSupplierEntry>),
}

/// Load and validate the supplier list from a JSON or YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_suppliers(path: &Path) -> Result<Vec<SupplierConfig>, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::SuppliersFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    parse_suppliers(&content)
}

fn parse_suppliers(content: &str) -> Result<Vec<SupplierConfig>, ConfigError> {
    let file: SuppliersFile =
        serde_yaml::from_str(content).map_err(ConfigError::SuppliersFileParse)?;

    let raw = match file {
        SuppliersFile::Wrapped { suppliers } => suppliers,
        SuppliersFile::List(list) => list,
    };

    validate_suppliers(raw)
}

fn validate_suppliers(raw: Vec<RawSupplierEntry>) -> Result<Vec<SupplierConfig>, ConfigError> {
    if raw.is_empty() {
        return Err(ConfigError::Validation(
            "suppliers file contains no suppliers".to_string(),
        ));
    }

    let mut seen_ids = HashSet::new();
    let mut suppliers = Vec::with_capacity(raw.len());

    for (index, entry) in raw.into_iter().enumerate() {
        let supplier_id = entry.supplier_id.ok_or_else(|| {
            ConfigError::Validation(format!("supplier #{index} is missing supplier_id"))
        })?;

        let supplier_gln = entry
            .supplier_gln
            .map(GlnValue::into_string)
            .ok_or_else(|| {
                ConfigError::Validation(format!("supplier {supplier_id} is missing supplier_gln"))
            })?;
        if supplier_gln.is_empty() {
            return Err(ConfigError::Validation(format!(
                "supplier {supplier_id} has an empty supplier_gln"
            )));
        }

        let supplier_name = entry
            .supplier_name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .ok_or_else(|| {
                ConfigError::Validation(format!(
                    "supplier {supplier_id} is missing supplier_name"
                ))
            })?;

        if !seen_ids.insert(supplier_id) {
            return Err(ConfigError::Validation(format!(
                "duplicate supplier_id: {supplier_id}"
            )));
        }

        suppliers.push(SupplierConfig {
            supplier_id,
            supplier_gln,
            supplier_name,
        });
    }

    Ok(suppliers)
}
