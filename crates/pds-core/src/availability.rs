use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Retailer/supplier context an availability row was fetched under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplierInfo {
    pub retailer_id: String,
    pub retailer_gln: String,
    pub supplier_id: i64,
    pub supplier_gln: String,
    pub supplier_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemType {
    Pair,
    Set,
}

impl ItemType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ItemType::Pair => "Pair",
            ItemType::Set => "Set",
        }
    }

    /// GlobalStock encodes pairs as `type == 1`; every other code is a set.
    #[must_use]
    pub fn from_stock_type_code(code: i64) -> Self {
        if code == 1 {
            ItemType::Pair
        } else {
            ItemType::Set
        }
    }
}

impl std::fmt::Display for ItemType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ItemType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pair" => Ok(ItemType::Pair),
            "Set" => Ok(ItemType::Set),
            other => Err(format!("unknown item type: {other}")),
        }
    }
}

/// Stock and price for one EAN at one supplier, seen from one retailer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EanAvailability {
    pub ean: String,
    pub supplier: SupplierInfo,
    pub quantity: i32,
    pub price: Option<Decimal>,
    pub stock_traffic_light: Option<String>,
    pub item_type: ItemType,
    pub stock_timestamp: Option<DateTime<Utc>>,
}

impl EanAvailability {
    #[must_use]
    pub fn key(&self) -> EanAvailabilityKey {
        EanAvailabilityKey {
            ean: self.ean.clone(),
            retailer_id: self.supplier.retailer_id.clone(),
            supplier_id: self.supplier.supplier_id,
        }
    }
}

/// Natural key of `pds_gtins_stock`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EanAvailabilityKey {
    pub ean: String,
    pub retailer_id: String,
    pub supplier_id: i64,
}

impl std::fmt::Display for EanAvailabilityKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.ean, self.retailer_id, self.supplier_id
        )
    }
}

#[derive(Debug, Clone, Default)]
pub struct AvailabilityFilter {
    pub supplier_gln: Option<String>,
    pub retailer_gln: Option<String>,
    pub limit: Option<i64>,
}
