//! Mapping of raw GlobalStock entries into [`EanAvailability`] rows.

use pds_core::{EanAvailability, ItemType, Mapper, MappingError, SupplierInfo};

use crate::ecc::normalize::{parse_timestamp, price as checked_price};
use crate::global_stock::types::{StockEntry, StockRecord};

/// Maps stock entries for one supplier/retailer context.
#[derive(Debug, Clone)]
pub struct StockMapper {
    supplier: SupplierInfo,
}

impl StockMapper {
    #[must_use]
    pub fn new(supplier: SupplierInfo) -> Self {
        Self { supplier }
    }
}

impl Mapper for StockMapper {
    type Raw = StockRecord;
    type Dto = EanAvailability;

    fn to_dto(&self, raw: StockRecord) -> Result<EanAvailability, MappingError> {
        let entry: StockEntry = serde_json::from_value(raw.body).map_err(|e| {
            MappingError::new(&raw.requested_gtin, format!("malformed stock entry: {e}"))
        })?;

        let ean = entry
            .gtin
            .map(|g| g.trim().to_string())
            .filter(|g| !g.is_empty())
            .ok_or_else(|| MappingError::new(&raw.requested_gtin, "missing gtin"))?;

        let quantity = entry
            .quantity
            .ok_or_else(|| MappingError::new(&ean, "missing quantity"))?;
        if quantity < 0 {
            return Err(MappingError::new(
                &ean,
                format!("quantity must be non-negative, got {quantity}"),
            ));
        }
        let quantity = i32::try_from(quantity)
            .map_err(|_| MappingError::new(&ean, format!("quantity {quantity} out of range")))?;

        let stock_timestamp = entry
            .timestamp
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(|s| {
                parse_timestamp(s)
                    .ok_or_else(|| MappingError::new(&ean, format!("invalid timestamp '{s}'")))
            })
            .transpose()?;

        let price = entry
            .price
            .map(|p| checked_price(p, &ean, "price"))
            .transpose()?;

        let stock_traffic_light = match entry.stock_traffic_light {
            None | Some(serde_json::Value::Null) => None,
            Some(serde_json::Value::String(s)) => {
                Some(s.trim().to_string()).filter(|s| !s.is_empty())
            }
            Some(other) => Some(other.to_string()),
        };

        Ok(EanAvailability {
            ean,
            supplier: self.supplier.clone(),
            quantity,
            price,
            stock_traffic_light,
            item_type: ItemType::from_stock_type_code(entry.stock_type.unwrap_or_default()),
            stock_timestamp,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;
    use serde_json::json;

    use super::*;

    fn mapper() -> StockMapper {
        StockMapper::new(SupplierInfo {
            retailer_id: "r1".to_string(),
            retailer_gln: "4000000000001".to_string(),
            supplier_id: 87,
            supplier_gln: "4042834000005".to_string(),
            supplier_name: "Josef Seibel".to_string(),
        })
    }

    fn record(body: serde_json::Value) -> StockRecord {
        StockRecord {
            requested_gtin: "4061234567890".to_string(),
            body,
        }
    }

    #[test]
    fn maps_pair_entry() {
        let row = mapper()
            .to_dto(record(json!({
                "gtin": "4061234567890",
                "quantity": 7,
                "stockTrafficLight": "green",
                "type": 1,
                "timestamp": "2024-05-01T08:30:00Z"
            })))
            .unwrap();

        assert_eq!(row.ean, "4061234567890");
        assert_eq!(row.quantity, 7);
        assert_eq!(row.item_type, ItemType::Pair);
        assert_eq!(row.stock_traffic_light.as_deref(), Some("green"));
        assert_eq!(
            row.stock_timestamp,
            Some(Utc.with_ymd_and_hms(2024, 5, 1, 8, 30, 0).unwrap())
        );
        assert_eq!(row.supplier.supplier_id, 87);
        assert!(row.price.is_none());
    }

    #[test]
    fn non_pair_type_is_set() {
        let row = mapper()
            .to_dto(record(json!({"gtin": "1", "quantity": 0, "type": 2})))
            .unwrap();
        assert_eq!(row.item_type, ItemType::Set);
        let row = mapper()
            .to_dto(record(json!({"gtin": "1", "quantity": 0})))
            .unwrap();
        assert_eq!(row.item_type, ItemType::Set);
    }

    #[test]
    fn price_is_rounded() {
        let row = mapper()
            .to_dto(record(json!({"gtin": "1", "quantity": 1, "price": 19.999})))
            .unwrap();
        assert_eq!(row.price, Some(Decimal::new(2000, 2)));
    }

    #[test]
    fn numeric_traffic_light_is_rendered() {
        let row = mapper()
            .to_dto(record(json!({"gtin": "1", "quantity": 1, "stockTrafficLight": 2})))
            .unwrap();
        assert_eq!(row.stock_traffic_light.as_deref(), Some("2"));
    }

    #[test]
    fn missing_gtin_is_rejected() {
        let err = mapper().to_dto(record(json!({"quantity": 1}))).unwrap_err();
        assert_eq!(err.record, "4061234567890");
        assert!(err.reason.contains("gtin"));
    }

    #[test]
    fn missing_quantity_is_rejected() {
        let err = mapper().to_dto(record(json!({"gtin": "1"}))).unwrap_err();
        assert!(err.reason.contains("missing quantity"));
    }

    #[test]
    fn negative_quantity_is_rejected() {
        let err = mapper()
            .to_dto(record(json!({"gtin": "1", "quantity": -3})))
            .unwrap_err();
        assert!(err.reason.contains("non-negative"));
    }

    #[test]
    fn negative_price_is_rejected() {
        let err = mapper()
            .to_dto(record(json!({"gtin": "1", "quantity": 1, "price": -0.5})))
            .unwrap_err();
        assert!(err.reason.contains("price"));
    }

    #[test]
    fn invalid_timestamp_is_rejected() {
        let err = mapper()
            .to_dto(record(json!({"gtin": "1", "quantity": 1, "timestamp": "soon"})))
            .unwrap_err();
        assert!(err.reason.contains("timestamp"));
    }
}
