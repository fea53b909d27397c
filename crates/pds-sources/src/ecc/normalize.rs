//! Mapping of raw ECC articles into [`Article`]s.

use chrono::{DateTime, NaiveDateTime, SubsecRound, Utc};
use pds_core::{Article, Attribute, Image, Mapper, MappingError};
use rust_decimal::{Decimal, RoundingStrategy};

use crate::ecc::types::{EccArticle, EccArticleRecord, EccAttribute};

const DEFAULT_IMAGE_TYPE: &str = "product_image";

#[derive(Debug, Clone)]
pub struct EccArticleMapper {
    country_code: String,
}

impl EccArticleMapper {
    /// `country_code` selects the assortment entry prices and EAN come from.
    #[must_use]
    pub fn new(country_code: &str) -> Self {
        Self {
            country_code: country_code.to_lowercase(),
        }
    }
}

impl Default for EccArticleMapper {
    fn default() -> Self {
        Self::new("de")
    }
}

impl Mapper for EccArticleMapper {
    type Raw = EccArticleRecord;
    type Dto = Article;

    fn to_dto(&self, raw: EccArticleRecord) -> Result<Article, MappingError> {
        let fallback_id = format!("ean={} suGln={}", raw.ean, raw.supplier_gln);
        let article: EccArticle = serde_json::from_value(raw.body)
            .map_err(|e| MappingError::new(&fallback_id, format!("malformed article: {e}")))?;

        let ecc_id = article
            .ecc_id
            .ok_or_else(|| MappingError::new(&fallback_id, "missing eccId"))?;
        if ecc_id < 0 {
            return Err(MappingError::new(
                ecc_id.to_string(),
                "eccId must be non-negative",
            ));
        }
        let record = ecc_id.to_string();

        let description = non_blank(article.article_name)
            .ok_or_else(|| MappingError::new(&record, "missing articleName"))?;

        let date_changed = article
            .date_changed
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(|s| {
                parse_timestamp(s)
                    .ok_or_else(|| MappingError::new(&record, format!("invalid dateChanged '{s}'")))
            })
            .transpose()?;

        let first_assortment = article
            .assortment
            .get(&self.country_code)
            .and_then(|items| items.first());

        let price_pricat = first_assortment
            .and_then(|a| a.prime_cost)
            .map(|p| price(p, &record, "primeCost"))
            .transpose()?;
        let price_retail = first_assortment
            .and_then(|a| a.retail_price)
            .map(|p| price(p, &record, "retailPrice"))
            .transpose()?;

        let ean = first_assortment
            .and_then(|a| non_blank(a.ean.clone()))
            .or_else(|| non_blank(Some(raw.ean)));

        let (season_ecc_id, season_name) = match article.season {
            Some(season) => (season.id, non_blank(season.value)),
            None => (None, non_blank(article.season_txt)),
        };

        let attributes = article
            .attributes
            .into_iter()
            .map(|a| attribute(a, &record))
            .collect::<Result<Vec<_>, _>>()?;

        let images = collect_images(article.images);

        Ok(Article {
            article_key: record,
            description,
            ean,
            supplier_gln: non_blank(article.su_gln).or_else(|| non_blank(Some(raw.supplier_gln))),
            manufacturer_gln: non_blank(article.mf_gln),
            supplier_article_number: non_blank(article.su_article_number),
            manufacturer_article_number: non_blank(article.mf_article_number),
            brand: non_blank(article.brand),
            model_name: non_blank(article.model),
            season_ecc_id,
            season_name,
            currency: non_blank(article.currency),
            price_pricat,
            price_retail,
            date_changed,
            attributes,
            images,
        })
    }
}

/// Trims and drops empty strings.
fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Accepts RFC 3339 and the naive `YYYY-MM-DD HH:MM:SS[.fff]` form (read as
/// UTC), with either a space or `T` between date and time.
///
/// Sub-microsecond digits are cut so the value survives a round trip
/// through `TIMESTAMPTZ` unchanged.
pub(crate) fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    let parsed = DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                .map(|naive| naive.and_utc())
        })?;
    Some(parsed.trunc_subsecs(6))
}

/// Non-negative, rounded half away from zero to two places.
pub(crate) fn price(value: Decimal, record: &str, field: &str) -> Result<Decimal, MappingError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(MappingError::new(
            record,
            format!("{field} must be non-negative, got {value}"),
        ));
    }
    Ok(value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
}

fn attribute(raw: EccAttribute, record: &str) -> Result<Attribute, MappingError> {
    let name = non_blank(raw.key)
        .ok_or_else(|| MappingError::new(record, "attribute without key"))?;
    let value = match raw.value {
        None | Some(serde_json::Value::Null) => String::new(),
        Some(serde_json::Value::String(s)) => s,
        Some(other) => other.to_string(),
    };
    Ok(Attribute {
        name,
        value,
        unit: non_blank(raw.unit),
    })
}

fn collect_images(groups: Vec<crate::ecc::types::EccImageGroup>) -> Vec<Image> {
    groups
        .into_iter()
        .flat_map(|group| group.media)
        .filter_map(|media| {
            non_blank(media.file).map(|url| (url, non_blank(media.media_type)))
        })
        .zip(0_i32..)
        .map(|((url, image_type), position)| Image {
            url,
            position,
            image_type: Some(image_type.unwrap_or_else(|| DEFAULT_IMAGE_TYPE.to_string())),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;

    fn record(body: serde_json::Value) -> EccArticleRecord {
        EccArticleRecord {
            supplier_gln: "4042834000005".to_string(),
            ean: "4061234567890".to_string(),
            body,
        }
    }

    fn full_article() -> serde_json::Value {
        json!({
            "eccId": 1001,
            "suGln": "4042834000005",
            "mfGln": "4042834000012",
            "suArticleNumber": "SA-1",
            "mfArticleNumber": "MA-1",
            "brand": "Josef Seibel",
            "model": "Caspian 01",
            "articleName": "Walking shoe",
            "currency": "EUR",
            "seasonTxt": "ignored",
            "season": {"id": 12, "value": "HW24"},
            "dateChanged": "2024-05-01 12:30:00",
            "assortment": {"de": [
                {"ean": "4061234567890", "primeCost": 42.5, "retailPrice": "89.955"},
                {"ean": "4061234567999", "primeCost": 1, "retailPrice": 2}
            ]},
            "images": [
                {"media": [{"file": "https://img/1.jpg"}, {"file": "https://img/2.jpg", "type": "detail"}]},
                {"media": [{"file": ""}, {"file": "https://img/3.jpg"}]}
            ],
            "attributes": [
                {"key": "color", "value": "black"},
                {"key": "heel", "value": 3, "unit": "cm"}
            ]
        })
    }

    #[test]
    fn maps_full_article() {
        let article = EccArticleMapper::default()
            .to_dto(record(full_article()))
            .unwrap();

        assert_eq!(article.article_key, "1001");
        assert_eq!(article.description, "Walking shoe");
        assert_eq!(article.ean.as_deref(), Some("4061234567890"));
        assert_eq!(article.brand.as_deref(), Some("Josef Seibel"));
        assert_eq!(article.model_name.as_deref(), Some("Caspian 01"));
        assert_eq!(article.season_ecc_id, Some(12));
        assert_eq!(article.season_name.as_deref(), Some("HW24"));
        assert_eq!(article.price_pricat, Some(Decimal::new(4250, 2)));
        assert_eq!(article.price_retail, Some(Decimal::new(8996, 2)));
        assert_eq!(
            article.date_changed,
            Some(Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap())
        );
        assert_eq!(article.attributes.len(), 2);
        assert_eq!(article.attributes[1].value, "3");
        assert_eq!(article.attributes[1].unit.as_deref(), Some("cm"));
    }

    #[test]
    fn images_get_running_positions_and_skip_empty_files() {
        let article = EccArticleMapper::default()
            .to_dto(record(full_article()))
            .unwrap();
        let urls: Vec<_> = article.images.iter().map(|i| i.url.as_str()).collect();
        assert_eq!(urls, ["https://img/1.jpg", "https://img/2.jpg", "https://img/3.jpg"]);
        let positions: Vec<_> = article.images.iter().map(|i| i.position).collect();
        assert_eq!(positions, [0, 1, 2]);
        assert_eq!(article.images[0].image_type.as_deref(), Some("product_image"));
        assert_eq!(article.images[1].image_type.as_deref(), Some("detail"));
    }

    #[test]
    fn season_text_used_without_season_object() {
        let article = EccArticleMapper::default()
            .to_dto(record(json!({"eccId": 1, "articleName": "x", "seasonTxt": "FS25"})))
            .unwrap();
        assert_eq!(article.season_name.as_deref(), Some("FS25"));
        assert_eq!(article.season_ecc_id, None);
    }

    #[test]
    fn falls_back_to_lookup_pair_without_assortment() {
        let article = EccArticleMapper::default()
            .to_dto(record(json!({"eccId": 2, "articleName": "x"})))
            .unwrap();
        assert_eq!(article.ean.as_deref(), Some("4061234567890"));
        assert_eq!(article.supplier_gln.as_deref(), Some("4042834000005"));
        assert!(article.price_retail.is_none());
    }

    #[test]
    fn rfc3339_date_changed_is_accepted() {
        let article = EccArticleMapper::default()
            .to_dto(record(json!({
                "eccId": 3, "articleName": "x", "dateChanged": "2024-05-01T10:00:00+02:00"
            })))
            .unwrap();
        assert_eq!(
            article.date_changed,
            Some(Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap())
        );
    }

    #[test]
    fn naive_date_changed_with_fraction_is_accepted() {
        let article = EccArticleMapper::default()
            .to_dto(record(json!({
                "eccId": 4, "articleName": "x", "dateChanged": "2024-05-01T12:30:00.123"
            })))
            .unwrap();
        assert_eq!(
            article.date_changed,
            Some(
                Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap()
                    + chrono::Duration::milliseconds(123)
            )
        );
    }

    #[test]
    fn date_changed_is_cut_to_microseconds() {
        let article = EccArticleMapper::default()
            .to_dto(record(json!({
                "eccId": 5, "articleName": "x", "dateChanged": "2024-05-01T12:00:00.1234567Z"
            })))
            .unwrap();
        assert_eq!(
            article.date_changed,
            Some(
                Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
                    + chrono::Duration::microseconds(123_456)
            )
        );
    }

    #[test]
    fn missing_article_name_is_rejected() {
        let err = EccArticleMapper::default()
            .to_dto(record(json!({"eccId": 4, "articleName": "  "})))
            .unwrap_err();
        assert_eq!(err.record, "4");
        assert!(err.reason.contains("articleName"));
    }

    #[test]
    fn missing_ecc_id_is_rejected() {
        let err = EccArticleMapper::default()
            .to_dto(record(json!({"articleName": "x"})))
            .unwrap_err();
        assert!(err.reason.contains("eccId"));
        assert!(err.record.contains("4061234567890"));
    }

    #[test]
    fn negative_ecc_id_is_rejected() {
        let err = EccArticleMapper::default()
            .to_dto(record(json!({"eccId": -5, "articleName": "x"})))
            .unwrap_err();
        assert!(err.reason.contains("non-negative"));
    }

    #[test]
    fn negative_price_is_rejected() {
        let err = EccArticleMapper::default()
            .to_dto(record(json!({
                "eccId": 5, "articleName": "x",
                "assortment": {"de": [{"retailPrice": -1}]}
            })))
            .unwrap_err();
        assert!(err.reason.contains("retailPrice"));
    }

    #[test]
    fn invalid_date_changed_is_rejected() {
        let err = EccArticleMapper::default()
            .to_dto(record(json!({"eccId": 6, "articleName": "x", "dateChanged": "yesterday"})))
            .unwrap_err();
        assert!(err.reason.contains("dateChanged"));
    }

    #[test]
    fn attribute_without_key_is_rejected() {
        let err = EccArticleMapper::default()
            .to_dto(record(json!({
                "eccId": 7, "articleName": "x", "attributes": [{"value": "v"}]
            })))
            .unwrap_err();
        assert!(err.reason.contains("attribute without key"));
    }

    #[test]
    fn other_country_assortment_is_selected() {
        let article = EccArticleMapper::new("AT")
            .to_dto(record(json!({
                "eccId": 8, "articleName": "x",
                "assortment": {"de": [{"retailPrice": 10}], "at": [{"retailPrice": 12}]}
            })))
            .unwrap();
        assert_eq!(article.price_retail, Some(Decimal::new(1200, 2)));
    }

    #[test]
    fn wrongly_typed_field_is_a_mapping_error() {
        let err = EccArticleMapper::default()
            .to_dto(record(json!({"eccId": "abc", "articleName": "x"})))
            .unwrap_err();
        assert!(err.reason.contains("malformed article"));
    }
}
