use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockItem {
    pub id: String,
    pub image_url: Option<String>,
    pub product_name: String,
    pub product_code: String,
    pub brand: String,
    pub category: String,
    pub qty: i64,
    pub rrp: String,
    pub price: String,
    pub barcode: String,
    pub document_id: String,
    pub published: String,
}

impl StockItem {
    #[must_use]
    pub fn product_url(&self) -> String {
        product_url(&self.barcode)
    }

    #[must_use]
    pub fn delete_url(&self) -> String {
        delete_url(&self.barcode)
    }
}

/// Descriptive fields shared by manual entry, edits and spreadsheet import.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StockFields {
    pub image_url: Option<String>,
    pub product_name: String,
    pub product_code: String,
    pub brand: String,
    pub category: String,
    pub qty: i64,
    pub rrp: String,
    pub price: String,
    pub barcode: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SaleLine {
    pub barcode: String,
    pub quantity: i64,
}

#[must_use]
pub fn product_url(barcode: &str) -> String {
    format!("/product/{}", urlencoding::encode(barcode))
}

#[must_use]
pub fn delete_url(barcode: &str) -> String {
    format!("/delete?barcode={}", urlencoding::encode(barcode))
}

/// Lenient quantity parsing: leading/trailing whitespace is ignored, decimals
/// are truncated, anything unparsable counts as zero.
#[must_use]
pub fn parse_quantity(input: &str) -> i64 {
    let trimmed = input.trim();
    if let Ok(qty) = trimmed.parse::<i64>() {
        return qty;
    }

    match trimmed.parse::<f64>() {
        Ok(qty) if qty.is_finite() => qty.trunc() as i64,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_quantity() {
        assert_eq!(parse_quantity("12"), 12);
        assert_eq!(parse_quantity(" 7 "), 7);
        assert_eq!(parse_quantity("3.9"), 3);
        assert_eq!(parse_quantity("-2"), -2);
        assert_eq!(parse_quantity(""), 0);
        assert_eq!(parse_quantity("ten"), 0);
        assert_eq!(parse_quantity("NaN"), 0);
    }

    #[test]
    fn test_derived_urls_follow_barcode() {
        let mut item = StockItem {
            id: "a".to_string(),
            image_url: None,
            product_name: "Tea".to_string(),
            product_code: "T1".to_string(),
            brand: "Leaf".to_string(),
            category: "Drinks".to_string(),
            qty: 1,
            rrp: "2.50".to_string(),
            price: "2.00".to_string(),
            barcode: "555".to_string(),
            document_id: "d".to_string(),
            published: "2024-01-01T00:00:00Z".to_string(),
        };
        assert_eq!(item.product_url(), "/product/555");
        assert_eq!(item.delete_url(), "/delete?barcode=555");

        item.barcode = "A B/1".to_string();
        assert_eq!(item.product_url(), "/product/A%20B%2F1");
    }
}
