//! Tabular stock import.
//!
//! Reads the first table of an uploaded file (CSV with a header row) into
//! [`StockFields`]. Rows without a product name or barcode are dropped.

use anyhow::{Context, Result};
use csv::{ReaderBuilder, StringRecord, Trim};

use crate::models::stock::{StockFields, parse_quantity};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column {
    ProductName,
    ProductCode,
    Brand,
    Category,
    Qty,
    Rrp,
    Price,
    Barcode,
    ImageUrl,
}

impl Column {
    /// Header names are compared lowercased with spaces, dashes and
    /// underscores removed, so `productName`, `product_name` and
    /// `Product Name` all resolve to the same column.
    fn from_header(header: &str) -> Option<Self> {
        let key: String = header
            .chars()
            .filter(|c| !matches!(c, ' ' | '_' | '-'))
            .flat_map(char::to_lowercase)
            .collect();

        match key.as_str() {
            "productname" | "name" | "product" => Some(Self::ProductName),
            "productcode" | "code" | "sku" => Some(Self::ProductCode),
            "brand" => Some(Self::Brand),
            "category" => Some(Self::Category),
            "qty" | "quantity" => Some(Self::Qty),
            "rrp" => Some(Self::Rrp),
            "price" => Some(Self::Price),
            "barcode" => Some(Self::Barcode),
            "imageurl" | "image" => Some(Self::ImageUrl),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
pub struct ParsedSheet {
    pub rows: Vec<StockFields>,
    pub dropped: usize,
}

pub fn parse_stock_sheet(bytes: &[u8]) -> Result<ParsedSheet> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(bytes);

    let columns: Vec<Option<Column>> = reader
        .headers()
        .context("Failed to read header row")?
        .iter()
        .map(|h| Column::from_header(h.trim_start_matches('\u{feff}')))
        .collect();

    let mut sheet = ParsedSheet::default();

    for (index, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("Failed to read row {}", index + 2))?;

        match row_to_fields(&columns, &record) {
            Some(fields) => sheet.rows.push(fields),
            None => sheet.dropped += 1,
        }
    }

    Ok(sheet)
}

fn row_to_fields(columns: &[Option<Column>], record: &StringRecord) -> Option<StockFields> {
    let mut fields = StockFields::default();

    for (column, value) in columns.iter().zip(record.iter()) {
        let Some(column) = column else { continue };
        let value = value.to_string();

        match column {
            Column::ProductName => fields.product_name = value,
            Column::ProductCode => fields.product_code = value,
            Column::Brand => fields.brand = value,
            Column::Category => fields.category = value,
            Column::Qty => fields.qty = parse_quantity(&value),
            Column::Rrp => fields.rrp = value,
            Column::Price => fields.price = value,
            Column::Barcode => fields.barcode = value,
            Column::ImageUrl => fields.image_url = Some(value).filter(|v| !v.is_empty()),
        }
    }

    if fields.product_name.is_empty() || fields.barcode.is_empty() {
        return None;
    }

    Some(fields)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_missing_name_or_barcode_are_dropped() {
        let csv = "productName,productCode,brand,category,qty,rrp,price,barcode\n\
                   Tea,T1,Leaf,Drinks,12,2.50,2.00,111\n\
                   ,T2,Leaf,Drinks,3,1,1,222\n\
                   Coffee,C1,Bean,Drinks,x,4,3.5,\n\
                   Biscuits,B1,Crumb,Snacks,4.0,1.20,1,333\n";

        let sheet = parse_stock_sheet(csv.as_bytes()).unwrap();
        assert_eq!(sheet.rows.len(), 2);
        assert_eq!(sheet.dropped, 2);

        let tea = &sheet.rows[0];
        assert_eq!(tea.product_name, "Tea");
        assert_eq!(tea.qty, 12);
        assert_eq!(tea.rrp, "2.50");
        assert_eq!(tea.barcode, "111");

        assert_eq!(sheet.rows[1].qty, 4);
    }

    #[test]
    fn test_header_variants_and_unknown_columns() {
        let csv = "Product Name,BARCODE,quantity,notes\nJam,999,,ignored\n";
        let sheet = parse_stock_sheet(csv.as_bytes()).unwrap();

        assert_eq!(sheet.rows.len(), 1);
        let jam = &sheet.rows[0];
        assert_eq!(jam.product_name, "Jam");
        assert_eq!(jam.barcode, "999");
        assert_eq!(jam.qty, 0);
        assert!(jam.image_url.is_none());
    }

    #[test]
    fn test_byte_order_mark_is_ignored() {
        let csv = "\u{feff}productName,barcode\nSoap,42\n";
        let sheet = parse_stock_sheet(csv.as_bytes()).unwrap();
        assert_eq!(sheet.rows.len(), 1);
    }

    #[test]
    fn test_empty_file_yields_no_rows() {
        let sheet = parse_stock_sheet(b"").unwrap();
        assert!(sheet.rows.is_empty());
        assert_eq!(sheet.dropped, 0);
    }
}
