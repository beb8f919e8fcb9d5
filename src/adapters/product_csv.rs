use crate::domain::model::ProductRecord;
use crate::utils::error::{EtlError, Result};

pub const MB_ID_COLUMN: &str = "MB_id";
pub const IMAGE_SRC_COLUMN: &str = "image_src";

/// UTF-8 first; exports from older tools arrive as Latin-1.
pub fn decode_text(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.trim_start_matches('\u{feff}').to_string(),
        Err(_) => {
            tracing::debug!("Product CSV is not UTF-8, decoding as Latin-1");
            bytes.iter().map(|&b| b as char).collect()
        }
    }
}

pub fn read_products(bytes: &[u8]) -> Result<Vec<ProductRecord>> {
    let text = decode_text(bytes);
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(text.as_bytes());

    let headers = reader.headers()?.clone();
    let position = |name: &str| headers.iter().position(|h| h == name);
    let (Some(mb_id_idx), Some(src_idx)) = (position(MB_ID_COLUMN), position(IMAGE_SRC_COLUMN))
    else {
        return Err(EtlError::MissingColumnsError {
            source_name: "CSV".to_string(),
            columns: vec![MB_ID_COLUMN.to_string(), IMAGE_SRC_COLUMN.to_string()],
        });
    };

    let mut products = Vec::new();
    for record in reader.records() {
        let record = record?;
        products.push(ProductRecord {
            mb_id: record.get(mb_id_idx).unwrap_or_default().to_string(),
            image_src: record.get(src_idx).unwrap_or_default().to_string(),
        });
    }

    tracing::debug!("Read {} product rows", products.len());
    Ok(products)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_products_with_padded_headers() {
        let csv = "name, MB_id ,image_src \nMilk,101,a/101.jpg\nShort,102\n";
        let products = read_products(csv.as_bytes()).unwrap();
        assert_eq!(products.len(), 2);
        assert_eq!(products[0].mb_id, "101");
        assert_eq!(products[0].image_src, "a/101.jpg");
        assert_eq!(products[1].image_src, "");
    }

    #[test]
    fn test_read_products_requires_columns() {
        let err = read_products(b"id,src\n1,a.jpg\n").unwrap_err();
        assert!(matches!(err, EtlError::MissingColumnsError { .. }));
        assert_eq!(
            err.to_string(),
            "CSV must have columns 'MB_id' and 'image_src'"
        );
    }

    #[test]
    fn test_read_products_falls_back_to_latin1() {
        let mut bytes = b"MB_id,image_src\n7,caf".to_vec();
        bytes.push(0xE9); // é in Latin-1
        bytes.extend_from_slice(b".jpg\n");
        let products = read_products(&bytes).unwrap();
        assert_eq!(products[0].image_src, "caf\u{e9}.jpg");
    }

    #[test]
    fn test_decode_text_strips_bom() {
        assert_eq!(decode_text("\u{feff}MB_id".as_bytes()), "MB_id");
    }
}
