use super::ApiError;

pub fn validate_document_id(id: &str) -> Result<&str, ApiError> {
    let trimmed = id.trim();
    if trimmed.is_empty() {
        return Err(ApiError::validation("documentId is required"));
    }

    if uuid::Uuid::parse_str(trimmed).is_err() {
        return Err(ApiError::validation(format!(
            "Invalid document ID: {}. ID must be a UUID",
            trimmed
        )));
    }
    Ok(trimmed)
}

pub fn validate_barcode(barcode: &str) -> Result<&str, ApiError> {
    let trimmed = barcode.trim();
    if trimmed.is_empty() {
        return Err(ApiError::validation("Barcode cannot be empty"));
    }
    Ok(trimmed)
}

pub fn validate_required<'a>(value: &'a str, name: &str) -> Result<&'a str, ApiError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ApiError::validation(format!("{name} is required")));
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_document_id() {
        assert!(validate_document_id("0b6c2f52-4e0a-4a57-9f0e-2d4d2f1e9c11").is_ok());
        assert!(validate_document_id(" 0b6c2f52-4e0a-4a57-9f0e-2d4d2f1e9c11 ").is_ok());
        assert!(validate_document_id("").is_err());
        assert!(validate_document_id("not-a-uuid").is_err());
    }

    #[test]
    fn test_validate_barcode() {
        assert_eq!(validate_barcode(" 555 ").unwrap(), "555");
        assert!(validate_barcode("").is_err());
        assert!(validate_barcode("   ").is_err());
    }

    #[test]
    fn test_validate_required() {
        assert_eq!(validate_required("Aisle 3", "documentName").unwrap(), "Aisle 3");
        assert!(validate_required(" ", "documentName").is_err());
    }
}
