use crate::error::DocsortError;
use rust_decimal::Decimal;
use std::str::FromStr;

/// Normalize a monetary amount split into its integer and decimal parts, as
/// captured by the amount pattern, into a plain two-decimal string.
///
/// Handles formats like:
/// - "1 200" + ",50" -> "1200.50" (Swedish space grouping, decimal comma)
/// - "1.234.567" + ",89" -> "1234567.89"
/// - "1,234" + ".56" -> "1234.56"
/// - "950" + None -> "950.00"
pub fn normalize_amount(int_part: &str, dec_part: Option<&str>) -> Result<String, DocsortError> {
    let digits: String = int_part.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return Err(DocsortError::Extraction(format!(
            "invalid amount '{}'",
            int_part
        )));
    }

    let fraction: String = dec_part
        .map(|d| d.chars().filter(|c| c.is_ascii_digit()).collect())
        .unwrap_or_default();

    let mut value = parse_decimal(&digits, &fraction)?;
    value.rescale(2);
    Ok(value.to_string())
}

fn parse_decimal(digits: &str, fraction: &str) -> Result<Decimal, DocsortError> {
    let normalized = if fraction.is_empty() {
        digits.to_string()
    } else {
        format!("{digits}.{fraction}")
    };
    Decimal::from_str(&normalized)
        .map_err(|e| DocsortError::Extraction(format!("invalid amount '{}': {}", normalized, e)))
}
