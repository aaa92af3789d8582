use rust_decimal::Decimal;
use validator::{ValidationError, ValidationErrors};

/// Validates that a username only contains letters, digits, underscores and hyphens
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    let valid = username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');

    if !valid {
        let mut error = ValidationError::new("invalid_username");
        error.message =
            Some("Username may only contain letters, digits, '_' and '-'".into());
        return Err(error);
    }
    Ok(())
}

/// Largest value a `NUMERIC(14, 2)` money column holds
pub const MAX_MONEY: Decimal = Decimal::from_parts(276_447_231, 23_283, 0, false, 2);

/// Validates a money value: between 0 and `MAX_MONEY`, at most two decimal places
pub fn validate_money(amount: &Decimal) -> Result<(), ValidationError> {
    let message = if amount.is_sign_negative() && !amount.is_zero() {
        "Amount must be greater than or equal to 0"
    } else if *amount > MAX_MONEY {
        "Amount must be at most 999999999999.99"
    } else if amount.normalize().scale() > 2 {
        "Amount may have at most 2 decimal places"
    } else {
        return Ok(());
    };

    let mut error = ValidationError::new("invalid_amount");
    error.message = Some(message.into());
    Err(error)
}

/// Flattens validator output into `field: message, message; field: message`
pub fn describe_errors(errors: &ValidationErrors) -> String {
    let mut fields: Vec<String> = errors
        .field_errors()
        .iter()
        .map(|(field, errors)| {
            let messages: Vec<String> = errors
                .iter()
                .map(|e| match &e.message {
                    Some(message) => message.to_string(),
                    None => e.code.to_string(),
                })
                .collect();
            format!("{}: {}", field, messages.join(", "))
        })
        .collect();
    // HashMap order is unstable
    fields.sort();
    fields.join("; ")
}

/// Trims a string in place, turning whitespace-only input into an empty string
pub fn trim(value: String) -> String {
    let trimmed = value.trim();
    if trimmed.len() == value.len() {
        value
    } else {
        trimmed.to_string()
    }
}
