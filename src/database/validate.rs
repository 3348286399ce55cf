use std::collections::HashSet;

use thiserror::Error;

use crate::constants::{
    MIN_AMOUNT_VALUE, MIN_COOKING_TIME, RESERVED_USERNAMES, USERNAME_EXTRA_CHARS,
};
use crate::schema::{NewRecipePart, Uuid};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0}")]
    InvalidUsername(String),
    #[error("Ingredient amount must be at least {MIN_AMOUNT_VALUE}, got {0}")]
    InvalidAmount(i32),
    #[error("Cooking time must be at least {MIN_COOKING_TIME} minute, got {0}")]
    InvalidCookingTime(i32),
    #[error("Ingredient {0} is listed more than once")]
    DuplicateIngredient(Uuid),
    #[error("A recipe needs at least one tag")]
    NoTags,
    #[error("Tag {0} is listed more than once")]
    DuplicateTag(Uuid),
    #[error("Subscribing to yourself is not allowed")]
    SelfSubscription,
    #[error("\"{0}\" is not a hex color")]
    InvalidColor(String),
}

/// Usernames are limited to alphanumerics, `_` and `.@+-`, and may not be
/// a reserved word. The message lists every distinct offending character.
pub fn validate_username(value: &str) -> Result<(), ValidationError> {
    if RESERVED_USERNAMES.contains(&value) {
        return Err(ValidationError::InvalidUsername(format!(
            "\"{value}\" cannot be used as a username"
        )));
    }

    let mut invalid: Vec<char> = Vec::new();
    for c in value.chars() {
        if c.is_alphanumeric() || c == '_' || USERNAME_EXTRA_CHARS.contains(&c) {
            continue;
        }
        if !invalid.contains(&c) {
            invalid.push(c);
        }
    }

    if !invalid.is_empty() {
        return Err(ValidationError::InvalidUsername(format!(
            "Username may not contain the characters \"{}\"",
            invalid.iter().collect::<String>()
        )));
    }

    Ok(())
}

pub fn validate_amount(amount: i32) -> Result<(), ValidationError> {
    if amount < MIN_AMOUNT_VALUE {
        return Err(ValidationError::InvalidAmount(amount));
    }
    Ok(())
}

pub fn validate_cooking_time(cooking_time: i32) -> Result<(), ValidationError> {
    if cooking_time < MIN_COOKING_TIME {
        return Err(ValidationError::InvalidCookingTime(cooking_time));
    }
    Ok(())
}

pub fn validate_ingredient_list(parts: &[NewRecipePart]) -> Result<(), ValidationError> {
    let mut seen: HashSet<Uuid> = HashSet::new();
    for part in parts {
        if !seen.insert(part.id) {
            return Err(ValidationError::DuplicateIngredient(part.id));
        }
        validate_amount(part.amount)?;
    }
    Ok(())
}

pub fn validate_tag_list(tags: &[Uuid]) -> Result<(), ValidationError> {
    if tags.is_empty() {
        return Err(ValidationError::NoTags);
    }
    let mut seen: HashSet<Uuid> = HashSet::new();
    for tag in tags {
        if !seen.insert(*tag) {
            return Err(ValidationError::DuplicateTag(*tag));
        }
    }
    Ok(())
}

pub fn validate_subscription(user_id: Uuid, author_id: Uuid) -> Result<(), ValidationError> {
    if user_id == author_id {
        return Err(ValidationError::SelfSubscription);
    }
    Ok(())
}

/// `#RGB` or `#RRGGBB`.
pub fn validate_hex_color(value: &str) -> Result<(), ValidationError> {
    let digits = match value.strip_prefix('#') {
        Some(digits) => digits,
        None => return Err(ValidationError::InvalidColor(value.to_string())),
    };
    if (digits.len() == 3 || digits.len() == 6) && digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Ok(());
    }
    Err(ValidationError::InvalidColor(value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn part(id: Uuid, amount: i32) -> NewRecipePart {
        NewRecipePart { id, amount }
    }

    #[test]
    fn test_reserved_username_rejected() {
        let error = validate_username("me").unwrap_err();
        match error {
            ValidationError::InvalidUsername(message) => assert!(message.contains("me")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_username_allowed_chars() {
        assert!(validate_username("chef_2024").is_ok());
        assert!(validate_username("anna.smith@kitchen+1-2").is_ok());
        assert!(validate_username("Меню").is_ok());
    }

    #[test]
    fn test_username_invalid_chars_are_enumerated_once() {
        let error = validate_username("a!b!c#d e").unwrap_err();
        match error {
            ValidationError::InvalidUsername(message) => {
                assert!(message.contains("\"!# \""), "got: {message}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_amount_lower_bound() {
        assert_eq!(validate_amount(0), Err(ValidationError::InvalidAmount(0)));
        assert_eq!(validate_amount(-3), Err(ValidationError::InvalidAmount(-3)));
        assert!(validate_amount(1).is_ok());
        // no upper bound
        assert!(validate_amount(i32::MAX).is_ok());
    }

    #[test]
    fn test_cooking_time_lower_bound() {
        assert_eq!(
            validate_cooking_time(0),
            Err(ValidationError::InvalidCookingTime(0))
        );
        assert!(validate_cooking_time(1).is_ok());
        assert!(validate_cooking_time(600).is_ok());
    }

    #[test]
    fn test_duplicate_ingredient_rejected() {
        let parts = vec![part(1, 200), part(2, 100), part(1, 50)];
        assert_eq!(
            validate_ingredient_list(&parts),
            Err(ValidationError::DuplicateIngredient(1))
        );
    }

    #[test]
    fn test_ingredient_amounts_checked() {
        let parts = vec![part(1, 200), part(2, 0)];
        assert_eq!(
            validate_ingredient_list(&parts),
            Err(ValidationError::InvalidAmount(0))
        );
        assert!(validate_ingredient_list(&[part(1, 200), part(2, 100)]).is_ok());
    }

    #[test]
    fn test_tag_list_rules() {
        assert_eq!(validate_tag_list(&[]), Err(ValidationError::NoTags));
        assert_eq!(
            validate_tag_list(&[3, 5, 3]),
            Err(ValidationError::DuplicateTag(3))
        );
        assert!(validate_tag_list(&[3, 5]).is_ok());
    }

    #[test]
    fn test_self_subscription_rejected() {
        assert_eq!(
            validate_subscription(7, 7),
            Err(ValidationError::SelfSubscription)
        );
        assert!(validate_subscription(7, 8).is_ok());
    }

    #[test]
    fn test_hex_color() {
        assert!(validate_hex_color("#E26C2D").is_ok());
        assert!(validate_hex_color("#fff").is_ok());
        assert!(validate_hex_color("E26C2D").is_err());
        assert!(validate_hex_color("#E26C2").is_err());
        assert!(validate_hex_color("#GGGGGG").is_err());
    }
}
