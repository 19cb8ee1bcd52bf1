//! # Validation Module
//!
//! Input validation for admin forms, checkout and account flows.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Storefront action / page loader                              │
//! │  └── THIS MODULE: field rules before any write                         │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Catalog database (SQLite)                                    │
//! │  ├── NOT NULL / UNIQUE constraints                                     │
//! │  └── Foreign key constraints                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: REST backend (its own rules, errors surfaced verbatim)       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use gearent_core::validation::{validate_duration, validate_quantity};
//!
//! validate_quantity(2).unwrap();
//! validate_duration(3).unwrap();
//! assert!(validate_duration(0).is_err());
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{NewAddress, NewCategory, NewProduct, NewReview};
use crate::{MAX_ITEM_QUANTITY, MAX_RENTAL_DAYS};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

fn require_text(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::required(field));
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

/// Validates a product name (1-200 characters).
///
/// ```rust
/// use gearent_core::validation::validate_product_name;
///
/// assert!(validate_product_name("Trek Marlin 5").is_ok());
/// assert!(validate_product_name("   ").is_err());
/// ```
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    require_text("name", name, 200)
}

/// Validates a category slug.
///
/// ## Rules
/// - 1-60 characters
/// - Lowercase ASCII letters, digits and single hyphens only
/// - Must not start or end with a hyphen
pub fn validate_slug(slug: &str) -> ValidationResult<()> {
    require_text("slug", slug, 60)?;

    let invalid = |reason: &str| ValidationError::InvalidFormat {
        field: "slug".to_string(),
        reason: reason.to_string(),
    };

    if !slug
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(invalid("use lowercase letters, digits and hyphens"));
    }

    if slug.starts_with('-') || slug.ends_with('-') || slug.contains("--") {
        return Err(invalid("hyphens must separate words"));
    }

    Ok(())
}

/// Turns a display name into a slug ("Water Sports" → "water-sports").
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for ch in name.trim().chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

/// Validates an email address (shape only).
pub fn validate_email(email: &str) -> ValidationResult<()> {
    let email = email.trim();
    if email.is_empty() {
        return Err(ValidationError::required("email"));
    }

    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
        }
        None => false,
    };

    if !valid {
        return Err(ValidationError::InvalidFormat {
            field: "email".to_string(),
            reason: "must look like name@example.com".to_string(),
        });
    }

    Ok(())
}

/// Validates a password for registration (at least 8 characters).
pub fn validate_password(password: &str) -> ValidationResult<()> {
    if password.is_empty() {
        return Err(ValidationError::required("password"));
    }
    if password.chars().count() < 8 {
        return Err(ValidationError::InvalidFormat {
            field: "password".to_string(),
            reason: "must be at least 8 characters".to_string(),
        });
    }
    Ok(())
}

/// Validates a search query and returns it trimmed.
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.chars().count() > 100 {
        return Err(ValidationError::TooLong {
            field: "query".to_string(),
            max: 100,
        });
    }

    Ok(query.to_string())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a rental quantity (1..=MAX_ITEM_QUANTITY).
pub fn validate_quantity(qty: u32) -> ValidationResult<()> {
    if qty == 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY as i64,
        });
    }

    Ok(())
}

/// Validates a rental duration in days (1..=MAX_RENTAL_DAYS).
pub fn validate_duration(days: u32) -> ValidationResult<()> {
    if days == 0 || days > MAX_RENTAL_DAYS {
        return Err(ValidationError::OutOfRange {
            field: "duration".to_string(),
            min: 1,
            max: MAX_RENTAL_DAYS as i64,
        });
    }

    Ok(())
}

/// Validates a daily price. Zero is allowed (promotional items).
pub fn validate_price(price: Money) -> ValidationResult<()> {
    if price.is_negative() {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates a stock level (non-negative).
pub fn validate_stock(stock: i64) -> ValidationResult<()> {
    if stock < 0 {
        return Err(ValidationError::OutOfRange {
            field: "stock".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates a review rating (1..=5).
pub fn validate_rating(rating: i64) -> ValidationResult<()> {
    if !(1..=5).contains(&rating) {
        return Err(ValidationError::OutOfRange {
            field: "rating".to_string(),
            min: 1,
            max: 5,
        });
    }

    Ok(())
}

/// Validates a payment amount (must be positive).
pub fn validate_payment_amount(amount: Money) -> ValidationResult<()> {
    if !amount.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: "payment amount".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Form Validators
// =============================================================================

/// Validates the admin "new product" form.
pub fn validate_new_product(product: &NewProduct) -> ValidationResult<()> {
    validate_product_name(&product.name)?;
    validate_price(product.price_per_day)?;
    validate_stock(product.stock)?;
    if let Some(description) = &product.description {
        if description.chars().count() > 5000 {
            return Err(ValidationError::TooLong {
                field: "description".to_string(),
                max: 5000,
            });
        }
    }
    Ok(())
}

/// Validates the admin category form.
pub fn validate_new_category(category: &NewCategory) -> ValidationResult<()> {
    require_text("name", &category.name, 100)?;
    validate_slug(&category.slug)
}

/// Validates a review before posting.
pub fn validate_new_review(review: &NewReview) -> ValidationResult<()> {
    validate_rating(review.rating)?;
    if let Some(comment) = &review.comment {
        if comment.chars().count() > 2000 {
            return Err(ValidationError::TooLong {
                field: "comment".to_string(),
                max: 2000,
            });
        }
    }
    Ok(())
}

/// Validates an address form.
///
/// ## Rules
/// - recipient, phone, line1 and postal code are required
/// - phone: digits and hyphens, 9-13 digits
/// - postal code: 5 digits
pub fn validate_address(address: &NewAddress) -> ValidationResult<()> {
    require_text("recipient", &address.recipient, 50)?;
    require_text("line1", &address.line1, 200)?;

    let phone = address.phone.trim();
    if phone.is_empty() {
        return Err(ValidationError::required("phone"));
    }
    let digits = phone.chars().filter(|c| c.is_ascii_digit()).count();
    if !phone.chars().all(|c| c.is_ascii_digit() || c == '-') || !(9..=13).contains(&digits) {
        return Err(ValidationError::InvalidFormat {
            field: "phone".to_string(),
            reason: "use digits, e.g. 010-1234-5678".to_string(),
        });
    }

    let postal = address.postal_code.trim();
    if postal.len() != 5 || !postal.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::InvalidFormat {
            field: "postal_code".to_string(),
            reason: "must be 5 digits".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_slug() {
        assert!(validate_slug("bikes").is_ok());
        assert!(validate_slug("water-sports").is_ok());
        assert!(validate_slug("Water Sports").is_err());
        assert!(validate_slug("-bikes").is_err());
        assert!(validate_slug("bikes--road").is_err());
        assert!(validate_slug("").is_err());
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Water Sports"), "water-sports");
        assert_eq!(slugify("  Ski & Snowboard! "), "ski-snowboard");
        assert!(validate_slug(&slugify("Camping Gear 2")).is_ok());
    }

    #[test]
    fn test_validate_quantity_and_duration() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(MAX_ITEM_QUANTITY).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(MAX_ITEM_QUANTITY + 1).is_err());

        assert!(validate_duration(1).is_ok());
        assert!(validate_duration(MAX_RENTAL_DAYS).is_ok());
        assert!(validate_duration(0).is_err());
        assert!(validate_duration(MAX_RENTAL_DAYS + 1).is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("rider@gearent.kr").is_ok());
        assert!(validate_email("").is_err());
        assert!(validate_email("no-at-sign").is_err());
        assert!(validate_email("a@localhost").is_err());
    }

    #[test]
    fn test_validate_rating() {
        assert!(validate_rating(1).is_ok());
        assert!(validate_rating(5).is_ok());
        assert!(validate_rating(0).is_err());
        assert!(validate_rating(6).is_err());
    }

    #[test]
    fn test_validate_new_product() {
        let mut product = NewProduct {
            name: "Trek Marlin 5".to_string(),
            price_per_day: Money::new(50_000),
            stock: 3,
            ..Default::default()
        };
        assert!(validate_new_product(&product).is_ok());

        product.stock = -1;
        assert!(validate_new_product(&product).is_err());

        product.stock = 1;
        product.price_per_day = Money::new(-1);
        assert!(validate_new_product(&product).is_err());
    }

    #[test]
    fn test_validate_address() {
        let mut address = NewAddress {
            recipient: "Kim Minji".to_string(),
            phone: "010-1234-5678".to_string(),
            line1: "123 Teheran-ro, Gangnam-gu".to_string(),
            line2: None,
            postal_code: "06236".to_string(),
            is_default: true,
        };
        assert!(validate_address(&address).is_ok());

        address.postal_code = "6236".to_string();
        assert!(validate_address(&address).is_err());

        address.postal_code = "06236".to_string();
        address.phone = "phone".to_string();
        assert!(validate_address(&address).is_err());
    }
}
