use rust_decimal::Decimal;

use super::ApiError;

const MAX_TITLE_LENGTH: usize = 255;
const MAX_NAME_LENGTH: usize = 255;
const MAX_LINK_LENGTH: usize = 255;

pub fn validate_required(field: &str, value: &str) -> Result<String, ApiError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ApiError::validation(format!(
            "{field}: This field may not be blank."
        )));
    }
    Ok(trimmed.to_string())
}

fn validate_bounded(field: &str, value: &str, max: usize) -> Result<String, ApiError> {
    let value = validate_required(field, value)?;
    if value.chars().count() > max {
        return Err(ApiError::validation(format!(
            "{field}: Ensure this field has no more than {max} characters."
        )));
    }
    Ok(value)
}

pub fn validate_title(title: &str) -> Result<String, ApiError> {
    validate_bounded("title", title, MAX_TITLE_LENGTH)
}

/// Tag, ingredient and account names.
pub fn validate_name(name: &str) -> Result<String, ApiError> {
    validate_bounded("name", name, MAX_NAME_LENGTH)
}

pub fn validate_time_minutes(minutes: i32) -> Result<i32, ApiError> {
    if minutes < 0 {
        return Err(ApiError::validation(
            "time_minutes: Ensure this value is greater than or equal to 0.",
        ));
    }
    Ok(minutes)
}

/// Round to two decimal places and check the value fits in five digits.
pub fn validate_price(price: Decimal) -> Result<Decimal, ApiError> {
    let max = Decimal::new(99_999, 2);

    if price.is_sign_negative() && !price.is_zero() {
        return Err(ApiError::validation(
            "price: Ensure this value is greater than or equal to 0.",
        ));
    }

    let mut rounded = price.round_dp(2);
    if rounded > max {
        return Err(ApiError::validation(
            "price: Ensure that there are no more than 5 digits in total.",
        ));
    }
    rounded.rescale(2);
    Ok(rounded)
}

/// Blank links are stored as absent.
pub fn validate_link(link: Option<String>) -> Result<Option<String>, ApiError> {
    let Some(link) = link else {
        return Ok(None);
    };

    let link = link.trim();
    if link.is_empty() {
        return Ok(None);
    }
    if link.chars().count() > MAX_LINK_LENGTH {
        return Err(ApiError::validation(format!(
            "link: Ensure this field has no more than {MAX_LINK_LENGTH} characters."
        )));
    }
    Ok(Some(link.to_string()))
}

/// Parse a comma-separated id list such as `1,2,3`. An empty string is an empty list.
pub fn parse_id_list(field: &str, raw: &str) -> Result<Vec<i32>, ApiError> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }

    raw.split(',')
        .map(|part| {
            let part = part.trim();
            match part.parse::<i32>() {
                Ok(id) if id > 0 => Ok(id),
                _ => Err(ApiError::validation(format!(
                    "{field}: \"{part}\" is not a valid id."
                ))),
            }
        })
        .collect()
}

/// Parse an integer-style flag: `0` is false, any other integer is true.
pub fn parse_flag(field: &str, raw: Option<&str>) -> Result<bool, ApiError> {
    let Some(raw) = raw.map(str::trim).filter(|r| !r.is_empty()) else {
        return Ok(false);
    };

    match raw {
        "true" | "True" => Ok(true),
        "false" | "False" => Ok(false),
        _ => raw
            .parse::<i64>()
            .map(|n| n != 0)
            .map_err(|_| ApiError::validation(format!("{field}: \"{raw}\" is not a valid integer."))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_validate_required() {
        assert_eq!(validate_required("name", "  Vegan ").unwrap(), "Vegan");
        assert!(validate_required("name", "").is_err());
        assert!(validate_required("name", "   ").is_err());
    }

    #[test]
    fn test_validate_name_and_title_lengths() {
        assert_eq!(validate_name(" Vegan ").unwrap(), "Vegan");
        assert!(validate_name(&"n".repeat(255)).is_ok());
        assert!(validate_name(&"n".repeat(256)).is_err());
        assert!(validate_title(&"t".repeat(256)).is_err());
        assert!(validate_title("").is_err());
    }

    #[test]
    fn test_validate_price() {
        assert_eq!(
            validate_price(Decimal::from(5)).unwrap().to_string(),
            "5.00"
        );
        assert_eq!(
            validate_price(Decimal::from_str("10.255").unwrap())
                .unwrap()
                .to_string(),
            "10.26"
        );
        assert!(validate_price(Decimal::from_str("999.99").unwrap()).is_ok());
        assert!(validate_price(Decimal::from_str("1000").unwrap()).is_err());
        assert!(validate_price(Decimal::from_str("-1").unwrap()).is_err());
        assert!(validate_price(Decimal::ZERO).is_ok());
    }

    #[test]
    fn test_validate_time_minutes() {
        assert!(validate_time_minutes(0).is_ok());
        assert!(validate_time_minutes(45).is_ok());
        assert!(validate_time_minutes(-1).is_err());
    }

    #[test]
    fn test_validate_link() {
        assert_eq!(validate_link(None).unwrap(), None);
        assert_eq!(validate_link(Some("  ".to_string())).unwrap(), None);
        assert_eq!(
            validate_link(Some("https://example.com/r".to_string())).unwrap(),
            Some("https://example.com/r".to_string())
        );
        assert!(validate_link(Some("x".repeat(256))).is_err());
    }

    #[test]
    fn test_parse_id_list() {
        assert_eq!(parse_id_list("tags", "1,2, 3").unwrap(), vec![1, 2, 3]);
        assert_eq!(parse_id_list("tags", "").unwrap(), Vec::<i32>::new());
        assert!(parse_id_list("tags", "1,,2").is_err());
        assert!(parse_id_list("tags", "a").is_err());
        assert!(parse_id_list("tags", "0").is_err());
    }

    #[test]
    fn test_parse_flag() {
        assert!(!parse_flag("assigned_only", None).unwrap());
        assert!(!parse_flag("assigned_only", Some("0")).unwrap());
        assert!(parse_flag("assigned_only", Some("1")).unwrap());
        assert!(parse_flag("assigned_only", Some("true")).unwrap());
        assert!(parse_flag("assigned_only", Some("yes")).is_err());
    }
}
