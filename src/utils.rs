//! Input validation helpers for the settings popup.

/// Generic numeric input validation
pub fn validate_numeric_input<T>(
    input: &str,
    min: Option<T>,
    max: Option<T>,
    field_name: &str,
) -> Result<T, String>
where
    T: std::str::FromStr + std::fmt::Display + PartialOrd,
{
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(format!("{} cannot be empty", field_name));
    }

    match trimmed.parse::<T>() {
        Ok(val) => {
            if let Some(min_val) = min {
                if val < min_val {
                    return Err(format!("{} must be at least {}", field_name, min_val));
                }
            }
            if let Some(max_val) = max {
                if val > max_val {
                    return Err(format!("{} cannot exceed {}", field_name, max_val));
                }
            }
            Ok(val)
        }
        Err(_) => Err(format!("{} must be a valid number", field_name)),
    }
}

/// Validate a topic duration in days; 0 means the topic never expires.
pub fn validate_duration_days(input: &str) -> Result<u32, String> {
    validate_numeric_input(input, Some(0), Some(3650), "Duration")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_accepts_zero_for_permanent_topics() {
        assert_eq!(validate_duration_days("0"), Ok(0));
        assert_eq!(validate_duration_days(" 14 "), Ok(14));
    }

    #[test]
    fn duration_rejects_garbage_and_out_of_range() {
        assert!(validate_duration_days("").is_err());
        assert!(validate_duration_days("-1").is_err());
        assert!(validate_duration_days("ten").is_err());
        assert!(validate_duration_days("99999").is_err());
    }
}
