//! Validation helpers for DTOs.

use validator::ValidationError;

/// Validates that every answer option carries visible text.
///
/// # Examples
///
/// ```ignore
/// validate_options(&["Paris".into(), "Rome".into()]) // Ok
/// validate_options(&["Paris".into(), "  ".into()])   // Err - blank option
/// ```
pub fn validate_options(options: &[String]) -> Result<(), ValidationError> {
    if let Some(position) = options.iter().position(|option| option.trim().is_empty()) {
        let mut err = ValidationError::new("option_blank");
        err.message = Some(format!("Option {position} must not be blank").into());
        return Err(err);
    }

    Ok(())
}

/// Validates that `correct_option_index` points inside `options`.
pub fn validate_correct_index(
    correct_option_index: usize,
    options: &[String],
) -> Result<(), ValidationError> {
    if correct_option_index >= options.len() {
        let mut err = ValidationError::new("correct_option_out_of_range");
        err.message = Some(
            format!(
                "Correct option index {correct_option_index} is out of range ({} options)",
                options.len()
            )
            .into(),
        );
        return Err(err);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| (*v).to_string()).collect()
    }

    #[test]
    fn test_validate_options_valid() {
        assert!(validate_options(&options(&["a", "b"])).is_ok());
        assert!(validate_options(&options(&[" x ", "y", "z"])).is_ok());
    }

    #[test]
    fn test_validate_options_blank() {
        assert!(validate_options(&options(&["a", ""])).is_err());
        assert!(validate_options(&options(&["   ", "b"])).is_err());
    }

    #[test]
    fn test_validate_correct_index() {
        let opts = options(&["a", "b", "c"]);
        assert!(validate_correct_index(0, &opts).is_ok());
        assert!(validate_correct_index(2, &opts).is_ok());
        assert!(validate_correct_index(3, &opts).is_err());
    }
}
