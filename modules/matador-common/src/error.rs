use thiserror::Error;

#[derive(Error, Debug)]
pub enum MatadorError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),
}

/// Input problems caught before any upstream call is made.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please enter between 1 and 5 ZIP codes (got {0}).")]
    ZipCount(usize),

    #[error("At most 3 manual competitors can be entered (got {0}).")]
    TooManyManualCompetitors(usize),

    #[error("Unknown service style: {0}")]
    UnknownServiceStyle(String),

    #[error("Unknown option for {field}: {value}")]
    UnknownOption { field: &'static str, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_convert_and_keep_their_message() {
        let err: MatadorError = ValidationError::ZipCount(6).into();
        assert!(matches!(err, MatadorError::Validation(ValidationError::ZipCount(6))));
        assert_eq!(
            err.to_string(),
            "Invalid input: Please enter between 1 and 5 ZIP codes (got 6)."
        );
    }
}
