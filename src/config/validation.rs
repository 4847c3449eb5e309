//! Parameter validation
//!
//! Checks loading parameters before a run starts:
//! - Organization and credentials are present
//! - Fetch tuning values are usable

use super::loading_params::LoadingParams;

/// Validation error details
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validation result
pub type ValidationResult = std::result::Result<(), Vec<ValidationError>>;

/// Validate loading parameters, reporting every problem found
pub fn validate_params(params: &LoadingParams) -> ValidationResult {
    let mut errors = Vec::new();

    for (field, value) in [
        ("org", &params.org),
        ("username", &params.username),
        ("password", &params.password),
    ] {
        if value.trim().is_empty() {
            errors.push(ValidationError::new(field, "Must not be empty"));
        }
    }

    if params.fetch.api_url.trim().is_empty() {
        errors.push(ValidationError::new("fetch.api_url", "Must not be empty"));
    } else if !params.fetch.api_url.starts_with("http://")
        && !params.fetch.api_url.starts_with("https://")
    {
        errors.push(ValidationError::new(
            "fetch.api_url",
            format!("Invalid URL '{}': must start with http(s)://", params.fetch.api_url),
        ));
    }

    if params.fetch.max_in_flight == 0 {
        errors.push(ValidationError::new(
            "fetch.max_in_flight",
            "Must be greater than 0",
        ));
    }

    if params.fetch.snapshot_buffer == 0 {
        errors.push(ValidationError::new(
            "fetch.snapshot_buffer",
            "Must be greater than 0",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate and convert errors into a single crate error
pub fn validate_params_result(params: &LoadingParams) -> crate::Result<()> {
    validate_params(params).map_err(|errors| {
        let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        crate::ContributorsError::Validation(messages.join("; "))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_params() -> LoadingParams {
        LoadingParams {
            username: "octocat".to_string(),
            password: "token".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_params() {
        assert!(validate_params(&valid_params()).is_ok());
    }

    #[test]
    fn test_missing_credentials() {
        let params = LoadingParams::default();
        let errors = validate_params(&params).unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["username", "password"]);
    }

    #[test]
    fn test_blank_org() {
        let mut params = valid_params();
        params.org = "   ".to_string();
        let errors = validate_params(&params).unwrap_err();
        assert_eq!(errors[0].field, "org");
    }

    #[test]
    fn test_invalid_fetch_config() {
        let mut params = valid_params();
        params.fetch.api_url = "api.github.com".to_string();
        params.fetch.max_in_flight = 0;
        params.fetch.snapshot_buffer = 0;

        let errors = validate_params(&params).unwrap_err();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn test_validate_params_result_joins_messages() {
        let err = validate_params_result(&LoadingParams::default()).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("username: Must not be empty"));
        assert!(msg.contains("password: Must not be empty"));
    }
}
