use thiserror::Error;

#[derive(Error, Debug)]
pub enum AdvisorError {
    #[error("Required information missing from report: {}", missing.join(", "))]
    ExtractionInsufficient { missing: Vec<String> },

    #[error("No price configured for bundle '{bundle}' ({ram_generation})")]
    PricingConfigurationMissing {
        bundle: String,
        ram_generation: String,
    },

    #[error("Remote advisor still rate limited after {attempts} attempts (last Retry-After: {retry_after_secs}s)")]
    UpstreamRateLimited { attempts: u32, retry_after_secs: u64 },

    #[error("Remote advisor request failed: {0}")]
    UpstreamTransportError(#[from] reqwest::Error),

    #[error("Remote advisor returned HTTP {status}: {body}")]
    UpstreamStatus { status: u16, body: String },

    #[error("Remote advisor response unusable: {message}")]
    UpstreamResponseError { message: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Malformed remote response: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Extraction,
    Pricing,
    Upstream,
    Io,
    Configuration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl AdvisorError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            AdvisorError::ExtractionInsufficient { .. } => ErrorCategory::Extraction,
            AdvisorError::PricingConfigurationMissing { .. } => ErrorCategory::Pricing,
            AdvisorError::UpstreamRateLimited { .. }
            | AdvisorError::UpstreamTransportError(_)
            | AdvisorError::UpstreamStatus { .. }
            | AdvisorError::UpstreamResponseError { .. }
            | AdvisorError::SerializationError(_) => ErrorCategory::Upstream,
            AdvisorError::IoError(_) => ErrorCategory::Io,
            AdvisorError::ConfigValidationError { .. }
            | AdvisorError::InvalidConfigValueError { .. }
            | AdvisorError::MissingConfigError { .. } => ErrorCategory::Configuration,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            AdvisorError::ExtractionInsufficient { .. } => ErrorSeverity::Low,
            AdvisorError::UpstreamRateLimited { .. } => ErrorSeverity::Medium,
            AdvisorError::UpstreamTransportError(_)
            | AdvisorError::UpstreamStatus { .. }
            | AdvisorError::UpstreamResponseError { .. }
            | AdvisorError::IoError(_)
            | AdvisorError::SerializationError(_) => ErrorSeverity::High,
            // 價目表缺項代表部署配置錯誤
            AdvisorError::PricingConfigurationMissing { .. }
            | AdvisorError::ConfigValidationError { .. }
            | AdvisorError::InvalidConfigValueError { .. }
            | AdvisorError::MissingConfigError { .. } => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            AdvisorError::ExtractionInsufficient { .. } => {
                "Upload a full diagnostic report that lists the RAM type, motherboard and CPU"
                    .to_string()
            }
            AdvisorError::PricingConfigurationMissing { bundle, .. } => format!(
                "Add a [[pricing.bundles]] row for '{}' to the advisor configuration",
                bundle
            ),
            AdvisorError::UpstreamRateLimited { .. } => {
                "Wait a minute and submit the report again".to_string()
            }
            AdvisorError::UpstreamTransportError(_) => {
                "Check network connectivity and the remote endpoint".to_string()
            }
            AdvisorError::UpstreamStatus { status, .. } if *status == 401 || *status == 403 => {
                "Check the remote API key".to_string()
            }
            AdvisorError::UpstreamStatus { .. } | AdvisorError::UpstreamResponseError { .. } => {
                "Retry later or switch to the local rule engine (mode = \"rules\")".to_string()
            }
            AdvisorError::IoError(_) => "Check that the report file exists and is readable".to_string(),
            AdvisorError::SerializationError(_) => {
                "Check that the remote endpoint speaks the chat-completions format".to_string()
            }
            AdvisorError::ConfigValidationError { field, .. }
            | AdvisorError::InvalidConfigValueError { field, .. }
            | AdvisorError::MissingConfigError { field } => {
                format!("Fix '{}' in the advisor configuration file", field)
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Extraction => {
                "Could not extract the required information from the report.".to_string()
            }
            ErrorCategory::Pricing => {
                "No price is configured for this combination; the team has been notified."
                    .to_string()
            }
            ErrorCategory::Upstream => format!("The analysis service failed: {}", self),
            ErrorCategory::Io => format!("Could not read the report: {}", self),
            ErrorCategory::Configuration => format!("Invalid configuration: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, AdvisorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pricing_miss_is_critical() {
        let err = AdvisorError::PricingConfigurationMissing {
            bundle: "RAM".to_string(),
            ram_generation: "DDR4".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Pricing);
        assert_eq!(err.severity(), ErrorSeverity::Critical);
        assert!(err.recovery_suggestion().contains("RAM"));
    }

    #[test]
    fn test_extraction_message_is_plain_sentence() {
        let err = AdvisorError::ExtractionInsufficient {
            missing: vec!["chipset".to_string()],
        };
        assert_eq!(
            err.user_friendly_message(),
            "Could not extract the required information from the report."
        );
        assert_eq!(err.to_string(), "Required information missing from report: chipset");
    }

    #[test]
    fn test_upstream_auth_suggestion() {
        let err = AdvisorError::UpstreamStatus {
            status: 401,
            body: "unauthorized".to_string(),
        };
        assert_eq!(err.recovery_suggestion(), "Check the remote API key");
        assert_eq!(err.severity(), ErrorSeverity::High);
    }
}
