//! Tests for Twilio configuration extraction.

use super::*;
use serde_json::json;

// ============================================================================
// TwilioConfig::from_settings
// ============================================================================

mod twilio_config_tests {
    use super::*;

    #[test]
    fn test_valid_namespace_builds_config() {
        let settings = json!({
            "twilio": {
                "auth_token": "67890",
            },
        });

        let config = TwilioConfig::from_settings(&settings).expect("config should build");

        assert_eq!(config.auth_token().expose_secret(), "67890");
        assert_eq!(config.account_sid(), None);
        assert_eq!(config.webhook_url(), None);
    }

    #[test]
    fn test_optional_fields_are_extracted() {
        let settings = json!({
            "twilio": {
                "account_sid": "AC123",
                "auth_token": "secret",
                "webhook_url": "https://hooks.example.org/",
            },
        });

        let config = TwilioConfig::from_settings(&settings).unwrap();

        assert_eq!(config.account_sid(), Some("AC123"));
        assert_eq!(config.webhook_url(), Some("https://hooks.example.org"));
    }

    #[test]
    fn test_empty_settings_reports_missing_namespace() {
        let result = TwilioConfig::from_settings(&json!({}));
        assert_eq!(result.unwrap_err(), ConfigError::MissingNamespace);
    }

    #[test]
    fn test_non_mapping_settings_reports_missing_namespace() {
        let result = TwilioConfig::from_settings(&Value::Null);
        assert_eq!(result.unwrap_err(), ConfigError::MissingNamespace);
    }

    #[test]
    fn test_null_namespace_is_not_a_mapping() {
        let result = TwilioConfig::from_settings(&json!({ "twilio": null }));
        assert_eq!(result.unwrap_err(), ConfigError::NamespaceNotAMapping);
    }

    #[test]
    fn test_scalar_namespace_is_not_a_mapping() {
        let result = TwilioConfig::from_settings(&json!({ "twilio": "token" }));
        assert_eq!(result.unwrap_err(), ConfigError::NamespaceNotAMapping);
    }

    #[test]
    fn test_missing_or_empty_token_is_rejected() {
        let cases = [
            json!({ "twilio": {} }),
            json!({ "twilio": { "account_sid": null } }),
            json!({ "twilio": { "account_sid": "AC123" } }),
            json!({ "twilio": { "auth_token": "" } }),
            json!({ "twilio": { "auth_token": 12345 } }),
            json!({ "twilio": { "auth_token": null, "webhook_url": "https://x.org" } }),
        ];

        for settings in cases {
            assert_eq!(
                TwilioConfig::from_settings(&settings).unwrap_err(),
                ConfigError::MissingAuthToken,
                "settings {} should be rejected",
                settings
            );
        }
    }

    #[test]
    fn test_non_string_webhook_url_is_invalid() {
        let settings = json!({
            "twilio": {
                "auth_token": "secret",
                "webhook_url": 42,
            },
        });

        let result = TwilioConfig::from_settings(&settings);
        assert!(matches!(
            result,
            Err(ConfigError::InvalidField { ref field, .. }) if field == "twilio.webhook_url"
        ));
    }

    #[test]
    fn test_new_rejects_empty_token() {
        assert_eq!(
            TwilioConfig::new("").unwrap_err(),
            ConfigError::MissingAuthToken
        );
    }
}

// ============================================================================
// RestClientConfig::from_settings
// ============================================================================

mod rest_client_config_tests {
    use super::*;

    #[test]
    fn test_both_credentials_present() {
        let settings = json!({
            "twilio": {
                "account_sid": "AC123",
                "auth_token": "secret",
            },
        });

        let config = RestClientConfig::from_settings(&settings).unwrap();

        assert_eq!(config.account_sid(), "AC123");
        assert_eq!(config.auth_token().expose_secret(), "secret");
    }

    #[test]
    fn test_missing_namespace() {
        let result = RestClientConfig::from_settings(&json!({ "other": {} }));
        assert_eq!(result.unwrap_err(), ConfigError::MissingNamespace);
    }

    #[test]
    fn test_missing_either_credential() {
        let cases = [
            json!({ "twilio": { "auth_token": "secret" } }),
            json!({ "twilio": { "account_sid": "AC123" } }),
            json!({ "twilio": { "account_sid": "", "auth_token": "secret" } }),
            json!({ "twilio": { "account_sid": "AC123", "auth_token": "" } }),
        ];

        for settings in cases {
            assert_eq!(
                RestClientConfig::from_settings(&settings).unwrap_err(),
                ConfigError::MissingCredentials,
                "settings {} should be rejected",
                settings
            );
        }
    }
}

// ============================================================================
// AuthToken
// ============================================================================

#[test]
fn test_auth_token_debug_redacts_secret() {
    let token = AuthToken::new("top-secret-value").unwrap();
    let debug_str = format!("{:?}", token);

    assert!(
        !debug_str.contains("top-secret-value"),
        "secret must not appear in debug output; got: {}",
        debug_str
    );
    assert!(debug_str.contains("<REDACTED>"));
}

#[test]
fn test_config_debug_redacts_secret() {
    let config = TwilioConfig::new("top-secret-value").unwrap();
    assert!(!format!("{:?}", config).contains("top-secret-value"));
}
