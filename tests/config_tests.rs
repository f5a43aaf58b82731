//! Tests for the scrape configuration builder

use kodegen_tools_linkpreview::ScrapeError;
use kodegen_tools_linkpreview::config::ScrapeConfig;
use kodegen_tools_linkpreview::utils::{
    DEFAULT_MAX_HOPS, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_USER_AGENT,
};
use std::time::Duration;

#[test]
fn test_builder_defaults_match_default_impl() {
    let built = ScrapeConfig::builder().build().unwrap();

    assert_eq!(built, ScrapeConfig::default());
    assert_eq!(built.max_hops(), DEFAULT_MAX_HOPS);
    assert_eq!(built.request_timeout(), Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS));
    assert_eq!(built.user_agent(), DEFAULT_USER_AGENT);
    assert!(!built.accept_invalid_certs());
}

#[test]
fn test_builder_applies_every_setter() {
    let config = ScrapeConfig::builder()
        .max_hops(2)
        .request_timeout_secs(12)
        .user_agent("  preview-bot/1.0 ")
        .accept_invalid_certs(true)
        .build()
        .unwrap();

    assert_eq!(config.max_hops(), 2);
    assert_eq!(config.request_timeout_secs(), 12);
    assert_eq!(config.user_agent(), "preview-bot/1.0");
    assert!(config.accept_invalid_certs());
}

#[test]
fn test_builder_rejects_zero_timeout() {
    let result = ScrapeConfig::builder().request_timeout_secs(0).build();
    assert!(matches!(result, Err(ScrapeError::Config(_))));
}

#[test]
fn test_builder_rejects_blank_user_agent() {
    let result = ScrapeConfig::builder().user_agent("   ").build();
    assert!(matches!(result, Err(ScrapeError::Config(_))));
}

#[test]
fn test_partial_json_falls_back_to_defaults() {
    let config: ScrapeConfig = serde_json::from_str(r#"{"max_hops": 1}"#).unwrap();

    assert_eq!(config.max_hops(), 1);
    assert_eq!(config.request_timeout_secs(), DEFAULT_REQUEST_TIMEOUT_SECS);
    assert!(!config.accept_invalid_certs());
}

#[test]
fn test_json_is_validated_like_the_builder() {
    let zero_timeout = serde_json::from_str::<ScrapeConfig>(r#"{"request_timeout_secs": 0}"#);
    let blank_agent = serde_json::from_str::<ScrapeConfig>(r#"{"user_agent": " "}"#);

    assert!(zero_timeout.is_err());
    assert!(blank_agent.is_err());
}

#[test]
fn test_serialized_config_reads_back() {
    let config = ScrapeConfig::builder()
        .max_hops(3)
        .user_agent("preview-bot/2.0")
        .build()
        .unwrap();

    let json = serde_json::to_string(&config).unwrap();
    let restored: ScrapeConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, config);
}
