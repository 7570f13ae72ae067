//! Unit tests for the validation message filter (no GPU required)

use super::*;

fn config(severity: DebugSeverity) -> DebugConfig {
    DebugConfig { severity, message_filter: DebugMessageFilter::default() }
}

// ============================================================================
// CLASSIFICATION
// ============================================================================

#[test]
fn test_message_level_from_vk_picks_highest_bit() {
    let both = vk::DebugUtilsMessageSeverityFlagsEXT::ERROR | vk::DebugUtilsMessageSeverityFlagsEXT::INFO;
    assert_eq!(MessageLevel::from_vk(both), MessageLevel::Error);
    assert_eq!(
        MessageLevel::from_vk(vk::DebugUtilsMessageSeverityFlagsEXT::WARNING),
        MessageLevel::Warning
    );
    assert_eq!(
        MessageLevel::from_vk(vk::DebugUtilsMessageSeverityFlagsEXT::VERBOSE),
        MessageLevel::Verbose
    );
}

#[test]
fn test_message_category_prefers_validation() {
    let both = vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE;
    assert_eq!(message_category(both), "Validation");
    assert_eq!(message_category(vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE), "Performance");
    assert_eq!(message_category(vk::DebugUtilsMessageTypeFlagsEXT::GENERAL), "General");
}

#[test]
fn test_severity_flags() {
    assert_eq!(
        severity_flags(DebugSeverity::ErrorsOnly),
        vk::DebugUtilsMessageSeverityFlagsEXT::ERROR
    );
    assert!(severity_flags(DebugSeverity::All).contains(vk::DebugUtilsMessageSeverityFlagsEXT::VERBOSE));
    assert!(!severity_flags(DebugSeverity::ErrorsAndWarnings).contains(vk::DebugUtilsMessageSeverityFlagsEXT::INFO));
}

// ============================================================================
// FILTERING
// ============================================================================

#[test]
fn test_severity_filter() {
    let validation = vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION;

    let errors_only = config(DebugSeverity::ErrorsOnly);
    assert!(should_forward(&errors_only, MessageLevel::Error, validation));
    assert!(!should_forward(&errors_only, MessageLevel::Warning, validation));

    let warnings = config(DebugSeverity::ErrorsAndWarnings);
    assert!(should_forward(&warnings, MessageLevel::Warning, validation));
    assert!(!should_forward(&warnings, MessageLevel::Info, validation));

    assert!(should_forward(&config(DebugSeverity::All), MessageLevel::Verbose, validation));
}

#[test]
fn test_category_filter() {
    let mut cfg = config(DebugSeverity::All);
    cfg.message_filter.show_performance = false;

    assert!(!should_forward(&cfg, MessageLevel::Warning, vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE));
    assert!(should_forward(&cfg, MessageLevel::Warning, vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION));
    assert!(should_forward(&cfg, MessageLevel::Warning, vk::DebugUtilsMessageTypeFlagsEXT::GENERAL));
}

// ============================================================================
// TRACKING
// ============================================================================

#[test]
fn test_record_message_counts_repeats() {
    let text = "debug_tests: repeated message";
    assert_eq!(record_message(MessageLevel::Warning, text), 1);
    assert_eq!(record_message(MessageLevel::Warning, text), 2);
    assert_eq!(record_message(MessageLevel::Warning, "debug_tests: other message"), 1);
}
