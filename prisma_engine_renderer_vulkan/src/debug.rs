/// Vulkan Debug Messenger - routes validation layer messages into the engine logger
///
/// Messages pass the severity and category filters from `Config`, are
/// counted in `ValidationStats` and forwarded as `engine_*!` log entries.
/// Repeated messages carry an occurrence counter.

use ash::vk;
use colored::*;
use prisma_engine::prisma::{DebugMessageFilter, DebugSeverity, ValidationStats};
use prisma_engine::{engine_debug, engine_error, engine_trace, engine_warn};
use rustc_hash::FxHashMap;
use std::ffi::CStr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

const SOURCE: &str = "prisma::vulkan::validation";

/// Global debug configuration (shared across callbacks)
static DEBUG_CONFIG: Mutex<Option<DebugConfig>> = Mutex::new(None);

/// Global validation statistics (thread-safe atomic counters)
static VALIDATION_STATS: ValidationStatsTracker = ValidationStatsTracker::new();

/// Occurrences per message text
static MESSAGE_TRACKER: Mutex<Option<FxHashMap<String, u32>>> = Mutex::new(None);

/// Debug configuration for the callback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebugConfig {
    pub severity: DebugSeverity,
    pub message_filter: DebugMessageFilter,
}

/// Severity class of a validation message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MessageLevel {
    Error,
    Warning,
    Info,
    Verbose,
}

impl MessageLevel {
    pub(crate) fn from_vk(severity: vk::DebugUtilsMessageSeverityFlagsEXT) -> Self {
        if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::ERROR) {
            MessageLevel::Error
        } else if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::WARNING) {
            MessageLevel::Warning
        } else if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::INFO) {
            MessageLevel::Info
        } else {
            MessageLevel::Verbose
        }
    }
}

struct ValidationStatsTracker {
    errors: AtomicU32,
    warnings: AtomicU32,
    info: AtomicU32,
    verbose: AtomicU32,
}

impl ValidationStatsTracker {
    const fn new() -> Self {
        Self {
            errors: AtomicU32::new(0),
            warnings: AtomicU32::new(0),
            info: AtomicU32::new(0),
            verbose: AtomicU32::new(0),
        }
    }

    fn increment(&self, level: MessageLevel) {
        let counter = match level {
            MessageLevel::Error => &self.errors,
            MessageLevel::Warning => &self.warnings,
            MessageLevel::Info => &self.info,
            MessageLevel::Verbose => &self.verbose,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn get_stats(&self) -> ValidationStats {
        ValidationStats {
            errors: self.errors.load(Ordering::Relaxed),
            warnings: self.warnings.load(Ordering::Relaxed),
            info: self.info.load(Ordering::Relaxed),
            verbose: self.verbose.load(Ordering::Relaxed),
        }
    }

    fn reset(&self) {
        self.errors.store(0, Ordering::Relaxed);
        self.warnings.store(0, Ordering::Relaxed);
        self.info.store(0, Ordering::Relaxed);
        self.verbose.store(0, Ordering::Relaxed);
    }
}

/// Severity flags the messenger is created with
pub(crate) fn severity_flags(severity: DebugSeverity) -> vk::DebugUtilsMessageSeverityFlagsEXT {
    match severity {
        DebugSeverity::ErrorsOnly => vk::DebugUtilsMessageSeverityFlagsEXT::ERROR,
        DebugSeverity::ErrorsAndWarnings => {
            vk::DebugUtilsMessageSeverityFlagsEXT::ERROR
                | vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
        }
        DebugSeverity::All => {
            vk::DebugUtilsMessageSeverityFlagsEXT::ERROR
                | vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
                | vk::DebugUtilsMessageSeverityFlagsEXT::INFO
                | vk::DebugUtilsMessageSeverityFlagsEXT::VERBOSE
        }
    }
}

/// Category label, validation taking precedence over performance
pub(crate) fn message_category(message_type: vk::DebugUtilsMessageTypeFlagsEXT) -> &'static str {
    if message_type.contains(vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION) {
        "Validation"
    } else if message_type.contains(vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE) {
        "Performance"
    } else {
        "General"
    }
}

/// Whether a message passes the configured severity and category filters
pub(crate) fn should_forward(
    config: &DebugConfig,
    level: MessageLevel,
    message_type: vk::DebugUtilsMessageTypeFlagsEXT,
) -> bool {
    let severity_ok = match config.severity {
        DebugSeverity::ErrorsOnly => level == MessageLevel::Error,
        DebugSeverity::ErrorsAndWarnings => matches!(level, MessageLevel::Error | MessageLevel::Warning),
        DebugSeverity::All => true,
    };
    if !severity_ok {
        return false;
    }

    match message_category(message_type) {
        "Validation" => config.message_filter.show_validation,
        "Performance" => config.message_filter.show_performance,
        _ => config.message_filter.show_general,
    }
}

/// Install the filter used by the callback and reset the counters
pub fn init_debug_config(config: DebugConfig) {
    VALIDATION_STATS.reset();
    if let Ok(mut tracker) = MESSAGE_TRACKER.lock() {
        *tracker = Some(FxHashMap::default());
    }
    if let Ok(mut guard) = DEBUG_CONFIG.lock() {
        *guard = Some(config);
    }
}

/// Detach the callback from the logger (messages are ignored afterwards)
pub(crate) fn cleanup_debug_config() {
    if let Ok(mut guard) = DEBUG_CONFIG.lock() {
        *guard = None;
    }
}

/// Count one forwarded message and return how often it was seen
pub(crate) fn record_message(level: MessageLevel, message: &str) -> u32 {
    VALIDATION_STATS.increment(level);
    match MESSAGE_TRACKER.lock() {
        Ok(mut tracker) => {
            let count = tracker
                .get_or_insert_with(FxHashMap::default)
                .entry(message.to_string())
                .or_insert(0);
            *count += 1;
            *count
        }
        Err(_) => 1,
    }
}

/// Current validation statistics
pub fn get_validation_stats() -> ValidationStats {
    VALIDATION_STATS.get_stats()
}

/// Print validation statistics report
pub fn print_validation_stats_report() {
    let stats = get_validation_stats();

    if stats.total() == 0 {
        println!("\n{}", "No validation messages".green().bold());
        return;
    }

    println!("\n{}", "=== Validation Statistics Report ===".bright_blue().bold());
    if stats.errors > 0 {
        println!("  {} {}", "Errors:".red().bold(), stats.errors);
    }
    if stats.warnings > 0 {
        println!("  {} {}", "Warnings:".yellow().bold(), stats.warnings);
    }
    if stats.info > 0 {
        println!("  {} {}", "Info:".cyan(), stats.info);
    }
    if stats.verbose > 0 {
        println!("  {} {}", "Verbose:".bright_black(), stats.verbose);
    }
    println!("  {} {}", "Total:".white().bold(), stats.total());

    if let Ok(tracker) = MESSAGE_TRACKER.lock() {
        if let Some(messages) = tracker.as_ref() {
            let repeated = messages.values().filter(|&&count| count > 1).count();
            if repeated > 0 {
                println!("\n  {} message(s) appeared multiple times", repeated);
            }
        }
    }
    println!("{}\n", "====================================".bright_blue().bold());
}

unsafe fn c_str_or<'a>(ptr: *const std::os::raw::c_char, fallback: &'a str) -> std::borrow::Cow<'a, str> {
    if ptr.is_null() {
        std::borrow::Cow::Borrowed(fallback)
    } else {
        CStr::from_ptr(ptr).to_string_lossy()
    }
}

/// Vulkan debug messenger callback
///
/// Called by the validation layers; never asks Vulkan to abort the call.
pub unsafe extern "system" fn vulkan_debug_callback(
    message_severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    message_type: vk::DebugUtilsMessageTypeFlagsEXT,
    p_callback_data: *const vk::DebugUtilsMessengerCallbackDataEXT<'_>,
    _user_data: *mut std::os::raw::c_void,
) -> vk::Bool32 {
    if p_callback_data.is_null() {
        return vk::FALSE;
    }

    let config = match DEBUG_CONFIG.lock() {
        Ok(guard) => match *guard {
            Some(config) => config,
            None => return vk::FALSE,
        },
        Err(_) => return vk::FALSE,
    };

    let level = MessageLevel::from_vk(message_severity);
    if !should_forward(&config, level, message_type) {
        return vk::FALSE;
    }

    let callback_data = &*p_callback_data;
    let message_id = c_str_or(callback_data.p_message_id_name, "Unknown");
    let message = c_str_or(callback_data.p_message, "No message");
    let category = message_category(message_type);

    let occurrences = record_message(level, &message);
    let repeat = if occurrences > 1 { format!(" [x{}]", occurrences) } else { String::new() };

    match level {
        MessageLevel::Error => engine_error!(SOURCE, "[{}] {}{}: {}", category, message_id, repeat, message),
        MessageLevel::Warning => engine_warn!(SOURCE, "[{}] {}{}: {}", category, message_id, repeat, message),
        MessageLevel::Info => engine_debug!(SOURCE, "[{}] {}{}: {}", category, message_id, repeat, message),
        MessageLevel::Verbose => engine_trace!(SOURCE, "[{}] {}{}: {}", category, message_id, repeat, message),
    }

    vk::FALSE
}

#[cfg(test)]
#[path = "debug_tests.rs"]
mod tests;
