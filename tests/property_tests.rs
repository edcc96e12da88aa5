//! Property-based tests for log_pipeline using proptest

use log_pipeline::{ErrorReport, LogMessage, LogPipeline, Severity};
use proptest::prelude::*;
use std::time::{Duration, Instant};

fn any_real_severity() -> impl Strategy<Value = Severity> {
    prop_oneof![
        Just(Severity::Verbose),
        Just(Severity::Debug),
        Just(Severity::Info),
        Just(Severity::Warning),
        Just(Severity::Error),
        Just(Severity::Fatal),
    ]
}

/// A pipeline whose drain worker stays parked for the whole test, with its
/// startup notice already consumed.
fn manual_pipeline() -> LogPipeline {
    let pipeline = LogPipeline::builder()
        .tick_interval(Duration::from_secs(600))
        .build();
    let deadline = Instant::now() + Duration::from_secs(2);
    loop {
        let message = pipeline.pop_log();
        if !message.is_none() {
            break;
        }
        assert!(Instant::now() < deadline, "startup notice never arrived");
        std::thread::sleep(Duration::from_millis(2));
    }
    pipeline
}

// ============================================================================
// Severity Tests
// ============================================================================

proptest! {
    /// Test that Severity string conversions roundtrip correctly
    #[test]
    fn test_severity_str_roundtrip(severity in any_real_severity()) {
        let as_str = severity.as_str();
        let parsed: Severity = as_str.parse().unwrap();
        assert_eq!(severity, parsed);
    }

    /// Test that Severity ordering is consistent with its numeric rank
    #[test]
    fn test_severity_ordering(
        first in any_real_severity(),
        second in any_real_severity(),
    ) {
        let val1 = first.as_u8();
        let val2 = second.as_u8();

        assert_eq!(first <= second, val1 <= val2);
        assert_eq!(first < second, val1 < val2);
        assert_eq!(first >= second, val1 >= val2);
        assert_eq!(first > second, val1 > val2);
    }

    /// Test that Severity Display matches as_str
    #[test]
    fn test_severity_display(severity in any_real_severity()) {
        assert_eq!(format!("{}", severity), severity.as_str());
    }

    /// Test that parsing accepts case-insensitive input
    #[test]
    fn test_severity_case_insensitive(use_lower in any::<bool>()) {
        let names = vec!["VERBOSE", "DEBUG", "INFO", "WARNING", "ERROR", "FATAL"];

        for name in names {
            let input = if use_lower {
                name.to_lowercase()
            } else {
                name.to_string()
            };

            let parsed: std::result::Result<Severity, String> = input.parse();
            assert!(parsed.is_ok(), "Failed to parse: {}", input);
        }
    }

    /// Test that parsing handles arbitrary invalid input gracefully
    #[test]
    fn test_severity_invalid_parse(invalid in "[0-9!@#$%^&*()_+ ]+") {
        let result: std::result::Result<Severity, String> = invalid.parse();
        assert!(
            result.is_err(),
            "Expected parse error for '{}', got: {:?}",
            invalid,
            result
        );
    }
}

// ============================================================================
// Message Sanitization Tests (Security Critical!)
// ============================================================================

proptest! {
    /// Test that newlines are sanitized in log messages (prevents log injection)
    #[test]
    fn test_message_sanitization_newlines(text in ".*") {
        let message = LogMessage::new(Severity::Info, "Prop", text.clone());

        assert!(!message.text.contains('\n'),
                "Message contains unsanitized newline: {:?}", message.text);

        if text.contains('\n') {
            assert!(message.text.contains("\\n"),
                    "Newlines not properly escaped: {:?}", message.text);
        }
    }

    /// Test that carriage returns are sanitized (prevents log injection)
    #[test]
    fn test_message_sanitization_carriage_return(text in ".*") {
        let message = LogMessage::new(Severity::Info, "Prop", text.clone());

        assert!(!message.text.contains('\r'),
                "Message contains unsanitized carriage return: {:?}", message.text);

        if text.contains('\r') {
            assert!(message.text.contains("\\r"),
                    "Carriage returns not properly escaped: {:?}", message.text);
        }
    }

    /// Test that tabs are sanitized
    #[test]
    fn test_message_sanitization_tabs(text in ".*") {
        let message = LogMessage::new(Severity::Info, "Prop", text.clone());

        assert!(!message.text.contains('\t'),
                "Message contains unsanitized tab: {:?}", message.text);

        if text.contains('\t') {
            assert!(message.text.contains("\\t"),
                    "Tabs not properly escaped: {:?}", message.text);
        }
    }

    /// Test that log injection attacks are prevented
    #[test]
    fn test_log_injection_prevention(
        legitimate in "[a-zA-Z0-9 ]+",
        forged_level in prop_oneof![
            Just("ERROR"),
            Just("WARNING"),
            Just("FATAL"),
        ]
    ) {
        // Simulate an attacker trying to forge an extra log entry.
        let malicious = format!("{}\n{}: Fake admin login", legitimate, forged_level);
        let message = LogMessage::new(Severity::Info, "Auth", malicious);

        let lines: Vec<&str> = message.text.split('\n').collect();
        assert_eq!(lines.len(), 1,
                   "Message was not properly sanitized, contains multiple lines: {:?}",
                   message.text);
    }
}

// ============================================================================
// LogMessage Tests
// ============================================================================

proptest! {
    /// Test that construction never panics and always captures identity
    #[test]
    fn test_message_identity(text in ".*", severity in any_real_severity()) {
        let message = LogMessage::new(severity, "Prop", text);

        assert_eq!(message.process_id, std::process::id());
        assert_ne!(message.thread_id, 0);
        assert!(!message.is_none());
    }

    /// Test that cloning preserves every field
    #[test]
    fn test_message_clone(text in ".*") {
        let original = LogMessage::new(Severity::Error, "Prop", text);
        let cloned = original.clone();
        assert_eq!(original, cloned);
    }
}

// ============================================================================
// JSON Serialization Tests
// ============================================================================

proptest! {
    /// Test that LogMessage JSON serialization roundtrips
    #[test]
    fn test_message_json_roundtrip(
        text in ".*",
        severity in any_real_severity(),
    ) {
        let message = LogMessage::new(severity, "Json", text);
        let json = serde_json::to_string(&message);
        assert!(json.is_ok(), "Failed to serialize: {:?}", json.err());

        let parsed: serde_json::Result<LogMessage> = serde_json::from_str(&json.unwrap());
        assert!(parsed.is_ok(), "Failed to deserialize");
        assert_eq!(parsed.unwrap(), message);
    }

    /// Test that Severity JSON serialization roundtrips
    #[test]
    fn test_severity_json_roundtrip(severity in any_real_severity()) {
        let json = serde_json::to_string(&severity).expect("serialize severity");
        let parsed: Severity = serde_json::from_str(&json).expect("deserialize severity");
        assert_eq!(parsed, severity);
    }
}

// ============================================================================
// Error Report Tests
// ============================================================================

proptest! {
    /// Test that rendering never panics and keeps its leading lines stable
    #[test]
    fn test_report_render_structure(
        kind in "[a-z]+::[A-Za-z]+",
        text in ".*",
    ) {
        let report = ErrorReport::new(kind.clone(), text.clone());
        let lines = report.render_lines();

        assert_eq!(lines[0], format!("Exception: {}", report.short_kind()));
        assert_eq!(lines[1], format!("Full name: {}", kind));
        assert_eq!(lines[2], format!("Message: {}", text));
    }

    /// Test that every attached data entry is rendered
    #[test]
    fn test_report_renders_all_data(
        entries in prop::collection::vec(("[a-z]{1,8}", "[a-z0-9]{1,8}"), 1..6)
    ) {
        let mut report = ErrorReport::new("prop::Error", "boom");
        for (key, value) in &entries {
            report = report.with_data(key.clone(), value.clone());
        }

        let rendered = report.render_lines().join("\n");
        for (key, value) in &entries {
            assert!(
                rendered.contains(&format!("{}: {}", key, value)),
                "Data entry {}={} missing from render",
                key,
                value
            );
        }
    }
}

// ============================================================================
// Drain Ordering Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Test that one drained batch orders by severity, then by arrival
    #[test]
    fn test_drain_orders_any_permutation(
        severities in prop::collection::vec(any_real_severity(), 1..40)
    ) {
        let pipeline = manual_pipeline();
        for (index, severity) in severities.iter().enumerate() {
            pipeline.submit(*severity, "Prop", index.to_string());
        }
        pipeline.drain_now();

        let mut popped = Vec::new();
        loop {
            let message = pipeline.pop_log();
            if message.is_none() {
                break;
            }
            popped.push(message);
        }

        let mut expected: Vec<(Severity, usize)> = severities
            .iter()
            .enumerate()
            .map(|(index, severity)| (*severity, index))
            .collect();
        expected.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));

        assert_eq!(popped.len(), expected.len());
        for (message, (severity, index)) in popped.iter().zip(&expected) {
            assert_eq!(message.severity, *severity);
            assert_eq!(message.text, index.to_string());
        }

        pipeline.dispose();
    }
}
