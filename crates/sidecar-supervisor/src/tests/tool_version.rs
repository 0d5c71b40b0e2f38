use crate::ToolVersion;

use std::str::FromStr;

#[test]
fn test_extract_version_from_tool_output() {
    assert_eq!(
        ToolVersion::extract("reasoning-server 1.4.2"),
        Some(ToolVersion::new(1, 4, 2))
    );
    assert_eq!(
        ToolVersion::extract("v0.9.1-beta.2 (build abc123)"),
        Some(ToolVersion::new(0, 9, 1))
    );
    assert_eq!(
        ToolVersion::extract("version: 2.1"),
        Some(ToolVersion::new(2, 1, 0))
    );
}

#[test]
fn test_extract_returns_none_without_version() {
    assert_eq!(ToolVersion::extract("development build"), None);
    assert_eq!(ToolVersion::extract(""), None);
}

#[test]
fn test_from_str_rejects_malformed_versions() {
    assert!(ToolVersion::from_str("1").is_err());
    assert!(ToolVersion::from_str("1.x.0").is_err());
    assert!(ToolVersion::from_str("1.2.3.4").is_err());
}

#[test]
fn test_versions_order_numerically() {
    assert!(ToolVersion::new(0, 10, 0) > ToolVersion::new(0, 9, 9));
    assert!(ToolVersion::new(1, 0, 0) > ToolVersion::new(0, 99, 99));
    assert_eq!(ToolVersion::new(1, 2, 3).to_string(), "1.2.3");
}
