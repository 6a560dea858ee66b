//! Test failure extraction from `xcresulttool get test-results tests` output.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Maximum failure message length, in characters.
pub const MAX_MESSAGE_LENGTH: usize = 500;

const ELLIPSIS: &str = "...";

// ---------------------------------------------------------------------------
// Input schema
// ---------------------------------------------------------------------------

/// Top-level test results document.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TestResults {
    #[serde(default)]
    pub devices: Vec<DeviceInfo>,

    #[serde(default)]
    pub test_nodes: Vec<TestNode>,
}

/// Entry of the `devices` list.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DeviceInfo {
    #[serde(default)]
    pub device_id: Option<String>,

    #[serde(default)]
    pub device_name: Option<String>,

    #[serde(default)]
    pub os_version: Option<String>,
}

/// A node of the test tree.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TestNode {
    #[serde(default)]
    pub node_type: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub result: String,

    /// Assertion text on `Failure Message` nodes.
    #[serde(default)]
    pub details: Option<String>,

    #[serde(default)]
    pub children: Vec<TestNode>,
}

/// How a node participates in the walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Bundle, suite, or case: extends the test path.
    Structural,
    /// Sets the device context for descendants.
    Device,
    /// Leaf carrying a failure message.
    FailureMessage,
    /// Configuration and anything unrecognised.
    Other,
}

impl TestNode {
    pub fn kind(&self) -> NodeKind {
        match self.node_type.as_str() {
            "Unit test bundle" | "UI test bundle" | "Test Suite" | "Test Case" => {
                NodeKind::Structural
            }
            "Device" => NodeKind::Device,
            "Failure Message" => NodeKind::FailureMessage,
            _ => NodeKind::Other,
        }
    }
}

// ---------------------------------------------------------------------------
// Output records
// ---------------------------------------------------------------------------

/// One failing assertion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FailureRecord {
    /// Names from bundle down to test case.
    pub path: Vec<String>,

    /// Failure text, capped at [`MAX_MESSAGE_LENGTH`].
    pub message: String,

    /// Device label, if the failure sits under a device node.
    pub device: Option<String>,
}

impl FailureRecord {
    /// Path joined with `/`, e.g. `AppTests/SuiteA/testFoo`.
    pub fn test_identifier(&self) -> String {
        self.path.join("/")
    }
}

/// Cap `message` at `max_length` characters, ending in `...` when cut.
pub fn truncate_message(message: &str, max_length: usize) -> String {
    if message.chars().count() <= max_length {
        return message.to_string();
    }
    let keep = max_length.saturating_sub(ELLIPSIS.len());
    let mut truncated: String = message.chars().take(keep).collect();
    truncated.push_str(ELLIPSIS);
    truncated
}

/// Map `deviceId` to `"deviceName (osVersion)"`, or just the name without an OS version.
pub fn build_device_map(devices: &[DeviceInfo]) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for device in devices {
        let Some(id) = device.device_id.as_deref().filter(|id| !id.is_empty()) else {
            continue;
        };
        let name = device.device_name.as_deref().unwrap_or("Unknown Device");
        let label = match device.os_version.as_deref() {
            Some(os) if !os.is_empty() => format!("{} ({})", name, os),
            _ => name.to_string(),
        };
        map.insert(id.to_string(), label);
    }
    map
}

/// Pre-order walk of one root node.
pub fn extract_failures(root: &TestNode) -> Vec<FailureRecord> {
    let mut failures = Vec::new();
    walk(root, &[], None, &mut failures);
    failures
}

fn walk(
    node: &TestNode,
    path: &[String],
    device: Option<&str>,
    failures: &mut Vec<FailureRecord>,
) {
    let kind = node.kind();

    let device = if kind == NodeKind::Device {
        Some(node.name.as_str())
    } else {
        device
    };

    let extended;
    let path = if kind == NodeKind::Structural {
        extended = [path, std::slice::from_ref(&node.name)].concat();
        extended.as_slice()
    } else {
        path
    };

    // Messages outside any test case have nothing to attach to.
    if kind == NodeKind::FailureMessage && !path.is_empty() {
        let message = node.details.as_deref().unwrap_or(&node.name);
        failures.push(FailureRecord {
            path: path.to_vec(),
            message: truncate_message(message, MAX_MESSAGE_LENGTH),
            device: device.map(str::to_string),
        });
    }

    for child in &node.children {
        walk(child, path, device, failures);
    }
}

/// All failures of a results document, with device ids resolved to labels.
pub fn collect_failures(results: &TestResults) -> Vec<FailureRecord> {
    let device_map = build_device_map(&results.devices);
    let mut failures: Vec<FailureRecord> =
        results.test_nodes.iter().flat_map(extract_failures).collect();

    for failure in &mut failures {
        if let Some(label) = failure.device.as_ref().and_then(|d| device_map.get(d)) {
            failure.device = Some(label.clone());
        }
    }
    failures
}
