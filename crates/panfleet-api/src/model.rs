// Wire models for inventory responses.
//
// These are parsed straight out of the manager's XML envelopes; panfleet
// renders and serializes them as plain data.

use serde::Serialize;

use crate::tree::Element;

/// Sentinel the manager uses for fields it has no value for.
const NOT_AVAILABLE: &str = "N/A";

/// A managed gateway as reported by the device inventory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Device {
    pub hostname: String,
    /// Normalized (trimmed, uppercased) serial -- the fleet-wide key.
    pub serial: String,
    pub ip_address: String,
    pub model: Option<String>,
    pub sw_version: Option<String>,
    pub connected: bool,
    /// Parent device group, when known from a group listing.
    pub device_group: Option<String>,
    /// Assigned template, when known from a template listing.
    pub template: Option<String>,
}

impl Device {
    /// Parse an inventory `<entry>`. Entries missing hostname, serial,
    /// or management IP are placeholders and yield `None`.
    pub fn from_entry(entry: &Element) -> Option<Self> {
        let hostname = present(entry.child_text("hostname"))?;
        let serial = present(entry.child_text("serial"))?;
        let ip_address = present(entry.child_text("ip-address"))?;
        Some(Self {
            hostname: hostname.to_owned(),
            serial: normalize_serial(serial),
            ip_address: ip_address.to_owned(),
            model: present(entry.child_text("model")).map(ToOwned::to_owned),
            sw_version: present(entry.child_text("sw-version")).map(ToOwned::to_owned),
            connected: parse_connected(entry),
            device_group: None,
            template: None,
        })
    }
}

/// Uppercased, trimmed serial -- inventory and drift results key on this.
pub fn normalize_serial(serial: &str) -> String {
    serial.trim().to_uppercase()
}

fn present(text: Option<&str>) -> Option<&str> {
    text.filter(|t| *t != NOT_AVAILABLE)
}

/// The connected flag moves between fields across manager releases;
/// probe the known spellings.
fn parse_connected(entry: &Element) -> bool {
    let candidates = [
        entry.child_text("connected"),
        entry.child_text("connection-status"),
        entry.child_text("connected-to-manager"),
        entry.find_path(&["ha", "peer", "connected"]).map(|e| e.text.as_str()),
    ];
    let raw = candidates.into_iter().flatten().next().unwrap_or("");
    matches!(
        raw.trim().to_lowercase().as_str(),
        "yes" | "true" | "connected" | "up" | "1"
    )
}

/// Policy or template synchronization state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SyncStatus {
    InSync,
    OutOfSync,
    Unknown,
}

impl SyncStatus {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.unwrap_or("").trim().to_lowercase().as_str() {
            "in sync" => Self::InSync,
            "out of sync" => Self::OutOfSync,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::InSync => "in sync",
            Self::OutOfSync => "out of sync",
            Self::Unknown => "unknown",
        }
    }
}

/// One device's membership in a device group, with its shared-policy
/// sync state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceGroupMember {
    pub group: String,
    pub hostname: String,
    pub status: SyncStatus,
}

/// Parse the `<show><devicegroups/></show>` result payload.
pub fn parse_device_groups(result: &Element) -> Vec<DeviceGroupMember> {
    let mut members = Vec::new();
    let Some(groups) = result.descendant("devicegroups") else {
        return members;
    };
    for group in groups.children_named("entry") {
        let Some(name) = group.name_attr() else {
            continue;
        };
        let multi_vsys = group.child_text("multi-vsys").unwrap_or("yes");
        let Some(devices) = group.child("devices") else {
            continue;
        };
        for dev in devices.children_named("entry") {
            let Some(hostname) = dev.child_text("hostname") else {
                continue;
            };
            // Single-vsys gateways report a synthetic vsys1 member.
            if hostname == "vsys1" && multi_vsys.eq_ignore_ascii_case("no") {
                continue;
            }
            members.push(DeviceGroupMember {
                group: name.to_owned(),
                hostname: hostname.to_owned(),
                status: SyncStatus::parse(dev.child_text("shared-policy-status")),
            });
        }
    }
    members.sort_by(|a, b| a.hostname.to_lowercase().cmp(&b.hostname.to_lowercase()));
    members
}

/// One device's template assignment, with its sync state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateMember {
    pub template: String,
    pub hostname: String,
    pub status: SyncStatus,
}

/// Parse the `<show><templates/></show>` result payload.
///
/// Two shapes exist: stack entries named `<template>_stack` carrying a
/// `template-status`, and plain template entries listing member devices
/// with a `device-template-sync`.
pub fn parse_templates(result: &Element) -> Vec<TemplateMember> {
    let mut members = Vec::new();
    let Some(templates) = result.descendant("templates") else {
        return members;
    };
    for entry in templates.children_named("entry") {
        let Some(name) = entry.name_attr() else {
            continue;
        };
        if let Some(hostname) = name.strip_suffix("_stack") {
            if hostname.is_empty() || hostname == "vsys1" {
                continue;
            }
            let status = entry
                .child_text("template-status")
                .or_else(|| entry.descendant_text("template-status"));
            members.push(TemplateMember {
                template: name.to_owned(),
                hostname: hostname.to_owned(),
                status: SyncStatus::parse(status),
            });
            continue;
        }
        let Some(devices) = entry.child("devices") else {
            continue;
        };
        for dev in devices.children_named("entry") {
            let Some(hostname) = dev.child_text("hostname") else {
                continue;
            };
            if hostname == "vsys1" {
                continue;
            }
            members.push(TemplateMember {
                template: name.to_owned(),
                hostname: hostname.to_owned(),
                status: SyncStatus::parse(dev.child_text("device-template-sync")),
            });
        }
    }
    members.sort_by(|a, b| a.hostname.to_lowercase().cmp(&b.hostname.to_lowercase()));
    members
}

/// Fill in each device's group and template assignment from the
/// membership listings, matched by hostname.
pub fn annotate_membership(
    devices: &mut [Device],
    groups: &[DeviceGroupMember],
    templates: &[TemplateMember],
) {
    for device in devices {
        if device.device_group.is_none() {
            device.device_group = groups
                .iter()
                .find(|g| g.hostname == device.hostname)
                .map(|g| g.group.clone());
        }
        if device.template.is_none() {
            device.template = templates
                .iter()
                .find(|t| t.hostname == device.hostname)
                .map(|t| t.template.clone());
        }
    }
}

/// Parsed `show system info` summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SystemInfo {
    pub hostname: String,
    pub ip_address: String,
    pub default_gateway: String,
    pub netmask: String,
    pub is_dhcp: String,
    pub mac_address: String,
    pub model: String,
    pub sw_version: String,
    pub serial: String,
    pub uptime: String,
}

impl SystemInfo {
    /// Build from the `<system>` element of a `show system info` result.
    pub fn from_element(system: &Element) -> Self {
        let field = |tag: &str| {
            system
                .child_text(tag)
                .unwrap_or(NOT_AVAILABLE)
                .to_owned()
        };
        Self {
            hostname: field("hostname"),
            ip_address: field("ip-address"),
            default_gateway: field("default-gateway"),
            netmask: field("netmask"),
            is_dhcp: field("is-dhcp"),
            mac_address: field("mac-address"),
            model: field("model"),
            sw_version: field("sw-version"),
            serial: field("serial"),
            uptime: field("uptime"),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::tree::ConfigTree;

    use super::*;

    fn tree(xml: &str) -> ConfigTree {
        ConfigTree::parse(xml).expect("parse fixture")
    }

    #[test]
    fn device_entry_parses_and_normalizes_serial() {
        let t = tree(
            "<entry><hostname>fw-edge-1</hostname><serial> 0123abc </serial>\
             <ip-address>10.0.0.5</ip-address><model>PA-440</model>\
             <connected>yes</connected></entry>",
        );
        let device = Device::from_entry(&t.root).expect("device");
        assert_eq!(device.serial, "0123ABC");
        assert!(device.connected);
        assert_eq!(device.model.as_deref(), Some("PA-440"));
    }

    #[test]
    fn placeholder_entries_are_skipped() {
        let t = tree(
            "<entry><hostname>N/A</hostname><serial>001</serial>\
             <ip-address>10.0.0.5</ip-address></entry>",
        );
        assert!(Device::from_entry(&t.root).is_none());
    }

    #[test]
    fn connected_falls_back_to_alternate_fields() {
        let t = tree(
            "<entry><hostname>fw</hostname><serial>001</serial>\
             <ip-address>10.0.0.5</ip-address>\
             <connection-status>Connected</connection-status></entry>",
        );
        let device = Device::from_entry(&t.root).expect("device");
        assert!(device.connected);
    }

    #[test]
    fn device_groups_filter_synthetic_vsys() {
        let t = tree(
            "<result><devicegroups><entry name=\"branch\">\
             <multi-vsys>no</multi-vsys><devices>\
             <entry><hostname>vsys1</hostname></entry>\
             <entry><hostname>fw-a</hostname>\
             <shared-policy-status>In Sync</shared-policy-status></entry>\
             </devices></entry></devicegroups></result>",
        );
        let members = parse_device_groups(&t.root);
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].hostname, "fw-a");
        assert_eq!(members[0].status, SyncStatus::InSync);
    }

    #[test]
    fn membership_annotation_matches_by_hostname() {
        let t = tree(
            "<entry><hostname>fw-a</hostname><serial>001</serial>\
             <ip-address>10.0.0.5</ip-address></entry>",
        );
        let mut devices = vec![Device::from_entry(&t.root).expect("device")];
        let groups = vec![DeviceGroupMember {
            group: "branch".into(),
            hostname: "fw-a".into(),
            status: SyncStatus::InSync,
        }];
        let templates = vec![TemplateMember {
            template: "base".into(),
            hostname: "fw-b".into(),
            status: SyncStatus::InSync,
        }];

        annotate_membership(&mut devices, &groups, &templates);
        assert_eq!(devices[0].device_group.as_deref(), Some("branch"));
        assert_eq!(devices[0].template, None);
    }

    #[test]
    fn template_stacks_use_the_stack_status() {
        let t = tree(
            "<result><templates>\
             <entry name=\"fw-a_stack\"><template-status>out of sync</template-status></entry>\
             <entry name=\"base\"><devices><entry><hostname>fw-b</hostname>\
             <device-template-sync>In Sync</device-template-sync></entry></devices></entry>\
             </templates></result>",
        );
        let members = parse_templates(&t.root);
        assert_eq!(members.len(), 2);
        assert_eq!(members[0].hostname, "fw-a");
        assert_eq!(members[0].status, SyncStatus::OutOfSync);
        assert_eq!(members[1].template, "base");
        assert_eq!(members[1].status, SyncStatus::InSync);
    }
}
