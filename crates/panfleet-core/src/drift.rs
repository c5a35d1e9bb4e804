// Configuration drift detection.
//
// Recursive structural diff between a template's configuration tree and
// a device's effective configuration tree. Comparison is semantic:
// `ConfigTree` parsing already normalized attribute order and trimmed
// incidental whitespace, so only real differences surface here.
//
// Findings come back in template traversal order, with device-only
// extras appended per level, so identical inputs always produce
// identical output -- callers diff the findings themselves to answer
// "has anything changed since last check".

use panfleet_api::{ConfigTree, Element};
use serde::Serialize;

/// What kind of divergence a finding records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DriftKind {
    /// Present in the template, absent on the device.
    Missing,
    /// Present on the device, absent in the template (local override).
    OverrideAdded,
    /// Present in both with differing attributes or text.
    ValueMismatch,
    /// The device's configuration could not be fetched; drift unknown.
    Unavailable,
}

impl DriftKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Missing => "missing",
            Self::OverrideAdded => "override-added",
            Self::ValueMismatch => "value-mismatch",
            Self::Unavailable => "unavailable",
        }
    }
}

/// One detected divergence at one element path.
///
/// Immutable once emitted; a comparison run builds a fresh list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DriftFinding {
    /// Slash-joined element path, with `tag[name=X]` segments where a
    /// `name` attribute disambiguates repeated siblings.
    pub path: String,
    pub kind: DriftKind,
    pub template_value: Option<String>,
    pub device_value: Option<String>,
}

/// All findings for one device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DriftReport {
    pub serial: String,
    pub findings: Vec<DriftFinding>,
}

impl DriftReport {
    pub fn clean(serial: impl Into<String>) -> Self {
        Self {
            serial: serial.into(),
            findings: Vec::new(),
        }
    }

    pub fn has_drift(&self) -> bool {
        !self.findings.is_empty()
    }

    pub fn is_unavailable(&self) -> bool {
        self.findings
            .iter()
            .any(|f| f.kind == DriftKind::Unavailable)
    }
}

/// Compare a template tree against a device tree.
///
/// Identical subtrees yield nothing, but recursion always descends so
/// nested mismatches are caught. Deterministic: no comparison state
/// survives between runs.
pub fn compare(template: &ConfigTree, device: &ConfigTree) -> Vec<DriftFinding> {
    let mut findings = Vec::new();
    diff_element(&template.root, &device.root, "", &mut findings);
    findings
}

/// The sentinel report content for a device whose configuration could
/// not be fetched. A failed fetch is never compared -- "couldn't check"
/// must stay distinguishable from "no drift".
pub fn unavailable(detail: &str) -> Vec<DriftFinding> {
    vec![DriftFinding {
        path: "/".to_owned(),
        kind: DriftKind::Unavailable,
        template_value: None,
        device_value: Some(detail.to_owned()),
    }]
}

fn diff_element(template: &Element, device: &Element, path: &str, out: &mut Vec<DriftFinding>) {
    if template.attrs != device.attrs || template.text != device.text {
        out.push(DriftFinding {
            path: display_path(path),
            kind: DriftKind::ValueMismatch,
            template_value: Some(value_summary(template)),
            device_value: Some(value_summary(device)),
        });
    }

    let mut matched = vec![false; device.children.len()];

    for t_child in &template.children {
        let child_path = join_path(path, &segment(t_child));
        match claim_match(t_child, device, &mut matched) {
            Some(d_child) => diff_element(t_child, d_child, &child_path, out),
            None => out.push(DriftFinding {
                path: child_path,
                kind: DriftKind::Missing,
                template_value: Some(subtree_summary(t_child)),
                device_value: None,
            }),
        }
    }

    for (idx, d_child) in device.children.iter().enumerate() {
        if !matched[idx] {
            out.push(DriftFinding {
                path: join_path(path, &segment(d_child)),
                kind: DriftKind::OverrideAdded,
                template_value: None,
                device_value: Some(subtree_summary(d_child)),
            });
        }
    }
}

/// Find the device-side counterpart of a template child and mark it
/// consumed. Keyed children match on `(tag, name)`; keyless children
/// pair up in document order within their tag.
fn claim_match<'d>(
    t_child: &Element,
    device: &'d Element,
    matched: &mut [bool],
) -> Option<&'d Element> {
    let key = t_child.name_attr();
    for (idx, d_child) in device.children.iter().enumerate() {
        if matched[idx] || d_child.name != t_child.name {
            continue;
        }
        if d_child.name_attr() == key {
            matched[idx] = true;
            return Some(d_child);
        }
    }
    None
}

fn segment(element: &Element) -> String {
    match element.name_attr() {
        Some(name) => format!("{}[name={name}]", element.name),
        None => element.name.clone(),
    }
}

fn join_path(parent: &str, segment: &str) -> String {
    if parent.is_empty() {
        segment.to_owned()
    } else {
        format!("{parent}/{segment}")
    }
}

fn display_path(path: &str) -> String {
    if path.is_empty() {
        "/".to_owned()
    } else {
        path.to_owned()
    }
}

fn value_summary(element: &Element) -> String {
    let mut parts: Vec<String> = element
        .attrs
        .iter()
        .map(|(k, v)| format!("{k}='{v}'"))
        .collect();
    if !element.text.is_empty() {
        parts.push(format!("text='{}'", element.text));
    }
    if parts.is_empty() {
        "(empty)".to_owned()
    } else {
        parts.join(" ")
    }
}

fn subtree_summary(element: &Element) -> String {
    let mut summary = format!("<{}", element.name);
    if let Some(name) = element.name_attr() {
        summary.push_str(&format!(" name='{name}'"));
    }
    summary.push('>');
    if !element.children.is_empty() {
        summary.push_str(&format!(" ({} children)", element.children.len()));
    }
    summary
}

// ── Local-override scan ─────────────────────────────────────────────

/// The device-local `network` subtree, wherever the response nested it.
pub fn network_subtree(tree: &ConfigTree) -> Option<ConfigTree> {
    if tree.root.name == "network" {
        return Some(tree.clone());
    }
    tree.root
        .descendant("network")
        .cloned()
        .map(ConfigTree::from_element)
}

/// Whether the tree carries real configuration -- any descendant with
/// attributes or text.
pub fn has_meaningful(tree: &ConfigTree) -> bool {
    tree.root
        .descendants()
        .any(|e| !e.attrs.is_empty() || !e.text.is_empty())
}

/// Brief descriptions of up to `limit` meaningful nodes, for override
/// summaries.
pub fn scan_meaningful(tree: &ConfigTree, limit: usize) -> Vec<String> {
    let mut hits = Vec::new();
    for element in tree.root.descendants() {
        if element.attrs.is_empty() && element.text.is_empty() {
            continue;
        }
        let mut brief = format!("<{}", element.name);
        if let Some(name) = element.name_attr() {
            brief.push_str(&format!(" name='{name}'"));
        }
        brief.push('>');
        if !element.text.is_empty() {
            let mut text: String = element.text.chars().take(60).collect();
            if text.len() < element.text.len() {
                text.push_str("...");
            }
            brief.push_str(&format!(" text='{text}'"));
        }
        hits.push(brief);
        if hits.len() >= limit {
            break;
        }
    }
    hits
}
