//! Tool version parsing and comparison

/// Name and version reported by a tool's version probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolVersion {
    /// Product name, e.g. "CVS" or "CVSNT"
    pub name: String,
    /// Dotted version, e.g. "1.12.13"
    pub version: String,
}

impl ToolVersion {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }

    /// True if this is `name` at `minimum` or later
    pub fn is_at_least(&self, name: &str, minimum: &str) -> bool {
        self.name == name && is_version_at_least(&self.version, minimum)
    }
}

/// Parse "major.minor[.patch]" into a tuple
///
/// Handles suffixes like "1.12.13-p1" or "1.11.1p1" by keeping the leading
/// digits of the patch component. A missing patch is 0.
pub fn parse_version_triple(version: &str) -> Option<(u32, u32, u32)> {
    let parts: Vec<&str> = version.trim().split('.').collect();
    if parts.len() < 2 {
        return None;
    }
    let major = parts[0].parse().ok()?;
    let minor = leading_digits(parts[1])?;
    let patch = match parts.get(2) {
        Some(p) => leading_digits(p).unwrap_or(0),
        None => 0,
    };
    Some((major, minor, patch))
}

fn leading_digits(component: &str) -> Option<u32> {
    let end = component
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(component.len());
    component[..end].parse().ok()
}

/// Compare versions numerically per component
///
/// Unparsable versions are never "at least" anything, so callers fall back
/// to their conservative path.
pub fn is_version_at_least(version: &str, minimum: &str) -> bool {
    match (parse_version_triple(version), parse_version_triple(minimum)) {
        (Some(v), Some(min)) => v >= min,
        _ => false,
    }
}
