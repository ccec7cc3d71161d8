/// Attribute name carrying a jar's build version in `META-INF/MANIFEST.MF`.
pub const IMPLEMENTATION_VERSION: &str = "Implementation-Version";

/// A single `Key: Value` line of a jar manifest.
#[derive(Debug, Clone, PartialEq)]
pub struct ManifestAttribute {
    /// The attribute name, trimmed.
    pub key: String,
    /// The attribute value, trimmed.
    pub value: String,
}

/// Parses a single manifest line into a `ManifestAttribute`.
///
/// # Arguments
///
/// * `line` - A single line from the manifest.
///
/// # Returns
///
/// * `Some(ManifestAttribute)` if the line holds a `Key: Value` pair.
/// * `None` for lines without a `:` separator, lines with an empty key, and
///   continuation lines (those starting with a space).
pub fn parse_line(line: &str) -> Option<ManifestAttribute> {
    if line.starts_with(' ') {
        return None;
    }
    let (key, value) = line.split_once(':')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    Some(ManifestAttribute {
        key: key.to_string(),
        value: value.trim().to_string(),
    })
}

/// Parses the full manifest text into its attributes, in file order.
///
/// Handles both `\n` and `\r\n` line endings; blank lines separate manifest
/// sections and are skipped.
pub fn parse_manifest(content: &str) -> Vec<ManifestAttribute> {
    content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(parse_line)
        .collect()
}

/// Returns the jar's `Implementation-Version`, lowercased.
///
/// When the attribute appears more than once the last occurrence wins. A value
/// containing further colons is cut at the first of them.
///
/// # Arguments
///
/// * `content` - The text of `META-INF/MANIFEST.MF`.
///
/// # Returns
///
/// * `Option<String>` - The version, or `None` if the attribute is absent.
pub fn implementation_version(content: &str) -> Option<String> {
    parse_manifest(content)
        .into_iter()
        .filter(|attr| attr.key == IMPLEMENTATION_VERSION)
        .last()
        .map(|attr| {
            attr.value
                .split(':')
                .next()
                .unwrap_or_default()
                .trim()
                .to_lowercase()
        })
}
