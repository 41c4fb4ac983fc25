//! Header fields and the header-group lookup table.

use std::collections::HashMap;
use std::fmt;

/// Ordering category of a header.
///
/// Groups only decide output order; declaration order is the emitted order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HeaderGroup {
    Request,
    Response,
    Representation,
    Payload,
}

impl HeaderGroup {
    fn from_name(name: &str) -> Option<Self> {
        match name.trim() {
            "Request" => Some(HeaderGroup::Request),
            "Response" => Some(HeaderGroup::Response),
            "Representation" => Some(HeaderGroup::Representation),
            "Payload" => Some(HeaderGroup::Payload),
            _ => None,
        }
    }
}

/// A single header line: `Name: value`, tagged with its group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub group: HeaderGroup,
    pub name: String,
    pub value: String,
}

impl Header {
    pub fn new(group: HeaderGroup, name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            group,
            name: name.into(),
            value: value.into(),
        }
    }

    /// Case-insensitive header name comparison.
    pub fn is(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
}

impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.value)
    }
}

/// Read-only header name → group table consulted by the parser.
///
/// Names are matched case-insensitively. Unknown names resolve to
/// [`HeaderGroup::Request`].
#[derive(Debug, Clone, Default)]
pub struct HeaderGroups {
    groups: HashMap<String, HeaderGroup>,
}

impl HeaderGroups {
    /// An empty table: every header resolves to `Request`.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The standard representation and payload headers.
    pub fn standard() -> Self {
        Self::empty()
            .with(
                HeaderGroup::Representation,
                [
                    "Content-Type",
                    "Content-Encoding",
                    "Content-Language",
                    "Content-Location",
                ],
            )
            .with(
                HeaderGroup::Payload,
                [
                    "Content-Length",
                    "Content-Range",
                    "Trailer",
                    "Transfer-Encoding",
                ],
            )
    }

    /// Add names to a group, replacing any earlier assignment.
    pub fn with<'a, I>(mut self, group: HeaderGroup, names: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        for name in names {
            self.groups.insert(name.to_ascii_lowercase(), group);
        }
        self
    }

    /// Load a table from `Group: Name, Name` lines.
    ///
    /// Lines naming an unknown group are ignored, as are blank lines.
    pub fn from_lines(text: &str) -> Self {
        let mut table = Self::empty();
        for line in text.lines() {
            let Some((group, names)) = line.split_once(':') else {
                continue;
            };
            let Some(group) = HeaderGroup::from_name(group) else {
                continue;
            };
            table = table.with(
                group,
                names.split(',').map(str::trim).filter(|n| !n.is_empty()),
            );
        }
        table
    }

    /// Resolve the group for a header name.
    pub fn group_of(&self, name: &str) -> HeaderGroup {
        self.groups
            .get(&name.to_ascii_lowercase())
            .copied()
            .unwrap_or(HeaderGroup::Request)
    }
}
