//! Certificate serial number type.

use std::fmt;

/// A client certificate serial number as supplied by configuration.
///
/// The raw value is kept verbatim for display and diagnostics;
/// [`Self::normalized`] produces the uppercase-hex form every store lookup
/// matches on, since configured serials are commonly rendered with
/// separators such as `00:ab:cd:ef`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SerialNumber(String);

impl SerialNumber {
    /// Wrap a raw serial number string.
    pub fn new(serial: impl Into<String>) -> Self {
        Self(serial.into())
    }

    /// Returns the serial number exactly as configured.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the serial with every non-hex character stripped and the rest
    /// uppercased.
    pub fn normalized(&self) -> String {
        self.0
            .chars()
            .filter(|c| c.is_ascii_hexdigit())
            .map(|c| c.to_ascii_uppercase())
            .collect()
    }

    /// True if the serial is empty after trimming whitespace.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for SerialNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SerialNumber {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}
