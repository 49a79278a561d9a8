//! Text escaping for element content and attributes.

use std::fmt::Write as _;
use std::str::FromStr;

use crate::error::GuideError;
use crate::options::GuideOptions;

/// Characters replaced by named entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct EscapeSet {
    /// `&` as `&amp;`.
    pub amp: bool,
    /// `"` as `&quot;`.
    pub quot: bool,
    /// `'` as `&apos;`.
    pub apos: bool,
    /// `<` as `&lt;`.
    pub lt: bool,
    /// `>` as `&gt;`.
    pub gt: bool,
}

impl Default for EscapeSet {
    fn default() -> Self {
        Self {
            amp: true,
            quot: true,
            apos: true,
            lt: true,
            gt: true,
        }
    }
}

impl FromStr for EscapeSet {
    type Err = GuideError;

    /// Parses a list such as `"amp,lt gt"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut set = Self {
            amp: false,
            quot: false,
            apos: false,
            lt: false,
            gt: false,
        };
        for name in s.split([',', ' ']).filter(|n| !n.is_empty()) {
            match name {
                "amp" => set.amp = true,
                "quot" => set.quot = true,
                "apos" => set.apos = true,
                "lt" => set.lt = true,
                "gt" => set.gt = true,
                other => {
                    return Err(GuideError::Configuration(format!(
                        "unknown entity name: {other}"
                    )));
                }
            }
        }
        Ok(set)
    }
}

/// Escapes text for the output document.
#[derive(Debug, Clone, Copy)]
pub struct TextEncoder {
    escape: EscapeSet,
    encode_non_ascii: bool,
}

impl TextEncoder {
    /// Creates an encoder.
    #[must_use]
    pub const fn new(escape: EscapeSet, encode_non_ascii: bool) -> Self {
        Self {
            escape,
            encode_non_ascii,
        }
    }

    /// Encoder configured from run options.
    #[must_use]
    pub const fn from_options(options: &GuideOptions) -> Self {
        Self::new(options.escape, options.encode_non_ascii)
    }

    /// Trims `text` and escapes it in one pass.
    #[must_use]
    pub fn encode(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        for c in text.trim().chars() {
            match c {
                '&' if self.escape.amp => out.push_str("&amp;"),
                '"' if self.escape.quot => out.push_str("&quot;"),
                '\'' if self.escape.apos => out.push_str("&apos;"),
                '<' if self.escape.lt => out.push_str("&lt;"),
                '>' if self.escape.gt => out.push_str("&gt;"),
                c if self.encode_non_ascii && !c.is_ascii() => {
                    let _ = write!(out, "&#{};", u32::from(c));
                }
                c => out.push(c),
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_default_escapes_everything_once() {
        // Arrange
        let encoder = TextEncoder::new(EscapeSet::default(), false);

        // Act
        let out = encoder.encode("  Tom & Jerry's <\"Show\">  ");

        // Assert
        assert_eq!(out, "Tom &amp; Jerry&apos;s &lt;&quot;Show&quot;&gt;");
    }

    #[test]
    fn test_selective_escaping() {
        // Arrange
        let set: EscapeSet = "amp, lt".parse().unwrap();
        let encoder = TextEncoder::new(set, false);

        // Act
        let out = encoder.encode("A & B's <c>");

        // Assert
        assert_eq!(out, "A &amp; B's &lt;c>");
    }

    #[test]
    fn test_non_ascii_as_numeric_entities() {
        // Arrange
        let encoder = TextEncoder::new(EscapeSet::default(), true);

        // Act
        let out = encoder.encode("Café ☕");

        // Assert
        assert_eq!(out, "Caf&#233; &#9749;");
    }

    #[test]
    fn test_unknown_entity_name_is_rejected() {
        // Arrange & Act
        let result = "amp,nbsp".parse::<EscapeSet>();

        // Assert
        assert!(matches!(result, Err(GuideError::Configuration(_))));
    }
}
