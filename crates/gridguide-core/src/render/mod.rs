//! Document rendering.
//!
//! Both document kinds are written line by line into a `String` and then
//! encoded to bytes by [`encode_output`]. Timestamps are converted one by
//! one in the target timezone, so offsets stay correct across daylight
//! saving changes inside a run.

mod channel_id;
mod escape;
mod include;
mod xmltv;
mod xtvd;

use std::fmt::{self, Write as _};

use chrono::{DateTime, TimeZone, Utc};

use crate::assemble::AssembledGuide;
use crate::error::GuideError;
use crate::model::GuideStore;
use crate::options::{DocumentFormat, GuideOptions};

pub use channel_id::ChannelIdMode;
pub use escape::{EscapeSet, TextEncoder};
pub use include::splice_section;
pub use xmltv::render_xmltv;
pub use xtvd::render_xtvd;

/// Everything a renderer reads.
#[derive(Debug)]
pub struct RenderInput<'a, Tz: TimeZone> {
    /// Stations and programs.
    pub store: &'a GuideStore,
    /// Resolved timelines.
    pub guide: &'a AssembledGuide,
    /// Run options.
    pub options: &'a GuideOptions,
    /// Timezone for local timestamps.
    pub tz: &'a Tz,
    /// Requested time window.
    pub window: (DateTime<Utc>, DateTime<Utc>),
    /// Contents of an external XMLTV file to splice in.
    pub include: Option<&'a str>,
}

/// Renders the document kind selected in the options.
///
/// # Errors
///
/// Returns [`GuideError::Render`] if formatting fails.
pub fn render_document<Tz>(input: &RenderInput<'_, Tz>) -> Result<String, GuideError>
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    match input.options.format {
        DocumentFormat::Xmltv => render_xmltv(input),
        DocumentFormat::Xtvd => render_xtvd(input),
    }
}

/// Encoding name written in the XML declaration.
#[must_use]
pub const fn encoding_name(utf8: bool) -> &'static str {
    if utf8 { "utf-8" } else { "iso-8859-1" }
}

/// Encodes the document as UTF-8 or ISO-8859-1.
///
/// In ISO-8859-1 mode characters above U+00FF become numeric entities.
#[must_use]
pub fn encode_output(document: &str, utf8: bool) -> Vec<u8> {
    if utf8 {
        return document.as_bytes().to_vec();
    }
    let mut out = Vec::with_capacity(document.len());
    let mut entity = String::new();
    for c in document.chars() {
        if let Ok(byte) = u8::try_from(u32::from(c)) {
            out.push(byte);
        } else {
            entity.clear();
            let _ = write!(entity, "&#{};", u32::from(c));
            out.extend_from_slice(entity.as_bytes());
        }
    }
    out
}

/// Uppercases the first character and lowercases the rest.
pub(crate) fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect()
    })
}

/// Timestamp in `tz`, or `None` if out of range.
pub(crate) fn local_time<Tz: TimeZone>(tz: &Tz, ms: i64) -> Option<DateTime<Tz>> {
    tz.timestamp_millis_opt(ms).single()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latin1_output() {
        // Arrange
        let doc = "Café – ok";

        // Act
        let bytes = encode_output(doc, false);

        // Assert
        assert_eq!(bytes, b"Caf\xe9 &#8211; ok".to_vec());
    }

    #[test]
    fn test_utf8_output_is_verbatim() {
        // Arrange & Act & Assert
        assert_eq!(encode_output("Café", true), "Café".as_bytes().to_vec());
    }

    #[test]
    fn test_capitalize() {
        // Arrange & Act & Assert
        assert_eq!(capitalize("sci-fi"), "Sci-fi");
        assert_eq!(capitalize("NEWS"), "News");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn test_encoding_name() {
        // Arrange & Act & Assert
        assert_eq!(encoding_name(true), "utf-8");
        assert_eq!(encoding_name(false), "iso-8859-1");
    }
}
