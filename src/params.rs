use std::collections::BTreeMap;

use percent_encoding::percent_decode_str;

use crate::pattern::Captures;

#[derive(thiserror::Error, Debug)]
pub enum ParamDecodeError {
    #[error("parameter '{name}' has a malformed percent escape at byte {position}")]
    MalformedEscape { name: String, position: usize },

    #[error("parameter '{name}' is not valid utf-8 after percent-decoding")]
    InvalidUtf8 {
        name: String,
        #[source]
        source: std::str::Utf8Error,
    },
}

impl ParamDecodeError {
    pub fn name(&self) -> &str {
        match self {
            Self::MalformedEscape { name, .. } | Self::InvalidUtf8 { name, .. } => name,
        }
    }
}

// Byte offset of the first '%' not followed by two hex digits.
fn find_malformed_escape(raw: &str) -> Option<usize> {
    let bytes = raw.as_bytes();

    bytes
        .iter()
        .enumerate()
        .filter(|&(_, &b)| b == b'%')
        .map(|(position, _)| position)
        .find(|&position| {
            !matches!(
                bytes.get(position + 1..position + 3),
                Some([high, low]) if high.is_ascii_hexdigit() && low.is_ascii_hexdigit()
            )
        })
}

fn decode_value(name: &str, raw: &str) -> Result<String, ParamDecodeError> {
    if let Some(position) = find_malformed_escape(raw) {
        return Err(ParamDecodeError::MalformedEscape {
            name: name.to_owned(),
            position,
        });
    }

    percent_decode_str(raw)
        .decode_utf8()
        .map(|decoded| decoded.into_owned())
        .map_err(|source| ParamDecodeError::InvalidUtf8 {
            name: name.to_owned(),
            source,
        })
}

/// Decoded named parameters of a matched route.
///
/// A name maps to `None` when the pattern engine reported the group
/// without a capture (for example an unmatched optional parameter)
/// or captured an empty string.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RouteParams {
    values: BTreeMap<String, Option<String>>,
}

impl RouteParams {
    /// Percent-decodes every present, non-empty capture.
    /// Absent and empty captures become `None` without going through the decoder.
    pub fn decode(captures: &Captures) -> Result<Self, ParamDecodeError> {
        let mut values = BTreeMap::new();

        for (name, raw_value) in captures {
            let value = match raw_value.as_deref() {
                Some(raw) if !raw.is_empty() => Some(decode_value(name, raw)?),
                _ => None,
            };

            values.insert(name.clone(), value);
        }

        Ok(Self { values })
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).and_then(|value| value.as_deref())
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// True when the name is known to the pattern but nothing was captured for it.
    pub fn is_absent(&self, name: &str) -> bool {
        matches!(self.values.get(name), Some(None))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.values
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_deref()))
    }
}
