//! Ordered header mapping as seen by the interceptor.
//!
//! Hosts hand headers over in whatever form they keep them. The interceptor
//! only needs three things from them: insertion order, case-insensitive
//! lookup, and a value that may be single, repeated, or missing.

use std::fmt;

// ── HeaderValue ───────────────────────────────────────────────────────────────

/// A header value: one string, a repeated header, or a name with no value.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum HeaderValue {
    Single(String),
    Multi(Vec<String>),
    Absent,
}

impl From<&str> for HeaderValue {
    fn from(v: &str) -> Self { Self::Single(v.to_owned()) }
}

impl From<String> for HeaderValue {
    fn from(v: String) -> Self { Self::Single(v) }
}

impl From<Vec<String>> for HeaderValue {
    fn from(v: Vec<String>) -> Self { Self::Multi(v) }
}

impl<T: Into<HeaderValue>> From<Option<T>> for HeaderValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Absent, Into::into)
    }
}

/// Repeated values are joined with `", "`, the way they would be folded on
/// the wire. `Absent` renders as an empty string.
impl fmt::Display for HeaderValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single(v) => f.write_str(v),
            Self::Multi(vs) => f.write_str(&vs.join(", ")),
            Self::Absent    => Ok(()),
        }
    }
}

// ── Headers ───────────────────────────────────────────────────────────────────

/// Header entries in insertion order.
///
/// Names keep the casing the host supplied. Duplicate names are not merged:
/// a host that wants a repeated header expressed as one entry should pass a
/// [`HeaderValue::Multi`].
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Headers(Vec<(String, HeaderValue)>);

impl Headers {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Appends an entry. Returns `self` for chaining.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<HeaderValue>) -> Self {
        self.push(name, value);
        self
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl Into<HeaderValue>) {
        self.0.push((name.into(), value.into()));
    }

    /// Case-insensitive lookup of the first entry named `name`.
    pub fn get(&self, name: &str) -> Option<&HeaderValue> {
        self.0.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &HeaderValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize { self.0.len() }
    pub fn is_empty(&self) -> bool { self.0.is_empty() }
}

impl<K, V> FromIterator<(K, V)> for Headers
where
    K: Into<String>,
    V: Into<HeaderValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl IntoIterator for Headers {
    type Item = (String, HeaderValue);
    type IntoIter = std::vec::IntoIter<(String, HeaderValue)>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Folds an [`http::HeaderMap`] into ordered entries, one per distinct name.
///
/// Non-UTF-8 values are decoded lossily; the result is only ever logged.
impl From<&http::HeaderMap> for Headers {
    fn from(map: &http::HeaderMap) -> Self {
        map.keys()
            .map(|name| {
                let mut values: Vec<String> = map.get_all(name)
                    .iter()
                    .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
                    .collect();
                let value = match values.len() {
                    0 => HeaderValue::Absent,
                    1 => HeaderValue::Single(values.remove(0)),
                    _ => HeaderValue::Multi(values),
                };
                (name.as_str().to_owned(), value)
            })
            .collect()
    }
}

/// Renders as `[name: value, name: value]`.
impl fmt::Display for Headers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, (name, value)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name}: {value}")?;
        }
        f.write_str("]")
    }
}
