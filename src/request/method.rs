//! Request verb resolution
//!
//! Resolves the effective verb from a declared value, the transport verb and
//! the POST tunneling override header, and models the set of verbs a
//! controller supports.

use std::fmt;
use std::str::FromStr;

use crate::error::MethodError;

/// The four verbs a controller can implement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Delete,
    Post,
    Get,
    Put,
}

impl Method {
    /// All verbs, in the order used for `Allow` headers
    pub const ALL: [Self; 4] = [Self::Delete, Self::Post, Self::Get, Self::Put];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Delete => "DELETE",
            Self::Post => "POST",
            Self::Get => "GET",
            Self::Put => "PUT",
        }
    }

    /// Whether requests with this verb carry a body worth extracting
    pub const fn has_body(self) -> bool {
        matches!(self, Self::Post | Self::Put)
    }

    const fn bit(self) -> u8 {
        match self {
            Self::Delete => 0b0001,
            Self::Post => 0b0010,
            Self::Get => 0b0100,
            Self::Put => 0b1000,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = MethodError;

    /// Case-sensitive; `get` is not `GET`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" => Err(MethodError::Missing),
            "GET" => Ok(Self::Get),
            "PUT" => Ok(Self::Put),
            "DELETE" => Ok(Self::Delete),
            "POST" => Ok(Self::Post),
            other => Err(MethodError::Unsupported(other.to_string())),
        }
    }
}

/// Resolve the verb the client meant
///
/// A declared method (direct invocation, tests) replaces the transport verb.
/// If the resulting verb is `POST` and the override header is non-empty, the
/// override value is used instead, so clients can tunnel PUT/DELETE through
/// POST.
pub fn extract_method(
    declared: Option<&str>,
    transport: Option<&str>,
    override_header: Option<&str>,
) -> Result<Method, MethodError> {
    let passed = declared
        .filter(|m| !m.is_empty())
        .or(transport)
        .unwrap_or_default();

    let extracted = match override_header {
        Some(tunneled) if passed == "POST" && !tunneled.is_empty() => tunneled,
        _ => passed,
    };

    extracted.parse()
}

/// Set of verbs a controller supports
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct MethodSet(u8);

impl MethodSet {
    pub const EMPTY: Self = Self(0);

    pub const fn of(methods: &[Method]) -> Self {
        let mut bits = 0;
        let mut i = 0;
        while i < methods.len() {
            bits |= methods[i].bit();
            i += 1;
        }
        Self(bits)
    }

    #[must_use]
    pub const fn with(self, method: Method) -> Self {
        Self(self.0 | method.bit())
    }

    pub const fn contains(self, method: Method) -> bool {
        self.0 & method.bit() != 0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Members in DELETE, POST, GET, PUT order
    pub fn iter(self) -> impl Iterator<Item = Method> {
        Method::ALL.into_iter().filter(move |m| self.contains(*m))
    }

    /// Value for an `Allow` header, e.g. `POST, GET`
    pub fn allow_header(self) -> String {
        self.iter().map(Method::as_str).collect::<Vec<_>>().join(", ")
    }
}

impl FromIterator<Method> for MethodSet {
    fn from_iter<I: IntoIterator<Item = Method>>(iter: I) -> Self {
        iter.into_iter().fold(Self::EMPTY, Self::with)
    }
}
