//! JSON-RPC request identifiers: integer or string, ordered with integers
//! sorting before strings.

use std::cmp::Ordering;
use std::fmt;

/// A request identifier as carried on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RequestId {
    /// A 64-bit integer id.
    Integer(i64),
    /// A string id.
    String(String),
}

impl RequestId {
    /// Parses a JSON-RPC id value.
    #[must_use]
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        if let Some(n) = value.as_i64() {
            return Some(RequestId::Integer(n));
        }
        value.as_str().map(|s| RequestId::String(s.to_string()))
    }

    /// Serializes back to a JSON-RPC id value.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            RequestId::Integer(n) => serde_json::Value::from(*n),
            RequestId::String(s) => serde_json::Value::from(s.clone()),
        }
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestId::Integer(n) => write!(f, "{n}"),
            RequestId::String(s) => write!(f, "{s}"),
        }
    }
}

impl PartialOrd for RequestId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RequestId {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (RequestId::Integer(a), RequestId::Integer(b)) => a.cmp(b),
            (RequestId::String(a), RequestId::String(b)) => a.cmp(b),
            (RequestId::Integer(_), RequestId::String(_)) => Ordering::Less,
            (RequestId::String(_), RequestId::Integer(_)) => Ordering::Greater,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_sort_before_strings() {
        let mut ids = vec![
            RequestId::String("a".into()),
            RequestId::Integer(5),
            RequestId::Integer(1),
        ];
        ids.sort();
        assert_eq!(
            ids,
            vec![
                RequestId::Integer(1),
                RequestId::Integer(5),
                RequestId::String("a".into()),
            ]
        );
    }

    #[test]
    fn json_round_trip_is_identity() {
        for id in [RequestId::Integer(42), RequestId::String("req-1".into())] {
            let json = id.to_json();
            assert_eq!(RequestId::from_json(&json), Some(id));
        }
    }
}
