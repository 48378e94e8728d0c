//! Typed ID wrappers for users, sessions and transcript messages.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Typed ID wrappers keep a session ID from being passed where a message ID
/// is expected. They are plain strings underneath; the backend decides the
/// format.
macro_rules! typed_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Create a new typed ID from anything that converts to String.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Borrow the inner string.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Whether the ID carries no characters at all.
            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }
    };
}

typed_id!(UserId, "Identifier of the account sending turns.");
typed_id!(
    SessionId,
    "Server-assigned identifier correlating turns into one conversation."
);
typed_id!(MessageId, "Identifier of a single transcript message.");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_as_bare_string() {
        let id = SessionId::new("s1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"s1\"");
        let back: SessionId = serde_json::from_str("\"s1\"").unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn empty_detection() {
        assert!(SessionId::new("").is_empty());
        assert!(!MessageId::from("m-1").is_empty());
    }

    #[test]
    fn display_is_inner_string() {
        assert_eq!(UserId::from(String::from("u-42")).to_string(), "u-42");
    }
}
