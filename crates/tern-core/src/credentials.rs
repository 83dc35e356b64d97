//! Password sign-in material for the createSession bootstrap.

use std::fmt;

use serde::Serialize;

/// A handle or DID plus an account or app password.
///
/// Serializes as the `com.atproto.server.createSession` request body. The
/// identifier is trimmed and loses a leading `@`, so `@alice.test` and
/// `alice.test` sign in the same account.
///
/// ```
/// use tern_core::Credentials;
///
/// let creds = Credentials::new(" @alice.test ", "abcd-efgh-ijkl-mnop");
/// assert_eq!(creds.identifier(), "alice.test");
/// assert!(format!("{creds:?}").contains("[REDACTED]"));
/// ```
#[derive(Clone, Serialize)]
pub struct Credentials {
    identifier: String,
    password: Password,
}

/// The password half of [`Credentials`]. Serializes as the bare string.
#[derive(Clone, Serialize)]
#[serde(transparent)]
struct Password(String);

impl Credentials {
    pub fn new(identifier: impl AsRef<str>, password: impl Into<String>) -> Self {
        let identifier = identifier.as_ref().trim();
        Self {
            identifier: identifier
                .strip_prefix('@')
                .unwrap_or(identifier)
                .to_string(),
            password: Password(password.into()),
        }
    }

    /// The handle or DID to resolve and sign in as.
    pub fn identifier(&self) -> &str {
        &self.identifier
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("identifier", &self.identifier)
            .field("password", &"[REDACTED]")
            .finish()
    }
}
