use serde::{ser::SerializeStruct, Deserialize, Serialize, Serializer};
use std::fmt;

/// Portal login owned by one user identifier.
///
/// The password is write-only: it is accepted on deserialization and handed
/// to the session driver, but the `Serialize` and `Debug` impls never emit
/// it. Every externally visible rendering of a credential goes through those
/// impls, so the redaction invariant holds by construction. The credential
/// store keeps its own private full record for the write path.
#[derive(Clone, Deserialize)]
pub struct UserCredentials {
    pub email: String,
    pub password: String,
}

impl UserCredentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    /// Basic institutional credential validation: the email must carry the
    /// expected domain suffix and the password must have some length to it.
    pub fn is_valid_format(&self, email_domain: &str) -> bool {
        self.email.contains(email_domain) && self.password.len() >= 8
    }
}

impl Serialize for UserCredentials {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("UserCredentials", 1)?;
        state.serialize_field("email", &self.email)?;
        state.end()
    }
}

impl fmt::Debug for UserCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserCredentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}
