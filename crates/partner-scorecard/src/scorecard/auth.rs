use std::fmt;

/// Decides whether a request may use the scorecard API. Identity lives
/// outside the engine; the router only forwards the bearer credential.
pub trait Authenticator: Send + Sync {
    fn authorize(&self, bearer: Option<&str>) -> bool;

    /// False when every request is let through.
    fn is_enforced(&self) -> bool {
        true
    }
}

/// Compares the bearer token against a configured shared secret. Without a
/// secret every request is allowed.
#[derive(Clone, Default)]
pub struct BearerTokenAuthenticator {
    token: Option<String>,
}

impl BearerTokenAuthenticator {
    pub fn new(token: Option<String>) -> Self {
        Self {
            token: token.filter(|token| !token.is_empty()),
        }
    }
}

impl fmt::Debug for BearerTokenAuthenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BearerTokenAuthenticator")
            .field("enforced", &self.token.is_some())
            .finish()
    }
}

impl Authenticator for BearerTokenAuthenticator {
    fn authorize(&self, bearer: Option<&str>) -> bool {
        match (&self.token, bearer) {
            (None, _) => true,
            (Some(expected), Some(presented)) => {
                constant_time_eq(expected.as_bytes(), presented.as_bytes())
            }
            (Some(_), None) => false,
        }
    }

    fn is_enforced(&self) -> bool {
        self.token.is_some()
    }
}

fn constant_time_eq(left: &[u8], right: &[u8]) -> bool {
    if left.len() != right.len() {
        return false;
    }
    left.iter()
        .zip(right)
        .fold(0u8, |diff, (a, b)| diff | (a ^ b))
        == 0
}
