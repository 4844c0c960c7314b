use std::fmt::{Debug, Formatter};

/// Opaque bearer credential handed to the engines by the host application.
///
/// The engines never read tokens from storage themselves; they only forward
/// what the host passes in.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    /// Wraps a raw token value. Surrounding whitespace is dropped.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into().trim().to_owned())
    }

    /// Returns whether no token was supplied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the `Authorization` header value for this token.
    #[must_use]
    pub fn bearer_header(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl Debug for AccessToken {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            formatter.write_str("AccessToken(<empty>)")
        } else {
            formatter.write_str("AccessToken(<redacted>)")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::AccessToken;

    #[test]
    fn bearer_header_keeps_empty_token() {
        assert_eq!(AccessToken::default().bearer_header(), "Bearer ");
    }

    #[test]
    fn debug_output_never_contains_token() {
        let token = AccessToken::new(" secret-value ");
        assert!(!format!("{token:?}").contains("secret"));
        assert_eq!(token.bearer_header(), "Bearer secret-value");
    }
}
