//! Call-scoped token context.

use tonic::Request;

/// Immutable association between one inbound call and at most one bearer
/// token.
///
/// Created per call by the auth layer and destroyed with the call; it is
/// cloned into nested outbound work rather than shared, so it can never leak
/// across concurrent calls.
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    token: Option<String>,
}

impl CallContext {
    /// Context for an exempt call that presented no credential.
    pub fn anonymous() -> Self {
        Self { token: None }
    }

    /// Context carrying a validated bearer token.
    pub fn authenticated(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
        }
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// True when a non-blank token is bound to this call.
    pub fn has_token(&self) -> bool {
        self.token
            .as_deref()
            .map(|token| !token.trim().is_empty())
            .unwrap_or(false)
    }
}

/// Extension trait for reading the call context out of a request.
///
/// Falls back to an anonymous context when the auth layer let the call
/// through without a credential (unsecured methods).
pub trait CallContextExt {
    fn call_context(&self) -> CallContext;
}

impl<T> CallContextExt for Request<T> {
    fn call_context(&self) -> CallContext {
        self.extensions()
            .get::<CallContext>()
            .cloned()
            .unwrap_or_else(CallContext::anonymous)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anonymous_context_has_no_token() {
        let ctx = CallContext::anonymous();
        assert!(ctx.token().is_none());
        assert!(!ctx.has_token());
    }

    #[test]
    fn blank_token_does_not_count_as_authenticated() {
        let ctx = CallContext::authenticated("   ");
        assert!(!ctx.has_token());
    }

    #[test]
    fn request_without_extension_yields_anonymous() {
        let request = Request::new(());
        assert!(!request.call_context().has_token());
    }

    #[test]
    fn request_extension_round_trip() {
        let mut request = Request::new(());
        request
            .extensions_mut()
            .insert(CallContext::authenticated("abc123"));
        assert_eq!(request.call_context().token(), Some("abc123"));
    }
}
