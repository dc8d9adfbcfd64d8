use std::{error::Error, fmt, sync::Arc};

use crate::{AccessTokenRef, IdentityLookup, Principal};

/// The reason a request was turned away by the [`AuthGate`]
///
/// There is deliberately only one outcome: a missing header, a malformed
/// header, an expired token and an unreachable identity service all look the
/// same to the caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// The request could not be authenticated
    #[error("unauthorized")]
    Unauthorized,
}

/// Authenticates bearer tokens against an [`IdentityLookup`]
///
/// The gate holds no state of its own besides the lookup it was built with.
/// Every call performs a fresh lookup; nothing is retried or cached.
/// Cloning is cheap and clones share the same lookup.
pub struct AuthGate<L> {
    lookup: Arc<L>,
}

impl<L> Clone for AuthGate<L> {
    #[inline]
    fn clone(&self) -> Self {
        Self {
            lookup: Arc::clone(&self.lookup),
        }
    }
}

impl<L> fmt::Debug for AuthGate<L>
where
    L: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("AuthGate")
            .field("lookup", &self.lookup)
            .finish()
    }
}

impl<L> AuthGate<L> {
    /// Constructs a gate around the given lookup
    #[inline]
    pub fn new(lookup: L) -> Self {
        Self {
            lookup: Arc::new(lookup),
        }
    }

    /// Constructs a gate around a lookup that is already shared elsewhere
    #[inline]
    pub fn from_shared(lookup: Arc<L>) -> Self {
        Self { lookup }
    }

    /// The lookup this gate delegates to
    #[inline]
    pub fn lookup(&self) -> &L {
        &self.lookup
    }
}

impl<L> AuthGate<L>
where
    L: IdentityLookup,
{
    /// Authenticates the raw value of an `Authorization` header
    ///
    /// The value must use the `Bearer` scheme. On success the identity
    /// reported by the lookup is projected into a [`Principal`].
    pub async fn authenticate(&self, authorization: &str) -> Result<Principal, AuthError> {
        let token = extract_bearer(authorization).ok_or_else(|| {
            tracing::debug!("authentication failed: authorization header is malformed");
            AuthError::Unauthorized
        })?;

        self.authenticate_token(token).await
    }

    /// Authenticates a token that has already been taken out of its header
    pub async fn authenticate_token(&self, token: &AccessTokenRef) -> Result<Principal, AuthError> {
        tracing::trace!("looking up token holder");

        match self.lookup.lookup(token).await {
            Ok(user) => {
                tracing::trace!("token was accepted");
                Ok(Principal::from_identity(user))
            }
            Err(error) => {
                tracing::warn!(
                    error = %describe(&error),
                    "authentication failed: token validation error"
                );
                Err(AuthError::Unauthorized)
            }
        }
    }
}

/// Pulls the token out of a `Bearer <token>` header value
///
/// The scheme is matched without regard to case and surrounding whitespace is
/// dropped from the token. Returns `None` for any other scheme or for an
/// empty token.
pub fn extract_bearer(authorization: &str) -> Option<&AccessTokenRef> {
    let scheme = authorization.get(..7)?;
    if !scheme.eq_ignore_ascii_case("bearer ") {
        return None;
    }

    let token = authorization[7..].trim();
    if token.is_empty() {
        return None;
    }

    Some(AccessTokenRef::from_str(token))
}

fn describe(error: &(dyn Error + 'static)) -> String {
    use std::fmt::Write;

    let mut description = error.to_string();
    let mut err = error;
    while let Some(next) = err.source() {
        let _ = write!(&mut description, ": {next}");
        err = next;
    }
    description
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use tracing_test::traced_test;

    use super::*;
    use crate::IdentityUser;

    #[derive(Debug, Clone, thiserror::Error)]
    enum FakeError {
        #[error("connection refused")]
        Network,
        #[error("token expired")]
        Expired,
        #[error("malformed token")]
        Malformed,
    }

    #[derive(Debug, Default)]
    struct FakeLookup {
        answers: HashMap<String, Result<IdentityUser, FakeError>>,
    }

    impl FakeLookup {
        fn with(mut self, token: &str, answer: Result<IdentityUser, FakeError>) -> Self {
            self.answers.insert(token.to_owned(), answer);
            self
        }
    }

    #[async_trait::async_trait]
    impl IdentityLookup for FakeLookup {
        type Error = FakeError;

        async fn lookup(&self, token: &AccessTokenRef) -> Result<IdentityUser, Self::Error> {
            self.answers
                .get(token.as_str())
                .cloned()
                .unwrap_or(Err(FakeError::Malformed))
        }
    }

    fn ada() -> IdentityUser {
        IdentityUser {
            id: Some("u1".into()),
            name: Some("Ada".into()),
            email: Some("ada@x.com".into()),
            roles: Some(vec!["admin".into()]),
        }
    }

    fn gate() -> AuthGate<FakeLookup> {
        AuthGate::new(
            FakeLookup::default()
                .with("tok_valid_1", Ok(ada()))
                .with("tok_expired", Err(FakeError::Expired))
                .with("tok_offline", Err(FakeError::Network))
                .with(
                    "tok_no_roles",
                    Ok(IdentityUser {
                        roles: None,
                        ..ada()
                    }),
                ),
        )
    }

    #[tokio::test]
    #[traced_test]
    async fn failure_cause_is_logged_without_the_token() {
        let result = gate().authenticate("Bearer tok_expired").await;

        assert_eq!(result, Err(AuthError::Unauthorized));
        assert!(logs_contain("authentication failed: token validation error"));
        assert!(logs_contain("token expired"));
        assert!(!logs_contain("tok_expired"));
    }

    #[tokio::test]
    #[traced_test]
    async fn malformed_header_is_not_echoed_to_the_log() {
        let result = gate().authenticate("Basic c2VjcmV0OnBhc3M=").await;

        assert_eq!(result, Err(AuthError::Unauthorized));
        assert!(logs_contain("authorization header is malformed"));
        assert!(!logs_contain("c2VjcmV0OnBhc3M="));
    }

    #[tokio::test]
    async fn valid_token_yields_principal() {
        let principal = gate().authenticate("Bearer tok_valid_1").await.unwrap();

        assert_eq!(
            principal,
            Principal {
                id: Some("u1".into()),
                name: Some("Ada".into()),
                email: Some("ada@x.com".into()),
                roles: vec!["admin".into()],
            }
        );
    }

    #[tokio::test]
    async fn identity_without_roles_yields_empty_roles() {
        let principal = gate().authenticate("Bearer tok_no_roles").await.unwrap();

        assert!(principal.roles.is_empty());
        assert_eq!(principal.name.as_deref(), Some("Ada"));
    }

    #[tokio::test]
    async fn every_lookup_failure_is_unauthorized() {
        let gate = gate();

        for header in ["Bearer tok_expired", "Bearer tok_offline", "Bearer garbage"] {
            assert_eq!(
                gate.authenticate(header).await,
                Err(AuthError::Unauthorized),
                "{header}"
            );
        }
    }

    #[tokio::test]
    async fn malformed_headers_are_unauthorized() {
        let gate = gate();

        for header in ["", "Bearer", "Bearer ", "Bearer    ", "Basic tok_valid_1", "tok_valid_1"] {
            assert_eq!(
                gate.authenticate(header).await,
                Err(AuthError::Unauthorized),
                "{header:?}"
            );
        }
    }

    #[tokio::test]
    async fn repeated_calls_yield_identical_principals() {
        let gate = gate();

        let first = gate.authenticate("Bearer tok_valid_1").await.unwrap();
        let second = gate.authenticate("Bearer tok_valid_1").await.unwrap();

        assert_eq!(first, second);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_calls_do_not_mix_up_principals() {
        let mut lookup = FakeLookup::default();
        for i in 0..32 {
            lookup = lookup.with(
                &format!("tok_{i}"),
                Ok(IdentityUser {
                    id: Some(format!("u{i}")),
                    name: Some(format!("user {i}")),
                    email: Some(format!("user{i}@x.com")),
                    roles: Some(vec![format!("role{i}")]),
                }),
            );
        }
        let gate = AuthGate::new(lookup);

        let tasks = (0..32)
            .map(|i| {
                let gate = gate.clone();
                tokio::spawn(async move {
                    let principal = gate
                        .authenticate(&format!("Bearer tok_{i}"))
                        .await
                        .unwrap();
                    (i, principal)
                })
            })
            .collect::<Vec<_>>();

        for task in tasks {
            let (i, principal) = task.await.unwrap();
            assert_eq!(principal.id, Some(format!("u{i}")));
            assert_eq!(principal.name, Some(format!("user {i}")));
            assert_eq!(principal.email, Some(format!("user{i}@x.com")));
            assert_eq!(principal.roles, vec![format!("role{i}")]);
        }
    }

    #[tokio::test]
    async fn gate_accepts_shared_lookup() {
        let lookup = Arc::new(FakeLookup::default().with("tok_valid_1", Ok(ada())));
        let gate = AuthGate::from_shared(Arc::clone(&lookup));

        assert!(gate.authenticate("Bearer tok_valid_1").await.is_ok());
        assert_eq!(Arc::strong_count(&lookup), 2);
    }

    #[test]
    fn bearer_scheme_is_case_insensitive() {
        assert_eq!(
            extract_bearer("bearer abc").map(AccessTokenRef::as_str),
            Some("abc")
        );
        assert_eq!(
            extract_bearer("BEARER abc").map(AccessTokenRef::as_str),
            Some("abc")
        );
    }

    #[test]
    fn bearer_token_is_trimmed() {
        assert_eq!(
            extract_bearer("Bearer   abc  ").map(AccessTokenRef::as_str),
            Some("abc")
        );
    }

    #[test]
    fn non_ascii_prefix_does_not_panic() {
        assert_eq!(extract_bearer("Bëarer abc"), None);
        assert_eq!(extract_bearer("ĈĈĈĈ"), None);
    }

    #[test]
    fn error_description_includes_sources() {
        #[derive(Debug, thiserror::Error)]
        #[error("identity service rejected the request")]
        struct Outer(#[source] FakeError);

        assert_eq!(
            describe(&Outer(FakeError::Expired)),
            "identity service rejected the request: token expired"
        );
    }
}
