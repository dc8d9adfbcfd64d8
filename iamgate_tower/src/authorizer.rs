use std::{fmt, future::Future, pin::Pin};

use http::{Request, Response};
use iamgate::{AuthError, AuthGate, IdentityLookup, Principal};
use tower_http::auth::{
    AsyncAuthorizeRequest, AsyncRequireAuthorization, AsyncRequireAuthorizationLayer,
};
use tower_layer::Layer;

use crate::TerseErrorHandler;

/// Layer that authenticates every request through an [`AuthGate`]
///
/// On success the [`Principal`] is made available through
/// [`Request::extensions`]. On failure, whether the header was missing,
/// malformed or rejected, the configured [`OnAuthError`] handler answers
/// the request and the inner service is never called.
pub struct GateAuthorizer<L, OnError> {
    gate: AuthGate<L>,
    on_error: OnError,
}

impl<L, OnError> Clone for GateAuthorizer<L, OnError>
where
    OnError: Clone,
{
    fn clone(&self) -> Self {
        Self {
            gate: self.gate.clone(),
            on_error: self.on_error.clone(),
        }
    }
}

impl<L, OnError> fmt::Debug for GateAuthorizer<L, OnError>
where
    L: fmt::Debug,
    OnError: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("GateAuthorizer")
            .field("gate", &self.gate)
            .field("on_error", &self.on_error)
            .finish()
    }
}

impl<L> GateAuthorizer<L, ()> {
    /// Constructs an authorizer around the given gate
    ///
    /// An error handler must be attached before the authorizer can be used
    /// as a layer.
    #[inline]
    pub fn new(gate: AuthGate<L>) -> Self {
        Self { gate, on_error: () }
    }

    /// Attaches a custom error handler to generate responses
    /// in the event of an authentication failure
    #[inline]
    pub fn with_error_handler<OnError>(self, on_error: OnError) -> GateAuthorizer<L, OnError> {
        GateAuthorizer {
            gate: self.gate,
            on_error,
        }
    }

    /// Attaches the default terse error handler: [`TerseErrorHandler`]
    ///
    /// This error handler generates `401 Unauthorized` responses with an
    /// empty body
    #[inline]
    pub fn with_terse_error_handler<ResBody: Default>(
        self,
    ) -> GateAuthorizer<L, TerseErrorHandler<ResBody>> {
        self.with_error_handler(TerseErrorHandler::new())
    }
}

impl<L, OnError> GateAuthorizer<L, OnError> {
    /// The gate requests are authenticated through
    #[inline]
    pub fn gate(&self) -> &AuthGate<L> {
        &self.gate
    }
}

impl<S, L, OnError> Layer<S> for GateAuthorizer<L, OnError>
where
    OnError: Clone,
{
    type Service = AsyncRequireAuthorization<S, RequireAuthentication<L, OnError>>;

    fn layer(&self, inner: S) -> Self::Service {
        AsyncRequireAuthorizationLayer::new(RequireAuthentication {
            gate: self.gate.clone(),
            on_error: self.on_error.clone(),
        })
        .layer(inner)
    }
}

/// The per-request authentication step installed by [`GateAuthorizer`]
pub struct RequireAuthentication<L, OnError> {
    gate: AuthGate<L>,
    on_error: OnError,
}

impl<L, OnError> Clone for RequireAuthentication<L, OnError>
where
    OnError: Clone,
{
    #[inline]
    fn clone(&self) -> Self {
        Self {
            gate: self.gate.clone(),
            on_error: self.on_error.clone(),
        }
    }
}

impl<L, OnError> fmt::Debug for RequireAuthentication<L, OnError>
where
    L: fmt::Debug,
    OnError: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("RequireAuthentication")
            .field("gate", &self.gate)
            .field("on_error", &self.on_error)
            .finish()
    }
}

type AuthorizeFuture<ReqBody, ResBody> =
    Pin<Box<dyn Future<Output = Result<Request<ReqBody>, Response<ResBody>>> + Send + 'static>>;

impl<L, OnError, ReqBody> AsyncAuthorizeRequest<ReqBody> for RequireAuthentication<L, OnError>
where
    L: IdentityLookup + 'static,
    OnError: OnAuthError + Clone + Send + 'static,
    OnError::Body: Send + 'static,
    ReqBody: Send + 'static,
{
    type RequestBody = ReqBody;
    type ResponseBody = OnError::Body;
    type Future = AuthorizeFuture<ReqBody, OnError::Body>;

    fn authorize(&mut self, mut request: Request<ReqBody>) -> Self::Future {
        let gate = self.gate.clone();
        let on_error = self.on_error.clone();

        let authorization = request
            .headers()
            .get(http::header::AUTHORIZATION)
            .map(|v| v.to_str().map(str::to_owned));

        Box::pin(async move {
            let result = match authorization {
                Some(Ok(authorization)) => gate.authenticate(&authorization).await,
                Some(Err(_)) => {
                    tracing::debug!(
                        "authentication failed: authorization header is not valid text"
                    );
                    Err(AuthError::Unauthorized)
                }
                None => {
                    tracing::debug!("authentication failed: authorization header is missing");
                    Err(AuthError::Unauthorized)
                }
            };

            match result {
                Ok(principal) => {
                    let _ = request.extensions_mut().insert::<Principal>(principal);
                    tracing::trace!("request authenticated");
                    Ok(request)
                }
                Err(AuthError::Unauthorized) => Err(on_error.on_unauthorized()),
            }
        })
    }
}

/// Handler for responding to requests that failed authentication
pub trait OnAuthError {
    /// The body type returned on an error
    type Body;

    /// Response when the request could not be authenticated
    ///
    /// Called alike for a missing header, a malformed header and a token the
    /// identity service did not accept.
    fn on_unauthorized(&self) -> Response<Self::Body>;
}

macro_rules! delegate_impls {
    ($($ty:ty)*) => {
        $(
            impl<T> OnAuthError for $ty
            where
                T: OnAuthError,
            {
                type Body = T::Body;

                fn on_unauthorized(&self) -> Response<Self::Body> {
                    T::on_unauthorized(self)
                }
            }
        )*
    }
}

delegate_impls!(
    &'_ T
    Box<T>
    std::sync::Arc<T>
);
