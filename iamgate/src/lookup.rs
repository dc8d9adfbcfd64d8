use std::{error, sync::Arc};

use async_trait::async_trait;

use crate::{AccessTokenRef, IdentityUser};

/// A capability that resolves an access token to the user it was issued to
///
/// Implementations do whatever is needed to decide whether the token is
/// acceptable (a network call, a signature or expiry check) and either
/// return the user or fail. Callers treat every failure alike.
#[async_trait]
pub trait IdentityLookup: Send + Sync {
    /// The error type returned when the token cannot be resolved
    type Error: error::Error + Send + Sync + 'static;

    /// Resolves the user behind `token`
    async fn lookup(&self, token: &AccessTokenRef) -> Result<IdentityUser, Self::Error>;
}

#[async_trait]
impl<'a, T> IdentityLookup for &'a T
where
    T: IdentityLookup + ?Sized,
{
    type Error = T::Error;

    async fn lookup(&self, token: &AccessTokenRef) -> Result<IdentityUser, Self::Error> {
        T::lookup(self, token).await
    }
}

#[async_trait]
impl<T> IdentityLookup for Box<T>
where
    T: IdentityLookup + ?Sized,
{
    type Error = T::Error;

    async fn lookup(&self, token: &AccessTokenRef) -> Result<IdentityUser, Self::Error> {
        T::lookup(self, token).await
    }
}

#[async_trait]
impl<T> IdentityLookup for Arc<T>
where
    T: IdentityLookup + ?Sized,
{
    type Error = T::Error;

    async fn lookup(&self, token: &AccessTokenRef) -> Result<IdentityUser, Self::Error> {
        T::lookup(self, token).await
    }
}
