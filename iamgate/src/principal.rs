use serde::{Deserialize, Serialize};

/// The user record handed to protected handlers
///
/// A `Principal` is always fully formed: every field is present, holding
/// `None` or an empty list when the identity service did not supply a value.
/// It serializes with all four keys, using `null` for absent values.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// Opaque identifier assigned by the identity service
    pub id: Option<String>,

    /// Display name
    pub name: Option<String>,

    /// Email address
    pub email: Option<String>,

    /// Role names, in the order the identity service reported them
    pub roles: Vec<String>,
}

/// A user as reported by an [`IdentityLookup`](crate::IdentityLookup)
///
/// Any subset of the fields may be present.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityUser {
    /// Identifier, if exposed
    #[serde(default)]
    pub id: Option<String>,

    /// Display name, if exposed
    #[serde(default)]
    pub name: Option<String>,

    /// Email address, if exposed
    #[serde(default)]
    pub email: Option<String>,

    /// Role names, if exposed
    #[serde(default)]
    pub roles: Option<Vec<String>>,
}

impl Principal {
    /// Projects an identity user into the normalized shape, substituting the
    /// per-field defaults for anything the identity service left out
    pub fn from_identity(user: IdentityUser) -> Self {
        let IdentityUser {
            id,
            name,
            email,
            roles,
        } = user;

        Self {
            id: id.or_else(default_id),
            name: name.or_else(default_name),
            email: email.or_else(default_email),
            roles: roles.unwrap_or_else(default_roles),
        }
    }
}

impl From<IdentityUser> for Principal {
    #[inline]
    fn from(user: IdentityUser) -> Self {
        Self::from_identity(user)
    }
}

fn default_id() -> Option<String> {
    None
}

fn default_name() -> Option<String> {
    None
}

fn default_email() -> Option<String> {
    None
}

fn default_roles() -> Vec<String> {
    Vec::new()
}
