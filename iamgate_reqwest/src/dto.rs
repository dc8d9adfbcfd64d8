//! Wire shapes returned by the identity service

use std::collections::BTreeMap;

use iamgate::IdentityUser;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(crate) struct MeResponse {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<UserDto>,
}

impl MeResponse {
    /// The user, unless the envelope reports a failure or carries none
    pub(crate) fn into_user(self) -> Result<UserDto, String> {
        match (self.success, self.data) {
            (Some(false), _) | (_, None) => Err(self
                .message
                .unwrap_or_else(|| "no user in response".to_owned())),
            (_, Some(user)) => Ok(user),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct UserDto {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub roles: Option<RolesDto>,
}

/// Roles arrive either as plain names or keyed by role id
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum RolesDto {
    Names(Vec<String>),
    Assigned(BTreeMap<String, AssignedRole>),
}

#[derive(Debug, Deserialize)]
pub(crate) struct AssignedRole {
    #[serde(default)]
    pub name: Option<String>,
}

impl RolesDto {
    fn into_names(self) -> Vec<String> {
        match self {
            RolesDto::Names(names) => names,
            RolesDto::Assigned(roles) => roles
                .into_iter()
                .map(|(id, role)| role.name.unwrap_or(id))
                .collect(),
        }
    }
}

impl From<UserDto> for IdentityUser {
    fn from(user: UserDto) -> Self {
        IdentityUser {
            id: user.id,
            name: user.name,
            email: user.email,
            roles: user.roles.map(RolesDto::into_names),
        }
    }
}
