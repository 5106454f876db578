use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize};
use url::Url;

use crate::error::Error;

/// GitHub returns `null` or `""` for unset descriptions, we only want to expose `None`.
fn empty_as_none<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.is_empty()))
}

/// Access level on a repository, from lowest to highest.
///
/// GitHub uses two vocabularies for the same five tiers: repository collaborators speak
/// `read`/`write`, teams speak `pull`/`push`. Both are accepted when parsing; serialization
/// uses `read`/`write` unless the [`team_vocabulary`] helpers are used.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    #[default]
    #[serde(alias = "pull")]
    Read,
    Triage,
    #[serde(alias = "push")]
    Write,
    Maintain,
    Admin,
}

impl Permission {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Triage => "triage",
            Self::Write => "write",
            Self::Maintain => "maintain",
            Self::Admin => "admin",
        }
    }

    /// Name of this level in the team vocabulary.
    pub fn as_team_str(&self) -> &'static str {
        match self {
            Self::Read => "pull",
            Self::Write => "push",
            other => other.as_str(),
        }
    }
}

impl Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Permission {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "read" | "pull" => Ok(Self::Read),
            "triage" => Ok(Self::Triage),
            "write" | "push" => Ok(Self::Write),
            "maintain" => Ok(Self::Maintain),
            "admin" => Ok(Self::Admin),
            other => Err(Error::invalid_argument(format!(
                "invalid permission value `{}`",
                other
            ))),
        }
    }
}

/// (De)serializes a [`Permission`] with the `pull`/`push` vocabulary used by team endpoints.
pub mod team_vocabulary {
    use serde::{Deserialize, Deserializer, Serializer};

    use super::Permission;

    pub fn serialize<S: Serializer>(permission: &Permission, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(permission.as_team_str())
    }

    /// A missing or `null` level means read access.
    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Permission, D::Error> {
        Ok(Option::<Permission>::deserialize(d)?.unwrap_or_default())
    }

    pub fn serialize_option<S: Serializer>(
        permission: &Option<Permission>,
        s: S,
    ) -> Result<S::Ok, S::Error> {
        match permission {
            Some(permission) => serialize(permission, s),
            None => s.serialize_none(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountType {
    #[default]
    User,
    Bot,
    Organization,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub login: String,
    pub avatar_url: Url,
    pub html_url: Url,
    #[serde(rename = "type", default)]
    pub account_type: AccountType,
    #[serde(default)]
    pub site_admin: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrgRole {
    Admin,
    #[default]
    Member,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MembershipState {
    #[default]
    Active,
    /// The invitation hasn't been accepted yet
    Pending,
}

/// Body of `GET /orgs/{org}/memberships/{username}`. The default is what we assume when GitHub
/// won't tell us: an active, regular member.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrgMembership {
    pub role: OrgRole,
    pub state: MembershipState,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrganizationMember {
    #[serde(flatten)]
    pub user: User,
    pub role: OrgRole,
    pub state: MembershipState,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TeamPrivacy {
    Secret,
    #[default]
    Closed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub id: u64,
    pub name: String,
    pub slug: String,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub privacy: TeamPrivacy,
    /// Default permission granted on the team's repositories
    #[serde(default, with = "team_vocabulary")]
    pub permission: Permission,
    #[serde(default)]
    pub members_count: usize,
    #[serde(default)]
    pub repos_count: usize,
    pub html_url: Url,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TeamRole {
    #[default]
    Member,
    Maintainer,
}

/// Body of `GET /orgs/{org}/teams/{slug}/memberships/{username}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TeamMembership {
    pub role: TeamRole,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamMember {
    #[serde(flatten)]
    pub user: User,
    pub role: TeamRole,
}

/// Body of `POST /orgs/{org}/teams`.
#[derive(Debug, Clone, Serialize)]
pub struct NewTeam {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub privacy: TeamPrivacy,
}

/// Fields of a team that can be changed, unset fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub privacy: Option<TeamPrivacy>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "team_vocabulary::serialize_option"
    )]
    pub permission: Option<Permission>,
}

impl TeamUpdate {
    /// Empty strings are treated as "not provided".
    pub fn normalized(self) -> Self {
        Self {
            name: self.name.filter(|s| !s.is_empty()),
            description: self.description.filter(|s| !s.is_empty()),
            ..self
        }
    }
}

/// The caller's own access on a repository, as reported by GitHub.
///
/// Every tier is reported on its own: `admin` implies the others but we never assume it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Permissions {
    pub admin: bool,
    pub maintain: bool,
    pub push: bool,
    pub triage: bool,
    pub pull: bool,
}

impl Permissions {
    pub fn highest(&self) -> Option<Permission> {
        if self.admin {
            Some(Permission::Admin)
        } else if self.maintain {
            Some(Permission::Maintain)
        } else if self.push {
            Some(Permission::Write)
        } else if self.triage {
            Some(Permission::Triage)
        } else if self.pull {
            Some(Permission::Read)
        } else {
            None
        }
    }
}

fn default_branch() -> String {
    "main".to_owned()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Repository {
    pub id: u64,
    pub name: String,
    pub full_name: String,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub private: bool,
    pub html_url: Url,
    #[serde(default = "default_branch")]
    pub default_branch: String,
    #[serde(default)]
    pub permissions: Permissions,
    pub owner: User,
}

/// Entry of `GET /repos/{owner}/{repo}/collaborators`.
#[derive(Debug, Clone, Deserialize)]
pub struct Collaborator {
    #[serde(flatten)]
    pub user: User,
    #[serde(default)]
    pub role_name: Option<String>,
    #[serde(default)]
    pub permissions: Option<Permissions>,
}

impl Collaborator {
    /// The collaborator's level: their role name when GitHub knows it, otherwise the highest
    /// reported tier, otherwise read.
    pub fn permission(&self) -> Permission {
        self.role_name
            .as_deref()
            .and_then(|role| role.parse().ok())
            .or_else(|| self.permissions.and_then(|p| p.highest()))
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubjectType {
    User,
    Team,
}

impl FromStr for SubjectType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "team" => Ok(Self::Team),
            other => Err(Error::invalid_argument(format!(
                "invalid type value `{}`, must be \"user\" or \"team\"",
                other
            ))),
        }
    }
}

/// A single grant on a repository, either to a user or to a team.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RepositoryPermission {
    User { subject: User, permission: Permission },
    Team { subject: Team, permission: Permission },
}

impl RepositoryPermission {
    pub fn permission(&self) -> Permission {
        match self {
            Self::User { permission, .. } | Self::Team { permission, .. } => *permission,
        }
    }

    /// Login of the user or slug of the team.
    pub fn subject_name(&self) -> &str {
        match self {
            Self::User { subject, .. } => &subject.login,
            Self::Team { subject, .. } => &subject.slug,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RepositoryAccess {
    pub permissions: Vec<RepositoryPermission>,
    /// Organization members who aren't collaborators of the repository yet
    #[serde(rename = "potentialCollaborators")]
    pub potential_collaborators: Vec<User>,
}
