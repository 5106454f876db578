use futures::future::join_all;
use serde_json::json;
use tracing::{debug, info};

use crate::{
    aggregator::{path_segment, Enriched, OrgDataAggregator},
    error::Result,
    github::{GitHubApi, Method, OrgMembership, OrgRole, OrganizationMember, User},
};

impl<C: GitHubApi> OrgDataAggregator<C> {
    fn membership_path(&self, username: &str) -> String {
        format!("/orgs/{}/memberships/{}", self.org, username)
    }

    async fn membership(&self, username: &str) -> Result<OrgMembership> {
        self.get(&self.membership_path(username)).await
    }

    /// Every member of the organization with their role and membership state.
    pub async fn list_members(&self) -> Result<Vec<OrganizationMember>> {
        let members = self.list_members_enriched().await?;
        Ok(members.into_iter().map(Enriched::into_inner).collect())
    }

    /// Same as [`Self::list_members`], but tells which members got default role and state
    /// because their membership couldn't be fetched.
    pub async fn list_members_enriched(&self) -> Result<Vec<Enriched<OrganizationMember>>> {
        let users: Vec<User> = self.paginate(&format!("/orgs/{}/members", self.org)).await?;
        debug!("found {} members in {}", users.len(), self.org);

        let memberships = join_all(users.iter().map(|user| self.membership(&user.login))).await;

        let members: Vec<_> = users
            .into_iter()
            .zip(memberships)
            .map(|(user, membership)| {
                Enriched::or_default(membership, &user.login).map(|membership| {
                    OrganizationMember {
                        user,
                        role: membership.role,
                        state: membership.state,
                    }
                })
            })
            .collect();

        let defaulted = members.iter().filter(|m| m.is_defaulted()).count();
        if defaulted > 0 {
            debug!(
                "{} of {} members of {} reported with default membership",
                defaulted,
                members.len(),
                self.org
            );
        }

        Ok(members)
    }

    /// Invites `username` to the organization, or changes their role if they're already a
    /// member. Calling it again with the same role changes nothing.
    pub async fn add_member(&self, username: &str, role: OrgRole) -> Result<()> {
        path_segment(username, "username")?;
        info!("setting {} as {:?} of {}", username, role, self.org);

        self.execute(
            Method::Put,
            &self.membership_path(username),
            Some(json!({ "role": role })),
        )
        .await
    }

    pub async fn update_member_role(&self, username: &str, role: OrgRole) -> Result<()> {
        self.add_member(username, role).await
    }

    /// Revokes `username`'s membership, or their pending invitation.
    pub async fn remove_member(&self, username: &str) -> Result<()> {
        path_segment(username, "username")?;
        info!("removing {} from {}", username, self.org);

        self.execute(Method::Delete, &self.membership_path(username), None)
            .await
    }
}
