use futures::{future::join_all, try_join};
use serde::de::IgnoredAny;
use serde_json::{json, to_value};
use tracing::{debug, info};

use crate::{
    aggregator::{path_segment, require, Enriched, OrgDataAggregator},
    error::Result,
    github::{
        GitHubApi, Method, NewTeam, Repository, Team, TeamMember, TeamMembership, TeamPrivacy,
        TeamRole, TeamUpdate, User,
    },
};

impl<C: GitHubApi> OrgDataAggregator<C> {
    fn team_path(&self, slug: &str) -> String {
        format!("/orgs/{}/teams/{}", self.org, slug)
    }

    fn team_membership_path(&self, slug: &str, username: &str) -> String {
        format!("{}/memberships/{}", self.team_path(slug), username)
    }

    async fn team_membership(&self, slug: &str, username: &str) -> Result<TeamMembership> {
        self.get(&self.team_membership_path(slug, username)).await
    }

    /// Every team of the organization.
    ///
    /// `members_count` and `repos_count` are left at 0 to avoid two extra listings per team, use
    /// [`Self::get_team_detail`] for exact counts.
    pub async fn list_teams(&self) -> Result<Vec<Team>> {
        let teams: Vec<Team> = self.paginate(&format!("/orgs/{}/teams", self.org)).await?;
        debug!("found {} teams in {}", teams.len(), self.org);

        Ok(teams
            .into_iter()
            .map(|team| Team {
                members_count: 0,
                repos_count: 0,
                ..team
            })
            .collect())
    }

    /// A team with its member and repository counts, computed by listing both.
    pub async fn get_team_detail(&self, slug: &str) -> Result<Team> {
        path_segment(slug, "team slug")?;
        let path = self.team_path(slug);
        let team: Team = self.get(&path).await?;

        let members_path = format!("{}/members", path);
        let repos_path = format!("{}/repos", path);
        let (members, repos) = try_join!(
            self.paginate::<IgnoredAny>(&members_path),
            self.paginate::<IgnoredAny>(&repos_path)
        )?;

        Ok(Team {
            members_count: members.len(),
            repos_count: repos.len(),
            ..team
        })
    }

    pub async fn create_team(
        &self,
        name: &str,
        description: Option<&str>,
        privacy: TeamPrivacy,
    ) -> Result<Team> {
        require(name, "team name")?;
        info!("creating team {} in {}", name, self.org);

        let team = NewTeam {
            name: name.to_owned(),
            description: description.filter(|d| !d.is_empty()).map(str::to_owned),
            privacy,
        };
        self.send(
            Method::Post,
            &format!("/orgs/{}/teams", self.org),
            to_value(team)?,
        )
        .await
    }

    pub async fn update_team(&self, slug: &str, fields: TeamUpdate) -> Result<Team> {
        path_segment(slug, "team slug")?;
        info!("updating team {} of {}", slug, self.org);

        self.send(
            Method::Patch,
            &self.team_path(slug),
            to_value(fields.normalized())?,
        )
        .await
    }

    pub async fn delete_team(&self, slug: &str) -> Result<()> {
        path_segment(slug, "team slug")?;
        info!("deleting team {} of {}", slug, self.org);

        self.execute(Method::Delete, &self.team_path(slug), None)
            .await
    }

    pub async fn list_team_members(&self, slug: &str) -> Result<Vec<TeamMember>> {
        let members = self.list_team_members_enriched(slug).await?;
        Ok(members.into_iter().map(Enriched::into_inner).collect())
    }

    /// Members of a team with their role in it. Members whose role can't be fetched are reported
    /// as regular members.
    pub async fn list_team_members_enriched(&self, slug: &str) -> Result<Vec<Enriched<TeamMember>>> {
        path_segment(slug, "team slug")?;
        let users: Vec<User> = self
            .paginate(&format!("{}/members", self.team_path(slug)))
            .await?;
        debug!("found {} members in team {}", users.len(), slug);

        let memberships =
            join_all(users.iter().map(|user| self.team_membership(slug, &user.login))).await;

        Ok(users
            .into_iter()
            .zip(memberships)
            .map(|(user, membership)| {
                Enriched::or_default(membership, &user.login).map(|membership| TeamMember {
                    user,
                    role: membership.role,
                })
            })
            .collect())
    }

    /// Adds `username` to the team, or changes their role in it.
    pub async fn add_team_member(&self, slug: &str, username: &str, role: TeamRole) -> Result<()> {
        path_segment(slug, "team slug")?;
        path_segment(username, "username")?;
        info!("setting {} as {:?} of team {}", username, role, slug);

        self.execute(
            Method::Put,
            &self.team_membership_path(slug, username),
            Some(json!({ "role": role })),
        )
        .await
    }

    pub async fn remove_team_member(&self, slug: &str, username: &str) -> Result<()> {
        path_segment(slug, "team slug")?;
        path_segment(username, "username")?;
        info!("removing {} from team {}", username, slug);

        self.execute(
            Method::Delete,
            &self.team_membership_path(slug, username),
            None,
        )
        .await
    }

    /// Repositories the team has been granted access to.
    pub async fn list_team_repositories(&self, slug: &str) -> Result<Vec<Repository>> {
        path_segment(slug, "team slug")?;
        self.paginate(&format!("{}/repos", self.team_path(slug)))
            .await
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::{
        aggregator::fixtures::{aggregator, repository, team, user},
        error::Error,
        github::{Method, Permission, TeamPrivacy, TeamRole, TeamUpdate},
    };

    #[tokio::test]
    async fn listed_teams_have_placeholder_counts() {
        let github = aggregator(100);
        let mut orga = team(1, "orga", Some("push"));
        orga["members_count"] = json!(12);
        github
            .api
            .set_collection("/orgs/prologin/teams", vec![orga, team(2, "roots", None)]);

        let teams = github.list_teams().await.unwrap();
        assert_eq!(teams.len(), 2);
        assert_eq!(teams[0].slug, "orga");
        assert_eq!(teams[0].permission, Permission::Write);
        assert_eq!(teams[0].members_count, 0);
        assert_eq!(teams[1].permission, Permission::Read);
    }

    #[tokio::test]
    async fn team_detail_counts_paginated_lists() {
        let github = aggregator(2);
        let mut orga = team(1, "orga", Some("pull"));
        // summary counters from GitHub aren't trusted
        orga["members_count"] = json!(1);
        orga["repos_count"] = json!(40);
        github.api.set_resource("/orgs/prologin/teams/orga", orga);
        github.api.set_collection(
            "/orgs/prologin/teams/orga/members",
            (1..=5).map(|i| user(i, &format!("user{}", i))).collect(),
        );
        github.api.set_collection(
            "/orgs/prologin/teams/orga/repos",
            vec![repository(1, "site"), repository(2, "stechec2")],
        );

        let detail = github.get_team_detail("orga").await.unwrap();
        assert_eq!(detail.members_count, 5);
        assert_eq!(detail.repos_count, 2);
        assert_eq!(detail.name, "ORGA");
    }

    #[tokio::test]
    async fn create_team_requires_a_name() {
        let github = aggregator(100);

        let err = github
            .create_team("", None, TeamPrivacy::Closed)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
        assert!(github.api.sent().is_empty());
    }

    #[tokio::test]
    async fn create_team_sends_privacy() {
        let github = aggregator(100);
        github
            .api
            .set_resource("/orgs/prologin/teams", team(9, "jury", Some("pull")));

        let created = github
            .create_team("jury", Some("Final jury"), TeamPrivacy::Secret)
            .await
            .unwrap();
        assert_eq!(created.id, 9);

        let sent = github.api.sent();
        assert_eq!(sent[0].method, Method::Post);
        assert_eq!(
            sent[0].body,
            Some(json!({"name": "jury", "description": "Final jury", "privacy": "secret"}))
        );
    }

    #[tokio::test]
    async fn update_team_only_sends_provided_fields() {
        let github = aggregator(100);
        github
            .api
            .set_resource("/orgs/prologin/teams/orga", team(1, "orga", Some("pull")));

        let update = TeamUpdate {
            description: Some("Organizers".to_owned()),
            permission: Some(Permission::Write),
            ..Default::default()
        };
        let updated = github.update_team("orga", update).await.unwrap();

        assert_eq!(updated.description.as_deref(), Some("Organizers"));
        assert_eq!(updated.permission, Permission::Write);
        assert_eq!(
            github.api.sent()[0].body,
            Some(json!({"description": "Organizers", "permission": "push"}))
        );
    }

    #[tokio::test]
    async fn team_member_roles_with_fallback() {
        let github = aggregator(100);
        github.api.set_collection(
            "/orgs/prologin/teams/orga/members",
            vec![user(1, "alice"), user(2, "bob")],
        );
        github.api.set_resource(
            "/orgs/prologin/teams/orga/memberships/alice",
            json!({"role": "maintainer", "state": "active"}),
        );
        github
            .api
            .fail("/orgs/prologin/teams/orga/memberships/bob", 500);

        let members = github.list_team_members("orga").await.unwrap();
        let roles: Vec<_> = members
            .iter()
            .map(|m| (m.user.login.as_str(), m.role))
            .collect();
        assert_eq!(
            roles,
            vec![("alice", TeamRole::Maintainer), ("bob", TeamRole::Member)]
        );
    }

    #[tokio::test]
    async fn team_membership_mutations() {
        let github = aggregator(100);
        github
            .add_team_member("orga", "alice", TeamRole::Maintainer)
            .await
            .unwrap();
        github.remove_team_member("orga", "bob").await.unwrap();
        github.delete_team("orga").await.unwrap();

        let sent = github.api.sent();
        assert_eq!(sent[0].method, Method::Put);
        assert_eq!(sent[0].path, "/orgs/prologin/teams/orga/memberships/alice");
        assert_eq!(sent[0].body, Some(json!({"role": "maintainer"})));
        assert_eq!(sent[1].method, Method::Delete);
        assert_eq!(sent[1].path, "/orgs/prologin/teams/orga/memberships/bob");
        assert_eq!(sent[2].method, Method::Delete);
        assert_eq!(sent[2].path, "/orgs/prologin/teams/orga");
    }

    #[tokio::test]
    async fn team_listing_failure_aborts() {
        let github = aggregator(100);
        github.api.fail("/orgs/prologin/teams", 401);

        let err = github.list_teams().await.unwrap_err();
        assert_eq!(err.status(), Some(401));
    }

    #[tokio::test]
    async fn team_member_listing_failure_aborts() {
        let github = aggregator(100);
        github.api.fail("/orgs/prologin/teams/orga/members", 404);

        let err = github.list_team_members("orga").await.unwrap_err();
        assert_eq!(err.status(), Some(404));
        assert_eq!(
            github
                .api
                .get_count("/orgs/prologin/teams/orga/memberships/alice"),
            0
        );
    }

    #[tokio::test]
    async fn team_membership_paths_are_checked() {
        let github = aggregator(100);

        let err = github
            .remove_team_member("orga", "../../../../repos/prologin/site")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
        let err = github
            .add_team_member("..", "alice", TeamRole::Member)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
        let err = github.delete_team("%2e%2e").await.unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));

        assert!(github.api.sent().is_empty());
    }

    #[tokio::test]
    async fn team_repositories() {
        let github = aggregator(1);
        github.api.set_collection(
            "/orgs/prologin/teams/orga/repos",
            vec![repository(1, "site"), repository(2, "stechec2")],
        );

        let repos = github.list_team_repositories("orga").await.unwrap();
        let names: Vec<_> = repos.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["site", "stechec2"]);
    }
}
