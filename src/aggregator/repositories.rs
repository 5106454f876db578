use std::collections::HashSet;

use futures::{future::join_all, try_join};
use serde::de::IgnoredAny;
use serde_json::json;
use tracing::{debug, info, trace, warn};

use crate::{
    aggregator::{path_segment, require, OrgDataAggregator},
    error::Result,
    github::{
        paginate, Collaborator, GitHubApi, Method, Permission, Repository, RepositoryAccess,
        RepositoryPermission, SubjectType, Team, User,
    },
};

impl<C: GitHubApi> OrgDataAggregator<C> {
    fn repo_path(&self, repo: &str) -> String {
        format!("/repos/{}/{}", self.org, repo)
    }

    fn team_repo_path(&self, slug: &str, repo: &str) -> String {
        format!("/orgs/{}/teams/{}/repos/{}/{}", self.org, slug, self.org, repo)
    }

    /// Every repository of the organization, most recently updated first.
    pub async fn list_org_repositories(&self) -> Result<Vec<Repository>> {
        let query = [
            ("sort", "updated".to_owned()),
            ("direction", "desc".to_owned()),
        ];
        let repos: Vec<Repository> = paginate(
            &self.api,
            &format!("/orgs/{}/repos", self.org),
            &query,
            self.per_page,
        )
        .await?;
        debug!("found {} repositories in {}", repos.len(), self.org);

        Ok(repos)
    }

    pub async fn get_repository(&self, repo: &str) -> Result<Repository> {
        path_segment(repo, "repository name")?;
        self.get(&self.repo_path(repo)).await
    }

    /// Whether any team has been granted access to `repo`.
    pub async fn has_team_collaboration(&self, repo: &str) -> Result<bool> {
        path_segment(repo, "repository name")?;
        let teams = self
            .paginate::<IgnoredAny>(&format!("{}/teams", self.repo_path(repo)))
            .await?;
        Ok(!teams.is_empty())
    }

    /// Repositories no team has access to.
    ///
    /// Individual collaborators don't count: a repository shared with users but no team is
    /// still owner-only. A repository whose teams can't be listed is left out.
    pub async fn list_owner_only_repositories(&self) -> Result<Vec<Repository>> {
        let repos = self.list_org_repositories().await?;

        let checks = join_all(
            repos
                .iter()
                .map(|repo| self.has_team_collaboration(&repo.name)),
        )
        .await;

        let owner_only: Vec<Repository> = repos
            .into_iter()
            .zip(checks)
            .filter_map(|(repo, check)| match check {
                Ok(false) => Some(repo),
                Ok(true) => None,
                Err(e) => {
                    warn!(
                        "couldn't list teams of {}, leaving it out of owner-only repositories: {}",
                        repo.full_name, e
                    );
                    None
                }
            })
            .collect();
        debug!("{} repositories have no team", owner_only.len());

        Ok(owner_only)
    }

    /// User and team grants on `repo`, and the organization members that could still be added
    /// as collaborators.
    pub async fn get_repository_permissions(&self, repo: &str) -> Result<RepositoryAccess> {
        path_segment(repo, "repository name")?;
        let repo_path = self.repo_path(repo);
        let teams_path = format!("{}/teams", repo_path);
        let collaborators_path = format!("{}/collaborators", repo_path);
        let members_path = format!("/orgs/{}/members", self.org);

        let (teams, collaborators, members) = try_join!(
            self.paginate::<Team>(&teams_path),
            self.paginate::<Collaborator>(&collaborators_path),
            self.paginate::<User>(&members_path)
        )?;

        let collaborator_logins: HashSet<&str> = collaborators
            .iter()
            .map(|collaborator| collaborator.user.login.as_str())
            .collect();
        let potential_collaborators = members
            .into_iter()
            .filter(|member| !collaborator_logins.contains(member.login.as_str()))
            .collect();

        let user_grants = collaborators.iter().map(|collaborator| RepositoryPermission::User {
            permission: collaborator.permission(),
            subject: collaborator.user.clone(),
        });
        let team_grants = teams.into_iter().map(|team| RepositoryPermission::Team {
            permission: team.permission,
            subject: Team {
                members_count: 0,
                repos_count: 0,
                ..team
            },
        });

        let permissions: Vec<RepositoryPermission> = user_grants.chain(team_grants).collect();
        for grant in &permissions {
            trace!("{} has {} access on {}", grant.subject_name(), grant.permission(), repo);
        }

        Ok(RepositoryAccess {
            permissions,
            potential_collaborators,
        })
    }

    /// Grants `permission` on `repo` to a user or a team, replacing any previous grant.
    pub async fn set_repository_permission(
        &self,
        repo: &str,
        subject_type: SubjectType,
        subject_name: &str,
        permission: Permission,
    ) -> Result<()> {
        path_segment(repo, "repository name")?;
        path_segment(subject_name, "user or team name")?;
        info!(
            "granting {} on {} to {:?} {}",
            permission, repo, subject_type, subject_name
        );

        match subject_type {
            SubjectType::User => {
                self.execute(
                    Method::Put,
                    &format!("{}/collaborators/{}", self.repo_path(repo), subject_name),
                    Some(json!({ "permission": permission.as_str() })),
                )
                .await
            }
            SubjectType::Team => {
                self.execute(
                    Method::Put,
                    &self.team_repo_path(subject_name, repo),
                    Some(json!({ "permission": permission.as_team_str() })),
                )
                .await
            }
        }
    }

    pub async fn remove_repository_permission(
        &self,
        repo: &str,
        subject_type: SubjectType,
        subject_name: &str,
    ) -> Result<()> {
        path_segment(repo, "repository name")?;
        path_segment(subject_name, "user or team name")?;
        info!(
            "revoking access on {} from {:?} {}",
            repo, subject_type, subject_name
        );

        let path = match subject_type {
            SubjectType::User => format!("{}/collaborators/{}", self.repo_path(repo), subject_name),
            SubjectType::Team => self.team_repo_path(subject_name, repo),
        };
        self.execute(Method::Delete, &path, None).await
    }

    pub async fn update_repository_description(
        &self,
        repo: &str,
        description: &str,
    ) -> Result<Repository> {
        path_segment(repo, "repository name")?;
        info!("updating description of {}", repo);

        self.send(
            Method::Patch,
            &self.repo_path(repo),
            json!({ "description": description }),
        )
        .await
    }

    /// Renames `old_name`. The new name isn't checked here, GitHub rejects invalid or taken
    /// names with a 422.
    pub async fn rename_repository(&self, old_name: &str, new_name: &str) -> Result<Repository> {
        path_segment(old_name, "repository name")?;
        require(new_name, "new repository name")?;
        info!("renaming {} to {}", old_name, new_name);

        self.send(
            Method::Patch,
            &self.repo_path(old_name),
            json!({ "name": new_name }),
        )
        .await
    }
}
