use once_cell::sync::Lazy;
use regex::Regex;
use rocket::{serde::json::Json, FromForm, State};
use serde::Deserialize;

use crate::{
    aggregator::OrgDataAggregator,
    api::{done, ok, AccessToken, ApiMessage, ApiResult},
    config::OrgDeskConfig,
    error::Error,
    github::{GitHubApi, Permission, Repository, RepositoryAccess, SubjectType},
};

static REPOSITORY_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9._-]+$").expect("repository name pattern is valid"));

#[derive(Debug, FromForm)]
pub(crate) struct RepositoryFilter {
    #[field(name = "ownerOnly", default = false)]
    owner_only: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DescriptionChange {
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Rename {
    #[serde(default, rename = "newName")]
    new_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Grant {
    #[serde(default, rename = "type")]
    subject_type: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    permission: Option<String>,
}

impl RepositoryFilter {
    async fn list<C: GitHubApi>(
        &self,
        github: &OrgDataAggregator<C>,
    ) -> crate::error::Result<Vec<Repository>> {
        if self.owner_only {
            github.list_owner_only_repositories().await
        } else {
            github.list_org_repositories().await
        }
    }
}

fn is_valid_repository_name(name: &str) -> bool {
    REPOSITORY_NAME.is_match(name)
}

#[rocket::get("/api/repositories?<filter..>")]
pub(crate) async fn list_repositories(
    token: AccessToken,
    config: &State<OrgDeskConfig>,
    filter: RepositoryFilter,
) -> ApiResult<Vec<Repository>> {
    let github = token.aggregator(config)?;
    ok(filter.list(&github).await?)
}

#[rocket::get("/api/repositories/<repo>")]
pub(crate) async fn get_repository(
    token: AccessToken,
    config: &State<OrgDeskConfig>,
    repo: &str,
) -> ApiResult<Repository> {
    let github = token.aggregator(config)?;
    ok(github.get_repository(repo).await?)
}

async fn change_description(
    token: AccessToken,
    config: &State<OrgDeskConfig>,
    repo: &str,
    change: DescriptionChange,
) -> ApiResult<Repository> {
    let description = change
        .description
        .ok_or_else(|| Error::invalid_argument("description is required"))?;

    let github = token.aggregator(config)?;
    ok(github.update_repository_description(repo, &description).await?)
}

#[rocket::patch("/api/repositories/<repo>", format = "json", data = "<change>")]
pub(crate) async fn update_repository(
    token: AccessToken,
    config: &State<OrgDeskConfig>,
    repo: &str,
    change: Json<DescriptionChange>,
) -> ApiResult<Repository> {
    change_description(token, config, repo, change.into_inner()).await
}

#[rocket::put("/api/repositories/<repo>/description", format = "json", data = "<change>")]
pub(crate) async fn update_description(
    token: AccessToken,
    config: &State<OrgDeskConfig>,
    repo: &str,
    change: Json<DescriptionChange>,
) -> ApiResult<Repository> {
    change_description(token, config, repo, change.into_inner()).await
}

#[rocket::put("/api/repositories/<repo>", format = "json", data = "<rename>")]
pub(crate) async fn rename_repository(
    token: AccessToken,
    config: &State<OrgDeskConfig>,
    repo: &str,
    rename: Json<Rename>,
) -> ApiResult<Repository> {
    let new_name = rename.new_name.as_deref().unwrap_or_default().trim();
    if new_name.is_empty() {
        return Err(Error::invalid_argument("new repository name is required").into());
    }
    if !is_valid_repository_name(new_name) {
        return Err(Error::invalid_argument(format!(
            "`{}` isn't a valid repository name, only letters, digits, `.`, `-` and `_` are allowed",
            new_name
        ))
        .into());
    }

    let github = token.aggregator(config)?;
    ok(github.rename_repository(repo, new_name).await?)
}

#[rocket::get("/api/repositories/<repo>/permissions")]
pub(crate) async fn get_permissions(
    token: AccessToken,
    config: &State<OrgDeskConfig>,
    repo: &str,
) -> ApiResult<RepositoryAccess> {
    let github = token.aggregator(config)?;
    ok(github.get_repository_permissions(repo).await?)
}

#[rocket::put("/api/repositories/<repo>/permissions", format = "json", data = "<grant>")]
pub(crate) async fn set_permission(
    token: AccessToken,
    config: &State<OrgDeskConfig>,
    repo: &str,
    grant: Json<Grant>,
) -> ApiMessage {
    let subject_type: SubjectType = grant.subject_type.parse()?;
    let permission: Permission = grant
        .permission
        .as_deref()
        .ok_or_else(|| Error::invalid_argument("permission is required"))?
        .parse()?;

    let github = token.aggregator(config)?;
    github
        .set_repository_permission(repo, subject_type, &grant.name, permission)
        .await?;
    done("Permission updated successfully")
}

#[rocket::delete("/api/repositories/<repo>/permissions", format = "json", data = "<grant>")]
pub(crate) async fn remove_permission(
    token: AccessToken,
    config: &State<OrgDeskConfig>,
    repo: &str,
    grant: Json<Grant>,
) -> ApiMessage {
    let subject_type: SubjectType = grant.subject_type.parse()?;

    let github = token.aggregator(config)?;
    github
        .remove_repository_permission(repo, subject_type, &grant.name)
        .await?;
    done("Permission removed successfully")
}

#[cfg(test)]
mod tests {
    use rocket::{
        form::Form,
        http::{ContentType, Status},
    };
    use serde_json::Value;

    use super::{is_valid_repository_name, RepositoryFilter};
    use crate::{
        aggregator::{
            fixtures::{repository, team, ORG},
            OrgDataAggregator,
        },
        api::tests::{bearer, client},
        github::testing::MockGitHub,
    };

    fn names(repos: &[crate::github::Repository]) -> Vec<&str> {
        repos.iter().map(|r| r.name.as_str()).collect()
    }

    #[tokio::test]
    async fn owner_only_query_selects_the_listing() {
        let mock = MockGitHub::new();
        mock.set_collection(
            "/orgs/prologin/repos",
            vec![repository(1, "lonely"), repository(2, "shared")],
        );
        mock.set_collection("/repos/prologin/lonely/teams", vec![]);
        mock.set_collection(
            "/repos/prologin/shared/teams",
            vec![team(1, "orga", Some("push"))],
        );
        let github = OrgDataAggregator::new(mock, ORG).unwrap();

        let owner_only = Form::<RepositoryFilter>::parse("ownerOnly=true").unwrap();
        assert!(owner_only.owner_only);
        let repos = owner_only.list(&github).await.unwrap();
        assert_eq!(names(&repos), vec!["lonely"]);

        for query in ["", "ownerOnly=false"] {
            let all = Form::<RepositoryFilter>::parse(query).unwrap();
            assert!(!all.owner_only, "{}", query);
            let repos = all.list(&github).await.unwrap();
            assert_eq!(names(&repos), vec!["lonely", "shared"]);
        }
    }

    #[rocket::async_test]
    async fn grant_names_cannot_escape_the_collaborator_path() {
        let client = client().await;

        for body in [
            r#"{"type": "user", "name": "../../../../orgs/prologin"}"#,
            r#"{"type": "team", "name": "../../../../orgs/prologin"}"#,
            r#"{"type": "user", "name": "%2e%2e"}"#,
        ] {
            let response = client
                .delete("/api/repositories/site/permissions")
                .header(bearer())
                .header(ContentType::JSON)
                .body(body)
                .dispatch()
                .await;
            assert_eq!(response.status(), Status::BadRequest, "{}", body);
        }
    }

    #[test]
    fn repository_names() {
        for name in ["site", "stechec2", "prologin.org", "camp_2024", "gcc-plugins"] {
            assert!(is_valid_repository_name(name), "{}", name);
        }
        for name in ["", "my repo", "site/www", "café", "a;b"] {
            assert!(!is_valid_repository_name(name), "{}", name);
        }
    }

    #[rocket::async_test]
    async fn invalid_new_name_is_a_bad_request() {
        let client = client().await;

        let response = client
            .put("/api/repositories/site")
            .header(bearer())
            .header(ContentType::JSON)
            .body(r#"{"newName": "new site!"}"#)
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::BadRequest);

        let body: Value = response.into_json().await.unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Invalid request");
    }

    #[rocket::async_test]
    async fn rename_checks_token_first() {
        let client = client().await;

        let response = client
            .put("/api/repositories/site")
            .header(ContentType::JSON)
            .body(r#"{"newName": "new site!"}"#)
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Unauthorized);
    }

    #[rocket::async_test]
    async fn grants_are_validated_locally() {
        let client = client().await;

        for body in [
            r#"{"type": "user", "name": "alice", "permission": "owner"}"#,
            r#"{"type": "group", "name": "orga", "permission": "read"}"#,
            r#"{"type": "team", "name": "orga"}"#,
            r#"{"type": "user", "name": "", "permission": "write"}"#,
        ] {
            let response = client
                .put("/api/repositories/site/permissions")
                .header(bearer())
                .header(ContentType::JSON)
                .body(body)
                .dispatch()
                .await;
            assert_eq!(response.status(), Status::BadRequest, "{}", body);
        }
    }
}
