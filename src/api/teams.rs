use rocket::{serde::json::Json, State};
use serde::Deserialize;

use crate::{
    api::{done, ok, AccessToken, ApiMessage, ApiResult},
    config::OrgDeskConfig,
    github::{
        Permission, Repository, SubjectType, Team, TeamMember, TeamPrivacy, TeamRole, TeamUpdate,
    },
};

#[derive(Debug, Deserialize)]
pub(crate) struct NewTeamRequest {
    #[serde(default)]
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    privacy: TeamPrivacy,
}

#[derive(Debug, Deserialize)]
pub(crate) struct NewTeamMember {
    #[serde(default)]
    username: String,
    #[serde(default)]
    role: TeamRole,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PermissionLevel {
    #[serde(default)]
    permission: Option<String>,
}

#[rocket::get("/api/teams")]
pub(crate) async fn list_teams(
    token: AccessToken,
    config: &State<OrgDeskConfig>,
) -> ApiResult<Vec<Team>> {
    let github = token.aggregator(config)?;
    ok(github.list_teams().await?)
}

#[rocket::post("/api/teams", format = "json", data = "<team>")]
pub(crate) async fn create_team(
    token: AccessToken,
    config: &State<OrgDeskConfig>,
    team: Json<NewTeamRequest>,
) -> ApiResult<Team> {
    let github = token.aggregator(config)?;
    let team = github
        .create_team(&team.name, team.description.as_deref(), team.privacy)
        .await?;
    ok(team)
}

#[rocket::get("/api/teams/<slug>")]
pub(crate) async fn get_team(
    token: AccessToken,
    config: &State<OrgDeskConfig>,
    slug: &str,
) -> ApiResult<Team> {
    let github = token.aggregator(config)?;
    ok(github.get_team_detail(slug).await?)
}

#[rocket::patch("/api/teams/<slug>", format = "json", data = "<update>")]
pub(crate) async fn update_team(
    token: AccessToken,
    config: &State<OrgDeskConfig>,
    slug: &str,
    update: Json<TeamUpdate>,
) -> ApiResult<Team> {
    let github = token.aggregator(config)?;
    ok(github.update_team(slug, update.into_inner()).await?)
}

#[rocket::delete("/api/teams/<slug>")]
pub(crate) async fn delete_team(
    token: AccessToken,
    config: &State<OrgDeskConfig>,
    slug: &str,
) -> ApiMessage {
    let github = token.aggregator(config)?;
    github.delete_team(slug).await?;
    done("Team deleted successfully")
}

#[rocket::get("/api/teams/<slug>/members")]
pub(crate) async fn list_team_members(
    token: AccessToken,
    config: &State<OrgDeskConfig>,
    slug: &str,
) -> ApiResult<Vec<TeamMember>> {
    let github = token.aggregator(config)?;
    ok(github.list_team_members(slug).await?)
}

#[rocket::post("/api/teams/<slug>/members", format = "json", data = "<member>")]
pub(crate) async fn add_team_member(
    token: AccessToken,
    config: &State<OrgDeskConfig>,
    slug: &str,
    member: Json<NewTeamMember>,
) -> ApiMessage {
    let github = token.aggregator(config)?;
    github
        .add_team_member(slug, &member.username, member.role)
        .await?;
    done("Member added to team successfully")
}

#[rocket::delete("/api/teams/<slug>/members?<username>")]
pub(crate) async fn remove_team_member(
    token: AccessToken,
    config: &State<OrgDeskConfig>,
    slug: &str,
    username: Option<&str>,
) -> ApiMessage {
    let github = token.aggregator(config)?;
    github
        .remove_team_member(slug, username.unwrap_or_default())
        .await?;
    done("Member removed from team successfully")
}

#[rocket::get("/api/teams/<slug>/repositories")]
pub(crate) async fn list_team_repositories(
    token: AccessToken,
    config: &State<OrgDeskConfig>,
    slug: &str,
) -> ApiResult<Vec<Repository>> {
    let github = token.aggregator(config)?;
    ok(github.list_team_repositories(slug).await?)
}

#[rocket::put("/api/teams/<slug>/repositories/<repo>", format = "json", data = "<level>")]
pub(crate) async fn set_team_repository(
    token: AccessToken,
    config: &State<OrgDeskConfig>,
    slug: &str,
    repo: &str,
    level: Json<PermissionLevel>,
) -> ApiMessage {
    let permission: Permission = level.permission.as_deref().unwrap_or("pull").parse()?;

    let github = token.aggregator(config)?;
    github
        .set_repository_permission(repo, SubjectType::Team, slug, permission)
        .await?;
    done("Repository access granted to team")
}

#[rocket::delete("/api/teams/<slug>/repositories/<repo>")]
pub(crate) async fn remove_team_repository(
    token: AccessToken,
    config: &State<OrgDeskConfig>,
    slug: &str,
    repo: &str,
) -> ApiMessage {
    let github = token.aggregator(config)?;
    github
        .remove_repository_permission(repo, SubjectType::Team, slug)
        .await?;
    done("Repository access removed from team")
}
