use rocket::{serde::json::Json, State};
use serde::Deserialize;

use crate::{
    api::{done, ok, AccessToken, ApiMessage, ApiResult},
    config::OrgDeskConfig,
    github::{OrgRole, OrganizationMember},
};

#[derive(Debug, Deserialize)]
pub(crate) struct NewMember {
    username: String,
    #[serde(default)]
    role: OrgRole,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RoleChange {
    role: OrgRole,
}

#[rocket::get("/api/members")]
pub(crate) async fn list_members(
    token: AccessToken,
    config: &State<OrgDeskConfig>,
) -> ApiResult<Vec<OrganizationMember>> {
    let github = token.aggregator(config)?;
    ok(github.list_members().await?)
}

#[rocket::post("/api/members", format = "json", data = "<member>")]
pub(crate) async fn add_member(
    token: AccessToken,
    config: &State<OrgDeskConfig>,
    member: Json<NewMember>,
) -> ApiMessage {
    let github = token.aggregator(config)?;
    github.add_member(&member.username, member.role).await?;
    done("Member invited successfully")
}

#[rocket::patch("/api/members/<username>", format = "json", data = "<change>")]
pub(crate) async fn update_member_role(
    token: AccessToken,
    config: &State<OrgDeskConfig>,
    username: &str,
    change: Json<RoleChange>,
) -> ApiMessage {
    let github = token.aggregator(config)?;
    github.update_member_role(username, change.role).await?;
    done("Member role updated successfully")
}

#[rocket::delete("/api/members/<username>")]
pub(crate) async fn remove_member(
    token: AccessToken,
    config: &State<OrgDeskConfig>,
    username: &str,
) -> ApiMessage {
    let github = token.aggregator(config)?;
    github.remove_member(username).await?;
    done("Member removed successfully")
}
