use serde::de::DeserializeOwned;
use tracing::{debug, trace};

use crate::{error::Result, github::GitHubApi};

/// Fetches every page of a list endpoint and concatenates them in order.
///
/// Pages are requested with `per_page` and `page` until one comes back shorter than `per_page`.
/// Any failing page aborts the whole listing.
pub async fn paginate<T, C>(
    api: &C,
    path: &str,
    query: &[(&str, String)],
    per_page: u32,
) -> Result<Vec<T>>
where
    T: DeserializeOwned,
    C: GitHubApi + ?Sized,
{
    let mut items = Vec::new();
    let mut page = 1u32;

    loop {
        let mut params = query.to_vec();
        params.push(("per_page", per_page.to_string()));
        params.push(("page", page.to_string()));

        trace!("fetching page {} of {}", page, path);
        let value = api.get(path, &params).await?;
        let batch: Vec<T> = serde_json::from_value(value)?;
        let len = batch.len();
        items.extend(batch);

        if len < per_page as usize {
            break;
        }
        page += 1;
    }

    debug!("fetched {} items from {} in {} pages", items.len(), path, page);
    Ok(items)
}
