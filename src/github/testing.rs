//! In-memory stand-in for the GitHub API used by unit tests.

use std::{collections::HashMap, sync::Mutex};

use async_trait::async_trait;
use serde_json::Value;

use crate::{
    error::{Error, Result},
    github::{GitHubApi, Method},
};

#[derive(Debug, Clone, PartialEq)]
pub struct SentRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
}

#[derive(Default)]
struct State {
    collections: HashMap<String, Vec<Value>>,
    resources: HashMap<String, Value>,
    failures: HashMap<String, u16>,
    gets: Vec<(String, Vec<(String, String)>)>,
    sent: Vec<SentRequest>,
}

/// Serves paged collections and single resources keyed by path.
///
/// Mutations are applied to single resources: `PUT`/`PATCH`/`POST` merge the body's fields into
/// the resource at that path (creating it if needed), `DELETE` removes it.
#[derive(Default)]
pub struct MockGitHub {
    state: Mutex<State>,
}

impl MockGitHub {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn set_collection(&self, path: &str, items: Vec<Value>) {
        let mut state = self.state.lock().unwrap();
        state.collections.insert(path.to_owned(), items);
    }

    pub fn set_resource(&self, path: &str, value: Value) {
        let mut state = self.state.lock().unwrap();
        state.resources.insert(path.to_owned(), value);
    }

    /// Every request on `path` will fail with `status`.
    pub fn fail(&self, path: &str, status: u16) {
        let mut state = self.state.lock().unwrap();
        state.failures.insert(path.to_owned(), status);
    }

    pub fn get_count(&self, path: &str) -> usize {
        self.queries(path).len()
    }

    pub fn queries(&self, path: &str) -> Vec<Vec<(String, String)>> {
        let state = self.state.lock().unwrap();
        state
            .gets
            .iter()
            .filter(|(p, _)| p == path)
            .map(|(_, query)| query.clone())
            .collect()
    }

    pub fn sent(&self) -> Vec<SentRequest> {
        self.state.lock().unwrap().sent.clone()
    }
}

fn query_number(query: &[(&str, String)], key: &str, default: usize) -> usize {
    query
        .iter()
        .find(|(k, _)| *k == key)
        .and_then(|(_, v)| v.parse().ok())
        .unwrap_or(default)
}

#[async_trait]
impl GitHubApi for MockGitHub {
    async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<Value> {
        let mut state = self.state.lock().unwrap();
        state.gets.push((
            path.to_owned(),
            query
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        ));

        if let Some(status) = state.failures.get(path) {
            return Err(Error::upstream(*status, "mock failure"));
        }

        if let Some(items) = state.collections.get(path) {
            let page = query_number(query, "page", 1).max(1);
            let per_page = query_number(query, "per_page", 30);
            let page_items = items
                .iter()
                .skip((page - 1) * per_page)
                .take(per_page)
                .cloned()
                .collect();
            return Ok(Value::Array(page_items));
        }

        state
            .resources
            .get(path)
            .cloned()
            .ok_or_else(|| Error::upstream(404, "Not Found"))
    }

    async fn send(&self, method: Method, path: &str, body: Option<Value>) -> Result<Option<Value>> {
        let mut state = self.state.lock().unwrap();
        state.sent.push(SentRequest {
            method,
            path: path.to_owned(),
            body: body.clone(),
        });

        if let Some(status) = state.failures.get(path) {
            return Err(Error::upstream(*status, "mock failure"));
        }

        match method {
            Method::Delete => {
                state.resources.remove(path);
                Ok(None)
            }
            _ => {
                let resource = state
                    .resources
                    .entry(path.to_owned())
                    .or_insert_with(|| Value::Object(Default::default()));
                if let (Value::Object(target), Some(Value::Object(fields))) = (resource, body) {
                    target.extend(fields);
                }
                Ok(state.resources.get(path).cloned())
            }
        }
    }
}
