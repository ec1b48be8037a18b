//! Pull-request endpoints.

use reqwest::Method;
use serde::Serialize;

use crate::openapi::client::{ApiClient, ApiError};
use crate::openapi::types::{
    ChangedFile, Commit, Issue, MergeResult, OperationLog, PullRequest, PullRequestUpdate,
};

/// Pull-request operations for a repository, borrowed from an [`ApiClient`].
///
/// Every call returns `Ok(None)` when GitCode answers 404.
#[derive(Debug, Clone, Copy)]
pub struct PullRequests<'a> {
    client: &'a ApiClient,
}

#[derive(Serialize)]
struct MergeRequestBody<'a> {
    merge_method: &'a str,
}

fn pulls_path(owner: &str, repo: &str, number: &str) -> String {
    format!("repos/{}/{}/pulls/{}", owner, repo, number)
}

impl<'a> PullRequests<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// `GET repos/{owner}/{repo}/pulls/{number}`
    pub async fn get_pull_request(
        &self,
        owner: &str,
        repo: &str,
        number: &str,
    ) -> Result<Option<PullRequest>, ApiError> {
        let req = self
            .client
            .request(Method::GET, &pulls_path(owner, repo, number))?;
        self.client.send(req).await
    }

    /// `PATCH repos/{owner}/{repo}/pulls/{number}`
    pub async fn update_pull_request(
        &self,
        owner: &str,
        repo: &str,
        number: &str,
        update: &PullRequestUpdate,
    ) -> Result<Option<PullRequest>, ApiError> {
        let req = self
            .client
            .request(Method::PATCH, &pulls_path(owner, repo, number))?
            .json(update);
        self.client.send(req).await
    }

    /// `GET repos/{owner}/{repo}/pulls/{number}/issues`
    pub async fn list_linking_issues(
        &self,
        owner: &str,
        repo: &str,
        number: &str,
    ) -> Result<Option<Vec<Issue>>, ApiError> {
        let path = format!("{}/issues", pulls_path(owner, repo, number));
        let req = self.client.request(Method::GET, &path)?;
        self.client.send(req).await
    }

    /// `GET repos/{owner}/{repo}/pulls/{number}/commits`
    pub async fn list_commits(
        &self,
        owner: &str,
        repo: &str,
        number: &str,
    ) -> Result<Option<Vec<Commit>>, ApiError> {
        let path = format!("{}/commits", pulls_path(owner, repo, number));
        let req = self.client.request(Method::GET, &path)?;
        self.client.send(req).await
    }

    /// `GET repos/{owner}/{repo}/pulls/{number}/files`
    pub async fn list_changed_files(
        &self,
        owner: &str,
        repo: &str,
        number: &str,
    ) -> Result<Option<Vec<ChangedFile>>, ApiError> {
        let path = format!("{}/files", pulls_path(owner, repo, number));
        let req = self.client.request(Method::GET, &path)?;
        self.client.send(req).await
    }

    /// `GET repos/{owner}/{repo}/pulls/{number}/operate_logs?sort=&page=`
    pub async fn list_operation_logs(
        &self,
        owner: &str,
        repo: &str,
        number: &str,
        sort: &str,
        page: &str,
    ) -> Result<Option<Vec<OperationLog>>, ApiError> {
        let path = format!("{}/operate_logs", pulls_path(owner, repo, number));
        let req = self
            .client
            .request(Method::GET, &path)?
            .query(&[("sort", sort), ("page", page)]);
        self.client.send(req).await
    }

    /// `PUT repos/{owner}/{repo}/pulls/{number}/merge`
    ///
    /// `merge_method` is one of `merge`, `squash` or `rebase`.
    pub async fn merge_pull_request(
        &self,
        owner: &str,
        repo: &str,
        number: &str,
        merge_method: &str,
    ) -> Result<Option<MergeResult>, ApiError> {
        let path = format!("{}/merge", pulls_path(owner, repo, number));
        let req = self
            .client
            .request(Method::PUT, &path)?
            .json(&MergeRequestBody { merge_method });
        self.client.send(req).await
    }
}
