//! Thin client for the GitCode v5 REST API.
//!
//! Only the pull-request endpoints the bot needs are covered. Calls are
//! issued once; there is no retry, pagination or rate limiting.

pub mod client;
pub mod pull_requests;
pub mod types;

pub use client::{ApiClient, ApiError};
pub use pull_requests::PullRequests;
pub use types::{
    Branch, ChangedFile, Commit, CommitAuthor, CommitDetail, Issue, Label, MergeResult,
    OperationLog, PullRequest, PullRequestUpdate, User,
};
