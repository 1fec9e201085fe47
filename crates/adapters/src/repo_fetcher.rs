// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Git repository fetcher: resolves a branch to a commit and checks out a
//! study repository into the repo cache, called as a blocking operation by
//! the Job Definition Builder.

use std::path::{Path, PathBuf};

use git2::{FetchOptions, RemoteCallbacks, Repository};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepoFetchError {
    #[error("git operation failed: {0}")]
    Git(#[from] git2::Error),
    #[error("branch {branch} not found in {repo_url}")]
    BranchNotFound { repo_url: String, branch: String },
}

/// Fetches (or reuses a cached clone of) a study repository and resolves a
/// branch to the commit it currently points at.
#[derive(Clone)]
pub struct GitRepoFetcher {
    cache_root: PathBuf,
    access_token: Option<String>,
}

impl GitRepoFetcher {
    pub fn new(cache_root: impl Into<PathBuf>, access_token: Option<String>) -> Self {
        Self {
            cache_root: cache_root.into(),
            access_token,
        }
    }

    fn local_path(&self, repo_name: &str) -> PathBuf {
        self.cache_root.join(repo_name)
    }

    fn fetch_options(&self) -> FetchOptions<'_> {
        let mut callbacks = RemoteCallbacks::new();
        if let Some(token) = &self.access_token {
            let token = token.clone();
            callbacks.credentials(move |_url, _username, _allowed| {
                git2::Cred::userpass_plaintext(&token, "x-oauth-basic")
            });
        }
        let mut options = FetchOptions::new();
        options.remote_callbacks(callbacks);
        options.download_tags(git2::AutotagOption::None);
        options
    }

    /// Ensures a local (partial, bare-ok) clone of `repo_url` exists at
    /// `<cache_root>/<repo_name>`, fetching the latest refs.
    pub fn sync(&self, repo_name: &str, repo_url: &str) -> Result<PathBuf, RepoFetchError> {
        let path = self.local_path(repo_name);

        let repo = if path.join(".git").exists() || path.join("HEAD").exists() {
            Repository::open(&path)?
        } else {
            std::fs::create_dir_all(&path).map_err(|e| {
                git2::Error::from_str(&format!("failed to create {}: {e}", path.display()))
            })?;
            Repository::clone(repo_url, &path)?
        };

        let mut remote = repo
            .find_remote("origin")
            .or_else(|_| repo.remote("origin", repo_url))?;
        remote.fetch(
            &["refs/heads/*:refs/remotes/origin/*"],
            Some(&mut self.fetch_options()),
            None,
        )?;

        Ok(path)
    }

    /// Resolves `branch` against the freshly-fetched remote refs, returning
    /// the commit SHA it currently points at.
    pub fn resolve_commit(
        &self,
        repo_name: &str,
        repo_url: &str,
        branch: &str,
    ) -> Result<String, RepoFetchError> {
        let local_path = self.sync(repo_name, repo_url)?;
        let repo = Repository::open(&local_path)?;

        let reference = repo
            .find_reference(&format!("refs/remotes/origin/{branch}"))
            .map_err(|_| RepoFetchError::BranchNotFound {
                repo_url: repo_url.to_string(),
                branch: branch.to_string(),
            })?;

        let commit = reference.peel_to_commit()?;
        Ok(commit.id().to_string())
    }

    /// Checks out the repository at `repo_name` at `commit_sha` into
    /// `target_dir`, used by the Agent's `prepare` step to stage the study
    /// code a job's container runs against.
    pub fn checkout_commit(
        &self,
        repo_name: &str,
        commit_sha: &str,
        target_dir: &Path,
    ) -> Result<(), RepoFetchError> {
        let local_path = self.local_path(repo_name);
        let repo = Repository::open(&local_path)?;
        let commit = repo.find_commit(git2::Oid::from_str(commit_sha)?)?;
        let tree = commit.tree()?;

        std::fs::create_dir_all(target_dir).map_err(|e| {
            git2::Error::from_str(&format!("failed to create {}: {e}", target_dir.display()))
        })?;

        let mut checkout_builder = git2::build::CheckoutBuilder::new();
        checkout_builder.target_dir(target_dir).force();
        repo.checkout_tree(tree.as_object(), Some(&mut checkout_builder))?;

        Ok(())
    }
}

#[cfg(test)]
#[path = "repo_fetcher_tests.rs"]
mod tests;
