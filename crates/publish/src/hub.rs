use bench_core::{BenchError, RepoId, Result, TOKEN_ENV_VAR};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, info};

pub const DEFAULT_ENDPOINT: &str = "https://huggingface.co";

/// Write credential for the hub.
#[derive(Clone)]
pub struct HubCredentials {
    token: String,
}

impl HubCredentials {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        match lookup(TOKEN_ENV_VAR) {
            Some(token) if !token.trim().is_empty() => Ok(Self {
                token: token.trim().to_string(),
            }),
            _ => Err(BenchError::MissingCredential { var: TOKEN_ENV_VAR }),
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }
}

impl std::fmt::Debug for HubCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("HubCredentials(***)")
    }
}

/// A remote versioned store that accepts single-file commits.
#[allow(async_fn_in_trait)]
pub trait DatasetStore {
    /// Credential used for pushes, if one was supplied.
    fn credential(&self) -> Option<&HubCredentials>;

    /// Commit `local_path` to the store. Returns the remote location.
    async fn publish_file(&self, local_path: &Path, commit_message: &str) -> Result<String>;
}

/// Dataset repository on the hub, driven through a local git/LFS working copy.
pub struct HubRepository {
    repo: RepoId,
    workdir: PathBuf,
    endpoint: String,
    credentials: Option<HubCredentials>,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct CreateRepoRequest<'a> {
    #[serde(rename = "type")]
    repo_type: &'a str,
    name: &'a str,
    organization: &'a str,
    private: bool,
}

impl HubRepository {
    pub fn new(repo: RepoId, workdir: PathBuf, credentials: Option<HubCredentials>) -> Self {
        Self {
            repo,
            workdir,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            credentials,
            client: reqwest::Client::new(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into().trim_end_matches('/').to_string();
        self
    }

    pub fn repo(&self) -> &RepoId {
        &self.repo
    }

    pub fn remote_url(&self) -> String {
        format!("{}/datasets/{}", self.endpoint, self.repo)
    }

    /// Local clone location.
    pub fn working_copy(&self) -> PathBuf {
        self.workdir.join(self.repo.name())
    }

    /// Create the remote repository; an existing one is fine.
    async fn ensure_remote(&self, credentials: &HubCredentials) -> Result<()> {
        let url = format!("{}/api/repos/create", self.endpoint);
        let request = CreateRepoRequest {
            repo_type: "dataset",
            name: self.repo.name(),
            organization: self.repo.owner(),
            private: false,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(credentials.token())
            .json(&request)
            .send()
            .await
            .map_err(|e| BenchError::Publish(format!("create repo request failed: {}", e)))?;

        let status = response.status();
        if status.is_success() || status == reqwest::StatusCode::CONFLICT {
            debug!(repo = %self.repo, %status, "Remote repository ready");
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(BenchError::Publish(format!(
                "create repo {} returned {}: {}",
                self.repo, status, body
            )))
        }
    }

    async fn sync_working_copy(&self, credentials: &HubCredentials) -> Result<PathBuf> {
        let working_copy = self.working_copy();

        if working_copy.join(".git").exists() {
            run_git(&working_copy, credentials, &["pull"]).await?;
        } else {
            tokio::fs::create_dir_all(&self.workdir)
                .await
                .map_err(|e| BenchError::file_access(&self.workdir, e))?;
            // Cloned relative to the workdir, so a relative workdir is not applied twice.
            run_git(
                &self.workdir,
                credentials,
                &["clone", &self.remote_url(), self.repo.name()],
            )
            .await?;
        }
        Ok(working_copy)
    }
}

impl DatasetStore for HubRepository {
    fn credential(&self) -> Option<&HubCredentials> {
        self.credentials.as_ref()
    }

    async fn publish_file(&self, local_path: &Path, commit_message: &str) -> Result<String> {
        let credentials = self
            .credentials
            .as_ref()
            .ok_or(BenchError::MissingCredential { var: TOKEN_ENV_VAR })?;

        let file_name = local_path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                BenchError::Publish(format!("{} has no file name", local_path.display()))
            })?
            .to_string();

        self.ensure_remote(credentials).await?;
        let working_copy = self.sync_working_copy(credentials).await?;

        // Copy rather than move so the local artifact survives a failed push.
        let destination = working_copy.join(&file_name);
        tokio::fs::copy(local_path, &destination)
            .await
            .map_err(|e| BenchError::file_access(local_path, e))?;

        run_git(&working_copy, credentials, &["lfs", "track", &file_name]).await?;
        run_git(&working_copy, credentials, &["add", ".gitattributes", &file_name]).await?;
        run_git(&working_copy, credentials, &["commit", "-m", commit_message]).await?;
        run_git(&working_copy, credentials, &["push"]).await?;

        let url = self.remote_url();
        info!(file = %file_name, %url, "Pushed artifact");
        Ok(url)
    }
}

async fn run_git(cwd: &Path, credentials: &HubCredentials, args: &[&str]) -> Result<()> {
    let auth_header = format!("http.extraHeader=Authorization: Bearer {}", credentials.token());

    let output = Command::new("git")
        .current_dir(cwd)
        .arg("-c")
        .arg(&auth_header)
        .args(args)
        .output()
        .await
        .map_err(|e| BenchError::Publish(format!("failed to run git {}: {}", args[0], e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(BenchError::Publish(format!(
            "git {} failed ({}): {}",
            args.join(" "),
            output.status,
            stderr.trim()
        )));
    }
    Ok(())
}
