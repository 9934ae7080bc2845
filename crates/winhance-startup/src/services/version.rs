use std::{path::PathBuf, str::FromStr};

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Url;
use serde::Deserialize;
use tokio::{io::AsyncWriteExt, sync::Mutex};
use winhance_bridge::results::VersionInfo;

use super::VersionService;
use crate::error::ServiceError;

#[derive(Debug, Deserialize)]
struct ReleaseAsset {
    name: String,
    browser_download_url: String,
}

#[derive(Debug, Deserialize)]
struct Release {
    tag_name: String,
    #[serde(default)]
    assets: Vec<ReleaseAsset>,
}

/// Picks the installer asset from a release; executables and MSI packages
/// are preferred over anything else.
fn pick_installer(assets: &[ReleaseAsset]) -> Option<&ReleaseAsset> {
    assets
        .iter()
        .find(|asset| {
            let name = asset.name.to_ascii_lowercase();
            name.ends_with(".exe") || name.ends_with(".msi")
        })
        .or_else(|| assets.first())
}

/// Parses a release tag such as `v25.05.01` or `1.4.0`. Calendar-style tags
/// with leading zeros are normalized before parsing.
fn parse_release_version(tag: &str) -> Option<semver::Version> {
    let trimmed = tag.trim().trim_start_matches(['v', 'V']);
    if let Ok(version) = semver::Version::parse(trimmed) {
        return Some(version);
    }
    let parts: Vec<u64> = trimmed
        .split('.')
        .map(|part| part.parse::<u64>())
        .collect::<Result<_, _>>()
        .ok()?;
    match parts.as_slice() {
        [major] => Some(semver::Version::new(*major, 0, 0)),
        [major, minor] => Some(semver::Version::new(*major, *minor, 0)),
        [major, minor, patch] => Some(semver::Version::new(*major, *minor, *patch)),
        _ => None,
    }
}

/// Compares the running version against a release feed.
fn evaluate_release(current_version: &str, release: &Release) -> VersionInfo {
    let latest = parse_release_version(&release.tag_name);
    let current = parse_release_version(current_version);
    let update_available = match (latest, current) {
        (Some(latest), Some(current)) => latest > current,
        _ => false,
    };

    VersionInfo {
        update_available,
        version: release.tag_name.trim_start_matches(['v', 'V']).to_string(),
        download_url: pick_installer(&release.assets).map(|asset| asset.browser_download_url.clone()),
    }
}

/// Version service backed by a GitHub "latest release" endpoint.
pub struct GithubVersionService {
    current_version: String,
    feed_url: String,
    download_dir: PathBuf,
    request_client: reqwest::Client,
    latest: Mutex<Option<VersionInfo>>,
}

impl GithubVersionService {
    pub fn new(
        current_version: impl Into<String>,
        feed_url: impl Into<String>,
        download_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            current_version: current_version.into(),
            feed_url: feed_url.into(),
            download_dir: download_dir.into(),
            request_client: reqwest::Client::new(),
            latest: Mutex::new(None),
        }
    }
}

#[async_trait]
impl VersionService for GithubVersionService {
    fn current_version(&self) -> String {
        self.current_version.clone()
    }

    async fn check_for_update(&self) -> Result<VersionInfo, ServiceError> {
        let release: Release = self
            .request_client
            .get(&self.feed_url)
            .header(reqwest::header::USER_AGENT, "Winhance")
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let info = evaluate_release(&self.current_version, &release);
        *self.latest.lock().await = Some(info.clone());
        Ok(info)
    }

    async fn download_and_install_update(&self) -> Result<(), ServiceError> {
        let cached = self.latest.lock().await.clone();
        let info = match cached {
            Some(info) => info,
            None => self.check_for_update().await?,
        };
        let download_url = info
            .download_url
            .as_deref()
            .ok_or_else(|| ServiceError::failed("latest release has no installer asset"))?;
        let download_url = Url::from_str(download_url)
            .map_err(|error| ServiceError::context("invalid installer URL", error))?;
        let file_name = download_url
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .filter(|name| !name.is_empty())
            .unwrap_or("WinhanceInstaller.exe")
            .to_string();

        tokio::fs::create_dir_all(&self.download_dir).await?;
        let save_path = self.download_dir.join(&file_name);
        log::info!("Downloading update {} from {download_url}, saving to {save_path:?}", info.version);

        let response = self
            .request_client
            .get(download_url)
            .send()
            .await?
            .error_for_status()?;
        let total_bytes = response.content_length().unwrap_or(0);
        let mut downloaded_bytes = 0u64;
        let mut output_file = tokio::fs::File::options()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&save_path)
            .await?;

        let mut body = response.bytes_stream();
        while let Some(chunk) = body.next().await {
            let current_chunk = chunk?;
            output_file.write_all(&current_chunk).await?;
            downloaded_bytes += current_chunk.len() as u64;
            log::debug!("Update download progress: {downloaded_bytes}/{total_bytes} bytes");
        }
        output_file.sync_all().await?;
        drop(output_file);

        log::info!("Launching installer {save_path:?}");
        std::process::Command::new(&save_path)
            .spawn()
            .map_err(|error| ServiceError::context(format!("launching {}", save_path.display()), error))?;
        Ok(())
    }
}
