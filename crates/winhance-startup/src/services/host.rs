use async_trait::async_trait;

use super::ServiceHost;
use crate::{config::AppDirs, error::ServiceError};

/// Prepares the per-user directories every other service writes into.
pub struct DefaultHost {
    dirs: AppDirs,
}

impl DefaultHost {
    pub fn new(dirs: AppDirs) -> Self {
        Self { dirs }
    }
}

#[async_trait]
impl ServiceHost for DefaultHost {
    async fn start(&self) -> Result<(), ServiceError> {
        for dir in [
            &self.dirs.config_dir,
            &self.dirs.data_dir,
            &self.dirs.cache_dir,
            &self.dirs.log_dir(),
        ] {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|error| ServiceError::context(format!("creating {}", dir.display()), error))?;
        }
        log::debug!("Application directories ready under {:?}", self.dirs.data_dir);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn start_creates_all_directories() {
        let temp = tempfile::tempdir().unwrap();
        let dirs = AppDirs::rooted_at(temp.path());
        DefaultHost::new(dirs.clone()).start().await.expect("host start");

        assert!(dirs.config_dir.is_dir());
        assert!(dirs.cache_dir.is_dir());
        assert!(dirs.log_dir().is_dir());
    }

    #[tokio::test]
    async fn start_fails_when_a_directory_is_a_file() {
        let temp = tempfile::tempdir().unwrap();
        let dirs = AppDirs::rooted_at(temp.path());
        std::fs::write(&dirs.config_dir, b"not a directory").unwrap();

        let error = DefaultHost::new(dirs).start().await.expect_err("should fail");
        assert!(error.to_string().starts_with("creating "));
    }
}
