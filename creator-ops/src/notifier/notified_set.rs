use std::{
    collections::BTreeSet,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use cja::Result;
use color_eyre::eyre::WrapErr;
use tokio::{fs, io::AsyncWriteExt};

/// Member ids that have already been sent the reminder, mirrored to a JSON
/// array on disk after every addition.
#[derive(Debug)]
pub(crate) struct NotifiedSet {
    path: PathBuf,
    ids: BTreeSet<u64>,
}

impl NotifiedSet {
    /// A missing file is an empty set, a file that isn't a JSON array of ids
    /// is an error.
    #[tracing::instrument(name = "NotifiedSet::load", err)]
    pub async fn load(path: &Path) -> Result<Self> {
        let ids = match fs::read(path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .wrap_err_with(|| format!("{} is not a JSON array of ids", path.display()))?,
            Err(err) if err.kind() == ErrorKind::NotFound => BTreeSet::new(),
            Err(err) => {
                return Err(err).wrap_err_with(|| format!("Couldn't read {}", path.display()))
            }
        };

        Ok(Self {
            path: path.to_path_buf(),
            ids,
        })
    }

    pub fn contains(&self, id: u64) -> bool {
        self.ids.contains(&id)
    }

    pub fn ids(&self) -> &BTreeSet<u64> {
        &self.ids
    }

    /// Records `id` and writes the whole set back to disk before returning.
    /// Returns `false` without touching disk if `id` was already recorded.
    #[tracing::instrument(name = "NotifiedSet::mark_notified", skip(self), fields(path = %self.path.display()), err)]
    pub async fn mark_notified(&mut self, id: u64) -> Result<bool> {
        if !self.ids.insert(id) {
            return Ok(false);
        }

        self.persist().await?;
        Ok(true)
    }

    async fn persist(&self) -> Result<()> {
        let json = serde_json::to_vec(&self.ids)?;

        // The file on disk is always a complete set
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        let mut file = fs::File::create(&tmp)
            .await
            .wrap_err_with(|| format!("Couldn't create {}", tmp.display()))?;
        file.write_all(&json).await?;
        file.sync_all().await?;
        drop(file);

        fs::rename(&tmp, &self.path)
            .await
            .wrap_err_with(|| format!("Couldn't replace {}", self.path.display()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();

        let set = NotifiedSet::load(&dir.path().join("sent.json")).await.unwrap();

        assert_eq!(set.ids().len(), 0);
    }

    #[tokio::test]
    async fn test_loads_existing_ids() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sent.json");
        std::fs::write(&path, "[1247307161512706159, 42]").unwrap();

        let set = NotifiedSet::load(&path).await.unwrap();

        assert!(set.contains(42));
        assert!(set.contains(1_247_307_161_512_706_159));
        assert!(!set.contains(7));
    }

    #[tokio::test]
    async fn test_garbage_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sent.json");
        std::fs::write(&path, "{\"not\": \"a list\"}").unwrap();

        assert!(NotifiedSet::load(&path).await.is_err());
    }

    #[tokio::test]
    async fn test_every_addition_hits_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sent.json");
        let mut set = NotifiedSet::load(&path).await.unwrap();

        assert!(set.mark_notified(5).await.unwrap());
        let on_disk: Vec<u64> = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(on_disk, vec![5]);

        assert!(set.mark_notified(3).await.unwrap());
        let on_disk: Vec<u64> = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(on_disk, vec![3, 5]);

        assert!(!dir.path().join("sent.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_repeat_addition_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sent.json");
        std::fs::write(&path, "[9]").unwrap();
        let mut set = NotifiedSet::load(&path).await.unwrap();

        assert!(!set.mark_notified(9).await.unwrap());
        assert_eq!(set.ids().len(), 1);
    }

    #[tokio::test]
    async fn test_reload_sees_previous_run() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sent.json");

        let mut first = NotifiedSet::load(&path).await.unwrap();
        first.mark_notified(1).await.unwrap();
        first.mark_notified(2).await.unwrap();

        let second = NotifiedSet::load(&path).await.unwrap();
        assert_eq!(second.ids(), first.ids());
    }
}
