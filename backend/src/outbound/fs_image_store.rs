//! Filesystem-backed [`ImageStore`].
//!
//! Files live directly under the configured upload directory, opened once as
//! a capability so every write stays inside it. Names are
//! `<unix-nanos>.<ext>`; a clash within the same nanosecond moves on to the
//! next free value. The directory is expected to be served at
//! `<public_base_url>/uploads/`.

use std::io::{ErrorKind, Write as _};
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use cap_std::fs::{Dir, OpenOptions};
use cap_std::ambient_authority;
use mockable::Clock;
use tracing::{debug, warn};

use crate::domain::ImageUpload;
use crate::domain::ports::{ImageStore, ImageStoreError, StoredImage};

const NAME_ATTEMPTS: i64 = 16;

/// Upload directory adapter.
#[derive(Clone)]
pub struct FsImageStore {
    dir: Arc<Dir>,
    public_base_url: String,
    clock: Arc<dyn Clock>,
}

impl FsImageStore {
    /// Open (creating if needed) `upload_dir` and publish files under
    /// `public_base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`ImageStoreError::Io`] when the directory cannot be created or
    /// opened.
    pub fn open(
        upload_dir: &Path,
        public_base_url: &str,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ImageStoreError> {
        Dir::create_ambient_dir_all(upload_dir, ambient_authority()).map_err(|err| {
            ImageStoreError::io(format!("create {}: {err}", upload_dir.display()))
        })?;
        let dir = Dir::open_ambient_dir(upload_dir, ambient_authority()).map_err(|err| {
            ImageStoreError::io(format!("open {}: {err}", upload_dir.display()))
        })?;
        Ok(Self {
            dir: Arc::new(dir),
            public_base_url: public_base_url.trim_end_matches('/').to_owned(),
            clock,
        })
    }

    fn public_url(&self, file_name: &str) -> String {
        format!("{}/uploads/{file_name}", self.public_base_url)
    }
}

/// Write `bytes` to the first free `<nanos + n>.<extension>` name.
fn write_unique(
    dir: &Dir,
    nanos: i64,
    extension: &str,
    bytes: &[u8],
) -> Result<String, ImageStoreError> {
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    for attempt in 0..NAME_ATTEMPTS {
        let file_name = format!("{}.{extension}", nanos.saturating_add(attempt));
        match dir.open_with(&file_name, &options) {
            Ok(mut file) => {
                file.write_all(bytes)
                    .and_then(|()| file.sync_all())
                    .map_err(|err| ImageStoreError::io(format!("write {file_name}: {err}")))?;
                return Ok(file_name);
            }
            Err(err) if err.kind() == ErrorKind::AlreadyExists => continue,
            Err(err) => return Err(ImageStoreError::io(format!("create {file_name}: {err}"))),
        }
    }
    Err(ImageStoreError::io("no free upload file name"))
}

#[async_trait]
impl ImageStore for FsImageStore {
    async fn save(&self, upload: &ImageUpload) -> Result<StoredImage, ImageStoreError> {
        let nanos = self
            .clock
            .utc()
            .timestamp_nanos_opt()
            .ok_or_else(|| ImageStoreError::io("clock outside the representable range"))?;
        let dir = Arc::clone(&self.dir);
        let extension = upload.kind().extension();
        let bytes = upload.bytes().to_vec();
        let file_name =
            tokio::task::spawn_blocking(move || write_unique(&dir, nanos, extension, &bytes))
                .await
                .map_err(|err| ImageStoreError::io(format!("upload task failed: {err}")))??;
        debug!(%file_name, len = upload.bytes().len(), "image stored");
        Ok(StoredImage {
            url: self.public_url(&file_name),
            file_name,
        })
    }

    async fn remove(&self, file_name: &str) -> Result<(), ImageStoreError> {
        let dir = Arc::clone(&self.dir);
        let name = file_name.to_owned();
        let result = tokio::task::spawn_blocking(move || dir.remove_file(&name))
            .await
            .map_err(|err| ImageStoreError::io(format!("remove task failed: {err}")))?;
        match result {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                warn!(file_name, "image already gone");
                Ok(())
            }
            Err(err) => Err(ImageStoreError::io(format!("remove {file_name}: {err}"))),
        }
    }
}
