use crate::error::AppError;
use crate::model::TaskCollection;
use crate::storage::{Persistence, decode, encode};
use log::debug;
use std::path::{Path, PathBuf};

const APP_DIR_NAME: &str = "taskmaster";
const STORE_FILE_NAME: &str = "tasks.json";
const STORE_ENV_VAR: &str = "TASKMASTER_STORE_PATH";

/// Directory holding the task file and the configuration by default.
pub fn app_dir() -> Result<PathBuf, AppError> {
    if cfg!(windows) {
        let appdata =
            std::env::var("APPDATA").map_err(|_| AppError::invalid_data("APPDATA is not set"))?;
        Ok(PathBuf::from(appdata).join(APP_DIR_NAME))
    } else {
        let home = std::env::var("HOME").map_err(|_| AppError::invalid_data("HOME is not set"))?;
        Ok(PathBuf::from(home).join(".config").join(APP_DIR_NAME))
    }
}

pub fn store_path() -> Result<PathBuf, AppError> {
    if let Ok(path) = std::env::var(STORE_ENV_VAR)
        && !path.trim().is_empty()
    {
        return Ok(PathBuf::from(path));
    }

    Ok(app_dir()?.join(STORE_FILE_NAME))
}

/// Slot backed by a JSON file, replaced wholesale on every save.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn from_env() -> Result<Self, AppError> {
        Ok(Self::new(store_path()?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn replace_with(&self, temp_path: &Path) -> Result<(), AppError> {
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(temp_path, permissions)?;
        }

        std::fs::rename(temp_path, &self.path)?;
        Ok(())
    }
}

impl Persistence for JsonFileStore {
    fn load(&self) -> Result<Option<TaskCollection>, AppError> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&self.path)
            .map_err(|err| AppError::io(format!("{}: {}", self.path.display(), err)))?;
        decode(&content)
            .map(Some)
            .map_err(|err| AppError::invalid_data(format!("{}: {}", self.path.display(), err.message())))
    }

    fn save(&self, collection: &TaskCollection) -> Result<(), AppError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let content = encode(collection)?;
        let temp_path = self.path.with_extension("json.tmp");
        let written = std::fs::write(&temp_path, content)
            .map_err(AppError::from)
            .and_then(|()| self.replace_with(&temp_path));
        if let Err(err) = written {
            std::fs::remove_file(&temp_path).ok();
            return Err(err);
        }

        debug!(
            "saved {} tasks to {}",
            collection.len(),
            self.path.display()
        );
        Ok(())
    }
}
