use crate::error::CliError;
use crate::model::{default_db, Db, DB_VERSION};
use std::fs;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

/// Handle on the JSON document holding users, the session, habits and
/// completions. Constructed once in `main` and passed to each command.
#[derive(Debug, Clone)]
pub struct Store {
    path: PathBuf,
}

/// Removes the lock file when the update finishes, success or not.
struct WriteLock {
    path: PathBuf,
}

impl Drop for WriteLock {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            tracing::warn!(path = %self.path.display(), error = %e, "failed to release lock");
        }
    }
}

fn io_err(context: &str, e: impl std::fmt::Display) -> CliError {
    tracing::error!(error = %e, "{}", context);
    CliError::io("DB IO error")
}

fn validate_db_shape(db: &Db) -> Result<(), CliError> {
    if db.version != DB_VERSION {
        return Err(CliError::io("DB corrupted"));
    }
    Ok(())
}

impl Store {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing file reads as an empty document.
    pub fn read(&self) -> Result<Db, CliError> {
        match fs::read_to_string(&self.path) {
            Ok(txt) => {
                let db: Db = serde_json::from_str(&txt).map_err(|e| {
                    tracing::error!(path = %self.path.display(), error = %e, "unparsable db");
                    CliError::io("DB corrupted")
                })?;
                validate_db_shape(&db)?;
                Ok(db)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "no db yet, starting empty");
                Ok(default_db())
            }
            Err(e) => Err(io_err("read db", e)),
        }
    }

    /// Read-modify-write under an exclusive lock file. The mutator's error
    /// aborts the write and leaves the document untouched.
    pub fn update<R>(
        &self,
        mutator: impl FnOnce(&mut Db) -> Result<R, CliError>,
    ) -> Result<R, CliError> {
        self.ensure_parent_dir()?;
        let _lock = self.acquire_lock()?;

        let mut db = self.read()?;
        let out = mutator(&mut db)?;
        validate_db_shape(&db)?;
        self.write(&db)?;
        Ok(out)
    }

    fn parent_dir(&self) -> &Path {
        self.path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."))
    }

    fn ensure_parent_dir(&self) -> Result<(), CliError> {
        let dir = self.parent_dir();
        fs::create_dir_all(dir).map_err(|e| io_err("create data dir", e))?;

        #[cfg(unix)]
        {
            let _ = fs::set_permissions(dir, fs::Permissions::from_mode(0o700));
        }

        Ok(())
    }

    fn acquire_lock(&self) -> Result<WriteLock, CliError> {
        let lock_path = PathBuf::from(format!("{}.lock", self.path.display()));

        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&lock_path)
        {
            Ok(_file) => {
                #[cfg(unix)]
                {
                    let _ = fs::set_permissions(&lock_path, fs::Permissions::from_mode(0o600));
                }
                Ok(WriteLock { path: lock_path })
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                tracing::warn!(lock = %lock_path.display(), "db lock already held");
                Err(CliError::io("DB is locked"))
            }
            Err(e) => Err(io_err("create lock", e)),
        }
    }

    fn write(&self, db: &Db) -> Result<(), CliError> {
        let dir = self.parent_dir();
        let tmp_path = dir.join(format!(".db.json.tmp.{}", std::process::id()));
        let data = serde_json::to_string_pretty(db).map_err(|e| io_err("encode db", e))? + "\n";

        {
            let mut f = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&tmp_path)
                .map_err(|e| io_err("open temp file", e))?;

            #[cfg(unix)]
            {
                let _ = f.set_permissions(fs::Permissions::from_mode(0o600));
            }

            f.write_all(data.as_bytes())
                .map_err(|e| io_err("write temp file", e))?;
            f.sync_all().map_err(|e| io_err("sync temp file", e))?;
        }

        fs::rename(&tmp_path, &self.path).map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            io_err("replace db", e)
        })?;

        tracing::debug!(
            path = %self.path.display(),
            habits = db.habits.len(),
            completions = db.completions.len(),
            "db written"
        );
        Ok(())
    }
}
