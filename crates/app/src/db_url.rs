use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub enum DbUrlError {
    Invalid { raw: String },
}

impl fmt::Display for DbUrlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DbUrlError::Invalid { raw } => write!(f, "invalid --db value: {raw}"),
        }
    }
}

impl std::error::Error for DbUrlError {}

fn is_in_memory(url: &str) -> bool {
    url == "sqlite::memory:" || url.contains("mode=memory")
}

/// Turn `sqlite:` URLs and bare paths into absolute `sqlite://` URLs so the
/// database does not depend on the working directory of later calls.
///
/// # Errors
///
/// Returns `DbUrlError::Invalid` for a blank value.
pub fn normalize_sqlite_url(raw: &str) -> Result<String, DbUrlError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(DbUrlError::Invalid {
            raw: raw.to_string(),
        });
    }
    if is_in_memory(trimmed) {
        return Ok(trimmed.to_string());
    }

    let path_str = trimmed
        .strip_prefix("sqlite://")
        .or_else(|| trimmed.strip_prefix("sqlite:"))
        .unwrap_or(trimmed);
    let (path_str, query) = match path_str.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (path_str, None),
    };
    if path_str.is_empty() {
        return Err(DbUrlError::Invalid {
            raw: raw.to_string(),
        });
    }

    let path = Path::new(path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    Ok(match query {
        Some(query) => format!("sqlite://{}?{query}", absolute.display()),
        None => format!("sqlite://{}", absolute.display()),
    })
}

/// Create the database file and its directory so `SQLite` can open it.
///
/// # Errors
///
/// Returns an error if the URL has no path or the file cannot be created.
pub fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if is_in_memory(db_url) {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| DbUrlError::Invalid {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(DbUrlError::Invalid {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_paths_become_absolute() {
        let url = normalize_sqlite_url("sqlite://lessons.sqlite3").unwrap();
        let path = url.strip_prefix("sqlite://").unwrap();
        assert!(Path::new(path).is_absolute(), "{url}");
        assert!(url.ends_with("lessons.sqlite3"));
    }

    #[test]
    fn absolute_and_memory_urls_are_kept() {
        assert_eq!(
            normalize_sqlite_url("sqlite:///tmp/x.db").unwrap(),
            "sqlite:///tmp/x.db"
        );
        assert_eq!(
            normalize_sqlite_url("sqlite::memory:").unwrap(),
            "sqlite::memory:"
        );
        assert_eq!(
            normalize_sqlite_url("/tmp/y.db?mode=rwc").unwrap(),
            "sqlite:///tmp/y.db?mode=rwc"
        );
    }

    #[test]
    fn blank_url_is_rejected() {
        assert!(normalize_sqlite_url("  ").is_err());
        assert!(prepare_sqlite_file("postgres://x").is_err());
    }
}
