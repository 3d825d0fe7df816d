//! Small JSON documents persisted with atomic replace.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use serde::{Serialize, de::DeserializeOwned};
use tracing::debug;

use crate::error::{ProviderError, ProviderResult};

/// Reads `path`, returning `T::default()` when the file does not exist yet.
pub(crate) fn read_or_default<T>(path: &Path) -> ProviderResult<T>
where
    T: DeserializeOwned + Default,
{
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "store file missing, starting empty");
            return Ok(T::default());
        }
        Err(e) => {
            return Err(
                ProviderError::storage(format!("failed to read {}", path.display())).with_source(e)
            );
        }
    };

    if content.trim().is_empty() {
        return Ok(T::default());
    }

    serde_json::from_str(&content).map_err(|e| {
        ProviderError::storage(format!("failed to parse {}", path.display())).with_source(e)
    })
}

/// Writes `value` to a sibling temp file, then renames it over `path`.
/// The result is readable by the owner only.
pub(crate) fn write_atomic<T: Serialize>(path: &Path, value: &T) -> ProviderResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|e| {
            ProviderError::storage(format!("failed to create {}", parent.display())).with_source(e)
        })?;
    }

    let content = serde_json::to_string_pretty(value)
        .map_err(|e| ProviderError::internal("failed to serialize store").with_source(e))?;

    let temp_path = path.with_extension("json.tmp");
    fs::write(&temp_path, content).map_err(|e| {
        ProviderError::storage(format!("failed to write {}", temp_path.display())).with_source(e)
    })?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&temp_path, fs::Permissions::from_mode(0o600)).map_err(|e| {
            ProviderError::storage(format!("failed to restrict {}", temp_path.display()))
                .with_source(e)
        })?;
    }

    fs::rename(&temp_path, path).map_err(|e| {
        ProviderError::storage(format!("failed to replace {}", path.display())).with_source(e)
    })?;

    debug!(path = %path.display(), "store file written");
    Ok(())
}
