//! External configuration files: the per-document rename table and the
//! array-wrapper augmentation list.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::info;

use crate::error::{Error, Result};

/// `document title -> { original schema name -> replacement name }`.
pub type RenameTable = BTreeMap<String, BTreeMap<String, String>>;

/// Model names that should gain a `<Name>Array` wrapper even when no
/// response declares the bare-array shape.
#[derive(Debug, Default, Deserialize)]
#[serde(transparent)]
pub struct WrapperList(pub Vec<String>);

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let text = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    serde_json::from_str(&text).map_err(|e| Error::Config {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Load the rename table, or an empty table when no path was given.
pub fn load_rename_table(path: Option<&Path>) -> Result<RenameTable> {
    match path {
        Some(path) => {
            let table: RenameTable = read_json(path)?;
            info!(path = %path.display(), titles = table.len(), "loaded rename table");
            Ok(table)
        }
        None => Ok(RenameTable::new()),
    }
}

/// Load the wrapper list, or an empty list when no path was given.
pub fn load_wrapper_list(path: Option<&Path>) -> Result<Vec<String>> {
    match path {
        Some(path) => {
            let list: WrapperList = read_json(path)?;
            info!(path = %path.display(), entries = list.0.len(), "loaded array wrapper list");
            Ok(list.0)
        }
        None => Ok(Vec::new()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::io::Write as _;

    #[test]
    fn test_load_rename_table() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r##"{{ "Line": {{ "Tfl.Api.Presentation.Entities.Mode": "Mode" }} }}"##
        )
        .unwrap();
        let table = load_rename_table(Some(file.path())).unwrap();
        assert_eq!(
            table["Line"]["Tfl.Api.Presentation.Entities.Mode"],
            "Mode"
        );
    }

    #[test]
    fn test_missing_path_means_empty() {
        assert!(load_rename_table(None).unwrap().is_empty());
        assert!(load_wrapper_list(None).unwrap().is_empty());
    }

    #[test]
    fn test_malformed_config_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        let err = load_rename_table(Some(file.path())).unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_load_wrapper_list() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r##"["StopPoint", "Place"]"##).unwrap();
        let list = load_wrapper_list(Some(file.path())).unwrap();
        assert_eq!(list, vec!["StopPoint".to_string(), "Place".to_string()]);
    }
}
