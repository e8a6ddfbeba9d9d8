
use std::fs::{File, create_dir_all};
use std::io::{BufReader, BufWriter};
use std::path::Path;

use super::error::*;

///
/// Serde derives, re-exported so that downstream crates share one version.
///
pub use serde::{Serialize, Deserialize};

///
/// Writes the given value to the given path as JSON, creating the parent
/// directory if it is missing.
///
pub fn save_to_file<T> (value: & T, path: & Path) -> Result<()>
where T : Serialize
{
    if let Some(parent) = path.parent()
    {
        create_dir_all(parent).context(format!("Failed to create directory '{}'.", parent.display()))?;
    }

    let file = File::create(path).context(format!("Failed to create file '{}'.", path.display()))?;
    serde_json::to_writer(BufWriter::new(file), value).context(format!("Failed to serialize to '{}'.", path.display()))?;

    Ok(())
}

///
/// Reads a value of the given type back from a JSON file.
///
pub fn load_from_file<T> (path: & Path) -> Result<T>
where T : serde::de::DeserializeOwned
{
    let file = File::open(path).context(format!("Failed to open file '{}'.", path.display()))?;
    let value = serde_json::from_reader(BufReader::new(file)).context(format!("Failed to deserialize from '{}'.", path.display()))?;

    Ok(value)
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Blob
    {
        steps: usize,
        values: Vec<f32>
    }

    #[test]
    fn round_trips_through_json ()
    {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/blob.json");

        let blob = Blob { steps: 42, values: vec![0.5, -1.25, 3.0] };
        save_to_file(& blob, & path).unwrap();

        let loaded : Blob = load_from_file(& path).unwrap();
        assert_eq!(blob, loaded);
    }

    #[test]
    fn load_of_missing_file_fails ()
    {
        let result : Result<Blob> = load_from_file(Path::new("does/not/exist.json"));
        assert!(result.is_err());
    }
}
