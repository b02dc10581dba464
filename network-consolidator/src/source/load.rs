//! Reading batch files from disk.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::error::SourceError;
use super::types::SourceFile;

/// Load one JSON batch file.
pub fn load_source_file(path: impl AsRef<Path>) -> Result<SourceFile, SourceError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| SourceError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let parsed: SourceFile =
        serde_json::from_reader(BufReader::new(file)).map_err(|source| SourceError::Json {
            path: path.to_path_buf(),
            source,
        })?;

    debug!(
        path = %path.display(),
        stops = parsed.stops.len(),
        routes = parsed.routes.len(),
        trips = parsed.trips.len(),
        "Loaded batch file"
    );
    Ok(parsed)
}

/// Load every `.json` file in a directory, ordered by file name.
pub fn load_source_dir(dir: impl AsRef<Path>) -> Result<Vec<SourceFile>, SourceError> {
    let dir = dir.as_ref();
    let io_err = |source| SourceError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut paths: Vec<PathBuf> = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        if path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("json") {
            paths.push(path);
        }
    }
    paths.sort();

    paths.iter().map(load_source_file).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const MINIMAL: &str = r#"{
        "name": "north",
        "epoch": { "start": "2024-03-01", "day_count": 4 },
        "stops": [
            { "nodeId": 1, "stopId": 1, "name": "Depot", "x": 14.0, "y": 50.0,
              "tariffId": null, "calendar": "1111" }
        ],
        "trips": [
            { "line": 10, "trip": 1, "graphId": 1, "calendar": "1100",
              "stopTimes": [
                { "nodeId": 1, "stopId": 1, "departure": "08:00" }
              ] }
        ]
    }"#;

    fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        let mut file = File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn load_minimal_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "north.json", MINIMAL);

        let file = load_source_file(&path).unwrap();
        assert_eq!(file.name, "north");
        assert_eq!(file.epoch.day_count, 4);
        assert_eq!(file.stops.len(), 1);
        assert_eq!(file.stops[0].x, Some(14.0));
        assert!(file.routes.is_empty());
        assert_eq!(file.trips[0].stop_times[0].arrival, None);
        assert_eq!(file.trips[0].stop_times[0].departure.as_deref(), Some("08:00"));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_source_file(dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, SourceError::Io { .. }));
    }

    #[test]
    fn malformed_file_is_json_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "bad.json", "{ \"name\": 3 }");
        let err = load_source_file(&path).unwrap_err();
        assert!(matches!(err, SourceError::Json { .. }));
    }

    #[test]
    fn directory_loads_json_files_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "b.json", &MINIMAL.replace("north", "second"));
        write_file(dir.path(), "a.json", MINIMAL);
        write_file(dir.path(), "notes.txt", "ignored");

        let files = load_source_dir(dir.path()).unwrap();
        let names: Vec<_> = files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["north", "second"]);
    }
}
