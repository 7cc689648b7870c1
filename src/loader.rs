use flate2::read::GzDecoder;
use log::{debug, info};
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("input file '{0}' was not found")]
    NotFound(PathBuf),
    #[error("an I/O error occurred while reading '{path}': {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// The whole input held in memory. Line 0 is a header and never reaches the workers.
#[derive(Debug)]
pub struct InputDocument {
    contents: String,
}

impl InputDocument {
    pub fn from_contents(contents: String) -> Self {
        Self { contents }
    }

    /// Every line after the first, in input order. The first line is skipped
    /// whatever it contains; a file made only of records needs a dummy first line.
    pub fn data_lines(&self) -> Vec<&str> {
        self.contents.split('\n').skip(1).collect()
    }
}

/// Reads the input in one go. Files ending in `.gz` are decompressed on the fly.
pub fn load_input(path: &Path) -> Result<InputDocument, LoadError> {
    let unreadable = |source: io::Error| {
        if source.kind() == io::ErrorKind::NotFound {
            LoadError::NotFound(path.to_path_buf())
        } else {
            LoadError::Unreadable { path: path.to_path_buf(), source }
        }
    };

    let file = File::open(path).map_err(unreadable)?;
    let mut contents = String::new();
    if path.extension().is_some_and(|ext| ext == "gz") {
        debug!("Reading gzip-compressed input {}", path.display());
        GzDecoder::new(file).read_to_string(&mut contents).map_err(unreadable)?;
    } else {
        let mut file = file;
        file.read_to_string(&mut contents).map_err(unreadable)?;
    }
    info!("Loaded {} bytes from {}", contents.len(), path.display());
    Ok(InputDocument::from_contents(contents))
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    #[test]
    fn first_line_is_dropped_even_when_it_is_data() {
        let doc = InputDocument::from_contents(
            "{\"text\":\"header looking record\"}\n{\"text\":\"a\"}\n\n{\"text\":\"b\"}".to_string(),
        );
        assert_eq!(doc.data_lines(), vec!["{\"text\":\"a\"}", "", "{\"text\":\"b\"}"]);
    }

    #[test]
    fn single_line_input_has_no_data() {
        assert!(InputDocument::from_contents("header".to_string()).data_lines().is_empty());
    }

    #[test]
    fn missing_file_is_reported_as_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_input(&dir.path().join("data.json")).unwrap_err();
        assert!(matches!(err, LoadError::NotFound(_)));
    }

    #[test]
    fn reads_plain_and_gzip_inputs() {
        let dir = tempfile::tempdir().unwrap();
        let body = "header\n{\"text\":\"ok\"}\n";

        let plain = dir.path().join("data.json");
        std::fs::write(&plain, body).unwrap();
        assert_eq!(load_input(&plain).unwrap().data_lines(), vec!["{\"text\":\"ok\"}", ""]);

        let gz = dir.path().join("data.json.gz");
        let mut encoder = GzEncoder::new(File::create(&gz).unwrap(), Compression::default());
        encoder.write_all(body.as_bytes()).unwrap();
        encoder.finish().unwrap();
        assert_eq!(load_input(&gz).unwrap().data_lines(), vec!["{\"text\":\"ok\"}", ""]);
    }

    #[test]
    fn invalid_utf8_is_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        std::fs::write(&path, [0x68, 0x0a, 0xff, 0xfe]).unwrap();
        assert!(matches!(load_input(&path), Err(LoadError::Unreadable { .. })));
    }
}
