//! Artifact packaging
//!
//! One emitted unit becomes a single-file artifact; several units are bundled
//! into a zip archive with a timestamped, collision-resistant name.

pub mod store;

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::{Cursor, Write};
use uuid::Uuid;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::emit::EmissionUnit;
use crate::error::{Error, Result};
use crate::utils::naming::{create_artifact_stem, random_suffix};

pub use store::{ArtifactStore, DirectoryStore, MemoryStore};

/// Length of the random part of generated names
pub const SUFFIX_LENGTH: usize = 10;

/// Content kind of an artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    SingleFile,
    Zip,
}

/// Final downloadable output of a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub file_name: String,
    pub content: Vec<u8>,
    pub kind: ArtifactKind,
}

/// Bundles emission units into artifacts
#[derive(Debug, Clone)]
pub struct Packager {
    archive_prefix: String,
}

impl Packager {
    pub fn new(archive_prefix: &str) -> Self {
        Self {
            archive_prefix: archive_prefix.to_string(),
        }
    }

    /// Package units in their given order
    pub fn package(&self, units: &[EmissionUnit], request_id: Uuid, now: DateTime<Utc>) -> Result<Artifact> {
        match units {
            [] => Err(Error::EmissionInvariantError(
                "No source units to package".to_string(),
            )),
            [unit] => {
                tracing::debug!(request_id = %request_id, file = %unit.file_name, "Packaged single file");
                Ok(Artifact {
                    file_name: unit.file_name.clone(),
                    content: unit.content.clone().into_bytes(),
                    kind: ArtifactKind::SingleFile,
                })
            }
            many => {
                let stem = create_artifact_stem(&self.archive_prefix, now, &random_suffix(SUFFIX_LENGTH));
                let file_name = format!("{}.zip", stem);
                let content = build_zip(many)?;
                tracing::debug!(
                    request_id = %request_id,
                    archive = %file_name,
                    entries = many.len(),
                    bytes = content.len(),
                    "Packaged zip archive"
                );
                Ok(Artifact {
                    file_name,
                    content,
                    kind: ArtifactKind::Zip,
                })
            }
        }
    }
}

/// Write units into an in-memory zip archive.
///
/// Entries carry a fixed timestamp so identical units give identical entries.
pub fn build_zip(units: &[EmissionUnit]) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    {
        let mut zip = ZipWriter::new(Cursor::new(&mut buffer));
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .last_modified_time(zip::DateTime::default())
            .unix_permissions(0o644);

        for unit in units {
            zip.start_file(unit.file_name.as_str(), options)?;
            zip.write_all(unit.content.as_bytes())?;
        }
        zip.finish()?;
    }
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use regex::Regex;
    use std::io::Read;

    fn unit(name: &str, content: &str) -> EmissionUnit {
        EmissionUnit {
            file_name: name.to_string(),
            content: content.to_string(),
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 8, 30, 0).unwrap()
    }

    #[test]
    fn test_zero_units_is_invariant_error() {
        let result = Packager::new("codegen").package(&[], Uuid::new_v4(), now());
        assert!(matches!(result, Err(Error::EmissionInvariantError(_))));
    }

    #[test]
    fn test_single_unit_is_plain_file() {
        let artifact = Packager::new("codegen")
            .package(&[unit("users.go", "package models\n")], Uuid::new_v4(), now())
            .unwrap();

        assert_eq!(artifact.kind, ArtifactKind::SingleFile);
        assert_eq!(artifact.file_name, "users.go");
        assert_eq!(artifact.content, b"package models\n");
    }

    #[test]
    fn test_several_units_are_zipped() {
        let units = [unit("a.py", "A = 1\n"), unit("b.py", "B = 2\n")];
        let artifact = Packager::new("codegen").package(&units, Uuid::new_v4(), now()).unwrap();

        assert_eq!(artifact.kind, ArtifactKind::Zip);
        let name_re = Regex::new(r"^codegen-20240501-083000-[a-z0-9]{10}\.zip$").unwrap();
        assert!(name_re.is_match(&artifact.file_name), "{}", artifact.file_name);

        let mut archive = zip::ZipArchive::new(Cursor::new(artifact.content)).unwrap();
        assert_eq!(archive.len(), 2);
        let mut second = String::new();
        archive.by_index(1).unwrap().read_to_string(&mut second).unwrap();
        assert_eq!(archive.by_index(0).unwrap().name(), "a.py");
        assert_eq!(second, "B = 2\n");
    }

    #[test]
    fn test_zip_bytes_are_reproducible() {
        let units = [unit("a.ts", "export {};\n"), unit("b.ts", "export {};\n")];
        assert_eq!(build_zip(&units).unwrap(), build_zip(&units).unwrap());
    }
}
