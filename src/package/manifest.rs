use serde::{Deserialize, Serialize};

use crate::error::LoadError;

/// One virtual file inside the package blob, `[start, end)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestEntry {
    pub filename: String,
    #[serde(alias = "start")]
    pub start_offset: u64,
    #[serde(alias = "end")]
    pub end_offset: u64,
    #[serde(default, alias = "crunched", deserialize_with = "flag")]
    pub is_compressed: bool,
    #[serde(default, alias = "audio")]
    pub is_audio: bool,
}

impl ManifestEntry {
    pub fn new(filename: impl Into<String>, start_offset: u64, end_offset: u64) -> Self {
        Self {
            filename: filename.into(),
            start_offset,
            end_offset,
            is_compressed: false,
            is_audio: false,
        }
    }

    pub fn len(&self) -> u64 {
        self.end_offset.saturating_sub(self.start_offset)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check that the range is well formed and lies inside a blob of `blob_len` bytes.
    pub fn check_bounds(&self, blob_len: u64) -> Result<(), LoadError> {
        if self.start_offset > self.end_offset {
            return Err(LoadError::malformed(format!(
                "{}: start {} after end {}",
                self.filename, self.start_offset, self.end_offset
            )));
        }
        if self.end_offset > blob_len {
            return Err(LoadError::malformed(format!(
                "{}: range [{}, {}) exceeds package length {}",
                self.filename, self.start_offset, self.end_offset, blob_len
            )));
        }
        Ok(())
    }
}

/// Ordered list of virtual files produced at packaging time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Manifest {
    entries: Vec<ManifestEntry>,
}

impl Manifest {
    pub fn new(entries: Vec<ManifestEntry>) -> Self {
        Self { entries }
    }

    /// Manifest exposing the whole package as a single file.
    pub fn single(filename: impl Into<String>, size: u64) -> Self {
        Self::new(vec![ManifestEntry::new(filename, 0, size)])
    }

    pub fn entries(&self) -> &[ManifestEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// Packagers emit the compression flag either as a bool or as 0/1.
fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(u64),
    }

    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => b,
        Flag::Int(n) => n != 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifest_accepts_packager_field_names() {
        let raw = r#"[
            {"filename": "/game.love", "crunched": 0, "start": 0, "end": 1000, "audio": false},
            {"filename": "/music.ogg", "startOffset": 1000, "endOffset": 1500, "isCompressed": true, "isAudio": true}
        ]"#;
        let manifest: Manifest = serde_json::from_str(raw).unwrap();
        assert_eq!(manifest.len(), 2);

        let first = &manifest.entries()[0];
        assert_eq!(first.filename, "/game.love");
        assert_eq!(first.len(), 1000);
        assert!(!first.is_compressed);

        let second = &manifest.entries()[1];
        assert_eq!(second.start_offset, 1000);
        assert!(second.is_compressed);
        assert!(second.is_audio);
    }

    #[test]
    fn test_check_bounds() {
        assert!(ManifestEntry::new("/a", 0, 10).check_bounds(10).is_ok());
        assert!(ManifestEntry::new("/empty", 10, 10).check_bounds(10).is_ok());
        assert!(matches!(
            ManifestEntry::new("/a", 0, 11).check_bounds(10),
            Err(LoadError::MalformedData(_))
        ));
        assert!(matches!(
            ManifestEntry::new("/a", 5, 4).check_bounds(10),
            Err(LoadError::MalformedData(_))
        ));
    }
}
