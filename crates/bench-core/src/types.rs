use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::BenchError;

/// Hue reported for an image in which no face was detected.
pub const NO_FACE_HUE: f64 = -1.0;

/// One serialized row of a generated-image dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedRecord {
    pub image: Vec<u8>, // PNG bytes
    pub prompt: String,
    pub uuid: String,
}

/// Face bounding box in pixel coordinates, origin at the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaceRegion {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Demographics {
    pub race: String,
    pub gender: String,
}

/// Per-row output of the face analysis pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub hue: f64,
    pub face: Option<FaceRegion>,
    pub race: String,
    pub gender: String,
}

impl AnalysisRecord {
    /// Record for a row where nothing could be measured.
    pub fn empty() -> Self {
        Self {
            hue: NO_FACE_HUE,
            face: None,
            race: String::new(),
            gender: String::new(),
        }
    }

    pub fn has_face(&self) -> bool {
        self.face.is_some()
    }
}

/// Remote dataset repository coordinate in `owner/name` form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RepoId {
    owner: String,
    name: String,
}

impl RepoId {
    pub fn parse(value: &str) -> Result<Self, BenchError> {
        let mut parts = value.split('/');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(owner), Some(name), None) if !owner.is_empty() && !name.is_empty() => Ok(Self {
                owner: owner.to_string(),
                name: name.to_string(),
            }),
            _ => Err(BenchError::InvalidConfig(format!(
                "dataset repo must look like owner/name, got {:?}",
                value
            ))),
        }
    }

    pub(crate) fn from_parts(owner: &str, name: &str) -> Self {
        Self {
            owner: owner.to_string(),
            name: name.to_string(),
        }
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

impl FromStr for RepoId {
    type Err = BenchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for RepoId {
    type Error = BenchError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<RepoId> for String {
    fn from(value: RepoId) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repo_id_parse() {
        let repo = RepoId::parse("ririye/Benchmark-Images").unwrap();
        assert_eq!(repo.owner(), "ririye");
        assert_eq!(repo.name(), "Benchmark-Images");
        assert_eq!(repo.to_string(), "ririye/Benchmark-Images");
    }

    #[test]
    fn test_repo_id_rejects_malformed() {
        for bad in ["", "name-only", "/name", "owner/", "a/b/c"] {
            assert!(RepoId::parse(bad).is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn test_empty_analysis_record() {
        let record = AnalysisRecord::empty();
        assert_eq!(record.hue, NO_FACE_HUE);
        assert!(!record.has_face());
        assert!(record.race.is_empty() && record.gender.is_empty());
    }
}
