//! Local entity models

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// A link between a local entity and its identity in one remote registry.
///
/// A local entity carries at most one stash id per endpoint; matching code
/// relies on that invariant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StashId {
    pub endpoint: String,
    pub stash_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Gender {
    Male,
    Female,
    Intersex,
    TransgenderMale,
    TransgenderFemale,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "MALE",
            Gender::Female => "FEMALE",
            Gender::Intersex => "INTERSEX",
            Gender::TransgenderMale => "TRANSGENDER_MALE",
            Gender::TransgenderFemale => "TRANSGENDER_FEMALE",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Gender {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "MALE" => Ok(Gender::Male),
            "FEMALE" => Ok(Gender::Female),
            "INTERSEX" => Ok(Gender::Intersex),
            "TRANSGENDER_MALE" => Ok(Gender::TransgenderMale),
            "TRANSGENDER_FEMALE" => Ok(Gender::TransgenderFemale),
            other => Err(Error::InvalidInput(format!("unknown gender: {other}"))),
        }
    }
}

/// A locally catalogued scene
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub id: i64,
    pub title: Option<String>,
    pub details: Option<String>,
    pub url: Option<String>,
    pub date: Option<NaiveDate>,
    /// Duration in seconds
    pub duration: Option<f64>,
    /// Video height in pixels
    pub height: Option<i64>,
    pub video_codec: Option<String>,
    /// MD5 of the file content, lowercase hex
    pub checksum: Option<String>,
    /// OpenSubtitles-style hash, lowercase hex
    pub oshash: Option<String>,
    /// 64-bit perceptual hash of a representative frame
    pub phash: Option<i64>,
    /// Whether an interactive script accompanies the scene
    pub interactive: bool,
    pub studio_id: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Performer {
    pub id: i64,
    pub name: String,
    pub gender: Option<Gender>,
    pub url: Option<String>,
    /// Twitter handle, not a URL
    pub twitter: Option<String>,
    /// Instagram handle, not a URL
    pub instagram: Option<String>,
    pub birthdate: Option<NaiveDate>,
    pub ethnicity: Option<String>,
    pub country: Option<String>,
    pub eye_color: Option<String>,
    pub hair_color: Option<String>,
    pub height: Option<String>,
    pub measurements: Option<String>,
    pub fake_tits: Option<String>,
    pub career_length: Option<String>,
    pub tattoos: Option<String>,
    pub piercings: Option<String>,
    pub aliases: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Studio {
    pub id: i64,
    pub name: String,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub id: i64,
    pub name: String,
}
