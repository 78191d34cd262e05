//! `ISteamRemoteStorage/GetPublishedFileDetails` response types
//!
//! The Web API is inconsistent about numeric fields: ids and sizes come back
//! as strings or as numbers depending on the endpoint version.

use serde::{Deserialize, Deserializer, Serialize};

/// `result` value for a successful lookup (`k_EResultOK`).
pub const RESULT_OK: i32 = 1;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PublishedFileDetailsResponse {
    pub response: PublishedFileDetailsResult,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PublishedFileDetailsResult {
    pub result: i32,
    #[serde(rename = "resultcount")]
    pub result_count: u32,
    #[serde(rename = "publishedfiledetails")]
    pub details: Vec<PublishedFileDetails>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PublishedFileDetails {
    #[serde(rename = "publishedfileid", deserialize_with = "lenient_u64")]
    pub published_file_id: u64,
    pub result: i32,
    pub creator: String,
    pub creator_app_id: u32,
    pub consumer_app_id: u32,
    pub filename: String,
    #[serde(deserialize_with = "lenient_u64")]
    pub file_size: u64,
    pub file_url: String,
    pub hcontent_file: String,
    pub preview_url: String,
    pub hcontent_preview: String,
    pub title: String,
    pub description: String,
    pub time_created: u64,
    pub time_updated: u64,
    pub visibility: i32,
    pub banned: i32,
    pub ban_reason: String,
    pub subscriptions: u64,
    pub favorited: u64,
    pub lifetime_subscriptions: u64,
    pub lifetime_favorited: u64,
    pub views: u64,
    pub tags: Vec<Tag>,
}

impl PublishedFileDetails {
    pub fn is_ok(&self) -> bool {
        self.result == RESULT_OK
    }

    /// Download URL, if the item has a directly downloadable file.
    pub fn download_url(&self) -> Option<&str> {
        Some(self.file_url.as_str()).filter(|url| !url.is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tag {
    pub tag: String,
}

fn lenient_u64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Number(u64),
        String(String),
    }

    match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Number(n) => Ok(n),
        NumberOrString::String(s) if s.is_empty() => Ok(0),
        NumberOrString::String(s) => s.parse().map_err(serde::de::Error::custom),
    }
}
