//! Reqwest-backed client for the FTB modpack catalogue.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;

use crate::hosting::ports::{
    ModpackDescriptor, ModpackSource, ModpackSourceError, ModpackSourceResult, ModpackVersion,
};

#[derive(Debug, Deserialize)]
struct PopularPacksDto {
    packs: Vec<u64>,
}

#[derive(Debug, Deserialize)]
struct PackDto {
    id: u64,
    name: String,
    #[serde(default)]
    versions: Vec<PackVersionDto>,
}

#[derive(Debug, Deserialize)]
struct PackVersionDto {
    id: u64,
    name: String,
}

/// Modpack source that reads the public FTB catalogue over HTTP.
#[derive(Debug, Clone)]
pub struct FtbModpackSource {
    client: Client,
    base_url: Url,
}

impl FtbModpackSource {
    /// Builds a source rooted at `base_url` (for example
    /// `https://api.modpacks.ch/public/modpack/`).
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base_url })
    }

    async fn get_json(&self, path: &str) -> ModpackSourceResult<Vec<u8>> {
        let url = self
            .base_url
            .join(path)
            .map_err(|err| ModpackSourceError::Decode(format!("invalid catalogue path: {err}")))?;
        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(ModpackSourceError::transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(map_status_error(status));
        }
        let body = response
            .bytes()
            .await
            .map_err(ModpackSourceError::transport)?;
        Ok(body.to_vec())
    }
}

#[async_trait]
impl ModpackSource for FtbModpackSource {
    async fn popular_pack_ids(&self, limit: usize) -> ModpackSourceResult<Vec<u64>> {
        let body = self
            .get_json(&format!("popular/installs/FTB/{limit}"))
            .await?;
        parse_popular(&body)
    }

    async fn fetch_pack(&self, id: u64) -> ModpackSourceResult<ModpackDescriptor> {
        let body = self.get_json(&id.to_string()).await?;
        parse_pack(&body)
    }
}

fn parse_popular(body: &[u8]) -> ModpackSourceResult<Vec<u64>> {
    let decoded: PopularPacksDto = serde_json::from_slice(body)
        .map_err(|err| ModpackSourceError::Decode(format!("invalid popular list: {err}")))?;
    Ok(decoded.packs)
}

fn parse_pack(body: &[u8]) -> ModpackSourceResult<ModpackDescriptor> {
    let decoded: PackDto = serde_json::from_slice(body)
        .map_err(|err| ModpackSourceError::Decode(format!("invalid modpack payload: {err}")))?;
    // The catalogue lists versions oldest first.
    let latest_version = decoded
        .versions
        .into_iter()
        .last()
        .map(|version| ModpackVersion {
            id: version.id,
            name: version.name,
        });
    Ok(ModpackDescriptor {
        id: decoded.id,
        name: decoded.name,
        latest_version,
    })
}

const fn map_status_error(status: StatusCode) -> ModpackSourceError {
    ModpackSourceError::Status {
        status: status.as_u16(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn popular_list_preserves_catalogue_order() {
        let body = br#"{"packs": [35, 79, 7], "status": "success"}"#;
        let ids = parse_popular(body).expect("popular list should decode");
        assert_eq!(ids, vec![35, 79, 7]);
    }

    #[test]
    fn pack_uses_last_listed_version_as_latest() {
        let body = br#"{
            "id": 35,
            "name": "FTB Revelation",
            "versions": [
                {"id": 100, "name": "3.4.0"},
                {"id": 2061, "name": "3.6.0"}
            ]
        }"#;

        let pack = parse_pack(body).expect("pack should decode");
        assert_eq!(pack.name, "FTB Revelation");
        assert_eq!(
            pack.latest_version,
            Some(ModpackVersion {
                id: 2061,
                name: "3.6.0".to_owned(),
            })
        );
    }

    #[test]
    fn pack_without_versions_has_no_latest_version() {
        let body = br#"{"id": 1, "name": "Empty"}"#;
        let pack = parse_pack(body).expect("pack should decode");
        assert!(pack.latest_version.is_none());
    }

    #[test]
    fn malformed_payloads_map_to_decode_errors() {
        let error = parse_pack(b"not json").expect_err("decode should fail");
        assert!(matches!(error, ModpackSourceError::Decode(_)));
    }

    #[test]
    fn non_success_statuses_keep_their_code() {
        let error = map_status_error(StatusCode::SERVICE_UNAVAILABLE);
        assert!(matches!(error, ModpackSourceError::Status { status: 503 }));
    }
}
