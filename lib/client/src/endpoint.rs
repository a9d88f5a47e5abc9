//! URL builders for SeaTable endpoints.
//!
//! API gateway routes live under
//! `{server}/api-gateway/api/v2/dtables/{base_uuid}/`; attachment links and
//! uploads use the older `api/v2.1` and `seafhttp` routes on the same server.

use crate::config::ConnectionConfig;
use crate::error::TransportError;
use reqwest::Url;

fn gateway(config: &ConnectionConfig, resource: &str) -> String {
    format!(
        "{}/api-gateway/api/v2/dtables/{}/{resource}/",
        config.server(),
        config.base_uuid()
    )
}

/// SQL endpoint.
#[must_use]
pub fn sql_url(config: &ConnectionConfig) -> String {
    gateway(config, "sql")
}

/// Row list/append/update/delete endpoint.
#[must_use]
pub fn rows_url(config: &ConnectionConfig) -> String {
    gateway(config, "rows")
}

/// Single row endpoint.
#[must_use]
pub fn row_url(config: &ConnectionConfig, row_id: &str) -> String {
    gateway(config, &format!("rows/{row_id}"))
}

/// Link add/update/remove endpoint.
#[must_use]
pub fn links_url(config: &ConnectionConfig) -> String {
    gateway(config, "links")
}

/// Base metadata endpoint.
#[must_use]
pub fn metadata_url(config: &ConnectionConfig) -> String {
    gateway(config, "metadata")
}

/// Column listing endpoint.
#[must_use]
pub fn columns_url(config: &ConnectionConfig) -> String {
    gateway(config, "columns")
}

/// View listing endpoint.
#[must_use]
pub fn views_url(config: &ConnectionConfig) -> String {
    gateway(config, "views")
}

/// Endpoint returning a one-time upload link.
#[must_use]
pub fn upload_link_url(config: &ConnectionConfig) -> String {
    format!("{}/api/v2.1/dtable/app-upload-link/", config.server())
}

/// File server upload endpoint for a link obtained from [`upload_link_url`].
#[must_use]
pub fn upload_api_url(config: &ConnectionConfig, upload_link: &str) -> String {
    format!(
        "{}/seafhttp/upload-api/{upload_link}?ret-json=1",
        config.server()
    )
}

/// Endpoint returning a download link for a file path inside the base.
///
/// # Errors
///
/// Returns an error if the server URL is not a valid URL.
pub fn download_link_url(config: &ConnectionConfig, path: &str) -> Result<String, TransportError> {
    with_query(
        &format!("{}/api/v2.1/dtable/app-download-link/", config.server()),
        [("path", path.to_string())],
    )
}

/// Appends URL-encoded query parameters to `url`, in the given order.
///
/// # Errors
///
/// Returns an error if `url` does not parse.
pub fn with_query<'a>(
    url: &str,
    pairs: impl IntoIterator<Item = (&'a str, String)>,
) -> Result<String, TransportError> {
    let mut parsed = Url::parse(url).map_err(|e| TransportError::InvalidRequest {
        reason: format!("parse URL {url}: {e}"),
    })?;
    let pairs: Vec<(&str, String)> = pairs.into_iter().collect();
    if !pairs.is_empty() {
        let mut query = parsed.query_pairs_mut();
        for (key, value) in &pairs {
            query.append_pair(key, value);
        }
    }
    Ok(parsed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ConnectionConfig {
        ConnectionConfig::new("https://cloud.seatable.io/", "b1", "t")
    }

    #[test]
    fn gateway_urls() {
        let config = config();
        assert_eq!(
            sql_url(&config),
            "https://cloud.seatable.io/api-gateway/api/v2/dtables/b1/sql/"
        );
        assert_eq!(
            row_url(&config, "r9"),
            "https://cloud.seatable.io/api-gateway/api/v2/dtables/b1/rows/r9/"
        );
        assert_eq!(
            links_url(&config),
            "https://cloud.seatable.io/api-gateway/api/v2/dtables/b1/links/"
        );
    }

    #[test]
    fn file_urls() {
        let config = config();
        assert_eq!(
            upload_link_url(&config),
            "https://cloud.seatable.io/api/v2.1/dtable/app-upload-link/"
        );
        assert_eq!(
            upload_api_url(&config, "abc123"),
            "https://cloud.seatable.io/seafhttp/upload-api/abc123?ret-json=1"
        );
    }

    #[test]
    fn download_link_path_is_encoded() {
        let url = download_link_url(&config(), "/files/2024-01/my report.pdf").expect("url");
        assert_eq!(
            url,
            "https://cloud.seatable.io/api/v2.1/dtable/app-download-link/?path=%2Ffiles%2F2024-01%2Fmy+report.pdf"
        );
    }

    #[test]
    fn query_keeps_order_and_encodes() {
        let url = with_query(
            "https://s/rows/",
            [
                ("table_name", "Contacts & Leads".to_string()),
                ("start", "10".to_string()),
            ],
        )
        .expect("url");
        assert_eq!(url, "https://s/rows/?table_name=Contacts+%26+Leads&start=10");
    }

    #[test]
    fn empty_query_leaves_url_untouched() {
        let url = with_query("https://s/views/", Vec::<(&str, String)>::new()).expect("url");
        assert_eq!(url, "https://s/views/");
    }

    #[test]
    fn invalid_server_is_rejected() {
        assert!(with_query("not a url", [("a", "b".to_string())]).is_err());
    }
}
