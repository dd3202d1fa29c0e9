use secrecy::{ExposeSecret, SecretString};

/// Query string for one `browse` request.
///
/// NeoWs authenticates through the `api_key` query parameter, so the secret is
/// only exposed here, at the point the request is built.
pub fn browse_query(page: u32, size: u32, api_key: &SecretString) -> Vec<(&'static str, String)> {
    vec![
        ("page", page.to_string()),
        ("size", size.to_string()),
        ("api_key", api_key.expose_secret().to_string()),
    ]
}

/// Joins the configured base URL with the browse path, tolerating a trailing slash.
pub fn browse_url(base_url: &str) -> String {
    format!("{}/neo/browse", base_url.trim_end_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn browse_url_ignores_trailing_slash() {
        assert_eq!(
            browse_url("https://api.nasa.gov/neo/rest/v1/"),
            "https://api.nasa.gov/neo/rest/v1/neo/browse"
        );
        assert_eq!(browse_url("http://127.0.0.1:9"), "http://127.0.0.1:9/neo/browse");
    }

    #[test]
    fn query_carries_page_size_and_key() {
        let key = SecretString::from("DEMO_KEY".to_string());
        let q = browse_query(3, 20, &key);
        assert_eq!(
            q,
            vec![
                ("page", "3".to_string()),
                ("size", "20".to_string()),
                ("api_key", "DEMO_KEY".to_string())
            ]
        );
    }
}
