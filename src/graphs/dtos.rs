use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

const MAX_URL_LENGTH: usize = 2048;
const MAX_HTML_LENGTH: usize = 5 * 1024 * 1024;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub url: String,
    #[serde(default)]
    pub render_js: bool,
    #[serde(default)]
    pub bypass_cache: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct DetectRequest {
    pub html: String,
    pub url: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DetectResponse {
    pub strategy: String,
    pub available: Vec<String>,
}

fn validate_url_field(url: &str) -> Result<(), String> {
    if url.trim().is_empty() {
        return Err("URL cannot be empty".to_string());
    }
    if url.len() > MAX_URL_LENGTH {
        return Err("URL too long".to_string());
    }
    Ok(())
}

impl GenerateRequest {
    pub fn validate(&self) -> Result<(), String> {
        validate_url_field(&self.url)
    }
}

impl DetectRequest {
    pub fn validate(&self) -> Result<(), String> {
        validate_url_field(&self.url)?;
        if self.html.len() > MAX_HTML_LENGTH {
            return Err("HTML too large".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_request_defaults() {
        let request: GenerateRequest =
            serde_json::from_str(r#"{"url":"https://docs.example.com"}"#).unwrap();
        assert!(!request.render_js);
        assert!(!request.bypass_cache);
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_generate_request_camel_case_flags() {
        let request: GenerateRequest = serde_json::from_str(
            r#"{"url":"https://docs.example.com","renderJs":true,"bypassCache":true}"#,
        )
        .unwrap();
        assert!(request.render_js);
        assert!(request.bypass_cache);
    }

    #[test]
    fn test_generate_request_empty_url() {
        let request = GenerateRequest {
            url: "   ".to_string(),
            render_js: false,
            bypass_cache: false,
        };
        assert_eq!(request.validate().unwrap_err(), "URL cannot be empty");
    }

    #[test]
    fn test_detect_request_url_too_long() {
        let request = DetectRequest {
            html: String::new(),
            url: format!("https://example.com/{}", "a".repeat(2048)),
        };
        assert_eq!(request.validate().unwrap_err(), "URL too long");
    }
}
