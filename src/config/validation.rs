use crate::config::types::{ApiConfig, Config, CrawlerConfig, ListingsConfig, UserAgentConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_api_config(&config.api)?;
    validate_listings_config(&config.listings)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_concurrent_fetches < 1 || config.max_concurrent_fetches > 100 {
        return Err(ConfigError::Validation(format!(
            "max_concurrent_fetches must be between 1 and 100, got {}",
            config.max_concurrent_fetches
        )));
    }

    if config.requests_per_minute < 1 {
        return Err(ConfigError::Validation(format!(
            "requests_per_minute must be >= 1, got {}",
            config.requests_per_minute
        )));
    }

    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "timeout_secs must be >= 1, got {}",
            config.timeout_secs
        )));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // Validate crawler name: non-empty, alphanumeric + hyphens only
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    // The contact URL is optional; validate only when present
    if !config.contact_url.is_empty() {
        Url::parse(&config.contact_url)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;
    }

    Ok(())
}

/// Validates remote API configuration
fn validate_api_config(config: &ApiConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base_url: {}", e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "base_url must use the http or https scheme, got '{}'",
            url.scheme()
        )));
    }

    if config.page_size < 1 || config.page_size > 100 {
        return Err(ConfigError::Validation(format!(
            "page_size must be between 1 and 100, got {}",
            config.page_size
        )));
    }

    Ok(())
}

/// Validates listing selection configuration
fn validate_listings_config(config: &ListingsConfig) -> Result<(), ConfigError> {
    for term in &config.search_terms {
        if term.trim().is_empty() {
            return Err(ConfigError::Validation(
                "search terms cannot be empty".to_string(),
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_crawler_config() {
        let mut config = CrawlerConfig::default();
        assert!(validate_crawler_config(&config).is_ok());

        config.max_concurrent_fetches = 0;
        assert!(validate_crawler_config(&config).is_err());

        config.max_concurrent_fetches = 101;
        assert!(validate_crawler_config(&config).is_err());

        config.max_concurrent_fetches = 4;
        config.requests_per_minute = 0;
        assert!(validate_crawler_config(&config).is_err());

        config.requests_per_minute = 60;
        config.timeout_secs = 0;
        assert!(validate_crawler_config(&config).is_err());
    }

    #[test]
    fn test_validate_user_agent_config() {
        let mut config = UserAgentConfig::default();
        assert!(validate_user_agent_config(&config).is_ok());

        config.contact_url = "https://example.com/crawler".to_string();
        assert!(validate_user_agent_config(&config).is_ok());

        config.contact_url = "not a url".to_string();
        assert!(validate_user_agent_config(&config).is_err());

        config.contact_url = String::new();
        config.crawler_name = String::new();
        assert!(validate_user_agent_config(&config).is_err());

        config.crawler_name = "has spaces".to_string();
        assert!(validate_user_agent_config(&config).is_err());
    }

    #[test]
    fn test_validate_api_config() {
        let mut config = ApiConfig::default();
        assert!(validate_api_config(&config).is_ok());

        config.base_url = "ftp://example.com".to_string();
        assert!(validate_api_config(&config).is_err());

        config.base_url = "not a url".to_string();
        assert!(validate_api_config(&config).is_err());

        config.base_url = "https://www.reddit.com".to_string();
        config.page_size = 0;
        assert!(validate_api_config(&config).is_err());

        config.page_size = 101;
        assert!(validate_api_config(&config).is_err());
    }

    #[test]
    fn test_validate_listings_config() {
        let mut config = ListingsConfig::default();
        assert!(validate_listings_config(&config).is_ok());

        config.search_terms = vec!["rust".to_string()];
        assert!(validate_listings_config(&config).is_ok());

        config.search_terms = vec!["   ".to_string()];
        assert!(validate_listings_config(&config).is_err());
    }
}
