use crate::ConfigError;
use std::path::Path;
use url::Url;

/// Reads the seed list: one URL per line, blank lines and `#` comments ignored
///
/// Order in the file carries no meaning; the coordinator shuffles seeds
/// before admission unless deterministic ordering is configured.
pub fn load_seeds(path: &Path) -> Result<Vec<String>, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let seeds = parse_seeds(&content)?;

    if seeds.is_empty() {
        return Err(ConfigError::NoSeeds(path.display().to_string()));
    }

    Ok(seeds)
}

/// Parses seed URLs from text, validating each one
pub fn parse_seeds(content: &str) -> Result<Vec<String>, ConfigError> {
    let mut seeds = Vec::new();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let url = Url::parse(line)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid seed URL '{}': {}", line, e)))?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConfigError::InvalidUrl(format!(
                "Seed URL '{}' must use HTTP or HTTPS",
                line
            )));
        }

        seeds.push(url.to_string());
    }

    Ok(seeds)
}
