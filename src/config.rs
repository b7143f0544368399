use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Organization whose correspondence is analyzed (the inbox owner);
    /// resolved from an address the way receiver orgs are (text between
    /// `@` and the next `.`)
    pub focal_org: String,
    /// Path to a JSON export of email records
    pub json: Option<String>,
    /// Maildir to scan instead of a JSON export
    pub maildir: Option<String>,
    pub report: ReportConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Organization name column width in characters
    pub org_width: usize,
    /// Latency cell width in characters
    pub cell_width: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            focal_org: String::new(),
            json: None,
            maildir: None,
            report: ReportConfig::default(),
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            org_width: 18,
            cell_width: 14,
        }
    }
}

impl Config {
    pub fn load() -> Self {
        let config_path = dirs::config_dir()
            .map(|p| p.join("mailstats/config.toml"))
            .unwrap_or_else(|| PathBuf::from("~/.config/mailstats/config.toml"));

        if config_path.exists() {
            match std::fs::read_to_string(&config_path) {
                Ok(content) => match toml::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => eprintln!("Config parse error: {}", e),
                },
                Err(e) => eprintln!("Config read error: {}", e),
            }
        }

        Self::default()
    }

    /// Maildir path with `~` expanded
    pub fn maildir_path(&self) -> Option<String> {
        self.maildir
            .as_deref()
            .map(|m| shellexpand::tilde(m).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
            focal_org = "workpatterns"
            json = "emails.json"
        "#,
        )
        .unwrap();

        assert_eq!(config.focal_org, "workpatterns");
        assert_eq!(config.json.as_deref(), Some("emails.json"));
        assert!(config.maildir.is_none());
        assert_eq!(config.report.org_width, 18);
    }

    #[test]
    fn test_report_section_override() {
        let config: Config = toml::from_str(
            r#"
            focal_org = "workpatterns"

            [report]
            org_width = 30
        "#,
        )
        .unwrap();

        assert_eq!(config.report.org_width, 30);
        assert_eq!(config.report.cell_width, 14);
    }

    #[test]
    fn test_maildir_tilde_expansion() {
        let config: Config = toml::from_str(r#"maildir = "~/Mail/gmail""#).unwrap();
        let expanded = config.maildir_path().unwrap();
        assert!(!expanded.starts_with('~'));
        assert!(expanded.ends_with("Mail/gmail"));
    }
}
