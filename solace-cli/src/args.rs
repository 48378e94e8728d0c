//! Command-line flags.

use std::path::PathBuf;

use crate::config::SolaceConfig;
use crate::error::CliError;

/// Parsed command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliOptions {
    /// `--config PATH`
    pub config: Option<PathBuf>,
    /// `--base-url URL`
    pub base_url: Option<String>,
    /// `--user ID`
    pub user_id: Option<String>,
    /// `--locale TAG`
    pub locale: Option<String>,
    /// `--no-fallback`
    pub no_fallback: bool,
    /// `--message TEXT`: send one turn and exit instead of starting a REPL.
    pub message: Option<String>,
    /// `-h` / `--help`
    pub help: bool,
}

impl CliOptions {
    /// Parse flags, without the program name.
    pub fn parse(args: impl IntoIterator<Item = String>) -> Result<Self, CliError> {
        let mut options = Self::default();
        let mut remaining = args.into_iter();
        while let Some(flag) = remaining.next() {
            match flag.as_str() {
                "--config" => {
                    options.config = Some(PathBuf::from(take_arg("--config", &mut remaining)?))
                }
                "--base-url" => options.base_url = Some(take_arg("--base-url", &mut remaining)?),
                "--user" => options.user_id = Some(take_arg("--user", &mut remaining)?),
                "--locale" => options.locale = Some(take_arg("--locale", &mut remaining)?),
                "--message" | "-m" => {
                    options.message = Some(take_arg("--message", &mut remaining)?)
                }
                "--no-fallback" => options.no_fallback = true,
                "--help" | "-h" => options.help = true,
                other => return Err(CliError::Args(format!("unknown flag: {other}"))),
            }
        }
        Ok(options)
    }

    /// Flags win over the file and the environment.
    pub fn apply(&self, config: &mut SolaceConfig) {
        if let Some(url) = &self.base_url {
            config.base_url = url.clone();
        }
        if let Some(user) = &self.user_id {
            config.user_id = user.clone();
        }
        if let Some(locale) = &self.locale {
            config.locale = locale.clone();
        }
        if self.no_fallback {
            config.fallback_enabled = false;
        }
    }
}

fn take_arg(flag: &str, remaining: &mut impl Iterator<Item = String>) -> Result<String, CliError> {
    remaining
        .next()
        .ok_or_else(|| CliError::Args(format!("missing value for {flag}")))
}

/// One-line usage summary.
pub fn usage() -> &'static str {
    "solace [--config solace.json] [--base-url URL] [--user ID] [--locale TAG] [--no-fallback] [--message TEXT]"
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<CliOptions, CliError> {
        CliOptions::parse(args.iter().map(|a| a.to_string()))
    }

    #[test]
    fn parses_all_flags() {
        let options = parse(&[
            "--config",
            "alt.json",
            "--base-url",
            "https://x.example.com",
            "--user",
            "u1",
            "--locale",
            "es",
            "--no-fallback",
            "-m",
            "hola",
        ])
        .unwrap();

        assert_eq!(options.config, Some(PathBuf::from("alt.json")));
        assert_eq!(options.base_url.as_deref(), Some("https://x.example.com"));
        assert_eq!(options.user_id.as_deref(), Some("u1"));
        assert_eq!(options.locale.as_deref(), Some("es"));
        assert!(options.no_fallback);
        assert_eq!(options.message.as_deref(), Some("hola"));
    }

    #[test]
    fn missing_value_is_an_error() {
        let err = parse(&["--user"]).unwrap_err();
        assert_eq!(err.to_string(), "missing value for --user");
    }

    #[test]
    fn unknown_flag_is_an_error() {
        assert!(matches!(parse(&["--verbose"]), Err(CliError::Args(_))));
    }

    #[test]
    fn flags_override_config() {
        let options = parse(&["--locale", "de", "--no-fallback"]).unwrap();
        let mut config = SolaceConfig::default();
        options.apply(&mut config);
        assert_eq!(config.locale, "de");
        assert!(!config.fallback_enabled);
        assert_eq!(config.user_id, "anonymous");
    }
}
