//! Process configuration
//!
//! All knobs come from `STACKD_*` environment variables with documented
//! defaults. The config is loaded once at startup and never mutated.

use std::path::PathBuf;
use std::time::Duration;

use crate::paths;

/// Agent configuration, immutable for the process lifetime
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP listen address; a bare port is normalized to `:port`
    pub listen_addr: String,

    /// HTTP read timeout
    pub read_timeout: Duration,

    /// HTTP read-header timeout
    pub read_header_timeout: Duration,

    /// HTTP write timeout; bounds request handling end to end
    pub write_timeout: Duration,

    /// HTTP keep-alive idle timeout
    pub idle_timeout: Duration,

    /// Per-operation bound for provision/stop/destroy; zero disables it
    pub command_timeout: Duration,

    /// Static bearer token; `None` disables authentication
    pub auth_token: Option<String>,

    /// Allowlist directory all project roots must resolve inside;
    /// `None` disables the check
    pub projects_root: Option<PathBuf>,

    /// External stack CLI binary used by the CLI executor strategy
    pub stack_binary: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: ":8085".to_string(),
            read_timeout: Duration::from_secs(30),
            read_header_timeout: Duration::from_secs(10),
            write_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(60),
            command_timeout: Duration::from_secs(15 * 60),
            auth_token: None,
            projects_root: None,
            stack_binary: PathBuf::from("stackctl"),
        }
    }
}

impl Config {
    /// Load configuration from process environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an explicit lookup function.
    ///
    /// The seam exists so tests can feed values without mutating the
    /// process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Config::default();
        let trimmed = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let listen_addr = trimmed("STACKD_LISTEN_ADDR")
            .map(|addr| normalize_addr(&addr))
            .unwrap_or(defaults.listen_addr);

        let duration = |key: &str, fallback: Duration| {
            trimmed(key)
                .and_then(|raw| parse_duration(&raw))
                .unwrap_or(fallback)
        };

        let projects_root = trimmed("STACKD_PROJECTS_ROOT").map(PathBuf::from).map(|root| {
            // Absolutize at load so the allowlist comparison is stable even
            // if the process later changes directory.
            paths::absolutize(&root).unwrap_or(root)
        });

        Self {
            listen_addr,
            read_timeout: duration("STACKD_READ_TIMEOUT", defaults.read_timeout),
            read_header_timeout: duration(
                "STACKD_READ_HEADER_TIMEOUT",
                defaults.read_header_timeout,
            ),
            write_timeout: duration("STACKD_WRITE_TIMEOUT", defaults.write_timeout),
            idle_timeout: duration("STACKD_IDLE_TIMEOUT", defaults.idle_timeout),
            command_timeout: duration("STACKD_COMMAND_TIMEOUT", defaults.command_timeout),
            auth_token: trimmed("STACKD_AUTH_TOKEN"),
            projects_root,
            stack_binary: trimmed("STACKD_STACK_BIN")
                .map(PathBuf::from)
                .unwrap_or(defaults.stack_binary),
        }
    }

    /// Bound for one provision/stop/destroy call; `None` means unlimited
    pub fn operation_timeout(&self) -> Option<Duration> {
        if self.command_timeout.is_zero() {
            None
        } else {
            Some(self.command_timeout)
        }
    }
}

/// Parse `90s` / `15m` / `2h` / `500ms`, or a bare integer meaning seconds
fn parse_duration(raw: &str) -> Option<Duration> {
    let raw = raw.trim();
    if let Ok(secs) = raw.parse::<u64>() {
        return Some(Duration::from_secs(secs));
    }

    let split = raw.find(|c: char| !c.is_ascii_digit())?;
    let value: u64 = raw[..split].parse().ok()?;
    match &raw[split..] {
        "ms" => Some(Duration::from_millis(value)),
        "s" => Some(Duration::from_secs(value)),
        "m" => Some(Duration::from_secs(value * 60)),
        "h" => Some(Duration::from_secs(value * 60 * 60)),
        _ => None,
    }
}

/// Accept `host:port`, `:port`, or a bare port
fn normalize_addr(addr: &str) -> String {
    if addr.starts_with(':') || addr.contains(':') {
        addr.to_string()
    } else {
        format!(":{addr}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Config {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_environment_is_empty() {
        let cfg = config_from(&[]);
        assert_eq!(cfg.listen_addr, ":8085");
        assert_eq!(cfg.read_timeout, Duration::from_secs(30));
        assert_eq!(cfg.read_header_timeout, Duration::from_secs(10));
        assert_eq!(cfg.write_timeout, Duration::from_secs(30));
        assert_eq!(cfg.idle_timeout, Duration::from_secs(60));
        assert_eq!(cfg.command_timeout, Duration::from_secs(900));
        assert_eq!(cfg.auth_token, None);
        assert_eq!(cfg.projects_root, None);
        assert_eq!(cfg.stack_binary, PathBuf::from("stackctl"));
    }

    #[test]
    fn durations_parse_with_unit_suffixes() {
        assert_eq!(parse_duration("90s"), Some(Duration::from_secs(90)));
        assert_eq!(parse_duration("15m"), Some(Duration::from_secs(900)));
        assert_eq!(parse_duration("2h"), Some(Duration::from_secs(7200)));
        assert_eq!(parse_duration("500ms"), Some(Duration::from_millis(500)));
        assert_eq!(parse_duration("45"), Some(Duration::from_secs(45)));
        assert_eq!(parse_duration("soon"), None);
        assert_eq!(parse_duration("10parsecs"), None);
    }

    #[test]
    fn unparsable_duration_falls_back_to_default() {
        let cfg = config_from(&[("STACKD_COMMAND_TIMEOUT", "whenever")]);
        assert_eq!(cfg.command_timeout, Duration::from_secs(900));
    }

    #[test]
    fn listen_addr_normalization() {
        assert_eq!(normalize_addr("8085"), ":8085");
        assert_eq!(normalize_addr(":9000"), ":9000");
        assert_eq!(normalize_addr("127.0.0.1:9000"), "127.0.0.1:9000");
    }

    #[test]
    fn auth_token_is_trimmed_and_blank_disables() {
        let cfg = config_from(&[("STACKD_AUTH_TOKEN", "  secret  ")]);
        assert_eq!(cfg.auth_token.as_deref(), Some("secret"));

        let cfg = config_from(&[("STACKD_AUTH_TOKEN", "   ")]);
        assert_eq!(cfg.auth_token, None);
    }

    #[test]
    fn zero_command_timeout_disables_operation_bound() {
        let cfg = config_from(&[("STACKD_COMMAND_TIMEOUT", "0")]);
        assert_eq!(cfg.operation_timeout(), None);

        let cfg = config_from(&[("STACKD_COMMAND_TIMEOUT", "90s")]);
        assert_eq!(cfg.operation_timeout(), Some(Duration::from_secs(90)));
    }

    #[test]
    fn projects_root_is_absolutized() {
        let cfg = config_from(&[("STACKD_PROJECTS_ROOT", "/projects/../srv/projects")]);
        assert_eq!(cfg.projects_root, Some(PathBuf::from("/srv/projects")));
    }
}
