//! Composable guard functions.
//!
//! Each guard takes the field path used for attribution, the value under test and any
//! check-specific parameters. On success it returns the value in a more useful shape
//! (a `&str`, a slice, regex captures, a parsed network); on failure a [`ValidationError`].

use super::{Kind, ValidationError};
use directories::BaseDirs;
use ipnet::IpNet;
use regex::{Captures, Regex};
use serde_yaml::{Mapping, Value};
use std::fmt::Display;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").unwrap_or_else(|e| {
        unreachable!("email pattern is a literal: {e}")
    })
});

static DOMAIN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^(?:\*\.)?",                                 // optional wildcard label
        r"(?:[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?\.)+", // middle labels
        r"[A-Za-z]{2,}$",                              // TLD
    ))
    .unwrap_or_else(|e| unreachable!("domain pattern is a literal: {e}"))
});

/// Fails when the value is absent, `null`, or an empty string.
pub fn present<'v>(field: &str, value: Option<&'v Value>) -> Result<&'v Value, ValidationError> {
    match value {
        None | Some(Value::Null) => Err(ValidationError::new(field, "is required")),
        Some(Value::String(s)) if s.is_empty() => Err(ValidationError::new(field, "is required")),
        Some(v) => Ok(v),
    }
}

/// Fails when the runtime shape of `value` is not `expected`.
pub fn kind(field: &str, value: &Value, expected: Kind) -> Result<(), ValidationError> {
    let actual = Kind::of(value);
    if actual == expected {
        Ok(())
    } else {
        Err(ValidationError::new(
            field,
            format!("has invalid type {actual}, must be a {expected}"),
        ))
    }
}

pub fn string<'v>(field: &str, value: &'v Value) -> Result<&'v str, ValidationError> {
    kind(field, value, Kind::String)?;
    value.as_str().ok_or_else(|| ValidationError::new(field, "must be a string"))
}

pub fn list<'v>(field: &str, value: &'v Value) -> Result<&'v [Value], ValidationError> {
    kind(field, value, Kind::List)?;
    value.as_sequence().map(Vec::as_slice).ok_or_else(|| ValidationError::new(field, "must be a list"))
}

pub fn mapping<'v>(field: &str, value: &'v Value) -> Result<&'v Mapping, ValidationError> {
    kind(field, value, Kind::Mapping)?;
    value.as_mapping().ok_or_else(|| ValidationError::new(field, "must be a mapping"))
}

/// Requires `pattern` to match the whole of `value` and hands back the captures.
pub fn matches<'t>(
    field: &str,
    value: &'t str,
    pattern: &Regex,
) -> Result<Captures<'t>, ValidationError> {
    pattern
        .captures(value)
        .filter(|caps| caps.get(0).is_some_and(|m| m.start() == 0 && m.end() == value.len()))
        .ok_or_else(|| {
            ValidationError::new(
                field,
                format!("value '{value}' does not match '{}' pattern", pattern.as_str()),
            )
        })
}

pub fn one_of(field: &str, value: &str, allowed: &[&str]) -> Result<(), ValidationError> {
    if allowed.contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::new(
            field,
            format!("value '{value}' is invalid, allowed choices: {}", allowed.join(", ")),
        ))
    }
}

pub fn not_one_of<S: AsRef<str>>(
    field: &str,
    value: &str,
    disallowed: &[S],
) -> Result<(), ValidationError> {
    if disallowed.iter().any(|d| d.as_ref() == value) {
        let listed: Vec<&str> = disallowed.iter().map(AsRef::as_ref).collect();
        Err(ValidationError::new(
            field,
            format!("value '{value}' is duplicated, cannot be one of: {}", listed.join(", ")),
        ))
    } else {
        Ok(())
    }
}

pub fn email(field: &str, value: &str) -> Result<(), ValidationError> {
    matches(field, value, &EMAIL)
        .map(drop)
        .map_err(|e| e.with_message(format!("value '{value}' is not a valid email address")))
}

pub fn domain(field: &str, value: &str) -> Result<(), ValidationError> {
    matches(field, value, &DOMAIN)
        .map(drop)
        .map_err(|e| e.with_message(format!("value '{value}' is not a valid domain")))
}

/// Parses an IPv4 or IPv6 network. Host bits are permitted and a bare address is read
/// as a single-host network.
pub fn ip_network(field: &str, value: &str) -> Result<IpNet, ValidationError> {
    let value = value.trim();
    value.parse::<IpNet>().or_else(|net_err| {
        value.parse::<IpAddr>().map(IpNet::from).map_err(|_| {
            ValidationError::new(
                field,
                format!("value '{value}' is invalid CIDR, details: {net_err}"),
            )
        })
    })
}

/// Inclusive range check.
pub fn range<T>(field: &str, value: T, min: T, max: T) -> Result<T, ValidationError>
where
    T: PartialOrd + Display + Copy,
{
    if value < min {
        return Err(ValidationError::new(
            field,
            format!("value {value} is too small, minimal value is {min}"),
        ));
    }
    if value > max {
        return Err(ValidationError::new(
            field,
            format!("value {value} is too big, maximum value is {max}"),
        ));
    }
    Ok(value)
}

pub fn port(field: &str, value: i64) -> Result<u16, ValidationError> {
    range(field, value, 1, i64::from(u16::MAX))
        .ok()
        .and_then(|v| u16::try_from(v).ok())
        .ok_or_else(|| {
            ValidationError::new(
                field,
                format!("value {value} is not valid port number, value is out of range (1-65535)"),
            )
        })
}

/// Replaces a leading `~` component with the user's home directory.
///
/// `~user` forms and a `~` anywhere else are left alone, as is everything when no home
/// directory can be resolved.
pub fn expand_home(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => BaseDirs::new().map_or_else(|| path.to_path_buf(), |dirs| dirs.home_dir().join(rest)),
        Err(_) => path.to_path_buf(),
    }
}

/// Rejects empty paths and returns the path with `~` expanded.
pub fn file_path(field: &str, value: &str) -> Result<PathBuf, ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new(field, "is not a valid path to a file"));
    }
    Ok(expand_home(Path::new(value)))
}

/// Expands `~` and requires the result to exist.
pub fn file_exists(field: &str, path: impl AsRef<Path>) -> Result<PathBuf, ValidationError> {
    let path = expand_home(path.as_ref());
    if path.exists() {
        Ok(path)
    } else {
        Err(ValidationError::new(
            field,
            format!("points to a file that does not exist: '{}'", path.display()),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn present_rejects_missing_null_and_empty() {
        assert!(present("key", None).is_err());
        assert!(present("key", Some(&Value::Null)).is_err());
        assert!(present("key", Some(&Value::String(String::new()))).is_err());
        assert!(present("key", Some(&Value::String("a".into()))).is_ok());
    }

    #[test]
    fn kind_reports_both_shapes() {
        let err = string("domains", &Value::Bool(true)).unwrap_err();
        assert_eq!(err.field(), "domains");
        assert_eq!(err.message(), "has invalid type boolean, must be a string");
    }

    #[test]
    fn matches_requires_full_span() {
        let re = Regex::new("[a-z]+").unwrap();
        assert!(matches("f", "abc", &re).is_ok());
        assert!(matches("f", "abc1", &re).is_err());
    }

    #[test]
    fn email_and_domain_patterns() {
        assert!(email("email", "ops@example.com").is_ok());
        assert!(email("email", "ops@example").is_err());
        assert!(email("email", "not an email").is_err());

        assert!(domain("d", "api.example.com").is_ok());
        assert!(domain("d", "*.example.com").is_ok());
        assert!(domain("d", "example.io").is_ok());
        assert!(domain("d", "localhost").is_err());
        assert!(domain("d", "*.*.example.com").is_err());
        assert!(domain("d", "-bad.example.com").is_err());
        assert!(domain("d", "example.c0m").is_err());
    }

    #[test]
    fn ip_network_is_non_strict() {
        assert_eq!(ip_network("f", "10.1.2.3/8").unwrap().to_string(), "10.1.2.3/8");
        assert_eq!(ip_network("f", "192.168.1.1").unwrap().prefix_len(), 32);
        assert_eq!(ip_network("f", "::1").unwrap().prefix_len(), 128);
        assert!(ip_network("f", "fd00::/8").is_ok());

        let err = ip_network("allowed_ips[0]", "10.0.0.0/abc").unwrap_err();
        assert_eq!(err.field(), "allowed_ips[0]");
        assert!(ip_network("f", "not-an-ip").is_err());
        assert!(ip_network("f", "10.0.0.0/33").is_err());
    }

    #[test]
    fn one_of_and_not_one_of() {
        assert!(one_of("plugin", "dns-route53", &["dns-route53"]).is_ok());
        let err = one_of("plugin", "http", &["dns-route53"]).unwrap_err();
        assert!(err.message().contains("allowed choices: dns-route53"));

        assert!(not_one_of("key", "a", &["b", "c"]).is_ok());
        assert!(not_one_of("key", "b", &["b", "c"]).is_err());
    }

    #[test]
    fn range_and_port() {
        assert_eq!(range("n", 5, 1, 10).unwrap(), 5);
        assert!(range("n", 0, 1, 10).is_err());
        assert!(range("n", 11, 1, 10).is_err());
        assert_eq!(port("p", 8080).unwrap(), 8080);
        assert!(port("p", 0).is_err());
        assert!(port("p", 70_000).is_err());
    }

    #[test]
    fn file_checks() {
        let dir = tempfile::tempdir().unwrap();
        assert!(file_exists("conf_file", dir.path()).is_ok());
        assert!(file_exists("conf_file", dir.path().join("missing.yaml")).is_err());
        assert!(file_path("conf_file", "  ").is_err());
    }

    #[test]
    fn expands_leading_tilde_only() {
        if let Some(dirs) = BaseDirs::new() {
            assert_eq!(
                file_path("conf_file", "~/config/config.yaml").unwrap(),
                dirs.home_dir().join("config/config.yaml")
            );
            assert_eq!(expand_home(Path::new("~")), dirs.home_dir());
        }
        assert_eq!(file_path("conf_file", "/etc/~/a.yaml").unwrap(), PathBuf::from("/etc/~/a.yaml"));
        assert_eq!(file_path("conf_file", "~ops/a.yaml").unwrap(), PathBuf::from("~ops/a.yaml"));
    }
}
