// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use reqwest::Url;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_HEALTH_INTERVAL: Duration = Duration::from_secs(1);
pub const DEFAULT_HEALTH_MAX_ATTEMPTS: u32 = 3;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid endpoint {input:?}: {reason}")]
    InvalidEndpoint { input: String, reason: &'static str },

    #[error("invalid duration {0:?}: expected <n>[ms|s|m|h]")]
    InvalidDuration(String),

    #[error("invalid health check {input:?}: {reason}")]
    InvalidHealthCheck { input: String, reason: String },

    #[error("environment variable {0} is not set")]
    UndefinedVariable(String),

    #[error("unterminated variable reference in {0:?}")]
    UnterminatedReference(String),
}

/// A `host:port` dependency whose TCP reachability gates startup.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

impl FromStr for Endpoint {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason| ConfigError::InvalidEndpoint {
            input: s.to_string(),
            reason,
        };
        let s = s.trim();

        let (host, port) = if let Some(rest) = s.strip_prefix('[') {
            rest.split_once("]:")
                .ok_or_else(|| invalid("expected [address]:port"))?
        } else {
            let (host, port) = s
                .rsplit_once(':')
                .ok_or_else(|| invalid("expected host:port"))?;
            if host.contains(':') {
                return Err(invalid("IPv6 addresses must be bracketed"));
            }
            (host, port)
        };

        if host.is_empty() {
            return Err(invalid("empty host"));
        }
        let port: u16 = port.parse().map_err(|_| invalid("port is not a number"))?;
        if port == 0 {
            return Err(invalid("port must be between 1 and 65535"));
        }
        Ok(Endpoint::new(host, port))
    }
}

/// One HTTP target polled before the primary process is started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthCheckTarget {
    pub name: String,
    pub url: String,
    pub interval: Duration,
    pub max_attempts: u32,
    pub critical: bool,
}

impl HealthCheckTarget {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            interval: DEFAULT_HEALTH_INTERVAL,
            max_attempts: DEFAULT_HEALTH_MAX_ATTEMPTS,
            critical: false,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_critical(mut self, critical: bool) -> Self {
        self.critical = critical;
        self
    }
}

/// Parses `[name=]url[,interval[,maxAttempts[,critical]]]`. Empty fields keep their default.
impl FromStr for HealthCheckTarget {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: String| ConfigError::InvalidHealthCheck {
            input: s.to_string(),
            reason,
        };

        let mut fields = s.trim().split(',').map(str::trim);
        let head = fields.next().unwrap_or_default();
        let (name, raw_url) = match head.split_once('=') {
            Some((name, url)) if !name.is_empty() && !name.contains([':', '/', '?']) => {
                (Some(name), url)
            }
            _ => (None, head),
        };

        let url = Url::parse(raw_url).map_err(|e| invalid(format!("bad url: {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid(format!("unsupported scheme {}", url.scheme())));
        }
        let host = url
            .host_str()
            .ok_or_else(|| invalid("url has no host".to_string()))?;

        let mut target = HealthCheckTarget::new(name.unwrap_or(host), raw_url);

        if let Some(field) = fields.next().filter(|f| !f.is_empty()) {
            let interval = parse_duration(field)?;
            if interval.is_zero() {
                return Err(invalid("interval must be positive".to_string()));
            }
            target.interval = interval;
        }
        if let Some(field) = fields.next().filter(|f| !f.is_empty()) {
            target.max_attempts = match field.parse::<u32>() {
                Ok(n) if n > 0 => n,
                _ => return Err(invalid(format!("maxAttempts must be >= 1, got {field}"))),
            };
        }
        if let Some(field) = fields.next().filter(|f| !f.is_empty()) {
            target.critical = match field.to_ascii_lowercase().as_str() {
                "true" | "critical" => true,
                "false" | "optional" => false,
                other => return Err(invalid(format!("unknown criticality {other}"))),
            };
        }
        if fields.next().is_some() {
            return Err(invalid("too many fields".to_string()));
        }

        Ok(target)
    }
}

/// Parse `<n>[ms|s|m|h]`. A bare number is seconds.
pub fn parse_duration(s: &str) -> Result<Duration, ConfigError> {
    let s = s.trim();
    let split = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    let (digits, unit) = s.split_at(split);
    let value: u64 = digits
        .parse()
        .map_err(|_| ConfigError::InvalidDuration(s.to_string()))?;

    match unit {
        "" | "s" => Ok(Duration::from_secs(value)),
        "ms" => Ok(Duration::from_millis(value)),
        "m" => Ok(Duration::from_secs(value.saturating_mul(60))),
        "h" => Ok(Duration::from_secs(value.saturating_mul(3600))),
        _ => Err(ConfigError::InvalidDuration(s.to_string())),
    }
}

/// Substitute `$VAR`, `${VAR}` and `${VAR:-default}` from the process environment.
pub fn expand_env(input: &str) -> Result<String, ConfigError> {
    expand_with(input, |name| std::env::var(name).ok())
}

pub(crate) fn expand_with<F>(input: &str, lookup: F) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            out.push(c);
            continue;
        }
        match chars.peek() {
            Some('$') => {
                chars.next();
                out.push('$');
            }
            Some('{') => {
                chars.next();
                let mut reference = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some(ch) => reference.push(ch),
                        None => return Err(ConfigError::UnterminatedReference(input.to_string())),
                    }
                }
                let (name, default) = match reference.split_once(":-") {
                    Some((name, default)) => (name, Some(default)),
                    None => (reference.as_str(), None),
                };
                match (lookup(name).filter(|v| !v.is_empty()), default) {
                    (Some(value), _) => out.push_str(&value),
                    (None, Some(default)) => out.push_str(default),
                    (None, None) => match lookup(name) {
                        Some(empty) => out.push_str(&empty),
                        None => return Err(ConfigError::UndefinedVariable(name.to_string())),
                    },
                }
            }
            Some(ch) if ch.is_ascii_alphabetic() || *ch == '_' => {
                let mut name = String::new();
                while let Some(&ch) = chars.peek() {
                    if !(ch.is_ascii_alphanumeric() || ch == '_') {
                        break;
                    }
                    name.push(ch);
                    chars.next();
                }
                let value = lookup(&name).ok_or(ConfigError::UndefinedVariable(name))?;
                out.push_str(&value);
            }
            _ => out.push('$'),
        }
    }

    Ok(out)
}
