//! The dangerous-pattern catalog: module-level `LazyLock<Regex>` constants,
//! compiled once per process. The catalog is closed-set; any expansion is a
//! design change.

use std::sync::LazyLock;

use regex::Regex;

pub static CURL_PIPE_SHELL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(curl|wget)\b[^|]*\|\s*(sh|bash|zsh)\b").unwrap()
});

pub static RM_RF_ROOT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"rm\s+-rf\s+/(\s|$)").unwrap());

pub static CHMOD_777_SENSITIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"chmod\s+777\s+(/etc|/usr|/bin|/root|/var|/boot|/sys)\b").unwrap()
});

pub static BASE64_DECODE_PIPE_SHELL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)base64\s+(-d|--decode)[^|]*\|\s*(sh|bash|zsh)\b").unwrap()
});

pub static NETCAT_LISTENER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bnc\b[^|]*-l\b").unwrap());

pub static EVAL_OR_EXEC_CALL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(eval|exec)\s*\(").unwrap());

/// Matches a base64-encode invocation, used by the info-flow composite.
pub static BASE64_ENCODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bbase64\b(?!\s+(-d|--decode))").unwrap());

/// Matches a shell command issuing a non-GET HTTP verb, used to upgrade
/// `network:READ` to `network:WRITE` during capability inference.
pub static HTTP_WRITE_VERB: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)(curl\s+.*-X\s*(POST|PUT|PATCH|DELETE)|wget\s+.*--post|http\.(post|put|patch|delete)|http\.request\([^)]*method\s*[:=]\s*['"](?!GET))"#,
    )
    .unwrap()
});

pub static FILE_WRITE_VERB: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(write|create|save|delete|modify)\b.{0,20}\bfile\b").unwrap()
});

pub static FILE_READ_VERB: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(read|load|open)\b.{0,20}\bfile\b").unwrap());

/// Hosts considered safe for documentation/package retrieval. Any URL whose
/// host is not in this list (or a subdomain of one) is flagged.
pub const URL_ALLOW_LIST: &[&str] = &[
    "github.com",
    "raw.githubusercontent.com",
    "pypi.org",
    "npmjs.org",
    "npmjs.com",
    "docs.python.org",
    "crates.io",
    "docs.rs",
    "readthedocs.io",
    "readthedocs.org",
];

/// Substrings (case-insensitive) that mark an environment variable name as
/// sensitive.
pub const SENSITIVE_ENV_SUBSTRINGS: &[&str] = &[
    "SECRET",
    "KEY",
    "TOKEN",
    "PASSWORD",
    "CREDENTIAL",
    "PRIVATE",
    "AWS_SECRET_ACCESS_KEY",
    "GITHUB_TOKEN",
    "OPENAI_API_KEY",
    "ANTHROPIC_API_KEY",
];

/// True iff `url`'s host matches the allow-list or is a subdomain of an
/// allow-listed host.
pub fn is_allowed_url(url: &str) -> bool {
    let host = extract_host(url);
    match host {
        Some(host) => URL_ALLOW_LIST
            .iter()
            .any(|allowed| host == *allowed || host.ends_with(&format!(".{allowed}"))),
        None => false,
    }
}

fn extract_host(url: &str) -> Option<String> {
    let without_scheme = url.split_once("://").map(|(_, rest)| rest).unwrap_or(url);
    let host = without_scheme
        .split(['/', '?', '#'])
        .next()
        .unwrap_or(without_scheme);
    let host = host.rsplit('@').next().unwrap_or(host);
    let host = host.split(':').next().unwrap_or(host);
    if host.is_empty() {
        None
    } else {
        Some(host.to_lowercase())
    }
}

/// True iff `name` contains any sensitive substring, case-insensitively.
pub fn is_sensitive_env_var(name: &str) -> bool {
    let upper = name.to_uppercase();
    SENSITIVE_ENV_SUBSTRINGS
        .iter()
        .any(|needle| upper.contains(needle))
}
