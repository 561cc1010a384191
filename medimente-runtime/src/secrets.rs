use anyhow::Context;

/// Where we store secrets in the OS keyring.
///
/// This is intentionally constant so upgrades don't orphan secrets.
const SERVICE: &str = "medimente";

/// Environment variables checked before the keyring, in order.
pub const API_KEY_ENV_VARS: [&str; 2] = ["GEMINI_API_KEY", "API_KEY"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretKey {
    GeminiApiKey,
}

impl SecretKey {
    fn user(self) -> &'static str {
        match self {
            SecretKey::GeminiApiKey => "gemini_api_key",
        }
    }
}

pub fn set_secret(key: SecretKey, value: &str) -> anyhow::Result<()> {
    let entry = keyring::Entry::new(SERVICE, key.user()).context("create keyring entry")?;
    entry.set_password(value).context("set secret")
}

pub fn get_secret(key: SecretKey) -> anyhow::Result<Option<String>> {
    let entry = keyring::Entry::new(SERVICE, key.user()).context("create keyring entry")?;

    match entry.get_password() {
        Ok(v) => Ok(Some(v)),
        Err(keyring::Error::NoEntry) => Ok(None),
        Err(e) => Err(anyhow::Error::new(e)).context("get secret"),
    }
}

pub fn delete_secret(key: SecretKey) -> anyhow::Result<()> {
    let entry = keyring::Entry::new(SERVICE, key.user()).context("create keyring entry")?;
    match entry.delete_credential() {
        Ok(()) => Ok(()),
        Err(keyring::Error::NoEntry) => Ok(()),
        Err(e) => Err(anyhow::Error::new(e)).context("delete secret"),
    }
}

fn first_non_empty(values: impl IntoIterator<Item = Option<String>>) -> Option<String> {
    values
        .into_iter()
        .flatten()
        .map(|v| v.trim().to_string())
        .find(|v| !v.is_empty())
}

/// Resolve the Gemini key once at startup: environment first, then keyring.
///
/// An unusable keyring backend is logged and treated as "no key".
pub fn resolve_api_key() -> anyhow::Result<Option<String>> {
    let from_env = first_non_empty(API_KEY_ENV_VARS.iter().map(|var| std::env::var(var).ok()));
    if from_env.is_some() {
        return Ok(from_env);
    }
    Ok(keyring_fallback(get_secret(SecretKey::GeminiApiKey)))
}

fn keyring_fallback(stored: anyhow::Result<Option<String>>) -> Option<String> {
    match stored {
        Ok(value) => first_non_empty([value]),
        Err(e) => {
            log::warn!("keyring unavailable, ignoring stored API key: {e:#}");
            None
        }
    }
}
