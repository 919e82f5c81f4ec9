//! Server Configuration
//!
//! Read from the environment (after `.env` is loaded by the binary).

use std::time::Duration;

use checkout_payments::Timeouts;

/// Runtime settings for the checkout server
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_addr: String,

    /// Lowercase ISO currency every intent is created in
    pub currency: String,

    pub timeouts: Timeouts,

    /// Use the in-process processor when Stripe keys are absent
    pub mock_processor: bool,

    /// Signing secret for the mock processor's webhooks
    pub webhook_secret: Option<String>,

    /// Development sessions as `(token, user)` pairs
    pub session_tokens: Vec<(String, String)>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".into(),
            currency: "usd".into(),
            timeouts: Timeouts::default(),
            mock_processor: false,
            webhook_secret: None,
            session_tokens: Vec::new(),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unparseable values fall back to defaults
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let secs = |key: &str, fallback: Duration| {
            lookup(key)
                .and_then(|v| v.trim().parse::<u64>().ok())
                .filter(|s| *s > 0)
                .map_or(fallback, Duration::from_secs)
        };

        Self {
            bind_addr: lookup("BIND_ADDR").unwrap_or(defaults.bind_addr),
            currency: lookup("CHECKOUT_CURRENCY")
                .map(|c| c.trim().to_lowercase())
                .filter(|c| !c.is_empty())
                .unwrap_or(defaults.currency),
            timeouts: Timeouts {
                processor: secs("PROCESSOR_TIMEOUT_SECS", defaults.timeouts.processor),
                store: secs("STORE_TIMEOUT_SECS", defaults.timeouts.store),
            },
            mock_processor: lookup("MOCK_PROCESSOR")
                .is_some_and(|v| matches!(v.trim(), "1" | "true" | "yes")),
            webhook_secret: lookup("STRIPE_WEBHOOK_SECRET").filter(|s| !s.is_empty()),
            session_tokens: lookup("SESSION_TOKENS")
                .map(|raw| parse_session_tokens(&raw))
                .unwrap_or_default(),
        }
    }
}

/// Parse `token=user,token=user`
fn parse_session_tokens(raw: &str) -> Vec<(String, String)> {
    raw.split(',')
        .filter_map(|pair| {
            let (token, user) = pair.trim().split_once('=')?;
            let (token, user) = (token.trim(), user.trim());
            if token.is_empty() || user.is_empty() {
                tracing::warn!("Ignoring malformed SESSION_TOKENS entry");
                return None;
            }
            Some((token.to_string(), user.to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> ServerConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]);
        assert_eq!(config.bind_addr, "0.0.0.0:3000");
        assert_eq!(config.currency, "usd");
        assert_eq!(config.timeouts.processor, Duration::from_secs(10));
        assert_eq!(config.timeouts.store, Duration::from_secs(5));
        assert!(!config.mock_processor);
        assert!(config.session_tokens.is_empty());
    }

    #[test]
    fn test_overrides() {
        let config = config(&[
            ("BIND_ADDR", "127.0.0.1:8080"),
            ("CHECKOUT_CURRENCY", " EUR "),
            ("PROCESSOR_TIMEOUT_SECS", "3"),
            ("STORE_TIMEOUT_SECS", "nope"),
            ("MOCK_PROCESSOR", "true"),
            ("SESSION_TOKENS", "tok_a=alice, tok_b=bob,broken,=nobody"),
        ]);

        assert_eq!(config.bind_addr, "127.0.0.1:8080");
        assert_eq!(config.currency, "eur");
        assert_eq!(config.timeouts.processor, Duration::from_secs(3));
        assert_eq!(config.timeouts.store, Duration::from_secs(5));
        assert!(config.mock_processor);
        assert_eq!(
            config.session_tokens,
            vec![
                ("tok_a".to_string(), "alice".to_string()),
                ("tok_b".to_string(), "bob".to_string()),
            ]
        );
    }
}
