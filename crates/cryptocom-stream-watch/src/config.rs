/*
[INPUT]:  YAML configuration file
[OUTPUT]: Parsed and validated watch configuration
[POS]:    Configuration layer - watch setup
[UPDATE]: When adding new configuration options
*/

use anyhow::{Result, anyhow, bail};
use cryptocom_stream::{AccountType, Credentials, StreamConfig, Timeframe};
use serde::{Deserialize, Serialize};

/// Top-level configuration for the watch runner
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WatchConfig {
    /// Use the UAT sandbox endpoints
    #[serde(default)]
    pub sandbox: bool,
    /// Credentials for private channels
    #[serde(default)]
    pub credentials: Option<CredentialsConfig>,
    /// Spot or margin user channels
    #[serde(default)]
    pub account_type: AccountType,
    /// Watches to run, one task each
    pub watches: Vec<WatchSpec>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CredentialsConfig {
    pub api_key: String,
    pub secret: String,
}

/// Which watch call a task loops on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WatchKind {
    OrderBook,
    Trades,
    Ticker,
    Ohlcv,
    MyTrades,
    Orders,
    Balance,
}

impl WatchKind {
    pub fn is_private(&self) -> bool {
        matches!(self, WatchKind::MyTrades | WatchKind::Orders | WatchKind::Balance)
    }

    pub fn requires_symbol(&self) -> bool {
        matches!(
            self,
            WatchKind::OrderBook | WatchKind::Trades | WatchKind::Ticker | WatchKind::Ohlcv
        )
    }
}

/// Configuration for a single watch task
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WatchSpec {
    /// Task identifier (defaults to `<kind>:<symbol>`)
    #[serde(default)]
    pub id: Option<String>,
    pub kind: WatchKind,
    /// Unified symbol, e.g. "BTC/USDT"
    #[serde(default)]
    pub symbol: Option<String>,
    /// Candle timeframe, e.g. "1m" (ohlcv only)
    #[serde(default)]
    pub timeframe: Option<String>,
    /// Keep the newest N records / book levels
    #[serde(default)]
    pub limit: Option<usize>,
}

impl WatchSpec {
    pub fn task_id(&self) -> String {
        match (&self.id, &self.symbol) {
            (Some(id), _) => id.clone(),
            (None, Some(symbol)) => format!("{:?}:{symbol}", self.kind).to_lowercase(),
            (None, None) => format!("{:?}", self.kind).to_lowercase(),
        }
    }

    pub fn timeframe(&self) -> Result<Timeframe> {
        let raw = self.timeframe.as_deref().unwrap_or("1m");
        Timeframe::parse(raw).ok_or_else(|| anyhow!("unknown timeframe: {raw}"))
    }
}

impl WatchConfig {
    /// Load configuration from YAML file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(content)?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.watches.is_empty() {
            bail!("at least one watch must be configured");
        }

        let mut seen = std::collections::HashSet::new();
        for spec in &self.watches {
            let task_id = spec.task_id();
            if !seen.insert(task_id.clone()) {
                bail!("duplicate watch id: {task_id}");
            }
            if spec.kind.requires_symbol() && spec.symbol.as_deref().is_none_or(str::is_empty) {
                bail!("watch {task_id} requires a symbol");
            }
            if spec.kind == WatchKind::Ohlcv {
                spec.timeframe()?;
            }
            if spec.kind.is_private() && self.credentials.is_none() {
                bail!("watch {task_id} is private and needs credentials");
            }
        }

        self.stream_config().validate()?;
        Ok(())
    }

    /// Library configuration for these settings
    pub fn stream_config(&self) -> StreamConfig {
        let base = if self.sandbox {
            StreamConfig::sandbox()
        } else {
            StreamConfig::default()
        };
        let config = base.with_account_type(self.account_type);
        match &self.credentials {
            Some(creds) => config.with_credentials(Credentials::new(&creds.api_key, &creds.secret)),
            None => config,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
sandbox: true
watches:
  - kind: order_book
    symbol: BTC/USDT
    limit: 10
  - kind: ohlcv
    symbol: ETH/USDT
    timeframe: 5m
"#;

    #[test]
    fn test_parse_sample() {
        let config = WatchConfig::from_yaml(SAMPLE).expect("sample parses");
        assert!(config.sandbox);
        assert_eq!(config.watches.len(), 2);
        assert_eq!(config.watches[0].kind, WatchKind::OrderBook);
        assert_eq!(config.watches[0].task_id(), "orderbook:btc/usdt");
        assert!(config.validate().is_ok());
        assert!(config.stream_config().public_url.contains("uat-stream"));
    }

    #[test]
    fn test_private_watch_requires_credentials() {
        let config = WatchConfig::from_yaml("watches:\n  - kind: balance\n").expect("parses");
        assert!(config.validate().is_err());

        let with_creds = WatchConfig::from_yaml(
            "credentials:\n  api_key: k\n  secret: s\nwatches:\n  - kind: balance\n",
        )
        .expect("parses");
        assert!(with_creds.validate().is_ok());
        assert!(with_creds.stream_config().credentials.is_some());
    }

    #[test]
    fn test_rejects_bad_timeframe_and_missing_symbol() {
        let bad_tf = WatchConfig::from_yaml(
            "watches:\n  - kind: ohlcv\n    symbol: BTC/USDT\n    timeframe: 3m\n",
        )
        .expect("parses");
        assert!(bad_tf.validate().is_err());

        let no_symbol = WatchConfig::from_yaml("watches:\n  - kind: ticker\n").expect("parses");
        assert!(no_symbol.validate().is_err());
    }

    #[test]
    fn test_rejects_empty_and_duplicate_watches() {
        let empty = WatchConfig::from_yaml("watches: []\n").expect("parses");
        assert!(empty.validate().is_err());

        let duplicate = WatchConfig::from_yaml(
            "watches:\n  - kind: ticker\n    symbol: A/B\n  - kind: ticker\n    symbol: A/B\n",
        )
        .expect("parses");
        assert!(duplicate.validate().is_err());
    }
}
