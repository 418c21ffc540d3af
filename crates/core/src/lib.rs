pub mod analysis;
pub mod chart;
pub mod dashboard;
pub mod domain;
pub mod error;
pub mod forecast;
pub mod ingest;

pub mod config {
    use anyhow::Context;
    use std::str::FromStr;

    pub const DEFAULT_MARKET_DATA_BASE_URL: &str = "https://query1.finance.yahoo.com";
    pub const DEFAULT_MARKET_DATA_AUTH_URL: &str = "https://fc.yahoo.com";
    pub const DEFAULT_MARKET_DATA_USER_AGENT: &str =
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
    pub const DEFAULT_FORECAST_HORIZON_DAYS: usize = 30;
    pub const DEFAULT_PORT: u16 = 8050;

    #[derive(Debug, Clone, Default)]
    pub struct Settings {
        pub sentry_dsn: Option<String>,
        pub market_data_base_url: Option<String>,
        pub market_data_auth_url: Option<String>,
        pub market_data_user_agent: Option<String>,
        pub market_data_timeout_secs: Option<u64>,
        pub forecast_horizon_days: Option<usize>,
        pub port: Option<u16>,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            Self::from_lookup(|key| std::env::var(key).ok())
        }

        pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
            let text = |key: &str| lookup(key).filter(|s| !s.trim().is_empty());

            Ok(Self {
                sentry_dsn: text("SENTRY_DSN"),
                market_data_base_url: text("MARKET_DATA_BASE_URL"),
                market_data_auth_url: text("MARKET_DATA_AUTH_URL"),
                market_data_user_agent: text("MARKET_DATA_USER_AGENT"),
                market_data_timeout_secs: parse_opt(
                    "MARKET_DATA_TIMEOUT_SECS",
                    text("MARKET_DATA_TIMEOUT_SECS"),
                )?,
                forecast_horizon_days: parse_opt(
                    "FORECAST_HORIZON_DAYS",
                    text("FORECAST_HORIZON_DAYS"),
                )?,
                port: parse_opt("PORT", text("PORT"))?,
            })
        }

        pub fn market_data_base_url(&self) -> &str {
            self.market_data_base_url
                .as_deref()
                .unwrap_or(DEFAULT_MARKET_DATA_BASE_URL)
        }

        pub fn market_data_auth_url(&self) -> &str {
            self.market_data_auth_url
                .as_deref()
                .unwrap_or(DEFAULT_MARKET_DATA_AUTH_URL)
        }

        pub fn market_data_user_agent(&self) -> &str {
            self.market_data_user_agent
                .as_deref()
                .unwrap_or(DEFAULT_MARKET_DATA_USER_AGENT)
        }

        pub fn market_data_timeout_secs(&self) -> u64 {
            self.market_data_timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)
        }

        pub fn port(&self) -> u16 {
            self.port.unwrap_or(DEFAULT_PORT)
        }

        pub fn require_forecast_horizon_days(&self) -> anyhow::Result<usize> {
            let days = self
                .forecast_horizon_days
                .unwrap_or(DEFAULT_FORECAST_HORIZON_DAYS);
            anyhow::ensure!(
                (1..=365).contains(&days),
                "FORECAST_HORIZON_DAYS must be 1..=365 (got {days})"
            );
            Ok(days)
        }
    }

    fn parse_opt<T>(key: &str, raw: Option<String>) -> anyhow::Result<Option<T>>
    where
        T: FromStr,
        T::Err: std::error::Error + Send + Sync + 'static,
    {
        raw.map(|s| {
            s.trim()
                .parse::<T>()
                .with_context(|| format!("{key} is not a valid number: {s:?}"))
        })
        .transpose()
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use std::collections::HashMap;

        fn settings(vars: &[(&str, &str)]) -> anyhow::Result<Settings> {
            let map: HashMap<String, String> = vars
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect();
            Settings::from_lookup(|k| map.get(k).cloned())
        }

        #[test]
        fn falls_back_to_defaults_when_unset() {
            let s = settings(&[]).unwrap();
            assert_eq!(s.market_data_base_url(), DEFAULT_MARKET_DATA_BASE_URL);
            assert_eq!(s.market_data_timeout_secs(), DEFAULT_TIMEOUT_SECS);
            assert_eq!(s.require_forecast_horizon_days().unwrap(), 30);
            assert_eq!(s.port(), 8050);
            assert!(s.sentry_dsn.is_none());
        }

        #[test]
        fn blank_values_count_as_unset() {
            let s = settings(&[("SENTRY_DSN", "  "), ("MARKET_DATA_TIMEOUT_SECS", "")]).unwrap();
            assert!(s.sentry_dsn.is_none());
            assert!(s.market_data_timeout_secs.is_none());
        }

        #[test]
        fn rejects_malformed_numbers() {
            let err = settings(&[("MARKET_DATA_TIMEOUT_SECS", "soon")]).unwrap_err();
            assert!(err.to_string().contains("MARKET_DATA_TIMEOUT_SECS"));

            let err = settings(&[("PORT", "80a0")]).unwrap_err();
            assert!(err.to_string().contains("PORT"));

            let err = settings(&[("PORT", "70000")]).unwrap_err();
            assert!(err.to_string().contains("PORT"));

            assert_eq!(settings(&[("PORT", " 9000 ")]).unwrap().port(), 9000);
        }

        #[test]
        fn rejects_out_of_range_horizon() {
            let s = settings(&[("FORECAST_HORIZON_DAYS", "0")]).unwrap();
            assert!(s.require_forecast_horizon_days().is_err());
        }
    }
}
