use crate::domain::price::CompanyProfile;
use crate::error::DashboardError;
use serde::{Deserialize, Serialize};

/// Company metadata as a provider reports it, before required fields are checked.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderCompanyProfile {
    pub long_name: Option<String>,
    pub short_name: Option<String>,
    pub symbol: Option<String>,
    pub sector: Option<String>,
    pub industry: Option<String>,
}

impl ProviderCompanyProfile {
    /// `requested_symbol` names the profile in errors; the reported symbol wins when present.
    pub fn validate_and_into_profile(
        self,
        requested_symbol: &str,
    ) -> Result<CompanyProfile, DashboardError> {
        let missing = |field: &'static str| DashboardError::IncompleteProfile {
            symbol: requested_symbol.to_string(),
            field,
        };

        let name = non_empty(self.long_name)
            .or_else(|| non_empty(self.short_name))
            .ok_or_else(|| missing("longName"))?;
        let symbol = non_empty(self.symbol).ok_or_else(|| missing("symbol"))?;
        let sector = non_empty(self.sector).ok_or_else(|| missing("sector"))?;
        let industry = non_empty(self.industry).ok_or_else(|| missing("industry"))?;

        Ok(CompanyProfile {
            name,
            symbol,
            sector,
            industry,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete() -> ProviderCompanyProfile {
        ProviderCompanyProfile {
            long_name: Some(" Apple Inc. ".to_string()),
            short_name: Some("Apple".to_string()),
            symbol: Some("AAPL".to_string()),
            sector: Some("Technology".to_string()),
            industry: Some("Consumer Electronics".to_string()),
        }
    }

    #[test]
    fn trims_and_accepts_complete_profile() {
        let profile = complete().validate_and_into_profile("AAPL").unwrap();
        assert_eq!(profile.name, "Apple Inc.");
        assert_eq!(profile.industry, "Consumer Electronics");
    }

    #[test]
    fn falls_back_to_short_name() {
        let mut raw = complete();
        raw.long_name = None;
        let profile = raw.validate_and_into_profile("AAPL").unwrap();
        assert_eq!(profile.name, "Apple");
    }

    #[test]
    fn reports_first_missing_field() {
        let mut raw = complete();
        raw.sector = Some("   ".to_string());
        raw.industry = None;
        let err = raw.validate_and_into_profile("SPY").unwrap_err();
        assert!(matches!(
            err,
            DashboardError::IncompleteProfile { field: "sector", ref symbol } if symbol == "SPY"
        ));
    }
}
