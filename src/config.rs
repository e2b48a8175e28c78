#[cfg(feature = "serde")]
use crate::error::GevError;
use crate::family::Scoring;
use crate::links::default_link_name;
use crate::types::Param;

/// Starting value for xi when none is configured.
pub const DEFAULT_XI_START: f64 = 0.1;

/// Everything needed to build a [`crate::GevFamily`].
///
/// Missing fields in a JSON document fall back to [`FamilyConfig::default`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct FamilyConfig {
    pub scoring: Scoring,
    pub mu_link: String,
    pub sigma_link: String,
    pub xi_link: String,
    /// Initial xi, on the response scale.
    pub xi_start: f64,
}

impl Default for FamilyConfig {
    fn default() -> Self {
        Self {
            scoring: Scoring::Fisher,
            mu_link: default_link_name(Param::Mu).to_string(),
            sigma_link: default_link_name(Param::Sigma).to_string(),
            xi_link: default_link_name(Param::Xi).to_string(),
            xi_start: DEFAULT_XI_START,
        }
    }
}

impl FamilyConfig {
    pub fn fisher() -> Self {
        Self::default()
    }

    pub fn quasi() -> Self {
        Self {
            scoring: Scoring::Quasi,
            ..Self::default()
        }
    }

    pub fn with_links(mut self, mu_link: &str, sigma_link: &str, xi_link: &str) -> Self {
        self.mu_link = mu_link.to_string();
        self.sigma_link = sigma_link.to_string();
        self.xi_link = xi_link.to_string();
        self
    }

    pub fn with_xi_start(mut self, xi_start: f64) -> Self {
        self.xi_start = xi_start;
        self
    }

    pub fn link_name(&self, param: Param) -> &str {
        match param {
            Param::Mu => &self.mu_link,
            Param::Sigma => &self.sigma_link,
            Param::Xi => &self.xi_link,
        }
    }

    #[cfg(feature = "serde")]
    pub fn to_json(&self) -> Result<String, GevError> {
        serde_json::to_string(self).map_err(|e| GevError::Input(e.to_string()))
    }

    #[cfg(feature = "serde")]
    pub fn from_json(json: &str) -> Result<Self, GevError> {
        serde_json::from_str(json).map_err(|e| GevError::Input(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = FamilyConfig::default();
        assert_eq!(config.scoring, Scoring::Fisher);
        assert_eq!(config.link_name(Param::Mu), "identity");
        assert_eq!(config.link_name(Param::Sigma), "log");
        assert_eq!(config.link_name(Param::Xi), "identity");
        assert_eq!(config.xi_start, DEFAULT_XI_START);
    }

    #[test]
    fn test_builder_methods() {
        let config = FamilyConfig::quasi()
            .with_links("log", "identity", "logshift")
            .with_xi_start(-0.1);
        assert_eq!(config.scoring, Scoring::Quasi);
        assert_eq!(config.mu_link, "log");
        assert_eq!(config.sigma_link, "identity");
        assert_eq!(config.xi_link, "logshift");
        assert_eq!(config.xi_start, -0.1);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_json_roundtrip_and_partial_documents() {
        let config = FamilyConfig::quasi().with_links("identity", "log", "logshift");
        let json = config.to_json().unwrap();
        assert_eq!(FamilyConfig::from_json(&json).unwrap(), config);

        let partial = FamilyConfig::from_json(r#"{"scoring": "quasi"}"#).unwrap();
        assert_eq!(partial, FamilyConfig::quasi());

        assert!(matches!(
            FamilyConfig::from_json("{not json"),
            Err(GevError::Input(_))
        ));
    }
}
