use crate::business::format::Currency;
use crate::config::helpers::{parse_bool_env, parse_string_env};
use crate::context::Theme;
use crate::error::ConfigError;

/// Initial values for the in-memory UI context providers.
#[derive(Debug, Clone)]
pub struct UiConfig {
    pub theme: Theme,
    pub sidebar_collapsed: bool,
    pub currency: Currency,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            theme: Theme::System,
            sidebar_collapsed: false,
            currency: Currency::Usd,
        }
    }
}

impl UiConfig {
    pub(crate) fn resolve() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let theme_raw = parse_string_env("UI_THEME", defaults.theme.as_str().to_string())?;
        let theme = Theme::parse(&theme_raw).ok_or_else(|| ConfigError::InvalidValue {
            key: "UI_THEME".to_string(),
            message: format!("unsupported theme '{theme_raw}'"),
        })?;
        let currency_raw = parse_string_env("UI_CURRENCY", defaults.currency.code().to_string())?;
        let currency =
            Currency::from_code(&currency_raw).ok_or_else(|| ConfigError::InvalidValue {
                key: "UI_CURRENCY".to_string(),
                message: format!("unsupported currency '{currency_raw}'"),
            })?;

        Ok(Self {
            theme,
            sidebar_collapsed: parse_bool_env("UI_SIDEBAR_COLLAPSED", defaults.sidebar_collapsed)?,
            currency,
        })
    }
}
