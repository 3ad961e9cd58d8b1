use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub invoice_prefix: String,
    pub tax_rate_percent: f64,
    pub page_size: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            invoice_prefix: "INV".to_string(),
            tax_rate_percent: 8.25,
            page_size: 25,
        }
    }
}

impl StoreConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            invoice_prefix: std::env::var("DETAILOPS_INVOICE_PREFIX")
                .unwrap_or(defaults.invoice_prefix),
            tax_rate_percent: std::env::var("DETAILOPS_TAX_RATE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.tax_rate_percent),
            page_size: std::env::var("DETAILOPS_PAGE_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.page_size),
        }
    }
}
