use crate::application::dataset_cache::DEFAULT_TTL;
use crate::application::session_service::DEFAULT_IDLE_TIMEOUT;
use crate::domain::chart::ChartOptions;
use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerSettings,
    pub data: DataSettings,
    pub dashboard: DashboardSettings,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerSettings {
    pub bind_addr: String,
    /// Sessions untouched for this long (and with no event stream) are dropped.
    pub session_idle_secs: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            session_idle_secs: DEFAULT_IDLE_TIMEOUT.as_secs(),
        }
    }
}

impl ServerSettings {
    pub fn session_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.session_idle_secs)
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DataSettings {
    pub db_path: PathBuf,
    pub table: String,
    pub cache_ttl_secs: u64,
    pub missing_text_sentinel: String,
    pub columns: ColumnMapping,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("dados/teste.db"),
            table: "mortes".to_string(),
            cache_ttl_secs: DEFAULT_TTL.as_secs(),
            missing_text_sentinel: "Unknown".to_string(),
            columns: ColumnMapping::default(),
        }
    }
}

impl DataSettings {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

/// Column names of the fatality table.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ColumnMapping {
    pub year: String,
    pub cause: String,
    pub classification: String,
    pub age: String,
    pub rank: String,
    pub service: String,
    pub location_type: String,
    pub nature: String,
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self {
            year: "ano_mor".to_string(),
            cause: "causa".to_string(),
            classification: "classificacao".to_string(),
            age: "idade".to_string(),
            rank: "patente".to_string(),
            service: "servico".to_string(),
            location_type: "tipo_local".to_string(),
            nature: "natu".to_string(),
        }
    }
}

impl ColumnMapping {
    fn all(&self) -> [&str; 8] {
        [
            self.year.as_str(),
            self.cause.as_str(),
            self.classification.as_str(),
            self.age.as_str(),
            self.rank.as_str(),
            self.service.as_str(),
            self.location_type.as_str(),
            self.nature.as_str(),
        ]
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DashboardSettings {
    pub title: String,
    pub histogram_max_bins: usize,
    pub top_n: usize,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        let charts = ChartOptions::default();
        Self {
            title: "Firefighter Fatality Analysis".to_string(),
            histogram_max_bins: charts.histogram_max_bins,
            top_n: charts.top_n,
        }
    }
}

impl DashboardSettings {
    pub fn chart_options(&self) -> ChartOptions {
        ChartOptions {
            histogram_max_bins: self.histogram_max_bins,
            top_n: self.top_n,
        }
    }
}

/// Load `config/dashboard.*` (optional) overlaid with `DASHBOARD__*`
/// environment variables, e.g. `DASHBOARD__DATA__DB_PATH`.
pub fn load_config() -> Result<AppConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/dashboard").required(false))
        .add_source(config::Environment::with_prefix("DASHBOARD").separator("__"))
        .build()?;

    let config: AppConfig = settings.try_deserialize()?;
    config.validate()?;
    Ok(config)
}

impl AppConfig {
    pub fn validate(&self) -> Result<()> {
        if self.server.session_idle_secs == 0 {
            return Err(Error::config_validation(
                "server.session_idle_secs must be at least 1",
            ));
        }
        if self.dashboard.top_n == 0 {
            return Err(Error::config_validation("dashboard.top_n must be at least 1"));
        }
        if self.dashboard.histogram_max_bins == 0 {
            return Err(Error::config_validation(
                "dashboard.histogram_max_bins must be at least 1",
            ));
        }
        if !is_identifier(&self.data.table) {
            return Err(Error::config_validation(format!(
                "data.table '{}' is not a valid table name",
                self.data.table
            )));
        }
        if let Some(bad) = self.data.columns.all().into_iter().find(|c| !is_identifier(c)) {
            return Err(Error::config_validation(format!(
                "column '{bad}' is not a valid column name"
            )));
        }
        Ok(())
    }
}

/// Letters, digits and underscores, not starting with a digit.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_')
}
