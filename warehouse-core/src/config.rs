use serde::{Deserialize, Serialize};

use crate::error::{LogisticsError, LogisticsResult};
use crate::types::WAREHOUSE_CAPACITY;

/// Tunables for warehouse staffing, task selection and search weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogisticsConfig {
    /// Laborers a warehouse needs to count as fully staffed
    pub required_laborers: u32,
    /// Staffing percentage required to accept or hand out goods
    pub full_staffing_pct: u32,
    /// Below this staffing percentage the worker stays idle
    pub min_task_staffing_pct: u32,
    /// Free room (loads) needed before a worker goes fetching
    pub getting_threshold: u32,
    /// Distance discount per load when picking a warehouse to fetch from
    pub getting_load_weight: i32,
    /// Distance discount per load when picking a warehouse for a trader
    pub trade_load_weight: i32,
    /// Loads destroyed by a minor curse
    pub curse_loads: u32,
    /// Quantity target given to freshly created storage policies
    pub default_quantity_target: u32,
    /// The capital feeds the city wheat, so granaries are not supplied from warehouses
    pub rome_supplies_wheat: bool,
}

impl Default for LogisticsConfig {
    fn default() -> Self {
        Self {
            required_laborers: 6,
            full_staffing_pct: 100,
            min_task_staffing_pct: 50,
            getting_threshold: 4,
            getting_load_weight: 4,
            trade_load_weight: 2,
            curse_loads: 12,
            default_quantity_target: WAREHOUSE_CAPACITY,
            rome_supplies_wheat: false,
        }
    }
}

impl LogisticsConfig {
    /// Parse a config from JSON. Missing fields fall back to defaults.
    pub fn from_json(json: &str) -> LogisticsResult<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| LogisticsError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> LogisticsResult<()> {
        if self.required_laborers == 0 {
            return Err(LogisticsError::Config(
                "required_laborers must be positive".to_string(),
            ));
        }
        if self.min_task_staffing_pct > self.full_staffing_pct {
            return Err(LogisticsError::Config(format!(
                "min_task_staffing_pct ({}) exceeds full_staffing_pct ({})",
                self.min_task_staffing_pct, self.full_staffing_pct
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = LogisticsConfig::from_json(r#"{ "curse_loads": 8 }"#).unwrap();
        assert_eq!(config.curse_loads, 8);
        assert_eq!(config.required_laborers, 6);
        assert_eq!(config.default_quantity_target, 32);
    }

    #[test]
    fn test_rejects_zero_laborers() {
        let err = LogisticsConfig::from_json(r#"{ "required_laborers": 0 }"#).unwrap_err();
        assert!(matches!(err, LogisticsError::Config(_)));
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(LogisticsConfig::from_json("not json").is_err());
    }
}
