use serde::{Deserialize, Serialize};

/// Page wiring for the stats view controller.
///
/// Defaults describe the stats page markup; a page can override any subset
/// through a JSON object (see [`ViewConfig::from_json`]).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ViewConfig {
    pub primary_selector: String,
    pub report_attribute: String,
    pub range_attribute: String,
    pub base_url_attribute: String,
    pub config_attribute: String,

    pub default_range: String,
    pub default_group: String,
    pub storage_key: String,

    pub export_link_id: String,
    /// Granularity segment of the export file name. Exports are always daily.
    pub export_granularity: String,

    pub modal: ModalConfig,
    pub csv_table_selector: String,

    /// Mirror structured `{start, end}` ranges into the URL as well.
    pub url_sync_spans: bool,
    pub log_level: String,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            primary_selector: ".primary".to_string(),
            report_attribute: "data-report".to_string(),
            range_attribute: "data-range".to_string(),
            base_url_attribute: "data-base_url".to_string(),
            config_attribute: "data-view_config".to_string(),

            default_range: "30 days".to_string(),
            default_group: "day".to_string(),
            storage_key: "stats_view".to_string(),

            export_link_id: "export_data".to_string(),
            export_granularity: "day".to_string(),

            modal: ModalConfig::default(),
            csv_table_selector: ".csv-table".to_string(),

            url_sync_spans: false,
            log_level: "info".to_string(),
        }
    }
}

impl ViewConfig {
    /// Defaults overlaid with the fields present in `json`.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ModalConfig {
    pub panel_id: String,
    pub trigger_id: String,
    pub width: u32,
}

impl Default for ModalConfig {
    fn default() -> Self {
        Self {
            panel_id: "stats-note".to_string(),
            trigger_id: "stats-note-link".to_string(),
            width: 520,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_page_markup() {
        let config = ViewConfig::default();
        assert_eq!(config.default_range, "30 days");
        assert_eq!(config.default_group, "day");
        assert_eq!(config.storage_key, "stats_view");
        assert_eq!(config.modal.width, 520);
        assert!(!config.url_sync_spans);
    }

    #[test]
    fn test_partial_override() {
        let config = ViewConfig::from_json(r#"{"url_sync_spans":true,"modal":{"width":640}}"#).unwrap();
        assert!(config.url_sync_spans);
        assert_eq!(config.modal.width, 640);
        assert_eq!(config.modal.panel_id, "stats-note");
        assert_eq!(config.primary_selector, ".primary");
    }

    #[test]
    fn test_unknown_keys_rejected() {
        assert!(ViewConfig::from_json(r#"{"storage":"local"}"#).is_err());
    }
}
