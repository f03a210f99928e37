use serde::Deserialize;
use tower_lsp::lsp_types::ConfigurationItem;

use mls_core::AnalyzerConfig;

use super::state::MumpsLanguageServer;

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct MumpsLspConfigSection {
    #[serde(default)]
    max_global_depth: Option<usize>,
}

impl MumpsLanguageServer {
    pub(crate) async fn load_config(&self) {
        let items = vec![ConfigurationItem {
            scope_uri: None,
            section: Some("mumps.lsp".to_string()),
        }];

        if let Ok(values) = self.client.configuration(items).await {
            if let Some(val) = values.into_iter().next() {
                if let Ok(cfg) = serde_json::from_value::<MumpsLspConfigSection>(val) {
                    if let Some(depth) = cfg.max_global_depth {
                        self.engine.set_config(AnalyzerConfig {
                            max_global_depth: depth,
                        });
                    }
                }
            }
        }
    }
}
