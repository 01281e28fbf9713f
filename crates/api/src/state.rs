//! Application state shared across handlers.

use std::sync::Arc;

use database::Database;
use lifecycle::{DatabaseNotifier, LifecycleManager, ReEngagementConfig};
use playbook::{HttpSemanticIndex, PlaybookSelector, SelectorConfig};
use whatsapp_gateway::GatewayClient;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Database connection.
    pub db: Database,
    /// Conversation lifecycle manager.
    pub lifecycle: Arc<LifecycleManager<DatabaseNotifier>>,
    /// Playbook selector; `None` when no index is configured.
    pub selector: Option<Arc<PlaybookSelector<HttpSemanticIndex>>>,
    /// Semantic index client, for pushing playbook documents.
    pub index: Option<HttpSemanticIndex>,
    /// WhatsApp gateway; `None` when unreachable at startup.
    pub gateway: Option<GatewayClient>,
    /// Re-engagement sweep settings.
    pub reengage: ReEngagementConfig,
    /// API bearer token; `None` means open (development mode).
    pub api_token: Option<String>,
}

impl AppState {
    /// Create new application state.
    pub fn new(
        db: Database,
        gateway: Option<GatewayClient>,
        index: Option<HttpSemanticIndex>,
        api_token: Option<String>,
    ) -> Self {
        let lifecycle = Arc::new(LifecycleManager::new(
            db.clone(),
            DatabaseNotifier::new(db.clone()),
        ));
        let selector = index.clone().map(|index| {
            Arc::new(PlaybookSelector::new(
                db.clone(),
                index,
                SelectorConfig::from_env(),
            ))
        });

        Self {
            db,
            lifecycle,
            selector,
            index,
            gateway,
            reengage: ReEngagementConfig::from_env(),
            api_token,
        }
    }
}
