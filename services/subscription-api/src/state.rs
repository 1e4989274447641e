//! Application state for the Subscription API service.

use std::sync::Arc;

use tiffin_core::{
    DeliveryService, LogNotifier, SubscriptionService, SystemClock, WebhookVerifier,
};
use tiffin_db::pg::{PgDeliveryRepository, PgSubscriptionRepository};
use tiffin_db::{DbPool, Repositories};

use crate::config::Config;

/// Lifecycle service over the live repositories
pub type LiveSubscriptionService =
    SubscriptionService<PgSubscriptionRepository, PgDeliveryRepository, LogNotifier>;

/// Delivery gate over the live repositories
pub type LiveDeliveryService = DeliveryService<PgDeliveryRepository, LogNotifier>;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Subscription lifecycle service
    pub subscriptions: Arc<LiveSubscriptionService>,
    /// Per-delivery modification gate
    pub deliveries: Arc<LiveDeliveryService>,
    /// Payment webhook verifier
    pub webhook: WebhookVerifier,
    /// Database pool (for readiness checks)
    pub pool: DbPool,
    /// Configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Create new application state
    pub fn new(repos: Repositories, pool: DbPool, config: Config) -> Self {
        let core_config = config.core();
        let cutoff = core_config.cutoff_policy();
        let clock = Arc::new(SystemClock);
        let notifier = Arc::new(LogNotifier);

        let subscription_repo = Arc::new(repos.subscriptions);
        let delivery_repo = Arc::new(repos.deliveries);

        let subscriptions = SubscriptionService::new(
            core_config,
            subscription_repo,
            delivery_repo.clone(),
            notifier.clone(),
            clock.clone(),
        );
        let deliveries = DeliveryService::new(cutoff, delivery_repo, notifier, clock);

        Self {
            subscriptions: Arc::new(subscriptions),
            deliveries: Arc::new(deliveries),
            webhook: WebhookVerifier::new(&config.webhook_secret),
            pool,
            config: Arc::new(config),
        }
    }

    /// Get request timeout from config
    pub fn request_timeout(&self) -> std::time::Duration {
        self.config.request_timeout
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
