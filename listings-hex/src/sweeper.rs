//! Background worker that expires unanswered charges.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{MissedTickBehavior, interval};
use tracing::{error, info, instrument};

use listings_types::PaymentGateway;

use crate::service::{FeaturedListingService, Store};

/// Default pause between sweeps.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(120);

pub struct ExpirySweeper<R: Store, G: PaymentGateway> {
    service: Arc<FeaturedListingService<R, G>>,
    every: Duration,
}

impl<R: Store, G: PaymentGateway> ExpirySweeper<R, G> {
    pub fn new(service: Arc<FeaturedListingService<R, G>>, every: Duration) -> Self {
        Self { service, every }
    }

    /// Sweeps forever. Errors are logged and the next tick tries again.
    #[instrument(skip(self))]
    pub async fn run(self) {
        info!(
            "Starting expiry sweeper every {:?}, window {} min",
            self.every,
            self.service.expiry_window().num_minutes()
        );

        let mut ticker = interval(self.every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            self.sweep_once().await;
        }
    }

    async fn sweep_once(&self) {
        match self.service.expire_stale_requests().await {
            Ok(0) => {}
            Ok(n) => info!("Expired {} stale payment requests", n),
            Err(e) => error!("Expiry sweep failed: {}", e),
        }
    }
}
