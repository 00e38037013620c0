use std::sync::Arc;

use station_purchase::OfferService;

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
}

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<dyn OfferService>,
    pub auth: AuthConfig,
}
