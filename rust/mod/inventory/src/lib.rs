pub mod api;
pub mod code;
pub mod model;
pub mod service;

use std::sync::Arc;

use axum::Router;
use granthalaya_core::Module;

use service::InventoryService;

/// Inventory module for the Granthalaya bookstore and samagri stock.
pub struct InventoryModule {
    service: Arc<InventoryService>,
}

impl InventoryModule {
    pub fn new(service: InventoryService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }

    pub fn service(&self) -> &Arc<InventoryService> {
        &self.service
    }
}

impl Module for InventoryModule {
    fn name(&self) -> &str {
        "inventory"
    }

    fn routes(&self) -> Router {
        api::router(self.service.clone())
    }
}
