//! Controllers shipped with the server
//!
//! Resources are bound to these by kind name in the `[api.resources]`
//! config table.

pub mod backend;
pub mod echo;
pub mod template;

use std::sync::Arc;

pub use echo::EchoController;
pub use template::TemplateController;

use crate::registry::Catalog;
use backend::{ConnectionPool, RecordStore};

/// Every controller kind this binary can serve
pub fn catalog() -> Catalog {
    let store = Arc::new(RecordStore::new());
    let pool = Arc::new(ConnectionPool::new());

    Catalog::new()
        .with("TemplateController", move || TemplateController::new(Arc::clone(&store)))
        .with("EchoController", move || EchoController::new(Arc::clone(&pool)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_kinds() {
        assert_eq!(
            catalog().kinds().collect::<Vec<_>>(),
            vec!["EchoController", "TemplateController"]
        );
    }
}
