//! Test fixtures: in-memory catalog, memory-backed cart, and the canned
//! REST backend from `gearent_api::test_server`.

use std::sync::Arc;

use crate::config::StorefrontConfig;
use crate::AppState;
use gearent_core::MemoryStorage;
use gearent_db::{Database, DbConfig};

pub use gearent_api::test_server::{client_for, serve};

pub async fn state_with(storage: &MemoryStorage, api_base: &str) -> AppState {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    AppState::assemble(
        StorefrontConfig::default(),
        db,
        client_for(api_base),
        Arc::new(storage.clone()),
    )
    .await
    .unwrap()
}

pub async fn state(api_base: &str) -> AppState {
    state_with(&MemoryStorage::new(), api_base).await
}
