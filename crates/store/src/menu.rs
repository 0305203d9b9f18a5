//! Menu repository contract and in-memory implementation.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use common::MenuDefinitionId;
use domain::MenuDefinition;
use tokio::sync::RwLock;

use crate::error::{Result, StoreError};

/// Persisted record of each menu definition and its publish state.
#[async_trait]
pub trait MenuRepository: Send + Sync {
    /// Loads a menu definition by id. Returns `None` if it does not exist.
    async fn load(&self, id: MenuDefinitionId) -> Result<Option<MenuDefinition>>;

    /// Saves a menu definition, replacing any existing record.
    async fn save(&self, menu: MenuDefinition) -> Result<()>;

    /// Lists every stored menu definition.
    async fn list(&self) -> Result<Vec<MenuDefinition>>;
}

/// In-memory menu repository for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryMenuRepository {
    menus: Arc<RwLock<HashMap<MenuDefinitionId, MenuDefinition>>>,
    fail_on_save: Arc<AtomicBool>,
}

impl InMemoryMenuRepository {
    /// Creates a new empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures `save` to fail with a backend error.
    pub fn set_fail_on_save(&self, fail: bool) {
        self.fail_on_save.store(fail, Ordering::SeqCst);
    }

    /// Returns the number of stored menus.
    pub async fn menu_count(&self) -> usize {
        self.menus.read().await.len()
    }
}

#[async_trait]
impl MenuRepository for InMemoryMenuRepository {
    async fn load(&self, id: MenuDefinitionId) -> Result<Option<MenuDefinition>> {
        Ok(self.menus.read().await.get(&id).cloned())
    }

    async fn save(&self, menu: MenuDefinition) -> Result<()> {
        if self.fail_on_save.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("save unavailable".to_string()));
        }
        self.menus.write().await.insert(menu.id(), menu);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<MenuDefinition>> {
        let menus = self.menus.read().await;
        let mut all: Vec<MenuDefinition> = menus.values().cloned().collect();
        all.sort_by_key(|m| m.created_at());
        Ok(all)
    }
}
