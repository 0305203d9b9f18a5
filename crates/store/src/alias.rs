//! Alias repository contract and in-memory implementation.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::MenuDefinitionId;
use domain::{AliasBinding, AliasId};
use tokio::sync::RwLock;

use crate::error::Result;

/// Persisted record of aliases and which menu each points at.
#[async_trait]
pub trait AliasRepository: Send + Sync {
    /// Loads a binding by alias id. Returns `None` if it does not exist.
    async fn load(&self, alias_id: &AliasId) -> Result<Option<AliasBinding>>;

    /// Saves a binding, replacing any existing record for the alias.
    async fn save(&self, binding: AliasBinding) -> Result<()>;

    /// Deletes a binding. Deleting a missing binding is not an error.
    async fn delete(&self, alias_id: &AliasId) -> Result<()>;

    /// Lists the bindings pointing at a menu definition, oldest first.
    async fn list_by_menu_definition(&self, id: MenuDefinitionId) -> Result<Vec<AliasBinding>>;
}

/// In-memory alias repository for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAliasRepository {
    bindings: Arc<RwLock<HashMap<AliasId, AliasBinding>>>,
}

impl InMemoryAliasRepository {
    /// Creates a new empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored bindings.
    pub async fn binding_count(&self) -> usize {
        self.bindings.read().await.len()
    }
}

#[async_trait]
impl AliasRepository for InMemoryAliasRepository {
    async fn load(&self, alias_id: &AliasId) -> Result<Option<AliasBinding>> {
        Ok(self.bindings.read().await.get(alias_id).cloned())
    }

    async fn save(&self, binding: AliasBinding) -> Result<()> {
        self.bindings
            .write()
            .await
            .insert(binding.alias_id.clone(), binding);
        Ok(())
    }

    async fn delete(&self, alias_id: &AliasId) -> Result<()> {
        self.bindings.write().await.remove(alias_id);
        Ok(())
    }

    async fn list_by_menu_definition(&self, id: MenuDefinitionId) -> Result<Vec<AliasBinding>> {
        let bindings = self.bindings.read().await;
        let mut matching: Vec<AliasBinding> = bindings
            .values()
            .filter(|b| b.menu_definition_id == id)
            .cloned()
            .collect();
        matching.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.alias_id.as_str().cmp(b.alias_id.as_str()))
        });
        Ok(matching)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn binding(alias: &str, menu_id: MenuDefinitionId) -> AliasBinding {
        AliasBinding::new(AliasId::new(alias).unwrap(), menu_id)
    }

    #[tokio::test]
    async fn test_load_missing_returns_none() {
        let repo = InMemoryAliasRepository::new();
        let alias = AliasId::new("promo-a").unwrap();
        assert!(repo.load(&alias).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_load_delete() {
        let repo = InMemoryAliasRepository::new();
        let menu_id = MenuDefinitionId::new();
        let b = binding("promo-a", menu_id);

        repo.save(b.clone()).await.unwrap();
        assert_eq!(repo.binding_count().await, 1);
        assert_eq!(repo.load(&b.alias_id).await.unwrap(), Some(b.clone()));

        repo.delete(&b.alias_id).await.unwrap();
        assert!(repo.load(&b.alias_id).await.unwrap().is_none());

        // Deleting again is a no-op.
        repo.delete(&b.alias_id).await.unwrap();
    }

    #[tokio::test]
    async fn test_list_by_menu_definition_filters_and_orders() {
        let repo = InMemoryAliasRepository::new();
        let menu_a = MenuDefinitionId::new();
        let menu_b = MenuDefinitionId::new();

        repo.save(binding("promo-a", menu_a)).await.unwrap();
        repo.save(binding("promo-b", menu_a)).await.unwrap();
        repo.save(binding("other", menu_b)).await.unwrap();

        let for_a = repo.list_by_menu_definition(menu_a).await.unwrap();
        let ids: Vec<&str> = for_a.iter().map(|b| b.alias_id.as_str()).collect();
        assert_eq!(ids, vec!["promo-a", "promo-b"]);

        let for_b = repo.list_by_menu_definition(menu_b).await.unwrap();
        assert_eq!(for_b.len(), 1);
    }
}
