//! Alias registry: the single place alias invariants are enforced.

use common::{ExternalMenuId, MenuDefinitionId};
use domain::{AliasBinding, AliasId};
use gateway::ExternalMenuGateway;
use store::{AliasRepository, MenuRepository};

use crate::error::{PublishError, Result};

/// Keeps local alias bindings and platform alias state mutually consistent.
///
/// All alias invariants live here: id format, local and remote uniqueness,
/// and the rule that only a live menu can be aliased. The registry answers
/// "which aliases point at menu X" for the orchestrator; it has no
/// dependency back on the orchestrator, so the menu↔alias relationship has
/// no cycle.
pub struct AliasRegistry<G, A, M> {
    gateway: G,
    aliases: A,
    menus: M,
}

impl<G, A, M> AliasRegistry<G, A, M>
where
    G: ExternalMenuGateway,
    A: AliasRepository,
    M: MenuRepository,
{
    /// Creates a new alias registry.
    pub fn new(gateway: G, aliases: A, menus: M) -> Self {
        Self {
            gateway,
            aliases,
            menus,
        }
    }

    /// Creates an alias bound to an active, published menu.
    ///
    /// All-or-nothing at the boundary of the single `create_alias` gateway
    /// call: every check runs before it, and the local binding is written
    /// only after it succeeds, so there is never anything to compensate.
    #[tracing::instrument(skip(self))]
    pub async fn create(
        &self,
        alias_id: &str,
        menu_definition_id: MenuDefinitionId,
    ) -> Result<AliasBinding> {
        let alias_id = AliasId::new(alias_id)?;

        if self.aliases.load(&alias_id).await?.is_some() {
            return Err(PublishError::AliasConflict(alias_id));
        }

        let menu = self
            .menus
            .load(menu_definition_id)
            .await?
            .ok_or(PublishError::MenuNotFound(menu_definition_id))?;
        let external_id = match (menu.state().can_be_aliased(), menu.external_id()) {
            (true, Some(id)) => id.clone(),
            _ => return Err(PublishError::MenuNotActive(menu_definition_id)),
        };

        // An alias held remotely but unknown locally belongs to someone
        // else; creating over it would orphan theirs.
        let remote = self
            .gateway
            .list_aliases()
            .await
            .map_err(|source| PublishError::Gateway {
                op: "list_aliases".to_string(),
                source,
            })?;
        if remote.iter().any(|r| r == alias_id.as_str()) {
            return Err(PublishError::AliasExistsRemotely(alias_id));
        }

        self.gateway
            .create_alias(alias_id.as_str(), &external_id)
            .await
            .map_err(|source| PublishError::Gateway {
                op: format!("create_alias({alias_id})"),
                source,
            })?;

        let binding = AliasBinding::new(alias_id, menu_definition_id);
        self.aliases.save(binding.clone()).await?;

        tracing::info!(alias_id = %binding.alias_id, %menu_definition_id, "alias created");
        Ok(binding)
    }

    /// Repoints an alias at a different external resource.
    ///
    /// A bare passthrough to the single `update_alias` gateway call. The
    /// local binding is untouched: the alias still names the same menu
    /// definition, only its resolved external target changed.
    pub async fn repoint(
        &self,
        alias_id: &AliasId,
        new_external_id: &ExternalMenuId,
    ) -> gateway::Result<()> {
        self.gateway
            .update_alias(alias_id.as_str(), new_external_id)
            .await
    }

    /// Deletes an alias: best-effort on the gateway (a 404 means it is
    /// already gone), then the local row. Callers that own menu storage
    /// are responsible for clearing layout references to the alias.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, alias_id: &AliasId) -> Result<()> {
        match self.gateway.delete_alias(alias_id.as_str()).await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {
                tracing::warn!(%alias_id, "alias missing remotely; removing local row only");
            }
            Err(source) => {
                return Err(PublishError::Gateway {
                    op: format!("delete_alias({alias_id})"),
                    source,
                });
            }
        }

        self.aliases.delete(alias_id).await?;
        tracing::info!(%alias_id, "alias deleted");
        Ok(())
    }

    /// Returns every binding pointing at the menu, oldest first.
    pub async fn find_by_menu_definition(
        &self,
        menu_definition_id: MenuDefinitionId,
    ) -> Result<Vec<AliasBinding>> {
        Ok(self
            .aliases
            .list_by_menu_definition(menu_definition_id)
            .await?)
    }
}
