//! Publish orchestrator: the saga controller for menu publishing.

use common::{ExternalMenuId, MenuDefinitionId};
use domain::{AliasBinding, AliasId, MenuDefinition, MenuImage};
use gateway::{CreateMenuRequest, ExternalMenuGateway};
use store::{AliasRepository, MenuRepository};

use crate::compensation::{Compensation, CompensationLog};
use crate::error::{PublishError, Result};
use crate::phase::PublishPhase;
use crate::registry::AliasRegistry;
use crate::steps;

/// Orchestrates first-publish and republish of menus with rollback.
///
/// The platform offers no multi-step transaction, so the orchestrator
/// enforces two ordering rules itself: the replacement resource is created
/// and fully populated before any alias is touched, and the replaced
/// resource is deleted only after every alias has been moved off it. A
/// failed step unwinds the [`CompensationLog`] so no alias ever resolves
/// to a deleted resource.
///
/// One publish per menu at a time: callers serialize publish attempts for
/// the same menu definition id. Publishes of distinct menus never interact.
pub struct PublishOrchestrator<G, M, A>
where
    G: ExternalMenuGateway,
    M: MenuRepository,
    A: AliasRepository,
{
    gateway: G,
    menus: M,
    registry: AliasRegistry<G, A, M>,
}

impl<G, M, A> PublishOrchestrator<G, M, A>
where
    G: ExternalMenuGateway + Clone,
    M: MenuRepository + Clone,
    A: AliasRepository,
{
    /// Creates a new publish orchestrator.
    pub fn new(gateway: G, menus: M, aliases: A) -> Self {
        let registry = AliasRegistry::new(gateway.clone(), aliases, menus.clone());
        Self {
            gateway,
            menus,
            registry,
        }
    }

    /// Returns a reference to the underlying alias registry.
    pub fn registry(&self) -> &AliasRegistry<G, A, M> {
        &self.registry
    }

    /// Publishes a menu: creates its resource on the platform, or replaces
    /// the live resource while keeping every alias valid throughout.
    ///
    /// Dispatches to first-publish or republish based on whether the menu
    /// already holds an external id. Returns the external id the menu is
    /// live under.
    #[tracing::instrument(skip(self), fields(saga_type = steps::SAGA_TYPE))]
    pub async fn publish(&self, menu_definition_id: MenuDefinitionId) -> Result<ExternalMenuId> {
        metrics::counter!("publish_executions_total").increment(1);
        let publish_start = std::time::Instant::now();

        let menu = self
            .menus
            .load(menu_definition_id)
            .await?
            .ok_or(PublishError::MenuNotFound(menu_definition_id))?;

        let result = match menu.external_id().cloned() {
            None => self.first_publish(menu).await,
            Some(old) => self.republish(menu, old).await,
        };

        metrics::histogram!("publish_duration_seconds")
            .record(publish_start.elapsed().as_secs_f64());
        match &result {
            Ok(external_id) => {
                metrics::counter!("publish_completed").increment(1);
                tracing::info!(%menu_definition_id, %external_id, "publish completed");
            }
            Err(error) => {
                metrics::counter!("publish_failed").increment(1);
                tracing::warn!(%menu_definition_id, %error, "publish failed");
            }
        }
        result
    }

    /// First publish: validate, create, upload, then bind the suggested
    /// alias. Nothing external survives a failure.
    async fn first_publish(&self, mut menu: MenuDefinition) -> Result<ExternalMenuId> {
        let menu_id = menu.id();
        let image = Self::require_publishable(&menu)?;
        let mut log = CompensationLog::new();

        tracing::info!(step = steps::STEP_VALIDATE_LAYOUT, "publish step started");
        self.gateway
            .validate_layout(menu.layout())
            .await
            .map_err(PublishError::LayoutRejected)?;

        tracing::info!(step = steps::STEP_CREATE_MENU, "publish step started");
        let external_id = self
            .gateway
            .create_menu(Self::create_request(&menu))
            .await
            .map_err(|source| PublishError::StepFailed {
                step: steps::STEP_CREATE_MENU.to_string(),
                phase: PublishPhase::Validated,
                source,
            })?;
        log.record(Compensation::DeleteMenu {
            external_id: external_id.clone(),
        });

        tracing::info!(step = steps::STEP_UPLOAD_IMAGE, "publish step started");
        if let Err(source) = self.gateway.upload_image(&external_id, &image).await {
            let failures = log.unwind(&self.gateway).await;
            return Err(PublishError::step_failed(
                steps::STEP_UPLOAD_IMAGE,
                PublishPhase::Created,
                source,
                failures,
            ));
        }

        menu.mark_published(external_id.clone())?;
        if let Err(e) = self.menus.save(menu.clone()).await {
            // The resource is live but the local record cannot say so;
            // take it down again rather than leave the two disagreeing.
            let failures = log.unwind(&self.gateway).await;
            if !failures.is_empty() {
                tracing::error!(
                    %menu_id,
                    %external_id,
                    "created resource could not be deleted after a failed save"
                );
            }
            return Err(e.into());
        }

        if let Some(alias_id) = menu.suggested_alias_id() {
            self.create_suggested_alias(alias_id, menu_id).await;
        }

        Ok(external_id)
    }

    /// Republish: create and populate the replacement, move every alias
    /// onto it, and only then delete the replaced resource. A failure
    /// after aliases have started moving repoints them back at the old
    /// resource, which is still fully intact.
    async fn republish(
        &self,
        mut menu: MenuDefinition,
        old: ExternalMenuId,
    ) -> Result<ExternalMenuId> {
        let menu_id = menu.id();
        let image = Self::require_publishable(&menu)?;
        let mut log = CompensationLog::new();

        // Snapshot of every alias that must follow the menu to its
        // replacement resource.
        let aliases = self.registry.find_by_menu_definition(menu_id).await?;

        tracing::info!(step = steps::STEP_VALIDATE_LAYOUT, "publish step started");
        self.gateway
            .validate_layout(menu.layout())
            .await
            .map_err(PublishError::LayoutRejected)?;

        tracing::info!(step = steps::STEP_CREATE_MENU, "publish step started");
        let new = self
            .gateway
            .create_menu(Self::create_request(&menu))
            .await
            .map_err(|source| PublishError::StepFailed {
                step: steps::STEP_CREATE_MENU.to_string(),
                phase: PublishPhase::Validated,
                source,
            })?;
        log.record(Compensation::DeleteMenu {
            external_id: new.clone(),
        });

        tracing::info!(step = steps::STEP_UPLOAD_IMAGE, "publish step started");
        if let Err(source) = self.gateway.upload_image(&new, &image).await {
            let failures = log.unwind(&self.gateway).await;
            return Err(PublishError::step_failed(
                steps::STEP_UPLOAD_IMAGE,
                PublishPhase::Created,
                source,
                failures,
            ));
        }

        // Move the aliases in their original binding order. Each success
        // records its undo before the next is attempted.
        for binding in &aliases {
            tracing::info!(
                step = steps::STEP_REPOINT_ALIAS,
                alias_id = %binding.alias_id,
                "publish step started"
            );
            match self.registry.repoint(&binding.alias_id, &new).await {
                Ok(()) => log.record(Compensation::RepointAlias {
                    alias_id: binding.alias_id.clone(),
                    external_id: old.clone(),
                }),
                Err(source) => {
                    let failures = log.unwind(&self.gateway).await;
                    return Err(PublishError::step_failed(
                        format!("{}({})", steps::STEP_REPOINT_ALIAS, binding.alias_id),
                        PublishPhase::Imaged,
                        source,
                        failures,
                    ));
                }
            }
        }

        // The old resource goes strictly last and is non-critical: nothing
        // references it anymore, so a failed delete is a leak, not an
        // outage.
        tracing::info!(step = steps::STEP_DELETE_OLD_MENU, "publish step started");
        if let Err(error) = self.gateway.delete_menu(&old).await
            && !error.is_not_found()
        {
            tracing::warn!(
                external_id = %old,
                %error,
                "failed to delete replaced menu; leaving orphaned resource"
            );
        }

        menu.record_republish(new.clone())?;
        if let Err(e) = self.menus.save(menu.clone()).await {
            // Too late to compensate: the old resource is gone and every
            // alias already resolves to the replacement. The stale local
            // record is the only divergence; an operator must re-save it.
            tracing::error!(
                %menu_id,
                external_id = %new,
                error = %e,
                "republish committed on the platform but the local record \
                 could not be saved; manual intervention required"
            );
            return Err(e.into());
        }

        if let Some(alias_id) = menu.suggested_alias_id()
            && !aliases.iter().any(|b| b.alias_id.as_str() == alias_id)
        {
            self.create_suggested_alias(alias_id, menu_id).await;
        }

        Ok(new)
    }

    /// Best-effort creation of the menu's suggested alias. The menu is
    /// already live; a missing convenience alias never fails the publish.
    async fn create_suggested_alias(&self, alias_id: &str, menu_id: MenuDefinitionId) {
        tracing::info!(
            step = steps::STEP_CREATE_SUGGESTED_ALIAS,
            alias_id,
            "publish step started"
        );
        if let Err(error) = self.registry.create(alias_id, menu_id).await {
            tracing::warn!(
                alias_id,
                %error,
                "suggested alias creation failed; menu is live without it"
            );
        }
    }

    /// Creates an alias bound to a published menu.
    pub async fn create_alias(
        &self,
        alias_id: &str,
        menu_definition_id: MenuDefinitionId,
    ) -> Result<AliasBinding> {
        self.registry.create(alias_id, menu_definition_id).await
    }

    /// Deletes an alias and clears every stored layout reference to it,
    /// so no menu keeps a switch action naming a dead alias.
    #[tracing::instrument(skip(self))]
    pub async fn delete_alias(&self, alias_id: &str) -> Result<()> {
        let alias_id = AliasId::new(alias_id)?;
        self.registry.delete(&alias_id).await?;

        for mut menu in self.menus.list().await? {
            let cleared = menu.clear_alias_references(alias_id.as_str());
            if cleared > 0 {
                tracing::info!(
                    menu_id = %menu.id(),
                    %alias_id,
                    cleared,
                    "cleared switch references to deleted alias"
                );
                self.menus.save(menu).await?;
            }
        }
        Ok(())
    }

    /// Lists the alias bindings pointing at a menu definition.
    pub async fn list_aliases_for(
        &self,
        menu_definition_id: MenuDefinitionId,
    ) -> Result<Vec<AliasBinding>> {
        self.registry.find_by_menu_definition(menu_definition_id).await
    }

    /// Makes a published menu the account-wide default.
    #[tracing::instrument(skip(self))]
    pub async fn set_platform_default(&self, menu_definition_id: MenuDefinitionId) -> Result<()> {
        let menu = self
            .menus
            .load(menu_definition_id)
            .await?
            .ok_or(PublishError::MenuNotFound(menu_definition_id))?;
        let external_id = match (menu.state().can_be_aliased(), menu.external_id()) {
            (true, Some(id)) => id.clone(),
            _ => return Err(PublishError::MenuNotActive(menu_definition_id)),
        };

        self.gateway
            .set_platform_default(&external_id)
            .await
            .map_err(|source| PublishError::Gateway {
                op: "set_platform_default".to_string(),
                source,
            })
    }

    /// Clears the account-wide default menu.
    pub async fn clear_platform_default(&self) -> Result<()> {
        self.gateway
            .clear_platform_default()
            .await
            .map_err(|source| PublishError::Gateway {
                op: "clear_platform_default".to_string(),
                source,
            })
    }

    /// Withdraws an active menu from the platform: deletes its resource
    /// and marks it `Inactive`, keeping the external id as a record.
    ///
    /// Refused while any alias still resolves to the menu — deleting the
    /// resource out from under a live alias is exactly the dangling
    /// reference the publish protocol exists to prevent.
    #[tracing::instrument(skip(self))]
    pub async fn withdraw(&self, menu_definition_id: MenuDefinitionId) -> Result<()> {
        let mut menu = self
            .menus
            .load(menu_definition_id)
            .await?
            .ok_or(PublishError::MenuNotFound(menu_definition_id))?;

        let bound = self.registry.find_by_menu_definition(menu_definition_id).await?;
        if !bound.is_empty() {
            return Err(PublishError::AliasesStillBound {
                menu_id: menu_definition_id,
                count: bound.len(),
            });
        }

        menu.mark_withdrawn()?;
        let external_id = menu
            .external_id()
            .cloned()
            .ok_or(PublishError::MenuNotActive(menu_definition_id))?;

        match self.gateway.delete_menu(&external_id).await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {
                tracing::warn!(%external_id, "menu already absent remotely");
            }
            Err(source) => {
                return Err(PublishError::Gateway {
                    op: format!("delete_menu({external_id})"),
                    source,
                });
            }
        }

        self.menus.save(menu).await?;
        tracing::info!(%menu_definition_id, %external_id, "menu withdrawn");
        Ok(())
    }

    fn create_request(menu: &MenuDefinition) -> CreateMenuRequest {
        CreateMenuRequest {
            name: menu.name().to_string(),
            chat_bar_text: menu.chat_bar_text().to_string(),
            selected: menu.selected(),
            layout: menu.layout().clone(),
        }
    }

    fn require_publishable(menu: &MenuDefinition) -> Result<MenuImage> {
        if menu.layout().is_empty() {
            return Err(PublishError::IncompleteMenu {
                menu_id: menu.id(),
                reason: "layout has no tap areas".to_string(),
            });
        }
        match menu.image() {
            Some(image) => Ok(image.clone()),
            None => Err(PublishError::IncompleteMenu {
                menu_id: menu.id(),
                reason: "no image attached".to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::{Bounds, ImageSize, MenuLayout, MenuState, TapAction, TapArea};
    use gateway::InMemoryMenuGateway;
    use store::{InMemoryAliasRepository, InMemoryMenuRepository};

    type TestOrchestrator =
        PublishOrchestrator<InMemoryMenuGateway, InMemoryMenuRepository, InMemoryAliasRepository>;

    fn setup() -> (TestOrchestrator, InMemoryMenuGateway, InMemoryMenuRepository) {
        let gateway = InMemoryMenuGateway::new();
        let menus = InMemoryMenuRepository::new();
        let aliases = InMemoryAliasRepository::new();
        let orchestrator = PublishOrchestrator::new(gateway.clone(), menus.clone(), aliases);
        (orchestrator, gateway, menus)
    }

    fn layout() -> MenuLayout {
        MenuLayout::new(
            ImageSize::new(2500, 1686),
            vec![TapArea::new(
                Bounds::new(0, 0, 2500, 1686),
                TapAction::Message {
                    text: "hi".to_string(),
                },
            )],
        )
    }

    fn publishable_menu() -> MenuDefinition {
        let mut menu = MenuDefinition::new("main", layout());
        menu.set_image(MenuImage::new(vec![0u8; 256], 2500, 1686, "image/png"));
        menu
    }

    async fn saved_menu(menus: &InMemoryMenuRepository, menu: MenuDefinition) -> MenuDefinitionId {
        let id = menu.id();
        menus.save(menu).await.unwrap();
        id
    }

    #[tokio::test]
    async fn test_first_publish_happy_path() {
        let (orchestrator, gateway, menus) = setup();
        let id = saved_menu(&menus, publishable_menu()).await;

        let external_id = orchestrator.publish(id).await.unwrap();

        assert!(gateway.has_menu(&external_id));
        assert!(gateway.image_uploaded(&external_id));

        let menu = menus.load(id).await.unwrap().unwrap();
        assert_eq!(menu.state(), MenuState::Active);
        assert_eq!(menu.external_id(), Some(&external_id));
        assert!(menu.published_at().is_some());
    }

    #[tokio::test]
    async fn test_publish_unknown_menu() {
        let (orchestrator, _, _) = setup();
        let result = orchestrator.publish(MenuDefinitionId::new()).await;
        assert!(matches!(result, Err(PublishError::MenuNotFound(_))));
    }

    #[tokio::test]
    async fn test_publish_without_image_fails_fast() {
        let (orchestrator, gateway, menus) = setup();
        let id = saved_menu(&menus, MenuDefinition::new("bare", layout())).await;

        let result = orchestrator.publish(id).await;
        assert!(matches!(result, Err(PublishError::IncompleteMenu { .. })));
        assert_eq!(gateway.calls().total(), 0);
    }

    #[tokio::test]
    async fn test_layout_rejection_creates_nothing() {
        let (orchestrator, gateway, menus) = setup();
        let mut menu = MenuDefinition::new("bad", MenuLayout::default());
        menu.set_layout(MenuLayout::new(ImageSize::new(2500, 1686), vec![]));
        menu.set_image(MenuImage::new(vec![0u8; 64], 2500, 1686, "image/png"));
        let id = saved_menu(&menus, menu).await;

        let result = orchestrator.publish(id).await;
        assert!(matches!(result, Err(PublishError::IncompleteMenu { .. })));

        // An out-of-range area passes the local completeness check but is
        // rejected by platform validation, before anything is created.
        let mut menu = MenuDefinition::new("bad2", layout());
        menu.set_layout(MenuLayout::new(
            ImageSize::new(2500, 1686),
            vec![TapArea::new(
                Bounds::new(2400, 0, 500, 100),
                TapAction::Postback {
                    data: "x".to_string(),
                },
            )],
        ));
        menu.set_image(MenuImage::new(vec![0u8; 64], 2500, 1686, "image/png"));
        let id = saved_menu(&menus, menu).await;

        let result = orchestrator.publish(id).await;
        assert!(matches!(result, Err(PublishError::LayoutRejected(_))));
        assert_eq!(gateway.menu_count(), 0);

        let menu = menus.load(id).await.unwrap().unwrap();
        assert_eq!(menu.state(), MenuState::Draft);
        assert!(menu.external_id().is_none());
    }

    #[tokio::test]
    async fn test_upload_failure_deletes_created_resource() {
        let (orchestrator, gateway, menus) = setup();
        let id = saved_menu(&menus, publishable_menu()).await;
        gateway.set_fail_on_upload(true);

        let result = orchestrator.publish(id).await;
        assert!(matches!(
            result,
            Err(PublishError::StepFailed { ref step, .. }) if step == steps::STEP_UPLOAD_IMAGE
        ));

        // The created resource was compensated away.
        assert_eq!(gateway.menu_count(), 0);
        let menu = menus.load(id).await.unwrap().unwrap();
        assert!(menu.external_id().is_none());
        assert_eq!(menu.state(), MenuState::Draft);
    }

    #[tokio::test]
    async fn test_first_publish_creates_suggested_alias() {
        let (orchestrator, gateway, menus) = setup();
        let mut menu = publishable_menu();
        menu.set_suggested_alias_id(Some("promo-a".to_string()));
        let id = saved_menu(&menus, menu).await;

        let external_id = orchestrator.publish(id).await.unwrap();

        let bindings = orchestrator.list_aliases_for(id).await.unwrap();
        assert_eq!(bindings.len(), 1);
        assert_eq!(bindings[0].alias_id.as_str(), "promo-a");
        assert_eq!(gateway.alias_target("promo-a"), Some(external_id));
    }

    #[tokio::test]
    async fn test_suggested_alias_failure_does_not_fail_publish() {
        let (orchestrator, gateway, menus) = setup();
        let mut menu = publishable_menu();
        menu.set_suggested_alias_id(Some("promo-a".to_string()));
        let id = saved_menu(&menus, menu).await;
        gateway.set_fail_on_create_alias(true);

        let external_id = orchestrator.publish(id).await.unwrap();

        assert!(gateway.has_menu(&external_id));
        assert!(orchestrator.list_aliases_for(id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_republish_replaces_resource_and_repoints_aliases() {
        let (orchestrator, gateway, menus) = setup();
        let id = saved_menu(&menus, publishable_menu()).await;

        let first = orchestrator.publish(id).await.unwrap();
        orchestrator.create_alias("promo-a", id).await.unwrap();

        let second = orchestrator.publish(id).await.unwrap();
        assert_ne!(first, second);

        assert!(!gateway.has_menu(&first));
        assert!(gateway.has_menu(&second));
        assert_eq!(gateway.alias_target("promo-a"), Some(second.clone()));
        assert!(gateway.dangling_aliases().is_empty());

        let menu = menus.load(id).await.unwrap().unwrap();
        assert_eq!(menu.external_id(), Some(&second));
        assert_eq!(menu.previous_external_id(), Some(&first));
        assert_eq!(menu.state(), MenuState::Active);
    }

    #[tokio::test]
    async fn test_delete_alias_clears_layout_references() {
        let (orchestrator, gateway, menus) = setup();
        let id = saved_menu(&menus, publishable_menu()).await;
        orchestrator.publish(id).await.unwrap();
        orchestrator.create_alias("promo-a", id).await.unwrap();

        // A second menu whose layout switches to the alias.
        let mut other = MenuDefinition::new(
            "other",
            MenuLayout::new(
                ImageSize::new(2500, 1686),
                vec![TapArea::new(
                    Bounds::new(0, 0, 2500, 1686),
                    TapAction::SwitchMenu {
                        alias_id: "promo-a".to_string(),
                        data: "switch".to_string(),
                    },
                )],
            ),
        );
        other.set_image(MenuImage::new(vec![0u8; 64], 2500, 1686, "image/png"));
        let other_id = saved_menu(&menus, other).await;

        orchestrator.delete_alias("promo-a").await.unwrap();

        assert_eq!(gateway.alias_count(), 0);
        let other = menus.load(other_id).await.unwrap().unwrap();
        assert!(other.layout().referenced_aliases().is_empty());
    }

    #[tokio::test]
    async fn test_set_and_clear_platform_default() {
        let (orchestrator, gateway, menus) = setup();
        let id = saved_menu(&menus, publishable_menu()).await;
        let external_id = orchestrator.publish(id).await.unwrap();

        orchestrator.set_platform_default(id).await.unwrap();
        assert_eq!(gateway.platform_default(), Some(external_id));

        orchestrator.clear_platform_default().await.unwrap();
        assert_eq!(gateway.platform_default(), None);
    }

    #[tokio::test]
    async fn test_set_default_requires_published_menu() {
        let (orchestrator, _, menus) = setup();
        let id = saved_menu(&menus, publishable_menu()).await;

        let result = orchestrator.set_platform_default(id).await;
        assert!(matches!(result, Err(PublishError::MenuNotActive(_))));
    }

    #[tokio::test]
    async fn test_withdraw_deletes_resource_and_keeps_external_id() {
        let (orchestrator, gateway, menus) = setup();
        let id = saved_menu(&menus, publishable_menu()).await;
        let external_id = orchestrator.publish(id).await.unwrap();

        orchestrator.withdraw(id).await.unwrap();

        assert!(!gateway.has_menu(&external_id));
        let menu = menus.load(id).await.unwrap().unwrap();
        assert_eq!(menu.state(), MenuState::Inactive);
        assert_eq!(menu.external_id(), Some(&external_id));
    }

    #[tokio::test]
    async fn test_withdraw_refused_while_aliases_bound() {
        let (orchestrator, gateway, menus) = setup();
        let id = saved_menu(&menus, publishable_menu()).await;
        let external_id = orchestrator.publish(id).await.unwrap();
        orchestrator.create_alias("promo-a", id).await.unwrap();

        let result = orchestrator.withdraw(id).await;
        assert!(matches!(
            result,
            Err(PublishError::AliasesStillBound { count: 1, .. })
        ));
        assert!(gateway.has_menu(&external_id));
    }

    #[tokio::test]
    async fn test_withdraw_draft_is_rejected() {
        let (orchestrator, _, menus) = setup();
        let id = saved_menu(&menus, publishable_menu()).await;

        let result = orchestrator.withdraw(id).await;
        assert!(matches!(result, Err(PublishError::Domain(_))));
    }
}
