//! Points-type registry and lifecycle manager.
//!
//! Registered types live in one aggregate document per tenant scope in the
//! settings column family, mirroring how the registry is one option row in
//! the original deployment model. The slug is derived from the display name
//! at creation and is immutable thereafter.

use std::collections::BTreeMap;
use std::sync::Arc;

use tally_core::{points_type_slug, LogQuery, PointsType, Tenant, UserId};
use tally_store::Store;

use crate::error::{LedgerError, Result};
use crate::hooks::Hooks;

/// Manager for points-type settings and their cascading lifecycle.
pub struct PointsTypes {
    store: Arc<dyn Store>,
    tenant: Tenant,
    hooks: Arc<Hooks>,
}

impl PointsTypes {
    pub(crate) fn new(store: Arc<dyn Store>, tenant: Tenant, hooks: Arc<Hooks>) -> Self {
        Self {
            store,
            tenant,
            hooks,
        }
    }

    /// All registered types for this tenant scope, keyed by slug.
    ///
    /// # Errors
    ///
    /// Returns an error if the registry document cannot be read.
    pub fn all(&self) -> Result<BTreeMap<String, PointsType>> {
        Ok(self.store.get_points_types(self.tenant.network_id)?)
    }

    /// Settings for one type, if registered.
    ///
    /// # Errors
    ///
    /// Returns an error if the registry document cannot be read.
    pub fn get(&self, slug: &str) -> Result<Option<PointsType>> {
        Ok(self.all()?.remove(slug))
    }

    /// Whether a slug names a registered type.
    ///
    /// # Errors
    ///
    /// Returns an error if the registry document cannot be read.
    pub fn is_valid(&self, slug: &str) -> Result<bool> {
        Ok(self.all()?.contains_key(slug))
    }

    /// Register a new points type. The slug is derived from the display
    /// name. Returns the slug.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if the name yields an empty slug or the slug is
    /// already registered.
    pub fn create(&self, settings: PointsType) -> Result<String> {
        let slug = points_type_slug(&settings.name)
            .map_err(|e| LedgerError::invalid(e.to_string()))?;

        let mut types = self.all()?;
        if types.contains_key(&slug) {
            return Err(LedgerError::invalid(format!(
                "points type already exists: {slug}"
            )));
        }

        types.insert(slug.clone(), settings);
        self.store.put_points_types(self.tenant.network_id, &types)?;

        tracing::info!(slug = %slug, "points type created");
        Ok(slug)
    }

    /// Replace the settings of an existing type. The slug stays fixed even
    /// if the display name changes.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if the slug is not registered.
    pub fn update(&self, slug: &str, settings: PointsType) -> Result<()> {
        let mut types = self.all()?;
        if !types.contains_key(slug) {
            return Err(LedgerError::invalid(format!("unknown points type: {slug}")));
        }

        types.insert(slug.to_string(), settings);
        self.store.put_points_types(self.tenant.network_id, &types)?;
        Ok(())
    }

    /// Delete a points type, cascading to its balances, log entries, and
    /// log meta.
    ///
    /// The deregistration write is the commit point. The subsequent
    /// deletions run best-effort in sequence; a failure is logged and the
    /// routine continues, so a partial failure can orphan rows but can
    /// never resurrect the type.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if the slug is not registered, or a store error
    /// from the deregistration write itself.
    pub fn delete(&self, slug: &str) -> Result<()> {
        let mut types = self.all()?;
        let Some(settings) = types.remove(slug) else {
            return Err(LedgerError::invalid(format!("unknown points type: {slug}")));
        };
        let storage_key = settings.storage_key(slug);

        self.store.put_points_types(self.tenant.network_id, &types)?;

        match self.store.get_default_points_type(self.tenant.network_id) {
            Ok(Some(current)) if current == slug => {
                if let Err(e) = self
                    .store
                    .put_default_points_type(self.tenant.network_id, None)
                {
                    tracing::warn!(slug = %slug, error = %e, "failed to clear default points type");
                }
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(slug = %slug, error = %e, "failed to read default points type");
            }
        }

        match self.store.delete_logs(&LogQuery::for_points_type(slug)) {
            Ok(removed) => tracing::debug!(slug = %slug, removed, "deleted points type logs"),
            Err(e) => tracing::warn!(slug = %slug, error = %e, "failed to delete logs for points type"),
        }

        match self.store.delete_balances(&storage_key) {
            Ok(removed) => tracing::debug!(slug = %slug, removed, "deleted points type balances"),
            Err(e) => tracing::warn!(slug = %slug, error = %e, "failed to delete balances for points type"),
        }

        tracing::info!(slug = %slug, "points type deleted");
        Ok(())
    }

    /// The balance store row-key namespace for a type.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if the slug is not registered.
    pub fn storage_key_for(&self, slug: &str) -> Result<String> {
        let settings = self
            .get(slug)?
            .ok_or_else(|| LedgerError::invalid(format!("unknown points type: {slug}")))?;
        Ok(settings.storage_key(slug))
    }

    /// The effective minimum for a type: its configured minimum (default 0)
    /// run through the registered override chain.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if the slug is not registered.
    pub fn minimum_for(&self, slug: &str) -> Result<i64> {
        let settings = self
            .get(slug)?
            .ok_or_else(|| LedgerError::invalid(format!("unknown points type: {slug}")))?;
        Ok(self.hooks.effective_minimum(settings.base_minimum(), slug))
    }

    /// The default points type for this tenant scope, validated against the
    /// registry. A stale setting pointing at a deleted type reads as `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings cannot be read.
    pub fn default_points_type(&self) -> Result<Option<String>> {
        let Some(slug) = self
            .store
            .get_default_points_type(self.tenant.network_id)?
        else {
            return Ok(None);
        };

        if self.is_valid(&slug)? {
            Ok(Some(slug))
        } else {
            Ok(None)
        }
    }

    /// Set or clear the default points type.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` when setting a slug that is not registered.
    pub fn set_default_points_type(&self, slug: Option<&str>) -> Result<()> {
        if let Some(slug) = slug {
            if !self.is_valid(slug)? {
                return Err(LedgerError::invalid(format!("unknown points type: {slug}")));
            }
        }
        self.store
            .put_default_points_type(self.tenant.network_id, slug)?;
        Ok(())
    }

    /// Remove one user's balance and log entries (with their meta) for a
    /// type. Used when the host system purges a user.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if the slug is not registered.
    pub fn purge_user(&self, user_id: UserId, slug: &str) -> Result<()> {
        let storage_key = self.storage_key_for(slug)?;

        self.store.delete_balance(&storage_key, user_id)?;

        let mut query = LogQuery::for_user(user_id);
        query.points_type = Some(slug.to_string());
        let removed = self.store.delete_logs(&query)?;

        tracing::debug!(user_id = %user_id, slug = %slug, removed, "purged user points data");
        Ok(())
    }
}
