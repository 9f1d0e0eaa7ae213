//! Vendor session: who is selling at the desk.

use std::sync::Arc;

use chrono::{DateTime, SubsecRound, Utc};
use kv_store::{KeyValueStore, KeyValueStoreExt, keys};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;

use crate::error::DomainError;

/// Errors that can occur during session operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum VendorError {
    #[error("Vendor name is required")]
    VendorNameRequired,

    #[error("No vendor is logged in")]
    NotLoggedIn,
}

/// The logged-in vendor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VendorSession {
    name: String,
    #[serde(with = "common::timestamp")]
    login_time: DateTime<Utc>,
}

impl VendorSession {
    pub fn new(name: impl Into<String>, login_time: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            login_time: login_time.trunc_subsecs(3),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn login_time(&self) -> DateTime<Utc> {
        self.login_time
    }
}

/// Holds the single process-wide vendor session and persists it.
pub struct VendorService<S: KeyValueStore> {
    store: S,
    session: Arc<RwLock<Option<VendorSession>>>,
}

impl<S: KeyValueStore + Clone> Clone for VendorService<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            session: Arc::clone(&self.session),
        }
    }
}

impl<S: KeyValueStore> VendorService<S> {
    /// Creates a service with nobody logged in.
    pub fn new(store: S) -> Self {
        Self {
            store,
            session: Arc::new(RwLock::new(None)),
        }
    }

    /// Creates a service and restores a persisted session, if any.
    pub async fn load(store: S) -> Result<Self, DomainError> {
        let session: Option<VendorSession> = store.load_json(keys::VENDOR_SESSION).await?;
        if let Some(session) = &session {
            tracing::info!(vendor = session.name(), "restored vendor session");
        }
        Ok(Self {
            store,
            session: Arc::new(RwLock::new(session)),
        })
    }

    /// Starts a session for `name`, replacing any current one.
    #[tracing::instrument(skip(self))]
    pub async fn login(&self, name: &str) -> Result<VendorSession, DomainError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(VendorError::VendorNameRequired.into());
        }

        let session = VendorSession::new(name, Utc::now());
        let mut current = self.session.write().await;
        self.store.set_json(keys::VENDOR_SESSION, &session).await?;
        *current = Some(session.clone());

        tracing::info!(vendor = name, "vendor logged in");
        Ok(session)
    }

    /// Ends the current session. No-op if nobody is logged in.
    #[tracing::instrument(skip(self))]
    pub async fn logout(&self) -> Result<(), DomainError> {
        let mut current = self.session.write().await;
        self.store.remove(keys::VENDOR_SESSION).await?;
        if let Some(session) = current.take() {
            tracing::info!(vendor = session.name(), "vendor logged out");
        }
        Ok(())
    }

    /// Returns the current session.
    pub async fn current(&self) -> Option<VendorSession> {
        self.session.read().await.clone()
    }

    /// Returns the current session or `NotLoggedIn`.
    pub async fn require(&self) -> Result<VendorSession, DomainError> {
        self.current()
            .await
            .ok_or_else(|| VendorError::NotLoggedIn.into())
    }
}

#[cfg(test)]
mod tests {
    use kv_store::InMemoryStore;

    use super::*;

    #[tokio::test]
    async fn test_login_trims_name_and_persists() {
        let store = InMemoryStore::new();
        let vendors = VendorService::new(store.clone());

        let session = vendors.login("  Luis  ").await.unwrap();
        assert_eq!(session.name(), "Luis");

        let persisted: VendorSession = store
            .get_json(keys::VENDOR_SESSION)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(persisted, session);
    }

    #[tokio::test]
    async fn test_blank_name_is_rejected() {
        let vendors = VendorService::new(InMemoryStore::new());
        let err = vendors.login("   ").await.unwrap_err();
        assert!(matches!(
            err,
            DomainError::Vendor(VendorError::VendorNameRequired)
        ));
        assert!(vendors.current().await.is_none());
    }

    #[tokio::test]
    async fn test_logout_clears_session() {
        let store = InMemoryStore::new();
        let vendors = VendorService::new(store.clone());
        vendors.login("Luis").await.unwrap();

        vendors.logout().await.unwrap();
        vendors.logout().await.unwrap();

        assert!(vendors.current().await.is_none());
        assert!(matches!(
            vendors.require().await,
            Err(DomainError::Vendor(VendorError::NotLoggedIn))
        ));
        assert!(!store.contains(keys::VENDOR_SESSION).await.unwrap());
    }

    #[tokio::test]
    async fn test_load_restores_session() {
        let store = InMemoryStore::new();
        store
            .set(
                keys::VENDOR_SESSION,
                r#"{"name":"Marta","loginTime":"2024-05-01T09:30:00.000Z"}"#.to_string(),
            )
            .await
            .unwrap();

        let vendors = VendorService::load(store).await.unwrap();
        let session = vendors.require().await.unwrap();
        assert_eq!(session.name(), "Marta");
        assert_eq!(
            common::timestamp::format(&session.login_time()),
            "2024-05-01T09:30:00.000Z"
        );
    }
}
