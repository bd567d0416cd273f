//! Application context handed to plugins at load time.
//!
//! Built once at startup and shared by reference, so there is no global
//! "not initialized" state: a plugin cannot be loaded without one.

use std::sync::Arc;

use zebras_core::{BoxedClient, ChatClient};

use crate::store::{
    AutoResponderStore, ChannelPolicyStore, Datastore, EventLogStore, InviteSettingsStore,
    MemoryStore,
};

/// The chat client and stores shared by every plugin.
#[derive(Clone)]
pub struct AppContext {
    client: BoxedClient,
    channel_policies: Arc<dyn ChannelPolicyStore>,
    auto_responders: Arc<dyn AutoResponderStore>,
    invite_settings: Arc<dyn InviteSettingsStore>,
    event_log: Arc<dyn EventLogStore>,
    datastore: Arc<dyn Datastore>,
}

impl AppContext {
    /// Uses one backend for every store.
    pub fn new<S>(client: BoxedClient, store: Arc<S>) -> Self
    where
        S: ChannelPolicyStore
            + AutoResponderStore
            + InviteSettingsStore
            + EventLogStore
            + Datastore
            + 'static,
    {
        Self {
            client,
            channel_policies: store.clone(),
            auto_responders: store.clone(),
            invite_settings: store.clone(),
            event_log: store.clone(),
            datastore: store,
        }
    }

    /// Backs every store with a fresh [`MemoryStore`].
    pub fn in_memory(client: impl ChatClient + 'static) -> Self {
        Self::new(Arc::new(client), Arc::new(MemoryStore::new()))
    }

    pub fn client(&self) -> &dyn ChatClient {
        self.client.as_ref()
    }

    pub fn channel_policies(&self) -> &dyn ChannelPolicyStore {
        self.channel_policies.as_ref()
    }

    pub fn auto_responders(&self) -> &dyn AutoResponderStore {
        self.auto_responders.as_ref()
    }

    pub fn invite_settings(&self) -> &dyn InviteSettingsStore {
        self.invite_settings.as_ref()
    }

    pub fn event_log(&self) -> &dyn EventLogStore {
        self.event_log.as_ref()
    }

    pub fn datastore(&self) -> &dyn Datastore {
        self.datastore.as_ref()
    }
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext")
            .field("datastore", &self.datastore.backend())
            .finish_non_exhaustive()
    }
}
