// crates/action-relay-core/src/runtime/store.rs
// ============================================================================
// Module: In-Memory Post Store
// Description: Mutex-guarded map implementing the post store interface.
// Purpose: Back interaction flows without a database.
// Dependencies: async-trait, crate::interfaces
// ============================================================================

//! ## Overview
//! [`InMemoryPostStore`] keeps posts in a `BTreeMap` behind a mutex. Locks
//! are held only for the map operation and never across an await point.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::core::identifiers::PostId;
use crate::core::post::Post;
use crate::interfaces::PostStore;
use crate::interfaces::StoreError;

// ============================================================================
// SECTION: Store
// ============================================================================

/// In-memory post store.
#[derive(Debug, Default)]
pub struct InMemoryPostStore {
    /// Stored posts keyed by identifier.
    posts: Mutex<BTreeMap<PostId, Post>>,
}

impl InMemoryPostStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a post.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Store`] when the store lock is poisoned.
    pub fn insert(&self, post: Post) -> Result<(), StoreError> {
        let mut guard = self.lock()?;
        guard.insert(post.id.clone(), post);
        drop(guard);
        Ok(())
    }

    /// Acquires the store lock.
    fn lock(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<PostId, Post>>, StoreError> {
        self.posts.lock().map_err(|_| StoreError::Store("post store mutex poisoned".to_string()))
    }
}

#[async_trait]
impl PostStore for InMemoryPostStore {
    async fn get_by_id(&self, post_id: &PostId) -> Result<Option<Post>, StoreError> {
        let guard = self.lock()?;
        Ok(guard.get(post_id).cloned())
    }

    async fn update(&self, post: Post) -> Result<Post, StoreError> {
        let mut guard = self.lock()?;
        let Some(slot) = guard.get_mut(&post.id) else {
            return Err(StoreError::Missing(post.id.to_string()));
        };
        slot.clone_from(&post);
        drop(guard);
        Ok(post)
    }
}
