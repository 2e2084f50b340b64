// crates/action-relay-core/src/core/mutation.rs
// ============================================================================
// Module: Post Mutation
// Description: Applies integration post updates under protected-field rules.
// Purpose: Fold callback responses into stored posts without trusting them.
// Dependencies: crate::core::{envelope, post}
// ============================================================================

//! ## Overview
//! [`apply_post_update`] merges a [`PostUpdate`] into an existing [`Post`].
//! Scalar fields overwrite only when present. A supplied property mapping
//! replaces the stored one, except that host-owned keys keep their stored
//! values and attachments survive unless the update replaces them.
//! Invariants:
//! - [`PROTECTED_PROPS`] keys are never changed by an update.
//! - Applying the same update twice yields the same post.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::core::envelope::PostUpdate;
use crate::core::post::PROP_ATTACHMENTS;
use crate::core::post::PROTECTED_PROPS;
use crate::core::post::Post;
use crate::core::post::PropMap;

// ============================================================================
// SECTION: Merge
// ============================================================================

/// Returns a copy of `existing` with `update` applied.
#[must_use]
pub fn apply_post_update(existing: &Post, update: &PostUpdate) -> Post {
    let mut post = existing.clone();
    if let Some(message) = &update.message {
        post.message.clone_from(message);
    }
    if let Some(has_reactions) = update.has_reactions {
        post.has_reactions = has_reactions;
    }
    if let Some(is_pinned) = update.is_pinned {
        post.is_pinned = is_pinned;
    }
    if let Some(props) = &update.props {
        post.props = merge_props(&existing.props, props);
    }
    post
}

/// Builds the merged property mapping.
fn merge_props(existing: &PropMap, incoming: &PropMap) -> PropMap {
    let mut merged = incoming.clone();
    for key in PROTECTED_PROPS {
        match existing.get(key) {
            Some(value) => {
                merged.insert(key.to_string(), value.clone());
            }
            None => {
                merged.remove(key);
            }
        }
    }
    if !incoming.contains_key(PROP_ATTACHMENTS)
        && let Some(attachments) = existing.get(PROP_ATTACHMENTS)
    {
        merged.insert(PROP_ATTACHMENTS.to_string(), attachments.clone());
    }
    merged
}
