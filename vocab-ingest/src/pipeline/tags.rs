//! Review tag provisioning

use std::sync::Arc;
use uuid::Uuid;

use crate::error::TagCreationError;
use crate::types::TagStore;
use crate::utils::RetryPolicy;

/// Makes sure the well-known review tag exists, creating it on first use
pub struct TagEnsurer {
    tags: Arc<dyn TagStore>,
    retry: RetryPolicy,
    name: String,
    description: String,
}

impl TagEnsurer {
    pub fn new(
        tags: Arc<dyn TagStore>,
        retry: RetryPolicy,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            tags,
            retry,
            name: name.into(),
            description: description.into(),
        }
    }

    pub fn tag_name(&self) -> &str {
        &self.name
    }

    /// Id of the review tag. Name lookup is case-insensitive.
    pub async fn ensure(&self) -> Result<Uuid, TagCreationError> {
        let existing = self
            .retry
            .run("list tags", || self.tags.list())
            .await
            .map_err(TagCreationError::Lookup)?;

        if let Some(tag) = existing
            .iter()
            .find(|tag| tag.name.trim().eq_ignore_ascii_case(self.name.trim()))
        {
            tracing::debug!(tag_id = %tag.id, name = %tag.name, "Review tag found");
            return Ok(tag.id);
        }

        let created = self
            .retry
            .run("create review tag", || {
                self.tags.create(&self.name, &self.description)
            })
            .await
            .map_err(|source| TagCreationError::Create {
                name: self.name.clone(),
                source,
            })?;

        tracing::info!(tag_id = %created.id, name = %created.name, "Created review tag");
        Ok(created.id)
    }
}
