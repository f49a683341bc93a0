//! Link-owner operations on targeting rules.

use std::sync::Arc;

use serde_json::json;
use tracing::info;

use crate::application::services::link_service::validate_destination;
use crate::domain::entities::{NewTarget, Target, TargetType};
use crate::domain::repositories::{LinkRepository, TargetRepository};
use crate::error::AppError;

/// Input for [`TargetingService::add_target`].
#[derive(Debug, Clone)]
pub struct AddTarget {
    pub link_id: i64,
    pub target_type: TargetType,
    pub value: String,
    pub destination_url: String,
    pub priority: i32,
}

pub struct TargetingService<L, T>
where
    L: LinkRepository + ?Sized,
    T: TargetRepository + ?Sized,
{
    link_repository: Arc<L>,
    target_repository: Arc<T>,
}

impl<L, T> TargetingService<L, T>
where
    L: LinkRepository + ?Sized,
    T: TargetRepository + ?Sized,
{
    pub fn new(link_repository: Arc<L>, target_repository: Arc<T>) -> Self {
        Self {
            link_repository,
            target_repository,
        }
    }

    /// Adds an active target to a link.
    ///
    /// COUNTRY values are stored uppercase, every other type lowercase.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if the value is not valid for its type.
    /// Returns [`AppError::SsrfBlocked`] for an unsafe override URL.
    /// Returns [`AppError::NotFound`] if the link does not exist.
    pub async fn add_target(&self, request: AddTarget) -> Result<Target, AppError> {
        let value = request.value.trim();
        request.target_type.validate_value(value).map_err(|message| {
            AppError::bad_request(
                message,
                json!({ "type": request.target_type.as_str(), "value": value }),
            )
        })?;

        let destination_url = validate_destination(&request.destination_url)?;

        if self
            .link_repository
            .find_by_id(request.link_id)
            .await?
            .is_none()
        {
            return Err(AppError::not_found(
                "Link not found",
                json!({ "link_id": request.link_id }),
            ));
        }

        let value = match request.target_type {
            TargetType::Country => value.to_ascii_uppercase(),
            _ => value.to_ascii_lowercase(),
        };

        let target = self
            .target_repository
            .create(NewTarget {
                link_id: request.link_id,
                target_type: request.target_type,
                value,
                destination_url,
                priority: request.priority,
                is_active: true,
            })
            .await?;

        info!(
            link_id = target.link_id,
            target_id = target.id,
            target_type = %target.target_type,
            "Target added"
        );

        Ok(target)
    }

    /// Lists a link's targets in stored order.
    pub async fn list_targets(&self, link_id: i64) -> Result<Vec<Target>, AppError> {
        self.target_repository.list_for_link(link_id).await
    }
}
