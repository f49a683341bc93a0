//! Link-owner operations on A/B experiments, gated by plan ceilings.

use std::sync::Arc;

use serde_json::json;
use tracing::info;

use crate::application::services::link_service::validate_destination;
use crate::domain::entities::{AbTest, AbTestStatus, AbVariant, NewAbTest, NewAbVariant};
use crate::domain::plan::{Plan, PlanLimits};
use crate::domain::repositories::{AbTestRepository, LinkRepository};
use crate::error::AppError;

/// Input for [`ExperimentService::add_variant`].
#[derive(Debug, Clone)]
pub struct AddVariant {
    pub test_id: i64,
    pub name: String,
    pub destination_url: String,
    pub weight: i64,
}

pub struct ExperimentService<L, A>
where
    L: LinkRepository + ?Sized,
    A: AbTestRepository + ?Sized,
{
    link_repository: Arc<L>,
    ab_test_repository: Arc<A>,
}

impl<L, A> ExperimentService<L, A>
where
    L: LinkRepository + ?Sized,
    A: AbTestRepository + ?Sized,
{
    pub fn new(link_repository: Arc<L>, ab_test_repository: Arc<A>) -> Self {
        Self {
            link_repository,
            ab_test_repository,
        }
    }

    /// Starts a running experiment on a link.
    ///
    /// The owner's running experiments across all links count against
    /// `plan`'s test ceiling. A link without an owner starts from zero.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the link does not exist.
    /// Returns [`AppError::Validation`] for a blank name or when the plan
    /// ceiling is reached.
    pub async fn create_test(&self, link_id: i64, name: &str, plan: Plan) -> Result<AbTest, AppError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::bad_request(
                "Experiment name must not be empty",
                json!({}),
            ));
        }

        let link = self
            .link_repository
            .find_by_id(link_id)
            .await?
            .ok_or_else(|| AppError::not_found("Link not found", json!({ "link_id": link_id })))?;

        let running = match link.owner_id {
            Some(owner_id) => self.ab_test_repository.count_running_for_owner(owner_id).await?,
            None => 0,
        };

        let limit = plan.limits().max_ab_tests;
        if !PlanLimits::allows_another(limit, running.max(0) as u64) {
            return Err(plan_limit_error("A/B test", plan, limit));
        }

        let test = self
            .ab_test_repository
            .create_test(NewAbTest {
                link_id,
                name: name.to_string(),
            })
            .await?;

        info!(link_id, test_id = test.id, plan = %plan, "Experiment created");

        Ok(test)
    }

    /// Adds a weighted variant to an experiment.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] for a negative weight or when the
    /// plan's variant ceiling is reached.
    /// Returns [`AppError::SsrfBlocked`] for an unsafe destination.
    /// Returns [`AppError::NotFound`] if the experiment does not exist.
    pub async fn add_variant(&self, request: AddVariant, plan: Plan) -> Result<AbVariant, AppError> {
        let weight = u32::try_from(request.weight).map_err(|_| {
            AppError::bad_request(
                "Variant weight must be a non-negative integer",
                json!({ "weight": request.weight }),
            )
        })?;

        let destination_url = validate_destination(&request.destination_url)?;

        let test = self
            .ab_test_repository
            .find_test(request.test_id)
            .await?
            .ok_or_else(|| {
                AppError::not_found("Experiment not found", json!({ "test_id": request.test_id }))
            })?;

        if test.status == AbTestStatus::Completed {
            return Err(AppError::bad_request(
                "Experiment is completed",
                json!({ "test_id": test.id }),
            ));
        }

        let existing = self.ab_test_repository.count_variants(test.id).await?;
        let limit = plan.limits().max_variants_per_test;
        if !PlanLimits::allows_another(limit, existing.max(0) as u64) {
            return Err(plan_limit_error("variant", plan, limit));
        }

        let variant = self
            .ab_test_repository
            .add_variant(NewAbVariant {
                test_id: test.id,
                name: request.name.trim().to_string(),
                destination_url,
                weight,
            })
            .await?;

        info!(test_id = test.id, variant_id = variant.id, weight, "Variant added");

        Ok(variant)
    }
}

fn plan_limit_error(what: &str, plan: Plan, limit: Option<u32>) -> AppError {
    AppError::bad_request(
        format!("{plan} plan allows at most {} {what}(s)", limit.unwrap_or(0)),
        json!({ "plan": plan.as_str(), "limit": limit }),
    )
}
