//! Checkout/checkin coordination.
//!
//! Derives per-object action eligibility, validates state-changing
//! operations locally, and forwards valid ones to the mutation boundary.
//! The staged view is never patched here; the caller refreshes it after a
//! successful mutation (see [`RefreshPlan`]).

use std::time::Instant;

use ovc_core::{
    CatalogMutation, CheckoutStatus, Error, ManagedObject, MutationRequest, Result,
};
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::filter::AppliedFilter;

/// Which actions the presentation layer should enable for an object.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ActionEligibility {
    pub can_checkout: bool,
    pub can_checkin: bool,
}

/// A state-changing operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectAction {
    Checkout,
    Checkin,
}

impl ObjectAction {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Checkout => "checkout",
            Self::Checkin => "checkin",
        }
    }
}

impl std::fmt::Display for ObjectAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// How the staged view is rebuilt after a successful mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshPlan {
    /// No filter active: reload the current user's checkouts.
    ReloadUserView,
    /// Re-run the active filter, bypassing de-duplication.
    ReapplyFilter(AppliedFilter),
}

/// Eligibility rule.
///
/// `can_checkin` requires the object to be checked out by `current_user`
/// (case-insensitive); `can_checkout` requires it not to be checked out.
pub fn evaluate(object: &ManagedObject, current_user: &str) -> ActionEligibility {
    let checked_out = object.status == CheckoutStatus::CheckedOut;
    ActionEligibility {
        can_checkout: !checked_out,
        can_checkin: checked_out && object.held_by.to_uppercase() == current_user.to_uppercase(),
    }
}

/// Displayed-status transition for `action` by `user`.
///
/// `Free -> CheckedOut` on checkout, `CheckedOut -> Free` on checkin by the
/// holder. Checking out an `Uncontrolled` object is the explicit operation
/// that brings it under control. Everything else is rejected.
pub fn transition(
    object: &ManagedObject,
    action: ObjectAction,
    user: &str,
) -> Result<CheckoutStatus> {
    match (object.status, action) {
        (CheckoutStatus::Free, ObjectAction::Checkout)
        | (CheckoutStatus::Uncontrolled, ObjectAction::Checkout) => Ok(CheckoutStatus::CheckedOut),
        (CheckoutStatus::CheckedOut, ObjectAction::Checkout) => Err(Error::validation(format!(
            "{} is already checked out by {}",
            object.name, object.held_by
        ))),
        (CheckoutStatus::CheckedOut, ObjectAction::Checkin) if object.is_held_by(user) => {
            Ok(CheckoutStatus::Free)
        }
        (CheckoutStatus::CheckedOut, ObjectAction::Checkin) => Err(Error::validation(format!(
            "{} is checked out by {}; only the holder can check it in",
            object.name, object.held_by
        ))),
        (_, ObjectAction::Checkin) => Err(Error::validation(format!(
            "{} is not checked out",
            object.name
        ))),
    }
}

/// Applies checkout/checkin operations on behalf of one user.
#[derive(Debug, Clone)]
pub struct ObjectStateCoordinator {
    current_user: String,
}

impl ObjectStateCoordinator {
    pub fn new(current_user: impl Into<String>) -> Self {
        Self {
            current_user: current_user.into(),
        }
    }

    pub fn current_user(&self) -> &str {
        &self.current_user
    }

    pub fn evaluate(&self, object: &ManagedObject) -> ActionEligibility {
        evaluate(object, &self.current_user)
    }

    /// Local preconditions; never contacts the remote boundary.
    ///
    /// `known` is the staged copy of the target, when there is one. Without
    /// it only the request fields are checked and the remote decides.
    pub fn validate(
        &self,
        action: ObjectAction,
        req: &MutationRequest,
        known: Option<&ManagedObject>,
    ) -> Result<()> {
        if req.name.trim().is_empty() {
            return Err(Error::validation("Enter the object name"));
        }
        if req.comment.trim().is_empty() {
            return Err(Error::validation(format!(
                "A comment is required for {}",
                action.label()
            )));
        }
        if let Some(object) = known {
            transition(object, action, &self.current_user)?;
        }
        Ok(())
    }

    /// Validate, then forward to the mutation boundary.
    #[instrument(
        skip(self, mutations, req, known),
        fields(
            subsystem = "staging",
            component = "coordinator",
            op = %action,
            object_name = %req.name,
        )
    )]
    pub async fn perform(
        &self,
        mutations: &dyn CatalogMutation,
        action: ObjectAction,
        req: &MutationRequest,
        known: Option<&ManagedObject>,
    ) -> Result<()> {
        self.validate(action, req, known)?;

        let start = Instant::now();
        let result = match action {
            ObjectAction::Checkout => mutations.checkout(req).await,
            ObjectAction::Checkin => mutations.checkin(req).await,
        };
        let duration_ms = start.elapsed().as_millis() as u64;

        match &result {
            Ok(()) => info!(
                object_type = %req.object_type,
                user = %self.current_user,
                duration_ms,
                "Mutation completed"
            ),
            Err(e) => warn!(error = %e, duration_ms, "Mutation failed"),
        }
        result
    }

    /// Refresh strategy after a successful mutation.
    pub fn refresh_plan(&self, active_filter: Option<&AppliedFilter>) -> RefreshPlan {
        match active_filter {
            Some(filter) => RefreshPlan::ReapplyFilter(filter.clone()),
            None => RefreshPlan::ReloadUserView,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use ovc_core::{ObjectType, SearchColumn};
    use std::sync::Mutex;

    fn obj(status: CheckoutStatus, held_by: &str) -> ManagedObject {
        ManagedObject {
            name: "PKG_ORDERS".to_string(),
            object_type: ObjectType::Package,
            status,
            held_by: held_by.to_string(),
            checkout_at: None,
            checkin_at: None,
            comment: String::new(),
            is_controlled: status != CheckoutStatus::Uncontrolled,
        }
    }

    #[derive(Default)]
    struct RecordingMutations {
        calls: Mutex<Vec<(ObjectAction, MutationRequest)>>,
    }

    #[async_trait]
    impl CatalogMutation for RecordingMutations {
        async fn checkout(&self, req: &MutationRequest) -> Result<()> {
            self.calls
                .lock()
                .unwrap()
                .push((ObjectAction::Checkout, req.clone()));
            Ok(())
        }

        async fn checkin(&self, req: &MutationRequest) -> Result<()> {
            self.calls
                .lock()
                .unwrap()
                .push((ObjectAction::Checkin, req.clone()));
            Err(Error::remote("lock table busy"))
        }
    }

    #[test]
    fn test_evaluate_holder_case_insensitive() {
        let e = evaluate(&obj(CheckoutStatus::CheckedOut, "ALICE"), "alice");
        assert_eq!(
            e,
            ActionEligibility {
                can_checkout: false,
                can_checkin: true
            }
        );
    }

    #[test]
    fn test_evaluate_other_holder() {
        let e = evaluate(&obj(CheckoutStatus::CheckedOut, "BOB"), "alice");
        assert!(!e.can_checkout);
        assert!(!e.can_checkin);
    }

    #[test]
    fn test_evaluate_free_and_uncontrolled() {
        let free = evaluate(&obj(CheckoutStatus::Free, ""), "alice");
        assert!(free.can_checkout && !free.can_checkin);

        let wild = evaluate(&obj(CheckoutStatus::Uncontrolled, ""), "alice");
        assert!(wild.can_checkout && !wild.can_checkin);
    }

    #[test]
    fn test_transitions() {
        let free = obj(CheckoutStatus::Free, "");
        assert_eq!(
            transition(&free, ObjectAction::Checkout, "A").unwrap(),
            CheckoutStatus::CheckedOut
        );
        assert!(transition(&free, ObjectAction::Checkin, "A").is_err());

        let held = obj(CheckoutStatus::CheckedOut, "ALICE");
        assert_eq!(
            transition(&held, ObjectAction::Checkin, "alice").unwrap(),
            CheckoutStatus::Free
        );
        assert!(transition(&held, ObjectAction::Checkin, "bob").unwrap_err().is_validation());
        assert!(transition(&held, ObjectAction::Checkout, "alice").is_err());

        let wild = obj(CheckoutStatus::Uncontrolled, "");
        assert_eq!(
            transition(&wild, ObjectAction::Checkout, "A").unwrap(),
            CheckoutStatus::CheckedOut
        );
        assert!(transition(&wild, ObjectAction::Checkin, "A").is_err());
    }

    #[test]
    fn test_validate_requires_name_and_comment() {
        let coord = ObjectStateCoordinator::new("ALICE");
        let no_name = MutationRequest::new(" ", ObjectType::Package, "why");
        let no_comment = MutationRequest::new("PKG", ObjectType::Package, "  ");

        assert!(coord
            .validate(ObjectAction::Checkout, &no_name, None)
            .unwrap_err()
            .is_validation());
        let err = coord
            .validate(ObjectAction::Checkout, &no_comment, None)
            .unwrap_err();
        assert_eq!(err.user_message(), "A comment is required for checkout");
    }

    #[tokio::test]
    async fn test_perform_rejects_locally_without_remote_call() {
        let coord = ObjectStateCoordinator::new("ALICE");
        let remote = RecordingMutations::default();
        let req = MutationRequest::new("PKG_ORDERS", ObjectType::Package, "");

        let err = coord
            .perform(&remote, ObjectAction::Checkout, &req, None)
            .await
            .unwrap_err();
        assert!(err.is_validation());
        assert!(remote.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_perform_rejects_non_holder_checkin() {
        let coord = ObjectStateCoordinator::new("ALICE");
        let remote = RecordingMutations::default();
        let held = obj(CheckoutStatus::CheckedOut, "BOB");
        let req = MutationRequest::new("PKG_ORDERS", ObjectType::Package, "done");

        let err = coord
            .perform(&remote, ObjectAction::Checkin, &req, Some(&held))
            .await
            .unwrap_err();
        assert!(err.is_validation());
        assert!(remote.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_perform_forwards_and_propagates_remote_error() {
        let coord = ObjectStateCoordinator::new("ALICE");
        let remote = RecordingMutations::default();
        let req = MutationRequest::new("PKG_ORDERS", ObjectType::Package, "start work");

        coord
            .perform(&remote, ObjectAction::Checkout, &req, None)
            .await
            .unwrap();
        let err = coord
            .perform(&remote, ObjectAction::Checkin, &req, None)
            .await
            .unwrap_err();
        assert!(err.is_remote());
        assert_eq!(remote.calls.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_refresh_plan() {
        let coord = ObjectStateCoordinator::new("ALICE");
        assert_eq!(coord.refresh_plan(None), RefreshPlan::ReloadUserView);

        let filter = AppliedFilter {
            column: SearchColumn::Name,
            term: "pkg".to_string(),
        };
        assert_eq!(
            coord.refresh_plan(Some(&filter)),
            RefreshPlan::ReapplyFilter(filter.clone())
        );
    }
}
