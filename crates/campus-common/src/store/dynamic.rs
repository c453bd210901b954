//! Kind-dispatched store access
//!
//! Pages address records by [`EntityKind`] slug rather than by type. These
//! entry points resolve the kind to its record type and return JSON values,
//! going through exactly the same scoped operations as the typed API.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use super::{Filter, Resource, Store};
use crate::domain::*;
use crate::error::{CampusError, CampusResult};
use crate::identity::Caller;
use crate::policy::{EntityKind, Transition};

/// Binds `$T` to the record type of `$kind` and evaluates `$body`
macro_rules! for_kind {
    ($kind:expr, $T:ident => $body:expr) => {
        match $kind {
            EntityKind::Account => { type $T = Account; $body }
            EntityKind::BackgroundCheck => { type $T = BackgroundCheck; $body }
            EntityKind::CourseCategory => { type $T = CourseCategory; $body }
            EntityKind::Course => { type $T = Course; $body }
            EntityKind::CourseModule => { type $T = CourseModule; $body }
            EntityKind::InstructorProfile => { type $T = InstructorProfile; $body }
            EntityKind::Assessment => { type $T = Assessment; $body }
            EntityKind::StudentProfile => { type $T = StudentProfile; $body }
            EntityKind::Enrollment => { type $T = Enrollment; $body }
            EntityKind::Attendance => { type $T = Attendance; $body }
            EntityKind::AssessmentResult => { type $T = AssessmentResult; $body }
            EntityKind::ProgressReport => { type $T = ProgressReport; $body }
            EntityKind::Placement => { type $T = Placement; $body }
            EntityKind::EmployerProfile => { type $T = EmployerProfile; $body }
            EntityKind::JobPosting => { type $T = JobPosting; $body }
            EntityKind::JobApplication => { type $T = JobApplication; $body }
            EntityKind::RehireRequest => { type $T = RehireRequest; $body }
            EntityKind::EmployerFeedback => { type $T = EmployerFeedback; $body }
            EntityKind::Certificate => { type $T = Certificate; $body }
            EntityKind::CompetencyAssessment => { type $T = CompetencyAssessment; $body }
            EntityKind::TuitionFee => { type $T = TuitionFee; $body }
            EntityKind::Payment => { type $T = Payment; $body }
            EntityKind::PlacementFee => { type $T = PlacementFee; $body }
            EntityKind::Payroll => { type $T = Payroll; $body }
            EntityKind::Expense => { type $T = Expense; $body }
            EntityKind::Invoice => { type $T = Invoice; $body }
            EntityKind::FinancialReport => { type $T = FinancialReport; $body }
        }
    };
}

fn to_value<T: Serialize>(value: &T) -> CampusResult<Value> {
    serde_json::to_value(value).map_err(|e| CampusError::Internal(format!("failed to encode record: {}", e)))
}

fn from_value<I: DeserializeOwned>(input: Value) -> CampusResult<I> {
    serde_json::from_value(input).map_err(|e| CampusError::invalid("body", e.to_string()))
}

impl Store {
    pub fn list_values(&self, caller: &Caller, kind: EntityKind, filter: &Filter) -> CampusResult<Vec<Value>> {
        for_kind!(kind, T => {
            self.list::<T>(caller, filter)?.iter().map(to_value).collect()
        })
    }

    pub fn get_value(&self, caller: &Caller, kind: EntityKind, id: Uuid) -> CampusResult<Value> {
        for_kind!(kind, T => to_value(&self.get::<T>(caller, id)?))
    }

    /// Creates a record from a JSON input of the kind's shape
    pub fn create_value(&self, caller: &Caller, kind: EntityKind, input: Value) -> CampusResult<Value> {
        for_kind!(kind, T => {
            let input: <T as Resource>::Input = from_value(input)?;
            to_value(&self.create::<T>(caller, input)?)
        })
    }

    pub fn update_value(&self, caller: &Caller, kind: EntityKind, id: Uuid, input: Value) -> CampusResult<Value> {
        for_kind!(kind, T => {
            let input: <T as Resource>::Input = from_value(input)?;
            to_value(&self.update::<T>(caller, id, input)?)
        })
    }

    pub fn delete_kind(&self, caller: &Caller, kind: EntityKind, id: Uuid) -> CampusResult<()> {
        for_kind!(kind, T => self.delete::<T>(caller, id))
    }

    /// Runs a transition on a kind that supports it
    pub fn transition_kind(
        &self,
        caller: &Caller,
        kind: EntityKind,
        id: Uuid,
        transition: Transition,
    ) -> CampusResult<Value> {
        match kind {
            EntityKind::BackgroundCheck => to_value(&self.transition::<BackgroundCheck>(caller, id, transition)?.record),
            EntityKind::Enrollment => to_value(&self.transition::<Enrollment>(caller, id, transition)?.record),
            EntityKind::JobApplication => to_value(&self.transition::<JobApplication>(caller, id, transition)?.record),
            EntityKind::RehireRequest => to_value(&self.transition::<RehireRequest>(caller, id, transition)?.record),
            EntityKind::Payment => to_value(&self.transition::<Payment>(caller, id, transition)?.record),
            other => Err(CampusError::invalid(
                "transition",
                format!("{} has no state transitions", other.label()),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::tests::{fixture, Fixture};

    #[test]
    fn test_dynamic_list_uses_scope() {
        let Fixture { store, admin, student, other_student, .. } = fixture();
        let own = store.list_values(&student, EntityKind::Enrollment, &Filter::default()).unwrap();
        let others = store.list_values(&other_student, EntityKind::Enrollment, &Filter::default()).unwrap();
        let all = store.list_values(&admin, EntityKind::Enrollment, &Filter::default()).unwrap();
        assert_eq!(own.len(), 1);
        assert!(others.is_empty());
        assert_eq!(all.len(), 1);
    }

    #[test]
    fn test_dynamic_transition_rejects_stateless_kind() {
        let Fixture { store, admin, course, .. } = fixture();
        let err = store
            .transition_kind(&admin, EntityKind::Course, course, Transition::Approve)
            .unwrap_err();
        assert!(matches!(err, CampusError::Validation(_)));
    }

    #[test]
    fn test_dynamic_create_and_update_go_through_policy() {
        let Fixture { store, admin, student, .. } = fixture();
        let created = store
            .create_value(&admin, EntityKind::CourseCategory, serde_json::json!({ "name": "Electrical" }))
            .unwrap();
        let id: Uuid = created["id"].as_str().unwrap().parse().unwrap();

        let err = store
            .create_value(&admin, EntityKind::CourseCategory, serde_json::json!({ "title": "x" }))
            .unwrap_err();
        assert!(matches!(err, CampusError::Validation(ref fields) if fields.get("body").is_some()));
        assert_eq!(
            store
                .create_value(&student, EntityKind::CourseCategory, serde_json::json!({ "name": "Sneaky" }))
                .unwrap_err(),
            CampusError::PermissionDenied
        );

        let updated = store
            .update_value(&admin, EntityKind::CourseCategory, id, serde_json::json!({ "name": "Electrics" }))
            .unwrap();
        assert_eq!(updated["name"], "Electrics");
    }

    #[test]
    fn test_dynamic_detail_hides_password_hash() {
        let Fixture { store, admin, .. } = fixture();
        let me = admin.account().unwrap();
        let value = store.get_value(&admin, EntityKind::Account, me.0).unwrap();
        assert!(value.get("password_hash").is_none());
        assert_eq!(value["role"], "admin");
    }
}
