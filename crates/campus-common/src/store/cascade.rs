//! Cascading deletes
//!
//! Removing a parent removes the rows that cannot exist without it. Optional
//! references (a payment's enrollment, an invoice's student) are cleared
//! instead. A category still holding courses cannot be removed.

use uuid::Uuid;

use super::Tables;
use crate::domain::financials::detach_enrollment;
use crate::domain::{AccountId, EmployerId, InstructorId, StudentId};
use crate::error::{CampusError, CampusResult};
use crate::policy::EntityKind;

pub(crate) fn remove(db: &mut Tables, kind: EntityKind, id: Uuid) -> CampusResult<()> {
    match kind {
        EntityKind::Account => remove_account(db, AccountId(id)),
        EntityKind::StudentProfile => remove_student(db, StudentId(id)),
        EntityKind::InstructorProfile => remove_instructor(db, InstructorId(id)),
        EntityKind::EmployerProfile => remove_employer(db, EmployerId(id)),
        EntityKind::CourseCategory => {
            if db.courses.values().any(|c| c.category == id) {
                return Err(CampusError::Conflict(
                    "category still has courses; move or delete them first".into(),
                ));
            }
            db.categories.remove(&id);
        }
        EntityKind::Course => remove_course(db, id),
        EntityKind::Assessment => {
            db.assessments.remove(&id);
            db.results.retain(|_, r| r.assessment != id);
        }
        EntityKind::Enrollment => remove_enrollment(db, id),
        EntityKind::Placement => remove_placement(db, id),
        EntityKind::JobPosting => remove_posting(db, id),
        EntityKind::BackgroundCheck => {
            db.background_checks.remove(&id);
        }
        EntityKind::CourseModule => {
            db.modules.remove(&id);
        }
        EntityKind::Attendance => {
            db.attendance.remove(&id);
        }
        EntityKind::AssessmentResult => {
            db.results.remove(&id);
        }
        EntityKind::ProgressReport => {
            db.progress_reports.remove(&id);
        }
        EntityKind::JobApplication => {
            db.applications.remove(&id);
        }
        EntityKind::RehireRequest => {
            db.rehire_requests.remove(&id);
        }
        EntityKind::EmployerFeedback => {
            db.feedback.remove(&id);
        }
        EntityKind::Certificate => {
            db.certificates.remove(&id);
        }
        EntityKind::CompetencyAssessment => {
            db.competency_assessments.remove(&id);
        }
        EntityKind::TuitionFee => {
            db.tuition_fees.remove(&id);
        }
        EntityKind::Payment => {
            db.payments.remove(&id);
        }
        EntityKind::PlacementFee => {
            db.placement_fees.remove(&id);
        }
        EntityKind::Payroll => {
            db.payroll.remove(&id);
        }
        EntityKind::Expense => {
            db.expenses.remove(&id);
        }
        EntityKind::Invoice => {
            db.invoices.remove(&id);
        }
        EntityKind::FinancialReport => {
            db.financial_reports.remove(&id);
        }
    }
    Ok(())
}

fn ids<T>(table: &super::Table<T>, keep: impl Fn(&T) -> bool) -> Vec<Uuid> {
    table
        .iter()
        .filter(|(_, row)| keep(row))
        .map(|(id, _)| *id)
        .collect()
}

fn remove_account(db: &mut Tables, account: AccountId) {
    for student in ids(&db.students, |s| s.user == account) {
        remove_student(db, StudentId(student));
    }
    for instructor in ids(&db.instructors, |i| i.user == account) {
        remove_instructor(db, InstructorId(instructor));
    }
    for employer in ids(&db.employers, |e| e.user == account) {
        remove_employer(db, EmployerId(employer));
    }
    db.background_checks.retain(|_, c| c.user != account);
    db.payroll.retain(|_, p| p.employee != account);
    db.accounts.remove(&account.0);
}

fn remove_student(db: &mut Tables, student: StudentId) {
    for enrollment in ids(&db.enrollments, |e| e.student == student) {
        remove_enrollment(db, enrollment);
    }
    for placement in ids(&db.placements, |p| p.student == student) {
        remove_placement(db, placement);
    }
    db.applications.retain(|_, a| a.student != student);
    db.rehire_requests.retain(|_, r| r.student != student);
    db.certificates.retain(|_, c| c.student != student);
    db.competency_assessments.retain(|_, c| c.student != student);
    db.payments.retain(|_, p| p.student != student);
    db.placement_fees.retain(|_, f| f.student != student);
    for invoice in db.invoices.values_mut() {
        if invoice.student == Some(student) {
            invoice.student = None;
        }
    }
    db.students.remove(&student.0);
}

fn remove_instructor(db: &mut Tables, instructor: InstructorId) {
    for course in db.courses.values_mut() {
        course.instructors.retain(|i| *i != instructor);
    }
    db.instructors.remove(&instructor.0);
}

fn remove_employer(db: &mut Tables, employer: EmployerId) {
    for posting in ids(&db.postings, |p| p.employer == employer) {
        remove_posting(db, posting);
    }
    for placement in ids(&db.placements, |p| p.employer == employer) {
        remove_placement(db, placement);
    }
    db.placement_fees.retain(|_, f| f.employer != employer);
    db.rehire_requests.retain(|_, r| r.employer != employer);
    for invoice in db.invoices.values_mut() {
        if invoice.employer == Some(employer) {
            invoice.employer = None;
        }
    }
    db.employers.remove(&employer.0);
}

fn remove_course(db: &mut Tables, course: Uuid) {
    db.modules.retain(|_, m| m.course != course);
    for assessment in ids(&db.assessments, |a| a.course == course) {
        db.assessments.remove(&assessment);
        db.results.retain(|_, r| r.assessment != assessment);
    }
    for enrollment in ids(&db.enrollments, |e| e.course == course) {
        remove_enrollment(db, enrollment);
    }
    db.certificates.retain(|_, c| c.course != course);
    db.competency_assessments.retain(|_, c| c.course != course);
    db.tuition_fees.retain(|_, f| f.course != course);
    db.courses.remove(&course);
}

fn remove_enrollment(db: &mut Tables, enrollment: Uuid) {
    db.attendance.retain(|_, a| a.enrollment != enrollment);
    db.results.retain(|_, r| r.enrollment != enrollment);
    db.progress_reports.retain(|_, r| r.enrollment != enrollment);
    detach_enrollment(db, enrollment);
    db.enrollments.remove(&enrollment);
}

fn remove_placement(db: &mut Tables, placement: Uuid) {
    db.rehire_requests.retain(|_, r| r.previous_placement != Some(placement));
    db.feedback.retain(|_, f| f.placement != placement);
    for fee in db.placement_fees.values_mut() {
        if fee.placement == Some(placement) {
            fee.placement = None;
        }
    }
    db.placements.remove(&placement);
}

fn remove_posting(db: &mut Tables, posting: Uuid) {
    db.applications.retain(|_, a| a.posting != posting);
    db.postings.remove(&posting);
}
