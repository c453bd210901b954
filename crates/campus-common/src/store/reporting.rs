//! Report queries
//!
//! Each report gathers its scoped inputs under one read guard and hands
//! them to [`crate::reports`].

use chrono::Utc;
use uuid::Uuid;

use super::{ensure_readable, scoped, visible, Filter, Store};
use crate::domain::*;
use crate::error::{CampusError, CampusResult};
use crate::identity::Caller;
use crate::policy::EntityKind;
use crate::reports::{self, *};

pub(super) fn window(months: Option<u32>, default: u32) -> CampusResult<u32> {
    let months = months.unwrap_or(default);
    if (1..=MAX_MONTHS).contains(&months) {
        Ok(months)
    } else {
        Err(CampusError::invalid("months", format!("must be between 1 and {}", MAX_MONTHS)))
    }
}

fn require_admin(caller: &Caller) -> CampusResult<()> {
    if caller.is_anonymous() {
        Err(CampusError::AuthFailed("authentication required".into()))
    } else if !caller.is_admin() {
        tracing::warn!(role = ?caller.role(), "financial report denied");
        Err(CampusError::PermissionDenied)
    } else {
        Ok(())
    }
}

impl Store {
    pub fn course_statistics(&self, caller: &Caller, course: Uuid) -> CampusResult<CourseStatistics> {
        ensure_readable(caller, EntityKind::Course)?;
        let db = self.db.read();
        let course = visible::<Course>(caller, &db, course)?;
        let by_course = Filter::course(course.id);
        Ok(reports::course_statistics(
            &course,
            &scoped(caller, &db, &by_course),
            &scoped(caller, &db, &Filter::default()),
            &scoped(caller, &db, &by_course),
            &scoped(caller, &db, &by_course),
        ))
    }

    pub fn popular_courses(&self, caller: &Caller) -> CampusResult<Vec<PopularCourse>> {
        let db = self.db.read();
        Ok(reports::popular_courses(
            &scoped(caller, &db, &Filter::default()),
            &scoped(caller, &db, &Filter::default()),
        ))
    }

    pub fn student_progress(&self, caller: &Caller, student: Uuid) -> CampusResult<StudentProgress> {
        ensure_readable(caller, EntityKind::StudentProfile)?;
        let db = self.db.read();
        let profile = visible::<StudentProfile>(caller, &db, student)?;
        let everything = Filter::default();
        Ok(reports::student_progress(
            &profile,
            &scoped(caller, &db, &Filter::student(profile.id.0)),
            &scoped(caller, &db, &Filter::student(profile.id.0)),
            &scoped(caller, &db, &everything),
            &scoped(caller, &db, &everything),
        ))
    }

    /// Monthly attendance for one student's enrollments
    pub fn attendance_by_month(
        &self,
        caller: &Caller,
        student: Uuid,
        months: Option<u32>,
    ) -> CampusResult<Vec<AttendanceMonth>> {
        ensure_readable(caller, EntityKind::StudentProfile)?;
        let months = window(months, ATTENDANCE_MONTHS)?;
        let db = self.db.read();
        let profile = visible::<StudentProfile>(caller, &db, student)?;
        let enrollments: Vec<Uuid> = db
            .enrollments
            .values()
            .filter(|e| e.student == profile.id)
            .map(|e| e.id)
            .collect();
        let attendance = scoped::<Attendance>(caller, &db, &Filter::default())
            .filter(|a| enrollments.contains(&a.enrollment));
        Ok(reports::attendance_by_month(&attendance, Utc::now().date_naive(), months))
    }

    /// Admin only
    pub fn financial_summary(&self, caller: &Caller) -> CampusResult<FinancialSummary> {
        require_admin(caller)?;
        let db = self.db.read();
        let all = Filter::default();
        Ok(reports::financial_summary(
            &scoped(caller, &db, &all),
            &scoped(caller, &db, &all),
            &scoped(caller, &db, &all),
            &scoped(caller, &db, &all),
            &scoped(caller, &db, &all),
            Utc::now().date_naive(),
        ))
    }

    /// Admin only
    pub fn monthly_revenue(&self, caller: &Caller, months: Option<u32>) -> CampusResult<Vec<MonthlyRevenue>> {
        require_admin(caller)?;
        let months = window(months, REVENUE_MONTHS)?;
        let db = self.db.read();
        let all = Filter::default();
        Ok(reports::monthly_revenue(
            &scoped(caller, &db, &all),
            &scoped(caller, &db, &all),
            Utc::now().date_naive(),
            months,
        ))
    }

    /// Headline counts over the caller's scope
    pub fn dashboard_stats(&self, caller: &Caller) -> CampusResult<DashboardStats> {
        if caller.is_anonymous() {
            return Err(CampusError::AuthFailed("authentication required".into()));
        }
        let db = self.db.read();
        let all = Filter::default();
        let inputs = DashboardInputs {
            students: scoped(caller, &db, &all),
            courses: scoped(caller, &db, &all),
            enrollments: scoped(caller, &db, &all),
            employers: scoped(caller, &db, &all),
            postings: scoped(caller, &db, &all),
            applications: scoped(caller, &db, &all),
            certificates: scoped(caller, &db, &all),
            placements: scoped(caller, &db, &all),
            payments: scoped(caller, &db, &all),
        };
        Ok(reports::dashboard_stats(&inputs, Utc::now().date_naive()))
    }
}
