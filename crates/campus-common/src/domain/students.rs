//! Students: profiles, enrollments, attendance, results, placements

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use uuid::Uuid;

use super::accounts::Account;
use super::courses::{check_profile_link, Assessment, Course};
use super::employers::EmployerProfile;
use super::value_objects::{check_money, student_number, AccountId, EmployerId, StudentId};
use crate::error::{CampusError, CampusResult, FieldErrors};
use crate::identity::Role;
use crate::policy::{EntityKind, Owner, Transition};
use crate::reports::Percent;
use crate::store::filter::id_matches;
use crate::store::{
    ensure_unique, exists, Filter, Record, Resource, Stateful, Table, Tables, WriteContext,
};

#[derive(Debug, Clone, Serialize)]
pub struct StudentProfile {
    pub id: StudentId,
    pub user: AccountId,
    pub student_id: String,
    pub emergency_contact: Option<String>,
    pub emergency_phone: Option<String>,
    pub education_level: Option<String>,
    pub career_goals: Option<String>,
    pub enrollment_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StudentProfileInput {
    pub user: AccountId,
    pub student_id: Option<String>,
    pub emergency_contact: Option<String>,
    pub emergency_phone: Option<String>,
    pub education_level: Option<String>,
    pub career_goals: Option<String>,
}

impl StudentProfile {
    pub(crate) fn for_account(user: AccountId, now: DateTime<Utc>) -> Self {
        Self {
            id: StudentId::new(),
            user,
            student_id: student_number(now.date_naive()),
            emergency_contact: None,
            emergency_phone: None,
            education_level: None,
            career_goals: None,
            enrollment_date: now.date_naive(),
            created_at: now,
        }
    }
}

impl Record for StudentProfile {
    const KIND: EntityKind = EntityKind::StudentProfile;

    fn id(&self) -> Uuid {
        self.id.0
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn table(db: &Tables) -> &Table<Self> {
        &db.students
    }

    fn table_mut(db: &mut Tables) -> &mut Table<Self> {
        &mut db.students
    }

    fn owner(&self, _db: &Tables) -> Owner {
        Owner {
            student: Some(self.id),
            ..Owner::account(self.user)
        }
    }

    fn matches(&self, filter: &Filter, db: &Tables) -> bool {
        let (name, email) = db
            .accounts
            .get(&self.user.0)
            .map(|a| (a.full_name(), a.email.clone()))
            .unwrap_or_default();
        filter.text(&[&name, &email, &self.student_id])
            && filter
                .course
                .map(|course| {
                    db.enrollments
                        .values()
                        .any(|e| e.student == self.id && e.course == course)
                })
                .unwrap_or(true)
    }

    fn check(&self, db: &Tables) -> CampusResult<()> {
        let linked = db.students.values().any(|o| o.user == self.user && o.id != self.id);
        check_profile_link(db, self.user, Role::Student, linked)?;
        ensure_unique(db, self, "a student with this student id already exists", |o| {
            o.student_id == self.student_id
        })
    }
}

impl Resource for StudentProfile {
    type Input = StudentProfileInput;

    fn create(input: StudentProfileInput, ctx: &WriteContext<'_>) -> CampusResult<Self> {
        let mut profile = StudentProfile::for_account(input.user, ctx.now);
        if let Some(number) = input.student_id.filter(|s| !s.trim().is_empty()) {
            profile.student_id = number;
        }
        profile.emergency_contact = input.emergency_contact;
        profile.emergency_phone = input.emergency_phone;
        profile.education_level = input.education_level;
        profile.career_goals = input.career_goals;
        Ok(profile)
    }

    fn update(&mut self, input: StudentProfileInput, _ctx: &WriteContext<'_>) -> CampusResult<()> {
        if input.user != self.user {
            return Err(CampusError::invalid("user", "a profile cannot move to another user"));
        }
        if let Some(number) = input.student_id.filter(|s| !s.trim().is_empty()) {
            self.student_id = number;
        }
        self.emergency_contact = input.emergency_contact;
        self.emergency_phone = input.emergency_phone;
        self.education_level = input.education_level;
        self.career_goals = input.career_goals;
        Ok(())
    }
}

labelled_enum! {
    pub enum EnrollmentStatus {
        Pending => "pending",
        Enrolled => "enrolled",
        Completed => "completed",
        Dropped => "dropped",
        Suspended => "suspended",
    }
    default = Enrolled
}

impl EnrollmentStatus {
    /// Counts against course capacity
    pub fn is_active(&self) -> bool {
        matches!(self, EnrollmentStatus::Pending | EnrollmentStatus::Enrolled)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Enrollment {
    pub id: Uuid,
    pub student: StudentId,
    pub course: Uuid,
    pub status: EnrollmentStatus,
    pub enrollment_date: NaiveDate,
    pub expected_completion: NaiveDate,
    pub actual_completion: Option<NaiveDate>,
    pub final_grade: Option<Decimal>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EnrollmentInput {
    pub student: StudentId,
    pub course: Uuid,
    pub status: Option<EnrollmentStatus>,
    pub enrollment_date: Option<NaiveDate>,
    pub expected_completion: Option<NaiveDate>,
    pub final_grade: Option<Decimal>,
    pub notes: Option<String>,
}

fn completion_by_action(status: Option<EnrollmentStatus>) -> CampusResult<()> {
    if status == Some(EnrollmentStatus::Completed) {
        Err(CampusError::invalid("status", "use the complete action"))
    } else {
        Ok(())
    }
}

impl Record for Enrollment {
    const KIND: EntityKind = EntityKind::Enrollment;

    fn id(&self) -> Uuid {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn table(db: &Tables) -> &Table<Self> {
        &db.enrollments
    }

    fn table_mut(db: &mut Tables) -> &mut Table<Self> {
        &mut db.enrollments
    }

    fn owner(&self, _db: &Tables) -> Owner {
        Owner::student(self.student)
    }

    fn matches(&self, filter: &Filter, db: &Tables) -> bool {
        let title = db.courses.get(&self.course).map(|c| c.title.as_str()).unwrap_or_default();
        filter.text(&[title])
            && filter.status_is(self.status.as_str())
            && id_matches(filter.course, self.course)
            && id_matches(filter.student, self.student.0)
    }

    fn check(&self, db: &Tables) -> CampusResult<()> {
        let mut errors = FieldErrors::new();
        errors.check(!exists::<StudentProfile>(db, self.student.0), "student", "student does not exist");
        errors.check(!exists::<Course>(db, self.course), "course", "course does not exist");
        errors.into_result()?;

        ensure_unique(db, self, "this student is already enrolled in this course", |o| {
            o.student == self.student && o.course == self.course
        })?;

        if self.status.is_active() {
            let capacity = db.courses.get(&self.course).map(|c| c.max_students).unwrap_or(0);
            let taken = db
                .enrollments
                .values()
                .filter(|o| o.course == self.course && o.id != self.id && o.status.is_active())
                .count();
            if taken >= capacity as usize {
                return Err(CampusError::invalid("course", "course is full"));
            }
        }
        Ok(())
    }
}

impl Resource for Enrollment {
    type Input = EnrollmentInput;

    fn create(input: EnrollmentInput, ctx: &WriteContext<'_>) -> CampusResult<Self> {
        completion_by_action(input.status)?;
        let course = ctx
            .db
            .courses
            .get(&input.course)
            .ok_or_else(|| CampusError::invalid("course", "course does not exist"))?;

        let start = input.enrollment_date.unwrap_or_else(|| ctx.today());
        let expected_completion = match input.expected_completion {
            Some(expected) => expected,
            None => course.expected_completion(start)?,
        };
        Ok(Self {
            id: Uuid::new_v4(),
            student: input.student,
            course: input.course,
            status: input.status.unwrap_or_default(),
            enrollment_date: start,
            expected_completion,
            actual_completion: None,
            final_grade: input.final_grade,
            notes: input.notes,
            created_at: ctx.now,
        })
    }

    fn update(&mut self, input: EnrollmentInput, _ctx: &WriteContext<'_>) -> CampusResult<()> {
        if input.status != Some(self.status) {
            completion_by_action(input.status)?;
        }
        if input.student != self.student || input.course != self.course {
            return Err(CampusError::invalid("course", "student and course cannot change"));
        }
        if let Some(status) = input.status {
            self.status = status;
        }
        if let Some(start) = input.enrollment_date {
            self.enrollment_date = start;
        }
        if let Some(expected) = input.expected_completion {
            self.expected_completion = expected;
        }
        self.final_grade = input.final_grade;
        self.notes = input.notes;
        Ok(())
    }
}

impl Stateful for Enrollment {
    type Status = EnrollmentStatus;

    fn status(&self) -> EnrollmentStatus {
        self.status
    }

    fn target(transition: Transition) -> Option<EnrollmentStatus> {
        match transition {
            Transition::Complete => Some(EnrollmentStatus::Completed),
            _ => None,
        }
    }

    fn can_leave(from: EnrollmentStatus) -> bool {
        matches!(
            from,
            EnrollmentStatus::Pending | EnrollmentStatus::Enrolled | EnrollmentStatus::Suspended
        )
    }

    fn enter(&mut self, to: EnrollmentStatus, ctx: &WriteContext<'_>) {
        self.status = to;
        self.actual_completion = Some(ctx.today());
    }
}

/// Student of an enrollment, for records hanging off one
pub(crate) fn enrollment_owner(db: &Tables, enrollment: Uuid) -> Owner {
    db.enrollments
        .get(&enrollment)
        .map(|e| Owner::student(e.student))
        .unwrap_or_default()
}

fn enrollment_matches(db: &Tables, enrollment: Uuid, filter: &Filter) -> bool {
    if !id_matches(filter.enrollment, enrollment) {
        return false;
    }
    if filter.course.is_none() && filter.student.is_none() {
        return true;
    }
    db.enrollments
        .get(&enrollment)
        .map(|e| id_matches(filter.course, e.course) && id_matches(filter.student, e.student.0))
        .unwrap_or(false)
}

#[derive(Debug, Clone, Serialize)]
pub struct Attendance {
    pub id: Uuid,
    pub enrollment: Uuid,
    pub date: NaiveDate,
    pub hours: Decimal,
    pub present: bool,
    pub notes: Option<String>,
    pub recorded_by: Option<AccountId>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AttendanceInput {
    pub enrollment: Uuid,
    pub date: Option<NaiveDate>,
    pub hours: Option<Decimal>,
    pub present: Option<bool>,
    pub notes: Option<String>,
}

fn check_hours(hours: Decimal) -> CampusResult<()> {
    if hours.is_sign_negative() || hours > dec!(24) {
        Err(CampusError::invalid("hours", "must be between 0 and 24"))
    } else {
        Ok(())
    }
}

impl Record for Attendance {
    const KIND: EntityKind = EntityKind::Attendance;

    fn id(&self) -> Uuid {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn table(db: &Tables) -> &Table<Self> {
        &db.attendance
    }

    fn table_mut(db: &mut Tables) -> &mut Table<Self> {
        &mut db.attendance
    }

    fn owner(&self, db: &Tables) -> Owner {
        enrollment_owner(db, self.enrollment)
    }

    fn matches(&self, filter: &Filter, db: &Tables) -> bool {
        enrollment_matches(db, self.enrollment, filter)
            && filter.status_is(if self.present { "present" } else { "absent" })
    }

    fn check(&self, db: &Tables) -> CampusResult<()> {
        if !exists::<Enrollment>(db, self.enrollment) {
            return Err(CampusError::invalid("enrollment", "enrollment does not exist"));
        }
        ensure_unique(db, self, "attendance for this enrollment and date already exists", |o| {
            o.enrollment == self.enrollment && o.date == self.date
        })
    }

    fn ordering(a: &Self, b: &Self) -> Ordering {
        b.date.cmp(&a.date).then(a.enrollment.cmp(&b.enrollment))
    }
}

impl Resource for Attendance {
    type Input = AttendanceInput;

    fn create(input: AttendanceInput, ctx: &WriteContext<'_>) -> CampusResult<Self> {
        let hours = input.hours.unwrap_or_default();
        check_hours(hours)?;
        Ok(Self {
            id: Uuid::new_v4(),
            enrollment: input.enrollment,
            date: input.date.unwrap_or_else(|| ctx.today()),
            hours,
            present: input.present.unwrap_or(true),
            notes: input.notes,
            recorded_by: ctx.account(),
            created_at: ctx.now,
        })
    }

    fn update(&mut self, input: AttendanceInput, ctx: &WriteContext<'_>) -> CampusResult<()> {
        if let Some(hours) = input.hours {
            check_hours(hours)?;
            self.hours = hours;
        }
        self.enrollment = input.enrollment;
        if let Some(date) = input.date {
            self.date = date;
        }
        if let Some(present) = input.present {
            self.present = present;
        }
        self.notes = input.notes;
        self.recorded_by = ctx.account();
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AssessmentResult {
    pub id: Uuid,
    pub enrollment: Uuid,
    pub assessment: Uuid,
    pub score: Decimal,
    pub max_score: Decimal,
    pub passed: bool,
    pub attempt: u32,
    pub feedback: Option<String>,
    pub graded_by: Option<AccountId>,
    pub graded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssessmentResultInput {
    pub enrollment: Uuid,
    pub assessment: Uuid,
    pub score: Decimal,
    pub attempt: Option<u32>,
    pub feedback: Option<String>,
}

impl AssessmentResult {
    /// Score as a percentage of the maximum
    pub fn percentage(&self) -> Decimal {
        if self.max_score.is_zero() {
            Decimal::ZERO
        } else {
            self.score / self.max_score * dec!(100)
        }
    }

    fn grade(&mut self, assessment: &Assessment, score: Decimal) -> CampusResult<()> {
        if score.is_sign_negative() || score > assessment.max_score {
            return Err(CampusError::invalid(
                "score",
                format!("must be between 0 and {}", assessment.max_score),
            ));
        }
        self.score = score;
        self.max_score = assessment.max_score;
        self.passed = score >= assessment.passing_score;
        Ok(())
    }
}

fn lookup_assessment<'a>(db: &'a Tables, id: Uuid) -> CampusResult<&'a Assessment> {
    db.assessments
        .get(&id)
        .ok_or_else(|| CampusError::invalid("assessment", "assessment does not exist"))
}

impl Record for AssessmentResult {
    const KIND: EntityKind = EntityKind::AssessmentResult;

    fn id(&self) -> Uuid {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.graded_at
    }

    fn table(db: &Tables) -> &Table<Self> {
        &db.results
    }

    fn table_mut(db: &mut Tables) -> &mut Table<Self> {
        &mut db.results
    }

    fn owner(&self, db: &Tables) -> Owner {
        enrollment_owner(db, self.enrollment)
    }

    fn matches(&self, filter: &Filter, db: &Tables) -> bool {
        enrollment_matches(db, self.enrollment, filter)
            && filter.status_is(if self.passed { "passed" } else { "failed" })
    }

    fn check(&self, db: &Tables) -> CampusResult<()> {
        let enrollment = db
            .enrollments
            .get(&self.enrollment)
            .ok_or_else(|| CampusError::invalid("enrollment", "enrollment does not exist"))?;
        let assessment = lookup_assessment(db, self.assessment)?;
        if assessment.course != enrollment.course {
            return Err(CampusError::invalid(
                "assessment",
                "assessment belongs to a different course",
            ));
        }
        ensure_unique(db, self, "this attempt has already been graded", |o| {
            o.enrollment == self.enrollment
                && o.assessment == self.assessment
                && o.attempt == self.attempt
        })
    }
}

impl Resource for AssessmentResult {
    type Input = AssessmentResultInput;

    fn create(input: AssessmentResultInput, ctx: &WriteContext<'_>) -> CampusResult<Self> {
        let assessment = lookup_assessment(ctx.db, input.assessment)?;
        let previous = ctx
            .db
            .results
            .values()
            .filter(|r| r.enrollment == input.enrollment && r.assessment == input.assessment)
            .count() as u32;

        let mut result = Self {
            id: Uuid::new_v4(),
            enrollment: input.enrollment,
            assessment: input.assessment,
            score: Decimal::ZERO,
            max_score: assessment.max_score,
            passed: false,
            attempt: input.attempt.unwrap_or(previous + 1).max(1),
            feedback: input.feedback,
            graded_by: ctx.account(),
            graded_at: ctx.now,
        };
        result.grade(assessment, input.score)?;
        Ok(result)
    }

    fn update(&mut self, input: AssessmentResultInput, ctx: &WriteContext<'_>) -> CampusResult<()> {
        let assessment = lookup_assessment(ctx.db, input.assessment)?;
        self.enrollment = input.enrollment;
        self.assessment = input.assessment;
        self.grade(assessment, input.score)?;
        if let Some(attempt) = input.attempt {
            self.attempt = attempt.max(1);
        }
        self.feedback = input.feedback;
        self.graded_by = ctx.account();
        Ok(())
    }
}

/// Staff write-up on how one enrollment is going
#[derive(Debug, Clone, Serialize)]
pub struct ProgressReport {
    pub id: Uuid,
    pub enrollment: Uuid,
    pub report_date: NaiveDate,
    /// Whole percent, 0 to 100
    pub overall_progress: u32,
    pub attendance_rate: Decimal,
    pub average_score: Decimal,
    pub strengths: String,
    pub areas_for_improvement: String,
    pub recommendations: String,
    pub created_by: Option<AccountId>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProgressReportInput {
    pub enrollment: Uuid,
    pub report_date: Option<NaiveDate>,
    pub overall_progress: u32,
    /// Taken from recorded attendance when absent
    pub attendance_rate: Option<Decimal>,
    /// Taken from graded results when absent
    pub average_score: Option<Decimal>,
    #[serde(default)]
    pub strengths: String,
    #[serde(default)]
    pub areas_for_improvement: String,
    #[serde(default)]
    pub recommendations: String,
}

fn check_percent(errors: &mut FieldErrors, field: &str, value: Option<Decimal>) {
    errors.check(
        value.map(|v| v.is_sign_negative() || v > dec!(100)).unwrap_or(false),
        field,
        "must be between 0 and 100",
    );
}

impl ProgressReportInput {
    fn validate(&self) -> CampusResult<()> {
        let mut errors = FieldErrors::new();
        errors.check(self.overall_progress > 100, "overall_progress", "must be between 0 and 100");
        check_percent(&mut errors, "attendance_rate", self.attendance_rate);
        check_percent(&mut errors, "average_score", self.average_score);
        errors.into_result()
    }
}

/// Attendance rate and average result percentage recorded so far
fn enrollment_figures(db: &Tables, enrollment: Uuid) -> (Decimal, Decimal) {
    let sessions: Vec<&Attendance> = db
        .attendance
        .values()
        .filter(|a| a.enrollment == enrollment)
        .collect();
    let present = sessions.iter().filter(|a| a.present).count();
    let (scored, possible) = db
        .results
        .values()
        .filter(|r| r.enrollment == enrollment)
        .fold((Decimal::ZERO, Decimal::ZERO), |(s, m), r| {
            (s.saturating_add(r.score), m.saturating_add(r.max_score))
        });
    (
        Percent::ratio(present, sessions.len()).rounded(),
        Percent::of(scored, possible).rounded(),
    )
}

impl Record for ProgressReport {
    const KIND: EntityKind = EntityKind::ProgressReport;

    fn id(&self) -> Uuid {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn table(db: &Tables) -> &Table<Self> {
        &db.progress_reports
    }

    fn table_mut(db: &mut Tables) -> &mut Table<Self> {
        &mut db.progress_reports
    }

    fn owner(&self, db: &Tables) -> Owner {
        Owner {
            staff: self.created_by,
            ..enrollment_owner(db, self.enrollment)
        }
    }

    fn matches(&self, filter: &Filter, db: &Tables) -> bool {
        enrollment_matches(db, self.enrollment, filter)
            && filter.text(&[&self.strengths, &self.areas_for_improvement, &self.recommendations])
    }

    fn check(&self, db: &Tables) -> CampusResult<()> {
        if !exists::<Enrollment>(db, self.enrollment) {
            return Err(CampusError::invalid("enrollment", "enrollment does not exist"));
        }
        Ok(())
    }

    fn ordering(a: &Self, b: &Self) -> Ordering {
        b.report_date.cmp(&a.report_date).then(b.created_at.cmp(&a.created_at))
    }
}

impl Resource for ProgressReport {
    type Input = ProgressReportInput;

    fn create(input: ProgressReportInput, ctx: &WriteContext<'_>) -> CampusResult<Self> {
        input.validate()?;
        let (attendance_rate, average_score) = enrollment_figures(ctx.db, input.enrollment);
        Ok(Self {
            id: Uuid::new_v4(),
            enrollment: input.enrollment,
            report_date: input.report_date.unwrap_or_else(|| ctx.today()),
            overall_progress: input.overall_progress,
            attendance_rate: input.attendance_rate.unwrap_or(attendance_rate),
            average_score: input.average_score.unwrap_or(average_score),
            strengths: input.strengths,
            areas_for_improvement: input.areas_for_improvement,
            recommendations: input.recommendations,
            created_by: ctx.account(),
            created_at: ctx.now,
        })
    }

    fn update(&mut self, input: ProgressReportInput, ctx: &WriteContext<'_>) -> CampusResult<()> {
        input.validate()?;
        if input.enrollment != self.enrollment {
            return Err(CampusError::invalid("enrollment", "a report cannot move to another enrollment"));
        }
        let (attendance_rate, average_score) = enrollment_figures(ctx.db, self.enrollment);
        if let Some(date) = input.report_date {
            self.report_date = date;
        }
        self.overall_progress = input.overall_progress;
        self.attendance_rate = input.attendance_rate.unwrap_or(attendance_rate);
        self.average_score = input.average_score.unwrap_or(average_score);
        self.strengths = input.strengths;
        self.areas_for_improvement = input.areas_for_improvement;
        self.recommendations = input.recommendations;
        Ok(())
    }
}

labelled_enum! {
    pub enum PlacementStatus {
        Pending => "pending",
        Placed => "placed",
        Completed => "completed",
        Terminated => "terminated",
    }
    default = Pending
}

#[derive(Debug, Clone, Serialize)]
pub struct Placement {
    pub id: Uuid,
    pub student: StudentId,
    pub employer: EmployerId,
    pub job_title: String,
    pub salary: Decimal,
    pub placement_fee: Decimal,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub status: PlacementStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlacementInput {
    pub student: StudentId,
    pub employer: EmployerId,
    pub job_title: String,
    #[serde(default)]
    pub salary: Decimal,
    #[serde(default)]
    pub placement_fee: Decimal,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub status: Option<PlacementStatus>,
    pub notes: Option<String>,
}

impl PlacementInput {
    fn validate(&self, start: NaiveDate) -> CampusResult<()> {
        let mut errors = FieldErrors::new();
        errors.check(self.job_title.trim().is_empty(), "job_title", "this field is required");
        check_money(&mut errors, "salary", self.salary);
        check_money(&mut errors, "placement_fee", self.placement_fee);
        errors.check(
            self.end_date.map(|end| end < start).unwrap_or(false),
            "end_date",
            "must not be before the start date",
        );
        errors.into_result()
    }
}

impl Record for Placement {
    const KIND: EntityKind = EntityKind::Placement;

    fn id(&self) -> Uuid {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn table(db: &Tables) -> &Table<Self> {
        &db.placements
    }

    fn table_mut(db: &mut Tables) -> &mut Table<Self> {
        &mut db.placements
    }

    fn owner(&self, _db: &Tables) -> Owner {
        Owner {
            employer: Some(self.employer),
            ..Owner::student(self.student)
        }
    }

    fn matches(&self, filter: &Filter, _db: &Tables) -> bool {
        filter.text(&[&self.job_title])
            && filter.status_is(self.status.as_str())
            && id_matches(filter.student, self.student.0)
            && id_matches(filter.employer, self.employer.0)
    }

    fn check(&self, db: &Tables) -> CampusResult<()> {
        let mut errors = FieldErrors::new();
        errors.check(!exists::<StudentProfile>(db, self.student.0), "student", "student does not exist");
        errors.check(!exists::<EmployerProfile>(db, self.employer.0), "employer", "employer does not exist");
        errors.into_result()
    }
}

impl Resource for Placement {
    type Input = PlacementInput;

    fn create(input: PlacementInput, ctx: &WriteContext<'_>) -> CampusResult<Self> {
        let start = input.start_date.unwrap_or_else(|| ctx.today());
        input.validate(start)?;
        Ok(Self {
            id: Uuid::new_v4(),
            student: input.student,
            employer: input.employer,
            job_title: input.job_title.trim().to_string(),
            salary: input.salary,
            placement_fee: input.placement_fee,
            start_date: start,
            end_date: input.end_date,
            status: input.status.unwrap_or_default(),
            notes: input.notes,
            created_at: ctx.now,
        })
    }

    fn update(&mut self, input: PlacementInput, _ctx: &WriteContext<'_>) -> CampusResult<()> {
        let start = input.start_date.unwrap_or(self.start_date);
        input.validate(start)?;
        self.student = input.student;
        self.employer = input.employer;
        self.job_title = input.job_title.trim().to_string();
        self.salary = input.salary;
        self.placement_fee = input.placement_fee;
        self.start_date = start;
        self.end_date = input.end_date;
        if let Some(status) = input.status {
            self.status = status;
        }
        self.notes = input.notes;
        Ok(())
    }
}

/// Display name of a student profile's account
pub(crate) fn student_name(db: &Tables, student: StudentId) -> String {
    db.students
        .get(&student.0)
        .and_then(|s| db.accounts.get(&s.user.0))
        .map(Account::full_name)
        .unwrap_or_default()
}
