//! Employers: profiles, job postings, applications, rehire requests, feedback

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::courses::check_profile_link;
use super::students::{Placement, StudentProfile};
use super::value_objects::{check_money, AccountId, EmployerId, StudentId};
use crate::error::{CampusError, CampusResult, FieldErrors};
use crate::identity::Role;
use crate::policy::{EntityKind, Owner, Transition};
use crate::store::filter::id_matches;
use crate::store::{
    ensure_unique, exists, Filter, Record, Resource, Stateful, Table, Tables, WriteContext,
};

#[derive(Debug, Clone, Serialize)]
pub struct EmployerProfile {
    pub id: EmployerId,
    pub user: AccountId,
    pub company_name: String,
    pub industry: Option<String>,
    pub website: Option<String>,
    pub description: Option<String>,
    pub address: Option<String>,
    pub contact_phone: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmployerProfileInput {
    pub user: AccountId,
    pub company_name: String,
    pub industry: Option<String>,
    pub website: Option<String>,
    pub description: Option<String>,
    pub address: Option<String>,
    pub contact_phone: Option<String>,
    pub is_active: Option<bool>,
}

impl EmployerProfile {
    pub(crate) fn for_account(user: AccountId, company_name: String, now: DateTime<Utc>) -> Self {
        Self {
            id: EmployerId::new(),
            user,
            company_name,
            industry: None,
            website: None,
            description: None,
            address: None,
            contact_phone: None,
            is_active: true,
            created_at: now,
        }
    }
}

impl Record for EmployerProfile {
    const KIND: EntityKind = EntityKind::EmployerProfile;

    fn id(&self) -> Uuid {
        self.id.0
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn table(db: &Tables) -> &Table<Self> {
        &db.employers
    }

    fn table_mut(db: &mut Tables) -> &mut Table<Self> {
        &mut db.employers
    }

    fn owner(&self, _db: &Tables) -> Owner {
        Owner {
            employer: Some(self.id),
            listed: self.is_active,
            ..Owner::account(self.user)
        }
    }

    fn matches(&self, filter: &Filter, _db: &Tables) -> bool {
        filter.text(&[&self.company_name, self.industry.as_deref().unwrap_or_default()])
            && filter.status_is(if self.is_active { "active" } else { "inactive" })
    }

    fn check(&self, db: &Tables) -> CampusResult<()> {
        let linked = db.employers.values().any(|o| o.user == self.user && o.id != self.id);
        check_profile_link(db, self.user, Role::Employer, linked)
    }
}

impl Resource for EmployerProfile {
    type Input = EmployerProfileInput;

    fn create(input: EmployerProfileInput, ctx: &WriteContext<'_>) -> CampusResult<Self> {
        if input.company_name.trim().is_empty() {
            return Err(CampusError::invalid("company_name", "this field is required"));
        }
        let mut profile =
            EmployerProfile::for_account(input.user, input.company_name.trim().to_string(), ctx.now);
        profile.industry = input.industry;
        profile.website = input.website;
        profile.description = input.description;
        profile.address = input.address;
        profile.contact_phone = input.contact_phone;
        profile.is_active = input.is_active.unwrap_or(true);
        Ok(profile)
    }

    fn update(&mut self, input: EmployerProfileInput, _ctx: &WriteContext<'_>) -> CampusResult<()> {
        let mut errors = FieldErrors::new();
        errors.check(input.company_name.trim().is_empty(), "company_name", "this field is required");
        errors.check(input.user != self.user, "user", "a profile cannot move to another user");
        errors.into_result()?;

        self.company_name = input.company_name.trim().to_string();
        self.industry = input.industry;
        self.website = input.website;
        self.description = input.description;
        self.address = input.address;
        self.contact_phone = input.contact_phone;
        if let Some(active) = input.is_active {
            self.is_active = active;
        }
        Ok(())
    }
}

labelled_enum! {
    pub enum EmploymentType {
        FullTime => "full_time",
        PartTime => "part_time",
        Contract => "contract",
        Temporary => "temporary",
        Internship => "internship",
    }
    default = FullTime
}

labelled_enum! {
    pub enum PostingStatus {
        Draft => "draft",
        Active => "active",
        Paused => "paused",
        Closed => "closed",
        Filled => "filled",
    }
    default = Active
}

#[derive(Debug, Clone, Serialize)]
pub struct JobPosting {
    pub id: Uuid,
    pub employer: EmployerId,
    pub title: String,
    pub description: String,
    pub requirements: Option<String>,
    pub employment_type: EmploymentType,
    pub salary_min: Option<Decimal>,
    pub salary_max: Option<Decimal>,
    pub location: String,
    pub start_date: Option<NaiveDate>,
    pub positions: u32,
    pub status: PostingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JobPostingInput {
    /// Forced to the caller's own profile for employers
    pub employer: Option<EmployerId>,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub requirements: Option<String>,
    pub employment_type: Option<EmploymentType>,
    pub salary_min: Option<Decimal>,
    pub salary_max: Option<Decimal>,
    #[serde(default)]
    pub location: String,
    pub start_date: Option<NaiveDate>,
    pub positions: Option<u32>,
    pub status: Option<PostingStatus>,
}

impl JobPostingInput {
    fn validate(&self) -> CampusResult<()> {
        let mut errors = FieldErrors::new();
        errors.check(self.title.trim().is_empty(), "title", "this field is required");
        if let Some(min) = self.salary_min {
            check_money(&mut errors, "salary_min", min);
        }
        if let Some(max) = self.salary_max {
            check_money(&mut errors, "salary_max", max);
        }
        if let (Some(min), Some(max)) = (self.salary_min, self.salary_max) {
            errors.check(min > max, "salary_max", "must be at least the minimum salary");
        }
        errors.check(self.positions == Some(0), "positions", "must be at least 1");
        errors.into_result()
    }
}

/// Profile the caller acts for: the caller's own for employers, the
/// submitted one for admins
fn acting_employer(ctx: &WriteContext<'_>, submitted: Option<EmployerId>) -> CampusResult<EmployerId> {
    let employer = if ctx.caller.is_admin() {
        submitted
    } else {
        ctx.caller.employer()
    };
    employer.ok_or_else(|| CampusError::invalid("employer", "an employer profile is required"))
}

impl Record for JobPosting {
    const KIND: EntityKind = EntityKind::JobPosting;

    fn id(&self) -> Uuid {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn table(db: &Tables) -> &Table<Self> {
        &db.postings
    }

    fn table_mut(db: &mut Tables) -> &mut Table<Self> {
        &mut db.postings
    }

    fn owner(&self, _db: &Tables) -> Owner {
        Owner::employer(self.employer)
    }

    fn matches(&self, filter: &Filter, _db: &Tables) -> bool {
        filter.text(&[&self.title, &self.description, &self.location])
            && filter.status_is(self.status.as_str())
            && filter.kind_is(self.employment_type.as_str())
            && id_matches(filter.employer, self.employer.0)
    }

    fn check(&self, db: &Tables) -> CampusResult<()> {
        if exists::<EmployerProfile>(db, self.employer.0) {
            Ok(())
        } else {
            Err(CampusError::invalid("employer", "employer does not exist"))
        }
    }
}

impl Resource for JobPosting {
    type Input = JobPostingInput;

    fn create(input: JobPostingInput, ctx: &WriteContext<'_>) -> CampusResult<Self> {
        input.validate()?;
        let employer = acting_employer(ctx, input.employer)?;
        Ok(Self {
            id: Uuid::new_v4(),
            employer,
            title: input.title.trim().to_string(),
            description: input.description,
            requirements: input.requirements,
            employment_type: input.employment_type.unwrap_or_default(),
            salary_min: input.salary_min,
            salary_max: input.salary_max,
            location: input.location,
            start_date: input.start_date,
            positions: input.positions.unwrap_or(1),
            status: input.status.unwrap_or_default(),
            created_at: ctx.now,
            updated_at: ctx.now,
        })
    }

    fn update(&mut self, input: JobPostingInput, ctx: &WriteContext<'_>) -> CampusResult<()> {
        input.validate()?;
        if ctx.caller.is_admin() {
            if let Some(employer) = input.employer {
                self.employer = employer;
            }
        }
        self.title = input.title.trim().to_string();
        self.description = input.description;
        self.requirements = input.requirements;
        if let Some(kind) = input.employment_type {
            self.employment_type = kind;
        }
        self.salary_min = input.salary_min;
        self.salary_max = input.salary_max;
        self.location = input.location;
        self.start_date = input.start_date;
        if let Some(positions) = input.positions {
            self.positions = positions;
        }
        if let Some(status) = input.status {
            self.status = status;
        }
        self.updated_at = ctx.now;
        Ok(())
    }
}

labelled_enum! {
    pub enum ApplicationStatus {
        Applied => "applied",
        UnderReview => "under_review",
        Shortlisted => "shortlisted",
        Interviewed => "interviewed",
        Offered => "offered",
        Accepted => "accepted",
        Rejected => "rejected",
        Withdrawn => "withdrawn",
    }
    default = Applied
}

impl ApplicationStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ApplicationStatus::Accepted | ApplicationStatus::Rejected | ApplicationStatus::Withdrawn
        )
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct JobApplication {
    pub id: Uuid,
    pub posting: Uuid,
    pub student: StudentId,
    pub cover_letter: Option<String>,
    pub status: ApplicationStatus,
    pub notes: Option<String>,
    pub applied_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JobApplicationInput {
    pub posting: Uuid,
    pub student: StudentId,
    pub cover_letter: Option<String>,
    pub status: Option<ApplicationStatus>,
    pub notes: Option<String>,
}

/// Body of the student-facing apply action
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApplyInput {
    pub cover_letter: Option<String>,
}

fn decision_by_action(status: Option<ApplicationStatus>) -> CampusResult<()> {
    match status {
        Some(ApplicationStatus::Accepted | ApplicationStatus::Rejected) => Err(
            CampusError::invalid("status", "use the approve or reject action"),
        ),
        _ => Ok(()),
    }
}

impl JobApplication {
    pub(crate) fn submit(
        posting: Uuid,
        student: StudentId,
        cover_letter: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            posting,
            student,
            cover_letter,
            status: ApplicationStatus::Applied,
            notes: None,
            applied_at: now,
            reviewed_at: None,
        }
    }
}

impl Record for JobApplication {
    const KIND: EntityKind = EntityKind::JobApplication;

    fn id(&self) -> Uuid {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.applied_at
    }

    fn table(db: &Tables) -> &Table<Self> {
        &db.applications
    }

    fn table_mut(db: &mut Tables) -> &mut Table<Self> {
        &mut db.applications
    }

    /// Student side owns directly; employer side owns through the posting.
    fn owner(&self, db: &Tables) -> Owner {
        Owner {
            employer: db.postings.get(&self.posting).map(|p| p.employer),
            ..Owner::student(self.student)
        }
    }

    fn matches(&self, filter: &Filter, db: &Tables) -> bool {
        let employer = db.postings.get(&self.posting).map(|p| p.employer.0);
        filter.status_is(self.status.as_str())
            && id_matches(filter.posting, self.posting)
            && id_matches(filter.student, self.student.0)
            && filter.employer.map(|e| employer == Some(e)).unwrap_or(true)
    }

    fn check(&self, db: &Tables) -> CampusResult<()> {
        let mut errors = FieldErrors::new();
        errors.check(!exists::<JobPosting>(db, self.posting), "posting", "job posting does not exist");
        errors.check(!exists::<StudentProfile>(db, self.student.0), "student", "student does not exist");
        errors.into_result()?;
        ensure_unique(db, self, "this student has already applied to this posting", |o| {
            o.posting == self.posting && o.student == self.student
        })
    }
}

impl Resource for JobApplication {
    type Input = JobApplicationInput;

    fn create(input: JobApplicationInput, ctx: &WriteContext<'_>) -> CampusResult<Self> {
        decision_by_action(input.status)?;
        let mut application =
            JobApplication::submit(input.posting, input.student, input.cover_letter, ctx.now);
        application.status = input.status.unwrap_or_default();
        application.notes = input.notes;
        Ok(application)
    }

    fn update(&mut self, input: JobApplicationInput, ctx: &WriteContext<'_>) -> CampusResult<()> {
        if input.status != Some(self.status) {
            decision_by_action(input.status)?;
        }
        self.posting = input.posting;
        self.student = input.student;
        self.cover_letter = input.cover_letter;
        if let Some(status) = input.status {
            if status != self.status {
                self.reviewed_at = Some(ctx.now);
            }
            self.status = status;
        }
        self.notes = input.notes;
        Ok(())
    }
}

impl Stateful for JobApplication {
    type Status = ApplicationStatus;

    fn status(&self) -> ApplicationStatus {
        self.status
    }

    fn target(transition: Transition) -> Option<ApplicationStatus> {
        match transition {
            Transition::Approve => Some(ApplicationStatus::Accepted),
            Transition::Reject => Some(ApplicationStatus::Rejected),
            _ => None,
        }
    }

    fn can_leave(from: ApplicationStatus) -> bool {
        !from.is_terminal()
    }

    fn enter(&mut self, to: ApplicationStatus, ctx: &WriteContext<'_>) {
        self.status = to;
        self.reviewed_at = Some(ctx.now);
    }
}

labelled_enum! {
    pub enum RehireStatus {
        Pending => "pending",
        Approved => "approved",
        Rejected => "rejected",
        Completed => "completed",
    }
    default = Pending
}

#[derive(Debug, Clone, Serialize)]
pub struct RehireRequest {
    pub id: Uuid,
    pub employer: EmployerId,
    pub student: StudentId,
    pub previous_placement: Option<Uuid>,
    pub new_job_title: String,
    pub proposed_salary: Decimal,
    pub reason: Option<String>,
    pub status: RehireStatus,
    pub approved_by: Option<AccountId>,
    pub approved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RehireRequestInput {
    /// Forced to the caller's own profile for employers
    pub employer: Option<EmployerId>,
    pub student: StudentId,
    pub previous_placement: Option<Uuid>,
    pub new_job_title: String,
    #[serde(default)]
    pub proposed_salary: Decimal,
    pub reason: Option<String>,
    pub status: Option<RehireStatus>,
}

impl RehireRequestInput {
    fn validate(&self) -> CampusResult<()> {
        let mut errors = FieldErrors::new();
        errors.check(self.new_job_title.trim().is_empty(), "new_job_title", "this field is required");
        check_money(&mut errors, "proposed_salary", self.proposed_salary);
        errors.check(
            matches!(self.status, Some(RehireStatus::Approved | RehireStatus::Rejected)),
            "status",
            "use the approve or reject action",
        );
        errors.into_result()
    }
}

impl Record for RehireRequest {
    const KIND: EntityKind = EntityKind::RehireRequest;

    fn id(&self) -> Uuid {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn table(db: &Tables) -> &Table<Self> {
        &db.rehire_requests
    }

    fn table_mut(db: &mut Tables) -> &mut Table<Self> {
        &mut db.rehire_requests
    }

    fn owner(&self, _db: &Tables) -> Owner {
        Owner {
            student: Some(self.student),
            ..Owner::employer(self.employer)
        }
    }

    fn matches(&self, filter: &Filter, _db: &Tables) -> bool {
        filter.text(&[&self.new_job_title])
            && filter.status_is(self.status.as_str())
            && id_matches(filter.employer, self.employer.0)
            && id_matches(filter.student, self.student.0)
    }

    fn check(&self, db: &Tables) -> CampusResult<()> {
        let mut errors = FieldErrors::new();
        errors.check(!exists::<EmployerProfile>(db, self.employer.0), "employer", "employer does not exist");
        errors.check(!exists::<StudentProfile>(db, self.student.0), "student", "student does not exist");
        if let Some(placement) = self.previous_placement {
            let consistent = db
                .placements
                .get(&placement)
                .map(|p| p.student == self.student && p.employer == self.employer)
                .unwrap_or(false);
            errors.check(
                !consistent,
                "previous_placement",
                "placement does not exist for this student and employer",
            );
        }
        errors.into_result()
    }
}

impl Resource for RehireRequest {
    type Input = RehireRequestInput;

    fn create(input: RehireRequestInput, ctx: &WriteContext<'_>) -> CampusResult<Self> {
        input.validate()?;
        let employer = acting_employer(ctx, input.employer)?;
        let status = match input.status {
            Some(status) if ctx.caller.is_admin() => status,
            _ => RehireStatus::Pending,
        };
        Ok(Self {
            id: Uuid::new_v4(),
            employer,
            student: input.student,
            previous_placement: input.previous_placement,
            new_job_title: input.new_job_title.trim().to_string(),
            proposed_salary: input.proposed_salary,
            reason: input.reason,
            status,
            approved_by: None,
            approved_at: None,
            created_at: ctx.now,
        })
    }

    fn update(&mut self, input: RehireRequestInput, ctx: &WriteContext<'_>) -> CampusResult<()> {
        if input.status != Some(self.status) {
            input.validate()?;
        }
        if ctx.caller.is_admin() {
            if let Some(employer) = input.employer {
                self.employer = employer;
            }
            if let Some(status) = input.status {
                self.status = status;
            }
        }
        self.student = input.student;
        self.previous_placement = input.previous_placement;
        self.new_job_title = input.new_job_title.trim().to_string();
        self.proposed_salary = input.proposed_salary;
        self.reason = input.reason;
        Ok(())
    }
}

impl Stateful for RehireRequest {
    type Status = RehireStatus;

    fn status(&self) -> RehireStatus {
        self.status
    }

    fn target(transition: Transition) -> Option<RehireStatus> {
        match transition {
            Transition::Approve => Some(RehireStatus::Approved),
            Transition::Reject => Some(RehireStatus::Rejected),
            _ => None,
        }
    }

    fn can_leave(from: RehireStatus) -> bool {
        from == RehireStatus::Pending
    }

    fn enter(&mut self, to: RehireStatus, ctx: &WriteContext<'_>) {
        self.status = to;
        self.approved_by = ctx.account();
        self.approved_at = Some(ctx.now);
    }
}

/// 1 (poor) to 5 (excellent)
pub const MAX_RATING: u8 = 5;

/// Employer's review of a placed student
#[derive(Debug, Clone, Serialize)]
pub struct EmployerFeedback {
    pub id: Uuid,
    pub employer: EmployerId,
    pub student: StudentId,
    pub placement: Uuid,
    pub overall_rating: u8,
    pub punctuality_rating: u8,
    pub quality_rating: u8,
    pub communication_rating: u8,
    pub reliability_rating: u8,
    pub strengths: String,
    pub areas_for_improvement: String,
    pub would_rehire: bool,
    pub additional_comments: Option<String>,
    pub submitted_by: Option<AccountId>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmployerFeedbackInput {
    /// Student and employer are taken from the placement
    pub placement: Uuid,
    pub overall_rating: u8,
    pub punctuality_rating: u8,
    pub quality_rating: u8,
    pub communication_rating: u8,
    pub reliability_rating: u8,
    #[serde(default)]
    pub strengths: String,
    #[serde(default)]
    pub areas_for_improvement: String,
    #[serde(default)]
    pub would_rehire: bool,
    pub additional_comments: Option<String>,
}

impl EmployerFeedbackInput {
    fn validate(&self) -> CampusResult<()> {
        let mut errors = FieldErrors::new();
        for (field, rating) in [
            ("overall_rating", self.overall_rating),
            ("punctuality_rating", self.punctuality_rating),
            ("quality_rating", self.quality_rating),
            ("communication_rating", self.communication_rating),
            ("reliability_rating", self.reliability_rating),
        ] {
            errors.check(!(1..=MAX_RATING).contains(&rating), field, "must be between 1 and 5");
        }
        errors.check(self.strengths.trim().is_empty(), "strengths", "this field is required");
        errors.into_result()
    }

    /// The placement being reviewed; employers may only review their own
    fn placement<'a>(&self, ctx: &WriteContext<'a>) -> CampusResult<&'a Placement> {
        let placement = ctx
            .db
            .placements
            .get(&self.placement)
            .ok_or_else(|| CampusError::invalid("placement", "placement does not exist"))?;
        if !ctx.caller.is_admin() && ctx.caller.employer() != Some(placement.employer) {
            return Err(CampusError::invalid("placement", "placement is not with this employer"));
        }
        Ok(placement)
    }
}

impl EmployerFeedback {
    fn rate(&mut self, input: EmployerFeedbackInput) {
        self.overall_rating = input.overall_rating;
        self.punctuality_rating = input.punctuality_rating;
        self.quality_rating = input.quality_rating;
        self.communication_rating = input.communication_rating;
        self.reliability_rating = input.reliability_rating;
        self.strengths = input.strengths.trim().to_string();
        self.areas_for_improvement = input.areas_for_improvement;
        self.would_rehire = input.would_rehire;
        self.additional_comments = input.additional_comments;
    }
}

impl Record for EmployerFeedback {
    const KIND: EntityKind = EntityKind::EmployerFeedback;

    fn id(&self) -> Uuid {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn table(db: &Tables) -> &Table<Self> {
        &db.feedback
    }

    fn table_mut(db: &mut Tables) -> &mut Table<Self> {
        &mut db.feedback
    }

    fn owner(&self, _db: &Tables) -> Owner {
        Owner {
            student: Some(self.student),
            ..Owner::employer(self.employer)
        }
    }

    fn matches(&self, filter: &Filter, _db: &Tables) -> bool {
        filter.text(&[&self.strengths, &self.areas_for_improvement])
            && filter.status_is(if self.would_rehire { "would_rehire" } else { "would_not_rehire" })
            && id_matches(filter.employer, self.employer.0)
            && id_matches(filter.student, self.student.0)
    }

    fn check(&self, db: &Tables) -> CampusResult<()> {
        if !exists::<Placement>(db, self.placement) {
            return Err(CampusError::invalid("placement", "placement does not exist"));
        }
        ensure_unique(db, self, "feedback for this placement already exists", |o| {
            o.placement == self.placement
        })
    }
}

impl Resource for EmployerFeedback {
    type Input = EmployerFeedbackInput;

    fn create(input: EmployerFeedbackInput, ctx: &WriteContext<'_>) -> CampusResult<Self> {
        input.validate()?;
        let placement = input.placement(ctx)?;
        let mut feedback = Self {
            id: Uuid::new_v4(),
            employer: placement.employer,
            student: placement.student,
            placement: placement.id,
            overall_rating: 0,
            punctuality_rating: 0,
            quality_rating: 0,
            communication_rating: 0,
            reliability_rating: 0,
            strengths: String::new(),
            areas_for_improvement: String::new(),
            would_rehire: false,
            additional_comments: None,
            submitted_by: ctx.account(),
            created_at: ctx.now,
        };
        feedback.rate(input);
        Ok(feedback)
    }

    fn update(&mut self, input: EmployerFeedbackInput, _ctx: &WriteContext<'_>) -> CampusResult<()> {
        input.validate()?;
        if input.placement != self.placement {
            return Err(CampusError::invalid("placement", "feedback cannot move to another placement"));
        }
        self.rate(input);
        Ok(())
    }
}
