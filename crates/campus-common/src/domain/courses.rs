//! Course catalog: categories, courses, modules, instructors, assessments

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use uuid::Uuid;

use super::accounts::Account;
use super::value_objects::{check_money, check_rate, employee_number, AccountId, InstructorId};
use crate::error::{CampusError, CampusResult, FieldErrors};
use crate::identity::Role;
use crate::policy::{EntityKind, Owner};
use crate::store::filter::id_matches;
use crate::store::{ensure_unique, exists, Filter, Record, Resource, Table, Tables, WriteContext};

/// Longest course offered, in weeks
pub const MAX_DURATION_WEEKS: u32 = 52;

#[derive(Debug, Clone, Serialize)]
pub struct CourseCategory {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CourseCategoryInput {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub is_active: Option<bool>,
}

impl Record for CourseCategory {
    const KIND: EntityKind = EntityKind::CourseCategory;

    fn id(&self) -> Uuid {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn table(db: &Tables) -> &Table<Self> {
        &db.categories
    }

    fn table_mut(db: &mut Tables) -> &mut Table<Self> {
        &mut db.categories
    }

    fn owner(&self, _db: &Tables) -> Owner {
        Owner::default()
    }

    fn matches(&self, filter: &Filter, _db: &Tables) -> bool {
        filter.text(&[&self.name, &self.description])
    }

    fn check(&self, db: &Tables) -> CampusResult<()> {
        ensure_unique(db, self, "a category with this name already exists", |o| {
            o.name.eq_ignore_ascii_case(&self.name)
        })
    }

    fn ordering(a: &Self, b: &Self) -> Ordering {
        a.name.cmp(&b.name)
    }
}

impl Resource for CourseCategory {
    type Input = CourseCategoryInput;

    fn create(input: CourseCategoryInput, ctx: &WriteContext<'_>) -> CampusResult<Self> {
        if input.name.trim().is_empty() {
            return Err(CampusError::invalid("name", "this field is required"));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            name: input.name.trim().to_string(),
            description: input.description,
            is_active: input.is_active.unwrap_or(true),
            created_at: ctx.now,
        })
    }

    fn update(&mut self, input: CourseCategoryInput, _ctx: &WriteContext<'_>) -> CampusResult<()> {
        if input.name.trim().is_empty() {
            return Err(CampusError::invalid("name", "this field is required"));
        }
        self.name = input.name.trim().to_string();
        self.description = input.description;
        if let Some(active) = input.is_active {
            self.is_active = active;
        }
        Ok(())
    }
}

labelled_enum! {
    pub enum Difficulty {
        Beginner => "beginner",
        Intermediate => "intermediate",
        Advanced => "advanced",
    }
    default = Beginner
}

labelled_enum! {
    pub enum CourseStatus {
        Draft => "draft",
        Active => "active",
        Retired => "retired",
    }
    default = Active
}

#[derive(Debug, Clone, Serialize)]
pub struct Course {
    pub id: Uuid,
    pub code: String,
    pub title: String,
    pub description: String,
    pub category: Uuid,
    pub difficulty: Difficulty,
    pub duration_weeks: u32,
    pub total_hours: u32,
    pub max_students: u32,
    pub tuition_fee: Decimal,
    pub status: CourseStatus,
    pub instructors: Vec<InstructorId>,
    pub prerequisites: Option<String>,
    pub created_by: Option<AccountId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CourseInput {
    pub code: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub category: Uuid,
    pub difficulty: Option<Difficulty>,
    pub duration_weeks: u32,
    #[serde(default)]
    pub total_hours: u32,
    pub max_students: Option<u32>,
    #[serde(default)]
    pub tuition_fee: Decimal,
    pub status: Option<CourseStatus>,
    #[serde(default)]
    pub instructors: Vec<InstructorId>,
    pub prerequisites: Option<String>,
}

impl CourseInput {
    fn validate(&self) -> CampusResult<()> {
        let mut errors = FieldErrors::new();
        errors.check(self.code.trim().is_empty(), "code", "this field is required");
        errors.check(self.title.trim().is_empty(), "title", "this field is required");
        errors.check(
            !(1..=MAX_DURATION_WEEKS).contains(&self.duration_weeks),
            "duration_weeks",
            "must be between 1 and 52 weeks",
        );
        errors.check(self.max_students == Some(0), "max_students", "must be at least 1");
        check_money(&mut errors, "tuition_fee", self.tuition_fee);
        errors.into_result()
    }
}

impl Course {
    /// Start date plus the course duration; fails for starts at the edge
    /// of the calendar range
    pub fn expected_completion(&self, start: NaiveDate) -> CampusResult<NaiveDate> {
        start
            .checked_add_signed(chrono::Duration::weeks(i64::from(self.duration_weeks)))
            .ok_or_else(|| CampusError::invalid("enrollment_date", "date is out of range"))
    }
}

impl Record for Course {
    const KIND: EntityKind = EntityKind::Course;

    fn id(&self) -> Uuid {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn table(db: &Tables) -> &Table<Self> {
        &db.courses
    }

    fn table_mut(db: &mut Tables) -> &mut Table<Self> {
        &mut db.courses
    }

    fn owner(&self, _db: &Tables) -> Owner {
        Owner::default()
    }

    fn matches(&self, filter: &Filter, _db: &Tables) -> bool {
        filter.text(&[&self.title, &self.code, &self.description])
            && filter.status_is(self.status.as_str())
            && filter.difficulty_is(self.difficulty.as_str())
            && id_matches(filter.category, self.category)
            && filter
                .instructor
                .map(|i| self.instructors.contains(&InstructorId(i)))
                .unwrap_or(true)
    }

    fn check(&self, db: &Tables) -> CampusResult<()> {
        let mut errors = FieldErrors::new();
        errors.check(!exists::<CourseCategory>(db, self.category), "category", "category does not exist");
        for instructor in &self.instructors {
            if !db.instructors.contains_key(&instructor.0) {
                errors.add("instructors", format!("instructor {} does not exist", instructor));
            }
        }
        errors.into_result()?;
        ensure_unique(db, self, "a course with this code already exists", |o| {
            o.code.eq_ignore_ascii_case(&self.code)
        })
    }
}

impl Resource for Course {
    type Input = CourseInput;

    fn create(input: CourseInput, ctx: &WriteContext<'_>) -> CampusResult<Self> {
        input.validate()?;
        let mut instructors = input.instructors;
        instructors.dedup();
        Ok(Self {
            id: Uuid::new_v4(),
            code: input.code.trim().to_uppercase(),
            title: input.title.trim().to_string(),
            description: input.description,
            category: input.category,
            difficulty: input.difficulty.unwrap_or_default(),
            duration_weeks: input.duration_weeks,
            total_hours: input.total_hours,
            max_students: input.max_students.unwrap_or(20),
            tuition_fee: input.tuition_fee,
            status: input.status.unwrap_or_default(),
            instructors,
            prerequisites: input.prerequisites,
            created_by: ctx.account(),
            created_at: ctx.now,
            updated_at: ctx.now,
        })
    }

    fn update(&mut self, input: CourseInput, ctx: &WriteContext<'_>) -> CampusResult<()> {
        input.validate()?;
        let mut instructors = input.instructors;
        instructors.dedup();
        self.code = input.code.trim().to_uppercase();
        self.title = input.title.trim().to_string();
        self.description = input.description;
        self.category = input.category;
        if let Some(difficulty) = input.difficulty {
            self.difficulty = difficulty;
        }
        self.duration_weeks = input.duration_weeks;
        self.total_hours = input.total_hours;
        if let Some(max) = input.max_students {
            self.max_students = max;
        }
        self.tuition_fee = input.tuition_fee;
        if let Some(status) = input.status {
            self.status = status;
        }
        self.instructors = instructors;
        self.prerequisites = input.prerequisites;
        self.updated_at = ctx.now;
        Ok(())
    }
}

/// Ordered unit of a course
#[derive(Debug, Clone, Serialize)]
pub struct CourseModule {
    pub id: Uuid,
    pub course: Uuid,
    pub title: String,
    pub description: String,
    pub order: u32,
    pub duration_hours: u32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CourseModuleInput {
    pub course: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub order: u32,
    #[serde(default)]
    pub duration_hours: u32,
}

impl Record for CourseModule {
    const KIND: EntityKind = EntityKind::CourseModule;

    fn id(&self) -> Uuid {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn table(db: &Tables) -> &Table<Self> {
        &db.modules
    }

    fn table_mut(db: &mut Tables) -> &mut Table<Self> {
        &mut db.modules
    }

    fn owner(&self, _db: &Tables) -> Owner {
        Owner::default()
    }

    fn matches(&self, filter: &Filter, _db: &Tables) -> bool {
        filter.text(&[&self.title, &self.description]) && id_matches(filter.course, self.course)
    }

    fn check(&self, db: &Tables) -> CampusResult<()> {
        if !exists::<Course>(db, self.course) {
            return Err(CampusError::invalid("course", "course does not exist"));
        }
        ensure_unique(db, self, "this course already has a module at that position", |o| {
            o.course == self.course && o.order == self.order
        })
    }

    fn ordering(a: &Self, b: &Self) -> Ordering {
        a.course.cmp(&b.course).then(a.order.cmp(&b.order))
    }
}

impl Resource for CourseModule {
    type Input = CourseModuleInput;

    fn create(input: CourseModuleInput, ctx: &WriteContext<'_>) -> CampusResult<Self> {
        if input.title.trim().is_empty() {
            return Err(CampusError::invalid("title", "this field is required"));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            course: input.course,
            title: input.title.trim().to_string(),
            description: input.description,
            order: input.order,
            duration_hours: input.duration_hours,
            created_at: ctx.now,
        })
    }

    fn update(&mut self, input: CourseModuleInput, _ctx: &WriteContext<'_>) -> CampusResult<()> {
        if input.title.trim().is_empty() {
            return Err(CampusError::invalid("title", "this field is required"));
        }
        self.course = input.course;
        self.title = input.title.trim().to_string();
        self.description = input.description;
        self.order = input.order;
        self.duration_hours = input.duration_hours;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct InstructorProfile {
    pub id: InstructorId,
    pub user: AccountId,
    pub employee_id: String,
    pub specialization: String,
    pub qualifications: Option<String>,
    pub years_experience: u32,
    pub hire_date: NaiveDate,
    pub hourly_rate: Option<Decimal>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InstructorProfileInput {
    pub user: AccountId,
    pub employee_id: Option<String>,
    #[serde(default)]
    pub specialization: String,
    pub qualifications: Option<String>,
    #[serde(default)]
    pub years_experience: u32,
    pub hire_date: Option<NaiveDate>,
    pub hourly_rate: Option<Decimal>,
    pub is_active: Option<bool>,
}

impl InstructorProfile {
    pub(crate) fn for_account(user: AccountId, now: DateTime<Utc>) -> Self {
        Self {
            id: InstructorId::new(),
            user,
            employee_id: employee_number(now.date_naive()),
            specialization: String::new(),
            qualifications: None,
            years_experience: 0,
            hire_date: now.date_naive(),
            hourly_rate: None,
            is_active: true,
            created_at: now,
        }
    }
}

/// Profile link must point at an account of `role` with no other profile
pub(crate) fn check_profile_link(
    db: &Tables,
    user: AccountId,
    role: Role,
    already_linked: bool,
) -> CampusResult<()> {
    match db.accounts.get(&user.0) {
        None => Err(CampusError::invalid("user", "user does not exist")),
        Some(account) if account.role != role => Err(CampusError::invalid(
            "user",
            format!("user must have the {} role", role),
        )),
        Some(_) if already_linked => Err(CampusError::Conflict(
            "this user already has a profile".into(),
        )),
        Some(_) => Ok(()),
    }
}

impl Record for InstructorProfile {
    const KIND: EntityKind = EntityKind::InstructorProfile;

    fn id(&self) -> Uuid {
        self.id.0
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn table(db: &Tables) -> &Table<Self> {
        &db.instructors
    }

    fn table_mut(db: &mut Tables) -> &mut Table<Self> {
        &mut db.instructors
    }

    fn owner(&self, _db: &Tables) -> Owner {
        Owner {
            listed: self.is_active,
            ..Owner::account(self.user)
        }
    }

    fn matches(&self, filter: &Filter, db: &Tables) -> bool {
        let name = db.accounts.get(&self.user.0).map(Account::full_name).unwrap_or_default();
        filter.text(&[&name, &self.employee_id, &self.specialization])
    }

    fn check(&self, db: &Tables) -> CampusResult<()> {
        let linked = db.instructors.values().any(|o| o.user == self.user && o.id != self.id);
        check_profile_link(db, self.user, Role::Instructor, linked)?;
        ensure_unique(db, self, "an instructor with this employee id already exists", |o| {
            o.employee_id == self.employee_id
        })
    }
}

impl InstructorProfileInput {
    fn validate(&self) -> CampusResult<()> {
        let mut errors = FieldErrors::new();
        if let Some(rate) = self.hourly_rate {
            check_rate(&mut errors, "hourly_rate", rate);
        }
        errors.into_result()
    }
}

impl Resource for InstructorProfile {
    type Input = InstructorProfileInput;

    fn create(input: InstructorProfileInput, ctx: &WriteContext<'_>) -> CampusResult<Self> {
        input.validate()?;
        let mut profile = InstructorProfile::for_account(input.user, ctx.now);
        if let Some(employee_id) = input.employee_id.filter(|e| !e.trim().is_empty()) {
            profile.employee_id = employee_id;
        }
        profile.specialization = input.specialization;
        profile.qualifications = input.qualifications;
        profile.years_experience = input.years_experience;
        profile.hire_date = input.hire_date.unwrap_or_else(|| ctx.today());
        profile.hourly_rate = input.hourly_rate;
        profile.is_active = input.is_active.unwrap_or(true);
        Ok(profile)
    }

    fn update(&mut self, input: InstructorProfileInput, _ctx: &WriteContext<'_>) -> CampusResult<()> {
        input.validate()?;
        if input.user != self.user {
            return Err(CampusError::invalid("user", "a profile cannot move to another user"));
        }
        if let Some(employee_id) = input.employee_id.filter(|e| !e.trim().is_empty()) {
            self.employee_id = employee_id;
        }
        self.specialization = input.specialization;
        self.qualifications = input.qualifications;
        self.years_experience = input.years_experience;
        if let Some(hire_date) = input.hire_date {
            self.hire_date = hire_date;
        }
        self.hourly_rate = input.hourly_rate;
        if let Some(active) = input.is_active {
            self.is_active = active;
        }
        Ok(())
    }
}

labelled_enum! {
    pub enum AssessmentType {
        Quiz => "quiz",
        Exam => "exam",
        Practical => "practical",
        Assignment => "assignment",
        Project => "project",
    }
    default = Exam
}

#[derive(Debug, Clone, Serialize)]
pub struct Assessment {
    pub id: Uuid,
    pub course: Uuid,
    pub title: String,
    pub description: String,
    pub assessment_type: AssessmentType,
    pub max_score: Decimal,
    pub passing_score: Decimal,
    pub due_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssessmentInput {
    pub course: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub assessment_type: Option<AssessmentType>,
    pub max_score: Option<Decimal>,
    pub passing_score: Option<Decimal>,
    pub due_date: Option<NaiveDate>,
}

/// Largest accepted assessment score
pub const MAX_SCORE: Decimal = dec!(999.99);

impl AssessmentInput {
    fn scores(&self) -> CampusResult<(Decimal, Decimal)> {
        let max = self.max_score.unwrap_or(dec!(100));
        let passing = self.passing_score.unwrap_or(dec!(70)).min(max);
        let mut errors = FieldErrors::new();
        errors.check(self.title.trim().is_empty(), "title", "this field is required");
        errors.check(
            max <= Decimal::ZERO || max > MAX_SCORE,
            "max_score",
            "must be greater than zero and at most 999.99",
        );
        errors.check(
            self.passing_score.map(|p| p > max || p.is_sign_negative()).unwrap_or(false),
            "passing_score",
            "must be between zero and the maximum score",
        );
        errors.into_result()?;
        Ok((max, passing))
    }
}

impl Record for Assessment {
    const KIND: EntityKind = EntityKind::Assessment;

    fn id(&self) -> Uuid {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn table(db: &Tables) -> &Table<Self> {
        &db.assessments
    }

    fn table_mut(db: &mut Tables) -> &mut Table<Self> {
        &mut db.assessments
    }

    fn owner(&self, _db: &Tables) -> Owner {
        Owner::default()
    }

    fn matches(&self, filter: &Filter, _db: &Tables) -> bool {
        filter.text(&[&self.title, &self.description])
            && filter.kind_is(self.assessment_type.as_str())
            && id_matches(filter.course, self.course)
    }

    fn check(&self, db: &Tables) -> CampusResult<()> {
        if exists::<Course>(db, self.course) {
            Ok(())
        } else {
            Err(CampusError::invalid("course", "course does not exist"))
        }
    }
}

impl Resource for Assessment {
    type Input = AssessmentInput;

    fn create(input: AssessmentInput, ctx: &WriteContext<'_>) -> CampusResult<Self> {
        let (max_score, passing_score) = input.scores()?;
        Ok(Self {
            id: Uuid::new_v4(),
            course: input.course,
            title: input.title.trim().to_string(),
            description: input.description,
            assessment_type: input.assessment_type.unwrap_or_default(),
            max_score,
            passing_score,
            due_date: input.due_date,
            created_at: ctx.now,
        })
    }

    fn update(&mut self, input: AssessmentInput, _ctx: &WriteContext<'_>) -> CampusResult<()> {
        let (max_score, passing_score) = input.scores()?;
        self.course = input.course;
        self.title = input.title.trim().to_string();
        self.description = input.description;
        if let Some(kind) = input.assessment_type {
            self.assessment_type = kind;
        }
        self.max_score = max_score;
        self.passing_score = passing_score;
        self.due_date = input.due_date;
        Ok(())
    }
}
