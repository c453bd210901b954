//! Certificates and competency assessments

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use utoipa::ToSchema;
use uuid::Uuid;

use super::courses::Course;
use super::students::{student_name, StudentProfile};
use super::value_objects::{certificate_number, verification_code, AccountId, StudentId};
use crate::error::{CampusError, CampusResult, FieldErrors};
use crate::policy::{EntityKind, Owner};
use crate::store::filter::id_matches;
use crate::store::{ensure_unique, exists, Filter, Record, Resource, Table, Tables, WriteContext};

/// Public verification endpoint, relative to the server root
pub const VERIFY_PATH: &str = "/api/certifications/certificates/verify";

/// Score at or above which a competency assessment passes by default
pub const COMPETENCY_PASS_MARK: Decimal = dec!(70);

labelled_enum! {
    pub enum CertificateStatus {
        Pending => "pending",
        Issued => "issued",
        Verified => "verified",
        Revoked => "revoked",
    }
    default = Issued
}

#[derive(Debug, Clone)]
pub struct Certificate {
    pub id: Uuid,
    pub student: StudentId,
    pub course: Uuid,
    pub certificate_number: String,
    pub verification_code: String,
    pub status: CertificateStatus,
    pub issue_date: NaiveDate,
    pub expiry_date: Option<NaiveDate>,
    pub grade: Option<String>,
    pub score: Option<Decimal>,
    pub issued_by: Option<AccountId>,
    pub created_at: DateTime<Utc>,
}

impl Certificate {
    pub fn is_expired(&self, today: NaiveDate) -> bool {
        self.expiry_date.map(|expiry| expiry < today).unwrap_or(false)
    }

    /// Issued or verified, and not past expiry
    pub fn is_valid(&self, today: NaiveDate) -> bool {
        matches!(self.status, CertificateStatus::Issued | CertificateStatus::Verified)
            && !self.is_expired(today)
    }

    pub fn verification_url(&self) -> String {
        format!("{}?code={}", VERIFY_PATH, self.verification_code)
    }
}

// Derived fields are computed at serialization time.
impl Serialize for Certificate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let today = Utc::now().date_naive();
        let mut state = serializer.serialize_struct("Certificate", 14)?;
        state.serialize_field("id", &self.id)?;
        state.serialize_field("student", &self.student)?;
        state.serialize_field("course", &self.course)?;
        state.serialize_field("certificate_number", &self.certificate_number)?;
        state.serialize_field("verification_code", &self.verification_code)?;
        state.serialize_field("status", &self.status)?;
        state.serialize_field("issue_date", &self.issue_date)?;
        state.serialize_field("expiry_date", &self.expiry_date)?;
        state.serialize_field("grade", &self.grade)?;
        state.serialize_field("score", &self.score)?;
        state.serialize_field("issued_by", &self.issued_by)?;
        state.serialize_field("created_at", &self.created_at)?;
        state.serialize_field("is_expired", &self.is_expired(today))?;
        state.serialize_field("verification_url", &self.verification_url())?;
        state.end()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CertificateInput {
    pub student: StudentId,
    pub course: Uuid,
    pub certificate_number: Option<String>,
    pub status: Option<CertificateStatus>,
    pub issue_date: Option<NaiveDate>,
    pub expiry_date: Option<NaiveDate>,
    pub grade: Option<String>,
    pub score: Option<Decimal>,
}

impl CertificateInput {
    fn validate(&self, issue_date: NaiveDate) -> CampusResult<()> {
        let mut errors = FieldErrors::new();
        errors.check(
            self.expiry_date.map(|e| e < issue_date).unwrap_or(false),
            "expiry_date",
            "must not be before the issue date",
        );
        errors.check(
            self.score.map(|s| s.is_sign_negative() || s > dec!(100)).unwrap_or(false),
            "score",
            "must be between 0 and 100",
        );
        errors.into_result()
    }
}

impl Record for Certificate {
    const KIND: EntityKind = EntityKind::Certificate;

    fn id(&self) -> Uuid {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn table(db: &Tables) -> &Table<Self> {
        &db.certificates
    }

    fn table_mut(db: &mut Tables) -> &mut Table<Self> {
        &mut db.certificates
    }

    fn owner(&self, _db: &Tables) -> Owner {
        Owner::student(self.student)
    }

    fn matches(&self, filter: &Filter, _db: &Tables) -> bool {
        filter.text(&[&self.certificate_number, self.grade.as_deref().unwrap_or_default()])
            && filter.status_is(self.status.as_str())
            && id_matches(filter.student, self.student.0)
            && id_matches(filter.course, self.course)
    }

    fn check(&self, db: &Tables) -> CampusResult<()> {
        let mut errors = FieldErrors::new();
        errors.check(!exists::<StudentProfile>(db, self.student.0), "student", "student does not exist");
        errors.check(!exists::<Course>(db, self.course), "course", "course does not exist");
        errors.into_result()?;
        ensure_unique(db, self, "a certificate with this number already exists", |o| {
            o.certificate_number == self.certificate_number
        })?;
        ensure_unique(db, self, "verification code collision", |o| {
            o.verification_code == self.verification_code
        })
    }
}

impl Resource for Certificate {
    type Input = CertificateInput;

    fn create(input: CertificateInput, ctx: &WriteContext<'_>) -> CampusResult<Self> {
        let issue_date = input.issue_date.unwrap_or_else(|| ctx.today());
        input.validate(issue_date)?;
        Ok(Self {
            id: Uuid::new_v4(),
            student: input.student,
            course: input.course,
            certificate_number: input
                .certificate_number
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| certificate_number(ctx.today())),
            verification_code: verification_code(),
            status: input.status.unwrap_or_default(),
            issue_date,
            expiry_date: input.expiry_date,
            grade: input.grade,
            score: input.score,
            issued_by: ctx.account(),
            created_at: ctx.now,
        })
    }

    fn update(&mut self, input: CertificateInput, _ctx: &WriteContext<'_>) -> CampusResult<()> {
        let issue_date = input.issue_date.unwrap_or(self.issue_date);
        input.validate(issue_date)?;
        self.student = input.student;
        self.course = input.course;
        if let Some(number) = input.certificate_number.filter(|n| !n.trim().is_empty()) {
            self.certificate_number = number;
        }
        if let Some(status) = input.status {
            self.status = status;
        }
        self.issue_date = issue_date;
        self.expiry_date = input.expiry_date;
        self.grade = input.grade;
        self.score = input.score;
        Ok(())
    }
}

/// Public answer to a verification code lookup
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CertificateVerification {
    pub certificate_number: String,
    pub student_name: String,
    pub course_title: String,
    #[schema(value_type = String)]
    pub status: CertificateStatus,
    pub issue_date: NaiveDate,
    pub expiry_date: Option<NaiveDate>,
    pub grade: Option<String>,
    pub is_expired: bool,
    pub is_valid: bool,
}

impl CertificateVerification {
    pub(crate) fn of(certificate: &Certificate, db: &Tables, today: NaiveDate) -> Self {
        Self {
            certificate_number: certificate.certificate_number.clone(),
            student_name: student_name(db, certificate.student),
            course_title: db
                .courses
                .get(&certificate.course)
                .map(|c| c.title.clone())
                .unwrap_or_default(),
            status: certificate.status,
            issue_date: certificate.issue_date,
            expiry_date: certificate.expiry_date,
            grade: certificate.grade.clone(),
            is_expired: certificate.is_expired(today),
            is_valid: certificate.is_valid(today),
        }
    }
}

labelled_enum! {
    pub enum CompetencyType {
        Practical => "practical",
        Written => "written",
        Oral => "oral",
        Portfolio => "portfolio",
    }
    default = Practical
}

#[derive(Debug, Clone, Serialize)]
pub struct CompetencyAssessment {
    pub id: Uuid,
    pub student: StudentId,
    pub course: Uuid,
    pub assessor: Option<AccountId>,
    pub assessment_type: CompetencyType,
    pub score: Decimal,
    pub passed: bool,
    pub requires_retraining: bool,
    pub notes: Option<String>,
    pub assessed_on: NaiveDate,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CompetencyAssessmentInput {
    pub student: StudentId,
    pub course: Uuid,
    pub assessment_type: Option<CompetencyType>,
    pub score: Decimal,
    pub passed: Option<bool>,
    pub requires_retraining: Option<bool>,
    pub notes: Option<String>,
    pub assessed_on: Option<NaiveDate>,
}

impl CompetencyAssessmentInput {
    /// (passed, requires_retraining)
    fn outcome(&self) -> CampusResult<(bool, bool)> {
        if self.score.is_sign_negative() || self.score > dec!(100) {
            return Err(CampusError::invalid("score", "must be between 0 and 100"));
        }
        let passed = self.passed.unwrap_or(self.score >= COMPETENCY_PASS_MARK);
        Ok((passed, self.requires_retraining.unwrap_or(!passed)))
    }
}

impl Record for CompetencyAssessment {
    const KIND: EntityKind = EntityKind::CompetencyAssessment;

    fn id(&self) -> Uuid {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn table(db: &Tables) -> &Table<Self> {
        &db.competency_assessments
    }

    fn table_mut(db: &mut Tables) -> &mut Table<Self> {
        &mut db.competency_assessments
    }

    fn owner(&self, _db: &Tables) -> Owner {
        Owner {
            staff: self.assessor,
            ..Owner::student(self.student)
        }
    }

    fn matches(&self, filter: &Filter, _db: &Tables) -> bool {
        filter.kind_is(self.assessment_type.as_str())
            && filter.status_is(if self.passed { "passed" } else { "failed" })
            && id_matches(filter.student, self.student.0)
            && id_matches(filter.course, self.course)
    }

    fn check(&self, db: &Tables) -> CampusResult<()> {
        let mut errors = FieldErrors::new();
        errors.check(!exists::<StudentProfile>(db, self.student.0), "student", "student does not exist");
        errors.check(!exists::<Course>(db, self.course), "course", "course does not exist");
        errors.into_result()
    }
}

impl Resource for CompetencyAssessment {
    type Input = CompetencyAssessmentInput;

    fn create(input: CompetencyAssessmentInput, ctx: &WriteContext<'_>) -> CampusResult<Self> {
        let (passed, requires_retraining) = input.outcome()?;
        Ok(Self {
            id: Uuid::new_v4(),
            student: input.student,
            course: input.course,
            assessor: ctx.account(),
            assessment_type: input.assessment_type.unwrap_or_default(),
            score: input.score,
            passed,
            requires_retraining,
            notes: input.notes,
            assessed_on: input.assessed_on.unwrap_or_else(|| ctx.today()),
            created_at: ctx.now,
        })
    }

    fn update(&mut self, input: CompetencyAssessmentInput, _ctx: &WriteContext<'_>) -> CampusResult<()> {
        let (passed, requires_retraining) = input.outcome()?;
        self.student = input.student;
        self.course = input.course;
        if let Some(kind) = input.assessment_type {
            self.assessment_type = kind;
        }
        self.score = input.score;
        self.passed = passed;
        self.requires_retraining = requires_retraining;
        self.notes = input.notes;
        if let Some(date) = input.assessed_on {
            self.assessed_on = date;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn certificate(expiry: Option<NaiveDate>, status: CertificateStatus) -> Certificate {
        Certificate {
            id: Uuid::new_v4(),
            student: StudentId::new(),
            course: Uuid::new_v4(),
            certificate_number: "CERT-2026-TEST0001".into(),
            verification_code: verification_code(),
            status,
            issue_date: NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
            expiry_date: expiry,
            grade: Some("A".into()),
            score: Some(dec!(91)),
            issued_by: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_expiry() {
        let today = NaiveDate::from_ymd_opt(2026, 6, 1).unwrap();
        let lapsed = certificate(NaiveDate::from_ymd_opt(2026, 5, 31), CertificateStatus::Issued);
        let current = certificate(NaiveDate::from_ymd_opt(2026, 6, 1), CertificateStatus::Issued);

        assert!(lapsed.is_expired(today));
        assert!(!lapsed.is_valid(today));
        assert!(!current.is_expired(today));
        assert!(current.is_valid(today));
        assert!(!certificate(None, CertificateStatus::Revoked).is_valid(today));
    }

    #[test]
    fn test_serialized_certificate_carries_derived_fields() {
        let cert = certificate(None, CertificateStatus::Issued);
        let json = serde_json::to_value(&cert).unwrap();
        assert_eq!(json["is_expired"], false);
        assert_eq!(json["status"], "issued");
        assert!(json["verification_url"].as_str().unwrap().ends_with(&cert.verification_code));
    }

    #[test]
    fn test_competency_outcome_defaults() {
        let input = CompetencyAssessmentInput {
            student: StudentId::new(),
            course: Uuid::new_v4(),
            assessment_type: None,
            score: dec!(64),
            passed: None,
            requires_retraining: None,
            notes: None,
            assessed_on: None,
        };
        assert_eq!(input.outcome().unwrap(), (false, true));

        let strong = CompetencyAssessmentInput { score: dec!(70), ..input };
        assert_eq!(strong.outcome().unwrap(), (true, false));
    }
}
