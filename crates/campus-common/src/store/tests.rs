//! Store scenarios across roles

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

use super::*;
use crate::identity::Role;

pub(crate) struct Fixture {
    pub store: Store,
    pub admin: Caller,
    pub instructor: Caller,
    pub student: Caller,
    pub other_student: Caller,
    pub employer: Caller,
    pub course: Uuid,
    pub enrollment: Uuid,
}

pub(crate) fn join(store: &Store, email: &str, role: Role) -> Caller {
    let account = store
        .register(Registration {
            email: email.to_string(),
            password: "password-123".to_string(),
            password_confirm: "password-123".to_string(),
            role,
            first_name: "Test".to_string(),
            last_name: role.as_str().to_string(),
            phone: None,
            company_name: None,
        })
        .unwrap();
    store.caller(account.id).unwrap()
}

/// Admin, instructor, two students and an employer; the first student is
/// enrolled in one course
pub(crate) fn fixture() -> Fixture {
    let store = Store::new();
    store.ensure_admin("admin@campus.test", "admin-password").unwrap();
    let admin_account = store.authenticate("admin@campus.test", "admin-password").unwrap();
    let admin = store.caller(admin_account.id).unwrap();

    let instructor = join(&store, "teach@campus.test", Role::Instructor);
    let student = join(&store, "stu@campus.test", Role::Student);
    let other_student = join(&store, "other@campus.test", Role::Student);
    let employer = join(&store, "hire@campus.test", Role::Employer);

    let category = store
        .create::<CourseCategory>(
            &admin,
            CourseCategoryInput {
                name: "Trades".into(),
                description: String::new(),
                is_active: None,
            },
        )
        .unwrap();
    let course = store
        .create::<Course>(
            &admin,
            CourseInput {
                code: "weld101".into(),
                title: "Welding Basics".into(),
                description: String::new(),
                category: category.id,
                difficulty: None,
                duration_weeks: 8,
                total_hours: 120,
                max_students: Some(20),
                tuition_fee: dec!(1500),
                status: None,
                instructors: vec![],
                prerequisites: None,
            },
        )
        .unwrap();
    let enrollment = store
        .create::<Enrollment>(&admin, enrollment_input(&student, course.id))
        .unwrap();

    Fixture {
        store,
        admin,
        instructor,
        student,
        other_student,
        employer,
        course: course.id,
        enrollment: enrollment.id,
    }
}

pub(crate) fn enrollment_input(student: &Caller, course: Uuid) -> EnrollmentInput {
    EnrollmentInput {
        student: student.student().unwrap(),
        course,
        status: None,
        enrollment_date: None,
        expected_completion: None,
        final_grade: None,
        notes: None,
    }
}

fn posting_input(title: &str) -> JobPostingInput {
    JobPostingInput {
        employer: None,
        title: title.into(),
        description: "Shop floor work".into(),
        requirements: None,
        employment_type: None,
        salary_min: Some(dec!(30000)),
        salary_max: Some(dec!(40000)),
        location: "Lagos".into(),
        start_date: None,
        positions: None,
        status: None,
    }
}

fn check_input() -> BackgroundCheckInput {
    BackgroundCheckInput {
        user: None,
        check_type: None,
        reference_number: None,
        provider: None,
        notes: None,
        expires_on: None,
        status: None,
    }
}

#[test]
fn test_new_enrollment_defaults_to_enrolled() {
    let Fixture { store, admin, enrollment, course, .. } = fixture();
    let record = store.get::<Enrollment>(&admin, enrollment).unwrap();
    assert_eq!(record.status, EnrollmentStatus::Enrolled);
    assert_eq!(record.course, course);
    assert_eq!(record.expected_completion, record.enrollment_date + chrono::Duration::weeks(8));
}

#[test]
fn test_duplicate_enrollment_conflicts_without_second_row() {
    let Fixture { store, admin, student, course, .. } = fixture();
    let err = store
        .create::<Enrollment>(&admin, enrollment_input(&student, course))
        .unwrap_err();
    assert!(matches!(err, CampusError::Conflict(_)));
    assert_eq!(store.list::<Enrollment>(&admin, &Filter::default()).unwrap().len(), 1);
}

#[test]
fn test_non_owner_sees_nothing_and_gets_not_found() {
    let Fixture { store, student, other_student, employer, enrollment, .. } = fixture();
    assert_eq!(store.list::<Enrollment>(&student, &Filter::default()).unwrap().len(), 1);
    assert!(store.list::<Enrollment>(&other_student, &Filter::default()).unwrap().is_empty());
    assert!(store.list::<Enrollment>(&employer, &Filter::default()).unwrap().is_empty());
    assert_eq!(
        store.get::<Enrollment>(&other_student, enrollment).unwrap_err(),
        CampusError::NotFound
    );
    assert!(store.list::<Payment>(&other_student, &Filter::default()).unwrap().is_empty());
    assert!(store.list::<Expense>(&student, &Filter::default()).unwrap().is_empty());
}

#[test]
fn test_student_without_profile_sees_empty_set() {
    let Fixture { store, admin, .. } = fixture();
    let orphan = Caller::Student { account: AccountId::new(), profile: None };
    assert!(store.list::<Enrollment>(&orphan, &Filter::default()).unwrap().is_empty());
    assert!(store.list::<Certificate>(&orphan, &Filter::default()).unwrap().is_empty());
    assert!(!store.list::<Enrollment>(&admin, &Filter::default()).unwrap().is_empty());
}

#[test]
fn test_anonymous_reads_catalog_only() {
    let Fixture { store, .. } = fixture();
    assert_eq!(store.list::<Course>(&Caller::Anonymous, &Filter::default()).unwrap().len(), 1);
    let err = store.list::<Enrollment>(&Caller::Anonymous, &Filter::default()).unwrap_err();
    assert!(matches!(err, CampusError::AuthFailed(_)));
}

#[test]
fn test_instructor_reads_academic_records_but_cannot_delete() {
    let Fixture { store, instructor, enrollment, .. } = fixture();
    assert!(store.get::<Enrollment>(&instructor, enrollment).is_ok());
    assert!(store.list::<Payment>(&instructor, &Filter::default()).unwrap().is_empty());
    assert_eq!(
        store.delete::<Enrollment>(&instructor, enrollment).unwrap_err(),
        CampusError::PermissionDenied
    );
}

#[test]
fn test_background_check_approval_verifies_account_once() {
    let Fixture { store, admin, student, .. } = fixture();
    let check = store.create::<BackgroundCheck>(&student, check_input()).unwrap();
    assert_eq!(Some(check.user), student.account());
    assert_eq!(check.status, CheckStatus::Pending);

    let first = store.transition::<BackgroundCheck>(&admin, check.id, Transition::Approve).unwrap();
    assert!(first.changed);
    assert_eq!(first.record.status, CheckStatus::Passed);
    assert!(store.me(&student).unwrap().is_verified);

    let second = store.transition::<BackgroundCheck>(&admin, check.id, Transition::Approve).unwrap();
    assert!(!second.changed);
    assert!(store.me(&student).unwrap().is_verified);

    let err = store
        .transition::<BackgroundCheck>(&admin, check.id, Transition::Reject)
        .unwrap_err();
    assert!(matches!(err, CampusError::InvalidTransition { .. }));
}

#[test]
fn test_student_cannot_approve_own_check() {
    let Fixture { store, student, .. } = fixture();
    let check = store.create::<BackgroundCheck>(&student, check_input()).unwrap();
    assert_eq!(
        store
            .transition::<BackgroundCheck>(&student, check.id, Transition::Approve)
            .unwrap_err(),
        CampusError::PermissionDenied
    );
}

#[test]
fn test_employer_rejection_is_what_student_sees() {
    let Fixture { store, student, employer, .. } = fixture();
    let posting = store.create::<JobPosting>(&employer, posting_input("Welder")).unwrap();
    assert_eq!(Some(posting.employer), employer.employer());

    let application = store
        .apply(&student, posting.id, ApplyInput { cover_letter: Some("Hire me".into()) })
        .unwrap();
    assert_eq!(application.status, ApplicationStatus::Applied);

    let rejected = store
        .transition::<JobApplication>(&employer, application.id, Transition::Reject)
        .unwrap();
    assert_eq!(rejected.record.status, ApplicationStatus::Rejected);

    let seen = store.get::<JobApplication>(&student, application.id).unwrap();
    assert_eq!(seen.status, ApplicationStatus::Rejected);

    let again = store.apply(&student, posting.id, ApplyInput::default()).unwrap_err();
    assert!(matches!(again, CampusError::Conflict(_)));
}

#[test]
fn test_other_employer_cannot_touch_application() {
    let Fixture { store, student, employer, .. } = fixture();
    let rival = join(&store, "rival@campus.test", Role::Employer);
    let posting = store.create::<JobPosting>(&employer, posting_input("Fitter")).unwrap();
    let application = store.apply(&student, posting.id, ApplyInput::default()).unwrap();

    assert!(store.list::<JobApplication>(&rival, &Filter::default()).unwrap().is_empty());
    assert_eq!(
        store
            .transition::<JobApplication>(&rival, application.id, Transition::Approve)
            .unwrap_err(),
        CampusError::NotFound
    );
}

#[test]
fn test_employer_posting_forced_to_own_profile() {
    let Fixture { store, employer, .. } = fixture();
    let rival = join(&store, "rival@campus.test", Role::Employer);
    let mut input = posting_input("Painter");
    input.employer = rival.employer();
    let posting = store.create::<JobPosting>(&employer, input).unwrap();
    assert_eq!(Some(posting.employer), employer.employer());
}

#[test]
fn test_complete_enrollment_sets_completion_date() {
    let Fixture { store, instructor, enrollment, .. } = fixture();
    let done = store
        .transition::<Enrollment>(&instructor, enrollment, Transition::Complete)
        .unwrap();
    assert_eq!(done.record.status, EnrollmentStatus::Completed);
    assert!(done.record.actual_completion.is_some());
}

#[test]
fn test_account_delete_cascades_to_profile_records() {
    let Fixture { store, admin, student, enrollment, .. } = fixture();
    let account = student.account().unwrap();
    store.delete::<Account>(&admin, account.0).unwrap();

    assert_eq!(store.get::<Enrollment>(&admin, enrollment).unwrap_err(), CampusError::NotFound);
    assert_eq!(store.list::<StudentProfile>(&admin, &Filter::default()).unwrap().len(), 1);
    assert!(matches!(store.caller(account).unwrap_err(), CampusError::AuthFailed(_)));
}

#[test]
fn test_category_with_courses_cannot_be_deleted() {
    let Fixture { store, admin, course, .. } = fixture();
    let category = store.get::<Course>(&admin, course).unwrap().category;
    let err = store.delete::<CourseCategory>(&admin, category).unwrap_err();
    assert!(matches!(err, CampusError::Conflict(_)));

    store.delete::<Course>(&admin, course).unwrap();
    store.delete::<CourseCategory>(&admin, category).unwrap();
    assert!(store.list::<Enrollment>(&admin, &Filter::default()).unwrap().is_empty());
}

#[test]
fn test_reports_follow_scope() {
    let Fixture { store, admin, student, other_student, course, .. } = fixture();
    let mine = store.dashboard_stats(&student).unwrap();
    assert_eq!(mine.active_enrollments, 1);
    let theirs = store.dashboard_stats(&other_student).unwrap();
    assert_eq!(theirs.active_enrollments, 0);
    assert_eq!(theirs.completion_rate, crate::reports::Percent::default());

    let stats = store.course_statistics(&admin, course).unwrap();
    assert_eq!(stats.total_enrollments, 1);
    assert_eq!(store.course_statistics(&other_student, course).unwrap().total_enrollments, 0);

    assert_eq!(store.financial_summary(&student).unwrap_err(), CampusError::PermissionDenied);
    assert_eq!(store.monthly_revenue(&admin, None).unwrap().len(), 12);
    assert!(matches!(
        store.monthly_revenue(&admin, Some(0)).unwrap_err(),
        CampusError::Validation(_)
    ));
}

#[test]
fn test_student_progress_requires_visibility() {
    let Fixture { store, student, other_student, .. } = fixture();
    let profile = student.student().unwrap();
    let progress = store.student_progress(&student, profile.0).unwrap();
    assert_eq!(progress.total_enrollments, 1);
    assert_eq!(
        store.student_progress(&other_student, profile.0).unwrap_err(),
        CampusError::NotFound
    );
}

#[test]
fn test_enrollment_at_calendar_edge_is_rejected() {
    let Fixture { store, admin, other_student, course, .. } = fixture();
    let input = EnrollmentInput {
        enrollment_date: Some(chrono::NaiveDate::MAX),
        ..enrollment_input(&other_student, course)
    };
    match store.create::<Enrollment>(&admin, input).unwrap_err() {
        CampusError::Validation(errors) => assert!(errors.get("enrollment_date").is_some()),
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(store.list::<Enrollment>(&admin, &Filter::default()).unwrap().len(), 1);
}

#[test]
fn test_oversized_amounts_fail_validation() {
    let Fixture { store, admin, student, .. } = fixture();
    let err = store
        .create::<Payment>(
            &admin,
            PaymentInput {
                student: student.student().unwrap(),
                enrollment: None,
                payment_type: None,
                method: None,
                amount: Decimal::MAX,
                status: None,
                transaction_id: None,
                payment_date: None,
                notes: None,
            },
        )
        .unwrap_err();
    assert!(matches!(err, CampusError::Validation(_)));
    assert!(store.list::<Payment>(&admin, &Filter::default()).unwrap().is_empty());
}

#[test]
fn test_report_window_bounds() {
    assert_eq!(super::reporting::window(None, 12), Ok(12));
    assert_eq!(super::reporting::window(Some(1), 12), Ok(1));
    assert_eq!(super::reporting::window(Some(60), 6), Ok(60));
    for months in [0, 61] {
        match super::reporting::window(Some(months), 12).unwrap_err() {
            CampusError::Validation(errors) => assert!(errors.get("months").is_some()),
            other => panic!("unexpected {:?}", other),
        }
    }

    let Fixture { store, admin, student, .. } = fixture();
    let profile = student.student().unwrap().0;
    assert_eq!(store.attendance_by_month(&admin, profile, None).unwrap().len(), 6);
    assert_eq!(store.monthly_revenue(&admin, Some(60)).unwrap().len(), 60);
    assert!(store.monthly_revenue(&admin, Some(61)).is_err());
    assert_eq!(store.monthly_revenue(&student, Some(0)).unwrap_err(), CampusError::PermissionDenied);
}

#[test]
fn test_full_course_frees_seat_when_enrollment_dropped() {
    let Fixture { store, admin, student, other_student, course: fixture_course, .. } = fixture();
    let category = store.get::<Course>(&admin, fixture_course).unwrap().category;
    let course = store
        .create::<Course>(
            &admin,
            CourseInput {
                code: "pipe201".into(),
                title: "Pipefitting".into(),
                description: String::new(),
                category,
                difficulty: None,
                duration_weeks: 4,
                total_hours: 40,
                max_students: Some(1),
                tuition_fee: dec!(800),
                status: None,
                instructors: vec![],
                prerequisites: None,
            },
        )
        .unwrap();

    let first = store
        .create::<Enrollment>(&admin, enrollment_input(&student, course.id))
        .unwrap();
    match store
        .create::<Enrollment>(&admin, enrollment_input(&other_student, course.id))
        .unwrap_err()
    {
        CampusError::Validation(errors) => assert!(errors.get("course").is_some()),
        other => panic!("unexpected {:?}", other),
    }

    let dropped = EnrollmentInput {
        status: Some(EnrollmentStatus::Dropped),
        ..enrollment_input(&student, course.id)
    };
    store.update::<Enrollment>(&admin, first.id, dropped).unwrap();
    let second = store
        .create::<Enrollment>(&admin, enrollment_input(&other_student, course.id))
        .unwrap();
    assert_eq!(second.status, EnrollmentStatus::Enrolled);
}

#[test]
fn test_rejecting_rejected_application_is_a_no_op() {
    let Fixture { store, student, employer, .. } = fixture();
    let posting = store.create::<JobPosting>(&employer, posting_input("Machinist")).unwrap();
    let application = store.apply(&student, posting.id, ApplyInput::default()).unwrap();

    let first = store
        .transition::<JobApplication>(&employer, application.id, Transition::Reject)
        .unwrap();
    assert!(first.changed);
    let reviewed_at = first.record.reviewed_at;

    let again = store
        .transition::<JobApplication>(&employer, application.id, Transition::Reject)
        .unwrap();
    assert!(!again.changed);
    assert_eq!(again.record.status, ApplicationStatus::Rejected);
    assert_eq!(again.record.reviewed_at, reviewed_at);

    let err = store
        .transition::<JobApplication>(&employer, application.id, Transition::Approve)
        .unwrap_err();
    assert!(matches!(err, CampusError::InvalidTransition { .. }));
}

#[test]
fn test_instructor_sees_only_own_competency_assessments() {
    let Fixture { store, admin, instructor, student, course, .. } = fixture();
    let colleague = join(&store, "colleague@campus.test", Role::Instructor);
    let input = || CompetencyAssessmentInput {
        student: student.student().unwrap(),
        course,
        assessment_type: None,
        score: dec!(82),
        passed: None,
        requires_retraining: None,
        notes: None,
        assessed_on: None,
    };
    let mine = store.create::<CompetencyAssessment>(&instructor, input()).unwrap();
    let theirs = store.create::<CompetencyAssessment>(&colleague, input()).unwrap();
    assert_eq!(mine.assessor, instructor.account());

    let visible = store
        .list::<CompetencyAssessment>(&instructor, &Filter::default())
        .unwrap();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible.as_slice()[0].id, mine.id);
    assert_eq!(
        store.get::<CompetencyAssessment>(&instructor, theirs.id).unwrap_err(),
        CampusError::NotFound
    );
    assert_eq!(store.list::<CompetencyAssessment>(&admin, &Filter::default()).unwrap().len(), 2);
    assert_eq!(store.list::<CompetencyAssessment>(&student, &Filter::default()).unwrap().len(), 2);
}

fn placement(store: &Store, admin: &Caller, student: &Caller, employer: &Caller) -> Placement {
    store
        .create::<Placement>(
            admin,
            PlacementInput {
                student: student.student().unwrap(),
                employer: employer.employer().unwrap(),
                job_title: "Welder".into(),
                salary: dec!(36000),
                placement_fee: dec!(1200),
                start_date: None,
                end_date: None,
                status: None,
                notes: None,
            },
        )
        .unwrap()
}

fn feedback_input(placement: Uuid) -> EmployerFeedbackInput {
    EmployerFeedbackInput {
        placement,
        overall_rating: 4,
        punctuality_rating: 5,
        quality_rating: 4,
        communication_rating: 3,
        reliability_rating: 5,
        strengths: "Careful, tidy welds".into(),
        areas_for_improvement: String::new(),
        would_rehire: true,
        additional_comments: None,
    }
}

#[test]
fn test_employer_feedback_is_scoped_to_placement_parties() {
    let Fixture { store, admin, student, other_student, employer, .. } = fixture();
    let rival = join(&store, "rival@campus.test", Role::Employer);
    let placed = placement(&store, &admin, &student, &employer);

    let err = store
        .create::<EmployerFeedback>(&rival, feedback_input(placed.id))
        .unwrap_err();
    assert!(matches!(err, CampusError::Validation(_)));

    let mut low = feedback_input(placed.id);
    low.overall_rating = 0;
    assert!(matches!(
        store.create::<EmployerFeedback>(&employer, low).unwrap_err(),
        CampusError::Validation(_)
    ));

    let feedback = store.create::<EmployerFeedback>(&employer, feedback_input(placed.id)).unwrap();
    assert_eq!(Some(feedback.student), student.student());
    assert_eq!(feedback.submitted_by, employer.account());
    assert!(matches!(
        store.create::<EmployerFeedback>(&admin, feedback_input(placed.id)).unwrap_err(),
        CampusError::Conflict(_)
    ));

    assert_eq!(store.list::<EmployerFeedback>(&student, &Filter::default()).unwrap().len(), 1);
    assert!(store.list::<EmployerFeedback>(&other_student, &Filter::default()).unwrap().is_empty());
    assert!(store.list::<EmployerFeedback>(&rival, &Filter::default()).unwrap().is_empty());
    assert_eq!(
        store.create::<EmployerFeedback>(&student, feedback_input(placed.id)).unwrap_err(),
        CampusError::PermissionDenied
    );

    store.delete::<Placement>(&admin, placed.id).unwrap();
    assert!(store.list::<EmployerFeedback>(&admin, &Filter::default()).unwrap().is_empty());
}

#[test]
fn test_progress_report_fills_figures_from_records() {
    let Fixture { store, admin, instructor, student, other_student, employer, enrollment, .. } = fixture();
    for (day, present) in [(2, true), (3, false)] {
        store
            .create::<Attendance>(
                &instructor,
                AttendanceInput {
                    enrollment,
                    date: NaiveDate::from_ymd_opt(2026, 3, day),
                    hours: None,
                    present: Some(present),
                    notes: None,
                },
            )
            .unwrap();
    }
    let input = || ProgressReportInput {
        enrollment,
        report_date: None,
        overall_progress: 40,
        attendance_rate: None,
        average_score: None,
        strengths: "Steady hands".into(),
        areas_for_improvement: String::new(),
        recommendations: String::new(),
    };

    let mut over = input();
    over.overall_progress = 101;
    assert!(matches!(
        store.create::<ProgressReport>(&instructor, over).unwrap_err(),
        CampusError::Validation(_)
    ));

    let report = store.create::<ProgressReport>(&instructor, input()).unwrap();
    assert_eq!(report.attendance_rate, dec!(50));
    assert_eq!(report.average_score, Decimal::ZERO);
    assert_eq!(report.created_by, instructor.account());

    let mut moved = input();
    moved.enrollment = Uuid::new_v4();
    assert!(matches!(
        store.update::<ProgressReport>(&instructor, report.id, moved).unwrap_err(),
        CampusError::Validation(_)
    ));
    assert_eq!(
        store.create::<ProgressReport>(&student, input()).unwrap_err(),
        CampusError::PermissionDenied
    );

    assert_eq!(store.list::<ProgressReport>(&student, &Filter::default()).unwrap().len(), 1);
    assert!(store.list::<ProgressReport>(&other_student, &Filter::default()).unwrap().is_empty());
    assert!(store.list::<ProgressReport>(&employer, &Filter::default()).unwrap().is_empty());

    store.delete::<Enrollment>(&admin, enrollment).unwrap();
    assert!(store.list::<ProgressReport>(&admin, &Filter::default()).unwrap().is_empty());
}

#[test]
fn test_tuition_fees_follow_their_course() {
    let Fixture { store, admin, student, course, .. } = fixture();
    let input = |expiry_date| TuitionFeeInput {
        course,
        amount: dec!(1650),
        effective_date: NaiveDate::from_ymd_opt(2026, 9, 1),
        expiry_date,
        is_active: None,
        description: "Autumn intake".into(),
    };
    let err = store
        .create::<TuitionFee>(&admin, input(NaiveDate::from_ymd_opt(2026, 8, 1)))
        .unwrap_err();
    assert!(matches!(err, CampusError::Validation(_)));

    let fee = store.create::<TuitionFee>(&admin, input(None)).unwrap();
    assert!(fee.is_active);
    assert_eq!(store.list::<TuitionFee>(&student, &Filter::default()).unwrap().len(), 1);
    assert_eq!(
        store.create::<TuitionFee>(&student, input(None)).unwrap_err(),
        CampusError::PermissionDenied
    );

    store.delete::<Course>(&admin, course).unwrap();
    assert!(store.list::<TuitionFee>(&admin, &Filter::default()).unwrap().is_empty());
}

#[test]
fn test_financial_report_totals_its_period() {
    let Fixture { store, admin, student, .. } = fixture();
    let pay = |day: u32, month: u32, amount| {
        store
            .create::<Payment>(
                &admin,
                PaymentInput {
                    student: student.student().unwrap(),
                    enrollment: None,
                    payment_type: None,
                    method: None,
                    amount,
                    status: Some(PaymentStatus::Completed),
                    transaction_id: None,
                    payment_date: NaiveDate::from_ymd_opt(2026, month, day),
                    notes: None,
                },
            )
            .unwrap()
    };
    pay(10, 3, dec!(1500));
    pay(10, 4, dec!(900));
    store
        .create::<Expense>(
            &admin,
            ExpenseInput {
                category: Some(ExpenseCategory::Rent),
                description: "Workshop".into(),
                amount: dec!(400),
                expense_date: NaiveDate::from_ymd_opt(2026, 3, 5),
                vendor: None,
                receipt_number: None,
                approved: false,
            },
        )
        .unwrap();

    let input = || FinancialReportInput {
        report_type: Some(ReportType::Monthly),
        title: "March".into(),
        period_start: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
        period_end: NaiveDate::from_ymd_opt(2026, 3, 31).unwrap(),
    };
    let report = store.create::<FinancialReport>(&admin, input()).unwrap();
    assert_eq!(report.total_revenue, dec!(1500));
    assert_eq!(report.total_expenses, dec!(400));
    assert_eq!(report.net_profit, dec!(1100));
    assert_eq!(report.profit_margin.rounded(), dec!(73.33));
    assert_eq!(report.report_data.completed_payments, 1);
    assert_eq!(report.report_data.expenses_by_category.get("rent"), Some(&dec!(400)));
    assert_eq!(report.generated_by, admin.account());

    let mut spring = input();
    spring.period_end = NaiveDate::from_ymd_opt(2026, 4, 30).unwrap();
    let regenerated = store.update::<FinancialReport>(&admin, report.id, spring).unwrap();
    assert_eq!(regenerated.total_revenue, dec!(2400));

    let mut backwards = input();
    backwards.period_end = NaiveDate::from_ymd_opt(2026, 2, 1).unwrap();
    assert!(matches!(
        store.create::<FinancialReport>(&admin, backwards).unwrap_err(),
        CampusError::Validation(_)
    ));
    assert!(store.list::<FinancialReport>(&student, &Filter::default()).unwrap().is_empty());
    assert_eq!(
        store.create::<FinancialReport>(&student, input()).unwrap_err(),
        CampusError::PermissionDenied
    );
}
