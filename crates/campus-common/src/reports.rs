//! Aggregation reporters
//!
//! Counts, rates and sums over [`Scoped`] collections. Nothing here reads
//! the store directly, so a report can only ever cover records its caller
//! was allowed to list.

use chrono::{Datelike, NaiveDate};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Serialize, Serializer};
use std::collections::{HashMap, HashSet};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::*;
use crate::policy::Scoped;

/// Number of courses in the popularity ranking
pub const POPULAR_COURSES: usize = 10;

/// Default attendance window in months
pub const ATTENDANCE_MONTHS: u32 = 6;

/// Default revenue window in months
pub const REVENUE_MONTHS: u32 = 12;

/// Largest accepted month window
pub const MAX_MONTHS: u32 = 60;

/// A percentage kept at full precision; rounded to two places on output
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Percent(pub Decimal);

impl Percent {
    /// `part / whole * 100`; zero when `whole` is zero
    pub fn of(part: Decimal, whole: Decimal) -> Self {
        if whole.is_zero() {
            Percent(Decimal::ZERO)
        } else {
            let scaled = part.checked_div(whole).and_then(|q| q.checked_mul(dec!(100)));
            Percent(scaled.unwrap_or(if part.is_sign_negative() != whole.is_sign_negative() {
                Decimal::MIN
            } else {
                Decimal::MAX
            }))
        }
    }

    pub fn ratio(part: usize, whole: usize) -> Self {
        Self::of(Decimal::from(part), Decimal::from(whole))
    }

    pub fn rounded(&self) -> Decimal {
        self.0.round_dp(2)
    }
}

impl Serialize for Percent {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.rounded().to_f64().unwrap_or(0.0))
    }
}

/// Saturating sum; stored amounts are bounded so this only clamps in theory
pub(crate) fn total(values: impl IntoIterator<Item = Decimal>) -> Decimal {
    values.into_iter().fold(Decimal::ZERO, Decimal::saturating_add)
}

fn mean(values: impl IntoIterator<Item = Decimal>) -> Percent {
    let (sum, count) = values
        .into_iter()
        .fold((Decimal::ZERO, 0usize), |(sum, n), v| (sum.saturating_add(v), n + 1));
    if count == 0 {
        Percent(Decimal::ZERO)
    } else {
        Percent(sum / Decimal::from(count))
    }
}

/// Calendar month, oldest first when produced by [`month_window`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Month {
    pub year: i32,
    pub month: u32,
}

impl Month {
    pub fn of(date: NaiveDate) -> Self {
        Month { year: date.year(), month: date.month() }
    }

    fn previous(self) -> Self {
        if self.month == 1 {
            Month { year: self.year - 1, month: 12 }
        } else {
            Month { year: self.year, month: self.month - 1 }
        }
    }

    pub fn label(&self) -> String {
        format!("{:04}-{:02}", self.year, self.month)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        Month::of(date) == *self
    }
}

/// The `count` contiguous months ending with the month of `today`
pub fn month_window(today: NaiveDate, count: u32) -> Vec<Month> {
    let mut months = Vec::with_capacity(count as usize);
    let mut current = Month::of(today);
    for _ in 0..count {
        months.push(current);
        current = current.previous();
    }
    months.reverse();
    months
}

// ============ Courses ============

/// Per-course enrollment and grading figures
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CourseStatistics {
    pub course: Uuid,
    pub code: String,
    pub title: String,
    pub total_enrollments: usize,
    pub active_enrollments: usize,
    pub completed_enrollments: usize,
    #[schema(value_type = f64)]
    pub completion_rate: Percent,
    #[schema(value_type = f64)]
    pub average_score: Percent,
    pub module_count: usize,
    pub assessment_count: usize,
    pub instructor_count: usize,
}

pub fn course_statistics(
    course: &Course,
    enrollments: &Scoped<Enrollment>,
    results: &Scoped<AssessmentResult>,
    modules: &Scoped<CourseModule>,
    assessments: &Scoped<Assessment>,
) -> CourseStatistics {
    let in_course: Vec<&Enrollment> = enrollments.iter().filter(|e| e.course == course.id).collect();
    let enrollment_ids: HashSet<Uuid> = in_course.iter().map(|e| e.id).collect();
    let completed = in_course
        .iter()
        .filter(|e| e.status == EnrollmentStatus::Completed)
        .count();

    CourseStatistics {
        course: course.id,
        code: course.code.clone(),
        title: course.title.clone(),
        total_enrollments: in_course.len(),
        active_enrollments: in_course.iter().filter(|e| e.status.is_active()).count(),
        completed_enrollments: completed,
        completion_rate: Percent::ratio(completed, in_course.len()),
        average_score: mean(
            results
                .iter()
                .filter(|r| enrollment_ids.contains(&r.enrollment))
                .map(|r| r.percentage()),
        ),
        module_count: modules.iter().filter(|m| m.course == course.id).count(),
        assessment_count: assessments.iter().filter(|a| a.course == course.id).count(),
        instructor_count: course.instructors.len(),
    }
}

/// One entry of the popularity ranking
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PopularCourse {
    pub course: Uuid,
    pub code: String,
    pub title: String,
    pub enrollment_count: usize,
}

/// Top courses by enrollment count; ties go to the course code
pub fn popular_courses(courses: &Scoped<Course>, enrollments: &Scoped<Enrollment>) -> Vec<PopularCourse> {
    let mut counts: HashMap<Uuid, usize> = HashMap::new();
    for enrollment in enrollments {
        *counts.entry(enrollment.course).or_default() += 1;
    }

    let mut ranking: Vec<PopularCourse> = courses
        .iter()
        .map(|c| PopularCourse {
            course: c.id,
            code: c.code.clone(),
            title: c.title.clone(),
            enrollment_count: counts.get(&c.id).copied().unwrap_or(0),
        })
        .collect();
    ranking.sort_by(|a, b| {
        b.enrollment_count
            .cmp(&a.enrollment_count)
            .then_with(|| a.code.cmp(&b.code))
    });
    ranking.truncate(POPULAR_COURSES);
    ranking
}

// ============ Students ============

/// Progress of one student across their enrollments
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StudentProgress {
    #[schema(value_type = Uuid)]
    pub student: StudentId,
    pub student_number: String,
    pub total_enrollments: usize,
    pub active_enrollments: usize,
    pub completed_enrollments: usize,
    pub certificates_earned: usize,
    #[schema(value_type = f64)]
    pub average_score: Percent,
    #[schema(value_type = f64)]
    pub attendance_rate: Percent,
}

pub fn student_progress(
    student: &StudentProfile,
    enrollments: &Scoped<Enrollment>,
    certificates: &Scoped<Certificate>,
    attendance: &Scoped<Attendance>,
    results: &Scoped<AssessmentResult>,
) -> StudentProgress {
    let own: Vec<&Enrollment> = enrollments.iter().filter(|e| e.student == student.id).collect();
    let ids: HashSet<Uuid> = own.iter().map(|e| e.id).collect();
    let sessions: Vec<&Attendance> = attendance.iter().filter(|a| ids.contains(&a.enrollment)).collect();
    let present = sessions.iter().filter(|a| a.present).count();

    StudentProgress {
        student: student.id,
        student_number: student.student_id.clone(),
        total_enrollments: own.len(),
        active_enrollments: own.iter().filter(|e| e.status.is_active()).count(),
        completed_enrollments: own
            .iter()
            .filter(|e| e.status == EnrollmentStatus::Completed)
            .count(),
        certificates_earned: certificates
            .iter()
            .filter(|c| c.student == student.id && c.status != CertificateStatus::Revoked)
            .count(),
        average_score: mean(
            results
                .iter()
                .filter(|r| ids.contains(&r.enrollment))
                .map(|r| r.percentage()),
        ),
        attendance_rate: Percent::ratio(present, sessions.len()),
    }
}

/// Attendance totals for one calendar month
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AttendanceMonth {
    pub month: String,
    pub sessions: usize,
    pub present: usize,
    #[schema(value_type = String)]
    pub hours: Decimal,
    #[schema(value_type = f64)]
    pub attendance_rate: Percent,
}

/// Monthly attendance over `months` contiguous months, zero-filled
pub fn attendance_by_month(attendance: &Scoped<Attendance>, today: NaiveDate, months: u32) -> Vec<AttendanceMonth> {
    month_window(today, months)
        .into_iter()
        .map(|month| {
            let rows: Vec<&Attendance> = attendance.iter().filter(|a| month.contains(a.date)).collect();
            let present = rows.iter().filter(|a| a.present).count();
            AttendanceMonth {
                month: month.label(),
                sessions: rows.len(),
                present,
                hours: total(rows.iter().map(|a| a.hours)),
                attendance_rate: Percent::ratio(present, rows.len()),
            }
        })
        .collect()
}

// ============ Financials ============

/// School-wide money figures
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct FinancialSummary {
    #[schema(value_type = String)]
    pub total_revenue: Decimal,
    #[schema(value_type = String)]
    pub pending_payments: Decimal,
    #[schema(value_type = String)]
    pub placement_fees_collected: Decimal,
    #[schema(value_type = String)]
    pub total_expenses: Decimal,
    #[schema(value_type = String)]
    pub total_payroll: Decimal,
    #[schema(value_type = String)]
    pub net_profit: Decimal,
    pub overdue_invoices: usize,
    #[schema(value_type = String)]
    pub overdue_amount: Decimal,
    #[schema(value_type = f64)]
    pub profit_margin: Percent,
}

fn completed_revenue(payments: &Scoped<Payment>) -> impl Iterator<Item = &Payment> {
    payments.iter().filter(|p| p.status == PaymentStatus::Completed)
}

pub fn financial_summary(
    payments: &Scoped<Payment>,
    fees: &Scoped<PlacementFee>,
    expenses: &Scoped<Expense>,
    payroll: &Scoped<Payroll>,
    invoices: &Scoped<Invoice>,
    today: NaiveDate,
) -> FinancialSummary {
    let tuition = total(completed_revenue(payments).map(|p| p.amount));
    let fees_paid = total(
        fees.iter()
            .filter(|f| f.status == FeeStatus::Paid)
            .map(|f| f.amount),
    );
    let pending = total(
        payments
            .iter()
            .filter(|p| p.status == PaymentStatus::Pending)
            .map(|p| p.amount),
    );
    let total_expenses = total(expenses.iter().map(|e| e.amount));
    let total_payroll = total(
        payroll
            .iter()
            .filter(|p| p.status == PayrollStatus::Paid)
            .map(|p| p.amount),
    );
    let overdue: Vec<&Invoice> = invoices.iter().filter(|i| i.is_overdue(today)).collect();

    let revenue = tuition.saturating_add(fees_paid);
    let net = revenue
        .saturating_sub(total_expenses)
        .saturating_sub(total_payroll);
    FinancialSummary {
        total_revenue: revenue,
        pending_payments: pending,
        placement_fees_collected: fees_paid,
        total_expenses,
        total_payroll,
        net_profit: net,
        overdue_invoices: overdue.len(),
        overdue_amount: total(overdue.iter().map(|i| i.total_amount)),
        profit_margin: Percent::of(net, revenue),
    }
}

/// Revenue and spend for one calendar month
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MonthlyRevenue {
    pub month: String,
    #[schema(value_type = String)]
    pub revenue: Decimal,
    #[schema(value_type = String)]
    pub expenses: Decimal,
    #[schema(value_type = String)]
    pub net: Decimal,
}

/// Completed payments and expenses per month over the window, zero-filled
pub fn monthly_revenue(
    payments: &Scoped<Payment>,
    expenses: &Scoped<Expense>,
    today: NaiveDate,
    months: u32,
) -> Vec<MonthlyRevenue> {
    month_window(today, months)
        .into_iter()
        .map(|month| {
            let revenue = total(
                completed_revenue(payments)
                    .filter(|p| month.contains(p.payment_date))
                    .map(|p| p.amount),
            );
            let spent = total(
                expenses
                    .iter()
                    .filter(|e| month.contains(e.expense_date))
                    .map(|e| e.amount),
            );
            MonthlyRevenue {
                month: month.label(),
                revenue,
                expenses: spent,
                net: revenue.saturating_sub(spent),
            }
        })
        .collect()
}

// ============ Dashboard ============

/// Headline counts over everything the caller can see
#[derive(Debug, Clone, Default, Serialize, ToSchema)]
pub struct DashboardStats {
    pub students: usize,
    pub courses: usize,
    pub active_courses: usize,
    pub active_enrollments: usize,
    pub completed_enrollments: usize,
    pub employers: usize,
    pub active_job_postings: usize,
    pub open_applications: usize,
    pub certificates_issued: usize,
    pub placements: usize,
    pub enrollments_this_month: usize,
    pub certificates_this_month: usize,
    #[schema(value_type = String)]
    pub revenue_this_month: Decimal,
    #[schema(value_type = f64)]
    pub completion_rate: Percent,
}

/// Scoped inputs for [`dashboard_stats`]
pub struct DashboardInputs {
    pub students: Scoped<StudentProfile>,
    pub courses: Scoped<Course>,
    pub enrollments: Scoped<Enrollment>,
    pub employers: Scoped<EmployerProfile>,
    pub postings: Scoped<JobPosting>,
    pub applications: Scoped<JobApplication>,
    pub certificates: Scoped<Certificate>,
    pub placements: Scoped<Placement>,
    pub payments: Scoped<Payment>,
}

pub fn dashboard_stats(inputs: &DashboardInputs, today: NaiveDate) -> DashboardStats {
    let this_month = Month::of(today);
    let completed = inputs
        .enrollments
        .iter()
        .filter(|e| e.status == EnrollmentStatus::Completed)
        .count();

    DashboardStats {
        students: inputs.students.len(),
        courses: inputs.courses.len(),
        active_courses: inputs
            .courses
            .iter()
            .filter(|c| c.status == CourseStatus::Active)
            .count(),
        active_enrollments: inputs.enrollments.iter().filter(|e| e.status.is_active()).count(),
        completed_enrollments: completed,
        employers: inputs.employers.len(),
        active_job_postings: inputs
            .postings
            .iter()
            .filter(|p| p.status == PostingStatus::Active)
            .count(),
        open_applications: inputs
            .applications
            .iter()
            .filter(|a| !a.status.is_terminal())
            .count(),
        certificates_issued: inputs
            .certificates
            .iter()
            .filter(|c| c.status != CertificateStatus::Revoked)
            .count(),
        placements: inputs.placements.len(),
        enrollments_this_month: inputs
            .enrollments
            .iter()
            .filter(|e| this_month.contains(e.enrollment_date))
            .count(),
        certificates_this_month: inputs
            .certificates
            .iter()
            .filter(|c| this_month.contains(c.issue_date))
            .count(),
        revenue_this_month: total(
            completed_revenue(&inputs.payments)
                .filter(|p| this_month.contains(p.payment_date))
                .map(|p| p.amount),
        ),
        completion_rate: Percent::ratio(completed, inputs.enrollments.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn enrollment(course: Uuid, status: EnrollmentStatus) -> Enrollment {
        Enrollment {
            id: Uuid::new_v4(),
            student: StudentId::new(),
            course,
            status,
            enrollment_date: date(2026, 3, 1),
            expected_completion: date(2026, 6, 1),
            actual_completion: None,
            final_grade: None,
            notes: None,
            created_at: Utc::now(),
        }
    }

    fn attendance(day: NaiveDate, present: bool) -> Attendance {
        Attendance {
            id: Uuid::new_v4(),
            enrollment: Uuid::new_v4(),
            date: day,
            hours: dec!(3),
            present,
            notes: None,
            recorded_by: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_percent_zero_denominator_is_zero() {
        assert_eq!(Percent::ratio(5, 0), Percent(Decimal::ZERO));
        assert_eq!(Percent::of(dec!(-10), Decimal::ZERO).rounded(), Decimal::ZERO);
    }

    #[test]
    fn test_percent_serializes_rounded() {
        let third = Percent::ratio(1, 3);
        assert_eq!(serde_json::to_string(&third).unwrap(), "33.33");
        assert_eq!(third.0.round_dp(6), dec!(33.333333));
    }

    #[test]
    fn test_month_window_crosses_year() {
        let months: Vec<String> = month_window(date(2026, 2, 14), 4).iter().map(Month::label).collect();
        assert_eq!(months, vec!["2025-11", "2025-12", "2026-01", "2026-02"]);
    }

    #[test]
    fn test_empty_scope_rates_are_zero() {
        let stats = dashboard_stats(
            &DashboardInputs {
                students: Scoped::new(vec![]),
                courses: Scoped::new(vec![]),
                enrollments: Scoped::new(vec![]),
                employers: Scoped::new(vec![]),
                postings: Scoped::new(vec![]),
                applications: Scoped::new(vec![]),
                certificates: Scoped::new(vec![]),
                placements: Scoped::new(vec![]),
                payments: Scoped::new(vec![]),
            },
            date(2026, 5, 1),
        );
        assert_eq!(stats.completion_rate, Percent::default());
        assert_eq!(stats.revenue_this_month, Decimal::ZERO);

        let summary = financial_summary(
            &Scoped::new(vec![]),
            &Scoped::new(vec![]),
            &Scoped::new(vec![]),
            &Scoped::new(vec![]),
            &Scoped::new(vec![]),
            date(2026, 5, 1),
        );
        assert_eq!(summary.profit_margin, Percent::default());
    }

    #[test]
    fn test_money_sums_saturate() {
        assert_eq!(total([dec!(1.50), dec!(2.25)]), dec!(3.75));
        assert_eq!(total([Decimal::MAX, Decimal::MAX]), Decimal::MAX);
        assert_eq!(mean([Decimal::MAX, Decimal::MAX]), Percent(Decimal::MAX / Decimal::from(2)));
        assert_eq!(Percent::of(Decimal::MAX, dec!(0.5)), Percent(Decimal::MAX));
        assert_eq!(Percent::of(Decimal::MIN, dec!(0.5)), Percent(Decimal::MIN));
    }

    #[test]
    fn test_attendance_by_month_zero_fills() {
        let rows = Scoped::new(vec![
            attendance(date(2026, 4, 2), true),
            attendance(date(2026, 4, 3), false),
            attendance(date(2026, 1, 9), true),
        ]);
        let report = attendance_by_month(&rows, date(2026, 4, 20), 6);
        assert_eq!(report.len(), 6);
        assert_eq!(report[0].month, "2025-11");
        assert_eq!(report[0].sessions, 0);
        assert_eq!(report[0].attendance_rate, Percent::default());
        assert_eq!(report[2].sessions, 1);
        let april = &report[5];
        assert_eq!(april.sessions, 2);
        assert_eq!(april.hours, dec!(6));
        assert_eq!(april.attendance_rate, Percent(dec!(50)));
    }

    #[test]
    fn test_popular_courses_ranks_by_enrollments() {
        let course = |code: &str| Course {
            id: Uuid::new_v4(),
            code: code.to_string(),
            title: code.to_string(),
            description: String::new(),
            category: Uuid::new_v4(),
            difficulty: Difficulty::default(),
            duration_weeks: 4,
            total_hours: 40,
            max_students: 20,
            tuition_fee: dec!(100),
            status: CourseStatus::Active,
            instructors: vec![],
            prerequisites: None,
            created_by: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let weld = course("WELD101");
        let elec = course("ELEC101");
        let enrollments = Scoped::new(vec![
            enrollment(elec.id, EnrollmentStatus::Enrolled),
            enrollment(elec.id, EnrollmentStatus::Completed),
            enrollment(weld.id, EnrollmentStatus::Enrolled),
        ]);
        let ranking = popular_courses(&Scoped::new(vec![weld.clone(), elec.clone()]), &enrollments);
        assert_eq!(ranking[0].code, "ELEC101");
        assert_eq!(ranking[0].enrollment_count, 2);
        assert_eq!(ranking[1].enrollment_count, 1);

        let stats = course_statistics(
            &elec,
            &enrollments,
            &Scoped::new(vec![]),
            &Scoped::new(vec![]),
            &Scoped::new(vec![]),
        );
        assert_eq!(stats.total_enrollments, 2);
        assert_eq!(stats.completion_rate, Percent(dec!(50)));
        assert_eq!(stats.average_score, Percent::default());
    }
}
