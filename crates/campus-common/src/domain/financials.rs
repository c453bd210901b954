//! Financial records: tuition fees, payments, placement fees, payroll,
//! expenses, invoices, generated reports

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use super::courses::Course;
use super::employers::EmployerProfile;
use super::students::{Placement, StudentProfile};
use super::value_objects::{
    check_money, invoice_number, is_valid_email, AccountId, EmployerId, StudentId,
};
use crate::error::{CampusError, CampusResult, FieldErrors};
use crate::identity::Role;
use crate::policy::{EntityKind, Owner, Transition};
use crate::reports::{total, Percent};
use crate::store::filter::{id_matches, opt_id_matches};
use crate::store::{
    ensure_unique, exists, Filter, Record, Resource, Stateful, Table, Tables, WriteContext,
};

/// Price of a course from an effective date
#[derive(Debug, Clone, Serialize)]
pub struct TuitionFee {
    pub id: Uuid,
    pub course: Uuid,
    pub amount: Decimal,
    pub effective_date: NaiveDate,
    pub expiry_date: Option<NaiveDate>,
    pub is_active: bool,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TuitionFeeInput {
    pub course: Uuid,
    pub amount: Decimal,
    pub effective_date: Option<NaiveDate>,
    pub expiry_date: Option<NaiveDate>,
    pub is_active: Option<bool>,
    #[serde(default)]
    pub description: String,
}

impl TuitionFeeInput {
    fn validate(&self, effective: NaiveDate) -> CampusResult<()> {
        let mut errors = FieldErrors::new();
        check_money(&mut errors, "amount", self.amount);
        errors.check(
            self.expiry_date.map(|end| end < effective).unwrap_or(false),
            "expiry_date",
            "must not be before the effective date",
        );
        errors.into_result()
    }
}

impl Record for TuitionFee {
    const KIND: EntityKind = EntityKind::TuitionFee;

    fn id(&self) -> Uuid {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn table(db: &Tables) -> &Table<Self> {
        &db.tuition_fees
    }

    fn table_mut(db: &mut Tables) -> &mut Table<Self> {
        &mut db.tuition_fees
    }

    fn owner(&self, _db: &Tables) -> Owner {
        Owner::default()
    }

    fn matches(&self, filter: &Filter, _db: &Tables) -> bool {
        filter.text(&[&self.description])
            && filter.status_is(if self.is_active { "active" } else { "inactive" })
            && id_matches(filter.course, self.course)
    }

    fn check(&self, db: &Tables) -> CampusResult<()> {
        if !exists::<Course>(db, self.course) {
            return Err(CampusError::invalid("course", "course does not exist"));
        }
        Ok(())
    }

    fn ordering(a: &Self, b: &Self) -> std::cmp::Ordering {
        a.course.cmp(&b.course).then(b.effective_date.cmp(&a.effective_date))
    }
}

impl Resource for TuitionFee {
    type Input = TuitionFeeInput;

    fn create(input: TuitionFeeInput, ctx: &WriteContext<'_>) -> CampusResult<Self> {
        let effective_date = input.effective_date.unwrap_or_else(|| ctx.today());
        input.validate(effective_date)?;
        Ok(Self {
            id: Uuid::new_v4(),
            course: input.course,
            amount: input.amount,
            effective_date,
            expiry_date: input.expiry_date,
            is_active: input.is_active.unwrap_or(true),
            description: input.description,
            created_at: ctx.now,
        })
    }

    fn update(&mut self, input: TuitionFeeInput, _ctx: &WriteContext<'_>) -> CampusResult<()> {
        let effective_date = input.effective_date.unwrap_or(self.effective_date);
        input.validate(effective_date)?;
        self.course = input.course;
        self.amount = input.amount;
        self.effective_date = effective_date;
        self.expiry_date = input.expiry_date;
        if let Some(active) = input.is_active {
            self.is_active = active;
        }
        self.description = input.description;
        Ok(())
    }
}

labelled_enum! {
    pub enum PaymentType {
        Tuition => "tuition",
        Registration => "registration",
        Materials => "materials",
        Certification => "certification",
        Other => "other",
    }
    default = Tuition
}

labelled_enum! {
    pub enum PaymentMethod {
        Cash => "cash",
        Card => "card",
        BankTransfer => "bank_transfer",
        Check => "check",
        Online => "online",
    }
    default = Card
}

labelled_enum! {
    pub enum PaymentStatus {
        Pending => "pending",
        Completed => "completed",
        Failed => "failed",
        Refunded => "refunded",
    }
    default = Pending
}

#[derive(Debug, Clone, Serialize)]
pub struct Payment {
    pub id: Uuid,
    pub student: StudentId,
    pub enrollment: Option<Uuid>,
    pub payment_type: PaymentType,
    pub method: PaymentMethod,
    pub amount: Decimal,
    pub status: PaymentStatus,
    pub transaction_id: Option<String>,
    pub payment_date: NaiveDate,
    pub processed_by: Option<AccountId>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentInput {
    pub student: StudentId,
    pub enrollment: Option<Uuid>,
    pub payment_type: Option<PaymentType>,
    pub method: Option<PaymentMethod>,
    pub amount: Decimal,
    pub status: Option<PaymentStatus>,
    pub transaction_id: Option<String>,
    pub payment_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

impl Record for Payment {
    const KIND: EntityKind = EntityKind::Payment;

    fn id(&self) -> Uuid {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn table(db: &Tables) -> &Table<Self> {
        &db.payments
    }

    fn table_mut(db: &mut Tables) -> &mut Table<Self> {
        &mut db.payments
    }

    fn owner(&self, _db: &Tables) -> Owner {
        Owner::student(self.student)
    }

    fn matches(&self, filter: &Filter, _db: &Tables) -> bool {
        filter.text(&[self.transaction_id.as_deref().unwrap_or_default()])
            && filter.status_is(self.status.as_str())
            && filter.kind_is(self.payment_type.as_str())
            && id_matches(filter.student, self.student.0)
            && opt_id_matches(filter.enrollment, self.enrollment)
    }

    fn check(&self, db: &Tables) -> CampusResult<()> {
        let mut errors = FieldErrors::new();
        errors.check(!exists::<StudentProfile>(db, self.student.0), "student", "student does not exist");
        if let Some(enrollment) = self.enrollment {
            match db.enrollments.get(&enrollment) {
                None => errors.add("enrollment", "enrollment does not exist"),
                Some(e) if e.student != self.student => {
                    errors.add("enrollment", "enrollment belongs to a different student")
                }
                Some(_) => {}
            }
        }
        errors.into_result()
    }
}

impl Resource for Payment {
    type Input = PaymentInput;

    fn create(input: PaymentInput, ctx: &WriteContext<'_>) -> CampusResult<Self> {
        let mut errors = FieldErrors::new();
        check_money(&mut errors, "amount", input.amount);
        errors.into_result()?;
        Ok(Self {
            id: Uuid::new_v4(),
            student: input.student,
            enrollment: input.enrollment,
            payment_type: input.payment_type.unwrap_or_default(),
            method: input.method.unwrap_or_default(),
            amount: input.amount,
            status: input.status.unwrap_or_default(),
            transaction_id: input.transaction_id,
            payment_date: input.payment_date.unwrap_or_else(|| ctx.today()),
            processed_by: ctx.account(),
            notes: input.notes,
            created_at: ctx.now,
        })
    }

    fn update(&mut self, input: PaymentInput, ctx: &WriteContext<'_>) -> CampusResult<()> {
        let mut errors = FieldErrors::new();
        check_money(&mut errors, "amount", input.amount);
        errors.check(
            input.status == Some(PaymentStatus::Completed) && self.status != PaymentStatus::Completed,
            "status",
            "use the mark-paid action",
        );
        errors.into_result()?;

        self.student = input.student;
        self.enrollment = input.enrollment;
        if let Some(kind) = input.payment_type {
            self.payment_type = kind;
        }
        if let Some(method) = input.method {
            self.method = method;
        }
        self.amount = input.amount;
        if let Some(status) = input.status {
            self.status = status;
        }
        self.transaction_id = input.transaction_id;
        if let Some(date) = input.payment_date {
            self.payment_date = date;
        }
        self.processed_by = ctx.account();
        self.notes = input.notes;
        Ok(())
    }
}

impl Stateful for Payment {
    type Status = PaymentStatus;

    fn status(&self) -> PaymentStatus {
        self.status
    }

    fn target(transition: Transition) -> Option<PaymentStatus> {
        match transition {
            Transition::MarkPaid => Some(PaymentStatus::Completed),
            _ => None,
        }
    }

    fn can_leave(from: PaymentStatus) -> bool {
        matches!(from, PaymentStatus::Pending | PaymentStatus::Failed)
    }

    fn enter(&mut self, to: PaymentStatus, ctx: &WriteContext<'_>) {
        self.status = to;
        self.processed_by = ctx.account();
        self.payment_date = ctx.today();
    }
}

labelled_enum! {
    pub enum FeeStatus {
        Pending => "pending",
        Paid => "paid",
        Overdue => "overdue",
        Waived => "waived",
    }
    default = Pending
}

#[derive(Debug, Clone, Serialize)]
pub struct PlacementFee {
    pub id: Uuid,
    pub employer: EmployerId,
    pub student: StudentId,
    pub placement: Option<Uuid>,
    pub amount: Decimal,
    pub due_date: NaiveDate,
    pub paid_date: Option<NaiveDate>,
    pub status: FeeStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlacementFeeInput {
    pub employer: EmployerId,
    pub student: StudentId,
    pub placement: Option<Uuid>,
    pub amount: Decimal,
    pub due_date: NaiveDate,
    pub paid_date: Option<NaiveDate>,
    pub status: Option<FeeStatus>,
    pub notes: Option<String>,
}

impl PlacementFeeInput {
    fn paid_date(&self, status: FeeStatus, today: NaiveDate) -> CampusResult<Option<NaiveDate>> {
        let mut errors = FieldErrors::new();
        check_money(&mut errors, "amount", self.amount);
        errors.into_result()?;
        Ok(match status {
            FeeStatus::Paid => Some(self.paid_date.unwrap_or(today)),
            _ => self.paid_date,
        })
    }
}

impl Record for PlacementFee {
    const KIND: EntityKind = EntityKind::PlacementFee;

    fn id(&self) -> Uuid {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn table(db: &Tables) -> &Table<Self> {
        &db.placement_fees
    }

    fn table_mut(db: &mut Tables) -> &mut Table<Self> {
        &mut db.placement_fees
    }

    fn owner(&self, _db: &Tables) -> Owner {
        Owner {
            student: Some(self.student),
            ..Owner::employer(self.employer)
        }
    }

    fn matches(&self, filter: &Filter, _db: &Tables) -> bool {
        filter.status_is(self.status.as_str())
            && id_matches(filter.employer, self.employer.0)
            && id_matches(filter.student, self.student.0)
    }

    fn check(&self, db: &Tables) -> CampusResult<()> {
        let mut errors = FieldErrors::new();
        errors.check(!exists::<EmployerProfile>(db, self.employer.0), "employer", "employer does not exist");
        errors.check(!exists::<StudentProfile>(db, self.student.0), "student", "student does not exist");
        if let Some(placement) = self.placement {
            errors.check(!exists::<Placement>(db, placement), "placement", "placement does not exist");
        }
        errors.into_result()
    }
}

impl Resource for PlacementFee {
    type Input = PlacementFeeInput;

    fn create(input: PlacementFeeInput, ctx: &WriteContext<'_>) -> CampusResult<Self> {
        let status = input.status.unwrap_or_default();
        let paid_date = input.paid_date(status, ctx.today())?;
        Ok(Self {
            id: Uuid::new_v4(),
            employer: input.employer,
            student: input.student,
            placement: input.placement,
            amount: input.amount,
            due_date: input.due_date,
            paid_date,
            status,
            notes: input.notes,
            created_at: ctx.now,
        })
    }

    fn update(&mut self, input: PlacementFeeInput, ctx: &WriteContext<'_>) -> CampusResult<()> {
        let status = input.status.unwrap_or(self.status);
        self.paid_date = input.paid_date(status, ctx.today())?;
        self.employer = input.employer;
        self.student = input.student;
        self.placement = input.placement;
        self.amount = input.amount;
        self.due_date = input.due_date;
        self.status = status;
        self.notes = input.notes;
        Ok(())
    }
}

labelled_enum! {
    pub enum PayrollType {
        Salary => "salary",
        Hourly => "hourly",
        Bonus => "bonus",
        Commission => "commission",
    }
    default = Salary
}

labelled_enum! {
    pub enum PayrollStatus {
        Pending => "pending",
        Processed => "processed",
        Paid => "paid",
    }
    default = Pending
}

#[derive(Debug, Clone, Serialize)]
pub struct Payroll {
    pub id: Uuid,
    pub employee: AccountId,
    pub payroll_type: PayrollType,
    pub amount: Decimal,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub status: PayrollStatus,
    pub processed_by: Option<AccountId>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PayrollInput {
    pub employee: AccountId,
    pub payroll_type: Option<PayrollType>,
    pub amount: Decimal,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub status: Option<PayrollStatus>,
    pub notes: Option<String>,
}

impl PayrollInput {
    fn validate(&self) -> CampusResult<()> {
        let mut errors = FieldErrors::new();
        check_money(&mut errors, "amount", self.amount);
        errors.check(
            self.period_end < self.period_start,
            "period_end",
            "must not be before the period start",
        );
        errors.into_result()
    }
}

impl Record for Payroll {
    const KIND: EntityKind = EntityKind::Payroll;

    fn id(&self) -> Uuid {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn table(db: &Tables) -> &Table<Self> {
        &db.payroll
    }

    fn table_mut(db: &mut Tables) -> &mut Table<Self> {
        &mut db.payroll
    }

    fn owner(&self, _db: &Tables) -> Owner {
        Owner::account(self.employee)
    }

    fn matches(&self, filter: &Filter, _db: &Tables) -> bool {
        filter.status_is(self.status.as_str()) && filter.kind_is(self.payroll_type.as_str())
    }

    fn check(&self, db: &Tables) -> CampusResult<()> {
        match db.accounts.get(&self.employee.0) {
            None => Err(CampusError::invalid("employee", "user does not exist")),
            Some(account) if !matches!(account.role, Role::Admin | Role::Instructor) => Err(
                CampusError::invalid("employee", "payroll is only kept for staff accounts"),
            ),
            Some(_) => Ok(()),
        }
    }
}

impl Resource for Payroll {
    type Input = PayrollInput;

    fn create(input: PayrollInput, ctx: &WriteContext<'_>) -> CampusResult<Self> {
        input.validate()?;
        Ok(Self {
            id: Uuid::new_v4(),
            employee: input.employee,
            payroll_type: input.payroll_type.unwrap_or_default(),
            amount: input.amount,
            period_start: input.period_start,
            period_end: input.period_end,
            status: input.status.unwrap_or_default(),
            processed_by: ctx.account(),
            notes: input.notes,
            created_at: ctx.now,
        })
    }

    fn update(&mut self, input: PayrollInput, ctx: &WriteContext<'_>) -> CampusResult<()> {
        input.validate()?;
        self.employee = input.employee;
        if let Some(kind) = input.payroll_type {
            self.payroll_type = kind;
        }
        self.amount = input.amount;
        self.period_start = input.period_start;
        self.period_end = input.period_end;
        if let Some(status) = input.status {
            self.status = status;
        }
        self.processed_by = ctx.account();
        self.notes = input.notes;
        Ok(())
    }
}

labelled_enum! {
    pub enum ExpenseCategory {
        Rent => "rent",
        Utilities => "utilities",
        Supplies => "supplies",
        Equipment => "equipment",
        Salaries => "salaries",
        Marketing => "marketing",
        Other => "other",
    }
    default = Other
}

#[derive(Debug, Clone, Serialize)]
pub struct Expense {
    pub id: Uuid,
    pub category: ExpenseCategory,
    pub description: String,
    pub amount: Decimal,
    pub expense_date: NaiveDate,
    pub vendor: Option<String>,
    pub receipt_number: Option<String>,
    pub created_by: Option<AccountId>,
    pub approved_by: Option<AccountId>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExpenseInput {
    pub category: Option<ExpenseCategory>,
    #[serde(default)]
    pub description: String,
    pub amount: Decimal,
    pub expense_date: Option<NaiveDate>,
    pub vendor: Option<String>,
    pub receipt_number: Option<String>,
    /// Marks the expense approved by the caller
    #[serde(default)]
    pub approved: bool,
}

impl Record for Expense {
    const KIND: EntityKind = EntityKind::Expense;

    fn id(&self) -> Uuid {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn table(db: &Tables) -> &Table<Self> {
        &db.expenses
    }

    fn table_mut(db: &mut Tables) -> &mut Table<Self> {
        &mut db.expenses
    }

    fn owner(&self, _db: &Tables) -> Owner {
        Owner::default()
    }

    fn matches(&self, filter: &Filter, _db: &Tables) -> bool {
        filter.text(&[&self.description, self.vendor.as_deref().unwrap_or_default()])
            && filter.kind_is(self.category.as_str())
    }
}

impl Resource for Expense {
    type Input = ExpenseInput;

    fn create(input: ExpenseInput, ctx: &WriteContext<'_>) -> CampusResult<Self> {
        let mut errors = FieldErrors::new();
        check_money(&mut errors, "amount", input.amount);
        errors.into_result()?;
        Ok(Self {
            id: Uuid::new_v4(),
            category: input.category.unwrap_or_default(),
            description: input.description,
            amount: input.amount,
            expense_date: input.expense_date.unwrap_or_else(|| ctx.today()),
            vendor: input.vendor,
            receipt_number: input.receipt_number,
            created_by: ctx.account(),
            approved_by: if input.approved { ctx.account() } else { None },
            created_at: ctx.now,
        })
    }

    fn update(&mut self, input: ExpenseInput, ctx: &WriteContext<'_>) -> CampusResult<()> {
        let mut errors = FieldErrors::new();
        check_money(&mut errors, "amount", input.amount);
        errors.into_result()?;
        if let Some(category) = input.category {
            self.category = category;
        }
        self.description = input.description;
        self.amount = input.amount;
        if let Some(date) = input.expense_date {
            self.expense_date = date;
        }
        self.vendor = input.vendor;
        self.receipt_number = input.receipt_number;
        if input.approved && self.approved_by.is_none() {
            self.approved_by = ctx.account();
        }
        Ok(())
    }
}

labelled_enum! {
    pub enum InvoiceStatus {
        Draft => "draft",
        Sent => "sent",
        Paid => "paid",
        Overdue => "overdue",
        Cancelled => "cancelled",
    }
    default = Draft
}

#[derive(Debug, Clone, Serialize)]
pub struct Invoice {
    pub id: Uuid,
    pub invoice_number: String,
    pub recipient_name: String,
    pub recipient_email: Option<String>,
    pub student: Option<StudentId>,
    pub employer: Option<EmployerId>,
    pub amount: Decimal,
    pub tax_amount: Decimal,
    pub total_amount: Decimal,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    pub status: InvoiceStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InvoiceInput {
    pub invoice_number: Option<String>,
    pub recipient_name: String,
    pub recipient_email: Option<String>,
    pub student: Option<StudentId>,
    pub employer: Option<EmployerId>,
    pub amount: Decimal,
    #[serde(default)]
    pub tax_amount: Decimal,
    pub issue_date: Option<NaiveDate>,
    pub due_date: NaiveDate,
    pub status: Option<InvoiceStatus>,
    pub notes: Option<String>,
}

impl InvoiceInput {
    /// Validated total of amount and tax
    fn total(&self, issue_date: NaiveDate) -> CampusResult<Decimal> {
        let mut errors = FieldErrors::new();
        errors.check(self.recipient_name.trim().is_empty(), "recipient_name", "this field is required");
        errors.check(
            self.recipient_email.as_deref().map(|e| !is_valid_email(e)).unwrap_or(false),
            "recipient_email",
            "enter a valid email address",
        );
        check_money(&mut errors, "amount", self.amount);
        check_money(&mut errors, "tax_amount", self.tax_amount);
        errors.check(self.due_date < issue_date, "due_date", "must not be before the issue date");
        errors.into_result()?;
        let total = self
            .amount
            .checked_add(self.tax_amount)
            .ok_or_else(|| CampusError::invalid("tax_amount", "total is too large"))?;
        let mut errors = FieldErrors::new();
        check_money(&mut errors, "total_amount", total);
        errors.into_result()?;
        Ok(total)
    }
}

impl Invoice {
    /// Sent or already flagged overdue, and past the due date
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        matches!(self.status, InvoiceStatus::Sent | InvoiceStatus::Overdue) && self.due_date < today
    }
}

impl Record for Invoice {
    const KIND: EntityKind = EntityKind::Invoice;

    fn id(&self) -> Uuid {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn table(db: &Tables) -> &Table<Self> {
        &db.invoices
    }

    fn table_mut(db: &mut Tables) -> &mut Table<Self> {
        &mut db.invoices
    }

    fn owner(&self, _db: &Tables) -> Owner {
        Owner {
            student: self.student,
            employer: self.employer,
            ..Default::default()
        }
    }

    fn matches(&self, filter: &Filter, _db: &Tables) -> bool {
        filter.text(&[&self.invoice_number, &self.recipient_name])
            && filter.status_is(self.status.as_str())
            && opt_id_matches(filter.student, self.student.map(|s| s.0))
            && opt_id_matches(filter.employer, self.employer.map(|e| e.0))
    }

    fn check(&self, db: &Tables) -> CampusResult<()> {
        let mut errors = FieldErrors::new();
        if let Some(student) = self.student {
            errors.check(!exists::<StudentProfile>(db, student.0), "student", "student does not exist");
        }
        if let Some(employer) = self.employer {
            errors.check(!exists::<EmployerProfile>(db, employer.0), "employer", "employer does not exist");
        }
        errors.into_result()?;
        ensure_unique(db, self, "an invoice with this number already exists", |o| {
            o.invoice_number == self.invoice_number
        })
    }
}

impl Resource for Invoice {
    type Input = InvoiceInput;

    fn create(input: InvoiceInput, ctx: &WriteContext<'_>) -> CampusResult<Self> {
        let issue_date = input.issue_date.unwrap_or_else(|| ctx.today());
        let total_amount = input.total(issue_date)?;
        Ok(Self {
            id: Uuid::new_v4(),
            invoice_number: input
                .invoice_number
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| invoice_number(ctx.today())),
            recipient_name: input.recipient_name.trim().to_string(),
            recipient_email: input.recipient_email,
            student: input.student,
            employer: input.employer,
            amount: input.amount,
            tax_amount: input.tax_amount,
            total_amount,
            issue_date,
            due_date: input.due_date,
            status: input.status.unwrap_or_default(),
            notes: input.notes,
            created_at: ctx.now,
        })
    }

    fn update(&mut self, input: InvoiceInput, _ctx: &WriteContext<'_>) -> CampusResult<()> {
        let issue_date = input.issue_date.unwrap_or(self.issue_date);
        let total_amount = input.total(issue_date)?;
        if let Some(number) = input.invoice_number.filter(|n| !n.trim().is_empty()) {
            self.invoice_number = number;
        }
        self.recipient_name = input.recipient_name.trim().to_string();
        self.recipient_email = input.recipient_email;
        self.student = input.student;
        self.employer = input.employer;
        self.amount = input.amount;
        self.tax_amount = input.tax_amount;
        self.total_amount = total_amount;
        self.issue_date = issue_date;
        self.due_date = input.due_date;
        if let Some(status) = input.status {
            self.status = status;
        }
        self.notes = input.notes;
        Ok(())
    }
}

labelled_enum! {
    pub enum ReportType {
        Monthly => "monthly",
        Quarterly => "quarterly",
        Annual => "annual",
        Custom => "custom",
    }
    default = Custom
}

/// Money moved inside a reporting period
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PeriodBreakdown {
    pub tuition: Decimal,
    pub placement_fees: Decimal,
    pub expenses: Decimal,
    pub payroll: Decimal,
    pub completed_payments: usize,
    pub expenses_by_category: BTreeMap<String, Decimal>,
}

impl PeriodBreakdown {
    /// Completed payments, paid placement fees, expenses, and paid payroll
    /// ending inside `start..=end`
    pub fn collect(db: &Tables, start: NaiveDate, end: NaiveDate) -> Self {
        let within = |date: NaiveDate| start <= date && date <= end;
        let payments: Vec<&Payment> = db
            .payments
            .values()
            .filter(|p| p.status == PaymentStatus::Completed && within(p.payment_date))
            .collect();
        let expenses: Vec<&Expense> = db.expenses.values().filter(|e| within(e.expense_date)).collect();

        let mut expenses_by_category: BTreeMap<String, Decimal> = BTreeMap::new();
        for expense in &expenses {
            let entry = expenses_by_category
                .entry(expense.category.as_str().to_string())
                .or_default();
            *entry = entry.saturating_add(expense.amount);
        }

        Self {
            tuition: total(payments.iter().map(|p| p.amount)),
            placement_fees: total(
                db.placement_fees
                    .values()
                    .filter(|f| f.status == FeeStatus::Paid && f.paid_date.map(within).unwrap_or(false))
                    .map(|f| f.amount),
            ),
            expenses: total(expenses.iter().map(|e| e.amount)),
            payroll: total(
                db.payroll
                    .values()
                    .filter(|p| p.status == PayrollStatus::Paid && within(p.period_end))
                    .map(|p| p.amount),
            ),
            completed_payments: payments.len(),
            expenses_by_category,
        }
    }

    pub fn revenue(&self) -> Decimal {
        self.tuition.saturating_add(self.placement_fees)
    }

    pub fn spending(&self) -> Decimal {
        self.expenses.saturating_add(self.payroll)
    }
}

/// Saved snapshot of school finances over a period
#[derive(Debug, Clone, Serialize)]
pub struct FinancialReport {
    pub id: Uuid,
    pub report_type: ReportType,
    pub title: String,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub total_revenue: Decimal,
    pub total_expenses: Decimal,
    pub net_profit: Decimal,
    pub profit_margin: Percent,
    pub report_data: PeriodBreakdown,
    pub generated_by: Option<AccountId>,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FinancialReportInput {
    pub report_type: Option<ReportType>,
    pub title: String,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
}

impl FinancialReportInput {
    fn validate(&self) -> CampusResult<()> {
        let mut errors = FieldErrors::new();
        errors.check(self.title.trim().is_empty(), "title", "this field is required");
        errors.check(
            self.period_end < self.period_start,
            "period_end",
            "must not be before the period start",
        );
        errors.into_result()
    }
}

impl FinancialReport {
    /// Recomputes the figures from the current records
    fn generate(&mut self, db: &Tables) {
        let data = PeriodBreakdown::collect(db, self.period_start, self.period_end);
        self.total_revenue = data.revenue();
        self.total_expenses = data.spending();
        self.net_profit = self.total_revenue.saturating_sub(self.total_expenses);
        self.profit_margin = Percent::of(self.net_profit, self.total_revenue);
        self.report_data = data;
    }
}

impl Record for FinancialReport {
    const KIND: EntityKind = EntityKind::FinancialReport;

    fn id(&self) -> Uuid {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.generated_at
    }

    fn table(db: &Tables) -> &Table<Self> {
        &db.financial_reports
    }

    fn table_mut(db: &mut Tables) -> &mut Table<Self> {
        &mut db.financial_reports
    }

    fn owner(&self, _db: &Tables) -> Owner {
        Owner::default()
    }

    fn matches(&self, filter: &Filter, _db: &Tables) -> bool {
        filter.text(&[&self.title]) && filter.kind_is(self.report_type.as_str())
    }
}

impl Resource for FinancialReport {
    type Input = FinancialReportInput;

    fn create(input: FinancialReportInput, ctx: &WriteContext<'_>) -> CampusResult<Self> {
        input.validate()?;
        let mut report = Self {
            id: Uuid::new_v4(),
            report_type: input.report_type.unwrap_or_default(),
            title: input.title.trim().to_string(),
            period_start: input.period_start,
            period_end: input.period_end,
            total_revenue: Decimal::ZERO,
            total_expenses: Decimal::ZERO,
            net_profit: Decimal::ZERO,
            profit_margin: Percent::default(),
            report_data: PeriodBreakdown::default(),
            generated_by: ctx.account(),
            generated_at: ctx.now,
        };
        report.generate(ctx.db);
        Ok(report)
    }

    fn update(&mut self, input: FinancialReportInput, ctx: &WriteContext<'_>) -> CampusResult<()> {
        input.validate()?;
        if let Some(kind) = input.report_type {
            self.report_type = kind;
        }
        self.title = input.title.trim().to_string();
        self.period_start = input.period_start;
        self.period_end = input.period_end;
        self.generated_by = ctx.account();
        self.generated_at = ctx.now;
        self.generate(ctx.db);
        Ok(())
    }
}

/// Clears payment links to a deleted enrollment
pub(crate) fn detach_enrollment(db: &mut Tables, enrollment: Uuid) {
    for payment in db.payments.values_mut() {
        if payment.enrollment == Some(enrollment) {
            payment.enrollment = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::MAX_MONEY;
    use rust_decimal_macros::dec;

    fn invoice(status: InvoiceStatus, due: NaiveDate) -> Invoice {
        Invoice {
            id: Uuid::new_v4(),
            invoice_number: "INV-202601-AAAAAA".into(),
            recipient_name: "Acme Fabrication".into(),
            recipient_email: None,
            student: None,
            employer: None,
            amount: dec!(1000),
            tax_amount: dec!(200),
            total_amount: dec!(1200),
            issue_date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            due_date: due,
            status,
            notes: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_overdue_invoices() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let past = NaiveDate::from_ymd_opt(2026, 2, 1).unwrap();

        assert!(invoice(InvoiceStatus::Sent, past).is_overdue(today));
        assert!(invoice(InvoiceStatus::Overdue, past).is_overdue(today));
        assert!(!invoice(InvoiceStatus::Paid, past).is_overdue(today));
        assert!(!invoice(InvoiceStatus::Draft, past).is_overdue(today));
        assert!(!invoice(InvoiceStatus::Sent, today).is_overdue(today));
    }

    #[test]
    fn test_payroll_period() {
        let input = PayrollInput {
            employee: AccountId::new(),
            payroll_type: None,
            amount: dec!(2500),
            period_start: NaiveDate::from_ymd_opt(2026, 2, 1).unwrap(),
            period_end: NaiveDate::from_ymd_opt(2026, 1, 31).unwrap(),
            status: None,
            notes: None,
        };
        assert!(input.validate().is_err());
    }

    fn invoice_input(amount: Decimal, tax_amount: Decimal) -> InvoiceInput {
        InvoiceInput {
            invoice_number: None,
            recipient_name: "Acme Fabrication".into(),
            recipient_email: None,
            student: None,
            employer: None,
            amount,
            tax_amount,
            issue_date: None,
            due_date: NaiveDate::from_ymd_opt(2026, 2, 1).unwrap(),
            status: None,
            notes: None,
        }
    }

    #[test]
    fn test_invoice_totals_are_bounded() {
        let issued = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        assert_eq!(invoice_input(dec!(1000), dec!(200)).total(issued).unwrap(), dec!(1200));

        match invoice_input(Decimal::MAX, Decimal::MAX).total(issued) {
            Err(CampusError::Validation(errors)) => {
                assert!(errors.get("amount").is_some());
                assert!(errors.get("tax_amount").is_some());
            }
            other => panic!("expected validation error, got {other:?}"),
        }
        match invoice_input(MAX_MONEY, dec!(0.01)).total(issued) {
            Err(CampusError::Validation(errors)) => assert!(errors.get("total_amount").is_some()),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_mark_paid_sources() {
        assert!(Payment::can_leave(PaymentStatus::Failed));
        assert!(!Payment::can_leave(PaymentStatus::Refunded));
        assert_eq!(Payment::target(Transition::MarkPaid), Some(PaymentStatus::Completed));
    }
}
