use std::collections::BTreeSet;

use chrono::NaiveDate;
use hourglass_rs::SafeTimeProvider;
use serde::{Deserialize, Serialize};

use crate::config::LedgerConfig;
use crate::context::ReportContext;
use crate::decimal::Money;
use crate::errors::{FeeError, Result};
use crate::events::{EventStore, LedgerEvent};
use crate::ledger::{StudentFeeAggregator, StudentFeeSummary};
use crate::records::{
    FeeAssignment, FeeSelection, FeeTypeDefinition, Payment, PaymentRequest, SchoolClass, SchoolRows,
    Student, StudentRegistration,
};
use crate::reporting::{
    ClassRollup, CollectionsReport, DashboardStats, LedgerExport, LedgerLine, SchoolRollup, SearchQuery,
};
use crate::schedule::{utc_today, CollectionPeriod};
use crate::state::BookState;
use crate::types::{AssignmentId, ClassId, FeeTypeId, PaymentId, SchoolId, StudentId};

/// students added and removed by a bulk class sync
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentSync {
    pub added: Vec<StudentId>,
    pub removed: Vec<StudentId>,
}

/// a student whose cached total no longer matches their assignments
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TotalDrift {
    pub student_id: StudentId,
    pub name: String,
    pub cached: Money,
    pub computed: Money,
}

impl TotalDrift {
    pub fn difference(&self) -> Money {
        self.computed - self.cached
    }
}

/// one school's fee records with every mutation path over them
pub struct FeeBook {
    pub school_id: SchoolId,
    pub config: LedgerConfig,
    pub state: BookState,
    pub events: EventStore,
}

impl FeeBook {
    /// create an empty book
    pub fn new(school_id: SchoolId, config: LedgerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            school_id,
            config,
            state: BookState::new(school_id),
            events: EventStore::new(),
        })
    }

    /// load a book from fetched store rows
    pub fn from_rows(school_id: SchoolId, rows: SchoolRows, config: LedgerConfig) -> Result<Self> {
        config.validate()?;
        let state = rows.into_state(school_id, &config)?;
        Ok(Self {
            school_id,
            config,
            state,
            events: EventStore::new(),
        })
    }

    /// load a book from store rows serialized as json
    pub fn from_json(school_id: SchoolId, json: &str, config: LedgerConfig) -> Result<Self> {
        Self::from_rows(school_id, SchoolRows::from_json(json)?, config)
    }

    /// report context for the provider's current UTC day
    pub fn context(&self, time: &SafeTimeProvider) -> ReportContext {
        self.context_on(utc_today(time))
    }

    pub fn context_on(&self, today: NaiveDate) -> ReportContext {
        ReportContext::from_config(self.school_id, today, &self.config)
    }

    pub fn take_events(&mut self) -> Vec<LedgerEvent> {
        self.events.take_events()
    }

    // lookups

    pub fn student(&self, student_id: StudentId) -> Result<&Student> {
        self.state
            .students
            .get(&student_id)
            .ok_or(FeeError::StudentNotFound { id: student_id })
    }

    pub fn class(&self, class_id: ClassId) -> Result<&SchoolClass> {
        self.state
            .classes
            .get(&class_id)
            .ok_or(FeeError::ClassNotFound { id: class_id })
    }

    pub fn fee_type(&self, fee_type_id: FeeTypeId) -> Result<&FeeTypeDefinition> {
        self.state
            .fee_types
            .get(&fee_type_id)
            .ok_or(FeeError::FeeTypeNotFound { id: fee_type_id })
    }

    // classes

    /// add a class; names are unique ignoring case
    pub fn add_class(&mut self, name: &str) -> Result<ClassId> {
        let class = SchoolClass::new(self.school_id, name)?;
        if self.state.class_named(&class.name).is_some() {
            return Err(FeeError::DuplicateClassName { name: class.name });
        }

        let class_id = class.id;
        self.events.emit(LedgerEvent::ClassAdded {
            school_id: self.school_id,
            class_id,
            name: class.name.clone(),
        });
        tracing::debug!(%class_id, name = %class.name, "class added");
        self.state.classes.insert(class_id, class);

        Ok(class_id)
    }

    /// remove a class, its fee type links and its students' membership
    pub fn remove_class(&mut self, class_id: ClassId) -> Result<SchoolClass> {
        let class = self
            .state
            .classes
            .remove(&class_id)
            .ok_or(FeeError::ClassNotFound { id: class_id })?;

        self.state.fee_type_classes.retain(|(_, c)| *c != class_id);

        let mut students_unassigned = 0;
        for student in self.state.students.values_mut() {
            if student.class_id == Some(class_id) {
                student.class_id = None;
                students_unassigned += 1;
            }
        }

        self.events.emit(LedgerEvent::ClassRemoved {
            school_id: self.school_id,
            class_id,
            students_unassigned,
        });
        tracing::debug!(%class_id, students_unassigned, "class removed");

        Ok(class)
    }

    // fee types

    pub fn create_fee_type(&mut self, definition: FeeTypeDefinition) -> Result<FeeTypeId> {
        self.ensure_school(definition.school_id)?;
        definition.validate()?;

        let fee_type_id = definition.id;
        self.events.emit(LedgerEvent::FeeTypeCreated {
            school_id: self.school_id,
            fee_type_id,
            name: definition.name.clone(),
            base_amount: definition.base_amount,
        });
        tracing::debug!(%fee_type_id, name = %definition.name, base = %definition.base_amount, "fee type created");
        self.state.fee_types.insert(fee_type_id, definition);

        Ok(fee_type_id)
    }

    /// replace a fee type's definition; existing assignments keep their amounts
    pub fn update_fee_type(&mut self, definition: FeeTypeDefinition) -> Result<()> {
        self.ensure_school(definition.school_id)?;
        definition.validate()?;

        let fee_type_id = definition.id;
        let existing = self
            .state
            .fee_types
            .get_mut(&fee_type_id)
            .ok_or(FeeError::FeeTypeNotFound { id: fee_type_id })?;
        let old_base_amount = existing.base_amount;
        let new_base_amount = definition.base_amount;
        *existing = definition;

        self.events.emit(LedgerEvent::FeeTypeUpdated {
            school_id: self.school_id,
            fee_type_id,
            old_base_amount,
            new_base_amount,
        });
        tracing::debug!(%fee_type_id, %old_base_amount, %new_base_amount, "fee type updated");

        Ok(())
    }

    /// replace the set of classes a fee type is linked to
    pub fn link_fee_type_to_classes(&mut self, fee_type_id: FeeTypeId, class_ids: &[ClassId]) -> Result<()> {
        self.fee_type(fee_type_id)?;
        for class_id in class_ids {
            self.class(*class_id)?;
        }

        self.state.fee_type_classes.retain(|(f, _)| *f != fee_type_id);
        for class_id in class_ids {
            self.state.fee_type_classes.insert((fee_type_id, *class_id));
        }

        self.events.emit(LedgerEvent::FeeTypeLinked {
            school_id: self.school_id,
            fee_type_id,
            class_ids: self.state.linked_classes(fee_type_id),
        });

        Ok(())
    }

    /// delete a fee type with its assignments and links
    pub fn delete_fee_type(&mut self, fee_type_id: FeeTypeId) -> Result<FeeTypeDefinition> {
        let definition = self
            .state
            .fee_types
            .remove(&fee_type_id)
            .ok_or(FeeError::FeeTypeNotFound { id: fee_type_id })?;

        let doomed: Vec<(AssignmentId, StudentId)> = self
            .state
            .assignments
            .values()
            .filter(|a| a.fee_type_id == fee_type_id)
            .map(|a| (a.id, a.student_id))
            .collect();

        let mut affected = BTreeSet::new();
        for (assignment_id, student_id) in &doomed {
            self.state.assignments.remove(assignment_id);
            affected.insert(*student_id);
        }
        self.state.fee_type_classes.retain(|(f, _)| *f != fee_type_id);

        for student_id in affected {
            self.refresh_total(student_id);
        }

        self.events.emit(LedgerEvent::FeeTypeDeleted {
            school_id: self.school_id,
            fee_type_id,
            assignments_removed: doomed.len(),
        });
        tracing::debug!(%fee_type_id, assignments_removed = doomed.len(), "fee type deleted");

        Ok(definition)
    }

    // students

    /// register a student with their selected fees
    pub fn register_student(&mut self, registration: StudentRegistration) -> Result<StudentId> {
        let student = Student::new(self.school_id, &registration)?;
        self.class(registration.class_id)?;
        self.check_roll_number(&registration, None)?;
        self.check_selections(student.id, &registration.fees)?;

        let student_id = student.id;
        self.state.students.insert(student_id, student);
        for selection in &registration.fees {
            self.attach_fee(student_id, selection)?;
        }
        self.refresh_total(student_id);

        self.events.emit(LedgerEvent::StudentRegistered {
            school_id: self.school_id,
            student_id,
            class_id: registration.class_id,
            fee_count: registration.fees.len(),
        });
        tracing::debug!(%student_id, fees = registration.fees.len(), "student registered");

        Ok(student_id)
    }

    /// edit a student and replace all of their assignments
    ///
    /// Replaced fees are re-assigned at the fee type's current base amount.
    pub fn update_student(&mut self, student_id: StudentId, registration: StudentRegistration) -> Result<()> {
        registration.validate()?;
        self.student(student_id)?;
        self.class(registration.class_id)?;
        self.check_roll_number(&registration, Some(student_id))?;
        self.check_selections(student_id, &registration.fees)?;

        let replaced: Vec<FeeAssignment> = self
            .state
            .assignments_for(student_id)
            .cloned()
            .collect();
        for assignment in replaced {
            self.state.assignments.remove(&assignment.id);
            self.events.emit(LedgerEvent::FeeUnassigned {
                student_id,
                fee_type_id: assignment.fee_type_id,
                assignment_id: assignment.id,
            });
        }

        if let Some(student) = self.state.students.get_mut(&student_id) {
            student.name = registration.name.trim().to_string();
            student.roll_no = registration.roll_no.trim().to_string();
            student.class_id = Some(registration.class_id);
            student.academic_year = registration.academic_year.trim().to_string();
        }

        for selection in &registration.fees {
            self.attach_fee(student_id, selection)?;
        }
        self.refresh_total(student_id);

        self.events.emit(LedgerEvent::StudentUpdated {
            school_id: self.school_id,
            student_id,
            class_id: registration.class_id,
            fee_count: registration.fees.len(),
        });
        tracing::debug!(%student_id, fees = registration.fees.len(), "student updated");

        Ok(())
    }

    /// delete a student with their assignments and payments
    pub fn delete_student(&mut self, student_id: StudentId) -> Result<Student> {
        let student = self
            .state
            .students
            .remove(&student_id)
            .ok_or(FeeError::StudentNotFound { id: student_id })?;

        let assignments_before = self.state.assignments.len();
        self.state.assignments.retain(|_, a| a.student_id != student_id);
        let assignments_removed = assignments_before - self.state.assignments.len();

        let payments_before = self.state.payments.len();
        self.state.payments.retain(|p| p.student_id != student_id);
        let payments_removed = payments_before - self.state.payments.len();

        self.events.emit(LedgerEvent::StudentDeleted {
            school_id: self.school_id,
            student_id,
            assignments_removed,
            payments_removed,
        });
        tracing::debug!(%student_id, assignments_removed, payments_removed, "student deleted");

        Ok(student)
    }

    // assignments

    /// assign one fee to a student at the fee type's base amount
    pub fn assign_fee(&mut self, student_id: StudentId, selection: FeeSelection) -> Result<AssignmentId> {
        self.student(student_id)?;
        self.check_selections(student_id, std::slice::from_ref(&selection))?;

        let assignment_id = self.attach_fee(student_id, &selection)?;
        self.refresh_total(student_id);
        Ok(assignment_id)
    }

    pub fn unassign_fee(&mut self, student_id: StudentId, fee_type_id: FeeTypeId) -> Result<()> {
        self.student(student_id)?;
        let assignment_id = self
            .state
            .find_assignment(student_id, fee_type_id)
            .map(|a| a.id)
            .ok_or(FeeError::FeeNotAssigned {
                student_id,
                fee_type_id,
            })?;

        self.detach_fee(assignment_id);
        self.refresh_total(student_id);
        Ok(())
    }

    /// change a discount; returns the new net payable
    pub fn set_discount(
        &mut self,
        assignment_id: AssignmentId,
        discount: Money,
        description: Option<String>,
    ) -> Result<Money> {
        let assignment = self
            .state
            .assignments
            .get_mut(&assignment_id)
            .ok_or(FeeError::AssignmentNotFound { id: assignment_id })?;

        let old_discount = assignment.discount;
        assignment.set_discount(discount, description)?;
        let student_id = assignment.student_id;
        let net_payable = assignment.net_payable();

        self.events.emit(LedgerEvent::DiscountChanged {
            student_id,
            assignment_id,
            old_discount,
            new_discount: discount,
        });
        self.refresh_total(student_id);

        Ok(net_payable)
    }

    /// bulk assignment of one fee type within one class
    ///
    /// Selected students without the fee get it at the base amount with no
    /// discount. Students of the class who are not selected lose it. Other
    /// classes are untouched.
    pub fn sync_class_assignments(
        &mut self,
        fee_type_id: FeeTypeId,
        class_id: ClassId,
        selected: &[StudentId],
    ) -> Result<AssignmentSync> {
        self.fee_type(fee_type_id)?;
        self.class(class_id)?;

        let selected: BTreeSet<StudentId> = selected.iter().copied().collect();
        for student_id in &selected {
            let student = self.student(*student_id)?;
            if student.class_id != Some(class_id) {
                return Err(FeeError::StudentNotInClass {
                    student_id: *student_id,
                    class_id,
                });
            }
        }

        let members: Vec<StudentId> = self.state.students_in_class(class_id).map(|s| s.id).collect();
        let mut sync = AssignmentSync::default();

        for student_id in members {
            let existing = self.state.find_assignment(student_id, fee_type_id).map(|a| a.id);
            match (selected.contains(&student_id), existing) {
                (true, None) => {
                    self.attach_fee(student_id, &FeeSelection::full(fee_type_id))?;
                    sync.added.push(student_id);
                }
                (false, Some(assignment_id)) => {
                    self.detach_fee(assignment_id);
                    sync.removed.push(student_id);
                }
                _ => continue,
            }
            self.refresh_total(student_id);
        }

        tracing::debug!(
            %fee_type_id,
            %class_id,
            added = sync.added.len(),
            removed = sync.removed.len(),
            "class assignments synced"
        );

        Ok(sync)
    }

    // payments

    pub fn record_payment(&mut self, request: PaymentRequest, time: &SafeTimeProvider) -> Result<PaymentId> {
        self.student(request.student_id)?;
        let payment = Payment::from_request(
            request,
            self.school_id,
            time.now(),
            &self.config.receipt_config.fallback_prefix,
        )?;

        let payment_id = payment.id;
        self.events.emit(LedgerEvent::PaymentRecorded {
            student_id: payment.student_id,
            payment_id,
            amount: payment.amount_paid,
            mode: payment.mode,
            receipt_number: payment.receipt_number.clone(),
            timestamp: payment.date,
        });
        tracing::debug!(
            %payment_id,
            student_id = %payment.student_id,
            amount = %payment.amount_paid,
            mode = %payment.mode,
            receipt = %payment.receipt_number,
            "payment recorded"
        );
        self.state.payments.push(payment);

        Ok(payment_id)
    }

    // cached totals

    /// recompute a student's cached total from their assignments
    pub fn recompute_total_fees(&mut self, student_id: StudentId) -> Result<Money> {
        self.student(student_id)?;
        Ok(self.refresh_total(student_id))
    }

    /// students whose cached total differs from their assignments
    pub fn audit_cached_totals(&self) -> Vec<TotalDrift> {
        self.state
            .students
            .values()
            .filter_map(|student| {
                let computed = student.computed_total_fees(self.state.assignments.values());
                (computed != student.total_fees).then(|| TotalDrift {
                    student_id: student.id,
                    name: student.name.clone(),
                    cached: student.total_fees,
                    computed,
                })
            })
            .collect()
    }

    // reports

    pub fn student_summary(&self, student_id: StudentId, context: &ReportContext) -> Result<StudentFeeSummary> {
        self.ensure_school(context.school_id)?;
        let student = self.student(student_id)?;
        Ok(self.summarize(&self.aggregator(context), student))
    }

    /// summaries for every student
    pub fn summaries(&self, context: &ReportContext) -> Result<Vec<StudentFeeSummary>> {
        self.ensure_school(context.school_id)?;
        let aggregator = self.aggregator(context);
        Ok(self
            .state
            .students
            .values()
            .map(|student| self.summarize(&aggregator, student))
            .collect())
    }

    /// school view over students matching `query`
    pub fn school_report(&self, context: &ReportContext, query: &SearchQuery) -> Result<SchoolRollup> {
        let summaries: Vec<StudentFeeSummary> = self
            .summaries(context)?
            .into_iter()
            .filter(|s| query.matches(s))
            .collect();
        Ok(SchoolRollup::build(
            &summaries,
            context,
            &self.config.label_config.unassigned_class,
        ))
    }

    /// class view for one class
    pub fn class_report(
        &self,
        class_id: ClassId,
        context: &ReportContext,
        query: &SearchQuery,
    ) -> Result<ClassRollup> {
        let class_name = self.class(class_id)?.name.clone();
        let unassigned = &self.config.label_config.unassigned_class;
        let lines: Vec<LedgerLine> = self
            .summaries(context)?
            .iter()
            .filter(|s| s.class_id == Some(class_id) && query.matches(s))
            .map(|s| LedgerLine::from_summary(s, context, unassigned))
            .collect();
        Ok(ClassRollup::from_lines(Some(class_id), class_name, lines, context))
    }

    pub fn collections(&self, period: CollectionPeriod, class_id: Option<ClassId>) -> Result<CollectionsReport> {
        if let Some(class_id) = class_id {
            self.class(class_id)?;
        }
        CollectionsReport::build(&self.state, period, class_id, &self.config.label_config)
    }

    pub fn dashboard(&self, context: &ReportContext) -> Result<DashboardStats> {
        let summaries = self.summaries(context)?;
        Ok(DashboardStats::build(&self.state, &summaries, context.today))
    }

    /// export rows ordered by class then student name
    pub fn export_rows(&self, context: &ReportContext, query: &SearchQuery) -> Result<LedgerExport> {
        let unassigned = self.config.label_config.unassigned_class.as_str();
        let mut summaries = self.summaries(context)?;
        summaries.sort_by(|a, b| {
            a.class_label(unassigned)
                .cmp(b.class_label(unassigned))
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(LedgerExport::build(
            &summaries,
            context,
            &self.config.label_config,
            query,
        ))
    }

    // internals

    fn ensure_school(&self, school_id: SchoolId) -> Result<()> {
        if school_id != self.school_id {
            return Err(FeeError::SchoolMismatch {
                expected: self.school_id,
                found: school_id,
            });
        }
        Ok(())
    }

    fn aggregator(&self, context: &ReportContext) -> StudentFeeAggregator {
        StudentFeeAggregator::new(context.today)
            .with_unknown_label(self.config.label_config.unknown_fee_type.clone())
    }

    fn summarize(&self, aggregator: &StudentFeeAggregator, student: &Student) -> StudentFeeSummary {
        let fees = self.state.assigned_fees_for(student.id);
        let payments: Vec<&Payment> = self.state.payments_for(student.id).collect();
        aggregator.summarize(student, self.state.class_name(student.class_id), &fees, &payments)
    }

    fn check_roll_number(&self, registration: &StudentRegistration, except: Option<StudentId>) -> Result<()> {
        let taken = self.state.roll_holder(
            registration.class_id,
            &registration.roll_no,
            &registration.academic_year,
            except,
        );
        if taken.is_some() {
            return Err(FeeError::DuplicateRollNumber {
                roll_no: registration.roll_no.trim().to_string(),
                class_name: self
                    .state
                    .class_name(Some(registration.class_id))
                    .unwrap_or(&self.config.label_config.unassigned_class)
                    .to_string(),
                academic_year: registration.academic_year.trim().to_string(),
            });
        }
        Ok(())
    }

    /// known fee types, non-negative discounts, no fee type twice
    fn check_selections(&self, student_id: StudentId, fees: &[FeeSelection]) -> Result<()> {
        let mut seen = BTreeSet::new();
        for selection in fees {
            self.fee_type(selection.fee_type_id)?;
            if selection.discount.is_negative() {
                return Err(FeeError::InvalidAmount {
                    field: "assignment.discount".to_string(),
                    amount: selection.discount,
                });
            }
            if !seen.insert(selection.fee_type_id) {
                return Err(FeeError::DuplicateAssignment {
                    student_id,
                    fee_type_id: selection.fee_type_id,
                });
            }
        }
        Ok(())
    }

    fn attach_fee(&mut self, student_id: StudentId, selection: &FeeSelection) -> Result<AssignmentId> {
        if self.state.find_assignment(student_id, selection.fee_type_id).is_some() {
            return Err(FeeError::DuplicateAssignment {
                student_id,
                fee_type_id: selection.fee_type_id,
            });
        }

        let draft = FeeAssignment::new(0, student_id, self.fee_type(selection.fee_type_id)?)
            .with_discount(selection.discount, selection.discount_description.clone())?;
        let assignment = FeeAssignment {
            id: self.state.allocate_assignment_id(),
            ..draft
        };

        let assignment_id = assignment.id;
        self.events.emit(LedgerEvent::FeeAssigned {
            student_id,
            fee_type_id: assignment.fee_type_id,
            assignment_id,
            net_payable: assignment.net_payable(),
        });
        self.state.insert_assignment(assignment);

        Ok(assignment_id)
    }

    fn detach_fee(&mut self, assignment_id: AssignmentId) {
        if let Some(assignment) = self.state.assignments.remove(&assignment_id) {
            self.events.emit(LedgerEvent::FeeUnassigned {
                student_id: assignment.student_id,
                fee_type_id: assignment.fee_type_id,
                assignment_id,
            });
        }
    }

    /// the single path that writes a student's cached total
    fn refresh_total(&mut self, student_id: StudentId) -> Money {
        let Some((old_total, new_total)) = self.state.recompute_student(student_id) else {
            return Money::ZERO;
        };
        if old_total != new_total {
            self.events.emit(LedgerEvent::TotalFeesRecomputed {
                student_id,
                old_total,
                new_total,
            });
            tracing::debug!(%student_id, %old_total, %new_total, "total fees recomputed");
        }
        new_total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::CalendarDate;
    use crate::types::{BalanceTreatment, FeeScope, PaymentMode, PaymentStatus};
    use chrono::{TimeZone, Utc};
    use hourglass_rs::TimeSource;
    use uuid::Uuid;

    struct School {
        book: FeeBook,
        grade_one: ClassId,
        grade_two: ClassId,
        tuition: FeeTypeId,
        transport: FeeTypeId,
    }

    fn time() -> SafeTimeProvider {
        SafeTimeProvider::new(TimeSource::Test(Utc.with_ymd_and_hms(2025, 5, 28, 9, 0, 0).unwrap()))
    }

    fn school() -> School {
        let school_id = Uuid::new_v4();
        let mut book = FeeBook::new(school_id, LedgerConfig::default()).unwrap();
        let grade_one = book.add_class("Grade 1").unwrap();
        let grade_two = book.add_class("Grade 2").unwrap();

        let tuition = book
            .create_fee_type(FeeTypeDefinition::new(school_id, "Tuition", Money::from_major(1_000)).unwrap())
            .unwrap();
        let transport = book
            .create_fee_type(
                FeeTypeDefinition::builder(school_id)
                    .name("Transport")
                    .base_amount(Money::from_major(400))
                    .applicable_from(CalendarDate::from_ymd(2025, 6, 1))
                    .build()
                    .unwrap(),
            )
            .unwrap();

        School {
            book,
            grade_one,
            grade_two,
            tuition,
            transport,
        }
    }

    fn register(book: &mut FeeBook, name: &str, roll: &str, class_id: ClassId, fees: Vec<FeeSelection>) -> StudentId {
        let mut registration = StudentRegistration::new(name, roll, class_id, "2025-26");
        registration.fees = fees;
        book.register_student(registration).unwrap()
    }

    #[test]
    fn test_register_student_sets_cached_total() {
        let mut s = school();
        let student_id = register(
            &mut s.book,
            "Asha",
            "1",
            s.grade_one,
            vec![
                FeeSelection::discounted(s.tuition, Money::from_major(150), "sibling"),
                FeeSelection::full(s.transport),
            ],
        );

        assert_eq!(s.book.student(student_id).unwrap().total_fees, Money::from_major(1_250));
        assert!(s.book.audit_cached_totals().is_empty());

        let events = s.book.take_events();
        assert!(events
            .iter()
            .any(|e| matches!(e, LedgerEvent::StudentRegistered { fee_count: 2, .. })));
        assert!(s.book.events.events().is_empty());
    }

    #[test]
    fn test_registration_rejects_bad_input_without_side_effects() {
        let mut s = school();
        register(&mut s.book, "Asha", "1", s.grade_one, vec![]);

        let duplicate_roll = StudentRegistration::new("Ben", "1", s.grade_one, "2025-26");
        assert!(matches!(
            s.book.register_student(duplicate_roll),
            Err(FeeError::DuplicateRollNumber { .. })
        ));

        let repeated_fee = StudentRegistration::new("Ben", "2", s.grade_one, "2025-26")
            .with_fee(FeeSelection::full(s.tuition))
            .with_fee(FeeSelection::full(s.tuition));
        assert!(matches!(
            s.book.register_student(repeated_fee),
            Err(FeeError::DuplicateAssignment { .. })
        ));

        let unknown_fee = StudentRegistration::new("Ben", "2", s.grade_one, "2025-26")
            .with_fee(FeeSelection::full(Uuid::new_v4()));
        assert!(matches!(
            s.book.register_student(unknown_fee),
            Err(FeeError::FeeTypeNotFound { .. })
        ));

        assert_eq!(s.book.state.students.len(), 1);
        assert!(s.book.state.assignments.is_empty());

        // same roll number is fine in another year or class
        s.book
            .register_student(StudentRegistration::new("Ben", "1", s.grade_one, "2026-27"))
            .unwrap();
        s.book
            .register_student(StudentRegistration::new("Cara", "1", s.grade_two, "2025-26"))
            .unwrap();
    }

    #[test]
    fn test_class_names_unique_ignoring_case() {
        let mut s = school();
        assert!(matches!(
            s.book.add_class(" grade 1 "),
            Err(FeeError::DuplicateClassName { .. })
        ));
        assert!(s.book.add_class("Grade 3").is_ok());
    }

    #[test]
    fn test_update_student_replaces_assignments_at_current_base() {
        let mut s = school();
        let student_id = register(&mut s.book, "Asha", "1", s.grade_one, vec![FeeSelection::full(s.tuition)]);

        let mut tuition = s.book.fee_type(s.tuition).unwrap().clone();
        tuition.base_amount = Money::from_major(1_200);
        s.book.update_fee_type(tuition).unwrap();

        // existing assignment keeps its amount until replaced
        assert_eq!(s.book.student(student_id).unwrap().total_fees, Money::from_major(1_000));

        let edit = StudentRegistration::new("Asha R", "1", s.grade_two, "2025-26")
            .with_fee(FeeSelection::discounted(s.tuition, Money::from_major(200), "merit"));
        s.book.update_student(student_id, edit).unwrap();

        let student = s.book.student(student_id).unwrap();
        assert_eq!(student.name, "Asha R");
        assert_eq!(student.class_id, Some(s.grade_two));
        assert_eq!(student.total_fees, Money::from_major(1_000));
        assert_eq!(s.book.state.assignments_for(student_id).count(), 1);
    }

    #[test]
    fn test_update_student_keeps_own_roll_number() {
        let mut s = school();
        let asha = register(&mut s.book, "Asha", "1", s.grade_one, vec![]);
        register(&mut s.book, "Ben", "2", s.grade_one, vec![]);

        s.book
            .update_student(asha, StudentRegistration::new("Asha", "1", s.grade_one, "2025-26"))
            .unwrap();
        assert!(matches!(
            s.book
                .update_student(asha, StudentRegistration::new("Asha", "2", s.grade_one, "2025-26")),
            Err(FeeError::DuplicateRollNumber { .. })
        ));
    }

    #[test]
    fn test_delete_student_cascades() {
        let mut s = school();
        let time = time();
        let asha = register(&mut s.book, "Asha", "1", s.grade_one, vec![FeeSelection::full(s.tuition)]);
        let ben = register(&mut s.book, "Ben", "2", s.grade_one, vec![FeeSelection::full(s.tuition)]);
        s.book
            .record_payment(PaymentRequest::new(asha, Money::from_major(100), PaymentMode::Cash), &time)
            .unwrap();
        s.book
            .record_payment(PaymentRequest::new(ben, Money::from_major(100), PaymentMode::Cash), &time)
            .unwrap();

        s.book.delete_student(asha).unwrap();

        assert!(s.book.student(asha).is_err());
        assert_eq!(s.book.state.assignments.len(), 1);
        assert_eq!(s.book.state.payments.len(), 1);
        assert!(matches!(
            s.book.delete_student(asha),
            Err(FeeError::StudentNotFound { .. })
        ));
    }

    #[test]
    fn test_assign_unassign_and_discount() {
        let mut s = school();
        let student_id = register(&mut s.book, "Asha", "1", s.grade_one, vec![]);

        let assignment_id = s.book.assign_fee(student_id, FeeSelection::full(s.tuition)).unwrap();
        assert!(matches!(
            s.book.assign_fee(student_id, FeeSelection::full(s.tuition)),
            Err(FeeError::DuplicateAssignment { .. })
        ));

        let net = s
            .book
            .set_discount(assignment_id, Money::from_major(1_100), Some("scholarship".to_string()))
            .unwrap();
        assert_eq!(net, Money::from_major(-100));
        assert_eq!(s.book.student(student_id).unwrap().total_fees, Money::from_major(-100));

        assert!(matches!(
            s.book.set_discount(assignment_id, Money::from_major(-1), None),
            Err(FeeError::InvalidAmount { .. })
        ));

        s.book.unassign_fee(student_id, s.tuition).unwrap();
        assert_eq!(s.book.student(student_id).unwrap().total_fees, Money::ZERO);
        assert!(matches!(
            s.book.unassign_fee(student_id, s.tuition),
            Err(FeeError::FeeNotAssigned { .. })
        ));
    }

    #[test]
    fn test_sync_class_assignments_stays_within_class() {
        let mut s = school();
        let asha = register(&mut s.book, "Asha", "1", s.grade_one, vec![FeeSelection::full(s.transport)]);
        let ben = register(&mut s.book, "Ben", "2", s.grade_one, vec![]);
        let cara = register(&mut s.book, "Cara", "1", s.grade_two, vec![FeeSelection::full(s.transport)]);

        let sync = s
            .book
            .sync_class_assignments(s.transport, s.grade_one, &[ben])
            .unwrap();

        assert_eq!(sync.added, vec![ben]);
        assert_eq!(sync.removed, vec![asha]);
        assert!(s.book.state.find_assignment(cara, s.transport).is_some());
        assert_eq!(s.book.student(asha).unwrap().total_fees, Money::ZERO);
        assert_eq!(s.book.student(ben).unwrap().total_fees, Money::from_major(400));

        assert!(matches!(
            s.book.sync_class_assignments(s.transport, s.grade_one, &[cara]),
            Err(FeeError::StudentNotInClass { .. })
        ));
    }

    #[test]
    fn test_delete_fee_type_recomputes_totals() {
        let mut s = school();
        let asha = register(
            &mut s.book,
            "Asha",
            "1",
            s.grade_one,
            vec![FeeSelection::full(s.tuition), FeeSelection::full(s.transport)],
        );
        s.book
            .link_fee_type_to_classes(s.transport, &[s.grade_one, s.grade_two])
            .unwrap();
        assert_eq!(s.book.state.linked_classes(s.transport).len(), 2);

        s.book.delete_fee_type(s.transport).unwrap();

        assert_eq!(s.book.student(asha).unwrap().total_fees, Money::from_major(1_000));
        assert!(s.book.state.linked_classes(s.transport).is_empty());
        assert!(s.book.audit_cached_totals().is_empty());
    }

    #[test]
    fn test_remove_class_clears_membership() {
        let mut s = school();
        let asha = register(&mut s.book, "Asha", "1", s.grade_one, vec![FeeSelection::full(s.tuition)]);
        s.book.link_fee_type_to_classes(s.tuition, &[s.grade_one]).unwrap();

        s.book.remove_class(s.grade_one).unwrap();

        let student = s.book.student(asha).unwrap();
        assert_eq!(student.class_id, None);
        assert_eq!(student.total_fees, Money::from_major(1_000));
        assert!(s.book.state.fee_type_classes.is_empty());

        let context = s.book.context(&time());
        let summary = s.book.student_summary(asha, &context).unwrap();
        assert_eq!(summary.class_label("N/A"), "N/A");
    }

    #[test]
    fn test_record_payment_uses_provider_time() {
        let mut s = school();
        let time = time();
        let asha = register(&mut s.book, "Asha", "1", s.grade_one, vec![]);

        let payment_id = s
            .book
            .record_payment(PaymentRequest::new(asha, Money::from_major(250), PaymentMode::Upi), &time)
            .unwrap();

        let payment = s.book.state.payments.iter().find(|p| p.id == payment_id).unwrap();
        assert_eq!(payment.date, time.now());
        assert_eq!(payment.receipt_number, format!("R-{}", time.now().timestamp_millis()));

        assert!(matches!(
            s.book.record_payment(
                PaymentRequest::new(Uuid::new_v4(), Money::from_major(5), PaymentMode::Cash),
                &time
            ),
            Err(FeeError::StudentNotFound { .. })
        ));
        assert!(matches!(
            s.book
                .record_payment(PaymentRequest::new(asha, Money::ZERO, PaymentMode::Cash), &time),
            Err(FeeError::InvalidPaymentAmount { .. })
        ));
    }

    #[test]
    fn test_recompute_is_idempotent_and_fixes_drift() {
        let mut s = school();
        let asha = register(&mut s.book, "Asha", "1", s.grade_one, vec![FeeSelection::full(s.tuition)]);

        // drift introduced outside the book
        if let Some(student) = s.book.state.students.get_mut(&asha) {
            student.total_fees = Money::from_major(7);
        }
        let drift = s.book.audit_cached_totals();
        assert_eq!(drift.len(), 1);
        assert_eq!(drift[0].difference(), Money::from_major(993));

        let first = s.book.recompute_total_fees(asha).unwrap();
        let second = s.book.recompute_total_fees(asha).unwrap();
        assert_eq!(first, Money::from_major(1_000));
        assert_eq!(first, second);
        assert!(s.book.audit_cached_totals().is_empty());
    }

    #[test]
    fn test_reports_follow_time() {
        let mut s = school();
        let time = time();
        let asha = register(
            &mut s.book,
            "Asha",
            "1",
            s.grade_one,
            vec![FeeSelection::full(s.tuition), FeeSelection::full(s.transport)],
        );
        s.book
            .record_payment(PaymentRequest::new(asha, Money::from_major(1_000), PaymentMode::Cash), &time)
            .unwrap();

        let due = s.book.context(&time).with_scope(FeeScope::CurrentlyDue);
        let summary = s.book.student_summary(asha, &due).unwrap();
        assert_eq!(summary.fees(FeeScope::CurrentlyDue), Money::from_major(1_000));
        assert_eq!(summary.status(due.scope, due.tolerance), PaymentStatus::Paid);

        time.test_control().unwrap().advance(chrono::Duration::days(4));
        let due = s.book.context(&time).with_scope(FeeScope::CurrentlyDue);
        let summary = s.book.student_summary(asha, &due).unwrap();
        assert_eq!(summary.fees(FeeScope::CurrentlyDue), Money::from_major(1_400));
        assert_eq!(summary.status(due.scope, due.tolerance), PaymentStatus::PartiallyPaid);

        let dashboard = s.book.dashboard(&due).unwrap();
        assert_eq!(dashboard.student_count, 1);
        assert_eq!(dashboard.total_assigned, Money::from_major(1_400));
        assert_eq!(dashboard.total_collected, Money::from_major(1_000));
        assert_eq!(dashboard.total_outstanding, Money::from_major(400));
        assert_eq!(dashboard.total_currently_due, Money::from_major(1_400));
    }

    #[test]
    fn test_school_and_class_reports() {
        let mut s = school();
        let time = time();
        let asha = register(&mut s.book, "Asha", "1", s.grade_one, vec![FeeSelection::full(s.tuition)]);
        register(&mut s.book, "Ben", "2", s.grade_one, vec![FeeSelection::full(s.tuition)]);
        register(&mut s.book, "Cara", "1", s.grade_two, vec![]);
        s.book
            .record_payment(PaymentRequest::new(asha, Money::from_major(1_500), PaymentMode::Cash), &time)
            .unwrap();

        let context = s.book.context(&time);
        let report = s.book.school_report(&context, &SearchQuery::default()).unwrap();
        assert_eq!(report.classes.len(), 2);
        assert_eq!(report.total_fees, Money::from_major(2_000));
        assert_eq!(report.total_paid, Money::from_major(1_500));

        let class = s.book.class_report(s.grade_one, &context, &SearchQuery::new("asha")).unwrap();
        assert_eq!(class.student_count(), 1);
        assert_eq!(class.students[0].treatment, BalanceTreatment::Advance);
        let upper = s.book.class_report(s.grade_one, &context, &SearchQuery::new("ASHA")).unwrap();
        assert_eq!(class, upper);

        let export = s.book.export_rows(&context, &SearchQuery::default()).unwrap();
        let names: Vec<&str> = export.rows.iter().map(|r| r.student_name.as_str()).collect();
        assert_eq!(names, vec!["Asha", "Ben", "Cara"]);
        assert_eq!(export.rows[0].balance, "-500.00");
        assert_eq!(export.rows[2].status, "No Fees Due");
    }

    #[test]
    fn test_school_report_agrees_with_class_report_for_placeholder_name() {
        let mut s = school();
        let time = time();
        let lookalike = s.book.add_class("N/A").unwrap();
        register(&mut s.book, "Real", "1", lookalike, vec![FeeSelection::full(s.tuition)]);
        register(&mut s.book, "Loose", "1", s.grade_two, vec![]);
        s.book.remove_class(s.grade_two).unwrap();

        let context = s.book.context(&time);
        let report = s.book.school_report(&context, &SearchQuery::default()).unwrap();
        let class = s.book.class_report(lookalike, &context, &SearchQuery::default()).unwrap();
        assert_eq!(report.class(lookalike), Some(&class));

        let unassigned = report.unassigned().unwrap();
        assert_eq!(unassigned.students.len(), 1);
        assert_eq!(unassigned.students[0].name, "Loose");
    }

    #[test]
    fn test_collections_through_book() {
        let mut s = school();
        let time = time();
        let asha = register(&mut s.book, "Asha", "1", s.grade_one, vec![]);
        s.book
            .record_payment(PaymentRequest::new(asha, Money::from_major(300), PaymentMode::Cheque), &time)
            .unwrap();

        let today = utc_today(&time);
        let report = s
            .book
            .collections(CollectionPeriod::Daily { date: today }, Some(s.grade_one))
            .unwrap();
        assert_eq!(report.total_collected, Money::from_major(300));
        assert_eq!(report.total_for(PaymentMode::Cheque), Money::from_major(300));

        assert!(matches!(
            s.book.collections(CollectionPeriod::Daily { date: today }, Some(Uuid::new_v4())),
            Err(FeeError::ClassNotFound { .. })
        ));
    }

    #[test]
    fn test_foreign_context_and_fee_types_rejected() {
        let mut s = school();
        let foreign = ReportContext::at(Uuid::new_v4(), &time());
        assert!(matches!(
            s.book.summaries(&foreign),
            Err(FeeError::SchoolMismatch { .. })
        ));

        let other_school = FeeTypeDefinition::new(Uuid::new_v4(), "Lab", Money::from_major(50)).unwrap();
        assert!(matches!(
            s.book.create_fee_type(other_school),
            Err(FeeError::SchoolMismatch { .. })
        ));
    }

    #[test]
    fn test_from_json_rows_and_drift_audit() {
        let school_id = Uuid::new_v4();
        let student_id = Uuid::new_v4();
        let fee_id = Uuid::new_v4();
        let json = serde_json::json!({
            "fee_types": [{ "id": fee_id, "school_id": school_id, "name": "Tuition", "default_amount": 800.0 }],
            "students": [{ "id": student_id, "school_id": school_id, "name": "Isha", "roll_no": "3", "total_fees": 500.0 }],
            "student_fee_types": [{
                "id": 1, "school_id": school_id, "student_id": student_id, "fee_type_id": fee_id,
                "assigned_amount": 800.0, "discount": 100.0
            }]
        })
        .to_string();

        let mut book = FeeBook::from_json(school_id, &json, LedgerConfig::default()).unwrap();
        let drift = book.audit_cached_totals();
        assert_eq!(drift.len(), 1);
        assert_eq!(drift[0].computed, Money::from_major(700));

        book.recompute_total_fees(student_id).unwrap();
        assert!(book.audit_cached_totals().is_empty());

        // new assignments continue after loaded ids
        let lab = book
            .create_fee_type(FeeTypeDefinition::new(school_id, "Lab", Money::from_major(50)).unwrap())
            .unwrap();
        assert_eq!(book.assign_fee(student_id, FeeSelection::full(lab)).unwrap(), 2);
    }
}
