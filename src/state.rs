use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::records::{AssignedFee, FeeAssignment, FeeTypeDefinition, Payment, SchoolClass, Student};
use crate::types::{AssignmentId, ClassId, FeeTypeId, SchoolId, StudentId};

/// one school's rows, keyed by id
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookState {
    pub school_id: SchoolId,
    pub classes: BTreeMap<ClassId, SchoolClass>,
    pub fee_types: BTreeMap<FeeTypeId, FeeTypeDefinition>,
    /// fee type to class links used for bulk assignment
    pub fee_type_classes: BTreeSet<(FeeTypeId, ClassId)>,
    pub students: BTreeMap<StudentId, Student>,
    pub assignments: BTreeMap<AssignmentId, FeeAssignment>,
    pub payments: Vec<Payment>,
    next_assignment_id: AssignmentId,
}

impl BookState {
    /// create empty state for a school
    pub fn new(school_id: SchoolId) -> Self {
        Self {
            school_id,
            classes: BTreeMap::new(),
            fee_types: BTreeMap::new(),
            fee_type_classes: BTreeSet::new(),
            students: BTreeMap::new(),
            assignments: BTreeMap::new(),
            payments: Vec::new(),
            next_assignment_id: 1,
        }
    }

    /// reserve the next assignment id
    pub fn allocate_assignment_id(&mut self) -> AssignmentId {
        let id = self.next_assignment_id;
        self.next_assignment_id += 1;
        id
    }

    /// insert an assignment, keeping the id counter ahead of loaded ids
    pub fn insert_assignment(&mut self, assignment: FeeAssignment) {
        if assignment.id >= self.next_assignment_id {
            self.next_assignment_id = assignment.id + 1;
        }
        self.assignments.insert(assignment.id, assignment);
    }

    pub fn class_name(&self, class_id: Option<ClassId>) -> Option<&str> {
        class_id
            .and_then(|id| self.classes.get(&id))
            .map(|c| c.name.as_str())
    }

    /// class with the given name, ignoring case
    pub fn class_named(&self, name: &str) -> Option<&SchoolClass> {
        let wanted = name.trim().to_lowercase();
        self.classes
            .values()
            .find(|c| c.name.to_lowercase() == wanted)
    }

    pub fn assignments_for(&self, student_id: StudentId) -> impl Iterator<Item = &FeeAssignment> + '_ {
        self.assignments
            .values()
            .filter(move |a| a.student_id == student_id)
    }

    /// assignments paired with their fee types
    pub fn assigned_fees_for(&self, student_id: StudentId) -> Vec<AssignedFee<'_>> {
        self.assignments_for(student_id)
            .map(|a| AssignedFee::new(a, self.fee_types.get(&a.fee_type_id)))
            .collect()
    }

    pub fn payments_for(&self, student_id: StudentId) -> impl Iterator<Item = &Payment> + '_ {
        self.payments
            .iter()
            .filter(move |p| p.student_id == student_id)
    }

    pub fn find_assignment(&self, student_id: StudentId, fee_type_id: FeeTypeId) -> Option<&FeeAssignment> {
        self.assignments
            .values()
            .find(|a| a.student_id == student_id && a.fee_type_id == fee_type_id)
    }

    pub fn students_in_class(&self, class_id: ClassId) -> impl Iterator<Item = &Student> + '_ {
        self.students
            .values()
            .filter(move |s| s.class_id == Some(class_id))
    }

    /// student already holding a roll number in a class and year
    pub fn roll_holder(
        &self,
        class_id: ClassId,
        roll_no: &str,
        academic_year: &str,
        except: Option<StudentId>,
    ) -> Option<&Student> {
        self.students
            .values()
            .filter(|s| Some(s.id) != except)
            .find(|s| s.shares_roll_slot(class_id, roll_no, academic_year))
    }

    /// classes a fee type is linked to
    pub fn linked_classes(&self, fee_type_id: FeeTypeId) -> Vec<ClassId> {
        self.fee_type_classes
            .iter()
            .filter(|(f, _)| *f == fee_type_id)
            .map(|(_, c)| *c)
            .collect()
    }

    /// recompute one student's cached total; returns (old, new)
    pub fn recompute_student(&mut self, student_id: StudentId) -> Option<(Money, Money)> {
        let student = self.students.get_mut(&student_id)?;
        let previous = student.total_fees;
        let current = student.recompute_total_fees(self.assignments.values());
        Some((previous, current))
    }

    /// computed total without touching the cache
    pub fn computed_total(&self, student_id: StudentId) -> Option<Money> {
        self.students
            .get(&student_id)
            .map(|s| s.computed_total_fees(self.assignments.values()))
    }
}
