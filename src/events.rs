use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::types::{AssignmentId, ClassId, FeeTypeId, PaymentId, PaymentMode, SchoolId, StudentId};

/// all events that can be emitted by the fee book
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LedgerEvent {
    // class events
    ClassAdded {
        school_id: SchoolId,
        class_id: ClassId,
        name: String,
    },
    ClassRemoved {
        school_id: SchoolId,
        class_id: ClassId,
        students_unassigned: usize,
    },

    // fee type events
    FeeTypeCreated {
        school_id: SchoolId,
        fee_type_id: FeeTypeId,
        name: String,
        base_amount: Money,
    },
    FeeTypeUpdated {
        school_id: SchoolId,
        fee_type_id: FeeTypeId,
        old_base_amount: Money,
        new_base_amount: Money,
    },
    FeeTypeDeleted {
        school_id: SchoolId,
        fee_type_id: FeeTypeId,
        assignments_removed: usize,
    },
    FeeTypeLinked {
        school_id: SchoolId,
        fee_type_id: FeeTypeId,
        class_ids: Vec<ClassId>,
    },

    // student events
    StudentRegistered {
        school_id: SchoolId,
        student_id: StudentId,
        class_id: ClassId,
        fee_count: usize,
    },
    StudentUpdated {
        school_id: SchoolId,
        student_id: StudentId,
        class_id: ClassId,
        fee_count: usize,
    },
    StudentDeleted {
        school_id: SchoolId,
        student_id: StudentId,
        assignments_removed: usize,
        payments_removed: usize,
    },

    // assignment events
    FeeAssigned {
        student_id: StudentId,
        fee_type_id: FeeTypeId,
        assignment_id: AssignmentId,
        net_payable: Money,
    },
    FeeUnassigned {
        student_id: StudentId,
        fee_type_id: FeeTypeId,
        assignment_id: AssignmentId,
    },
    DiscountChanged {
        student_id: StudentId,
        assignment_id: AssignmentId,
        old_discount: Money,
        new_discount: Money,
    },
    TotalFeesRecomputed {
        student_id: StudentId,
        old_total: Money,
        new_total: Money,
    },

    // payment events
    PaymentRecorded {
        student_id: StudentId,
        payment_id: PaymentId,
        amount: Money,
        mode: PaymentMode,
        receipt_number: String,
        timestamp: DateTime<Utc>,
    },
}

/// event store for collecting events during operations
#[derive(Debug, Default)]
pub struct EventStore {
    events: Vec<LedgerEvent>,
}

impl EventStore {
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
        }
    }

    pub fn emit(&mut self, event: LedgerEvent) {
        self.events.push(event);
    }

    pub fn take_events(&mut self) -> Vec<LedgerEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn events(&self) -> &[LedgerEvent] {
        &self.events
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}
