/// fee book - classes, bulk assignment, edits and school reports
use school_fees_rs::{
    FeeBook, FeeSelection, FeeTypeDefinition, LedgerConfig, Money, PaymentMode, PaymentRequest,
    SafeTimeProvider, SearchQuery, StudentRegistration, TimeSource, Uuid,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== fee book example ===\n");

    let time = SafeTimeProvider::new(TimeSource::System);
    let school_id = Uuid::new_v4();
    let mut book = FeeBook::new(school_id, LedgerConfig::default())?;

    let grade_one = book.add_class("Grade 1")?;
    let grade_two = book.add_class("Grade 2")?;

    let tuition = book.create_fee_type(FeeTypeDefinition::new(school_id, "Tuition", Money::from_major(9_000))?)?;
    let transport = book.create_fee_type(FeeTypeDefinition::new(school_id, "Transport", Money::from_major(2_400))?)?;
    book.link_fee_type_to_classes(transport, &[grade_one, grade_two])?;

    let mut students = Vec::new();
    for (name, roll, class_id) in [
        ("Aarav", "1", grade_one),
        ("Diya", "2", grade_one),
        ("Kabir", "1", grade_two),
        ("Myra", "2", grade_two),
    ] {
        let id = book.register_student(
            StudentRegistration::new(name, roll, class_id, "2025-26").with_fee(FeeSelection::full(tuition)),
        )?;
        students.push(id);
    }

    // transport only for students who take the bus
    let sync = book.sync_class_assignments(transport, grade_one, &[students[0]])?;
    println!("grade 1 transport: {} added, {} removed", sync.added.len(), sync.removed.len());
    book.sync_class_assignments(transport, grade_two, &[students[2], students[3]])?;

    // a scholarship on one tuition assignment
    if let Some(assignment) = book.state.find_assignment(students[3], tuition).map(|a| a.id) {
        let net = book.set_discount(assignment, Money::from_major(4_500), Some("merit scholarship".to_string()))?;
        println!("Myra's tuition after scholarship: {}", net);
    }

    for (student_id, amount, mode) in [
        (students[0], 11_400, PaymentMode::BankTransfer),
        (students[1], 3_000, PaymentMode::Cash),
        (students[3], 8_000, PaymentMode::Cheque),
    ] {
        book.record_payment(PaymentRequest::new(student_id, Money::from_major(amount), mode), &time)?;
    }

    let context = book.context(&time);
    let report = book.school_report(&context, &SearchQuery::default())?;
    println!("\n{:<10} {:>12} {:>12} {:>12}", "class", "fees", "paid", "balance");
    for class in &report.classes {
        println!(
            "{:<10} {:>12} {:>12} {:>12} {}",
            class.class_name,
            class.total_fees.to_string(),
            class.total_paid.to_string(),
            class.total_balance.to_string(),
            class.treatment.marker().unwrap_or("")
        );
    }

    if let Some(class) = report.drill_down("Grade 2") {
        println!("\ngrade 2 drill-down:");
        for line in &class.students {
            println!(
                "  {:<8} {:>10} {:>10} {}",
                line.name,
                line.balance.to_string(),
                line.status.label(),
                line.treatment.marker().unwrap_or("")
            );
        }
    }

    println!("\nevents emitted: {}", book.take_events().len());
    println!("drifted totals: {}", book.audit_cached_totals().len());

    Ok(())
}
