/// quick start - register a student, take a payment, read the balance
use school_fees_rs::{
    FeeBook, FeeSelection, FeeTypeDefinition, LedgerConfig, Money, PaymentMode, PaymentRequest,
    SafeTimeProvider, StudentRegistration, TimeSource, Uuid,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let time = SafeTimeProvider::new(TimeSource::System);
    let school_id = Uuid::new_v4();
    let mut book = FeeBook::new(school_id, LedgerConfig::default())?;

    // one class, one fee
    let grade_four = book.add_class("Grade 4")?;
    let tuition = book.create_fee_type(FeeTypeDefinition::new(
        school_id,
        "Tuition",
        Money::from_major(12_000),
    )?)?;

    // register with a sibling discount
    let student_id = book.register_student(
        StudentRegistration::new("Anika Sharma", "14", grade_four, "2025-26").with_fee(
            FeeSelection::discounted(tuition, Money::from_major(1_000), "sibling discount"),
        ),
    )?;

    // first instalment
    book.record_payment(
        PaymentRequest::new(student_id, Money::from_major(5_000), PaymentMode::Upi),
        &time,
    )?;

    let context = book.context(&time);
    let summary = book.student_summary(student_id, &context)?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    println!(
        "status: {}",
        summary.status(context.scope, context.tolerance).label()
    );

    Ok(())
}
