/// time control - watch scheduled fees become due as the clock moves
use chrono::{Duration, TimeZone, Utc};
use school_fees_rs::{
    CalendarDate, FeeBook, FeeScope, FeeSelection, FeeTypeDefinition, LedgerConfig, Money, PaymentMode,
    PaymentRequest, SafeTimeProvider, StudentRegistration, TimeSource, Uuid,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== time control example ===\n");

    let time = SafeTimeProvider::new(TimeSource::Test(Utc.with_ymd_and_hms(2025, 3, 25, 8, 0, 0).unwrap()));
    let controller = time.test_control().unwrap();

    let school_id = Uuid::new_v4();
    let mut book = FeeBook::new(school_id, LedgerConfig::currently_due())?;
    let grade_six = book.add_class("Grade 6")?;

    let term_one = book.create_fee_type(
        FeeTypeDefinition::builder(school_id)
            .name("Term 1")
            .base_amount(Money::from_major(6_000))
            .scheduled_on(CalendarDate::from_ymd(2025, 4, 1))
            .build()?,
    )?;
    let term_two = book.create_fee_type(
        FeeTypeDefinition::builder(school_id)
            .name("Term 2")
            .base_amount(Money::from_major(6_000))
            .scheduled_on(CalendarDate::from_ymd(2025, 10, 1))
            .build()?,
    )?;
    let summer_camp = book.create_fee_type(
        FeeTypeDefinition::builder(school_id)
            .name("Summer Camp")
            .base_amount(Money::from_major(1_500))
            .window(CalendarDate::from_ymd(2025, 5, 1), CalendarDate::from_ymd(2025, 5, 31))
            .build()?,
    )?;

    let student_id = book.register_student(
        StudentRegistration::new("Ishaan", "21", grade_six, "2025-26")
            .with_fee(FeeSelection::full(term_one))
            .with_fee(FeeSelection::full(term_two))
            .with_fee(FeeSelection::full(summer_camp)),
    )?;

    let report = |book: &FeeBook, time: &SafeTimeProvider| -> Result<(), Box<dyn std::error::Error>> {
        let context = book.context(time);
        let summary = book.student_summary(student_id, &context)?;
        println!(
            "{}  assigned {:>9}  due {:>9}  paid {:>9}  status {}",
            context.today,
            summary.fees(FeeScope::Assigned).to_string(),
            summary.fees(FeeScope::CurrentlyDue).to_string(),
            summary.paid().to_string(),
            summary.status(context.scope, context.tolerance).label()
        );
        for line in summary.lines.iter().filter(|l| !l.is_due()) {
            println!("    not due: {} ({:?})", line.name, line.applicability);
        }
        Ok(())
    };

    report(&book, &time)?;

    controller.advance(Duration::days(7));
    report(&book, &time)?;

    book.record_payment(PaymentRequest::new(student_id, Money::from_major(6_000), PaymentMode::OnlinePortal), &time)?;
    report(&book, &time)?;

    controller.advance(Duration::days(40));
    report(&book, &time)?;

    controller.advance(Duration::days(60));
    report(&book, &time)?;

    controller.advance(Duration::days(120));
    report(&book, &time)?;

    Ok(())
}
