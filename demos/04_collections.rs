/// collections - payments received per period and per mode
use chrono::{Duration, NaiveDate, TimeZone, Utc};
use school_fees_rs::{
    CollectionPeriod, FeeBook, LedgerConfig, Money, PaymentMode, PaymentRequest, SafeTimeProvider,
    StudentRegistration, TimeSource, Uuid,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== collections example ===\n");

    let time = SafeTimeProvider::new(TimeSource::Test(Utc.with_ymd_and_hms(2025, 6, 2, 10, 0, 0).unwrap()));
    let controller = time.test_control().unwrap();

    let mut book = FeeBook::new(Uuid::new_v4(), LedgerConfig::default())?;
    let grade_three = book.add_class("Grade 3")?;
    let grade_five = book.add_class("Grade 5")?;
    let tara = book.register_student(StudentRegistration::new("Tara", "3", grade_three, "2025-26"))?;
    let yash = book.register_student(StudentRegistration::new("Yash", "8", grade_five, "2025-26"))?;

    // a few weeks of counter collections
    let schedule = [
        (tara, 2_000, PaymentMode::Cash),
        (yash, 4_500, PaymentMode::Upi),
        (tara, 1_000, PaymentMode::Upi),
        (yash, 3_000, PaymentMode::Cheque),
        (tara, 750, PaymentMode::Cash),
    ];
    for (student_id, amount, mode) in schedule {
        book.record_payment(PaymentRequest::new(student_id, Money::from_major(amount), mode), &time)?;
        controller.advance(Duration::days(5));
    }

    let june_4 = NaiveDate::from_ymd_opt(2025, 6, 4).ok_or("bad date")?;
    let periods = [
        CollectionPeriod::Daily { date: june_4 },
        CollectionPeriod::Weekly { date: june_4 },
        CollectionPeriod::Monthly { year: 2025, month: 6 },
        CollectionPeriod::quarter_of(june_4),
        CollectionPeriod::Yearly { year: 2025 },
    ];

    for period in periods {
        let report = book.collections(period, None)?;
        println!(
            "{} to {}: {} payments, {} collected",
            report.range.start,
            report.range.end,
            report.payment_count(),
            report.total_collected
        );
        for (mode, total) in &report.by_mode {
            println!("    {:<14} {}", mode.label(), total);
        }
    }

    let grade_five_june = book.collections(CollectionPeriod::Monthly { year: 2025, month: 6 }, Some(grade_five))?;
    println!("\ngrade 5 in june:\n{}", grade_five_june.to_json_pretty()?);

    Ok(())
}
