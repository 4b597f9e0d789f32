/// json rows - load store rows, audit cached totals, export the ledger
use school_fees_rs::{FeeBook, LedgerConfig, SafeTimeProvider, SearchQuery, TimeSource, Uuid};
use serde_json::json;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("school_fees_rs=debug")))
        .init();

    let school_id = Uuid::new_v4();
    let class_id = Uuid::new_v4();
    let tuition = Uuid::new_v4();
    let library = Uuid::new_v4();
    let (meera, rohan) = (Uuid::new_v4(), Uuid::new_v4());

    // rows as the hosted store returns them
    let rows = json!({
        "classes": [{ "id": class_id, "school_id": school_id, "name": "Grade 8" }],
        "fee_types": [
            { "id": tuition, "school_id": school_id, "name": "Tuition", "default_amount": 15000.0 },
            { "id": library, "school_id": school_id, "name": "Library", "default_amount": 500.0,
              "applicable_from": "2025-13-01" }
        ],
        "students": [
            { "id": meera, "school_id": school_id, "name": "Meera", "roll_no": "5",
              "class_id": class_id, "academic_year": "2025-26", "total_fees": 15500.0 },
            { "id": rohan, "school_id": school_id, "name": "Rohan", "roll_no": "9",
              "class_id": class_id, "academic_year": "2025-26", "total_fees": 15000.0 }
        ],
        "student_fee_types": [
            { "id": 1, "school_id": school_id, "student_id": meera, "fee_type_id": tuition,
              "assigned_amount": 15000.0, "discount": 0.0 },
            { "id": 2, "school_id": school_id, "student_id": meera, "fee_type_id": library,
              "assigned_amount": null, "discount": null },
            { "id": 3, "school_id": school_id, "student_id": rohan, "fee_type_id": tuition,
              "assigned_amount": 15000.0, "discount": 2500.0, "discount_description": "staff ward" }
        ],
        "payments": [
            { "id": Uuid::new_v4(), "school_id": school_id, "student_id": meera, "amount_paid": 7500.0,
              "date": "2025-06-10T11:20:00Z", "mode_of_payment": "bank_transfer", "receipt_number": "RCPT-0091" },
            { "id": Uuid::new_v4(), "school_id": school_id, "student_id": rohan, "amount_paid": 12500.0,
              "date": "2025-06-11", "mode_of_payment": "Demand Draft", "receipt_number": null }
        ]
    });

    let mut book = FeeBook::from_json(school_id, &rows.to_string(), LedgerConfig::default())?;

    // rohan's cached total predates his discount
    for drift in book.audit_cached_totals() {
        println!("{}: cached {} but assignments sum to {}", drift.name, drift.cached, drift.computed);
        book.recompute_total_fees(drift.student_id)?;
    }

    let time = SafeTimeProvider::new(TimeSource::System);
    let context = book.context(&time);
    let export = book.export_rows(&context, &SearchQuery::default())?;
    for record in export.records() {
        println!("{}", record.join(" | "));
    }

    println!("\n{}", book.dashboard(&context)?.to_json_pretty()?);

    Ok(())
}
