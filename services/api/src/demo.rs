use brokerops::config::AppConfig;
use brokerops::error::AppError;
use brokerops::workflows::duplicates::{DuplicateOutcome, GeoPoint, NewListing, ReviewDecision};
use brokerops::workflows::ids::{BrokerId, ReviewerId, SlotId, VisitId};
use brokerops::workflows::incidents::{CancellationNotice, EmergencyClaim, IncidentReceipt};
use brokerops::workflows::reliability::BrokerAccount;
use chrono::{NaiveDate, NaiveDateTime};
use clap::Args;

use crate::infra::{build_engine, TrustEngine};

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Print the broker reliability report as CSV at the end of the run
    #[arg(long)]
    pub(crate) csv: bool,
}

fn at(day: u32, hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 7, day)
        .and_then(|date| date.and_hms_opt(hour, 0, 0))
        .unwrap_or_default()
}

fn skyline(broker: u64, image: &str) -> NewListing {
    NewListing {
        broker_id: BrokerId(broker),
        title: "2BHK in Skyline Towers".to_string(),
        city: "Pune".to_string(),
        asset_type: "Apartment".to_string(),
        configuration: "2BHK".to_string(),
        area_value: Some(1150.0),
        price: Some(8_500_000.0),
        location_text: "Baner Road near Sakal Nagar".to_string(),
        geo: Some(GeoPoint {
            latitude: 18.5590,
            longitude: 73.7868,
        }),
        image_url: Some(image.to_string()),
    }
}

fn late_cancellation(
    visit: u64,
    broker: u64,
    raised_at: NaiveDateTime,
    emergency: Option<&str>,
) -> CancellationNotice {
    CancellationNotice {
        visit_id: VisitId(visit),
        slot_id: SlotId(visit),
        broker_id: BrokerId(broker),
        raised_at,
        within_24h: true,
        was_booked: true,
        emergency: emergency.map(|reason| EmergencyClaim {
            reason: reason.to_string(),
            details: String::new(),
        }),
    }
}

fn opened_incident(receipt: Option<IncidentReceipt>) -> Result<IncidentReceipt, AppError> {
    receipt.ok_or_else(|| AppError::Workflow("cancellation did not open an incident".into()))
}

fn print_strike(step: u32, receipt: &IncidentReceipt) {
    match &receipt.flag {
        Some(flag) => println!(
            "strike {step}: {} (flag level {})",
            receipt.incident.status.label(),
            flag.level
        ),
        None => println!("strike {step}: {}", receipt.incident.status.label()),
    }
}

/// Walk the duplicate, incident, and reliability workflows end to end against
/// the in-memory stores, narrating each step.
pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let engine = build_engine(&config.trust);
    seed_roster(&engine);

    println!("== duplicate detection ==");
    let (_, outcome) = engine.workflow.register_listing(
        skyline(1, "https://img.example.com/photos/tower-a-12.jpg"),
        at(1, 9),
    )?;
    println!("first listing: {outcome:?}");

    let (_, outcome) = engine.workflow.register_listing(
        skyline(2, "https://img.example.com/photos/tower-a-12.jpg"),
        at(2, 11),
    )?;
    println!("relisting: {outcome:?}");

    if let DuplicateOutcome::QueuedForReview { ticket_id, .. } = outcome {
        let ticket = engine.workflow.resolve_ticket(
            ticket_id,
            ReviewerId(21),
            ReviewDecision::KeepBackup,
            Some("same unit listed twice".to_string()),
            at(2, 15),
        )?;
        println!(
            "review verdict: ticket {} -> {}",
            ticket.id.0,
            ticket.decision.map(ReviewDecision::label).unwrap_or("pending")
        );
    }

    println!();
    println!("== cancellation incidents ==");

    // Strike one: no emergency claimed.
    let receipt = opened_incident(
        engine
            .desk
            .report_cancellation(late_cancellation(101, 3, at(3, 10), None))?,
    )?;
    print_strike(1, &receipt);

    // Strike two: emergency claim rejected by the RM.
    let receipt = opened_incident(engine.desk.report_cancellation(late_cancellation(
        102,
        3,
        at(4, 10),
        Some("Vehicle breakdown"),
    ))?)?;
    let reviewed = engine.desk.review_by_rm(
        receipt.incident.id,
        ReviewerId(21),
        false,
        Some("no supporting proof".to_string()),
        at(4, 16),
    )?;
    print_strike(2, &reviewed);

    // Strike three: claim ignored past its SLA, escalated by the sweep, then
    // rejected by the SRM.
    let receipt = opened_incident(engine.desk.report_cancellation(late_cancellation(
        103,
        3,
        at(5, 10),
        Some("Family emergency"),
    ))?)?;
    let sweep_report = engine.sweep.run(at(6, 9));
    println!(
        "sweep: {} escalated, {} flags decayed",
        sweep_report.incidents_escalated, sweep_report.flags_decayed
    );
    let reviewed = engine.desk.review_by_srm(
        receipt.incident.id,
        ReviewerId(31),
        false,
        Some("pattern of late cancellations".to_string()),
        at(6, 12),
    )?;
    print_strike(3, &reviewed);

    println!();
    println!("== broker reliability ==");
    for row in engine.reporter.broker_report()? {
        println!(
            "{} ({}): incidents={} open={} active_flags={} penalties={} active={}",
            row.broker_name,
            row.city,
            row.late_cancel_incidents,
            row.open_reviews,
            row.active_flags,
            row.penalties,
            row.active
        );
    }

    if args.csv {
        println!();
        print!("{}", engine.reporter.broker_report_csv()?);
    }

    Ok(())
}

fn seed_roster(engine: &TrustEngine) {
    for (id, name) in [
        (1, "Asha Kulkarni"),
        (2, "Rohit Deshmukh"),
        (3, "Vikram Shinde"),
    ] {
        engine.accounts.upsert(BrokerAccount {
            id: BrokerId(id),
            name: name.to_string(),
            city: "Pune".to_string(),
            active: true,
        });
    }
}
