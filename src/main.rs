use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::Connection;
use std::env;
use std::path::Path;

use parking_system::{
    db, insert_slots, load_slots_csv, open_database, ParkRequest, ParkingConfig,
    ParkingService, SizeTier, UnparkRequest,
};

const USAGE: &str = "Usage: parking-system <command>

Commands:
  init                                      Create the database
  import-slots <csv>                        Add slots from a layout CSV
  add-vehicle <size>                        Register a vehicle (small|medium|large)
  park <vehicle_id> <entry_point> [time]    Park a vehicle (time: RFC 3339, default now)
  unpark <slot_id> [time]                   Unpark and bill a slot
  slots                                     List parking slots
  history <vehicle_id>                      List a vehicle's transactions";

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let Some(command) = args.get(1) else {
        println!("{}", USAGE);
        return Ok(());
    };

    let config = ParkingConfig::load()?;
    let service = ParkingService::new(&config);
    let mut conn = open_database(&config.database_path)?;

    match command.as_str() {
        "init" => run_init(&conn, &service, &config),
        "import-slots" => run_import_slots(&conn, &service, arg(&args, 2, "csv path")?),
        "add-vehicle" => run_add_vehicle(&conn, &service, arg(&args, 2, "size")?),
        "park" => run_park(&mut conn, &service, &args),
        "unpark" => run_unpark(&mut conn, &service, &args),
        "slots" => run_slots(&conn, &service),
        "history" => run_history(&conn, &service, arg(&args, 2, "vehicle id")?),
        "help" | "--help" | "-h" => {
            println!("{}", USAGE);
            Ok(())
        }
        other => {
            eprintln!("❌ Unknown command: {}\n", other);
            eprintln!("{}", USAGE);
            std::process::exit(2);
        }
    }
}

fn arg<'a>(args: &'a [String], idx: usize, name: &str) -> Result<&'a str> {
    match args.get(idx) {
        Some(value) => Ok(value.as_str()),
        None => bail!("Missing argument: <{}>\n\n{}", name, USAGE),
    }
}

/// Parse an RFC 3339 timestamp and normalise it to UTC
fn parse_time(value: Option<&String>) -> Result<Option<DateTime<Utc>>> {
    value
        .map(|s| {
            DateTime::parse_from_rfc3339(s)
                .map(|dt| dt.with_timezone(&Utc))
                .with_context(|| format!("Invalid timestamp: {}", s))
        })
        .transpose()
}

fn run_init(conn: &Connection, service: &ParkingService, config: &ParkingConfig) -> Result<()> {
    println!("🔧 Database ready: {:?}", config.database_path);
    println!("✓ Entry points: {}", service.entry_points());
    println!("✓ Available slots: {}", db::count_available_slots(conn)?);

    let rates = service.billing().rates();
    println!("\n💵 Rate card");
    println!(
        "   Flat rate:  {:.2} (first {} hours)",
        rates.flat_rate, rates.flat_hours
    );
    for (tier, rate) in &rates.hourly {
        println!("   {:<7}     {:.2} / hour", tier, rate);
    }
    println!("   Daily rate: {:.2}", rates.daily_rate);
    println!("   Returnee window: {} min", rates.returnee_window_minutes);
    Ok(())
}

fn run_import_slots(conn: &Connection, service: &ParkingService, csv_path: &str) -> Result<()> {
    println!("📂 Loading slot layout...");
    let specs = load_slots_csv(Path::new(csv_path), service.entry_points())?;
    println!("✓ Loaded {} slots from CSV", specs.len());

    let inserted = insert_slots(conn, &specs)?;
    println!("✓ Inserted {} slots", inserted);
    println!("✓ Available slots: {}", db::count_available_slots(conn)?);
    Ok(())
}

fn run_add_vehicle(conn: &Connection, service: &ParkingService, size: &str) -> Result<()> {
    let size: SizeTier = size.parse()?;
    let vehicle = service.register_vehicle(conn, size)?;
    println!("🚗 Registered {} vehicle #{}", vehicle.size, vehicle.id);
    Ok(())
}

fn run_park(conn: &mut Connection, service: &ParkingService, args: &[String]) -> Result<()> {
    let request = ParkRequest {
        vehicle_id: arg(args, 2, "vehicle id")?.parse().context("Invalid vehicle id")?,
        entry_point: arg(args, 3, "entry point")?.parse().context("Invalid entry point")?,
        entry_time: parse_time(args.get(4))?,
    };

    let outcome = service.park(conn, &request)?;
    println!(
        "🅿️  Vehicle #{} parked in slot #{} ({}) at {}",
        request.vehicle_id, outcome.slot.id, outcome.slot.size, outcome.entry_time
    );
    println!("✓ Transaction #{}", outcome.transaction_id);
    Ok(())
}

fn run_unpark(conn: &mut Connection, service: &ParkingService, args: &[String]) -> Result<()> {
    let request = UnparkRequest {
        slot_id: arg(args, 2, "slot id")?.parse().context("Invalid slot id")?,
        vehicle_id: None,
        exit_time: parse_time(args.get(3))?,
    };

    let outcome = service.unpark(conn, &request)?;
    let charge = &outcome.charge;

    println!(
        "💰 Vehicle #{} left slot #{} at {}",
        outcome.vehicle_id, outcome.slot.id, outcome.exit_time
    );
    println!("   Flat rate:          {:>10.2}", charge.flat_rate);
    println!(
        "   Excess hours: {:>3} {:>10.2}  (@ {:.2})",
        charge.excess_hours, charge.excess_hour_amount, charge.hour_rate
    );
    println!(
        "   Excess days:  {:>3} {:>10.2}  (@ {:.2})",
        charge.excess_days, charge.excess_day_amount, charge.day_rate
    );
    if charge.returnee {
        println!("   Previous payment:   {:>10.2}", -charge.previous_payment);
    }
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("   Total:              {:>10.2}", charge.amount);
    Ok(())
}

fn run_slots(conn: &Connection, service: &ParkingService) -> Result<()> {
    let slots = service.slots(conn)?;
    println!("📊 {} parking slots\n", slots.len());

    for slot in slots {
        let status = match slot.vehicle_id {
            Some(vehicle_id) => format!("occupied by #{}", vehicle_id),
            None => "available".to_string(),
        };
        println!(
            "  #{:<4} {:<7} {:<20} distances {:?}",
            slot.id, slot.size, status, slot.distances
        );
    }
    Ok(())
}

fn run_history(conn: &Connection, service: &ParkingService, vehicle_id: &str) -> Result<()> {
    let vehicle_id: i64 = vehicle_id.parse().context("Invalid vehicle id")?;
    let transactions = service.history(conn, vehicle_id)?;
    println!("🧾 {} transactions for vehicle #{}\n", transactions.len(), vehicle_id);

    for tx in transactions {
        let entry = tx.entry_time.map(|t| t.to_rfc3339()).unwrap_or_else(|| "-".to_string());
        let exit = tx.exit_time.map(|t| t.to_rfc3339()).unwrap_or_else(|| "parked".to_string());
        let amount = tx.amount.map(|a| format!("{:.2}", a)).unwrap_or_else(|| "-".to_string());
        println!(
            "  #{:<5} slot #{:<4} {} → {}  {}",
            tx.id, tx.slot_id, entry, exit, amount
        );
    }
    Ok(())
}
