use chrono::{Local, NaiveTime, Weekday};
use clap::{Parser, Subcommand};
use med_reminder_lib::alarm::spawn_dispatcher;
use med_reminder_lib::{App, ScheduleType};
use std::sync::mpsc::channel;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "med-reminder", version, about = "A lightweight medication reminder scheduler")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Add a new reminder
    Add {
        /// Medication name
        name: String,
        /// Dosage label, e.g. "2 pills"
        #[arg(short, long, default_value = "")]
        dosage: String,
        /// Time of day in 24h HH:MM
        #[arg(short, long)]
        time: String,
        /// Comma-separated weekdays (e.g. mon,wed,fri); omit for every day
        #[arg(long, value_delimiter = ',')]
        days: Vec<String>,
    },
    /// List all reminders
    List,
    /// Enable or disable a reminder
    Toggle { id: i64 },
    /// Toggle today's completion for a reminder
    Done { id: i64 },
    /// Delete a reminder
    Delete { id: i64 },
    /// Run the alarm loop in the foreground
    Run,
}

fn main() {
    env_logger::init();

    if let Err(e) = run(Cli::parse()) {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), String> {
    let mut app = App::new()?;

    match cli.command {
        Command::Add {
            name,
            dosage,
            time,
            days,
        } => {
            let time_of_day = NaiveTime::parse_from_str(&time, "%H:%M")
                .map_err(|e| format!("Invalid time '{}': {}", time, e))?;
            let time = Local::now().date_naive().and_time(time_of_day);

            let days: Vec<Weekday> = days
                .iter()
                .map(|d| {
                    d.parse::<Weekday>()
                        .map_err(|_| format!("Invalid weekday '{}'", d))
                })
                .collect::<Result<_, _>>()?;
            let schedule_type = if days.is_empty() {
                ScheduleType::Daily
            } else {
                ScheduleType::Custom
            };

            let reminder = app.add_reminder(&name, &dosage, time, schedule_type, days)?;
            println!(
                "Added reminder {}: {} at {} on {}",
                reminder.id,
                reminder.name,
                reminder.time.format("%H:%M"),
                format_days(&reminder.days)
            );
        }
        Command::List => {
            let today = Local::now().date_naive();
            if app.reminders().is_empty() {
                println!("No reminders.");
            }
            for r in app.reminders() {
                println!(
                    "{:>4}  {:<20} {:<10} {}  {:<21} {:<8} {}",
                    r.id,
                    r.name,
                    r.dosage,
                    r.time.format("%H:%M"),
                    format_days(&r.days),
                    if r.enabled { "enabled" } else { "disabled" },
                    if r.is_completed_on(today) { "taken today" } else { "" },
                );
            }
        }
        Command::Toggle { id } => {
            let reminder = app.toggle_enabled(id)?;
            println!(
                "Reminder {} is now {}",
                id,
                if reminder.enabled { "enabled" } else { "disabled" }
            );
        }
        Command::Done { id } => {
            let today = Local::now().date_naive();
            let reminder = app.toggle_completion(id, None)?;
            println!(
                "Reminder {} marked {} for {}",
                id,
                if reminder.is_completed_on(today) { "taken" } else { "not taken" },
                today
            );
        }
        Command::Delete { id } => {
            app.delete_reminder(id)?;
            println!("Deleted reminder {}", id);
        }
        Command::Run => run_loop(app)?,
    }

    Ok(())
}

/// Foreground alarm loop: re-arms every enabled reminder, then services
/// fire events until interrupted.
fn run_loop(mut app: App) -> Result<(), String> {
    app.schedule_all();
    log::info!("alarm loop running with {} reminders", app.reminders().len());

    let (tx, rx) = channel();
    let _dispatcher = spawn_dispatcher(
        app.alarms(),
        Duration::from_secs(med_reminder_lib::config::DISPATCH_TICK_SECS),
        tx,
    );

    for fired in rx {
        // Presentation is a log line; a notification frontend would hook in here.
        log::info!("Time to take {} (reminder {})", fired.name, fired.id);
        match app.handle_fired(fired.id) {
            Ok(Some(next)) => log::info!("reminder {} re-armed for {}", fired.id, next),
            Ok(None) => log::info!("reminder {} not re-armed", fired.id),
            Err(e) => log::error!("failed to re-arm reminder {}: {}", fired.id, e),
        }
    }

    Ok(())
}

fn format_days(days: &[Weekday]) -> String {
    if days.len() == 7 {
        return "every day".to_string();
    }
    days.iter()
        .map(|d| d.to_string())
        .collect::<Vec<_>>()
        .join(",")
}
