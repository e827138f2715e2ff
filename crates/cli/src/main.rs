use std::io::{self, Write};

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use clap::{Parser, Subcommand};
use relay_core::{
    classify_day, render_holidays, render_schedule, route, HolidayTable, InboundMessage, Intent,
    ScheduleTable,
};
use relay_observability::init_tracing;

#[derive(Debug, Parser)]
#[command(name = "shuttle-relay")]
#[command(about = "Preview shuttle relay replies without the WhatsApp webhook")]
struct Cli {
    #[arg(long, env = "RELAY_TIMEZONE", default_value = "Africa/Cairo")]
    timezone: String,

    /// Pretend it is this instant (RFC 3339), instead of now.
    #[arg(long, global = true)]
    at: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the schedule reply for the chosen day.
    Schedule,
    /// Print the upcoming holidays reply.
    Holidays,
    /// Show which intent a message text routes to.
    Route { text: String },
    /// Type messages and see the reply each would get.
    Chat,
}

fn main() -> Result<()> {
    init_tracing("relay_cli");
    let cli = Cli::parse();

    let timezone = cli
        .timezone
        .parse::<Tz>()
        .map_err(|_| anyhow!("unknown timezone `{}`", cli.timezone))?;
    let now = resolve_now(cli.at.as_deref(), timezone)?;

    let schedule = ScheduleTable::builtin();
    let holidays = HolidayTable::builtin().context("bundled holiday table is invalid")?;

    match cli.command {
        Command::Schedule => println!("{}", render_schedule(&now, &holidays, &schedule)),
        Command::Holidays => println!("{}", render_holidays(&now, &holidays)),
        Command::Route { text } => {
            let intent = route(&InboundMessage {
                sender_id: "cli".to_string(),
                text,
            });
            println!("{}", serde_json::to_string_pretty(&intent)?);
        }
        Command::Chat => run_chat(&now, &schedule, &holidays)?,
    }

    Ok(())
}

fn resolve_now(at: Option<&str>, timezone: Tz) -> Result<DateTime<Tz>> {
    match at {
        Some(value) => DateTime::parse_from_rfc3339(value)
            .map(|instant| instant.with_timezone(&timezone))
            .with_context(|| format!("invalid --at value `{value}`")),
        None => Ok(Utc::now().with_timezone(&timezone)),
    }
}

fn run_chat(now: &DateTime<Tz>, schedule: &ScheduleTable, holidays: &HolidayTable) -> Result<()> {
    println!(
        "Shuttle relay preview ({} day). type 'exit' to quit.",
        classify_day(now, holidays).as_code()
    );

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if io::stdin().read_line(&mut line)? == 0 {
            break;
        }

        let text = line.trim();
        if text.eq_ignore_ascii_case("exit") || text.eq_ignore_ascii_case("quit") {
            break;
        }

        if text.is_empty() {
            continue;
        }

        let intent = route(&InboundMessage {
            sender_id: "cli".to_string(),
            text: text.to_string(),
        });
        let reply = match intent {
            Intent::Shuttle => render_schedule(now, holidays, schedule),
            Intent::Holidays => render_holidays(now, holidays),
            Intent::Assistant { prompt } => format!("[forwarded to assistant] {prompt}"),
        };

        println!("\n{}\n", reply);
    }

    Ok(())
}
