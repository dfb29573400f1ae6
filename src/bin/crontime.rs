use std::io::{self, BufRead};
use std::str::FromStr;

use anyhow::{Context, Result, anyhow};
use chrono::TimeZone;
use clap::Parser;
use crontime::Schedule;
use rand::Rng;

/// Print the next instant matching a crontab(5) schedule.
#[derive(Parser)]
#[command(version, about)]
struct Args {
    /// Jitter the schedule by up to N seconds
    #[arg(
        short,
        long,
        default_value_t = 300,
        value_parser = clap::value_parser!(i64).range(0..=86_400)
    )]
    jitter: i64,

    /// Reference time as Unix epoch seconds (eg 1636919408)
    time: i64,

    /// Schedule as a crontab(5) expression (eg "*/5 * * * *"); one schedule
    /// per line is read from standard input when omitted
    schedule: Option<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // The ambient zone: TZ resolved through the IANA database, the system
    // zone otherwise.
    match std::env::var("TZ") {
        Ok(name) => {
            let tz = chrono_tz::Tz::from_str(&name)
                .map_err(|err| anyhow!("unknown timezone {name}: {err}"))?;
            run(&args, &tz)
        }
        Err(_) => run(&args, &chrono::Local),
    }
}

fn run<TZ: TimeZone>(args: &Args, tz: &TZ) -> Result<()> {
    let mut rng = rand::thread_rng();

    if let Some(schedule) = &args.schedule {
        let scheduled = evaluate(tz, args, schedule, &mut rng)
            .with_context(|| format!("unable to schedule {schedule}"))?;
        println!("{scheduled}");
        return Ok(());
    }

    for (index, line) in io::stdin().lock().lines().enumerate() {
        let number = index + 1;
        let line = line.with_context(|| format!("unable to read line {number}"))?;
        let scheduled = evaluate(tz, args, &line, &mut rng)
            .with_context(|| format!("unable to schedule {line} at line {number}"))?;
        println!("{scheduled}");
    }

    Ok(())
}

fn evaluate<TZ: TimeZone, R: Rng>(tz: &TZ, args: &Args, expr: &str, rng: &mut R) -> Result<i64> {
    let schedule = Schedule::parse(expr)?;
    Ok(schedule.next_from_jittered(tz, args.time, args.jitter, rng)?)
}
