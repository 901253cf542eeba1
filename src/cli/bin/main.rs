use std::env;

use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate, NaiveTime};
use clap::{crate_version, Arg, ArgAction, Command};
use dotenv::dotenv;
use http::StatusCode;
use prettytable::{row, Table};
use reqwest::Client;

use timeclock::db::TimeEntry;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let base_url: String = env::var("BASE_URL").context("BASE_URL env var must be set!")?;

    let client = Client::new();

    let matches = Command::new("timeclock")
        .version(crate_version!())
        .about("Terminal client for the timeclock daemon")
        .arg(
            Arg::new("entry")
                .short('e')
                .long("entry")
                .value_names(["date", "start", "end", "notes"])
                .value_delimiter(',')
                .num_args(3..=4)
                .help("Record a new time entry. Date may be 'today'; times are HHMM."),
        )
        .arg(
            Arg::new("list")
                .short('l')
                .long("list")
                .action(ArgAction::SetTrue)
                .help("List all recorded entries, newest day first."),
        )
        .arg(
            Arg::new("delete")
                .short('d')
                .long("delete")
                .value_name("id")
                .help("Delete the entry with the given id."),
        )
        .get_matches();

    if let Some(values) = matches.get_many::<String>("entry") {
        let values: Vec<&str> = values.map(String::as_str).collect();
        post_new_entry(&client, &base_url, &values).await?;
    }

    if matches.get_flag("list") {
        list_entries(&client, &base_url).await?;
    }

    if let Some(id) = matches.get_one::<String>("delete") {
        delete_entry(&client, &base_url, id).await?;
    }

    Ok(())
}

async fn post_new_entry(client: &Client, base_url: &str, values: &[&str]) -> Result<()> {
    let entry = TimeEntry {
        id: None,
        date: parse_entry_date(values[0])?,
        start_time: parse_entry_time(values[1])?,
        end_time: parse_entry_time(values[2])?,
        notes: values.get(3).map(|s| s.to_string()),
    };

    let res = client
        .post(format!("{}/timeentries", base_url))
        .json(&entry)
        .send()
        .await?;

    if res.status() != StatusCode::CREATED {
        bail!("failed to record entry: {}", res.status());
    }

    let stored: TimeEntry = res.json().await?;
    println!("Recorded entry {}.", stored.id.unwrap_or_default());

    Ok(())
}

async fn list_entries(client: &Client, base_url: &str) -> Result<()> {
    let res = client
        .get(format!("{}/timeentries", base_url))
        .send()
        .await?;

    if res.status() != StatusCode::OK {
        bail!("failed to fetch entries: {}", res.status());
    }

    let entries: Vec<TimeEntry> = res.json().await?;

    let mut table = Table::new();
    table.add_row(row!["Id", "Date", "Start", "End", "Notes"]);
    for entry in entries {
        table.add_row(row![
            entry.id.map(|id| id.to_string()).unwrap_or_default(),
            entry.date,
            entry.start_time,
            entry.end_time,
            entry.notes.unwrap_or_default(),
        ]);
    }
    table.printstd();

    Ok(())
}

async fn delete_entry(client: &Client, base_url: &str, id: &str) -> Result<()> {
    let id: i64 = id.parse().context("entry ids are integers")?;

    let res = client
        .delete(format!("{}/timeentries/{}", base_url, id))
        .send()
        .await?;

    match res.status() {
        StatusCode::NO_CONTENT => {
            println!("Entry {} deleted.", id);
            Ok(())
        }
        StatusCode::NOT_FOUND => bail!("no entry with id {}", id),
        status => bail!("failed to delete entry {}: {}", id, status),
    }
}

fn parse_entry_date(value: &str) -> Result<NaiveDate> {
    if value == "today" {
        return Ok(Local::now().date_naive());
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .with_context(|| format!("'{}' is not a YYYY-MM-DD date (or 'today')", value))
}

fn parse_entry_time(value: &str) -> Result<NaiveTime> {
    let time = value
        .parse::<u32>()
        .with_context(|| format!("'{}' is not an HHMM time, e.g. 0930", value))?;

    NaiveTime::from_hms_opt(time / 100, time % 100, 0)
        .with_context(|| format!("'{}' is not a valid time of day", value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_entry_time() {
        let exp = NaiveTime::from_hms_opt(9, 30, 0).unwrap();
        assert_eq!(parse_entry_time("0930").unwrap(), exp);

        let exp = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
        assert_eq!(parse_entry_time("900").unwrap(), exp);

        assert!(parse_entry_time("2530").is_err());
        assert!(parse_entry_time("nine").is_err());
    }

    #[test]
    fn test_parse_entry_date() {
        let exp = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert_eq!(parse_entry_date("2024-01-01").unwrap(), exp);

        assert!(parse_entry_date("01/01/2024").is_err());
    }
}
