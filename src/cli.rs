//! Command-line surface of the `wxarchive` binary.

use anyhow::{bail, Context};
use clap::Parser;
use log::info;
use std::path::PathBuf;
use wxarchive::{TimeWindow, WxArchive, DEFAULT_DAY_OFFSET, DEFAULT_OUTPUT};

#[derive(Debug, Parser)]
#[command(
    name = "wxarchive",
    version,
    about = "Daily summaries and charts from a weather station's SQLite archive"
)]
pub struct Cli {
    /// Archive database file (e.g. weewx.sdb)
    #[arg(short, long, alias = "inputfile")]
    pub input: PathBuf,

    /// Start of the plotted range in local time, YYYY-MM-DDTHH:MM:SS
    #[arg(
        short,
        long,
        visible_alias = "start-time",
        required_unless_present = "list_variables"
    )]
    pub start: Option<String>,

    /// End of the plotted range in local time, YYYY-MM-DDTHH:MM:SS
    #[arg(
        short,
        long,
        visible_alias = "end-time",
        required_unless_present = "list_variables"
    )]
    pub end: Option<String>,

    /// Variables drawn against the left axis, comma separated (e.g. OutTemp,Dewpoint)
    #[arg(
        short,
        long,
        value_delimiter = ',',
        required_unless_present = "list_variables"
    )]
    pub plot_var: Vec<String>,

    /// Variables drawn against the right axis, comma separated
    #[arg(long, value_delimiter = ',')]
    pub secondary_var: Vec<String>,

    /// Fraction of a day past 00 UTC at which a day starts (0.25 = 06 UTC)
    #[arg(short, long, default_value_t = DEFAULT_DAY_OFFSET)]
    pub gmt_offset: f64,

    /// Plot the whole requested range instead of only the range with data
    #[arg(long)]
    pub view_request_time: bool,

    /// Chart file; a .svg extension writes SVG, anything else a bitmap
    #[arg(short, long, default_value = DEFAULT_OUTPUT)]
    pub output: PathBuf,

    /// Also write the daily table to this CSV file
    #[arg(long)]
    pub daily_csv: Option<PathBuf>,

    /// Print every raw and daily variable with its unit, then exit
    #[arg(long)]
    pub list_variables: bool,

    /// Log timing and selection details
    #[arg(short, long)]
    pub verbose: bool,
}

pub fn run(cli: Cli) -> anyhow::Result<()> {
    let window = if cli.list_variables {
        None
    } else {
        let (Some(start), Some(end)) = (&cli.start, &cli.end) else {
            bail!("Both --start and --end are required");
        };
        Some(TimeWindow::parse_local(start, end)?)
    };

    let mut archive = WxArchive::open_path(&cli.input, cli.gmt_offset)
        .with_context(|| format!("Failed to load archive {:?}", cli.input))?;

    if let Some(path) = &cli.daily_csv {
        archive
            .write_daily_csv(path)
            .with_context(|| format!("Failed to write daily table {:?}", path))?;
    }

    match window {
        None => {
            println!("Raw variables:");
            print!("{}", archive.raw().variables());
            println!();
            println!("Daily variables:");
            print!("{}", archive.daily().variables());
        }
        Some(window) => {
            let report = archive
                .plot(window)
                .primary(cli.plot_var)
                .secondary(cli.secondary_var)
                .clamp(!cli.view_request_time)
                .output(cli.output)
                .call()?;
            info!(
                "Plotted {} to {:?}",
                report.drawn.join(", "),
                report.output
            );
        }
    }

    archive.timings().log();
    Ok(())
}
