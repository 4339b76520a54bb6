use rusqlite::{params, Connection};
use std::path::Path;
use std::process::Command;
use wxarchive::{SelectError, SeriesOrigin, TimeWindow, WxArchive, WxArchiveError, ARCHIVE_FIELDS};

// 2017-07-04T00:00:00Z
const JULY_4: i64 = 1_499_126_400;
const HOUR: i64 = 3_600;

fn field_position(name: &str) -> usize {
    ARCHIVE_FIELDS
        .iter()
        .position(|(field, _)| *field == name)
        .unwrap()
}

/// Three days of hourly rows: temperature follows the UTC hour, 0.01 in of rain per row.
fn write_archive(path: &Path) {
    let conn = Connection::open(path).unwrap();
    let columns: Vec<String> = (0..ARCHIVE_FIELDS.len())
        .map(|i| match i {
            0 => "dateTime INTEGER NOT NULL PRIMARY KEY".to_string(),
            _ => format!("c{i} REAL"),
        })
        .collect();
    conn.execute_batch(&format!("CREATE TABLE archive ({});", columns.join(", ")))
        .unwrap();

    let sql = format!(
        "INSERT INTO archive (dateTime, c{}, c{}) VALUES (?1, ?2, ?3)",
        field_position("OutTemp"),
        field_position("Rainfall")
    );
    let mut stmt = conn.prepare(&sql).unwrap();
    for hour in 0..72 {
        let temp = 60.0 + (hour % 24) as f64;
        stmt.execute(params![JULY_4 + hour * HOUR, temp, 0.01])
            .unwrap();
    }
}

fn archive_in(dir: &tempfile::TempDir) -> String {
    let path = dir.path().join("weewx.sdb");
    write_archive(&path);
    path.to_str().unwrap().to_string()
}

#[test]
fn test_archive_is_bucketed_at_six_utc() {
    let dir = tempfile::tempdir().unwrap();
    let archive = WxArchive::open(&archive_in(&dir)).call().unwrap();

    let daily = archive.daily();
    assert_eq!(daily.len(), 3);
    assert_eq!(daily.lookup("MaxOutTemp"), Some(&[83.0, 83.0, 83.0][..]));
    assert_eq!(daily.lookup("MinOutTemp"), Some(&[60.0, 60.0, 66.0][..]));

    // 30, 24 and 18 rows per bucket.
    let totals = daily.rain_totals();
    for (total, expected) in totals.iter().zip([0.30, 0.24, 0.18]) {
        assert!((total - expected).abs() < 1e-9, "{total} != {expected}");
    }

    let cumulative = archive.raw().series("CumulativeRain").unwrap();
    assert_eq!(cumulative.len(), 72);
    assert!((cumulative[71] - 0.72).abs() < 1e-9);
    assert!(daily.lookup("MaxEmpty1").unwrap().iter().all(|v| v.is_nan()));
}

#[test]
fn test_midnight_offset_gives_calendar_days() {
    let dir = tempfile::tempdir().unwrap();
    let archive = WxArchive::open(&archive_in(&dir))
        .day_offset(0.0)
        .call()
        .unwrap();

    let daily = archive.daily();
    assert_eq!(daily.len(), 3);
    assert_eq!(daily.lookup("MinOutTemp"), Some(&[60.0, 60.0, 60.0][..]));
    assert_eq!(daily.rain_totals().len(), 3);
}

#[test]
fn test_selection_from_both_stores() {
    let dir = tempfile::tempdir().unwrap();
    let archive = WxArchive::open(&archive_in(&dir)).call().unwrap();
    let selector = archive.selector();
    let window = TimeWindow::new((JULY_4 + 24 * HOUR) as f64, (JULY_4 + 48 * HOUR) as f64);

    let raw = selector
        .select_for_plot("OutTemp")
        .window(window)
        .call()
        .unwrap();
    assert_eq!(raw.origin, SeriesOrigin::Raw);
    assert_eq!(raw.len(), 25);

    // Only the second bucket starts (at 06 UTC on the 5th) inside the window.
    let daily = selector
        .select_for_plot("Rain4Day")
        .window(window)
        .call()
        .unwrap();
    assert_eq!(daily.origin, SeriesOrigin::Daily);
    assert_eq!(daily.timestamps, vec![(JULY_4 + 30 * HOUR) as f64]);

    let missing = selector
        .select_for_plot("MaxBogus")
        .window(window)
        .call();
    assert!(matches!(missing, Err(SelectError::NotFound(_))));
}

#[test]
fn test_daily_csv_export() {
    let dir = tempfile::tempdir().unwrap();
    let mut archive = WxArchive::open(&archive_in(&dir)).call().unwrap();
    let csv = dir.path().join("daily.csv");

    archive.write_daily_csv(&csv).unwrap();

    let written = std::fs::read_to_string(&csv).unwrap();
    let header = written.lines().next().unwrap();
    assert!(header.starts_with("ADDailyDate,date,Rain4Day,MaxEpochtime,MinEpochtime"));
    assert_eq!(header.split(',').count(), 3 + 2 * ARCHIVE_FIELDS.len());
    assert_eq!(written.lines().count(), 4);
    assert!(written.contains("2017-07-04"));
}

#[test]
fn test_plot_skips_unknown_variables_and_draws_the_rest() {
    let dir = tempfile::tempdir().unwrap();
    let mut archive = WxArchive::open(&archive_in(&dir)).call().unwrap();
    let chart = dir.path().join("chart.svg");
    let window = TimeWindow::new(JULY_4 as f64, (JULY_4 + 48 * HOUR) as f64);

    let report = archive
        .plot(window)
        .primary(vec!["OutTemp".to_string(), "Bogus".to_string()])
        .secondary(vec!["Rain4Day".to_string()])
        .output(chart.clone())
        .call()
        .unwrap();

    assert_eq!(report.drawn, ["OutTemp", "Rain4Day"]);
    assert_eq!(report.skipped, ["Bogus"]);
    assert_eq!(report.window, window);
    assert_eq!(report.output, chart);
    assert!(archive.timings().chart.is_some());
    assert!(std::fs::read_to_string(&chart).unwrap().contains("<svg"));
}

#[test]
fn test_missing_database_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nope.sdb");
    let result = WxArchive::open(path.to_str().unwrap()).call();
    assert!(matches!(result, Err(WxArchiveError::Archive(_))));
}

#[test]
fn test_cli_lists_variables() {
    let dir = tempfile::tempdir().unwrap();
    let output = Command::new(env!("CARGO_BIN_EXE_wxarchive"))
        .args(["--input", &archive_in(&dir), "--list-variables"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("OutTemp [°F]"));
    assert!(stdout.contains("CumulativeRain [inches]"));
    assert!(stdout.contains("MaxOutTemp [°F]"));
    assert!(stdout.contains("Rain4Day [inches]"));
}

#[test]
fn test_cli_rejects_malformed_time() {
    let dir = tempfile::tempdir().unwrap();
    let output = Command::new(env!("CARGO_BIN_EXE_wxarchive"))
        .args([
            "--input",
            &archive_in(&dir),
            "--start",
            "07/04/2017",
            "--end",
            "2017-07-05T00:00:00",
            "--plot-var",
            "OutTemp",
        ])
        .output()
        .unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("YYYY-MM-DDTHH:MM:SS"), "{stderr}");
}
