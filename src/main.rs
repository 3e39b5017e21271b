// Entry point and high-level CLI flow.
//
// - Reads the shift label and ISO date from the command line.
// - Runs the metrics pipeline over a directory of CSV-exported workbooks.
// - Prints a summary, trip previews and the handover indicators block, and
//   optionally exports JSON and CSV.
use anyhow::{bail, Context, Result};
use log::info;
use shift_report::config::ReportConfig;
use shift_report::loader::CsvWorkbookSource;
use shift_report::output;
use shift_report::pipeline::{Lookup, ShiftReportPipeline};
use shift_report::source::SheetSource;
use shift_report::types::{ComposedMetrics, TripMetrics};
use shift_report::util::format_int;
use std::env;
use std::path::Path;
use std::sync::Arc;

const USAGE: &str = "usage: shift-report --shift <morning|afternoon|night> --date <YYYY-MM-DD> \
[--data-dir DIR] [--config FILE] [--json FILE] [--csv-dir DIR] [--preview N]";

fn arg_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn print_trips(title: &str, trips: &TripMetrics, preview: usize) {
    println!("{}", title);
    println!(
        "{} unique trips, {} records, SLA {}/{} ({})\n",
        format_int(trips.vehicles),
        format_int(trips.total_records),
        format_int(trips.sla_met),
        format_int(trips.total_records),
        trips.sla_percentage_display
    );
    output::preview_table_rows(&output::trip_detail_rows(&trips.details), preview);
}

/// Write the optional exports. Failures are reported but do not abort the run.
fn export(metrics: &ComposedMetrics, json: Option<&str>, csv_dir: Option<&str>) {
    if let Some(path) = json {
        match output::write_json(path, &output::MetricsReport::now(metrics)) {
            Ok(()) => println!("(Metrics exported to {})", path),
            Err(e) => eprintln!("Write error: {}", e),
        }
    }
    if let Some(dir) = csv_dir {
        for (name, trips) in [("released", &metrics.released), ("received", &metrics.received)] {
            let path = Path::new(dir).join(format!("{}_{}_trips.csv", name, metrics.shift));
            let path = path.to_string_lossy();
            match output::write_csv(&path, &output::trip_detail_rows(&trips.details)) {
                Ok(()) => println!("(Trip details exported to {})", path),
                Err(e) => eprintln!("Write error: {}", e),
            }
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let (Some(shift), Some(date)) = (arg_value(&args, "--shift"), arg_value(&args, "--date")) else {
        bail!("shift and date are required\n{}", USAGE);
    };
    let data_dir = arg_value(&args, "--data-dir").unwrap_or("./sheets");
    let preview: usize = match arg_value(&args, "--preview") {
        Some(n) => n.parse().with_context(|| format!("invalid --preview '{}'", n))?,
        None => 5,
    };

    let config = match arg_value(&args, "--config") {
        Some(path) => ReportConfig::load(Path::new(path))?,
        None => ReportConfig::default(),
    };
    info!("reading workbooks from {}", data_dir);
    let source: Arc<dyn SheetSource> = Arc::new(CsvWorkbookSource::new(data_dir));
    let pipeline = ShiftReportPipeline::new(source, config)?;

    let metrics = match pipeline
        .run(shift, date)
        .context("metrics sheet could not be read")?
    {
        Lookup::Found(m) => m,
        Lookup::NotFound(key) => {
            println!("No data for shift {} on {}.", key.shift, key.date);
            return Ok(());
        }
    };

    println!("Shift {} on {}\n", metrics.shift, metrics.date);
    println!(
        "Orders processed: {} (computed {}, goal {})",
        format_int(metrics.orders.processed),
        format_int(metrics.orders.computed_sum),
        metrics.orders.goal_percentage_display
    );
    if metrics.orders.divergent {
        println!("Note: category columns do not add up to the reported total.");
    }
    println!();
    print_trips("Vehicles released", &metrics.released, preview);
    print_trips("Vehicles received", &metrics.received, preview);
    println!("{}", output::render_indicators(&metrics));

    export(
        &metrics,
        arg_value(&args, "--json"),
        arg_value(&args, "--csv-dir"),
    );
    Ok(())
}
