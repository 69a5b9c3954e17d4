//! Film location clustering tool
//!
//! Reads filming locations from a CSV file, clusters them for one map
//! viewport, and prints the markers to draw. Optionally clicks one marker and
//! reports what the map should do next.

use clap::Parser;
use csv::{ReaderBuilder, WriterBuilder};
use filmpin_cluster::{
    Bounds, ClusterController, ClusterEvent, ClusterFeature, ClusterIndex, ClusterOptions,
    ControllerOptions, FeatureKind, Point, PointList, SpreadPin, cluster::bounds_of,
    cluster::filter_by_query, cluster::unique_groups, cluster::visible_point_count,
};
use log::{debug, info};
use serde::Serialize;
use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;


#[derive(Parser)]
#[command(name = "filmpin_cluster")]
#[command(about = "Film location map clustering tool", long_about = None)]
struct Args {
    /// Input CSV file with id,latitude,longitude[,group] columns
    #[arg(short, long, default_value = "locations.csv")]
    input: PathBuf,

    /// Output file for the markers (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Map zoom level
    #[arg(short, long, default_value_t = 12.0)]
    zoom: f64,

    /// Viewport as west,south,east,north (default: bounds of the input)
    #[arg(short, long, value_parser = parse_bbox, allow_hyphen_values = true)]
    bbox: Option<Bounds>,

    /// Clustering radius in pixels
    #[arg(short, long, default_value_t = 75.0)]
    radius: f64,

    /// Minimum number of locations in a cluster
    #[arg(short = 'm', long, default_value_t = 2)]
    min_points: usize,

    /// Highest zoom level that still clusters
    #[arg(long, default_value_t = 20)]
    max_zoom: u8,

    /// Only cluster locations whose id or film contains this text
    #[arg(short, long)]
    filter: Option<String>,

    /// Click the marker with this id (cluster id as printed, or a location id)
    #[arg(short, long)]
    activate: Option<String>,

    /// Write JSON instead of CSV
    #[arg(short, long)]
    json: bool,

    /// Enable debug output
    #[arg(short, long)]
    debug: bool,
}

/// Everything the tool prints for one viewport
#[derive(Serialize)]
struct Report<'a> {
    zoom: f64,
    bbox: Bounds,
    visible_locations: usize,
    features: Vec<ClusterFeature>,
    event: Option<ClusterEvent>,
    pins: Vec<SpreadPin<'a>>,
}

fn main() {
    let args = Args::parse();

    let default_level = if args.debug { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let points = match read_points_csv(&args.input) {
        Ok(points) => points,
        Err(e) => {
            eprintln!("Error reading CSV: {}", e);
            std::process::exit(1);
        }
    };

    if points.is_empty() {
        eprintln!("No locations found in CSV file");
        std::process::exit(1);
    }

    debug!("Read {} locations from {:?}", points.len(), args.input);

    let points = match &args.filter {
        Some(query) => {
            let kept = filter_by_query(&points, query);
            if kept.is_empty() {
                eprintln!("No locations match {:?}", query);
                std::process::exit(1);
            }
            kept
        }
        None => points,
    };

    for (film, count) in unique_groups(&points) {
        debug!("film {:?}: {} locations", film, count);
    }

    let options = ClusterOptions {
        radius: args.radius,
        min_points: args.min_points,
        max_zoom: args.max_zoom,
        ..ClusterOptions::default()
    };
    let index = ClusterIndex::with_points(options, points);

    let bbox = args.bbox.unwrap_or_else(|| default_bbox(index.points()));
    let features = index.query(&bbox, args.zoom);
    info!(
        "{} markers for {} locations at zoom {}",
        features.len(),
        visible_point_count(&features),
        index.level_zoom(args.zoom)
    );

    let mut controller = ClusterController::new(ControllerOptions::default());
    let (event, pins) = match &args.activate {
        None => (None, Vec::new()),
        Some(target) => {
            let Some(feature) = features.iter().find(|f| f.feature_id() == *target) else {
                eprintln!("No marker with id {} in this viewport", target);
                std::process::exit(1);
            };
            let event = controller.activate(&index, feature);
            let pins = controller.expanded_pins(&index, feature, args.zoom);
            (event, pins)
        }
    };

    let report = Report {
        zoom: args.zoom,
        bbox,
        visible_locations: visible_point_count(&features),
        features,
        event,
        pins,
    };

    let result = match &args.output {
        None => write_report(io::stdout().lock(), &report, args.json),
        Some(path) => match File::create(path) {
            Ok(file) => write_report(file, &report, args.json),
            Err(e) => Err(e.into()),
        },
    };
    if let Err(e) = result {
        eprintln!("Error writing output: {}", e);
        std::process::exit(1);
    }
}

/// Parses `west,south,east,north`
fn parse_bbox(s: &str) -> Result<Bounds, String> {
    let parts = s
        .split(',')
        .map(|v| v.trim().parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| format!("invalid bbox {s:?}: {e}"))?;

    match parts[..] {
        [west, south, east, north] => Ok(Bounds::new(west, south, east, north)),
        _ => Err(format!("bbox needs 4 values, got {}", parts.len())),
    }
}

/// Viewport covering all locations, or the whole world when there are none
fn default_bbox(points: &[Point]) -> Bounds {
    let bounds = bounds_of(points);
    if bounds.is_degenerate() {
        Bounds::WORLD
    } else {
        bounds
    }
}

/// Reads locations from a CSV file
///
/// Expected format: `id,latitude,longitude[,group]` (header row is optional).
/// Rows with missing or non-numeric coordinates are skipped.
fn read_points_csv(filename: &PathBuf) -> Result<PointList, Box<dyn std::error::Error>> {
    let file = File::open(filename)?;
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(file);

    let mut points = PointList::new();

    for (row, result) in reader.records().enumerate() {
        let record = result?;
        if record.len() < 3 {
            debug!("row {}: expected at least 3 columns, skipping", row + 1);
            continue;
        }

        let lat = record[1].trim().parse::<f64>();
        let lon = record[2].trim().parse::<f64>();
        match (lat, lon) {
            (Ok(lat), Ok(lon)) => {
                let group = record.get(3).unwrap_or("").trim();
                points.push(Point::new(record[0].trim(), lat, lon, group));
            }
            // First row that does not parse is the header
            _ if row == 0 => continue,
            _ => debug!("row {}: non-numeric coordinates, skipping", row + 1),
        }
    }

    Ok(points)
}

fn describe_event(event: &ClusterEvent) -> String {
    match event {
        ClusterEvent::Expanded(id) => format!("expanded {}", id),
        ClusterEvent::Collapsed(id) => format!("collapsed {}", id),
        ClusterEvent::ZoomTo {
            longitude,
            latitude,
            zoom,
        } => format!("zoom to {} at {:.6},{:.6}", zoom, latitude, longitude),
        ClusterEvent::LocationSelected { id } => format!("selected {}", id),
    }
}

fn write_report<W: Write>(
    out: W,
    report: &Report<'_>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if json {
        let mut out = out;
        serde_json::to_writer_pretty(&mut out, report)?;
        writeln!(out)?;
        return Ok(());
    }

    write_csv(out, report)
}

/// Writes markers as CSV rows: `kind,id,latitude,longitude,count,group`
///
/// Spread pins follow the markers as `pin` rows, and the click result, if
/// any, comes last as an `event` row.
fn write_csv<W: Write>(out: W, report: &Report<'_>) -> Result<(), Box<dyn std::error::Error>> {
    let mut writer = WriterBuilder::new().from_writer(out);
    writer.write_record(["kind", "id", "latitude", "longitude", "count", "group"])?;

    for f in &report.features {
        let lat = f.latitude.to_string();
        let lon = f.longitude.to_string();
        match &f.kind {
            FeatureKind::Cluster { id, point_count } => {
                let count = point_count.to_string();
                writer.write_record([
                    "cluster",
                    id.to_string().as_str(),
                    lat.as_str(),
                    lon.as_str(),
                    count.as_str(),
                    "",
                ])?;
            }
            FeatureKind::Point { id, group_key } => {
                writer.write_record([
                    "point",
                    id.as_str(),
                    lat.as_str(),
                    lon.as_str(),
                    "1",
                    group_key.as_str(),
                ])?;
            }
        }
    }

    for pin in &report.pins {
        writer.write_record([
            "pin",
            pin.point.id.as_str(),
            pin.latitude.to_string().as_str(),
            pin.longitude.to_string().as_str(),
            "1",
            pin.point.group_key.as_str(),
        ])?;
    }

    if let Some(event) = &report.event {
        writer.write_record(["event", describe_event(event).as_str(), "", "", "", ""])?;
    }

    writer.flush()?;
    Ok(())
}
