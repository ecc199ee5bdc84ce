use clap::Parser;
use raincaster::adapters::rainviewer::radar_tile_url;
use raincaster::config::cli::{Cli, Command};
use raincaster::core::geo::{km_per_pixel, tile_size_km};
use raincaster::core::pipeline::clean_outputs;
use raincaster::domain::model::RainEstimate;
use raincaster::domain::ports::{ConfigProvider, Pipeline};
use raincaster::utils::{logger, validation::Validate};
use raincaster::{
    GeocodeClient, LocalStorage, RadarPipeline, RainViewerClient, RaincastEngine, RaincastError,
    Settings,
};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if cli.log_json {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    if let Err(e) = dispatch(cli).await {
        tracing::error!(
            "❌ raincaster failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());

        let exit_code = e.exit_code();
        if exit_code > 0 {
            std::process::exit(exit_code);
        }
    }
}

async fn dispatch(cli: Cli) -> Result<(), RaincastError> {
    let mut settings = Settings::load(cli.config.as_deref())?;

    match cli.command {
        Command::Run(args) => {
            args.apply(&mut settings);
            settings.validate()?;
            if args.dry_run {
                print_dry_run(&settings);
                return Ok(());
            }
            run(settings, cli.monitor).await
        }
        Command::Maps(args) => {
            args.api.apply(&mut settings);
            args.location.apply(&mut settings);
            args.radar.apply(&mut settings);
            settings.validate()?;
            list_maps(&settings).await
        }
        Command::Estimate(args) => {
            args.api.apply(&mut settings);
            args.location.apply(&mut settings);
            args.radar.apply(&mut settings);
            args.analysis.apply(&mut settings);
            settings.validate()?;
            estimate(settings).await
        }
        Command::Locate(args) => {
            args.location.apply(&mut settings);
            if let Some(url) = args.geocode_url {
                settings.geocode_url = url;
            }
            settings.validate()?;
            locate(&settings).await
        }
        Command::TileSize(args) => {
            raincaster::utils::validation::validate_range("zoom", args.zoom, 0, 20)?;
            raincaster::utils::validation::validate_range("lat", args.lat, -90.0, 90.0)?;
            let tile_km = tile_size_km(args.zoom, args.lat);
            println!(
                "Zoom {} at {:.3}°: {:.2} km per tile ({:.3} km/px at 512 px)",
                args.zoom,
                args.lat,
                tile_km,
                km_per_pixel(args.zoom, args.lat, 512)
            );
            Ok(())
        }
        Command::Clean(args) => {
            args.output.apply(&mut settings);
            settings.validate()?;
            let storage = LocalStorage::new(&settings.output_path);
            let removed = clean_outputs(&storage).await?;
            if removed.is_empty() {
                println!("🧹 Nothing to clean in {}", settings.output_path);
            } else {
                println!("🧹 Removed from {}: {}", settings.output_path, removed.join(", "));
            }
            Ok(())
        }
    }
}

async fn run(settings: Settings, monitor: bool) -> Result<(), RaincastError> {
    if monitor {
        tracing::info!("🔍 System monitoring enabled");
    }

    let storage = LocalStorage::new(&settings.output_path);
    let pipeline = RadarPipeline::new(storage, settings)?;
    let engine = RaincastEngine::new_with_monitoring(pipeline, monitor);

    let summary = engine.run().await?;
    println!("✅ Processed {} radar frames", summary.frames);
    print_estimate(&summary.estimate);
    if !summary.sweep.is_empty() {
        print_sweep(&summary.sweep);
    }
    println!("📁 Output saved to: {}", summary.output_path);
    Ok(())
}

async fn estimate(settings: Settings) -> Result<(), RaincastError> {
    // 不寫檔案：只跑 extract 與 transform
    let storage = LocalStorage::new(&settings.output_path);
    let pipeline = RadarPipeline::new(storage, settings)?;
    let frames = pipeline.extract().await?;
    let report = pipeline.transform(frames).await?;

    print_estimate(&report.estimate);
    if !report.sweep.is_empty() {
        print_sweep(&report.sweep);
    }
    Ok(())
}

async fn list_maps(settings: &Settings) -> Result<(), RaincastError> {
    let client = RainViewerClient::new(settings.api_url(), settings.timeout())?;
    let maps = client.fetch_weather_maps().await?;

    println!("🗺️  Weather maps v{} on {}", maps.version, maps.host);
    println!(
        "   {} past, {} nowcast, {} infrared frames",
        maps.num_past_radar_frames(),
        maps.num_nowcast_radar_frames(),
        maps.satellite.infrared.len()
    );
    for (kind, frame) in maps.frames() {
        println!(
            "  {:<8} {}  {}",
            kind.to_string(),
            frame.time_str(settings.tz_shift_hours()),
            radar_tile_url(&maps.host, &frame, settings.map_request())
        );
    }
    Ok(())
}

async fn locate(settings: &Settings) -> Result<(), RaincastError> {
    let client = GeocodeClient::new(
        settings.geocode_url(),
        settings.user_agent(),
        settings.timeout(),
    )?;
    let request = settings.map_request();
    let address = client.reverse(request.lat, request.lon).await?;
    println!("📍 {}", address);
    Ok(())
}

fn print_estimate(estimate: &RainEstimate) {
    match (estimate.minutes_to_arrival, estimate.correlation) {
        (Some(minutes), Some(r)) => {
            println!(
                "🌧️  Rain from {:.0}° expected in {:.0} min (r = {:.2}, {} frames)",
                estimate.direction_deg, minutes, r, estimate.samples
            );
            if let (Some(km), Some(kmh)) = (estimate.distance_km, estimate.speed_kmh) {
                println!("   Front is {:.1} km away, moving at {:.1} km/h", km, kmh);
            }
        }
        (None, Some(r)) => println!(
            "☀️  Rain at {:.0}° is not approaching (r = {:.2}, {} frames)",
            estimate.direction_deg, r, estimate.samples
        ),
        _ => println!(
            "☀️  Not enough consecutive rain frames at {:.0}° ({} found, 3 needed)",
            estimate.direction_deg, estimate.samples
        ),
    }
}

fn print_sweep(results: &[RainEstimate]) {
    println!("   Direction sweep:");
    for e in results {
        let eta = e
            .minutes_to_arrival
            .map(|m| format!("{:.0} min", m))
            .unwrap_or_else(|| "-".to_string());
        println!("   {:>6.1}°  {:>8}  ({} frames)", e.direction_deg, eta, e.samples);
    }
}

fn print_dry_run(settings: &Settings) {
    let request = settings.map_request();
    println!("🔍 Dry Run Analysis:");
    println!();
    println!("📡 Data Source:");
    println!("  Index: {}", settings.api_url);
    println!("  Timeout: {}s", settings.timeout_seconds);
    println!("  Concurrent downloads: {}", settings.concurrent_requests);
    println!();
    println!("🗺️  Radar Tiles:");
    println!("  Centre: {:.4}, {:.4}", request.lat, request.lon);
    println!(
        "  Zoom {} / {} px / color {} / options {}",
        request.zoom, request.size, request.color, request.options
    );
    println!(
        "  Tile covers {:.1} km ({:.3} km/px)",
        tile_size_km(request.zoom, request.lat),
        km_per_pixel(request.zoom, request.lat, request.size)
    );
    if let Some(max) = settings.max_frames {
        println!("  Past frames limited to the last {}", max);
    }
    println!();
    println!("⚙️ Analysis:");
    match settings.sweep_step {
        Some(step) => println!("  Sweep every {:.1}°", step),
        None => println!("  Direction {:.1}°", settings.direction),
    }
    println!("  Times shown at UTC{:+}", settings.utc_offset);
    println!();
    println!("💾 Output:");
    println!("  Path: {}", settings.output_path);
    println!(
        "  Format: {}",
        if settings.archive {
            "ZIP archive"
        } else {
            "loose files"
        }
    );
    println!();
    println!("✅ Dry run complete. Use --verbose for more details during an actual run.");
}
