use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, info, warn};
use std::thread;
use std::time::Duration;

use timeslider::cli::Args;
use timeslider::core::{CurrentExtentChanged, PlayDirection, downcast_event};
use timeslider::discovery::{DiscoveryTask, TimeAwareLayer};
use timeslider::entities::{TimeExtent, TimeStepInterval};
use timeslider::layout::TickKind;
use timeslider::paths::{self, PathConfig};
use timeslider::settings::SliderSettings;
use timeslider::slider::TimeSlider;

/// Host poll period for the playback loop (~60Hz)
const POLL_PERIOD: Duration = Duration::from_millis(16);

/// The command line's extent and interval, presented as a discoverable layer
struct CommandLineLayer {
    extent: TimeExtent,
    interval: Option<TimeStepInterval>,
}

impl TimeAwareLayer for CommandLineLayer {
    fn name(&self) -> &str {
        "command line"
    }

    fn load(&mut self) -> Result<(), String> {
        Ok(())
    }

    fn supports_time_filtering(&self) -> bool {
        true
    }

    fn full_time_extent(&self) -> Option<TimeExtent> {
        Some(self.extent)
    }

    fn time_interval(&self) -> Option<TimeStepInterval> {
        self.interval
    }
}

fn init_logger(args: &Args, path_config: &PathConfig) -> Result<()> {
    // 0 (default) = warn, 1 (-v) = info, 2 (-vv) = debug, 3+ (-vvv) = trace
    let log_level = match args.verbosity {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    if let Some(log_path_opt) = &args.log_file {
        let log_path = log_path_opt.clone().unwrap_or_else(|| path_config.log_file());
        let file = std::fs::File::create(&log_path)
            .with_context(|| format!("Failed to create log file: {}", log_path.display()))?;

        env_logger::Builder::new()
            .filter_level(log_level)
            .format_timestamp_millis()
            .target(env_logger::Target::Pipe(Box::new(file)))
            .init();

        info!("Logging to file: {} (level: {:?})", log_path.display(), log_level);
    } else {
        // Console logging (respects RUST_LOG if set)
        let default_level = match args.verbosity {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        };
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
            .format_timestamp_millis()
            .init();
    }
    Ok(())
}

/// Settings from disk with command-line overrides applied
fn effective_settings(args: &Args, path_config: &PathConfig) -> SliderSettings {
    let settings_path = path_config.settings_file();
    let mut settings = SliderSettings::load(&settings_path).unwrap_or_else(|e| {
        warn!("{:#}, using defaults", e);
        SliderSettings::default()
    });

    if args.pin_start {
        settings.pin_start = true;
    }
    if args.pin_end {
        settings.pin_end = true;
    }
    if let Some(mode) = args.loop_mode {
        settings.loop_mode = mode;
    }
    if args.backward {
        settings.direction = PlayDirection::Backward;
    }
    if let Some(ms) = args.interval_ms {
        settings.playback_interval_ms = ms;
    }
    if let Some(width) = args.width {
        settings.track_length = width;
    }
    settings
}

fn print_layout(slider: &TimeSlider) {
    let controller = slider.controller();
    let mapper = slider.mapper();
    let steps = controller.steps();
    let layout = slider.tick_layout();

    println!("Full extent:    {}", controller.full_extent());
    match controller.step_interval() {
        Some(interval) => println!("Step interval:  {} ({} steps)", interval, steps.len()),
        None => println!("Step interval:  none"),
    }
    for tick in &layout.ticks {
        let marker = match tick.kind {
            TickKind::End => "|",
            TickKind::Major => "+",
            TickKind::Minor => ".",
        };
        let label = match tick.kind {
            TickKind::Major => slider.step_label(tick.index).unwrap_or_default(),
            _ => String::new(),
        };
        println!(
            "  {} {:>4} {:>9.1}  {}  {}",
            marker,
            tick.index,
            tick.position,
            steps[tick.index].format("%Y-%m-%d %H:%M:%S"),
            label
        );
    }
    match layout.major_interval {
        Some(k) => println!("Labels every {} steps from step {}", k, layout.offset),
        None => println!("Labels: single middle label"),
    }
    if let Some((a, b)) = mapper.extent_positions(&controller.current_extent()) {
        println!("Current extent: {} (thumbs at {:.1}, {:.1})", controller.current_extent(), a, b);
    }
}

fn play(slider: &mut TimeSlider, ticks: usize) {
    slider.bus().subscribe::<CurrentExtentChanged, _>(|e| {
        debug!("Current extent changed: {} [{:?}, {:?}]", e.extent, e.start_index, e.end_index);
    });

    let player = slider.player_mut();
    println!(
        "Playing {} ticks ({}, loop {}, every {:?})",
        ticks,
        player.direction(),
        player.loop_mode(),
        player.interval()
    );
    player.play();

    let mut done = 0;
    while done < ticks && slider.player().is_playing() {
        thread::sleep(POLL_PERIOD.min(slider.player().interval()));
        if let Some(extent) = slider.update() {
            done += 1;
            let c = slider.controller();
            println!(
                "  tick {:>3}: {} [{:?}, {:?}]",
                done,
                extent,
                c.start_index(),
                c.end_index()
            );
        }
    }
    if slider.player().is_playing() {
        slider.player_mut().stop();
    } else {
        println!("Playback stopped at the end of the range");
    }
    // Deferred queue is not used by this driver
    slider.bus().poll();
}

fn main() -> Result<()> {
    let args = Args::parse();

    let path_config = PathConfig::from_env_and_cli(args.config_dir.clone());
    if let Err(e) = paths::ensure_dirs(&path_config) {
        eprintln!("Warning: Failed to create application directories: {:#}", e);
    }

    init_logger(&args, &path_config)?;
    info!("timeslider {} starting", env!("CARGO_PKG_VERSION"));
    debug!("Command-line args: {:?}", args);
    info!("Settings path: {}", path_config.settings_file().display());

    let settings = effective_settings(&args, &path_config);
    if args.save_settings {
        settings.save(&path_config.settings_file())?;
    }

    let layers: Vec<Box<dyn TimeAwareLayer>> = vec![Box::new(CommandLineLayer {
        extent: TimeExtent::new(args.start, args.end),
        interval: args.interval,
    })];
    let props = DiscoveryTask::spawn(layers)
        .context("Failed to start discovery")?
        .wait()
        .context("Time discovery failed")?;

    let mut slider = TimeSlider::from_settings(&settings);
    slider.apply_time_properties(&props);
    if let Some(current) = &args.current
        && let [start, end] = current.as_slice()
    {
        slider.set_current_extent(TimeExtent::new(*start, *end));
    }
    if slider.controller().step_count() == 0 {
        warn!("No steps: pass --interval to enable snapping, stepping and playback");
    }

    print_layout(&slider);

    if args.ticks > 0 {
        play(&mut slider, args.ticks);
    }
    Ok(())
}
