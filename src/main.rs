use std::process::ExitCode;

use marker_tracker::{Result, TrackerConfig};

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(target_os = "windows")]
fn run() -> Result<()> {
    use marker_tracker::input::WindowsInput;
    use marker_tracker::vision::{
        enable_dpi_awareness, load_template, primary_screen_size, GdiCapture,
    };
    use marker_tracker::{SystemClock, Template, TemplateMatcher, Tracker};

    if !enable_dpi_awareness() {
        log::warn!("Could not enable DPI awareness; capture may be off-centre on scaled displays");
    }

    let mut config = TrackerConfig::default();
    if let Some((width, height)) = primary_screen_size() {
        config = config.with_screen_size(width, height);
    }

    let template = Template::new(load_template(&config.template_path)?);
    let matcher = TemplateMatcher::new(template);

    let region = config.region();
    let capture = GdiCapture::new(region.width, region.height)?;
    let input = WindowsInput::new();
    let mut tracker = Tracker::new(config, capture, matcher, input, SystemClock::new())?;

    println!(
        "Marker tracker started. Press {} to exit.",
        tracker.input().exit()
    );
    tracker.run()?;
    println!("Marker tracker stopped.");
    Ok(())
}

#[cfg(not(target_os = "windows"))]
fn run() -> Result<()> {
    TrackerConfig::default().validate()?;
    Err(marker_tracker::TrackerError::Unsupported(
        "screen capture and input injection",
    ))
}
