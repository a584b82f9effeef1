use clap::Parser;
use core::convert::Infallible;
use embassy_executor::{Executor, Spawner};
use embassy_time::{with_timeout, Duration, Instant, Timer};
use embedded_hal::{
    digital::{ErrorType as PinErrorType, OutputPin},
    pwm::{ErrorType as PwmErrorType, SetDutyCycle},
};
use heapless::Vec;
use tank_core::mk_static;
use tank_core::utils::{
    controllers::{
        DriveCommand, DriveController, HBridge, L298n, RampedDifferentialDrive, DRIVE_CHANNEL,
        DRIVE_REPORT,
    },
    EmbassyClock,
};
use tracing::{debug, error, info, warn};

/// Most commands a script may hold.
const SCRIPT_CAPACITY: usize = 64;

/// Played when no `--script` is given.
const DEMO_SCRIPT: &str = r#"{"command":"setspeed","leftSpeed":180,"rightSpeed":180}
{"command":"forward"}
{"command":"left"}
{"command":"backward"}
{"command":"setspeed","leftSpeed":60,"rightSpeed":60}
{"command":"right"}
{"command":"stop"}"#;

#[derive(Parser)]
#[clap(version = "1.0")]
struct Opts
{
    /// ramp step per tick
    #[clap(long, default_value_t = 10)]
    step: u8,
    /// minimum time between ramp ticks (ms)
    #[clap(long, default_value_t = 10)]
    interval: u8,
    /// how long the drive task waits for a command before ticking (ms)
    #[clap(long, default_value_t = 5)]
    poll_ms: u64,
    /// delay between scripted commands (ms)
    #[clap(long, default_value_t = 500)]
    gap_ms: u64,
    /// how long to wait for the drive to settle after the last command (ms)
    #[clap(long, default_value_t = 10000)]
    settle_ms: u64,
    /// JSON-lines command script
    #[clap(long)]
    script: Option<std::path::PathBuf>,
}

/// Output pin that logs its level.
struct LogPin(&'static str);

impl PinErrorType for LogPin {
    type Error = Infallible;
}

impl OutputPin for LogPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        debug!("{} -> LOW", self.0);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        debug!("{} -> HIGH", self.0);
        Ok(())
    }
}

/// 8-bit PWM channel that logs its duty.
struct LogPwm(&'static str);

impl PwmErrorType for LogPwm {
    type Error = Infallible;
}

impl SetDutyCycle for LogPwm {
    fn max_duty_cycle(&self) -> u16 {
        255
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Self::Error> {
        info!("{} duty {}", self.0, duty);
        Ok(())
    }
}

type Bridge = L298n<LogPin, LogPin, LogPwm>;

#[embassy_executor::task]
async fn drive_task(ctrl: &'static mut DriveController<Bridge, EmbassyClock>) -> ! {
    ctrl.drive_ch().await
}

#[embassy_executor::task]
async fn script_task(script: Vec<DriveCommand, SCRIPT_CAPACITY>, gap: Duration, settle: Duration) {
    let sent = script.len() as u32;
    for command in script {
        DRIVE_CHANNEL.send(command).await;
        Timer::after(gap).await;
    }
    info!("Script finished, waiting for the drive to settle");

    let deadline = Instant::now() + settle;
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match with_timeout(remaining, DRIVE_REPORT.wait()).await {
            Ok(report) if report.handled >= sent => {
                match serde_json::to_string(&report.status) {
                    Ok(json) => info!("Final status: {}", json),
                    Err(e) => error!("Failed to encode status: {}", e),
                }
                std::process::exit(0);
            }
            Ok(report) => debug!("Settled after {} of {} commands", report.handled, sent),
            Err(_) => {
                error!("Drive did not settle within {} ms", settle.as_millis());
                std::process::exit(1);
            }
        }
    }
}

fn load_script(opts: &Opts) -> Vec<DriveCommand, SCRIPT_CAPACITY> {
    let text = match &opts.script {
        Some(path) => match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                error!("Failed to read {}: {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => DEMO_SCRIPT.to_owned(),
    };

    let mut script = Vec::new();
    for (n, line) in text.lines().enumerate().filter(|(_, l)| !l.trim().is_empty()) {
        match DriveCommand::from_json(line.as_bytes()) {
            Ok(command) => {
                if script.push(command).is_err() {
                    warn!("Script longer than {} commands, truncating", SCRIPT_CAPACITY);
                    break;
                }
            }
            Err(e) => warn!("Skipping line {}: {}", n + 1, e),
        }
    }
    script
}

#[embassy_executor::task]
async fn main_task(spawner: Spawner) {
    let opts: Opts = Opts::parse();
    let script = load_script(&opts);
    info!("Loaded {} commands", script.len());

    let left = HBridge::new(LogPin("IN1"), LogPin("IN2"), LogPwm("ENA"));
    let right = HBridge::new(LogPin("IN3"), LogPin("IN4"), LogPwm("ENB"));
    let mut drive = RampedDifferentialDrive::new(L298n::new(left, right), EmbassyClock);
    drive.configure_ramp(opts.step, opts.interval);

    let ctrl = mk_static!(
        DriveController<Bridge, EmbassyClock>,
        DriveController::new(drive, Some(opts.poll_ms))
    );
    spawner.spawn(drive_task(ctrl)).unwrap();
    spawner
        .spawn(script_task(
            script,
            Duration::from_millis(opts.gap_ms),
            Duration::from_millis(opts.settle_ms),
        ))
        .unwrap();
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
    let executor = mk_static!(Executor, Executor::new());
    executor.run(|spawner| {
        spawner.spawn(main_task(spawner)).unwrap();
    });
}
