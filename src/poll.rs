use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use anyhow::{Context, Result};

use crate::config::RunConfig;
use crate::runtime::{FloatProperty, TrackingRuntime};
use crate::session::Controllers;

/// Cooperative stop request shared with the interrupt handler.
///
/// Starts out running; the only transition is to stopped.
#[derive(Debug, Clone)]
pub struct RunningFlag(Arc<AtomicBool>);

impl Default for RunningFlag {
    fn default() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }
}

impl RunningFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn stop(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    /// Stops this flag on Ctrl-C, SIGTERM or console close.
    ///
    /// Only one handler may be installed per process.
    pub fn install_handler(&self) -> Result<()> {
        let flag = self.clone();
        ctrlc::set_handler(move || flag.stop()).context("failed to install interrupt handler")
    }
}

/// Charge of both controllers as fractions in `[0.0, 1.0]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatteryReading {
    pub left: f32,
    pub right: f32,
}

pub fn read_batteries<R: TrackingRuntime + ?Sized>(
    runtime: &R,
    controllers: Controllers,
) -> BatteryReading {
    BatteryReading {
        left: runtime.float_property(controllers.left, FloatProperty::DeviceBatteryPercentage),
        right: runtime.float_property(controllers.right, FloatProperty::DeviceBatteryPercentage),
    }
}

/// Renders one status line; the leading carriage return overwrites the previous one.
pub fn format_reading(reading: BatteryReading, verbose: bool) -> String {
    if verbose {
        format!(
            "\rLeft controller: {:.6}    Right controller: {:.6}    ",
            reading.left, reading.right
        )
    } else {
        format!(
            "\rLeft controller: {:.2}%    Right controller: {:.2}%    ",
            reading.left * 100.0,
            reading.right * 100.0
        )
    }
}

/// Prints battery charge every poll interval until `running` is cleared.
///
/// The flag is checked once per iteration, before any read, so a stop takes
/// effect within one interval. Returns the number of lines written.
pub fn poll_loop<R, W>(
    runtime: &R,
    controllers: Controllers,
    config: &RunConfig,
    running: &RunningFlag,
    out: &mut W,
) -> io::Result<u64>
where
    R: TrackingRuntime + ?Sized,
    W: Write,
{
    writeln!(out, "Current battery charge:")?;
    let interval = config.poll_interval();
    let mut iterations = 0;
    while running.is_running() {
        let reading = read_batteries(runtime, controllers);
        write!(out, "{}", format_reading(reading, config.verbose))?;
        out.flush()?;
        iterations += 1;
        thread::sleep(interval);
    }
    Ok(iterations)
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::runtime::{DeviceClass, DeviceIndex, IntProperty};
    use crate::session::tests::FakeRuntime;

    fn controllers() -> Controllers {
        Controllers {
            left: DeviceIndex(1),
            right: DeviceIndex(2),
        }
    }

    fn fast_config(verbose: bool) -> RunConfig {
        RunConfig {
            poll_interval_ms: 0,
            verbose,
            ..RunConfig::default()
        }
    }

    /// Clears the running flag once `stop_after` battery reads have happened.
    struct StoppingRuntime {
        running: RunningFlag,
        stop_after: u32,
        reads: Cell<u32>,
    }

    impl TrackingRuntime for StoppingRuntime {
        fn is_connected(&self, _index: DeviceIndex) -> bool {
            true
        }

        fn device_class(&self, _index: DeviceIndex) -> DeviceClass {
            DeviceClass::Controller
        }

        fn int_property(&self, _index: DeviceIndex, _property: IntProperty) -> i32 {
            0
        }

        fn float_property(&self, _index: DeviceIndex, _property: FloatProperty) -> f32 {
            let reads = self.reads.get() + 1;
            self.reads.set(reads);
            if reads == self.stop_after {
                self.running.stop();
            }
            0.5
        }

        fn shutdown(&mut self) {}
    }

    #[test]
    fn percentage_output_has_two_decimals() {
        let line = format_reading(BatteryReading { left: 0.5, right: 0.125 }, false);
        assert!(line.starts_with('\r'));
        assert!(!line.ends_with('\n'));
        assert!(line.contains("50.00%"));
        assert!(line.contains("12.50%"));
    }

    #[test]
    fn verbose_output_shows_raw_fractions() {
        let line = format_reading(BatteryReading { left: 0.5, right: 1.0 }, true);
        assert!(line.contains("0.500000"));
        assert!(line.contains("1.000000"));
        assert!(!line.contains('%'));
    }

    #[test]
    fn sentinel_values_are_printed_as_is() {
        let line = format_reading(BatteryReading { left: -1.0, right: 0.0 }, false);
        assert!(line.contains("-100.00%"));
        assert!(line.contains("0.00%"));
    }

    #[test]
    fn stopped_flag_prevents_any_read() {
        let running = RunningFlag::new();
        running.stop();
        let runtime = StoppingRuntime {
            running: running.clone(),
            stop_after: 0,
            reads: Cell::new(0),
        };
        let mut out = Vec::new();
        let iterations =
            poll_loop(&runtime, controllers(), &fast_config(false), &running, &mut out).unwrap();
        assert_eq!(iterations, 0);
        assert_eq!(runtime.reads.get(), 0);
        assert_eq!(String::from_utf8(out).unwrap(), "Current battery charge:\n");
    }

    #[test]
    fn stop_is_observed_at_the_next_iteration() {
        let running = RunningFlag::new();
        let runtime = StoppingRuntime {
            running: running.clone(),
            stop_after: 5,
            reads: Cell::new(0),
        };
        let mut out = Vec::new();
        let iterations =
            poll_loop(&runtime, controllers(), &fast_config(false), &running, &mut out).unwrap();
        // The stop lands mid-iteration three; that iteration finishes, then no more reads.
        assert_eq!(iterations, 3);
        assert_eq!(runtime.reads.get(), 6);
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.matches('\r').count(), 3);
    }

    #[test]
    fn reads_each_controller_by_its_index() {
        let runtime = FakeRuntime::new(vec![
            (1, DeviceClass::Controller, 1, 0.25),
            (2, DeviceClass::Controller, 2, 0.75),
        ]);
        let reading = read_batteries(&runtime, controllers());
        assert_eq!(reading, BatteryReading { left: 0.25, right: 0.75 });
    }

    #[test]
    fn flag_clones_share_state() {
        let running = RunningFlag::new();
        let handle = running.clone();
        assert!(running.is_running());
        handle.stop();
        assert!(!running.is_running());
    }
}
