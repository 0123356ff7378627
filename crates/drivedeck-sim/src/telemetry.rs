//! Vehicle telemetry logging.
//!
//! Outputs one CSV row per world step for offline analysis.

use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::Path,
};

use drivedeck::ActuationCommand;

use crate::vehicle::VehicleSimState;

const CSV_HEADER: &str = "t,steer,throttle,brake,speed,x,y,yaw_deg";

/// Everything recorded for one world step.
pub struct TelemetrySnapshot {
    pub elapsed: f32,
    pub command: ActuationCommand,
    pub state: VehicleSimState,
}

/// CSV writer over any output.
pub struct Telemetry<W: Write = BufWriter<File>> {
    out: W,
    rows: u64,
}

impl Telemetry {
    /// Create (or truncate) a telemetry file at `path`.
    pub fn create(path: &Path) -> io::Result<Self> {
        Self::new(BufWriter::new(File::create(path)?))
    }
}

impl<W: Write> Telemetry<W> {
    pub fn new(mut out: W) -> io::Result<Self> {
        writeln!(out, "{CSV_HEADER}")?;
        Ok(Self { out, rows: 0 })
    }

    pub fn record(&mut self, t: &TelemetrySnapshot) -> io::Result<()> {
        writeln!(
            self.out,
            "{:.4},{:.3},{:.3},{:.3},{:.2},{:.2},{:.2},{:.2}",
            t.elapsed,
            t.command.steer,
            t.command.throttle,
            t.command.brake,
            t.state.speed,
            t.state.position.x,
            t.state.position.y,
            t.state.yaw,
        )?;
        self.rows += 1;
        Ok(())
    }

    /// Rows written so far, not counting the header.
    pub fn rows(&self) -> u64 {
        self.rows
    }

    /// Flush and hand back the writer.
    pub fn finish(mut self) -> io::Result<W> {
        self.out.flush()?;
        Ok(self.out)
    }
}
