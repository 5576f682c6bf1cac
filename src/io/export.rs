//! CSV export for episode telemetry.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::sim::types::StepRecord;

/// Column header for CSV telemetry export.
const HEADER: &str = "step,time_s,power_fraction,reactor_power_mw,fuel_temp_c,\
                      moderator_temp_c,valve_command,valve_position,mech_power_mw,\
                      speed_rpm,frequency_hz,rotor_angle_rad,load_demand_mw,\
                      rod_reactivity,terminated,truncated";

/// Exports an episode's record stream to a CSV file at the given path.
///
/// Writes a header row followed by one data row per record. Produces
/// deterministic output for identical inputs.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_csv(records: &[StepRecord], path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    let buf = io::BufWriter::new(file);
    write_csv(records, buf)
}

/// Writes an episode's record stream as CSV to any writer.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_csv(records: &[StepRecord], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    // Header
    wtr.write_record(HEADER.split(',').map(str::trim))?;

    // Data rows
    for r in records {
        wtr.write_record(&[
            r.step.to_string(),
            format!("{:.4}", r.time_s),
            format!("{:.6}", r.power_fraction),
            format!("{:.4}", r.reactor_power_mw),
            format!("{:.4}", r.t_fuel_c),
            format!("{:.4}", r.t_moderator_c),
            format!("{:.6}", r.valve_command),
            format!("{:.6}", r.valve_position),
            format!("{:.4}", r.mech_power_mw),
            format!("{:.4}", r.speed_rpm),
            format!("{:.6}", r.frequency_hz),
            format!("{:.6}", r.rotor_angle_rad),
            format!("{:.4}", r.load_demand_mw),
            format!("{:.8}", r.rod_reactivity),
            r.terminated.to_string(),
            r.truncated.to_string(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
