//! Batch processing of uploaded readings.
//!
//! Fills in the derived enthalpy and inlet-energy columns for every row
//! that does not have them yet. Rows are written back one at a time by id;
//! a rerun after a complete pass finds nothing left to do.

use tracing::{debug, info};

use crate::error::Result;
use crate::reading::{Derived, Unit, UnprocessedReading};
use crate::storage::Storage;

/// The enthalpy model applied to each unprocessed row.
///
/// The computation lives behind this trait so the current placeholder can
/// be swapped for a validated model without touching the processing loop.
pub trait EnthalpyModel {
    /// High-pressure enthalpy from high-pressure line pressure.
    fn hp_enthalpy(&self, hp_pressure: f64) -> f64;

    /// Low-pressure enthalpy from low-pressure line pressure.
    fn lp_enthalpy(&self, lp_pressure: f64) -> f64;
}

/// The current linear stand-in model.
// TODO: replace with a steam-table based model once validated coefficients
// are available; these are placeholders.
#[derive(Debug, Default, Clone, Copy)]
pub struct LinearPlaceholder;

impl EnthalpyModel for LinearPlaceholder {
    fn hp_enthalpy(&self, hp_pressure: f64) -> f64 {
        1000.0 + 10.0 * hp_pressure
    }

    fn lp_enthalpy(&self, lp_pressure: f64) -> f64 {
        900.0 + 8.0 * lp_pressure
    }
}

/// Compute the derived values for one row.
#[must_use]
pub fn derive(model: &dyn EnthalpyModel, row: &UnprocessedReading) -> Derived {
    let hp_enthalpy = model.hp_enthalpy(row.hp_pressure);
    let lp_enthalpy = model.lp_enthalpy(row.lp_pressure);
    let inlet_energy = row.hp_mass_flow * hp_enthalpy + row.lp_mass_flow * lp_enthalpy;

    Derived {
        hp_enthalpy,
        lp_enthalpy,
        inlet_energy,
    }
}

/// Process every unprocessed row of a unit and return the count.
///
/// Fetches the rows where inlet energy is unset, computes the derived
/// values, and writes them back row by row. The unset-check is the only
/// idempotence guard: a second run over the same data processes zero rows.
///
/// # Errors
///
/// Returns an error if a select or a write-back fails; rows already
/// written stay written.
pub fn process_unit(
    storage: &Storage,
    unit: Unit,
    model: &dyn EnthalpyModel,
) -> Result<usize> {
    let rows = storage.unprocessed_readings(unit)?;
    if rows.is_empty() {
        debug!("No unprocessed rows for {unit}");
        return Ok(0);
    }

    let mut count = 0;
    for row in &rows {
        let derived = derive(model, row);
        storage.apply_derived(unit, row.id, &derived)?;
        count += 1;
    }

    info!("Processed {count} rows for {unit}");
    Ok(count)
}
