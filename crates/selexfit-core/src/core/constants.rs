/// Gas constant in kcal/(mol·K).
pub const R: f64 = 1.987e-3;

/// Absolute temperature in Kelvin assumed by the binding model.
pub const T: f64 = 300.0;

/// The `R·T` product in kcal/mol; converts between energies and logit units.
pub const RT: f64 = R * T;
