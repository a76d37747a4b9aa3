//! Time handling: the numeric datenum axis and prediction windows.

mod datenum;
mod window;

pub use datenum::{epoch, from_datenum, to_datenum, to_datenums};
pub use window::{IntervalUnit, PredictionWindow, SamplingInterval};
