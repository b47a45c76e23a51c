pub mod biquad;

pub use biquad::{Biquad, Filter};
