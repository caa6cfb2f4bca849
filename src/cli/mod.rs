pub mod check;
pub mod list;
pub mod print;
pub mod synth;
