// Recorder facade — session sequencing and capture runs.

pub mod controller;
