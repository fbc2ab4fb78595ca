// Diagnostics — capture run statistics.

pub mod stats;
