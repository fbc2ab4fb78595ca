// Preview pipeline — frame sampling and still-image encoding.

pub mod encode;
pub mod sampler;
