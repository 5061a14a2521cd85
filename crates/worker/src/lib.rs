//! Daily digest worker: the wall-clock scheduler, the optional distributed
//! run lock, and the glue that runs a [`campus_engine::pipeline::DigestJob`]
//! on schedule.

pub mod run_lock;
pub mod schedule;
pub mod scheduler;
pub mod task;
