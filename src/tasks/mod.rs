//! Background Tasks Module
//!
//! Background activities tied to a cache's lifecycle.

mod sweeper;

pub(crate) use sweeper::spawn_sweeper;
