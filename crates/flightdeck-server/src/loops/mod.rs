//! Background tasks.

pub mod playback_loop;
