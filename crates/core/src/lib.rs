//! Core library for mattecam: periodic single-flight frame analysis.
//!
//! The pipeline samples frames from a [`io::domain::frame_source::FrameSource`]
//! at a fixed cadence, runs at most one segmentation inference at a time, and
//! hands a premultiplied-alpha composite to a
//! [`io::domain::presenter::Presenter`]. Ticks that arrive while a cycle is in
//! flight are dropped, never queued.

pub mod io;
pub mod pipeline;
pub mod segmentation;
pub mod shared;
