//! Dayboard: a headless personal-productivity engine. Task board with
//! fractional drag ordering, plan lifecycle with mind-map views, a note
//! filesystem, and draft-buffered settings, all persisted in SQLite.

pub mod board;
pub mod domain;
pub mod mindmap;
pub mod ordering;
pub mod repository;
pub mod services;
pub mod settings;
pub mod sync;
