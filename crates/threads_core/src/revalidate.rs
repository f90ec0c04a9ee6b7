//! Cache invalidation boundary.
//!
//! Writes that change what a page renders call [`PathRevalidator`] with the
//! caller-provided route path once the write has committed. Core does not
//! interpret the path.

use log::info;
use std::sync::{Mutex, PoisonError};

pub trait PathRevalidator {
    fn revalidate_path(&self, path: &str);
}

impl<V: PathRevalidator + ?Sized> PathRevalidator for &V {
    fn revalidate_path(&self, path: &str) {
        (**self).revalidate_path(path)
    }
}

/// Emits a `revalidate` log event and nothing else.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogRevalidator;

impl PathRevalidator for LogRevalidator {
    fn revalidate_path(&self, path: &str) {
        info!("event=revalidate module=cache status=ok path={path}");
    }
}

/// Adapts a closure, e.g. one that forwards to a web framework's cache.
pub struct FnRevalidator<F>(pub F);

impl<F: Fn(&str)> PathRevalidator for FnRevalidator<F> {
    fn revalidate_path(&self, path: &str) {
        (self.0)(path)
    }
}

/// Remembers every path it was asked to revalidate, in call order.
#[derive(Debug, Default)]
pub struct RecordingRevalidator {
    paths: Mutex<Vec<String>>,
}

impl RecordingRevalidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn paths(&self) -> Vec<String> {
        self.paths
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl PathRevalidator for RecordingRevalidator {
    fn revalidate_path(&self, path: &str) {
        self.paths
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(path.to_string());
    }
}
