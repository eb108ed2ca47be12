//! Operator-facing status messages.
//!
//! Reports are purely observational: nothing in the boot flow branches on
//! them. The UEFI binary prints to the text console in color, the simulator
//! routes them through `log`.

use core::fmt;

use crate::error::{ErrorKind, StatusCode};

/// Sink for status messages shown to the operator.
pub trait StatusReporter {
    /// Prominent error with its classification and, when the platform
    /// supplied one, the raw status.
    fn report_error(
        &mut self,
        title: &str,
        message: fmt::Arguments<'_>,
        kind: ErrorKind,
        status: Option<StatusCode>,
    );

    /// Non-fatal problem.
    fn report_warning(
        &mut self,
        title: &str,
        message: fmt::Arguments<'_>,
    );

    /// Informational line.
    fn report_info(
        &mut self,
        message: fmt::Arguments<'_>,
    );
}

/// Reporter that forwards everything to the `log` facade.
#[derive(Clone, Copy, Default, Debug)]
pub struct LogReporter;

impl StatusReporter for LogReporter {
    fn report_error(
        &mut self,
        title: &str,
        message: fmt::Arguments<'_>,
        kind: ErrorKind,
        status: Option<StatusCode>,
    ) {
        match status {
            Some(status) => log::error!("{}: {} [{}, status {} {}]", title, message, kind, status.name(), status),
            None => log::error!("{}: {} [{}]", title, message, kind),
        }
    }

    fn report_warning(
        &mut self,
        title: &str,
        message: fmt::Arguments<'_>,
    ) {
        log::warn!("{}: {}", title, message);
    }

    fn report_info(
        &mut self,
        message: fmt::Arguments<'_>,
    ) {
        log::info!("{}", message);
    }
}

/// The `Status:` line of an error banner.
///
/// Names the firmware status when there is one, the error kind otherwise.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct StatusLine {
    pub kind: ErrorKind,
    pub status: Option<StatusCode>,
}

impl fmt::Display for StatusLine {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "Status: {} ({})", status, status.name()),
            None => write!(f, "Status: {}", self.kind),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
