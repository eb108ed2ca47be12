//! Colored text console reporter.
//!
//! | Report | Color | Layout |
//! |--------|-------|--------|
//! | Error | light red | screen cleared, boxed banner |
//! | Warning | yellow | title line plus message |
//! | Info | light cyan | single indented line |

use alloc::string::String;
use core::fmt::{self, Write};

use bootsplash_common::error::{ErrorKind, StatusCode};
use bootsplash_common::status::{StatusLine, StatusReporter};
use uefi::proto::console::text::{Color, Output};
use uefi::system;

/// Inner width of the error banner, in characters.
const BANNER_WIDTH: usize = 60;

/// Reports to the firmware text console.
pub struct ConsoleReporter;

fn with_color(
    foreground: Color,
    print: impl FnOnce(&mut Output) -> fmt::Result,
) {
    system::with_stdout(|out| {
        out.set_color(foreground, Color::Black).ok();
        print(out).ok();
        out.set_color(Color::LightGray, Color::Black).ok();
    });
}

fn banner_line(
    out: &mut Output,
    text: &str,
) -> fmt::Result {
    let text: String = text.chars().take(BANNER_WIDTH - 4).collect();
    writeln!(out, "  ║  {:<width$}  ║", text, width = BANNER_WIDTH - 4)
}

fn banner_rule(
    out: &mut Output,
    left: char,
    right: char,
) -> fmt::Result {
    write!(out, "  {}", left)?;
    for _ in 0..BANNER_WIDTH {
        out.write_char('═')?;
    }
    writeln!(out, "{}", right)
}

impl StatusReporter for ConsoleReporter {
    fn report_error(
        &mut self,
        title: &str,
        message: fmt::Arguments<'_>,
        kind: ErrorKind,
        status: Option<StatusCode>,
    ) {
        system::with_stdout(|out| {
            out.clear().ok();
        });

        with_color(Color::LightRed, |out| {
            writeln!(out)?;
            banner_rule(out, '╔', '╗')?;
            banner_line(out, "")?;
            banner_line(out, &alloc::format!("ERROR: {}", title))?;
            banner_line(out, "")?;
            banner_rule(out, '╠', '╣')?;
            banner_line(out, "")?;
            banner_line(out, &alloc::format!("{}", message))?;
            banner_line(out, "")?;
            banner_line(out, &alloc::format!("{}", StatusLine { kind, status }))?;
            banner_line(out, "")?;
            banner_rule(out, '╚', '╝')?;
            writeln!(out)
        });
    }

    fn report_warning(
        &mut self,
        title: &str,
        message: fmt::Arguments<'_>,
    ) {
        with_color(Color::Yellow, |out| {
            writeln!(out, "\n  WARNING: {}", title)?;
            writeln!(out, "  {}\n", message)
        });
    }

    fn report_info(
        &mut self,
        message: fmt::Arguments<'_>,
    ) {
        with_color(Color::LightCyan, |out| writeln!(out, "  {}", message));
    }
}
