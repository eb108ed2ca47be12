//! Status messages burned into the output image.
//!
//! Mirrors what the firmware console shows: an error clears the screen and
//! opens a framed banner, warnings and info lines stack below it.

use std::fmt;

use bootsplash_common::colors::{BACKGROUND, ERROR_TEXT, INFO_TEXT, TEXT, WARNING_TEXT};
use bootsplash_common::status::{LogReporter, StatusLine, StatusReporter};
use bootsplash_common::{ErrorKind, StatusCode};
use embedded_graphics::mono_font::{MonoFont, MonoTextStyle};
use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};
use embedded_graphics::text::{Baseline, Text};
use profont::PROFONT_12_POINT;

const FONT: &MonoFont<'static> = &PROFONT_12_POINT;
const MARGIN: i32 = 16;
const PADDING: i32 = 8;
const LINE_GAP: u32 = 4;
const FRAME_STYLE: PrimitiveStyle<Rgb888> = PrimitiveStyle::with_stroke(ERROR_TEXT, 2);

/// One line of console text.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct BannerLine {
    pub color: Rgb888,
    pub text: String,
}

/// The error block at the top of a cleared screen.
#[derive(Clone, PartialEq, Eq, Debug)]
struct ErrorBanner {
    title: String,
    message: String,
    status: String,
}

/// Collects reports for drawing, and forwards them to the log.
#[derive(Default, Debug)]
pub struct BannerReporter {
    error: Option<ErrorBanner>,
    lines: Vec<BannerLine>,
    cleared: bool,
    log: LogReporter,
}

impl BannerReporter {
    /// Lines below the error banner, oldest first.
    pub fn lines(&self) -> &[BannerLine] { &self.lines }

    /// Whether an error report cleared the screen.
    pub const fn cleared(&self) -> bool { self.cleared }

    fn push(
        &mut self,
        color: Rgb888,
        text: String,
    ) {
        self.lines.push(BannerLine { color, text });
    }

    /// Draw the collected reports over whatever the target shows.
    pub fn draw<D>(
        &self,
        target: &mut D,
    ) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb888>,
    {
        if self.cleared {
            target.clear(BACKGROUND)?;
        }

        let line_height = (FONT.character_size.height + LINE_GAP) as i32;
        let mut y = MARGIN;

        if let Some(error) = &self.error {
            let width = target.bounding_box().size.width.saturating_sub(2 * MARGIN as u32);
            let rows = [format!("ERROR: {}", error.title), error.message.clone(), error.status.clone()];
            let height = rows.len() as i32 * line_height + 2 * PADDING;

            Rectangle::new(Point::new(MARGIN, y), Size::new(width, height as u32))
                .into_styled(FRAME_STYLE)
                .draw(target)?;
            for (n, row) in rows.iter().enumerate() {
                let origin = Point::new(MARGIN + PADDING, y + PADDING + n as i32 * line_height);
                Text::with_baseline(row, origin, MonoTextStyle::new(FONT, ERROR_TEXT), Baseline::Top).draw(target)?;
            }
            y += height + PADDING;
        }

        for line in &self.lines {
            Text::with_baseline(&line.text, Point::new(MARGIN, y), MonoTextStyle::new(FONT, line.color), Baseline::Top)
                .draw(target)?;
            y += line_height;
        }
        Ok(())
    }
}

impl StatusReporter for BannerReporter {
    fn report_error(
        &mut self,
        title: &str,
        message: fmt::Arguments<'_>,
        kind: ErrorKind,
        status: Option<StatusCode>,
    ) {
        self.log.report_error(title, message, kind, status);

        // The console clears before an error, dropping earlier lines
        self.cleared = true;
        self.lines.clear();
        self.error = Some(ErrorBanner {
            title: title.to_owned(),
            message: message.to_string(),
            status: StatusLine { kind, status }.to_string(),
        });
    }

    fn report_warning(
        &mut self,
        title: &str,
        message: fmt::Arguments<'_>,
    ) {
        self.log.report_warning(title, message);
        self.push(WARNING_TEXT, format!("WARNING: {}", title));
        self.push(TEXT, format!("  {}", message));
    }

    fn report_info(
        &mut self,
        message: fmt::Arguments<'_>,
    ) {
        self.log.report_info(message);
        self.push(INFO_TEXT, message.to_string());
    }
}

// =============================================================================
// Tests
// =============================================================================
