//! SSD1306 status display.
//!
//! All drawing goes through [`DisplayManager`], which owns the panel. Other
//! tasks never touch the display directly; they post events and the
//! dispatcher redraws.

use core::fmt::Write as _;

use display_interface::DisplayError;
use embassy_nrf::gpio::Output;
use embedded_graphics::mono_font::ascii::{FONT_10X20, FONT_6X10};
use embedded_graphics::mono_font::MonoTextStyle;
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};
use embedded_graphics::text::{Alignment, Baseline, Text, TextStyleBuilder};
use portable_atomic::Ordering;
use ssd1306::mode::{BufferedGraphicsModeAsync, DisplayConfigAsync};
use ssd1306::prelude::*;
use ssd1306::{I2CDisplayInterface, Ssd1306Async};

use crate::tasks::BATTERY_MILLIVOLTS;
use crate::{warn, SharedI2c};
use irt_core::AcquisitionUi;

type Oled = Ssd1306Async<
    I2CInterface<SharedI2c>,
    DisplaySize128x64,
    BufferedGraphicsModeAsync<DisplaySize128x64>,
>;

const BAR_ORIGIN: Point = Point::new(0, 54);
const BAR_WIDTH: u32 = 80;
const BAR_HEIGHT: u32 = 9;

pub struct DisplayManager {
    oled: Oled,
    powered: bool,
}

impl DisplayManager {
    pub fn new(i2c: SharedI2c) -> Self {
        let interface = I2CDisplayInterface::new(i2c);
        let oled = Ssd1306Async::new(
            interface,
            DisplaySize128x64,
            DisplayRotation::Rotate0,
        )
        .into_buffered_graphics_mode();
        Self { oled, powered: false }
    }

    pub async fn init(&mut self) -> Result<(), DisplayError> {
        self.oled.init().await?;
        self.oled.clear(BinaryColor::Off)?;
        self.oled.flush().await?;
        self.powered = true;
        Ok(())
    }

    pub fn is_powered(&self) -> bool {
        self.powered
    }

    pub async fn power_on(&mut self) -> Result<(), DisplayError> {
        if !self.powered {
            self.oled.set_display_on(true).await?;
            self.powered = true;
        }
        Ok(())
    }

    /// Blank the panel and turn the charge pump off.
    pub async fn power_off(&mut self) -> Result<(), DisplayError> {
        self.oled.clear(BinaryColor::Off)?;
        self.oled.flush().await?;
        self.oled.set_display_on(false).await?;
        self.powered = false;
        Ok(())
    }

    /// Two centered text lines plus the battery voltage corner.
    pub async fn show_status(
        &mut self,
        top: &str,
        bottom: &str,
    ) -> Result<(), DisplayError> {
        self.oled.clear(BinaryColor::Off)?;
        let style = MonoTextStyle::new(&FONT_10X20, BinaryColor::On);
        Text::with_alignment(top, Point::new(64, 20), style, Alignment::Center)
            .draw(&mut self.oled)?;
        Text::with_alignment(
            bottom,
            Point::new(64, 42),
            style,
            Alignment::Center,
        )
        .draw(&mut self.oled)?;
        self.draw_battery()?;
        self.oled.flush().await
    }

    /// Final acquisition result, two decimal places.
    pub async fn show_result(
        &mut self,
        celsius: f32,
    ) -> Result<(), DisplayError> {
        let mut line: heapless::String<16> = heapless::String::new();
        if write!(line, "{celsius:.2} C").is_err() {
            line = heapless::String::try_from("--.-- C").unwrap_or_default();
        }
        self.show_status("RESULT", line.as_str()).await
    }

    /// Redraw only the progress bar region; the status text above stays put.
    pub async fn show_progress(
        &mut self,
        percent: u8,
    ) -> Result<(), DisplayError> {
        let percent = percent.min(100) as u32;
        Rectangle::new(BAR_ORIGIN, Size::new(BAR_WIDTH, BAR_HEIGHT))
            .into_styled(PrimitiveStyle::with_fill(BinaryColor::Off))
            .draw(&mut self.oled)?;
        Rectangle::new(BAR_ORIGIN, Size::new(BAR_WIDTH, BAR_HEIGHT))
            .into_styled(PrimitiveStyle::with_stroke(BinaryColor::On, 1))
            .draw(&mut self.oled)?;
        let fill = (BAR_WIDTH - 4) * percent / 100;
        if fill > 0 {
            Rectangle::new(
                BAR_ORIGIN + Point::new(2, 2),
                Size::new(fill, BAR_HEIGHT - 4),
            )
            .into_styled(PrimitiveStyle::with_fill(BinaryColor::On))
            .draw(&mut self.oled)?;
        }
        self.oled.flush().await
    }

    fn draw_battery(&mut self) -> Result<(), DisplayError> {
        let mv = BATTERY_MILLIVOLTS.load(Ordering::Relaxed);
        let mut text: heapless::String<12> = heapless::String::new();
        let _ = write!(text, "{}.{:02}V", mv / 1000, (mv % 1000) / 10);
        let style = MonoTextStyle::new(&FONT_6X10, BinaryColor::On);
        let placement = TextStyleBuilder::new()
            .alignment(Alignment::Right)
            .baseline(Baseline::Bottom)
            .build();
        Text::with_text_style(
            text.as_str(),
            Point::new(127, 63),
            style,
            placement,
        )
        .draw(&mut self.oled)?;
        Ok(())
    }
}

/// Progress reporter for the acquisition window: redraws the bar only when
/// the percentage moves and blinks the LEDs so a headless unit still shows
/// activity.
pub struct ProgressUi<'a> {
    display: &'a mut DisplayManager,
    led_green: &'a mut Output<'static>,
    led_blue: &'a mut Output<'static>,
    last_percent: Option<u8>,
}

impl<'a> ProgressUi<'a> {
    pub fn new(
        display: &'a mut DisplayManager,
        led_green: &'a mut Output<'static>,
        led_blue: &'a mut Output<'static>,
    ) -> Self {
        Self { display, led_green, led_blue, last_percent: None }
    }
}

impl AcquisitionUi for ProgressUi<'_> {
    async fn progress(&mut self, percent: u8) {
        if self.last_percent == Some(percent) {
            return;
        }
        self.last_percent = Some(percent);
        self.led_green.toggle();
        self.led_blue.toggle();
        if self.display.show_progress(percent).await.is_err() {
            warn!("progress redraw failed");
        }
    }
}
