// Copyright (C) 2025 Paul Hampson
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License version 3 as  published by the
// Free Software Foundation.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE.  See the GNU General Public License for more
// details.
//
// You should have received a copy of the GNU General Public License along with
// this program.  If not, see <https://www.gnu.org/licenses/>.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};

use crate::history::SampleHistory;

/// Half of the serial clock period. The datasheet allows 0.2 us to 50 us
/// of PD_SCK high time.
const CLK_HALF_PERIOD_US: u32 = 1;

/// Time a PD_SCK level has to be held to register as a power mode change.
const POWER_MODE_CHANGE_US: u32 = 60;

/// Channel and gain for the next conversion, encoded as the number of
/// extra clock pulses issued after the 24 data bits.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Gain {
    /// Channel A, gain 128.
    A128 = 1,
    /// Channel B, gain 32.
    B32 = 2,
    /// Channel A, gain 64.
    A64 = 3,
}

impl Gain {
    fn extra_pulses(self) -> u8 {
        self as u8
    }
}

/// Construction-time driver settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    /// Requested history depth in samples, clamped to 6..=85.
    pub depth: usize,
    /// Channel and gain programmed by the first capture.
    pub gain: Gain,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            depth: 12,
            gain: Gain::A128,
        }
    }
}

/// Pin access failure during a driver operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<ClkE, DataE> {
    /// The clock output pin failed.
    Clock(ClkE),
    /// The data input pin failed.
    Data(DataE),
}

/// Polled HX711 driver.
///
/// Owns the clock and data pins, the gain selection, the tare/scale
/// calibration state and a circular history of recent readings. A control
/// loop calls [`update`](Self::update) on its own cadence; all read
/// operations work on the captured history and never touch the pins.
pub struct Hx711<Clk, Data, Delay> {
    clock: Clk,
    data: Data,
    delay: Delay,
    gain: Gain,
    offset: i32,
    scale: f32,
    history: SampleHistory,
}

impl<Clk, Data, Delay, ClkE, DataE> Hx711<Clk, Data, Delay>
where
    Clk: OutputPin<Error = ClkE>,
    Data: InputPin<Error = DataE>,
    Delay: DelayNs,
{
    /// Creates the driver without touching the pins.
    ///
    /// The history starts out zeroed, the tare offset at 0 and the scale
    /// factor at 1.0. Call [`begin`](Self::begin) once before polling.
    pub fn new(clock: Clk, data: Data, delay: Delay, config: Config) -> Self {
        Self {
            clock,
            data,
            delay,
            gain: config.gain,
            offset: 0,
            scale: 1.0,
            history: SampleHistory::new(config.depth),
        }
    }

    /// Establishes the idle clock level and wakes the chip.
    ///
    /// The first conversion is ready a few hundred milliseconds later;
    /// keep calling [`update`](Self::update) until it reports a capture.
    pub fn begin(&mut self) -> Result<(), Error<ClkE, DataE>> {
        self.power_up()
    }

    /// Checks for a finished conversion and captures it into the history.
    ///
    /// Returns `Ok(false)` immediately when no conversion is pending,
    /// leaving the clock line untouched. When data is ready the 24 data
    /// bits are shifted in MSB first and the clock is pulsed a further one
    /// to three times to program the channel and gain of the next
    /// conversion. The shift-in runs with interrupts masked: a stretched
    /// clock-high period would power the chip down mid-read and corrupt
    /// the remaining bits.
    pub fn update(&mut self) -> Result<bool, Error<ClkE, DataE>> {
        if !self.is_ready()? {
            return Ok(false);
        }

        let extra_pulses = self.gain.extra_pulses();
        let raw = critical_section::with(|_| -> Result<u32, Error<ClkE, DataE>> {
            let mut raw = 0;
            for _ in 0..24 {
                raw = (raw << 1) | u32::from(self.read_bit()?);
            }
            for _ in 0..extra_pulses {
                self.pulse_clock()?;
            }
            Ok(raw)
        })?;

        self.history.record(raw);
        Ok(true)
    }

    /// Most recent captured reading, sign extended to `i32`.
    ///
    /// Never touches the pins. Before the first capture the history is
    /// zeroed and this returns 0.
    pub fn read_raw(&self) -> i32 {
        self.history.latest()
    }

    /// Truncating mean of the `times` most recent readings; 10 is the
    /// customary window.
    ///
    /// `times` beyond the history depth silently picks up displaced stale
    /// readings. Panics on a `times` of zero (division by zero).
    pub fn read_average(&self, times: usize) -> i32 {
        self.history.average(times)
    }

    /// Offset-adjusted reading: [`read_average`](Self::read_average) over
    /// `times` readings minus the tare offset. A single reading is the
    /// customary instantaneous value.
    pub fn value(&self, times: usize) -> i32 {
        self.read_average(times) - self.offset
    }

    /// [`value`](Self::value) scaled into physical units by the scale
    /// factor. A single reading is customary here as well.
    pub fn units(&self, times: usize) -> f32 {
        self.value(times) as f32 / self.scale
    }

    /// Makes the present load read as zero by averaging `times` readings
    /// into the tare offset. A window of 10 is customary, wider than
    /// [`value`](Self::value)'s, for a steadier baseline.
    pub fn tare(&mut self, times: usize) {
        let offset = self.read_average(times);
        #[cfg(feature = "defmt")]
        defmt::trace!("tare offset = {}", offset);
        self.offset = offset;
    }

    /// Sets the factor that divides offset-adjusted readings into units.
    /// Non-zero by caller convention.
    pub fn set_scale(&mut self, scale: f32) {
        self.scale = scale;
    }

    /// Current scale factor.
    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Sets the baseline subtracted by [`value`](Self::value).
    pub fn set_offset(&mut self, offset: i32) {
        self.offset = offset;
    }

    /// Current tare offset.
    pub fn offset(&self) -> i32 {
        self.offset
    }

    /// Selects the channel and gain programmed by the next capture.
    pub fn set_gain(&mut self, gain: Gain) {
        self.gain = gain;
    }

    /// Currently selected channel and gain.
    pub fn gain(&self) -> Gain {
        self.gain
    }

    /// Effective history depth in samples after clamping.
    pub fn history_depth(&self) -> usize {
        self.history.depth()
    }

    /// Sends the chip to sleep by holding the clock line high.
    ///
    /// The line is dropped low first so the high period starts from a
    /// defined edge; the chip sleeps once PD_SCK has been high for 60 us.
    pub fn power_down(&mut self) -> Result<(), Error<ClkE, DataE>> {
        self.clock.set_low().map_err(Error::Clock)?;
        self.clock.set_high().map_err(Error::Clock)?;
        self.delay.delay_us(POWER_MODE_CHANGE_US);
        Ok(())
    }

    /// Wakes the chip by dropping the clock line low.
    ///
    /// The chip then needs its own settling time, on the order of hundreds
    /// of milliseconds, before the next conversion is ready; the driver
    /// does not wait for that.
    pub fn power_up(&mut self) -> Result<(), Error<ClkE, DataE>> {
        self.clock.set_low().map_err(Error::Clock)?;
        self.delay.delay_us(POWER_MODE_CHANGE_US);
        Ok(())
    }

    /// Deconstructs the driver and hands the pins and delay back, so the
    /// caller can return the clock line to a neutral state.
    pub fn release(self) -> (Clk, Data, Delay) {
        (self.clock, self.data, self.delay)
    }

    /// A finished conversion is signalled by the data line sitting low.
    fn is_ready(&mut self) -> Result<bool, Error<ClkE, DataE>> {
        self.data.is_low().map_err(Error::Data)
    }

    /// One clock pulse, sampling the data line right after the rising
    /// edge. Bits arrive MSB first.
    fn read_bit(&mut self) -> Result<bool, Error<ClkE, DataE>> {
        self.clock.set_high().map_err(Error::Clock)?;
        self.delay.delay_us(CLK_HALF_PERIOD_US);
        let bit = self.data.is_high().map_err(Error::Data)?;
        self.clock.set_low().map_err(Error::Clock)?;
        self.delay.delay_us(CLK_HALF_PERIOD_US);
        Ok(bit)
    }

    fn pulse_clock(&mut self) -> Result<(), Error<ClkE, DataE>> {
        self.clock.set_high().map_err(Error::Clock)?;
        self.delay.delay_us(CLK_HALF_PERIOD_US);
        self.clock.set_low().map_err(Error::Clock)?;
        self.delay.delay_us(CLK_HALF_PERIOD_US);
        Ok(())
    }
}
