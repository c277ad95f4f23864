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

//! Polled, non-blocking driver for the Avia HX711 24 bit load cell ADC.
//!
//! The HX711 finishes a conversion only every 100 ms to 300 ms depending on
//! its rate pin and the selected channel. This driver never waits for that:
//! [`Hx711::update`] samples the data-ready line and either returns
//! immediately or clocks the finished conversion into a fixed-capacity
//! circular history. Everything else ([`Hx711::read_average`],
//! [`Hx711::value`], [`Hx711::units`], [`Hx711::tare`]) works on the
//! history that has already been captured, so a control loop can call it
//! at any cadence without stalling.
//!
//! Pin access and microsecond timing are injected through the
//! `embedded-hal` 1.0 [`OutputPin`](embedded_hal::digital::OutputPin),
//! [`InputPin`](embedded_hal::digital::InputPin) and
//! [`DelayNs`](embedded_hal::delay::DelayNs) traits, so the driver runs on
//! any HAL and against mock pins on the host.
//!
//! The `defmt` cargo feature adds `defmt::Format` on the public types and
//! trace output on calibration.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]

mod history;
mod hx711;

pub use crate::hx711::{Config, Error, Gain, Hx711};
