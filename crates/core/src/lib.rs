// Copyright 2025 Fan-Out Aggregator Contributors
// SPDX-License-Identifier: Apache-2.0

//! Core types for the Fan-Out Aggregator.
//!
//! A fan-out request launches three independent legs (a data-source query,
//! a remote API call and a call to the sibling `/internal` endpoint), times
//! each one on its own clock, joins them and merges the outputs into a single
//! [`AggregatedResult`].
//!
//! # Modules
//!
//! - [`types`] - Wire types: [`BenchmarkRecord`], [`AggregatedResult`], [`Item`], [`InternalReply`]
//! - [`fanout`] - The [`Leg`] trait, per-leg timing and the join
//! - [`error`] - Leg and aggregation errors

#![warn(missing_docs, rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod error;
pub mod fanout;
pub mod types;

pub use error::{AggregationError, LegError};
pub use fanout::{timed_leg, FanOut, Leg, LegContext, Timed};
pub use types::{AggregatedResult, BenchmarkRecord, InternalReply, Item, LegName, Millis};
