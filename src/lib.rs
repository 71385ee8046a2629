// Copyright 2026 codeprobe contributors
// SPDX-License-Identifier: Apache-2.0

//! codeprobe library — concurrent code prober and response archiver.
//!
//! This library crate exposes the core modules for integration testing.

pub mod boundary;
pub mod checked;
pub mod client;
pub mod localize;
pub mod probe;
pub mod runner;
pub mod storage;
pub mod wordlist;
