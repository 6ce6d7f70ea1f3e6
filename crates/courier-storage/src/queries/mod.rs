// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed query modules. Every function takes `&Database` and runs on the writer thread.

pub mod archive;
pub mod campaign_log;
pub mod directory;
pub mod mass_emails;
pub mod queue;
