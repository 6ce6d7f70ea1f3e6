// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Single-writer documentation and enforcement.
//!
//! All writes in courier-storage are serialized through `tokio-rusqlite`'s
//! single background thread. The `Database` struct IS the single writer.
//! Query modules accept `&Database` and call through `connection().call()`.
//!
//! The send budget depends on this: `claim_batch` reads the sent and
//! in-flight counts and writes its claims inside one closure, so no other
//! batch can observe the counts between the read and the claim.
//!
//! **Do NOT create additional Connection instances for writes.**
