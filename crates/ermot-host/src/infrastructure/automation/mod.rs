//! Host automation adapters.
//!
//! - **`desktop`** – the real `InputAutomation`: pointer and keyboard through
//!   `enigo`, clipboard through `arboard`, all on one dedicated thread.
//! - **`power`** – `ShellCommandRunner`, which hands power commands to the
//!   platform shell without waiting.
//! - **`mock`** – `MockAutomation`, a recording fake for tests.

pub mod desktop;
pub mod mock;
pub mod power;
