//! Error plumbing shared by the workspace crates.
//!
//! Errors in this workspace are `snafu` enums whose variants carry an implicit
//! [`Location`] recording where the error was raised. [`HasLocation`] exposes
//! that location, and [`Report`] renders an error together with its cause
//! chain.

#![cfg_attr(not(test), no_std)]

use core::{error::Error, fmt};

use snafu::GenerateImplicitData;

/// Source location where an error was created.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Location(&'static core::panic::Location<'static>);

impl Default for Location {
    #[track_caller]
    fn default() -> Self {
        Self(core::panic::Location::caller())
    }
}

impl GenerateImplicitData for Location {
    #[track_caller]
    fn generate() -> Self {
        Self::default()
    }
}

impl Location {
    /// Returns the source file the location points into.
    #[must_use]
    pub fn file(&self) -> &'static str {
        self.0.file()
    }

    /// Returns the line number of the location.
    #[must_use]
    pub fn line(&self) -> u32 {
        self.0.line()
    }
}

impl fmt::Debug for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Errors that remember the call site they were raised at.
pub trait HasLocation {
    /// Returns where the error was created.
    fn location(&self) -> Location;
}

/// Human-readable rendering of an error and the chain of errors that caused it.
///
/// ```text
/// Error: node storage request failed
///   at crates/linked-sequence/src/sequence.rs:120:14
///
/// Caused by:
///    0: region exhausted: requested 1 slot(s), 0 of 10 available
/// ```
pub struct Report<E> {
    error: E,
}

impl<E> fmt::Debug for Report<E>
where
    E: Error + HasLocation,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl<E> fmt::Display for Report<E>
where
    E: Error + HasLocation,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Error: {}", self.error)?;
        writeln!(f, "  at {}", self.error.location())?;
        let mut source = self.error.source();
        if source.is_some() {
            writeln!(f)?;
            writeln!(f, "Caused by:")?;
        }
        let mut index = 0;
        while let Some(s) = source {
            writeln!(f, "{index:4}: {s}")?;
            source = s.source();
            index += 1;
        }
        Ok(())
    }
}

impl<E> Report<E> {
    /// Wraps `error` for rendering.
    pub fn new(error: E) -> Self {
        Self { error }
    }

    /// Returns the wrapped error.
    pub fn into_inner(self) -> E {
        self.error
    }
}
