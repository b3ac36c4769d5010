//! Abstraction over the external orchestration engine.
//!
//! The engine diffs desired against actual state and talks to the remote
//! cloud API; none of that logic lives here. This crate only hands it a
//! rendered document and reads back the applied state.

use std::future::Future;
use std::pin::Pin;

use crate::document::Document;
use crate::state::StackState;

/// Future returned by engine operations.
pub type EngineFuture<'a, T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'a>>;

/// Minimal interface implemented by orchestration engines.
pub trait Engine {
    /// Engine specific error type.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Applies the document and returns the resulting state record.
    fn apply<'a>(&'a self, document: &'a Document) -> EngineFuture<'a, StackState, Self::Error>;

    /// Destroys everything the engine currently manages for this working
    /// directory.
    fn destroy(&self) -> EngineFuture<'_, (), Self::Error>;
}
