//! [`Handler`] abstractions.
//!
//! Every layer of the service (commands, queries, storage, mail delivery)
//! is expressed as a [`Handler`] of some operation type, so that layers can
//! be swapped independently.

use std::future::Future;

/// Asynchronous handler of `Args` operation.
pub trait Handler<Args = ()> {
    /// Type of successful [`Handler`] outcome.
    type Ok;

    /// Type of this [`Handler`] error.
    type Err;

    /// Executes this [`Handler`] with the provided operation.
    fn execute(
        &self,
        args: Args,
    ) -> impl Future<Output = Result<Self::Ok, Self::Err>>;
}
