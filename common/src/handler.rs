//! [`Handler`] abstractions.
//!
//! Every capability of the service (commands, queries, storages) is expressed
//! as a [`Handler`] of some operation type, so collaborators are injected as
//! plain generic parameters.

use std::future::Future;

/// Executable handler of `Args` operation.
pub trait Handler<Args = ()> {
    /// Type of successful [`Handler`] result.
    type Ok;

    /// Type of this [`Handler`] error.
    type Err;

    /// Executes this [`Handler`] with the provided arguments.
    fn execute(
        &self,
        args: Args,
    ) -> impl Future<Output = Result<Self::Ok, Self::Err>>;
}
