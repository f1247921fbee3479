use crate::error::{Error, Result};
use crate::lcos::{Future, SharedFuture};

/// Continuation handed to an input, called once when it completes.
pub type Arrival = Box<dyn FnOnce(Option<Error>) + Send>;

mod sealed {
    pub trait Sealed {}
}

/// A single dataflow input: something that completes once with a value or
/// an error.
///
/// Implemented by [`Future`] and [`SharedFuture`].
pub trait Input: sealed::Sealed + Send + 'static {
    type Value: Send + 'static;

    /// Registers `arrival` to run once the input completes.
    fn subscribe(&self, arrival: Arrival);

    /// Blocks until the input completes.
    fn wait(&self);

    /// Extracts the outcome of a completed input.
    fn take(self) -> Result<Self::Value>;
}

impl<T: Send + 'static> sealed::Sealed for Future<T> {}

impl<T: Send + 'static> Input for Future<T> {
    type Value = T;

    fn subscribe(&self, arrival: Arrival) {
        self.state().on_complete(arrival);
    }

    fn wait(&self) {
        Future::wait(self);
    }

    fn take(self) -> Result<T> {
        self.state().take().unwrap_or(Err(Error::BrokenPromise))
    }
}

impl<T: Clone + Send + 'static> sealed::Sealed for SharedFuture<T> {}

impl<T: Clone + Send + 'static> Input for SharedFuture<T> {
    type Value = T;

    fn subscribe(&self, arrival: Arrival) {
        self.state().on_complete(arrival);
    }

    fn wait(&self) {
        SharedFuture::wait(self);
    }

    fn take(self) -> Result<T> {
        self.state().peek().unwrap_or(Err(Error::BrokenPromise))
    }
}

/// The full input set of a dataflow: `()`, a tuple of inputs, or a `Vec`
/// of inputs of one type.
///
/// The combining function receives [`Values`](Inputs::Values): `()`, a
/// tuple of the input values in order, or a `Vec` of values in order.
pub trait Inputs: Send + 'static {
    type Values: Send + 'static;

    /// Number of inputs.
    fn count(&self) -> usize;

    /// Registers one arrival per input, obtained from `arrival`.
    fn subscribe(&self, arrival: &mut dyn FnMut() -> Arrival);

    /// Blocks until every input completes.
    fn wait(&self);

    /// Extracts every value. Fails with the first error in input order.
    fn take(self) -> Result<Self::Values>;
}

impl Inputs for () {
    type Values = ();

    fn count(&self) -> usize {
        0
    }

    fn subscribe(&self, _arrival: &mut dyn FnMut() -> Arrival) {}

    fn wait(&self) {}

    fn take(self) -> Result<()> {
        Ok(())
    }
}

impl<I: Input> Inputs for Vec<I> {
    type Values = Vec<I::Value>;

    fn count(&self) -> usize {
        self.len()
    }

    fn subscribe(&self, arrival: &mut dyn FnMut() -> Arrival) {
        for input in self {
            input.subscribe(arrival());
        }
    }

    fn wait(&self) {
        for input in self {
            input.wait();
        }
    }

    fn take(self) -> Result<Vec<I::Value>> {
        self.into_iter().map(Input::take).collect()
    }
}

macro_rules! impl_inputs_for_tuple {
    ($count:expr; $($name:ident),+) => {
        impl<$($name: Input),+> Inputs for ($($name,)+) {
            type Values = ($($name::Value,)+);

            fn count(&self) -> usize {
                $count
            }

            #[allow(non_snake_case)]
            fn subscribe(&self, arrival: &mut dyn FnMut() -> Arrival) {
                let ($($name,)+) = self;
                $($name.subscribe(arrival());)+
            }

            #[allow(non_snake_case)]
            fn wait(&self) {
                let ($($name,)+) = self;
                $($name.wait();)+
            }

            #[allow(non_snake_case)]
            fn take(self) -> Result<Self::Values> {
                let ($($name,)+) = self;
                Ok(($($name.take()?,)+))
            }
        }
    };
}

impl_inputs_for_tuple!(1; A);
impl_inputs_for_tuple!(2; A, B);
impl_inputs_for_tuple!(3; A, B, C);
impl_inputs_for_tuple!(4; A, B, C, D);
impl_inputs_for_tuple!(5; A, B, C, D, E);
impl_inputs_for_tuple!(6; A, B, C, D, E, F);
impl_inputs_for_tuple!(7; A, B, C, D, E, F, G);
impl_inputs_for_tuple!(8; A, B, C, D, E, F, G, H);
