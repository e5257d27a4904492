//! Module containing concept of typed Ethereum RPC batches.
//!
//! Batches of typed methods are executed as a single JSON RPC batch request.
//! Each method resolves independently, so a batch produces one result per
//! method.

use crate::{
    descriptor::Descriptor,
    method::{self, Method},
    Error,
};
use serde_json::Value;

/// A trait defining a batch of typed Ethereum RPC requests.
pub trait Batch {
    type Results;
    type Values;

    /// Returns the descriptors and parameters of the batched calls.
    fn into_calls(self) -> Result<Vec<(Descriptor, Vec<Value>)>, Error>;
    /// Converts the raw call results, in call order, to typed results.
    fn from_results(results: Vec<Result<Value, Error>>) -> Self::Results;
    /// Returns the values of the batched calls, or the first error.
    fn values(results: Self::Results) -> Result<Self::Values, Error>;
}

fn call<M>(method: &M, params: &M::Params) -> Result<(Descriptor, Vec<Value>), Error>
where
    M: Method,
{
    Ok((method::descriptor(method), method::params::<M>(params)?))
}

fn next_result<M, I>(results: &mut I) -> Result<M::Result, Error>
where
    M: Method,
    I: Iterator<Item = Result<Value, Error>>,
{
    results
        .next()
        .unwrap_or_else(|| Err(missing()))
        .and_then(method::result::<M>)
}

fn missing() -> Error {
    Error::InvalidResponse("batch is missing a result".to_owned())
}

macro_rules! impl_batch_for_tuple {
    ($($m:ident),*) => {
        impl<$($m,)*> Batch for ($(($m, <$m>::Params),)*)
        where
            $($m: Method,)*
        {
            type Results = ($(Result<<$m>::Result, Error>,)*);
            type Values = ($(<$m>::Result,)*);

            fn into_calls(self) -> Result<Vec<(Descriptor, Vec<Value>)>, Error> {
                #[allow(non_snake_case)]
                let ($($m,)*) = self;
                Ok(vec![
                    $(call(&$m.0, &$m.1)?,)*
                ])
            }

            fn from_results(results: Vec<Result<Value, Error>>) -> Self::Results {
                #[allow(unused_mut, unused_variables)]
                let mut results = results.into_iter();
                ($(next_result::<$m, _>(&mut results),)*)
            }

            fn values(results: Self::Results) -> Result<Self::Values, Error> {
                #[allow(non_snake_case)]
                let ($($m,)*) = results;
                Ok(($($m?,)*))
            }
        }
    };
}

impl_batch_for_tuple!();
impl_batch_for_tuple!(M0);
impl_batch_for_tuple!(M0, M1);
impl_batch_for_tuple!(M0, M1, M2);
impl_batch_for_tuple!(M0, M1, M2, M3);
impl_batch_for_tuple!(M0, M1, M2, M3, M4);
impl_batch_for_tuple!(M0, M1, M2, M3, M4, M5);
impl_batch_for_tuple!(M0, M1, M2, M3, M4, M5, M6);
impl_batch_for_tuple!(M0, M1, M2, M3, M4, M5, M6, M7);
impl_batch_for_tuple!(M0, M1, M2, M3, M4, M5, M6, M7, M8);
impl_batch_for_tuple!(M0, M1, M2, M3, M4, M5, M6, M7, M8, M9);
impl_batch_for_tuple!(M0, M1, M2, M3, M4, M5, M6, M7, M8, M9, Ma);
impl_batch_for_tuple!(M0, M1, M2, M3, M4, M5, M6, M7, M8, M9, Ma, Mb);

impl<M, const N: usize> Batch for [(M, M::Params); N]
where
    M: Method,
{
    type Results = [Result<M::Result, Error>; N];
    type Values = [M::Result; N];

    fn into_calls(self) -> Result<Vec<(Descriptor, Vec<Value>)>, Error> {
        self.iter()
            .map(|(method, params)| call(method, params))
            .collect()
    }

    fn from_results(results: Vec<Result<Value, Error>>) -> Self::Results {
        let mut results = results.into_iter();
        std::array::from_fn(|_| next_result::<M, _>(&mut results))
    }

    fn values(results: Self::Results) -> Result<Self::Values, Error> {
        results
            .into_iter()
            .collect::<Result<Vec<_>, _>>()?
            .try_into()
            .map_err(|_| missing())
    }
}

impl<M> Batch for Vec<(M, M::Params)>
where
    M: Method,
{
    type Results = Vec<Result<M::Result, Error>>;
    type Values = Vec<M::Result>;

    fn into_calls(self) -> Result<Vec<(Descriptor, Vec<Value>)>, Error> {
        self.iter()
            .map(|(method, params)| call(method, params))
            .collect()
    }

    fn from_results(results: Vec<Result<Value, Error>>) -> Self::Results {
        results
            .into_iter()
            .map(|result| result.and_then(method::result::<M>))
            .collect()
    }

    fn values(results: Self::Results) -> Result<Self::Values, Error> {
        results.into_iter().collect()
    }
}
