pub mod no_async_in_foreach;

pub use no_async_in_foreach::TypescriptNoAsyncInForEachRule;
