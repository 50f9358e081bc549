//! Logging and unwrap macros that forward to `defmt` when the feature is
//! enabled and compile to nothing otherwise.

#[cfg(feature = "defmt")]
#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => { ::defmt::info!($($arg)*) };
}

#[cfg(not(feature = "defmt"))]
#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => {{}};
}

#[cfg(feature = "defmt")]
#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => { ::defmt::warn!($($arg)*) };
}

#[cfg(not(feature = "defmt"))]
#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => {{}};
}

#[cfg(feature = "defmt")]
#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => { ::defmt::error!($($arg)*) };
}

#[cfg(not(feature = "defmt"))]
#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => {{}};
}

#[cfg(feature = "defmt")]
#[macro_export]
macro_rules! unwrap {
    ($($arg:tt)*) => { ::defmt::unwrap!($($arg)*) };
}

#[cfg(not(feature = "defmt"))]
#[macro_export]
macro_rules! unwrap {
    ($expr:expr $(,)?) => {
        $expr.unwrap()
    };
    ($expr:expr, $($msg:tt)+) => {
        $expr.unwrap()
    };
}
