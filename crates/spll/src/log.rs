//! Logging facade.
//!
//! Firmware builds log through `defmt` (feature `defmt`), desktop builds
//! through `tracing` (feature `tracing`). With neither enabled the macros
//! compile to nothing and only evaluate their arguments by reference.
//!
//! Format strings must stay within the `{}` subset both backends accept.

macro_rules! debug {
    ($fmt:literal $(, $arg:expr)* $(,)?) => {{
        #[cfg(feature = "defmt")]
        ::defmt::debug!($fmt $(, $arg)*);
        #[cfg(feature = "tracing")]
        ::tracing::debug!($fmt $(, $arg)*);
        #[cfg(not(any(feature = "defmt", feature = "tracing")))]
        {
            $(let _ = &$arg;)*
        }
    }};
}

macro_rules! info {
    ($fmt:literal $(, $arg:expr)* $(,)?) => {{
        #[cfg(feature = "defmt")]
        ::defmt::info!($fmt $(, $arg)*);
        #[cfg(feature = "tracing")]
        ::tracing::info!($fmt $(, $arg)*);
        #[cfg(not(any(feature = "defmt", feature = "tracing")))]
        {
            $(let _ = &$arg;)*
        }
    }};
}

macro_rules! warn {
    ($fmt:literal $(, $arg:expr)* $(,)?) => {{
        #[cfg(feature = "defmt")]
        ::defmt::warn!($fmt $(, $arg)*);
        #[cfg(feature = "tracing")]
        ::tracing::warn!($fmt $(, $arg)*);
        #[cfg(not(any(feature = "defmt", feature = "tracing")))]
        {
            $(let _ = &$arg;)*
        }
    }};
}
