//! Logging macros for ergonomic record construction.
//!
//! Each macro formats its arguments like `format!`, captures the call site
//! (`file!()`, `line!()` and the enclosing function) and hands the record to
//! [`DeliveryEngine::log`](crate::DeliveryEngine::log). The macro evaluates
//! to `true` when the engine accepted the record.
//!
//! # Examples
//!
//! ```
//! use rust_log_engine::prelude::*;
//! use rust_log_engine::info;
//!
//! let engine = DeliveryEngine::with_defaults();
//!
//! info!(engine, "Server started");
//!
//! let port = 8080;
//! let accepted = info!(engine, "Server listening on port {}", port);
//! assert!(accepted);
//! ```

/// Path of the enclosing function, e.g. `my_crate::server::run`
#[doc(hidden)]
#[macro_export]
macro_rules! __function_name {
    () => {{
        fn f() {}
        fn type_name_of<T>(_: T) -> &'static str {
            ::std::any::type_name::<T>()
        }
        let mut name = type_name_of(f);
        name = name.strip_suffix("::f").unwrap_or(name);
        while let Some(outer) = name.strip_suffix("::{{closure}}") {
            name = outer;
        }
        name
    }};
}

/// Log a message at an explicit level.
///
/// # Examples
///
/// ```
/// # use rust_log_engine::prelude::*;
/// # let engine = DeliveryEngine::with_defaults();
/// use rust_log_engine::log;
/// log!(engine, LogLevel::Info, "Simple message");
/// log!(engine, LogLevel::Error, "Error code: {}", 500);
/// ```
#[macro_export]
macro_rules! log {
    ($engine:expr, $level:expr, $($arg:tt)+) => {
        $engine
            .log(
                $crate::LogRecord::new($level, format!($($arg)+)).with_location(
                    file!(),
                    line!(),
                    $crate::__function_name!(),
                ),
            )
            .is_ok()
    };
}

/// Log a trace-level message.
#[macro_export]
macro_rules! trace {
    ($engine:expr, $($arg:tt)+) => {
        $crate::log!($engine, $crate::LogLevel::Trace, $($arg)+)
    };
}

/// Log a debug-level message.
#[macro_export]
macro_rules! debug {
    ($engine:expr, $($arg:tt)+) => {
        $crate::log!($engine, $crate::LogLevel::Debug, $($arg)+)
    };
}

/// Log an info-level message.
#[macro_export]
macro_rules! info {
    ($engine:expr, $($arg:tt)+) => {
        $crate::log!($engine, $crate::LogLevel::Info, $($arg)+)
    };
}

/// Log a warning-level message.
///
/// # Examples
///
/// ```
/// # use rust_log_engine::prelude::*;
/// # let engine = DeliveryEngine::with_defaults();
/// use rust_log_engine::warn;
/// warn!(engine, "Retry attempt {} of {}", 3, 5);
/// ```
#[macro_export]
macro_rules! warn {
    ($engine:expr, $($arg:tt)+) => {
        $crate::log!($engine, $crate::LogLevel::Warn, $($arg)+)
    };
}

/// Log an error-level message.
#[macro_export]
macro_rules! error {
    ($engine:expr, $($arg:tt)+) => {
        $crate::log!($engine, $crate::LogLevel::Error, $($arg)+)
    };
}

/// Log a fatal-level message.
#[macro_export]
macro_rules! fatal {
    ($engine:expr, $($arg:tt)+) => {
        $crate::log!($engine, $crate::LogLevel::Fatal, $($arg)+)
    };
}
