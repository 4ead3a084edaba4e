//! Helper macros for logging (console printing).

use env_logger::Env;

/// Initializes the logger, with the filter level taken from the environment
/// (defaulting to `info`).
pub fn logger_init() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .format_module_path(true)
        .format_target(false)
        .init();
}

/// Log TRACE message.
#[macro_export]
macro_rules! pf_trace {
    ($($fmt_arg:tt)*) => {
        log::trace!($($fmt_arg)*)
    };
}

/// Log DEBUG message.
#[macro_export]
macro_rules! pf_debug {
    ($($fmt_arg:tt)*) => {
        log::debug!($($fmt_arg)*)
    };
}

/// Log INFO message.
#[macro_export]
macro_rules! pf_info {
    ($($fmt_arg:tt)*) => {
        log::info!($($fmt_arg)*)
    };
}

/// Log WARN message.
#[macro_export]
macro_rules! pf_warn {
    ($($fmt_arg:tt)*) => {
        log::warn!($($fmt_arg)*)
    };
}

/// Log ERROR message.
#[macro_export]
macro_rules! pf_error {
    ($($fmt_arg:tt)*) => {
        log::error!($($fmt_arg)*)
    };
}

/// Log an error message to logger and then return a `ReplikvError`
/// containing the same message.
///
/// Example:
/// ```no_run
/// use replikv::logged_err;
///
/// fn describe(msg: &str) -> Result<String, replikv::ReplikvError> {
///     return logged_err!("got {} to print", msg);
/// }
/// ```
#[macro_export]
macro_rules! logged_err {
    ($($fmt_arg:tt)*) => {{
        $crate::pf_error!($($fmt_arg)*);
        Err($crate::ReplikvError(format!($($fmt_arg)*)))
    }};
}

#[cfg(test)]
mod print_tests {
    use crate::ReplikvError;

    fn returns_logged_err() -> Result<(), ReplikvError> {
        logged_err!("got {} to print", 777)
    }

    #[test]
    fn error_with_args() {
        assert_eq!(
            returns_logged_err(),
            Err(ReplikvError("got 777 to print".into()))
        );
    }
}
