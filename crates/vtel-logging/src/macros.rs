//! ---
//! vtel_section: "03-logging"
//! vtel_subsection: "module"
//! vtel_type: "source"
//! vtel_scope: "code"
//! vtel_description: "Structured logging context and lifecycle events."
//! vtel_version: "v0.0.0-prealpha"
//! vtel_owner: "tbd"
//! ---

/// Shared expansion behind the level-specific macros.
#[doc(hidden)]
#[macro_export]
macro_rules! __vtel_event {
    ($level:expr, $ctx:expr, $($arg:tt)+) => {{
        let ctx = &$ctx;
        $crate::__tracing::event!(
            $level,
            device = ctx.device.unwrap_or(""),
            topic = ctx.topic.unwrap_or(""),
            iteration = ctx.iteration.unwrap_or_default(),
            transport = ctx.transport.unwrap_or(""),
            message = %format_args!($($arg)+)
        );
    }};
}

/// Emit an informational log enriched with journey context.
#[macro_export]
macro_rules! vtel_info {
    (context = $ctx:expr, $($arg:tt)+) => {
        $crate::__vtel_event!($crate::__tracing::Level::INFO, $ctx, $($arg)+)
    };
    ($($arg:tt)+) => {
        $crate::__vtel_event!($crate::__tracing::Level::INFO, $crate::LogContext::default(), $($arg)+)
    };
}

/// Emit a debug log enriched with journey context.
#[macro_export]
macro_rules! vtel_debug {
    (context = $ctx:expr, $($arg:tt)+) => {
        $crate::__vtel_event!($crate::__tracing::Level::DEBUG, $ctx, $($arg)+)
    };
    ($($arg:tt)+) => {
        $crate::__vtel_event!($crate::__tracing::Level::DEBUG, $crate::LogContext::default(), $($arg)+)
    };
}

/// Emit a warning enriched with journey context.
#[macro_export]
macro_rules! vtel_warn {
    (context = $ctx:expr, $($arg:tt)+) => {
        $crate::__vtel_event!($crate::__tracing::Level::WARN, $ctx, $($arg)+)
    };
    ($($arg:tt)+) => {
        $crate::__vtel_event!($crate::__tracing::Level::WARN, $crate::LogContext::default(), $($arg)+)
    };
}

/// Emit an error log enriched with journey context.
#[macro_export]
macro_rules! vtel_error {
    (context = $ctx:expr, $($arg:tt)+) => {
        $crate::__vtel_event!($crate::__tracing::Level::ERROR, $ctx, $($arg)+)
    };
    ($($arg:tt)+) => {
        $crate::__vtel_event!($crate::__tracing::Level::ERROR, $crate::LogContext::default(), $($arg)+)
    };
}
