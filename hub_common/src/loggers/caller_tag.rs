//! Caller tags: short, relative labels for "who is logging".
//!
//! Call sites either pass an explicit tag or use [`caller!`](crate::caller),
//! which resolves the enclosing function at compile time and strips the
//! calling crate's name, so `server_hub::hub::accept_peer` is logged as
//! `hub::accept_peer`. Tags are cosmetic; routing and ordering ignore them.

const PATH_SEPARATOR: &str = "::";
const CLOSURE_SEGMENT: &str = "::{{closure}}";

/// Strips `prefix` and any trailing closure segments from a function path.
pub fn caller_tag<'a>(path: &'a str, prefix: &str) -> &'a str {
    let mut tag = path.strip_prefix(prefix).unwrap_or(path);
    while let Some(outer) = tag.strip_suffix(CLOSURE_SEGMENT) {
        tag = outer;
    }
    tag
}

/// Tags `path` relative to the crate named first in `module_path`.
///
/// A path that is just the crate root keeps its full name.
pub fn crate_relative<'a>(path: &'a str, module_path: &str) -> &'a str {
    let krate = module_path.split(PATH_SEPARATOR).next().unwrap_or_default();
    let tag = caller_tag(path, krate);
    match tag.strip_prefix(PATH_SEPARATOR) {
        Some(relative) if !relative.is_empty() => relative,
        _ => caller_tag(path, ""),
    }
}

/// Resolves the enclosing function as a crate-relative tag.
///
/// ```ignore
/// fn accept_peer() {
///     assert_eq!(hub_common::caller!(), "accept_peer");
/// }
/// ```
#[macro_export]
macro_rules! caller {
    () => {{
        fn __caller_marker() {}
        fn __type_name_of<T>(_: T) -> &'static str {
            ::std::any::type_name::<T>()
        }
        let marker = __type_name_of(__caller_marker);
        let function = marker.strip_suffix("::__caller_marker").unwrap_or(marker);
        $crate::loggers::caller_tag::crate_relative(function, ::std::module_path!())
    }};
}

/// Writes a `format!`-style message tagged with the calling function.
/// Evaluates to a `Send` future; `.await` it.
///
/// The message is rendered into a `String` before the future exists, so no
/// `fmt::Arguments` temporary is held across the `.await`.
///
/// ```ignore
/// hub_common::hub_log!(access, "{} logged in from {}", radio_id, addr).await;
/// ```
#[macro_export]
macro_rules! hub_log {
    ($logger:expr, $($arg:tt)+) => {
        $logger.write_string($crate::caller!(), ::std::format!($($arg)+))
    };
}
