
///
/// The common fallible-result alias used across the workspace.
///
pub use anyhow::{Context, Result};

///
/// The backing crate, re-exported so the macro below resolves from any
/// crate in the workspace.
///
pub use anyhow;

///
/// Constructs an ad-hoc error value from a format string.
///
#[macro_export]
macro_rules! error
{
    ($($arg: tt) *) =>
    {
        $crate::error::anyhow::anyhow!($($arg) *)
    }
}

pub use crate::error;

#[cfg(test)]
mod tests
{
    #[test]
    fn the_error_macro_formats_its_message ()
    {
        let err = crate::error!("Mode '{}' is unsupported.", "replay");
        assert_eq!(err.to_string(), "Mode 'replay' is unsupported.");
    }
}
