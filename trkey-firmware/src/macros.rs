//! Logging that works on the device (with or without `defmt`) and on the host during tests.
//!
//! Only `{}` and `{:?}` placeholders may be used so the same call compiles against both `defmt` and
//! `std::format!`.

#[allow(unused)]
#[cfg(all(not(test), not(feature = "defmt"), not(feature = "test-utils")))]
mod silent {
    #[macro_export]
    macro_rules! debug {
        ($($arg:expr),*) => {{let _ = ($(&$arg),*);}};
    }

    #[macro_export]
    macro_rules! info {
        ($($arg:expr),*) => {{let _ = ($(&$arg),*);}};
    }

    #[macro_export]
    macro_rules! warn {
        ($($arg:expr),*) => {{let _ = ($(&$arg),*);}};
    }

    #[macro_export]
    macro_rules! error {
        ($($arg:expr),*) => {{let _ = ($(&$arg),*);}};
    }
}

#[cfg(all(not(test), not(feature = "test-utils"), feature = "defmt"))]
mod defmt {
    /// Log debug messages through [defmt::debug].
    ///
    /// ```rust
    /// # #[macro_use] extern crate trkey_firmware;
    /// # fn main() {
    /// let layer = 2;
    /// debug!("switched to layer {}", layer);
    /// # }
    /// ```
    #[macro_export]
    macro_rules! debug {
        ($($arg:expr),*) => {
            defmt::debug!($($arg,)*)
        };
    }

    #[macro_export]
    macro_rules! info {
        ($($arg:expr),*) => {
            defmt::info!($($arg,)*)
        };
    }

    #[macro_export]
    macro_rules! warn {
        ($($arg:expr),*) => {
            defmt::warn!($($arg,)*)
        };
    }

    #[macro_export]
    macro_rules! error {
        ($($arg:expr),*) => {
            defmt::error!($($arg,)*)
        };
    }
}

#[cfg(any(test, feature = "test-utils"))]
mod host {
    /// Keyboard usage for a key name; panics on an unknown name.
    #[macro_export]
    macro_rules! kc {
        ($a:expr) => {
            match trkey_common::keycodes::key_code($a) {
                Some(kc) => kc,
                None => panic!("Unknown key name: {:?}", $a),
            }
        };
    }

    #[macro_export]
    macro_rules! debug {
        ($($arg:expr),*) => {{
            extern crate std;
            std::eprintln!("DEBUG: {}", std::format!($($arg,)*))
        }};
    }

    #[macro_export]
    macro_rules! info {
        ($($arg:expr),*) => {{
            extern crate std;
            std::eprintln!("INFO: {}", std::format!($($arg,)*))
        }};
    }

    #[macro_export]
    macro_rules! warn {
        ($($arg:expr),*) => {{
            extern crate std;
            std::eprintln!("WARN: {}", std::format!($($arg,)*))
        }};
    }

    /// For states that should be impossible. Panics under `cfg(test)`.
    #[macro_export]
    macro_rules! error {
        ($($arg:expr),*) => {{
            extern crate std;
            if cfg!(test) {
                panic!("{}", std::format!($($arg,)*));
            } else {
                std::eprintln!(
                    "\nERROR: at ./{}:{}:{}:\n{}",
                    file!(),
                    line!(),
                    column!(),
                    std::format!($($arg,)*)
                );
            }
        }};
    }
}
