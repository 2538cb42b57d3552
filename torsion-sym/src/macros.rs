macro_rules! non_fips {
    ($($item:item)*) => {
        $(
            #[cfg(feature = "allow-non-fips")]
            $item
        )*
    };
}

macro_rules! std {
    ($($item:item)*) => {
        $(
            #[cfg(feature = "std")]
            $item
        )*
    };
}

macro_rules! alloc {
    ($($item:item)*) => {
        $(
            #[cfg(feature = "alloc")]
            $item
        )*
    };
}

/// Items for the `embedded-io` traits, only when `std` (and so `std::io`) is unavailable.
macro_rules! no_std_io {
    ($($item:item)*) => {
        $(
            #[cfg(all(feature = "embedded-io", not(feature = "std")))]
            $item
        )*
    };
}

/// Debug output which never exposes the contents, only the type name.
macro_rules! opaque_dbg {
    ($ident:ident $(<$($param:ident),*>)?) => {
        impl $(<$($param),*>)? ::core::fmt::Debug for $ident $(<$($param),*>)? {
            #[inline]
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(concat!(stringify!($ident), " { ... }"))
            }
        }
    };
    ($ident:ident <$lt:lifetime>) => {
        impl<$lt> ::core::fmt::Debug for $ident<$lt> {
            #[inline]
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(concat!(stringify!($ident), " { ... }"))
            }
        }
    };
}

/// Emits a `tracing` debug event at a rejection point when the `tracing` feature is on.
///
/// Only lengths, identifiers, and error kinds may be passed, never secret material.
#[cfg(feature = "tracing")]
macro_rules! trace_reject {
    ($($arg:tt)*) => {
        ::tracing::debug!(target: "torsion_sym", $($arg)*)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_reject {
    ($($arg:tt)*) => {};
}

/// Early return with the given error kind, emitting a rejection event.
macro_rules! bail {
    ($kind:ident, $($arg:tt)*) => {{
        trace_reject!(kind = ?$crate::error::ErrorKind::$kind, $($arg)*);
        return Err($crate::error::Error::new($crate::error::ErrorKind::$kind));
    }};
    ($kind:ident) => {{
        trace_reject!(kind = ?$crate::error::ErrorKind::$kind);
        return Err($crate::error::Error::new($crate::error::ErrorKind::$kind));
    }};
}

/// `bail!` unless the condition holds.
macro_rules! ensure {
    ($cond:expr, $kind:ident $(, $($arg:tt)*)?) => {
        if !($cond) {
            bail!($kind $(, $($arg)*)?);
        }
    };
}
