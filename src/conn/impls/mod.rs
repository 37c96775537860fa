mod boxed;

#[cfg(feature = "std")]
mod tcpstream;
